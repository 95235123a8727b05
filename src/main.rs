use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    dialoglens_cli::cli::app::run().await
}
