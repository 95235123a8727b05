use super::analyse::cmd_analyse;
use super::env::CliArgs;
use super::transcript::cmd_transcript;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Analyse(args) => cmd_analyse(args, ctx).await,
        Commands::Transcript(args) => cmd_transcript(args, ctx).await,
    }
}
