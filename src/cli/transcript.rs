use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use dialoglens_timeline::{SourceKind, Timeline, TimelineReport, TopicResolver};
use tokio::fs;
use tracing::info;

use crate::cli::analyse::log_totals;
use crate::cli::context::CliContext;
use crate::cli::output::render;
use crate::discovery::read_json;

#[derive(Args, Clone, Debug)]
pub struct TranscriptArgs {
    /// Transcript JSON file
    pub file: PathBuf,

    /// Write the JSONL export to this file
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,
}

pub async fn cmd_transcript(args: TranscriptArgs, ctx: &CliContext) -> Result<()> {
    let (title, report) = process_transcript(ctx, &args.file).await?;
    println!("{}", render(&report, ctx.output(), &title)?);
    if let Some(path) = &args.export {
        export_jsonl(ctx, &report, path).await?;
    }
    Ok(())
}

/// Returns the file stem (used as report title) with the built report.
pub async fn process_transcript(ctx: &CliContext, path: &Path) -> Result<(String, TimelineReport)> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "transcript".to_string());
    info!("Parsing transcript {}...", stem);

    let transcript = read_json(path).await?;
    let report = ctx
        .timeline_service(TopicResolver::new())
        .build(SourceKind::Transcript, &transcript)
        .with_context(|| format!("Invalid transcript {}", path.display()))?;
    log_totals(&report);
    Ok((stem, report))
}

pub async fn export_jsonl(ctx: &CliContext, report: &TimelineReport, path: &Path) -> Result<()> {
    let lines = ctx
        .timeline_service(TopicResolver::new())
        .export_jsonl(report)
        .context("failed to serialize timeline export")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create export directory {}", parent.display()))?;
    }
    let mut body = lines.join("\n");
    body.push('\n');
    fs::write(path, body)
        .await
        .with_context(|| format!("failed to write export to {}", path.display()))?;
    info!("Timeline export written to {}", path.display());
    Ok(())
}
