use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use dialoglens_timeline::{SourceKind, Timeline, TimelineReport};
use tokio::fs;
use tracing::{debug, error, info};

use crate::bot_content::load_bot_content;
use crate::cli::context::CliContext;
use crate::cli::output::{render, render_file};
use crate::cli::transcript::{export_jsonl, process_transcript};
use crate::discovery::{discover, read_json, ExportFolder};

#[derive(Args, Clone, Debug)]
pub struct AnalyseArgs {
    /// Bot export folder, or a parent folder with --all
    pub path: PathBuf,

    /// Process every subfolder holding a bot export, plus Transcripts/*.json
    #[arg(short, long)]
    pub all: bool,

    /// Write the JSONL export here (a directory with --all)
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,
}

pub async fn cmd_analyse(args: AnalyseArgs, ctx: &CliContext) -> Result<()> {
    debug!(config = %ctx.config_path().display(), "analyse");
    if args.all {
        return analyse_all(&args, ctx).await;
    }

    let folder = ExportFolder::open(&args.path)?;
    let (title, report) = process_folder(ctx, &folder).await?;
    println!("{}", render(&report, ctx.output(), &title)?);
    if let Some(path) = &args.export {
        export_jsonl(ctx, &report, path).await?;
    }
    Ok(())
}

pub async fn process_folder(
    ctx: &CliContext,
    folder: &ExportFolder,
) -> Result<(String, TimelineReport)> {
    info!("Parsing {}...", folder.name());
    let bot = load_bot_content(&folder.bot_content).await?;
    info!(
        "Bot: {} ({} components)",
        bot.display_name, bot.component_count
    );

    let dialog = read_json(&folder.dialog).await?;
    let service = ctx.timeline_service(bot.topics);
    let report = service
        .build(SourceKind::DialogTrace, &dialog)
        .with_context(|| format!("Invalid dialog trace in {}", folder.dialog.display()))?;
    log_totals(&report);
    Ok((bot.display_name, report))
}

pub fn log_totals(report: &TimelineReport) {
    let timeline = &report.timeline;
    info!(
        "Timeline: {} events, {} phases, {} errors",
        timeline.events.len(),
        timeline.phases.len(),
        timeline.errors.len()
    );
}

async fn write_report(
    ctx: &CliContext,
    report: &TimelineReport,
    dir: &Path,
    stem: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let path = dir.join(format!("{stem}.{}", ctx.output().file_extension()));
    fs::write(&path, render_file(report, ctx.output())?)
        .await
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(path)
}

async fn analyse_all(args: &AnalyseArgs, ctx: &CliContext) -> Result<()> {
    let found = discover(&args.path)?;
    if found.is_empty() {
        bail!(
            "No bot export folders or transcripts found in {}",
            args.path.display()
        );
    }
    info!("Found {} bot export folders", found.folders.len());

    let report_name = ctx.config().report_name.clone();
    let mut failures = 0usize;
    let mut export_failures = 0usize;

    for path in &found.folders {
        let outcome = async {
            let folder = ExportFolder::open(path)?;
            let (_, report) = process_folder(ctx, &folder).await?;
            let dir = match &ctx.config().output_dir {
                Some(root) => root.join(folder.name()),
                None => folder.path.clone(),
            };
            let written = write_report(ctx, &report, &dir, &report_name).await?;
            let export = format!("{}.jsonl", folder.name());
            Ok::<_, anyhow::Error>((written, report, export))
        }
        .await;
        match outcome {
            Ok((written, report, export)) => {
                println!("{}", written.display());
                if !export_batch(ctx, &report, args.export.as_deref(), &export).await {
                    export_failures += 1;
                }
            }
            Err(err) => {
                failures += 1;
                error!("Failed to process {}: {:#}", path.display(), err);
            }
        }
    }

    if !found.transcripts.is_empty() {
        info!("Found {} transcript files", found.transcripts.len());
    }
    for path in &found.transcripts {
        let outcome = async {
            let (stem, report) = process_transcript(ctx, path).await?;
            let input_dir = path.parent().unwrap_or_else(|| Path::new("."));
            let dir = ctx.report_dir(input_dir);
            let name = format!("{stem}.{report_name}");
            let written = write_report(ctx, &report, &dir, &name).await?;
            Ok::<_, anyhow::Error>((written, report, format!("{stem}.jsonl")))
        }
        .await;
        match outcome {
            Ok((written, report, export)) => {
                println!("{}", written.display());
                if !export_batch(ctx, &report, args.export.as_deref(), &export).await {
                    export_failures += 1;
                }
            }
            Err(err) => {
                failures += 1;
                error!("Failed to process transcript {}: {:#}", path.display(), err);
            }
        }
    }

    info!(failures, export_failures, "All done.");
    Ok(())
}

/// A failed export leaves the written report in place; it is logged on its
/// own and does not count the input as failed.
async fn export_batch(
    ctx: &CliContext,
    report: &TimelineReport,
    export_dir: Option<&Path>,
    file_name: &str,
) -> bool {
    let Some(export_dir) = export_dir else {
        return true;
    };
    let target = export_dir.join(file_name);
    match export_jsonl(ctx, report, &target).await {
        Ok(()) => true,
        Err(err) => {
            error!("Failed to export {}: {:#}", target.display(), err);
            false
        }
    }
}
