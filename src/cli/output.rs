use anyhow::{Context, Result};
use clap::ValueEnum;
use dialoglens_timeline::model::{ConversationTimeline, TimelineReport};
use std::fmt::Write as _;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Extension for reports written to disk; human output is saved as JSON.
    pub fn file_extension(&self) -> &'static str {
        match self {
            OutputFormat::Human | OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

pub fn render(report: &TimelineReport, format: OutputFormat, title: &str) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human_summary(report, title)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize report as JSON")
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).context("Failed to serialize report as YAML")
        }
    }
}

/// Serialized form used for files written in batch mode.
pub fn render_file(report: &TimelineReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => render(report, OutputFormat::Yaml, ""),
        _ => render(report, OutputFormat::Json, ""),
    }
}

pub fn format_duration(ms: u64) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else {
        format!("{}m {:02}s", ms / 60_000, (ms % 60_000) / 1_000)
    }
}

fn header(timeline: &ConversationTimeline, title: &str, out: &mut String) {
    let meta = &timeline.meta;
    let _ = writeln!(out, "Timeline: {title}");
    if !meta.bot_name.is_empty() {
        let _ = writeln!(out, "Bot: {}", meta.bot_name);
    }
    if !meta.conversation_id.is_empty() {
        let _ = writeln!(out, "Conversation: {}", meta.conversation_id);
    }
    if !meta.user_query.is_empty() {
        let _ = writeln!(out, "First query: {}", meta.user_query);
    }
    if let Some(session) = &meta.session {
        if let Some(outcome) = &session.outcome {
            let _ = writeln!(
                out,
                "Outcome: {outcome} (turns: {})",
                session
                    .turn_count
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "?".to_string())
            );
        }
    }
    let _ = writeln!(
        out,
        "Source: {} | clock: {:?} | elapsed: {}",
        timeline.source.as_str(),
        timeline.clock,
        format_duration(timeline.total_elapsed_ms)
    );
    let _ = writeln!(
        out,
        "Events: {} | steps: {} | phases: {} | errors: {}",
        timeline.events.len(),
        timeline.steps.len(),
        timeline.phases.len(),
        timeline.errors.len()
    );
}

pub fn human_summary(report: &TimelineReport, title: &str) -> String {
    let timeline = &report.timeline;
    let mut out = String::new();
    header(timeline, title, &mut out);

    if !timeline.phases.is_empty() {
        out.push_str("\nPhases:\n");
        for phase in &timeline.phases {
            let span = match phase.end_ms {
                Some(_) => format_duration(phase.total_ms),
                None => "still open".to_string(),
            };
            let _ = writeln!(
                out,
                "  {:<32} {:>10} {:>6.1}%  {}",
                phase.name,
                span,
                phase.percent_of_total,
                phase.status.as_str()
            );
        }
    }

    if !timeline.errors.is_empty() {
        out.push_str("\nErrors:\n");
        for error in &timeline.errors {
            let _ = writeln!(out, "  - {error}");
        }
    }

    if !report.diagram.entries.is_empty() {
        out.push_str("\nExchanges:\n");
        for entry in &report.diagram.entries {
            let _ = writeln!(
                out,
                "  {} -> {}: {}",
                entry.from.label(),
                entry.to.label(),
                entry.label
            );
        }
    }

    let d = &timeline.diagnostics;
    let _ = writeln!(
        out,
        "\nDiagnostics: unmatched finishes={} unterminated={} folded noise={} unrecognized={} clock skew={}",
        d.unmatched_finishes,
        d.unterminated_steps,
        d.folded_noise,
        d.unrecognized_records,
        d.clock_skew
    );
    out
}
