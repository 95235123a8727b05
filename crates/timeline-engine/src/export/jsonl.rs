use crate::errors::TlError;
use crate::model::{BarLine, FooterLine, HeaderLine, JsonlLine, TimelineReport};
use chrono::Utc;
use serde_json::{to_string, Value as JsonValue};

pub const EXPORT_VERSION: &str = "v1";

/// Header, body and footer lines for one report. Body order: events, steps,
/// phases, error lines, sequence entries, bars.
pub fn build_lines(report: &TimelineReport, policy_snapshot: JsonValue) -> Vec<JsonlLine> {
    let timeline = &report.timeline;
    let mut lines = Vec::with_capacity(
        timeline.events.len()
            + timeline.steps.len()
            + timeline.phases.len()
            + timeline.errors.len()
            + report.diagram.entries.len()
            + report.diagram.bar_count()
            + 2,
    );

    lines.push(JsonlLine::Header(HeaderLine {
        export_version: EXPORT_VERSION,
        generated_at: Utc::now(),
        source: timeline.source,
        clock: timeline.clock,
        policy_snapshot,
    }));
    lines.extend(timeline.events.iter().cloned().map(JsonlLine::Event));
    lines.extend(timeline.steps.iter().cloned().map(JsonlLine::Step));
    lines.extend(timeline.phases.iter().cloned().map(JsonlLine::Phase));
    lines.extend(
        timeline
            .errors
            .iter()
            .map(|message| JsonlLine::Error {
                message: message.clone(),
            }),
    );
    lines.extend(report.diagram.entries.iter().cloned().map(JsonlLine::Sequence));
    for lane in &report.diagram.lanes {
        lines.extend(lane.bars.iter().map(|bar| {
            JsonlLine::Bar(BarLine {
                lane: lane.name.clone(),
                bar: bar.clone(),
            })
        }));
    }
    lines.push(JsonlLine::Footer(FooterLine {
        total_events: timeline.events.len(),
        total_steps: timeline.steps.len(),
        total_phases: timeline.phases.len(),
        total_errors: timeline.errors.len(),
        total_elapsed_ms: timeline.total_elapsed_ms,
        diagnostics: timeline.diagnostics.clone(),
    }));
    lines
}

pub fn serialize_lines(
    lines: &[JsonlLine],
    max_payload_bytes: usize,
) -> Result<Vec<String>, TlError> {
    let mut serialized = Vec::with_capacity(lines.len());
    for line in lines {
        let json = to_string(line).map_err(|err| TlError::Internal(err.to_string()))?;
        if json.len() > max_payload_bytes {
            return Err(TlError::Oversize);
        }
        serialized.push(json);
    }
    Ok(serialized)
}
