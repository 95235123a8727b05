use super::axis::TimeAxis;
use super::steps::StepTrackOutput;
use crate::model::{
    ConversationTimeline, EventDetail, EventKind, NormalizedEvent, Phase, SourceKind, StepInterval,
    StepStatus, TimelineDiagnostics,
};
use crate::normalize::NormalizeOutput;

/// Chronological by start; equal starts keep tracker order.
pub fn sort_steps(steps: &mut [StepInterval]) {
    steps.sort_by_key(|step| (step.start_ms, step.start_position));
}

/// One readable line per failure marker, in log order.
pub fn collect_errors(events: &[NormalizedEvent]) -> Vec<String> {
    let mut errors = Vec::new();
    for event in events {
        match (&event.kind, &event.detail) {
            (EventKind::StepFinished, EventDetail::Step(marker))
                if marker.status == StepStatus::Failed =>
            {
                errors.push(match &marker.error {
                    Some(message) => format!("{}: {message}", marker.name),
                    None => format!("{}: failed", marker.name),
                });
            }
            (EventKind::DialogTracing, EventDetail::Tracing { actions }) => {
                for action in actions {
                    if let Some(exception) = &action.exception {
                        errors.push(format!(
                            "{}.{}: {exception}",
                            action.topic, action.action_type
                        ));
                    }
                }
            }
            (EventKind::Error, EventDetail::Error { code }) => {
                errors.push(format!("ErrorCode: {code}"));
            }
            _ => {}
        }
    }
    errors
}

pub struct TimelineParts {
    pub source: SourceKind,
    pub axis: TimeAxis,
    pub normalized: NormalizeOutput,
    pub tracked: StepTrackOutput,
    pub phases: Vec<Phase>,
    pub total_elapsed_ms: u64,
}

pub fn assemble(parts: TimelineParts) -> ConversationTimeline {
    let TimelineParts {
        source,
        axis,
        normalized,
        tracked,
        phases,
        total_elapsed_ms,
    } = parts;

    let errors = collect_errors(&normalized.events);
    ConversationTimeline {
        source,
        clock: axis.clock,
        meta: normalized.meta,
        events: normalized.events,
        steps: tracked.steps,
        phases,
        total_elapsed_ms,
        errors,
        diagnostics: TimelineDiagnostics {
            unmatched_finishes: tracked.unmatched_finishes,
            unterminated_steps: tracked.unterminated_steps,
            folded_noise: normalized.folded_noise,
            unrecognized_records: normalized.unrecognized_records,
            clock_skew: tracked.clock_skew,
        },
    }
}
