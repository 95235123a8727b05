use super::assemble::{assemble, sort_steps, TimelineParts};
use super::axis::TimeAxis;
use super::phases::aggregate_phases;
use super::steps::StepTracker;
use crate::diagram::build_diagram;
use crate::model::{PipelineStage, SourceKind, TimelineReport};
use crate::normalize::{normalize_records, TopicResolver};
use crate::policy::TimelinePolicyView;
use crate::ports::EventsPort;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Runs every stage once over `records`. Pure apart from the progress
/// reports sent to `events`.
pub fn run_pipeline(
    records: &[JsonValue],
    source: SourceKind,
    topics: &TopicResolver,
    policy: &TimelinePolicyView,
    events: &dyn EventsPort,
) -> TimelineReport {
    let mut normalized = normalize_records(records, source, topics, policy);
    let axis = TimeAxis::derive(&normalized.events, source, policy);
    axis.stamp(&mut normalized.events);
    let total_elapsed_ms = axis.elapsed_ms(&normalized.events);
    debug!(
        events = normalized.events.len(),
        folded = normalized.folded_noise,
        clock = ?axis.clock,
        "normalized records"
    );
    events.timeline_stage_completed(PipelineStage::Normalize, normalized.events.len());

    let mut tracked = StepTracker::track(&normalized.events);
    sort_steps(&mut tracked.steps);
    events.timeline_stage_completed(PipelineStage::TrackSteps, tracked.steps.len());

    let phases = aggregate_phases(&tracked.steps, total_elapsed_ms);
    events.timeline_stage_completed(PipelineStage::AggregatePhases, phases.len());

    let timeline = assemble(TimelineParts {
        source,
        axis,
        normalized,
        tracked,
        phases,
        total_elapsed_ms,
    });
    events.timeline_stage_completed(PipelineStage::Assemble, timeline.errors.len());

    let diagram = build_diagram(&timeline, policy);
    events.timeline_stage_completed(PipelineStage::Diagram, diagram.entries.len());

    TimelineReport { timeline, diagram }
}
