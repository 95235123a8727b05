//! Projection of an assembled timeline into the two renderer inputs: the
//! message exchange sequence and the lane-grouped timed bars.

use crate::model::{
    BarLane, ConversationTimeline, DiagramSequenceEntry, DiagramSequences, EventDetail, EventKind,
    NormalizedEvent, Participant, StepInterval, StepStatus, TimedBar,
};
use crate::normalize::fields::{flatten_lines, truncate_chars};
use crate::policy::TimelinePolicyView;

pub const UNPHASED_LANE: &str = "Steps";

pub fn build_diagram(
    timeline: &ConversationTimeline,
    policy: &TimelinePolicyView,
) -> DiagramSequences {
    DiagramSequences {
        entries: sequence_entries(timeline, policy),
        lanes: group_lanes(timed_bars(timeline, policy)),
    }
}

/// Innermost external step whose position window covers `position`.
fn external_step_at<'a>(
    steps: &'a [StepInterval],
    position: i64,
    policy: &TimelinePolicyView,
) -> Option<&'a StepInterval> {
    steps
        .iter()
        .filter(|step| {
            step.kind
                .as_deref()
                .map_or(false, |kind| policy.is_external_kind(kind))
        })
        .filter(|step| {
            step.start_position <= position
                && step.end_position.map_or(true, |end| position <= end)
        })
        .max_by_key(|step| (step.depth, step.start_position))
}

fn message_text(event: &NormalizedEvent) -> &str {
    match &event.detail {
        EventDetail::Message { text } if !text.is_empty() => text.as_str(),
        _ => event.summary.as_str(),
    }
}

fn sequence_entries(
    timeline: &ConversationTimeline,
    policy: &TimelinePolicyView,
) -> Vec<DiagramSequenceEntry> {
    timeline
        .events
        .iter()
        .filter(|event| event.kind.is_message())
        .map(|event| {
            let counterpart = external_step_at(&timeline.steps, event.position, policy)
                .map(|step| Participant::External(step.name.clone()));
            let (from, to) = match event.kind {
                EventKind::UserMessage => {
                    (Participant::User, counterpart.unwrap_or(Participant::Bot))
                }
                _ => (counterpart.unwrap_or(Participant::Bot), Participant::User),
            };
            DiagramSequenceEntry {
                from,
                to,
                label: truncate_chars(
                    &flatten_lines(message_text(event)),
                    policy.sequence_label_max_chars,
                ),
                position: event.position,
            }
        })
        .collect()
}

fn floored(start: i64, end: i64, min_bar_ms: i64) -> i64 {
    end.max(start.saturating_add(min_bar_ms.max(0)))
}

fn timed_bars(timeline: &ConversationTimeline, policy: &TimelinePolicyView) -> Vec<TimedBar> {
    let last_offset = timeline.events.last().map(|e| e.offset_ms).unwrap_or(0);

    let mut lane_of = vec![None; timeline.steps.len()];
    for phase in &timeline.phases {
        for &idx in &phase.steps {
            if let Some(slot) = lane_of.get_mut(idx) {
                *slot = Some(phase.name.as_str());
            }
        }
    }

    let mut bars: Vec<TimedBar> = timeline
        .steps
        .iter()
        .zip(lane_of)
        .map(|(step, lane)| {
            let end = step.end_ms.unwrap_or(last_offset).max(step.start_ms);
            TimedBar {
                lane: lane.unwrap_or(UNPHASED_LANE).to_string(),
                label: truncate_chars(&step.name, policy.bar_label_max_chars),
                start_offset_ms: step.start_ms,
                end_offset_ms: floored(step.start_ms, end, policy.min_bar_ms),
                critical: step.status == StepStatus::Failed,
                still_open: step.is_open(),
            }
        })
        .collect();

    for (idx, event) in timeline.events.iter().enumerate() {
        let lane = match event.kind {
            EventKind::UserMessage => Participant::User,
            EventKind::BotMessage => Participant::Bot,
            _ => continue,
        };
        let next = timeline
            .events
            .get(idx + 1)
            .map(|next| next.offset_ms)
            .unwrap_or(event.offset_ms);
        bars.push(TimedBar {
            lane: lane.label().to_string(),
            label: truncate_chars(&flatten_lines(message_text(event)), policy.bar_label_max_chars),
            start_offset_ms: event.offset_ms,
            end_offset_ms: floored(event.offset_ms, next, policy.min_bar_ms),
            critical: false,
            still_open: false,
        });
    }

    // stable: steps stay ahead of messages starting at the same offset
    bars.sort_by_key(|bar| bar.start_offset_ms);
    bars
}

fn group_lanes(bars: Vec<TimedBar>) -> Vec<BarLane> {
    let mut lanes: Vec<BarLane> = Vec::new();
    for bar in bars {
        match lanes.iter_mut().find(|lane| lane.name == bar.lane) {
            Some(lane) => lane.bars.push(bar),
            None => lanes.push(BarLane {
                name: bar.lane.clone(),
                bars: vec![bar],
            }),
        }
    }
    lanes
}
