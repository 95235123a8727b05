use crate::model::{EventKind, NormalizedEvent, StepInterval, StepStatus};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepTrackOutput {
    /// Closed intervals in finish order, then the still-open ones in start
    /// order. Callers sort by start.
    pub steps: Vec<StepInterval>,
    pub unmatched_finishes: usize,
    pub unterminated_steps: usize,
    pub clock_skew: usize,
}

/// Pairs step starts with finishes over an ordered event stream. A finish
/// closes the most recent open step with the same key, or failing that the
/// most recent one with the same name.
#[derive(Debug, Default)]
pub struct StepTracker {
    open: Vec<StepInterval>,
    out: StepTrackOutput,
}

impl StepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(events: &[NormalizedEvent]) -> StepTrackOutput {
        let mut tracker = Self::new();
        for event in events {
            tracker.observe(event);
        }
        tracker.finish()
    }

    pub fn observe(&mut self, event: &NormalizedEvent) {
        let Some(marker) = event.step_marker() else {
            return;
        };
        match event.kind {
            EventKind::StepTriggered => {
                self.open.push(StepInterval {
                    name: marker.name.clone(),
                    key: marker.key.clone(),
                    kind: marker.category.clone(),
                    start_ms: event.offset_ms,
                    end_ms: None,
                    started_at: event.timestamp,
                    ended_at: None,
                    start_position: event.position,
                    end_position: None,
                    status: StepStatus::Unknown,
                    duration_ms: None,
                    depth: self.open.len(),
                    error: None,
                });
            }
            EventKind::StepFinished => {
                let Some(idx) = self.open_match(&marker.key, &marker.name) else {
                    warn!(
                        step = %marker.name,
                        position = event.position,
                        "step finish without an open start"
                    );
                    self.out.unmatched_finishes += 1;
                    return;
                };
                let mut step = self.open.remove(idx);
                let mut end_ms = event.offset_ms;
                if end_ms < step.start_ms {
                    warn!(
                        step = %step.name,
                        start_ms = step.start_ms,
                        end_ms,
                        "step finished before it started; clamping"
                    );
                    self.out.clock_skew += 1;
                    end_ms = step.start_ms;
                }
                step.end_ms = Some(end_ms);
                step.ended_at = event.timestamp;
                step.end_position = Some(event.position);
                step.duration_ms = Some(end_ms.saturating_sub(step.start_ms) as u64);
                step.status = marker.status;
                step.error = marker.error.clone();
                if step.kind.is_none() {
                    step.kind = marker.category.clone();
                }
                self.out.steps.push(step);
            }
            _ => {}
        }
    }

    fn open_match(&self, key: &str, name: &str) -> Option<usize> {
        self.open
            .iter()
            .rposition(|open| open.key == key)
            .or_else(|| self.open.iter().rposition(|open| open.name == name))
    }

    pub fn finish(mut self) -> StepTrackOutput {
        self.out.unterminated_steps = self.open.len();
        // never closed: status stays Unknown and end stays absent
        self.out.steps.append(&mut self.open);
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventDetail, StepMarker};

    fn marker_event(
        kind: EventKind,
        key: &str,
        offset_ms: i64,
        status: StepStatus,
    ) -> NormalizedEvent {
        NormalizedEvent {
            position: offset_ms,
            kind,
            summary: String::new(),
            timestamp: None,
            offset_ms,
            raw_index: 0,
            raw_type: None,
            detail: EventDetail::Step(StepMarker {
                key: key.to_string(),
                name: key.to_string(),
                category: None,
                state: None,
                status,
                error: None,
            }),
        }
    }

    fn start(key: &str, at: i64) -> NormalizedEvent {
        marker_event(EventKind::StepTriggered, key, at, StepStatus::Unknown)
    }

    fn end(key: &str, at: i64, status: StepStatus) -> NormalizedEvent {
        marker_event(EventKind::StepFinished, key, at, status)
    }

    #[test]
    fn closes_with_duration_and_status() {
        let out =
            StepTracker::track(&[start("Trigger", 0), end("Trigger", 386, StepStatus::Failed)]);
        assert_eq!(out.steps.len(), 1);
        let step = &out.steps[0];
        assert_eq!(step.duration_ms, Some(386));
        assert_eq!(step.end_ms, Some(386));
        assert_eq!(step.status, StepStatus::Failed);
        assert_eq!(step.depth, 0);
    }

    #[test]
    fn same_named_steps_match_lifo() {
        let out = StepTracker::track(&[
            start("Loop", 0),
            start("Loop", 10),
            end("Loop", 30, StepStatus::Succeeded),
            end("Loop", 100, StepStatus::Succeeded),
        ]);
        assert_eq!(out.steps[0].start_ms, 10);
        assert_eq!(out.steps[0].depth, 1);
        assert_eq!(out.steps[0].duration_ms, Some(20));
        assert_eq!(out.steps[1].start_ms, 0);
        assert_eq!(out.steps[1].duration_ms, Some(100));
    }

    #[test]
    fn finish_without_start_is_counted_not_fabricated() {
        let out = StepTracker::track(&[
            end("Ghost", 5, StepStatus::Succeeded),
            start("Real", 10),
            end("Real", 20, StepStatus::Succeeded),
        ]);
        assert_eq!(out.unmatched_finishes, 1);
        assert_eq!(out.steps.len(), 1);
        assert!(out.steps.iter().all(|s| s.name != "Ghost"));
    }

    #[test]
    fn open_steps_surface_as_unknown() {
        let out = StepTracker::track(&[start("Outer", 0), start("Inner", 10)]);
        assert_eq!(out.unterminated_steps, 2);
        for step in &out.steps {
            assert!(step.end_ms.is_none());
            assert!(step.duration_ms.is_none());
            assert_eq!(step.status, StepStatus::Unknown);
        }
        assert_eq!(out.steps[1].depth, 1);
    }

    #[test]
    fn skewed_finish_is_clamped() {
        let out = StepTracker::track(&[start("A", 100), end("A", 40, StepStatus::Succeeded)]);
        assert_eq!(out.clock_skew, 1);
        assert_eq!(out.steps[0].end_ms, Some(100));
        assert_eq!(out.steps[0].duration_ms, Some(0));
    }

    #[test]
    fn finish_without_step_id_closes_the_named_step() {
        let mut opened = start("Lookup", 0);
        if let EventDetail::Step(marker) = &mut opened.detail {
            marker.key = "s1".to_string();
        }
        let out = StepTracker::track(&[
            opened,
            start("Other", 5),
            end("Lookup", 50, StepStatus::Succeeded),
        ]);
        assert_eq!(out.unmatched_finishes, 0);
        assert_eq!(out.unterminated_steps, 1);
        let lookup = out.steps.iter().find(|s| s.name == "Lookup").unwrap();
        assert_eq!(lookup.end_ms, Some(50));
        assert_eq!(lookup.status, StepStatus::Succeeded);
    }
}
