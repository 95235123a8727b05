use crate::model::{ClockKind, NormalizedEvent, SourceKind};
use crate::policy::TimelinePolicyView;
use chrono::{DateTime, Utc};

/// Maps every event onto one millisecond axis whose origin is the first
/// event. Dialog traces with real timestamps use wall-clock time; everything
/// else is derived from positions.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    pub clock: ClockKind,
    origin: Option<DateTime<Utc>>,
    origin_position: i64,
    stride: i64,
    increment_ms: i64,
}

impl TimeAxis {
    pub fn derive(
        events: &[NormalizedEvent],
        source: SourceKind,
        policy: &TimelinePolicyView,
    ) -> Self {
        let origin = match source {
            SourceKind::DialogTrace => events.iter().find_map(|e| e.timestamp),
            SourceKind::Transcript => None,
        };
        let clock = match (events.is_empty(), origin.is_some()) {
            (true, _) => ClockKind::Empty,
            (false, true) => ClockKind::WallClock,
            (false, false) => ClockKind::Synthetic,
        };
        Self {
            clock,
            origin,
            origin_position: events.first().map(|e| e.position).unwrap_or(0),
            stride: policy.effective_stride(),
            increment_ms: policy.effective_increment_ms(),
        }
    }

    /// Writes `offset_ms` on every event. Untimed events in a wall-clock
    /// trace inherit the offset of the closest earlier timed event.
    pub fn stamp(&self, events: &mut [NormalizedEvent]) {
        let mut carried = 0;
        for event in events.iter_mut() {
            event.offset_ms = match (self.clock, self.origin, event.timestamp) {
                (ClockKind::WallClock, Some(origin), Some(ts)) => {
                    carried = (ts - origin).num_milliseconds();
                    carried
                }
                (ClockKind::WallClock, _, _) => carried,
                _ => self.synthetic_offset(event.position),
            };
        }
    }

    /// Saturates at the ends of the i64 range instead of wrapping.
    pub fn synthetic_offset(&self, position: i64) -> i64 {
        position
            .saturating_sub(self.origin_position)
            .div_euclid(self.stride)
            .saturating_mul(self.increment_ms)
    }

    /// Last event minus first event, never negative.
    pub fn elapsed_ms(&self, events: &[NormalizedEvent]) -> u64 {
        match (events.first(), events.last()) {
            (Some(first), Some(last)) => {
                last.offset_ms.saturating_sub(first.offset_ms).max(0) as u64
            }
            _ => 0,
        }
    }
}
