pub mod fields;
pub mod shapes;
pub mod topics;

pub use topics::TopicResolver;

use crate::model::{ConversationMeta, EventKind, NormalizedEvent, SessionSummary, SourceKind};
use crate::policy::TimelinePolicyView;
use chrono::{DateTime, Utc};
use fields::{epoch_millis, epoch_seconds, parse_timestamp, truncate_chars, RecordView};
use serde_json::Value as JsonValue;
use shapes::{shape_record, value_type, Role, ShapeContext, ShapeOutcome};

const POSITION_KEY: &str = "webchat:internal:position";
const RECEIVED_AT_KEY: &str = "webchat:internal:received-at";

#[derive(Debug, Clone, Default)]
pub struct NormalizeOutput {
    /// Sorted by position; ties keep input order.
    pub events: Vec<NormalizedEvent>,
    pub meta: ConversationMeta,
    pub folded_noise: usize,
    pub unrecognized_records: usize,
}

/// Converts raw records of one source into the uniform event stream. Never
/// fails: unreadable records come out as `Other`.
pub fn normalize_records(
    records: &[JsonValue],
    source: SourceKind,
    topics: &TopicResolver,
    policy: &TimelinePolicyView,
) -> NormalizeOutput {
    let mut normalizer = Normalizer::new(source, topics, policy);
    for (index, record) in records.iter().enumerate() {
        normalizer.push(index, record);
    }
    normalizer.finish()
}

struct Normalizer<'a> {
    source: SourceKind,
    shapes: ShapeContext<'a>,
    out: NormalizeOutput,
}

impl<'a> Normalizer<'a> {
    fn new(source: SourceKind, topics: &'a TopicResolver, policy: &'a TimelinePolicyView) -> Self {
        Self {
            source,
            shapes: ShapeContext { topics, policy },
            out: NormalizeOutput::default(),
        }
    }

    fn push(&mut self, index: usize, record: &JsonValue) {
        let view = RecordView::new(record);
        self.observe_meta(view);

        let shaped = match shape_record(view, &self.shapes) {
            ShapeOutcome::Event(shaped) => shaped,
            ShapeOutcome::Noise => {
                self.out.folded_noise += 1;
                return;
            }
        };
        if shaped.kind == EventKind::Other {
            self.out.unrecognized_records += 1;
        }

        let raw_type = view.opt_str("type").map(|t| match value_type(view) {
            "" => t.to_string(),
            vt => format!("{t}/{vt}"),
        });

        self.out.events.push(NormalizedEvent {
            position: self.position_of(index, view),
            kind: shaped.kind,
            summary: truncate_chars(&shaped.summary, self.shapes.policy.summary_max_chars),
            timestamp: self.timestamp_of(view),
            offset_ms: 0,
            raw_index: index,
            raw_type,
            detail: shaped.detail,
        });
    }

    /// Unplaced transcript records get a position from their index; unplaced
    /// dialog records sort at 0.
    fn position_of(&self, index: usize, view: RecordView<'_>) -> i64 {
        let placed = view.child("channelData").i64(POSITION_KEY);
        match (placed, self.source) {
            (Some(position), _) => position,
            (None, SourceKind::Transcript) => {
                (index as i64).saturating_mul(self.shapes.policy.effective_stride())
            }
            (None, SourceKind::DialogTrace) => 0,
        }
    }

    /// Transcripts only carry ordinals worth trusting; their events stay on
    /// the synthetic axis.
    fn timestamp_of(&self, view: RecordView<'_>) -> Option<DateTime<Utc>> {
        if self.source == SourceKind::Transcript {
            return None;
        }
        let direct = match view.get("timestamp") {
            Some(JsonValue::String(raw)) => parse_timestamp(raw),
            Some(number @ JsonValue::Number(_)) => epoch_seconds(number),
            _ => None,
        };
        direct.or_else(|| {
            view.child("channelData")
                .i64(RECEIVED_AT_KEY)
                .and_then(epoch_millis)
        })
    }

    fn observe_meta(&mut self, view: RecordView<'_>) {
        let meta = &mut self.out.meta;
        let from = view.child("from");
        let role = Role::of(from);

        if meta.bot_name.is_empty() && role == Role::Bot {
            if let Some(name) = from.opt_str("name") {
                meta.bot_name = name.to_string();
            }
        }
        if meta.conversation_id.is_empty() {
            if let Some(id) = view.child("conversation").opt_str("id") {
                meta.conversation_id = id.to_string();
            }
        }
        if meta.user_query.is_empty() && role == Role::User && view.str("type") == "message" {
            if let Some(text) = view.opt_str("text") {
                meta.user_query = text.to_string();
            }
        }

        match value_type(view) {
            "SessionInfo" => {
                let value = view.child("value");
                meta.session = Some(SessionSummary {
                    start_time_utc: value.opt_str("startTimeUtc").map(str::to_string),
                    end_time_utc: value.opt_str("endTimeUtc").map(str::to_string),
                    session_type: value.opt_str("type").map(str::to_string),
                    outcome: value.opt_str("outcome").map(str::to_string),
                    outcome_reason: value.opt_str("outcomeReason").map(str::to_string),
                    turn_count: value.i64("turnCount"),
                    implied_success: value.bool("impliedSuccess"),
                });
            }
            "ConversationInfo" => {
                meta.conversation_info = view.get("value").cloned();
            }
            _ => {}
        }
    }

    fn finish(mut self) -> NormalizeOutput {
        // stable: equal positions keep input order
        self.out.events.sort_by_key(|event| event.position);
        self.out
    }
}
