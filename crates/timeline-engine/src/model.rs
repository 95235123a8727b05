use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Shape family of the input log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    DialogTrace,
    Transcript,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::DialogTrace => "dialog_trace",
            SourceKind::Transcript => "transcript",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventKind {
    UserMessage,
    BotMessage,
    VariableAssignment,
    DialogRedirect,
    StepTriggered,
    StepFinished,
    PlanReceived,
    PlanReceivedDebug,
    PlanFinished,
    DialogTracing,
    KnowledgeSearch,
    Error,
    Other,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::UserMessage => "UserMessage",
            EventKind::BotMessage => "BotMessage",
            EventKind::VariableAssignment => "VariableAssignment",
            EventKind::DialogRedirect => "DialogRedirect",
            EventKind::StepTriggered => "StepTriggered",
            EventKind::StepFinished => "StepFinished",
            EventKind::PlanReceived => "PlanReceived",
            EventKind::PlanReceivedDebug => "PlanReceivedDebug",
            EventKind::PlanFinished => "PlanFinished",
            EventKind::DialogTracing => "DialogTracing",
            EventKind::KnowledgeSearch => "KnowledgeSearch",
            EventKind::Error => "Error",
            EventKind::Other => "Other",
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self, EventKind::UserMessage | EventKind::BotMessage)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Failed,
    #[default]
    Unknown,
}

impl StepStatus {
    fn severity(self) -> u8 {
        match self {
            StepStatus::Succeeded => 0,
            StepStatus::Unknown => 1,
            StepStatus::Failed => 2,
        }
    }

    /// Failed dominates Unknown, Unknown dominates Succeeded.
    pub fn worst(self, other: StepStatus) -> StepStatus {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Succeeded => "succeeded",
            StepStatus::Failed => "failed",
            StepStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepMarker {
    /// Identity used to pair a start with its finish: the step id when the
    /// source carries one, otherwise the resolved name.
    pub key: String,
    pub name: String,
    pub category: Option<String>,
    pub state: Option<String>,
    pub status: StepStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TracedAction {
    pub topic: String,
    pub action_type: String,
    pub exception: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum EventDetail {
    #[default]
    None,
    Message {
        text: String,
    },
    Step(StepMarker),
    Plan {
        plan_id: Option<String>,
        steps: Vec<String>,
    },
    Tracing {
        actions: Vec<TracedAction>,
    },
    Variable {
        id: String,
        scope: String,
        value: String,
    },
    Redirect {
        target: String,
    },
    Error {
        code: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedEvent {
    pub position: i64,
    pub kind: EventKind,
    pub summary: String,
    pub timestamp: Option<DateTime<Utc>>,
    /// Milliseconds from the first event on the timeline axis.
    pub offset_ms: i64,
    /// Index of the originating record in the input sequence.
    pub raw_index: usize,
    pub raw_type: Option<String>,
    pub detail: EventDetail,
}

impl NormalizedEvent {
    pub fn step_marker(&self) -> Option<&StepMarker> {
        match &self.detail {
            EventDetail::Step(marker) => Some(marker),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepInterval {
    pub name: String,
    pub key: String,
    pub kind: Option<String>,
    pub start_ms: i64,
    /// Absent while the step never received a finish.
    pub end_ms: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub start_position: i64,
    pub end_position: Option<i64>,
    pub status: StepStatus,
    pub duration_ms: Option<u64>,
    pub depth: usize,
    pub error: Option<String>,
}

impl StepInterval {
    pub fn is_open(&self) -> bool {
        self.end_ms.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Phase {
    pub name: String,
    pub kind: Option<String>,
    pub start_ms: i64,
    pub end_ms: Option<i64>,
    pub total_ms: u64,
    pub percent_of_total: f64,
    pub status: StepStatus,
    /// Indices into `ConversationTimeline::steps`, seed first.
    pub steps: Vec<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClockKind {
    WallClock,
    Synthetic,
    #[default]
    Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionSummary {
    pub start_time_utc: Option<String>,
    pub end_time_utc: Option<String>,
    pub session_type: Option<String>,
    pub outcome: Option<String>,
    pub outcome_reason: Option<String>,
    pub turn_count: Option<i64>,
    pub implied_success: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ConversationMeta {
    pub bot_name: String,
    pub conversation_id: String,
    pub user_query: String,
    pub session: Option<SessionSummary>,
    pub conversation_info: Option<JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TimelineDiagnostics {
    /// Finish markers with no open start; never turned into intervals.
    pub unmatched_finishes: usize,
    pub unterminated_steps: usize,
    pub folded_noise: usize,
    pub unrecognized_records: usize,
    /// Finishes stamped earlier than their start.
    pub clock_skew: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTimeline {
    pub source: SourceKind,
    pub clock: ClockKind,
    pub meta: ConversationMeta,
    pub events: Vec<NormalizedEvent>,
    pub steps: Vec<StepInterval>,
    pub phases: Vec<Phase>,
    pub total_elapsed_ms: u64,
    pub errors: Vec<String>,
    pub diagnostics: TimelineDiagnostics,
}

impl ConversationTimeline {
    pub fn empty(source: SourceKind) -> Self {
        Self {
            source,
            clock: ClockKind::Empty,
            meta: ConversationMeta::default(),
            events: Vec::new(),
            steps: Vec::new(),
            phases: Vec::new(),
            total_elapsed_ms: 0,
            errors: Vec::new(),
            diagnostics: TimelineDiagnostics::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(tag = "lane", content = "name", rename_all = "snake_case")]
pub enum Participant {
    User,
    Bot,
    External(String),
}

impl Participant {
    pub fn label(&self) -> &str {
        match self {
            Participant::User => "User",
            Participant::Bot => "Bot",
            Participant::External(name) => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagramSequenceEntry {
    pub from: Participant,
    pub to: Participant,
    pub label: String,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimedBar {
    pub lane: String,
    pub label: String,
    pub start_offset_ms: i64,
    pub end_offset_ms: i64,
    pub critical: bool,
    pub still_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BarLane {
    pub name: String,
    pub bars: Vec<TimedBar>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DiagramSequences {
    pub entries: Vec<DiagramSequenceEntry>,
    pub lanes: Vec<BarLane>,
}

impl DiagramSequences {
    pub fn bar_count(&self) -> usize {
        self.lanes.iter().map(|lane| lane.bars.len()).sum()
    }
}

/// Everything handed to a renderer for one conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineReport {
    pub timeline: ConversationTimeline,
    pub diagram: DiagramSequences,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Normalize,
    TrackSteps,
    AggregatePhases,
    Assemble,
    Diagram,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Normalize => "normalize",
            PipelineStage::TrackSteps => "track_steps",
            PipelineStage::AggregatePhases => "aggregate_phases",
            PipelineStage::Assemble => "assemble",
            PipelineStage::Diagram => "diagram",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HeaderLine {
    pub export_version: &'static str,
    pub generated_at: DateTime<Utc>,
    pub source: SourceKind,
    pub clock: ClockKind,
    pub policy_snapshot: JsonValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct BarLine {
    pub lane: String,
    pub bar: TimedBar,
}

#[derive(Debug, Clone, Serialize)]
pub struct FooterLine {
    pub total_events: usize,
    pub total_steps: usize,
    pub total_phases: usize,
    pub total_errors: usize,
    pub total_elapsed_ms: u64,
    pub diagnostics: TimelineDiagnostics,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonlLine {
    Header(HeaderLine),
    Event(NormalizedEvent),
    Step(StepInterval),
    Phase(Phase),
    Sequence(DiagramSequenceEntry),
    Bar(BarLine),
    Error { message: String },
    Footer(FooterLine),
}
