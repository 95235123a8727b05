pub mod adapters;
pub mod api;
pub mod diagram;
pub mod errors;
pub mod export;
pub mod model;
pub mod normalize;
pub mod policy;
pub mod ports;
pub mod stitch;

pub use api::{extract_records, Timeline, TimelineService};
pub use errors::{TlError, TlResult};
pub use model::{
    ConversationTimeline, DiagramSequences, EventKind, NormalizedEvent, Participant, Phase,
    SourceKind, StepInterval, StepStatus, TimelineReport,
};
pub use normalize::TopicResolver;
pub use policy::{TimelinePolicyHandle, TimelinePolicyView};
