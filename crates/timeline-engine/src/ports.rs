use crate::errors::TlError;
use crate::model::{PipelineStage, SourceKind};
use crate::policy::TimelinePolicyView;

pub trait PolicyPort: Send + Sync {
    fn view(&self) -> TimelinePolicyView;
}

pub trait EventsPort: Send + Sync {
    fn timeline_build_started(&self, source: SourceKind, records: usize);
    fn timeline_stage_completed(&self, stage: PipelineStage, count: usize);
    fn timeline_build_finished(&self, ok: bool, latency_ms: u128, err: Option<&TlError>);
}
