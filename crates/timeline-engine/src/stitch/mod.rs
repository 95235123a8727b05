pub mod assemble;
pub mod axis;
pub mod build;
pub mod phases;
pub mod steps;

pub use assemble::{assemble, collect_errors, sort_steps, TimelineParts};
pub use axis::TimeAxis;
pub use build::run_pipeline;
pub use phases::aggregate_phases;
pub use steps::{StepTrackOutput, StepTracker};
