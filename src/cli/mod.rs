pub mod analyse;
pub mod app;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod output;
pub mod runtime;
pub mod transcript;

pub use analyse::{cmd_analyse, AnalyseArgs};
pub use transcript::{cmd_transcript, TranscriptArgs};
