use clap::Subcommand;

use super::analyse::AnalyseArgs;
use super::transcript::TranscriptArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Reconstruct the timeline of a bot export folder (or every folder with --all)
    Analyse(AnalyseArgs),

    /// Reconstruct the timeline of a standalone session transcript
    Transcript(TranscriptArgs),
}
