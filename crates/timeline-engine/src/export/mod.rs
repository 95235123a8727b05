pub mod jsonl;

pub use jsonl::{build_lines, serialize_lines, EXPORT_VERSION};
