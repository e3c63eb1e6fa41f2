// ============================================================================
// streamcheck-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Supervisors for the ffmpeg and ffprobe subprocesses
//
// KEY COMPONENTS:
// - process: spawning, output scanning and cooperative termination
// - producer: publishes a stream and signals when it is live
// - analyzer: captures a stream and parses ffprobe's report

pub mod analyzer;
pub mod process;
pub mod producer;

pub use analyzer::{Analyzer, AnalyzerConfig};
pub use process::{DEFAULT_GRACE_PERIOD, ToolCommand};
pub use producer::{DEFAULT_READY_MARKER, Producer, ProducerConfig, publish_args};
