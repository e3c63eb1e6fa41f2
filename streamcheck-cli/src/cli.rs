// streamcheck-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "streamcheck: End-to-end media checks for a streaming server",
    long_about = "Publishes test streams with ffmpeg and verifies what the server re-emits with ffprobe."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Publishes the input file to the server and holds the stream
    Publish(PublishArgs),
    /// Captures a stream URL and prints what ffprobe detects
    Probe(ProbeArgs),
    /// Publishes a stream, probes the server's playback and checks the result
    Check(CheckArgs),
}

/// Harness settings shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// RTMP endpoint streams are published to
    #[arg(long = "rtmp", global = true, value_name = "URL", env = "STREAMCHECK_RTMP")]
    pub endpoint_rtmp: Option<String>,

    /// HTTP endpoint streams are played from
    #[arg(long = "http", global = true, value_name = "URL", env = "STREAMCHECK_HTTP")]
    pub endpoint_http: Option<String>,

    /// Media file the producer publishes
    #[arg(long, global = true, value_name = "FILE", env = "STREAMCHECK_INPUT")]
    pub input: Option<PathBuf>,

    /// Publish secret appended to RTMP URLs
    #[arg(long, global = true, value_name = "SECRET", env = "STREAMCHECK_SECRET")]
    pub secret: Option<String>,

    /// Scenario deadline in milliseconds
    #[arg(long, global = true, value_name = "MS", env = "STREAMCHECK_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// How much media the analyzer captures, in milliseconds
    #[arg(long, global = true, value_name = "MS", env = "STREAMCHECK_PROBE_DURATION_MS")]
    pub probe_duration_ms: Option<u64>,

    /// Absolute bound on one analyzer run, in milliseconds
    #[arg(long, global = true, value_name = "MS", env = "STREAMCHECK_PROBE_TIMEOUT_MS")]
    pub probe_timeout_ms: Option<u64>,

    /// Time between SIGTERM and SIGKILL, in milliseconds
    #[arg(long, global = true, value_name = "MS", env = "STREAMCHECK_GRACE_MS")]
    pub grace_ms: Option<u64>,

    /// Path to the ffmpeg binary
    #[arg(long, global = true, value_name = "PATH", env = "STREAMCHECK_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// Path to the ffprobe binary
    #[arg(long, global = true, value_name = "PATH", env = "STREAMCHECK_FFPROBE")]
    pub ffprobe: Option<PathBuf>,

    /// Directory for captures and report files (defaults to the system temp dir)
    #[arg(long, global = true, value_name = "DIR", env = "STREAMCHECK_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Skip everything that needs a live media server
    #[arg(long, global = true, env = "STREAMCHECK_SKIP_MEDIA_TESTS")]
    pub skip_media_tests: bool,

    /// Echo ffmpeg/ffprobe output to the log
    #[arg(long, global = true, env = "STREAMCHECK_LOG_OUTPUT")]
    pub log_output: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Stream name (defaults to a unique generated name)
    #[arg(short, long, value_name = "NAME")]
    pub stream: Option<String>,

    /// Seconds to keep publishing once live (default: until Ctrl-C)
    #[arg(long, value_name = "SECONDS")]
    pub hold: Option<u64>,

    /// Copy the input file into DIR before publishing (repeatable); the
    /// first staged copy is published
    #[arg(long = "stage-dir", value_name = "DIR")]
    pub stage_dirs: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Stream URL to capture, e.g. http://localhost:8080/live/stream.flv
    #[arg(short, long, required = true, value_name = "URL")]
    pub url: String,

    /// Print ffprobe's raw JSON instead of the summary
    #[arg(long)]
    pub json: bool,

    /// Keep the capture file after probing
    #[arg(long)]
    pub keep_dvr: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Stream name (defaults to a unique generated name)
    #[arg(short, long, value_name = "NAME")]
    pub stream: Option<String>,

    /// Minimum ffprobe score for the capture to pass
    #[arg(
        long,
        value_name = "SCORE",
        default_value_t = streamcheck_core::config::DEFAULT_MIN_PROBE_SCORE,
        value_parser = clap::value_parser!(i64).range(0..=100)
    )]
    pub min_score: i64,

    /// Number of streams the capture must contain
    #[arg(long, value_name = "COUNT", default_value_t = crate::config::DEFAULT_EXPECTED_STREAMS)]
    pub expected_streams: usize,
}
