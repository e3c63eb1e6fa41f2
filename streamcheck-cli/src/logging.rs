// ============================================================================
// streamcheck-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: env_logger initialization
//
// USAGE:
// The application uses env_logger with the RUST_LOG environment variable:
// - RUST_LOG=info (default): Normal operation logs
// - RUST_LOG=debug: Command lines and capture progress
// - RUST_LOG=trace: Every line ffmpeg/ffprobe print
//
// `--verbose` forces debug for the streamcheck crates regardless of RUST_LOG.

use log::LevelFilter;
use std::io::Write;

/// Initializes the global logger. Safe to call more than once.
pub fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder
            .filter_module("streamcheck_core", LevelFilter::Debug)
            .filter_module("streamcheck_cli", LevelFilter::Debug);
    }
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {:<5} {}",
            buf.timestamp_millis(),
            record.level(),
            record.args()
        )
    });
    let _ = builder.try_init();
}
