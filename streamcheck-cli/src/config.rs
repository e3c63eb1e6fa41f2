// ============================================================================
// streamcheck-cli/src/config.rs
// ============================================================================
//
// CLI CONFIGURATION: Defaults and flag mapping
//
// Maps the global flags onto HarnessConfigBuilder. Flags that were not given
// keep the core defaults.

use crate::cli::GlobalArgs;
use std::time::Duration;
use streamcheck_core::{HarnessConfig, HarnessConfigBuilder, ToolCommand};

/// Prefix of generated stream names.
pub const DEFAULT_STREAM_PREFIX: &str = "stream";

/// Prefix of generated names for standalone probes.
pub const DEFAULT_PROBE_PREFIX: &str = "probe";

/// A published FLV test file carries one video and one audio stream.
pub const DEFAULT_EXPECTED_STREAMS: usize = 2;

/// Builds the harness configuration from the global flags.
pub fn harness_config(args: &GlobalArgs) -> HarnessConfig {
    let mut builder = HarnessConfigBuilder::new()
        .skip_media_tests(args.skip_media_tests)
        .log_output(args.log_output);

    if let Some(endpoint) = &args.endpoint_rtmp {
        builder = builder.endpoint_rtmp(endpoint.clone());
    }
    if let Some(endpoint) = &args.endpoint_http {
        builder = builder.endpoint_http(endpoint.clone());
    }
    if let Some(input) = &args.input {
        builder = builder.input_file(input.clone());
    }
    if let Some(secret) = &args.secret {
        builder = builder.publish_secret(secret.clone());
    }
    if let Some(ms) = args.timeout_ms {
        builder = builder.timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = args.probe_duration_ms {
        builder = builder.probe_duration(Duration::from_millis(ms));
    }
    if let Some(ms) = args.probe_timeout_ms {
        builder = builder.probe_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = args.grace_ms {
        builder = builder.grace_period(Duration::from_millis(ms));
    }
    if let Some(ffmpeg) = &args.ffmpeg {
        builder = builder.ffmpeg(ToolCommand::new(ffmpeg));
    }
    if let Some(ffprobe) = &args.ffprobe {
        builder = builder.ffprobe(ToolCommand::new(ffprobe));
    }
    if let Some(dir) = &args.work_dir {
        builder = builder.work_dir(dir.clone());
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_unset_flags_keep_defaults() {
        let config = harness_config(&GlobalArgs::default());
        let defaults = HarnessConfig::default();
        assert_eq!(config.endpoint_rtmp, defaults.endpoint_rtmp);
        assert_eq!(config.probe_timeout, defaults.probe_timeout);
        assert_eq!(config.ffprobe, defaults.ffprobe);
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = GlobalArgs {
            endpoint_http: Some("http://srs:8080".to_string()),
            probe_duration_ms: Some(4000),
            probe_timeout_ms: Some(9000),
            ffmpeg: Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg")),
            secret: Some("s3cr3t".to_string()),
            skip_media_tests: true,
            ..Default::default()
        };
        let config = harness_config(&args);
        assert_eq!(config.play_flv_url("x"), "http://srs:8080/live/x.flv");
        assert_eq!(config.probe_duration, Duration::from_secs(4));
        assert_eq!(config.probe_timeout, Duration::from_secs(9));
        assert_eq!(config.ffmpeg.program(), Path::new("/opt/ffmpeg/bin/ffmpeg"));
        assert!(config.publish_url("x").ends_with("?secret=s3cr3t"));
        assert!(config.skip_media_tests);
    }
}
