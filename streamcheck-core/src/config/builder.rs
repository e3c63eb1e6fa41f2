// ============================================================================
// streamcheck-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for HarnessConfig
//
// Fluent construction of HarnessConfig with defaults for every field. The
// builder does not validate; call HarnessConfig::validate() on the result.
//
// KEY COMPONENTS:
// - HarnessConfigBuilder: Builder struct for creating HarnessConfig instances

// ---- Standard library imports ----
use std::path::PathBuf;
use std::time::Duration;

// ---- Internal crate imports ----
use super::HarnessConfig;
use crate::external::{DEFAULT_GRACE_PERIOD, DEFAULT_READY_MARKER, ToolCommand};

/// Builder for creating HarnessConfig instances.
#[derive(Debug, Clone)]
pub struct HarnessConfigBuilder {
    config: HarnessConfig,
}

impl Default for HarnessConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HarnessConfigBuilder {
    /// Creates a new builder holding the default configuration.
    pub fn new() -> Self {
        Self {
            config: HarnessConfig {
                endpoint_rtmp: super::DEFAULT_ENDPOINT_RTMP.to_string(),
                endpoint_http: super::DEFAULT_ENDPOINT_HTTP.to_string(),
                input_file: PathBuf::from(super::DEFAULT_INPUT_FILE),
                timeout: super::DEFAULT_TIMEOUT,
                long_timeout: super::DEFAULT_LONG_TIMEOUT,
                probe_duration: super::DEFAULT_PROBE_DURATION,
                probe_timeout: super::DEFAULT_PROBE_TIMEOUT,
                grace_period: DEFAULT_GRACE_PERIOD,
                skip_media_tests: false,
                ffmpeg: ToolCommand::new("ffmpeg"),
                ffprobe: ToolCommand::new("ffprobe"),
                work_dir: std::env::temp_dir(),
                log_output: false,
                publish_secret: None,
                ready_marker: DEFAULT_READY_MARKER.to_string(),
            },
        }
    }

    pub fn endpoint_rtmp(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint_rtmp = endpoint.into();
        self
    }

    pub fn endpoint_http(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint_http = endpoint.into();
        self
    }

    /// Sets the media file the producer publishes.
    pub fn input_file(mut self, input_file: impl Into<PathBuf>) -> Self {
        self.config.input_file = input_file.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn long_timeout(mut self, timeout: Duration) -> Self {
        self.config.long_timeout = timeout;
        self
    }

    /// Sets how much media the analyzer captures.
    pub fn probe_duration(mut self, duration: Duration) -> Self {
        self.config.probe_duration = duration;
        self
    }

    /// Sets the absolute bound on an analyzer run.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.config.grace_period = grace;
        self
    }

    pub fn skip_media_tests(mut self, skip: bool) -> Self {
        self.config.skip_media_tests = skip;
        self
    }

    pub fn ffmpeg(mut self, ffmpeg: ToolCommand) -> Self {
        self.config.ffmpeg = ffmpeg;
        self
    }

    pub fn ffprobe(mut self, ffprobe: ToolCommand) -> Self {
        self.config.ffprobe = ffprobe;
        self
    }

    /// Sets the directory for DVR captures and report sinks.
    pub fn work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = work_dir.into();
        self
    }

    pub fn log_output(mut self, enable: bool) -> Self {
        self.config.log_output = enable;
        self
    }

    pub fn publish_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.publish_secret = Some(secret.into());
        self
    }

    pub fn ready_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.ready_marker = marker.into();
        self
    }

    /// Builds the HarnessConfig instance.
    pub fn build(self) -> HarnessConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = HarnessConfigBuilder::new().build();
        assert_eq!(config.endpoint_rtmp, super::super::DEFAULT_ENDPOINT_RTMP);
        assert_eq!(config.timeout, super::super::DEFAULT_TIMEOUT);
        assert_eq!(config.ready_marker, "Stream mapping:");
        assert_eq!(config.publish_secret, None);
    }

    #[test]
    fn test_builder_overrides() {
        let config = HarnessConfigBuilder::new()
            .ffmpeg(ToolCommand::with_base_args("docker", ["exec", "srs", "ffmpeg"]))
            .skip_media_tests(true)
            .long_timeout(Duration::from_secs(5))
            .ready_marker("Press [q]")
            .build();
        assert_eq!(config.ffmpeg.base_args(), ["exec", "srs", "ffmpeg"]);
        assert!(config.skip_media_tests);
        assert_eq!(config.long_timeout, Duration::from_secs(5));
        assert_eq!(config.ready_marker, "Press [q]");
    }
}
