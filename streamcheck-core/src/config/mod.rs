//! Configuration for the streamcheck harness.
//!
//! Every knob the supervisors and scenarios read lives in [`HarnessConfig`],
//! which is built once (usually from CLI flags) and injected at construction.
//! Nothing in the core reads environment variables or globals.

mod builder;

use crate::error::{CoreError, CoreResult};
use crate::external::{AnalyzerConfig, ProducerConfig, ToolCommand, publish_args};
use crate::util::stream_id::dvr_file_name;
use std::path::PathBuf;
use std::time::Duration;

pub use builder::HarnessConfigBuilder;

// Default constants

/// RTMP endpoint streams are published to.
pub const DEFAULT_ENDPOINT_RTMP: &str = "rtmp://localhost";

/// HTTP endpoint streams are played back from.
pub const DEFAULT_ENDPOINT_HTTP: &str = "http://localhost:8080";

/// Media file the producer loops.
pub const DEFAULT_INPUT_FILE: &str = "source.flv";

/// Deadline for a regular scenario.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Deadline for scenarios that wait on slow server work (recording, DVR).
pub const DEFAULT_LONG_TIMEOUT: Duration = Duration::from_secs(180);

/// How much media the analyzer captures.
pub const DEFAULT_PROBE_DURATION: Duration = Duration::from_secs(16);

/// Absolute bound on one analyzer run. Must exceed the probe duration.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(21);

/// Minimum probe score for a capture to count as usable.
pub const DEFAULT_MIN_PROBE_SCORE: i64 = 90;

/// Main configuration for the harness.
///
/// # Examples
///
/// ```rust
/// use streamcheck_core::config::HarnessConfigBuilder;
/// use std::time::Duration;
///
/// let config = HarnessConfigBuilder::new()
///     .endpoint_rtmp("rtmp://127.0.0.1:1935")
///     .endpoint_http("http://127.0.0.1:8080")
///     .probe_duration(Duration::from_secs(8))
///     .probe_timeout(Duration::from_secs(12))
///     .build();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.play_flv_url("s1"), "http://127.0.0.1:8080/live/s1.flv");
/// ```
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub endpoint_rtmp: String,
    pub endpoint_http: String,

    /// Media file the producer publishes.
    pub input_file: PathBuf,

    pub timeout: Duration,
    pub long_timeout: Duration,

    /// Capture length for the analyzer. A soft target.
    pub probe_duration: Duration,

    /// Absolute bound on one analyzer run.
    pub probe_timeout: Duration,

    /// Time between SIGTERM and SIGKILL.
    pub grace_period: Duration,

    /// Skip every scenario that needs a live media server.
    pub skip_media_tests: bool,

    pub ffmpeg: ToolCommand,
    pub ffprobe: ToolCommand,

    /// Directory for DVR captures and report sinks.
    pub work_dir: PathBuf,

    /// Echo subprocess output at debug level.
    pub log_output: bool,

    /// Appended to publish URLs as `?secret=` when set.
    pub publish_secret: Option<String>,

    pub ready_marker: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfigBuilder::new().build()
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> CoreResult<()> {
        for (name, value) in [
            ("timeout", self.timeout),
            ("long timeout", self.long_timeout),
            ("probe duration", self.probe_duration),
            ("probe timeout", self.probe_timeout),
        ] {
            if value.is_zero() {
                return Err(CoreError::Config(format!("{name} must be positive")));
            }
        }
        if self.probe_timeout <= self.probe_duration {
            return Err(CoreError::Config(format!(
                "probe timeout {:?} must exceed probe duration {:?}",
                self.probe_timeout, self.probe_duration
            )));
        }
        if self.endpoint_rtmp.trim().is_empty() || self.endpoint_http.trim().is_empty() {
            return Err(CoreError::Config("endpoints must not be empty".to_string()));
        }
        if self.ready_marker.is_empty() {
            return Err(CoreError::Config("ready marker must not be empty".to_string()));
        }
        Ok(())
    }

    /// `{rtmp}/live/{stream}`, with `?secret=` when a publish secret is set.
    pub fn publish_url(&self, stream: &str) -> String {
        let base = format!("{}/live/{}", self.endpoint_rtmp.trim_end_matches('/'), stream);
        match self.publish_secret.as_deref() {
            Some(secret) if !secret.is_empty() => format!("{base}?secret={secret}"),
            _ => base,
        }
    }

    pub fn play_flv_url(&self, stream: &str) -> String {
        format!("{}/live/{}.flv", self.endpoint_http.trim_end_matches('/'), stream)
    }

    pub fn play_hls_url(&self, stream: &str) -> String {
        format!("{}/live/{}.m3u8", self.endpoint_http.trim_end_matches('/'), stream)
    }

    /// Producer settings for an explicit argument list.
    pub fn producer_config(&self, args: Vec<String>) -> ProducerConfig {
        let mut config = ProducerConfig::new(self.ffmpeg.clone(), args);
        config.ready_marker = self.ready_marker.clone();
        config.grace_period = self.grace_period;
        config.log_output = self.log_output;
        config
    }

    /// Producer settings that loop `input_file` into the stream's publish URL.
    pub fn publish_producer_config(&self, stream: &str) -> ProducerConfig {
        self.producer_config(publish_args(&self.input_file, &self.publish_url(stream)))
    }

    /// Analyzer settings for `stream_url`, capturing into
    /// `work_dir/streamcheck-{stream_id}.flv`.
    pub fn analyzer_config(&self, stream_url: &str, stream_id: &str) -> AnalyzerConfig {
        let mut config = AnalyzerConfig::new(
            stream_url,
            self.work_dir.join(dvr_file_name(stream_id)),
            self.probe_duration,
            self.probe_timeout,
        );
        config.ffmpeg = self.ffmpeg.clone();
        config.ffprobe = self.ffprobe.clone();
        config.grace_period = self.grace_period;
        config.log_output = self.log_output;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = HarnessConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.probe_duration, DEFAULT_PROBE_DURATION);
        assert_eq!(config.ffmpeg.name(), "ffmpeg");
        assert!(!config.skip_media_tests);
    }

    #[test]
    fn test_validate_rejects_probe_timeout_below_duration() {
        let config = HarnessConfigBuilder::new()
            .probe_duration(Duration::from_secs(10))
            .probe_timeout(Duration::from_secs(10))
            .build();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must exceed probe duration"));

        let config = HarnessConfigBuilder::new().timeout(Duration::ZERO).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_urls() {
        let config = HarnessConfigBuilder::new()
            .endpoint_rtmp("rtmp://srs/")
            .endpoint_http("http://srs:8080")
            .build();
        assert_eq!(config.publish_url("s1"), "rtmp://srs/live/s1");
        assert_eq!(config.play_flv_url("s1"), "http://srs:8080/live/s1.flv");
        assert_eq!(config.play_hls_url("s1"), "http://srs:8080/live/s1.m3u8");

        let config = HarnessConfigBuilder::new().publish_secret("abc").build();
        assert_eq!(config.publish_url("s1"), "rtmp://localhost/live/s1?secret=abc");
    }

    #[test]
    fn test_supervisor_configs_inherit_harness_settings() {
        let config = HarnessConfigBuilder::new()
            .grace_period(Duration::from_millis(700))
            .work_dir("/var/tmp/sc")
            .log_output(true)
            .input_file("/data/bbb.flv")
            .build();

        let producer = config.publish_producer_config("s1");
        assert_eq!(producer.grace_period, Duration::from_millis(700));
        assert!(producer.log_output);
        assert_eq!(producer.args.last().map(String::as_str), Some("rtmp://localhost/live/s1"));
        assert!(producer.args.contains(&"/data/bbb.flv".to_string()));

        let analyzer = config.analyzer_config(&config.play_flv_url("s1"), "s1");
        assert_eq!(analyzer.dvr_file, PathBuf::from("/var/tmp/sc/streamcheck-s1.flv"));
        assert_eq!(analyzer.duration, config.probe_duration);
        assert_eq!(analyzer.timeout, config.probe_timeout);
        assert!(analyzer.validate().is_ok());
    }
}
