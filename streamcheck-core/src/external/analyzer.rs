// ============================================================================
// streamcheck-core/src/external/analyzer.rs
// ============================================================================
//
// ANALYZER SUPERVISOR: Captures a stream and reports what it contains
//
// A run has two phases, both inside one absolute timeout:
//
// 1. Capture: ffmpeg copies `duration` worth of the stream into the DVR file.
// 2. Probe: ffprobe reads the DVR file and prints a JSON report into a
//    temp-file sink.
//
// Timeouts and cancellation terminate the running phase; whatever was
// captured or flushed is still used. The report is stored once and then the
// probe-done gate fires, so callers can assert before teardown finishes.
//
// KEY COMPONENTS:
// - AnalyzerConfig: URL, DVR path, duration/timeout, tools
// - Analyzer: run(), probe_done(), result(), try_result()

use super::process::{self, DEFAULT_GRACE_PERIOD, OutputTail, ToolCommand, WaitEnd};
use crate::error::{CoreError, CoreResult, command_failed_error};
use crate::media::ProbeReport;
use crate::temp_files;
use crate::util::format_bytes;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Settings for one analyzer run.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Stream to analyze, e.g. `http://localhost:8080/live/stream.flv`.
    pub stream_url: String,
    /// Capture artifact the probe reads.
    pub dvr_file: PathBuf,
    /// How much media to capture. A soft target: the probe score, not this
    /// duration, says whether the data was usable.
    pub duration: Duration,
    /// Absolute bound on the whole run. Must exceed `duration`.
    pub timeout: Duration,
    /// Capture tool, normally ffmpeg.
    pub ffmpeg: ToolCommand,
    /// Analyzer tool, normally ffprobe.
    pub ffprobe: ToolCommand,
    pub grace_period: Duration,
    /// Leave the DVR file on disk after the run.
    pub keep_dvr: bool,
    pub log_output: bool,
}

impl AnalyzerConfig {
    pub fn new(
        stream_url: impl Into<String>,
        dvr_file: impl Into<PathBuf>,
        duration: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            stream_url: stream_url.into(),
            dvr_file: dvr_file.into(),
            duration,
            timeout,
            ffmpeg: ToolCommand::new("ffmpeg"),
            ffprobe: ToolCommand::new("ffprobe"),
            grace_period: DEFAULT_GRACE_PERIOD,
            keep_dvr: false,
            log_output: false,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.stream_url.trim().is_empty() {
            return Err(CoreError::Config("analyzer stream URL is empty".to_string()));
        }
        if self.duration.is_zero() {
            return Err(CoreError::Config("probe duration must be positive".to_string()));
        }
        if self.timeout <= self.duration {
            return Err(CoreError::Config(format!(
                "probe timeout {:?} must exceed probe duration {:?}",
                self.timeout, self.duration
            )));
        }
        Ok(())
    }

    /// Time at the end of the timeout kept free for the probe. The capture is
    /// stopped this long before the deadline.
    pub fn probe_reserve(&self) -> Duration {
        self.grace_period.min(self.timeout.saturating_sub(self.duration))
    }

    /// ffmpeg arguments that copy `duration` of the stream into the DVR file.
    pub fn capture_args(&self) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            self.stream_url.clone(),
            "-c".to_string(),
            "copy".to_string(),
            "-t".to_string(),
            format!("{:.3}", self.duration.as_secs_f64()),
            "-f".to_string(),
            "flv".to_string(),
            self.dvr_file.to_string_lossy().into_owned(),
        ]
    }

    /// ffprobe arguments that print the JSON report for the DVR file.
    pub fn probe_args(&self) -> Vec<String> {
        vec![
            "-show_error".to_string(),
            "-show_private_data".to_string(),
            "-v".to_string(),
            "quiet".to_string(),
            "-find_stream_info".to_string(),
            "-analyzeduration".to_string(),
            self.duration.as_micros().to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
            self.dvr_file.to_string_lossy().into_owned(),
        ]
    }
}

/// Final state of a run: the raw transcript, the parsed report, and why the
/// report is unusable if it is.
#[derive(Debug, Default)]
struct ProbeOutcome {
    raw: String,
    report: ProbeReport,
    error: Option<String>,
}

impl ProbeOutcome {
    fn empty(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Default::default()
        }
    }

    fn from_raw(raw: String) -> Self {
        match ProbeReport::parse(&raw) {
            Ok(report) => Self {
                raw,
                report,
                error: None,
            },
            Err(e) => {
                log::warn!("{}", e);
                Self {
                    raw,
                    report: ProbeReport::default(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Supervises the capture and analysis of one stream.
#[derive(Debug)]
pub struct Analyzer {
    config: AnalyzerConfig,
    probe_done: CancellationToken,
    outcome: OnceLock<ProbeOutcome>,
    started: AtomicBool,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            probe_done: CancellationToken::new(),
            outcome: OnceLock::new(),
            started: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// The probe-done gate: fires at most once, after the report is stored.
    /// Race it against a deadline; a run that fails to start never fires it.
    pub fn probe_done(&self) -> CancellationToken {
        self.probe_done.clone()
    }

    /// Raw transcript and parsed report.
    ///
    /// Only meaningful once `run` has returned or the probe-done gate has
    /// fired; before that it returns an empty transcript and a zero-value
    /// report. A malformed or missing report also yields a zero-value report.
    pub fn result(&self) -> (String, ProbeReport) {
        match self.outcome.get() {
            Some(outcome) => (outcome.raw.clone(), outcome.report.clone()),
            None => (String::new(), ProbeReport::default()),
        }
    }

    /// Like [`Analyzer::result`], but reports an unusable report as
    /// [`CoreError::PartialReport`].
    pub fn try_result(&self) -> CoreResult<(String, ProbeReport)> {
        match self.outcome.get() {
            None => Err(CoreError::PartialReport("analyzer has not finished".to_string())),
            Some(ProbeOutcome {
                error: Some(reason),
                ..
            }) => Err(CoreError::PartialReport(reason.clone())),
            Some(outcome) => Ok((outcome.raw.clone(), outcome.report.clone())),
        }
    }

    /// Captures and probes the stream.
    ///
    /// Returns an error only when a tool cannot be started or the probe fails
    /// on its own; timeouts and cancellation end the run early but still
    /// produce a (possibly empty) report. `external_cancel` is cancelled on
    /// return.
    pub async fn run(
        &self,
        ctx: &CancellationToken,
        external_cancel: &CancellationToken,
    ) -> CoreResult<()> {
        let result = self.run_inner(ctx).await;
        external_cancel.cancel();
        result
    }

    async fn run_inner(&self, ctx: &CancellationToken) -> CoreResult<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(CoreError::Config("an analyzer can only run once".to_string()));
        }
        self.config.validate()?;

        let deadline = Instant::now() + self.config.timeout;
        log::info!(
            "Starting analyzer for {} (duration {:?}, timeout {:?}, dvr {})",
            self.config.stream_url,
            self.config.duration,
            self.config.timeout,
            self.config.dvr_file.display()
        );

        let capture_deadline = deadline - self.config.probe_reserve();
        let captured = match self.capture(ctx, capture_deadline).await {
            Ok(captured) => captured,
            Err(e) => {
                self.store(ProbeOutcome::empty(e.to_string()));
                self.remove_dvr().await;
                return Err(e);
            }
        };

        let (outcome, status) = if captured {
            // A cancelled caller still gets a best-effort probe of the partial
            // capture, bounded by the grace period. Otherwise the probe ends by
            // the run deadline.
            let (probe_ctx, budget) = if ctx.is_cancelled() {
                (CancellationToken::new(), self.config.grace_period)
            } else {
                (ctx.clone(), deadline.saturating_duration_since(Instant::now()))
            };
            self.probe(&probe_ctx, budget).await
        } else {
            log::warn!("No media captured from {}", self.config.stream_url);
            (ProbeOutcome::empty("no media captured"), Ok(()))
        };

        self.store(outcome);
        self.probe_done.cancel();
        self.remove_dvr().await;
        status
    }

    /// Captures into the DVR file until the capture ends, the deadline
    /// passes, or `ctx` is cancelled. Returns whether any data was captured.
    async fn capture(&self, ctx: &CancellationToken, deadline: Instant) -> CoreResult<bool> {
        let name = self.config.ffmpeg.name();
        self.remove_dvr().await;

        let mut child = process::spawn(
            &self.config.ffmpeg,
            &self.config.capture_args(),
            Stdio::null(),
            Stdio::piped(),
        )?;
        let tail = OutputTail::default();
        let scanners = child
            .stderr
            .take()
            .map(|stderr| {
                process::spawn_scanner(
                    stderr,
                    name.clone(),
                    "stderr",
                    tail.clone(),
                    self.config.log_output,
                    |_: &str| {},
                )
            })
            .into_iter()
            .collect();

        let finished = process::supervise(
            &mut child,
            &name,
            ctx,
            Some(deadline),
            self.config.grace_period,
        )
        .await?;
        process::drain_scanners(scanners).await;

        let size = self.dvr_size().await;
        match finished.end {
            WaitEnd::Exited if finished.status.success() => {
                log::debug!("Capture finished with {}", format_bytes(size));
            }
            WaitEnd::Exited => {
                let output = tail.snapshot();
                log::warn!(
                    "Capture of {} failed ({}) after {}: {}",
                    self.config.stream_url,
                    finished.status,
                    format_bytes(size),
                    output.lines().last().unwrap_or("no output")
                );
            }
            WaitEnd::Cancelled => {
                log::info!("Capture cancelled after {}", format_bytes(size));
            }
            WaitEnd::DeadlineExceeded => log::warn!(
                "{} (captured {})",
                CoreError::TimeoutExceeded {
                    program: name.clone(),
                    timeout: self.config.timeout,
                },
                format_bytes(size)
            ),
        }

        Ok(size > 0)
    }

    /// Runs the analyzer over the DVR file. The outcome is always produced;
    /// the status carries spawn failures and abnormal exits.
    async fn probe(
        &self,
        ctx: &CancellationToken,
        budget: Duration,
    ) -> (ProbeOutcome, CoreResult<()>) {
        let name = self.config.ffprobe.name();

        let sink = match temp_files::create_report_sink(&self.config.dvr_file) {
            Ok(sink) => sink,
            Err(e) => return (ProbeOutcome::empty(e.to_string()), Err(e)),
        };
        let stdout = match sink.as_file().try_clone() {
            Ok(file) => Stdio::from(file),
            Err(e) => return (ProbeOutcome::empty(e.to_string()), Err(e.into())),
        };

        let mut child = match process::spawn(
            &self.config.ffprobe,
            &self.config.probe_args(),
            stdout,
            Stdio::piped(),
        ) {
            Ok(child) => child,
            Err(e) => return (ProbeOutcome::empty(e.to_string()), Err(e)),
        };

        let tail = OutputTail::default();
        let scanners = child
            .stderr
            .take()
            .map(|stderr| {
                process::spawn_scanner(
                    stderr,
                    name.clone(),
                    "stderr",
                    tail.clone(),
                    self.config.log_output,
                    |_: &str| {},
                )
            })
            .into_iter()
            .collect();

        let finished = process::supervise(
            &mut child,
            &name,
            ctx,
            Some(Instant::now() + budget),
            self.config.grace_period,
        )
        .await;
        process::drain_scanners(scanners).await;

        let raw = match tokio::fs::read(sink.path()).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                log::warn!("Failed to read report sink {}: {}", sink.path().display(), e);
                String::new()
            }
        };
        let outcome = ProbeOutcome::from_raw(raw);
        log::info!("Probe of {}: {}", self.config.stream_url, outcome.report);

        let status = match finished {
            Err(e) => Err(e),
            Ok(finished) if finished.status.success() => Ok(()),
            Ok(finished) if finished.terminated_by_us() => {
                log::warn!("Probe stopped early ({:?}), report may be partial", finished.end);
                Ok(())
            }
            Ok(finished) => Err(command_failed_error(name, finished.status, tail.snapshot())),
        };
        (outcome, status)
    }

    fn store(&self, outcome: ProbeOutcome) {
        if self.outcome.set(outcome).is_err() {
            log::warn!("Analyzer outcome already stored, keeping the first one");
        }
    }

    async fn dvr_size(&self) -> u64 {
        tokio::fs::metadata(&self.config.dvr_file)
            .await
            .map(|m| m.len())
            .unwrap_or(0)
    }

    async fn remove_dvr(&self) {
        if self.config.keep_dvr && self.outcome.get().is_some() {
            return;
        }
        match tokio::fs::remove_file(&self.config.dvr_file).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove {}: {}",
                self.config.dvr_file.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AnalyzerConfig {
        AnalyzerConfig::new(
            "http://localhost:8080/live/s1.flv",
            "/tmp/streamcheck-s1.flv",
            Duration::from_millis(2500),
            Duration::from_secs(10),
        )
    }

    #[test]
    fn test_capture_args() {
        let args = config().capture_args();
        assert_eq!(
            args,
            vec![
                "-y", "-i", "http://localhost:8080/live/s1.flv", "-c", "copy", "-t", "2.500",
                "-f", "flv", "/tmp/streamcheck-s1.flv"
            ]
        );
    }

    #[test]
    fn test_probe_args() {
        let args = config().probe_args();
        let pos = args.iter().position(|a| a == "-analyzeduration").unwrap();
        assert_eq!(args[pos + 1], "2500000");
        assert!(args.windows(2).any(|w| w == ["-print_format", "json"]));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/streamcheck-s1.flv"));
    }

    #[test]
    fn test_validate_rejects_timeout_not_above_duration() {
        let mut cfg = config();
        cfg.timeout = cfg.duration;
        assert!(matches!(cfg.validate(), Err(CoreError::Config(_))));

        cfg.timeout = Duration::from_secs(10);
        cfg.duration = Duration::ZERO;
        assert!(cfg.validate().is_err());

        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_probe_reserve_fits_inside_timeout() {
        let mut cfg = config();
        assert_eq!(cfg.probe_reserve(), DEFAULT_GRACE_PERIOD);

        cfg.timeout = Duration::from_secs(3);
        assert_eq!(cfg.probe_reserve(), Duration::from_millis(500));
    }

    #[test]
    fn test_result_before_run_is_empty() {
        let analyzer = Analyzer::new(config());
        let (raw, report) = analyzer.result();
        assert!(raw.is_empty());
        assert!(report.is_empty());
        assert!(analyzer.try_result().is_err());
        assert!(!analyzer.probe_done().is_cancelled());
    }

    #[test]
    fn test_outcome_from_malformed_raw_keeps_transcript() {
        let outcome = ProbeOutcome::from_raw("{\"streams\": [".to_string());
        assert_eq!(outcome.raw, "{\"streams\": [");
        assert!(outcome.report.streams.is_empty());
        assert!(outcome.error.is_some());
    }
}
