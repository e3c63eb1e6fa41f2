// ============================================================================
// streamcheck-core/src/external/producer.rs
// ============================================================================
//
// PRODUCER SUPERVISOR: Publishes a stream into the server with ffmpeg
//
// The producer runs until its input ends, it fails, or the caller cancels.
// While it runs, its stdout and stderr are scanned for the ready marker that
// ffmpeg prints once the output mapping is set up, which is the point where
// the server has accepted the publish.
//
// KEY COMPONENTS:
// - ProducerConfig: tool, arguments, ready marker, grace period
// - Producer: run() plus the one-shot ready gate
// - publish_args: the default "loop a file into an RTMP URL" arguments

use super::process::{self, DEFAULT_GRACE_PERIOD, Finished, OutputTail, ToolCommand};
use crate::error::{CoreError, CoreResult, command_failed_error};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Line fragment ffmpeg prints once its stream mapping is established.
pub const DEFAULT_READY_MARKER: &str = "Stream mapping:";

/// Settings for one producer run.
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Producer tool, normally ffmpeg.
    pub ffmpeg: ToolCommand,
    /// Full argument list: input, codec flags and output URL.
    pub args: Vec<String>,
    /// Substring that marks the producer as publishing.
    pub ready_marker: String,
    /// Time allowed between SIGTERM and SIGKILL.
    pub grace_period: Duration,
    /// Log every output line at debug level instead of trace.
    pub log_output: bool,
}

impl ProducerConfig {
    pub fn new(ffmpeg: ToolCommand, args: Vec<String>) -> Self {
        Self {
            ffmpeg,
            args,
            ready_marker: DEFAULT_READY_MARKER.to_string(),
            grace_period: DEFAULT_GRACE_PERIOD,
            log_output: false,
        }
    }
}

/// Arguments that loop `input` forever in real time and publish it as FLV.
pub fn publish_args(input: &Path, url: &str) -> Vec<String> {
    vec![
        "-re".to_string(),
        "-stream_loop".to_string(),
        "-1".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-c".to_string(),
        "copy".to_string(),
        "-f".to_string(),
        "flv".to_string(),
        url.to_string(),
    ]
}

/// Supervises a media-producing subprocess.
///
/// `run` is normally awaited on its own task while the caller waits on
/// [`Producer::ready`] raced against its own deadline:
///
/// ```rust,no_run
/// # use streamcheck_core::external::{Producer, ProducerConfig, ToolCommand, publish_args};
/// # use tokio_util::sync::CancellationToken;
/// # use std::{path::Path, sync::Arc};
/// # async fn demo() {
/// let ctx = CancellationToken::new();
/// let producer = Arc::new(Producer::new(ProducerConfig::new(
///     ToolCommand::new("ffmpeg"),
///     publish_args(Path::new("source.flv"), "rtmp://localhost/live/demo"),
/// )));
///
/// let task = {
///     let (producer, ctx) = (producer.clone(), ctx.clone());
///     tokio::spawn(async move { producer.run(&ctx, &ctx).await })
/// };
///
/// let ready = producer.ready();
/// tokio::select! {
///     _ = ctx.cancelled() => {}
///     _ = ready.cancelled() => {}
/// }
/// ctx.cancel();
/// let _ = task.await;
/// # }
/// ```
#[derive(Debug)]
pub struct Producer {
    config: ProducerConfig,
    ready: CancellationToken,
    started: AtomicBool,
}

impl Producer {
    pub fn new(config: ProducerConfig) -> Self {
        Self {
            config,
            ready: CancellationToken::new(),
            started: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// The ready gate. It fires at most once, on the first marker line, and
    /// is never fired by a failure: always race it against a deadline.
    pub fn ready(&self) -> CancellationToken {
        self.ready.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_cancelled()
    }

    /// Runs the producer to completion.
    ///
    /// Cancelling `ctx` terminates the subprocess and is not an error. When
    /// `run` returns, `external_cancel` is cancelled so the tasks paired with
    /// this producer wind down too. Callers usually pass the same token twice.
    pub async fn run(
        &self,
        ctx: &CancellationToken,
        external_cancel: &CancellationToken,
    ) -> CoreResult<()> {
        let result = self.run_inner(ctx, external_cancel).await;
        external_cancel.cancel();
        result
    }

    async fn run_inner(
        &self,
        ctx: &CancellationToken,
        external_cancel: &CancellationToken,
    ) -> CoreResult<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(CoreError::Config("a producer can only run once".to_string()));
        }

        let name = self.config.ffmpeg.name();
        log::info!(
            "Starting producer {} (waiting for {:?})",
            name,
            self.config.ready_marker
        );

        let mut child = process::spawn(
            &self.config.ffmpeg,
            &self.config.args,
            Stdio::piped(),
            Stdio::piped(),
        )?;

        let tail = OutputTail::default();
        let mut scanners = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            scanners.push(process::spawn_scanner(
                stdout,
                name.clone(),
                "stdout",
                tail.clone(),
                self.config.log_output,
                ready_detector(self.config.ready_marker.clone(), self.ready.clone()),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            scanners.push(process::spawn_scanner(
                stderr,
                name.clone(),
                "stderr",
                tail.clone(),
                self.config.log_output,
                ready_detector(self.config.ready_marker.clone(), self.ready.clone()),
            ));
        }

        let finished =
            process::supervise(&mut child, &name, ctx, None, self.config.grace_period).await?;
        process::drain_scanners(scanners).await;

        self.classify_exit(&name, finished, ctx, external_cancel, &tail)
    }

    fn classify_exit(
        &self,
        name: &str,
        finished: Finished,
        ctx: &CancellationToken,
        external_cancel: &CancellationToken,
        tail: &OutputTail,
    ) -> CoreResult<()> {
        let status = finished.status;
        if status.success() {
            log::info!("Producer {} finished ({})", name, status);
            return Ok(());
        }

        let cancelled = ctx.is_cancelled() || external_cancel.is_cancelled();
        if finished.terminated_by_us() || (cancelled && process::ended_by_signal(&status)) {
            log::info!("Producer {} stopped after cancellation ({})", name, status);
            return Ok(());
        }

        log::error!("Producer {} failed ({})", name, status);
        Err(command_failed_error(name, status, tail.snapshot()))
    }
}

/// Line callback that fires `ready` on the first line containing `marker`.
fn ready_detector(marker: String, ready: CancellationToken) -> impl Fn(&str) + Send + 'static {
    move |line: &str| {
        if !ready.is_cancelled() && line.contains(&marker) {
            log::info!("Producer is publishing: {}", line.trim());
            ready.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_args_layout() {
        let args = publish_args(Path::new("/data/bbb.flv"), "rtmp://localhost/live/s1");
        assert_eq!(
            args,
            vec![
                "-re", "-stream_loop", "-1", "-i", "/data/bbb.flv", "-c", "copy", "-f", "flv",
                "rtmp://localhost/live/s1"
            ]
        );
    }

    #[test]
    fn test_ready_detector_fires_once() {
        let producer = Producer::new(ProducerConfig::new(ToolCommand::new("ffmpeg"), vec![]));
        let detect = ready_detector(producer.config().ready_marker.clone(), producer.ready());

        detect("Input #0, flv, from 'source.flv':");
        assert!(!producer.is_ready());
        detect("Stream mapping:");
        assert!(producer.is_ready());
        detect("Stream mapping:");
        assert!(producer.ready().is_cancelled());
    }
}
