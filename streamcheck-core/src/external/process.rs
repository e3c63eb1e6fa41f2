// ============================================================================
// streamcheck-core/src/external/process.rs
// ============================================================================
//
// PROCESS LIFECYCLE: Shared plumbing for supervised subprocesses
//
// Both supervisors spawn a tool, scan its output line by line, race its exit
// against cancellation or a deadline, and terminate it cooperatively (SIGTERM,
// then SIGKILL after a grace period). This module holds those pieces.
//
// KEY COMPONENTS:
// - ToolCommand: program plus leading arguments for an external tool
// - supervise / terminate: exit racing and escalation
// - spawn_scanner: per-stream line scanner feeding an OutputTail

use crate::error::{CoreResult, command_start_error, command_wait_error};
use crate::util::logging::{log_command, log_output_line};
use std::collections::VecDeque;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Time a subprocess gets to exit after SIGTERM before it is killed.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// How long the wait path lets scanners drain once the subprocess is gone.
pub(crate) const SCANNER_DRAIN: Duration = Duration::from_millis(500);

/// Number of output lines kept for error messages.
const OUTPUT_TAIL_LINES: usize = 32;

/// An external tool: the program and any arguments that always precede the
/// per-run arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    base_args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
        }
    }

    /// A tool invoked through a wrapper, e.g. `sh -c <script> sh` in tests or
    /// `docker exec <container> ffmpeg` against a containerized server.
    pub fn with_base_args<I, S>(program: impl Into<PathBuf>, base_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            base_args: base_args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn base_args(&self) -> &[String] {
        &self.base_args
    }

    /// Short name used in logs and errors.
    pub fn name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    pub(crate) fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

/// Spawns `tool` with `args`, wiring stdout and stderr as given.
pub(crate) fn spawn(
    tool: &ToolCommand,
    args: &[String],
    stdout: Stdio,
    stderr: Stdio,
) -> CoreResult<Child> {
    let mut cmd = tool.command(args);
    cmd.stdout(stdout).stderr(stderr);
    log_command(&cmd);

    cmd.spawn().map_err(|e| {
        log::error!("Failed to spawn {}: {}", tool.name(), e);
        command_start_error(tool.name(), e)
    })
}

/// Why a supervised wait stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitEnd {
    /// The subprocess exited on its own.
    Exited,
    /// The caller's token was cancelled and we terminated the subprocess.
    Cancelled,
    /// The deadline passed and we terminated the subprocess.
    DeadlineExceeded,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Finished {
    pub status: ExitStatus,
    pub end: WaitEnd,
}

impl Finished {
    pub fn terminated_by_us(&self) -> bool {
        self.end != WaitEnd::Exited
    }
}

/// Waits for `child` to exit, terminating it if `ctx` is cancelled or the
/// deadline passes first.
pub(crate) async fn supervise(
    child: &mut Child,
    name: &str,
    ctx: &CancellationToken,
    deadline: Option<Instant>,
    grace: Duration,
) -> CoreResult<Finished> {
    let deadline_reached = async {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    };

    let end = tokio::select! {
        biased;
        status = child.wait() => {
            let status = status.map_err(|e| command_wait_error(name, e))?;
            return Ok(Finished { status, end: WaitEnd::Exited });
        }
        _ = ctx.cancelled() => WaitEnd::Cancelled,
        _ = deadline_reached => WaitEnd::DeadlineExceeded,
    };

    log::debug!("Stopping {} ({:?})", name, end);
    let status = terminate(child, name, grace).await?;
    Ok(Finished { status, end })
}

/// Sends SIGTERM, waits up to `grace`, then kills. Returns the reaped status.
pub(crate) async fn terminate(
    child: &mut Child,
    name: &str,
    grace: Duration,
) -> CoreResult<ExitStatus> {
    if let Some(status) = child.try_wait().map_err(|e| command_wait_error(name, e))? {
        return Ok(status);
    }

    send_terminate(child, name);

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => status.map_err(|e| command_wait_error(name, e)),
        Err(_) => {
            log::warn!("{} still running {:?} after SIGTERM, killing", name, grace);
            child.kill().await.map_err(|e| command_wait_error(name, e))?;
            child.wait().await.map_err(|e| command_wait_error(name, e))
        }
    }
}

#[cfg(unix)]
fn send_terminate(child: &mut Child, name: &str) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        log::warn!("Failed to send SIGTERM to {} (pid {}): {}", name, pid, e);
        let _ = child.start_kill();
    }
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child, _name: &str) {
    let _ = child.start_kill();
}

/// True when the process was ended by a signal rather than exiting.
pub(crate) fn ended_by_signal(status: &ExitStatus) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status.signal().is_some()
    }
    #[cfg(not(unix))]
    {
        let _ = status;
        false
    }
}

/// Bounded ring of the most recent output lines.
#[derive(Debug, Clone, Default)]
pub(crate) struct OutputTail(Arc<Mutex<VecDeque<String>>>);

impl OutputTail {
    pub fn push(&self, line: String) {
        let mut lines = self.0.lock().unwrap_or_else(|e| e.into_inner());
        if lines.len() == OUTPUT_TAIL_LINES {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    pub fn snapshot(&self) -> String {
        let lines = self.0.lock().unwrap_or_else(|e| e.into_inner());
        lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

/// Scans one output stream of `program` until end of stream.
///
/// Every non-empty line is logged, recorded in `tail`, and handed to
/// `on_line`. Read errors end the scan with a warning; they never affect the
/// subprocess itself.
pub(crate) fn spawn_scanner<R, F>(
    reader: R,
    program: String,
    stream: &'static str,
    tail: OutputTail,
    echo: bool,
    on_line: F,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    F: Fn(&str) + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut segment = Vec::new();
        loop {
            match read_segment(&mut reader, &mut segment).await {
                Ok(true) => {
                    let line = String::from_utf8_lossy(&segment);
                    let line = line.trim_end();
                    if line.is_empty() {
                        continue;
                    }
                    log_output_line(&program, stream, line, echo);
                    on_line(line);
                    tail.push(line.to_string());
                }
                Ok(false) => break,
                Err(e) => {
                    log::warn!("Error reading {} of {}: {}", stream, program, e);
                    break;
                }
            }
        }
    })
}

/// Lets scanners finish reading buffered output, then aborts stragglers
/// (a grandchild may still hold the pipe open).
pub(crate) async fn drain_scanners(scanners: Vec<JoinHandle<()>>) {
    for mut scanner in scanners {
        if tokio::time::timeout(SCANNER_DRAIN, &mut scanner).await.is_err() {
            scanner.abort();
        }
    }
}

/// Reads up to the next `\n` or `\r`.
///
/// ffmpeg rewrites its progress line with carriage returns, so splitting on
/// `\n` alone would buffer the whole progress history. Returns `false` at end
/// of stream with nothing read.
pub(crate) async fn read_segment<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(!buf.is_empty());
        }
        if let Some(pos) = available.iter().position(|b| *b == b'\n' || *b == b'\r') {
            buf.extend_from_slice(&available[..pos]);
            reader.consume(pos + 1);
            return Ok(true);
        }
        let len = available.len();
        buf.extend_from_slice(available);
        reader.consume(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn segments(input: &[u8]) -> Vec<String> {
        let mut reader = input;
        let mut buf = Vec::new();
        let mut out = Vec::new();
        while read_segment(&mut reader, &mut buf).await.unwrap() {
            out.push(String::from_utf8_lossy(&buf).into_owned());
        }
        out
    }

    #[tokio::test]
    async fn test_read_segment_splits_on_cr_and_lf() {
        let out = segments(b"Stream mapping:\n  Stream #0:0 -> #0:0\nframe=1\rframe=2\rtail").await;
        assert_eq!(
            out,
            vec!["Stream mapping:", "  Stream #0:0 -> #0:0", "frame=1", "frame=2", "tail"]
        );
    }

    #[tokio::test]
    async fn test_read_segment_crlf_yields_empty_segment() {
        let out = segments(b"a\r\nb\r\n").await;
        assert_eq!(out, vec!["a", "", "b", ""]);
    }

    #[test]
    fn test_output_tail_keeps_most_recent_lines() {
        let tail = OutputTail::default();
        for i in 0..(OUTPUT_TAIL_LINES + 5) {
            tail.push(format!("line {i}"));
        }
        let snapshot = tail.snapshot();
        assert!(!snapshot.contains("line 4\n"));
        assert!(snapshot.starts_with("line 5"));
        assert!(snapshot.ends_with(&format!("line {}", OUTPUT_TAIL_LINES + 4)));
    }

    #[test]
    fn test_tool_name_uses_file_name() {
        let tool = ToolCommand::new("/usr/local/bin/ffmpeg");
        assert_eq!(tool.name(), "ffmpeg");
        let wrapped = ToolCommand::with_base_args("docker", ["exec", "srs", "ffmpeg"]);
        assert_eq!(wrapped.name(), "docker");
        assert_eq!(wrapped.base_args(), ["exec", "srs", "ffmpeg"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_supervise_terminates_on_cancel() {
        let tool = ToolCommand::new("sleep");
        let mut child = spawn(&tool, &["30".to_string()], Stdio::null(), Stdio::null()).unwrap();
        let ctx = CancellationToken::new();
        ctx.cancel();

        let finished = supervise(&mut child, "sleep", &ctx, None, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(finished.end, WaitEnd::Cancelled);
        assert!(finished.terminated_by_us());
        assert!(ended_by_signal(&finished.status));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_terminate_escalates_to_kill() {
        let tool = ToolCommand::with_base_args("sh", ["-c", "trap '' TERM; sleep 30"]);
        let mut child = spawn(&tool, &[], Stdio::null(), Stdio::null()).unwrap();
        // Give the shell time to install the trap.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let started = std::time::Instant::now();
        let status = terminate(&mut child, "sh", Duration::from_millis(300))
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!status.success());
    }
}
