// ============================================================================
// streamcheck-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error types for the supervision subsystem
//
// KEY COMPONENTS:
// - CoreError: every failure the producer/analyzer supervisors can report
// - CoreResult: result alias used across the crate
// - Helper constructors for the subprocess variants

use std::io;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the supervision subsystem.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to start '{program}': {source}")]
    SpawnFailure {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' exited abnormally ({status}){}", format_output(.output))]
    AbnormalExit {
        program: String,
        status: ExitStatus,
        output: String,
    },

    #[error("Failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' did not finish within {timeout:?}")]
    TimeoutExceeded { program: String, timeout: Duration },

    #[error("Probe report unusable: {0}")]
    PartialReport(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Scenario failed: {0}")]
    ScenarioFailed(String),

    #[error("{0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for streamcheck operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

fn format_output(output: &str) -> String {
    if output.trim().is_empty() {
        String::new()
    } else {
        format!(":\n{}", output.trim_end())
    }
}

/// Builds the error for a subprocess that could not be spawned.
pub fn command_start_error(program: impl Into<String>, source: io::Error) -> CoreError {
    CoreError::SpawnFailure {
        program: program.into(),
        source,
    }
}

/// Builds the error for a subprocess that exited with a failing status.
pub fn command_failed_error(
    program: impl Into<String>,
    status: ExitStatus,
    output: impl Into<String>,
) -> CoreError {
    CoreError::AbnormalExit {
        program: program.into(),
        status,
        output: output.into(),
    }
}

pub fn command_wait_error(program: impl Into<String>, source: io::Error) -> CoreError {
    CoreError::Wait {
        program: program.into(),
        source,
    }
}

impl CoreError {
    /// True for failures that mean the subprocess never ran.
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, CoreError::SpawnFailure { .. })
    }

    pub fn is_abnormal_exit(&self) -> bool {
        matches!(self, CoreError::AbnormalExit { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn abnormal_exit_includes_output_tail() {
        use std::os::unix::process::ExitStatusExt;

        let err = command_failed_error(
            "ffmpeg",
            ExitStatus::from_raw(1 << 8),
            "line one\nline two\n",
        );
        let msg = err.to_string();
        assert!(msg.starts_with("'ffmpeg' exited abnormally"));
        assert!(msg.ends_with("line one\nline two"));
        assert!(err.is_abnormal_exit());
    }

    #[test]
    fn spawn_failure_names_program() {
        let err = command_start_error(
            "ffprobe",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert!(err.is_spawn_failure());
        assert_eq!(
            err.to_string(),
            "Failed to start 'ffprobe': No such file or directory"
        );
    }
}
