//! Logging helpers shared by the supervisors.

use log::{Level, debug, log_enabled, trace};
use tokio::process::Command;

/// Logs the full command line about to be spawned.
pub fn log_command(cmd: &Command) {
    debug!("Executing command: {}", format_command(cmd));
}

/// Renders a command line the way a shell user would type it.
pub fn format_command(cmd: &Command) -> String {
    let std_cmd = cmd.as_std();
    std::iter::once(std_cmd.get_program())
        .chain(std_cmd.get_args())
        .map(|arg| quote_arg(&arg.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Logs one line of subprocess output.
///
/// Lines go to `debug` when echoing was requested and to `trace` otherwise,
/// so a long-running producer does not flood the default log.
pub fn log_output_line(program: &str, stream: &str, line: &str, echo: bool) {
    if echo {
        debug!("[{program} {stream}] {line}");
    } else if log_enabled!(Level::Trace) {
        trace!("[{program} {stream}] {line}");
    }
}

fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    if arg
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '&' | '?' | ';' | '|' | '$'))
    {
        format!("'{}'", arg.replace('\'', r"'\''"))
    } else {
        arg.to_string()
    }
}
