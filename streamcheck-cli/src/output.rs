// streamcheck-cli/src/output.rs
//
// Terminal output helpers. Everything user-facing goes through here; logs go
// through the `log` facade instead.

use console::style;
use std::fmt::Display;
use streamcheck_core::ProbeReport;

/// Print a heading with styling and clear separation
pub fn print_heading(text: &str) {
    let line = "=".repeat(50);
    println!("\n{}", style(&line).blue().bright());
    println!("{}", style(format!(" {} ", text)).bold().white());
    println!("{}\n", style(&line).blue().bright());
}

/// Print an info line with label and value, with the label colored
pub fn print_info<T: Display>(label: &str, value: T) {
    println!("{}: {}", style(label).cyan().bright(), value);
}

pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red());
}

/// Print the facts of a probe report, one stream per line.
pub fn print_report(report: &ProbeReport) {
    let format = if report.format.format_name.is_empty() {
        "-"
    } else {
        report.format.format_name.as_str()
    };
    print_info("Format", format);
    print_info("Probe score", report.format.probe_score);
    print_info("Duration", format!("{:.3}s", report.duration().as_secs_f64()));
    print_info("Streams", report.streams.len());

    for stream in &report.streams {
        let detail = if stream.is_video() {
            format!("{}x{}", stream.width, stream.height)
        } else if stream.is_audio() {
            match stream.sample_rate {
                Some(rate) => format!("{}ch {}Hz", stream.channels, rate),
                None => format!("{}ch", stream.channels),
            }
        } else {
            String::new()
        };
        let profile = if stream.profile.is_empty() {
            String::new()
        } else {
            format!(" ({})", stream.profile)
        };
        println!(
            "  #{} {:<6} {}{} {}",
            stream.index,
            stream.codec_type,
            style(&stream.codec_name).bold(),
            profile,
            detail
        );
    }
}
