// streamcheck-cli/src/commands/probe.rs
//
// `streamcheck probe`: captures a stream URL with the analyzer and prints what
// ffprobe detected.

use crate::cli::ProbeArgs;
use crate::config::DEFAULT_PROBE_PREFIX;
use crate::error::{CliErrorContext, CliResult};
use crate::output::{print_heading, print_info, print_report};
use streamcheck_core::util::new_stream_id;
use streamcheck_core::{Analyzer, CoreError, HarnessConfig};
use tokio_util::sync::CancellationToken;

pub async fn run_probe(
    config: &HarnessConfig,
    args: ProbeArgs,
    root: &CancellationToken,
) -> CliResult<()> {
    config.validate().cli_context("Harness settings")?;
    if args.url.trim().is_empty() {
        return Err(CoreError::Config("stream URL is empty".to_string()));
    }

    let probe_id = new_stream_id(DEFAULT_PROBE_PREFIX);
    let mut analyzer_config = config.analyzer_config(&args.url, &probe_id);
    analyzer_config.keep_dvr = args.keep_dvr;
    let dvr_file = analyzer_config.dvr_file.clone();
    let analyzer = Analyzer::new(analyzer_config);

    let ctx = root.child_token();
    analyzer
        .run(&ctx, &ctx)
        .await
        .cli_with_context(|| format!("Analyzing {}", args.url))?;
    let (raw, report) = analyzer
        .try_result()
        .cli_with_context(|| format!("Report for {}", args.url))?;

    if args.json {
        println!("{}", raw.trim_end());
        return Ok(());
    }

    print_heading("Probe Report");
    print_info("URL", &args.url);
    if args.keep_dvr {
        print_info("Capture", dvr_file.display());
    }
    print_report(&report);

    if report.is_empty() {
        return Err(CoreError::ScenarioFailed(format!(
            "no streams detected in {}",
            args.url
        )));
    }
    Ok(())
}
