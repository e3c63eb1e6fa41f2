// ============================================================================
// streamcheck-cli/src/commands/check.rs
// ============================================================================
//
// ROUND TRIP CHECK: Publish a stream, probe the server's playback, assert
//
// 1. The producer publishes the input file to the stream's RTMP URL.
// 2. Once it reports its stream mapping, the analyzer captures the HTTP-FLV
//    playback of the same stream.
// 3. When the probe is done (or the scenario deadline passes) both are
//    cancelled and joined, and the report is checked: stream count, probe
//    score, captured duration.

use crate::cli::CheckArgs;
use crate::config::DEFAULT_STREAM_PREFIX;
use crate::error::{CliErrorContext, CliResult, join_error};
use crate::output::{print_heading, print_info, print_report, print_success};
use std::sync::Arc;
use streamcheck_core::util::{
    ScenarioErrors, cancel_after, filter_errors, new_stream_id, tail_chars,
};
use streamcheck_core::{Analyzer, CoreError, HarnessConfig, ProbeReport, Producer};
use tokio_util::sync::CancellationToken;

/// Raw transcript characters attached to a failure.
const TRANSCRIPT_TAIL_CHARS: usize = 4096;

pub async fn run_check(
    config: &HarnessConfig,
    args: CheckArgs,
    root: &CancellationToken,
) -> CliResult<()> {
    if config.skip_media_tests {
        log::info!("Media tests disabled, skipping round trip check");
        print_success("Skipped (media tests disabled)");
        return Ok(());
    }
    config.validate().cli_context("Harness settings")?;
    if !config.input_file.is_file() {
        return Err(CoreError::Config(format!(
            "input file {} does not exist",
            config.input_file.display()
        )));
    }

    let stream = args.stream.clone().unwrap_or_else(|| new_stream_id(DEFAULT_STREAM_PREFIX));
    print_heading("Round Trip Check");
    print_info("Publish", config.publish_url(&stream));
    print_info("Play", config.play_flv_url(&stream));

    let deadline = cancel_after(root, config.timeout);
    let ctx = deadline.token().clone();
    let mut errors = ScenarioErrors::default();
    let mut task_results = Vec::new();

    let producer = Arc::new(Producer::new(config.publish_producer_config(&stream)));
    let producer_task = {
        let (producer, ctx) = (producer.clone(), ctx.clone());
        tokio::spawn(async move { producer.run(&ctx, &ctx).await })
    };

    let ready = producer.ready();
    tokio::select! {
        _ = ctx.cancelled() => {}
        _ = ready.cancelled() => {}
    }

    let mut probed = None;
    if producer.is_ready() {
        log::info!("Stream {} is live, starting analyzer", stream);
        let analyzer = Arc::new(Analyzer::new(
            config.analyzer_config(&config.play_flv_url(&stream), &stream),
        ));
        let analyzer_task = {
            let (analyzer, ctx) = (analyzer.clone(), ctx.clone());
            tokio::spawn(async move { analyzer.run(&ctx, &ctx).await })
        };

        let probe_done = analyzer.probe_done();
        tokio::select! {
            _ = ctx.cancelled() => {}
            _ = probe_done.cancelled() => {}
        }
        ctx.cancel();

        task_results.push(
            analyzer_task
                .await
                .map_err(|e| join_error("analyzer", e))
                .and_then(|r| r)
                .cli_context("Analyzer"),
        );
        if probe_done.is_cancelled() {
            probed = Some(analyzer.result());
        } else {
            errors.push(CoreError::ScenarioFailed(format!(
                "probe did not finish within {:?}",
                config.timeout
            )));
        }
    } else if deadline.is_expired() {
        errors.push(CoreError::ScenarioFailed(format!(
            "producer not live within {:?}",
            config.timeout
        )));
    }

    ctx.cancel();
    task_results.push(
        producer_task
            .await
            .map_err(|e| join_error("producer", e))
            .and_then(|r| r)
            .cli_context("Producer"),
    );
    errors.record(filter_errors(task_results));
    if !producer.is_ready() && errors.is_empty() {
        errors.push(CoreError::ScenarioFailed(format!(
            "producer exited without reporting '{}'",
            config.ready_marker
        )));
    }

    if let Some((raw, report)) = probed {
        print_report(&report);
        check_report(config, &args, &report, &raw, &mut errors);
    }

    errors.into_result()?;
    print_success("Round trip check passed");
    Ok(())
}

/// Records a failure for every expectation the report misses.
fn check_report(
    config: &HarnessConfig,
    args: &CheckArgs,
    report: &ProbeReport,
    raw: &str,
    errors: &mut ScenarioErrors,
) {
    let context = || format!("report: {report}, raw: {}", tail_chars(raw, TRANSCRIPT_TAIL_CHARS));

    errors.check(report.streams.len() == args.expected_streams, || {
        format!(
            "expected {} streams, got {}; {}",
            args.expected_streams,
            report.streams.len(),
            context()
        )
    });
    errors.check(report.format.probe_score >= args.min_score, || {
        format!(
            "probe score {} below {}; {}",
            report.format.probe_score,
            args.min_score,
            context()
        )
    });
    let min_duration = config.probe_duration / 2;
    errors.check(report.duration() >= min_duration, || {
        format!(
            "captured {:?}, expected at least {:?}; {}",
            report.duration(),
            min_duration,
            context()
        )
    });
}
