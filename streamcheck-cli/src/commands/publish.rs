// streamcheck-cli/src/commands/publish.rs
//
// `streamcheck publish`: runs the producer until it is live, prints the play
// URLs, then holds the stream until the hold time passes, the producer exits
// or the user interrupts. With `--stage-dir` the input is first copied into
// the given directories and the first staged copy is published.

use crate::cli::PublishArgs;
use crate::config::DEFAULT_STREAM_PREFIX;
use crate::error::{CliErrorContext, CliResult, join_error};
use crate::output::{print_heading, print_info, print_success};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use streamcheck_core::util::{copy_to_dest, find_existing_file, new_stream_id};
use streamcheck_core::{CoreError, HarnessConfig, Producer};
use tokio_util::sync::CancellationToken;

pub async fn run_publish(
    config: &HarnessConfig,
    args: PublishArgs,
    root: &CancellationToken,
) -> CliResult<()> {
    config.validate().cli_context("Harness settings")?;
    if !config.input_file.is_file() {
        return Err(CoreError::Config(format!(
            "input file {} does not exist",
            config.input_file.display()
        )));
    }
    let mut config = config.clone();
    if !args.stage_dirs.is_empty() {
        config.input_file = stage_input(&config.input_file, &args.stage_dirs)?;
    }

    let stream = args.stream.unwrap_or_else(|| new_stream_id(DEFAULT_STREAM_PREFIX));
    print_heading("Publishing");
    print_info("Input", config.input_file.display());
    print_info("Publish URL", config.publish_url(&stream));

    let ctx = root.child_token();
    let producer = Arc::new(Producer::new(config.publish_producer_config(&stream)));
    let mut task = {
        let (producer, ctx) = (producer.clone(), ctx.clone());
        tokio::spawn(async move { producer.run(&ctx, &ctx).await })
    };
    let mut exited = None;

    let ready = producer.ready();
    tokio::select! {
        _ = ready.cancelled() => {}
        _ = ctx.cancelled() => {}
        joined = &mut task => exited = Some(joined),
        _ = tokio::time::sleep(config.timeout) => {
            log::error!("Producer not live within {:?}", config.timeout);
        }
    }

    if producer.is_ready() && exited.is_none() {
        print_success("Stream is live");
        print_info("FLV", config.play_flv_url(&stream));
        print_info("HLS", config.play_hls_url(&stream));

        let hold = async {
            match args.hold {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = hold => log::info!("Hold time elapsed"),
            _ = ctx.cancelled() => {}
            joined = &mut task => {
                log::warn!("Producer exited while holding the stream");
                exited = Some(joined);
            }
        }
    }

    ctx.cancel();
    let joined = match exited {
        Some(joined) => joined,
        None => task.await,
    };
    joined
        .map_err(|e| join_error("producer", e))
        .and_then(|r| r)
        .cli_context("Producer")?;

    if !producer.is_ready() {
        return Err(CoreError::ScenarioFailed(format!(
            "producer never reported '{}'",
            config.ready_marker
        )));
    }
    print_success("Publishing stopped");
    Ok(())
}

/// Copies `input` into the existing `dirs` and returns the first staged copy.
fn stage_input(input: &Path, dirs: &[PathBuf]) -> CliResult<PathBuf> {
    copy_to_dest(input, dirs)
        .cli_with_context(|| format!("Staging {}", input.display()))?;

    let name = input.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    let staged = find_existing_file(&name, dirs).ok_or_else(|| {
        CoreError::Config(format!("no staged copy of {} found", input.display()))
    })?;
    log::info!("Publishing staged copy {}", staged.display());
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_stage_input_returns_first_existing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("source.flv");
        fs::write(&input, b"FLV").unwrap();
        let missing = tmp.path().join("missing");
        let upload = tmp.path().join("upload");
        fs::create_dir(&upload).unwrap();

        let staged = stage_input(&input, &[missing, upload.clone()]).unwrap();
        assert_eq!(staged, upload.join("source.flv"));
        assert_eq!(fs::read(&staged).unwrap(), b"FLV");
    }

    #[test]
    fn test_stage_input_without_dirs_fails_with_step() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("source.flv");
        fs::write(&input, b"FLV").unwrap();

        let err = stage_input(&input, &[tmp.path().join("nope")]).unwrap_err();
        assert!(err.to_string().starts_with("Staging "));
    }
}
