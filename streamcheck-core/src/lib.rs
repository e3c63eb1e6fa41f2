//! Core library for end-to-end media-plane checks against a streaming server.
//!
//! The crate supervises two kinds of external subprocess:
//!
//! - a **producer** (ffmpeg) that publishes a stream and signals readiness once
//!   its stream mapping is established, and
//! - an **analyzer** (ffmpeg capture followed by ffprobe) that samples what the
//!   server re-emits and parses the JSON report into codec and stream facts.
//!
//! Each supervisor exposes a one-shot gate (`Producer::ready`,
//! `Analyzer::probe_done`) that callers race against their own deadline.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use streamcheck_core::config::HarnessConfigBuilder;
//! use streamcheck_core::external::{Analyzer, Producer};
//! use streamcheck_core::util::{cancel_after, new_stream_id};
//! use tokio_util::sync::CancellationToken;
//! use std::sync::Arc;
//!
//! # async fn demo() -> streamcheck_core::CoreResult<()> {
//! let config = HarnessConfigBuilder::new().input_file("bbb.flv").build();
//! config.validate()?;
//!
//! let deadline = cancel_after(&CancellationToken::new(), config.timeout);
//! let ctx = deadline.token().clone();
//! let stream = new_stream_id("stream");
//!
//! let producer = Arc::new(Producer::new(config.publish_producer_config(&stream)));
//! let producer_task = {
//!     let (producer, ctx) = (producer.clone(), ctx.clone());
//!     tokio::spawn(async move { producer.run(&ctx, &ctx).await })
//! };
//!
//! let ready = producer.ready();
//! tokio::select! {
//!     _ = ctx.cancelled() => {}
//!     _ = ready.cancelled() => {}
//! }
//!
//! let analyzer = Analyzer::new(config.analyzer_config(&config.play_flv_url(&stream), &stream));
//! analyzer.run(&ctx, &ctx).await?;
//! let (_raw, report) = analyzer.result();
//! println!("{report}");
//!
//! let _ = producer_task.await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod external;
pub mod media;
pub mod temp_files;
pub mod util;

// Re-exports for public API
pub use config::{HarnessConfig, HarnessConfigBuilder};
pub use error::{CoreError, CoreResult};
pub use external::{Analyzer, AnalyzerConfig, Producer, ProducerConfig, ToolCommand};
pub use media::{ProbeFormat, ProbeReport, ProbeStream};
pub use temp_files::{create_report_sink, create_temp_file};
