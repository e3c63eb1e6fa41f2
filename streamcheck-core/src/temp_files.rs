//! Temporary file management utilities.
//!
//! The analyzer writes its JSON report into a temp file rather than a pipe so
//! that whatever it flushed is still readable after it is killed. The
//! `NamedTempFile` is deleted when dropped.

use crate::error::CoreResult;
use std::path::Path;
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

/// Creates a temporary file with prefix and extension. Auto-deleted when dropped.
pub fn create_temp_file(dir: &Path, prefix: &str, extension: &str) -> CoreResult<NamedTempFile> {
    std::fs::create_dir_all(dir)?;
    let temp_file = TempFileBuilder::new()
        .prefix(&format!("{prefix}_"))
        .suffix(&format!(".{extension}"))
        .tempfile_in(dir)?;

    Ok(temp_file)
}

/// Report sink for one analyzer run, next to the capture file.
pub fn create_report_sink(dvr_file: &Path) -> CoreResult<NamedTempFile> {
    let dir = match dvr_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::temp_dir(),
    };
    create_temp_file(&dir, "streamcheck-report", "json")
}
