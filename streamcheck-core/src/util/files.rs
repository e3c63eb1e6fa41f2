//! Locating and distributing media fixtures.

use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Copies `src` into every directory in `dest_dirs` that already exists.
///
/// Missing directories are skipped, never created. Succeeds when at least one
/// copy was made; returns the paths written.
pub fn copy_to_dest<P: AsRef<Path>>(src: &Path, dest_dirs: &[P]) -> CoreResult<Vec<PathBuf>> {
    let file_name = src.file_name().ok_or_else(|| {
        CoreError::Config(format!("{} has no file name", src.display()))
    })?;

    let mut copied = Vec::new();
    let mut last_error = None;
    for dir in dest_dirs {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            log::debug!("Skipping missing destination {}", dir.display());
            continue;
        }
        let dest = dir.join(file_name);
        match std::fs::copy(src, &dest) {
            Ok(bytes) => {
                log::debug!("Copied {} to {} ({} bytes)", src.display(), dest.display(), bytes);
                copied.push(dest);
            }
            Err(e) => {
                log::warn!("Failed to copy {} to {}: {}", src.display(), dest.display(), e);
                last_error = Some(e);
            }
        }
    }

    if copied.is_empty() {
        return Err(match last_error {
            Some(e) => CoreError::Io(e),
            None => CoreError::Config(format!(
                "no destination directory exists for {}",
                src.display()
            )),
        });
    }
    Ok(copied)
}

/// Returns the first `dir/name` that exists.
pub fn find_existing_file<P: AsRef<Path>>(name: &str, dirs: &[P]) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.as_ref().join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_copy_to_existing_dirs_only() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("source.flv");
        fs::write(&src, b"FLV").unwrap();
        let a = tmp.path().join("a");
        fs::create_dir(&a).unwrap();
        let missing = tmp.path().join("missing");

        let copied = copy_to_dest(&src, &[&a, &missing]).unwrap();
        assert_eq!(copied, vec![a.join("source.flv")]);
        assert_eq!(fs::read(a.join("source.flv")).unwrap(), b"FLV");
        assert!(!missing.exists());
    }

    #[test]
    fn test_copy_fails_without_destinations() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("source.flv");
        fs::write(&src, b"FLV").unwrap();

        let err = copy_to_dest(&src, &[tmp.path().join("nope")]).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_find_existing_file_returns_first_match() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("bbb.flv"), b"x").unwrap();

        let found = find_existing_file("bbb.flv", &[first.path(), second.path()]);
        assert_eq!(found, Some(second.path().join("bbb.flv")));
        assert_eq!(find_existing_file("other.flv", &[first.path()]), None);
    }
}
