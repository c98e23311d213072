//! Size-based rotation of the log file.

use jiff::Timestamp;
use std::fs;
use std::path::{Path, PathBuf};

pub struct RotationManager {
    max_size: u64,
    max_files: usize,
}

impl RotationManager {
    pub fn new(max_size: u64, max_files: usize) -> Self {
        Self {
            max_size,
            max_files: max_files.max(1),
        }
    }

    pub fn should_rotate(&self, current_file_size: u64) -> bool {
        current_file_size >= self.max_size
    }

    /// Renames the live file aside and prunes the oldest rotated files.
    pub fn rotate(&self, current_path: &Path) -> anyhow::Result<()> {
        if current_path.exists() {
            fs::rename(current_path, rotated_path(current_path))?;
        }
        self.prune(current_path, self.max_files)
    }

    /// Keeps half the usual number of rotated files to free disk space.
    pub fn force_cleanup(&self, base_path: &Path) -> anyhow::Result<()> {
        self.prune(base_path, (self.max_files / 2).max(1))
    }

    fn prune(&self, base_path: &Path, keep: usize) -> anyhow::Result<()> {
        let mut rotated = rotated_files(base_path)?;
        // Rotated names embed a zero-padded timestamp, so lexical order is age order.
        rotated.sort();

        let excess = rotated.len().saturating_sub(keep);
        for oldest in rotated.iter().take(excess) {
            fs::remove_file(oldest)?;
        }
        Ok(())
    }
}

fn stem_and_ext(base_path: &Path) -> (String, String) {
    let stem = base_path.file_stem().unwrap_or_default().to_string_lossy().into_owned();
    let ext = base_path.extension().unwrap_or_default().to_string_lossy().into_owned();
    (stem, ext)
}

fn rotated_path(base_path: &Path) -> PathBuf {
    let (stem, ext) = stem_and_ext(base_path);
    let stamp = Timestamp::now().as_microsecond();
    let name = if ext.is_empty() {
        format!("{}.{:020}", stem, stamp)
    } else {
        format!("{}.{:020}.{}", stem, stamp, ext)
    };
    base_path.with_file_name(name)
}

fn rotated_files(base_path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let parent = match base_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let (stem, _) = stem_and_ext(base_path);
    let prefix = format!("{}.", stem);

    Ok(fs::read_dir(parent)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            let name = path.file_name().unwrap_or_default().to_string_lossy();
            name.starts_with(&prefix) && path.as_path() != base_path
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn test_should_rotate_by_size() {
        let manager = RotationManager::new(1024, 5);
        assert!(!manager.should_rotate(1023));
        assert!(manager.should_rotate(1024));
    }

    #[test]
    fn test_rotate_moves_live_file_aside() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("scheme.log");
        fs::write(&base, "line").unwrap();

        RotationManager::new(10, 3).rotate(&base).unwrap();

        assert!(!base.exists());
        assert_eq!(rotated_files(&base).unwrap().len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_rotation_keeps_at_most_max_files(
            max_files in 1usize..6,
            existing in 0usize..10,
        ) {
            let dir = tempdir().unwrap();
            let base = dir.path().join("scheme.log");
            for i in 0..existing {
                fs::write(dir.path().join(format!("scheme.{:020}.log", i)), "old").unwrap();
            }
            fs::write(&base, "current").unwrap();

            RotationManager::new(1, max_files).rotate(&base).unwrap();

            let remaining = rotated_files(&base).unwrap();
            prop_assert_eq!(remaining.len(), (existing + 1).min(max_files));
            // The file just rotated is the newest and always survives.
            let newest = remaining.iter().max().unwrap();
            prop_assert_eq!(fs::read_to_string(newest).unwrap(), "current");
        }
    }
}
