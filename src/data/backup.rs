use std::fs;
use std::path::{Path, PathBuf};

use bevy_utils::tracing::{info, warn};
use chrono::{DateTime, Local};

use crate::data::DataError;

pub const BACKUP_DIR: &str = "backups";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Timestamped copies of the YAML files, pruned to the newest `keep`.
pub struct YamlBackup {
    dir: PathBuf,
    keep: usize,
}

impl YamlBackup {
    pub fn new(data_dir: &Path, keep: usize) -> Self {
        Self {
            dir: data_dir.join(BACKUP_DIR),
            keep,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copies `source` into the backup folder. Missing sources are skipped,
    /// and so is everything when `keep` is zero.
    pub fn backup(&self, source: &Path) -> Result<Option<PathBuf>, DataError> {
        self.backup_at(source, Local::now())
    }

    pub fn backup_at(
        &self,
        source: &Path,
        at: DateTime<Local>,
    ) -> Result<Option<PathBuf>, DataError> {
        if self.keep == 0 || !source.exists() {
            return Ok(None);
        }
        let stem = file_stem(source)?;
        fs::create_dir_all(&self.dir).map_err(|err| io_error(&self.dir, err))?;

        let target = self
            .dir
            .join(format!("{}_backup_{}.yml", stem, at.format(TIMESTAMP_FORMAT)));
        fs::copy(source, &target).map_err(|err| io_error(&target, err))?;
        info!(file = %target.display(), "yaml backup written");

        let pruned = self.prune(&stem)?;
        if pruned > 0 {
            info!(stem = %stem, pruned, "old yaml backups removed");
        }
        Ok(Some(target))
    }

    /// Backups for `stem`, oldest first.
    pub fn list(&self, stem: &str) -> Result<Vec<PathBuf>, DataError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}_backup_", stem);
        let entries = fs::read_dir(&self.dir).map_err(|err| io_error(&self.dir, err))?;
        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| io_error(&self.dir, err))?;
            let path = entry.path();
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(&prefix) && name.ends_with(".yml"))
                .unwrap_or(false);
            if matches {
                backups.push(path);
            }
        }
        // Timestamps sort lexicographically.
        backups.sort();
        Ok(backups)
    }

    fn prune(&self, stem: &str) -> Result<usize, DataError> {
        let backups = self.list(stem)?;
        if backups.len() <= self.keep {
            return Ok(0);
        }
        let excess = backups.len() - self.keep;
        let mut removed = 0;
        for path in backups.into_iter().take(excess) {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) => warn!(file = %path.display(), error = %err, "failed to remove old backup"),
            }
        }
        Ok(removed)
    }
}

fn file_stem(path: &Path) -> Result<String, DataError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| DataError::Validation(format!("{} has no file name", path.display())))
}

fn io_error(path: &Path, source: std::io::Error) -> DataError {
    DataError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn backups_are_named_by_timestamp_and_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("tags.yml");
        fs::write(&source, "tags: {}\n").unwrap();

        let backup = YamlBackup::new(dir.path(), 3);
        let start = Local.with_ymd_and_hms(2024, 12, 24, 18, 30, 5).unwrap();
        let first = backup.backup_at(&source, start).unwrap().unwrap();
        assert_eq!(
            first.file_name().unwrap().to_str().unwrap(),
            "tags_backup_2024-12-24_18-30-05.yml"
        );

        for step in 1..5 {
            backup
                .backup_at(&source, start + Duration::minutes(step))
                .unwrap();
        }
        let kept = backup.list("tags").unwrap();
        assert_eq!(kept.len(), 3);
        assert!(kept[0].ends_with("tags_backup_2024-12-24_18-32-05.yml"));
        assert!(!first.exists());
    }

    #[test]
    fn keeping_zero_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("tags.yml");
        fs::write(&source, "tags: {}\n").unwrap();

        let backup = YamlBackup::new(dir.path(), 0);
        assert!(backup.backup(&source).unwrap().is_none());
        assert!(!backup.dir().exists());
    }

    #[test]
    fn missing_source_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let backup = YamlBackup::new(dir.path(), 10);
        assert!(backup.backup(&dir.path().join("categories.yml")).unwrap().is_none());
        assert!(backup.list("categories").unwrap().is_empty());
    }
}
