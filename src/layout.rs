use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{LogError, QueryWarning};
use crate::severity::Severity;

const FILE_EXTENSION: &str = "log";
const FILE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Where daily files live: `<root>/<Severity>/<yyyy-MM-dd>.log`.
#[derive(Debug, Clone)]
pub struct LogLayout {
    root: PathBuf,
}

impl LogLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn severity_dir(&self, severity: Severity) -> PathBuf {
        self.root.join(severity.as_str())
    }

    pub fn file_name(date: NaiveDate) -> String {
        format!("{}.{}", date.format(FILE_DATE_FORMAT), FILE_EXTENSION)
    }

    pub fn file_path(&self, severity: Severity, date: NaiveDate) -> PathBuf {
        self.severity_dir(severity).join(Self::file_name(date))
    }

    /// Creates the root and all severity directories. Safe to call on every
    /// flush cycle.
    pub fn ensure_dirs(&self) -> Result<(), LogError> {
        for severity in Severity::ALL {
            self.ensure_severity_dir(severity)?;
        }
        Ok(())
    }

    /// Creates the root and one severity's directory.
    pub fn ensure_severity_dir(&self, severity: Severity) -> Result<PathBuf, LogError> {
        if self.root.exists() && !self.root.is_dir() {
            return Err(LogError::InvalidRoot(self.root.clone()));
        }
        let dir = self.severity_dir(severity);
        fs::create_dir_all(&dir).map_err(|e| LogError::io(&dir, e))?;
        Ok(dir)
    }

    /// Lists a severity's daily files with their dates, sorted by date.
    ///
    /// A missing directory yields an empty list. `*.log` files whose name is
    /// not a date are skipped and reported.
    pub fn list_files(&self, severity: Severity) -> Result<(Vec<(NaiveDate, PathBuf)>, Vec<QueryWarning>), LogError> {
        let dir = self.severity_dir(severity);
        let read_dir = match fs::read_dir(&dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok((Vec::new(), Vec::new())),
            Err(e) => return Err(LogError::io(&dir, e)),
        };

        let mut files = Vec::new();
        let mut warnings = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| LogError::io(&dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FILE_EXTENSION) || !path.is_file() {
                continue;
            }
            match parse_file_date(&path) {
                Some(date) => files.push((date, path)),
                None => warnings.push(QueryWarning::UnparseableFileName { path }),
            }
        }
        files.sort();
        Ok((files, warnings))
    }
}

/// Date encoded in a daily file's name, e.g. `2024-01-31.log`.
pub fn parse_file_date(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    NaiveDate::parse_from_str(stem, FILE_DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_paths() {
        let layout = LogLayout::new("/var/log/app");
        assert_eq!(
            layout.file_path(Severity::Error, date(2024, 3, 9)),
            PathBuf::from("/var/log/app/Error/2024-03-09.log")
        );
        assert_eq!(parse_file_date(Path::new("x/2024-03-09.log")), Some(date(2024, 3, 9)));
        assert_eq!(parse_file_date(Path::new("x/notes.log")), None);
    }

    #[test]
    fn test_ensure_dirs_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let layout = LogLayout::new(temp.path().join("logs"));
        layout.ensure_dirs().unwrap();
        layout.ensure_dirs().unwrap();
        for severity in Severity::ALL {
            assert!(layout.severity_dir(severity).is_dir());
        }
    }

    #[test]
    fn test_root_that_is_a_file_is_rejected() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("occupied");
        fs::write(&file, b"not a dir").unwrap();
        let err = LogLayout::new(&file).ensure_dirs().unwrap_err();
        assert!(matches!(err, LogError::InvalidRoot(_)));
    }

    #[test]
    fn test_list_files_filters_and_warns() {
        let temp = TempDir::new().unwrap();
        let layout = LogLayout::new(temp.path());
        layout.ensure_dirs().unwrap();
        let dir = layout.severity_dir(Severity::Info);
        fs::write(dir.join("2024-01-02.log"), "").unwrap();
        fs::write(dir.join("2024-01-01.log"), "").unwrap();
        fs::write(dir.join("readme.txt"), "").unwrap();
        fs::write(dir.join("backup.log"), "").unwrap();

        let (files, warnings) = layout.list_files(Severity::Info).unwrap();
        let dates: Vec<_> = files.iter().map(|(d, _)| *d).collect();
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 2)]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_missing_directory_lists_nothing() {
        let temp = TempDir::new().unwrap();
        let layout = LogLayout::new(temp.path().join("never-created"));
        let (files, warnings) = layout.list_files(Severity::Alarm).unwrap();
        assert!(files.is_empty());
        assert!(warnings.is_empty());
    }
}
