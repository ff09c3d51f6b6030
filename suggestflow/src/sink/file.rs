//! Line-oriented text file sink.

use chrono::{DateTime, TimeZone};
use regex::Regex;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use super::ResultSink;
use crate::errors::{CrawlError, CrawlResult};
use crate::provider::normalize_candidate;

/// First line of every result file.
pub const OUTPUT_HEADER: &str = "keyword";

#[allow(clippy::expect_used)]
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).expect("filename pattern is valid"));

/// Builds the result file path for a keyword and run timestamp.
///
/// `<dir>/suggestions_<keyword>_<YYYYmmdd_HHMMSS>.txt`, with characters that
/// cannot appear in a file name replaced by `_`.
#[must_use]
pub fn output_path<Tz>(dir: &Path, keyword: &str, timestamp: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let keyword = UNSAFE_FILENAME_CHARS.replace_all(keyword.trim(), "_");
    let stamp = timestamp.format("%Y%m%d_%H%M%S");
    dir.join(format!("suggestions_{keyword}_{stamp}.txt"))
}

/// Writes one record per line, flushing after each append.
#[derive(Debug)]
pub struct FileResultSink {
    path: PathBuf,
    file: File,
    written: usize,
}

impl FileResultSink {
    /// Creates (or truncates) the file at `path` and writes the header line.
    ///
    /// Missing parent directories are created.
    pub fn initialize(path: impl Into<PathBuf>) -> CrawlResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&path)?;
        writeln!(file, "{OUTPUT_HEADER}")?;
        file.flush()?;
        debug!(path = %path.display(), "Initialized result file");

        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    /// The file being written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for FileResultSink {
    fn append(&mut self, record: &str) -> CrawlResult<()> {
        // A record containing a line break would read back as several records.
        let line = normalize_candidate(record);
        writeln!(self.file, "{line}")
            .and_then(|()| self.file.flush())
            .map_err(|e| CrawlError::Sink(format!("{}: {e}", self.path.display())))?;
        self.written += 1;
        Ok(())
    }

    fn records_written(&self) -> usize {
        self.written
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    #[test]
    fn test_output_path_format() {
        let path = output_path(Path::new("results"), "Rust", &fixed_time());
        assert_eq!(path, PathBuf::from("results/suggestions_Rust_20240309_070501.txt"));
    }

    #[test]
    fn test_output_path_sanitizes_keyword() {
        let path = output_path(Path::new("out"), "c/c++: why?", &fixed_time());
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "suggestions_c_c++_ why__20240309_070501.txt"
        );
    }

    #[test]
    fn test_initialize_writes_header_and_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.txt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "stale\ncontent\n").unwrap();

        let sink = FileResultSink::initialize(&path).unwrap();
        assert_eq!(sink.path(), path.as_path());
        assert_eq!(fs::read_to_string(&path).unwrap(), "keyword\n");
    }

    #[test]
    fn test_initialize_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("out.txt");

        FileResultSink::initialize(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_append_is_visible_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let mut sink = FileResultSink::initialize(&path).unwrap();

        sink.append("rust lang").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "keyword\nrust lang\n");

        sink.append("rust\nbook").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "keyword\nrust lang\nrust book\n"
        );
        assert_eq!(sink.records_written(), 2);
        assert_eq!(sink.location(), Some(path.as_path()));
    }

    #[test]
    fn test_initialize_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let err = FileResultSink::initialize(blocker.join("out.txt")).unwrap_err();
        assert!(matches!(err, CrawlError::Io(_)));
    }
}
