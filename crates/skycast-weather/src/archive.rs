//! On-disk history of raw forecast responses.
//!
//! Each successful fetch is written to `{dir}/{location}-{start date}.json`.
//! Files are replaced whole (write to a temporary file, then rename) so every
//! file stays valid JSON.

use chrono::{DateTime, Local, NaiveDate, Utc};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::ArchiveError;
use crate::types::RawForecast;

/// File stem used when nothing of the location survives sanitization.
pub const FALLBACK_LOCATION_NAME: &str = "unknown_city";

const DATE_FORMAT: &str = "%Y-%m-%d";
const JSON_SUFFIX: &str = ".json";

/// One file in the archive directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub file_name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Archive {
    dir: PathBuf,
}

impl Archive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `raw` as pretty JSON and return the file path.
    pub fn archive(&self, location: &str, raw: &RawForecast) -> Result<PathBuf, ArchiveError> {
        let date = start_date(raw, Local::now().date_naive());
        let path = self.dir.join(archive_file_name(location, &date));

        fs::create_dir_all(&self.dir).map_err(|source| ArchiveError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(raw)?;
        self.replace_file(&path, json.as_bytes())?;

        tracing::info!("Forecast for {} on {} saved to {}", location, date, path.display());
        Ok(path)
    }

    /// Write to a temporary file in the archive directory, then rename over
    /// `path`. Readers see either the old file or the new one, never a partial write.
    fn replace_file(&self, path: &Path, contents: &[u8]) -> Result<(), ArchiveError> {
        let write_err = |source| ArchiveError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(contents).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    /// Regular files in the archive, most recently modified first.
    ///
    /// Dot files (including in-progress temporary files) are skipped.
    ///
    /// A missing directory is an empty archive.
    pub fn list(&self) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.starts_with('.') {
                continue;
            }
            let metadata = fs::metadata(entry.path())?;
            if !metadata.is_file() {
                continue;
            }

            entries.push(ArchiveEntry {
                file_name,
                size: metadata.len(),
                modified: DateTime::<Utc>::from(metadata.modified()?),
            });
        }

        entries.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        Ok(entries)
    }

    /// Contents of an archived file.
    pub fn read(&self, filename: &str) -> Result<Vec<u8>, ArchiveError> {
        let path = self.resolve(filename)?;
        fs::read(&path).map_err(ArchiveError::from)
    }

    /// Resolve `filename` to a regular file inside the archive directory.
    ///
    /// Absolute paths and `..` components are refused outright; the canonical
    /// path must also sit under the canonical root, which catches symlinks
    /// pointing elsewhere.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, ArchiveError> {
        let requested = Path::new(filename);
        if filename.is_empty() {
            return Err(ArchiveError::NotFound(filename.to_string()));
        }

        let lexically_inside = requested
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !lexically_inside {
            tracing::warn!("Rejected archive path outside root: {}", filename);
            return Err(ArchiveError::PathTraversalRejected(filename.to_string()));
        }

        let root = self
            .dir
            .canonicalize()
            .map_err(|_| ArchiveError::NotFound(filename.to_string()))?;
        let resolved = root
            .join(requested)
            .canonicalize()
            .map_err(|_| ArchiveError::NotFound(filename.to_string()))?;

        if !resolved.starts_with(&root) {
            tracing::warn!("Rejected archive path resolving outside root: {}", filename);
            return Err(ArchiveError::PathTraversalRejected(filename.to_string()));
        }

        if !resolved.is_file() {
            return Err(ArchiveError::NotFound(filename.to_string()));
        }

        Ok(resolved)
    }
}

/// Keep alphanumerics, spaces and hyphens; trim trailing spaces.
///
/// A trailing `.json` is dropped first so a query typed as a file name does
/// not end up as `...json-<date>.json`. For such queries the archive stem no
/// longer matches the location sent upstream: `Foo.json` is fetched as
/// `Foo.json` but archived as `Foo-<date>.json`.
pub fn sanitize_location(location: &str) -> String {
    let stem = strip_json_suffix(location);
    let kept: String = stem
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .collect();

    match kept.trim_end() {
        "" => FALLBACK_LOCATION_NAME.to_string(),
        trimmed => trimmed.to_string(),
    }
}

fn strip_json_suffix(location: &str) -> &str {
    let split = location.len().saturating_sub(JSON_SUFFIX.len());
    match (location.get(..split), location.get(split..)) {
        (Some(stem), Some(suffix)) if suffix.eq_ignore_ascii_case(JSON_SUFFIX) => stem,
        _ => location,
    }
}

/// `{sanitized location}-{date}.json`
pub fn archive_file_name(location: &str, date: &str) -> String {
    format!("{}-{}.json", sanitize_location(location), date)
}

/// First day's date, or `today` when the response has no usable one.
///
/// Only `YYYY-MM-DD` values are accepted so the file name never picks up
/// path separators from the response.
pub fn start_date(raw: &RawForecast, today: NaiveDate) -> String {
    match raw
        .first_date()
        .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
    {
        Some(date) => date.format(DATE_FORMAT).to_string(),
        None => {
            tracing::warn!("Forecast has no usable start date, archiving under {}", today);
            today.format(DATE_FORMAT).to_string()
        }
    }
}
