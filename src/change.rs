use crate::state::CombinedSummary;
use sha1::{Digest, Sha1};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChangeError {
    #[error("ошибка доступа к файлу состояния {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Persisted digest of the last rendered frame.
pub trait ChangeRecord {
    /// `None` when nothing has been rendered yet.
    fn load(&mut self) -> Result<Option<String>, ChangeError>;
    fn store(&mut self, digest: &str) -> Result<(), ChangeError>;
    fn clear(&mut self) -> Result<(), ChangeError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderDecision {
    Unchanged,
    Changed { digest: String },
}

pub struct ChangeDetector<R> {
    record: R,
}

impl<R: ChangeRecord> ChangeDetector<R> {
    pub fn new(record: R) -> Self {
        Self { record }
    }

    /// Compares the summary against the stored digest and stores the new one
    /// when they differ. An unchanged summary performs no writes.
    pub fn check(&mut self, summary: &CombinedSummary) -> Result<RenderDecision, ChangeError> {
        let digest = digest(summary);
        if self.record.load()?.as_deref() == Some(digest.as_str()) {
            return Ok(RenderDecision::Unchanged);
        }
        self.record.store(&digest)?;
        Ok(RenderDecision::Changed { digest })
    }

    /// Stores the summary's digest without comparing.
    pub fn remember(&mut self, summary: &CombinedSummary) -> Result<String, ChangeError> {
        let digest = digest(summary);
        self.record.store(&digest)?;
        Ok(digest)
    }

    /// Forgets the stored digest so the next check always renders.
    pub fn invalidate(&mut self) -> Result<(), ChangeError> {
        self.record.clear()
    }

    #[cfg(test)]
    pub fn record(&self) -> &R {
        &self.record
    }
}

/// Hex SHA-1 of the body followed by the status line.
pub fn digest(summary: &CombinedSummary) -> String {
    let mut hasher = Sha1::new();
    hasher.update(summary.body_text.as_bytes());
    hasher.update(summary.status_line.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub struct FileChangeRecord {
    path: PathBuf,
}

impl FileChangeRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> ChangeError {
        ChangeError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn write_atomic(&self, contents: &str) -> Result<(), ChangeError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }
}

impl ChangeRecord for FileChangeRecord {
    fn load(&mut self) -> Result<Option<String>, ChangeError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let text = text.trim();
                Ok((!text.is_empty()).then(|| text.to_string()))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                self.write_atomic("")?;
                Ok(None)
            }
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn store(&mut self, digest: &str) -> Result<(), ChangeError> {
        self.write_atomic(digest)
    }

    fn clear(&mut self) -> Result<(), ChangeError> {
        self.write_atomic("")
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryChangeRecord {
    pub value: Option<String>,
    pub writes: usize,
}

#[cfg(test)]
impl ChangeRecord for MemoryChangeRecord {
    fn load(&mut self) -> Result<Option<String>, ChangeError> {
        Ok(self.value.clone())
    }

    fn store(&mut self, digest: &str) -> Result<(), ChangeError> {
        self.value = Some(digest.to_string());
        self.writes += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ChangeError> {
        self.value = None;
        self.writes += 1;
        Ok(())
    }
}
