//! Local CSV stores: latest snapshot (overwrite) and history log (append).
//!
//! Both files are written from the same sanitized batch, so the latest file
//! always equals the tail of the history file. Any failure here is fatal for
//! the pass.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use marketsnap_core::config::OutputConfig;
use marketsnap_core::{Batch, COLUMNS};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to create output dir {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: csv::Error },

    #[error("failed to flush {path}: {source}")]
    Flush { path: PathBuf, source: io::Error },
}

/// Latest + history CSV files.
#[derive(Debug, Clone)]
pub struct CsvStore {
    latest_path: PathBuf,
    history_path: PathBuf,
}

impl CsvStore {
    pub fn new(latest_path: impl Into<PathBuf>, history_path: impl Into<PathBuf>) -> Self {
        Self {
            latest_path: latest_path.into(),
            history_path: history_path.into(),
        }
    }

    pub fn from_config(output: &OutputConfig) -> Self {
        Self::new(output.latest_path(), output.history_path())
    }

    pub fn latest_path(&self) -> &Path {
        &self.latest_path
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    /// Write the batch to both stores: latest first, then history.
    pub fn persist(&self, batch: &Batch) -> Result<(), PersistError> {
        self.write_latest(batch)?;
        self.append_history(batch)
    }

    /// Replace the latest file with header + batch rows.
    pub fn write_latest(&self, batch: &Batch) -> Result<(), PersistError> {
        ensure_parent(&self.latest_path)?;
        let file = fs::File::create(&self.latest_path).map_err(|source| PersistError::Open {
            path: self.latest_path.clone(),
            source,
        })?;
        write_rows(&self.latest_path, file, batch, true)
    }

    /// Append batch rows to the history file, writing the header only when
    /// the file is new or empty.
    pub fn append_history(&self, batch: &Batch) -> Result<(), PersistError> {
        ensure_parent(&self.history_path)?;
        let needs_header = match fs::metadata(&self.history_path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(source) => {
                return Err(PersistError::Open {
                    path: self.history_path.clone(),
                    source,
                })
            }
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.history_path)
            .map_err(|source| PersistError::Open {
                path: self.history_path.clone(),
                source,
            })?;
        write_rows(&self.history_path, file, batch, needs_header)
    }
}

fn ensure_parent(path: &Path) -> Result<(), PersistError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| PersistError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn write_rows(path: &Path, file: fs::File, batch: &Batch, header: bool) -> Result<(), PersistError> {
    let write_err = |source| PersistError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if header {
        wtr.write_record(COLUMNS).map_err(write_err)?;
    }
    for row in &batch.rows {
        wtr.write_record(row.to_fields()).map_err(write_err)?;
    }

    wtr.flush().map_err(|source| PersistError::Flush {
        path: path.to_path_buf(),
        source,
    })
}
