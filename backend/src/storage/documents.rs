//! On-disk document store: one directory of template files and one of
//! contract files, each named `<id>.pdf`.
//!
//! Writes land in a temporary file inside the target directory and are then
//! renamed over the destination, so readers see either the old or the new
//! bytes and never a partial file.

use crate::error::{AppError, AppResult};
use log::info;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const EXTENSION: &str = "pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Template,
    Contract,
}

impl DocumentKind {
    fn label(self) -> &'static str {
        match self {
            DocumentKind::Template => "template",
            DocumentKind::Contract => "contract",
        }
    }
}

/// Whether `id` can name a stored document: ASCII letters, digits, `-` and `_`.
pub fn valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    templates_dir: PathBuf,
    contracts_dir: PathBuf,
}

impl DocumentStore {
    pub fn new(templates_dir: impl Into<PathBuf>, contracts_dir: impl Into<PathBuf>) -> Self {
        DocumentStore {
            templates_dir: templates_dir.into(),
            contracts_dir: contracts_dir.into(),
        }
    }

    /// Creates both directories when missing.
    pub fn ensure_dirs(&self) -> AppResult<()> {
        fs::create_dir_all(&self.templates_dir)?;
        fs::create_dir_all(&self.contracts_dir)?;
        Ok(())
    }

    /// File name used for an entity's document.
    pub fn file_name(id: &str) -> String {
        format!("{}.{}", id, EXTENSION)
    }

    fn dir(&self, kind: DocumentKind) -> &Path {
        match kind {
            DocumentKind::Template => &self.templates_dir,
            DocumentKind::Contract => &self.contracts_dir,
        }
    }

    fn path(&self, kind: DocumentKind, id: &str) -> AppResult<PathBuf> {
        if !valid_id(id) {
            return Err(AppError::not_found(format!("No {} document for {:?}", kind.label(), id)));
        }
        Ok(self.dir(kind).join(Self::file_name(id)))
    }

    pub fn exists(&self, kind: DocumentKind, id: &str) -> bool {
        self.path(kind, id).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Reads the document, or `None` when nothing is stored for the id.
    pub fn read(&self, kind: DocumentKind, id: &str) -> AppResult<Option<Vec<u8>>> {
        let path = self.path(kind, id)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically replaces the document.
    pub fn write(&self, kind: DocumentKind, id: &str, bytes: &[u8]) -> AppResult<()> {
        let path = self.path(kind, id)?;
        let dir = self.dir(kind);
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| AppError::Io(e.error))?;

        info!("Stored {} document {} ({} bytes)", kind.label(), id, bytes.len());
        Ok(())
    }

    /// Removes the document. Returns whether one existed.
    pub fn delete(&self, kind: DocumentKind, id: &str) -> AppResult<bool> {
        let path = self.path(kind, id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted {} document {}", kind.label(), id);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
