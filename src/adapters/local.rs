use crate::domain::ports::{ImageLibrary, TableStore};
use crate::utils::error::{RecordsError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const BACKUP_SUFFIX: &str = ".backup";

/// Tables stored as files under one directory.
///
/// Overwriting an existing file first copies it to `<file>.backup`.
#[derive(Debug, Clone)]
pub struct LocalTableStore {
    base_path: PathBuf,
    backups: bool,
}

impl LocalTableStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            backups: true,
        }
    }

    /// Store for generated files (reports) that are never backed up.
    pub fn without_backups(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            backups: false,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn full_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }
}

impl TableStore for LocalTableStore {
    fn exists(&self, name: &str) -> bool {
        self.full_path(name).is_file()
    }

    fn read_text(&self, name: &str) -> Result<String> {
        let full_path = self.full_path(name);
        if !full_path.is_file() {
            return Err(RecordsError::MissingInput {
                path: full_path.display().to_string(),
            });
        }
        Ok(fs::read_to_string(full_path)?)
    }

    fn write_text(&self, name: &str, content: &str) -> Result<()> {
        let full_path = self.full_path(name);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if self.backups && full_path.is_file() {
            let mut backup = full_path.clone().into_os_string();
            backup.push(BACKUP_SUFFIX);
            fs::copy(&full_path, &backup)?;
            tracing::debug!("Backup created: {}", PathBuf::from(backup).display());
        }

        fs::write(&full_path, content)?;
        tracing::debug!("Wrote {} ({} bytes)", full_path.display(), content.len());
        Ok(())
    }
}

/// Monument images laid out as `<base>/<yard folder>/<file>`.
#[derive(Debug, Clone)]
pub struct LocalImageLibrary {
    base_path: PathBuf,
}

impl LocalImageLibrary {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl ImageLibrary for LocalImageLibrary {
    fn folder_exists(&self, folder: &str) -> bool {
        self.base_path.join(folder).is_dir()
    }

    fn list(&self, folder: &str) -> Result<Vec<String>> {
        let folder_path = self.base_path.join(folder);
        if !folder_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(folder_path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                match entry.file_name().into_string() {
                    Ok(name) => names.push(name),
                    Err(raw) => tracing::warn!(
                        "Skipping file with a non UTF-8 name in {}: {}",
                        folder,
                        raw.to_string_lossy()
                    ),
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn contains(&self, folder: &str, file: &str) -> bool {
        self.base_path.join(folder).join(file).is_file()
    }

    fn rename(&self, folder: &str, from: &str, to: &str) -> Result<()> {
        let folder_path = self.base_path.join(folder);
        let target = folder_path.join(to);
        if target.exists() {
            return Err(RecordsError::ValidationError {
                message: format!("Cannot rename {} to {}: target exists", from, target.display()),
            });
        }
        fs::rename(folder_path.join(from), target)?;
        Ok(())
    }
}
