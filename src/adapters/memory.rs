//! In-memory stores for unit tests.

use crate::domain::ports::{ImageLibrary, TableStore};
use crate::utils::error::{RecordsError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MockStore {
    files: Arc<Mutex<HashMap<String, String>>>,
    writes: Arc<Mutex<Vec<String>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, name: &str, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), content.to_string());
        self
    }

    pub fn get_file(&self, name: &str) -> Option<String> {
        self.files.lock().unwrap().get(name).cloned()
    }

    /// Names written so far, in order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

impl TableStore for MockStore {
    fn exists(&self, name: &str) -> bool {
        self.files.lock().unwrap().contains_key(name)
    }

    fn read_text(&self, name: &str) -> Result<String> {
        self.get_file(name).ok_or_else(|| RecordsError::MissingInput {
            path: name.to_string(),
        })
    }

    fn write_text(&self, name: &str, content: &str) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), content.to_string());
        self.writes.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockImageLibrary {
    folders: Arc<Mutex<BTreeMap<String, BTreeSet<String>>>>,
}

impl MockImageLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_images(self, folder: &str, files: &[&str]) -> Self {
        {
            let mut folders = self.folders.lock().unwrap();
            let entry = folders.entry(folder.to_string()).or_default();
            for file in files {
                entry.insert(file.to_string());
            }
        }
        self
    }
}

impl ImageLibrary for MockImageLibrary {
    fn folder_exists(&self, folder: &str) -> bool {
        self.folders.lock().unwrap().contains_key(folder)
    }

    fn list(&self, folder: &str) -> Result<Vec<String>> {
        Ok(self
            .folders
            .lock()
            .unwrap()
            .get(folder)
            .map(|files| files.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn contains(&self, folder: &str, file: &str) -> bool {
        self.folders
            .lock()
            .unwrap()
            .get(folder)
            .is_some_and(|files| files.contains(file))
    }

    fn rename(&self, folder: &str, from: &str, to: &str) -> Result<()> {
        let mut folders = self.folders.lock().unwrap();
        let files = folders.get_mut(folder).ok_or_else(|| RecordsError::MissingInput {
            path: folder.to_string(),
        })?;
        if files.contains(to) {
            return Err(RecordsError::ValidationError {
                message: format!("Cannot rename {} to {}: target exists", from, to),
            });
        }
        if !files.remove(from) {
            return Err(RecordsError::MissingInput {
                path: format!("{}/{}", folder, from),
            });
        }
        files.insert(to.to_string());
        Ok(())
    }
}
