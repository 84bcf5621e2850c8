use crate::error::RegistryError;
use phoenix_types::RegistryRecord;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Durable, append-only record store.
pub trait VersionRegistry: Send + Sync {
    /// Appends one record. Existing records are never modified.
    fn append(&self, record: &RegistryRecord) -> Result<(), RegistryError>;

    /// All records in append order.
    fn load_all(&self) -> Result<Vec<RegistryRecord>, RegistryError>;

    /// The most recently appended accepted record.
    fn load_last_good(&self) -> Result<Option<RegistryRecord>, RegistryError> {
        Ok(self.load_all()?.into_iter().rev().find(|r| r.is_accepted()))
    }
}

/// JSON array file, fully rewritten per append.
#[derive(Debug)]
pub struct JsonFileRegistry {
    path: PathBuf,
    // serializes load-append-rewrite within one process
    write_lock: Mutex<()>,
}

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> RegistryError {
        RegistryError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    fn write_atomic(&self, contents: &str) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents).map_err(|e| self.io_error(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(&self.path, e))?;
        Ok(())
    }
}

impl VersionRegistry for JsonFileRegistry {
    fn append(&self, record: &RegistryRecord) -> Result<(), RegistryError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RegistryError::LockPoisoned)?;
        // a corrupt history aborts the append instead of being overwritten
        let mut records = self.load_all()?;
        records.push(record.clone());
        let mut json = serde_json::to_string_pretty(&records)?;
        json.push('\n');
        self.write_atomic(&json)?;
        tracing::debug!(
            path = %self.path.display(),
            version_id = %record.version_id,
            decision = %record.decision,
            total = records.len(),
            "registry record appended"
        );
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<RegistryRecord>, RegistryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| self.io_error(&self.path, e))?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&contents).map_err(|e| RegistryError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// In-memory registry for tests.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    records: Mutex<Vec<RegistryRecord>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VersionRegistry for InMemoryRegistry {
    fn append(&self, record: &RegistryRecord) -> Result<(), RegistryError> {
        self.records
            .lock()
            .map_err(|_| RegistryError::LockPoisoned)?
            .push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<RegistryRecord>, RegistryError> {
        Ok(self
            .records
            .lock()
            .map_err(|_| RegistryError::LockPoisoned)?
            .clone())
    }
}
