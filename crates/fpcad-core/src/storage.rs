//! Document persistence backends.
//!
//! [`Storage`] abstracts over where footprint documents live. The file
//! backend keeps one pretty-printed JSON file per footprint under a
//! directory (by default inside the platform data dir); the memory
//! backend backs tests and scratch sessions.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::document::FootprintDocument;
use crate::error::{Error, Result};

pub trait Storage {
    fn save(&mut self, id: &str, doc: &FootprintDocument) -> Result<()>;
    fn load(&self, id: &str) -> Result<FootprintDocument>;
    fn delete(&mut self, id: &str) -> Result<()>;
    fn list(&self) -> Result<Vec<String>>;
    fn exists(&self, id: &str) -> bool;
}

/// Allowed: letters, digits, `-`, `_` and `.` (not leading).
fn validate_id(id: &str) -> Result<()> {
    let ok = !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(Error::Storage(format!("invalid document id: {id:?}")))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    docs: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn save(&mut self, id: &str, doc: &FootprintDocument) -> Result<()> {
        validate_id(id)?;
        self.docs.insert(id.to_owned(), doc.to_json()?);
        Ok(())
    }

    fn load(&self, id: &str) -> Result<FootprintDocument> {
        let json = self
            .docs
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_owned()))?;
        FootprintDocument::from_json(json)
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        self.docs
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(id.to_owned()))
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.docs.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn exists(&self, id: &str) -> bool {
        self.docs.contains_key(id)
    }
}

#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open a storage directory, creating it if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| Error::Storage(e.to_string()))?;
        Ok(FileStorage { dir })
    }

    /// Storage in the platform data directory.
    pub fn open_default() -> Result<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| Error::Storage("no platform data directory".into()))?;
        Self::new(base.join("fpcad").join("footprints"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl Storage for FileStorage {
    fn save(&mut self, id: &str, doc: &FootprintDocument) -> Result<()> {
        validate_id(id)?;
        let path = self.path_for(id);
        debug!("saving footprint {id} to {}", path.display());
        fs::write(&path, doc.to_json()?).map_err(|e| Error::Storage(e.to_string()))
    }

    fn load(&self, id: &str) -> Result<FootprintDocument> {
        validate_id(id)?;
        let path = self.path_for(id);
        if !path.exists() {
            return Err(Error::NotFound(id.to_owned()));
        }
        let json = fs::read_to_string(&path).map_err(|e| Error::Storage(e.to_string()))?;
        FootprintDocument::from_json(&json)
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        validate_id(id)?;
        let path = self.path_for(id);
        if !path.exists() {
            return Err(Error::NotFound(id.to_owned()));
        }
        fs::remove_file(&path).map_err(|e| Error::Storage(e.to_string()))
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let entries = fs::read_dir(&self.dir).map_err(|e| Error::Storage(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::Storage(e.to_string()))?;
            let name = entry.file_name();
            if let Some(id) = name.to_str().and_then(|n| n.strip_suffix(".json")) {
                ids.push(id.to_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn exists(&self, id: &str) -> bool {
        self.path_for(id).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ObjectManager;
    use crate::primitives::FreePoint;
    use crate::units::{Unit, UnitNumber};

    fn sample_doc() -> FootprintDocument {
        let mut om = ObjectManager::new(
            "sample",
            UnitNumber::new(10.0, Unit::Mil),
            UnitNumber::new(10.0, Unit::Mil),
        );
        FreePoint::create(&mut om, 1.0, 2.0).unwrap();
        om.to_document()
    }

    #[test]
    fn test_memory_roundtrip() {
        let mut storage = MemoryStorage::new();
        storage.save("a", &sample_doc()).unwrap();
        assert!(storage.exists("a"));
        let doc = storage.load("a").unwrap();
        assert_eq!(doc.fp_name, "sample");
        storage.delete("a").unwrap();
        assert!(matches!(storage.load("a"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path()).unwrap();
        storage.save("qfp-32", &sample_doc()).unwrap();
        assert_eq!(storage.list().unwrap(), vec!["qfp-32".to_owned()]);
        let doc = storage.load("qfp-32").unwrap();
        assert_eq!(doc.points.len(), 1);
        storage.delete("qfp-32").unwrap();
        assert!(storage.list().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_path_traversal_ids() {
        let mut storage = MemoryStorage::new();
        assert!(storage.save("../evil", &sample_doc()).is_err());
        assert!(storage.save("", &sample_doc()).is_err());
        assert!(storage.save(".hidden", &sample_doc()).is_err());
    }
}
