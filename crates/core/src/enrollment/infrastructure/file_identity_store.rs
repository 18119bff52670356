use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::enrollment::domain::identity_store::{
    validate_identity_id, IdentityRecord, IdentityStore,
};
use crate::shared::embedding::Embedding;
use crate::shared::error::RecognitionError;

const RECORD_EXTENSION: &str = "json";

#[derive(Serialize, Deserialize)]
struct StoredRecord {
    identity_id: String,
    vector: Embedding,
}

/// Stores each identity as `<dir>/<identity_id>.json`.
///
/// Writes go to a `.part` file that is renamed into place, so a crash never
/// leaves a half-written record behind. The directory is created lazily on
/// the first `put`.
pub struct FileIdentityStore {
    dir: PathBuf,
}

impl FileIdentityStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, identity_id: &str) -> PathBuf {
        self.dir.join(format!("{identity_id}.{RECORD_EXTENSION}"))
    }

    fn storage_err(path: &Path) -> impl FnOnce(io::Error) -> RecognitionError + '_ {
        move |source| RecognitionError::Storage {
            path: path.to_path_buf(),
            source,
        }
    }

    fn read_record(path: &Path) -> Result<IdentityRecord, Box<dyn std::error::Error>> {
        let bytes = fs::read(path)?;
        let stored: StoredRecord = serde_json::from_slice(&bytes)?;
        Ok(IdentityRecord {
            identity_id: stored.identity_id,
            vector: stored.vector,
        })
    }
}

impl IdentityStore for FileIdentityStore {
    fn put(&self, identity_id: &str, vector: &Embedding) -> Result<(), RecognitionError> {
        validate_identity_id(identity_id)?;
        fs::create_dir_all(&self.dir).map_err(Self::storage_err(&self.dir))?;

        let path = self.record_path(identity_id);
        let stored = StoredRecord {
            identity_id: identity_id.to_string(),
            vector: vector.clone(),
        };
        let bytes =
            serde_json::to_vec(&stored).map_err(|source| RecognitionError::Serialization {
                path: path.clone(),
                source,
            })?;

        let temp_path = path.with_extension("part");
        let mut file = fs::File::create(&temp_path).map_err(Self::storage_err(&temp_path))?;
        file.write_all(&bytes)
            .and_then(|_| file.sync_all())
            .map_err(Self::storage_err(&temp_path))?;
        drop(file);

        fs::rename(&temp_path, &path).map_err(Self::storage_err(&path))?;
        log::debug!("Stored {} ({} values)", path.display(), vector.dimension());
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<IdentityRecord>, RecognitionError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::storage_err(&self.dir)(e)),
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(Self::storage_err(&self.dir))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            match Self::read_record(&path) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping unreadable record {}: {e}", path.display()),
            }
        }
        // read_dir order is platform dependent
        records.sort_by(|a, b| a.identity_id.cmp(&b.identity_id));
        Ok(records)
    }

    fn delete(&self, identity_id: &str) -> Result<bool, RecognitionError> {
        validate_identity_id(identity_id)?;
        let path = self.record_path(identity_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::storage_err(&path)(e)),
        }
    }

    fn contains(&self, identity_id: &str) -> Result<bool, RecognitionError> {
        validate_identity_id(identity_id)?;
        Ok(self.record_path(identity_id).is_file())
    }
}
