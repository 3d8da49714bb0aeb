use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use crate::{error::StorageError, models::Student};

pub const CERTIFICATE_DIR: &str = "certificates";

/// Deterministic artifact name for a student's certificate. Doubles as the download handle.
pub fn certificate_name(student: &Student) -> String {
    format!(
        "{}/{}_{}.pdf",
        CERTIFICATE_DIR,
        student.certificate_id,
        student.full_name.replace(' ', "_")
    )
}

/// Whether the certificate name for `full_name` stays a single file directly under
/// [`CERTIFICATE_DIR`]. A path separator in the name nests it, and a `..` segment
/// makes the store reject it.
pub fn is_flat_name(full_name: &str) -> bool { !full_name.contains(['/', '\\']) }

/// Persisted-artifact store. Names are relative, `/`-separated handles.
pub trait ArtifactStore: Send + Sync {
    /// Replaces any existing artifact with the same name and returns its handle.
    fn save(&self, name: &str, bytes: &[u8]) -> Result<String, StorageError>;
    fn exists(&self, name: &str) -> bool;
    fn open(&self, name: &str) -> Result<Bytes, StorageError>;
}

pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    pub fn root(&self) -> &Path { &self.root }

    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(name);
        let clean = !name.is_empty()
            && rel.components().all(|c| matches!(c, Component::Normal(_)));
        if !clean {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Whole-file replace: readers see the old file or the new one, never a mix.
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        std::fs::write(&tmp, bytes)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!(artifact = name, size = bytes.len(), "artifact saved");
        Ok(name.to_string())
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).map(|p| p.is_file()).unwrap_or(false)
    }

    fn open(&self, name: &str) -> Result<Bytes, StorageError> {
        let path = self.resolve(name)?;
        Ok(Bytes::from(std::fs::read(path)?))
    }
}
