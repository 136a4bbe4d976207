// ============================================================
// Layer 6 - Versioned Cache Files
// ============================================================
// Binary cache files used to memoise expensive steps between
// runs (entity ingestion, sparse vectorisation).
//
// File layout (bincode):
//   CacheHeader { schema, version }
//   payload
//
// The header is decoded first. A file written for another
// schema or another version is reported as a mismatch, so
// callers recompute instead of decoding a stale layout. Callers
// fold any setting that changes the payload into the schema tag
// (e.g. "publication-teams:tokens").
//
// There is no locking: two processes writing the same cache
// path at the same time can leave a torn file behind. A torn
// file decodes as corrupt and is recomputed on the next run.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Why a cache file could not be used.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("no cache file at '{0}'")]
    Missing(PathBuf),

    #[error("cannot read cache '{path}': {source}")]
    Io {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("cache '{path}' is corrupt: {source}")]
    Corrupt {
        path:   PathBuf,
        source: bincode::Error,
    },

    #[error("cache '{path}' holds {found_schema} v{found_version}, expected {schema} v{version}")]
    Mismatch {
        path:          PathBuf,
        schema:        String,
        version:       u32,
        found_schema:  String,
        found_version: u32,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheHeader {
    schema:  String,
    version: u32,
}

/// One cache file with a fixed schema tag and version.
#[derive(Debug, Clone)]
pub struct VersionedCache {
    path:    PathBuf,
    schema:  String,
    version: u32,
}

impl VersionedCache {
    pub fn new(path: impl Into<PathBuf>, schema: impl Into<String>, version: u32) -> Self {
        Self { path: path.into(), schema: schema.into(), version }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the payload, or explain why the file cannot be used.
    ///
    /// Decoding works on the in-memory bytes so that a garbage
    /// length prefix fails as corrupt instead of being allocated.
    pub fn load<T: DeserializeOwned>(&self) -> Result<T, CacheError> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::Missing(self.path.clone()));
            }
            Err(source) => {
                return Err(CacheError::Io { path: self.path.clone(), source });
            }
        };
        let corrupt = |source| CacheError::Corrupt { path: self.path.clone(), source };

        let header: CacheHeader = bincode::deserialize(&bytes).map_err(corrupt)?;
        if header.schema != self.schema || header.version != self.version {
            return Err(CacheError::Mismatch {
                path:          self.path.clone(),
                schema:        self.schema.clone(),
                version:       self.version,
                found_schema:  header.schema,
                found_version: header.version,
            });
        }

        let offset = bincode::serialized_size(&header).map_err(corrupt)? as usize;
        bincode::deserialize(&bytes[offset..]).map_err(corrupt)
    }

    /// Write header and payload, creating parent directories.
    pub fn store<T: Serialize>(&self, payload: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Cannot create cache directory '{}'", parent.display())
            })?;
        }

        let file = fs::File::create(&self.path)
            .with_context(|| format!("Cannot create cache '{}'", self.path.display()))?;
        let mut writer = BufWriter::new(file);

        let header = CacheHeader {
            schema:  self.schema.clone(),
            version: self.version,
        };
        bincode::serialize_into(&mut writer, &header)
            .with_context(|| format!("Cannot write cache header to '{}'", self.path.display()))?;
        bincode::serialize_into(&mut writer, payload)
            .with_context(|| format!("Cannot write cache payload to '{}'", self.path.display()))?;
        writer.flush()?;

        tracing::debug!("Wrote cache '{}'", self.path.display());
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_then_load() {
        let dir   = tempfile::tempdir().unwrap();
        let cache = VersionedCache::new(dir.path().join("nested/a.bin"), "numbers", 1);

        cache.store(&vec![1u32, 2, 3]).unwrap();
        let back: Vec<u32> = cache.load().unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_file() {
        let dir   = tempfile::tempdir().unwrap();
        let cache = VersionedCache::new(dir.path().join("none.bin"), "numbers", 1);
        assert!(matches!(cache.load::<Vec<u32>>(), Err(CacheError::Missing(_))));
    }

    #[test]
    fn test_version_bump_is_a_mismatch() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        VersionedCache::new(&path, "numbers", 1).store(&vec![1u32]).unwrap();

        let newer = VersionedCache::new(&path, "numbers", 2);
        assert!(matches!(newer.load::<Vec<u32>>(), Err(CacheError::Mismatch { .. })));
    }

    #[test]
    fn test_other_schema_tag_is_a_mismatch() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        VersionedCache::new(&path, "numbers:characters", 1).store(&vec![1u32]).unwrap();

        let other = VersionedCache::new(&path, "numbers:tokens", 1);
        assert!(matches!(other.load::<Vec<u32>>(), Err(CacheError::Mismatch { .. })));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        fs::write(&path, b"\xff\xff\xff").unwrap();

        let cache = VersionedCache::new(&path, "numbers", 1);
        assert!(matches!(cache.load::<Vec<u32>>(), Err(CacheError::Corrupt { .. })));
    }
}
