// ============================================================
// Layer 6 - Split Store
// ============================================================
// Writes generated splits as indented JSON next to the
// preprocessed data they index into:
//
//   <dir>/splits.json           ← evaluation split
//   <dir>/temporal_splits.json  ← streaming split
//
// Index arrays are plain JSON lists and fold ids are object
// keys ("0", "1", ...), indented by one space.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::splitter::Splits;

/// Serialise `value` as JSON indented with a single space.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Persists splits under one directory.
pub struct SplitStore {
    dir: PathBuf,
}

impl SplitStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    /// Write the split and return the file path.
    pub fn save(&self, splits: &Splits) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let path = self.dir.join(splits.file_name());
        let json = match splits {
            Splits::Evaluation(s) => to_json_pretty(s)?,
            Splits::Streaming(s)  => to_json_pretty(s)?,
        };

        fs::write(&path, json)
            .with_context(|| format!("Cannot write splits to '{}'", path.display()))?;

        tracing::debug!("Saved splits to '{}'", path.display());
        Ok(path)
    }
}
