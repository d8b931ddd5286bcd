use crate::error::{MirrorError, Result};
use crate::mapping::Mapping;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const MAPPING_FILE_NAME: &str = "attachment_mapping_file.json";

/// Loads and saves the link→local-path table for one output folder.
///
/// Saves go through a temp file in the same directory followed by a rename,
/// so a reader only ever sees the old or the new complete content.
pub struct MappingStore;

impl MappingStore {
    pub fn mapping_path(folder: &Path) -> PathBuf {
        folder.join(MAPPING_FILE_NAME)
    }

    /// Returns an empty mapping when no file has been persisted yet; a file
    /// that exists but does not parse is a hard error, so prior progress is
    /// never silently discarded.
    pub fn load(folder: &Path) -> Result<Mapping> {
        let path = Self::mapping_path(folder);

        if !path.exists() {
            return Ok(Mapping::new());
        }

        let content = fs::read_to_string(&path)?;

        serde_json::from_str(&content).map_err(|e| MirrorError::CorruptMapping {
            path,
            message: e.to_string(),
        })
    }

    pub fn save(folder: &Path, mapping: &Mapping) -> Result<()> {
        let path = Self::mapping_path(folder);

        let content =
            serde_json::to_string_pretty(mapping).map_err(|e| MirrorError::CorruptMapping {
                path: path.clone(),
                message: format!("Failed to serialize mapping: {}", e),
            })?;

        let mut temp = tempfile::NamedTempFile::new_in(folder)?;
        temp.write_all(content.as_bytes())?;
        temp.flush()?;
        temp.persist(&path)
            .map_err(|e| MirrorError::Io(e.error))?;

        Ok(())
    }
}
