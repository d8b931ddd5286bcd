use crate::config::FilterConfig;
use crate::error::{MirrorError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Discovers the export files a run will process: an explicit single file,
/// the top level of an input directory filtered by the extension allow-list,
/// or both. Files are treated as opaque text regardless of their extension's
/// stated format.
pub struct InputScanner {
    extensions: Vec<String>,
}

impl InputScanner {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            extensions: config
                .extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
        }
    }

    pub fn is_export_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Collects input files from the optional single-file and directory
    /// arguments. A path of the wrong kind is reported as a warning and
    /// skipped, matching the forgiving CLI behavior; an empty result is the
    /// caller's `NoInputFiles` error.
    pub fn discover(
        &self,
        input_file: Option<&Path>,
        input_dir: Option<&Path>,
    ) -> Result<(Vec<PathBuf>, Vec<String>)> {
        let mut files = Vec::new();
        let mut warnings = Vec::new();

        if let Some(file) = input_file {
            if file.is_file() {
                files.push(file.to_path_buf());
            } else {
                warnings.push(format!(
                    "Ignoring --input-file: {} is not a file",
                    file.display()
                ));
            }
        }

        if let Some(dir) = input_dir {
            if dir.is_dir() {
                files.extend(self.scan_directory(dir)?);
            } else {
                warnings.push(format!(
                    "Ignoring --input-dir: {} is not a directory",
                    dir.display()
                ));
            }
        }

        Ok((files, warnings))
    }

    /// Top-level scan only: exports live side by side, and descending into
    /// an already-converted `output-*` folder must never happen.
    pub fn scan_directory(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(MirrorError::InvalidPath {
                path: format!("{} is not a directory", dir.display()),
            });
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| MirrorError::InvalidPath {
                path: format!("{}: {}", dir.display(), e),
            })?;

            if entry.file_type().is_file() && self.is_export_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}
