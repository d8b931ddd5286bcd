use crate::error::{MirrorError, Result};
use crate::mapping::{Mapping, MappingStore};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

pub const LOCK_FILE_NAME: &str = "downloads_folder.lock";
pub const ATTACHMENTS_DIR_NAME: &str = "attachments";

/// The on-disk home of one conversion job: the folder root, the attachments
/// subdirectory, the persisted mapping, and a lock marker whose existence
/// means "in use". At most one live process holds the lock at a time; a
/// marker surviving a crash is a recoverable condition that the operator
/// clears explicitly.
#[derive(Debug)]
pub struct OutputFolder {
    root: PathBuf,
    opened: bool,
}

impl OutputFolder {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            opened: false,
        }
    }

    /// Folder root for a given input file under `base_dir`, named
    /// `output-<inputFileName>` like the layout documents.
    pub fn for_input_file(base_dir: &Path, input: &Path) -> Result<Self> {
        let name = input
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| MirrorError::InvalidPath {
                path: input.display().to_string(),
            })?;

        Ok(Self::new(base_dir.join(format!("output-{}", name))))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE_NAME)
    }

    pub fn attachments_dir(&self) -> PathBuf {
        self.root.join(ATTACHMENTS_DIR_NAME)
    }

    pub fn is_locked(&self) -> bool {
        self.lock_path().exists()
    }

    /// Acquires the folder: fails with `LockHeld` when the marker already
    /// exists, otherwise ensures the root and attachments directories
    /// (idempotent) and creates the zero-byte marker.
    pub fn open(&mut self) -> Result<()> {
        let lock_path = self.lock_path();

        if lock_path.exists() {
            return Err(MirrorError::LockHeld { lock_path });
        }

        fs::create_dir_all(&self.root)?;
        fs::create_dir_all(self.attachments_dir())?;

        // create_new loses the race to a concurrent open rather than
        // silently sharing the folder.
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    MirrorError::LockHeld { lock_path }
                } else {
                    MirrorError::Io(e)
                }
            })?;

        self.opened = true;
        Ok(())
    }

    /// Releases the folder. Calling this without a successful `open()` is a
    /// programming error.
    pub fn close(&mut self) -> Result<()> {
        assert!(self.opened, "OutputFolder::close() called before open()");

        fs::remove_file(self.lock_path())?;
        self.opened = false;
        Ok(())
    }

    /// Removal primitive for a stale marker. Whether removal is appropriate
    /// is the caller's policy decision, never taken here.
    pub fn clear_stale_lock(lock_path: &Path) -> Result<()> {
        fs::remove_file(lock_path)?;
        Ok(())
    }

    pub fn load_mappings(&self) -> Result<Mapping> {
        MappingStore::load(&self.root)
    }

    pub fn save_mappings(&self, mapping: &Mapping) -> Result<()> {
        MappingStore::save(&self.root, mapping)
    }

    /// Destination of the rewritten export: `<stem>.offline.<ext>` in the
    /// folder root, or `<name>.offline` when the input has no extension.
    pub fn offline_output_path(&self, input: &Path) -> Result<PathBuf> {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| MirrorError::InvalidPath {
                path: input.display().to_string(),
            })?;

        let name = match input.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.offline.{}", stem, ext),
            None => format!("{}.offline", stem),
        };

        Ok(self.root.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_layout_and_lock() {
        let base = TempDir::new().unwrap();
        let mut folder = OutputFolder::new(base.path().join("output-export.html"));

        folder.open().unwrap();
        assert!(folder.root().exists());
        assert!(folder.attachments_dir().exists());
        assert!(folder.is_locked());
        assert_eq!(fs::metadata(folder.lock_path()).unwrap().len(), 0);
    }

    #[test]
    fn test_second_open_fails_with_lock_held() {
        let base = TempDir::new().unwrap();
        let root = base.path().join("output-export.html");

        let mut first = OutputFolder::new(&root);
        first.open().unwrap();

        let mut second = OutputFolder::new(&root);
        let err = second.open().unwrap_err();
        assert!(matches!(err, MirrorError::LockHeld { .. }));
    }

    #[test]
    fn test_close_releases_and_reopen_succeeds() {
        let base = TempDir::new().unwrap();
        let root = base.path().join("output-export.html");

        let mut folder = OutputFolder::new(&root);
        folder.open().unwrap();
        folder.close().unwrap();
        assert!(!folder.is_locked());

        let mut again = OutputFolder::new(&root);
        again.open().unwrap();
    }

    #[test]
    fn test_open_is_idempotent_on_existing_directories() {
        let base = TempDir::new().unwrap();
        let root = base.path().join("output-export.html");
        fs::create_dir_all(root.join(ATTACHMENTS_DIR_NAME)).unwrap();

        let mut folder = OutputFolder::new(&root);
        folder.open().unwrap();
        assert!(folder.is_locked());
    }

    #[test]
    fn test_clear_stale_lock_allows_reopen() {
        let base = TempDir::new().unwrap();
        let root = base.path().join("output-export.html");

        let mut crashed = OutputFolder::new(&root);
        crashed.open().unwrap();
        // Simulated crash: the lock marker is left behind.

        let mut retry = OutputFolder::new(&root);
        let err = retry.open().unwrap_err();
        let MirrorError::LockHeld { lock_path } = err else {
            panic!("expected LockHeld");
        };

        OutputFolder::clear_stale_lock(&lock_path).unwrap();
        retry.open().unwrap();
    }

    #[test]
    #[should_panic(expected = "close() called before open()")]
    fn test_close_before_open_is_a_programming_error() {
        let base = TempDir::new().unwrap();
        let mut folder = OutputFolder::new(base.path().join("output-x"));
        let _ = folder.close();
    }

    #[test]
    fn test_folder_name_for_input_file() {
        let folder =
            OutputFolder::for_input_file(Path::new("/out"), Path::new("/data/export.html"))
                .unwrap();
        assert_eq!(folder.root(), Path::new("/out/output-export.html"));
    }

    #[test]
    fn test_offline_output_path() {
        let folder = OutputFolder::new("/out/output-export.html");

        let path = folder
            .offline_output_path(Path::new("/data/export.html"))
            .unwrap();
        assert_eq!(path, Path::new("/out/output-export.html/export.offline.html"));

        let path = folder.offline_output_path(Path::new("/data/export")).unwrap();
        assert_eq!(path, Path::new("/out/output-export.html/export.offline"));
    }

    #[test]
    fn test_mapping_delegation() {
        let base = TempDir::new().unwrap();
        let mut folder = OutputFolder::new(base.path().join("output-export.html"));
        folder.open().unwrap();

        let mut mapping = folder.load_mappings().unwrap();
        assert!(mapping.is_empty());

        mapping.insert_link("https://cdn.discordapp.com/a/b.png");
        folder.save_mappings(&mapping).unwrap();

        let reloaded = folder.load_mappings().unwrap();
        assert_eq!(mapping, reloaded);
    }
}
