use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Output folder is locked: {lock_path}")]
    LockHeld { lock_path: PathBuf },

    #[error("Mapping file is corrupt: {path}: {message}")]
    CorruptMapping { path: PathBuf, message: String },

    #[error("Download failed for `{url}`: {message}")]
    Download { url: String, message: String },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("No input files matched")]
    NoInputFiles { searched_extensions: Vec<String> },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

impl MirrorError {
    /// True when the error only affects a single link and the run should
    /// continue with the remaining entries.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MirrorError::Download { .. })
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for MirrorError {
    fn user_message(&self) -> String {
        match self {
            MirrorError::LockHeld { lock_path } => {
                format!(
                    "Output folder is in use (lock marker: {})",
                    lock_path.display()
                )
            }
            MirrorError::CorruptMapping { path, message } => {
                format!("Mapping file {} is unreadable: {}", path.display(), message)
            }
            MirrorError::Download { url, message } => {
                format!("Failed to download `{}`: {}", url, message)
            }
            MirrorError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            MirrorError::InvalidPath { path } => {
                format!("Invalid path: {}", path)
            }
            MirrorError::NoInputFiles {
                searched_extensions,
            } => {
                format!(
                    "No input files matched (looked for extensions: {})",
                    searched_extensions.join(", ")
                )
            }
            MirrorError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            MirrorError::LockHeld { .. } => Some(
                "Another process may be using this output folder. If a previous run crashed, \
                 remove the lock marker or rerun with --force-unlock."
                    .to_string(),
            ),
            MirrorError::CorruptMapping { .. } => Some(
                "Delete the mapping file to reset this folder. Attachments already on disk are \
                 kept, but will be fetched again because the link associations are lost."
                    .to_string(),
            ),
            MirrorError::Download { .. } => Some(
                "The link is retried automatically on the next run. Check your network \
                 connection, or whether the attachment still exists."
                    .to_string(),
            ),
            MirrorError::NoInputFiles { .. } => Some(
                "Check the --input-file / --input-dir arguments, or widen the extension \
                 allow-list with --formats (e.g. --formats html,txt,json,csv)."
                    .to_string(),
            ),
            MirrorError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for MirrorError {
    fn from(error: toml::de::Error) -> Self {
        MirrorError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MirrorError>;
