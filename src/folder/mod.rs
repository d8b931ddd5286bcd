pub mod output_folder;

pub use output_folder::{OutputFolder, ATTACHMENTS_DIR_NAME, LOCK_FILE_NAME};
