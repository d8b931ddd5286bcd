use crate::downloader::Fetcher;
use crate::error::{MirrorError, Result};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Stem used when a link's URL path has no final segment to name the file
/// after. Uniqueness still comes from the collision-suffix search.
pub const FALLBACK_FILE_STEM: &str = "attachment";

/// Fetches single links to disk. Streams the body in chunks so arbitrarily
/// large attachments never sit in memory, and stamps the remote modification
/// time onto the local file when the server provided one.
#[derive(Clone)]
pub struct Downloader {
    fetcher: Arc<dyn Fetcher>,
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Downloads `url` into `dir` and returns the path actually written,
    /// which may carry a `_N` suffix when the derived name was taken.
    pub async fn fetch_to_dir(&self, url: &str, dir: &Path) -> Result<PathBuf> {
        let mut resource = self.fetcher.fetch(url).await?;

        let (mut file, target) = create_unique_file(&dir.join(filename_from_url(url))).await?;

        let copied: Result<()> = async {
            while let Some(chunk) = resource.body.next().await {
                let chunk = chunk.map_err(|e| MirrorError::Download {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = copied {
            // A half-written file must not shadow a future retry.
            drop(file);
            let _ = tokio::fs::remove_file(&target).await;
            return Err(e);
        }
        drop(file);

        if let Some(mtime) = resource.last_modified {
            let _ = filetime::set_file_mtime(&target, filetime::FileTime::from_system_time(mtime));
        }

        Ok(target)
    }
}

/// Filename for a link: the final segment of the URL path, query string
/// stripped, kept percent-encoded exactly as it appears.
pub fn filename_from_url(url: &str) -> String {
    let name = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|segments| segments.last().map(str::to_string))
        })
        .unwrap_or_default();

    if name.is_empty() {
        FALLBACK_FILE_STEM.to_string()
    } else {
        name
    }
}

/// Reserves the first free path among `name`, `name_1`, `name_2`, ... (suffix
/// on the stem, extension preserved) and returns the created file with it.
/// Reservation is the `create_new` open itself, so two concurrent downloads
/// deriving the same name can never claim the same path; the loser of the
/// race sees `AlreadyExists` and moves on to the next suffix.
async fn create_unique_file(desired: &Path) -> Result<(File, PathBuf)> {
    let dir = desired.parent().unwrap_or_else(|| Path::new(""));
    let stem = desired
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(FALLBACK_FILE_STEM);
    let extension = desired.extension().and_then(|e| e.to_str());

    let mut counter = 0;
    loop {
        let candidate = if counter == 0 {
            desired.to_path_buf()
        } else {
            let name = match extension {
                Some(ext) => format!("{}_{}.{}", stem, counter, ext),
                None => format!("{}_{}", stem, counter),
            };
            dir.join(name)
        };

        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(file) => return Ok((file, candidate)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => counter += 1,
            Err(e) => return Err(MirrorError::Io(e)),
        }
    }
}
