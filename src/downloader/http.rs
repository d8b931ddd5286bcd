use crate::error::{MirrorError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::DateTime;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use std::time::{Duration, SystemTime};

pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// What a successful fetch hands back: the body as an incremental byte
/// stream and the remote modification time, when the server sent one.
pub struct FetchedResource {
    pub body: ByteStream,
    pub last_modified: Option<SystemTime>,
}

impl std::fmt::Debug for FetchedResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedResource")
            .field("body", &"<byte stream>")
            .field("last_modified", &self.last_modified)
            .finish()
    }
}

/// The transport capability the downloader is built on. Production uses
/// [`HttpFetcher`]; tests substitute a stub so no network is involved.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedResource>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// The timeout covers the whole request including the body read, so a
    /// stalled transfer becomes a `Download` error instead of a hang.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| MirrorError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedResource> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| download_error(url, &e))?;

        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date);

        let body = response
            .bytes_stream()
            .map_err(std::io::Error::other)
            .boxed();

        Ok(FetchedResource {
            body,
            last_modified,
        })
    }
}

fn download_error(url: &str, error: &reqwest::Error) -> MirrorError {
    let message = if error.is_timeout() {
        "request timed out".to_string()
    } else if let Some(status) = error.status() {
        format!("HTTP status {}", status)
    } else {
        error.to_string()
    };

    MirrorError::Download {
        url: url.to_string(),
        message,
    }
}

/// `Last-Modified` is an RFC 2822 style date (`Sat, 29 Aug 2026 10:00:00 GMT`).
fn parse_http_date(value: &str) -> Option<SystemTime> {
    DateTime::parse_from_rfc2822(value).ok().map(SystemTime::from)
}
