pub mod download;
pub mod http;

pub use download::{filename_from_url, Downloader};
pub use http::{ByteStream, FetchedResource, Fetcher, HttpFetcher};
