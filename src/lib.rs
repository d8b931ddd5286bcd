pub mod cli;
pub mod config;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod folder;
pub mod mapping;
pub mod rewriter;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, DownloadConfig, FilterConfig, OutputConfig};
pub use error::{MirrorError, Result, UserFriendlyError};

// Core functionality re-exports
pub use downloader::{Downloader, Fetcher, HttpFetcher};
pub use extractor::LinkExtractor;
pub use folder::{OutputFolder, ATTACHMENTS_DIR_NAME, LOCK_FILE_NAME};
pub use mapping::{Mapping, MappingStore};
pub use rewriter::OfflineRewriter;
pub use scanner::InputScanner;
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use futures_util::StreamExt;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of mirroring one export file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input_path: PathBuf,
    pub output_folder: PathBuf,
    pub offline_copy: PathBuf,
    /// Distinct links known for this file, including ones resolved on
    /// earlier runs.
    pub links_total: usize,
    /// Attachments fetched during this run.
    pub downloaded: usize,
    pub failures: Vec<String>,
    pub duration: Duration,
}

/// Outcome of a whole run over one or more export files.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub reports: Vec<FileReport>,
    /// Per-file fatal errors that did not stop the run.
    pub file_errors: Vec<String>,
}

impl RunReport {
    pub fn total_downloaded(&self) -> usize {
        self.reports.iter().map(|r| r.downloaded).sum()
    }

    pub fn total_failures(&self) -> usize {
        self.reports.iter().map(|r| r.failures.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.file_errors.is_empty() && self.total_failures() == 0
    }
}

/// Main library interface: scans export files for CDN links, downloads the
/// referenced attachments into per-file output folders, and writes offline
/// copies whose links point at the local files.
pub struct DceMirror {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
    fetcher: Arc<dyn Fetcher>,
}

impl DceMirror {
    /// Create a new DceMirror instance with the provided configuration
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(
            config.download_timeout(),
            &config.download.user_agent,
        )?);

        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet);
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
            fetcher,
        })
    }

    /// Create a DceMirror instance for testing: custom transport, no signal
    /// handler registration, no terminal output.
    pub fn new_with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            output_formatter: OutputFormatter::new(OutputMode::Plain, 0, true),
            progress_manager: ProgressManager::new(false),
            shutdown: GracefulShutdown::new_for_test(),
            fetcher,
        }
    }

    /// Create DceMirror instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbose, cli_args.quiet)
    }

    /// Mirrors one export file end to end: acquires its output folder,
    /// reconciles the persisted mapping with a fresh scan, downloads what is
    /// missing, and writes the offline copy. The folder lock is released on
    /// every exit path.
    pub async fn mirror_file(&self, input: &Path) -> Result<FileReport> {
        self.shutdown.check_shutdown()?;

        let mut output_folder =
            OutputFolder::for_input_file(&self.config.output.base_directory, input)?;
        output_folder.open()?;

        let result = self.mirror_into_folder(input, &output_folder).await;
        let close_result = output_folder.close();

        let report = result?;
        close_result?;
        Ok(report)
    }

    async fn mirror_into_folder(
        &self,
        input: &Path,
        output_folder: &OutputFolder,
    ) -> Result<FileReport> {
        let started = Instant::now();

        self.output_formatter
            .start_operation(&format!("Processing {}", input.display()));

        let mut mapping = output_folder.load_mappings()?;

        // Union the fresh scan into the persisted mapping; prior entries,
        // resolved or not, are never disturbed.
        let extractor = LinkExtractor::new();
        for link in extractor.scan_file(input)? {
            mapping.insert_link(link);
        }
        output_folder.save_mappings(&mapping)?;

        let pending = self.pending_links(&mapping, output_folder);
        self.output_formatter.info(&format!(
            "{} distinct link(s), {} to download",
            mapping.len(),
            pending.len()
        ));

        let (downloaded, failures) = self
            .download_pending(pending, &mut mapping, output_folder)
            .await?;

        output_folder.save_mappings(&mapping)?;
        self.shutdown.check_shutdown()?;

        let offline_copy = output_folder.offline_output_path(input)?;
        OfflineRewriter::new().rewrite_file(input, &offline_copy, &mapping)?;

        Ok(FileReport {
            input_path: input.to_path_buf(),
            output_folder: output_folder.root().to_path_buf(),
            offline_copy,
            links_total: mapping.len(),
            downloaded,
            failures,
            duration: started.elapsed(),
        })
    }

    /// Links that still need a fetch: never downloaded, or resolved to a
    /// file that no longer exists on disk.
    fn pending_links(&self, mapping: &Mapping, output_folder: &OutputFolder) -> Vec<String> {
        mapping
            .iter()
            .filter(|entry| match &entry.local_path {
                None => true,
                Some(rel) => !output_folder.root().join(rel).exists(),
            })
            .map(|entry| entry.link.clone())
            .collect()
    }

    /// Runs the pending fetches with bounded concurrency. Results are
    /// consumed one at a time on this task, so mapping updates and periodic
    /// saves stay serialized no matter how many fetches are in flight.
    async fn download_pending(
        &self,
        pending: Vec<String>,
        mapping: &mut Mapping,
        output_folder: &OutputFolder,
    ) -> Result<(usize, Vec<String>)> {
        let mut downloaded = 0;
        let mut failures = Vec::new();

        if pending.is_empty() {
            return Ok((downloaded, failures));
        }

        let progress = self
            .progress_manager
            .create_download_progress(pending.len() as u64);
        let download_started = Instant::now();

        let downloader = Downloader::new(self.fetcher.clone());
        let attachments_dir = output_folder.attachments_dir();

        let mut results = futures_util::stream::iter(pending.into_iter().map(|link| {
            let downloader = downloader.clone();
            let dir = attachments_dir.clone();
            async move {
                let result = downloader.fetch_to_dir(&link, &dir).await;
                (link, result)
            }
        }))
        .buffer_unordered(self.config.download.concurrency);

        let mut completed_since_save = 0;

        while let Some((link, result)) = results.next().await {
            match result {
                Ok(path) => {
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    mapping.set_local_path(&link, format!("{}/{}", ATTACHMENTS_DIR_NAME, file_name));
                    downloaded += 1;
                    completed_since_save += 1;
                }
                Err(e) if e.is_recoverable() => {
                    let message = e.user_message();
                    self.progress_manager
                        .suspend(|| self.output_formatter.warning(&message));
                    failures.push(message);
                }
                Err(e) => {
                    output_folder.save_mappings(mapping)?;
                    return Err(e);
                }
            }

            progress.inc(1);

            if completed_since_save >= self.config.download.save_every {
                output_folder.save_mappings(mapping)?;
                completed_since_save = 0;
            }

            // A requested stop drains nothing further; what finished so far
            // is persisted by the caller before the Cancelled error surfaces.
            if !self.shutdown.is_running() {
                break;
            }
        }

        ui::progress::finish_progress_with_summary(
            &progress,
            &format!("Downloaded {} attachment(s)", downloaded),
            download_started.elapsed(),
        );

        Ok((downloaded, failures))
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config).map_err(MirrorError::Io)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn progress_manager(&self) -> &ProgressManager {
        &self.progress_manager
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    pub fn handle_error(&self, error: &MirrorError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
