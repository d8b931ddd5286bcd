use crate::error::{MirrorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub filters: FilterConfig,
    pub download: DownloadConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Extensions an export file may have, without the leading dot.
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Per-request timeout in seconds, covering connect and body read.
    pub timeout: u64,
    /// Concurrent downloads per input file.
    pub concurrency: usize,
    /// Persist the mapping after this many completed fetches.
    pub save_every: usize,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory under which the per-file `output-<name>` folders are created.
    pub base_directory: PathBuf,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            extensions: vec![
                "html".to_string(),
                "txt".to_string(),
                "json".to_string(),
                "csv".to_string(),
            ],
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            concurrency: num_cpus::get().min(8),
            save_every: 5,
            user_agent: "Mozilla/5.0 (DiscordChatExporter-MediaDownloader)".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MirrorError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| MirrorError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| MirrorError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["dcemirror.toml", ".dcemirror.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref formats) = cli_args.formats {
            self.filters.extensions = formats
                .split(',')
                .map(|s| s.trim().trim_start_matches('.').to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(timeout) = cli_args.timeout {
            self.download.timeout = timeout;
        }

        if let Some(concurrency) = cli_args.concurrency {
            self.download.concurrency = concurrency;
        }

        if let Some(save_every) = cli_args.save_every {
            self.download.save_every = save_every;
        }

        if let Some(ref output_dir) = cli_args.output_dir {
            self.output.base_directory = output_dir.clone();
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| MirrorError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| MirrorError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.filters.extensions.is_empty() {
            return Err(MirrorError::Config {
                message: "At least one input file extension must be specified".to_string(),
            });
        }

        if self.download.timeout == 0 {
            return Err(MirrorError::Config {
                message: "Download timeout must be greater than 0".to_string(),
            });
        }

        if self.download.concurrency == 0 {
            return Err(MirrorError::Config {
                message: "Download concurrency must be greater than 0".to_string(),
            });
        }

        if self.download.save_every == 0 {
            return Err(MirrorError::Config {
                message: "Mapping save interval must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download.timeout)
    }

    pub fn create_sample_config() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub formats: Option<String>,
    pub timeout: Option<u64>,
    pub concurrency: Option<usize>,
    pub save_every: Option<usize>,
    pub output_dir: Option<PathBuf>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_formats(mut self, formats: Option<String>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<u64>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: Option<usize>) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_save_every(mut self, save_every: Option<usize>) -> Self {
        self.save_every = save_every;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.filters.extensions.contains(&"html".to_string()));
        assert!(config.filters.extensions.contains(&"csv".to_string()));
        assert_eq!(config.download.timeout, 30);
        assert_eq!(config.download.save_every, 5);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.filters.extensions.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.download.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_operations() {
        let config = Config::default();
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();

        let loaded_config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.download.timeout, loaded_config.download.timeout);
        assert_eq!(config.filters.extensions, loaded_config.filters.extensions);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();

        let overrides = CliOverrides::new()
            .with_timeout(Some(120))
            .with_formats(Some(".html, txt".to_string()));

        config.merge_with_cli_args(&overrides);

        assert_eq!(config.download.timeout, 120);
        assert_eq!(config.filters.extensions, vec!["html", "txt"]);
    }

    #[test]
    fn test_sample_config_generation() {
        let sample = Config::create_sample_config();
        assert!(sample.contains("[filters]"));
        assert!(sample.contains("[download]"));
        assert!(sample.contains("[output]"));
    }
}
