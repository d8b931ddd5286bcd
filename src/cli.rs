use crate::config::{CliOverrides, Config};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dcemirror")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Mirror Discord CDN attachments referenced by chat-export files")]
#[command(
    long_about = "dcemirror scans DiscordChatExporter export files for Discord CDN links, \
                  downloads every referenced attachment into a per-file output folder, and \
                  writes an offline copy of the export whose links point at the local files. \
                  Runs are resumable: already-downloaded attachments are never fetched again."
)]
#[command(after_help = "EXAMPLES:\n  \
    dcemirror --input-file export.html\n  \
    dcemirror --input-dir ./exports --output-dir ./mirrored\n  \
    dcemirror --input-dir ./exports --formats html,json --yes\n  \
    dcemirror --input-file export.txt --force-unlock\n")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// A single export file to convert
    #[arg(long, value_name = "FILE")]
    pub input_file: Option<PathBuf>,

    /// Directory with export files to convert
    #[arg(long, value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Directory where the per-file output folders are created
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Input file extensions to accept (comma-separated)
    #[arg(short, long, help = "Input extensions to accept (e.g. html,txt,json,csv)")]
    pub formats: Option<String>,

    /// Per-request download timeout in seconds
    #[arg(long, help = "Timeout for each attachment download (seconds)")]
    pub timeout: Option<u64>,

    /// Concurrent downloads per input file
    #[arg(long, help = "Number of attachments downloaded in parallel")]
    pub concurrency: Option<usize>,

    /// Persist the mapping after this many completed downloads
    #[arg(long, help = "Save progress every N downloads")]
    pub save_every: Option<usize>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Remove a stale lock marker instead of prompting
    #[arg(long, help = "Delete an existing lock marker without asking")]
    pub force_unlock: bool,

    /// Skip the confirmation prompt before processing
    #[arg(short = 'y', long, help = "Assume yes for the start-conversion prompt")]
    pub yes: bool,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (list matched files and links without downloading)
    #[arg(long, help = "Show what would be processed without downloading")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> crate::error::Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_formats(self.formats.clone())
            .with_timeout(self.timeout)
            .with_concurrency(self.concurrency)
            .with_save_every(self.save_every)
            .with_output_dir(self.output_dir.clone())
    }

    /// Interactive prompts are only meaningful on a terminal and in human
    /// output mode; everywhere else the answer defaults to yes.
    pub fn is_interactive(&self) -> bool {
        !self.yes
            && !self.quiet
            && matches!(self.output_format, OutputFormat::Human)
            && console::Term::stdout().features().is_attended()
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}
