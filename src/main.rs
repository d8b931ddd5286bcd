use clap::Parser;
use dcemirror::{
    Cli, DceMirror, InputScanner, LinkExtractor, MirrorError, OutputFolder, OutputFormatter,
    OutputMode, RunReport, UserFriendlyError,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    // Create DceMirror instance
    let mirror = match DceMirror::from_cli(&cli) {
        Ok(mirror) => mirror,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    // Discover input files
    let scanner = InputScanner::new(&mirror.config().filters);
    let (files, warnings) =
        match scanner.discover(cli.input_file.as_deref(), cli.input_dir.as_deref()) {
            Ok(discovered) => discovered,
            Err(e) => {
                mirror.handle_error(&e);
                return 1;
            }
        };

    for warning in &warnings {
        mirror.output_formatter().warning(warning);
    }

    if files.is_empty() {
        mirror.handle_error(&MirrorError::NoInputFiles {
            searched_extensions: mirror.config().filters.extensions.clone(),
        });
        return 6;
    }

    // Handle dry run mode
    if cli.dry_run {
        return handle_dry_run(&mirror, &files);
    }

    mirror
        .output_formatter()
        .info(&format!("{} file(s) will be converted:", files.len()));
    for file in &files {
        println!("  {}", file.display());
    }

    if cli.is_interactive() && !confirm("Start the conversion?") {
        mirror.output_formatter().info("Aborted");
        return 0;
    }

    // Execute main mirroring workflow
    let mut run_report = RunReport::default();

    for input in &files {
        match mirror_one(&mirror, &cli, input).await {
            Ok(Some(report)) => {
                mirror.output_formatter().print_file_report(&report);
                run_report.reports.push(report);
            }
            Ok(None) => {
                run_report
                    .file_errors
                    .push(format!("{}: skipped, output folder is locked", input.display()));
            }
            Err(MirrorError::Cancelled) => {
                mirror.handle_error(&MirrorError::Cancelled);
                return 130; // Interrupted (SIGINT)
            }
            Err(e) => {
                mirror.handle_error(&e);
                run_report
                    .file_errors
                    .push(format!("{}: {}", input.display(), e.user_message()));
            }
        }
    }

    mirror.output_formatter().print_run_report(&run_report);

    if run_report.reports.is_empty() {
        1 // Nothing was converted
    } else if run_report.is_clean() {
        0 // Success
    } else {
        2 // Success with warnings
    }
}

/// Mirrors one input, applying the lock-recovery policy: a held lock is
/// removed when --force-unlock was given or the operator agrees, otherwise
/// the file is skipped (`Ok(None)`).
async fn mirror_one(
    mirror: &DceMirror,
    cli: &Cli,
    input: &Path,
) -> dcemirror::Result<Option<dcemirror::FileReport>> {
    match mirror.mirror_file(input).await {
        Err(MirrorError::LockHeld { lock_path }) => {
            mirror.handle_error(&MirrorError::LockHeld {
                lock_path: lock_path.clone(),
            });

            let remove = cli.force_unlock
                || (cli.is_interactive()
                    && confirm("Remove the lock marker and continue with this file?"));

            if !remove {
                return Ok(None);
            }

            OutputFolder::clear_stale_lock(&lock_path)?;
            mirror.mirror_file(input).await.map(Some)
        }
        other => other.map(Some),
    }
}

fn confirm(question: &str) -> bool {
    print!("{} [y/N] ", question);
    let _ = std::io::stdout().flush();

    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "dcemirror.toml".to_string());

    match DceMirror::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  dcemirror --input-dir <exports> --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(mirror: &DceMirror, files: &[PathBuf]) -> i32 {
    let formatter = mirror.output_formatter();

    formatter.info("DRY RUN MODE - Nothing will be downloaded");
    formatter.print_separator();

    let config = mirror.config();
    formatter.info("Configuration that would be used:");
    println!("  Extensions: {}", config.filters.extensions.join(", "));
    println!("  Timeout: {} seconds", config.download.timeout);
    println!("  Concurrency: {}", config.download.concurrency);
    println!("  Save every: {} downloads", config.download.save_every);
    println!("  Base directory: {}", config.output.base_directory.display());

    formatter.print_separator();
    formatter.info("Conversion plan:");

    let extractor = LinkExtractor::new();
    let mut failed = false;

    for input in files {
        match extractor.scan_file(input) {
            Ok(links) => {
                println!("  {}: {} distinct CDN link(s)", input.display(), links.len());
            }
            Err(e) => {
                formatter.error(&format!("  {}: {}", input.display(), e.user_message()));
                failed = true;
            }
        }
    }

    formatter.print_separator();
    if failed {
        formatter.error("Dry run found unreadable input files");
        return 1;
    }

    formatter.success("Dry run completed successfully");
    formatter.info("Run without --dry-run to perform the conversion");
    0
}

fn print_startup_error(error: &MirrorError) {
    // Create a basic formatter for startup errors
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcemirror::{Config, HttpFetcher, OutputFormat};
    use std::fs;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn cli_with(config: Option<PathBuf>, generate_config: bool, dry_run: bool) -> Cli {
        Cli {
            input_file: None,
            input_dir: None,
            output_dir: None,
            formats: None,
            timeout: None,
            concurrency: None,
            save_every: None,
            config,
            output_format: OutputFormat::Plain,
            force_unlock: false,
            yes: true,
            verbose: 0,
            quiet: true,
            dry_run,
            generate_config,
        }
    }

    fn quiet_mirror(config: Config) -> DceMirror {
        let fetcher =
            HttpFetcher::new(Duration::from_secs(5), &config.download.user_agent).unwrap();
        DceMirror::new_with_fetcher(config, Arc::new(fetcher))
    }

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = cli_with(Some(config_path.clone()), true, false);

        let exit_code = handle_generate_config(&cli);
        assert_eq!(exit_code, 0);
        assert!(config_path.exists());

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[filters]"));
    }

    #[test]
    fn test_dry_run_mode() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("export.txt");
        fs::write(&input, "https://cdn.discordapp.com/a/b.png\n").unwrap();

        let mirror = quiet_mirror(Config::default());
        let exit_code = handle_dry_run(&mirror, &[input]);
        assert_eq!(exit_code, 0);
    }

    #[test]
    fn test_dry_run_with_unreadable_input() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.txt");

        let mirror = quiet_mirror(Config::default());
        let exit_code = handle_dry_run(&mirror, &[missing]);
        assert_eq!(exit_code, 1);
    }
}
