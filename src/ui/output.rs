use crate::error::{MirrorError, UserFriendlyError};
use crate::{FileReport, RunReport};
use console::{style, Emoji, Term};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");

pub struct OutputFormatter {
    #[allow(dead_code)]
    term: Term,
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let term = Term::stdout();
        let use_colors = match mode {
            OutputMode::Human => term.features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            term,
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Warning, message),
            OutputMode::Json => self.print_json_message("warning", message),
            OutputMode::Plain => println!("WARNING: {}", message),
        }
    }

    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Info, message),
            OutputMode::Json => self.print_json_message("info", message),
            OutputMode::Plain => println!("INFO: {}", message),
        }
    }

    pub fn debug(&self, message: &str) {
        if self.verbose_level < 2 {
            return;
        }
        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("  {}", style(message).dim());
                } else {
                    println!("  DEBUG: {}", message);
                }
            }
            OutputMode::Json => self.print_json_message("debug", message),
            OutputMode::Plain => println!("DEBUG: {}", message),
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.quiet {
            return;
        }
        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}{}", ROCKET, style(operation).bold());
                } else {
                    println!("> {}", operation);
                }
            }
            OutputMode::Json => self.print_json_message("operation_start", operation),
            OutputMode::Plain => println!("STARTING: {}", operation),
        }
    }

    pub fn print_separator(&self) {
        if self.quiet || self.mode == OutputMode::Json {
            return;
        }
        println!("{}", "-".repeat(60));
    }

    pub fn print_user_friendly_error(&self, error: &MirrorError) {
        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    println!();
                    if self.use_colors {
                        println!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        println!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion,
                    }));
                }
                OutputMode::Plain => println!("SUGGESTION: {}", suggestion),
            }
        }
    }

    pub fn print_file_report(&self, report: &FileReport) {
        match self.mode {
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "file_report",
                    "report": report,
                }));
            }
            _ => {
                if self.quiet {
                    return;
                }
                self.success(&format!(
                    "{}: {} links, {} downloaded, {} failed",
                    report.input_path.display(),
                    report.links_total,
                    report.downloaded,
                    report.failures.len(),
                ));
                self.info(&format!("Offline copy: {}", report.offline_copy.display()));
                for failure in &report.failures {
                    self.warning(failure);
                }
            }
        }
    }

    pub fn print_run_report(&self, report: &RunReport) {
        match self.mode {
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "run_report",
                    "files_processed": report.reports.len(),
                    "files_failed": report.file_errors.len(),
                    "links_downloaded": report.total_downloaded(),
                    "links_failed": report.total_failures(),
                }));
            }
            _ => {
                if self.quiet {
                    return;
                }
                self.print_separator();
                self.info(&format!(
                    "Processed {} file(s): {} attachment(s) downloaded, {} failed",
                    report.reports.len(),
                    report.total_downloaded(),
                    report.total_failures(),
                ));
                for error in &report.file_errors {
                    self.warning(error);
                }
            }
        }
    }

    fn print_human_message(&self, message_type: MessageType, message: &str) {
        if self.use_colors {
            match message_type {
                MessageType::Success => println!("{}{}", CHECKMARK, style(message).green()),
                MessageType::Error => eprintln!("{}{}", CROSS, style(message).red()),
                MessageType::Warning => println!("{}{}", WARNING, style(message).yellow()),
                MessageType::Info => println!("{}{}", INFO, message),
            }
        } else {
            match message_type {
                MessageType::Success => println!("OK: {}", message),
                MessageType::Error => eprintln!("ERROR: {}", message),
                MessageType::Warning => println!("WARNING: {}", message),
                MessageType::Info => println!("INFO: {}", message),
            }
        }
    }

    fn print_json_message(&self, kind: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": kind,
            "message": message,
        }));
    }

    fn print_json_object(&self, value: &serde_json::Value) {
        println!("{}", value);
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }
}
