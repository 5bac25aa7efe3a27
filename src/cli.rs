//! CLI interface module
//!
//! Provides command-line interface using clap derive macros.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

/// Exit codes for the CLI
///
/// These codes follow standard Unix conventions and provide
/// specific error categories for scripting and automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful completion
    Success = 0,
    /// General error
    GeneralError = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Input file or directory not found
    InputNotFound = 3,
    /// Output error (write permission, disk full)
    OutputError = 4,
    /// Error while processing a document
    ProcessingError = 5,
    /// External tool (pdftoppm) error
    ExternalToolError = 6,
}

impl ExitCode {
    /// Convert to process exit code
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Get human-readable description
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::InvalidArgs => "Invalid arguments",
            ExitCode::InputNotFound => "Input file or directory not found",
            ExitCode::OutputError => "Output error (permission denied, disk full, etc.)",
            ExitCode::ProcessingError => "Processing error",
            ExitCode::ExternalToolError => "External tool error (pdftoppm)",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.code()
    }
}

/// Convert scanned lab report PDFs into PowerPoint decks
#[derive(Parser, Debug)]
#[command(name = "reportdeck")]
#[command(author = "reportdeck Contributors")]
#[command(version)]
#[command(about = "Convert scanned lab report PDFs into PowerPoint decks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert report PDFs into slide decks
    Convert(ConvertArgs),
    /// Show system information
    Info,
}

/// Arguments for the convert command
#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Input PDF file or directory
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "./output")]
    pub output: PathBuf,

    /// Rasterization DPI
    #[arg(long, default_value_t = 300)]
    pub dpi: u32,

    /// Darkness threshold for the content band scan (0-255)
    #[arg(long, default_value_t = 153)]
    pub threshold: u8,

    /// Template trim from the top of each page (fraction of page height)
    #[arg(long, default_value_t = 0.16)]
    pub top_trim: f32,

    /// Template trim from the bottom of each page (fraction of page height)
    #[arg(long, default_value_t = 0.05)]
    pub bottom_trim: f32,

    /// Field marker preceding the test item label
    #[arg(long, default_value = "检验项目")]
    pub keyword: String,

    /// Number of parallel threads for batch processing
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Limit pages per document (debug)
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Skip inputs whose deck already exists
    #[arg(long)]
    pub skip_existing: bool,

    /// Re-process even when the deck already exists
    #[arg(long)]
    pub force: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Show execution plan without processing
    #[arg(long)]
    pub dry_run: bool,
}

impl ConvertArgs {
    /// Get thread count (default to available CPUs)
    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }
}

/// Create a styled progress bar for file processing
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb
}

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("Invalid spinner template"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Create a progress bar for page processing
pub fn create_page_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] Page {pos}/{len} ({percent}%) - {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("█▓░"),
    );
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_display() {
        let mut cmd = Cli::command();
        let help = cmd.render_help().to_string();
        assert!(help.contains("reportdeck"));
        assert!(help.contains("convert"));
    }

    #[test]
    fn test_missing_input_error() {
        let result = Cli::try_parse_from(["reportdeck", "convert"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn test_option_parsing() {
        let cli = Cli::try_parse_from([
            "reportdeck",
            "convert",
            "input.pdf",
            "--dpi",
            "600",
            "--threshold",
            "128",
            "--top-trim",
            "0.1",
            "-vv",
        ])
        .unwrap();

        if let Commands::Convert(args) = cli.command {
            assert_eq!(args.dpi, 600);
            assert_eq!(args.threshold, 128);
            assert_eq!(args.top_trim, 0.1);
            assert_eq!(args.verbose, 2);
        } else {
            panic!("Expected Convert command");
        }
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["reportdeck", "convert", "input.pdf"]).unwrap();

        if let Commands::Convert(args) = cli.command {
            assert_eq!(args.output, PathBuf::from("./output"));
            assert_eq!(args.dpi, 300);
            assert_eq!(args.threshold, 153);
            assert_eq!(args.top_trim, 0.16);
            assert_eq!(args.bottom_trim, 0.05);
            assert_eq!(args.keyword, "检验项目");
            assert!(args.threads.is_none());
            assert!(!args.skip_existing);
            assert!(!args.force);
            assert!(!args.quiet);
            assert!(!args.dry_run);
        } else {
            panic!("Expected Convert command");
        }
    }

    #[test]
    fn test_info_command() {
        let cli = Cli::try_parse_from(["reportdeck", "info"]).unwrap();
        assert!(matches!(cli.command, Commands::Info));
    }

    #[test]
    fn test_thread_count_defaults_to_cpus() {
        let cli = Cli::try_parse_from(["reportdeck", "convert", "input.pdf"]).unwrap();
        if let Commands::Convert(args) = cli.command {
            assert!(args.thread_count() >= 1);
        }
    }

    #[test]
    fn test_progress_bar_display() {
        let pb = create_progress_bar(100);
        assert_eq!(pb.length(), Some(100));

        pb.set_position(50);
        assert_eq!(pb.position(), 50);

        pb.finish_with_message("done");
    }

    #[test]
    fn test_spinner_creation() {
        let spinner = create_spinner("Processing...");
        assert_eq!(spinner.message(), "Processing...");
        spinner.finish_with_message("Complete");
    }

    #[test]
    fn test_page_progress_bar() {
        let pb = create_page_progress_bar(10);
        assert_eq!(pb.length(), Some(10));
        pb.finish_with_message("All pages processed");
    }

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::GeneralError.code(), 1);
        assert_eq!(ExitCode::InvalidArgs.code(), 2);
        assert_eq!(ExitCode::InputNotFound.code(), 3);
        assert_eq!(ExitCode::OutputError.code(), 4);
        assert_eq!(ExitCode::ProcessingError.code(), 5);
        assert_eq!(ExitCode::ExternalToolError.code(), 6);
    }

    #[test]
    fn test_exit_code_descriptions() {
        assert_eq!(ExitCode::Success.description(), "Success");
        assert!(!ExitCode::ProcessingError.description().is_empty());
        assert!(ExitCode::ExternalToolError.description().contains("pdftoppm"));
    }

    #[test]
    fn test_exit_code_into_i32() {
        let code: i32 = ExitCode::Success.into();
        assert_eq!(code, 0);

        let code: i32 = ExitCode::ExternalToolError.into();
        assert_eq!(code, 6);
    }
}
