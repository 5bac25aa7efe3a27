//! reportdeck - Convert scanned lab report PDFs into PowerPoint decks
//!
//! CLI entry point

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use reportdeck::{
    Cli, CliOverrides, Commands, Config, ConvertArgs, DeckPipeline, ExitCode,
    PopplerRasterizer, ProgressCallback, ProgressTracker,
};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert(args) => run_convert(&args),
        Commands::Info => run_info(),
    };

    std::process::exit(match result {
        Ok(()) => ExitCode::Success.code(),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::GeneralError.code()
        }
    });
}

// ============ Progress Callback Implementation ============

/// Verbose progress callback for CLI output
struct VerboseProgress {
    verbose_level: u32,
}

impl VerboseProgress {
    fn new(verbose_level: u32) -> Self {
        Self { verbose_level }
    }
}

impl ProgressCallback for VerboseProgress {
    fn on_step_start(&self, step: &str) {
        if self.verbose_level > 0 {
            println!("  {}", step);
        }
    }

    fn on_step_progress(&self, current: usize, total: usize) {
        if self.verbose_level > 0 {
            print!("\r    Page: {}/{}", current, total);
            std::io::stdout().flush().ok();
        }
    }

    fn on_step_complete(&self, step: &str, message: &str) {
        if self.verbose_level > 0 {
            println!("    {}: {}", step, message);
        }
    }

    fn on_debug(&self, message: &str) {
        if self.verbose_level > 1 {
            println!("    [DEBUG] {}", message);
        }
    }
}

// ============ Convert Command ============

fn run_convert(args: &ConvertArgs) -> anyhow::Result<()> {
    init_tracing(args.verbose, args.quiet);

    let start_time = Instant::now();

    // Validate input path
    if !args.input.exists() {
        eprintln!("Error: Input path does not exist: {}", args.input.display());
        std::process::exit(ExitCode::InputNotFound.code());
    }

    // Collect report PDFs to process
    let pdf_files = collect_pdf_files(&args.input)?;
    if pdf_files.is_empty() {
        eprintln!("Error: No PDF files found in input path");
        std::process::exit(ExitCode::InputNotFound.code());
    }

    // Load config file if specified, otherwise use default search path
    let file_config = match &args.config {
        Some(config_path) => match Config::load_from_path(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                Config::default()
            }
        },
        None => Config::load().unwrap_or_default(),
    };

    // Merge config file with CLI arguments (CLI takes precedence)
    let cli_overrides = create_cli_overrides(args);
    let skip_existing =
        args.skip_existing || file_config.output.skip_existing.unwrap_or(false);
    let deck_config = file_config.merge_with_cli(&cli_overrides);
    let pipeline = DeckPipeline::new(deck_config);

    if args.dry_run {
        print_execution_plan(args, &pdf_files, pipeline.config());
        return Ok(());
    }

    if !PopplerRasterizer::is_available() {
        eprintln!(
            "Error: {} not found on PATH (install poppler-utils)",
            PopplerRasterizer::TOOL
        );
        std::process::exit(ExitCode::ExternalToolError.code());
    }

    // Create output directory
    std::fs::create_dir_all(&args.output)?;

    let verbose = args.verbose > 0 && !args.quiet;
    let progress = VerboseProgress::new(if args.quiet { 0 } else { args.verbose.into() });

    // Track processing results
    let mut ok_count = 0usize;
    let mut skip_count = 0usize;
    let mut error_count = 0usize;

    // Process each report PDF
    for (idx, pdf_path) in pdf_files.iter().enumerate() {
        let output_deck = pipeline.get_output_path(pdf_path, &args.output);

        if skip_existing && !args.force && output_deck.exists() {
            if verbose {
                println!(
                    "[{}/{}] Skipping (exists): {}",
                    idx + 1,
                    pdf_files.len(),
                    pdf_path.display()
                );
            }
            skip_count += 1;
            continue;
        }

        if !args.quiet {
            println!(
                "[{}/{}] Processing: {}",
                idx + 1,
                pdf_files.len(),
                pdf_path.display()
            );
        }

        match pipeline.process_with_progress(pdf_path, &args.output, &progress) {
            Ok(result) => {
                ok_count += 1;
                if !args.quiet {
                    println!(
                        "    Completed: {} slides, {:.2}s, {} bytes",
                        result.slide_count, result.elapsed_seconds, result.output_size
                    );
                }
            }
            Err(e) => {
                eprintln!("Error processing {}: {}", pdf_path.display(), e);
                error_count += 1;
            }
        }
    }

    let elapsed = start_time.elapsed();

    // Print summary
    if !args.quiet {
        ProgressTracker::print_summary(pdf_files.len(), ok_count, skip_count, error_count);
        println!("Total time: {:.2}s", elapsed.as_secs_f64());
    }

    if error_count > 0 {
        anyhow::bail!("{} file(s) failed to process", error_count);
    }

    Ok(())
}

// ============ Helper Functions ============

/// Initialize tracing from the verbosity flags
fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        tracing::Level::ERROR
    } else {
        match verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Create CLI overrides from ConvertArgs
///
/// Only override config file values when CLI explicitly sets a non-default
/// value. This allows config files to provide defaults that aren't
/// overridden by clap defaults.
fn create_cli_overrides(args: &ConvertArgs) -> CliOverrides {
    let mut overrides = CliOverrides::new();

    // CLI defaults - only override if user explicitly changed these
    const DEFAULT_DPI: u32 = 300;
    const DEFAULT_THRESHOLD: u8 = 153;
    const DEFAULT_TOP_TRIM: f32 = 0.16;
    const DEFAULT_BOTTOM_TRIM: f32 = 0.05;
    const DEFAULT_KEYWORD: &str = "检验项目";

    if args.dpi != DEFAULT_DPI {
        overrides.dpi = Some(args.dpi);
    }
    if args.threshold != DEFAULT_THRESHOLD {
        overrides.darkness_threshold = Some(args.threshold);
    }
    if (args.top_trim - DEFAULT_TOP_TRIM).abs() > f32::EPSILON {
        overrides.top_trim_percent = Some(args.top_trim);
    }
    if (args.bottom_trim - DEFAULT_BOTTOM_TRIM).abs() > f32::EPSILON {
        overrides.bottom_trim_percent = Some(args.bottom_trim);
    }
    if args.keyword != DEFAULT_KEYWORD {
        overrides.label_keyword = Some(args.keyword.clone());
    }

    // Only set if explicitly provided
    overrides.threads = args.threads;
    overrides.max_pages = args.max_pages;

    overrides
}

/// Collect report PDF files from input path (file or directory)
fn collect_pdf_files(input: &PathBuf) -> anyhow::Result<Vec<PathBuf>> {
    let mut pdf_files = Vec::new();

    if input.is_file() {
        if input.extension().is_some_and(|ext| ext == "pdf") {
            pdf_files.push(input.clone());
        }
    } else if input.is_dir() {
        for entry in std::fs::read_dir(input)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "pdf") {
                pdf_files.push(path);
            }
        }
        pdf_files.sort();
    }

    Ok(pdf_files)
}

/// Print execution plan for dry-run mode
fn print_execution_plan(
    args: &ConvertArgs,
    pdf_files: &[PathBuf],
    config: &reportdeck::DeckConfig,
) {
    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Input: {}", args.input.display());
    println!("Output: {}", args.output.display());
    println!("Files to process: {}", pdf_files.len());
    println!();
    println!("Pipeline Configuration:");
    println!("  1. Rasterization (DPI: {})", config.dpi);
    println!(
        "  2. Template Trim: top {:.0}%, bottom {:.0}%",
        config.top_trim_percent * 100.0,
        config.bottom_trim_percent * 100.0
    );
    println!(
        "  3. Band Detection (threshold: {}, row fraction: {})",
        config.darkness_threshold, config.row_dark_fraction
    );
    println!("  4. Metadata Extraction (keyword: {})", config.label_keyword);
    println!("  5. Deck Generation (.pptx)");
    println!();
    println!("Processing Options:");
    println!("  Threads: {}", config.threads.unwrap_or_else(num_cpus::get));
    println!(
        "  Skip existing: {}",
        if args.skip_existing { "YES" } else { "NO" }
    );
    println!("  Force re-process: {}", if args.force { "YES" } else { "NO" });
    if let Some(max) = config.max_pages {
        println!("  Max pages: {}", max);
    } else {
        println!("  Max pages: unlimited");
    }
    println!();
    println!("Files:");
    for (i, file) in pdf_files.iter().enumerate() {
        println!("  {}. {}", i + 1, file.display());
    }
}

// ============ Info Command ============

fn run_info() -> anyhow::Result<()> {
    println!("reportdeck v{}", env!("CARGO_PKG_VERSION"));
    println!();

    // System Information
    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  CPUs: {}", num_cpus::get());

    // Memory info (Linux)
    if let Ok(meminfo) = std::fs::read_to_string("/proc/meminfo") {
        if let Some(line) = meminfo.lines().find(|l| l.starts_with("MemTotal:")) {
            if let Some(kb) = line.split_whitespace().nth(1) {
                if let Ok(kb_val) = kb.parse::<u64>() {
                    println!("  Memory: {:.1} GB", kb_val as f64 / 1_048_576.0);
                }
            }
        }
    }

    // External tools
    println!();
    println!("Rasterization Tools:");
    check_tool_with_version("pdftoppm", "Poppler", &["-v"]);

    // Config file locations
    println!();
    println!("Config File Locations:");
    for path in Config::search_paths() {
        println!("  {}", path.display());
    }

    Ok(())
}

fn check_tool_with_version(cmd: &str, name: &str, version_args: &[&str]) {
    match which::which(cmd) {
        Ok(path) => {
            // pdftoppm prints its version to stderr
            if let Ok(output) = std::process::Command::new(&path).args(version_args).output() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let first_line = stdout
                    .lines()
                    .chain(stderr.lines())
                    .next()
                    .unwrap_or("");
                if !first_line.is_empty() && first_line.len() < 80 {
                    println!("  {}: {} ({})", name, first_line.trim(), path.display());
                } else {
                    println!("  {}: {} (found)", name, path.display());
                }
            } else {
                println!("  {}: {} (found)", name, path.display());
            }
        }
        Err(_) => println!("  {}: Not found", name),
    }
}
