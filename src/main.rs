// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use voxline::app_config::{self, Config, SynthesisProvider};
use voxline::app_controller::{Controller, RunOutcome};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build timeline and subtitles for narration scripts (default command)
    #[command(alias = "b")]
    Build(BuildArgs),

    /// Generate shell completions for voxline
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Clone)]
struct BuildArgs {
    /// Script JSON file or directory of scripts to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Skip synthesis and estimate every chunk duration
    #[arg(long)]
    dry_run: bool,

    /// Number of synthesis requests in flight
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// VOICEVOX engine URL
    #[arg(long, env = "VOXLINE_ENDPOINT")]
    endpoint: Option<String>,

    /// Maximum characters per subtitle chunk
    #[arg(long)]
    max_chars: Option<usize>,
}

/// voxline - drift-free subtitle timelines for synthesized narration
///
/// Splits narration scripts into subtitle chunks, synthesizes each chunk and
/// places every subtitle on one global timeline built from the measured audio
/// durations.
#[derive(Parser, Debug)]
#[command(name = "voxline")]
#[command(version)]
#[command(about = "Audio-subtitle timeline builder for synthesized narration")]
#[command(long_about = "voxline chunks narration scripts, synthesizes every chunk with VOICEVOX and builds a single global timeline from the measured durations.

EXAMPLES:
    voxline news.json                        # Build news.timeline.json, news.srt, news.sync.log
    voxline -f news.json                     # Force overwrite existing outputs
    voxline --dry-run news.json              # Estimate every duration, no synthesis
    voxline -j 8 --endpoint http://tts:50021 scripts/
    voxline completions bash > voxline.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Script JSON file or directory of scripts to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Skip synthesis and estimate every chunk duration
    #[arg(long)]
    dry_run: bool,

    /// Number of synthesis requests in flight
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// VOICEVOX engine URL
    #[arg(long, env = "VOXLINE_ENDPOINT")]
    endpoint: Option<String>,

    /// Maximum characters per subtitle chunk
    #[arg(long)]
    max_chars: Option<usize>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Tag and ANSI colour for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "\x1B[1;31m"),
            Level::Warn => ("WARN ", "\x1B[1;33m"),
            Level::Info => ("INFO ", "\x1B[1;32m"),
            Level::Debug => ("DEBUG", "\x1B[1;36m"),
            Level::Trace => ("TRACE", "\x1B[1;35m"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let (tag, colour) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", colour, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The level is narrowed once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "voxline", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Build(args)) => run_build(args).await,
        None => {
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

            let build_args = BuildArgs {
                input_path,
                force_overwrite: cli.force_overwrite,
                config_path: cli.config_path,
                log_level: cli.log_level,
                dry_run: cli.dry_run,
                concurrency: cli.concurrency,
                endpoint: cli.endpoint,
                max_chars: cli.max_chars,
            };
            run_build(build_args).await
        }
    }
}

/// Apply command line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, options: &BuildArgs) {
    if options.dry_run {
        config.synthesis.provider = SynthesisProvider::DryRun;
    }
    if let Some(endpoint) = &options.endpoint {
        config.synthesis.endpoint = endpoint.clone();
    }
    if let Some(concurrency) = options.concurrency {
        config.synthesis.concurrent_requests = concurrency;
    }
    if let Some(max_chars) = options.max_chars {
        config.chunking.max_chars = max_chars;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_build(options: BuildArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)
        .with_context(|| format!("Failed to load config: {}", options.config_path))?;
    apply_overrides(&mut config, &options);

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?.with_config_path(&options.config_path);

    if options.input_path.is_file() {
        let output_dir = options
            .input_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();
        if let RunOutcome::Completed(summary) = controller
            .run(options.input_path.clone(), output_dir, options.force_overwrite)
            .await?
        {
            info!(
                "{} chunks, {:.3}s total, {} estimated",
                summary.chunk_count, summary.total_seconds, summary.estimated_count
            );
        }
    } else if options.input_path.is_dir() {
        controller
            .run_folder(options.input_path.clone(), options.force_overwrite)
            .await?;
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
    }

    Ok(())
}
