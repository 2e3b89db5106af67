//! soilscope Entry Point
//!
//! Launches the terminal client, or runs a single analysis headlessly.
//!
//! Usage:
//!   soilscope [OPTIONS]
//!   soilscope --analyze <PATH> [--json]

use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal};
use std::panic;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use analyzer_core::{
    default_config_path, load_config_with_overrides, AppConfig, ConfigOverrides, HttpClassifier,
    Shell,
};
use soilscope_tui::headless::{analyze_file, OutputFormat};
use soilscope_tui::theme::ThemeMode;
use soilscope_tui::App;

/// Soil photo analysis client
#[derive(Parser, Debug)]
#[command(name = "soilscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Classification endpoint URL
    #[arg(short = 'e', long, value_name = "URL")]
    endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(short = 't', long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Largest image accepted for upload, in bytes
    #[arg(long, value_name = "BYTES")]
    max_upload_bytes: Option<u64>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "SOILSCOPE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Analyze one image and print the result instead of starting the UI
    #[arg(short = 'a', long, value_name = "PATH")]
    analyze: Option<PathBuf>,

    /// Print the analysis as JSON (with --analyze)
    #[arg(long, requires = "analyze")]
    json: bool,

    /// Start with the light theme
    #[arg(long)]
    light: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "SOILSCOPE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ref url) = self.endpoint {
            overrides = overrides.with_endpoint(url.clone());
        }
        if let Some(secs) = self.timeout_secs {
            overrides = overrides.with_timeout_secs(secs);
        }
        if let Some(bytes) = self.max_upload_bytes {
            overrides = overrides.with_max_file_size(bytes);
        }
        overrides
    }
}

/// Where log output goes
enum LogTarget {
    /// Headless mode: stderr
    Stderr,
    /// TUI mode: a file, so the alternate screen stays clean
    File(PathBuf),
    /// TUI mode without a cache directory
    Discard,
}

fn log_target(headless: bool) -> LogTarget {
    if headless {
        return LogTarget::Stderr;
    }
    match dirs::cache_dir() {
        Some(dir) => LogTarget::File(dir.join("soilscope").join("soilscope.log")),
        None => LogTarget::Discard,
    }
}

fn init_logging(level: &str, target: &LogTarget) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("soilscope={level},soilscope_tui={level},analyzer_core={level}")));

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(io::stderr),
                )
                .with(filter)
                .init();
        }
        LogTarget::File(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating log directory {}", dir.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;

            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .with(filter)
                .init();
        }
        LogTarget::Discard => {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_writer(io::sink))
                .with(filter)
                .init();
        }
    }

    Ok(())
}

fn resolve_config(args: &Args) -> Result<AppConfig> {
    if let Some(ref path) = args.config {
        if !path.exists() {
            bail!("config file {} does not exist", path.display());
        }
    }

    let path = args.config.clone().or_else(default_config_path);
    let config =
        load_config_with_overrides(path, &args.overrides()).context("loading configuration")?;

    tracing::info!(
        endpoint = %config.endpoint.url,
        timeout_secs = config.endpoint.timeout.as_secs(),
        max_upload = config.upload.max_file_size,
        source = %config.source(),
        "Configuration resolved"
    );

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let target = log_target(args.analyze.is_some());
    init_logging(&args.log_level, &target)?;

    let config = resolve_config(&args)?;
    let backend = Arc::new(HttpClassifier::new(config.endpoint.clone())?);
    let shell = Shell::new(backend, config.upload);

    if let Some(ref path) = args.analyze {
        let format = if args.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };
        return Ok(run_headless(shell, path, format).await);
    }

    // Check if we have a TTY before attempting initialization
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("soilscope requires a terminal (TTY) for the interactive client.");
        eprintln!();
        eprintln!("To analyze a photo without one:");
        eprintln!("  soilscope --analyze path/to/soil.jpg [--json]");
        return Ok(ExitCode::FAILURE);
    }

    if let LogTarget::File(ref path) = target {
        tracing::info!(log = %path.display(), "soilscope starting");
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;

    let theme = if args.light {
        ThemeMode::Light
    } else {
        ThemeMode::Dark
    };
    let mut app = App::new(shell, theme, config.endpoint.url.clone());
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result.map(|()| ExitCode::SUCCESS)
}

async fn run_headless(
    mut shell: Shell<HttpClassifier>,
    path: &Path,
    format: OutputFormat,
) -> ExitCode {
    let mut stdout = io::stdout().lock();
    match analyze_file(&mut shell, path, format, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "Analysis failed");
            eprintln!("soilscope: {err}");
            ExitCode::FAILURE
        }
    }
}
