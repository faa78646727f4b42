// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use tokio::io::AsyncBufReadExt;

use crate::app_config::Config;
use crate::proxy::HttpProxy;
use crate::reader::{PageReader, ReaderEvent, ReaderHandle, ReaderHooks};
use crate::shell::HeadlessShell;

mod app_config;
mod document;
mod errors;
mod playback;
mod proxy;
mod reader;
mod segmenter;
mod selector;
mod shell;

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

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

/// pagereader - read a web page sentence by sentence
///
/// Fetches a page, splits its text content into sentences and plays them
/// back on a timed cadence, printing each sentence as it becomes current.
/// With --timeout-ms 0 the cadence is driven from stdin instead.
#[derive(Parser, Debug)]
#[command(name = "pagereader")]
#[command(version = "0.1.0")]
#[command(about = "Sentence-by-sentence page reader")]
#[command(long_about = "pagereader fetches a web page, segments its text content into sentences
and reads them back one at a time.

EXAMPLES:
    pagereader https://example.com/article        # read with the configured cadence
    pagereader -t 0 https://example.com/article   # interactive: Enter advances
    pagereader --tag p --tag li https://...       # segment only <p> and <li>
    pagereader --region .article https://...      # segment only within .article

INTERACTIVE COMMANDS (with --timeout-ms 0):
    <Enter> or n   next sentence
    b              previous sentence
    p              pause
    r              resume
    q              stop and quit

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different config file with --config-path. If the config file doesn't
    exist, a default one will be created automatically.")]
struct CommandLineOptions {
    /// URL of the page to read
    #[arg(value_name = "URL")]
    url: String,

    /// Per-sentence delay in milliseconds (0 = wait for stdin commands)
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Tag name to parse sentences from (repeatable, overrides config)
    #[arg(long = "tag", value_name = "TAG")]
    tags: Vec<String>,

    /// Query selector scope to restrict segmentation to (repeatable)
    #[arg(long = "region", value_name = "SELECTOR")]
    regions: Vec<String>,

    /// Notification name attached to each activated sentence
    #[arg(short, long)]
    notification: Option<String>,

    /// CSS declaration applied to the highlighted sentence
    #[arg(long)]
    highlight: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
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

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Some(cmd_log_level) = &cli.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&config_log_level));
    }

    // Load or create configuration
    let config_path = &cli.config_path;
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    // Override config with CLI options if provided
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if !cli.tags.is_empty() {
        config.html.tags = cli.tags.clone();
    }
    if let Some(highlight) = &cli.highlight {
        config.highlight = highlight.clone();
    }
    if let Some(notification) = &cli.notification {
        config.notification = Some(notification.clone());
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }
    // The CLI prints every activated sentence, so make sure activation
    // events are emitted even without an explicit notification name.
    if config.notification.is_none() {
        config.notification = Some("SENTENCE".to_string());
    }

    config.validate().context("Configuration validation failed")?;

    if cli.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    let mut hooks = ReaderHooks::default();
    if !cli.regions.is_empty() {
        let regions = cli.regions.clone();
        hooks.regions = Some(Box::new(move |_url| Ok(Some(regions.clone()))));
    }

    let interactive = config.timeout_ms == 0;
    let proxy = Arc::new(HttpProxy::new(&config.proxy)?);
    let (reader, handle, mut events) =
        PageReader::new(config, hooks, proxy, Box::new(HeadlessShell));

    handle.load(cli.url.clone())?;

    let reader_future = reader.run();
    tokio::pin!(reader_future);

    let mut stdin_lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = &mut reader_future => break,
            event = events.recv() => {
                match event {
                    Some(event) => handle_event(event, &handle)?,
                    None => break,
                }
            }
            line = stdin_lines.next_line(), if interactive => {
                match line {
                    Ok(Some(line)) => handle_command(line.trim(), &handle)?,
                    // stdin closed: nothing left to drive the cadence with
                    Ok(None) | Err(_) => handle.stop()?,
                }
            }
        }
    }

    Ok(())
}

/// React to an outbound reader event; terminal events end the loop.
fn handle_event(event: ReaderEvent, handle: &ReaderHandle) -> Result<()> {
    match event {
        ReaderEvent::SentenceActivated { text, .. } => {
            println!("{}", text);
        }
        ReaderEvent::ReaderOpened { original_url, sentence_count } => {
            info!("Reading {} ({} sentences)", original_url, sentence_count);
        }
        ReaderEvent::LoadFailed { url } => {
            warn!("Could not load {}", url);
            handle.shutdown()?;
        }
        ReaderEvent::NothingToRead { url } => {
            warn!("Found no sentences to read in {}", url);
            handle.shutdown()?;
        }
        ReaderEvent::ReaderClosed => {
            handle.shutdown()?;
        }
    }
    Ok(())
}

/// Map an interactive stdin line to a reader command.
fn handle_command(line: &str, handle: &ReaderHandle) -> Result<()> {
    match line {
        "" | "n" => handle.next()?,
        "b" => handle.previous()?,
        "p" => handle.pause()?,
        "r" => handle.resume()?,
        "q" => handle.stop()?,
        other => warn!("Unknown command: {:?}", other),
    }
    Ok(())
}
