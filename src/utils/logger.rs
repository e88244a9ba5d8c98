use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::utils::error::{EtlError, Result};

pub const DEFAULT_LOG_FILE: &str = "recipe_processing.log";
pub const DEFAULT_LOG_MAX_BYTES: u64 = 1_048_576;
pub const DEFAULT_LOG_BACKUPS: usize = 5;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `None` logs to the console only.
    pub file: Option<PathBuf>,
    pub max_bytes: u64,
    pub backups: usize,
    pub format: LogFormat,
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            max_bytes: DEFAULT_LOG_MAX_BYTES,
            backups: DEFAULT_LOG_BACKUPS,
            format: LogFormat::Text,
            verbose: false,
        }
    }
}

impl LoggingConfig {
    /// Console only, for failures that happen before the real logging
    /// settings are known.
    pub fn console_only(verbose: bool) -> Self {
        Self {
            file: None,
            verbose,
            ..Self::default()
        }
    }
}

/// Keeps the log file open for the lifetime of the process.
///
/// Create it once at start-up with [`init_logger`] and drop it right before
/// exiting; dropping flushes the file. `std::process::exit` skips destructors,
/// so drop the guard explicitly before calling it.
#[derive(Debug)]
#[must_use = "dropping the guard flushes and closes the log file"]
pub struct LoggerGuard {
    file: Option<RotatingFile>,
}

impl LoggerGuard {
    pub fn flush(&self) {
        if let Some(file) = &self.file {
            if let Err(e) = file.flush() {
                eprintln!("failed to flush log file: {}", e);
            }
        }
    }
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        self.flush();
    }
}

pub fn init_logger(config: &LoggingConfig) -> Result<LoggerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config.verbose)));

    let mut layers = vec![build_layer(config.format, io::stderr)];

    let file = match &config.file {
        Some(path) => {
            let file = RotatingFile::open(path.clone(), config.max_bytes, config.backups)
                .map_err(|e| EtlError::ConfigError {
                    message: format!("cannot open log file {}: {}", path.display(), e),
                })?;
            layers.push(build_layer(config.format, file.clone()));
            Some(file)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| EtlError::ConfigError {
            message: format!("logger already initialised: {}", e),
        })?;

    Ok(LoggerGuard { file })
}

/// Filter used when `RUST_LOG` is unset. Covers the library and both
/// binaries, whose events carry their own crate name as target.
pub(crate) fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "recipes_etl=debug,toml_etl=debug,info"
    } else {
        "recipes_etl=info,toml_etl=info"
    }
}

pub(crate) fn build_layer<W>(format: LogFormat, writer: W) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .event_format(LineFormat)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .json()
            .boxed(),
    }
}

/// `2024-05-01 12:00:00,123 - INFO - target - message`
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        write!(
            writer,
            "{} - {} - {} - ",
            Local::now().format(TIMESTAMP_FORMAT),
            metadata.level(),
            metadata.target()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Size-rotated log file: once a write would push the file past `max_bytes`
/// it is renamed to `<path>.1`, older backups shift up to `<path>.<backups>`
/// and the oldest is discarded. With `backups == 0` the file never rotates.
#[derive(Debug, Clone)]
pub struct RotatingFile {
    state: Arc<Mutex<RotatingState>>,
}

#[derive(Debug)]
struct RotatingState {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: File,
    written: u64,
}

pub struct RotatingFileWriter {
    state: Arc<Mutex<RotatingState>>,
}

impl RotatingFile {
    pub fn open(path: PathBuf, max_bytes: u64, backups: usize) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = open_append(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            state: Arc::new(Mutex::new(RotatingState {
                path,
                max_bytes,
                backups,
                file,
                written,
            })),
        })
    }

    pub fn flush(&self) -> io::Result<()> {
        lock(&self.state)?.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = RotatingFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingFileWriter {
            state: Arc::clone(&self.state),
        }
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.state)?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        lock(&self.state)?.file.flush()
    }
}

impl RotatingState {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let incoming = buf.len() as u64;
        if self.backups > 0
            && self.max_bytes > 0
            && self.written > 0
            && self.written + incoming > self.max_bytes
        {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.written += incoming;
        Ok(buf.len())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        for index in (1..self.backups).rev() {
            let source = self.backup_path(index);
            if source.exists() {
                let target = self.backup_path(index + 1);
                if target.exists() {
                    fs::remove_file(&target)?;
                }
                fs::rename(&source, &target)?;
            }
        }
        let first = self.backup_path(1);
        if first.exists() {
            fs::remove_file(&first)?;
        }
        fs::rename(&self.path, &first)?;

        self.file = open_append(&self.path)?;
        self.written = 0;
        Ok(())
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn lock(state: &Mutex<RotatingState>) -> io::Result<MutexGuard<'_, RotatingState>> {
    state
        .lock()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))
}
