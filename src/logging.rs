//! Tracing subscriber setup with secret redaction.
//!
//! Every sink is wrapped in [`Redacted`], so bot tokens and the API
//! `OAuth` value never reach stdout or the log file.

use regex::Regex;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Prefix of the rotated log files
const LOG_FILE_PREFIX: &str = "homework_bot";
/// Rotated files kept on disk
const MAX_LOG_FILES: usize = 7;

/// Regex patterns for redacting sensitive data
pub struct RedactionPatterns {
    token_url: Regex,
    token_bare: Regex,
    token_prefixed: Regex,
    oauth: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token_url: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            token_bare: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            token_prefixed: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
            oauth: Regex::new(r"(OAuth\s+)[A-Za-z0-9_.\-]+")?,
        })
    }

    /// Mask every known secret in `input`.
    #[must_use]
    pub fn redact(&self, input: &str) -> String {
        let mut output = self
            .token_url
            .replace_all(input, "$1[TELEGRAM_TOKEN]$3")
            .to_string();
        output = self
            .token_bare
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .token_prefixed
            .replace_all(&output, "$1[TELEGRAM_TOKEN]")
            .to_string();
        self.oauth.replace_all(&output, "${1}[MASKED]").to_string()
    }
}

/// Any `MakeWriter` whose output passes through [`RedactionPatterns`].
struct Redacted<M> {
    sink: M,
    patterns: Arc<RedactionPatterns>,
}

impl<M> Redacted<M> {
    const fn new(sink: M, patterns: Arc<RedactionPatterns>) -> Self {
        Self { sink, patterns }
    }
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for Redacted<M> {
    type Writer = RedactedWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactedWriter {
            inner: self.sink.make_writer(),
            patterns: Arc::clone(&self.patterns),
        }
    }
}

/// One formatted event is handed over per `write` call.
struct RedactedWriter<W> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> Write for RedactedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let line = self.patterns.redact(&String::from_utf8_lossy(buf));
        // Callers track progress against their own buffer, not the redacted one
        self.inner.write_all(line.as_bytes()).map(|()| buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Install the global subscriber: stdout always, a rotated file under
/// `log_dir` when given.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the process.
///
/// # Errors
///
/// Returns an error if the log directory cannot be used.
pub fn init_logging(
    patterns: Arc<RedactionPatterns>,
    log_dir: Option<&Path>,
) -> Result<Option<WorkerGuard>, InitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(Redacted::new(io::stdout, Arc::clone(&patterns)));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_FILE_PREFIX)
                .filename_suffix("log")
                .max_log_files(MAX_LOG_FILES)
                .build(dir)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Redacted::new(writer, patterns));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
