use std::io::Write;
use std::sync::Mutex;

use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::LoggingConfig;

/// Box width used by the startup banners, excluding the corner glyphs
const BANNER_WIDTH: usize = 58;

/// Destination for the human-readable console lines both backends print.
///
/// Implementations must not fail the caller: a line that cannot be written
/// is dropped.
pub trait ConsoleLog: Send + Sync {
    /// Write one line of console output
    fn line(&self, line: &str);
}

/// Console log writing to standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutLog;

impl ConsoleLog for StdoutLog {
    fn line(&self, line: &str) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "{}", line);
        let _ = handle.flush();
    }
}

/// Console log that keeps every line in memory
#[derive(Debug, Default)]
pub struct CapturedLog {
    lines: Mutex<Vec<String>>,
}

impl CapturedLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines written so far
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ConsoleLog for CapturedLog {
    fn line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

/// Startup banner shown before a backend starts serving
pub fn banner(title: &str, name: &str, host: &str, port: u16) -> Vec<String> {
    let rule = "═".repeat(BANNER_WIDTH);
    vec![
        format!("╔{}╗", rule),
        format!("║ {:<width$}║", title, width = BANNER_WIDTH - 1),
        format!("╠{}╣", rule),
        format!("║ Name:    {:<48}║", name),
        format!("║ Address: {:<48}║", format!("{}:{}", host, port)),
        format!("╚{}╝", rule),
    ]
}

/// Print a banner followed by the readiness lines
pub fn print_banner(log: &dyn ConsoleLog, lines: &[String], ready: &str) {
    for line in lines {
        log.line(line);
    }
    log.line("");
    log.line(ready);
    log.line("Press Ctrl+C to stop.\n");
}

/// Initialize the tracing system for diagnostics on stderr
pub fn init_tracing(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match config.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => EnvFilter::new(&config.level),
            _ => EnvFilter::new("info"),
        }
    });

    let result = if config.json_format {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(std::io::stderr)
            .json();
        Registry::default().with(env_filter).with(fmt_layer).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(std::io::stderr);
        Registry::default().with(env_filter).with(fmt_layer).try_init()
    };

    if result.is_ok() {
        tracing::debug!(level = %config.level, json = config.json_format, "Tracing initialized");
    }
}
