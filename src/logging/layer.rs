//! `tracing` layer writing plain text lines to a rotating file and a colored
//! console.
//!
//! Line format:
//!
//! ```text
//! 2024-05-01 12:00:00,123 [INFO] Viewed Home Page real_ip=8.8.8.8 cf_ip=None xff="10.0.0.5, 8.8.8.8" remote=127.0.0.1
//! ```
//!
//! Field values that are empty or contain whitespace or quotes are written as
//! quoted, escaped strings.

use std::fmt::{self, Write as _};

use chrono::Local;
use colored::Colorize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use super::rotate::RotatingFile;

/// Timestamp layout of every line (milliseconds after a comma).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Writes every event to the configured sinks.
#[derive(Debug)]
pub struct SiteLogLayer {
    file: Option<RotatingFile>,
    console: bool,
}

impl SiteLogLayer {
    /// Creates a layer writing to `file` and, by default, the console.
    pub fn new(file: Option<RotatingFile>) -> Self {
        SiteLogLayer {
            file,
            console: true,
        }
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    fn write_line(&self, level: Level, line: &str) {
        if let Some(file) = &self.file {
            let mut bytes = Vec::with_capacity(line.len() + 1);
            bytes.extend_from_slice(line.as_bytes());
            bytes.push(b'\n');
            // A logging failure must never reach the request path.
            if let Err(e) = file.append(&bytes) {
                eprintln!("failed to write {}: {e}", file.path().display());
            }
        }
        if self.console {
            eprintln!("{}", colorize(level, line));
        }
    }
}

impl<S> Layer<S> for SiteLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let level = *event.metadata().level();
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let line = format_line(&timestamp, level, &visitor.message, &visitor.fields);

        self.write_line(level, &line);
    }
}

/// Collects the message and the remaining fields of an event.
#[derive(Debug, Default)]
struct LineVisitor {
    message: String,
    fields: Vec<(&'static str, String)>,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((field.name(), format!("{value:?}")));
        }
    }
}

/// Level names as operators expect to grep for them.
fn level_name(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

/// Renders one log line without a trailing newline.
pub fn format_line(
    timestamp: &str,
    level: Level,
    message: &str,
    fields: &[(&'static str, String)],
) -> String {
    let mut line = format!("{timestamp} [{}] {message}", level_name(level));
    for (name, value) in fields {
        if needs_quotes(value) {
            let _ = write!(line, " {name}={value:?}");
        } else {
            let _ = write!(line, " {name}={value}");
        }
    }
    line
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty() || value.contains(|c: char| c.is_whitespace() || c == '"' || c == '\\')
}

/// Colors a whole console line by severity.
pub fn colorize(level: Level, line: &str) -> String {
    match level {
        Level::INFO => line.cyan().to_string(),
        Level::WARN => line.yellow().to_string(),
        Level::ERROR => line.red().to_string(),
        _ => line.to_string(),
    }
}
