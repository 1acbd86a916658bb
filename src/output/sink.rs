use std::fmt::Write;

use super::LogPrinter;
use crate::diagnostics::Severity;

/// One buffered diagnostic entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity of the entry
    pub severity: Severity,
    /// Numeric message code
    pub code: u16,
    /// Fully formatted message, including any context prefix
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LogRecord {
    Entry(LogEntry),
    Separator,
    Indent,
    Unindent,
}

/// Buffers diagnostics in arrival order so they can be replayed to another printer.
#[derive(Debug, Default)]
pub struct LogMemoryPrinter {
    records: Vec<LogRecord>,
}

impl LogMemoryPrinter {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing has been buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the buffered entries, skipping separators and indentation markers.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.records.iter().filter_map(|record| match record {
            LogRecord::Entry(entry) => Some(entry),
            _ => None,
        })
    }

    /// Discards everything buffered so far.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Replays the buffered records to `printer`.
    pub fn replay_to(&self, printer: &mut dyn LogPrinter) {
        for record in &self.records {
            match record {
                LogRecord::Entry(entry) => {
                    printer.print_entry(entry.severity, entry.code, &entry.message);
                }
                LogRecord::Separator => printer.separate(),
                LogRecord::Indent => printer.indent(),
                LogRecord::Unindent => printer.unindent(),
            }
        }
    }
}

impl LogPrinter for LogMemoryPrinter {
    fn print_entry(&mut self, severity: Severity, code: u16, message: &str) {
        self.records.push(LogRecord::Entry(LogEntry {
            severity,
            code,
            message: message.to_string(),
        }));
    }

    fn separate(&mut self) {
        self.records.push(LogRecord::Separator);
    }

    fn indent(&mut self) {
        self.records.push(LogRecord::Indent);
    }

    fn unindent(&mut self) {
        self.records.push(LogRecord::Unindent);
    }
}

/// Formats one diagnostic line: `marshalscope : warning MS2003 : message`.
///
/// The message is shifted right by one space per indentation level.
#[must_use]
pub fn format_entry(severity: Severity, code: u16, indent_level: usize, message: &str) -> String {
    let mut line = String::with_capacity(indent_level + message.len() + 32);
    let _ = write!(line, "marshalscope : {} MS{:04} : ", severity, code);
    for _ in 0..indent_level {
        line.push(' ');
    }
    line.push_str(message);
    line
}

/// Renders diagnostics as text lines; separators become empty lines.
#[derive(Debug, Default)]
pub struct LogTextPrinter {
    output: String,
    indent_level: usize,
}

impl LogTextPrinter {
    /// Creates an empty printer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the text printed so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.output
    }

    /// Consumes the printer, returning the printed text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.output
    }
}

impl LogPrinter for LogTextPrinter {
    fn print_entry(&mut self, severity: Severity, code: u16, message: &str) {
        self.output
            .push_str(&format_entry(severity, code, self.indent_level, message));
        self.output.push('\n');
    }

    fn separate(&mut self) {
        self.output.push('\n');
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn unindent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }
}

/// Forwards diagnostics to the `log` facade under the `marshalscope` target.
#[derive(Debug, Default)]
pub struct FacadeLogPrinter {
    indent_level: usize,
}

impl FacadeLogPrinter {
    /// Creates a forwarding printer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogPrinter for FacadeLogPrinter {
    fn print_entry(&mut self, severity: Severity, code: u16, message: &str) {
        let level = match severity {
            Severity::Info => log::Level::Info,
            Severity::Warning => log::Level::Warn,
            Severity::Error => log::Level::Error,
        };

        log::log!(
            target: "marshalscope",
            level,
            "MS{:04} : {:width$}{}",
            code,
            "",
            message,
            width = self.indent_level
        );
    }

    fn separate(&mut self) {}

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn unindent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }
}
