//! Token and diagnostic sinks.
//!
//! The engine never produces formatted source text directly. Every piece of generated code is
//! handed to a [`CodePrinter`] together with an [`OutputType`] so a consumer can colorize,
//! strip or re-flow it, and every diagnostic is handed to a [`LogPrinter`].
//!
//! # Key Components
//!
//! - [`CodePrinter`] / [`LogPrinter`] - The sink traits
//! - [`TextCodePrinter`] - Renders tokens into a `String` with 4-space indentation
//! - [`CodeMemoryPrinter`] - Records a token stream for later replay
//! - [`LogMemoryPrinter`] - Buffers diagnostics for later replay
//! - [`LogTextPrinter`] - Renders diagnostics as `marshalscope : warning MS2003 : ...` lines
//! - [`FacadeLogPrinter`] - Forwards diagnostics to the `log` crate
//! - [`PrintFlags`] - Output dialect and feature switches

mod code;
mod sink;

pub use code::{CodeMemoryPrinter, TextCodePrinter};
pub use sink::{format_entry, FacadeLogPrinter, LogEntry, LogMemoryPrinter, LogTextPrinter};

use bitflags::bitflags;

use crate::diagnostics::Severity;

/// Category of a printed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputType {
    /// Language keyword (`struct`, `unsigned`, `#pragma pack`)
    Keyword,
    /// Operator or punctuation (`*`, `{`, `;`)
    Operator,
    /// Field, parameter or function name
    Identifier,
    /// Name of a type (`BOOL`, `LPWSTR`, a structure name)
    TypeName,
    /// Numeric or string literal
    Literal,
    /// Comment text including the comment delimiters
    Comment,
    /// Whitespace and anything else
    Other,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Switches controlling the dialect of the generated code.
    pub struct PrintFlags: u32 {
        /// Emit portable C types (`int`, `wchar_t *`) instead of Windows aliases (`BOOL`, `LPWSTR`)
        const USE_PLAIN_C = 0x0001;
        /// Render interface pointers through their concrete interface name only when it is defined
        const USE_DEFINED_COM_INTERFACES = 0x0002;
        /// Prefix enum members with a deterministic unique tag to avoid clashes
        const MANGLE_ENUM_FIELDS = 0x0004;
        /// Annotate pointer parameters with `/*[in]*/`, `/*[out]*/` or `/*[in,out]*/`
        const PRINT_MARSHAL_DIRECTION = 0x0008;
    }
}

/// Sink for categorized code tokens.
pub trait CodePrinter {
    /// Prints a token.
    fn print(&mut self, output_type: OutputType, text: &str);

    /// Starts a new line at the current indentation.
    fn print_ln(&mut self);

    /// Increases the indentation of subsequent lines.
    fn indent(&mut self);

    /// Decreases the indentation of subsequent lines.
    fn unindent(&mut self);

    /// Prints a token followed by a line break.
    fn print_ln_with(&mut self, output_type: OutputType, text: &str) {
        self.print(output_type, text);
        self.print_ln();
    }
}

/// Sink for diagnostics.
pub trait LogPrinter {
    /// Prints one diagnostic entry.
    fn print_entry(&mut self, severity: Severity, code: u16, message: &str);

    /// Separates two logical groups of entries.
    fn separate(&mut self);

    /// Increases the indentation of subsequent entries.
    fn indent(&mut self);

    /// Decreases the indentation of subsequent entries.
    fn unindent(&mut self);
}
