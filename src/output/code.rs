use super::{CodePrinter, OutputType};

const INDENT: &str = "    ";

/// Renders tokens into a `String`, ignoring their categories.
///
/// Every line break is followed by four spaces per indentation level.
#[derive(Debug, Default)]
pub struct TextCodePrinter {
    output: String,
    indent_level: usize,
}

impl TextCodePrinter {
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

impl CodePrinter for TextCodePrinter {
    fn print(&mut self, _output_type: OutputType, text: &str) {
        self.output.push_str(text);
    }

    fn print_ln(&mut self) {
        self.output.push('\n');
        for _ in 0..self.indent_level {
            self.output.push_str(INDENT);
        }
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn unindent(&mut self) {
        debug_assert!(self.indent_level > 0);
        self.indent_level = self.indent_level.saturating_sub(1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CodeEntry {
    Token(OutputType, String),
    NewLine,
    Indent,
    Unindent,
}

/// Records a token stream so that it can be replayed to another printer.
#[derive(Debug, Default)]
pub struct CodeMemoryPrinter {
    entries: Vec<CodeEntry>,
}

impl CodeMemoryPrinter {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the recorded tokens with their categories, skipping layout markers.
    pub fn tokens(&self) -> impl Iterator<Item = (OutputType, &str)> {
        self.entries.iter().filter_map(|entry| match entry {
            CodeEntry::Token(output_type, text) => Some((*output_type, text.as_str())),
            _ => None,
        })
    }

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replays the recorded stream to `printer`.
    pub fn replay_to(&self, printer: &mut dyn CodePrinter) {
        for entry in &self.entries {
            match entry {
                CodeEntry::Token(output_type, text) => printer.print(*output_type, text),
                CodeEntry::NewLine => printer.print_ln(),
                CodeEntry::Indent => printer.indent(),
                CodeEntry::Unindent => printer.unindent(),
            }
        }
    }
}

impl CodePrinter for CodeMemoryPrinter {
    fn print(&mut self, output_type: OutputType, text: &str) {
        self.entries.push(CodeEntry::Token(output_type, text.to_string()));
    }

    fn print_ln(&mut self) {
        self.entries.push(CodeEntry::NewLine);
    }

    fn indent(&mut self) {
        self.entries.push(CodeEntry::Indent);
    }

    fn unindent(&mut self) {
        self.entries.push(CodeEntry::Unindent);
    }
}
