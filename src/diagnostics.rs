//! The diagnostics system.
//!
//! Diagnostics are accumulated in a [`Reporter`] for the duration of a
//! compilation run and rendered to standard error by [`Reporter::flush`].
//! The reporter is the single shared sink of the pipeline: the lexer, the
//! parser and the semantic analyzer all report into it and continue with
//! their best recovery instead of unwinding.

use crate::{
    span::{SourceMap, Span, Spanning},
    Str,
};
use colored::{Color, Colorize};
use std::{cell::RefCell, fmt::Write as _};


const FRAME_COLOR: Color = Color::BrightBlack;
const LABEL_COLOR: Color = Color::Cyan;

/// The category of a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// A malformed lexical token.
    Invalid,
    /// An unexpected token where several kinds would be valid.
    Unexpected,
    /// The parser expected a specific token and received another.
    Syntax,
    /// A name, type, visibility or module-resolution failure.
    Semantic,
    /// An invariant violation inside the compiler itself.
    Internal,
    /// A parsed construct the analyzer does not handle yet.
    Unimplemented,
    /// The catch-all when no other category applies.
    Unknown,
}

impl ErrorKind {
    const fn name(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Unexpected => "unexpected",
            Self::Syntax => "syntax",
            Self::Semantic => "semantic",
            Self::Internal => "internal",
            Self::Unimplemented => "unimplemented",
            Self::Unknown => "unknown",
        }
    }
}

/// The level of severity of a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    const fn name(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    const fn color(self) -> Color {
        match self {
            Self::Error => Color::Red,
            Self::Warning => Color::Yellow,
            Self::Info => Color::Blue,
        }
    }
}

/// A source-annotated error message.
#[derive(Debug)]
#[must_use]
pub struct Diagnostic {
    kind: ErrorKind,
    severity: Severity,
    span: Option<Span>,
    message: Option<Str>,
    note: Option<Str>,
    hint: Option<Str>,
}

impl Diagnostic {
    fn new(kind: ErrorKind, severity: Severity) -> Self {
        Self {
            kind,
            severity,
            span: None,
            message: None,
            note: None,
            hint: None,
        }
    }

    /// Create a diagnostic for a user error.
    pub fn error(kind: ErrorKind) -> Self {
        Self::new(kind, Severity::Error)
    }

    /// Create a diagnostic for a warning.
    pub fn warning(kind: ErrorKind) -> Self {
        Self::new(kind, Severity::Warning)
    }

    /// Create a diagnostic for an informational message.
    pub fn info(kind: ErrorKind) -> Self {
        Self::new(kind, Severity::Info)
    }

    /// Create a diagnostic for an internal compiler error.
    pub fn bug() -> Self {
        Self::new(ErrorKind::Internal, Severity::Error)
    }

    /// Add a text message describing the issue.
    ///
    /// The message should be a single lower-case sentence without a final
    /// period and has to be able to stand on its own without the note.
    pub fn message(mut self, message: impl Into<Str>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Reference the code snippet that caused the issue.
    pub fn span(mut self, spanning: impl Spanning) -> Self {
        self.span = Some(spanning.span());
        self
    }

    /// Add further clarifying information about the local cause.
    pub fn note(mut self, note: impl Into<Str>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Add a concrete suggestion on how to fix the issue.
    pub fn hint(mut self, hint: impl Into<Str>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Hand the diagnostic over to the given reporter.
    pub fn report(self, reporter: &Reporter) {
        reporter.add(self);
    }

    fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Format the diagnostic for the use in a terminal.
    fn render(&self, map: Option<&SourceMap>) -> String {
        let mut output = String::new();

        let severity = self.severity.name().color(self.severity.color()).bold();
        let _ = write!(output, "{severity}");

        if let Some(message) = &self.message {
            let _ = write!(output, ": {message}");
        }

        if let Some(span) = self.span {
            let map = map.expect("a spanned diagnostic was rendered without a source map");
            let line = map.line_with_highlight(span);

            let location = format!("{}:{}:{}", line.file, line.number, line.highlight.start);
            let kind = format!("({})", self.kind.name()).color(FRAME_COLOR);
            let _ = write!(output, "\n  {} {location} {kind}", "-->".color(FRAME_COLOR));

            let gutter = line.number.to_string().len().max(2);
            let bar = "|".color(FRAME_COLOR);

            let _ = write!(output, "\n {:gutter$} {bar}", "");
            let _ = write!(output, "\n {:>gutter$} {bar} {}", line.number, line.content);
            let _ = write!(output, "\n {:gutter$} {bar} ", "");

            // Tabs before the caret are re-emitted as tabs so the underline
            // lines up with whatever width the terminal assigns them.
            for character in line.prefix.chars() {
                output.push(if character == '\t' { '\t' } else { ' ' });
            }

            let carets = "^".repeat(line.highlight.width);
            let _ = write!(output, "{}", carets.color(self.severity.color()).bold());
        }

        if let Some(note) = &self.note {
            let _ = write!(output, "\n{} {note}", "note:".color(LABEL_COLOR));
        }

        if let Some(hint) = &self.hint {
            let _ = write!(output, "\n{} {hint}", "hint:".color(LABEL_COLOR));
        }

        output
    }
}

/// The shared diagnostic sink of a compilation run.
///
/// Append-only until [flushed](Self::flush). Single-threaded by design:
/// the whole front-end is fully synchronous.
#[derive(Default)]
pub struct Reporter {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// The amount of accumulated diagnostics.
    pub fn count(&self) -> usize {
        self.diagnostics.borrow().len()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.borrow().iter().any(Diagnostic::is_error)
    }

    /// Print every accumulated diagnostic to standard error.
    ///
    /// Returns `true` if any of them was an error. The caller — the driver —
    /// is responsible for terminating the process with a non-zero exit code
    /// in that case.
    pub fn flush(&self, map: Option<&SourceMap>) -> bool {
        let diagnostics = std::mem::take(&mut *self.diagnostics.borrow_mut());
        let mut errors = false;

        for diagnostic in &diagnostics {
            errors |= diagnostic.is_error();
            eprintln!("{}", diagnostic.render(map));
            eprintln!();
        }

        errors
    }

    /// Render every accumulated diagnostic into a string, for tests.
    #[cfg(test)]
    pub(crate) fn render_to_string(&self, map: Option<&SourceMap>) -> String {
        self.diagnostics
            .borrow()
            .iter()
            .map(|diagnostic| diagnostic.render(map))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
