//! Error adapter for converting ErdError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Entity list
//! errors carry the input text, so they are rendered with a snippet pointing
//! at the offending line.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use erdlayout::ErdError;

/// Adapter for an entity list decoding error.
pub struct SchemaAdapter<'a> {
    message: String,
    span: SourceSpan,
    src: &'a str,
}

impl<'a> SchemaAdapter<'a> {
    /// Create a new adapter for an error reported at `line`/`column` of `src`.
    ///
    /// Both are 1-based; a column of 0 points at the start of the line.
    pub fn new(message: impl Into<String>, line: usize, column: usize, src: &'a str) -> Self {
        let offset = byte_offset(src, line, column);
        let len = usize::from(offset < src.len());
        Self {
            message: message.into(),
            span: SourceSpan::new(offset.into(), len),
            src,
        }
    }

    /// Byte range the primary label points at.
    pub fn span(&self) -> SourceSpan {
        self.span
    }
}

impl fmt::Debug for SchemaAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaAdapter")
            .field("message", &self.message)
            .field("span", &self.span)
            .finish()
    }
}

impl fmt::Display for SchemaAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid entity list: {}", self.message)
    }
}

impl std::error::Error for SchemaAdapter<'_> {}

impl MietteDiagnostic for SchemaAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("erdlayout::schema"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(
            "the input must be a JSON array of entities with `name` and `columns`",
        ))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(
            LabeledSpan::new_primary_with_span(Some("here".to_string()), self.span),
        )))
    }
}

/// Adapter for [`ErdError`] variants without source information.
pub struct ErrorAdapter<'a>(pub &'a ErdError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            ErdError::Io(_) => "erdlayout::io",
            ErdError::Schema { .. } => "erdlayout::schema",
            ErdError::Config(_) => "erdlayout::config",
            ErdError::Export(_) => "erdlayout::export",
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// An entity list error with a snippet of the input.
    Schema(SchemaAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Schema(s) => fmt::Display::fmt(s, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Schema(_) => None,
            Reportable::Error(e) => std::error::Error::source(e),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Schema(s) => s.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Schema(s) => s.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Schema(s) => s.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Schema(s) => s.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Byte offset of a 1-based `line`/`column` position, clamped to `src`.
fn byte_offset(src: &str, line: usize, column: usize) -> usize {
    let line_start: usize = src
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(src.len())
}

/// Convert an [`ErdError`] into a list of reportable errors.
pub fn to_reportables(err: &ErdError) -> Vec<Reportable<'_>> {
    match err {
        ErdError::Schema { err: json_err, src } => vec![Reportable::Schema(SchemaAdapter::new(
            json_err.to_string(),
            json_err.line(),
            json_err.column(),
            src,
        ))],
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}
