use std::path::PathBuf;

use super::builder::{CircularImportError, ResolutionError, ValidationError};
use super::pack::LayoutError;
use super::translate::TranslationError;

/// Represents all errors that are generated from within a single stage of
/// the Compiler (the lexer or the parser).
///
/// This type captures common metadata which is necessarily present for
/// all errors which are caused by input source code.  E.g. the line #
/// that the error occurs on. This also handles formatting all error messages
/// with the universal metadata along with the inner metadata.
///
/// The inner error allows metadata which is specific to a submodule within
/// the compiler. E.g., the errors themselves are submodule specific and
/// are stored in the `inner` field.
#[derive(Clone, Debug, PartialEq)]
pub struct CompilerError<IE> {
    line: u32,
    inner: IE,
}

impl<IE> CompilerError<IE> {
    pub fn new(line: u32, inner: IE) -> Self {
        CompilerError { line, inner }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn inner(&self) -> &IE {
        &self.inner
    }

    /// Deconstructs the error into its line and the stage specific error.
    pub fn take(self) -> (u32, IE) {
        (self.line, self.inner)
    }
}

impl<IE: std::fmt::Display> std::fmt::Display for CompilerError<IE> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}: {}", self.line, self.inner)
    }
}

/// An error that points at a location in a schema source file: the file,
/// a message, and (where known) the line number and the text of that line.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceDiagnostic {
    pub filename: String,
    pub message: String,
    pub line: Option<u32>,
    pub snippet: Option<String>,
}

impl SourceDiagnostic {
    /// Builds a diagnostic from a stage error, looking up the offending line
    /// in `source` so it can be shown under the message.
    pub fn from_compiler_error<IE: std::fmt::Display>(
        filename: &str,
        source: &str,
        err: &CompilerError<IE>,
    ) -> SourceDiagnostic {
        SourceDiagnostic {
            filename: filename.into(),
            message: format!("{}", err.inner()),
            line: Some(err.line()),
            snippet: line_snippet(source, err.line()),
        }
    }
}

impl std::fmt::Display for SourceDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: Error: {}", self.filename, line, self.message)?,
            None => write!(f, "{}: Error: {}", self.filename, self.message)?,
        }
        if let Some(snippet) = &self.snippet {
            write!(f, "\n  {}", snippet)?;
        }
        Ok(())
    }
}

/// Returns the trimmed text of the 1-based `line` of `source`.
pub fn line_snippet(source: &str, line: u32) -> Option<String> {
    if line == 0 {
        return None;
    }
    source
        .lines()
        .nth(line as usize - 1)
        .map(|l| l.trim().to_string())
}

/// The errors which abort compilation of a schema.  Every variant is fatal:
/// emitters need a fully resolved IR so there is never partial output.
#[derive(Debug)]
pub enum SchemaError {
    Lex(SourceDiagnostic),
    Parse(SourceDiagnostic),
    Translation(TranslationError),
    Resolution(ResolutionError),
    CircularImport(CircularImportError),
    Validation(ValidationError),
    Layout(LayoutError),
    Io(PathBuf, std::io::Error),
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::Lex(d) | SchemaError::Parse(d) => write!(f, "{}", d),
            SchemaError::Translation(e) => write!(f, "{}", e),
            SchemaError::Resolution(e) => write!(f, "{}", e),
            SchemaError::CircularImport(e) => write!(f, "{}", e),
            SchemaError::Validation(e) => write!(f, "{}", e),
            SchemaError::Layout(e) => write!(f, "{}", e),
            SchemaError::Io(path, e) => write!(f, "{}: Error: {}", path.display(), e),
        }
    }
}

impl std::error::Error for SchemaError {}

impl From<TranslationError> for SchemaError {
    fn from(e: TranslationError) -> Self {
        SchemaError::Translation(e)
    }
}

impl From<ResolutionError> for SchemaError {
    fn from(e: ResolutionError) -> Self {
        SchemaError::Resolution(e)
    }
}

impl From<CircularImportError> for SchemaError {
    fn from(e: CircularImportError) -> Self {
        SchemaError::CircularImport(e)
    }
}

impl From<ValidationError> for SchemaError {
    fn from(e: ValidationError) -> Self {
        SchemaError::Validation(e)
    }
}

impl From<LayoutError> for SchemaError {
    fn from(e: LayoutError) -> Self {
        SchemaError::Layout(e)
    }
}
