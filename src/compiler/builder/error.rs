use crate::compiler::SchemaError;

#[derive(Clone, Debug, PartialEq)]
pub enum ResolutionErrorKind {
    ImportNotFound(String),
    UnknownKind(String),
    UnknownValue(String),
    NotAnInterface(String),
    NotAnInteger(String),
    EnumValueOutOfRange(String, i128),
}

/// A name in a schema file which does not refer to anything usable.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolutionError {
    pub filename: String,
    pub line: u32,
    pub kind: ResolutionErrorKind,
}

impl ResolutionError {
    pub fn new(filename: &str, line: u32, kind: ResolutionErrorKind) -> ResolutionError {
        ResolutionError {
            filename: filename.into(),
            line,
            kind,
        }
    }
}

impl std::fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ResolutionErrorKind::*;
        write!(f, "{}:{}: Error: ", self.filename, self.line)?;
        match &self.kind {
            ImportNotFound(import) => write!(f, "Unable to find import \"{}\"", import),
            UnknownKind(name) => write!(f, "Unknown type {}", name),
            UnknownValue(name) => write!(f, "Unknown value {}", name),
            NotAnInterface(name) => write!(f, "{} is not an interface", name),
            NotAnInteger(name) => write!(f, "{} is not an integer value", name),
            EnumValueOutOfRange(name, value) => write!(
                f,
                "Value {} of enum field {} does not fit in a signed 32 bit integer",
                value, name
            ),
        }
    }
}

impl std::error::Error for ResolutionError {}

#[derive(Clone, Debug, PartialEq)]
pub enum ValidationErrorKind {
    DuplicateName(String),
    DuplicateMethodOrdinal {
        interface: String,
        ordinal: u32,
        first: String,
        second: String,
    },
    MethodOrdinalOverflow {
        interface: String,
        method: String,
    },
}

/// Declarations which resolve but conflict with each other.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationError {
    pub filename: String,
    pub line: u32,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn new(filename: &str, line: u32, kind: ValidationErrorKind) -> ValidationError {
        ValidationError {
            filename: filename.into(),
            line,
            kind,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: Error: ", self.filename, self.line)?;
        match &self.kind {
            ValidationErrorKind::DuplicateName(name) => {
                write!(f, "{} is declared more than once", name)
            }
            ValidationErrorKind::DuplicateMethodOrdinal {
                interface,
                ordinal,
                first,
                second,
            } => write!(
                f,
                "Methods {} and {} of {} both have ordinal @{}",
                first, second, interface, ordinal
            ),
            ValidationErrorKind::MethodOrdinalOverflow { interface, method } => write!(
                f,
                "Implicit ordinal of method {}.{} is out of range (maximum is {})",
                interface,
                method,
                u32::MAX
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// An import chain which leads back to a file that is still being built.
/// `chain` runs from the outermost file to the file imported a second time.
#[derive(Clone, Debug, PartialEq)]
pub struct CircularImportError {
    pub chain: Vec<String>,
}

impl std::fmt::Display for CircularImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.chain.last() {
            Some(file) => write!(f, "{}: Error: Circular import chain", file)?,
            None => f.write_str("Error: Circular import chain")?,
        }
        f.write_str(&import_stack_message(&self.chain))
    }
}

impl std::error::Error for CircularImportError {}

/// Lists a chain of imports as "X was imported by Y" lines, the most
/// recently imported file first.  Each line starts with a newline.
pub fn import_stack_message<S: AsRef<str>>(stack: &[S]) -> String {
    stack
        .windows(2)
        .rev()
        .map(|pair| {
            format!(
                "\n  {} was imported by {}",
                pair[1].as_ref(),
                pair[0].as_ref()
            )
        })
        .collect()
}

/// A failed compilation: the error and the files whose builds were in
/// progress when it happened, outermost first.  Files are named as in every
/// other diagnostic, relative to the source root.
#[derive(Debug)]
pub struct CompileError {
    pub error: SchemaError,
    pub import_stack: Vec<String>,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)?;
        if let SchemaError::CircularImport(_) = self.error {
            return Ok(());
        }
        f.write_str(&import_stack_message(&self.import_stack))
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
