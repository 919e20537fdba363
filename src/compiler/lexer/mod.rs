use super::CompilerError;

mod tests;

pub mod lexer;
pub mod tokens;

pub use lexer::Lexer;

pub type LexerResult<T> = Result<T, CompilerError<LexerError>>;

/// Errors which can be encountered while tokenizing a schema file
#[derive(Clone, Debug, PartialEq)]
pub enum LexerError {
    Locked(Option<char>),
    InvalidEscapeSequence(char),
    ExpectedEscapeCharacter,
    UnterminatedString,
    UnterminatedComment,
    InvalidNumber(String),
    ExpectedOrdinalDigits,
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use LexerError::*;
        match self {
            Locked(None) => f.write_str("Lexer locked on EOF"),
            Locked(Some(c)) => write!(f, "Illegal character '{}'", c),
            InvalidEscapeSequence(c) => write!(f, "Invalid escape sequence \\{}", c),
            ExpectedEscapeCharacter => f.write_str("Expected an escape character after \\"),
            UnterminatedString => f.write_str("Unterminated string literal"),
            UnterminatedComment => f.write_str("Unterminated block comment"),
            InvalidNumber(text) => write!(f, "Invalid number {}", text),
            ExpectedOrdinalDigits => f.write_str("Expected digits after @"),
        }
    }
}
