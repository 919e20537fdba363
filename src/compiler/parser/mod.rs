use super::lexer::tokens::{Lex, Token};
use super::CompilerError;

mod tests;
mod tokenstream;

pub mod parser;

pub use parser::parse;
pub use tokenstream::TokenStream;

pub type ParserResult<T> = Result<Option<T>, CompilerError<ParserError>>;

/// Compiler errors that happen within the Parser stage of compilation.
#[derive(Clone, Debug, PartialEq)]
pub enum ParserError {
    Locked(Option<Token>),
    ExpectedButFound(Vec<Lex>, Option<Lex>),
    ImportExpectedPath,
    ModuleExpectedName,
    DefinitionOutsideModule(String),
    ExpectedIdentifierAfter(Lex),
    ExpectedNameAfterType(String),
    ExpectedType,
    ExpectedValueAfter(Lex),
    InvalidHandleType(String),
    OrdinalOverflow(String),
    AttributeExpectedValue(String),
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParserError::Locked(token) => {
                write!(f, "Parser cannot advance past {}", token_to_string(token))
            }
            ParserError::ExpectedButFound(expected, actual) => write!(
                f,
                "Expected {}, but found {}",
                lex_set_to_string(expected),
                lex_to_string(actual)
            ),
            ParserError::ImportExpectedPath => f.write_str("Expected a file path after import"),
            ParserError::ModuleExpectedName => {
                f.write_str("Identifier expected after module keyword")
            }
            ParserError::DefinitionOutsideModule(name) => write!(
                f,
                "{} is declared outside of the module declaration",
                name
            ),
            ParserError::ExpectedIdentifierAfter(lex) => {
                write!(f, "Expected identifier after {}", lex)
            }
            ParserError::ExpectedNameAfterType(ty) => write!(f, "Expected a name after {}", ty),
            ParserError::ExpectedType => f.write_str("Expected a type"),
            ParserError::ExpectedValueAfter(lex) => write!(f, "Expected a value after {}", lex),
            ParserError::InvalidHandleType(name) => write!(f, "Invalid handle type '{}'", name),
            ParserError::OrdinalOverflow(text) => {
                write!(f, "Ordinal value {} is out of range (maximum is {})", text, u32::MAX)
            }
            ParserError::AttributeExpectedValue(key) => {
                write!(f, "Expected a value for attribute {}", key)
            }
        }
    }
}

fn token_to_string(token: &Option<Token>) -> String {
    token
        .as_ref()
        .map(|t| format!("{}", t.sym))
        .unwrap_or_else(|| "EOF".into())
}

fn lex_to_string(lex: &Option<Lex>) -> String {
    lex.as_ref()
        .map(|l| format!("{}", l))
        .unwrap_or_else(|| "EOF".into())
}

fn lex_set_to_string(set: &[Lex]) -> String {
    set.iter()
        .map(|l| format!("{}", l))
        .collect::<Vec<_>>()
        .join(" or ")
}
