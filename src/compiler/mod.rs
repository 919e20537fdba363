/**
 * The schema compiler turns schema source files into modules ready for
 * emitters.
 *
 * Compilation of a file runs through these stages, each of which stops the
 * compilation on its first error:
 * 1. The lexer converts the source text into tokens.
 * 2. The parser builds a syntax tree which follows the text closely.
 * 3. The translator sorts the tree's definitions into a module record and
 * rewrites every written type as a kind spec string.
 * 4. The module builder builds every import first, then resolves the kinds
 * and values of the record against the module's own declarations and those
 * of its imports.  Each file is built once per `CompilerContext`; an import
 * chain which leads back to a file still being built is an error.
 * 5. The packer lays out every struct, including the parameter structs of
 * methods, and the layout is checked byte by byte.
 *
 * A module which comes out of the builder is fully resolved and has a valid
 * layout for every struct, so emitters never see partial results.
 */

#[macro_export]
macro_rules! err {
    ($line: expr, $kind: expr) => {
        Err($crate::compiler::CompilerError::new($line, $kind))
    };
}

pub mod ast;
pub mod builder;
pub mod ir;
pub mod lexer;
pub mod pack;
pub mod parser;
pub mod translate;

mod error;

pub use builder::{CompileError, CompilerContext, DiskSources, MemorySources, SourceProvider};
pub use error::*;
pub use lexer::Lexer;

use ast::SchemaFile;
use lexer::tokens::Token;

/// Tokenizes and parses the text of a schema file.  Lexer and parser errors
/// are reported with the line they occurred on and the text of that line.
pub fn parse_schema(filename: &str, text: &str) -> Result<SchemaFile, SchemaError> {
    let tokens = Lexer::new(text)
        .tokenize()
        .into_iter()
        .collect::<Result<Vec<Token>, _>>()
        .map_err(|e| SchemaError::Lex(SourceDiagnostic::from_compiler_error(filename, text, &e)))?;

    parser::parse(filename, &tokens)
        .map_err(|e| SchemaError::Parse(SourceDiagnostic::from_compiler_error(filename, text, &e)))
}
