pub mod cli;
pub mod compiler;
pub mod generate;
pub mod io;

pub use compiler::{parse_schema, CompileError, CompilerContext, SchemaError};
