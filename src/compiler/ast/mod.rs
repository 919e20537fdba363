//! The syntax tree produced by the parser.  It mirrors the source text
//! closely: type names are unresolved, ordinals are as written, and values
//! are literals or dotted names.  Each node records the line it started on so
//! later stages can point back at the source.

use serde::Serialize;

mod ty;

pub use ty::{HandleSubtype, TypeSpec};

/// A parsed schema file: its imports followed by its module declarations.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaFile {
    pub imports: Vec<ImportDecl>,
    pub modules: Vec<ModuleDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportDecl {
    pub line: u32,
    pub path: String,
}

/// A `module` declaration.  `name` is `None` for the implicit module that
/// wraps the definitions of a file which has no `module` keyword.
#[derive(Clone, Debug, PartialEq)]
pub struct ModuleDecl {
    pub line: u32,
    pub name: Option<String>,
    pub attributes: Vec<Attribute>,
    pub definitions: Vec<Definition>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub line: u32,
    pub key: String,
    pub value: AttributeValue,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Name(String),
    String(String),
    Integer(String),
    Float(String),
    Bool(bool),
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Name(s)
            | AttributeValue::String(s)
            | AttributeValue::Integer(s)
            | AttributeValue::Float(s) => f.write_str(s),
            AttributeValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Definition {
    Struct(StructDecl),
    Interface(InterfaceDecl),
    Enum(EnumDecl),
    Const(ConstDecl),
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Definition::Struct(s) => &s.name,
            Definition::Interface(i) => &i.name,
            Definition::Enum(e) => &e.name,
            Definition::Const(c) => &c.name,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructDecl {
    pub line: u32,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub body: Vec<StructMember>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StructMember {
    Field(FieldDecl),
    Enum(EnumDecl),
    Const(ConstDecl),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    pub line: u32,
    pub ty: TypeSpec,
    pub name: String,
    pub ordinal: Option<u32>,
    pub default: Option<ValueExpr>,
    pub attributes: Vec<Attribute>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceDecl {
    pub line: u32,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub body: Vec<InterfaceMember>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InterfaceMember {
    Method(MethodDecl),
    Enum(EnumDecl),
    Const(ConstDecl),
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodDecl {
    pub line: u32,
    pub name: String,
    pub ordinal: Option<u32>,
    pub parameters: Vec<ParameterDecl>,
    /// `Some` when the method is declared with `=> (...)`, even if the list
    /// is empty.
    pub response_parameters: Option<Vec<ParameterDecl>>,
    pub attributes: Vec<Attribute>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParameterDecl {
    pub line: u32,
    pub ty: TypeSpec,
    pub name: String,
    pub ordinal: Option<u32>,
    pub attributes: Vec<Attribute>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumDecl {
    pub line: u32,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub values: Vec<EnumValueDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumValueDecl {
    pub line: u32,
    pub name: String,
    pub value: Option<ValueExpr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConstDecl {
    pub line: u32,
    pub ty: TypeSpec,
    pub name: String,
    pub value: ValueExpr,
    pub attributes: Vec<Attribute>,
}

/// The right hand side of a default value, constant, or enum value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueExpr {
    /// An integer literal including its sign, e.g. `-12` or `0x1f`
    Integer(String),
    Float(String),
    String(String),
    Bool(bool),
    Default,
    /// A (possibly dotted) reference to a constant or enum value
    Name(String),
}
