use std::collections::BTreeMap;

use serde::Serialize;

use crate::compiler::ast::{AttributeValue, ValueExpr};

/// Attributes flattened into a map.  When a key is repeated the last value
/// written in the source wins.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// The translated form of one schema file.  Types are kind spec strings and
/// names are still unresolved; the module builder turns this into a
/// [`crate::compiler::ir::Module`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModuleRecord {
    pub name: String,
    pub namespace: String,
    pub attributes: Attributes,
    pub imports: Vec<ImportRecord>,
    pub structs: Vec<StructRecord>,
    pub interfaces: Vec<InterfaceRecord>,
    pub enums: Vec<EnumRecord>,
    pub constants: Vec<ConstantRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImportRecord {
    pub line: u32,
    pub filename: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StructRecord {
    pub line: u32,
    pub name: String,
    pub attributes: Attributes,
    pub fields: Vec<FieldRecord>,
    pub enums: Vec<EnumRecord>,
    pub constants: Vec<ConstantRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldRecord {
    pub line: u32,
    pub name: String,
    pub kind: String,
    pub ordinal: Option<u32>,
    pub default: Option<ValueExpr>,
    pub attributes: Attributes,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InterfaceRecord {
    pub line: u32,
    pub name: String,
    pub attributes: Attributes,
    pub methods: Vec<MethodRecord>,
    pub enums: Vec<EnumRecord>,
    pub constants: Vec<ConstantRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MethodRecord {
    pub line: u32,
    pub name: String,
    pub ordinal: Option<u32>,
    pub parameters: Vec<ParameterRecord>,
    pub response_parameters: Option<Vec<ParameterRecord>>,
    pub attributes: Attributes,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParameterRecord {
    pub line: u32,
    pub name: String,
    pub kind: String,
    pub ordinal: Option<u32>,
    pub attributes: Attributes,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnumRecord {
    pub line: u32,
    pub name: String,
    pub attributes: Attributes,
    pub fields: Vec<EnumFieldRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnumFieldRecord {
    pub line: u32,
    pub name: String,
    pub value: Option<ValueExpr>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConstantRecord {
    pub line: u32,
    pub name: String,
    pub kind: String,
    pub value: ValueExpr,
    pub attributes: Attributes,
}
