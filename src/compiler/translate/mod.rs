//! Translates a parsed schema file into a [`ModuleRecord`]: the definitions
//! sorted by what they are, types rewritten as kind spec strings, and
//! attribute lists flattened into maps.

use std::path::Path;

use log::debug;

use super::ast::*;

mod record;

pub use record::*;

/// Primitive type keywords and their kind specs.
const PRIMITIVES: [(&str, &str); 12] = [
    ("bool", "b"),
    ("int8", "i8"),
    ("uint8", "u8"),
    ("int16", "i16"),
    ("uint16", "u16"),
    ("int32", "i32"),
    ("uint32", "u32"),
    ("int64", "i64"),
    ("uint64", "u64"),
    ("float", "f"),
    ("double", "d"),
    ("string", "s"),
];

#[derive(Clone, Debug, PartialEq)]
pub enum TranslationErrorKind {
    NoModule,
    MultipleModules(usize),
}

/// A schema file which parsed correctly but cannot be turned into a module.
#[derive(Clone, Debug, PartialEq)]
pub struct TranslationError {
    pub filename: String,
    pub kind: TranslationErrorKind,
}

impl std::fmt::Display for TranslationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TranslationErrorKind::NoModule => write!(
                f,
                "{}: Error: File does not declare a module or any definitions",
                self.filename
            ),
            TranslationErrorKind::MultipleModules(count) => write!(
                f,
                "{}: Error: Expected exactly one module declaration, found {}",
                self.filename, count
            ),
        }
    }
}

impl std::error::Error for TranslationError {}

/// Converts the syntax tree of `filename` into a module record.  The record's
/// name is the file name of `filename` and its namespace is the name of the
/// file's single module declaration.
pub fn translate(tree: &SchemaFile, filename: &str) -> Result<ModuleRecord, TranslationError> {
    let module = match tree.modules.as_slice() {
        [module] => module,
        [] => {
            return Err(TranslationError {
                filename: filename.into(),
                kind: TranslationErrorKind::NoModule,
            })
        }
        modules => {
            return Err(TranslationError {
                filename: filename.into(),
                kind: TranslationErrorKind::MultipleModules(modules.len()),
            })
        }
    };

    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.into());
    debug!("Translating {} (module {:?})", name, module.name);

    let mut record = ModuleRecord {
        name,
        namespace: module.name.clone().unwrap_or_default(),
        attributes: attribute_map(&module.attributes),
        imports: tree
            .imports
            .iter()
            .map(|i| ImportRecord {
                line: i.line,
                filename: i.path.clone(),
            })
            .collect(),
        structs: vec![],
        interfaces: vec![],
        enums: vec![],
        constants: vec![],
    };

    for def in &module.definitions {
        match def {
            Definition::Struct(s) => record.structs.push(struct_record(s)),
            Definition::Interface(i) => record.interfaces.push(interface_record(i)),
            Definition::Enum(e) => record.enums.push(enum_record(e)),
            Definition::Const(c) => record.constants.push(constant_record(c)),
        }
    }

    Ok(record)
}

/// Returns the kind spec of a written type: primitives map to their short
/// codes, handles to `h` or `h:<subtype>`, arrays to `a:` and interface
/// requests to `r:` followed by the inner spec.  Any other name becomes a
/// reference `x:<Name>` to be resolved later.
pub fn kind_spec(ty: &TypeSpec) -> String {
    match ty {
        TypeSpec::Named(name) => PRIMITIVES
            .iter()
            .find(|(keyword, _)| keyword == name)
            .map(|(_, spec)| (*spec).to_string())
            .unwrap_or_else(|| format!("x:{}", name)),
        TypeSpec::Handle(None) => "h".into(),
        TypeSpec::Handle(Some(sub)) => match sub {
            HandleSubtype::DataPipeConsumer => "h:d:c".into(),
            HandleSubtype::DataPipeProducer => "h:d:p".into(),
            HandleSubtype::MessagePipe => "h:m".into(),
            HandleSubtype::SharedBuffer => "h:s".into(),
        },
        TypeSpec::Array(inner) => format!("a:{}", kind_spec(inner)),
        TypeSpec::InterfaceRequest(inner) => format!("r:{}", kind_spec(inner)),
    }
}

pub fn attribute_map(attributes: &[Attribute]) -> Attributes {
    attributes
        .iter()
        .map(|a| (a.key.clone(), a.value.clone()))
        .collect()
}

fn struct_record(s: &StructDecl) -> StructRecord {
    let mut record = StructRecord {
        line: s.line,
        name: s.name.clone(),
        attributes: attribute_map(&s.attributes),
        fields: vec![],
        enums: vec![],
        constants: vec![],
    };

    for member in &s.body {
        match member {
            StructMember::Field(f) => record.fields.push(FieldRecord {
                line: f.line,
                name: f.name.clone(),
                kind: kind_spec(&f.ty),
                ordinal: f.ordinal,
                default: f.default.clone(),
                attributes: attribute_map(&f.attributes),
            }),
            StructMember::Enum(e) => record.enums.push(enum_record(e)),
            StructMember::Const(c) => record.constants.push(constant_record(c)),
        }
    }

    record
}

fn interface_record(i: &InterfaceDecl) -> InterfaceRecord {
    let mut record = InterfaceRecord {
        line: i.line,
        name: i.name.clone(),
        attributes: attribute_map(&i.attributes),
        methods: vec![],
        enums: vec![],
        constants: vec![],
    };

    for member in &i.body {
        match member {
            InterfaceMember::Method(m) => record.methods.push(MethodRecord {
                line: m.line,
                name: m.name.clone(),
                ordinal: m.ordinal,
                parameters: parameter_records(&m.parameters),
                response_parameters: m.response_parameters.as_deref().map(parameter_records),
                attributes: attribute_map(&m.attributes),
            }),
            InterfaceMember::Enum(e) => record.enums.push(enum_record(e)),
            InterfaceMember::Const(c) => record.constants.push(constant_record(c)),
        }
    }

    record
}

fn parameter_records(params: &[ParameterDecl]) -> Vec<ParameterRecord> {
    params
        .iter()
        .map(|p| ParameterRecord {
            line: p.line,
            name: p.name.clone(),
            kind: kind_spec(&p.ty),
            ordinal: p.ordinal,
            attributes: attribute_map(&p.attributes),
        })
        .collect()
}

fn enum_record(e: &EnumDecl) -> EnumRecord {
    EnumRecord {
        line: e.line,
        name: e.name.clone(),
        attributes: attribute_map(&e.attributes),
        fields: e
            .values
            .iter()
            .map(|v| EnumFieldRecord {
                line: v.line,
                name: v.name.clone(),
                value: v.value.clone(),
            })
            .collect(),
    }
}

fn constant_record(c: &ConstDecl) -> ConstantRecord {
    ConstantRecord {
        line: c.line,
        name: c.name.clone(),
        kind: kind_spec(&c.ty),
        value: c.value.clone(),
        attributes: attribute_map(&c.attributes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{lexer::tokens::Token, parser::parse, Lexer};

    fn translate_text(text: &str) -> Result<ModuleRecord, TranslationError> {
        let tokens: Vec<Token> = Lexer::new(text)
            .tokenize()
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        let tree = parse("dir/test.schema", &tokens).unwrap();
        translate(&tree, "dir/test.schema")
    }

    #[test]
    fn primitive_kind_specs() {
        for (keyword, spec) in PRIMITIVES.iter() {
            assert_eq!(kind_spec(&TypeSpec::Named((*keyword).into())), *spec);
        }
    }

    #[test]
    fn composite_kind_specs() {
        for (ty, expected) in vec![
            (
                TypeSpec::Array(Box::new(TypeSpec::Named("int32".into()))),
                "a:i32",
            ),
            (TypeSpec::Named("SomeStruct".into()), "x:SomeStruct"),
            (TypeSpec::Named("a.b.Foo".into()), "x:a.b.Foo"),
            (
                TypeSpec::Handle(Some(HandleSubtype::DataPipeConsumer)),
                "h:d:c",
            ),
            (
                TypeSpec::Handle(Some(HandleSubtype::DataPipeProducer)),
                "h:d:p",
            ),
            (TypeSpec::Handle(Some(HandleSubtype::MessagePipe)), "h:m"),
            (TypeSpec::Handle(Some(HandleSubtype::SharedBuffer)), "h:s"),
            (TypeSpec::Handle(None), "h"),
            (
                TypeSpec::InterfaceRequest(Box::new(TypeSpec::Named("Service".into()))),
                "r:x:Service",
            ),
            (
                TypeSpec::Array(Box::new(TypeSpec::Array(Box::new(TypeSpec::Named(
                    "string".into(),
                ))))),
                "a:a:s",
            ),
        ] {
            assert_eq!(kind_spec(&ty), expected);
        }
    }

    #[test]
    fn translate_module() {
        let text = "import \"other.schema\";
            [Lang=\"x\"]
            module a.b {
                struct S { int32[] v@2; Other o; };
                interface I { Do(bool flag) => (); };
                enum E { X, Y };
                const uint8 kMax = 8;
            }";
        let record = translate_text(text).unwrap();
        assert_eq!(record.name, "test.schema");
        assert_eq!(record.namespace, "a.b");
        assert_eq!(
            record.attributes.get("Lang"),
            Some(&AttributeValue::String("x".into()))
        );
        assert_eq!(record.imports[0].filename, "other.schema");

        assert_eq!(record.structs.len(), 1);
        let fields = &record.structs[0].fields;
        assert_eq!(fields[0].kind, "a:i32");
        assert_eq!(fields[0].ordinal, Some(2));
        assert_eq!(fields[1].kind, "x:Other");

        assert_eq!(record.interfaces.len(), 1);
        let method = &record.interfaces[0].methods[0];
        assert_eq!(method.parameters[0].kind, "b");
        assert_eq!(method.response_parameters, Some(vec![]));

        assert_eq!(record.enums[0].fields.len(), 2);
        assert_eq!(record.constants[0].kind, "u8");
    }

    #[test]
    fn implicit_module_has_empty_namespace() {
        let record = translate_text("struct S { };").unwrap();
        assert_eq!(record.namespace, "");
        assert_eq!(record.structs[0].name, "S");
    }

    #[test]
    fn last_attribute_wins() {
        let record = translate_text("[A=1, B=2, A=3] struct S { };").unwrap();
        let attrs = &record.structs[0].attributes;
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("A"), Some(&AttributeValue::Integer("3".into())));
    }

    #[test]
    fn constant_attributes() {
        let record = translate_text(
            "module m { [Since=2, Since=3] const int32 k = 1; struct S { [Hidden] const bool kB = true; }; }",
        )
        .unwrap();
        let attrs = &record.constants[0].attributes;
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("Since"), Some(&AttributeValue::Integer("3".into())));
        assert_eq!(
            record.structs[0].constants[0].attributes.get("Hidden"),
            Some(&AttributeValue::Bool(true))
        );
    }

    #[test]
    fn module_count_must_be_one() {
        let err = translate_text("").unwrap_err();
        assert_eq!(err.kind, TranslationErrorKind::NoModule);

        let err = translate_text("module a { }\nmodule b { }").unwrap_err();
        assert_eq!(err.kind, TranslationErrorKind::MultipleModules(2));
        assert_eq!(
            err.to_string(),
            "dir/test.schema: Error: Expected exactly one module declaration, found 2"
        );
    }

    #[test]
    fn record_serializes() {
        let record = translate_text("module m { struct S { bool b = true; }; }").unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["namespace"], "m");
        assert_eq!(json["structs"][0]["fields"][0]["kind"], "b");
        assert_eq!(json["structs"][0]["fields"][0]["default"]["bool"], true);
    }
}
