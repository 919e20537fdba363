//! The resolved intermediate representation handed to emitters.  Every kind
//! is resolved to a declaration, every value to a literal, a constant, or an
//! enum value, and every method ordinal is assigned.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;

mod kind;

pub use kind::{DeclRef, Kind};

pub use crate::compiler::translate::Attributes;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    /// Integer text as written, with its sign: decimal or `0x` hex
    Integer(String),
    Float(String),
    String(String),
    Bool(bool),
    Default,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Literal(Literal),
    EnumValue {
        #[serde(rename = "enum")]
        enum_ref: DeclRef,
        name: String,
        value: i32,
    },
    Constant(DeclRef),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub kind: Kind,
    pub ordinal: Option<u32>,
    pub default: Option<Value>,
    pub attributes: Attributes,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Struct {
    pub name: String,
    pub namespace: String,
    pub attributes: Attributes,
    pub fields: Vec<Field>,
    pub enums: Vec<Enum>,
    pub constants: Vec<Constant>,
}

impl Struct {
    pub fn decl_ref(&self) -> DeclRef {
        DeclRef::new(&self.namespace, &self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub kind: Kind,
    pub ordinal: Option<u32>,
    pub attributes: Attributes,
}

impl Parameter {
    fn as_field(&self) -> Field {
        Field {
            name: self.name.clone(),
            kind: self.kind.clone(),
            ordinal: self.ordinal,
            default: None,
            attributes: self.attributes.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Method {
    pub name: String,
    pub ordinal: u32,
    pub parameters: Vec<Parameter>,
    /// `None` for a one way method.  `Some` with an empty list is a method
    /// which replies without any values.
    pub response_parameters: Option<Vec<Parameter>>,
    pub attributes: Attributes,
}

impl Method {
    /// The struct which carries this method's request parameters on the wire:
    /// `<Interface>_<Method>_Params`.
    pub fn param_struct(&self, interface: &Interface) -> Struct {
        Self::synthetic_struct(
            interface,
            &format!("{}_{}_Params", interface.name, self.name),
            &self.parameters,
        )
    }

    /// The struct which carries the response, if the method has one:
    /// `<Interface>_<Method>_ResponseParams`.
    pub fn response_param_struct(&self, interface: &Interface) -> Option<Struct> {
        self.response_parameters.as_ref().map(|params| {
            Self::synthetic_struct(
                interface,
                &format!("{}_{}_ResponseParams", interface.name, self.name),
                params,
            )
        })
    }

    fn synthetic_struct(interface: &Interface, name: &str, params: &[Parameter]) -> Struct {
        Struct {
            name: name.into(),
            namespace: interface.namespace.clone(),
            attributes: Attributes::new(),
            fields: params.iter().map(Parameter::as_field).collect(),
            enums: vec![],
            constants: vec![],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Interface {
    pub name: String,
    pub namespace: String,
    pub client: Option<DeclRef>,
    pub methods: Vec<Method>,
    pub enums: Vec<Enum>,
    pub constants: Vec<Constant>,
    pub attributes: Attributes,
}

impl Interface {
    pub fn decl_ref(&self) -> DeclRef {
        DeclRef::new(&self.namespace, &self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnumField {
    pub name: String,
    pub value: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Enum {
    pub name: String,
    pub namespace: String,
    /// The struct or interface this enum is nested in
    pub parent: Option<String>,
    pub fields: Vec<EnumField>,
    pub attributes: Attributes,
}

impl Enum {
    /// The reference other declarations use for this enum.  Nested enums are
    /// named through their parent.
    pub fn decl_ref(&self) -> DeclRef {
        match &self.parent {
            Some(parent) => DeclRef::new(&self.namespace, &format!("{}.{}", parent, self.name)),
            None => DeclRef::new(&self.namespace, &self.name),
        }
    }

    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.value)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Constant {
    pub name: String,
    pub kind: Kind,
    pub value: Value,
    pub attributes: Attributes,
}

/// An import of another module, holding a shared handle to that module as
/// it is stored in the compilation cache.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Import {
    /// The import path as it is written in the importing file
    pub filename: String,
    pub namespace: String,
    #[serde(skip)]
    pub module: Rc<Module>,
}

/// A fully built schema module.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Module {
    /// The file name the module was read from
    pub name: String,
    pub namespace: String,
    /// POSIX style path of the file relative to the source root
    pub path: String,
    pub attributes: Attributes,
    pub imports: Vec<Import>,
    pub structs: Vec<Struct>,
    pub interfaces: Vec<Interface>,
    pub enums: Vec<Enum>,
    pub constants: Vec<Constant>,
    /// Every kind used by this module, keyed by its spec
    pub kinds: BTreeMap<String, Kind>,
}

impl Module {
    /// Every enum of this module including the ones nested in structs and
    /// interfaces.
    pub fn all_enums(&self) -> impl Iterator<Item = &Enum> {
        self.enums
            .iter()
            .chain(self.structs.iter().flat_map(|s| s.enums.iter()))
            .chain(self.interfaces.iter().flat_map(|i| i.enums.iter()))
    }

    /// Every struct whose layout is computed for this module: the declared
    /// structs followed by the parameter structs of every method.
    pub fn layout_structs(&self) -> Vec<Struct> {
        let mut structs = self.structs.clone();
        for interface in &self.interfaces {
            for method in &interface.methods {
                structs.push(method.param_struct(interface));
                structs.extend(method.response_param_struct(interface));
            }
        }
        structs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, kind: Kind) -> Parameter {
        Parameter {
            name: name.into(),
            kind,
            ordinal: None,
            attributes: Attributes::new(),
        }
    }

    fn interface() -> Interface {
        Interface {
            name: "Calc".into(),
            namespace: "math".into(),
            client: None,
            methods: vec![
                Method {
                    name: "Add".into(),
                    ordinal: 0,
                    parameters: vec![param("a", Kind::Int32), param("b", Kind::Int32)],
                    response_parameters: Some(vec![param("sum", Kind::Int64)]),
                    attributes: Attributes::new(),
                },
                Method {
                    name: "Reset".into(),
                    ordinal: 1,
                    parameters: vec![],
                    response_parameters: None,
                    attributes: Attributes::new(),
                },
            ],
            enums: vec![],
            constants: vec![],
            attributes: Attributes::new(),
        }
    }

    #[test]
    fn method_param_structs() {
        let calc = interface();
        let params = calc.methods[0].param_struct(&calc);
        assert_eq!(params.name, "Calc_Add_Params");
        assert_eq!(params.namespace, "math");
        assert_eq!(params.fields.len(), 2);
        assert_eq!(params.fields[1].kind, Kind::Int32);

        let response = calc.methods[0].response_param_struct(&calc).unwrap();
        assert_eq!(response.name, "Calc_Add_ResponseParams");
        assert_eq!(response.fields[0].name, "sum");

        assert!(calc.methods[1].response_param_struct(&calc).is_none());
        assert!(calc.methods[1].param_struct(&calc).fields.is_empty());
    }

    #[test]
    fn nested_enum_ref() {
        let e = Enum {
            name: "Color".into(),
            namespace: "gfx".into(),
            parent: Some("Pixel".into()),
            fields: vec![EnumField {
                name: "RED".into(),
                value: 3,
            }],
            attributes: Attributes::new(),
        };
        assert_eq!(e.decl_ref().qualified(), "gfx.Pixel.Color");
        assert_eq!(e.value_of("RED"), Some(3));
        assert_eq!(e.value_of("BLUE"), None);
    }
}
