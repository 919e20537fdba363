use std::collections::{BTreeMap, HashMap, HashSet};
use std::convert::TryFrom;

use log::trace;

use super::error::{ResolutionError, ResolutionErrorKind, ValidationError, ValidationErrorKind};
use crate::compiler::ast::{AttributeValue, ValueExpr};
use crate::compiler::ir::*;
use crate::compiler::translate::*;
use crate::compiler::SchemaError;

/// A constant which names can refer to.  Constants of imported modules are
/// already resolved; the local ones are evaluated on demand when an enum
/// value refers to them.
enum ConstantEntry<'r> {
    Imported {
        decl: DeclRef,
        value: Value,
    },
    Local {
        decl: DeclRef,
        value: &'r ValueExpr,
        scope: Vec<&'r str>,
    },
}

impl<'r> ConstantEntry<'r> {
    fn decl(&self) -> &DeclRef {
        match self {
            ConstantEntry::Imported { decl, .. } | ConstantEntry::Local { decl, .. } => decl,
        }
    }
}

/// A field of an enum declared in this module.  Its value is computed the
/// first time anything needs it, so enum values may refer to enums declared
/// anywhere in the file.
struct LocalEnumField<'r> {
    enum_ref: DeclRef,
    record: &'r EnumRecord,
    index: usize,
    scope: Vec<&'r str>,
}

/// Turns a module record into a module: every kind spec and every value is
/// resolved against the module's own declarations and the declarations of
/// its direct imports.
pub(super) struct Resolver<'r> {
    filename: &'r str,
    namespace: &'r str,
    kinds: HashMap<String, Kind>,
    enum_values: HashMap<String, Value>,
    enum_fields: HashMap<String, LocalEnumField<'r>>,
    constants: HashMap<String, ConstantEntry<'r>>,
    used: BTreeMap<String, Kind>,
}

impl<'r> Resolver<'r> {
    pub(super) fn new(filename: &'r str, record: &'r ModuleRecord) -> Resolver<'r> {
        Resolver {
            filename,
            namespace: &record.namespace,
            kinds: HashMap::new(),
            enum_values: HashMap::new(),
            enum_fields: HashMap::new(),
            constants: HashMap::new(),
            used: BTreeMap::new(),
        }
    }

    /// Builds the module described by `record`.  `imports` must already be
    /// built.
    pub(super) fn build(
        mut self,
        record: &'r ModuleRecord,
        path: String,
        imports: Vec<Import>,
    ) -> Result<Module, SchemaError> {
        self.check_top_level_names(record)?;
        for import in &imports {
            self.add_import(&import.module);
        }
        self.add_local(record);

        // Constants, struct fields and methods may refer to enum values, so
        // every enum is built first.
        let mut enums = vec![];
        for e in &record.enums {
            enums.push(self.build_enum(e, None)?);
        }
        let mut struct_enums = vec![];
        for s in &record.structs {
            let mut nested = vec![];
            for e in &s.enums {
                nested.push(self.build_enum(e, Some(s.name.as_str()))?);
            }
            struct_enums.push(nested);
        }
        let mut interface_enums = vec![];
        for i in &record.interfaces {
            let mut nested = vec![];
            for e in &i.enums {
                nested.push(self.build_enum(e, Some(i.name.as_str()))?);
            }
            interface_enums.push(nested);
        }

        let mut constants = vec![];
        for c in &record.constants {
            constants.push(self.build_constant(c, &[])?);
        }

        let mut structs = vec![];
        for (s, nested) in record.structs.iter().zip(struct_enums) {
            structs.push(self.build_struct(s, nested)?);
        }

        let mut interfaces = vec![];
        for (i, nested) in record.interfaces.iter().zip(interface_enums) {
            interfaces.push(self.build_interface(i, nested)?);
        }

        Ok(Module {
            name: record.name.clone(),
            namespace: record.namespace.clone(),
            path,
            attributes: record.attributes.clone(),
            imports,
            structs,
            interfaces,
            enums,
            constants,
            kinds: self.used,
        })
    }

    fn qualify(namespace: &str, name: &str) -> String {
        DeclRef::new(namespace, name).qualified()
    }

    fn add_import(&mut self, module: &Module) {
        let ns = &module.namespace;
        for s in &module.structs {
            self.kinds
                .insert(Self::qualify(ns, &s.name), Kind::Struct(s.decl_ref()));
            self.add_imported_constants(ns, Some(&s.name), &s.constants);
        }
        for i in &module.interfaces {
            self.kinds
                .insert(Self::qualify(ns, &i.name), Kind::Interface(i.decl_ref()));
            self.add_imported_constants(ns, Some(&i.name), &i.constants);
        }
        for e in module.all_enums() {
            let enum_ref = e.decl_ref();
            for f in &e.fields {
                self.enum_values.insert(
                    format!("{}.{}", enum_ref.qualified(), f.name),
                    Value::EnumValue {
                        enum_ref: enum_ref.clone(),
                        name: f.name.clone(),
                        value: f.value,
                    },
                );
            }
            self.kinds.insert(enum_ref.qualified(), Kind::Enum(enum_ref));
        }
        self.add_imported_constants(ns, None, &module.constants);
    }

    fn add_imported_constants(&mut self, ns: &str, parent: Option<&str>, constants: &[Constant]) {
        for c in constants {
            let name = match parent {
                Some(parent) => format!("{}.{}", parent, c.name),
                None => c.name.clone(),
            };
            let decl = DeclRef::new(ns, &name);
            self.constants.insert(
                decl.qualified(),
                ConstantEntry::Imported {
                    decl,
                    value: c.value.clone(),
                },
            );
        }
    }

    fn add_local(&mut self, record: &'r ModuleRecord) {
        let ns = self.namespace;
        for s in &record.structs {
            let decl = DeclRef::new(ns, &s.name);
            self.kinds.insert(decl.qualified(), Kind::Struct(decl));
            self.add_local_nested(&s.name, &s.enums, &s.constants);
        }
        for i in &record.interfaces {
            let decl = DeclRef::new(ns, &i.name);
            self.kinds.insert(decl.qualified(), Kind::Interface(decl));
            self.add_local_nested(&i.name, &i.enums, &i.constants);
        }
        for e in &record.enums {
            let decl = DeclRef::new(ns, &e.name);
            self.kinds.insert(decl.qualified(), Kind::Enum(decl.clone()));
            self.add_local_enum_fields(decl, e, vec![e.name.as_str()]);
        }
        for c in &record.constants {
            let decl = DeclRef::new(ns, &c.name);
            self.constants.insert(
                decl.qualified(),
                ConstantEntry::Local {
                    decl,
                    value: &c.value,
                    scope: vec![],
                },
            );
        }
    }

    fn add_local_nested(
        &mut self,
        parent: &'r str,
        enums: &'r [EnumRecord],
        constants: &'r [ConstantRecord],
    ) {
        let ns = self.namespace;
        for e in enums {
            let decl = DeclRef::new(ns, &format!("{}.{}", parent, e.name));
            self.kinds.insert(decl.qualified(), Kind::Enum(decl.clone()));
            self.add_local_enum_fields(decl, e, vec![parent, e.name.as_str()]);
        }
        for c in constants {
            let decl = DeclRef::new(ns, &format!("{}.{}", parent, c.name));
            self.constants.insert(
                decl.qualified(),
                ConstantEntry::Local {
                    decl,
                    value: &c.value,
                    scope: vec![parent],
                },
            );
        }
    }

    fn add_local_enum_fields(&mut self, enum_ref: DeclRef, record: &'r EnumRecord, scope: Vec<&'r str>) {
        for (index, f) in record.fields.iter().enumerate() {
            let key = format!("{}.{}", enum_ref.qualified(), f.name);
            // A local declaration hides an imported one of the same name
            self.enum_values.remove(&key);
            self.enum_fields.insert(
                key,
                LocalEnumField {
                    enum_ref: enum_ref.clone(),
                    record,
                    index,
                    scope: scope.clone(),
                },
            );
        }
    }

    /// The qualified names `name` may refer to from within `scope`, innermost
    /// first: `ns.Scope.Name`, `ns.Name`, `Name`.
    fn candidates(&self, scope: &[&str], name: &str) -> Vec<String> {
        let mut found = vec![];
        for depth in (0..=scope.len()).rev() {
            let mut parts: Vec<&str> = vec![];
            if !self.namespace.is_empty() {
                parts.push(self.namespace);
            }
            parts.extend_from_slice(&scope[..depth]);
            parts.push(name);
            found.push(parts.join("."));
        }
        if !self.namespace.is_empty() {
            found.push(name.into());
        }
        found
    }

    fn resolution_error(&self, line: u32, kind: ResolutionErrorKind) -> SchemaError {
        ResolutionError::new(self.filename, line, kind).into()
    }

    fn resolve_kind(&mut self, spec: &str, scope: &[&str], line: u32) -> Result<Kind, SchemaError> {
        let kind = if let Some(kind) = Kind::from_simple_spec(spec) {
            kind
        } else if let Some(inner) = spec.strip_prefix("a:") {
            Kind::Array(Box::new(self.resolve_kind(inner, scope, line)?))
        } else if let Some(inner) = spec.strip_prefix("r:") {
            match self.resolve_kind(inner, scope, line)? {
                kind @ Kind::Interface(_) => Kind::InterfaceRequest(Box::new(kind)),
                other => {
                    return Err(
                        self.resolution_error(line, ResolutionErrorKind::NotAnInterface(other.spec()))
                    )
                }
            }
        } else if let Some(name) = spec.strip_prefix("x:") {
            let found = self
                .candidates(scope, name)
                .iter()
                .find_map(|c| self.kinds.get(c))
                .cloned();
            match found {
                Some(kind) => kind,
                None => {
                    return Err(
                        self.resolution_error(line, ResolutionErrorKind::UnknownKind(name.into()))
                    )
                }
            }
        } else {
            return Err(self.resolution_error(line, ResolutionErrorKind::UnknownKind(spec.into())));
        };

        trace!("{}: {} resolved to {}", self.filename, spec, kind);
        self.used.insert(kind.spec(), kind.clone());
        Ok(kind)
    }

    fn resolve_value(&self, expr: &ValueExpr, scope: &[&str], line: u32) -> Result<Value, SchemaError> {
        Ok(match expr {
            ValueExpr::Integer(i) => Value::Literal(Literal::Integer(i.clone())),
            ValueExpr::Float(f) => Value::Literal(Literal::Float(f.clone())),
            ValueExpr::String(s) => Value::Literal(Literal::String(s.clone())),
            ValueExpr::Bool(b) => Value::Literal(Literal::Bool(*b)),
            ValueExpr::Default => Value::Literal(Literal::Default),
            ValueExpr::Name(name) => {
                let candidates = self.candidates(scope, name);
                if let Some(v) = candidates.iter().find_map(|c| self.enum_values.get(c)) {
                    v.clone()
                } else if let Some(c) = candidates.iter().find_map(|c| self.constants.get(c)) {
                    Value::Constant(c.decl().clone())
                } else {
                    return Err(
                        self.resolution_error(line, ResolutionErrorKind::UnknownValue(name.clone()))
                    );
                }
            }
        })
    }

    /// Computes the integer an enum value expression stands for.
    fn eval_integer(
        &self,
        expr: &ValueExpr,
        scope: &[&str],
        line: u32,
        visiting: &mut HashSet<String>,
    ) -> Result<i128, SchemaError> {
        match expr {
            ValueExpr::Integer(text) => parse_integer(text).ok_or_else(|| {
                self.resolution_error(line, ResolutionErrorKind::NotAnInteger(text.clone()))
            }),
            ValueExpr::Name(name) => {
                let candidates = self.candidates(scope, name);
                let is_enum_value =
                    |c: &String| self.enum_values.contains_key(c) || self.enum_fields.contains_key(c);
                if let Some(key) = candidates.iter().find(|c| is_enum_value(*c)) {
                    self.enum_field_integer(key, name, line, visiting).map(i128::from)
                } else if let Some(key) = candidates.iter().find(|c| self.constants.contains_key(*c)) {
                    self.constant_integer(key, name, line, visiting)
                } else {
                    Err(self.resolution_error(line, ResolutionErrorKind::UnknownValue(name.clone())))
                }
            }
            other => Err(self.resolution_error(
                line,
                ResolutionErrorKind::NotAnInteger(format!("{:?}", other)),
            )),
        }
    }

    /// The value of the enum field stored under `key`: an imported or
    /// already built value, or else the local field evaluated on the spot.
    fn enum_field_integer(
        &self,
        key: &str,
        name: &str,
        line: u32,
        visiting: &mut HashSet<String>,
    ) -> Result<i32, SchemaError> {
        if let Some(Value::EnumValue { value, .. }) = self.enum_values.get(key) {
            return Ok(*value);
        }
        let field = match self.enum_fields.get(key) {
            Some(field) => field,
            None => {
                return Err(self.resolution_error(line, ResolutionErrorKind::UnknownValue(name.into())))
            }
        };
        if !visiting.insert(key.to_string()) {
            return Err(self.resolution_error(line, ResolutionErrorKind::NotAnInteger(name.into())));
        }

        let record = &field.record.fields[field.index];
        let value = match (&record.value, field.index) {
            (Some(expr), _) => self.eval_integer(expr, &field.scope, record.line, visiting),
            (None, 0) => Ok(0),
            (None, index) => {
                let previous = &field.record.fields[index - 1];
                let previous_key = format!("{}.{}", field.enum_ref.qualified(), previous.name);
                self.enum_field_integer(&previous_key, &previous.name, previous.line, visiting)
                    .map(|v| i128::from(v) + 1)
            }
        };
        visiting.remove(key);

        let value = value?;
        i32::try_from(value).map_err(|_| {
            self.resolution_error(
                record.line,
                ResolutionErrorKind::EnumValueOutOfRange(record.name.clone(), value),
            )
        })
    }

    fn constant_integer(
        &self,
        key: &str,
        name: &str,
        line: u32,
        visiting: &mut HashSet<String>,
    ) -> Result<i128, SchemaError> {
        if !visiting.insert(key.to_string()) {
            return Err(self.resolution_error(line, ResolutionErrorKind::NotAnInteger(name.into())));
        }
        let result = match self.constants.get(key) {
            Some(ConstantEntry::Imported { value, .. }) => {
                self.value_integer(value, name, line, visiting)
            }
            Some(ConstantEntry::Local { value, scope, .. }) => {
                self.eval_integer(value, scope, line, visiting)
            }
            None => Err(self.resolution_error(line, ResolutionErrorKind::UnknownValue(name.into()))),
        };
        visiting.remove(key);
        result
    }

    fn value_integer(
        &self,
        value: &Value,
        name: &str,
        line: u32,
        visiting: &mut HashSet<String>,
    ) -> Result<i128, SchemaError> {
        match value {
            Value::EnumValue { value, .. } => Ok(i128::from(*value)),
            Value::Literal(Literal::Integer(text)) => parse_integer(text).ok_or_else(|| {
                self.resolution_error(line, ResolutionErrorKind::NotAnInteger(name.into()))
            }),
            Value::Constant(decl) => self.constant_integer(&decl.qualified(), name, line, visiting),
            Value::Literal(_) => {
                Err(self.resolution_error(line, ResolutionErrorKind::NotAnInteger(name.into())))
            }
        }
    }

    fn build_enum(&mut self, record: &EnumRecord, parent: Option<&str>) -> Result<Enum, SchemaError> {
        check_unique(
            self.filename,
            record.fields.iter().map(|f| (f.name.as_str(), f.line)),
        )?;

        let enum_ref = match parent {
            Some(parent) => DeclRef::new(self.namespace, &format!("{}.{}", parent, record.name)),
            None => DeclRef::new(self.namespace, &record.name),
        };

        let mut fields = vec![];
        for f in &record.fields {
            let key = format!("{}.{}", enum_ref.qualified(), f.name);
            let value = self.enum_field_integer(&key, &f.name, f.line, &mut HashSet::new())?;
            self.enum_values.insert(
                key,
                Value::EnumValue {
                    enum_ref: enum_ref.clone(),
                    name: f.name.clone(),
                    value,
                },
            );
            fields.push(EnumField {
                name: f.name.clone(),
                value,
            });
        }

        Ok(Enum {
            name: record.name.clone(),
            namespace: self.namespace.into(),
            parent: parent.map(String::from),
            fields,
            attributes: record.attributes.clone(),
        })
    }

    fn build_constant(
        &mut self,
        record: &ConstantRecord,
        scope: &[&str],
    ) -> Result<Constant, SchemaError> {
        Ok(Constant {
            name: record.name.clone(),
            kind: self.resolve_kind(&record.kind, scope, record.line)?,
            value: self.resolve_value(&record.value, scope, record.line)?,
            attributes: record.attributes.clone(),
        })
    }

    fn build_struct(&mut self, record: &StructRecord, enums: Vec<Enum>) -> Result<Struct, SchemaError> {
        check_unique(
            self.filename,
            record
                .fields
                .iter()
                .map(|f| (f.name.as_str(), f.line))
                .chain(record.enums.iter().map(|e| (e.name.as_str(), e.line)))
                .chain(record.constants.iter().map(|c| (c.name.as_str(), c.line))),
        )?;

        let scope = [record.name.as_str()];
        let mut constants = vec![];
        for c in &record.constants {
            constants.push(self.build_constant(c, &scope)?);
        }

        let mut fields = vec![];
        for f in &record.fields {
            let kind = self.resolve_kind(&f.kind, &scope, f.line)?;
            let default = match &f.default {
                Some(expr) => Some(self.resolve_value(expr, &scope, f.line)?),
                None => None,
            };
            fields.push(Field {
                name: f.name.clone(),
                kind,
                ordinal: f.ordinal,
                default,
                attributes: f.attributes.clone(),
            });
        }

        Ok(Struct {
            name: record.name.clone(),
            namespace: self.namespace.into(),
            attributes: record.attributes.clone(),
            fields,
            enums,
            constants,
        })
    }

    fn build_interface(
        &mut self,
        record: &InterfaceRecord,
        enums: Vec<Enum>,
    ) -> Result<Interface, SchemaError> {
        check_unique(
            self.filename,
            record
                .methods
                .iter()
                .map(|m| (m.name.as_str(), m.line))
                .chain(record.enums.iter().map(|e| (e.name.as_str(), e.line)))
                .chain(record.constants.iter().map(|c| (c.name.as_str(), c.line))),
        )?;

        let scope = [record.name.as_str()];
        let client = match record.attributes.get("Client") {
            Some(AttributeValue::Name(name)) | Some(AttributeValue::String(name)) => {
                match self.resolve_kind(&format!("x:{}", name), &scope, record.line)? {
                    Kind::Interface(decl) => Some(decl),
                    _ => {
                        return Err(self.resolution_error(
                            record.line,
                            ResolutionErrorKind::NotAnInterface(name.clone()),
                        ))
                    }
                }
            }
            Some(other) => {
                return Err(self.resolution_error(
                    record.line,
                    ResolutionErrorKind::NotAnInterface(other.to_string()),
                ))
            }
            None => None,
        };

        let mut constants = vec![];
        for c in &record.constants {
            constants.push(self.build_constant(c, &scope)?);
        }

        let mut methods: Vec<Method> = vec![];
        let mut next = Some(0u32);
        for m in &record.methods {
            let ordinal = match (m.ordinal, next) {
                (Some(ordinal), _) | (None, Some(ordinal)) => ordinal,
                (None, None) => {
                    return Err(ValidationError::new(
                        self.filename,
                        m.line,
                        ValidationErrorKind::MethodOrdinalOverflow {
                            interface: record.name.clone(),
                            method: m.name.clone(),
                        },
                    )
                    .into())
                }
            };
            next = ordinal.checked_add(1);

            if let Some(first) = methods.iter().find(|other| other.ordinal == ordinal) {
                return Err(ValidationError::new(
                    self.filename,
                    m.line,
                    ValidationErrorKind::DuplicateMethodOrdinal {
                        interface: record.name.clone(),
                        ordinal,
                        first: first.name.clone(),
                        second: m.name.clone(),
                    },
                )
                .into());
            }

            let parameters = self.build_parameters(&m.parameters, &scope)?;
            let response_parameters = match &m.response_parameters {
                Some(params) => Some(self.build_parameters(params, &scope)?),
                None => None,
            };
            methods.push(Method {
                name: m.name.clone(),
                ordinal,
                parameters,
                response_parameters,
                attributes: m.attributes.clone(),
            });
        }

        Ok(Interface {
            name: record.name.clone(),
            namespace: self.namespace.into(),
            client,
            methods,
            enums,
            constants,
            attributes: record.attributes.clone(),
        })
    }

    fn build_parameters(
        &mut self,
        records: &[ParameterRecord],
        scope: &[&str],
    ) -> Result<Vec<Parameter>, SchemaError> {
        check_unique(self.filename, records.iter().map(|p| (p.name.as_str(), p.line)))?;
        let mut params = vec![];
        for p in records {
            params.push(Parameter {
                name: p.name.clone(),
                kind: self.resolve_kind(&p.kind, scope, p.line)?,
                ordinal: p.ordinal,
                attributes: p.attributes.clone(),
            });
        }
        Ok(params)
    }

    fn check_top_level_names(&self, record: &ModuleRecord) -> Result<(), SchemaError> {
        check_unique(
            self.filename,
            record
                .structs
                .iter()
                .map(|s| (s.name.as_str(), s.line))
                .chain(record.interfaces.iter().map(|i| (i.name.as_str(), i.line)))
                .chain(record.enums.iter().map(|e| (e.name.as_str(), e.line)))
                .chain(record.constants.iter().map(|c| (c.name.as_str(), c.line))),
        )
    }
}

/// Fails on the second declaration of any name in `names`.
fn check_unique<'a, I>(filename: &str, names: I) -> Result<(), SchemaError>
where
    I: Iterator<Item = (&'a str, u32)>,
{
    let mut seen = HashSet::new();
    for (name, line) in names {
        if !seen.insert(name) {
            return Err(ValidationError::new(
                filename,
                line,
                ValidationErrorKind::DuplicateName(name.into()),
            )
            .into());
        }
    }
    Ok(())
}

/// Parses decimal or `0x` hex integer text with an optional sign.
pub fn parse_integer(text: &str) -> Option<i128> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i128::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i128>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::parse_integer;

    #[test]
    fn integers() {
        assert_eq!(parse_integer("0"), Some(0));
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("-42"), Some(-42));
        assert_eq!(parse_integer("+7"), Some(7));
        assert_eq!(parse_integer("0x1F"), Some(31));
        assert_eq!(parse_integer("-0x10"), Some(-16));
        assert_eq!(
            parse_integer("18446744073709551615"),
            Some(i128::from(u64::MAX))
        );
        assert_eq!(parse_integer("-0x80000000"), Some(i128::from(i32::MIN)));
        assert_eq!(parse_integer("abc"), None);
    }
}
