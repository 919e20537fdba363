#[cfg(test)]
pub mod tests {
    use super::super::parser::*;
    use crate::compiler::{
        ast::*,
        lexer::tokens::{Lex, Token},
        parser::ParserError,
        CompilerError, Lexer,
    };

    fn parse_text(text: &str) -> Result<SchemaFile, CompilerError<ParserError>> {
        let tokens: Vec<Token> = Lexer::new(text)
            .tokenize()
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        parse("test.schema", &tokens)
    }

    fn only_module(file: &SchemaFile) -> &ModuleDecl {
        assert_eq!(file.modules.len(), 1);
        &file.modules[0]
    }

    fn struct_fields(def: &Definition) -> Vec<&FieldDecl> {
        match def {
            Definition::Struct(s) => s
                .body
                .iter()
                .filter_map(|m| match m {
                    StructMember::Field(f) => Some(f),
                    _ => None,
                })
                .collect(),
            _ => panic!("Expected a struct, got {:?}", def),
        }
    }

    #[test]
    fn parse_empty_file() {
        let file = parse_text("").unwrap();
        assert!(file.imports.is_empty());
        assert!(file.modules.is_empty());
    }

    #[test]
    fn parse_imports_and_module() {
        let text = "import \"a/b.schema\";\nimport \"c.schema\";\nmodule foo.bar {\n}";
        let file = parse_text(text).unwrap();
        assert_eq!(
            file.imports,
            vec![
                ImportDecl {
                    line: 1,
                    path: "a/b.schema".into()
                },
                ImportDecl {
                    line: 2,
                    path: "c.schema".into()
                },
            ]
        );
        let m = only_module(&file);
        assert_eq!(m.name, Some("foo.bar".into()));
        assert_eq!(m.line, 3);
        assert!(m.definitions.is_empty());
    }

    #[test]
    fn parse_import_without_path() {
        let err = parse_text("import foo;").unwrap_err();
        assert_eq!(err.take(), (1, ParserError::ImportExpectedPath));
    }

    #[test]
    fn parse_module_semicolon_form() {
        let text = "module foo;\nstruct A { int32 x; };\nenum E { X };";
        let file = parse_text(text).unwrap();
        let m = only_module(&file);
        assert_eq!(m.name, Some("foo".into()));
        let names: Vec<&str> = m.definitions.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["A", "E"]);
    }

    #[test]
    fn parse_implicit_module() {
        let text = "struct A { int32 x; };\ninterface I { Ping(); };";
        let file = parse_text(text).unwrap();
        let m = only_module(&file);
        assert_eq!(m.name, None);
        assert_eq!(m.definitions.len(), 2);
    }

    #[test]
    fn parse_two_modules() {
        let text = "module a { }\nmodule b { }";
        let file = parse_text(text).unwrap();
        assert_eq!(file.modules.len(), 2);
    }

    #[test]
    fn parse_definition_outside_module() {
        let text = "module a { }\nstruct Loose { };";
        let err = parse_text(text).unwrap_err();
        assert_eq!(
            err.take(),
            (2, ParserError::DefinitionOutsideModule("Loose".into()))
        );

        let text = "struct Loose { };\nmodule a { }";
        let err = parse_text(text).unwrap_err();
        assert_eq!(
            err.take(),
            (1, ParserError::DefinitionOutsideModule("Loose".into()))
        );
    }

    #[test]
    fn parse_struct_fields() {
        let text = "module m {
            struct Foo {
                int32 a;
                bool b@3 = true;
                string? c;
            };
        }";
        // `?` is not part of the grammar
        assert!(Lexer::new(text).tokenize().iter().any(|t| t.is_err()));

        let text = "module m {
            struct Foo {
                int32 a;
                bool b@3 = true;
                int8 c = -5;
                Bar.Baz d;
            }
        }";
        let file = parse_text(text).unwrap();
        let fields = struct_fields(&only_module(&file).definitions[0]);
        assert_eq!(fields.len(), 4);

        assert_eq!(fields[0].name, "a");
        assert_eq!(fields[0].ty, TypeSpec::Named("int32".into()));
        assert_eq!(fields[0].ordinal, None);
        assert_eq!(fields[0].line, 3);

        assert_eq!(fields[1].ordinal, Some(3));
        assert_eq!(fields[1].default, Some(ValueExpr::Bool(true)));

        assert_eq!(fields[2].default, Some(ValueExpr::Integer("-5".into())));

        assert_eq!(fields[3].ty, TypeSpec::Named("Bar.Baz".into()));
    }

    #[test]
    fn parse_struct_nested_enum_and_const() {
        let text = "struct Foo {
            enum Kind { A, B = 5, C, };
            const int32 kMax = 0x10;
            Kind k;
        };";
        let file = parse_text(text).unwrap();
        match &only_module(&file).definitions[0] {
            Definition::Struct(s) => {
                assert_eq!(s.body.len(), 3);
                match &s.body[0] {
                    StructMember::Enum(e) => {
                        assert_eq!(e.name, "Kind");
                        assert_eq!(e.values.len(), 3);
                        assert_eq!(e.values[1].value, Some(ValueExpr::Integer("5".into())));
                        assert_eq!(e.values[2].value, None);
                    }
                    m => panic!("Expected enum, got {:?}", m),
                }
                match &s.body[1] {
                    StructMember::Const(c) => {
                        assert_eq!(c.name, "kMax");
                        assert_eq!(c.value, ValueExpr::Integer("0x10".into()));
                    }
                    m => panic!("Expected const, got {:?}", m),
                }
            }
            d => panic!("Expected struct, got {:?}", d),
        }
    }

    #[test]
    fn parse_types() {
        for (text, expected) in vec![
            ("int32[] x;", TypeSpec::Array(Box::new(TypeSpec::Named("int32".into())))),
            (
                "int32[][] x;",
                TypeSpec::Array(Box::new(TypeSpec::Array(Box::new(TypeSpec::Named(
                    "int32".into(),
                ))))),
            ),
            (
                "array<uint8> x;",
                TypeSpec::Array(Box::new(TypeSpec::Named("uint8".into()))),
            ),
            ("handle x;", TypeSpec::Handle(None)),
            (
                "handle<data_pipe_consumer> x;",
                TypeSpec::Handle(Some(HandleSubtype::DataPipeConsumer)),
            ),
            (
                "handle<message_pipe>[] x;",
                TypeSpec::Array(Box::new(TypeSpec::Handle(Some(HandleSubtype::MessagePipe)))),
            ),
            (
                "Service& x;",
                TypeSpec::InterfaceRequest(Box::new(TypeSpec::Named("Service".into()))),
            ),
        ] {
            let file = parse_text(&format!("struct S {{ {} }};", text)).unwrap();
            let fields = struct_fields(&only_module(&file).definitions[0]);
            assert_eq!(fields[0].ty, expected, "{}", text);
        }
    }

    #[test]
    fn parse_invalid_handle_type() {
        let err = parse_text("struct S {\n handle<socket> h;\n};").unwrap_err();
        assert_eq!(
            err.take(),
            (2, ParserError::InvalidHandleType("socket".into()))
        );
    }

    #[test]
    fn parse_ordinal_overflow() {
        let err = parse_text("struct S {\n  int32 x@4294967296;\n};").unwrap_err();
        assert_eq!(
            err.take(),
            (2, ParserError::OrdinalOverflow("@4294967296".into()))
        );

        let file = parse_text("struct S { int32 x@4294967295; };").unwrap();
        let fields = struct_fields(&only_module(&file).definitions[0]);
        assert_eq!(fields[0].ordinal, Some(u32::MAX));
    }

    #[test]
    fn parse_interface() {
        let text = "interface Service {
            Ping();
            Add@4(int32 a, [MinVersion=1] int32 b@1) => (int32 sum);
            Close() => ();
        };";
        let file = parse_text(text).unwrap();
        let iface = match &only_module(&file).definitions[0] {
            Definition::Interface(i) => i,
            d => panic!("Expected interface, got {:?}", d),
        };
        assert_eq!(iface.name, "Service");
        let methods: Vec<&MethodDecl> = iface
            .body
            .iter()
            .filter_map(|m| match m {
                InterfaceMember::Method(m) => Some(m),
                _ => None,
            })
            .collect();
        assert_eq!(methods.len(), 3);

        assert_eq!(methods[0].name, "Ping");
        assert!(methods[0].parameters.is_empty());
        assert_eq!(methods[0].response_parameters, None);

        assert_eq!(methods[1].ordinal, Some(4));
        assert_eq!(methods[1].parameters.len(), 2);
        assert_eq!(methods[1].parameters[1].ordinal, Some(1));
        assert_eq!(methods[1].parameters[1].attributes[0].key, "MinVersion");
        assert_eq!(
            methods[1].response_parameters.as_ref().map(|r| r.len()),
            Some(1)
        );

        assert_eq!(methods[2].response_parameters, Some(vec![]));
    }

    #[test]
    fn parse_attributes() {
        let text = "[Client=Peer, Stable, Name=\"x\", Version=2]\ninterface I { };";
        let file = parse_text(text).unwrap();
        let iface = match &only_module(&file).definitions[0] {
            Definition::Interface(i) => i,
            d => panic!("Expected interface, got {:?}", d),
        };
        let attrs: Vec<(&str, &AttributeValue)> = iface
            .attributes
            .iter()
            .map(|a| (a.key.as_str(), &a.value))
            .collect();
        assert_eq!(
            attrs,
            vec![
                ("Client", &AttributeValue::Name("Peer".into())),
                ("Stable", &AttributeValue::Bool(true)),
                ("Name", &AttributeValue::String("x".into())),
                ("Version", &AttributeValue::Integer("2".into())),
            ]
        );
        assert_eq!(iface.line, 2);
    }

    #[test]
    fn parse_module_attributes() {
        let text = "[JavaPackage=\"org.x\"]\nmodule a.b { }";
        let file = parse_text(text).unwrap();
        let m = only_module(&file);
        assert_eq!(m.attributes.len(), 1);
        assert_eq!(m.attributes[0].key, "JavaPackage");
    }

    #[test]
    fn parse_const_attributes() {
        let text = "module m {
            [Deprecated] const int32 kTop = 1;
            struct S { [Unit=\"ms\"] const int32 kIn = 2; };
            interface I { [Stable] const int32 kOn = 3; };
        }";
        let file = parse_text(text).unwrap();
        let defs = &only_module(&file).definitions;
        match &defs[0] {
            Definition::Const(c) => {
                assert_eq!(c.attributes.len(), 1);
                assert_eq!(c.attributes[0].key, "Deprecated");
                assert_eq!(c.attributes[0].value, AttributeValue::Bool(true));
            }
            d => panic!("Expected const, got {:?}", d),
        }
        match &defs[1] {
            Definition::Struct(s) => match &s.body[0] {
                StructMember::Const(c) => {
                    assert_eq!(c.attributes[0].key, "Unit");
                    assert_eq!(c.attributes[0].value, AttributeValue::String("ms".into()));
                }
                m => panic!("Expected const, got {:?}", m),
            },
            d => panic!("Expected struct, got {:?}", d),
        }
        match &defs[2] {
            Definition::Interface(i) => match &i.body[0] {
                InterfaceMember::Const(c) => assert_eq!(c.attributes[0].key, "Stable"),
                m => panic!("Expected const, got {:?}", m),
            },
            d => panic!("Expected interface, got {:?}", d),
        }
    }

    #[test]
    fn parse_attribute_missing_value() {
        let err = parse_text("[Client=] interface I { };").unwrap_err();
        assert_eq!(
            err.take(),
            (1, ParserError::AttributeExpectedValue("Client".into()))
        );
    }

    #[test]
    fn parse_const_values() {
        for (text, expected) in vec![
            ("const double kPi = 3.14;", ValueExpr::Float("3.14".into())),
            ("const double kNeg = -1.5;", ValueExpr::Float("-1.5".into())),
            ("const string kName = \"abc\";", ValueExpr::String("abc".into())),
            ("const bool kOn = false;", ValueExpr::Bool(false)),
            ("const int32 kRef = Foo.kOther;", ValueExpr::Name("Foo.kOther".into())),
            ("const int32 kPos = +7;", ValueExpr::Integer("7".into())),
        ] {
            let file = parse_text(text).unwrap();
            match &only_module(&file).definitions[0] {
                Definition::Const(c) => assert_eq!(c.value, expected, "{}", text),
                d => panic!("Expected const, got {:?}", d),
            }
        }
    }

    #[test]
    fn parse_field_missing_semicolon() {
        let err = parse_text("struct S {\n int32 x\n}").unwrap_err();
        assert_eq!(
            err.take(),
            (
                3,
                ParserError::ExpectedButFound(vec![Lex::Semicolon], Some(Lex::RBrace))
            )
        );
    }

    #[test]
    fn parse_missing_closing_brace() {
        let err = parse_text("struct S {\n int32 x;\n").unwrap_err();
        assert_eq!(
            err.take(),
            (2, ParserError::ExpectedButFound(vec![Lex::RBrace], None))
        );
    }

    #[test]
    fn parse_field_without_name() {
        let err = parse_text("struct S { int32; };").unwrap_err();
        assert_eq!(
            err.take(),
            (1, ParserError::ExpectedNameAfterType("int32".into()))
        );
    }

    #[test]
    fn parse_stray_token() {
        let err = parse_text("module a { }\n}").unwrap_err();
        assert_eq!(
            err.take(),
            (2, ParserError::Locked(Some(Token::new(2, Lex::RBrace))))
        );
    }
}
