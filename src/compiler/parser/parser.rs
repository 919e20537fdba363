use log::debug;
use stdext::function_name;

use super::tokenstream::TokenStream;
use super::{ParserError, ParserResult};
use crate::compiler::ast::*;
use crate::compiler::lexer::tokens::{Lex, Token};
use crate::compiler::CompilerError;

macro_rules! trace {
    ($ts:expr) => {
        log::trace!(
            "{} <- {}",
            function_name!(),
            $ts.peek()
                .map_or_else(|| "EOF".to_string(), |t| t.to_string())
        )
    };
}

/*
    Grammar
    FILE := IMPORT* (MODULE* | DEFINITION*)
    IMPORT := import STRING ;
    MODULE := [ATTRIBUTES] module DOTTED_NAME ({ DEFINITION* } [;] | ; DEFINITION*)
    DEFINITION := [ATTRIBUTES] (STRUCT | INTERFACE | ENUM | CONST)
    ATTRIBUTES := \[ [ATTRIBUTE [, ATTRIBUTE]*] \]
    ATTRIBUTE := IDENTIFIER [= ATTRIBUTE_VALUE]
    STRUCT := struct IDENTIFIER { ([ATTRIBUTES] (FIELD | ENUM | CONST))* } [;]
    FIELD := TYPE IDENTIFIER [ORDINAL] [= VALUE] ;
    INTERFACE := interface IDENTIFIER { ([ATTRIBUTES] (METHOD | ENUM | CONST))* } [;]
    METHOD := IDENTIFIER [ORDINAL] ( PARAMS ) [=> ( PARAMS )] ;
    PARAMS := [PARAM [, PARAM]*]
    PARAM := [ATTRIBUTES] TYPE IDENTIFIER [ORDINAL]
    ENUM := enum IDENTIFIER { [ENUM_VALUE [, ENUM_VALUE]* [,]] } [;]
    ENUM_VALUE := IDENTIFIER [= VALUE]
    CONST := const TYPE IDENTIFIER = VALUE ;
    TYPE := (handle [< IDENTIFIER >] | array < TYPE > | DOTTED_NAME) ([ ] | &)*
    VALUE := [- | +] (INTEGER | FLOAT) | STRING | true | false | default | DOTTED_NAME
    DOTTED_NAME := IDENTIFIER [. IDENTIFIER]*
*/

type StageResult<T> = Result<T, CompilerError<ParserError>>;

/// Parses a tokenized schema file into its syntax tree.
///
/// A file without a `module` declaration has all of its definitions wrapped
/// in an implicit module whose name is `None`.  Definitions may not appear
/// outside of an explicit module once the file uses one.
pub fn parse(filename: &str, tokens: &[Token]) -> StageResult<SchemaFile> {
    debug!("Parsing {} ({} tokens)", filename, tokens.len());
    let mut stream = TokenStream::new(tokens);
    let file = schema_file(&mut stream)?;

    match stream.peek() {
        Some(t) => err!(t.line, ParserError::Locked(Some(t.clone()))),
        None => Ok(file),
    }
}

fn schema_file(stream: &mut TokenStream) -> StageResult<SchemaFile> {
    trace!(stream);
    let mut imports = vec![];
    while let Some(i) = import(stream)? {
        imports.push(i);
    }

    let mut modules: Vec<ModuleDecl> = vec![];
    let mut loose: Vec<Definition> = vec![];
    let mut loose_line = None;

    loop {
        let line = stream.line();
        let attributes = attribute_list(stream)?;

        if let Some(m) = module(stream, attributes.clone())? {
            if let Some(first) = loose.first() {
                return err!(
                    loose_line.unwrap_or(line),
                    ParserError::DefinitionOutsideModule(first.name().into())
                );
            }
            modules.push(m);
        } else if let Some(d) = definition(stream, attributes)? {
            if !modules.is_empty() {
                return err!(line, ParserError::DefinitionOutsideModule(d.name().into()));
            }
            loose_line.get_or_insert(line);
            loose.push(d);
        } else {
            break;
        }
    }

    if modules.is_empty() && !loose.is_empty() {
        modules.push(ModuleDecl {
            line: loose_line.unwrap_or(1),
            name: None,
            attributes: vec![],
            definitions: loose,
        });
    }

    Ok(SchemaFile {
        imports,
        modules,
    })
}

fn import(stream: &mut TokenStream) -> ParserResult<ImportDecl> {
    trace!(stream);
    match stream.next_if(&Lex::Import) {
        Some(token) => match stream.next_if(&Lex::StringLiteral(String::new())) {
            Some(Token {
                sym: Lex::StringLiteral(path),
                ..
            }) => {
                stream.next_must_be(&Lex::Semicolon)?;
                Ok(Some(ImportDecl {
                    line: token.line,
                    path,
                }))
            }
            _ => err!(token.line, ParserError::ImportExpectedPath),
        },
        None => Ok(None),
    }
}

fn module(stream: &mut TokenStream, attributes: Vec<Attribute>) -> ParserResult<ModuleDecl> {
    trace!(stream);
    let token = match stream.next_if(&Lex::Module) {
        Some(token) => token,
        None => return Ok(None),
    };

    let name = match dotted_name(stream)? {
        Some((name, _)) => name,
        None => return err!(token.line, ParserError::ModuleExpectedName),
    };

    let mut definitions = vec![];
    if stream.next_if(&Lex::LBrace).is_some() {
        while let Some(d) = attributed_definition(stream)? {
            definitions.push(d);
        }
        stream.next_must_be(&Lex::RBrace)?;
        stream.next_if(&Lex::Semicolon);
    } else if stream.next_if(&Lex::Semicolon).is_some() {
        // The module body runs until the next module declaration or the end
        // of the file.
        loop {
            if stream.test_if(&Lex::Module) || module_follows_attributes(stream) {
                break;
            }
            match attributed_definition(stream)? {
                Some(d) => definitions.push(d),
                None => break,
            }
        }
    } else {
        let found = stream.peek().map(|t| t.sym.clone());
        return err!(
            stream.line(),
            ParserError::ExpectedButFound(vec![Lex::LBrace, Lex::Semicolon], found)
        );
    }

    Ok(Some(ModuleDecl {
        line: token.line,
        name: Some(name),
        attributes,
        definitions,
    }))
}

/// Looks past an attribute list to see if it decorates a `module`.
fn module_follows_attributes(stream: &TokenStream) -> bool {
    if !stream.test_if(&Lex::LBracket) {
        return false;
    }
    let mut i = 1;
    while let Some(t) = stream.peek_at(i) {
        if t.sym == Lex::RBracket {
            return stream
                .peek_at(i + 1)
                .map_or(false, |t| t.sym == Lex::Module);
        }
        i += 1;
    }
    false
}

fn attributed_definition(stream: &mut TokenStream) -> ParserResult<Definition> {
    let start = stream.index();
    let attributes = attribute_list(stream)?;
    match definition(stream, attributes)? {
        Some(d) => Ok(Some(d)),
        None if stream.index() != start => {
            let found = stream.peek().map(|t| t.sym.clone());
            err!(
                stream.line(),
                ParserError::ExpectedButFound(
                    vec![Lex::Struct, Lex::Interface, Lex::Enum, Lex::Const],
                    found
                )
            )
        }
        None => Ok(None),
    }
}

fn definition(stream: &mut TokenStream, attributes: Vec<Attribute>) -> ParserResult<Definition> {
    trace!(stream);
    if let Some(s) = struct_def(stream, attributes.clone())? {
        Ok(Some(Definition::Struct(s)))
    } else if let Some(i) = interface_def(stream, attributes.clone())? {
        Ok(Some(Definition::Interface(i)))
    } else if let Some(e) = enum_def(stream, attributes.clone())? {
        Ok(Some(Definition::Enum(e)))
    } else if let Some(c) = const_def(stream, attributes)? {
        Ok(Some(Definition::Const(c)))
    } else {
        Ok(None)
    }
}

fn attribute_list(stream: &mut TokenStream) -> StageResult<Vec<Attribute>> {
    trace!(stream);
    let mut attributes = vec![];
    if stream.next_if(&Lex::LBracket).is_none() {
        return Ok(attributes);
    }

    while let Some((key, line)) = stream.next_if_id() {
        let value = if stream.next_if(&Lex::Assign).is_some() {
            match attribute_value(stream)? {
                Some(v) => v,
                None => return err!(line, ParserError::AttributeExpectedValue(key)),
            }
        } else {
            AttributeValue::Bool(true)
        };
        attributes.push(Attribute { line, key, value });

        if stream.next_if(&Lex::Comma).is_none() {
            break;
        }
    }

    stream.next_must_be(&Lex::RBracket)?;
    Ok(attributes)
}

fn attribute_value(stream: &mut TokenStream) -> ParserResult<AttributeValue> {
    trace!(stream);
    Ok(value_expr(stream)?.and_then(|v| match v {
        ValueExpr::Name(n) => Some(AttributeValue::Name(n)),
        ValueExpr::String(s) => Some(AttributeValue::String(s)),
        ValueExpr::Integer(i) => Some(AttributeValue::Integer(i)),
        ValueExpr::Float(f) => Some(AttributeValue::Float(f)),
        ValueExpr::Bool(b) => Some(AttributeValue::Bool(b)),
        ValueExpr::Default => None,
    }))
}

fn struct_def(stream: &mut TokenStream, attributes: Vec<Attribute>) -> ParserResult<StructDecl> {
    trace!(stream);
    let token = match stream.next_if(&Lex::Struct) {
        Some(token) => token,
        None => return Ok(None),
    };
    let name = identifier_after(stream, &token)?;

    stream.next_must_be(&Lex::LBrace)?;
    let mut body = vec![];
    loop {
        let start = stream.index();
        let member_attributes = attribute_list(stream)?;
        if let Some(e) = enum_def(stream, member_attributes.clone())? {
            body.push(StructMember::Enum(e));
        } else if let Some(c) = const_def(stream, member_attributes.clone())? {
            body.push(StructMember::Const(c));
        } else if let Some(f) = field(stream, member_attributes)? {
            body.push(StructMember::Field(f));
        } else if stream.index() != start {
            return err!(stream.line(), ParserError::ExpectedType);
        } else {
            break;
        }
    }
    stream.next_must_be(&Lex::RBrace)?;
    stream.next_if(&Lex::Semicolon);

    Ok(Some(StructDecl {
        line: token.line,
        name,
        attributes,
        body,
    }))
}

fn field(stream: &mut TokenStream, attributes: Vec<Attribute>) -> ParserResult<FieldDecl> {
    trace!(stream);
    let line = stream.line();
    let ty = match type_spec(stream)? {
        Some(ty) => ty,
        None => return Ok(None),
    };
    let name = match stream.next_if_id() {
        Some((name, _)) => name,
        None => return err!(line, ParserError::ExpectedNameAfterType(ty.to_string())),
    };
    let ordinal = ordinal(stream)?;

    let default = match stream.next_if(&Lex::Assign) {
        Some(token) => match value_expr(stream)? {
            Some(v) => Some(v),
            None => return err!(token.line, ParserError::ExpectedValueAfter(Lex::Assign)),
        },
        None => None,
    };
    stream.next_must_be(&Lex::Semicolon)?;

    Ok(Some(FieldDecl {
        line,
        ty,
        name,
        ordinal,
        default,
        attributes,
    }))
}

fn interface_def(
    stream: &mut TokenStream,
    attributes: Vec<Attribute>,
) -> ParserResult<InterfaceDecl> {
    trace!(stream);
    let token = match stream.next_if(&Lex::Interface) {
        Some(token) => token,
        None => return Ok(None),
    };
    let name = identifier_after(stream, &token)?;

    stream.next_must_be(&Lex::LBrace)?;
    let mut body = vec![];
    loop {
        let start = stream.index();
        let member_attributes = attribute_list(stream)?;
        if let Some(e) = enum_def(stream, member_attributes.clone())? {
            body.push(InterfaceMember::Enum(e));
        } else if let Some(c) = const_def(stream, member_attributes.clone())? {
            body.push(InterfaceMember::Const(c));
        } else if let Some(m) = method(stream, member_attributes)? {
            body.push(InterfaceMember::Method(m));
        } else if stream.index() != start {
            let found = stream.peek().map(|t| t.sym.clone());
            return err!(
                stream.line(),
                ParserError::ExpectedButFound(vec![Lex::Identifier(String::new())], found)
            );
        } else {
            break;
        }
    }
    stream.next_must_be(&Lex::RBrace)?;
    stream.next_if(&Lex::Semicolon);

    Ok(Some(InterfaceDecl {
        line: token.line,
        name,
        attributes,
        body,
    }))
}

fn method(stream: &mut TokenStream, attributes: Vec<Attribute>) -> ParserResult<MethodDecl> {
    trace!(stream);
    let (name, line) = match stream.next_if_id() {
        Some(id) => id,
        None => return Ok(None),
    };
    let ordinal = ordinal(stream)?;

    let parameters = parameter_list(stream)?;
    let response_parameters = match stream.next_if(&Lex::ResponseArrow) {
        Some(_) => Some(parameter_list(stream)?),
        None => None,
    };
    stream.next_must_be(&Lex::Semicolon)?;

    Ok(Some(MethodDecl {
        line,
        name,
        ordinal,
        parameters,
        response_parameters,
        attributes,
    }))
}

fn parameter_list(stream: &mut TokenStream) -> StageResult<Vec<ParameterDecl>> {
    trace!(stream);
    stream.next_must_be(&Lex::LParen)?;
    let mut params = vec![];
    if stream.next_if(&Lex::RParen).is_some() {
        return Ok(params);
    }

    loop {
        params.push(parameter(stream)?);
        if stream.next_if(&Lex::Comma).is_none() {
            break;
        }
    }
    stream.next_must_be(&Lex::RParen)?;
    Ok(params)
}

fn parameter(stream: &mut TokenStream) -> StageResult<ParameterDecl> {
    trace!(stream);
    let attributes = attribute_list(stream)?;
    let line = stream.line();
    let ty = match type_spec(stream)? {
        Some(ty) => ty,
        None => return err!(line, ParserError::ExpectedType),
    };
    let name = match stream.next_if_id() {
        Some((name, _)) => name,
        None => return err!(line, ParserError::ExpectedNameAfterType(ty.to_string())),
    };
    let ordinal = ordinal(stream)?;

    Ok(ParameterDecl {
        line,
        ty,
        name,
        ordinal,
        attributes,
    })
}

fn enum_def(stream: &mut TokenStream, attributes: Vec<Attribute>) -> ParserResult<EnumDecl> {
    trace!(stream);
    let token = match stream.next_if(&Lex::Enum) {
        Some(token) => token,
        None => return Ok(None),
    };
    let name = identifier_after(stream, &token)?;

    stream.next_must_be(&Lex::LBrace)?;
    let mut values = vec![];
    while let Some((name, line)) = stream.next_if_id() {
        let value = match stream.next_if(&Lex::Assign) {
            Some(assign) => match value_expr(stream)? {
                Some(v) => Some(v),
                None => return err!(assign.line, ParserError::ExpectedValueAfter(Lex::Assign)),
            },
            None => None,
        };
        values.push(EnumValueDecl { line, name, value });

        if stream.next_if(&Lex::Comma).is_none() {
            break;
        }
    }
    stream.next_must_be(&Lex::RBrace)?;
    stream.next_if(&Lex::Semicolon);

    Ok(Some(EnumDecl {
        line: token.line,
        name,
        attributes,
        values,
    }))
}

fn const_def(stream: &mut TokenStream, attributes: Vec<Attribute>) -> ParserResult<ConstDecl> {
    trace!(stream);
    let token = match stream.next_if(&Lex::Const) {
        Some(token) => token,
        None => return Ok(None),
    };
    let ty = match type_spec(stream)? {
        Some(ty) => ty,
        None => return err!(token.line, ParserError::ExpectedType),
    };
    let name = match stream.next_if_id() {
        Some((name, _)) => name,
        None => return err!(token.line, ParserError::ExpectedNameAfterType(ty.to_string())),
    };
    let assign = stream.next_must_be(&Lex::Assign)?;
    let value = match value_expr(stream)? {
        Some(v) => v,
        None => return err!(assign.line, ParserError::ExpectedValueAfter(Lex::Assign)),
    };
    stream.next_must_be(&Lex::Semicolon)?;

    Ok(Some(ConstDecl {
        line: token.line,
        ty,
        name,
        value,
        attributes,
    }))
}

fn type_spec(stream: &mut TokenStream) -> ParserResult<TypeSpec> {
    trace!(stream);
    let mut ty = match base_type(stream)? {
        Some(ty) => ty,
        None => return Ok(None),
    };

    loop {
        if stream
            .next_ifn(vec![Lex::LBracket, Lex::RBracket])
            .is_some()
        {
            ty = TypeSpec::Array(Box::new(ty));
        } else if stream.next_if(&Lex::Amp).is_some() {
            ty = TypeSpec::InterfaceRequest(Box::new(ty));
        } else {
            break;
        }
    }

    Ok(Some(ty))
}

fn base_type(stream: &mut TokenStream) -> ParserResult<TypeSpec> {
    trace!(stream);
    if stream.test_ifn(vec![Lex::Identifier("handle".into()), Lex::LAngle])
        && id_is(stream, "handle")
    {
        let (_, line) = stream.next_if_id().unwrap_or_default();
        stream.next_must_be(&Lex::LAngle)?;
        let subtype = match stream.next_if_id() {
            Some((name, line)) => match HandleSubtype::from_name(&name) {
                Some(sub) => sub,
                None => return err!(line, ParserError::InvalidHandleType(name)),
            },
            None => return err!(line, ParserError::ExpectedIdentifierAfter(Lex::LAngle)),
        };
        stream.next_must_be(&Lex::RAngle)?;
        Ok(Some(TypeSpec::Handle(Some(subtype))))
    } else if id_is(stream, "handle") {
        stream.next();
        Ok(Some(TypeSpec::Handle(None)))
    } else if id_is(stream, "array") && stream.peek_at(1).map_or(false, |t| t.sym == Lex::LAngle)
    {
        let (_, line) = stream.next_if_id().unwrap_or_default();
        stream.next_must_be(&Lex::LAngle)?;
        let inner = match type_spec(stream)? {
            Some(ty) => ty,
            None => return err!(line, ParserError::ExpectedType),
        };
        stream.next_must_be(&Lex::RAngle)?;
        Ok(Some(TypeSpec::Array(Box::new(inner))))
    } else {
        Ok(dotted_name(stream)?.map(|(name, _)| TypeSpec::Named(name)))
    }
}

fn id_is(stream: &TokenStream, expected: &str) -> bool {
    match stream.peek() {
        Some(Token {
            sym: Lex::Identifier(id),
            ..
        }) => id == expected,
        _ => false,
    }
}

fn ordinal(stream: &mut TokenStream) -> StageResult<Option<u32>> {
    match stream.next_if(&Lex::Ordinal(String::new())) {
        Some(Token {
            line,
            sym: Lex::Ordinal(digits),
        }) => match digits.parse::<u32>() {
            Ok(n) => Ok(Some(n)),
            Err(_) => err!(line, ParserError::OrdinalOverflow(format!("@{}", digits))),
        },
        _ => Ok(None),
    }
}

fn identifier_after(stream: &mut TokenStream, token: &Token) -> StageResult<String> {
    match stream.next_if_id() {
        Some((id, _)) => Ok(id),
        None => err!(
            token.line,
            ParserError::ExpectedIdentifierAfter(token.sym.clone())
        ),
    }
}

fn dotted_name(stream: &mut TokenStream) -> ParserResult<(String, u32)> {
    trace!(stream);
    let (mut name, line) = match stream.next_if_id() {
        Some(id) => id,
        None => return Ok(None),
    };

    while let Some(dot) = stream.next_if(&Lex::Dot) {
        match stream.next_if_id() {
            Some((part, _)) => {
                name.push('.');
                name.push_str(&part);
            }
            None => return err!(dot.line, ParserError::ExpectedIdentifierAfter(Lex::Dot)),
        }
    }

    Ok(Some((name, line)))
}

fn value_expr(stream: &mut TokenStream) -> ParserResult<ValueExpr> {
    trace!(stream);
    let sign = if let Some(t) = stream.next_if(&Lex::Minus) {
        Some((t, "-"))
    } else {
        stream.next_if(&Lex::Plus).map(|t| (t, ""))
    };

    if let Some((token, sign)) = sign {
        return match stream.next() {
            Some(Token {
                sym: Lex::IntConst(i),
                ..
            }) => Ok(Some(ValueExpr::Integer(format!("{}{}", sign, i)))),
            Some(Token {
                sym: Lex::FloatConst(f),
                ..
            }) => Ok(Some(ValueExpr::Float(format!("{}{}", sign, f)))),
            _ => err!(token.line, ParserError::ExpectedValueAfter(token.sym)),
        };
    }

    let value = match stream.peek().map(|t| t.sym.clone()) {
        Some(Lex::IntConst(i)) => ValueExpr::Integer(i),
        Some(Lex::FloatConst(f)) => ValueExpr::Float(f),
        Some(Lex::StringLiteral(s)) => ValueExpr::String(s),
        Some(Lex::True) => ValueExpr::Bool(true),
        Some(Lex::False) => ValueExpr::Bool(false),
        Some(Lex::Default) => ValueExpr::Default,
        Some(Lex::Identifier(_)) => {
            return Ok(dotted_name(stream)?.map(|(name, _)| ValueExpr::Name(name)))
        }
        _ => return Ok(None),
    };
    stream.next();
    Ok(Some(value))
}
