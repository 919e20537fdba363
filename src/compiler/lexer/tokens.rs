#[derive(Debug, Clone, PartialEq)]
pub enum Lex {
    Identifier(String),
    IntConst(String),
    FloatConst(String),
    StringLiteral(String),
    /// The digits following an `@`.  Kept as text so that the parser can
    /// report values which do not fit in an ordinal.
    Ordinal(String),
    Import,
    Module,
    Struct,
    Interface,
    Enum,
    Const,
    True,
    False,
    Default,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    LAngle,
    RAngle,
    Semicolon,
    Comma,
    Assign,
    Amp,
    Dot,
    ResponseArrow,
    Minus,
    Plus,
}

impl Lex {
    pub fn get_str(&self) -> Option<&str> {
        match self {
            Lex::Identifier(s)
            | Lex::IntConst(s)
            | Lex::FloatConst(s)
            | Lex::StringLiteral(s)
            | Lex::Ordinal(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Lex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Lex::*;
        match self {
            Identifier(id) => write!(f, "identifier {}", id),
            IntConst(i) => write!(f, "integer literal {}", i),
            FloatConst(x) => write!(f, "float literal {}", x),
            StringLiteral(s) => write!(f, "literal \"{}\"", s),
            Ordinal(o) => write!(f, "ordinal @{}", o),
            Import => f.write_str("import"),
            Module => f.write_str("module"),
            Struct => f.write_str("struct"),
            Interface => f.write_str("interface"),
            Enum => f.write_str("enum"),
            Const => f.write_str("const"),
            True => f.write_str("true"),
            False => f.write_str("false"),
            Default => f.write_str("default"),
            LBrace => f.write_str("{"),
            RBrace => f.write_str("}"),
            LBracket => f.write_str("["),
            RBracket => f.write_str("]"),
            LParen => f.write_str("("),
            RParen => f.write_str(")"),
            LAngle => f.write_str("<"),
            RAngle => f.write_str(">"),
            Semicolon => f.write_str(";"),
            Comma => f.write_str(","),
            Assign => f.write_str("="),
            Amp => f.write_str("&"),
            Dot => f.write_str("."),
            ResponseArrow => f.write_str("=>"),
            Minus => f.write_str("-"),
            Plus => f.write_str("+"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The line the token starts on, counting from 1
    pub line: u32,

    /// The value of the token
    pub sym: Lex,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}: {}", self.line, self.sym)
    }
}

impl Token {
    pub fn new(line: u32, sym: Lex) -> Token {
        Token { line, sym }
    }

    /// Compares only the kind of token, ignoring any value it carries.  So
    /// `Identifier("a")` matches `Identifier("b")`.
    pub fn token_eq(&self, a: &Lex) -> bool {
        std::mem::discriminant(&self.sym) == std::mem::discriminant(a)
    }
}
