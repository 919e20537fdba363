use super::ParserError;
use crate::compiler::lexer::tokens::{Lex, Token};
use crate::compiler::CompilerError;

pub struct TokenStream<'a> {
    tokens: &'a [Token],
    index: usize,
}

impl<'a> TokenStream<'a> {
    pub fn new(tokens: &'a [Token]) -> TokenStream<'a> {
        TokenStream { tokens, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn next(&mut self) -> Option<Token> {
        if self.index >= self.tokens.len() {
            None
        } else {
            self.index += 1;
            Some(self.tokens[self.index - 1].clone())
        }
    }

    pub fn next_if(&mut self, test: &Lex) -> Option<Token> {
        if self.test_if(test) {
            self.next()
        } else {
            None
        }
    }

    /// If the next token is an identifier, consume it and return its name
    /// and line.
    pub fn next_if_id(&mut self) -> Option<(String, u32)> {
        match self.peek() {
            Some(Token {
                line,
                sym: Lex::Identifier(id),
            }) => {
                let found = (id.clone(), *line);
                self.index += 1;
                Some(found)
            }
            _ => None,
        }
    }

    pub fn next_must_be(&mut self, test: &Lex) -> Result<Token, CompilerError<ParserError>> {
        match self.peek() {
            Some(t) => {
                let (line, found) = (t.line, t.sym.clone());
                match self.next_if(test) {
                    Some(t) => Ok(t),
                    None => err!(
                        line,
                        ParserError::ExpectedButFound(vec![test.clone()], Some(found))
                    ),
                }
            }
            None => err!(
                self.line(),
                ParserError::ExpectedButFound(vec![test.clone()], None)
            ),
        }
    }

    pub fn next_ifn(&mut self, test: Vec<Lex>) -> Option<Vec<Token>> {
        let end = self.index + test.len();
        if self.test_ifn(test) {
            let v: Vec<Token> = self.tokens[self.index..end].into();
            self.index = end;
            Some(v)
        } else {
            None
        }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    pub fn peek_at(&self, i: usize) -> Option<&Token> {
        self.tokens.get(self.index + i)
    }

    /// The line of the next token.  At the end of the stream this is the
    /// line of the last token, so errors about a missing token point at the
    /// end of the file.
    pub fn line(&self) -> u32 {
        self.peek()
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    pub fn test_if(&self, test: &Lex) -> bool {
        match self.peek() {
            None => false,
            Some(t) => t.token_eq(test),
        }
    }

    pub fn test_ifn(&self, test: Vec<Lex>) -> bool {
        test.iter().enumerate().all(|(i, lex)| match self.peek_at(i) {
            None => false,
            Some(token) => token.token_eq(lex),
        })
    }
}

#[cfg(test)]
mod test_tokenstream {
    use super::TokenStream;
    use crate::compiler::lexer::tokens::{Lex, Token};
    use crate::compiler::parser::ParserError;
    use crate::compiler::Lexer;

    fn tokenize(text: &str) -> Vec<Token> {
        Lexer::new(text)
            .tokenize()
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_peek() {
        let tokens = tokenize("struct Foo {");
        let ts = TokenStream::new(&tokens);
        assert_eq!(*ts.peek().unwrap(), Token::new(1, Lex::Struct));
        assert_eq!(
            *ts.peek_at(1).unwrap(),
            Token::new(1, Lex::Identifier("Foo".into()))
        );
        assert_eq!(ts.peek_at(3), None);
    }

    #[test]
    fn test_empty_stream() {
        let tokens = vec![];
        let mut ts = TokenStream::new(&tokens);
        assert!(ts.peek().is_none());
        assert!(ts.next().is_none());
        assert_eq!(ts.line(), 1);
    }

    #[test]
    fn test_next_if() {
        let tokens = tokenize("struct Foo {");
        let mut ts = TokenStream::new(&tokens);
        assert_eq!(ts.next_if(&Lex::Enum), None);
        assert_eq!(ts.next_if(&Lex::Struct), Some(Token::new(1, Lex::Struct)));
        assert_eq!(ts.next_if_id(), Some(("Foo".into(), 1)));
        assert_eq!(ts.next_if_id(), None);
        assert_eq!(ts.index(), 2);
    }

    #[test]
    fn test_next_ifn() {
        let tokens = tokenize("int32[] x;");
        let mut ts = TokenStream::new(&tokens);
        assert!(ts.next_ifn(vec![Lex::LBracket, Lex::RBracket]).is_none());
        ts.next();
        let brackets = ts.next_ifn(vec![Lex::LBracket, Lex::RBracket]).unwrap();
        assert_eq!(brackets.len(), 2);
        assert!(ts.test_if(&Lex::Identifier(String::new())));
    }

    #[test]
    fn test_next_must_be_reports_found_token() {
        let tokens = tokenize("struct\nFoo");
        let mut ts = TokenStream::new(&tokens);
        ts.next();
        let err = ts.next_must_be(&Lex::LBrace).unwrap_err();
        assert_eq!(
            err.take(),
            (
                2,
                ParserError::ExpectedButFound(
                    vec![Lex::LBrace],
                    Some(Lex::Identifier("Foo".into()))
                )
            )
        );

        ts.next();
        let err = ts.next_must_be(&Lex::LBrace).unwrap_err();
        assert_eq!(
            err.take(),
            (2, ParserError::ExpectedButFound(vec![Lex::LBrace], None))
        );
    }
}
