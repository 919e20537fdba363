#[cfg(test)]
mod tests {
    use crate::compiler::lexer::tokens::{Lex, Token};
    use crate::compiler::lexer::LexerError;
    use Lex::*;

    use super::super::lexer::*;

    fn tokens_of(text: &str) -> Vec<Token> {
        Lexer::new(text)
            .tokenize()
            .into_iter()
            .collect::<Result<_, _>>()
            .expect("Expected valid tokens")
    }

    #[test]
    fn test_integer() {
        for text in ["5", "0", "0x1F", "123456789012345678901234567890"].iter() {
            let tokens = tokens_of(text);
            assert_eq!(tokens, vec![Token::new(1, IntConst((*text).into()))]);
        }
    }

    #[test]
    fn test_float() {
        for text in ["1.5", "0.25", "1e10", "2.5E-3"].iter() {
            let tokens = tokens_of(text);
            assert_eq!(tokens, vec![Token::new(1, FloatConst((*text).into()))]);
        }
    }

    #[test]
    fn test_invalid_number() {
        let tokens = Lexer::new("12abc").tokenize();
        assert_eq!(
            tokens.last().unwrap().clone().unwrap_err().take(),
            (1, LexerError::InvalidNumber("12abc".into()))
        );
    }

    #[test]
    fn test_string_literal() {
        let tokens = tokens_of("\"te\\\"xt\"");
        assert_eq!(tokens, vec![Token::new(1, StringLiteral("te\\\"xt".into()))]);
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = Lexer::new("\n\"abc\n\"").tokenize();
        assert_eq!(
            tokens.last().unwrap().clone().unwrap_err().take(),
            (2, LexerError::UnterminatedString)
        );
    }

    #[test]
    fn test_identifier() {
        for text in ["x", "y", "x_5", "_private", "imports", "structure"].iter() {
            let tokens = tokens_of(text);
            assert_eq!(tokens, vec![Token::new(1, Identifier((*text).into()))]);
        }
    }

    #[test]
    fn test_keywords() {
        for (text, expected) in vec![
            ("import", Import),
            ("module", Module),
            ("struct", Struct),
            ("interface", Interface),
            ("enum", Enum),
            ("const", Const),
            ("true", True),
            ("false", False),
            ("default", Default),
        ] {
            let tokens = tokens_of(text);
            assert_eq!(tokens, vec![Token::new(1, expected)]);
        }
    }

    #[test]
    fn test_ordinal() {
        let tokens = tokens_of("x@12");
        assert_eq!(
            tokens,
            vec![
                Token::new(1, Identifier("x".into())),
                Token::new(1, Ordinal("12".into()))
            ]
        );

        let tokens = Lexer::new("x@;").tokenize();
        assert_eq!(
            tokens.last().unwrap().clone().unwrap_err().take(),
            (1, LexerError::ExpectedOrdinalDigits)
        );
    }

    #[test]
    fn test_operators() {
        let tokens = tokens_of("{ } [ ] ( ) < > ; , = & . => - +");
        let syms: Vec<Lex> = tokens.into_iter().map(|t| t.sym).collect();
        assert_eq!(
            syms,
            vec![
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
                Plus
            ]
        );
    }

    #[test]
    fn test_comments_and_lines() {
        let text = "// leading comment\nstruct /* inline\n comment */ Foo\n{";
        let tokens = tokens_of(text);
        assert_eq!(
            tokens,
            vec![
                Token::new(2, Struct),
                Token::new(3, Identifier("Foo".into())),
                Token::new(4, LBrace),
            ]
        );
    }

    #[test]
    fn test_unterminated_comment() {
        let tokens = Lexer::new("struct /* never closed").tokenize();
        assert_eq!(
            tokens.last().unwrap().clone().unwrap_err().take(),
            (1, LexerError::UnterminatedComment)
        );
    }

    #[test]
    fn test_illegal_character() {
        let tokens = Lexer::new("int32 x$;").tokenize();
        assert_eq!(tokens.len(), 3);
        assert_eq!(
            tokens[2].clone().unwrap_err().take(),
            (1, LexerError::Locked(Some('$')))
        );
    }

    #[test]
    fn test_field_declaration() {
        let tokens = tokens_of("array<int32>[] values@3 = default;");
        let syms: Vec<Lex> = tokens.into_iter().map(|t| t.sym).collect();
        assert_eq!(
            syms,
            vec![
                Identifier("array".into()),
                LAngle,
                Identifier("int32".into()),
                RAngle,
                LBracket,
                RBracket,
                Identifier("values".into()),
                Ordinal("3".into()),
                Assign,
                Default,
                Semicolon,
            ]
        );
    }
}
