// Token - a type which captures the different types of tokens and which is output
// by tokenize
use log::trace;

use super::LexerResult;
use super::{
    tokens::{Lex, Token},
    LexerError,
};
use Lex::*;

struct LexerBranch<'a> {
    lexer: &'a mut Lexer,
    index: usize,
}

impl<'a> LexerBranch<'a> {
    fn from(l: &'a mut Lexer) -> LexerBranch<'a> {
        LexerBranch {
            index: l.index,
            lexer: l,
        }
    }

    /// Merges this branch back into it's source Lexer.  Merging has the affect
    /// of accepting the current branch as correct and updating the source lexer
    /// to the match the cursor state of the branch.  Returns the text that was
    /// consumed by the branch and the line that text started on.
    fn merge(mut self) -> Option<(String, u32)> {
        let line = self.lexer.line;
        let cut = self.cut()?;
        self.lexer.line += cut.chars().filter(|c| *c == '\n').count() as u32;
        self.lexer.index = self.index;
        Some((cut, line))
    }

    /// Cuts a string from the current branch from the source lexer's cursor
    /// up to where the branch cursor currently is.  This will NOT update the
    /// source.  That must be done with `merge`.
    fn cut(&self) -> Option<String> {
        let start = self.lexer.index;
        let stop = self.index;
        if start >= stop {
            None
        } else {
            Some(self.lexer.chars[start..stop].iter().collect())
        }
    }

    /// Advances the cursor one character and returns the character that was
    /// pointed to by the cursor before the advance.  Returns None if the cursor
    /// was already at the end of the stream.
    fn next(&mut self) -> Option<char> {
        if self.index < self.lexer.chars.len() {
            let c = self.lexer.chars[self.index];
            self.index += 1;
            Some(c)
        } else {
            None
        }
    }

    /// Advances the cursor one character, if the next character matches the given
    /// test character.
    fn next_if(&mut self, t: char) -> bool {
        if self.peek() == Some(t) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Will advance the cursor if the stream after the cursor starts with the
    /// given test string.  If the remaining stream does not start with the
    /// test string then the cursor is not advanced.
    fn next_if_word(&mut self, t: &str) -> bool {
        if self.peek_ifn(t) {
            self.index += t.chars().count();
            true
        } else {
            false
        }
    }

    fn next_if_one_of<'s>(&mut self, words: &[&'s str]) -> Option<&'s str> {
        for w in words {
            if self.next_if_word(w) {
                return Some(w);
            }
        }

        None
    }

    /// Advances the cursor past every character which satisfies `test` and
    /// returns how many characters were consumed.
    fn next_while<F: Fn(char) -> bool>(&mut self, test: F) -> usize {
        let start = self.index;
        while self.peek().map_or(false, |c| test(c)) {
            self.index += 1;
        }
        self.index - start
    }

    /// Returns the character pointed at by the cursor which is the next
    /// character in the stream.
    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, i: usize) -> Option<char> {
        self.lexer.chars.get(self.index + i).copied()
    }

    /// Checks if the character stream from the current cursor starts with
    /// the given test string, without advancing the cursor.
    fn peek_ifn(&self, t: &str) -> bool {
        t.chars()
            .enumerate()
            .all(|(i, tc)| self.peek_at(i) == Some(tc))
    }
}

pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: u32,
}

impl Lexer {
    pub fn new(text: &str) -> Lexer {
        Lexer {
            chars: text.chars().collect(),
            index: 0,
            line: 1,
        }
    }

    /// Converts the source text to a vector of tokens.  Tokenizing stops at
    /// the first error, which is the last element of the returned vector.
    pub fn tokenize(&mut self) -> Vec<LexerResult<Token>> {
        let mut tokens = vec![];

        while self.index < self.chars.len() {
            // Consume any whitespace before attempting to parse the next token
            self.consume_whitespace();
            if self.index >= self.chars.len() {
                break;
            }

            // Record the current index position, so that we can see if the lexer
            // has advanced
            let prev_index = self.index;

            // Skip over any comments in the code
            match self.consume_comment() {
                Ok(true) => continue,
                Ok(false) => (),
                Err(err) => {
                    tokens.push(Err(err));
                    break;
                }
            }

            match self.next_token() {
                Ok(Some(t)) => {
                    trace!("{}", t);
                    tokens.push(Ok(t))
                }
                Ok(None) => (),
                Err(err) => {
                    tokens.push(Err(err));
                    break;
                }
            }

            // Can no longer consume the input text
            if prev_index == self.index {
                tokens.push(err!(self.line, LexerError::Locked(self.current_char())));
                break;
            }
        }

        tokens
    }

    /// Attempt to parse the token which immediately follows from where the lexer
    /// cursor is currently pointing.
    fn next_token(&mut self) -> LexerResult<Option<Token>> {
        self.consume_keyword()
            .transpose()
            .or_else(|| self.consume_number().transpose())
            .or_else(|| self.consume_string_literal().transpose())
            .or_else(|| self.consume_ordinal().transpose())
            .or_else(|| self.consume_identifier().transpose())
            .or_else(|| self.consume_operator().transpose())
            .transpose()
    }

    fn consume_whitespace(&mut self) {
        while self.index < self.chars.len() && self.chars[self.index].is_whitespace() {
            if self.chars[self.index] == '\n' {
                self.line += 1;
            }
            self.index += 1;
        }
    }

    /// Skips a line or block comment.  Returns true if a comment was consumed.
    fn consume_comment(&mut self) -> LexerResult<bool> {
        let line = self.line;
        let mut branch = LexerBranch::from(self);
        if branch.next_if_word("//") {
            branch.next_while(|c| c != '\n');
            branch.merge();
            Ok(true)
        } else if branch.next_if_word("/*") {
            while !branch.next_if_word("*/") {
                if branch.next().is_none() {
                    return err!(line, LexerError::UnterminatedComment);
                }
            }
            branch.merge();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn consume_keyword(&mut self) -> LexerResult<Option<Token>> {
        let mut branch = LexerBranch::from(self);

        let keywords = [
            "import",
            "module",
            "struct",
            "interface",
            "enum",
            "const",
            "true",
            "false",
            "default",
        ];

        Ok(match branch.next_if_one_of(&keywords) {
            Some(w) if branch.peek().map_or(true, Self::is_delimiter) => {
                let sym = match w {
                    "import" => Import,
                    "module" => Module,
                    "struct" => Struct,
                    "interface" => Interface,
                    "enum" => Enum,
                    "const" => Const,
                    "true" => True,
                    "false" => False,
                    "default" => Default,
                    _ => unreachable!("Matched a keyword which does not exist: {}", w),
                };
                branch.merge().map(|(_, line)| Token::new(line, sym))
            }
            _ => None,
        })
    }

    fn consume_number(&mut self) -> LexerResult<Option<Token>> {
        let line = self.line;
        let mut branch = LexerBranch::from(self);

        if !branch.peek().map_or(false, |c| c.is_ascii_digit()) {
            return Ok(None);
        }

        let is_float = if branch.next_if_word("0x") || branch.next_if_word("0X") {
            if branch.next_while(|c| c.is_ascii_hexdigit()) == 0 {
                return err!(line, LexerError::InvalidNumber(branch.cut().unwrap_or_default()));
            }
            false
        } else {
            branch.next_while(|c| c.is_ascii_digit());
            let mut is_float = false;
            if branch.peek() == Some('.') && branch.peek_at(1).map_or(false, |c| c.is_ascii_digit())
            {
                branch.next();
                branch.next_while(|c| c.is_ascii_digit());
                is_float = true;
            }
            if branch.peek() == Some('e') || branch.peek() == Some('E') {
                branch.next();
                if !branch.next_if('+') {
                    branch.next_if('-');
                }
                if branch.next_while(|c| c.is_ascii_digit()) == 0 {
                    return err!(line, LexerError::InvalidNumber(branch.cut().unwrap_or_default()));
                }
                is_float = true;
            }
            is_float
        };

        // The number must be followed by a delimiter; `12abc` is not a number
        // followed by an identifier.
        if !branch.peek().map_or(true, Self::is_delimiter) {
            branch.next_while(|c| !Self::is_delimiter(c));
            return err!(line, LexerError::InvalidNumber(branch.cut().unwrap_or_default()));
        }

        Ok(branch.merge().map(|(text, line)| {
            if is_float {
                Token::new(line, FloatConst(text))
            } else {
                Token::new(line, IntConst(text))
            }
        }))
    }

    fn consume_string_literal(&mut self) -> LexerResult<Option<Token>> {
        let line = self.line;
        let mut branch = LexerBranch::from(self);
        if !branch.next_if('"') {
            return Ok(None);
        }

        loop {
            match branch.next() {
                None | Some('\n') => return err!(line, LexerError::UnterminatedString),
                Some('"') => break,
                Some('\\') => match branch.next() {
                    Some(c) if Self::is_escape_code(c) => (),
                    Some(c) => return err!(line, LexerError::InvalidEscapeSequence(c)),
                    None => return err!(line, LexerError::ExpectedEscapeCharacter),
                },
                Some(_) => (),
            }
        }

        // Remove the quotes from the string; escape sequences are kept as
        // written so emitters can reproduce the literal verbatim.
        Ok(branch.merge().map(|(mut s, line)| {
            s.remove(0);
            s.pop();
            Token::new(line, StringLiteral(s))
        }))
    }

    fn consume_ordinal(&mut self) -> LexerResult<Option<Token>> {
        let line = self.line;
        let mut branch = LexerBranch::from(self);
        if !branch.next_if('@') {
            return Ok(None);
        }

        if branch.next_while(|c| c.is_ascii_digit()) == 0 {
            return err!(line, LexerError::ExpectedOrdinalDigits);
        }

        Ok(branch
            .merge()
            .map(|(text, line)| Token::new(line, Ordinal(text[1..].into()))))
    }

    fn consume_identifier(&mut self) -> LexerResult<Option<Token>> {
        let mut branch = LexerBranch::from(self);
        if branch
            .peek()
            .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        {
            branch.next_while(|c| c.is_ascii_alphanumeric() || c == '_');
        }

        Ok(branch
            .merge()
            .map(|(id, line)| Token::new(line, Identifier(id))))
    }

    fn consume_operator(&mut self) -> LexerResult<Option<Token>> {
        let line = self.line;
        let mut branch = LexerBranch::from(self);
        // Longer operators must come first so that `=>` is not lexed as `=`.
        let operators = [
            ("=>", ResponseArrow),
            ("{", LBrace),
            ("}", RBrace),
            ("[", LBracket),
            ("]", RBracket),
            ("(", LParen),
            (")", RParen),
            ("<", LAngle),
            (">", RAngle),
            (";", Semicolon),
            (",", Comma),
            ("=", Assign),
            ("&", Amp),
            (".", Dot),
            ("-", Minus),
            ("+", Plus),
        ];

        for (op, sym) in operators.iter() {
            if branch.next_if_word(op) {
                branch.merge();
                return Ok(Some(Token::new(line, sym.clone())));
            }
        }

        Ok(None)
    }

    /// Returns the character that the lexer cursor is currently pointing to.
    fn current_char(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    /// Returns true if the given character ends a word: anything that cannot
    /// appear inside an identifier.
    fn is_delimiter(c: char) -> bool {
        !(c.is_ascii_alphanumeric() || c == '_')
    }

    /// Returns true if the character is a valid code for an escape sequence
    fn is_escape_code(c: char) -> bool {
        matches!(c, 'n' | 'r' | 't' | '"' | '\'' | '0' | '\\')
    }
}
