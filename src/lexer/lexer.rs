use crate::error::{Diagnostic, LexicalError};

use super::{
    token::{KEYWORDS, MAX_IDENT_LEN, ONE_SYMBOL_TOKENS, TWO_SYMBOLS_TOKENS},
    Token, TokenKind, Value,
};

/// Pull-based token source. Each call to [`Lexer::next_token`] recognizes
/// exactly one token; lexical errors are recorded and skipped over.
#[derive(Debug)]
pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            line: 1,
            diagnostics: vec![],
        }
    }

    /// Collects every token up to and including `Eof`.
    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = vec![];
        loop {
            let token = lexer.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn bump(&mut self) {
        if self.peek() == Some('\n') {
            self.line += 1;
        }
        self.index += 1;
    }

    fn error(&mut self, error: LexicalError) {
        self.diagnostics.push(Diagnostic::new(self.line, error));
    }

    fn new_token(&self, kind: TokenKind, lexeme: String, value: Option<Value>) -> Token {
        Token {
            kind,
            lexeme,
            value,
            line: self.line,
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.bump(),
                Some('-') if self.peek_next() == Some('-') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_trivia();
            let Some(c) = self.peek() else {
                return Token::eof(self.line);
            };

            let token = if c.is_ascii_alphabetic() {
                Some(self.parse_identifier())
            } else if c.is_ascii_digit() {
                self.parse_number()
            } else if c == '"' {
                Some(self.parse_literal())
            } else {
                Some(self.parse_symbol(c))
            };

            if let Some(token) = token {
                return token;
            }
        }
    }

    fn parse_identifier(&mut self) -> Token {
        let s: String = self.chars[self.index..]
            .iter()
            .take_while(|&&c| c.is_ascii_alphanumeric() || c == '_')
            .collect();
        self.index += s.len();

        let lower = s.to_ascii_lowercase();
        let (kind, lexeme) = match KEYWORDS.get(lower.as_str()) {
            // "real" is spelled "float" from here on
            Some(TokenKind::Float) => (TokenKind::Float, "float".to_string()),
            Some(kind) => (*kind, lower),
            None => (TokenKind::Ident, s),
        };

        if lexeme.len() > MAX_IDENT_LEN {
            self.error(LexicalError::IdentTooLong(lexeme.clone()));
            return self.new_token(TokenKind::Unknown, lexeme, None);
        }
        self.new_token(kind, lexeme, None)
    }

    /// Returns `None` when a malformed number was skipped.
    fn parse_number(&mut self) -> Option<Token> {
        let mut s = String::new();
        let mut is_float = false;

        while let Some(c) = self.peek() {
            if c == '.' {
                if is_float {
                    while let Some(c) = self.peek().filter(|c| c.is_ascii_digit() || *c == '.') {
                        s.push(c);
                        self.index += 1;
                    }
                    self.error(LexicalError::MultipleDecimalPoints(s));
                    return None;
                }
                is_float = true;
            } else if !c.is_ascii_digit() {
                break;
            }
            s.push(c);
            self.index += 1;
        }

        if s.ends_with('.') {
            self.error(LexicalError::TrailingDecimalPoint(s));
            return None;
        }

        let value = if is_float {
            s.parse().ok().map(Value::Float)
        } else {
            s.parse().ok().map(Value::Int)
        };
        if value.is_none() {
            self.error(LexicalError::NumberOutOfRange(s.clone()));
            return Some(self.new_token(TokenKind::Unknown, s, None));
        }
        Some(self.new_token(TokenKind::Num, s, value))
    }

    /// The lexeme keeps its surrounding quotes.
    fn parse_literal(&mut self) -> Token {
        let mut s = String::from('"');
        self.index += 1;

        loop {
            match self.peek() {
                Some('"') => {
                    s.push('"');
                    self.index += 1;
                    return self.new_token(TokenKind::Literal, s, None);
                }
                Some('\n') | None => {
                    self.error(LexicalError::UnterminatedString(s.clone()));
                    return self.new_token(TokenKind::Unknown, s, None);
                }
                Some(c) => {
                    s.push(c);
                    self.index += 1;
                }
            }
        }
    }

    fn parse_symbol(&mut self, c: char) -> Token {
        if let Some(next) = self.peek_next() {
            let s: String = [c, next].iter().collect();
            if let Some(kind) = TWO_SYMBOLS_TOKENS.get(s.as_str()) {
                self.index += 2;
                return self.new_token(*kind, s, None);
            }
        }

        self.index += 1;
        if let Some(kind) = ONE_SYMBOL_TOKENS.get(&c) {
            self.new_token(*kind, c.to_string(), None)
        } else {
            self.error(LexicalError::UnknownSymbol(c));
            self.new_token(TokenKind::Unknown, c.to_string(), None)
        }
    }
}
