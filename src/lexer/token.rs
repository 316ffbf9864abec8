use std::fmt;

use phf::phf_map;

pub static KEYWORDS: phf::Map<&str, TokenKind> = phf_map! {
    "begin" => TokenKind::Begin,
    "module" => TokenKind::Module,
    "constant" => TokenKind::Constant,
    "procedure" => TokenKind::Procedure,
    "is" => TokenKind::Is,
    "if" => TokenKind::If,
    "then" => TokenKind::Then,
    "else" => TokenKind::Else,
    "elsif" => TokenKind::Elsif,
    "while" => TokenKind::While,
    "loop" => TokenKind::Loop,
    "float" => TokenKind::Float,
    "real" => TokenKind::Float,
    "integer" => TokenKind::Integer,
    "char" => TokenKind::Char,
    "get" => TokenKind::Get,
    "put" => TokenKind::Put,
    "putln" => TokenKind::Putln,
    "end" => TokenKind::End,
    "in" => TokenKind::In,
    "out" => TokenKind::Out,
    "inout" => TokenKind::InOut,
    "not" => TokenKind::Not,
    "or" => TokenKind::AddOp,
    "and" => TokenKind::MulOp,
    "rem" => TokenKind::MulOp,
    "mod" => TokenKind::MulOp,
};

pub static TWO_SYMBOLS_TOKENS: phf::Map<&str, TokenKind> = phf_map! {
    ":=" => TokenKind::Assign,
    "<=" => TokenKind::RelOp,
    ">=" => TokenKind::RelOp,
    "/=" => TokenKind::RelOp,
};

pub static ONE_SYMBOL_TOKENS: phf::Map<char, TokenKind> = phf_map! {
    '+' => TokenKind::AddOp,
    '-' => TokenKind::AddOp,
    '*' => TokenKind::MulOp,
    '/' => TokenKind::MulOp,
    '=' => TokenKind::RelOp,
    '<' => TokenKind::RelOp,
    '>' => TokenKind::RelOp,
    '(' => TokenKind::LeftParen,
    ')' => TokenKind::RightParen,
    ',' => TokenKind::Comma,
    ':' => TokenKind::Colon,
    ';' => TokenKind::SemiColon,
    '.' => TokenKind::Period,
};

/// Identifiers longer than this are rejected by the lexer.
pub const MAX_IDENT_LEN: usize = 17;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Begin,
    Module,
    Constant,
    Procedure,
    Is,
    If,
    Then,
    Else,
    Elsif,
    While,
    Loop,
    Float,
    Integer,
    Char,
    Get,
    Put,
    Putln,
    End,
    In,
    Out,
    InOut,
    Not,

    RelOp,
    AddOp,
    MulOp,
    Assign,

    LeftParen,
    RightParen,
    Comma,
    Colon,
    SemiColon,
    Period,

    Num,
    Literal,
    Ident,

    Eof,
    Unknown,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Begin => "begin",
            TokenKind::Module => "module",
            TokenKind::Constant => "constant",
            TokenKind::Procedure => "procedure",
            TokenKind::Is => "is",
            TokenKind::If => "if",
            TokenKind::Then => "then",
            TokenKind::Else => "else",
            TokenKind::Elsif => "elsif",
            TokenKind::While => "while",
            TokenKind::Loop => "loop",
            TokenKind::Float => "float",
            TokenKind::Integer => "integer",
            TokenKind::Char => "char",
            TokenKind::Get => "get",
            TokenKind::Put => "put",
            TokenKind::Putln => "putln",
            TokenKind::End => "end",
            TokenKind::In => "in",
            TokenKind::Out => "out",
            TokenKind::InOut => "inout",
            TokenKind::Not => "not",
            TokenKind::RelOp => "relational operator",
            TokenKind::AddOp => "adding operator",
            TokenKind::MulOp => "multiplying operator",
            TokenKind::Assign => ":=",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::SemiColon => ";",
            TokenKind::Period => ".",
            TokenKind::Num => "number",
            TokenKind::Literal => "string literal",
            TokenKind::Ident => "identifier",
            TokenKind::Eof => "end of file",
            TokenKind::Unknown => "unknown token",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub value: Option<Value>,
    pub line: usize,
}

impl Token {
    pub fn eof(line: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            value: None,
            line,
        }
    }

    /// What a diagnostic should print for this token.
    pub fn describe(&self) -> String {
        if self.lexeme.is_empty() {
            self.kind.to_string()
        } else {
            self.lexeme.clone()
        }
    }
}
