//! Error types shared by every stage of the pipeline.
//!
//! Translation never aborts the process: problems in the source are collected
//! as [`Diagnostic`]s and handed back to the caller, the only fatal one being
//! a duplicate declaration, which stops translation early.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::lexer::TokenKind;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum LexicalError {
    #[error("identifier must be less than 18 characters: {0}")]
    IdentTooLong(String),
    #[error("unknown symbol: {0}")]
    UnknownSymbol(char),
    #[error("unterminated string literal: {0}")]
    UnterminatedString(String),
    #[error("multiple decimal points in number: {0}")]
    MultipleDecimalPoints(String),
    #[error("number cannot end with a decimal point: {0}")]
    TrailingDecimalPoint(String),
    #[error("number out of range: {0}")]
    NumberOutOfRange(String),
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum DiagnosticKind {
    #[error(transparent)]
    Lexical(#[from] LexicalError),

    #[error("expecting: {expected}, found {found}")]
    Expected { expected: TokenKind, found: String },

    #[error("undeclared identifier: {name} at depth {depth}")]
    Undeclared { name: String, depth: usize },

    #[error("duplicate identifier: {name} at depth {depth}")]
    Duplicate { name: String, depth: usize },

    #[error("expecting integer, float, char, or constant, found {found}")]
    InvalidTypeMark { found: String },

    #[error("expecting identifier, number, '(', 'not', or sign operator, found {found}")]
    ExpectedOperand { found: String },

    #[error("{name} cannot be used as a variable")]
    NotAVariable { name: String },

    #[error("procedure {expected} is closed by end {found}")]
    NameMismatch { expected: String, found: String },

    #[error("unused tokens!")]
    UnusedTokens,
}

#[derive(Clone, Debug, PartialEq, Error)]
#[error("{line}: Error: {kind}")]
pub struct Diagnostic {
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(line: usize, kind: impl Into<DiagnosticKind>) -> Self {
        Self {
            line,
            kind: kind.into(),
        }
    }

    /// Fatal diagnostics stop translation on the spot.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, DiagnosticKind::Duplicate { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum TacError {
    #[error("malformed three address code: {0}")]
    Malformed(String),

    #[error("unknown operator in three address code: {0}")]
    UnknownOperator(String),
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("could not open file {}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("syntax errors found!")]
    Rejected(Vec<Diagnostic>),

    #[error(transparent)]
    Tac(#[from] TacError),
}
