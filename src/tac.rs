//! Three address code.
//!
//! Instructions are built as values by the translator but always travel to
//! the code generator as text, one instruction per line.

use std::{fmt, str::FromStr};

use crate::error::TacError;

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Literal(String),
    Global(String),
    /// Signed displacement from the base pointer.
    Frame(i32),
    /// Stand-in for an expression that failed to translate.
    Empty,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(s) | Operand::Global(s) => f.write_str(s),
            Operand::Frame(offset) if *offset >= 0 => write!(f, "_BP+{offset}"),
            Operand::Frame(offset) => write!(f, "_BP-{}", -offset),
            Operand::Empty => Ok(()),
        }
    }
}

impl FromStr for Operand {
    type Err = TacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || TacError::Malformed(s.to_string());

        if let Some(rest) = s.strip_prefix("_BP+") {
            rest.parse().map(Operand::Frame).map_err(|_| malformed())
        } else if let Some(rest) = s.strip_prefix("_BP-") {
            rest.parse::<i32>()
                .map(|n| Operand::Frame(-n))
                .map_err(|_| malformed())
        } else if s.is_empty() {
            Ok(Operand::Empty)
        } else if s.starts_with(|c: char| c.is_ascii_digit()) {
            Ok(Operand::Literal(s.to_string()))
        } else {
            Ok(Operand::Global(s.to_string()))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => f.write_str("-"),
            UnaryOp::Not => f.write_str("not"),
        }
    }
}

impl FromStr for UnaryOp {
    type Err = TacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "-" => Ok(UnaryOp::Neg),
            "not" => Ok(UnaryOp::Not),
            _ => Err(TacError::UnknownOperator(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Or,
    Mul,
    Div,
    Mod,
    Rem,
    And,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl BinOp {
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinOp::Equal
                | BinOp::NotEqual
                | BinOp::LessThan
                | BinOp::LessEqual
                | BinOp::GreaterThan
                | BinOp::GreaterEqual
        )
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Or => "or",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "mod",
            BinOp::Rem => "rem",
            BinOp::And => "and",
            BinOp::Equal => "=",
            BinOp::NotEqual => "/=",
            BinOp::LessThan => "<",
            BinOp::LessEqual => "<=",
            BinOp::GreaterThan => ">",
            BinOp::GreaterEqual => ">=",
        };
        f.write_str(s)
    }
}

impl FromStr for BinOp {
    type Err = TacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "or" => BinOp::Or,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "mod" => BinOp::Mod,
            "rem" => BinOp::Rem,
            "and" => BinOp::And,
            "=" => BinOp::Equal,
            "/=" => BinOp::NotEqual,
            "<" => BinOp::LessThan,
            "<=" => BinOp::LessEqual,
            ">" => BinOp::GreaterThan,
            ">=" => BinOp::GreaterEqual,
            _ => return Err(TacError::UnknownOperator(s.to_string())),
        };
        Ok(op)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Rvalue {
    Copy(Operand),
    Unary(UnaryOp, Operand),
    Binary(Operand, BinOp, Operand),
}

impl fmt::Display for Rvalue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rvalue::Copy(a) => write!(f, "{a}"),
            Rvalue::Unary(op, a) => write!(f, "{op} {a}"),
            Rvalue::Binary(a, op, b) => write!(f, "{a} {op} {b}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    Proc(String),
    Endp(String),
    Start(String),
    Assign(Operand, Rvalue),
    Read(Operand),
    WriteInt(Operand),
    WriteStr(String),
    WriteLn,
    Call(String),
    Push(Operand),
    PushRef(Operand),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Proc(name) => write!(f, "proc {name}"),
            Instruction::Endp(name) => write!(f, "endp {name}"),
            Instruction::Start(name) => write!(f, "start proc {name}"),
            Instruction::Assign(dest, value) => write!(f, "{dest} = {value}"),
            Instruction::Read(dest) => write!(f, "rdi {dest}"),
            Instruction::WriteInt(a) => write!(f, "wri {a}"),
            Instruction::WriteStr(label) => write!(f, "wrs {label}"),
            Instruction::WriteLn => f.write_str("wrln"),
            Instruction::Call(name) => write!(f, "call {name}"),
            Instruction::Push(a) => write!(f, "push {a}"),
            Instruction::PushRef(a) => write!(f, "push @{a}"),
        }
    }
}

impl FromStr for Instruction {
    type Err = TacError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<_> = line.split_whitespace().collect();
        let instruction = match fields.as_slice() {
            ["proc", name] => Instruction::Proc(name.to_string()),
            ["endp", name] => Instruction::Endp(name.to_string()),
            ["start", "proc", name] => Instruction::Start(name.to_string()),
            ["rdi", dest] => Instruction::Read(dest.parse()?),
            ["wri", a] => Instruction::WriteInt(a.parse()?),
            ["wrs", label] => Instruction::WriteStr(label.to_string()),
            ["wrln"] => Instruction::WriteLn,
            ["call", name] => Instruction::Call(name.to_string()),
            ["push", a] => match a.strip_prefix('@') {
                Some(a) => Instruction::PushRef(a.parse()?),
                None => Instruction::Push(a.parse()?),
            },
            [dest, "=", rest @ ..] => {
                let value = match rest {
                    [a] => Rvalue::Copy(a.parse()?),
                    [op, a] => Rvalue::Unary(op.parse()?, a.parse()?),
                    [a, op, b] => Rvalue::Binary(a.parse()?, op.parse()?, b.parse()?),
                    _ => return Err(TacError::Malformed(line.to_string())),
                };
                Instruction::Assign(dest.parse()?, value)
            }
            _ => return Err(TacError::Malformed(line.to_string())),
        };
        Ok(instruction)
    }
}

/// Renders instructions in the textual form, one per line.
pub fn to_text(instructions: &[Instruction]) -> String {
    instructions.iter().map(|i| format!("{i}\n")).collect()
}
