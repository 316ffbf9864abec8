use std::fmt;

use crate::lexer::Value;

/// Storage units occupied by one word on the target.
pub const WORD_SIZE: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarType {
    Char,
    Int,
    Float,
}

impl VarType {
    pub fn sizeof(&self) -> i32 {
        match self {
            VarType::Char => 1,
            VarType::Int => WORD_SIZE,
            VarType::Float => 4,
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarType::Char => f.write_str("CharType"),
            VarType::Int => f.write_str("IntType"),
            VarType::Float => f.write_str("FloatType"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParamMode {
    #[default]
    In,
    Out,
    InOut,
}

impl ParamMode {
    /// Arguments bound to these formals are passed by address.
    pub fn by_reference(&self) -> bool {
        matches!(self, ParamMode::Out | ParamMode::InOut)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConstValue {
    Int(i32),
    Float(f64),
}

impl ConstValue {
    pub fn ty(&self) -> VarType {
        match self {
            ConstValue::Int(_) => VarType::Int,
            ConstValue::Float(_) => VarType::Float,
        }
    }
}

impl From<Value> for ConstValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Int(v) => ConstValue::Int(v),
            Value::Float(v) => ConstValue::Float(v),
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Float(v) => write!(f, "{v:?}"),
        }
    }
}
