mod codegen;

pub use codegen::*;
