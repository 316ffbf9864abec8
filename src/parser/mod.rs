mod context;
mod expr;
mod parser;

pub use context::*;
pub use parser::*;
