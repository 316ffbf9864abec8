mod literals;
mod symbol_table;
mod ty;

pub use literals::*;
pub use symbol_table::*;
pub use ty::*;
