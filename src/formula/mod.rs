//! Infix text notation for math trees, e.g. `k1 * S1 / (Km + S1)`.

pub mod formatter;
pub mod parser;

pub use formatter::to_formula;
pub use parser::{parse_formula, FormulaError, FormulaParser, MAX_FORMULA_NESTING};
