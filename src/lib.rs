extern crate pest;
#[macro_use]
extern crate pest_derive;

pub mod ast;
pub mod error;
pub mod formula;
pub mod mathml;
pub mod model;
pub mod namespace;
pub mod validation;

pub use ast::{AstKind, AstNode, Constant, Operator, Qualifier, SymbolKind};
pub use error::{Diagnostic, ErrorCode, ErrorLog, OperationError, Severity};
pub use formula::{parse_formula, to_formula};
pub use mathml::{read_math_from_str, write_math_to_string};
pub use model::{FunctionDefinition, Model, ModelContext};
pub use namespace::{ReadOptions, SbmlNamespace, WriteOptions};
pub use validation::{ElementKind, MathElement, MathValidator};
