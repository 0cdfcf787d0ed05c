pub mod kind;
pub use kind::{
    Annotation, Arity, AstKind, Constant, Csymbol, Identifier, NodeClass, Operator, Qualifier,
    SymbolKind,
};

pub mod node;
pub use node::{AstNode, Descendants, NodeAttributes, SbaseRef, UserData, MAX_NESTING_DEPTH};
