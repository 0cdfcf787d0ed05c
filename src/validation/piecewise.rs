use crate::ast::{AstNode, Operator, Qualifier};
use crate::error::{ErrorCode, ErrorLog};

use super::{branch_value, CheckContext, MathCheck, MathType};

/// Every value of a `piecewise` must have the type of the first one.
pub struct PiecewiseTypes;

impl MathCheck for PiecewiseTypes {
    fn code(&self) -> ErrorCode {
        ErrorCode::PiecewiseNeedsConsistentTypes
    }

    fn check_math(&self, ctx: &CheckContext, node: &AstNode, log: &mut ErrorLog) {
        if node.is_operator(Operator::Piecewise) {
            let mut types = node
                .children()
                .iter()
                .filter_map(branch_value)
                .map(|value| ctx.infer_type(value))
                .filter(|ty| *ty != MathType::Unknown);
            if let Some(first) = types.next() {
                if types.any(|ty| ty != first) {
                    ctx.report(
                        log,
                        self.code(),
                        node,
                        "mixes numeric and Boolean values in one <piecewise>.",
                    );
                }
            }
        }
        self.check_children(ctx, node, log);
    }
}

/// The condition of each `piece` must be Boolean.
pub struct PieceCondition;

impl MathCheck for PieceCondition {
    fn code(&self) -> ErrorCode {
        ErrorCode::PieceNeedsBoolean
    }

    fn check_math(&self, ctx: &CheckContext, node: &AstNode, log: &mut ErrorLog) {
        if node.is_qualifier(Qualifier::Piece) {
            if let Some(condition) = node.child(1) {
                if ctx.infer_type(condition) == MathType::Numeric {
                    ctx.report(
                        log,
                        self.code(),
                        condition,
                        "is used as a <piece> condition but is not Boolean.",
                    );
                }
            }
        }
        self.check_children(ctx, node, log);
    }
}
