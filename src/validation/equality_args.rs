use crate::ast::{AstNode, Operator};
use crate::error::{ErrorCode, ErrorLog};

use super::{CheckContext, MathCheck, MathType};

/// All arguments of `eq` and `neq` must have the same type.
pub struct EqualityArgs;

impl MathCheck for EqualityArgs {
    fn code(&self) -> ErrorCode {
        ErrorCode::ArgsToEqNeedSameType
    }

    fn check_math(&self, ctx: &CheckContext, node: &AstNode, log: &mut ErrorLog) {
        if matches!(node.operator_kind(), Some(Operator::Eq | Operator::Neq)) {
            let mut types = node
                .children()
                .iter()
                .map(|arg| ctx.infer_type(arg))
                .filter(|ty| *ty != MathType::Unknown);
            if let Some(first) = types.next() {
                if types.any(|ty| ty != first) {
                    ctx.report(
                        log,
                        self.code(),
                        node,
                        "compares a numeric and a Boolean argument.",
                    );
                }
            }
        }
        self.check_children(ctx, node, log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use crate::validation::{run_check, ElementKind, MathElement};

    #[test]
    fn mixed_types_are_reported_once() {
        let mut model = Model::default();
        model.add_parameter("x");
        let constraint = MathElement::new(ElementKind::Constraint);
        assert!(run_check(&EqualityArgs, &model, &constraint, "x == 2").is_empty());
        assert!(run_check(&EqualityArgs, &model, &constraint, "(x > 1) != false").is_empty());
        let log = run_check(&EqualityArgs, &model, &constraint, "eq(x, true, false)");
        assert_eq!(log.len(), 1);
        assert!(log.contains(ErrorCode::ArgsToEqNeedSameType));
    }
}
