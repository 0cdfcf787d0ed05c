use crate::ast::AstNode;
use crate::error::{ErrorCode, ErrorLog};

use super::{CheckContext, MathCheck, MathType};

/// Arguments of `and`, `or`, `xor`, `not` and `implies` must be Boolean.
pub struct BooleanArgs;

impl MathCheck for BooleanArgs {
    fn code(&self) -> ErrorCode {
        ErrorCode::BooleanOpsNeedBooleanArgs
    }

    fn check_math(&self, ctx: &CheckContext, node: &AstNode, log: &mut ErrorLog) {
        if let Some(op) = node.operator_kind() {
            if op.is_logical()
                && node
                    .children()
                    .iter()
                    .any(|arg| ctx.infer_type(arg) == MathType::Numeric)
            {
                ctx.report(
                    log,
                    self.code(),
                    node,
                    &format!("applies the Boolean operator <{op}> to a non-Boolean argument."),
                );
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
    fn logical_operators_need_booleans() {
        let mut model = Model::default();
        model.add_parameter("x");
        let trigger = MathElement::new(ElementKind::Trigger);
        assert!(run_check(&BooleanArgs, &model, &trigger, "x > 1 && !(x < 0)").is_empty());
        assert_eq!(run_check(&BooleanArgs, &model, &trigger, "x && true").len(), 1);
        assert_eq!(run_check(&BooleanArgs, &model, &trigger, "!(x + 1) || x").len(), 2);
    }
}
