use crate::ast::{AstKind, AstNode, NodeClass};
use crate::error::{ErrorCode, ErrorLog};

use super::{CheckContext, MathCheck, MathType};

/// Arguments of arithmetic, relational and elementary functions must be
/// numeric.
pub struct NumericArgs;

/// The operands of a node, looking through `degree` and `logbase`.
fn operands(node: &AstNode) -> impl Iterator<Item = &AstNode> {
    node.children().iter().flat_map(|child| {
        if child.class() == NodeClass::Qualifier {
            child.children()
        } else {
            std::slice::from_ref(child)
        }
    })
}

impl MathCheck for NumericArgs {
    fn code(&self) -> ErrorCode {
        ErrorCode::NumericOpsNeedNumericArgs
    }

    fn check_math(&self, ctx: &CheckContext, node: &AstNode, log: &mut ErrorLog) {
        let takes_numeric = match node.kind() {
            AstKind::Operator(op) => op.takes_numeric_args(),
            AstKind::Symbol(symbol) => symbol.kind.is_function(),
            _ => false,
        };
        if takes_numeric && operands(node).any(|arg| ctx.infer_type(arg) == MathType::Boolean) {
            ctx.report(
                log,
                self.code(),
                node,
                &format!("applies <{}> to a non-numeric argument.", node.kind()),
            );
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
    fn arithmetic_needs_numbers() {
        let mut model = Model::default();
        model.add_parameter("x");
        let rule = MathElement::new(ElementKind::AssignmentRule);
        assert!(run_check(&NumericArgs, &model, &rule, "sin(x) + root(3, x) * 2").is_empty());
        assert_eq!(run_check(&NumericArgs, &model, &rule, "1 + true").len(), 1);
        assert_eq!(run_check(&NumericArgs, &model, &rule, "log(x > 1, x)").len(), 1);
        assert_eq!(run_check(&NumericArgs, &model, &rule, "delay(x, false)").len(), 1);
        assert_eq!(run_check(&NumericArgs, &model, &rule, "(x < 1) > 0").len(), 1);
        // an unresolvable call is not reported
        assert!(run_check(&NumericArgs, &model, &rule, "x * g(x)").is_empty());
    }
}
