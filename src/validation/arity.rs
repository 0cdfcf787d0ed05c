use crate::ast::{AstKind, AstNode};
use crate::error::{ErrorCode, ErrorLog};

use super::{CheckContext, MathCheck};

/// Operators, qualifiers and csymbol functions must have the number and
/// kind of children their definition requires.
pub struct OperatorArity;

impl MathCheck for OperatorArity {
    fn code(&self) -> ErrorCode {
        ErrorCode::OpsNeedCorrectNumberOfArgs
    }

    fn check_math(&self, ctx: &CheckContext, node: &AstNode, log: &mut ErrorLog) {
        // user function calls are counted against their definition elsewhere
        if !matches!(node.kind(), AstKind::Function(_)) && !node.has_correct_number_arguments() {
            ctx.report(
                log,
                self.code(),
                node,
                &format!(
                    "gives {} argument(s) to <{}>, which expects {}.",
                    node.num_children(),
                    node.kind(),
                    node.kind().arity()
                ),
            );
        }
        self.check_children(ctx, node, log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Operator;
    use crate::model::Model;
    use crate::validation::{ElementKind, MathElement};

    #[test]
    fn wrong_argument_counts() {
        let model = Model::default();
        let rule = MathElement::new(ElementKind::AssignmentRule);
        let ctx = CheckContext::new(&model, &rule);
        let divide = AstNode::operator(Operator::Divide, vec![AstNode::integer(1)]);
        let tree = AstNode::operator(
            Operator::Plus,
            vec![
                divide,
                AstNode::operator(Operator::Sin, vec![AstNode::integer(1), AstNode::integer(2)]),
            ],
        );
        let mut log = ErrorLog::new();
        OperatorArity.check(&ctx, &tree, &mut log);
        assert_eq!(log.len(), 2);
        assert!(log.has_error_contains("gives 1 argument(s) to <divide>, which expects 2"));

        let mut log = ErrorLog::new();
        let call = AstNode::function("f", vec![]);
        OperatorArity.check(&ctx, &call, &mut log);
        assert!(log.is_empty());
    }
}
