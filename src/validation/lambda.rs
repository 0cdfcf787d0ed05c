use crate::ast::{AstKind, AstNode, Operator};
use crate::error::{ErrorCode, ErrorLog};

use super::{CheckContext, ElementKind, MathCheck};

/// A `lambda` may only be the top-level expression of a function definition.
pub struct LambdaPlacement;

impl MathCheck for LambdaPlacement {
    fn code(&self) -> ErrorCode {
        ErrorCode::LambdaOnlyAllowedInFunctionDef
    }

    fn check(&self, ctx: &CheckContext, root: &AstNode, log: &mut ErrorLog) {
        let mut top = root;
        while let (AstKind::Semantics(_), Some(child)) = (top.kind(), top.child(0)) {
            top = child;
        }
        if ctx.element.kind == ElementKind::FunctionDefinition && top.is_operator(Operator::Lambda)
        {
            self.check_children(ctx, top, log);
        } else {
            self.check_math(ctx, root, log);
        }
    }

    fn check_math(&self, ctx: &CheckContext, node: &AstNode, log: &mut ErrorLog) {
        if node.is_operator(Operator::Lambda) {
            ctx.report(
                log,
                self.code(),
                node,
                "uses <lambda> outside the top level of a function definition.",
            );
        } else {
            self.check_children(ctx, node, log);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use crate::validation::{run_check, MathElement};

    #[test]
    fn lambda_only_at_function_definition_root() {
        let model = Model::default();
        let fd = MathElement::new(ElementKind::FunctionDefinition);
        assert!(run_check(&LambdaPlacement, &model, &fd, "lambda(x, x + 1)").is_empty());
        let log = run_check(&LambdaPlacement, &model, &fd, "lambda(x, lambda(y, y))");
        assert_eq!(log.len(), 1);

        let rule = MathElement::new(ElementKind::AssignmentRule);
        let log = run_check(&LambdaPlacement, &model, &rule, "1 + lambda(x, x)");
        assert_eq!(log.len(), 1);
        assert!(log.contains(ErrorCode::LambdaOnlyAllowedInFunctionDef));
    }
}
