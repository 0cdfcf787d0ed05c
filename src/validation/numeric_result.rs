use crate::ast::AstNode;
use crate::error::{ErrorCode, ErrorLog};

use super::{CheckContext, MathCheck, MathType};

/// The math of rules, kinetic laws, assignments, delays and priorities must
/// evaluate to a number. Only the root is inspected.
pub struct NumericResult;

impl MathCheck for NumericResult {
    fn code(&self) -> ErrorCode {
        ErrorCode::MathResultMustBeNumeric
    }

    fn applies(&self, ctx: &CheckContext) -> bool {
        ctx.element.kind.requires_numeric()
    }

    fn check_math(&self, ctx: &CheckContext, node: &AstNode, log: &mut ErrorLog) {
        if ctx.infer_type(node) == MathType::Boolean {
            ctx.report(log, self.code(), node, "does not evaluate to a number.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use crate::validation::{run_check, ElementKind, MathElement};

    #[test]
    fn root_must_be_numeric() {
        let mut model = Model::default();
        model.add_parameter("x");
        let rule = MathElement::new(ElementKind::RateRule);
        assert!(run_check(&NumericResult, &model, &rule, "piecewise(1, x > 0, 0)").is_empty());
        assert_eq!(run_check(&NumericResult, &model, &rule, "x > 0").len(), 1);
        let trigger = MathElement::new(ElementKind::Trigger);
        assert!(run_check(&NumericResult, &model, &trigger, "x > 0").is_empty());
    }
}
