use crate::ast::{AstKind, AstNode};
use crate::error::{ErrorCode, ErrorLog};

use super::{CheckContext, ElementKind, MathCheck};

/// A kinetic law's local parameters are only visible inside that kinetic
/// law.
pub struct LocalParameterScope;

impl MathCheck for LocalParameterScope {
    fn code(&self) -> ErrorCode {
        ErrorCode::KineticLawParametersAreLocalOnly
    }

    fn applies(&self, ctx: &CheckContext) -> bool {
        ctx.element.kind != ElementKind::FunctionDefinition
    }

    fn check_math(&self, ctx: &CheckContext, node: &AstNode, log: &mut ErrorLog) {
        if let AstKind::Name(ident) = node.kind() {
            let id = ident.name.as_str();
            if ctx.model.symbol(id).is_none()
                && !ctx.local_parameters().iter().any(|p| p == id)
                && ctx.model.is_local_parameter_anywhere(id)
            {
                ctx.report(
                    log,
                    self.code(),
                    node,
                    &format!("uses '{id}', which is local to the kinetic law of another reaction."),
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
    use crate::validation::{run_check, MathElement};

    #[test]
    fn local_parameters_stay_local() {
        let mut model = Model::default();
        model.add_species("S1");
        let r1 = model.add_reaction("r1");
        let r2 = model.add_reaction("r2");
        model.add_local_parameter(r1, "k1").unwrap();

        let own = MathElement::new(ElementKind::KineticLaw { reaction: r1 });
        assert!(run_check(&LocalParameterScope, &model, &own, "k1 * S1").is_empty());

        let other = MathElement::new(ElementKind::KineticLaw { reaction: r2 });
        assert_eq!(run_check(&LocalParameterScope, &model, &other, "k1 * S1").len(), 1);

        let rule = MathElement::new(ElementKind::AssignmentRule);
        assert_eq!(run_check(&LocalParameterScope, &model, &rule, "k1 * S1").len(), 1);
    }
}
