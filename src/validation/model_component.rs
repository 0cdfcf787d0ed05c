use crate::ast::{AstKind, AstNode};
use crate::error::{ErrorCode, ErrorLog};

use super::{CheckContext, ElementKind, MathCheck};

/// A `ci` used as a value must name a compartment, species, parameter,
/// reaction or species reference, or a local parameter in scope.
pub struct ModelComponentReference;

impl MathCheck for ModelComponentReference {
    fn code(&self) -> ErrorCode {
        ErrorCode::ApplyCiMustBeModelComponent
    }

    fn applies(&self, ctx: &CheckContext) -> bool {
        // inside a function definition every name is a bound variable
        ctx.element.kind != ElementKind::FunctionDefinition
    }

    fn check_math(&self, ctx: &CheckContext, node: &AstNode, log: &mut ErrorLog) {
        if let AstKind::Name(ident) = node.kind() {
            let id = ident.name.as_str();
            let known = match ctx.model.symbol(id) {
                Some(symbol) => symbol.is_value(),
                // local parameters of other reactions are reported separately
                None => {
                    ctx.local_parameters().iter().any(|p| p == id)
                        || ctx.model.is_local_parameter_anywhere(id)
                }
            };
            if !known {
                ctx.report(
                    log,
                    self.code(),
                    node,
                    &format!("refers to '{id}', which is not a component of the model."),
                );
            }
        }
        self.check_children(ctx, node, log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::parse_formula;
    use crate::model::Model;
    use crate::validation::{run_check, MathElement};

    #[test]
    fn names_must_resolve() {
        let mut model = Model::default();
        model.add_compartment("cell").add_species("S1");
        model.add_function_definition("f", parse_formula("lambda(x, x)").unwrap());
        let rule = MathElement::new(ElementKind::AssignmentRule);
        assert!(run_check(&ModelComponentReference, &model, &rule, "S1 / cell").is_empty());
        let log = run_check(&ModelComponentReference, &model, &rule, "S2 + f");
        assert_eq!(log.len(), 2);
        assert!(log.has_error_contains("'S2'"));

        let fd = MathElement::new(ElementKind::FunctionDefinition);
        assert!(run_check(&ModelComponentReference, &model, &fd, "lambda(q, q)").is_empty());
    }
}
