use crate::ast::{AstKind, AstNode};
use crate::error::{ErrorCode, ErrorLog};

use super::{CheckContext, MathCheck};

/// A `ci` applied to arguments must name a function definition.
pub struct FunctionReference;

impl MathCheck for FunctionReference {
    fn code(&self) -> ErrorCode {
        ErrorCode::ApplyCiMustBeUserFunction
    }

    fn check_math(&self, ctx: &CheckContext, node: &AstNode, log: &mut ErrorLog) {
        if let AstKind::Function(ident) = node.kind() {
            if ctx.model.function_definition(&ident.name).is_none() {
                ctx.report(
                    log,
                    self.code(),
                    node,
                    &format!("calls '{}', which is not a function definition.", ident.name),
                );
            }
        }
        self.check_children(ctx, node, log);
    }
}

/// A call must pass as many arguments as the function has `bvar`s. The rule
/// exists from SBML Level 2 Version 4 onwards.
pub struct FunctionArgumentCount;

impl MathCheck for FunctionArgumentCount {
    fn code(&self) -> ErrorCode {
        ErrorCode::InvalidNoArgsPassedToFunctionDef
    }

    fn applies(&self, ctx: &CheckContext) -> bool {
        ctx.model.namespace().is_at_least(2, 4)
    }

    fn check_math(&self, ctx: &CheckContext, node: &AstNode, log: &mut ErrorLog) {
        if let AstKind::Function(ident) = node.kind() {
            if let Some(definition) = ctx.model.function_definition(&ident.name) {
                let expected = definition.num_arguments();
                if definition.math.is_some() && node.num_children() != expected {
                    ctx.report(
                        log,
                        self.code(),
                        node,
                        &format!(
                            "passes {} argument(s) to '{}', which takes {}.",
                            node.num_children(),
                            ident.name,
                            expected
                        ),
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
    use crate::formula::parse_formula;
    use crate::model::Model;
    use crate::namespace::SbmlNamespace;
    use crate::validation::{run_check, ElementKind, MathElement};

    fn model(level: u32, version: u32) -> Model {
        let mut model = Model::new(SbmlNamespace::new(level, version));
        model.add_parameter("a").add_parameter("b");
        model.add_function_definition("f", parse_formula("lambda(x, y, x * y)").unwrap());
        model
    }

    #[test]
    fn calls_must_name_functions() {
        let model = model(3, 2);
        let rule = MathElement::new(ElementKind::AssignmentRule);
        assert!(run_check(&FunctionReference, &model, &rule, "f(a, b)").is_empty());
        let log = run_check(&FunctionReference, &model, &rule, "g(a) + a(b)");
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn argument_count_is_version_gated() {
        let rule = MathElement::new(ElementKind::AssignmentRule);
        for (level, version) in [(2, 4), (2, 5), (3, 1), (3, 2)] {
            let model = model(level, version);
            assert!(run_check(&FunctionArgumentCount, &model, &rule, "f(a, b)").is_empty());
            let log = run_check(&FunctionArgumentCount, &model, &rule, "f(a)");
            assert_eq!(log.len(), 1, "L{level}V{version}");
            assert!(log.has_error_contains("passes 1 argument(s) to 'f', which takes 2"));
        }
        for (level, version) in [(1, 2), (2, 1), (2, 3)] {
            let model = model(level, version);
            assert!(run_check(&FunctionArgumentCount, &model, &rule, "f(a)").is_empty());
        }
    }
}
