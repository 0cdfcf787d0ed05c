use crate::ast::AstNode;
use crate::error::{ErrorCode, ErrorLog};

use super::{CheckContext, MathCheck};

const BASE_UNITS: &[&str] = &[
    "ampere",
    "avogadro",
    "becquerel",
    "candela",
    "coulomb",
    "dimensionless",
    "farad",
    "gram",
    "gray",
    "henry",
    "hertz",
    "item",
    "joule",
    "katal",
    "kelvin",
    "kilogram",
    "litre",
    "lumen",
    "lux",
    "metre",
    "mole",
    "newton",
    "ohm",
    "pascal",
    "radian",
    "second",
    "siemens",
    "sievert",
    "steradian",
    "tesla",
    "volt",
    "watt",
    "weber",
];

pub fn is_base_unit(units: &str) -> bool {
    BASE_UNITS.contains(&units)
}

/// The `units` of a number must be a base unit or a unit definition of the
/// model. Level 3 only.
pub struct UnitsValue;

impl MathCheck for UnitsValue {
    fn code(&self) -> ErrorCode {
        ErrorCode::InvalidUnitsValue
    }

    fn applies(&self, ctx: &CheckContext) -> bool {
        ctx.model.namespace().level >= 3
    }

    fn check_math(&self, ctx: &CheckContext, node: &AstNode, log: &mut ErrorLog) {
        if let Some(units) = node.units() {
            if !is_base_unit(units) && !ctx.model.has_unit_definition(units) {
                ctx.report(
                    log,
                    self.code(),
                    node,
                    &format!("uses units '{units}', which is neither a base unit nor a unit definition."),
                );
            }
        }
        self.check_children(ctx, node, log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Operator;
    use crate::model::Model;
    use crate::namespace::SbmlNamespace;
    use crate::validation::{ElementKind, MathElement};

    #[test]
    fn units_must_resolve() {
        let mut model = Model::new(SbmlNamespace::new(3, 1));
        model.add_unit_definition("per_second");
        let rule = MathElement::new(ElementKind::AssignmentRule);
        let ctx = CheckContext::new(&model, &rule);
        let literal = |units: &str| {
            let mut node = AstNode::real(1.0);
            node.set_units(units).unwrap();
            node
        };
        let tree = AstNode::operator(
            Operator::Plus,
            vec![literal("mole"), literal("per_second"), literal("furlong")],
        );
        let mut log = ErrorLog::new();
        UnitsValue.check(&ctx, &tree, &mut log);
        assert_eq!(log.len(), 1);
        assert!(log.has_error_contains("'furlong'"));

        let model = Model::new(SbmlNamespace::new(2, 4));
        let ctx = CheckContext::new(&model, &rule);
        assert!(!UnitsValue.applies(&ctx));
    }
}
