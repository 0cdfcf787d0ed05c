use itertools::Itertools;

use crate::ast::{AstKind, AstNode, Operator, Qualifier};

const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_RELATIONAL: u8 = 3;
const PREC_SUM: u8 = 4;
const PREC_PRODUCT: u8 = 5;
const PREC_UNARY: u8 = 6;
const PREC_POWER: u8 = 7;
const PREC_ATOM: u8 = 8;

fn is_negative(value: f64) -> bool {
    value.is_sign_negative() && !value.is_nan()
}

/// Binding strength of the text `to_formula` produces for `node`.
fn precedence(node: &AstNode) -> u8 {
    let n = node.num_children();
    match node.kind() {
        AstKind::Operator(op) => match op {
            Operator::Or if n >= 2 => PREC_OR,
            Operator::And if n >= 2 => PREC_AND,
            op if op.is_relational() && n >= 2 => PREC_RELATIONAL,
            Operator::Plus if n >= 2 => PREC_SUM,
            Operator::Minus if n == 2 => PREC_SUM,
            Operator::Times if n >= 2 => PREC_PRODUCT,
            Operator::Divide if n == 2 => PREC_PRODUCT,
            Operator::Minus | Operator::Not if n == 1 => PREC_UNARY,
            Operator::Power if n == 2 => PREC_POWER,
            _ => PREC_ATOM,
        },
        AstKind::Integer(v) if *v < 0 => PREC_UNARY,
        AstKind::Real(v) if is_negative(*v) => PREC_UNARY,
        AstKind::RealExponent { mantissa, .. } if is_negative(*mantissa) => PREC_UNARY,
        _ => PREC_ATOM,
    }
}

/// Formats an operand, parenthesised unless it binds tighter than `parent`.
fn operand(node: &AstNode, parent: u8) -> String {
    let text = to_formula(node);
    if precedence(node) <= parent {
        format!("({text})")
    } else {
        text
    }
}

fn infix(node: &AstNode, symbol: &str, prec: u8) -> String {
    node.children()
        .iter()
        .map(|child| operand(child, prec))
        .join(&format!(" {symbol} "))
}

fn call(name: &str, mut args: impl Iterator<Item = String>) -> String {
    format!("{}({})", name, args.join(", "))
}

fn format_real(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "INF".to_string()
        } else {
            "-INF".to_string()
        }
    } else if value != 0.0 && !(1e-4..1e15).contains(&value.abs()) {
        format!("{value:e}")
    } else {
        format!("{value}")
    }
}

/// Flattens qualifier children into plain arguments, filling in the default
/// value of an empty `degree` or `logbase`.
fn qualifier_args(node: &AstNode) -> Vec<String> {
    let mut args = Vec::new();
    for child in node.children() {
        match child.qualifier_kind() {
            Some(qualifier) if child.num_children() == 0 => match qualifier {
                Qualifier::Degree => args.push("2".to_string()),
                Qualifier::Logbase => args.push("10".to_string()),
                _ => (),
            },
            Some(_) => args.extend(child.children().iter().map(to_formula)),
            None => args.push(to_formula(child)),
        }
    }
    args
}

fn format_operator(node: &AstNode, op: Operator) -> String {
    let n = node.num_children();
    match op {
        Operator::Or if n >= 2 => infix(node, "||", PREC_OR),
        Operator::And if n >= 2 => infix(node, "&&", PREC_AND),
        Operator::Eq if n >= 2 => infix(node, "==", PREC_RELATIONAL),
        Operator::Neq if n >= 2 => infix(node, "!=", PREC_RELATIONAL),
        Operator::Gt if n >= 2 => infix(node, ">", PREC_RELATIONAL),
        Operator::Lt if n >= 2 => infix(node, "<", PREC_RELATIONAL),
        Operator::Geq if n >= 2 => infix(node, ">=", PREC_RELATIONAL),
        Operator::Leq if n >= 2 => infix(node, "<=", PREC_RELATIONAL),
        Operator::Plus if n >= 2 => infix(node, "+", PREC_SUM),
        Operator::Minus if n == 2 => infix(node, "-", PREC_SUM),
        Operator::Times if n >= 2 => infix(node, "*", PREC_PRODUCT),
        Operator::Divide if n == 2 => infix(node, "/", PREC_PRODUCT),
        Operator::Power if n == 2 => infix(node, "^", PREC_POWER),
        Operator::Minus | Operator::Not if n == 1 => {
            let symbol = if op == Operator::Minus { "-" } else { "!" };
            match node.child(0) {
                // keep -(2) distinct from the literal -2
                Some(child) if op == Operator::Minus && child.kind().is_number() => {
                    format!("-({})", to_formula(child))
                }
                Some(child) => format!("{}{}", symbol, operand(child, PREC_UNARY)),
                None => call(op.name(), std::iter::empty()),
            }
        }
        Operator::Root if n == 1 => call("sqrt", qualifier_args(node).into_iter()),
        Operator::Log if n == 1 => call("log10", qualifier_args(node).into_iter()),
        _ => call(op.name(), qualifier_args(node).into_iter()),
    }
}

/// Renders a tree in infix notation. The text parses back to an equivalent
/// tree, except that rationals come back as divisions. Recurses once per
/// level, so trees built in code should pass [`AstNode::check_depth`] first.
pub fn to_formula(node: &AstNode) -> String {
    match node.kind() {
        AstKind::Unknown => String::new(),
        AstKind::Integer(v) => v.to_string(),
        AstKind::Real(v) => format_real(*v),
        AstKind::RealExponent { mantissa, exponent } => format!("{mantissa}e{exponent}"),
        AstKind::Rational {
            numerator,
            denominator,
        } => format!("({numerator}/{denominator})"),
        AstKind::Name(ident) => ident.name.clone(),
        AstKind::Function(ident) => call(&ident.name, node.children().iter().map(to_formula)),
        AstKind::Constant(constant) => constant.name().to_string(),
        AstKind::Symbol(symbol) if symbol.kind.is_function() => call(
            symbol.kind.default_name(),
            node.children().iter().map(to_formula),
        ),
        AstKind::Symbol(symbol) => symbol.kind.default_name().to_string(),
        AstKind::Operator(op) => format_operator(node, *op),
        AstKind::Qualifier(_) => qualifier_args(node).join(", "),
        AstKind::Semantics(_) => node.child(0).map(to_formula).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Constant, SymbolKind};

    #[test]
    fn minimal_parentheses() {
        let node = AstNode::operator(
            Operator::Times,
            vec![
                AstNode::operator(
                    Operator::Plus,
                    vec![AstNode::name("a"), AstNode::name("b")],
                ),
                AstNode::name("c"),
            ],
        );
        assert_eq!(to_formula(&node), "(a + b) * c");
        let node = AstNode::operator(
            Operator::Minus,
            vec![
                AstNode::name("a"),
                AstNode::operator(
                    Operator::Minus,
                    vec![AstNode::name("b"), AstNode::name("c")],
                ),
            ],
        );
        assert_eq!(to_formula(&node), "a - (b - c)");
        let node = AstNode::operator(
            Operator::Power,
            vec![AstNode::name("x"), AstNode::integer(-2)],
        );
        assert_eq!(to_formula(&node), "x^(-2)");
    }

    #[test]
    fn functions_and_symbols() {
        let node = AstNode::operator(Operator::Root, vec![AstNode::name("x")]);
        assert_eq!(to_formula(&node), "sqrt(x)");
        let node = AstNode::operator(
            Operator::Log,
            vec![
                AstNode::qualifier(Qualifier::Logbase, vec![AstNode::integer(2)]),
                AstNode::name("x"),
            ],
        );
        assert_eq!(to_formula(&node), "log(2, x)");
        let mut delay = AstNode::symbol(SymbolKind::Delay);
        delay.add_child(AstNode::name("x")).unwrap();
        delay.add_child(AstNode::symbol(SymbolKind::Time)).unwrap();
        assert_eq!(to_formula(&delay), "delay(x, time)");
        let node = AstNode::function("f", vec![AstNode::constant(Constant::Pi)]);
        assert_eq!(to_formula(&node), "f(pi)");
        let node = AstNode::lambda(&["x"], AstNode::name("x"));
        assert_eq!(to_formula(&node), "lambda(x, x)");
        let node = AstNode::operator(
            Operator::Piecewise,
            vec![
                AstNode::piece(AstNode::integer(1), AstNode::constant(Constant::True)),
                AstNode::otherwise(AstNode::integer(0)),
            ],
        );
        assert_eq!(to_formula(&node), "piecewise(1, true, 0)");
    }

    #[test]
    fn numbers() {
        assert_eq!(to_formula(&AstNode::real(2.5)), "2.5");
        assert_eq!(to_formula(&AstNode::real(1e-20)), "1e-20");
        assert_eq!(to_formula(&AstNode::real(f64::NEG_INFINITY)), "-INF");
        assert_eq!(to_formula(&AstNode::real_exponent(1.5, 3)), "1.5e3");
        assert_eq!(to_formula(&AstNode::rational(1, 3).unwrap()), "(1/3)");
        let node = AstNode::operator(Operator::Minus, vec![AstNode::integer(2)]);
        assert_eq!(to_formula(&node), "-(2)");
    }
}
