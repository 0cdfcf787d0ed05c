#![allow(clippy::empty_docs)]
#[derive(Parser)]
#[grammar = "formula/formula.pest"] // relative to src
pub struct FormulaParser;

use pest::iterators::{Pair, Pairs};
use pest::Parser;
use thiserror::Error;

use crate::ast::{AstKind, AstNode, Constant, Operator, Qualifier, SymbolKind};

#[derive(Debug, Error)]
pub enum FormulaError {
    #[error("{0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("{name}() takes {expected} argument(s) but {found} were given")]
    Arity {
        name: String,
        expected: &'static str,
        found: usize,
    },
    #[error("the parameters of lambda() must be plain names")]
    LambdaParameter,
    #[error("malformed parse tree at '{0}'")]
    Structure(String),
    #[error("formula nests deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// Deepest nesting of parentheses and `^` accepted by `parse_formula`.
pub const MAX_FORMULA_NESTING: usize = 64;

// each open parenthesis and each `^` adds a level of recursion to the parse
fn check_nesting(text: &str) -> Result<(), FormulaError> {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut powers = 0usize;
    for c in text.chars() {
        match c {
            '(' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ')' => depth = depth.saturating_sub(1),
            '^' => powers += 1,
            _ => {}
        }
    }
    if deepest + powers > MAX_FORMULA_NESTING {
        return Err(FormulaError::NestingTooDeep(MAX_FORMULA_NESTING));
    }
    Ok(())
}

fn next_pair<'i>(inner: &mut Pairs<'i, Rule>, parent: &str) -> Result<Pair<'i, Rule>, FormulaError> {
    inner
        .next()
        .ok_or_else(|| FormulaError::Structure(parent.to_string()))
}

//number     = @{ (ASCII_DIGIT+ ~ ("." ~ ASCII_DIGIT*)? | "." ~ ASCII_DIGIT+) ~ (^"e" ~ ("+" | "-")? ~ ASCII_DIGIT+)? }
fn parse_number(text: &str) -> Result<AstNode, FormulaError> {
    let invalid = || FormulaError::InvalidNumber(text.to_string());
    if let Some(split) = text.find(|c: char| c == 'e' || c == 'E') {
        let mantissa = text[..split].parse::<f64>().map_err(|_| invalid())?;
        let exponent = text[split + 1..].parse::<i64>().map_err(|_| invalid())?;
        Ok(AstNode::real_exponent(mantissa, exponent))
    } else if text.contains('.') {
        Ok(AstNode::real(text.parse().map_err(|_| invalid())?))
    } else {
        Ok(AstNode::integer(text.parse().map_err(|_| invalid())?))
    }
}

//name       = @{ (ASCII_ALPHA | "_") ~ (ASCII_ALPHANUMERIC | "_")* }
fn parse_name(name: &str) -> AstNode {
    match name {
        "INF" => AstNode::real(f64::INFINITY),
        "NaN" => AstNode::real(f64::NAN),
        "time" => AstNode::symbol(SymbolKind::Time),
        "avogadro" => AstNode::symbol(SymbolKind::Avogadro),
        _ => match Constant::from_name(name) {
            Some(constant) => AstNode::constant(constant),
            None => AstNode::name(name),
        },
    }
}

fn operator_alias(name: &str) -> Option<Operator> {
    match name {
        "pow" => Some(Operator::Power),
        "ceil" => Some(Operator::Ceiling),
        "asin" => Some(Operator::Arcsin),
        "acos" => Some(Operator::Arccos),
        "atan" => Some(Operator::Arctan),
        _ => Operator::from_name(name),
    }
}

/// Turns `name(args)` into a node, resolving built-in function names.
fn build_call(name: &str, args: Vec<AstNode>) -> Result<AstNode, FormulaError> {
    let found = args.len();
    let arity = |expected: &'static str| FormulaError::Arity {
        name: name.to_string(),
        expected,
        found,
    };
    match name {
        "sqrt" | "log10" => {
            let [x]: [AstNode; 1] = args.try_into().map_err(|_| arity("1"))?;
            let op = if name == "sqrt" {
                Operator::Root
            } else {
                Operator::Log
            };
            Ok(AstNode::operator(op, vec![x]))
        }
        "root" | "log" => {
            let (op, qualifier) = if name == "root" {
                (Operator::Root, Qualifier::Degree)
            } else {
                (Operator::Log, Qualifier::Logbase)
            };
            match <[AstNode; 2]>::try_from(args) {
                Ok([base, x]) => Ok(AstNode::operator(
                    op,
                    vec![AstNode::qualifier(qualifier, vec![base]), x],
                )),
                Err(args) if args.len() == 1 => Ok(AstNode::operator(op, args)),
                Err(_) => Err(arity("1 or 2")),
            }
        }
        "delay" | "rateOf" => {
            let kind = if name == "delay" {
                SymbolKind::Delay
            } else {
                SymbolKind::RateOf
            };
            if !kind.arity().accepts(found) {
                return Err(arity(if name == "delay" { "2" } else { "1" }));
            }
            let mut node = AstNode::symbol(kind);
            for arg in args {
                node.add_child(arg).map_err(|_| arity("well-formed"))?;
            }
            Ok(node)
        }
        "piecewise" => {
            let mut children = Vec::with_capacity(found / 2 + 1);
            let mut args = args.into_iter();
            while let Some(value) = args.next() {
                match args.next() {
                    Some(condition) => children.push(AstNode::piece(value, condition)),
                    None => children.push(AstNode::otherwise(value)),
                }
            }
            Ok(AstNode::operator(Operator::Piecewise, children))
        }
        "lambda" => {
            let mut args = args;
            let body = args.pop().ok_or_else(|| arity("at least 1"))?;
            let mut children = Vec::with_capacity(found);
            for arg in args {
                if !matches!(arg.kind(), AstKind::Name(_)) {
                    return Err(FormulaError::LambdaParameter);
                }
                children.push(AstNode::qualifier(Qualifier::Bvar, vec![arg]));
            }
            children.push(body);
            Ok(AstNode::operator(Operator::Lambda, children))
        }
        _ => match operator_alias(name) {
            Some(op) => Ok(AstNode::operator(op, args)),
            None => Ok(AstNode::function(name, args)),
        },
    }
}

/// Folds `head (op rhs)*` left to right. Runs of the same n-ary operator
/// collapse into one node.
fn fold_infix<'i>(
    mut inner: Pairs<'i, Rule>,
    parent: &str,
    operator: impl Fn(&str) -> Operator,
) -> Result<AstNode, FormulaError> {
    let mut head = parse_value(next_pair(&mut inner, parent)?)?;
    let mut chain: Option<Operator> = None;
    while let Some(op_pair) = inner.next() {
        let op = operator(op_pair.as_str());
        let rhs = parse_value(next_pair(&mut inner, parent)?)?;
        if chain == Some(op) {
            head.add_child(rhs).map_err(|_| FormulaError::Structure(parent.to_string()))?;
        } else {
            head = AstNode::operator(op, vec![head, rhs]);
            chain = match op {
                Operator::Plus | Operator::Times => Some(op),
                _ => None,
            };
        }
    }
    Ok(head)
}

/// Descends through rules that only wrap a single child, so that redundant
/// parentheses and precedence levels cost no recursion.
fn skip_wrappers(mut pair: Pair<'_, Rule>) -> Pair<'_, Rule> {
    loop {
        match pair.as_rule() {
            Rule::expression
            | Rule::factor
            | Rule::or_expr
            | Rule::and_expr
            | Rule::rel_expr
            | Rule::sum
            | Rule::term
            | Rule::unary
            | Rule::power => {
                let mut inner = pair.clone().into_inner();
                match (inner.next(), inner.next()) {
                    (Some(only), None) => pair = only,
                    _ => return pair,
                }
            }
            _ => return pair,
        }
    }
}

fn parse_value(pair: Pair<'_, Rule>) -> Result<AstNode, FormulaError> {
    let pair = skip_wrappers(pair);
    let text = pair.as_str();
    match pair.as_rule() {
        // or_expr    = { and_expr ~ ("||" ~ and_expr)* }
        Rule::or_expr => parse_logical(pair, Operator::Or),

        // and_expr   = { rel_expr ~ ("&&" ~ rel_expr)* }
        Rule::and_expr => parse_logical(pair, Operator::And),

        // rel_expr   = { sum ~ (rel_op ~ sum)* }
        Rule::rel_expr => parse_relational(pair),

        // sum        = { term ~ (term_op ~ term)* }
        Rule::sum => fold_infix(pair.into_inner(), text, |op| {
            //term_op    = @{ "+" | "-" }
            if op == "+" {
                Operator::Plus
            } else {
                Operator::Minus
            }
        }),

        // term       = { unary ~ (factor_op ~ unary)* }
        Rule::term => fold_infix(pair.into_inner(), text, |op| {
            //factor_op  = @{ "*" | "/" }
            if op == "*" {
                Operator::Times
            } else {
                Operator::Divide
            }
        }),

        // unary      = { unary_op* ~ power }
        Rule::unary => parse_unary(pair),

        // power      = { factor ~ ("^" ~ unary)? }
        Rule::power => {
            let mut inner = pair.into_inner();
            let base = parse_value(next_pair(&mut inner, text)?)?;
            let exponent = parse_value(next_pair(&mut inner, text)?)?;
            Ok(AstNode::operator(Operator::Power, vec![base, exponent]))
        }

        // call       = { name ~ "(" ~ (expression ~ ("," ~ expression)*)? ~ ")" }
        Rule::call => {
            let mut inner = pair.into_inner();
            let name = next_pair(&mut inner, text)?.as_str();
            let args = inner.map(parse_value).collect::<Result<Vec<_>, _>>()?;
            build_call(name, args)
        }

        Rule::number => parse_number(text),

        Rule::name => Ok(parse_name(text)),

        _ => Err(FormulaError::Structure(text.to_string())),
    }
}

fn parse_logical(pair: Pair<'_, Rule>, op: Operator) -> Result<AstNode, FormulaError> {
    let children = pair
        .into_inner()
        .map(parse_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AstNode::operator(op, children))
}

fn parse_relational(pair: Pair<'_, Rule>) -> Result<AstNode, FormulaError> {
    let text = pair.as_str();
    let mut inner = pair.into_inner();
    let mut operands = vec![parse_value(next_pair(&mut inner, text)?)?];
    let mut ops = Vec::new();
    while let Some(op) = inner.next() {
        //rel_op     = @{ "==" | "!=" | ">=" | "<=" | ">" | "<" }
        ops.push(match op.as_str() {
            "==" => Operator::Eq,
            "!=" => Operator::Neq,
            ">=" => Operator::Geq,
            "<=" => Operator::Leq,
            ">" => Operator::Gt,
            _ => Operator::Lt,
        });
        operands.push(parse_value(next_pair(&mut inner, text)?)?);
    }
    match ops.first().copied() {
        None => operands
            .pop()
            .ok_or_else(|| FormulaError::Structure(text.to_string())),
        // a < b < c means lt(a, b, c); neq is strictly binary
        Some(op) if op != Operator::Neq && ops.iter().all(|o| *o == op) => {
            Ok(AstNode::operator(op, operands))
        }
        Some(_) => {
            let mut operands = operands.into_iter();
            let mut head = operands
                .next()
                .ok_or_else(|| FormulaError::Structure(text.to_string()))?;
            for (op, rhs) in ops.into_iter().zip(operands) {
                head = AstNode::operator(op, vec![head, rhs]);
            }
            Ok(head)
        }
    }
}

fn parse_unary(pair: Pair<'_, Rule>) -> Result<AstNode, FormulaError> {
    let text = pair.as_str();
    let mut ops = Vec::new();
    let mut power = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::unary_op => ops.push(inner.as_str()),
            _ => power = Some(inner),
        }
    }
    let power = power.ok_or_else(|| FormulaError::Structure(text.to_string()))?;
    let mut node = match (ops.last(), bare_literal(&power)) {
        // a minus directly in front of a literal makes a negative literal
        (Some(&"-"), Some(literal)) => {
            ops.pop();
            if literal == "INF" {
                AstNode::real(f64::NEG_INFINITY)
            } else {
                parse_number(&format!("-{literal}"))?
            }
        }
        _ => parse_value(power)?,
    };
    for op in ops.into_iter().rev() {
        let op = if op == "-" {
            Operator::Minus
        } else {
            Operator::Not
        };
        node = AstNode::operator(op, vec![node]);
    }
    Ok(node)
}

/// The text of a `power` that is just a number, or the name `INF`.
fn bare_literal<'i>(power: &Pair<'i, Rule>) -> Option<&'i str> {
    let mut inner = power.clone().into_inner();
    let factor = inner.next()?;
    if inner.next().is_some() {
        return None;
    }
    let atom = factor.into_inner().next()?;
    match atom.as_rule() {
        Rule::number => Some(atom.as_str()),
        Rule::name if atom.as_str() == "INF" => Some(atom.as_str()),
        _ => None,
    }
}

pub fn parse_formula(text: &str) -> Result<AstNode, FormulaError> {
    check_nesting(text)?;
    let main = FormulaParser::parse(Rule::main, text)
        .map_err(Box::new)?
        .next()
        .ok_or_else(|| FormulaError::Structure(text.to_string()))?;
    let expression = next_pair(&mut main.into_inner(), text)?;
    parse_value(expression)
}
