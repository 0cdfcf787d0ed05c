//! SBML math consistency rules. Each rule is a [`MathCheck`] that walks one
//! tree in the context of its model and owning element, logging one
//! diagnostic per violation.

use std::fmt;

use log::{debug, info};

use crate::ast::{AstKind, AstNode, Constant, Operator, Qualifier};
use crate::error::{ErrorCode, ErrorLog};
use crate::formula::to_formula;
use crate::model::{ModelContext, SymbolType};

pub mod arity;
pub mod boolean_args;
pub mod equality_args;
pub mod function_apply;
pub mod lambda;
pub mod local_parameters;
pub mod model_component;
pub mod numeric_args;
pub mod numeric_result;
pub mod piecewise;
pub mod units;

pub use arity::OperatorArity;
pub use boolean_args::BooleanArgs;
pub use equality_args::EqualityArgs;
pub use function_apply::{FunctionArgumentCount, FunctionReference};
pub use lambda::LambdaPlacement;
pub use local_parameters::LocalParameterScope;
pub use model_component::ModelComponentReference;
pub use numeric_args::NumericArgs;
pub use numeric_result::NumericResult;
pub use piecewise::{PieceCondition, PiecewiseTypes};
pub use units::UnitsValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    FunctionDefinition,
    /// The kinetic law of the reaction with this index in the model.
    KineticLaw { reaction: usize },
    AssignmentRule,
    RateRule,
    AlgebraicRule,
    InitialAssignment,
    EventAssignment,
    Trigger,
    Delay,
    Priority,
    Constraint,
    StoichiometryMath,
}

impl ElementKind {
    pub fn requires_numeric(&self) -> bool {
        !matches!(
            self,
            ElementKind::FunctionDefinition | ElementKind::Trigger | ElementKind::Constraint
        )
    }

    pub fn element_name(&self) -> &'static str {
        match self {
            ElementKind::FunctionDefinition => "functionDefinition",
            ElementKind::KineticLaw { .. } => "kineticLaw",
            ElementKind::AssignmentRule => "assignmentRule",
            ElementKind::RateRule => "rateRule",
            ElementKind::AlgebraicRule => "algebraicRule",
            ElementKind::InitialAssignment => "initialAssignment",
            ElementKind::EventAssignment => "eventAssignment",
            ElementKind::Trigger => "trigger",
            ElementKind::Delay => "delay",
            ElementKind::Priority => "priority",
            ElementKind::Constraint => "constraint",
            ElementKind::StoichiometryMath => "stoichiometryMath",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathElement {
    pub kind: ElementKind,
    pub id: Option<String>,
    pub line: Option<u64>,
    pub column: Option<u64>,
}

impl MathElement {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            id: None,
            line: None,
            column: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn at(mut self, line: u64, column: u64) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn location(&self) -> Option<(u64, u64)> {
        Some((self.line?, self.column?))
    }
}

impl fmt::Display for MathElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}>", self.kind.element_name())?;
        if let Some(id) = &self.id {
            write!(f, " '{id}'")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathType {
    Numeric,
    Boolean,
    /// Not determinable, e.g. a call of an undefined function.
    Unknown,
}

// function bodies can call other functions; stop following calls this deep
const MAX_CALL_DEPTH: usize = 32;

pub struct CheckContext<'a> {
    pub model: &'a dyn ModelContext,
    pub element: &'a MathElement,
}

impl<'a> CheckContext<'a> {
    pub fn new(model: &'a dyn ModelContext, element: &'a MathElement) -> Self {
        Self { model, element }
    }

    pub fn local_parameters(&self) -> &'a [String] {
        match self.element.kind {
            ElementKind::KineticLaw { reaction } => self.model.local_parameters(reaction),
            _ => &[],
        }
    }

    pub fn infer_type(&self, node: &AstNode) -> MathType {
        self.infer_type_at(node, 0)
    }

    fn infer_type_at(&self, node: &AstNode, calls: usize) -> MathType {
        match node.kind() {
            AstKind::Integer(_)
            | AstKind::Real(_)
            | AstKind::RealExponent { .. }
            | AstKind::Rational { .. }
            | AstKind::Symbol(_) => MathType::Numeric,
            AstKind::Constant(Constant::True | Constant::False) => MathType::Boolean,
            AstKind::Constant(_) => MathType::Numeric,
            AstKind::Name(ident) => match self.model.symbol(&ident.name) {
                Some(SymbolType::FunctionDefinition) => MathType::Unknown,
                _ => MathType::Numeric,
            },
            AstKind::Function(ident) => {
                if calls >= MAX_CALL_DEPTH {
                    return MathType::Unknown;
                }
                self.model
                    .function_definition(&ident.name)
                    .and_then(|f| f.body())
                    .map(|body| self.infer_type_at(body, calls + 1))
                    .unwrap_or(MathType::Unknown)
            }
            AstKind::Operator(Operator::Piecewise) => node
                .children()
                .first()
                .and_then(branch_value)
                .map(|value| self.infer_type_at(value, calls))
                .unwrap_or(MathType::Unknown),
            AstKind::Operator(Operator::Lambda) => MathType::Unknown,
            AstKind::Operator(op) if op.returns_boolean() => MathType::Boolean,
            AstKind::Operator(_) => MathType::Numeric,
            AstKind::Semantics(_) => node
                .child(0)
                .map(|child| self.infer_type_at(child, calls))
                .unwrap_or(MathType::Unknown),
            AstKind::Qualifier(_) | AstKind::Unknown => MathType::Unknown,
        }
    }

    pub fn returns_numeric(&self, node: &AstNode) -> bool {
        self.infer_type(node) == MathType::Numeric
    }

    pub fn returns_boolean(&self, node: &AstNode) -> bool {
        self.infer_type(node) == MathType::Boolean
    }

    pub fn report(&self, log: &mut ErrorLog, code: ErrorCode, node: &AstNode, detail: &str) {
        let text = format!(
            "The formula '{}' in the math of {} {}",
            to_formula(node),
            self.element,
            detail
        );
        log.log(code, text, self.element.location());
    }
}

pub(crate) fn branch_value(branch: &AstNode) -> Option<&AstNode> {
    match branch.qualifier_kind() {
        Some(Qualifier::Piece | Qualifier::Otherwise) => branch.child(0),
        _ => Some(branch),
    }
}

pub trait MathCheck {
    fn code(&self) -> ErrorCode;

    /// Whether the rule exists for the model's Level and Version.
    fn applies(&self, _ctx: &CheckContext) -> bool {
        true
    }

    fn check(&self, ctx: &CheckContext, root: &AstNode, log: &mut ErrorLog) {
        self.check_math(ctx, root, log);
    }

    fn check_math(&self, ctx: &CheckContext, node: &AstNode, log: &mut ErrorLog);

    fn check_children(&self, ctx: &CheckContext, node: &AstNode, log: &mut ErrorLog) {
        for child in node.children() {
            self.check_math(ctx, child, log);
        }
    }
}

pub struct MathValidator {
    checks: Vec<Box<dyn MathCheck>>,
}

impl Default for MathValidator {
    fn default() -> Self {
        Self {
            checks: vec![
                Box::new(LambdaPlacement),
                Box::new(BooleanArgs),
                Box::new(NumericArgs),
                Box::new(EqualityArgs),
                Box::new(PiecewiseTypes),
                Box::new(PieceCondition),
                Box::new(FunctionReference),
                Box::new(ModelComponentReference),
                Box::new(LocalParameterScope),
                Box::new(NumericResult),
                Box::new(OperatorArity),
                Box::new(FunctionArgumentCount),
                Box::new(UnitsValue),
            ],
        }
    }
}

impl MathValidator {
    pub fn empty() -> Self {
        Self { checks: Vec::new() }
    }

    pub fn add_check(&mut self, check: Box<dyn MathCheck>) {
        self.checks.push(check);
    }

    pub fn codes(&self) -> Vec<ErrorCode> {
        self.checks.iter().map(|check| check.code()).collect()
    }

    pub fn validate_math(
        &self,
        model: &dyn ModelContext,
        element: &MathElement,
        math: &AstNode,
        log: &mut ErrorLog,
    ) {
        if let Err(err) = math.check_depth() {
            log.log(
                ErrorCode::MathNestingTooDeep,
                format!("the math of {element} is not checked: {err}"),
                element.location(),
            );
            return;
        }
        let ctx = CheckContext::new(model, element);
        for check in &self.checks {
            if !check.applies(&ctx) {
                debug!(
                    "rule {} does not apply to {}",
                    check.code(),
                    model.namespace()
                );
                continue;
            }
            debug!("running rule {} on {}", check.code(), element);
            check.check(&ctx, math, log);
        }
    }

    pub fn validate<'m>(
        &self,
        model: &dyn ModelContext,
        items: impl IntoIterator<Item = (&'m MathElement, &'m AstNode)>,
    ) -> ErrorLog {
        let mut log = ErrorLog::new();
        let mut count = 0;
        for (element, math) in items {
            self.validate_math(model, element, math, &mut log);
            count += 1;
        }
        info!(
            "checked {} math element(s), found {} problem(s)",
            count,
            log.len()
        );
        log
    }
}

#[cfg(test)]
pub(crate) fn run_check(
    check: &dyn MathCheck,
    model: &crate::model::Model,
    element: &MathElement,
    formula: &str,
) -> ErrorLog {
    let math = crate::formula::parse_formula(formula).unwrap();
    let ctx = CheckContext::new(model, element);
    let mut log = ErrorLog::new();
    if check.applies(&ctx) {
        check.check(&ctx, &math, &mut log);
    }
    log
}
