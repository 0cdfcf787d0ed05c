use std::fmt;

pub const SBML_SYMBOLS_URL: &str = "http://www.sbml.org/sbml/symbols/";

/// Number of children a node kind expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Fixed(m) => n == m,
            Arity::Range(lo, hi) => lo <= n && n <= hi,
            Arity::AtLeast(lo) => n >= lo,
        }
    }

    pub fn is_variadic(&self) -> bool {
        !matches!(self, Arity::Fixed(_))
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{n}"),
            Arity::Range(lo, hi) => write!(f, "{lo} to {hi}"),
            Arity::AtLeast(lo) => write!(f, "at least {lo}"),
        }
    }
}

/// Built-in MathML operators and functions, i.e. everything that appears as
/// the first (empty) element of an `<apply>`, plus `piecewise` and `lambda`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Times,
    Divide,
    Power,
    Root,
    Abs,
    Exp,
    Ln,
    Log,
    Floor,
    Ceiling,
    Factorial,
    Quotient,
    Rem,
    Max,
    Min,
    Sin,
    Cos,
    Tan,
    Sec,
    Csc,
    Cot,
    Sinh,
    Cosh,
    Tanh,
    Sech,
    Csch,
    Coth,
    Arcsin,
    Arccos,
    Arctan,
    Arcsec,
    Arccsc,
    Arccot,
    Arcsinh,
    Arccosh,
    Arctanh,
    Arcsech,
    Arccsch,
    Arccoth,
    Eq,
    Neq,
    Gt,
    Lt,
    Geq,
    Leq,
    And,
    Or,
    Xor,
    Not,
    Implies,
    Piecewise,
    Lambda,
}

impl Operator {
    pub const ALL: &'static [Operator] = &[
        Operator::Plus,
        Operator::Minus,
        Operator::Times,
        Operator::Divide,
        Operator::Power,
        Operator::Root,
        Operator::Abs,
        Operator::Exp,
        Operator::Ln,
        Operator::Log,
        Operator::Floor,
        Operator::Ceiling,
        Operator::Factorial,
        Operator::Quotient,
        Operator::Rem,
        Operator::Max,
        Operator::Min,
        Operator::Sin,
        Operator::Cos,
        Operator::Tan,
        Operator::Sec,
        Operator::Csc,
        Operator::Cot,
        Operator::Sinh,
        Operator::Cosh,
        Operator::Tanh,
        Operator::Sech,
        Operator::Csch,
        Operator::Coth,
        Operator::Arcsin,
        Operator::Arccos,
        Operator::Arctan,
        Operator::Arcsec,
        Operator::Arccsc,
        Operator::Arccot,
        Operator::Arcsinh,
        Operator::Arccosh,
        Operator::Arctanh,
        Operator::Arcsech,
        Operator::Arccsch,
        Operator::Arccoth,
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Lt,
        Operator::Geq,
        Operator::Leq,
        Operator::And,
        Operator::Or,
        Operator::Xor,
        Operator::Not,
        Operator::Implies,
        Operator::Piecewise,
        Operator::Lambda,
    ];

    /// MathML element name, which is also the function-call name used by the
    /// infix notation.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Plus => "plus",
            Operator::Minus => "minus",
            Operator::Times => "times",
            Operator::Divide => "divide",
            Operator::Power => "power",
            Operator::Root => "root",
            Operator::Abs => "abs",
            Operator::Exp => "exp",
            Operator::Ln => "ln",
            Operator::Log => "log",
            Operator::Floor => "floor",
            Operator::Ceiling => "ceiling",
            Operator::Factorial => "factorial",
            Operator::Quotient => "quotient",
            Operator::Rem => "rem",
            Operator::Max => "max",
            Operator::Min => "min",
            Operator::Sin => "sin",
            Operator::Cos => "cos",
            Operator::Tan => "tan",
            Operator::Sec => "sec",
            Operator::Csc => "csc",
            Operator::Cot => "cot",
            Operator::Sinh => "sinh",
            Operator::Cosh => "cosh",
            Operator::Tanh => "tanh",
            Operator::Sech => "sech",
            Operator::Csch => "csch",
            Operator::Coth => "coth",
            Operator::Arcsin => "arcsin",
            Operator::Arccos => "arccos",
            Operator::Arctan => "arctan",
            Operator::Arcsec => "arcsec",
            Operator::Arccsc => "arccsc",
            Operator::Arccot => "arccot",
            Operator::Arcsinh => "arcsinh",
            Operator::Arccosh => "arccosh",
            Operator::Arctanh => "arctanh",
            Operator::Arcsech => "arcsech",
            Operator::Arccsch => "arccsch",
            Operator::Arccoth => "arccoth",
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::Geq => "geq",
            Operator::Leq => "leq",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Xor => "xor",
            Operator::Not => "not",
            Operator::Implies => "implies",
            Operator::Piecewise => "piecewise",
            Operator::Lambda => "lambda",
        }
    }

    pub fn from_name(name: &str) -> Option<Operator> {
        Operator::ALL.iter().copied().find(|op| op.name() == name)
    }

    pub fn arity(&self) -> Arity {
        match self {
            Operator::Plus | Operator::Times | Operator::And | Operator::Or | Operator::Xor => {
                Arity::AtLeast(0)
            }
            Operator::Piecewise => Arity::AtLeast(0),
            Operator::Minus | Operator::Root | Operator::Log => Arity::Range(1, 2),
            Operator::Divide
            | Operator::Power
            | Operator::Quotient
            | Operator::Rem
            | Operator::Implies
            | Operator::Neq => Arity::Fixed(2),
            Operator::Eq | Operator::Gt | Operator::Lt | Operator::Geq | Operator::Leq => {
                Arity::AtLeast(2)
            }
            Operator::Max | Operator::Min | Operator::Lambda => Arity::AtLeast(1),
            _ => Arity::Fixed(1),
        }
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            Operator::Eq | Operator::Neq | Operator::Gt | Operator::Lt | Operator::Geq | Operator::Leq
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            Operator::And | Operator::Or | Operator::Xor | Operator::Not | Operator::Implies
        )
    }

    pub fn is_trigonometric(&self) -> bool {
        matches!(
            self,
            Operator::Sin
                | Operator::Cos
                | Operator::Tan
                | Operator::Sec
                | Operator::Csc
                | Operator::Cot
                | Operator::Sinh
                | Operator::Cosh
                | Operator::Tanh
                | Operator::Sech
                | Operator::Csch
                | Operator::Coth
                | Operator::Arcsin
                | Operator::Arccos
                | Operator::Arctan
                | Operator::Arcsec
                | Operator::Arccsc
                | Operator::Arccot
                | Operator::Arcsinh
                | Operator::Arccosh
                | Operator::Arctanh
                | Operator::Arcsech
                | Operator::Arccsch
                | Operator::Arccoth
        )
    }

    /// Operators whose arguments must all evaluate to numbers.
    pub fn takes_numeric_args(&self) -> bool {
        !(self.is_logical()
            || matches!(
                self,
                Operator::Eq | Operator::Neq | Operator::Piecewise | Operator::Lambda
            ))
    }

    pub fn returns_boolean(&self) -> bool {
        self.is_relational() || self.is_logical()
    }

    /// Operators written as `<apply><op/> ...</apply>`; piecewise and lambda
    /// are elements in their own right.
    pub fn is_applied(&self) -> bool {
        !matches!(self, Operator::Piecewise | Operator::Lambda)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Qualifier {
    Bvar,
    Degree,
    Logbase,
    Piece,
    Otherwise,
}

impl Qualifier {
    pub fn name(&self) -> &'static str {
        match self {
            Qualifier::Bvar => "bvar",
            Qualifier::Degree => "degree",
            Qualifier::Logbase => "logbase",
            Qualifier::Piece => "piece",
            Qualifier::Otherwise => "otherwise",
        }
    }

    pub fn from_name(name: &str) -> Option<Qualifier> {
        match name {
            "bvar" => Some(Qualifier::Bvar),
            "degree" => Some(Qualifier::Degree),
            "logbase" => Some(Qualifier::Logbase),
            "piece" => Some(Qualifier::Piece),
            "otherwise" => Some(Qualifier::Otherwise),
            _ => None,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Qualifier::Piece => Arity::Fixed(2),
            _ => Arity::Fixed(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    True,
    False,
    Pi,
    ExponentialE,
    Infinity,
    NotANumber,
}

impl Constant {
    pub fn name(&self) -> &'static str {
        match self {
            Constant::True => "true",
            Constant::False => "false",
            Constant::Pi => "pi",
            Constant::ExponentialE => "exponentiale",
            Constant::Infinity => "infinity",
            Constant::NotANumber => "notanumber",
        }
    }

    pub fn from_name(name: &str) -> Option<Constant> {
        match name {
            "true" => Some(Constant::True),
            "false" => Some(Constant::False),
            "pi" => Some(Constant::Pi),
            "exponentiale" => Some(Constant::ExponentialE),
            "infinity" => Some(Constant::Infinity),
            "notanumber" => Some(Constant::NotANumber),
            _ => None,
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Constant::True | Constant::False)
    }

    pub fn value(&self) -> f64 {
        match self {
            Constant::True => 1.0,
            Constant::False => 0.0,
            Constant::Pi => std::f64::consts::PI,
            Constant::ExponentialE => std::f64::consts::E,
            Constant::Infinity => f64::INFINITY,
            Constant::NotANumber => f64::NAN,
        }
    }
}

/// The SBML `csymbol` definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Time,
    Avogadro,
    Delay,
    RateOf,
}

impl SymbolKind {
    pub fn definition_url(&self) -> &'static str {
        match self {
            SymbolKind::Time => "http://www.sbml.org/sbml/symbols/time",
            SymbolKind::Avogadro => "http://www.sbml.org/sbml/symbols/avogadro",
            SymbolKind::Delay => "http://www.sbml.org/sbml/symbols/delay",
            SymbolKind::RateOf => "http://www.sbml.org/sbml/symbols/rateOf",
        }
    }

    pub fn from_definition_url(url: &str) -> Option<SymbolKind> {
        let url = url.trim();
        let symbol = url.strip_prefix(SBML_SYMBOLS_URL)?;
        match symbol {
            "time" => Some(SymbolKind::Time),
            "avogadro" => Some(SymbolKind::Avogadro),
            "delay" => Some(SymbolKind::Delay),
            "rateOf" => Some(SymbolKind::RateOf),
            _ => None,
        }
    }

    pub fn default_name(&self) -> &'static str {
        match self {
            SymbolKind::Time => "time",
            SymbolKind::Avogadro => "avogadro",
            SymbolKind::Delay => "delay",
            SymbolKind::RateOf => "rateOf",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            SymbolKind::Time | SymbolKind::Avogadro => Arity::Fixed(0),
            SymbolKind::Delay => Arity::Fixed(2),
            SymbolKind::RateOf => Arity::Fixed(1),
        }
    }

    /// Symbols that are applied to arguments rather than used as values.
    pub fn is_function(&self) -> bool {
        matches!(self, SymbolKind::Delay | SymbolKind::RateOf)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub definition_url: Option<String>,
}

impl Identifier {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            definition_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Csymbol {
    pub kind: SymbolKind,
    pub name: String,
    pub encoding: String,
    pub definition_url: String,
}

impl Csymbol {
    pub fn new(kind: SymbolKind) -> Self {
        Self {
            kind,
            name: kind.default_name().to_string(),
            encoding: "text".to_string(),
            definition_url: kind.definition_url().to_string(),
        }
    }

    pub fn with_name(kind: SymbolKind, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Csymbol::new(kind)
        }
    }
}

/// An `<annotation>` attached to a `<semantics>` element, kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub encoding: Option<String>,
    pub content: String,
}

/// Coarse capability classes, used where behaviour depends only on what a
/// node is able to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClass {
    Unknown,
    Number,
    Identifier,
    IdentifierFunction,
    Constant,
    SymbolicConstant,
    Operator,
    Qualifier,
    Semantics,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstKind {
    /// A node that has not been given a type yet.
    Unknown,
    Integer(i64),
    Real(f64),
    RealExponent { mantissa: f64, exponent: i64 },
    Rational { numerator: i64, denominator: i64 },
    Name(Identifier),
    Function(Identifier),
    Constant(Constant),
    Symbol(Csymbol),
    Operator(Operator),
    Qualifier(Qualifier),
    Semantics(Vec<Annotation>),
}

impl AstKind {
    pub fn class(&self) -> NodeClass {
        match self {
            AstKind::Unknown => NodeClass::Unknown,
            AstKind::Integer(_)
            | AstKind::Real(_)
            | AstKind::RealExponent { .. }
            | AstKind::Rational { .. } => NodeClass::Number,
            AstKind::Name(_) => NodeClass::Identifier,
            AstKind::Function(_) => NodeClass::IdentifierFunction,
            AstKind::Constant(_) => NodeClass::Constant,
            AstKind::Symbol(_) => NodeClass::SymbolicConstant,
            AstKind::Operator(_) => NodeClass::Operator,
            AstKind::Qualifier(_) => NodeClass::Qualifier,
            AstKind::Semantics(_) => NodeClass::Semantics,
        }
    }

    pub fn accepts_children(&self) -> bool {
        match self {
            AstKind::Unknown
            | AstKind::Integer(_)
            | AstKind::Real(_)
            | AstKind::RealExponent { .. }
            | AstKind::Rational { .. }
            | AstKind::Name(_)
            | AstKind::Constant(_) => false,
            AstKind::Symbol(symbol) => symbol.kind.is_function(),
            _ => true,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            AstKind::Function(_) => Arity::AtLeast(0),
            AstKind::Symbol(symbol) => symbol.kind.arity(),
            AstKind::Operator(op) => op.arity(),
            AstKind::Qualifier(qualifier) => qualifier.arity(),
            AstKind::Semantics(_) => Arity::Fixed(1),
            _ => Arity::Fixed(0),
        }
    }

    pub fn is_number(&self) -> bool {
        self.class() == NodeClass::Number
    }

    pub fn is_operator(&self, op: Operator) -> bool {
        matches!(self, AstKind::Operator(o) if *o == op)
    }

    pub fn is_qualifier(&self, qualifier: Qualifier) -> bool {
        matches!(self, AstKind::Qualifier(q) if *q == qualifier)
    }

    pub fn is_symbol(&self, kind: SymbolKind) -> bool {
        matches!(self, AstKind::Symbol(s) if s.kind == kind)
    }

    /// The numeric value of a literal or constant.
    pub fn value(&self) -> Option<f64> {
        match self {
            AstKind::Integer(v) => Some(*v as f64),
            AstKind::Real(v) => Some(*v),
            AstKind::RealExponent { mantissa, exponent } => Some(
                format!("{mantissa}e{exponent}")
                    .parse()
                    .unwrap_or(mantissa * 10f64.powf(*exponent as f64)),
            ),
            AstKind::Rational {
                numerator,
                denominator,
            } => Some(*numerator as f64 / *denominator as f64),
            AstKind::Constant(c) => Some(c.value()),
            _ => None,
        }
    }

    /// The identifier carried by `ci` and `csymbol` nodes.
    pub fn name(&self) -> Option<&str> {
        match self {
            AstKind::Name(ident) | AstKind::Function(ident) => Some(ident.name.as_str()),
            AstKind::Symbol(symbol) => Some(symbol.name.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for AstKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AstKind::Unknown => write!(f, "unknown"),
            AstKind::Integer(_) => write!(f, "integer"),
            AstKind::Real(_) => write!(f, "real"),
            AstKind::RealExponent { .. } => write!(f, "e-notation"),
            AstKind::Rational { .. } => write!(f, "rational"),
            AstKind::Name(ident) => write!(f, "ci {}", ident.name),
            AstKind::Function(ident) => write!(f, "function {}", ident.name),
            AstKind::Constant(c) => write!(f, "{}", c.name()),
            AstKind::Symbol(symbol) => write!(f, "csymbol {}", symbol.kind.default_name()),
            AstKind::Operator(op) => write!(f, "{op}"),
            AstKind::Qualifier(q) => write!(f, "{}", q.name()),
            AstKind::Semantics(_) => write!(f, "semantics"),
        }
    }
}
