use std::num::IntErrorKind;

use log::{debug, warn};

use crate::ast::{
    Annotation, AstKind, AstNode, Constant, Csymbol, Identifier, Operator, Qualifier, SymbolKind,
};
use crate::error::{ErrorCode, ErrorLog};
use crate::namespace::ReadOptions;

use super::stream::{XmlInputStream, XmlToken};

/// MathML 2 content elements that SBML does not permit.
const DISALLOWED_ELEMENTS: &[&str] = &[
    "annotation",
    "annotation-xml",
    "approx",
    "arg",
    "card",
    "cartesianproduct",
    "complexes",
    "compose",
    "condition",
    "conjugate",
    "curl",
    "declare",
    "determinant",
    "diff",
    "divergence",
    "domain",
    "domainofapplication",
    "emptyset",
    "equivalent",
    "eulergamma",
    "exists",
    "factorof",
    "forall",
    "gcd",
    "grad",
    "ident",
    "image",
    "imaginary",
    "imaginaryi",
    "in",
    "int",
    "integers",
    "intersect",
    "interval",
    "inverse",
    "laplacian",
    "lcm",
    "limit",
    "list",
    "lowlimit",
    "matrix",
    "matrixrow",
    "mean",
    "median",
    "mode",
    "moment",
    "momentabout",
    "naturalnumbers",
    "notin",
    "notprsubset",
    "notsubset",
    "outerproduct",
    "partialdiff",
    "primes",
    "product",
    "prsubset",
    "rationals",
    "real",
    "reals",
    "scalarproduct",
    "sdev",
    "selector",
    "sep",
    "set",
    "setdiff",
    "subset",
    "sum",
    "tendsto",
    "transpose",
    "union",
    "uplimit",
    "variance",
    "vector",
    "vectorproduct",
];

/// Recursive-descent reader over an [`XmlInputStream`]. Problems are logged
/// into the borrowed [`ErrorLog`]; a `None` result means a serious error was
/// logged and the expression could not be built.
pub struct MathMLReader<'s, 'l> {
    stream: &'s mut XmlInputStream,
    options: ReadOptions,
    log: &'l mut ErrorLog,
}

impl<'s, 'l> MathMLReader<'s, 'l> {
    pub fn new(stream: &'s mut XmlInputStream, options: ReadOptions, log: &'l mut ErrorLog) -> Self {
        Self {
            stream,
            options,
            log,
        }
    }

    fn error(&mut self, code: ErrorCode, text: String) {
        let position = self
            .stream
            .last_position()
            .or_else(|| self.stream.position());
        if !code.is_serious() {
            warn!("{}: {}", code.short_message(), text);
        }
        self.log.log(code, text, position);
    }

    /// Reads a `<math>` element, which must hold exactly one expression. The
    /// stream is left past `</math>`.
    pub fn read_math(&mut self) -> Option<AstNode> {
        self.stream.skip_text();
        if !self.stream.peek_is_start("math") {
            let found = self
                .stream
                .peek()
                .and_then(XmlToken::name)
                .unwrap_or("end of input")
                .to_string();
            self.stream.next();
            self.error(
                ErrorCode::BadMathML,
                format!("expected a <math> element but found '{found}'"),
            );
            return None;
        }
        self.stream.next();
        self.stream.skip_text();
        if self.stream.peek_is_end("math") || self.stream.is_eof() {
            self.stream.skip_past_end("math");
            self.error(
                ErrorCode::BadMathML,
                "the <math> element contains no expression".to_string(),
            );
            return None;
        }
        let node = self.read_node(1)?;
        self.stream.skip_text();
        if !self.stream.peek_is_end("math") {
            self.stream.skip_past_end("math");
            self.error(
                ErrorCode::BadMathML,
                "the <math> element must contain exactly one expression".to_string(),
            );
            return None;
        }
        self.stream.skip_past_end("math");
        Some(node)
    }

    /// Reads one expression element, leaving the stream past its end tag.
    pub fn read_node(&mut self, depth: usize) -> Option<AstNode> {
        if depth > self.options.max_depth {
            self.error(
                ErrorCode::MathNestingTooDeep,
                format!(
                    "expression nesting exceeds the limit of {} levels",
                    self.options.max_depth
                ),
            );
            return None;
        }
        self.stream.skip_text();
        let name = match self.stream.peek() {
            Some(XmlToken::Start { name, .. }) => name.clone(),
            Some(XmlToken::End { name }) => {
                let name = name.clone();
                self.error(
                    ErrorCode::BadMathML,
                    format!("missing expression before </{name}>"),
                );
                return None;
            }
            _ => {
                self.error(
                    ErrorCode::BadMathML,
                    "unexpected end of input while reading an expression".to_string(),
                );
                return None;
            }
        };
        debug!("reading <{}> at {:?}", name, self.stream.position());

        match name.as_str() {
            "cn" => Some(self.read_cn()),
            "ci" => self.read_ci(),
            "csymbol" => self.read_csymbol(),
            "apply" => self.read_apply(depth),
            "semantics" => self.read_semantics(depth),
            "piecewise" => self.read_container(AstKind::Operator(Operator::Piecewise), depth),
            "lambda" => self.read_container(AstKind::Operator(Operator::Lambda), depth),
            _ => {
                if let Some(qualifier) = Qualifier::from_name(&name) {
                    self.read_container(AstKind::Qualifier(qualifier), depth)
                } else if let Some(constant) = Constant::from_name(&name) {
                    let token = self.stream.next()?;
                    // infinity and notanumber read as the real values `<cn>` gives them
                    let mut node = match constant {
                        Constant::Infinity | Constant::NotANumber => AstNode::real(constant.value()),
                        _ => AstNode::constant(constant),
                    };
                    self.read_attributes(&token, &mut node);
                    self.stream.skip_past_end(&name);
                    Some(node)
                } else {
                    self.unknown_element(&name)
                }
            }
        }
    }

    fn unknown_element(&mut self, name: &str) -> Option<AstNode> {
        self.stream.next();
        self.stream.skip_past_end(name);
        if Operator::from_name(name).is_some() {
            self.error(
                ErrorCode::BadMathML,
                format!("the operator <{name}> may only appear as the first child of <apply>"),
            );
        } else if DISALLOWED_ELEMENTS.contains(&name) {
            self.error(
                ErrorCode::DisallowedMathMLSymbol,
                format!("the MathML element <{name}> is not permitted in SBML"),
            );
        } else {
            self.error(
                ErrorCode::BadMathMLNodeType,
                format!("<{name}> is not a recognised MathML element"),
            );
        }
        None
    }

    /// Applies the attributes shared by all elements and reports attributes
    /// that are not allowed on this element.
    fn read_attributes(&mut self, token: &XmlToken, node: &mut AstNode) {
        let element = token.name().unwrap_or_default().to_string();
        for attr in token.attributes() {
            match attr.name.as_str() {
                "id" => node.set_id(&attr.value),
                "class" => node.set_class_attr(&attr.value),
                "style" => node.set_style(&attr.value),
                "encoding" if !matches!(element.as_str(), "csymbol" | "semantics") => {
                    self.error(
                        ErrorCode::DisallowedMathMLEncodingUse,
                        format!("'encoding' is not allowed on <{element}>"),
                    );
                }
                "definitionURL" => {
                    let allowed = match element.as_str() {
                        "csymbol" | "semantics" => true,
                        "ci" => self.options.namespace.is_at_least(3, 2),
                        _ => false,
                    };
                    if !allowed {
                        self.error(
                            ErrorCode::DisallowedDefinitionURLUse,
                            format!("'definitionURL' is not allowed on <{element}>"),
                        );
                    }
                }
                "type" if element != "cn" => {
                    self.error(
                        ErrorCode::DisallowedMathTypeAttributeUse,
                        format!("'type' is not allowed on <{element}>"),
                    );
                }
                "units" if element != "cn" => {
                    self.error(
                        ErrorCode::DisallowedMathUnitsUse,
                        format!("'units' is not allowed on <{element}>"),
                    );
                }
                _ => (),
            }
        }
    }

    /// Reads the character data of a `<cn>`, split at `<sep/>` if present.
    fn read_cn_content(&mut self) -> (String, Option<String>) {
        let first = self.stream.read_text();
        if self.stream.peek_is_start("sep") {
            self.stream.next();
            self.stream.skip_past_end("sep");
            let second = self.stream.read_text();
            (first, Some(second))
        } else {
            (first, None)
        }
    }

    fn read_cn(&mut self) -> AstNode {
        let token = match self.stream.next() {
            Some(token) => token,
            None => return AstNode::real(0.0),
        };
        let number_type = token.attribute("type").unwrap_or("real").trim().to_string();
        let (first, second) = self.read_cn_content();
        self.stream.skip_past_end("cn");

        let kind = match number_type.as_str() {
            "integer" => match first.parse::<i64>() {
                Ok(value) => AstKind::Integer(value),
                Err(e) => {
                    let reason = match e.kind() {
                        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                            "does not fit in a 64-bit integer"
                        }
                        _ => "is not an integer",
                    };
                    self.error(
                        ErrorCode::FailedMathMLReadOfInteger,
                        format!("the <cn> value '{first}' {reason}"),
                    );
                    AstKind::Integer(0)
                }
            },
            "real" => match first.parse::<f64>() {
                Ok(value) => AstKind::Real(value),
                Err(_) => {
                    self.error(
                        ErrorCode::FailedMathMLReadOfDouble,
                        format!("the <cn> value '{first}' is not a real number"),
                    );
                    AstKind::Real(0.0)
                }
            },
            "e-notation" => {
                let parsed = second.as_deref().and_then(|exponent| {
                    Some((first.parse::<f64>().ok()?, exponent.parse::<i64>().ok()?))
                });
                match parsed {
                    Some((mantissa, exponent)) => AstKind::RealExponent { mantissa, exponent },
                    None => {
                        self.error(
                            ErrorCode::FailedMathMLReadOfExponential,
                            format!(
                                "the <cn> e-notation value '{} <sep/> {}' is invalid",
                                first,
                                second.as_deref().unwrap_or("")
                            ),
                        );
                        AstKind::RealExponent {
                            mantissa: 0.0,
                            exponent: 0,
                        }
                    }
                }
            }
            "rational" => {
                let parsed = second.as_deref().and_then(|denominator| {
                    Some((first.parse::<i64>().ok()?, denominator.parse::<i64>().ok()?))
                });
                match parsed {
                    Some((numerator, denominator)) if denominator != 0 => AstKind::Rational {
                        numerator,
                        denominator,
                    },
                    _ => {
                        self.error(
                            ErrorCode::FailedMathMLReadOfRational,
                            format!(
                                "the <cn> rational value '{} <sep/> {}' is invalid",
                                first,
                                second.as_deref().unwrap_or("")
                            ),
                        );
                        AstKind::Rational {
                            numerator: 0,
                            denominator: 1,
                        }
                    }
                }
            }
            other => {
                self.error(
                    ErrorCode::DisallowedMathTypeAttributeValue,
                    format!("'{other}' is not a permitted value of the <cn> 'type' attribute"),
                );
                AstKind::Real(0.0)
            }
        };

        let mut node = AstNode::new(kind);
        self.read_attributes(&token, &mut node);
        if let Some(units) = token.attribute("units") {
            if self.options.namespace.allows_units() {
                // numeric literals always accept units
                let _ = node.set_units(units);
            } else {
                self.error(
                    ErrorCode::DisallowedMathUnitsUse,
                    format!(
                        "'units' on <cn> is not allowed in SBML {}",
                        self.options.namespace
                    ),
                );
            }
        }
        node
    }

    fn read_ci(&mut self) -> Option<AstNode> {
        let token = self.stream.next()?;
        let name = self.stream.read_text();
        self.stream.skip_past_end("ci");
        if name.is_empty() {
            self.error(
                ErrorCode::BadMathML,
                "a <ci> element must contain an identifier".to_string(),
            );
            return None;
        }
        let mut node = AstNode::new(AstKind::Name(Identifier {
            name,
            definition_url: token.attribute("definitionURL").map(str::to_string),
        }));
        self.read_attributes(&token, &mut node);
        Some(node)
    }

    fn read_csymbol(&mut self) -> Option<AstNode> {
        let token = self.stream.next()?;
        let name = self.stream.read_text();
        self.stream.skip_past_end("csymbol");
        let url = token.attribute("definitionURL").unwrap_or_default();
        let kind = match SymbolKind::from_definition_url(url) {
            Some(kind) => kind,
            None => {
                self.error(
                    ErrorCode::BadCsymbolDefinitionURLValue,
                    format!("'{url}' is not a valid <csymbol> definitionURL"),
                );
                return None;
            }
        };
        let mut symbol = Csymbol::new(kind);
        if !name.is_empty() {
            symbol.name = name;
        }
        if let Some(encoding) = token.attribute("encoding") {
            symbol.encoding = encoding.to_string();
        }
        let mut node = AstNode::new(AstKind::Symbol(symbol));
        self.read_attributes(&token, &mut node);
        Some(node)
    }

    fn read_apply(&mut self, depth: usize) -> Option<AstNode> {
        let token = self.stream.next()?;
        self.stream.skip_text();
        let head = match self.stream.peek() {
            Some(XmlToken::Start { name, .. }) => name.clone(),
            _ => {
                self.stream.skip_past_end("apply");
                self.error(
                    ErrorCode::BadMathML,
                    "an <apply> element must begin with an operator or function".to_string(),
                );
                return None;
            }
        };

        let mut node = match head.as_str() {
            "ci" => {
                let mut function = self.read_ci()?;
                let ident = match function.kind() {
                    AstKind::Name(ident) => ident.clone(),
                    _ => Identifier::new(""),
                };
                // a name never has children, so the change of kind cannot fail
                let _ = function.set_kind(AstKind::Function(ident));
                function
            }
            "csymbol" => {
                let symbol = self.read_csymbol()?;
                if !symbol.kind().accepts_children() {
                    self.stream.skip_past_end("apply");
                    self.error(
                        ErrorCode::BadMathML,
                        format!("the csymbol '{}' cannot be applied to arguments", symbol),
                    );
                    return None;
                }
                symbol
            }
            name => match Operator::from_name(name) {
                Some(op) if op.is_applied() => {
                    let op_token = self.stream.next()?;
                    self.stream.skip_past_end(name);
                    let mut op_node = AstNode::operator(op, Vec::new());
                    self.read_attributes(&op_token, &mut op_node);
                    op_node
                }
                _ => {
                    let name = name.to_string();
                    self.unknown_element(&name);
                    self.stream.skip_past_end("apply");
                    return None;
                }
            },
        };
        self.read_attributes(&token, &mut node);
        if !self.read_children(&mut node, "apply", depth) {
            return None;
        }
        Some(fold_negative_infinity(node))
    }

    /// Reads child expressions until `</end>`, appending them to `node`.
    fn read_children(&mut self, node: &mut AstNode, end: &str, depth: usize) -> bool {
        loop {
            self.stream.skip_text();
            if self.stream.peek_is_end(end) {
                self.stream.next();
                return true;
            }
            if self.stream.is_eof() {
                self.error(
                    ErrorCode::BadMathML,
                    format!("missing </{end}> before end of input"),
                );
                return false;
            }
            let child = match self.read_node(depth + 1) {
                Some(child) => child,
                None => {
                    self.stream.skip_past_end(end);
                    return false;
                }
            };
            if let Err(e) = node.add_child(child) {
                self.stream.skip_past_end(end);
                self.error(ErrorCode::BadMathML, format!("<{end}>: {e}"));
                return false;
            }
        }
    }

    fn read_container(&mut self, kind: AstKind, depth: usize) -> Option<AstNode> {
        let token = self.stream.next()?;
        let end = token.name().unwrap_or_default().to_string();
        let mut node = AstNode::new(kind);
        self.read_attributes(&token, &mut node);
        if self.read_children(&mut node, &end, depth) {
            Some(node)
        } else {
            None
        }
    }

    fn read_semantics(&mut self, depth: usize) -> Option<AstNode> {
        let token = self.stream.next()?;
        let child = match self.read_node(depth + 1) {
            Some(child) => child,
            None => {
                self.stream.skip_past_end("semantics");
                return None;
            }
        };
        let mut annotations = Vec::new();
        loop {
            self.stream.skip_text();
            match self.stream.peek() {
                Some(XmlToken::Start { name, .. }) if name == "annotation" => {
                    let annotation = self.stream.next()?;
                    let content = self.stream.read_text();
                    self.stream.skip_past_end("annotation");
                    annotations.push(Annotation {
                        encoding: annotation.attribute("encoding").map(str::to_string),
                        content,
                    });
                }
                Some(XmlToken::Start { name, .. }) if name == "annotation-xml" => {
                    debug!("skipping <annotation-xml> inside <semantics>");
                    self.stream.next();
                    self.stream.skip_past_end("annotation-xml");
                }
                Some(XmlToken::End { name }) if name == "semantics" => {
                    self.stream.next();
                    break;
                }
                _ => {
                    self.stream.skip_past_end("semantics");
                    self.error(
                        ErrorCode::BadMathML,
                        "a <semantics> element must hold one expression followed by annotations"
                            .to_string(),
                    );
                    return None;
                }
            }
        }
        let mut node = AstNode::semantics(child, annotations);
        self.read_attributes(&token, &mut node);
        Some(node)
    }
}

// the writer spells -INF as <apply><minus/><infinity/></apply>
fn fold_negative_infinity(node: AstNode) -> AstNode {
    let negated_infinity = node.operator_kind() == Some(Operator::Minus)
        && node.num_children() == 1
        && node
            .child(0)
            .is_some_and(|child| child.kind() == &AstKind::Real(f64::INFINITY));
    if negated_infinity {
        AstNode::real(f64::NEG_INFINITY)
    } else {
        node
    }
}

/// Reads a MathML fragment. The text may be a complete `<math>` element or a
/// single bare expression element.
pub fn read_math_from_str(text: &str, options: &ReadOptions, log: &mut ErrorLog) -> Option<AstNode> {
    let mut stream = match XmlInputStream::parse(text) {
        Ok(stream) => stream,
        Err(e) => {
            log.log(
                ErrorCode::BadMathML,
                format!("malformed XML: {}", e.message),
                Some((e.line, e.column)),
            );
            return None;
        }
    };
    stream.skip_text();
    let mut reader = MathMLReader::new(&mut stream, *options, log);
    if reader.stream.peek_is_start("math") {
        reader.read_math()
    } else {
        reader.read_node(1)
    }
}
