use anyhow::Result;
use log::debug;

use crate::ast::{AstKind, AstNode, Csymbol, Operator, Qualifier};
use crate::namespace::{WriteOptions, MATHML_NS};

use super::stream::XmlOutputStream;

/// Formats a finite real the way C's `%.15g` does. Returns the mantissa text
/// and, when scientific notation is needed, the decimal exponent.
pub fn format_real(value: f64) -> (String, Option<i32>) {
    if value == 0.0 {
        return ("0".to_string(), None);
    }
    let scientific = format!("{:.14e}", value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => return (scientific, None),
    };
    if !(-4..15).contains(&exponent) {
        (trim_fraction(mantissa).to_string(), Some(exponent))
    } else {
        let decimals = (14 - exponent) as usize;
        let fixed = format!("{:.*}", decimals, value);
        (trim_fraction(&fixed).to_string(), None)
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

pub struct MathMLWriter<'s> {
    stream: &'s mut XmlOutputStream,
    options: WriteOptions,
}

impl<'s> MathMLWriter<'s> {
    pub fn new(stream: &'s mut XmlOutputStream, options: WriteOptions) -> Self {
        Self { stream, options }
    }

    /// Writes `<math>` around `node`, declaring the SBML namespace if any
    /// literal carries units.
    pub fn write_math(&mut self, node: &AstNode) -> Result<()> {
        self.stream.start_element("math")?;
        self.stream.write_namespace(None, MATHML_NS)?;
        if node.contains_units() && self.options.namespace.allows_units() {
            let uri = self.options.namespace.uri();
            self.stream.write_namespace(Some("sbml"), &uri)?;
        }
        self.write_node(node)?;
        self.stream.end_element("math")
    }

    fn write_attributes(&mut self, node: &AstNode) -> Result<()> {
        if let Some(id) = node.id() {
            self.stream.write_attribute("id", id)?;
        }
        if let Some(class) = node.class_attr() {
            self.stream.write_attribute("class", class)?;
        }
        if let Some(style) = node.style() {
            self.stream.write_attribute("style", style)?;
        }
        Ok(())
    }

    fn write_children(&mut self, node: &AstNode) -> Result<()> {
        for child in node.children() {
            self.write_node(child)?;
        }
        Ok(())
    }

    fn write_cn(
        &mut self,
        node: &AstNode,
        number_type: Option<&str>,
        first: &str,
        second: Option<&str>,
    ) -> Result<()> {
        self.stream.start_element("cn")?;
        if let Some(number_type) = number_type {
            self.stream.write_attribute("type", number_type)?;
        }
        if let Some(units) = node.units() {
            if self.options.namespace.allows_units() {
                self.stream.write_attribute("sbml:units", units)?;
            }
        }
        self.write_attributes(node)?;
        self.stream.write_characters(&format!(" {first} "))?;
        if let Some(second) = second {
            self.stream.start_end_element("sep")?;
            self.stream.write_characters(&format!(" {second} "))?;
        }
        self.stream.end_element("cn")
    }

    fn write_real(&mut self, node: &AstNode, value: f64) -> Result<()> {
        if value.is_nan() {
            self.stream.start_element("notanumber")?;
            self.write_attributes(node)?;
            return self.stream.end_element("notanumber");
        }
        if value.is_infinite() {
            if value > 0.0 {
                self.stream.start_element("infinity")?;
                self.write_attributes(node)?;
                return self.stream.end_element("infinity");
            }
            self.stream.start_element("apply")?;
            self.write_attributes(node)?;
            self.stream.start_end_element("minus")?;
            self.stream.start_end_element("infinity")?;
            return self.stream.end_element("apply");
        }
        match format_real(value) {
            (mantissa, Some(exponent)) => self.write_cn(
                node,
                Some("e-notation"),
                &mantissa,
                Some(&exponent.to_string()),
            ),
            (text, None) => self.write_cn(node, None, &text, None),
        }
    }

    fn write_csymbol(&mut self, symbol: &Csymbol, node: Option<&AstNode>) -> Result<()> {
        self.stream.start_element("csymbol")?;
        self.stream.write_attribute("encoding", &symbol.encoding)?;
        self.stream
            .write_attribute("definitionURL", &symbol.definition_url)?;
        if let Some(node) = node {
            self.write_attributes(node)?;
        }
        self.stream.write_characters(&format!(" {} ", symbol.name))?;
        self.stream.end_element("csymbol")
    }

    pub fn write_node(&mut self, node: &AstNode) -> Result<()> {
        match node.kind() {
            AstKind::Unknown => {
                debug!("not writing a node of unknown type");
                Ok(())
            }
            AstKind::Integer(value) => self.write_cn(node, Some("integer"), &value.to_string(), None),
            AstKind::Real(value) => self.write_real(node, *value),
            AstKind::RealExponent { mantissa, exponent } => self.write_cn(
                node,
                Some("e-notation"),
                &mantissa.to_string(),
                Some(&exponent.to_string()),
            ),
            AstKind::Rational {
                numerator,
                denominator,
            } => self.write_cn(
                node,
                Some("rational"),
                &numerator.to_string(),
                Some(&denominator.to_string()),
            ),
            AstKind::Name(ident) => {
                self.stream.start_element("ci")?;
                if let Some(url) = &ident.definition_url {
                    self.stream.write_attribute("definitionURL", url)?;
                }
                self.write_attributes(node)?;
                self.stream.write_characters(&format!(" {} ", ident.name))?;
                self.stream.end_element("ci")
            }
            AstKind::Function(ident) => {
                self.stream.start_element("apply")?;
                self.write_attributes(node)?;
                self.stream.start_element("ci")?;
                if let Some(url) = &ident.definition_url {
                    self.stream.write_attribute("definitionURL", url)?;
                }
                self.stream.write_characters(&format!(" {} ", ident.name))?;
                self.stream.end_element("ci")?;
                self.write_children(node)?;
                self.stream.end_element("apply")
            }
            AstKind::Constant(constant) => {
                self.stream.start_element(constant.name())?;
                self.write_attributes(node)?;
                self.stream.end_element(constant.name())
            }
            AstKind::Symbol(symbol) if symbol.kind.is_function() => {
                self.stream.start_element("apply")?;
                self.write_attributes(node)?;
                self.write_csymbol(symbol, None)?;
                self.write_children(node)?;
                self.stream.end_element("apply")
            }
            AstKind::Symbol(symbol) => self.write_csymbol(symbol, Some(node)),
            AstKind::Operator(op @ (Operator::Piecewise | Operator::Lambda)) => {
                self.stream.start_element(op.name())?;
                self.write_attributes(node)?;
                self.write_children(node)?;
                self.stream.end_element(op.name())
            }
            AstKind::Operator(op) => {
                self.stream.start_element("apply")?;
                self.write_attributes(node)?;
                self.stream.start_end_element(op.name())?;
                self.write_children(node)?;
                self.stream.end_element("apply")
            }
            AstKind::Qualifier(qualifier) => {
                self.stream.start_element(qualifier.name())?;
                self.write_attributes(node)?;
                match (qualifier, node.num_children()) {
                    (Qualifier::Degree, 0) => {
                        self.write_node(&AstNode::integer(2))?;
                    }
                    (Qualifier::Logbase, 0) => {
                        self.write_node(&AstNode::integer(10))?;
                    }
                    _ => self.write_children(node)?,
                }
                self.stream.end_element(qualifier.name())
            }
            AstKind::Semantics(annotations) => {
                self.stream.start_element("semantics")?;
                self.write_attributes(node)?;
                self.write_children(node)?;
                for annotation in annotations {
                    self.stream.start_element("annotation")?;
                    if let Some(encoding) = &annotation.encoding {
                        self.stream.write_attribute("encoding", encoding)?;
                    }
                    self.stream.write_characters(&annotation.content)?;
                    self.stream.end_element("annotation")?;
                }
                self.stream.end_element("semantics")
            }
        }
    }
}

/// Serialises `node` as a complete `<math>` element.
pub fn write_math_to_string(node: &AstNode, options: &WriteOptions) -> Result<String> {
    node.check_depth()?;
    let mut stream = XmlOutputStream::new(options.indent);
    MathMLWriter::new(&mut stream, *options).write_math(node)?;
    stream.into_string()
}

/// Serialises `node` without the enclosing `<math>` element. The `sbml`
/// prefix is declared on the fragment root when units are written.
pub fn write_node_to_string(node: &AstNode, options: &WriteOptions) -> Result<String> {
    node.check_depth()?;
    let mut stream = XmlOutputStream::new(options.indent);
    if node.contains_units() && options.namespace.allows_units() {
        stream.declare_on_next_element(Some("sbml"), &options.namespace.uri());
    }
    MathMLWriter::new(&mut stream, *options).write_node(node)?;
    stream.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Constant, Identifier, SymbolKind};
    use crate::error::ErrorLog;
    use crate::mathml::read_math_from_str;
    use crate::namespace::{ReadOptions, SbmlNamespace};

    fn compact() -> WriteOptions {
        WriteOptions {
            indent: false,
            ..Default::default()
        }
    }

    #[test]
    fn formats_like_printf_g() {
        assert_eq!(format_real(2.5), ("2.5".to_string(), None));
        assert_eq!(format_real(100.0), ("100".to_string(), None));
        assert_eq!(format_real(0.1), ("0.1".to_string(), None));
        assert_eq!(format_real(0.0001), ("0.0001".to_string(), None));
        assert_eq!(format_real(1e-5), ("1".to_string(), Some(-5)));
        assert_eq!(format_real(6.02214076e23), ("6.02214076".to_string(), Some(23)));
        assert_eq!(format_real(-3.0), ("-3".to_string(), None));
    }

    #[test]
    fn writes_apply_and_literals() {
        let node = AstNode::operator(
            Operator::Plus,
            vec![AstNode::name("x"), AstNode::integer(3)],
        );
        let text = write_node_to_string(&node, &compact()).unwrap();
        assert!(text.starts_with("<apply>"));
        assert!(text.contains("plus"));
        assert!(text.contains("<ci> x </ci>"));
        assert!(text.contains("<cn type=\"integer\"> 3 </cn>"));
        assert!(text.ends_with("</apply>"));
    }

    #[test]
    fn writes_special_reals() {
        let text = write_node_to_string(&AstNode::real(1e-20), &compact()).unwrap();
        assert!(text.contains("type=\"e-notation\""));
        assert!(text.contains(" 1 "));
        assert!(text.contains(" -20 "));
        let text = write_node_to_string(&AstNode::real(f64::INFINITY), &compact()).unwrap();
        assert!(text.contains("infinity"));
        assert!(!text.contains("minus"));
        let text = write_node_to_string(&AstNode::real(f64::NEG_INFINITY), &compact()).unwrap();
        assert!(text.contains("minus"));
        let text = write_node_to_string(&AstNode::real(f64::NAN), &compact()).unwrap();
        assert!(text.contains("notanumber"));
    }

    #[test]
    fn writes_default_qualifier_values() {
        let root = AstNode::operator(
            Operator::Root,
            vec![
                AstNode::qualifier(Qualifier::Degree, Vec::new()),
                AstNode::name("x"),
            ],
        );
        let text = write_node_to_string(&root, &compact()).unwrap();
        assert!(text.contains("<degree><cn type=\"integer\"> 2 </cn></degree>"));
        let log = AstNode::operator(
            Operator::Log,
            vec![
                AstNode::qualifier(Qualifier::Logbase, Vec::new()),
                AstNode::name("x"),
            ],
        );
        let text = write_node_to_string(&log, &compact()).unwrap();
        assert!(text.contains("<logbase><cn type=\"integer\"> 10 </cn></logbase>"));
    }

    #[test]
    fn units_declare_namespace() {
        let mut two = AstNode::real(2.0);
        two.set_units("mole").unwrap();
        let text = write_math_to_string(&two, &compact()).unwrap();
        assert!(text.contains("xmlns:sbml=\"http://www.sbml.org/sbml/level3/version2/core\""));
        assert!(text.contains("sbml:units=\"mole\""));

        let options = WriteOptions {
            namespace: SbmlNamespace::new(2, 4),
            indent: false,
        };
        let text = write_math_to_string(&two, &options).unwrap();
        assert!(!text.contains("units"));
    }

    #[test]
    fn fragment_with_units_reads_back() {
        let mut two = AstNode::real(2.0);
        two.set_units("mole").unwrap();
        let sum = AstNode::operator(Operator::Plus, vec![AstNode::name("x"), two]);
        let text = write_node_to_string(&sum, &compact()).unwrap();
        assert!(text.starts_with("<apply xmlns:sbml="));
        assert_eq!(text.matches("xmlns:sbml").count(), 1);

        let mut log = ErrorLog::new();
        let back = read_math_from_str(&text, &ReadOptions::default(), &mut log).unwrap();
        assert!(log.is_empty(), "{}", log.as_error_message());
        assert_eq!(back.child(1).unwrap().units(), Some("mole"));
        assert!(back.equivalent(&sum));

        let text = write_node_to_string(&AstNode::name("x"), &compact()).unwrap();
        assert!(!text.contains("xmlns"));
    }

    #[test]
    fn overly_deep_trees_are_refused() {
        let mut node = AstNode::name("x");
        for _ in 0..crate::ast::MAX_NESTING_DEPTH {
            node = AstNode::operator(Operator::Minus, vec![node]);
        }
        let err = write_math_to_string(&node, &compact()).unwrap_err();
        assert!(err.to_string().contains("nested deeper"));
        assert!(write_node_to_string(&node, &compact()).is_err());
    }

    #[test]
    fn function_head_keeps_definition_url() {
        let mut f = AstNode::function("f", vec![AstNode::name("a")]);
        let ident = Identifier {
            name: "f".to_string(),
            definition_url: Some("http://example.org/f".to_string()),
        };
        f.set_kind(AstKind::Function(ident)).unwrap();
        let text = write_node_to_string(&f, &compact()).unwrap();
        assert!(text.contains(r#"<ci definitionURL="http://example.org/f"> f </ci>"#));
    }

    #[test]
    fn writes_csymbols_and_constants() {
        let mut delay = AstNode::symbol(SymbolKind::Delay);
        delay.add_child(AstNode::name("x")).unwrap();
        delay.add_child(AstNode::symbol(SymbolKind::Time)).unwrap();
        let text = write_node_to_string(&delay, &compact()).unwrap();
        assert!(text.contains("definitionURL=\"http://www.sbml.org/sbml/symbols/delay\""));
        assert!(text.contains("definitionURL=\"http://www.sbml.org/sbml/symbols/time\""));
        let text =
            write_node_to_string(&AstNode::constant(Constant::Pi), &compact()).unwrap();
        assert!(text.starts_with("<pi"));
    }
}
