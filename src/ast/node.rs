use std::any::Any;
use std::fmt;
use std::sync::Arc;

use approx::relative_eq;

use crate::error::OperationError;

use super::kind::{
    Annotation, AstKind, Constant, Csymbol, Identifier, NodeClass, Operator, Qualifier, SymbolKind,
};

/// Deepest tree the recursive operations accept.
pub const MAX_NESTING_DEPTH: usize = 256;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeAttributes {
    pub id: Option<String>,
    pub class: Option<String>,
    pub style: Option<String>,
}

impl NodeAttributes {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.class.is_none() && self.style.is_none()
    }
}

/// Non-owning reference to the SBML element whose math a tree is, e.g. its
/// metaid. The element owns the tree, never the other way round.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SbaseRef(pub String);

/// Opaque caller data attached to a node. Copies of a node share the handle.
#[derive(Clone)]
pub struct UserData(Arc<dyn Any + Send + Sync>);

impl UserData {
    pub fn new<T: Any + Send + Sync>(data: T) -> Self {
        Self(Arc::new(data))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UserData({:p})", Arc::as_ptr(&self.0))
    }
}

impl PartialEq for UserData {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// One node of a math expression tree. Children are owned exclusively by
/// their parent; cloning a node clones its whole subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    kind: AstKind,
    children: Vec<AstNode>,
    attributes: NodeAttributes,
    units: Option<String>,
    parent_sbml_object: Option<SbaseRef>,
    user_data: Option<UserData>,
}

impl Default for AstNode {
    fn default() -> Self {
        AstNode::new(AstKind::Unknown)
    }
}

impl AstNode {
    pub fn new(kind: AstKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            attributes: NodeAttributes::default(),
            units: None,
            parent_sbml_object: None,
            user_data: None,
        }
    }

    /// Builds a composite node, failing if the kind cannot hold children or
    /// a child is of unknown type.
    pub fn with_children(kind: AstKind, children: Vec<AstNode>) -> Result<Self, OperationError> {
        let mut node = AstNode::new(kind);
        for child in children {
            node.add_child(child)?;
        }
        Ok(node)
    }

    pub fn integer(value: i64) -> Self {
        AstNode::new(AstKind::Integer(value))
    }

    pub fn real(value: f64) -> Self {
        AstNode::new(AstKind::Real(value))
    }

    pub fn real_exponent(mantissa: f64, exponent: i64) -> Self {
        AstNode::new(AstKind::RealExponent { mantissa, exponent })
    }

    pub fn rational(numerator: i64, denominator: i64) -> Result<Self, OperationError> {
        if denominator == 0 {
            return Err(OperationError::OperationFailed);
        }
        Ok(AstNode::new(AstKind::Rational {
            numerator,
            denominator,
        }))
    }

    pub fn name(name: &str) -> Self {
        AstNode::new(AstKind::Name(Identifier::new(name)))
    }

    pub fn constant(constant: Constant) -> Self {
        AstNode::new(AstKind::Constant(constant))
    }

    pub fn symbol(kind: SymbolKind) -> Self {
        AstNode::new(AstKind::Symbol(Csymbol::new(kind)))
    }

    pub fn function(name: &str, args: Vec<AstNode>) -> Self {
        AstNode {
            children: args,
            ..AstNode::new(AstKind::Function(Identifier::new(name)))
        }
    }

    pub fn operator(op: Operator, args: Vec<AstNode>) -> Self {
        AstNode {
            children: args,
            ..AstNode::new(AstKind::Operator(op))
        }
    }

    pub fn qualifier(qualifier: Qualifier, children: Vec<AstNode>) -> Self {
        AstNode {
            children,
            ..AstNode::new(AstKind::Qualifier(qualifier))
        }
    }

    pub fn piece(value: AstNode, condition: AstNode) -> Self {
        AstNode::qualifier(Qualifier::Piece, vec![value, condition])
    }

    pub fn otherwise(value: AstNode) -> Self {
        AstNode::qualifier(Qualifier::Otherwise, vec![value])
    }

    pub fn bvar(name: &str) -> Self {
        AstNode::qualifier(Qualifier::Bvar, vec![AstNode::name(name)])
    }

    pub fn lambda(bvars: &[&str], body: AstNode) -> Self {
        let mut children: Vec<AstNode> = bvars.iter().map(|b| AstNode::bvar(b)).collect();
        children.push(body);
        AstNode::operator(Operator::Lambda, children)
    }

    pub fn semantics(child: AstNode, annotations: Vec<Annotation>) -> Self {
        AstNode {
            children: vec![child],
            ..AstNode::new(AstKind::Semantics(annotations))
        }
    }

    pub fn kind(&self) -> &AstKind {
        &self.kind
    }

    pub fn class(&self) -> NodeClass {
        self.kind.class()
    }

    /// Changes the type of the node in place. Fails if the node has children
    /// that the new kind could not hold.
    pub fn set_kind(&mut self, kind: AstKind) -> Result<(), OperationError> {
        if !self.children.is_empty() && !kind.accepts_children() {
            return Err(OperationError::OperationFailed);
        }
        if !kind.is_number() {
            self.units = None;
        }
        self.kind = kind;
        Ok(())
    }

    pub fn operator_kind(&self) -> Option<Operator> {
        match &self.kind {
            AstKind::Operator(op) => Some(*op),
            _ => None,
        }
    }

    pub fn qualifier_kind(&self) -> Option<Qualifier> {
        match &self.kind {
            AstKind::Qualifier(q) => Some(*q),
            _ => None,
        }
    }

    pub fn is_operator(&self, op: Operator) -> bool {
        self.kind.is_operator(op)
    }

    pub fn is_qualifier(&self, qualifier: Qualifier) -> bool {
        self.kind.is_qualifier(qualifier)
    }

    pub fn identifier(&self) -> Option<&str> {
        self.kind.name()
    }

    pub fn value(&self) -> Option<f64> {
        self.kind.value()
    }

    pub fn attributes(&self) -> &NodeAttributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut NodeAttributes {
        &mut self.attributes
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.id.as_deref()
    }

    pub fn set_id(&mut self, id: &str) {
        self.attributes.id = Some(id.to_string());
    }

    pub fn class_attr(&self) -> Option<&str> {
        self.attributes.class.as_deref()
    }

    pub fn set_class_attr(&mut self, class: &str) {
        self.attributes.class = Some(class.to_string());
    }

    pub fn style(&self) -> Option<&str> {
        self.attributes.style.as_deref()
    }

    pub fn set_style(&mut self, style: &str) {
        self.attributes.style = Some(style.to_string());
    }

    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    /// Units may only annotate numeric literals.
    pub fn set_units(&mut self, units: &str) -> Result<(), OperationError> {
        if !self.kind.is_number() {
            return Err(OperationError::OperationFailed);
        }
        self.units = Some(units.to_string());
        Ok(())
    }

    pub fn unset_units(&mut self) {
        self.units = None;
    }

    pub fn parent_sbml_object(&self) -> Option<&SbaseRef> {
        self.parent_sbml_object.as_ref()
    }

    /// Sets the owning element on this node and its whole subtree.
    pub fn set_parent_sbml_object(&mut self, parent: Option<SbaseRef>) {
        for child in &mut self.children {
            child.set_parent_sbml_object(parent.clone());
        }
        self.parent_sbml_object = parent;
    }

    pub fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }

    pub fn set_user_data(&mut self, data: Option<UserData>) {
        self.user_data = data;
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn children(&self) -> &[AstNode] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<&AstNode> {
        self.children.get(index)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut AstNode> {
        self.children.get_mut(index)
    }

    pub fn left_child(&self) -> Option<&AstNode> {
        self.children.first()
    }

    pub fn right_child(&self) -> Option<&AstNode> {
        if self.children.len() > 1 {
            self.children.last()
        } else {
            None
        }
    }

    fn check_can_adopt(&self, child: &AstNode) -> Result<(), OperationError> {
        if !self.kind.accepts_children() {
            return Err(OperationError::OperationFailed);
        }
        if child.kind == AstKind::Unknown {
            return Err(OperationError::InvalidObject);
        }
        Ok(())
    }

    pub fn add_child(&mut self, child: AstNode) -> Result<(), OperationError> {
        self.check_can_adopt(&child)?;
        self.children.push(child);
        Ok(())
    }

    pub fn prepend_child(&mut self, child: AstNode) -> Result<(), OperationError> {
        self.insert_child(0, child)
    }

    pub fn insert_child(&mut self, index: usize, child: AstNode) -> Result<(), OperationError> {
        self.check_can_adopt(&child)?;
        if index > self.children.len() {
            return Err(OperationError::IndexOutOfRange {
                index,
                len: self.children.len(),
            });
        }
        self.children.insert(index, child);
        Ok(())
    }

    pub fn remove_child(&mut self, index: usize) -> Result<AstNode, OperationError> {
        if index >= self.children.len() {
            return Err(OperationError::IndexOutOfRange {
                index,
                len: self.children.len(),
            });
        }
        Ok(self.children.remove(index))
    }

    /// Puts `new_child` at `index`. The displaced subtree is returned unless
    /// `delete_old` is set, in which case it is dropped.
    pub fn replace_child(
        &mut self,
        index: usize,
        new_child: AstNode,
        delete_old: bool,
    ) -> Result<Option<AstNode>, OperationError> {
        self.check_can_adopt(&new_child)?;
        let len = self.children.len();
        let slot = self
            .children
            .get_mut(index)
            .ok_or(OperationError::IndexOutOfRange { index, len })?;
        let old = std::mem::replace(slot, new_child);
        if delete_old {
            Ok(None)
        } else {
            Ok(Some(old))
        }
    }

    pub fn swap_children(&mut self, other: &mut AstNode) -> Result<(), OperationError> {
        if !self.kind.accepts_children() || !other.kind.accepts_children() {
            return Err(OperationError::OperationFailed);
        }
        std::mem::swap(&mut self.children, &mut other.children);
        Ok(())
    }

    pub fn deep_copy(&self) -> AstNode {
        self.clone()
    }

    /// Nesting depth of the tree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.children.iter().map(|child| (child, level + 1)));
        }
        deepest
    }

    /// Fails for trees nested deeper than [`MAX_NESTING_DEPTH`].
    pub fn check_depth(&self) -> Result<(), OperationError> {
        if self.depth() > MAX_NESTING_DEPTH {
            return Err(OperationError::NestingTooDeep(MAX_NESTING_DEPTH));
        }
        Ok(())
    }

    pub fn contains_units(&self) -> bool {
        self.descendants().any(|node| node.units.is_some())
    }

    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    pub fn has_correct_number_arguments(&self) -> bool {
        let n = self.children.len();
        if !self.kind.arity().accepts(n) {
            return false;
        }
        match &self.kind {
            AstKind::Operator(Operator::Piecewise) => {
                self.children.iter().enumerate().all(|(i, child)| {
                    child.is_qualifier(Qualifier::Piece)
                        || (i + 1 == n && child.is_qualifier(Qualifier::Otherwise))
                })
            }
            AstKind::Operator(Operator::Lambda) => self
                .children
                .iter()
                .enumerate()
                .all(|(i, child)| child.is_qualifier(Qualifier::Bvar) == (i + 1 < n)),
            AstKind::Operator(op @ (Operator::Root | Operator::Log)) => {
                let qualifier = if *op == Operator::Root {
                    Qualifier::Degree
                } else {
                    Qualifier::Logbase
                };
                match n {
                    2 => {
                        self.children[0].is_qualifier(qualifier)
                            && self.children[1].class() != NodeClass::Qualifier
                    }
                    _ => self.children[0].class() != NodeClass::Qualifier,
                }
            }
            AstKind::Qualifier(_) | AstKind::Semantics(_) => true,
            _ => self
                .children
                .iter()
                .all(|child| child.class() != NodeClass::Qualifier),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.check_depth().is_ok() && self.well_formed_below()
    }

    fn well_formed_below(&self) -> bool {
        self.has_correct_number_arguments() && self.children.iter().all(AstNode::well_formed_below)
    }

    /// Structural equality with tolerant comparison of floating point values.
    /// Integer and real literals compare by value whatever their notation;
    /// attributes, units and user data are ignored.
    /// Trees nested deeper than [`MAX_NESTING_DEPTH`] are never equivalent.
    pub fn equivalent(&self, other: &AstNode) -> bool {
        self.check_depth().is_ok() && other.check_depth().is_ok() && self.equivalent_below(other)
    }

    fn equivalent_below(&self, other: &AstNode) -> bool {
        let same_kind = match (&self.kind, &other.kind) {
            (
                AstKind::Integer(_)
                | AstKind::Real(_)
                | AstKind::RealExponent { .. }
                | AstKind::Constant(Constant::Infinity | Constant::NotANumber),
                AstKind::Integer(_)
                | AstKind::Real(_)
                | AstKind::RealExponent { .. }
                | AstKind::Constant(Constant::Infinity | Constant::NotANumber),
            ) => match (self.kind.value(), other.kind.value()) {
                (Some(a), Some(b)) => float_eq(a, b),
                _ => false,
            },
            (AstKind::Name(a), AstKind::Name(b)) | (AstKind::Function(a), AstKind::Function(b)) => {
                a.name == b.name
            }
            (AstKind::Symbol(a), AstKind::Symbol(b)) => a.kind == b.kind,
            (AstKind::Semantics(_), AstKind::Semantics(_)) => true,
            (a, b) => a == b,
        };
        same_kind
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(other.children.iter())
                .all(|(a, b)| a.equivalent_below(b))
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || relative_eq!(a, b)
}

pub struct Descendants<'a> {
    stack: Vec<&'a AstNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a AstNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", crate::formula::to_formula(self))
    }
}
