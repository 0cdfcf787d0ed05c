use std::collections::{HashMap, HashSet};

use crate::ast::{AstKind, AstNode, Operator, Qualifier};
use crate::error::OperationError;
use crate::namespace::SbmlNamespace;

/// What a model-level identifier is declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolType {
    Compartment,
    Species,
    Parameter,
    Reaction,
    SpeciesReference,
    FunctionDefinition,
}

impl SymbolType {
    /// Symbols that stand for a numeric value when used as a `ci`.
    pub fn is_value(&self) -> bool {
        !matches!(self, SymbolType::FunctionDefinition)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub id: String,
    pub math: Option<AstNode>,
}

impl FunctionDefinition {
    pub fn new(id: &str, math: Option<AstNode>) -> Self {
        Self {
            id: id.to_string(),
            math,
        }
    }

    fn lambda(&self) -> Option<&AstNode> {
        let mut math = self.math.as_ref()?;
        // a semantics wrapper may enclose the lambda
        while let (AstKind::Semantics(_), Some(child)) = (math.kind(), math.child(0)) {
            math = child;
        }
        if math.is_operator(Operator::Lambda) {
            Some(math)
        } else {
            None
        }
    }

    /// Number of `bvar` parameters of the lambda.
    pub fn num_arguments(&self) -> usize {
        self.lambda()
            .map(|lambda| {
                lambda
                    .children()
                    .iter()
                    .filter(|child| child.is_qualifier(Qualifier::Bvar))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn arguments(&self) -> Vec<&str> {
        self.lambda()
            .map(|lambda| {
                lambda
                    .children()
                    .iter()
                    .filter(|child| child.is_qualifier(Qualifier::Bvar))
                    .filter_map(|bvar| bvar.child(0).and_then(AstNode::identifier))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The expression the function evaluates to.
    pub fn body(&self) -> Option<&AstNode> {
        self.lambda()?
            .children()
            .last()
            .filter(|child| !child.is_qualifier(Qualifier::Bvar))
    }
}

/// Read-only view of the SBML model that math checks resolve names
/// against.
pub trait ModelContext {
    fn namespace(&self) -> SbmlNamespace;

    fn symbol(&self, id: &str) -> Option<SymbolType>;

    fn function_definition(&self, id: &str) -> Option<&FunctionDefinition>;

    /// Local parameter ids of the kinetic law of reaction `reaction`.
    fn local_parameters(&self, reaction: usize) -> &[String];

    fn num_reactions(&self) -> usize;

    fn has_unit_definition(&self, id: &str) -> bool;

    /// True if `id` is a local parameter of any kinetic law.
    fn is_local_parameter_anywhere(&self, id: &str) -> bool {
        (0..self.num_reactions()).any(|r| self.local_parameters(r).iter().any(|p| p == id))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Reaction {
    id: String,
    local_parameters: Vec<String>,
}

/// In-memory model holding just the declarations math checks need.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    namespace: SbmlNamespace,
    symbols: HashMap<String, SymbolType>,
    function_definitions: Vec<FunctionDefinition>,
    reactions: Vec<Reaction>,
    unit_definitions: HashSet<String>,
}

impl Model {
    pub fn new(namespace: SbmlNamespace) -> Self {
        Self {
            namespace,
            ..Default::default()
        }
    }

    fn declare(&mut self, id: &str, symbol: SymbolType) -> &mut Self {
        self.symbols.insert(id.to_string(), symbol);
        self
    }

    pub fn add_compartment(&mut self, id: &str) -> &mut Self {
        self.declare(id, SymbolType::Compartment)
    }

    pub fn add_species(&mut self, id: &str) -> &mut Self {
        self.declare(id, SymbolType::Species)
    }

    pub fn add_parameter(&mut self, id: &str) -> &mut Self {
        self.declare(id, SymbolType::Parameter)
    }

    pub fn add_species_reference(&mut self, id: &str) -> &mut Self {
        self.declare(id, SymbolType::SpeciesReference)
    }

    /// Adds a reaction and returns its index.
    pub fn add_reaction(&mut self, id: &str) -> usize {
        self.declare(id, SymbolType::Reaction);
        self.reactions.push(Reaction {
            id: id.to_string(),
            local_parameters: Vec::new(),
        });
        self.reactions.len() - 1
    }

    pub fn reaction_index(&self, id: &str) -> Option<usize> {
        self.reactions.iter().position(|r| r.id == id)
    }

    pub fn add_local_parameter(&mut self, reaction: usize, id: &str) -> Result<(), OperationError> {
        let len = self.reactions.len();
        let reaction = self
            .reactions
            .get_mut(reaction)
            .ok_or(OperationError::IndexOutOfRange {
                index: reaction,
                len,
            })?;
        reaction.local_parameters.push(id.to_string());
        Ok(())
    }

    pub fn add_function_definition(&mut self, id: &str, math: AstNode) -> &mut Self {
        self.declare(id, SymbolType::FunctionDefinition);
        self.function_definitions
            .push(FunctionDefinition::new(id, Some(math)));
        self
    }

    pub fn add_unit_definition(&mut self, id: &str) -> &mut Self {
        self.unit_definitions.insert(id.to_string());
        self
    }

    pub fn function_definitions(&self) -> &[FunctionDefinition] {
        &self.function_definitions
    }
}

impl ModelContext for Model {
    fn namespace(&self) -> SbmlNamespace {
        self.namespace
    }

    fn symbol(&self, id: &str) -> Option<SymbolType> {
        self.symbols.get(id).copied()
    }

    fn function_definition(&self, id: &str) -> Option<&FunctionDefinition> {
        self.function_definitions.iter().find(|f| f.id == id)
    }

    fn local_parameters(&self, reaction: usize) -> &[String] {
        self.reactions
            .get(reaction)
            .map(|r| r.local_parameters.as_slice())
            .unwrap_or(&[])
    }

    fn num_reactions(&self) -> usize {
        self.reactions.len()
    }

    fn has_unit_definition(&self, id: &str) -> bool {
        self.unit_definitions.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_definition_arguments() {
        let body = AstNode::operator(
            Operator::Times,
            vec![AstNode::name("x"), AstNode::name("y")],
        );
        let f = FunctionDefinition::new("f", Some(AstNode::lambda(&["x", "y"], body.clone())));
        assert_eq!(f.num_arguments(), 2);
        assert_eq!(f.arguments(), vec!["x", "y"]);
        assert_eq!(f.body(), Some(&body));
        assert_eq!(FunctionDefinition::new("g", None).num_arguments(), 0);
    }

    #[test]
    fn local_parameters_per_reaction() {
        let mut model = Model::new(SbmlNamespace::new(3, 1));
        model.add_species("S1").add_parameter("k");
        let r1 = model.add_reaction("r1");
        let r2 = model.add_reaction("r2");
        model.add_local_parameter(r1, "k1").unwrap();
        assert!(model.add_local_parameter(7, "k2").is_err());
        assert_eq!(model.local_parameters(r1), ["k1".to_string()]);
        assert!(model.local_parameters(r2).is_empty());
        assert!(model.is_local_parameter_anywhere("k1"));
        assert!(!model.is_local_parameter_anywhere("k"));
        assert_eq!(model.symbol("r2"), Some(SymbolType::Reaction));
        assert_eq!(model.reaction_index("r2"), Some(r2));
    }
}
