use super::{is_local_only_type, is_valid_identifier, CodeBlock, CodeBlockSlot, GenError, Mode, Position};
use super::{VariableCategory, VariableDescription};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Defines the attribute selecting the stress update algorithm
pub const ATTRIBUTE_STRESS_UPDATE_ALGORITHM: &str = "StressUpdateAlgorithm";

/// Defines the attribute requesting a comparison to the numerical jacobian
pub const ATTRIBUTE_COMPARE_TO_NUMERICAL_JACOBIAN: &str = "compareToNumericalJacobian";

/// Defines the attribute stating that the solver passes the elastic properties
pub const ATTRIBUTE_REQUIRES_STIFFNESS_TENSOR: &str = "requiresStiffnessTensor";

/// Defines the attribute stating that the solver passes the thermal expansion coefficients
pub const ATTRIBUTE_REQUIRES_THERMAL_EXPANSION_COEFFICIENT_TENSOR: &str = "requiresThermalExpansionCoefficientTensor";

/// Defines the attribute requesting the stiffness tensor unaltered by the plane stress condition
pub const ATTRIBUTE_REQUIRES_UNALTERED_STIFFNESS_TENSOR: &str = "requiresUnAlteredStiffnessTensor";

/// Holds the variables, code blocks and names of a behaviour for one modelling hypothesis
///
/// Variable names are unique across all collections: every variable name (and
/// the name of its increment) goes through the same registration mechanism as
/// reserved names, so that generated code cannot alias an identifier.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct BehaviourData {
    /// Material properties
    pub material_properties: Vec<VariableDescription>,

    /// Persistent state variables, solved and exported to the solver
    pub state_variables: Vec<VariableDescription>,

    /// Variables solved by the implicit scheme but not exported
    pub integration_variables: Vec<VariableDescription>,

    /// Persistent variables updated after integration
    pub auxiliary_state_variables: Vec<VariableDescription>,

    /// Variables whose evolution is given by the solver (temperature, ...)
    pub external_state_variables: Vec<VariableDescription>,

    /// Local variables
    pub local_variables: Vec<VariableDescription>,

    /// Parameters
    pub parameters: Vec<VariableDescription>,

    /// Default values of the parameters
    parameter_defaults: BTreeMap<String, f64>,

    /// Code blocks by slot
    code_blocks: BTreeMap<CodeBlockSlot, CodeBlock>,

    /// Names of members (variables, increments, helpers)
    registered_names: BTreeSet<String>,

    /// Names that must not be used by variables
    reserved_names: BTreeSet<String>,

    /// Boolean attributes
    attributes: BTreeMap<String, bool>,
}

impl BehaviourData {
    /// Allocates a new instance with the names every behaviour uses
    pub fn new() -> Self {
        let mut data = BehaviourData::default();
        for name in ["dt", "Dt", "N", "hypothesis", "Type", "use_qt", "real", "iter", "converged"] {
            data.reserved_names.insert(name.to_string());
        }
        data
    }

    /// Reserves a name
    pub fn reserve_name(&mut self, name: &str) -> Result<(), GenError> {
        if self.registered_names.contains(name) {
            return Err(GenError::NameAlreadyRegistered(name.to_string()));
        }
        if !self.reserved_names.insert(name.to_string()) {
            return Err(GenError::ReservedName(name.to_string()));
        }
        Ok(())
    }

    /// Checks that a name can be registered, without registering it
    pub fn check_member_name(&self, name: &str) -> Result<(), GenError> {
        if !is_valid_identifier(name) {
            return Err(GenError::InvalidIdentifier(name.to_string()));
        }
        if self.reserved_names.contains(name) {
            return Err(GenError::ReservedName(name.to_string()));
        }
        if self.registered_names.contains(name) {
            return Err(GenError::NameAlreadyRegistered(name.to_string()));
        }
        Ok(())
    }

    /// Registers the name of a member
    pub fn register_member_name(&mut self, name: &str) -> Result<(), GenError> {
        self.check_member_name(name)?;
        self.registered_names.insert(name.to_string());
        Ok(())
    }

    /// Returns true if the name is registered or reserved
    pub fn is_name_used(&self, name: &str) -> bool {
        self.registered_names.contains(name) || self.reserved_names.contains(name)
    }

    /// Returns the registered names
    pub fn registered_names(&self) -> &BTreeSet<String> {
        &self.registered_names
    }

    /// Adds a variable to a collection
    ///
    /// State, integration and external state variables also register their increment.
    pub fn add_variable(&mut self, category: VariableCategory, variable: VariableDescription) -> Result<(), GenError> {
        if category != VariableCategory::LocalVariable && is_local_only_type(&variable.type_name) {
            return Err(GenError::UnsupportedType(variable.type_name.clone()));
        }
        let mut names = vec![variable.name.clone()];
        if category.has_increment() {
            names.push(format!("d{}", variable.name));
        }
        for name in &names {
            self.check_member_name(name)?;
        }
        self.registered_names.extend(names);
        self.variables_mut(category).push(variable);
        Ok(())
    }

    /// Adds a parameter with its default value
    pub fn add_parameter(&mut self, variable: VariableDescription, default: f64) -> Result<(), GenError> {
        if let Some(b) = &variable.bounds {
            if !b.contains(default) {
                return Err(GenError::InvalidParameterValue {
                    name: variable.name.clone(),
                    reason: "default value is out of bounds",
                });
            }
        }
        let name = variable.name.clone();
        self.add_variable(VariableCategory::Parameter, variable)?;
        self.parameter_defaults.insert(name, default);
        Ok(())
    }

    /// Changes the default value of an existing parameter
    pub fn set_parameter_default(&mut self, name: &str, value: f64) -> Result<(), GenError> {
        let variable = self
            .parameters
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| GenError::UnknownVariable(name.to_string()))?;
        if let Some(b) = &variable.bounds {
            if !b.contains(value) {
                return Err(GenError::InvalidParameterValue {
                    name: name.to_string(),
                    reason: "value is out of bounds",
                });
            }
        }
        self.parameter_defaults.insert(name.to_string(), value);
        Ok(())
    }

    /// Returns the default value of a parameter
    pub fn parameter_default(&self, name: &str) -> Option<f64> {
        self.parameter_defaults.get(name).copied()
    }

    /// Returns a collection of variables
    pub fn variables(&self, category: VariableCategory) -> &[VariableDescription] {
        match category {
            VariableCategory::MaterialProperty => &self.material_properties,
            VariableCategory::StateVariable => &self.state_variables,
            VariableCategory::IntegrationVariable => &self.integration_variables,
            VariableCategory::AuxiliaryStateVariable => &self.auxiliary_state_variables,
            VariableCategory::ExternalStateVariable => &self.external_state_variables,
            VariableCategory::LocalVariable => &self.local_variables,
            VariableCategory::Parameter => &self.parameters,
        }
    }

    fn variables_mut(&mut self, category: VariableCategory) -> &mut Vec<VariableDescription> {
        match category {
            VariableCategory::MaterialProperty => &mut self.material_properties,
            VariableCategory::StateVariable => &mut self.state_variables,
            VariableCategory::IntegrationVariable => &mut self.integration_variables,
            VariableCategory::AuxiliaryStateVariable => &mut self.auxiliary_state_variables,
            VariableCategory::ExternalStateVariable => &mut self.external_state_variables,
            VariableCategory::LocalVariable => &mut self.local_variables,
            VariableCategory::Parameter => &mut self.parameters,
        }
    }

    /// Finds a variable in any collection
    pub fn find_variable(&self, name: &str) -> Option<(VariableCategory, &VariableDescription)> {
        const CATEGORIES: [VariableCategory; 7] = [
            VariableCategory::MaterialProperty,
            VariableCategory::StateVariable,
            VariableCategory::IntegrationVariable,
            VariableCategory::AuxiliaryStateVariable,
            VariableCategory::ExternalStateVariable,
            VariableCategory::LocalVariable,
            VariableCategory::Parameter,
        ];
        for category in CATEGORIES {
            if let Some(v) = self.variables(category).iter().find(|v| v.name == name) {
                return Some((category, v));
            }
        }
        None
    }

    /// Returns true if a variable with this name exists in the given collection
    pub fn has_variable(&self, category: VariableCategory, name: &str) -> bool {
        self.variables(category).iter().any(|v| v.name == name)
    }

    /// Sets the glossary name of an existing variable
    pub fn set_glossary_name(&mut self, name: &str, glossary_name: &str) -> Result<(), GenError> {
        for category in [
            VariableCategory::MaterialProperty,
            VariableCategory::StateVariable,
            VariableCategory::AuxiliaryStateVariable,
            VariableCategory::ExternalStateVariable,
            VariableCategory::Parameter,
        ] {
            if let Some(v) = self.variables_mut(category).iter_mut().find(|v| v.name == name) {
                v.glossary_name = Some(glossary_name.to_string());
                return Ok(());
            }
        }
        Err(GenError::UnknownVariable(name.to_string()))
    }

    /// Returns the persistent variables (state then auxiliary state variables)
    pub fn persistent_variables(&self) -> Vec<&VariableDescription> {
        self.state_variables
            .iter()
            .chain(self.auxiliary_state_variables.iter())
            .collect()
    }

    /// Returns the unknowns of the implicit system (state then integration variables)
    pub fn unknowns(&self) -> Vec<VariableDescription> {
        self.state_variables
            .iter()
            .chain(self.integration_variables.iter())
            .cloned()
            .collect()
    }

    /// Adds code to a slot
    pub fn set_code(
        &mut self,
        slot: CodeBlockSlot,
        block: CodeBlock,
        mode: Mode,
        position: Position,
    ) -> Result<(), GenError> {
        let exists = self.code_blocks.contains_key(&slot);
        match mode {
            Mode::Create => {
                if exists {
                    return Err(GenError::CodeBlockAlreadyDefined(slot.name().to_string()));
                }
                self.code_blocks.insert(slot, block);
            }
            Mode::Replace => {
                self.code_blocks.insert(slot, block);
            }
            Mode::CreateButDontReplace => {
                if !exists {
                    self.code_blocks.insert(slot, block);
                }
            }
            Mode::CreateOrAppend => match self.code_blocks.get_mut(&slot) {
                Some(existing) => existing.merge(&block, position),
                None => {
                    self.code_blocks.insert(slot, block);
                }
            },
        }
        Ok(())
    }

    /// Returns the code block of a slot
    pub fn code(&self, slot: CodeBlockSlot) -> Option<&CodeBlock> {
        self.code_blocks.get(&slot)
    }

    /// Returns true if the slot holds some code
    pub fn has_code(&self, slot: CodeBlockSlot) -> bool {
        self.code_blocks.contains_key(&slot)
    }

    /// Sets a boolean attribute
    pub fn set_attribute(&mut self, name: &str, value: bool) {
        self.attributes.insert(name.to_string(), value);
    }

    /// Returns a boolean attribute (false if unset)
    pub fn attribute(&self, name: &str) -> bool {
        self.attributes.get(name).copied().unwrap_or(false)
    }

    /// Checks that every member used by the code blocks has been registered
    pub fn check_code_block_members(&self) -> Result<(), GenError> {
        for block in self.code_blocks.values() {
            for m in &block.members {
                if !self.is_name_used(m) {
                    return Err(GenError::UnknownVariable(m.clone()));
                }
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::BehaviourData;
    use crate::base::{Bounds, CodeBlock, CodeBlockSlot, GenError, Mode, Position};
    use crate::base::{VariableCategory, VariableDescription};

    fn var(type_name: &str, name: &str) -> VariableDescription {
        VariableDescription::new(type_name, name).unwrap()
    }

    #[test]
    fn add_variable_works() {
        let mut data = BehaviourData::new();
        data.add_variable(VariableCategory::StateVariable, var("strain", "p")).unwrap();
        data.add_variable(VariableCategory::MaterialProperty, var("stress", "young"))
            .unwrap();
        assert!(data.is_name_used("p"));
        assert!(data.is_name_used("dp"));
        assert!(!data.is_name_used("dyoung"));
        assert_eq!(data.find_variable("young").unwrap().0, VariableCategory::MaterialProperty);
        assert!(data.has_variable(VariableCategory::StateVariable, "p"));
        assert!(data.find_variable("q").is_none());
        assert_eq!(data.unknowns().len(), 1);
    }

    #[test]
    fn names_are_unique_across_collections() {
        let mut data = BehaviourData::new();
        data.add_variable(VariableCategory::StateVariable, var("strain", "p")).unwrap();
        assert_eq!(
            data.add_variable(VariableCategory::LocalVariable, var("strain", "p")).err(),
            Some(GenError::NameAlreadyRegistered("p".to_string()))
        );
        assert_eq!(
            data.add_variable(VariableCategory::LocalVariable, var("strain", "dp")).err(),
            Some(GenError::NameAlreadyRegistered("dp".to_string()))
        );
        assert_eq!(
            data.add_variable(VariableCategory::LocalVariable, var("real", "dt")).err(),
            Some(GenError::ReservedName("dt".to_string()))
        );
        data.reserve_name("theta").unwrap();
        assert_eq!(
            data.add_variable(VariableCategory::Parameter, var("real", "theta")).err(),
            Some(GenError::ReservedName("theta".to_string()))
        );
        assert_eq!(data.reserve_name("theta").err(), Some(GenError::ReservedName("theta".to_string())));
        assert_eq!(
            data.reserve_name("p").err(),
            Some(GenError::NameAlreadyRegistered("p".to_string()))
        );
    }

    #[test]
    fn add_variable_captures_errors() {
        // the increment of `t` is the reserved `dt`
        let mut data = BehaviourData::new();
        let before = data.clone();
        assert_eq!(
            data.add_variable(VariableCategory::StateVariable, var("real", "t")).err(),
            Some(GenError::ReservedName("dt".to_string()))
        );
        assert_eq!(data, before);
        assert!(!data.is_name_used("t"));
        data.add_variable(VariableCategory::LocalVariable, var("real", "t")).unwrap();
        assert!(data.has_variable(VariableCategory::LocalVariable, "t"));

        // the increment is already registered
        data.add_variable(VariableCategory::LocalVariable, var("strain", "de")).unwrap();
        assert_eq!(
            data.add_variable(VariableCategory::StateVariable, var("strain", "e")).err(),
            Some(GenError::NameAlreadyRegistered("de".to_string()))
        );
        assert!(!data.is_name_used("e"));
        assert_eq!(data.check_member_name("e"), Ok(()));
    }

    #[test]
    fn parameters_work() {
        let mut data = BehaviourData::new();
        let theta = var("real", "theta").with_bounds(Bounds::range(0.0, 1.0));
        data.add_parameter(theta, 0.5).unwrap();
        assert_eq!(data.parameter_default("theta"), Some(0.5));
        data.set_parameter_default("theta", 1.0).unwrap();
        assert_eq!(data.parameter_default("theta"), Some(1.0));
        assert_eq!(
            data.set_parameter_default("theta", 1.5).err(),
            Some(GenError::InvalidParameterValue {
                name: "theta".to_string(),
                reason: "value is out of bounds"
            })
        );
        assert_eq!(
            data.set_parameter_default("epsilon", 1.0).err(),
            Some(GenError::UnknownVariable("epsilon".to_string()))
        );
        let bad = var("real", "epsilon").with_bounds(Bounds::lower(0.0));
        assert_eq!(
            data.add_parameter(bad, -1.0).err(),
            Some(GenError::InvalidParameterValue {
                name: "epsilon".to_string(),
                reason: "default value is out of bounds"
            })
        );
    }

    #[test]
    fn set_code_works() {
        let mut data = BehaviourData::new();
        let slot = CodeBlockSlot::BeforeInitializeLocalVariables;
        data.set_code(slot, CodeBlock::new("b;"), Mode::CreateOrAppend, Position::AtEnd)
            .unwrap();
        data.set_code(slot, CodeBlock::new("a;"), Mode::CreateOrAppend, Position::AtBeginning)
            .unwrap();
        data.set_code(slot, CodeBlock::new("c;"), Mode::CreateOrAppend, Position::AtEnd)
            .unwrap();
        assert_eq!(data.code(slot).unwrap().code, "a;\nb;\nc;\n");
        assert_eq!(
            data.set_code(slot, CodeBlock::new("d;"), Mode::Create, Position::AtEnd).err(),
            Some(GenError::CodeBlockAlreadyDefined("BeforeInitializeLocalVariables".to_string()))
        );
        data.set_code(slot, CodeBlock::new("e;"), Mode::CreateButDontReplace, Position::AtEnd)
            .unwrap();
        assert_eq!(data.code(slot).unwrap().code, "a;\nb;\nc;\n");
        data.set_code(slot, CodeBlock::new("f;"), Mode::Replace, Position::AtEnd)
            .unwrap();
        assert_eq!(data.code(slot).unwrap().code, "f;");
        assert!(!data.has_code(CodeBlockSlot::FlowRule));
    }

    #[test]
    fn check_code_block_members_works() {
        let mut data = BehaviourData::new();
        data.add_variable(VariableCategory::LocalVariable, var("stress", "mu")).unwrap();
        let block = CodeBlock::with_members("this->mu = this->young;", &["mu", "young"]);
        data.set_code(CodeBlockSlot::Integrator, block, Mode::Create, Position::AtEnd)
            .unwrap();
        assert_eq!(
            data.check_code_block_members().err(),
            Some(GenError::UnknownVariable("young".to_string()))
        );
        data.add_variable(VariableCategory::MaterialProperty, var("stress", "young"))
            .unwrap();
        data.check_code_block_members().unwrap();
    }
}
