use super::{is_valid_identifier, BehaviourData, BehaviourSymmetry, BehaviourType, CodeBlock, CodeBlockSlot};
use super::{GenError, Mode, ModellingHypothesis, OrthotropicAxesConvention, Position};
use super::{VariableCategory, VariableDescription};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Holds a gradient and its conjugate thermodynamic force
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MainVariable {
    /// Gradient (e.g. the total strain `eto`)
    pub gradient: VariableDescription,

    /// Thermodynamic force (e.g. the stress `sig`)
    pub force: VariableDescription,
}

/// Holds the description of a behaviour
///
/// The description is populated by a DSL front-end and consumed read-only by
/// the code generators. Data shared by all modelling hypotheses live in a
/// default [BehaviourData]; a hypothesis becomes "specialised" as soon as
/// something is added for it alone, in which case it receives its own copy of
/// the default data. Additions made for the undefined hypothesis go to the
/// default data and to every specialised copy.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BehaviourDescription {
    /// Name of the behaviour
    pub behaviour_name: String,

    /// Name of the material (may be empty)
    pub material_name: String,

    /// Name of the library (may be empty)
    pub library: String,

    /// Kind of behaviour
    pub behaviour_type: BehaviourType,

    /// Symmetry of the behaviour
    pub symmetry: BehaviourSymmetry,

    /// Symmetry of the elastic behaviour
    pub elastic_symmetry: BehaviourSymmetry,

    /// Convention for the orthotropic axes
    pub axes_convention: OrthotropicAxesConvention,

    /// The behaviour computes a consistent tangent operator
    pub has_consistent_tangent_operator: bool,

    /// The consistent tangent operator is symmetric
    pub is_consistent_tangent_operator_symmetric: bool,

    /// The behaviour handles stress free expansions (thermal expansion, swelling)
    pub has_stress_free_expansion: bool,

    /// The behaviour computes a time step scaling factor
    pub has_time_step_scaling_factor: bool,

    /// Names of the elastic material properties
    elastic_material_properties: Vec<String>,

    /// Formulas (function of `T`) of elastic properties declared as local variables
    elastic_formulas: BTreeMap<String, String>,

    /// Main variables
    main_variables: Vec<MainVariable>,

    /// Additional headers included by the behaviour file
    includes: Vec<String>,

    /// Supported modelling hypotheses
    hypotheses: BTreeSet<ModellingHypothesis>,

    /// Default data
    d: BehaviourData,

    /// Specialised data
    sd: BTreeMap<ModellingHypothesis, BehaviourData>,
}

impl BehaviourDescription {
    /// Allocates a new small strain behaviour supporting all hypotheses
    pub fn new(behaviour_name: &str) -> Result<Self, GenError> {
        if !is_valid_identifier(behaviour_name) {
            return Err(GenError::InvalidIdentifier(behaviour_name.to_string()));
        }
        let mut bd = BehaviourDescription {
            behaviour_name: behaviour_name.to_string(),
            material_name: String::new(),
            library: String::new(),
            behaviour_type: BehaviourType::StandardStrainBasedBehaviour,
            symmetry: BehaviourSymmetry::Isotropic,
            elastic_symmetry: BehaviourSymmetry::Isotropic,
            axes_convention: OrthotropicAxesConvention::Default,
            has_consistent_tangent_operator: false,
            is_consistent_tangent_operator_symmetric: false,
            has_stress_free_expansion: false,
            has_time_step_scaling_factor: false,
            elastic_material_properties: Vec::new(),
            elastic_formulas: BTreeMap::new(),
            main_variables: Vec::new(),
            includes: Vec::new(),
            hypotheses: ModellingHypothesis::ALL.iter().copied().collect(),
            d: BehaviourData::new(),
            sd: BTreeMap::new(),
        };
        let eto = VariableDescription::new("StrainStensor", "eto")?.with_glossary_name("Strain");
        let sig = VariableDescription::new("StressStensor", "sig")?.with_glossary_name("Stress");
        bd.add_main_variable(eto, sig)?;
        let temperature = VariableDescription::new("temperature", "T")?.with_glossary_name("Temperature");
        bd.d.add_variable(VariableCategory::ExternalStateVariable, temperature)?;
        Ok(bd)
    }

    /// Sets the material name
    pub fn set_material_name(&mut self, material_name: &str) -> Result<&mut Self, GenError> {
        if !is_valid_identifier(material_name) {
            return Err(GenError::InvalidIdentifier(material_name.to_string()));
        }
        self.material_name = material_name.to_string();
        Ok(self)
    }

    /// Sets the library name
    pub fn set_library(&mut self, library: &str) -> Result<&mut Self, GenError> {
        if !is_valid_identifier(library) {
            return Err(GenError::InvalidIdentifier(library.to_string()));
        }
        self.library = library.to_string();
        Ok(self)
    }

    /// Returns the name of the generated class
    pub fn class_name(&self) -> String {
        if self.material_name.is_empty() {
            self.behaviour_name.clone()
        } else {
            format!("{}_{}", self.material_name, self.behaviour_name)
        }
    }

    /// Returns the name of the behaviour header file
    pub fn behaviour_file_name(&self) -> String {
        format!("TFEL/Material/{}.hxx", self.class_name())
    }

    /// Returns the name of the behaviour data header file
    pub fn behaviour_data_file_name(&self) -> String {
        format!("TFEL/Material/{}BehaviourData.hxx", self.class_name())
    }

    /// Returns the name of the integration data header file
    pub fn integration_data_file_name(&self) -> String {
        format!("TFEL/Material/{}IntegrationData.hxx", self.class_name())
    }

    /// Returns the name of the source file
    pub fn src_file_name(&self) -> String {
        format!("{}.cxx", self.class_name())
    }

    /// Returns the header guard for a class name with a suffix such as `_behaviour_data`
    pub fn header_guard(&self, suffix: &str) -> String {
        format!("LIB_TFEL_MATERIAL_{}{}_HXX", self.class_name(), suffix).to_uppercase()
    }

    /// Restricts the supported modelling hypotheses
    pub fn set_modelling_hypotheses(&mut self, hypotheses: &[ModellingHypothesis]) -> Result<&mut Self, GenError> {
        if hypotheses.is_empty() {
            return Err(GenError::Message("the list of modelling hypotheses must not be empty"));
        }
        if let Some(h) = hypotheses.iter().find(|h| !h.is_defined()) {
            return Err(GenError::UnsupportedHypothesis(h.name().to_string()));
        }
        self.hypotheses = hypotheses.iter().copied().collect();
        self.sd.retain(|h, _| hypotheses.contains(h));
        Ok(self)
    }

    /// Returns the supported modelling hypotheses in emission order
    pub fn modelling_hypotheses(&self) -> Vec<ModellingHypothesis> {
        self.hypotheses.iter().copied().collect()
    }

    /// Returns true if the hypothesis is supported
    pub fn supports(&self, hypothesis: ModellingHypothesis) -> bool {
        self.hypotheses.contains(&hypothesis)
    }

    /// Selects the hypotheses to be treated
    ///
    /// All supported hypotheses are treated if `requested` is None; otherwise
    /// every requested hypothesis must be supported.
    pub fn select_hypotheses(&self, requested: Option<&[ModellingHypothesis]>) -> Result<Vec<ModellingHypothesis>, GenError> {
        match requested {
            None => Ok(self.modelling_hypotheses()),
            Some(list) => {
                let mut selected = BTreeSet::new();
                for h in list {
                    if !self.supports(*h) {
                        return Err(GenError::UnsupportedHypothesis(h.name().to_string()));
                    }
                    selected.insert(*h);
                }
                Ok(selected.into_iter().collect())
            }
        }
    }

    /// Returns the data of a hypothesis (the default data if not specialised)
    pub fn data(&self, hypothesis: ModellingHypothesis) -> &BehaviourData {
        self.sd.get(&hypothesis).unwrap_or(&self.d)
    }

    /// Returns true if the hypothesis has its own data
    pub fn has_specialised_data(&self, hypothesis: ModellingHypothesis) -> bool {
        self.sd.contains_key(&hypothesis)
    }

    /// Returns true if every given hypothesis has its own data
    pub fn are_all_specialised(&self, hypotheses: &[ModellingHypothesis]) -> bool {
        hypotheses.iter().all(|h| self.has_specialised_data(*h))
    }

    /// Gives a hypothesis its own copy of the default data
    pub fn specialise(&mut self, hypothesis: ModellingHypothesis) -> Result<(), GenError> {
        if !self.supports(hypothesis) {
            return Err(GenError::UnsupportedHypothesis(hypothesis.name().to_string()));
        }
        if !self.sd.contains_key(&hypothesis) {
            self.sd.insert(hypothesis, self.d.clone());
        }
        Ok(())
    }

    /// Applies a modification to the data of a hypothesis
    ///
    /// The undefined hypothesis updates the default data and all specialised data.
    fn apply<F>(&mut self, hypothesis: ModellingHypothesis, mut f: F) -> Result<(), GenError>
    where
        F: FnMut(&mut BehaviourData) -> Result<(), GenError>,
    {
        if hypothesis.is_defined() {
            self.specialise(hypothesis)?;
            if let Some(data) = self.sd.get_mut(&hypothesis) {
                let mut updated = data.clone();
                f(&mut updated)?;
                *data = updated;
            }
            return Ok(());
        }
        let mut d = self.d.clone();
        let mut sd = self.sd.clone();
        f(&mut d)?;
        for data in sd.values_mut() {
            f(data)?;
        }
        self.d = d;
        self.sd = sd;
        Ok(())
    }

    /// Runs a sequence of modifications, keeping none of them if one fails
    pub fn transaction<F>(&mut self, f: F) -> Result<(), GenError>
    where
        F: FnOnce(&mut BehaviourDescription) -> Result<(), GenError>,
    {
        let mut updated = self.clone();
        f(&mut updated)?;
        *self = updated;
        Ok(())
    }

    /// Adds a variable
    pub fn add_variable(
        &mut self,
        hypothesis: ModellingHypothesis,
        category: VariableCategory,
        variable: VariableDescription,
    ) -> Result<(), GenError> {
        self.apply(hypothesis, |data| data.add_variable(category, variable.clone()))
    }

    /// Adds a material property
    pub fn add_material_property(&mut self, hypothesis: ModellingHypothesis, variable: VariableDescription) -> Result<(), GenError> {
        self.add_variable(hypothesis, VariableCategory::MaterialProperty, variable)
    }

    /// Adds a state variable
    pub fn add_state_variable(&mut self, hypothesis: ModellingHypothesis, variable: VariableDescription) -> Result<(), GenError> {
        self.add_variable(hypothesis, VariableCategory::StateVariable, variable)
    }

    /// Adds a local variable
    pub fn add_local_variable(&mut self, hypothesis: ModellingHypothesis, variable: VariableDescription) -> Result<(), GenError> {
        self.add_variable(hypothesis, VariableCategory::LocalVariable, variable)
    }

    /// Adds a parameter with its default value
    pub fn add_parameter(
        &mut self,
        hypothesis: ModellingHypothesis,
        variable: VariableDescription,
        default: f64,
    ) -> Result<(), GenError> {
        self.apply(hypothesis, |data| data.add_parameter(variable.clone(), default))
    }

    /// Changes the default value of a parameter
    pub fn set_parameter_default(&mut self, hypothesis: ModellingHypothesis, name: &str, value: f64) -> Result<(), GenError> {
        self.apply(hypothesis, |data| data.set_parameter_default(name, value))
    }

    /// Reserves a name
    pub fn reserve_name(&mut self, hypothesis: ModellingHypothesis, name: &str) -> Result<(), GenError> {
        self.apply(hypothesis, |data| data.reserve_name(name))
    }

    /// Registers the name of a member that is not a variable
    pub fn register_member_name(&mut self, hypothesis: ModellingHypothesis, name: &str) -> Result<(), GenError> {
        self.apply(hypothesis, |data| data.register_member_name(name))
    }

    /// Adds code to a slot
    pub fn set_code(
        &mut self,
        hypothesis: ModellingHypothesis,
        slot: CodeBlockSlot,
        block: CodeBlock,
        mode: Mode,
        position: Position,
    ) -> Result<(), GenError> {
        self.apply(hypothesis, |data| data.set_code(slot, block.clone(), mode, position))
    }

    /// Returns the code of a slot or a missing code block error
    pub fn code(&self, hypothesis: ModellingHypothesis, slot: CodeBlockSlot) -> Result<&CodeBlock, GenError> {
        self.data(hypothesis)
            .code(slot)
            .ok_or_else(|| GenError::MissingCodeBlock {
                slot: slot.name().to_string(),
                hypothesis: hypothesis.name().to_string(),
            })
    }

    /// Returns true if the slot holds code for the hypothesis
    pub fn has_code(&self, hypothesis: ModellingHypothesis, slot: CodeBlockSlot) -> bool {
        self.data(hypothesis).has_code(slot)
    }

    /// Sets a boolean attribute
    pub fn set_attribute(&mut self, hypothesis: ModellingHypothesis, name: &str, value: bool) -> Result<(), GenError> {
        self.apply(hypothesis, |data| {
            data.set_attribute(name, value);
            Ok(())
        })
    }

    /// Sets the glossary name of a variable
    pub fn set_glossary_name(&mut self, hypothesis: ModellingHypothesis, name: &str, glossary_name: &str) -> Result<(), GenError> {
        self.apply(hypothesis, |data| data.set_glossary_name(name, glossary_name))
    }

    /// Declares the elastic material properties
    ///
    /// Isotropic elasticity needs exactly 2 properties (Young's modulus, Poisson ratio);
    /// orthotropic elasticity needs 9 (3 Young's moduli, 3 Poisson ratios, 3 shear moduli).
    /// Each property is a material property, a parameter or a local variable
    /// computed from a formula (see [BehaviourDescription::set_elastic_material_property_formula]).
    pub fn set_elastic_material_properties(&mut self, names: &[&str]) -> Result<(), GenError> {
        let expected = match self.elastic_symmetry {
            BehaviourSymmetry::Isotropic => 2,
            BehaviourSymmetry::Orthotropic => 9,
        };
        if names.len() != expected {
            return Err(GenError::InvalidElasticPropertiesCount(names.len()));
        }
        for name in names {
            match self.d.find_variable(name) {
                Some((VariableCategory::MaterialProperty, _)) | Some((VariableCategory::LocalVariable, _)) => (),
                Some((VariableCategory::Parameter, _)) => {
                    warn!("elastic property '{}' is a parameter: the elastic stiffness is constant", name);
                }
                _ => return Err(GenError::UnknownVariable(name.to_string())),
            }
        }
        self.elastic_material_properties = names.iter().map(|n| n.to_string()).collect();
        Ok(())
    }

    /// Returns the names of the elastic material properties
    pub fn elastic_material_properties(&self) -> &[String] {
        &self.elastic_material_properties
    }

    /// Defines an elastic property as a function of the temperature `T`
    ///
    /// The property must be a local variable.
    pub fn set_elastic_material_property_formula(&mut self, name: &str, formula: &str) -> Result<(), GenError> {
        if !self.d.has_variable(VariableCategory::LocalVariable, name) {
            return Err(GenError::UnknownVariable(name.to_string()));
        }
        self.elastic_formulas.insert(name.to_string(), formula.to_string());
        Ok(())
    }

    /// Returns the formula of an elastic property, if any
    pub fn elastic_material_property_formula(&self, name: &str) -> Option<&str> {
        self.elastic_formulas.get(name).map(|f| f.as_str())
    }

    /// Adds a gradient and its conjugate thermodynamic force
    pub fn add_main_variable(&mut self, gradient: VariableDescription, force: VariableDescription) -> Result<(), GenError> {
        let g = gradient.name.clone();
        let dg = format!("d{}", g);
        let f = force.name.clone();
        self.apply(ModellingHypothesis::Undefined, |data| {
            data.register_member_name(&g)?;
            data.register_member_name(&dg)?;
            data.register_member_name(&f)
        })?;
        self.main_variables.push(MainVariable { gradient, force });
        Ok(())
    }

    /// Adds a header to the includes of the behaviour file (once)
    pub fn append_include(&mut self, header: &str) {
        if !self.includes.iter().any(|h| h == header) {
            self.includes.push(header.to_string());
        }
    }

    /// Returns the additional headers, in insertion order
    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    /// Returns the main variables
    pub fn main_variables(&self) -> &[MainVariable] {
        &self.main_variables
    }

    /// Checks that each gradient and its conjugate force have the same array size
    pub fn check_array_size_of_main_variables(&self) -> Result<(), GenError> {
        for mv in &self.main_variables {
            if mv.gradient.array_size != mv.force.array_size {
                return Err(GenError::MainVariablesArraySizeMismatch {
                    gradient: mv.gradient.name.clone(),
                    force: mv.force.name.clone(),
                });
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
