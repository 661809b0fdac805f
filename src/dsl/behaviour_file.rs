use super::{Behaviour, ImplicitDsl, IsotropicDsl, IsotropicFlowKind, MultipleIsotropicMisesFlowsDsl};
use crate::base::{throw_runtime_error, Bounds, CodeBlockSlot, GenError, ModellingHypothesis, VariableCategory};
use crate::base::VariableDescription;
use crate::bricks::DataMap;
use crate::codegen::{FlowKind, NonLinearSystemSolver};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Selects the DSL reading a behaviour file
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum DslName {
    IsotropicMisesCreep,
    IsotropicMisesPlasticFlow,
    IsotropicStrainHardeningMisesCreep,
    MultipleIsotropicMisesFlows,
    Implicit,
}

/// Holds a variable declared in a behaviour file
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct VariableEntry {
    pub category: VariableCategory,

    #[serde(rename = "type")]
    pub type_name: String,

    pub name: String,

    #[serde(default)]
    pub array_size: Option<usize>,

    #[serde(default)]
    pub glossary: Option<String>,

    #[serde(default)]
    pub entry: Option<String>,

    #[serde(default)]
    pub bounds: Option<Bounds>,

    #[serde(default)]
    pub physical_bounds: Option<Bounds>,

    /// Default value (parameters only)
    #[serde(default)]
    pub default: Option<f64>,
}

impl VariableEntry {
    /// Returns the description of the variable
    pub fn description(&self) -> Result<VariableDescription, GenError> {
        let mut v = match self.array_size {
            Some(n) => VariableDescription::new_array(&self.type_name, &self.name, n)?,
            None => VariableDescription::new(&self.type_name, &self.name)?,
        };
        if let Some(g) = &self.glossary {
            v = v.with_glossary_name(g);
        }
        if let Some(e) = &self.entry {
            v = v.with_entry_name(e);
        }
        if let Some(b) = self.bounds {
            v = v.with_bounds(b);
        }
        if let Some(b) = self.physical_bounds {
            v = v.with_physical_bounds(b);
        }
        Ok(v)
    }
}

/// Holds a flow of a behaviour with several isotropic flows
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FlowEntry {
    pub kind: FlowKind,
    pub code: String,

    #[serde(default)]
    pub theta: Option<f64>,
}

/// Holds a user code block
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CodeEntry {
    pub slot: CodeBlockSlot,
    pub code: String,
}

/// Holds the elastic properties given as functions of the temperature
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ElasticFormulas {
    #[serde(default)]
    pub young: Option<String>,

    #[serde(default)]
    pub nu: Option<String>,
}

/// Holds a behaviour file (JSON)
///
/// # Example
///
/// ```json
/// {
///   "dsl": "IsotropicMisesCreep",
///   "name": "Norton",
///   "material": "Inconel600",
///   "variables": [
///     { "category": "MaterialProperty", "type": "real", "name": "A" },
///     { "category": "MaterialProperty", "type": "real", "name": "E" }
///   ],
///   "flow_rule": "f = A*pow(seq,E);\ndf_dseq = E*f/seq;"
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BehaviourFile {
    /// DSL reading the file
    pub dsl: DslName,

    /// Behaviour name
    pub name: String,

    #[serde(default)]
    pub material: Option<String>,

    #[serde(default)]
    pub library: Option<String>,

    /// Modelling hypotheses (all those supported by the DSL if empty)
    #[serde(default)]
    pub hypotheses: Vec<ModellingHypothesis>,

    #[serde(default)]
    pub variables: Vec<VariableEntry>,

    #[serde(default)]
    pub theta: Option<f64>,

    #[serde(default)]
    pub epsilon: Option<f64>,

    #[serde(default)]
    pub iter_max: Option<usize>,

    /// Overridden default values of parameters
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,

    /// Elastic properties as functions of the temperature (isotropic DSLs)
    #[serde(default)]
    pub elastic_formulas: Option<ElasticFormulas>,

    /// Elastic material properties (implicit DSL)
    #[serde(default)]
    pub elastic_material_properties: Vec<String>,

    #[serde(default)]
    pub stress_update_algorithm: bool,

    /// Flow rule of the DSLs with one isotropic flow
    #[serde(default)]
    pub flow_rule: Option<String>,

    /// Flows of the DSL with several isotropic flows
    #[serde(default)]
    pub flows: Vec<FlowEntry>,

    #[serde(default)]
    pub code: Vec<CodeEntry>,

    /// Solver of the implicit DSL (`NewtonRaphson` or `NewtonRaphson_NumericalJacobian`)
    #[serde(default)]
    pub algorithm: Option<String>,

    #[serde(default)]
    pub jacobian_update_period: Option<usize>,

    #[serde(default)]
    pub compare_to_numerical_jacobian: bool,

    /// Data of the StandardElastoViscoPlasticity brick (implicit DSL)
    #[serde(default)]
    pub brick: Option<DataMap>,

    /// Requests the legacy emitter (no longer available)
    #[serde(default)]
    pub legacy: bool,
}

/// Declares the variables, giving the parameters their default value
fn declare_variables<F>(entries: &[VariableEntry], mut add: F) -> Result<(), GenError>
where
    F: FnMut(VariableCategory, VariableDescription, Option<f64>) -> Result<(), GenError>,
{
    for entry in entries {
        if entry.category == VariableCategory::Parameter && entry.default.is_none() {
            return Err(throw_runtime_error(
                "BehaviourFile::declareVariables",
                &format!("no default value given for parameter '{}'", entry.name),
            ));
        }
        add(entry.category, entry.description()?, entry.default)?;
    }
    Ok(())
}

impl BehaviourFile {
    /// Reads a JSON file
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read<P>(full_path: &P) -> Result<Self, GenError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let file = File::open(&path).map_err(|e| GenError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let reader = BufReader::new(file);
        let data = serde_json::from_reader(reader)?;
        Ok(data)
    }

    /// Parses a JSON string
    pub fn from_json(json: &str) -> Result<Self, GenError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the behaviour with the selected DSL
    pub fn to_behaviour(&self) -> Result<Behaviour, GenError> {
        if self.legacy {
            warn!("'{}': the legacy behaviour emitter has been requested", self.name);
            return Err(GenError::DeprecatedLegacyEmitter);
        }
        info!("reading behaviour '{}' with the {:?} DSL", self.name, self.dsl);
        let mut behaviour = match self.dsl {
            DslName::IsotropicMisesCreep => self.isotropic(IsotropicFlowKind::Creep)?,
            DslName::IsotropicMisesPlasticFlow => self.isotropic(IsotropicFlowKind::PlasticFlow)?,
            DslName::IsotropicStrainHardeningMisesCreep => self.isotropic(IsotropicFlowKind::StrainHardeningCreep)?,
            DslName::MultipleIsotropicMisesFlows => self.multiple_flows()?,
            DslName::Implicit => self.implicit()?,
        };
        for (name, value) in &self.parameters {
            behaviour
                .description
                .set_parameter_default(ModellingHypothesis::Undefined, name, *value)?;
        }
        Ok(behaviour)
    }

    /// Rejects the entries the selected DSL doesn't read
    fn check_unused(&self, flow_rule: bool, flows: bool, implicit: bool) -> Result<(), GenError> {
        let method = format!("{:?}::readBehaviourFile", self.dsl);
        if !flow_rule && self.flow_rule.is_some() {
            return Err(throw_runtime_error(&method, "'flow_rule' is not used by this DSL"));
        }
        if !flows && !self.flows.is_empty() {
            return Err(throw_runtime_error(&method, "'flows' is not used by this DSL"));
        }
        if !implicit && (self.brick.is_some() || self.algorithm.is_some() || !self.elastic_material_properties.is_empty()) {
            return Err(throw_runtime_error(
                &method,
                "'brick', 'algorithm' and 'elastic_material_properties' are only used by the Implicit DSL",
            ));
        }
        if implicit && (self.elastic_formulas.is_some() || self.stress_update_algorithm) {
            return Err(throw_runtime_error(
                &method,
                "'elastic_formulas' and 'stress_update_algorithm' are not used by the Implicit DSL",
            ));
        }
        Ok(())
    }

    fn isotropic(&self, kind: IsotropicFlowKind) -> Result<Behaviour, GenError> {
        self.check_unused(true, false, false)?;
        let mut dsl = IsotropicDsl::new(kind, &self.name)?;
        if let Some(material) = &self.material {
            dsl.set_material_name(material)?;
        }
        if let Some(library) = &self.library {
            dsl.set_library(library)?;
        }
        if !self.hypotheses.is_empty() {
            dsl.set_modelling_hypotheses(&self.hypotheses)?;
        }
        if let Some(theta) = self.theta {
            dsl.set_theta(theta)?;
        }
        if let Some(epsilon) = self.epsilon {
            dsl.set_epsilon(epsilon)?;
        }
        if let Some(iter_max) = self.iter_max {
            dsl.set_iter_max(iter_max)?;
        }
        declare_variables(&self.variables, |category, v, default| {
            match default {
                Some(value) if category == VariableCategory::Parameter => dsl.add_parameter(v, value)?,
                _ => dsl.add_variable(category, v)?,
            };
            Ok(())
        })?;
        if let Some(formulas) = &self.elastic_formulas {
            dsl.set_elastic_formulas(formulas.young.as_deref(), formulas.nu.as_deref())?;
        }
        dsl.set_stress_update_algorithm(self.stress_update_algorithm)?;
        for entry in &self.code {
            dsl.add_code(entry.slot, &entry.code)?;
        }
        if let Some(code) = &self.flow_rule {
            dsl.set_flow_rule(code)?;
        }
        dsl.finish()
    }

    fn multiple_flows(&self) -> Result<Behaviour, GenError> {
        self.check_unused(false, true, false)?;
        let mut dsl = MultipleIsotropicMisesFlowsDsl::new(&self.name)?;
        if let Some(material) = &self.material {
            dsl.set_material_name(material)?;
        }
        if let Some(library) = &self.library {
            dsl.set_library(library)?;
        }
        if !self.hypotheses.is_empty() {
            dsl.set_modelling_hypotheses(&self.hypotheses)?;
        }
        if let Some(theta) = self.theta {
            dsl.set_theta(theta)?;
        }
        if let Some(epsilon) = self.epsilon {
            dsl.set_epsilon(epsilon)?;
        }
        if let Some(iter_max) = self.iter_max {
            dsl.set_iter_max(iter_max)?;
        }
        declare_variables(&self.variables, |category, v, default| {
            match default {
                Some(value) if category == VariableCategory::Parameter => dsl.add_parameter(v, value)?,
                _ => dsl.add_variable(category, v)?,
            };
            Ok(())
        })?;
        if let Some(formulas) = &self.elastic_formulas {
            dsl.set_elastic_formulas(formulas.young.as_deref(), formulas.nu.as_deref())?;
        }
        dsl.set_stress_update_algorithm(self.stress_update_algorithm)?;
        for entry in &self.code {
            dsl.add_code(entry.slot, &entry.code)?;
        }
        for flow in &self.flows {
            dsl.add_flow(flow.kind, &flow.code, flow.theta)?;
        }
        dsl.finish()
    }

    fn implicit(&self) -> Result<Behaviour, GenError> {
        self.check_unused(false, false, true)?;
        let mut dsl = ImplicitDsl::new(&self.name)?;
        if let Some(material) = &self.material {
            dsl.set_material_name(material)?;
        }
        if let Some(library) = &self.library {
            dsl.set_library(library)?;
        }
        if !self.hypotheses.is_empty() {
            dsl.set_modelling_hypotheses(&self.hypotheses)?;
        }
        if let Some(name) = &self.algorithm {
            let solver = match NonLinearSystemSolver::from_name(name)? {
                NonLinearSystemSolver::NewtonRaphsonNumericalJacobian { .. } => {
                    NonLinearSystemSolver::NewtonRaphsonNumericalJacobian {
                        jacobian_update_period: self.jacobian_update_period,
                    }
                }
                solver => solver,
            };
            dsl.set_algorithm(solver)?;
        }
        if let Some(theta) = self.theta {
            dsl.set_theta(theta)?;
        }
        if let Some(epsilon) = self.epsilon {
            dsl.set_epsilon(epsilon)?;
        }
        if let Some(iter_max) = self.iter_max {
            dsl.set_iter_max(iter_max)?;
        }
        if let Some(brick) = &self.brick {
            dsl.add_brick(brick)?;
        }
        declare_variables(&self.variables, |category, v, default| {
            match default {
                Some(value) if category == VariableCategory::Parameter => dsl.add_parameter(v, value)?,
                _ => dsl.add_variable(category, v)?,
            };
            Ok(())
        })?;
        if !self.elastic_material_properties.is_empty() {
            let names: Vec<&str> = self.elastic_material_properties.iter().map(|s| s.as_str()).collect();
            dsl.set_elastic_material_properties(&names)?;
        }
        dsl.set_compare_to_numerical_jacobian(self.compare_to_numerical_jacobian)?;
        for entry in &self.code {
            dsl.add_code(entry.slot, &entry.code)?;
        }
        dsl.finish()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
