use super::{Behaviour, IsotropicBehaviourBase};
use crate::base::{throw_runtime_error, BehaviourDescription, CodeBlockSlot, GenError, ModellingHypothesis};
use crate::base::{VariableCategory, VariableDescription};
use crate::codegen::LocalSolveStrategy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines the flows treated by [IsotropicDsl]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum IsotropicFlowKind {
    /// `dp/dt = f(seq)`
    Creep,

    /// `f(seq,p) <= 0`
    PlasticFlow,

    /// `dp/dt = f(seq,p)`
    StrainHardeningCreep,
}

impl IsotropicFlowKind {
    /// Returns the name of the DSL
    pub fn dsl_name(&self) -> &'static str {
        match self {
            IsotropicFlowKind::Creep => "IsotropicMisesCreep",
            IsotropicFlowKind::PlasticFlow => "IsotropicMisesPlasticFlow",
            IsotropicFlowKind::StrainHardeningCreep => "IsotropicStrainHardeningMisesCreep",
        }
    }

    /// Returns the local integration algorithm
    pub fn strategy(&self) -> LocalSolveStrategy {
        match self {
            IsotropicFlowKind::Creep => LocalSolveStrategy::IsotropicMisesCreep,
            IsotropicFlowKind::PlasticFlow => LocalSolveStrategy::IsotropicMisesPlasticFlow,
            IsotropicFlowKind::StrainHardeningCreep => LocalSolveStrategy::IsotropicStrainHardeningMisesCreep,
        }
    }

    /// Returns the default value of theta
    fn default_theta(&self) -> f64 {
        match self {
            IsotropicFlowKind::PlasticFlow => 1.0,
            _ => 0.5,
        }
    }

    /// Returns the glossary name of the equivalent strain
    fn equivalent_strain_glossary_name(&self) -> &'static str {
        match self {
            IsotropicFlowKind::PlasticFlow => "EquivalentPlasticStrain",
            _ => "EquivalentViscoplasticStrain",
        }
    }

    /// Returns the types of `f`, `df_dseq` and `df_dp`
    fn flow_types(&self) -> (&'static str, &'static str, Option<&'static str>) {
        match self {
            IsotropicFlowKind::Creep => ("DstrainDt", "DF_DSEQ_TYPE", None),
            IsotropicFlowKind::PlasticFlow => ("stress", "real", Some("stress")),
            IsotropicFlowKind::StrainHardeningCreep => ("DstrainDt", "DF_DSEQ_TYPE", Some("DstrainDt")),
        }
    }

    /// Returns the names used by the local variables of the generated methods
    fn reserved_names(&self) -> &'static [&'static str] {
        match self {
            IsotropicFlowKind::Creep => &["computeFlow", "mu_3_theta", "ccto_tmp_1"],
            IsotropicFlowKind::PlasticFlow => &["computeFlow", "mu_3_theta", "surf", "ccto_tmp_1"],
            IsotropicFlowKind::StrainHardeningCreep => &["computeFlow", "mu_3", "ccto_tmp_1"],
        }
    }
}

impl fmt::Display for IsotropicFlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dsl_name())
    }
}

/// Describes a behaviour with isotropic elasticity and one Mises flow
///
/// The flow rule computes `f` and its derivatives `df_dseq` (and `df_dp`
/// except for creep) from the equivalent stress `seq` and, for plastic
/// and strain hardening flows, the equivalent strain at the middle of the
/// step `p_`. Members are written without `this->`; external state
/// variables stand for their value at the middle of the step.
///
/// # Example
///
/// ```
/// use mbgen::prelude::*;
///
/// fn main() -> Result<(), GenError> {
///     let mut dsl = IsotropicDsl::new(IsotropicFlowKind::Creep, "Norton")?;
///     dsl.add_material_property("real", "A")?
///         .add_material_property("real", "E")?
///         .set_flow_rule("f = A*pow(seq,E);\ndf_dseq = E*f/seq;")?;
///     let behaviour = dsl.finish()?;
///     assert_eq!(behaviour.strategy, LocalSolveStrategy::IsotropicMisesCreep);
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct IsotropicDsl {
    kind: IsotropicFlowKind,
    base: IsotropicBehaviourBase,
    flow_rule: Option<String>,
}

impl IsotropicDsl {
    /// Allocates a new instance declaring the default variables
    pub fn new(kind: IsotropicFlowKind, name: &str) -> Result<Self, GenError> {
        let h = ModellingHypothesis::Undefined;
        let mut base = IsotropicBehaviourBase::new(kind.dsl_name(), name, kind.default_theta())?;
        let bd = &mut base.bd;
        let p = VariableDescription::new("strain", "p")?.with_glossary_name(kind.equivalent_strain_glossary_name());
        bd.add_state_variable(h, p)?;
        let (f, df_dseq, df_dp) = kind.flow_types();
        bd.add_local_variable(h, VariableDescription::new(f, "f")?)?;
        bd.add_local_variable(h, VariableDescription::new(df_dseq, "df_dseq")?)?;
        if let Some(df_dp) = df_dp {
            bd.add_local_variable(h, VariableDescription::new(df_dp, "df_dp")?)?;
            bd.add_local_variable(h, VariableDescription::new("strain", "p_")?)?;
        }
        for name in kind.reserved_names() {
            bd.reserve_name(h, name)?;
        }
        Ok(IsotropicDsl {
            kind,
            base,
            flow_rule: None,
        })
    }

    /// Returns the kind of flow
    pub fn kind(&self) -> IsotropicFlowKind {
        self.kind
    }

    /// Returns the description being built
    pub fn description(&self) -> &BehaviourDescription {
        &self.base.bd
    }

    /// Sets the material name
    pub fn set_material_name(&mut self, material: &str) -> Result<&mut Self, GenError> {
        self.base.bd.set_material_name(material)?;
        Ok(self)
    }

    /// Sets the library name
    pub fn set_library(&mut self, library: &str) -> Result<&mut Self, GenError> {
        self.base.bd.set_library(library)?;
        Ok(self)
    }

    /// Restricts the modelling hypotheses
    pub fn set_modelling_hypotheses(&mut self, hypotheses: &[ModellingHypothesis]) -> Result<&mut Self, GenError> {
        self.base.set_modelling_hypotheses(hypotheses)?;
        Ok(self)
    }

    /// Sets the default value of the implicit parameter (in `[0,1]`)
    pub fn set_theta(&mut self, value: f64) -> Result<&mut Self, GenError> {
        self.base.set_theta(value)?;
        Ok(self)
    }

    /// Sets the default convergence criterion of the local Newton algorithm
    pub fn set_epsilon(&mut self, value: f64) -> Result<&mut Self, GenError> {
        self.base.set_epsilon(value)?;
        Ok(self)
    }

    /// Sets the default maximum number of iterations of the local Newton algorithm
    pub fn set_iter_max(&mut self, value: usize) -> Result<&mut Self, GenError> {
        self.base.set_iter_max(value)?;
        Ok(self)
    }

    /// Adds a variable (state variables are not allowed)
    pub fn add_variable(&mut self, category: VariableCategory, variable: VariableDescription) -> Result<&mut Self, GenError> {
        self.base.add_variable(category, variable)?;
        Ok(self)
    }

    /// Adds a parameter with its default value
    pub fn add_parameter(&mut self, variable: VariableDescription, default: f64) -> Result<&mut Self, GenError> {
        self.base.add_parameter(variable, default)?;
        Ok(self)
    }

    /// Adds a scalar material property
    pub fn add_material_property(&mut self, type_name: &str, name: &str) -> Result<&mut Self, GenError> {
        self.add_variable(VariableCategory::MaterialProperty, VariableDescription::new(type_name, name)?)
    }

    /// Defines the elastic properties as functions of the temperature `T`
    ///
    /// A property without formula is a material property.
    pub fn set_elastic_formulas(&mut self, young: Option<&str>, nu: Option<&str>) -> Result<&mut Self, GenError> {
        self.base.set_elastic_formulas(young, nu);
        Ok(self)
    }

    /// Sets the flow rule
    pub fn set_flow_rule(&mut self, code: &str) -> Result<&mut Self, GenError> {
        if self.flow_rule.is_some() {
            return Err(GenError::CodeBlockAlreadyDefined(CodeBlockSlot::FlowRule.name().to_string()));
        }
        self.flow_rule = Some(code.to_string());
        Ok(self)
    }

    /// Adds user code to a slot
    pub fn add_code(&mut self, slot: CodeBlockSlot, code: &str) -> Result<&mut Self, GenError> {
        self.base.add_code(slot, code)?;
        Ok(self)
    }

    /// Rebuilds the elastic strain from the stress at the beginning of each step
    pub fn set_stress_update_algorithm(&mut self, flag: bool) -> Result<&mut Self, GenError> {
        self.base.set_stress_update_algorithm(flag)?;
        Ok(self)
    }

    /// Completes the description
    pub fn finish(mut self) -> Result<Behaviour, GenError> {
        let flow_rule = self.flow_rule.take().ok_or_else(|| {
            throw_runtime_error(
                &format!("{}::endsInputFileProcessing", self.kind.dsl_name()),
                "no flow rule defined",
            )
        })?;
        self.base.complete()?;
        self.base.set_flow_rule(&flow_rule)?;
        Ok(Behaviour {
            description: self.base.bd,
            strategy: self.kind.strategy(),
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
