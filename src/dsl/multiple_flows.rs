use super::{member_code, Behaviour, IsotropicBehaviourBase};
use crate::base::{throw_runtime_error, BehaviourDescription, CodeBlockSlot, GenError, ModellingHypothesis};
use crate::base::{VariableCategory, VariableDescription, DEFAULT_THETA};
use crate::codegen::{FlowDescription, FlowKind, LocalSolveStrategy};

/// Arguments of the methods evaluating the flows
const FLOW_ARGUMENTS: [&str; 3] = ["f", "df_dseq", "df_dp"];

/// Describes a behaviour with isotropic elasticity and several Mises flows
///
/// Each flow `i` owns its equivalent strain `p<i>`; the total equivalent
/// strain `p` is their sum. The flow rules compute `f`, `df_dseq` (and
/// `df_dp`) for the current equivalent stress `seq` and the mid-step
/// equivalent strain of the flow `p_`.
#[derive(Clone, Debug)]
pub struct MultipleIsotropicMisesFlowsDsl {
    base: IsotropicBehaviourBase,
    flows: Vec<FlowDescription>,
}

impl MultipleIsotropicMisesFlowsDsl {
    /// Returns the name of the DSL
    pub fn dsl_name() -> &'static str {
        "MultipleIsotropicMisesFlows"
    }

    /// Allocates a new instance declaring the default variables
    pub fn new(name: &str) -> Result<Self, GenError> {
        let h = ModellingHypothesis::Undefined;
        let mut base = IsotropicBehaviourBase::new(Self::dsl_name(), name, DEFAULT_THETA)?;
        let p = VariableDescription::new("strain", "p")?.with_glossary_name("EquivalentStrain");
        base.bd.add_state_variable(h, p)?;
        base.bd.add_local_variable(h, VariableDescription::new("strain", "p_")?)?;
        for name in ["mu_3_theta", "surf", "vdp", "newton_f", "newton_df", "error"] {
            base.bd.reserve_name(h, name)?;
        }
        Ok(MultipleIsotropicMisesFlowsDsl {
            base,
            flows: Vec::new(),
        })
    }

    /// Returns the description being built
    pub fn description(&self) -> &BehaviourDescription {
        &self.base.bd
    }

    /// Returns the flows declared so far
    pub fn flows(&self) -> &[FlowDescription] {
        &self.flows
    }

    pub fn set_material_name(&mut self, material: &str) -> Result<&mut Self, GenError> {
        self.base.bd.set_material_name(material)?;
        Ok(self)
    }

    pub fn set_library(&mut self, library: &str) -> Result<&mut Self, GenError> {
        self.base.bd.set_library(library)?;
        Ok(self)
    }

    pub fn set_modelling_hypotheses(&mut self, hypotheses: &[ModellingHypothesis]) -> Result<&mut Self, GenError> {
        self.base.set_modelling_hypotheses(hypotheses)?;
        Ok(self)
    }

    /// Sets the default value of the implicit parameter shared by the flows without specific value
    pub fn set_theta(&mut self, value: f64) -> Result<&mut Self, GenError> {
        self.base.set_theta(value)?;
        Ok(self)
    }

    pub fn set_epsilon(&mut self, value: f64) -> Result<&mut Self, GenError> {
        self.base.set_epsilon(value)?;
        Ok(self)
    }

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
    pub fn set_elastic_formulas(&mut self, young: Option<&str>, nu: Option<&str>) -> Result<&mut Self, GenError> {
        self.base.set_elastic_formulas(young, nu);
        Ok(self)
    }

    pub fn add_code(&mut self, slot: CodeBlockSlot, code: &str) -> Result<&mut Self, GenError> {
        self.base.add_code(slot, code)?;
        Ok(self)
    }

    pub fn set_stress_update_algorithm(&mut self, flag: bool) -> Result<&mut Self, GenError> {
        self.base.set_stress_update_algorithm(flag)?;
        Ok(self)
    }

    /// Adds a flow
    ///
    /// A specific `theta` makes the flow use its own elastic prediction `seq_e<i>`.
    pub fn add_flow(&mut self, kind: FlowKind, code: &str, theta: Option<f64>) -> Result<&mut Self, GenError> {
        let h = ModellingHypothesis::Undefined;
        if let Some(t) = theta {
            if !(t >= 0.0 && t <= 1.0) {
                return Err(throw_runtime_error(
                    "MultipleIsotropicMisesFlowsDSL::treatFlowRule",
                    "theta value must be positive and smaller than 1",
                ));
            }
        }
        let i = self.flows.len();
        let bd = &mut self.base.bd;
        let p = VariableDescription::new("strain", &format!("p{}", i))?;
        bd.add_state_variable(h, p)?;
        let (f, df_dseq, df_dp) = match kind {
            FlowKind::PlasticFlow => ("stress", "real", Some("stress")),
            FlowKind::CreepFlow => ("DstrainDt", "DF_DSEQ_TYPE", None),
            FlowKind::StrainHardeningCreepFlow => ("DstrainDt", "DF_DSEQ_TYPE", Some("DstrainDt")),
        };
        bd.add_local_variable(h, VariableDescription::new(f, &format!("f{}", i))?)?;
        bd.add_local_variable(h, VariableDescription::new(df_dseq, &format!("df_dseq{}", i))?)?;
        if let Some(df_dp) = df_dp {
            bd.add_local_variable(h, VariableDescription::new(df_dp, &format!("df_dp{}", i))?)?;
        }
        bd.reserve_name(h, &format!("computeFlow{}", i))?;
        if kind == FlowKind::PlasticFlow {
            bd.reserve_name(h, &format!("surf{}", i))?;
        }
        if theta.is_some() {
            bd.reserve_name(h, &format!("se{}", i))?;
            bd.reserve_name(h, &format!("mu_3_theta{}", i))?;
            bd.add_local_variable(h, VariableDescription::new("stress", &format!("seq_e{}", i))?)?;
        }
        self.flows.push(FlowDescription {
            kind,
            code: code.to_string(),
            theta,
        });
        Ok(self)
    }

    /// Completes the description
    ///
    /// The flow rules are rewritten once all the variables are known; the
    /// arguments `f`, `df_dseq` and `df_dp` are left untouched.
    pub fn finish(mut self) -> Result<Behaviour, GenError> {
        if self.flows.is_empty() {
            return Err(throw_runtime_error(
                "MultipleIsotropicMisesFlowsDSL::endsInputFileProcessing",
                "no flow defined",
            ));
        }
        self.base.complete()?;
        let data = self.base.bd.data(ModellingHypothesis::Undefined);
        let flows = self
            .flows
            .iter()
            .map(|flow| FlowDescription {
                kind: flow.kind,
                code: member_code(data, &flow.code, true, &FLOW_ARGUMENTS).code,
                theta: flow.theta,
            })
            .collect();
        Ok(Behaviour {
            description: self.base.bd,
            strategy: LocalSolveStrategy::MultipleIsotropicMisesFlows(flows),
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
