use super::{add_local_variable, append_code, append_initialization_code, check, declare_material_properties};
use super::{DataMap, MaterialProperty, OptionDescription, OptionType};
use crate::base::{BehaviourDescription, CodeBlockSlot, GenError, ModellingHypothesis, VariableDescription};
use crate::codegen::ResidualTerm;

/// Name of the elastic strain
pub const ELASTIC_STRAIN: &str = "eel";

/// Name of the parameter giving the lower bound of the equivalent stress relative to Young's modulus
pub const EQUIVALENT_STRESS_LOWER_BOUND: &str = "relative_value_for_the_equivalent_stress_lower_bound";

/// Implements the isotropic Hooke law `sig = D:eel`
///
/// The elastic strain `eel` is the first unknown of the implicit system.
/// Young's modulus and the Poisson ratio are material properties of the
/// behaviour unless given as options.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HookeStressPotential {
    /// Young's modulus (`young`)
    pub young_modulus: Option<MaterialProperty>,

    /// Poisson ratio (`nu`)
    pub poisson_ratio: Option<MaterialProperty>,
}

impl HookeStressPotential {
    /// Returns the options
    pub fn options() -> Vec<OptionDescription> {
        vec![
            OptionDescription::new("young_modulus", "Young modulus", OptionType::MaterialProperty)
                .requires(&["poisson_ratio"]),
            OptionDescription::new("poisson_ratio", "Poisson ratio", OptionType::MaterialProperty)
                .requires(&["young_modulus"]),
        ]
    }

    /// Reads the options
    pub fn new(d: &DataMap) -> Result<Self, GenError> {
        check("Hooke", d, &HookeStressPotential::options())?;
        Ok(HookeStressPotential {
            young_modulus: MaterialProperty::optional(d, "young_modulus")?,
            poisson_ratio: MaterialProperty::optional(d, "poisson_ratio")?,
        })
    }

    /// Declares the elastic strain, the elastic properties and the stiffness
    pub fn initialize(&self, bd: &mut BehaviourDescription) -> Result<(), GenError> {
        let h = ModellingHypothesis::Undefined;
        let eel = VariableDescription::new("StrainStensor", ELASTIC_STRAIN)?.with_glossary_name("ElasticStrain");
        bd.add_state_variable(h, eel)?;
        match (&self.young_modulus, &self.poisson_ratio) {
            (Some(young), Some(nu)) => {
                declare_material_properties(
                    bd,
                    &[(young, "stress", "young".to_string()), (nu, "real", "nu".to_string())],
                )?;
            }
            _ => {
                let young = VariableDescription::new("stress", "young")?.with_glossary_name("YoungModulus");
                let nu = VariableDescription::new("real", "nu")?.with_glossary_name("PoissonRatio");
                bd.add_material_property(h, young)?;
                bd.add_material_property(h, nu)?;
            }
        }
        bd.set_elastic_material_properties(&["young", "nu"])?;
        bd.add_parameter(h, VariableDescription::new("real", EQUIVALENT_STRESS_LOWER_BOUND)?, 1e-12)?;
        for name in ["lambda", "mu"] {
            add_local_variable(bd, "stress", name)?;
        }
        add_local_variable(bd, "StiffnessTensor", "D")?;
        add_local_variable(bd, "StressStensor", "sigel")?;
        append_initialization_code(
            bd,
            "this->lambda = tfel::material::computeLambda(this->young,this->nu);\n\
             this->mu = tfel::material::computeMu(this->young,this->nu);\n\
             this->D = (this->lambda)*Stensor4::IxI()+2*(this->mu)*Stensor4::Id();\n",
            &["lambda", "mu", "D", "young", "nu"],
        )?;
        append_code(
            bd,
            CodeBlockSlot::InitializeLocalVariables,
            "this->sigel = (this->D)*(this->eel+this->deto);\n",
            &["sigel", "D", "eel"],
        )?;
        append_code(
            bd,
            CodeBlockSlot::ComputeStress,
            "this->sig = (this->D)*(this->eel+(this->theta)*(this->deel));\n",
            &["D", "eel", "deel"],
        )?;
        append_code(
            bd,
            CodeBlockSlot::ComputeFinalStress,
            "this->sig = (this->D)*(this->eel);\n",
            &["D", "eel"],
        )?;
        append_code(
            bd,
            CodeBlockSlot::ComputePredictionOperator,
            "static_cast<void>(smt);\nthis->Dt = this->D;\n",
            &["D"],
        )?;
        append_code(
            bd,
            CodeBlockSlot::ComputeTangentOperator,
            "if(smt==ELASTIC){\n\
             this->Dt = this->D;\n\
             } else if(smt==CONSISTENTTANGENTOPERATOR){\n\
             Stensor4 Je;\n\
             if(!this->getPartialJacobianInvert(Je)){\n\
             return false;\n\
             }\n\
             this->Dt = (this->D)*Je;\n\
             } else {\n\
             return false;\n\
             }\n",
            &["D"],
        )?;
        bd.has_consistent_tangent_operator = true;
        bd.is_consistent_tangent_operator_symmetric = true;
        Ok(())
    }

    /// Returns the contribution of the total strain increment to the elastic strain residual
    pub fn residual_terms(&self) -> Vec<ResidualTerm> {
        vec![ResidualTerm::new(ELASTIC_STRAIN, "feel -= this->deto;")]
    }

    /// Returns the lower bound of the equivalent stress used to normalise flow directions
    pub fn equivalent_stress_lower_bound(&self) -> String {
        format!("(this->{})*(this->young)", EQUIVALENT_STRESS_LOWER_BOUND)
    }

    /// Returns the code adding to `df<residual>_ddeel` the derivative through the stress
    ///
    /// `df_dsig` is the derivative of the residual with respect to the stress:
    /// a symmetric tensor for a scalar residual, a fourth order tensor otherwise.
    pub fn stress_derivative(&self, residual: &str, df_dsig: &str, scalar_residual: bool) -> String {
        if scalar_residual {
            format!("df{}_ddeel += (this->theta)*(({})|(this->D));\n", residual, df_dsig)
        } else {
            format!("df{}_ddeel += (this->theta)*({})*(this->D);\n", residual, df_dsig)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
