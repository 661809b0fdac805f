use super::{rewrite_identifiers, EmitContext, SourceWriter};
use crate::base::{throw_runtime_error, BehaviourData, BehaviourDescription, BehaviourSymmetry, GenError};
use crate::base::{VariableCategory, ATTRIBUTE_STRESS_UPDATE_ALGORITHM};

/// Threshold on the elastic prediction below which the flow direction is zero (creep flows)
pub const CREEP_PREDICTION_THRESHOLD: &str = "real(0.01)";

/// Threshold on the elastic prediction below which the flow direction is zero (plastic flows)
pub const PLASTIC_PREDICTION_THRESHOLD: &str = "100";

/// Temperature at the middle of the time step
const MID_STEP_TEMPERATURE: &str = "(this->T+(this->theta)*(this->dT))";

/// Temperature at the end of the time step
const END_OF_STEP_TEMPERATURE: &str = "(this->T+this->dT)";

/// Checks that the elasticity is isotropic and given by exactly two properties
pub fn check_isotropic_elasticity(bd: &BehaviourDescription) -> Result<(), GenError> {
    if bd.elastic_symmetry != BehaviourSymmetry::Isotropic {
        return Err(throw_runtime_error(
            "IsotropicBehaviourCodeGenerator::check",
            "the elastic behaviour must be isotropic",
        ));
    }
    match bd.elastic_material_properties().len() {
        2 => Ok(()),
        n => Err(GenError::InvalidElasticPropertiesCount(n)),
    }
}

/// Rewrites a formula in T into a member expression evaluated at the given temperature
fn evaluate_formula(data: &BehaviourData, formula: &str, temperature: &str) -> String {
    rewrite_identifiers(formula, |word| {
        if word == "T" {
            Some(temperature.to_string())
        } else if data.registered_names().contains(word) {
            Some(format!("this->{}", word))
        } else {
            None
        }
    })
}

/// Writes the computation of the Lamé coefficients at the middle and at the end of the step
///
/// Constant elastic properties give `lambda_tdt == lambda`. Properties defined
/// by a formula are evaluated at `T+theta*dT` for `lambda` and `mu`, and at
/// `T+dT` for `lambda_tdt` and `mu_tdt`.
pub fn write_lame_coefficients(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    let (young, nu) = ctx.elastic_names()?;
    let data = ctx.data();
    let young_formula = ctx.bd.elastic_material_property_formula(young);
    let nu_formula = ctx.bd.elastic_material_property_formula(nu);
    if young_formula.is_none() && nu_formula.is_none() {
        w.line(&format!(
            "this->lambda=tfel::material::computeLambda(this->{},this->{});",
            young, nu
        ));
        w.line(&format!(
            "this->mu=tfel::material::computeMu(this->{},this->{});",
            young, nu
        ));
        w.line("this->lambda_tdt = this->lambda;");
        w.line("this->mu_tdt     = this->mu;");
        return Ok(());
    }
    for (name, formula) in [(young, young_formula), (nu, nu_formula)] {
        if let Some(f) = formula {
            w.line(&format!(
                "this->{} = {};",
                name,
                evaluate_formula(data, f, MID_STEP_TEMPERATURE)
            ));
        }
    }
    w.line(&format!(
        "this->lambda=tfel::material::computeLambda(this->{},this->{});",
        young, nu
    ));
    w.line(&format!(
        "this->mu=tfel::material::computeMu(this->{},this->{});",
        young, nu
    ));
    w.open("");
    let young_tdt = format!("{}_tdt", young);
    let nu_tdt = format!("{}_tdt", nu);
    for (name, tdt, formula) in [(young, &young_tdt, young_formula), (nu, &nu_tdt, nu_formula)] {
        let value = match formula {
            Some(f) => evaluate_formula(data, f, END_OF_STEP_TEMPERATURE),
            None => format!("this->{}", name),
        };
        w.declare("const auto", tdt, &value)?;
    }
    w.line(&format!(
        "this->lambda_tdt = tfel::material::computeLambda({},{});",
        young_tdt, nu_tdt
    ));
    w.line(&format!(
        "this->mu_tdt     = tfel::material::computeMu({},{});",
        young_tdt, nu_tdt
    ));
    w.close("");
    Ok(())
}

/// Writes the computation of the external state variables at the middle of the step
pub fn write_mid_step_external_state_variables(ctx: &EmitContext, w: &mut SourceWriter) {
    let data = ctx.data();
    for v in data.variables(VariableCategory::ExternalStateVariable) {
        let local = format!("{}_", v.name);
        if data.has_variable(VariableCategory::LocalVariable, &local) {
            w.line(&format!(
                "this->{} = this->{}+(this->theta)*(this->d{});",
                local, v.name, v.name
            ));
        }
    }
}

/// Writes the elastic prediction `se`, its equivalent stress `seq_e` and the flow direction `n`
///
/// The flow direction is zero when `seq_e` is below `threshold*young*epsilon`.
/// With the stress update algorithm, the elastic strain at the beginning of
/// the step is rebuilt from the stress.
pub fn write_elastic_predictor(ctx: &EmitContext, w: &mut SourceWriter, threshold: &str) -> Result<(), GenError> {
    let (young, _) = ctx.elastic_names()?;
    if ctx.data().attribute(ATTRIBUTE_STRESS_UPDATE_ALGORITHM) {
        w.declare(
            "const auto",
            "eel_bts",
            "(this->sig-(this->lambda)/(3*(this->lambda)+2*(this->mu))*trace(this->sig)*StrainStensor::Id())/(2*(this->mu))",
        )?;
        w.line("this->se=2*(this->mu)*(tfel::math::deviator(eel_bts+(this->theta)*(this->deto)));");
    } else {
        w.line("this->se=2*(this->mu)*(tfel::math::deviator(this->eel+(this->theta)*(this->deto)));");
    }
    w.line("this->seq_e = sigmaeq(this->se);");
    w.open(&format!(
        "if(this->seq_e>{}*(this->{})*std::numeric_limits<real>::epsilon())",
        threshold, young
    ));
    w.line("this->n = 3*(this->se)/(2*this->seq_e);");
    w.reopen(" else ");
    w.line("this->n = StrainStensor(strain(0));");
    w.close("");
    Ok(())
}

/// Writes the update of the stress from the elastic strain at the end of the step
pub fn write_final_stress(w: &mut SourceWriter) {
    w.line("this->sig = (this->lambda_tdt)*trace(this->eel)*StrainStensor::Id()+2*(this->mu_tdt)*(this->eel);");
}

/// Writes the elastic stiffness at the end of the step in `Dt`
pub fn write_elastic_stiffness(w: &mut SourceWriter) {
    w.line("tfel::material::computeElasticStiffness<N,NumericType>::exe(this->Dt,this->lambda_tdt,this->mu_tdt);");
}

/// Writes a method evaluating a flow rule
///
/// The flow rule sets its outputs and the method returns true, unless the
/// rule itself returns false.
pub fn write_flow_method(w: &mut SourceWriter, header: &str, code: &str) {
    w.open(header);
    w.line("using namespace std;");
    w.line("using namespace tfel::math;");
    w.line("using namespace tfel::material;");
    w.lines(code);
    if header.starts_with("bool ") {
        w.line("return true;");
    }
    w.close("");
    w.blank();
}

/// Writes the elastic prediction operator used when no prediction code is given
pub fn write_elastic_prediction_operator(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    w.open("if((smt==ELASTIC)||(smt==SECANTOPERATOR))");
    w.line("this->Dt = (this->lambda)*Stensor4::IxI()+2*(this->mu)*Stensor4::Id();");
    w.reopen(" else ");
    w.line(&format!(
        "tfel::raise(\"{}::computePredictionOperator: unimplemented feature\");",
        ctx.class_name()
    ));
    w.close("");
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{new_sample_description, BehaviourSymmetry, GeneratorConfig, ModellingHypothesis};
    use crate::base::{VariableCategory, VariableDescription};
    use crate::codegen::{LocalSolveStrategy, SourceWriter};

    fn write<F>(bd: &BehaviourDescription, f: F) -> String
    where
        F: Fn(&EmitContext, &mut SourceWriter) -> Result<(), GenError>,
    {
        let config = GeneratorConfig::new();
        let strategy = LocalSolveStrategy::IsotropicMisesCreep;
        let ctx = EmitContext {
            bd,
            hypothesis: ModellingHypothesis::Tridimensional,
            config: &config,
            strategy: &strategy,
        };
        let mut w = SourceWriter::new(ctx.data().registered_names().iter().cloned());
        f(&ctx, &mut w).unwrap();
        w.finish()
    }

    #[test]
    fn check_isotropic_elasticity_works() {
        let mut bd = new_sample_description("Norton");
        assert_eq!(check_isotropic_elasticity(&bd), Ok(()));
        bd.elastic_symmetry = BehaviourSymmetry::Orthotropic;
        assert_eq!(
            check_isotropic_elasticity(&bd).err(),
            Some(GenError::Runtime(
                "IsotropicBehaviourCodeGenerator::check: the elastic behaviour must be isotropic".to_string()
            ))
        );
        let bd = BehaviourDescription::new("Empty").unwrap();
        assert_eq!(
            check_isotropic_elasticity(&bd).err(),
            Some(GenError::InvalidElasticPropertiesCount(0))
        );
    }

    #[test]
    fn write_lame_coefficients_works() {
        let bd = new_sample_description("Norton");
        let code = write(&bd, write_lame_coefficients);
        assert!(code.contains("this->lambda=tfel::material::computeLambda(this->young,this->nu);"));
        assert!(code.contains("this->lambda_tdt = this->lambda;"));

        // Young's modulus depending on the temperature
        let h = ModellingHypothesis::Undefined;
        let mut bd = BehaviourDescription::new("Norton").unwrap();
        let e = VariableDescription::new("stress", "E").unwrap();
        let nu = VariableDescription::new("real", "nu").unwrap();
        let a = VariableDescription::new("real", "a").unwrap();
        bd.add_local_variable(h, e).unwrap();
        bd.add_material_property(h, nu).unwrap();
        bd.add_variable(h, VariableCategory::MaterialProperty, a).unwrap();
        bd.set_elastic_material_properties(&["E", "nu"]).unwrap();
        bd.set_elastic_material_property_formula("E", "2e11*(1-a*T)").unwrap();
        let code = write(&bd, write_lame_coefficients);
        assert!(code.contains("this->E = 2e11*(1-this->a*(this->T+(this->theta)*(this->dT)));"));
        assert!(code.contains("const auto E_tdt = 2e11*(1-this->a*(this->T+this->dT));"));
        assert!(code.contains("const auto nu_tdt = this->nu;"));
        assert!(code.contains("this->mu_tdt     = tfel::material::computeMu(E_tdt,nu_tdt);"));
    }

    #[test]
    fn write_elastic_predictor_works() {
        let mut bd = new_sample_description("Norton");
        let code = write(&bd, |ctx, w| write_elastic_predictor(ctx, w, CREEP_PREDICTION_THRESHOLD));
        assert!(code.contains("this->se=2*(this->mu)*(tfel::math::deviator(this->eel+(this->theta)*(this->deto)));"));
        assert!(code.contains("if(this->seq_e>real(0.01)*(this->young)*std::numeric_limits<real>::epsilon()){"));
        assert!(code.contains("  this->n = StrainStensor(strain(0));"));
        bd.set_attribute(ModellingHypothesis::Undefined, ATTRIBUTE_STRESS_UPDATE_ALGORITHM, true)
            .unwrap();
        let code = write(&bd, |ctx, w| write_elastic_predictor(ctx, w, PLASTIC_PREDICTION_THRESHOLD));
        assert!(code.starts_with("const auto eel_bts = (this->sig-(this->lambda)/(3*(this->lambda)+2*(this->mu))"));
        assert!(code.contains("deviator(eel_bts+(this->theta)*(this->deto))"));
        assert!(code.contains("if(this->seq_e>100*(this->young)"));
    }

    #[test]
    fn write_elastic_prediction_operator_works() {
        let bd = new_sample_description("Norton");
        let code = write(&bd, write_elastic_prediction_operator);
        assert_eq!(
            code,
            "if((smt==ELASTIC)||(smt==SECANTOPERATOR)){\n\
             \x20 this->Dt = (this->lambda)*Stensor4::IxI()+2*(this->mu)*Stensor4::Id();\n\
             } else {\n\
             \x20 tfel::raise(\"Norton::computePredictionOperator: unimplemented feature\");\n\
             }\n"
        );
    }
}
