use super::isotropic::{write_elastic_predictor, write_elastic_stiffness, write_final_stress, write_flow_method};
use super::isotropic::{CREEP_PREDICTION_THRESHOLD, PLASTIC_PREDICTION_THRESHOLD};
use super::{AssignOp, EmitContext, SourceWriter, Stmt};
use crate::base::{throw_runtime_error, CodeBlockSlot, GenError};

/// Defines the scalar flows integrated by a Newton algorithm on `dp`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ScalarFlow {
    Creep,
    Plastic,
    StrainHardeningCreep,
}

impl ScalarFlow {
    /// Returns the name of the generator, used in error messages
    fn generator(&self) -> &'static str {
        match self {
            ScalarFlow::Creep => "IsotropicMisesCreepCodeGenerator",
            ScalarFlow::Plastic => "IsotropicMisesPlasticFlowCodeGenerator",
            ScalarFlow::StrainHardeningCreep => "IsotropicStrainHardeningMisesCreepCodeGenerator",
        }
    }

    /// Returns the derivative of the equivalent stress with respect to dp (up to the sign)
    fn mu_3_theta(&self) -> &'static str {
        match self {
            ScalarFlow::StrainHardeningCreep => "(mu_3*(this->theta))",
            _ => "mu_3_theta",
        }
    }

    /// Returns the outputs of the flow rule that must be finite
    fn outputs(&self) -> &'static [&'static str] {
        match self {
            ScalarFlow::Creep => &["f", "df_dseq"],
            _ => &["f", "df_dp", "df_dseq"],
        }
    }

    fn threshold(&self) -> &'static str {
        match self {
            ScalarFlow::Plastic => PLASTIC_PREDICTION_THRESHOLD,
            _ => CREEP_PREDICTION_THRESHOLD,
        }
    }
}

/// Returns the statements used when the Newton correction can't be computed
///
/// On the first iteration, the behaviour is probably elastic: half the
/// elastic prediction is used as a first guess. Afterwards, the previous
/// correction is applied again.
fn fallback(ctx: &EmitContext, flow: ScalarFlow, message: &str) -> Vec<Stmt> {
    let mut first = Vec::new();
    first.extend(ctx.trace("NewtonIntegration", &format!("\"iteration \" << iter << \": {}\"", message)));
    first.push(Stmt::comment("probably an elastic prediction"));
    first.push(Stmt::set(
        "newton_ddp",
        &format!("(this->seq_e/{})/2", flow.mu_3_theta()),
    ));
    let mut stmts = vec![
        Stmt::if_then("iter==0u", first),
        Stmt::assign("this->dp", AssignOp::Add, "newton_ddp"),
    ];
    if flow != ScalarFlow::Creep {
        stmts.push(Stmt::set("this->p_", "this->p+(this->theta)*(this->dp)"));
    }
    stmts.push(Stmt::assign("iter", AssignOp::Add, "1"));
    stmts
}

/// Returns the residual and its derivative
fn residual(flow: ScalarFlow) -> Vec<Stmt> {
    match flow {
        ScalarFlow::Creep => vec![
            Stmt::set("newton_f", "this->dp-(this->f)*(this->dt)"),
            Stmt::set("newton_df", "1+mu_3_theta*(this->df_dseq)*(this->dt)"),
        ],
        ScalarFlow::StrainHardeningCreep => vec![
            Stmt::set("newton_f", "this->dp-(this->f)*(this->dt)"),
            Stmt::set(
                "newton_df",
                "1-(this->theta)*(this->dt)*((this->df_dp)-mu_3*(this->df_dseq))",
            ),
        ],
        ScalarFlow::Plastic => vec![
            Stmt::set("surf", "(this->f)/(this->young)"),
            Stmt::if_else(
                "((surf>newton_epsilon)&&((this->dp)>=strain(0)))||((this->dp)>newton_epsilon)",
                vec![
                    Stmt::set("newton_f", "surf"),
                    Stmt::set(
                        "newton_df",
                        "((this->theta)*(this->df_dp)-mu_3_theta*(this->df_dseq))/(this->young)",
                    ),
                ],
                vec![Stmt::set("newton_f", "this->dp"), Stmt::set("newton_df", "real(1)")],
            ),
        ],
    }
}

/// Writes the Newton algorithm solving for the equivalent strain increment `dp`
fn write_newton_integration(ctx: &EmitContext, w: &mut SourceWriter, flow: ScalarFlow) -> Result<(), GenError> {
    let method = "NewtonIntegration";
    w.open("bool NewtonIntegration()");
    w.declare(
        "constexpr auto",
        "newton_epsilon",
        "100*std::numeric_limits<NumericType>::epsilon()",
    )?;
    w.declare("bool", "converged", "false")?;
    w.declare("strain", "newton_f", "")?;
    w.declare("strain", "newton_df", "")?;
    w.declare("auto", "newton_ddp", "strain{}")?;
    match flow {
        ScalarFlow::StrainHardeningCreep => w.declare("const stress", "mu_3", "3*(this->mu)")?,
        _ => w.declare("const auto", "mu_3_theta", "3*(this->theta)*(this->mu)")?,
    }
    if flow == ScalarFlow::Plastic {
        w.declare("real", "surf", "")?;
    }
    w.declare("unsigned int", "iter", "0u")?;
    if flow != ScalarFlow::Creep {
        w.line("this->p_ = this->p+this->dp;");
    }
    let finite = flow
        .outputs()
        .iter()
        .map(|o| format!("(tfel::math::ieee754::isfinite(this->{}))", o))
        .collect::<Vec<_>>()
        .join("&&");
    let mut update = vec![
        Stmt::set("newton_ddp", "-newton_f/newton_df"),
        Stmt::assign("this->dp", AssignOp::Add, "newton_ddp"),
    ];
    if flow != ScalarFlow::Creep {
        update.push(Stmt::set("this->p_", "this->p+(this->theta)*(this->dp)"));
    }
    update.push(Stmt::assign("iter", AssignOp::Add, "1"));
    update.extend(ctx.trace(method, "\"iteration \" << iter << \": \" << tfel::math::abs(newton_f)"));
    update.push(Stmt::set("converged", "tfel::math::abs(newton_f)<(this->epsilon)"));
    let mut evaluation = residual(flow);
    evaluation.push(Stmt::if_else(
        "tfel::math::abs(newton_df)>newton_epsilon",
        update,
        fallback(ctx, flow, "invalid jacobian"),
    ));
    let body = vec![
        Stmt::set(
            "this->seq",
            &format!("std::max(this->seq_e-{}*(this->dp),stress(0))", flow.mu_3_theta()),
        ),
        Stmt::declare("const auto", "compute_flow_r", "this->computeFlow()"),
        Stmt::if_else(
            &format!("!((compute_flow_r)&&{})", finite),
            fallback(ctx, flow, "invalid evaluation of the flow rule"),
            evaluation,
        ),
    ];
    w.emit(&Stmt::while_loop("(converged==false)&&(iter<(this->iterMax))", body))?;
    let mut failure = Vec::new();
    failure.extend(ctx.trace(method, "\"no convergence after \" << iter << \" iterations\""));
    failure.push(Stmt::ret("false"));
    w.emit(&Stmt::if_then("!converged", failure))?;
    ctx.debug(w, method, "\"convergence after \" << iter << \" iterations\"")?;
    w.emit(&Stmt::ret("true"))?;
    w.close("");
    w.blank();
    Ok(())
}

/// Writes the flow rule and the Newton algorithm
fn write_members(ctx: &EmitContext, w: &mut SourceWriter, flow: ScalarFlow) -> Result<(), GenError> {
    let code = ctx.code(CodeBlockSlot::FlowRule).ok_or_else(|| {
        throw_runtime_error(
            &format!("{}::writeBehaviourParserSpecificMembers", flow.generator()),
            "no flow rule declared",
        )
    })?;
    write_flow_method(w, "bool computeFlow()", code);
    write_newton_integration(ctx, w, flow)
}

/// Writes the body of `integrate()`
fn write_integrator(ctx: &EmitContext, w: &mut SourceWriter, flow: ScalarFlow) -> Result<(), GenError> {
    if flow != ScalarFlow::Creep {
        write_elastic_predictor(ctx, w, flow.threshold())?;
    }
    w.open("if(!this->NewtonIntegration())");
    w.line("return FAILURE;");
    w.close("");
    w.open("if(smt!=NOSTIFFNESSREQUESTED)");
    w.open("if(!this->computeConsistentTangentOperator(smt))");
    w.line("return FAILURE;");
    w.close("");
    w.close("");
    w.line("this->deel = this->deto-(this->dp)*(this->n);");
    w.line("this->updateStateVariables();");
    write_final_stress(w);
    w.line("this->updateAuxiliaryStateVariables();");
    Ok(())
}

/// Writes the body of `computeConsistentTangentOperator()`
fn write_tangent_operator(ctx: &EmitContext, w: &mut SourceWriter, flow: ScalarFlow) -> Result<(), GenError> {
    let (young, _) = ctx.elastic_names()?;
    let (condition, correction) = match flow {
        ScalarFlow::Creep => (
            format!(
                "this->seq_e>real(0.01)*(this->{})*std::numeric_limits<real>::epsilon()",
                young
            ),
            "(1+3*(this->mu)*(this->theta)*(this->dt)*this->df_dseq)",
        ),
        ScalarFlow::StrainHardeningCreep => (
            format!(
                "this->seq_e>real(0.01)*(this->{})*std::numeric_limits<real>::epsilon()",
                young
            ),
            "(1+(this->theta)*(this->dt)*(3*(this->mu)*this->df_dseq-(this->df_dp)))",
        ),
        ScalarFlow::Plastic => (
            String::from("this->dp>prec"),
            "((this->theta)*(3*(this->mu)*(this->df_dseq)-(this->df_dp)))",
        ),
    };
    let numerator = match flow {
        ScalarFlow::Plastic => "this->df_dseq",
        _ => "this->df_dseq*(this->dt)",
    };
    if flow == ScalarFlow::Plastic {
        w.declare("constexpr real", "prec", "std::numeric_limits<real>::epsilon()/100")?;
    }
    w.open("if(smt==CONSISTENTTANGENTOPERATOR)");
    write_elastic_stiffness(w);
    w.open(&format!("if({})", condition));
    w.declare("constexpr auto", "M", "tfel::math::st2tost2<N,NumericType>::M()")?;
    w.declare("const auto", "ccto_tmp_1", "this->dp/this->seq_e")?;
    w.line(&format!(
        "this->Dt += -4*(this->mu_tdt)*(this->mu)*(this->theta)*(ccto_tmp_1*M-(ccto_tmp_1-{}/{})*((this->n)^(this->n)));",
        numerator, correction
    ));
    w.close("");
    w.reopen(" else if((smt==ELASTIC)||(smt==SECANTOPERATOR))");
    write_elastic_stiffness(w);
    w.reopen(" else ");
    w.line("return false;");
    w.close("");
    w.line("return true;");
    Ok(())
}

/// Writes the computation of the elastic prediction at the end of `initialize()`
pub fn write_creep_initialize(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    write_elastic_predictor(ctx, w, CREEP_PREDICTION_THRESHOLD)
}

pub fn write_creep_members(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    write_members(ctx, w, ScalarFlow::Creep)
}

pub fn write_creep_integrator(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    write_integrator(ctx, w, ScalarFlow::Creep)
}

pub fn write_creep_tangent_operator(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    write_tangent_operator(ctx, w, ScalarFlow::Creep)
}

pub fn write_plastic_members(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    write_members(ctx, w, ScalarFlow::Plastic)
}

pub fn write_plastic_integrator(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    write_integrator(ctx, w, ScalarFlow::Plastic)
}

pub fn write_plastic_tangent_operator(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    write_tangent_operator(ctx, w, ScalarFlow::Plastic)
}

pub fn write_strain_hardening_creep_members(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    write_members(ctx, w, ScalarFlow::StrainHardeningCreep)
}

pub fn write_strain_hardening_creep_integrator(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    write_integrator(ctx, w, ScalarFlow::StrainHardeningCreep)
}

pub fn write_strain_hardening_creep_tangent_operator(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    write_tangent_operator(ctx, w, ScalarFlow::StrainHardeningCreep)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{count_occurrences, new_sample_description, BehaviourDescription, CodeBlock};
    use crate::base::{GeneratorConfig, Mode, ModellingHypothesis, Position};
    use crate::codegen::{Emitter, LocalSolveStrategy};

    fn sample() -> BehaviourDescription {
        let mut bd = new_sample_description("Norton");
        let block = CodeBlock::new("this->f = this->A*pow(this->seq,this->E);");
        bd.set_code(
            ModellingHypothesis::Undefined,
            CodeBlockSlot::FlowRule,
            block,
            Mode::Create,
            Position::AtEnd,
        )
        .unwrap();
        bd
    }

    fn write(bd: &BehaviourDescription, debug_mode: bool, emitter: Emitter) -> Result<String, GenError> {
        let mut config = GeneratorConfig::new();
        config.set_debug_mode(debug_mode).unwrap();
        let strategy = LocalSolveStrategy::IsotropicMisesCreep;
        let ctx = EmitContext {
            bd,
            hypothesis: ModellingHypothesis::Tridimensional,
            config: &config,
            strategy: &strategy,
        };
        let mut w = SourceWriter::new(ctx.data().registered_names().iter().cloned());
        emitter(&ctx, &mut w)?;
        Ok(w.finish())
    }

    #[test]
    fn creep_newton_integration_works() {
        let code = write(&sample(), false, write_creep_members).unwrap();
        assert!(code.starts_with("bool computeFlow(){\n"));
        assert!(code.contains("  this->f = this->A*pow(this->seq,this->E);\n  return true;\n}\n"));
        assert!(code.contains("while((converged==false)&&(iter<(this->iterMax))){"));
        assert!(code.contains("this->seq = std::max(this->seq_e-mu_3_theta*(this->dp),stress(0));"));
        assert!(code.contains(
            "if(!((compute_flow_r)&&(tfel::math::ieee754::isfinite(this->f))&&(tfel::math::ieee754::isfinite(this->df_dseq)))){"
        ));
        // first iteration fallback on both failure paths
        assert_eq!(count_occurrences(&code, "newton_ddp = (this->seq_e/mu_3_theta)/2;"), 2);
        assert!(code.contains("newton_df = 1+mu_3_theta*(this->df_dseq)*(this->dt);"));
        assert!(code.contains("if(!converged){\n    return false;\n  }\n  return true;"));
        assert!(!code.contains("this->p_"));
        assert!(!code.contains("std::cout"));
        let code = write(&sample(), true, write_creep_members).unwrap();
        assert!(code.contains("std::cout << \"Norton::NewtonIntegration: \" << \"no convergence after \" << iter"));
    }

    #[test]
    fn plastic_newton_integration_works() {
        let code = write(&sample(), false, write_plastic_members).unwrap();
        assert!(code.contains("real surf;"));
        assert!(code.contains("this->p_ = this->p+this->dp;"));
        assert!(code.contains("(tfel::math::ieee754::isfinite(this->df_dp))"));
        assert!(code.contains("if(((surf>newton_epsilon)&&((this->dp)>=strain(0)))||((this->dp)>newton_epsilon)){"));
        assert!(code.contains("newton_df = real(1);"));
        assert_eq!(count_occurrences(&code, "this->p_ = this->p+(this->theta)*(this->dp);"), 3);
    }

    #[test]
    fn strain_hardening_creep_newton_integration_works() {
        let code = write(&sample(), false, write_strain_hardening_creep_members).unwrap();
        assert!(code.contains("const stress mu_3 = 3*(this->mu);"));
        assert!(code.contains("this->seq = std::max(this->seq_e-(mu_3*(this->theta))*(this->dp),stress(0));"));
        assert!(code.contains("newton_df = 1-(this->theta)*(this->dt)*((this->df_dp)-mu_3*(this->df_dseq));"));
    }

    #[test]
    fn members_capture_errors() {
        let bd = new_sample_description("Norton");
        assert_eq!(
            write(&bd, false, write_creep_members).err(),
            Some(GenError::Runtime(
                "IsotropicMisesCreepCodeGenerator::writeBehaviourParserSpecificMembers: no flow rule declared"
                    .to_string()
            ))
        );
    }

    #[test]
    fn integrators_work() {
        let creep = write(&sample(), false, write_creep_integrator).unwrap();
        assert!(creep.starts_with("if(!this->NewtonIntegration()){\n  return FAILURE;\n}\n"));
        assert!(creep.contains("this->deel = this->deto-(this->dp)*(this->n);"));
        let plastic = write(&sample(), false, write_plastic_integrator).unwrap();
        assert!(plastic.starts_with("this->se=2*(this->mu)"));
        assert!(plastic.contains("if(this->seq_e>100*(this->young)"));
        let sh = write(&sample(), false, write_strain_hardening_creep_integrator).unwrap();
        assert!(sh.contains("if(this->seq_e>real(0.01)*(this->young)"));
    }

    #[test]
    fn tangent_operators_work() {
        let creep = write(&sample(), false, write_creep_tangent_operator).unwrap();
        assert!(creep.contains(
            "this->Dt += -4*(this->mu_tdt)*(this->mu)*(this->theta)*(ccto_tmp_1*M-(ccto_tmp_1-this->df_dseq*(this->dt)/(1+3*(this->mu)*(this->theta)*(this->dt)*this->df_dseq))*((this->n)^(this->n)));"
        ));
        assert!(creep.contains("} else if((smt==ELASTIC)||(smt==SECANTOPERATOR)){"));
        assert!(creep.ends_with("} else {\n  return false;\n}\nreturn true;\n"));
        let plastic = write(&sample(), false, write_plastic_tangent_operator).unwrap();
        assert!(plastic.starts_with("constexpr real prec = std::numeric_limits<real>::epsilon()/100;"));
        assert!(plastic.contains("if(this->dp>prec){"));
        assert!(plastic.contains("(ccto_tmp_1-this->df_dseq/((this->theta)*(3*(this->mu)*(this->df_dseq)-(this->df_dp))))"));
        let sh = write(&sample(), false, write_strain_hardening_creep_tangent_operator).unwrap();
        assert!(sh.contains("(1+(this->theta)*(this->dt)*(3*(this->mu)*this->df_dseq-(this->df_dp)))"));
    }
}
