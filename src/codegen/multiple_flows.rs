use super::isotropic::{write_elastic_predictor, write_final_stress, write_flow_method, PLASTIC_PREDICTION_THRESHOLD};
use super::{EmitContext, FlowDescription, FlowKind, LocalSolveStrategy, SourceWriter, Stmt};
use crate::base::{throw_runtime_error, GenError, ATTRIBUTE_STRESS_UPDATE_ALGORITHM};

/// Returns the flows of the strategy
fn flows<'a>(ctx: &EmitContext<'a>) -> Result<&'a [FlowDescription], GenError> {
    match ctx.strategy {
        LocalSolveStrategy::MultipleIsotropicMisesFlows(flows) if !flows.is_empty() => Ok(flows.as_slice()),
        _ => Err(throw_runtime_error(
            "MultipleIsotropicMisesFlowsCodeGenerator::writeBehaviourParserSpecificMembers",
            "no flow rule defined",
        )),
    }
}

/// Returns the implicit parameter of a flow
fn theta(flow: &FlowDescription) -> String {
    match flow.theta {
        Some(t) => format!("real({})", t),
        None => String::from("(this->theta)"),
    }
}

/// Returns the name of `3*mu*theta` for a flow
fn mu_3_theta(flow: &FlowDescription, i: usize) -> String {
    match flow.theta {
        Some(_) => format!("mu_3_theta{}", i),
        None => String::from("mu_3_theta"),
    }
}

/// Returns the header of the method evaluating the flow `i`
fn flow_method_header(kind: FlowKind, i: usize) -> String {
    match kind {
        FlowKind::PlasticFlow => format!("void computeFlow{}(stress& f, real& df_dseq, stress& df_dp)", i),
        FlowKind::CreepFlow => format!("void computeFlow{}(DstrainDt& f, DF_DSEQ_TYPE& df_dseq)", i),
        FlowKind::StrainHardeningCreepFlow => format!(
            "void computeFlow{}(DstrainDt& f, DF_DSEQ_TYPE& df_dseq, DstrainDt& df_dp)",
            i
        ),
    }
}

/// Returns the row `i` of the residual and of the jacobian
fn newton_row(flows: &[FlowDescription], i: usize) -> Vec<Stmt> {
    let flow = &flows[i];
    let k = flows.len();
    let m3t = mu_3_theta(flow, i);
    let off_diagonal = |value: &str| -> Vec<Stmt> {
        (0..k)
            .filter(|j| *j != i)
            .map(|j| Stmt::set(&format!("newton_df({},{})", i, j), value))
            .collect()
    };
    let mut row = Vec::new();
    match flow.kind {
        FlowKind::PlasticFlow => {
            row.push(Stmt::raw(&format!(
                "this->computeFlow{i}(this->f{i},this->df_dseq{i},this->df_dp{i});",
                i = i
            )));
            row.push(Stmt::declare("const auto", &format!("surf{}", i), &format!("(this->f{})/(this->young)", i)));
            let mut active = vec![
                Stmt::set(&format!("newton_f({})", i), &format!("surf{}", i)),
                Stmt::set(
                    &format!("newton_df({},{})", i, i),
                    &format!(
                        "({}*(this->df_dp{})-{}*(this->df_dseq{}))/(this->young)",
                        theta(flow),
                        i,
                        m3t,
                        i
                    ),
                ),
            ];
            active.extend(off_diagonal(&format!("-{}*(this->df_dseq{})/(this->young)", m3t, i)));
            let mut inactive = vec![
                Stmt::set(&format!("newton_f({})", i), &format!("vdp({})", i)),
                Stmt::set(&format!("newton_df({},{})", i, i), "real(1)"),
            ];
            inactive.extend(off_diagonal("real(0)"));
            row.push(Stmt::if_else(
                &format!(
                    "((surf{i}>newton_epsilon)&&(vdp({i})>=real(0)))||(vdp({i})>newton_epsilon)",
                    i = i
                ),
                active,
                inactive,
            ));
        }
        FlowKind::CreepFlow => {
            row.push(Stmt::raw(&format!("this->computeFlow{i}(this->f{i},this->df_dseq{i});", i = i)));
            row.push(Stmt::set(
                &format!("newton_f({})", i),
                &format!("vdp({})-(this->f{})*(this->dt)", i, i),
            ));
            row.push(Stmt::set(
                &format!("newton_df({},{})", i, i),
                &format!("1+{}*(this->df_dseq{})*(this->dt)", m3t, i),
            ));
            row.extend(off_diagonal(&format!("{}*(this->df_dseq{})*(this->dt)", m3t, i)));
        }
        FlowKind::StrainHardeningCreepFlow => {
            row.push(Stmt::raw(&format!(
                "this->computeFlow{i}(this->f{i},this->df_dseq{i},this->df_dp{i});",
                i = i
            )));
            row.push(Stmt::set(
                &format!("newton_f({})", i),
                &format!("vdp({})-(this->f{})*(this->dt)", i, i),
            ));
            row.push(Stmt::set(
                &format!("newton_df({},{})", i, i),
                &format!(
                    "1-(this->dt)*({}*(this->df_dp{})-{}*(this->df_dseq{}))",
                    theta(flow),
                    i,
                    m3t,
                    i
                ),
            ));
            row.extend(off_diagonal(&format!("{}*(this->df_dseq{})*(this->dt)", m3t, i)));
        }
    }
    row
}

/// Writes the flow rules and the Newton algorithm over the increments of all flows
///
/// When the jacobian can't be inverted, the increments are halved and the
/// iteration counter is still incremented.
pub fn write_members(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    let flows = flows(ctx)?;
    let k = flows.len();
    for (i, flow) in flows.iter().enumerate() {
        write_flow_method(w, &flow_method_header(flow.kind, i), &flow.code);
    }
    let method = "NewtonIntegration";
    w.open("bool NewtonIntegration()");
    if flows.iter().any(|f| f.kind == FlowKind::PlasticFlow) {
        w.declare(
            "constexpr auto",
            "newton_epsilon",
            "100*std::numeric_limits<NumericType>::epsilon()",
        )?;
    }
    w.declare(&format!("tfel::math::tvector<{},NumericType>", k), "vdp", "")?;
    w.line("vdp = NumericType(0);");
    w.declare(&format!("tfel::math::tvector<{},NumericType>", k), "newton_f", "")?;
    w.declare(&format!("tfel::math::tmatrix<{},{},NumericType>", k, k), "newton_df", "")?;
    for (i, flow) in flows.iter().enumerate() {
        if let Some(t) = flow.theta {
            w.declare("const stress", &format!("mu_3_theta{}", i), &format!("3*(real({}))*(this->mu)", t))?;
        }
    }
    if flows.iter().any(|f| f.theta.is_none()) {
        w.declare("const stress", "mu_3_theta", "3*(this->theta)*(this->mu)")?;
    }
    w.declare("unsigned int", "iter", "0u")?;
    w.declare("bool", "converged", "false")?;
    let sum = (0..k).map(|j| format!("vdp({})", j)).collect::<Vec<_>>().join("+");
    let mut body = Vec::new();
    for (i, flow) in flows.iter().enumerate() {
        let seq_e = match flow.theta {
            Some(_) => format!("this->seq_e{}", i),
            None => String::from("this->seq_e"),
        };
        body.push(Stmt::set(
            "this->p_",
            &format!("this->p{}+{}*strain(vdp({}))", i, theta(flow), i),
        ));
        body.push(Stmt::set(
            "this->seq",
            &format!("std::max({}-{}*({}),stress(0))", seq_e, mu_3_theta(flow, i), sum),
        ));
        body.extend(newton_row(flows, i));
    }
    body.push(Stmt::declare("auto", "error", "NumericType(0)"));
    for i in 0..k {
        body.push(Stmt::raw(&format!("error += tfel::math::abs(newton_f({}));", i)));
    }
    body.push(Stmt::declare(
        "const auto",
        "jacobian_inversion_succeeded",
        &format!(
            "tfel::math::TinyMatrixSolve<{},NumericType,false>::exe(newton_df,newton_f)",
            k
        ),
    ));
    body.push(Stmt::if_else(
        "jacobian_inversion_succeeded",
        vec![Stmt::raw("vdp -= newton_f;")],
        vec![Stmt::raw("vdp /= 2;")],
    ));
    body.push(Stmt::raw("iter+=1;"));
    body.extend(ctx.trace(method, &format!("\"iteration \" << iter << \": \" << (error/(real({})))", k)));
    body.push(Stmt::set("converged", &format!("(error/(real({})))<(this->epsilon)", k)));
    w.emit(&Stmt::while_loop("(converged==false)&&(iter<(this->iterMax))", body))?;
    let mut failure = Vec::new();
    failure.extend(ctx.trace(method, "\"no convergence after \" << iter << \" iterations\""));
    failure.push(Stmt::ret("false"));
    w.emit(&Stmt::if_then("!converged", failure))?;
    for i in 0..k {
        w.line(&format!("this->dp{} = vdp({});", i, i));
    }
    ctx.debug(w, method, "\"convergence after \" << iter << \" iterations\"")?;
    w.emit(&Stmt::ret("true"))?;
    w.close("");
    w.blank();
    Ok(())
}

/// Writes the body of `integrate()`
pub fn write_integrator(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    let flows = flows(ctx)?;
    write_elastic_predictor(ctx, w, PLASTIC_PREDICTION_THRESHOLD)?;
    let stress_update = ctx.data().attribute(ATTRIBUTE_STRESS_UPDATE_ALGORITHM);
    for (i, flow) in flows.iter().enumerate() {
        if let Some(t) = flow.theta {
            let eel = if stress_update { "eel_bts" } else { "this->eel" };
            w.declare(
                "const StressStensor",
                &format!("se{}", i),
                &format!("2*(this->mu)*(tfel::math::deviator({}+(real({}))*(this->deto)))", eel, t),
            )?;
            w.line(&format!("this->seq_e{} = sigmaeq(se{});", i, i));
        }
    }
    w.open("if(!this->NewtonIntegration())");
    w.line("return FAILURE;");
    w.close("");
    let sum = (0..flows.len())
        .map(|i| format!("this->dp{}", i))
        .collect::<Vec<_>>()
        .join("+");
    w.line(&format!("this->dp = {};", sum));
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
///
/// Only the elastic and secant operators are available.
pub fn write_tangent_operator(_: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    w.open("if((smt==ELASTIC)||(smt==SECANTOPERATOR))");
    w.line("tfel::material::computeElasticStiffness<N,NumericType>::exe(this->Dt,this->lambda,this->mu);");
    w.line("return true;");
    w.close("");
    w.line("return false;");
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{count_occurrences, new_sample_description, GeneratorConfig, ModellingHypothesis};

    fn write(strategy: &LocalSolveStrategy, emitter: crate::codegen::Emitter) -> Result<String, GenError> {
        let bd = new_sample_description("TwoFlows");
        let config = GeneratorConfig::new();
        let ctx = EmitContext {
            bd: &bd,
            hypothesis: ModellingHypothesis::Tridimensional,
            config: &config,
            strategy,
        };
        let mut w = SourceWriter::new(ctx.data().registered_names().iter().cloned());
        emitter(&ctx, &mut w)?;
        Ok(w.finish())
    }

    fn two_flows(theta: Option<f64>) -> LocalSolveStrategy {
        LocalSolveStrategy::MultipleIsotropicMisesFlows(vec![
            FlowDescription {
                kind: FlowKind::PlasticFlow,
                code: String::from("f = seq-R0;\ndf_dseq = 1;\ndf_dp = 0;"),
                theta: None,
            },
            FlowDescription {
                kind: FlowKind::CreepFlow,
                code: String::from("f = A*pow(seq,E);\ndf_dseq = E*f/seq;"),
                theta,
            },
        ])
    }

    #[test]
    fn write_members_works() {
        let code = write(&two_flows(None), write_members).unwrap();
        assert!(code.starts_with("void computeFlow0(stress& f, real& df_dseq, stress& df_dp){"));
        assert!(code.contains("void computeFlow1(DstrainDt& f, DF_DSEQ_TYPE& df_dseq){"));
        assert!(code.contains("tfel::math::tmatrix<2,2,NumericType> newton_df;"));
        assert!(code.contains("this->seq = std::max(this->seq_e-mu_3_theta*(vdp(0)+vdp(1)),stress(0));"));
        assert!(code.contains("newton_df(0,1) = -mu_3_theta*(this->df_dseq0)/(this->young);"));
        assert!(code.contains("newton_df(0,1) = real(0);"));
        assert!(code.contains("newton_df(1,1) = 1+mu_3_theta*(this->df_dseq1)*(this->dt);"));
        assert!(code.contains("newton_df(1,0) = mu_3_theta*(this->df_dseq1)*(this->dt);"));
        assert!(code.contains("if(jacobian_inversion_succeeded){\n      vdp -= newton_f;\n    } else {\n      vdp /= 2;\n    }"));
        assert!(code.contains("converged = (error/(real(2)))<(this->epsilon);"));
        assert!(code.contains("this->dp1 = vdp(1);"));
        assert_eq!(count_occurrences(&code, "error += tfel::math::abs"), 2);
    }

    #[test]
    fn specific_theta_works() {
        let code = write(&two_flows(Some(1.0)), write_members).unwrap();
        assert!(code.contains("const stress mu_3_theta1 = 3*(real(1))*(this->mu);"));
        assert!(code.contains("this->p_ = this->p1+real(1)*strain(vdp(1));"));
        assert!(code.contains("this->seq = std::max(this->seq_e1-mu_3_theta1*(vdp(0)+vdp(1)),stress(0));"));
        let code = write(&two_flows(Some(1.0)), write_integrator).unwrap();
        assert!(code.contains("const StressStensor se1 = 2*(this->mu)*(tfel::math::deviator(this->eel+(real(1))*(this->deto)));"));
        assert!(code.contains("this->dp = this->dp0+this->dp1;"));
    }

    #[test]
    fn write_members_captures_errors() {
        let strategy = LocalSolveStrategy::MultipleIsotropicMisesFlows(Vec::new());
        assert_eq!(
            write(&strategy, write_members).err(),
            Some(GenError::Runtime(
                "MultipleIsotropicMisesFlowsCodeGenerator::writeBehaviourParserSpecificMembers: no flow rule defined"
                    .to_string()
            ))
        );
    }

    #[test]
    fn write_tangent_operator_works() {
        let code = write(&two_flows(None), write_tangent_operator).unwrap();
        assert!(code.ends_with("  return true;\n}\nreturn false;\n"));
    }
}
