use super::{EmitContext, ImplicitScheme, ImplicitSystem, LocalSolveStrategy, NonLinearSystemSolver, SourceWriter, Stmt};
use super::{real_literal, StaggeredAcceleration, StaggeredPorosityScheme};
use crate::base::{throw_runtime_error, CodeBlockSlot, GenError, TypeFlag, ATTRIBUTE_COMPARE_TO_NUMERICAL_JACOBIAN};

/// Returns the scheme of the strategy
fn scheme<'a>(ctx: &EmitContext<'a>) -> Result<&'a ImplicitScheme, GenError> {
    match ctx.strategy {
        LocalSolveStrategy::Implicit(scheme) => Ok(scheme),
        _ => Err(throw_runtime_error(
            "ImplicitCodeGenerator::writeBehaviourParserSpecificMembers",
            "the local solve strategy is not implicit",
        )),
    }
}

/// Indicates that the analytical jacobian is compared to a numerical one at each iteration
fn compares_jacobians(ctx: &EmitContext, scheme: &ImplicitScheme) -> bool {
    !scheme.solver.requires_numerical_jacobian() && ctx.data().attribute(ATTRIBUTE_COMPARE_TO_NUMERICAL_JACOBIAN)
}

/// Returns the layout of the unknowns of the class being written
fn system(ctx: &EmitContext) -> Result<ImplicitSystem, GenError> {
    ImplicitSystem::new(ctx.data())
}

/// Writes `updateIntegrationVariables()` copying the increments out of `zeros`
fn write_update_integration_variables(system: &ImplicitSystem, w: &mut SourceWriter) -> Result<(), GenError> {
    w.open("void updateIntegrationVariables()");
    for v in system.unknowns() {
        w.line(&format!("this->d{} = {};", v.name, system.vector_map(&v.name, "this->zeros")?));
    }
    w.close("");
    w.blank();
    Ok(())
}

/// Writes `computeFdF()` evaluating the residual and, if analytical, the jacobian
fn write_compute_fdf(
    ctx: &EmitContext,
    system: &ImplicitSystem,
    scheme: &ImplicitScheme,
    w: &mut SourceWriter,
) -> Result<(), GenError> {
    w.open("bool computeFdF(const bool perturbatedSystemEvaluation)");
    w.line("using namespace std;");
    w.line("using namespace tfel::math;");
    w.line("using namespace tfel::material;");
    w.line("static_cast<void>(perturbatedSystemEvaluation);");
    w.line("this->updateIntegrationVariables();");
    if ctx.code(CodeBlockSlot::ComputeStress).is_some() {
        w.line("this->computeThermodynamicForces();");
    }
    for v in system.unknowns() {
        let name = format!("f{}", v.name);
        w.register(&name)?;
        w.line(&system.vector_view(&v.name, "f", "this->fzeros")?);
    }
    if !scheme.solver.requires_numerical_jacobian() {
        for a in system.unknowns() {
            for b in system.unknowns() {
                w.register(&super::derivative_name(&a.name, &b.name))?;
                w.lines(&system.derivative_view(&a.name, &b.name, "this->jacobian")?);
            }
        }
        w.line("// the jacobian is initialised to identity");
        w.line("std::fill(this->jacobian.begin(),this->jacobian.end(),NumericType(0));");
        w.emit(&Stmt::for_loop(
            "idx",
            &system.size().to_string(),
            vec![Stmt::set("this->jacobian(idx,idx)", "NumericType(1)")],
        ))?;
    }
    w.line("// residuals are initialised to the increments");
    w.line("this->fzeros = this->zeros;");
    if let Some(code) = ctx.code(CodeBlockSlot::Integrator) {
        w.lines(code);
    }
    let analytical = !scheme.solver.requires_numerical_jacobian();
    let mut guard: Option<&str> = None;
    for term in &scheme.terms {
        if term.guard.as_deref() != guard {
            if let Some(previous) = guard {
                w.close(&format!(" // end of if({})", previous));
            }
            guard = term.guard.as_deref();
            if let Some(condition) = guard {
                w.open(&format!("if({})", condition));
            }
        }
        w.lines(&term.code);
        if analytical {
            for code in term.jacobian.values().filter(|c| !c.is_empty()) {
                w.lines(code);
            }
        }
    }
    if let Some(previous) = guard {
        w.close(&format!(" // end of if({})", previous));
    }
    w.line("return true;");
    w.close("");
    w.blank();
    Ok(())
}

/// Writes `computeNumericalJacobian()` using central differences
fn write_compute_numerical_jacobian(system: &ImplicitSystem, w: &mut SourceWriter) {
    let n = system.size().to_string();
    w.open(&format!(
        "void computeNumericalJacobian(tfel::math::tmatrix<{n},{n},NumericType>& njacobian)",
        n = n
    ));
    w.line(&format!("tfel::math::tvector<{},NumericType> tzeros(this->zeros);", n));
    w.line(&format!("tfel::math::tvector<{},NumericType> tfzeros(this->fzeros);", n));
    w.line(&format!("tfel::math::tmatrix<{n},{n},NumericType> tjacobian(this->jacobian);", n = n));
    w.open(&format!("for(ushort idx = 0; idx!= {}; ++idx)", n));
    w.line("this->zeros(idx) -= this->numerical_jacobian_epsilon;");
    w.line("this->computeFdF(true);");
    w.line("this->zeros = tzeros;");
    w.line(&format!("tfel::math::tvector<{},NumericType> tfzeros2(this->fzeros);", n));
    w.line("this->zeros(idx) += this->numerical_jacobian_epsilon;");
    w.line("this->computeFdF(true);");
    w.line("this->fzeros = (this->fzeros-tfzeros2)/(2*(this->numerical_jacobian_epsilon));");
    w.open(&format!("for(ushort idx2 = 0; idx2!= {}; ++idx2)", n));
    w.line("njacobian(idx2,idx) = this->fzeros(idx2);");
    w.close("");
    w.line("this->zeros    = tzeros;");
    w.line("this->fzeros = tfzeros;");
    w.close("");
    w.open("if(&njacobian!=&(this->jacobian))");
    w.line("this->jacobian = tjacobian;");
    w.close("");
    w.close("");
    w.blank();
}

/// Writes `solveNonLinearSystem()`, a Newton-Raphson loop over `zeros`
///
/// A failed evaluation of the residual at the first iteration is fatal;
/// afterwards the last correction is halved.
fn write_solve_non_linear_system(
    ctx: &EmitContext,
    system: &ImplicitSystem,
    scheme: &ImplicitScheme,
    w: &mut SourceWriter,
) -> Result<(), GenError> {
    let method = "solveNonLinearSystem";
    let n = system.size().to_string();
    w.open("bool solveNonLinearSystem()");
    w.declare("unsigned int", "iter", "0u")?;
    w.declare("bool", "converged", "false")?;
    w.line("this->zeros_1 = this->zeros;");
    w.open("while((converged==false)&&(iter!=this->iterMax))");
    w.line("++iter;");
    w.line("const auto computeFdF_ok = this->computeFdF(false);");
    w.open("if(!computeFdF_ok)");
    w.open("if(iter==1)");
    ctx.debug(w, method, "\"computeFdF returned false on first iteration, abording...\"")?;
    w.line("return false;");
    w.close("");
    ctx.debug(w, method, "\"computeFdF returned false, dividing increment by two...\"")?;
    w.line("this->zeros -= (this->zeros-this->zeros_1)*real(0.5);");
    w.line("continue;");
    w.close("");
    if let NonLinearSystemSolver::NewtonRaphsonNumericalJacobian { jacobian_update_period } = scheme.solver {
        match jacobian_update_period {
            Some(period) if period > 1 => {
                w.open(&format!("if(((iter-1)%{})==0)", period));
                w.line("this->computeNumericalJacobian(this->jacobian);");
                w.close("");
            }
            _ => w.line("this->computeNumericalJacobian(this->jacobian);"),
        }
    }
    if compares_jacobians(ctx, scheme) {
        w.line(&format!("tfel::math::tmatrix<{n},{n},NumericType> njacobian;", n = n));
        w.line("this->computeNumericalJacobian(njacobian);");
        w.open(&format!("for(ushort idx = 0; idx != {}; ++idx)", n));
        w.open(&format!("for(ushort idx2 = 0; idx2 != {}; ++idx2)", n));
        w.open("if(std::abs(this->jacobian(idx,idx2)-njacobian(idx,idx2))>this->jacobianComparisonCriterion)");
        w.line(
            "std::cout << \"jacobian(\" << idx << \",\" << idx2 << \") = \" << this->jacobian(idx,idx2) \
             << \" vs \" << njacobian(idx,idx2) << std::endl;",
        );
        w.close("");
        w.close("");
        w.close("");
    }
    w.line("const auto error = tfel::math::norm(this->fzeros);");
    w.line(&format!("converged = error/(real({}))<this->epsilon;", n));
    if let Some(code) = ctx.code(CodeBlockSlot::AdditionalConvergenceChecks) {
        w.lines(code);
    }
    ctx.debug(w, method, "\"iteration \" << iter << \" : \" << error")?;
    w.open("if(!converged)");
    w.open("try");
    w.line(&format!(
        "tfel::math::TinyMatrixSolve<{},NumericType>::exe(this->jacobian,this->fzeros);",
        n
    ));
    w.reopen(" catch(tfel::math::LUException&)");
    ctx.debug(w, method, "\"singular jacobian\"")?;
    w.line("return false;");
    w.close("");
    w.line("this->zeros_1 = this->zeros;");
    w.line("this->zeros -= this->fzeros;");
    w.close("");
    w.close("");
    w.line("return converged;");
    w.close("");
    w.blank();
    Ok(())
}

/// Writes `getPartialJacobianInvert()` giving the derivative of the first
/// unknown with respect to the total strain increment
///
/// Only emitted when the first unknown is a symmetric tensor, which is the
/// case of the elastic strain.
fn write_partial_jacobian_invert(
    system: &ImplicitSystem,
    scheme: &ImplicitScheme,
    w: &mut SourceWriter,
) -> Result<(), GenError> {
    let first = match system.unknowns().next() {
        Some(v) => v,
        None => return Ok(()),
    };
    if first.array_size != 1 || first.type_flag() != TypeFlag::Stensor {
        return Ok(());
    }
    let n = system.size().to_string();
    w.open(&format!("bool getPartialJacobianInvert(Stensor4& partial_jacobian_{})", first.name));
    w.line(&format!("tfel::math::TinyPermutation<{}> jacobian_permutation;", n));
    w.open("if(!this->computeFdF(true))");
    w.line("return false;");
    w.close("");
    if scheme.solver.requires_numerical_jacobian() {
        w.line("this->computeNumericalJacobian(this->jacobian);");
    }
    w.open("try");
    w.line("tfel::math::LUDecomp<false>::exe(this->jacobian,jacobian_permutation);");
    w.reopen(" catch(tfel::math::LUException&)");
    w.line("return false;");
    w.close("");
    w.open("for(ushort idx = 0; idx != StensorSize; ++idx)");
    w.line(&format!("tfel::math::tvector<{},NumericType> vect_e(NumericType(0));", n));
    w.line("vect_e(idx) = NumericType(1);");
    w.line(&format!(
        "tfel::math::TinyMatrixSolve<{},NumericType,false>::back_substitute(this->jacobian,jacobian_permutation,vect_e);",
        n
    ));
    w.open("for(ushort idx2 = 0; idx2 != StensorSize; ++idx2)");
    w.line(&format!("partial_jacobian_{}(idx2,idx) = vect_e(idx2);", first.name));
    w.close("");
    w.close("");
    w.line("return true;");
    w.close("");
    w.blank();
    Ok(())
}

/// Writes the members of the implicit scheme
pub fn write_members(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    let scheme = scheme(ctx)?;
    let system = system(ctx)?;
    let n = system.size().to_string();
    w.line(&format!("tfel::math::tvector<{},NumericType> zeros = tfel::math::tvector<{},NumericType>(NumericType(0));", n, n));
    w.line(&format!("tfel::math::tvector<{},NumericType> zeros_1 = tfel::math::tvector<{},NumericType>(NumericType(0));", n, n));
    w.line(&format!("tfel::math::tvector<{},NumericType> fzeros;", n));
    w.line(&format!("tfel::math::tmatrix<{n},{n},NumericType> jacobian;", n = n));
    if scheme.staggered.is_some() {
        w.line("bool computeStandardSystemOfImplicitEquations = true;");
        w.line("real current_estimate_of_the_porosity_increment = real(0);");
    }
    w.blank();
    if let Some(code) = ctx.code(CodeBlockSlot::ComputeStress) {
        w.open("void computeThermodynamicForces()");
        w.line("using namespace std;");
        w.line("using namespace tfel::math;");
        w.lines(code);
        w.close("");
        w.blank();
    }
    if let Some(code) = ctx.code(CodeBlockSlot::ComputeFinalStress) {
        w.open("void computeFinalThermodynamicForces()");
        w.line("using namespace std;");
        w.line("using namespace tfel::math;");
        w.lines(code);
        w.close("");
        w.blank();
    }
    write_update_integration_variables(&system, w)?;
    write_compute_fdf(ctx, &system, scheme, w)?;
    if scheme.solver.requires_numerical_jacobian() || compares_jacobians(ctx, scheme) {
        write_compute_numerical_jacobian(&system, w);
    }
    write_solve_non_linear_system(ctx, &system, scheme, w)?;
    write_partial_jacobian_invert(&system, scheme, w)?;
    Ok(())
}

/// Writes the fixed-point iterations on the porosity increment
///
/// Each iteration solves the system with a frozen porosity increment, then
/// evaluates the full residual to get the next estimate of the increment.
fn write_staggered_iterations(
    ctx: &EmitContext,
    system: &ImplicitSystem,
    staggered: &StaggeredPorosityScheme,
    w: &mut SourceWriter,
) -> Result<(), GenError> {
    let method = "integrate";
    let residual = system.vector_map(&staggered.porosity, "this->fzeros")?;
    w.line("this->computeStandardSystemOfImplicitEquations = false;");
    w.line("this->current_estimate_of_the_porosity_increment = real(0);");
    w.declare("auto", "fixed_point_converged", "false")?;
    w.declare("auto", "staggered_scheme_iteration_counter", "static_cast<unsigned short>(0)")?;
    if staggered.acceleration == StaggeredAcceleration::Aitken {
        w.declare("auto", "staggered_scheme_relaxation_coefficient", "real(1)")?;
        w.declare("auto", "previous_difference_between_estimates", "real(0)")?;
    }
    w.open("while(!fixed_point_converged)");
    w.open("if(staggered_scheme_iteration_counter == static_cast<unsigned short>(this->staggered_scheme_maximum_number_of_iterations))");
    ctx.debug(w, method, "\"maximum number of iterations of the staggered scheme reached\"")?;
    w.line("return FAILURE;");
    w.close("");
    w.line("++staggered_scheme_iteration_counter;");
    w.open("if(!this->solveNonLinearSystem())");
    ctx.debug(w, method, "\"no convergence\"")?;
    w.line("return FAILURE;");
    w.close("");
    w.line("this->computeStandardSystemOfImplicitEquations = true;");
    w.open("if(!this->computeFdF(true))");
    w.line("return FAILURE;");
    w.close("");
    w.line("this->computeStandardSystemOfImplicitEquations = false;");
    w.line(&format!(
        "const auto next_estimate_of_the_porosity_increment = this->d{} - {};",
        staggered.porosity, residual
    ));
    w.line("const auto difference_between_estimates = next_estimate_of_the_porosity_increment - this->current_estimate_of_the_porosity_increment;");
    w.line("fixed_point_converged = std::abs(difference_between_estimates) < this->staggered_scheme_convergence_criterion;");
    ctx.debug(
        w,
        method,
        "\"staggered iteration \" << staggered_scheme_iteration_counter << \" : \" << difference_between_estimates",
    )?;
    w.open("if(!fixed_point_converged)");
    match staggered.acceleration {
        StaggeredAcceleration::Relaxation(factor) => {
            w.line(&format!(
                "this->current_estimate_of_the_porosity_increment += ({})*difference_between_estimates;",
                real_literal(factor)
            ));
        }
        StaggeredAcceleration::Aitken => {
            w.open("if(staggered_scheme_iteration_counter > 1)");
            w.line("const auto variation_of_the_difference = difference_between_estimates - previous_difference_between_estimates;");
            w.open("if(std::abs(variation_of_the_difference) > 100*std::numeric_limits<real>::min())");
            w.line("staggered_scheme_relaxation_coefficient *= -previous_difference_between_estimates/variation_of_the_difference;");
            w.close("");
            w.close("");
            w.line("previous_difference_between_estimates = difference_between_estimates;");
            w.line("this->current_estimate_of_the_porosity_increment += staggered_scheme_relaxation_coefficient*difference_between_estimates;");
        }
    }
    w.close("");
    w.close("");
    w.line("// the full system is solved to get a consistent jacobian");
    w.line("this->computeStandardSystemOfImplicitEquations = true;");
    Ok(())
}

/// Writes the body of `integrate()`
pub fn write_integrator(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    let scheme = scheme(ctx)?;
    if let Some(staggered) = &scheme.staggered {
        write_staggered_iterations(ctx, &system(ctx)?, staggered, w)?;
    }
    w.open("if(!this->solveNonLinearSystem())");
    ctx.debug(w, "integrate", "\"no convergence\"")?;
    w.line("return FAILURE;");
    w.close("");
    w.line("this->updateIntegrationVariables();");
    w.line("this->updateStateVariables();");
    if ctx.code(CodeBlockSlot::ComputeFinalStress).is_some() {
        w.line("this->computeFinalThermodynamicForces();");
    }
    w.line("this->updateAuxiliaryStateVariables();");
    w.open("if(smt!=NOSTIFFNESSREQUESTED)");
    w.open("if(!this->computeConsistentTangentOperator(smt))");
    w.line("return FAILURE;");
    w.close("");
    w.close("");
    Ok(())
}

/// Writes the body of `computeConsistentTangentOperator()`
pub fn write_tangent_operator(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    match ctx.code(CodeBlockSlot::ComputeTangentOperator) {
        Some(code) => {
            w.line("using namespace std;");
            w.line("using namespace tfel::math;");
            w.lines(code);
            w.line("return true;");
        }
        None => {
            w.line("static_cast<void>(smt);");
            w.line("return false;");
        }
    }
    Ok(())
}

/// Writes the body of `computePredictionOperator()` when no code block is given
pub fn write_prediction_operator(ctx: &EmitContext, w: &mut SourceWriter) -> Result<(), GenError> {
    w.line("static_cast<void>(smt);");
    w.line(&format!(
        "tfel::raise(\"{}::computePredictionOperator: unimplemented feature\");",
        ctx.class_name()
    ));
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
