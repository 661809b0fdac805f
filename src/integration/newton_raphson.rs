use super::IntegrationStatus;
use crate::codegen::NonLinearSystemSolver;
use crate::StrError;
use nalgebra::{DMatrix, DVector};

/// Holds the residual and (possibly) the jacobian of an implicit system
pub struct Residual {
    pub fzeros: DVector<f64>,
    pub jacobian: Option<DMatrix<f64>>,
}

/// Holds the results of [solve_non_linear_system]
#[derive(Clone, Debug)]
pub struct NewtonRaphsonReport {
    /// Outcome
    pub status: IntegrationStatus,

    /// Number of iterations
    pub iterations: usize,

    /// Number of failed evaluations of the residual (after the first iteration)
    pub halvings: usize,

    /// Norm of the residual divided by the size of the system, at each iteration
    pub errors: Vec<f64>,
}

/// Holds the parameters of [solve_non_linear_system]
#[derive(Clone, Copy, Debug)]
pub struct NewtonRaphsonSettings {
    /// Algorithm
    pub solver: NonLinearSystemSolver,

    /// Convergence criterion on `|F|/n`
    pub epsilon: f64,

    /// Maximum number of iterations
    pub iter_max: usize,

    /// Perturbation used by the numerical jacobian
    pub numerical_jacobian_epsilon: f64,
}

/// Computes the jacobian by central differences
///
/// `compute_fdf` is evaluated with the "perturbated" flag set.
pub fn numerical_jacobian<F>(zeros: &DVector<f64>, perturbation: f64, compute_fdf: &mut F) -> Option<DMatrix<f64>>
where
    F: FnMut(&DVector<f64>, bool) -> Option<Residual>,
{
    let n = zeros.len();
    let mut jacobian = DMatrix::<f64>::zeros(n, n);
    let mut z = zeros.clone();
    for idx in 0..n {
        z[idx] = zeros[idx] - perturbation;
        let minus = compute_fdf(&z, true)?.fzeros;
        z[idx] = zeros[idx] + perturbation;
        let plus = compute_fdf(&z, true)?.fzeros;
        z[idx] = zeros[idx];
        let column = (plus - minus) / (2.0 * perturbation);
        jacobian.set_column(idx, &column);
    }
    Some(jacobian)
}

/// Solves the implicit system `F(zeros) = 0` by the Newton-Raphson method
///
/// `compute_fdf(zeros, perturbated)` returns the residual (and the jacobian
/// unless it is computed numerically), or None if it can't be evaluated.
/// A failed evaluation at the first iteration ends the algorithm; afterwards
/// the last correction is halved. On failure, `zeros` holds the last estimate.
pub fn solve_non_linear_system<F>(
    zeros: &mut DVector<f64>,
    settings: &NewtonRaphsonSettings,
    mut compute_fdf: F,
) -> Result<NewtonRaphsonReport, StrError>
where
    F: FnMut(&DVector<f64>, bool) -> Option<Residual>,
{
    let n = zeros.len();
    if n == 0 {
        return Err("the implicit system has no unknown");
    }
    if settings.iter_max == 0 {
        return Err("iter_max must be positive");
    }
    let mut report = NewtonRaphsonReport {
        status: IntegrationStatus::Failure,
        iterations: 0,
        halvings: 0,
        errors: Vec::new(),
    };
    let mut zeros_1 = zeros.clone();
    let mut jacobian = DMatrix::<f64>::zeros(n, n);
    let mut converged = false;
    while !converged && report.iterations != settings.iter_max {
        report.iterations += 1;
        let residual = match compute_fdf(&*zeros, false) {
            Some(r) => r,
            None => {
                if report.iterations == 1 {
                    return Ok(report);
                }
                report.halvings += 1;
                let half = (&*zeros - &zeros_1) * 0.5;
                *zeros -= half;
                continue;
            }
        };
        if residual.fzeros.len() != n {
            return Err("the residual and the unknowns have different sizes");
        }
        match settings.solver {
            NonLinearSystemSolver::NewtonRaphson => {
                jacobian = residual.jacobian.ok_or("the analytical jacobian is missing")?;
            }
            NonLinearSystemSolver::NewtonRaphsonNumericalJacobian { jacobian_update_period } => {
                let update = match jacobian_update_period {
                    Some(period) if period > 1 => (report.iterations - 1) % period == 0,
                    _ => true,
                };
                if update {
                    jacobian = match numerical_jacobian(&*zeros, settings.numerical_jacobian_epsilon, &mut compute_fdf) {
                        Some(j) => j,
                        None => return Ok(report),
                    };
                }
            }
        }
        let error = residual.fzeros.norm() / (n as f64);
        report.errors.push(error);
        converged = error < settings.epsilon;
        if !converged {
            let correction = match jacobian.clone().lu().solve(&residual.fzeros) {
                Some(c) => c,
                None => return Ok(report),
            };
            zeros_1 = zeros.clone();
            *zeros -= correction;
        }
    }
    if converged {
        report.status = IntegrationStatus::Success;
    }
    Ok(report)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
