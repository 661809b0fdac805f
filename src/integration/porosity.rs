use crate::bricks::{MaterialProperty, PorosityNucleationModel};
use crate::codegen::StaggeredAcceleration;
use crate::StrError;
use nalgebra::{Matrix3, SymmetricEigen};
use std::f64::consts::{PI, SQRT_2};

/// Holds the porosity nucleated over a time step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NucleationIncrement {
    /// Porosity increment
    pub df: f64,

    /// Derivative of the increment with respect to the equivalent strain increment
    pub ddf_ddp: f64,

    /// True if the increment was clamped to reach exactly `fmax`
    pub saturated: bool,
}

/// Implements the Chu and Needleman (1980) nucleation models with constant coefficients
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChuNeedlemanNucleation {
    /// Gaussian distribution of the nucleation strain
    StrainBased { fn_: f64, en: f64, sn: f64, fmax: f64 },

    /// Gaussian distribution of the nucleation stress (maximum principal stress)
    StressBased { fn_: f64, sigm: f64, sn: f64, fmax: f64 },
}

impl ChuNeedlemanNucleation {
    /// Extracts the coefficients of a nucleation brick
    pub fn from_brick(model: &PorosityNucleationModel) -> Result<Self, StrError> {
        let value = |mp: &MaterialProperty| match mp {
            MaterialProperty::Constant(v) => Ok(*v),
            _ => Err("the coefficients of the nucleation model must be constant"),
        };
        let res = match model {
            PorosityNucleationModel::ChuNeedleman1980StrainBased { fn_, en, sn, fmax } => {
                ChuNeedlemanNucleation::StrainBased {
                    fn_: value(fn_)?,
                    en: value(en)?,
                    sn: value(sn)?,
                    fmax: value(fmax)?,
                }
            }
            PorosityNucleationModel::ChuNeedleman1980StressBased { fn_, sigm, sn, fmax } => {
                ChuNeedlemanNucleation::StressBased {
                    fn_: value(fn_)?,
                    sigm: value(sigm)?,
                    sn: value(sn)?,
                    fmax: value(fmax)?,
                }
            }
        };
        let (sn, fmax) = res.spread_and_bound();
        if !(sn > 0.0) {
            return Err("the standard deviation of the nucleation model must be positive");
        }
        if !(fmax > 0.0 && fmax <= 1.0) {
            return Err("fmax must be in (0, 1]");
        }
        Ok(res)
    }

    fn spread_and_bound(&self) -> (f64, f64) {
        match self {
            ChuNeedlemanNucleation::StrainBased { sn, fmax, .. } => (*sn, *fmax),
            ChuNeedlemanNucleation::StressBased { sn, fmax, .. } => (*sn, *fmax),
        }
    }

    /// Returns the maximum porosity reachable by nucleation
    pub fn fmax(&self) -> f64 {
        self.spread_and_bound().1
    }

    /// Computes the porosity nucleated during the step
    ///
    /// * `f` -- porosity at the beginning of the step
    /// * `p` -- equivalent strain at the beginning of the step
    /// * `dp` -- equivalent strain increment
    /// * `theta` -- implicit parameter
    /// * `sig` -- stress (TFEL ordering), used by the stress-based model
    pub fn increment(&self, f: f64, p: f64, dp: f64, theta: f64, sig: &[f64]) -> Result<NucleationIncrement, StrError> {
        let (fn_, sn, fmax, xn) = match self {
            ChuNeedlemanNucleation::StrainBased { fn_, en, sn, fmax } => (*fn_, *sn, *fmax, (p + theta * dp - en) / sn),
            ChuNeedlemanNucleation::StressBased { fn_, sigm, sn, fmax } => {
                (*fn_, *sn, *fmax, (max_principal_stress(sig)? - sigm) / sn)
            }
        };
        let an = fn_ / (sn * f64::sqrt(2.0 * PI)) * f64::exp(-xn * xn / 2.0);
        let dfn = an * dp;
        if f + dfn > fmax {
            return Ok(NucleationIncrement {
                df: fmax - f,
                ddf_ddp: 0.0,
                saturated: true,
            });
        }
        let ddf_ddp = match self {
            ChuNeedlemanNucleation::StrainBased { .. } => an - dp * an * xn * theta / sn,
            ChuNeedlemanNucleation::StressBased { .. } => an,
        };
        Ok(NucleationIncrement {
            df: dfn,
            ddf_ddp,
            saturated: false,
        })
    }
}

/// Returns the largest eigenvalue of a symmetric tensor given in TFEL ordering
pub fn max_principal_stress(sig: &[f64]) -> Result<f64, StrError> {
    let s = |i: usize| sig.get(i).copied().unwrap_or(0.0) / SQRT_2;
    let m = match sig.len() {
        3 => Matrix3::new(sig[0], 0.0, 0.0, 0.0, sig[1], 0.0, 0.0, 0.0, sig[2]),
        4 | 6 => Matrix3::new(sig[0], s(3), s(4), s(3), sig[1], s(5), s(4), s(5), sig[2]),
        _ => return Err("the stress must have 3, 4 or 6 components"),
    };
    let eigen = SymmetricEigen::new(m);
    Ok(eigen.eigenvalues.max())
}

/// Holds the results of [staggered_porosity_iterations]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaggeredReport {
    /// True if two successive estimates became close enough
    pub converged: bool,

    /// Number of fixed-point iterations
    pub iterations: usize,

    /// Last estimate of the porosity increment
    pub df: f64,
}

/// Runs the fixed-point iterations on the porosity increment
///
/// `next_estimate(df)` solves the system with the porosity increment frozen to
/// `df` and returns the resulting increment, or None if the solve failed.
pub fn staggered_porosity_iterations<F>(
    convergence_criterion: f64,
    maximum_number_of_iterations: usize,
    acceleration: StaggeredAcceleration,
    mut next_estimate: F,
) -> Result<StaggeredReport, StrError>
where
    F: FnMut(f64) -> Option<f64>,
{
    if !(convergence_criterion > 0.0) {
        return Err("the convergence criterion must be positive");
    }
    if maximum_number_of_iterations == 0 {
        return Err("the maximum number of iterations must be positive");
    }
    let mut report = StaggeredReport {
        converged: false,
        iterations: 0,
        df: 0.0,
    };
    let mut coefficient = 1.0;
    let mut previous_difference = 0.0;
    while !report.converged {
        if report.iterations == maximum_number_of_iterations {
            return Ok(report);
        }
        report.iterations += 1;
        let next = match next_estimate(report.df) {
            Some(v) => v,
            None => return Ok(report),
        };
        let difference = next - report.df;
        report.converged = f64::abs(difference) < convergence_criterion;
        if !report.converged {
            match acceleration {
                StaggeredAcceleration::Relaxation(factor) => report.df += factor * difference,
                StaggeredAcceleration::Aitken => {
                    if report.iterations > 1 {
                        let variation = difference - previous_difference;
                        if f64::abs(variation) > 100.0 * f64::MIN_POSITIVE {
                            coefficient *= -previous_difference / variation;
                        }
                    }
                    previous_difference = difference;
                    report.df += coefficient * difference;
                }
            }
        }
    }
    Ok(report)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{max_principal_stress, staggered_porosity_iterations, ChuNeedlemanNucleation};
    use crate::bricks::{MaterialProperty, PorosityNucleationModel};
    use crate::codegen::StaggeredAcceleration;
    use approx::assert_relative_eq;
    use std::f64::consts::{PI, SQRT_2};

    const STRAIN: ChuNeedlemanNucleation = ChuNeedlemanNucleation::StrainBased {
        fn_: 0.04,
        en: 0.3,
        sn: 0.1,
        fmax: 0.1,
    };

    #[test]
    fn strain_based_nucleation_works() {
        // xn = 0 gives the peak of the distribution
        let res = STRAIN.increment(0.01, 0.25, 0.1, 0.5, &[]).unwrap();
        let an = 0.04 / (0.1 * f64::sqrt(2.0 * PI));
        assert_relative_eq!(res.df, an * 0.1, epsilon = 1e-15);
        assert_relative_eq!(res.ddf_ddp, an, epsilon = 1e-15);
        assert!(!res.saturated);
    }

    #[test]
    fn saturation_works() {
        for f in [0.05, 0.09, 0.0999, 0.1] {
            let res = STRAIN.increment(f, 0.1, 0.4, 0.5, &[]).unwrap();
            assert!(res.saturated);
            assert_eq!(res.df, 0.1 - f);
            assert_eq!(res.ddf_ddp, 0.0);
            assert!(f + res.df <= STRAIN.fmax());
        }
        let stress = ChuNeedlemanNucleation::StressBased {
            fn_: 0.04,
            sigm: 400.0,
            sn: 80.0,
            fmax: 0.02,
        };
        let res = stress.increment(0.0199, 0.0, 1.0, 0.5, &[400.0, 0.0, 0.0, 0.0]).unwrap();
        assert!(res.saturated);
        assert_eq!(res.df, 0.02 - 0.0199);
    }

    #[test]
    fn stress_based_nucleation_works() {
        let model = ChuNeedlemanNucleation::StressBased {
            fn_: 0.04,
            sigm: 400.0,
            sn: 80.0,
            fmax: 1.0,
        };
        let res = model.increment(0.0, 0.0, 1e-3, 0.5, &[100.0, 480.0, 0.0, 0.0]).unwrap();
        let an = 0.04 / (80.0 * f64::sqrt(2.0 * PI)) * f64::exp(-0.5);
        assert_relative_eq!(res.df, an * 1e-3, epsilon = 1e-15);
        assert_relative_eq!(res.ddf_ddp, an, epsilon = 1e-15);
    }

    #[test]
    fn max_principal_stress_works() {
        assert_relative_eq!(max_principal_stress(&[1.0, 3.0, 2.0]).unwrap(), 3.0, epsilon = 1e-12);
        // pure shear σxy = 2
        let sig = [0.0, 0.0, 0.0, 2.0 * SQRT_2];
        assert_relative_eq!(max_principal_stress(&sig).unwrap(), 2.0, epsilon = 1e-12);
        assert_eq!(
            max_principal_stress(&[1.0]).err(),
            Some("the stress must have 3, 4 or 6 components")
        );
    }

    #[test]
    fn from_brick_works() {
        let model = PorosityNucleationModel::ChuNeedleman1980StrainBased {
            fn_: MaterialProperty::Constant(0.04),
            en: MaterialProperty::Constant(0.3),
            sn: MaterialProperty::Constant(0.1),
            fmax: MaterialProperty::Constant(0.1),
        };
        assert_eq!(ChuNeedlemanNucleation::from_brick(&model), Ok(STRAIN));
        let model = PorosityNucleationModel::ChuNeedleman1980StressBased {
            fn_: MaterialProperty::Constant(0.04),
            sigm: MaterialProperty::Formula("2*young".to_string()),
            sn: MaterialProperty::Constant(80.0),
            fmax: MaterialProperty::Constant(1.0),
        };
        assert_eq!(
            ChuNeedlemanNucleation::from_brick(&model).err(),
            Some("the coefficients of the nucleation model must be constant")
        );
        let model = PorosityNucleationModel::ChuNeedleman1980StrainBased {
            fn_: MaterialProperty::Constant(0.04),
            en: MaterialProperty::Constant(0.3),
            sn: MaterialProperty::Constant(0.1),
            fmax: MaterialProperty::Constant(1.5),
        };
        assert_eq!(
            ChuNeedlemanNucleation::from_brick(&model).err(),
            Some("fmax must be in (0, 1]")
        );
    }

    #[test]
    fn staggered_iterations_work() {
        // fixed point of df = 0.5 df + 0.01 is 0.02
        let map = |df: f64| Some(0.5 * df + 0.01);
        let report = staggered_porosity_iterations(1e-12, 100, StaggeredAcceleration::Aitken, map).unwrap();
        assert!(report.converged);
        assert!(report.iterations < 5);
        assert_relative_eq!(report.df, 0.02, epsilon = 1e-12);
        let report = staggered_porosity_iterations(1e-12, 100, StaggeredAcceleration::Relaxation(1.0), map).unwrap();
        assert!(report.converged);
        assert!(report.iterations > 10);
        assert_relative_eq!(report.df, 0.02, epsilon = 1e-11);
        // maximum number of iterations reached
        let report = staggered_porosity_iterations(1e-12, 3, StaggeredAcceleration::Relaxation(1.0), map).unwrap();
        assert!(!report.converged);
        assert_eq!(report.iterations, 3);
        // failed solve
        let report = staggered_porosity_iterations(1e-12, 3, StaggeredAcceleration::Aitken, |_| None).unwrap();
        assert!(!report.converged);
        assert_eq!(report.iterations, 1);
        assert_eq!(
            staggered_porosity_iterations(0.0, 3, StaggeredAcceleration::Aitken, map).err(),
            Some("the convergence criterion must be positive")
        );
    }
}
