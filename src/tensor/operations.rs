use super::stensor_dime_to_size;
use crate::StrError;
use nalgebra::{DMatrix, Matrix3};

/// Returns the trace of a symmetric tensor
#[inline]
pub fn trace(s: &[f64]) -> f64 {
    s[0] + s[1] + s[2]
}

/// Returns the deviatoric part of a symmetric tensor
pub fn deviator(s: &[f64]) -> Vec<f64> {
    let p = trace(s) / 3.0;
    let mut dev = s.to_vec();
    for v in dev.iter_mut().take(3) {
        *v -= p;
    }
    dev
}

/// Returns the contracted product `a : b` of two symmetric tensors
#[inline]
pub fn contract(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Returns the von Mises equivalent stress `sqrt(3/2 s:s)` with `s` the deviator
pub fn sigmaeq(sig: &[f64]) -> f64 {
    let s = deviator(sig);
    f64::sqrt(1.5 * contract(&s, &s))
}

/// Returns the second-order identity for the space dimension `n`
pub fn stensor_identity(n: usize) -> Vec<f64> {
    let mut id = vec![0.0; stensor_dime_to_size(n)];
    for v in id.iter_mut().take(3) {
        *v = 1.0;
    }
    id
}

/// Returns the first Lamé coefficient
#[inline]
pub fn compute_lambda(young: f64, nu: f64) -> f64 {
    nu * young / ((1.0 + nu) * (1.0 - 2.0 * nu))
}

/// Returns the shear modulus (second Lamé coefficient)
#[inline]
pub fn compute_mu(young: f64, nu: f64) -> f64 {
    young / (2.0 * (1.0 + nu))
}

/// Returns the isotropic elastic stiffness `λ I⊗I + 2μ Id` for the space dimension `n`
pub fn isotropic_stiffness(n: usize, lambda: f64, mu: f64) -> Result<DMatrix<f64>, StrError> {
    let size = stensor_dime_to_size(n);
    if size == 0 {
        return Err("space dimension must be 1, 2 or 3");
    }
    let mut dd = DMatrix::<f64>::zeros(size, size);
    for i in 0..3 {
        for j in 0..3 {
            dd[(i, j)] = lambda;
        }
    }
    for i in 0..size {
        dd[(i, i)] += 2.0 * mu;
    }
    Ok(dd)
}

/// Returns the isotropic stiffness altered by the plane stress condition
///
/// The `zz` row and column are zero; the in-plane block is the plane stress
/// stiffness `E/(1-ν²) [[1, ν], [ν, 1]]` and the shear term is `2μ`.
pub fn plane_stress_altered_stiffness(young: f64, nu: f64) -> DMatrix<f64> {
    let mu = compute_mu(young, nu);
    let c = young / (1.0 - nu * nu);
    let mut dd = DMatrix::<f64>::zeros(4, 4);
    dd[(0, 0)] = c;
    dd[(1, 1)] = c;
    dd[(0, 1)] = nu * c;
    dd[(1, 0)] = nu * c;
    dd[(3, 3)] = 2.0 * mu;
    dd
}

/// Holds the elastic coefficients of an orthotropic material
///
/// The shear moduli that do not exist in the space dimension are ignored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrthotropicCoefficients {
    pub young1: f64,
    pub young2: f64,
    pub young3: f64,
    pub nu12: f64,
    pub nu23: f64,
    pub nu13: f64,
    pub shear12: f64,
    pub shear23: f64,
    pub shear13: f64,
}

impl OrthotropicCoefficients {
    /// Reads the coefficients in the order `E1 E2 E3 ν12 ν23 ν13 G12 G23 G13`
    ///
    /// Accepts 6 values (1D), 7 values (2D) or 9 values (3D).
    pub fn from_slice(values: &[f64]) -> Result<Self, StrError> {
        let get = |i: usize| values.get(i).copied().unwrap_or(0.0);
        match values.len() {
            6 | 7 | 9 => (),
            _ => return Err("orthotropic elasticity requires 6, 7 or 9 coefficients"),
        }
        Ok(OrthotropicCoefficients {
            young1: get(0),
            young2: get(1),
            young3: get(2),
            nu12: get(3),
            nu23: get(4),
            nu13: get(5),
            shear12: get(6),
            shear23: get(7),
            shear13: get(8),
        })
    }

    /// Returns the number of coefficients needed in the space dimension `n`
    pub fn count(n: usize) -> usize {
        match n {
            1 => 6,
            2 => 7,
            _ => 9,
        }
    }

    fn normal_compliance(&self) -> Matrix3<f64> {
        let (e1, e2, e3) = (self.young1, self.young2, self.young3);
        Matrix3::new(
            1.0 / e1,
            -self.nu12 / e1,
            -self.nu13 / e1,
            -self.nu12 / e1,
            1.0 / e2,
            -self.nu23 / e2,
            -self.nu13 / e1,
            -self.nu23 / e2,
            1.0 / e3,
        )
    }
}

/// Returns the orthotropic elastic stiffness for the space dimension `n`
///
/// Shear terms follow the TFEL convention (`2G` on the diagonal).
pub fn orthotropic_stiffness(n: usize, c: &OrthotropicCoefficients) -> Result<DMatrix<f64>, StrError> {
    let size = stensor_dime_to_size(n);
    if size == 0 {
        return Err("space dimension must be 1, 2 or 3");
    }
    let normal = c
        .normal_compliance()
        .try_inverse()
        .ok_or("orthotropic compliance is singular")?;
    let mut dd = DMatrix::<f64>::zeros(size, size);
    for i in 0..3 {
        for j in 0..3 {
            dd[(i, j)] = normal[(i, j)];
        }
    }
    if size > 3 {
        dd[(3, 3)] = 2.0 * c.shear12;
    }
    if size > 4 {
        dd[(4, 4)] = 2.0 * c.shear13;
        dd[(5, 5)] = 2.0 * c.shear23;
    }
    Ok(dd)
}

/// Returns the orthotropic stiffness altered by the plane stress condition
pub fn plane_stress_altered_orthotropic_stiffness(c: &OrthotropicCoefficients) -> Result<DMatrix<f64>, StrError> {
    let s11 = 1.0 / c.young1;
    let s22 = 1.0 / c.young2;
    let s12 = -c.nu12 / c.young1;
    let det = s11 * s22 - s12 * s12;
    if det.abs() < f64::EPSILON * s11 * s22 {
        return Err("orthotropic compliance is singular");
    }
    let mut dd = DMatrix::<f64>::zeros(4, 4);
    dd[(0, 0)] = s22 / det;
    dd[(1, 1)] = s11 / det;
    dd[(0, 1)] = -s12 / det;
    dd[(1, 0)] = -s12 / det;
    dd[(3, 3)] = 2.0 * c.shear12;
    Ok(dd)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn deviator_and_sigmaeq_work() {
        let sig = [100.0, 0.0, 0.0, 0.0];
        assert_eq!(trace(&sig), 100.0);
        let s = deviator(&sig);
        assert_abs_diff_eq!(trace(&s), 0.0, epsilon = 1e-12);
        // uniaxial stress
        assert_abs_diff_eq!(sigmaeq(&sig), 100.0, epsilon = 1e-12);
        // pure shear (TFEL stores √2·σxy)
        let tau = 10.0;
        let sig = [0.0, 0.0, 0.0, f64::sqrt(2.0) * tau, 0.0, 0.0];
        assert_abs_diff_eq!(sigmaeq(&sig), f64::sqrt(3.0) * tau, epsilon = 1e-12);
        assert_eq!(stensor_identity(2), vec![1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn isotropic_stiffness_works() {
        let (young, nu) = (200e3, 0.3);
        let lambda = compute_lambda(young, nu);
        let mu = compute_mu(young, nu);
        assert_abs_diff_eq!(lambda, 115384.61538461538, epsilon = 1e-8);
        assert_abs_diff_eq!(mu, 76923.07692307692, epsilon = 1e-8);
        let dd = isotropic_stiffness(3, lambda, mu).unwrap();
        assert_eq!(dd.nrows(), 6);
        assert_abs_diff_eq!(dd[(0, 0)], lambda + 2.0 * mu, epsilon = 1e-10);
        assert_abs_diff_eq!(dd[(0, 1)], lambda, epsilon = 1e-10);
        assert_abs_diff_eq!(dd[(5, 5)], 2.0 * mu, epsilon = 1e-10);
        assert_eq!(dd[(0, 5)], 0.0);
        assert_eq!(isotropic_stiffness(0, lambda, mu).err(), Some("space dimension must be 1, 2 or 3"));
    }

    #[test]
    fn plane_stress_altered_stiffness_works() {
        let (young, nu) = (1000.0, 0.25);
        let dd = plane_stress_altered_stiffness(young, nu);
        let c = young / (1.0 - nu * nu);
        assert_abs_diff_eq!(dd[(0, 0)], c, epsilon = 1e-12);
        assert_abs_diff_eq!(dd[(0, 1)], nu * c, epsilon = 1e-12);
        assert_abs_diff_eq!(dd[(3, 3)], 2.0 * compute_mu(young, nu), epsilon = 1e-12);
        for k in 0..4 {
            assert_eq!(dd[(2, k)], 0.0);
            assert_eq!(dd[(k, 2)], 0.0);
        }
    }

    #[test]
    fn orthotropic_stiffness_works() {
        // isotropic coefficients must recover the isotropic stiffness
        let (young, nu) = (1000.0, 0.25);
        let g = compute_mu(young, nu);
        let c = OrthotropicCoefficients::from_slice(&[young, young, young, nu, nu, nu, g, g, g]).unwrap();
        let dd = orthotropic_stiffness(3, &c).unwrap();
        let reference = isotropic_stiffness(3, compute_lambda(young, nu), g).unwrap();
        for i in 0..6 {
            for j in 0..6 {
                assert_abs_diff_eq!(dd[(i, j)], reference[(i, j)], epsilon = 1e-9);
            }
        }
        let altered = plane_stress_altered_orthotropic_stiffness(&c).unwrap();
        let reference = plane_stress_altered_stiffness(young, nu);
        for i in 0..4 {
            for j in 0..4 {
                assert_abs_diff_eq!(altered[(i, j)], reference[(i, j)], epsilon = 1e-9);
            }
        }
        let c2 = OrthotropicCoefficients::from_slice(&[young, young, young, nu, nu, nu, g]).unwrap();
        assert_eq!(orthotropic_stiffness(2, &c2).unwrap().nrows(), 4);
        assert_eq!(OrthotropicCoefficients::count(2), 7);
        assert_eq!(
            OrthotropicCoefficients::from_slice(&[1.0; 8]).err(),
            Some("orthotropic elasticity requires 6, 7 or 9 coefficients")
        );
    }
}
