use crate::tensor::{compute_lambda, compute_mu, isotropic_stiffness, stensor_dime_to_size, trace};
use crate::StrError;
use nalgebra::{DMatrix, DVector};

/// Holds the state of an integration point
///
/// Symmetric tensors follow the TFEL ordering `(xx, yy, zz, √2 xy, √2 xz, √2 yz)`.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalState {
    /// Holds the elastic strain
    pub elastic_strain: DVector<f64>,

    /// Holds the stress
    pub stress: DVector<f64>,

    /// Holds the internal values (the equivalent strain p, then one per flow if any)
    pub internal_values: Vec<f64>,
}

impl LocalState {
    /// Allocates a new (zero) state for the space dimension `n`
    pub fn new(n: usize, n_internal_values: usize) -> Result<Self, StrError> {
        let size = stensor_dime_to_size(n);
        if size == 0 {
            return Err("space dimension must be 1, 2 or 3");
        }
        Ok(LocalState {
            elastic_strain: DVector::zeros(size),
            stress: DVector::zeros(size),
            internal_values: vec![0.0; n_internal_values],
        })
    }

    /// Returns the space dimension
    pub fn space_dimension(&self) -> usize {
        match self.stress.len() {
            3 => 1,
            4 => 2,
            _ => 3,
        }
    }

    /// Returns the number of components of the symmetric tensors
    pub fn size(&self) -> usize {
        self.stress.len()
    }
}

/// Holds the isotropic elastic properties
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IsotropicElasticity {
    pub young: f64,
    pub nu: f64,
    pub lambda: f64,
    pub mu: f64,
}

impl IsotropicElasticity {
    /// Allocates a new instance
    pub fn new(young: f64, nu: f64) -> Result<Self, StrError> {
        if !(young > 0.0) {
            return Err("Young's modulus must be positive");
        }
        if !(nu > -1.0 && nu < 0.5) {
            return Err("Poisson's ratio must be in (-1, 0.5)");
        }
        Ok(IsotropicElasticity {
            young,
            nu,
            lambda: compute_lambda(young, nu),
            mu: compute_mu(young, nu),
        })
    }

    /// Returns the stiffness for the space dimension `n`
    pub fn stiffness(&self, n: usize) -> Result<DMatrix<f64>, StrError> {
        isotropic_stiffness(n, self.lambda, self.mu)
    }

    /// Returns the stress `λ tr(ε) I + 2μ ε`
    pub fn stress(&self, eel: &DVector<f64>) -> DVector<f64> {
        let tr = trace(eel.as_slice());
        let mut sig = eel * (2.0 * self.mu);
        for i in 0..3 {
            sig[i] += self.lambda * tr;
        }
        sig
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{IsotropicElasticity, LocalState};
    use approx::assert_relative_eq;
    use nalgebra::DVector;

    #[test]
    fn new_works() {
        let state = LocalState::new(2, 1).unwrap();
        assert_eq!(state.size(), 4);
        assert_eq!(state.space_dimension(), 2);
        assert_eq!(state.internal_values, &[0.0]);
        assert_eq!(LocalState::new(4, 0).err(), Some("space dimension must be 1, 2 or 3"));
    }

    #[test]
    fn elasticity_works() {
        let elasticity = IsotropicElasticity::new(200e3, 0.25).unwrap();
        assert_relative_eq!(elasticity.lambda, 80e3, epsilon = 1e-9);
        assert_relative_eq!(elasticity.mu, 80e3, epsilon = 1e-9);
        let eel = DVector::from_vec(vec![1e-3, 0.0, 0.0, 0.0]);
        let sig = elasticity.stress(&eel);
        assert_relative_eq!(sig[0], 240.0, epsilon = 1e-9);
        assert_relative_eq!(sig[1], 80.0, epsilon = 1e-9);
        let dd = elasticity.stiffness(2).unwrap();
        let sig_bis = &dd * &eel;
        assert_relative_eq!(sig_bis[0], sig[0], epsilon = 1e-9);
        assert_eq!(
            IsotropicElasticity::new(-1.0, 0.3).err(),
            Some("Young's modulus must be positive")
        );
        assert_eq!(
            IsotropicElasticity::new(1.0, 0.5).err(),
            Some("Poisson's ratio must be in (-1, 0.5)")
        );
    }
}
