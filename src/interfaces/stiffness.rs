use super::InterfaceError;
use crate::base::{BehaviourSymmetry, BehaviourType, ModellingHypothesis};
use crate::tensor::{compute_lambda, compute_mu, isotropic_stiffness, orthotropic_stiffness};
use crate::tensor::{plane_stress_altered_orthotropic_stiffness, plane_stress_altered_stiffness, OrthotropicCoefficients};
use nalgebra::DMatrix;

/// Defines the formulas computing the stiffness tensor from the material properties
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StiffnessFormula {
    /// Isotropic stiffness from `(E, ν)`
    Isotropic,

    /// Isotropic stiffness altered by the plane stress condition
    IsotropicPlaneStressAltered,

    /// Orthotropic stiffness from `E1 E2 E3 ν12 ν23 ν13 G12 [G23 G13]`
    Orthotropic,

    /// Orthotropic stiffness altered by the plane stress condition
    OrthotropicPlaneStressAltered,
}

impl StiffnessFormula {
    /// Returns the number of material properties read by the formula in the space dimension `n`
    pub fn material_properties_nb(&self, n: usize) -> usize {
        match self {
            StiffnessFormula::Isotropic | StiffnessFormula::IsotropicPlaneStressAltered => 2,
            StiffnessFormula::Orthotropic | StiffnessFormula::OrthotropicPlaneStressAltered => {
                OrthotropicCoefficients::count(n)
            }
        }
    }

    /// Returns the name of the C++ function implementing the formula
    pub fn function_name(&self, n: usize) -> String {
        match self {
            StiffnessFormula::Isotropic => format!("computeIsotropicStiffnessTensor{}D", n),
            StiffnessFormula::IsotropicPlaneStressAltered => "computeIsotropicPlaneStressAlteredStiffnessTensor".to_string(),
            StiffnessFormula::Orthotropic => format!("computeOrthotropicStiffnessTensor{}D", n),
            StiffnessFormula::OrthotropicPlaneStressAltered => {
                "computeOrthotropicPlaneStressAlteredStiffnessTensor".to_string()
            }
        }
    }
}

/// Holds the key of the stiffness tensor table
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StiffnessKey {
    pub behaviour_type: BehaviourType,
    pub hypothesis: ModellingHypothesis,
    pub symmetry: BehaviourSymmetry,

    /// The behaviour requires the unaltered stiffness (meaningful in plane stress only)
    pub requires_unaltered: bool,
}

impl StiffnessKey {
    /// Returns a readable description of the key
    pub fn description(&self) -> String {
        format!(
            "({}, {}, {}, {})",
            self.behaviour_type.name(),
            self.hypothesis.name(),
            self.symmetry.name(),
            if self.requires_unaltered { "unaltered" } else { "altered" }
        )
    }
}

/// Finds the stiffness formula of a (behaviour type, hypothesis, symmetry, alteration) combination
///
/// Finite strain behaviours use the same formulas as small strain behaviours.
/// There is no fallback: a combination without formula yields None.
pub fn stiffness_formula(key: &StiffnessKey) -> Option<StiffnessFormula> {
    use BehaviourSymmetry::{Isotropic, Orthotropic};
    use ModellingHypothesis::{Axisymmetrical, GeneralisedPlaneStrain, PlaneStrain, PlaneStress, Tridimensional};
    match (key.hypothesis, key.symmetry, key.requires_unaltered) {
        (Axisymmetrical | PlaneStrain | GeneralisedPlaneStrain | Tridimensional, Isotropic, _) => {
            Some(StiffnessFormula::Isotropic)
        }
        (Axisymmetrical | PlaneStrain | GeneralisedPlaneStrain | Tridimensional, Orthotropic, _) => {
            Some(StiffnessFormula::Orthotropic)
        }
        (PlaneStress, Isotropic, true) => Some(StiffnessFormula::Isotropic),
        (PlaneStress, Isotropic, false) => Some(StiffnessFormula::IsotropicPlaneStressAltered),
        (PlaneStress, Orthotropic, true) => Some(StiffnessFormula::Orthotropic),
        (PlaneStress, Orthotropic, false) => Some(StiffnessFormula::OrthotropicPlaneStressAltered),
        _ => None,
    }
}

/// Computes the stiffness tensor from the material properties given by the solver
///
/// `props` starts with the elastic properties (extra values are ignored).
pub fn compute_stiffness_tensor(key: &StiffnessKey, props: &[f64]) -> Result<DMatrix<f64>, InterfaceError> {
    let formula = stiffness_formula(key).ok_or_else(|| InterfaceError::MissingStiffnessTensor(key.description()))?;
    let n = key.hypothesis.space_dimension()?;
    let nprops = formula.material_properties_nb(n);
    if props.len() < nprops {
        return Err(InterfaceError::UnmatchedNumberOfMaterialProperties {
            behaviour: key.description(),
            expected: nprops,
            given: props.len(),
        });
    }
    let dd = match formula {
        StiffnessFormula::Isotropic => {
            let (young, nu) = (props[0], props[1]);
            isotropic_stiffness(n, compute_lambda(young, nu), compute_mu(young, nu))?
        }
        StiffnessFormula::IsotropicPlaneStressAltered => plane_stress_altered_stiffness(props[0], props[1]),
        StiffnessFormula::Orthotropic => {
            let c = OrthotropicCoefficients::from_slice(&props[..nprops])?;
            orthotropic_stiffness(n, &c)?
        }
        StiffnessFormula::OrthotropicPlaneStressAltered => {
            let c = OrthotropicCoefficients::from_slice(&props[..nprops])?;
            plane_stress_altered_orthotropic_stiffness(&c)?
        }
    };
    Ok(dd)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
