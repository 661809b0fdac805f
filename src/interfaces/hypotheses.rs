use crate::base::{throw_runtime_error, BehaviourDescription, GenError, ModellingHypothesis, Solver};

const ANSYS_HYPOTHESES: [ModellingHypothesis; 4] = [
    ModellingHypothesis::Axisymmetrical,
    ModellingHypothesis::PlaneStress,
    ModellingHypothesis::PlaneStrain,
    ModellingHypothesis::Tridimensional,
];

const LSDYNA_HYPOTHESES: [ModellingHypothesis; 5] = [
    ModellingHypothesis::Axisymmetrical,
    ModellingHypothesis::PlaneStress,
    ModellingHypothesis::PlaneStrain,
    ModellingHypothesis::GeneralisedPlaneStrain,
    ModellingHypothesis::Tridimensional,
];

// TFEL component of each solver component
const PLANE_STRESS_COMPONENTS: [usize; 3] = [0, 1, 3];
const TWO_DIMENSIONAL_COMPONENTS: [usize; 4] = [0, 1, 2, 3];
const TRIDIMENSIONAL_COMPONENTS: [usize; 6] = [0, 1, 2, 3, 5, 4];

/// Returns the modelling hypotheses a solver can call
pub fn supported_hypotheses(solver: Solver) -> &'static [ModellingHypothesis] {
    match solver {
        Solver::Ansys => &ANSYS_HYPOTHESES,
        Solver::LsDyna => &LSDYNA_HYPOTHESES,
    }
}

/// Returns true if the solver can call a behaviour under the given hypothesis
pub fn is_supported(solver: Solver, h: ModellingHypothesis) -> bool {
    supported_hypotheses(solver).contains(&h)
}

/// Selects, among the treated hypotheses, those the solver supports
pub fn hypotheses_to_be_treated(
    bd: &BehaviourDescription,
    solver: Solver,
    hypotheses: &[ModellingHypothesis],
) -> Result<Vec<ModellingHypothesis>, GenError> {
    let selected: Vec<_> = hypotheses
        .iter()
        .copied()
        .filter(|h| is_supported(solver, *h) && bd.supports(*h))
        .collect();
    if selected.is_empty() {
        let names: Vec<_> = supported_hypotheses(solver).iter().map(|h| h.name()).collect();
        return Err(throw_runtime_error(
            &format!("{}Interface::getModellingHypothesesToBeTreated", solver.upper_case_name()),
            &format!(
                "no hypothesis selected for behaviour '{}' (supported hypotheses: {})",
                bd.class_name(),
                names.join(", ")
            ),
        ));
    }
    Ok(selected)
}

/// Returns, for each component of the solver's symmetric tensors, the TFEL component
///
/// Solvers store `(xx, yy, zz, xy, yz, xz)` (truncated) and omit `zz` in
/// plane stress, whereas TFEL stores `(xx, yy, zz, xy, xz, yz)`.
pub fn solver_components(solver: Solver, h: ModellingHypothesis) -> Option<&'static [usize]> {
    if !is_supported(solver, h) {
        return None;
    }
    match h {
        ModellingHypothesis::PlaneStress => Some(&PLANE_STRESS_COMPONENTS),
        ModellingHypothesis::Tridimensional => Some(&TRIDIMENSIONAL_COMPONENTS),
        _ => Some(&TWO_DIMENSIONAL_COMPONENTS),
    }
}

/// Returns the number of components of the solver's symmetric tensors (NTENS)
pub fn ntens(solver: Solver, h: ModellingHypothesis) -> Option<usize> {
    solver_components(solver, h).map(|c| c.len())
}

/// Returns the name of the entry point called by the solver
pub fn function_name(solver: Solver, name: &str, h: ModellingHypothesis) -> Result<String, GenError> {
    let suffix = match (solver, h) {
        (Solver::Ansys, ModellingHypothesis::Axisymmetrical) => "axis",
        (Solver::Ansys, ModellingHypothesis::PlaneStrain) => "pstrain",
        (Solver::Ansys, ModellingHypothesis::PlaneStress) => "pstress",
        (Solver::Ansys, ModellingHypothesis::Tridimensional) => "3D",
        (Solver::LsDyna, ModellingHypothesis::Axisymmetrical) => "AXIS",
        (Solver::LsDyna, ModellingHypothesis::PlaneStrain) => "PSTRAIN",
        (Solver::LsDyna, ModellingHypothesis::PlaneStress) => "PSTRESS",
        (Solver::LsDyna, ModellingHypothesis::GeneralisedPlaneStrain) => "GPSTRAIN",
        (Solver::LsDyna, ModellingHypothesis::Tridimensional) => "3D",
        _ => {
            return Err(throw_runtime_error(
                &format!("{}Interface::getFunctionNameForHypothesis", solver.upper_case_name()),
                &format!("invalid hypothesis '{}'", h.name()),
            ))
        }
    };
    Ok(format!("{}_{}", name, suffix))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
