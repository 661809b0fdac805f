use super::{ntens, InterfaceError};
use crate::base::{throw_runtime_error, BehaviourDescription, BehaviourSymmetry, GenError, ModellingHypothesis, Solver};
use crate::base::{ATTRIBUTE_REQUIRES_STIFFNESS_TENSOR, ATTRIBUTE_REQUIRES_THERMAL_EXPANSION_COEFFICIENT_TENSOR};
use crate::tensor::OrthotropicCoefficients;

/// Holds the layout of the arrays exchanged with a solver for one modelling hypothesis
///
/// `PROPS` holds the elastic properties, the thermal expansion coefficients,
/// the orthotropic axes (Ansys only) and finally the material properties of
/// the behaviour. `STATEV` holds the persistent variables, preceded by the
/// orthotropic axes for Ansys.
#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceLayout {
    pub solver: Solver,
    pub hypothesis: ModellingHypothesis,

    /// Space dimension
    pub space_dimension: usize,

    /// Number of components of the solver's symmetric tensors
    pub ntens: usize,

    /// Number of elastic properties passed by the solver
    pub elastic_properties_offset: usize,

    /// Number of thermal expansion coefficients passed by the solver
    pub thermal_expansion_properties_offset: usize,

    /// Number of values defining the orthotropic axes
    pub orthotropic_axes_offset: usize,

    /// Number of material properties of the behaviour
    pub material_properties_nb: usize,

    /// Names of the material properties of the behaviour
    pub material_properties: Vec<String>,

    /// Expected size of PROPS
    pub nprops: usize,

    /// Number of state variables stored before the persistent variables
    pub state_variables_offset: usize,

    /// Expected size of STATEV
    pub nstatv: usize,
}

impl InterfaceLayout {
    /// Computes the layout of a behaviour for a solver and a hypothesis
    pub fn new(bd: &BehaviourDescription, solver: Solver, h: ModellingHypothesis) -> Result<Self, GenError> {
        let method = format!("{}Interface::computeLayout", solver.upper_case_name());
        let ntens = ntens(solver, h).ok_or_else(|| {
            throw_runtime_error(&method, &format!("hypothesis '{}' is not supported", h.name()))
        })?;
        let n = h.space_dimension()?;
        let d = bd.data(h);
        let orthotropic = bd.elastic_symmetry == BehaviourSymmetry::Orthotropic;
        let requires_stiffness = d.attribute(ATTRIBUTE_REQUIRES_STIFFNESS_TENSOR);
        let elastic_properties_offset = match (requires_stiffness, orthotropic) {
            (false, _) => 0,
            (true, false) => 2,
            (true, true) => OrthotropicCoefficients::count(n),
        };
        let thermal_expansion_properties_offset =
            match (d.attribute(ATTRIBUTE_REQUIRES_THERMAL_EXPANSION_COEFFICIENT_TENSOR), orthotropic) {
                (false, _) => 0,
                (true, false) => 1,
                (true, true) => 3,
            };
        let orthotropic_axes_offset = match (solver, bd.symmetry) {
            (Solver::Ansys, BehaviourSymmetry::Orthotropic) => orthotropic_axes_size(n),
            _ => 0,
        };
        // the elastic properties passed by the solver are not behaviour properties
        let provided = |name: &str| requires_stiffness && bd.elastic_material_properties().iter().any(|e| e == name);
        let mut material_properties = Vec::new();
        let mut material_properties_nb = 0;
        for v in d.material_properties.iter().filter(|v| !provided(&v.name)) {
            material_properties.push(v.external_name().to_string());
            material_properties_nb += v.size().value_for_dimension(n);
        }
        let mut nprops = elastic_properties_offset
            + thermal_expansion_properties_offset
            + orthotropic_axes_offset
            + material_properties_nb;
        if solver == Solver::LsDyna && nprops == 0 {
            nprops = 1;
        }
        if solver == Solver::Ansys {
            if let Some(v) = d.external_state_variables.iter().find(|v| v.name != "T") {
                return Err(throw_runtime_error(
                    &method,
                    &format!("external state variable '{}' is not supported", v.name),
                ));
            }
        }
        let state_variables_offset = match (solver, bd.symmetry) {
            (Solver::Ansys, BehaviourSymmetry::Orthotropic) => orthotropic_axes_size(n),
            _ => 0,
        };
        let persistent: usize = d
            .persistent_variables()
            .iter()
            .map(|v| v.size().value_for_dimension(n))
            .sum();
        Ok(InterfaceLayout {
            solver,
            hypothesis: h,
            space_dimension: n,
            ntens,
            elastic_properties_offset,
            thermal_expansion_properties_offset,
            orthotropic_axes_offset,
            material_properties_nb,
            material_properties,
            nprops,
            state_variables_offset,
            nstatv: state_variables_offset + persistent,
        })
    }

    /// Returns the position of the first material property of the behaviour in PROPS
    pub fn material_properties_offset(&self) -> usize {
        self.elastic_properties_offset + self.thermal_expansion_properties_offset + self.orthotropic_axes_offset
    }
}

fn orthotropic_axes_size(n: usize) -> usize {
    if n == 3 {
        6
    } else {
        2
    }
}

/// Checks the number of material properties passed by the solver
pub fn check_nprops(behaviour: &str, expected: usize, given: usize) -> Result<(), InterfaceError> {
    if expected != given {
        return Err(InterfaceError::UnmatchedNumberOfMaterialProperties {
            behaviour: behaviour.to_string(),
            expected,
            given,
        });
    }
    Ok(())
}

/// Checks the number of state variables passed by the solver
pub fn check_nstatv(behaviour: &str, expected: usize, given: usize) -> Result<(), InterfaceError> {
    if expected != given {
        return Err(InterfaceError::UnmatchedNumberOfStateVariables {
            behaviour: behaviour.to_string(),
            expected,
            given,
        });
    }
    Ok(())
}

/// Checks the number of components of the symmetric tensors passed by the solver
pub fn check_ntens(behaviour: &str, expected: usize, given: usize) -> Result<(), InterfaceError> {
    if expected != given {
        return Err(InterfaceError::InvalidTensorSize {
            behaviour: behaviour.to_string(),
            expected,
            given,
        });
    }
    Ok(())
}

/// Checks that the time step is not negative
pub fn check_time_step(behaviour: &str, dt: f64) -> Result<(), InterfaceError> {
    if dt < 0.0 {
        return Err(InterfaceError::NegativeTimeStep(behaviour.to_string()));
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
