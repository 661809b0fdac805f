use super::{check_nprops, check_nstatv, check_ntens, check_time_step, convert_tangent_operator, is_supported, ntens};
use super::{strain_from_solver, stress_from_solver, stress_to_solver, InterfaceError, SUCCESS_RETURN_CODE};
use crate::base::{ModellingHypothesis, Solver, MIN_TIME_STEP_SCALING_FACTOR};
use crate::integration::{BehaviourKernel, IntegrationStatus, LocalState, StiffnessRequest};
use log::{debug, warn};
use nalgebra::DVector;

/// Holds the arrays exchanged with a solver at one integration point
///
/// Tensors follow the solver's conventions (see [super::solver_components]).
/// `statev` holds the elastic strain (TFEL components) followed by the
/// internal values of the behaviour.
pub struct SolverCall<'a> {
    /// Time step (DTIME)
    pub dt: f64,

    /// Number of components of the symmetric tensors (NTENS)
    pub ntens: usize,

    /// Strain increment (DSTRAN)
    pub dstran: &'a [f64],

    /// Material properties (PROPS)
    pub props: &'a [f64],

    /// Stress (STRESS), updated on success
    pub stress: &'a mut [f64],

    /// State variables (STATEV), updated on success
    pub statev: &'a mut [f64],

    /// Tangent operator (DDSDDE), column-major
    pub ddsdde: &'a mut [f64],

    /// Time step scaling factor (PNEWDT)
    pub pnewdt: &'a mut f64,
}

/// Emulates the entry points generated for a solver
///
/// Each call builds a fresh local state from the caller's buffers, so that
/// nothing is shared between calls.
pub struct SolverInterface<K: BehaviourKernel> {
    /// Target solver
    pub solver: Solver,

    /// Name of the behaviour (used in error messages)
    pub name: String,

    /// Skips the NPROPS, NSTATV and NTENS checks
    pub no_runtime_checks: bool,

    /// Behaviour
    pub kernel: K,
}

impl<K: BehaviourKernel> SolverInterface<K> {
    /// Allocates a new instance
    pub fn new(solver: Solver, name: &str, kernel: K) -> Self {
        SolverInterface {
            solver,
            name: name.to_string(),
            no_runtime_checks: false,
            kernel,
        }
    }

    /// Returns the expected size of PROPS
    pub fn nprops(&self) -> usize {
        let n = self.kernel.material_properties_nb();
        if self.solver == Solver::LsDyna && n == 0 {
            1
        } else {
            n
        }
    }

    /// Returns the expected size of STATEV
    pub fn nstatv(&self, h: ModellingHypothesis) -> Result<usize, InterfaceError> {
        Ok(h.stensor_size()? + self.kernel.internal_values_nb())
    }

    /// Calls the behaviour and returns the solver's return code
    pub fn call(&mut self, h: ModellingHypothesis, data: &mut SolverCall) -> i32 {
        match self.exe(h, data) {
            Ok(()) => SUCCESS_RETURN_CODE,
            Err(err) => {
                warn!("{}", err);
                err.return_code()
            }
        }
    }

    /// Calls the behaviour
    ///
    /// The bounds of the state are checked before integrating. On failure of
    /// the integration, `PNEWDT` is set to the minimal time step scaling factor
    /// and the outputs are left untouched.
    pub fn exe(&mut self, h: ModellingHypothesis, data: &mut SolverCall) -> Result<(), InterfaceError> {
        if !is_supported(self.solver, h) || !self.kernel.supports(h) {
            return Err(InterfaceError::InvalidModellingHypothesis {
                behaviour: self.name.clone(),
                hypothesis: h.name().to_string(),
            });
        }
        let size = h.stensor_size()?;
        let nstatv = self.nstatv(h)?;
        if !self.no_runtime_checks {
            check_ntens(&self.name, ntens(self.solver, h).unwrap_or(size), data.ntens)?;
            check_nprops(&self.name, self.nprops(), data.props.len())?;
            check_nstatv(&self.name, nstatv, data.statev.len())?;
        }
        if data.statev.len() < nstatv {
            return Err(InterfaceError::Tfel("STATEV is too small".to_string()));
        }
        check_time_step(&self.name, data.dt)?;
        self.kernel
            .set_material_properties(data.props)
            .map_err(|e| InterfaceError::OutOfBounds(format!("{}: {}", self.name, e)))?;

        // local state
        let n = h.space_dimension()?;
        let mut state = LocalState::new(n, self.kernel.internal_values_nb())?;
        state.elastic_strain = DVector::from_column_slice(&data.statev[..size]);
        state.internal_values.copy_from_slice(&data.statev[size..nstatv]);
        state.stress = DVector::from_vec(stress_from_solver(data.stress, self.solver, h)?);
        let deto = DVector::from_vec(strain_from_solver(data.dstran, self.solver, h)?);
        self.kernel
            .check_bounds(&state)
            .map_err(|e| InterfaceError::OutOfBounds(format!("{}: {}", self.name, e)))?;

        let (ok, factor) = self.kernel.a_priori_time_step_scaling_factor(*data.pnewdt);
        *data.pnewdt = factor;
        if !ok {
            *data.pnewdt = MIN_TIME_STEP_SCALING_FACTOR;
            return Err(InterfaceError::Divergence(self.name.clone()));
        }
        let request = if self.kernel.has_consistent_tangent_operator() {
            StiffnessRequest::ConsistentTangentOperator
        } else {
            StiffnessRequest::NoStiffness
        };
        let outcome = self.kernel.integrate(&mut state, &deto, data.dt, request)?;
        debug!("{}: {} after {} iterations", self.name, outcome.status, outcome.iterations);
        if outcome.status == IntegrationStatus::Failure {
            *data.pnewdt = MIN_TIME_STEP_SCALING_FACTOR;
            return Err(InterfaceError::Divergence(self.name.clone()));
        }
        let (ok, factor) = self.kernel.a_posteriori_time_step_scaling_factor(*data.pnewdt);
        if !ok {
            *data.pnewdt = MIN_TIME_STEP_SCALING_FACTOR;
            return Err(InterfaceError::Divergence(self.name.clone()));
        }
        *data.pnewdt = f64::min(*data.pnewdt, factor);

        // outputs
        let dt = match outcome.stiffness {
            Some(dt) => dt,
            None => return Err(InterfaceError::ConsistentTangentOperatorNotAvailable(self.name.clone())),
        };
        let sig = stress_to_solver(state.stress.as_slice(), self.solver, h)?;
        if data.stress.len() != sig.len() {
            return Err(InterfaceError::Tfel("STRESS has an invalid size".to_string()));
        }
        convert_tangent_operator(
            data.ddsdde,
            &dt,
            self.solver,
            h,
            self.kernel.is_consistent_tangent_operator_symmetric(),
        )?;
        data.stress.copy_from_slice(&sig);
        data.statev[..size].copy_from_slice(state.elastic_strain.as_slice());
        data.statev[size..nstatv].copy_from_slice(&state.internal_values);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
