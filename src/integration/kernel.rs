use super::{FlowRule, IntegrationStatus, IsotropicElasticity, IsotropicMisesIntegrator, LocalState};
use super::{MultipleMisesFlowsIntegrator, StiffnessRequest};
use crate::base::ModellingHypothesis;
use crate::StrError;
use nalgebra::{DMatrix, DVector};

/// Holds the outcome of [BehaviourKernel::integrate]
#[derive(Clone, Debug)]
pub struct KernelOutcome {
    pub status: IntegrationStatus,
    pub iterations: usize,
    pub stiffness: Option<DMatrix<f64>>,
}

/// Defines a behaviour that a solver interface can call at an integration point
pub trait BehaviourKernel {
    /// Returns the number of material properties (Young's modulus and Poisson's ratio by default)
    fn material_properties_nb(&self) -> usize {
        2
    }

    /// Returns the number of internal values stored after the elastic strain
    fn internal_values_nb(&self) -> usize;

    /// Returns true if the behaviour can be integrated under the given hypothesis
    fn supports(&self, h: ModellingHypothesis) -> bool {
        h.is_defined() && h != ModellingHypothesis::PlaneStress
    }

    fn has_consistent_tangent_operator(&self) -> bool;

    fn is_consistent_tangent_operator_symmetric(&self) -> bool {
        true
    }

    /// Updates the material properties
    fn set_material_properties(&mut self, props: &[f64]) -> Result<(), StrError>;

    /// Integrates over a time step (the state is updated only on success)
    fn integrate(
        &self,
        state: &mut LocalState,
        deto: &DVector<f64>,
        dt: f64,
        request: StiffnessRequest,
    ) -> Result<KernelOutcome, StrError>;

    /// Checks the bounds of the state at the beginning of the time step
    ///
    /// The internal values are equivalent strains, physically bounded by zero.
    fn check_bounds(&self, state: &LocalState) -> Result<(), StrError> {
        if state.internal_values.iter().any(|v| *v < 0.0) {
            return Err("an equivalent strain is negative");
        }
        Ok(())
    }

    /// Returns the time step scaling factor computed before the integration
    ///
    /// The flag is false if the time step must be reduced without integrating.
    fn a_priori_time_step_scaling_factor(&self, current: f64) -> (bool, f64) {
        (true, current)
    }

    /// Returns the time step scaling factor computed after a successful integration
    fn a_posteriori_time_step_scaling_factor(&self, current: f64) -> (bool, f64) {
        (true, current)
    }
}

fn elasticity_from(props: &[f64]) -> Result<IsotropicElasticity, StrError> {
    if props.len() < 2 {
        return Err("Young's modulus and Poisson's ratio are required");
    }
    IsotropicElasticity::new(props[0], props[1])
}

impl<R: FlowRule> BehaviourKernel for IsotropicMisesIntegrator<R> {
    fn internal_values_nb(&self) -> usize {
        1
    }

    fn has_consistent_tangent_operator(&self) -> bool {
        true
    }

    fn set_material_properties(&mut self, props: &[f64]) -> Result<(), StrError> {
        self.elasticity = elasticity_from(props)?;
        Ok(())
    }

    fn integrate(
        &self,
        state: &mut LocalState,
        deto: &DVector<f64>,
        dt: f64,
        request: StiffnessRequest,
    ) -> Result<KernelOutcome, StrError> {
        let results = IsotropicMisesIntegrator::integrate(self, state, deto, dt, request)?;
        Ok(KernelOutcome {
            status: results.status,
            iterations: results.iterations,
            stiffness: results.stiffness,
        })
    }
}

impl BehaviourKernel for MultipleMisesFlowsIntegrator {
    fn internal_values_nb(&self) -> usize {
        self.flows.len() + 1
    }

    fn has_consistent_tangent_operator(&self) -> bool {
        false
    }

    fn set_material_properties(&mut self, props: &[f64]) -> Result<(), StrError> {
        self.elasticity = elasticity_from(props)?;
        Ok(())
    }

    fn integrate(
        &self,
        state: &mut LocalState,
        deto: &DVector<f64>,
        dt: f64,
        request: StiffnessRequest,
    ) -> Result<KernelOutcome, StrError> {
        let results = MultipleMisesFlowsIntegrator::integrate(self, state, deto, dt, request)?;
        Ok(KernelOutcome {
            status: results.status,
            iterations: results.iterations,
            stiffness: results.stiffness,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::BehaviourKernel;
    use crate::base::ModellingHypothesis;
    use crate::codegen::FlowKind;
    use crate::integration::{IntegrationStatus, IsotropicMisesIntegrator, LinearHardeningFlow, LocalState};
    use crate::integration::{MisesFlow, MisesFlowKind, MultipleMisesFlowsIntegrator, NewtonSettings, StiffnessRequest};
    use nalgebra::DVector;

    #[test]
    fn mises_kernel_works() {
        let rule = LinearHardeningFlow { r0: 300.0, h: 1000.0 };
        let mut kernel =
            IsotropicMisesIntegrator::new(MisesFlowKind::Plastic, 150e3, 0.3, NewtonSettings::new(), rule).unwrap();
        assert_eq!(kernel.material_properties_nb(), 2);
        assert_eq!(kernel.internal_values_nb(), 1);
        assert!(kernel.has_consistent_tangent_operator());
        assert!(kernel.supports(ModellingHypothesis::Tridimensional));
        assert!(!kernel.supports(ModellingHypothesis::PlaneStress));
        assert_eq!(kernel.a_priori_time_step_scaling_factor(1.0), (true, 1.0));

        kernel.set_material_properties(&[200e3, 0.25]).unwrap();
        assert_eq!(kernel.elasticity.young, 200e3);
        assert_eq!(
            kernel.set_material_properties(&[-1.0, 0.25]).err(),
            Some("Young's modulus must be positive")
        );
        assert_eq!(
            kernel.set_material_properties(&[1.0]).err(),
            Some("Young's modulus and Poisson's ratio are required")
        );

        let mut state = LocalState::new(3, 1).unwrap();
        assert_eq!(kernel.check_bounds(&state), Ok(()));
        state.internal_values[0] = -1e-3;
        assert_eq!(kernel.check_bounds(&state).err(), Some("an equivalent strain is negative"));
        state.internal_values[0] = 0.0;
        let deto = DVector::from_vec(vec![1e-4, -3e-5, -3e-5, 0.0, 0.0, 0.0]);
        let outcome = BehaviourKernel::integrate(&kernel, &mut state, &deto, 1.0, StiffnessRequest::Elastic).unwrap();
        assert_eq!(outcome.status, IntegrationStatus::Success);
        assert_eq!(outcome.stiffness.map(|d| d.nrows()), Some(6));
    }

    #[test]
    fn multiple_flows_kernel_works() {
        let flow = MisesFlow {
            kind: FlowKind::PlasticFlow,
            rule: Box::new(LinearHardeningFlow { r0: 300.0, h: 1000.0 }),
            theta: None,
        };
        let kernel = MultipleMisesFlowsIntegrator::new(150e3, 0.3, NewtonSettings::new(), vec![flow]).unwrap();
        assert_eq!(kernel.internal_values_nb(), 2);
        assert!(!kernel.has_consistent_tangent_operator());
        assert!(kernel.supports(ModellingHypothesis::Axisymmetrical));
    }
}
