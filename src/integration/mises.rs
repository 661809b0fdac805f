use super::{FlowEvaluation, FlowRule, IntegrationStatus, IsotropicElasticity, LocalState, NewtonSettings};
use super::StiffnessRequest;
use crate::tensor::{deviator, sigmaeq};
use crate::StrError;
use nalgebra::{DMatrix, DVector};

/// Threshold (times `young · ε_machine`) below which creep flows have no direction
pub const CREEP_DIRECTION_THRESHOLD: f64 = 0.01;

/// Threshold (times `young · ε_machine`) below which plastic flows have no direction
pub const PLASTIC_DIRECTION_THRESHOLD: f64 = 100.0;

/// Defines the scalar flows integrated by a Newton algorithm on `dp`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MisesFlowKind {
    Creep,
    Plastic,
    StrainHardeningCreep,
}

impl MisesFlowKind {
    fn direction_threshold(&self) -> f64 {
        match self {
            MisesFlowKind::Plastic => PLASTIC_DIRECTION_THRESHOLD,
            _ => CREEP_DIRECTION_THRESHOLD,
        }
    }
}

/// Holds the elastic prediction of the deviatoric stress
#[derive(Clone, Debug, PartialEq)]
pub struct ElasticPrediction {
    /// Equivalent stress of the prediction
    pub seq_e: f64,

    /// Flow direction `3 se / (2 seq_e)`, zero if `seq_e` is too small
    pub n: DVector<f64>,
}

impl ElasticPrediction {
    /// Computes `se = 2μ dev(eel + θ Δε)`
    pub fn new(eel: &DVector<f64>, deto: &DVector<f64>, theta: f64, elasticity: &IsotropicElasticity, threshold: f64) -> Self {
        let trial = eel + deto * theta;
        let se = DVector::from_vec(deviator(trial.as_slice())) * (2.0 * elasticity.mu);
        let seq_e = sigmaeq(se.as_slice());
        let n = if seq_e > threshold * elasticity.young * f64::EPSILON {
            &se * (1.5 / seq_e)
        } else {
            DVector::zeros(se.len())
        };
        ElasticPrediction { seq_e, n }
    }
}

/// Holds the results of a scalar integration
#[derive(Clone, Debug)]
pub struct ScalarIntegration {
    /// Outcome
    pub status: IntegrationStatus,

    /// Number of iterations
    pub iterations: usize,

    /// Equivalent strain increment
    pub dp: f64,

    /// Value of `dp` after each iteration
    pub history: Vec<f64>,

    /// Number of corrections replaced by the fallback
    pub fallbacks: usize,

    /// Elastic prediction
    pub prediction: ElasticPrediction,

    /// Stiffness, if requested and available
    pub stiffness: Option<DMatrix<f64>>,
}

/// Integrates a behaviour with isotropic elasticity and one Mises flow
///
/// The unknown is the equivalent strain increment `dp`. The elastic strain is
/// updated as `Δεel = Δε - dp n` with the direction `n` of the elastic prediction.
pub struct IsotropicMisesIntegrator<R: FlowRule> {
    /// Kind of flow
    pub kind: MisesFlowKind,

    /// Elasticity
    pub elasticity: IsotropicElasticity,

    /// Numerical parameters
    pub settings: NewtonSettings,

    /// Flow rule
    pub rule: R,
}

impl<R: FlowRule> IsotropicMisesIntegrator<R> {
    /// Allocates a new instance
    pub fn new(kind: MisesFlowKind, young: f64, nu: f64, settings: NewtonSettings, rule: R) -> Result<Self, StrError> {
        Ok(IsotropicMisesIntegrator {
            kind,
            elasticity: IsotropicElasticity::new(young, nu)?,
            settings,
            rule,
        })
    }

    /// Returns the residual and its derivative
    fn residual(&self, ev: &FlowEvaluation, dp: f64, dt: f64) -> (f64, f64) {
        let theta = self.settings.theta;
        let mu = self.elasticity.mu;
        let newton_epsilon = 100.0 * f64::EPSILON;
        match self.kind {
            MisesFlowKind::Creep => (dp - ev.f * dt, 1.0 + 3.0 * theta * mu * ev.df_dseq * dt),
            MisesFlowKind::StrainHardeningCreep => (
                dp - ev.f * dt,
                1.0 - theta * dt * (ev.df_dp - 3.0 * mu * ev.df_dseq),
            ),
            MisesFlowKind::Plastic => {
                let young = self.elasticity.young;
                let surf = ev.f / young;
                if (surf > newton_epsilon && dp >= 0.0) || dp > newton_epsilon {
                    (surf, (theta * ev.df_dp - 3.0 * theta * mu * ev.df_dseq) / young)
                } else {
                    (dp, 1.0)
                }
            }
        }
    }

    /// Integrates over a time step
    ///
    /// The state is updated only on success.
    pub fn integrate(
        &self,
        state: &mut LocalState,
        deto: &DVector<f64>,
        dt: f64,
        request: StiffnessRequest,
    ) -> Result<ScalarIntegration, StrError> {
        if deto.len() != state.size() {
            return Err("strain increment and state have different sizes");
        }
        if state.internal_values.is_empty() {
            return Err("the state must hold the equivalent strain");
        }
        let theta = self.settings.theta;
        let mu_3_theta = 3.0 * theta * self.elasticity.mu;
        let newton_epsilon = 100.0 * f64::EPSILON;
        let prediction = ElasticPrediction::new(
            &state.elastic_strain,
            deto,
            theta,
            &self.elasticity,
            self.kind.direction_threshold(),
        );
        let p = state.internal_values[0];
        let mut dp = 0.0;
        let mut p_ = p + dp;
        let mut ddp = 0.0;
        let mut iter = 0;
        let mut converged = false;
        let mut history = Vec::new();
        let mut fallbacks = 0;
        let mut last = FlowEvaluation::default();
        while !converged && iter < self.settings.iter_max {
            let seq = f64::max(prediction.seq_e - mu_3_theta * dp, 0.0);
            let evaluation = match self.rule.evaluate(seq, p_) {
                Some(ev) if ev.is_finite() => Some(ev),
                _ => None,
            };
            let correction = evaluation.and_then(|ev| {
                last = ev;
                let (f, df) = self.residual(&ev, dp, dt);
                if f64::abs(df) > newton_epsilon {
                    Some((f, df))
                } else {
                    None
                }
            });
            match correction {
                Some((f, df)) => {
                    ddp = -f / df;
                    dp += ddp;
                    converged = f64::abs(f) < self.settings.epsilon;
                }
                None => {
                    if iter == 0 {
                        // probably an elastic prediction
                        ddp = (prediction.seq_e / mu_3_theta) / 2.0;
                    }
                    fallbacks += 1;
                    dp += ddp;
                }
            }
            if self.kind != MisesFlowKind::Creep {
                p_ = p + theta * dp;
            }
            iter += 1;
            history.push(dp);
        }
        let mut results = ScalarIntegration {
            status: IntegrationStatus::Failure,
            iterations: iter,
            dp,
            history,
            fallbacks,
            prediction,
            stiffness: None,
        };
        if !converged {
            return Ok(results);
        }
        let n = state.space_dimension();
        results.stiffness = match request {
            StiffnessRequest::NoStiffness => None,
            StiffnessRequest::Elastic => Some(self.elasticity.stiffness(n)?),
            StiffnessRequest::ConsistentTangentOperator => Some(self.tangent(n, &results, &last, dt)?),
        };
        let deel = deto - &results.prediction.n * dp;
        state.elastic_strain += deel;
        state.internal_values[0] += dp;
        state.stress = self.elasticity.stress(&state.elastic_strain);
        results.status = IntegrationStatus::Success;
        Ok(results)
    }

    /// Returns the consistent tangent operator
    fn tangent(&self, n: usize, results: &ScalarIntegration, ev: &FlowEvaluation, dt: f64) -> Result<DMatrix<f64>, StrError> {
        let mut dd = self.elasticity.stiffness(n)?;
        let (theta, mu) = (self.settings.theta, self.elasticity.mu);
        let seq_e = results.prediction.seq_e;
        let (active, numerator, correction) = match self.kind {
            MisesFlowKind::Creep => (
                seq_e > CREEP_DIRECTION_THRESHOLD * self.elasticity.young * f64::EPSILON,
                ev.df_dseq * dt,
                1.0 + 3.0 * mu * theta * dt * ev.df_dseq,
            ),
            MisesFlowKind::StrainHardeningCreep => (
                seq_e > CREEP_DIRECTION_THRESHOLD * self.elasticity.young * f64::EPSILON,
                ev.df_dseq * dt,
                1.0 + theta * dt * (3.0 * mu * ev.df_dseq - ev.df_dp),
            ),
            MisesFlowKind::Plastic => (
                results.dp > f64::EPSILON / 100.0,
                ev.df_dseq,
                theta * (3.0 * mu * ev.df_dseq - ev.df_dp),
            ),
        };
        if active {
            let size = dd.nrows();
            let nn = &results.prediction.n * results.prediction.n.transpose();
            let c1 = results.dp / seq_e;
            let c2 = c1 - numerator / correction;
            let mut mm = DMatrix::<f64>::identity(size, size);
            for i in 0..3 {
                for j in 0..3 {
                    mm[(i, j)] -= 1.0 / 3.0;
                }
            }
            mm *= 1.5;
            dd -= (mm * c1 - nn * c2) * (4.0 * mu * mu * theta);
        }
        Ok(dd)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{ElasticPrediction, IsotropicMisesIntegrator, MisesFlowKind};
    use crate::integration::{FlowEvaluation, FlowRule, IntegrationStatus, IsotropicElasticity, LinearHardeningFlow};
    use crate::integration::{LocalState, NewtonSettings, NortonFlow, StiffnessRequest};
    use crate::tensor::sigmaeq;
    use approx::assert_relative_eq;
    use nalgebra::DVector;
    use std::cell::Cell;

    const YOUNG: f64 = 150e3;
    const NU: f64 = 0.3;

    fn uniaxial(value: f64) -> DVector<f64> {
        DVector::from_vec(vec![value, -0.5 * value, -0.5 * value, 0.0])
    }

    #[test]
    fn elastic_prediction_works() {
        let elasticity = IsotropicElasticity::new(YOUNG, NU).unwrap();
        let zero = DVector::zeros(4);
        let prediction = ElasticPrediction::new(&zero, &uniaxial(1e-3), 1.0, &elasticity, 0.01);
        // seq = 2μ · 3/2 · ε for an isochoric uniaxial strain
        assert_relative_eq!(prediction.seq_e, 3.0 * elasticity.mu * 1e-3, epsilon = 1e-9);
        assert_relative_eq!(prediction.n[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(prediction.n[1], -0.5, epsilon = 1e-12);
        let prediction = ElasticPrediction::new(&zero, &zero, 1.0, &elasticity, 0.01);
        assert_eq!(prediction.n, DVector::zeros(4));
    }

    #[test]
    fn creep_works() {
        let mut settings = NewtonSettings::new();
        settings.set_epsilon(1e-14).unwrap();
        let norton = NortonFlow { a: 1e-10, n: 5.0 };
        let integrator = IsotropicMisesIntegrator::new(MisesFlowKind::Creep, YOUNG, NU, settings, norton).unwrap();
        let mut state = LocalState::new(2, 1).unwrap();
        let deto = uniaxial(1e-3);
        let dt = 10.0;
        let res = integrator
            .integrate(&mut state, &deto, dt, StiffnessRequest::ConsistentTangentOperator)
            .unwrap();
        assert_eq!(res.status, IntegrationStatus::Success);
        assert!(res.iterations <= settings.iter_max);
        assert_eq!(res.fallbacks, 0);
        // the residual vanishes at the solution
        let mu_3_theta = 3.0 * 0.5 * integrator.elasticity.mu;
        let seq = res.prediction.seq_e - mu_3_theta * res.dp;
        assert_relative_eq!(res.dp, 1e-10 * f64::powf(seq, 5.0) * dt, epsilon = 1e-12);
        assert_relative_eq!(state.internal_values[0], res.dp, epsilon = 1e-15);
        assert!(sigmaeq(state.stress.as_slice()) < res.prediction.seq_e * 2.0);
        let dt_matrix = res.stiffness.unwrap();
        assert_relative_eq!(dt_matrix[(0, 1)], dt_matrix[(1, 0)], epsilon = 1e-6);
    }

    #[test]
    fn creep_first_iteration_fallback_works() {
        // the flow can't be evaluated at the first call
        let calls = Cell::new(0);
        let rule = |seq: f64, p: f64| {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                None
            } else {
                NortonFlow { a: 1e-10, n: 5.0 }.evaluate(seq, p)
            }
        };
        let settings = NewtonSettings::new();
        let integrator = IsotropicMisesIntegrator::new(MisesFlowKind::Creep, YOUNG, NU, settings, rule).unwrap();
        let mut state = LocalState::new(2, 1).unwrap();
        // seq_e is below 0.01·young·ε_machine
        let deto = uniaxial(1e-18);
        let res = integrator
            .integrate(&mut state, &deto, 1.0, StiffnessRequest::NoStiffness)
            .unwrap();
        assert!(res.prediction.seq_e > 0.0);
        assert!(res.prediction.seq_e < 0.01 * YOUNG * f64::EPSILON);
        assert_eq!(res.prediction.n, DVector::zeros(4));
        let mu_3_theta = 3.0 * 0.5 * integrator.elasticity.mu;
        assert_eq!(res.fallbacks, 1);
        assert_relative_eq!(res.history[0], res.prediction.seq_e / (2.0 * mu_3_theta), epsilon = 1e-30);
        assert_eq!(res.status, IntegrationStatus::Success);
        assert!(res.dp.abs() < 1e-18);
    }

    #[test]
    fn plastic_works() {
        let flow = LinearHardeningFlow { r0: 100.0, h: 10e3 };
        let mut settings = NewtonSettings::new();
        settings.set_theta(1.0).unwrap();
        let integrator = IsotropicMisesIntegrator::new(MisesFlowKind::Plastic, YOUNG, NU, settings, flow).unwrap();
        // elastic step
        let mut state = LocalState::new(2, 1).unwrap();
        let res = integrator
            .integrate(&mut state, &uniaxial(1e-5), 1.0, StiffnessRequest::ConsistentTangentOperator)
            .unwrap();
        assert_eq!(res.status, IntegrationStatus::Success);
        assert_eq!(res.dp, 0.0);
        let elastic = integrator.elasticity.stiffness(2).unwrap();
        assert_relative_eq!(res.stiffness.unwrap(), elastic, epsilon = 1e-9);
        // plastic step
        let mut state = LocalState::new(2, 1).unwrap();
        let res = integrator
            .integrate(&mut state, &uniaxial(2e-3), 1.0, StiffnessRequest::NoStiffness)
            .unwrap();
        assert_eq!(res.status, IntegrationStatus::Success);
        let mu = integrator.elasticity.mu;
        let expected = (res.prediction.seq_e - 100.0) / (3.0 * mu + 10e3);
        assert_relative_eq!(res.dp, expected, epsilon = 1e-10);
        assert_relative_eq!(sigmaeq(state.stress.as_slice()), 100.0 + 10e3 * expected, epsilon = 1e-6);
    }

    #[test]
    fn strain_hardening_creep_works() {
        let rule = crate::integration::StrainHardeningNortonFlow { a: 1e-12, n: 4.0, m: 2.0 };
        let settings = NewtonSettings::new();
        let integrator =
            IsotropicMisesIntegrator::new(MisesFlowKind::StrainHardeningCreep, YOUNG, NU, settings, rule).unwrap();
        let mut state = LocalState::new(3, 1).unwrap();
        let deto = DVector::from_vec(vec![1e-3, -5e-4, -5e-4, 0.0, 0.0, 0.0]);
        let res = integrator
            .integrate(&mut state, &deto, 100.0, StiffnessRequest::ConsistentTangentOperator)
            .unwrap();
        assert_eq!(res.status, IntegrationStatus::Success);
        assert!(res.dp > 0.0);
        assert_eq!(res.stiffness.unwrap().nrows(), 6);
    }

    #[test]
    fn termination_works() {
        // a flow that never lets the residual vanish
        let rule = |_seq: f64, _p: f64| {
            Some(FlowEvaluation {
                f: 1.0,
                df_dseq: 0.0,
                df_dp: 0.0,
            })
        };
        let mut settings = NewtonSettings::new();
        settings.set_iter_max(7).unwrap();
        let integrator =
            IsotropicMisesIntegrator::new(MisesFlowKind::Plastic, YOUNG, NU, settings, rule).unwrap();
        let mut state = LocalState::new(1, 1).unwrap();
        let before = state.clone();
        let res = integrator
            .integrate(&mut state, &DVector::from_vec(vec![1e-3, 0.0, 0.0]), 1.0, StiffnessRequest::NoStiffness)
            .unwrap();
        assert_eq!(res.status, IntegrationStatus::Failure);
        assert_eq!(res.iterations, 7);
        assert_eq!(state, before);
    }

    #[test]
    fn integrate_captures_errors() {
        let settings = NewtonSettings::new();
        let norton = NortonFlow { a: 1e-10, n: 5.0 };
        let integrator = IsotropicMisesIntegrator::new(MisesFlowKind::Creep, YOUNG, NU, settings, norton).unwrap();
        let mut state = LocalState::new(2, 1).unwrap();
        assert_eq!(
            integrator
                .integrate(&mut state, &DVector::zeros(6), 1.0, StiffnessRequest::NoStiffness)
                .err(),
            Some("strain increment and state have different sizes")
        );
        let mut state = LocalState::new(2, 0).unwrap();
        assert_eq!(
            integrator
                .integrate(&mut state, &DVector::zeros(4), 1.0, StiffnessRequest::NoStiffness)
                .err(),
            Some("the state must hold the equivalent strain")
        );
    }
}
