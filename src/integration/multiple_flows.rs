use super::{ElasticPrediction, FlowRule, IntegrationStatus, IsotropicElasticity, LocalState, NewtonSettings};
use super::{StiffnessRequest, PLASTIC_DIRECTION_THRESHOLD};
use crate::codegen::FlowKind;
use crate::StrError;
use nalgebra::{DMatrix, DVector};

/// Holds one of the flows of a [MultipleMisesFlowsIntegrator]
pub struct MisesFlow {
    /// Kind of flow
    pub kind: FlowKind,

    /// Flow rule
    pub rule: Box<dyn FlowRule>,

    /// Specific implicit parameter (the common one is used if None)
    pub theta: Option<f64>,
}

/// Holds the results of an integration with several flows
#[derive(Clone, Debug)]
pub struct MultipleFlowsIntegration {
    /// Outcome
    pub status: IntegrationStatus,

    /// Number of iterations
    pub iterations: usize,

    /// Equivalent strain increments of each flow
    pub dp: DVector<f64>,

    /// Number of iterations where the jacobian could not be inverted or a flow could not be evaluated
    pub halvings: usize,

    /// Stiffness, if requested and available
    pub stiffness: Option<DMatrix<f64>>,
}

/// Integrates a behaviour with isotropic elasticity and several Mises flows
///
/// The unknowns are the increments `dp_i` of the equivalent strains of each
/// flow. When the jacobian is singular or a flow rule can't be evaluated, the
/// increments are halved and the iteration counter still grows. The state holds `p` followed by the
/// equivalent strains `p_i` of each flow.
pub struct MultipleMisesFlowsIntegrator {
    /// Elasticity
    pub elasticity: IsotropicElasticity,

    /// Numerical parameters
    pub settings: NewtonSettings,

    /// Flows
    pub flows: Vec<MisesFlow>,
}

impl MultipleMisesFlowsIntegrator {
    /// Allocates a new instance
    pub fn new(young: f64, nu: f64, settings: NewtonSettings, flows: Vec<MisesFlow>) -> Result<Self, StrError> {
        if flows.is_empty() {
            return Err("at least one flow is required");
        }
        if flows.iter().any(|f| match f.theta {
            Some(t) => !(t >= 0.0 && t <= 1.0),
            None => false,
        }) {
            return Err("theta must be in [0, 1]");
        }
        Ok(MultipleMisesFlowsIntegrator {
            elasticity: IsotropicElasticity::new(young, nu)?,
            settings,
            flows,
        })
    }

    fn theta(&self, i: usize) -> f64 {
        self.flows[i].theta.unwrap_or(self.settings.theta)
    }

    /// Integrates over a time step
    ///
    /// Only the elastic stiffness is available. The state is updated only on success.
    pub fn integrate(
        &self,
        state: &mut LocalState,
        deto: &DVector<f64>,
        dt: f64,
        request: StiffnessRequest,
    ) -> Result<MultipleFlowsIntegration, StrError> {
        let k = self.flows.len();
        if deto.len() != state.size() {
            return Err("strain increment and state have different sizes");
        }
        if state.internal_values.len() != k + 1 {
            return Err("the state must hold p and the equivalent strain of each flow");
        }
        let young = self.elasticity.young;
        let newton_epsilon = 100.0 * f64::EPSILON;
        let prediction = ElasticPrediction::new(
            &state.elastic_strain,
            deto,
            self.settings.theta,
            &self.elasticity,
            PLASTIC_DIRECTION_THRESHOLD,
        );
        let seq_e: Vec<f64> = (0..k)
            .map(|i| match self.flows[i].theta {
                Some(t) => {
                    ElasticPrediction::new(&state.elastic_strain, deto, t, &self.elasticity, PLASTIC_DIRECTION_THRESHOLD)
                        .seq_e
                }
                None => prediction.seq_e,
            })
            .collect();
        let mut vdp = DVector::<f64>::zeros(k);
        let mut newton_f = DVector::<f64>::zeros(k);
        let mut newton_df = DMatrix::<f64>::zeros(k, k);
        let mut iter = 0;
        let mut halvings = 0;
        let mut converged = false;
        while !converged && iter < self.settings.iter_max {
            let sum = vdp.sum();
            let mut evaluated = true;
            for i in 0..k {
                let theta = self.theta(i);
                let mu_3_theta = 3.0 * theta * self.elasticity.mu;
                let p_ = state.internal_values[i + 1] + theta * vdp[i];
                let seq = f64::max(seq_e[i] - mu_3_theta * sum, 0.0);
                let ev = match self.flows[i].rule.evaluate(seq, p_) {
                    Some(ev) if ev.is_finite() => ev,
                    _ => {
                        evaluated = false;
                        break;
                    }
                };
                match self.flows[i].kind {
                    FlowKind::PlasticFlow => {
                        let surf = ev.f / young;
                        if (surf > newton_epsilon && vdp[i] >= 0.0) || vdp[i] > newton_epsilon {
                            newton_f[i] = surf;
                            for j in 0..k {
                                newton_df[(i, j)] = -mu_3_theta * ev.df_dseq / young;
                            }
                            newton_df[(i, i)] = (theta * ev.df_dp - mu_3_theta * ev.df_dseq) / young;
                        } else {
                            newton_f[i] = vdp[i];
                            for j in 0..k {
                                newton_df[(i, j)] = 0.0;
                            }
                            newton_df[(i, i)] = 1.0;
                        }
                    }
                    FlowKind::CreepFlow | FlowKind::StrainHardeningCreepFlow => {
                        newton_f[i] = vdp[i] - ev.f * dt;
                        for j in 0..k {
                            newton_df[(i, j)] = mu_3_theta * ev.df_dseq * dt;
                        }
                        newton_df[(i, i)] = if self.flows[i].kind == FlowKind::CreepFlow {
                            1.0 + mu_3_theta * ev.df_dseq * dt
                        } else {
                            1.0 - dt * (theta * ev.df_dp - mu_3_theta * ev.df_dseq)
                        };
                    }
                }
            }
            if !evaluated {
                vdp /= 2.0;
                halvings += 1;
                iter += 1;
                continue;
            }
            let error = newton_f.iter().map(|v| v.abs()).sum::<f64>();
            match newton_df.clone().lu().solve(&newton_f) {
                Some(correction) => vdp -= correction,
                None => {
                    vdp /= 2.0;
                    halvings += 1;
                }
            }
            iter += 1;
            converged = error / (k as f64) < self.settings.epsilon;
        }
        let mut results = MultipleFlowsIntegration {
            status: IntegrationStatus::Failure,
            iterations: iter,
            dp: vdp,
            halvings,
            stiffness: None,
        };
        if !converged {
            return Ok(results);
        }
        match request {
            StiffnessRequest::NoStiffness => (),
            StiffnessRequest::Elastic => results.stiffness = Some(self.elasticity.stiffness(state.space_dimension())?),
            StiffnessRequest::ConsistentTangentOperator => return Ok(results),
        }
        let dp = results.dp.sum();
        let deel = deto - &prediction.n * dp;
        state.elastic_strain += deel;
        state.internal_values[0] += dp;
        for i in 0..k {
            state.internal_values[i + 1] += results.dp[i];
        }
        state.stress = self.elasticity.stress(&state.elastic_strain);
        results.status = IntegrationStatus::Success;
        Ok(results)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
