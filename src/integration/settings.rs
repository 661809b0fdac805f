use crate::base::{DEFAULT_EPSILON, DEFAULT_ITER_MAX, DEFAULT_THETA};
use crate::StrError;
use std::fmt;

/// Defines the outcome of a local integration
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IntegrationStatus {
    /// The convergence criterion has been met
    Success,

    /// The maximum number of iterations has been reached (or the residual could not be evaluated)
    Failure,
}

impl fmt::Display for IntegrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationStatus::Success => write!(f, "SUCCESS"),
            IntegrationStatus::Failure => write!(f, "FAILURE"),
        }
    }
}

/// Defines the stiffness requested at the end of the integration
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StiffnessRequest {
    NoStiffness,
    Elastic,
    ConsistentTangentOperator,
}

/// Holds the numerical parameters of the local Newton loops
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewtonSettings {
    /// Implicit parameter θ ∈ [0, 1]
    pub theta: f64,

    /// Convergence criterion
    pub epsilon: f64,

    /// Maximum number of iterations
    pub iter_max: usize,
}

impl NewtonSettings {
    /// Allocates a new instance with the default values of the DSLs
    pub fn new() -> Self {
        NewtonSettings {
            theta: DEFAULT_THETA,
            epsilon: DEFAULT_EPSILON,
            iter_max: DEFAULT_ITER_MAX,
        }
    }

    /// Sets θ
    pub fn set_theta(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if !(value >= 0.0 && value <= 1.0) {
            return Err("theta must be in [0, 1]");
        }
        self.theta = value;
        Ok(self)
    }

    /// Sets the convergence criterion
    pub fn set_epsilon(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if !(value >= 0.0) {
            return Err("epsilon must be non-negative");
        }
        self.epsilon = value;
        Ok(self)
    }

    /// Sets the maximum number of iterations
    pub fn set_iter_max(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value == 0 {
            return Err("iter_max must be positive");
        }
        self.iter_max = value;
        Ok(self)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{IntegrationStatus, NewtonSettings};
    use crate::StrError;

    #[test]
    fn new_works() -> Result<(), StrError> {
        let mut settings = NewtonSettings::new();
        assert_eq!(settings.theta, 0.5);
        assert_eq!(settings.iter_max, 100);
        settings.set_theta(1.0)?.set_epsilon(1e-12)?.set_iter_max(20)?;
        assert_eq!(settings.theta, 1.0);
        assert_eq!(settings.epsilon, 1e-12);
        assert_eq!(settings.iter_max, 20);
        assert_eq!(format!("{}", IntegrationStatus::Failure), "FAILURE");
        Ok(())
    }

    #[test]
    fn setters_capture_errors() {
        let mut settings = NewtonSettings::new();
        assert_eq!(settings.set_theta(1.5).err(), Some("theta must be in [0, 1]"));
        assert_eq!(settings.set_theta(f64::NAN).err(), Some("theta must be in [0, 1]"));
        assert_eq!(settings.set_epsilon(-1.0).err(), Some("epsilon must be non-negative"));
        assert_eq!(settings.set_iter_max(0).err(), Some("iter_max must be positive"));
    }
}
