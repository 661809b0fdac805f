use crate::StrError;
use thiserror::Error;

/// Return code of a successful call
pub const SUCCESS_RETURN_CODE: i32 = 0;

/// Holds the errors raised while a solver calls a behaviour
///
/// Each error belongs to an exception category mapped to a negative return
/// code (see [InterfaceError::return_code]). Contract errors are library
/// exceptions: they signal a packaging mistake and must not be retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterfaceError {
    #[error("{behaviour}: unmatched number of material properties (expected {expected}, given {given})")]
    UnmatchedNumberOfMaterialProperties {
        behaviour: String,
        expected: usize,
        given: usize,
    },

    #[error("{behaviour}: unmatched number of state variables (expected {expected}, given {given})")]
    UnmatchedNumberOfStateVariables {
        behaviour: String,
        expected: usize,
        given: usize,
    },

    #[error("{behaviour}: invalid tensor size (expected {expected}, given {given})")]
    InvalidTensorSize {
        behaviour: String,
        expected: usize,
        given: usize,
    },

    #[error("{behaviour}: invalid modelling hypothesis '{hypothesis}'")]
    InvalidModellingHypothesis { behaviour: String, hypothesis: String },

    #[error("{0}: negative time step")]
    NegativeTimeStep(String),

    #[error("{0}: consistent tangent operator is not available")]
    ConsistentTangentOperatorNotAvailable(String),

    #[error("{0}: stress free expansion is not supported")]
    UnsupportedStressFreeExpansion(String),

    #[error("no stiffness tensor formula for {0}")]
    MissingStiffnessTensor(String),

    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    #[error("{0}: integration failed")]
    Divergence(String),

    #[error("material exception: {0}")]
    Material(String),

    #[error("{0}")]
    Tfel(String),

    #[error("standard exception: {0}")]
    Std(String),

    #[error("unknown exception")]
    Unknown,
}

impl InterfaceError {
    /// Returns the code passed back to the solver
    ///
    /// | code | category |
    /// |------|----------|
    /// | -2 | library exception (contract errors) |
    /// | -3 | out of bounds |
    /// | -4 | divergence |
    /// | -5 | material exception |
    /// | -6 | TFEL exception |
    /// | -7 | standard exception |
    /// | -8 | unknown exception |
    pub fn return_code(&self) -> i32 {
        match self {
            InterfaceError::UnmatchedNumberOfMaterialProperties { .. }
            | InterfaceError::UnmatchedNumberOfStateVariables { .. }
            | InterfaceError::InvalidTensorSize { .. }
            | InterfaceError::InvalidModellingHypothesis { .. }
            | InterfaceError::NegativeTimeStep(..)
            | InterfaceError::ConsistentTangentOperatorNotAvailable(..)
            | InterfaceError::UnsupportedStressFreeExpansion(..)
            | InterfaceError::MissingStiffnessTensor(..) => -2,
            InterfaceError::OutOfBounds(..) => -3,
            InterfaceError::Divergence(..) => -4,
            InterfaceError::Material(..) => -5,
            InterfaceError::Tfel(..) => -6,
            InterfaceError::Std(..) => -7,
            InterfaceError::Unknown => -8,
        }
    }

    /// Returns true if the solver may retry with a smaller time step
    pub fn is_retryable(&self) -> bool {
        matches!(self, InterfaceError::Divergence(..) | InterfaceError::OutOfBounds(..))
    }
}

impl From<StrError> for InterfaceError {
    fn from(message: StrError) -> Self {
        InterfaceError::Tfel(message.to_string())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::InterfaceError;

    #[test]
    fn return_code_works() {
        let contract = InterfaceError::UnmatchedNumberOfMaterialProperties {
            behaviour: "Norton".to_string(),
            expected: 2,
            given: 3,
        };
        assert_eq!(contract.return_code(), -2);
        assert!(!contract.is_retryable());
        assert_eq!(InterfaceError::OutOfBounds("T".to_string()).return_code(), -3);
        let divergence = InterfaceError::Divergence("Norton".to_string());
        assert_eq!(divergence.return_code(), -4);
        assert!(divergence.is_retryable());
        assert_eq!(InterfaceError::Material(String::new()).return_code(), -5);
        assert_eq!(InterfaceError::Tfel(String::new()).return_code(), -6);
        assert_eq!(InterfaceError::Std(String::new()).return_code(), -7);
        assert_eq!(InterfaceError::Unknown.return_code(), -8);
    }

    #[test]
    fn display_works() {
        let err = InterfaceError::InvalidTensorSize {
            behaviour: "Norton".to_string(),
            expected: 6,
            given: 4,
        };
        assert_eq!(format!("{}", err), "Norton: invalid tensor size (expected 6, given 4)");
        let err: InterfaceError = "matrix is singular".into();
        assert_eq!(err, InterfaceError::Tfel("matrix is singular".to_string()));
        assert_eq!(format!("{}", err), "matrix is singular");
    }
}
