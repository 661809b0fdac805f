use crate::StrError;
use thiserror::Error;

/// Holds the errors raised while describing or generating a behaviour
///
/// Generation is all-or-nothing: any of these errors aborts the generation
/// of the current behaviour.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenError {
    /// Simple validation message
    #[error("{0}")]
    Message(StrError),

    /// Unrecoverable generation error reported by a generator method
    #[error("{0}")]
    Runtime(String),

    #[error("unsupported type '{0}'")]
    UnsupportedType(String),

    #[error("invalid array size {size} for variable '{name}'")]
    InvalidArraySize { name: String, size: usize },

    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("the name '{0}' has already been registered")]
    NameAlreadyRegistered(String),

    #[error("the name '{0}' is reserved")]
    ReservedName(String),

    #[error("no variable named '{0}'")]
    UnknownVariable(String),

    #[error("no code block '{slot}' defined for hypothesis '{hypothesis}'")]
    MissingCodeBlock { slot: String, hypothesis: String },

    #[error("code block '{0}' is already defined")]
    CodeBlockAlreadyDefined(String),

    #[error("'{brick}' does not expect option '{option}'")]
    UnknownOption { brick: String, option: String },

    #[error("option '{option}' is expected to be a {expected}")]
    OptionTypeMismatch { option: String, expected: String },

    #[error("option '{option}' requires option '{required}'")]
    MissingRequiredOption { option: String, required: String },

    #[error("option '{option}' is incompatible with option '{incompatible}'")]
    IncompatibleOptions { option: String, incompatible: String },

    #[error("modelling hypothesis '{0}' is not supported")]
    UnsupportedHypothesis(String),

    #[error("isotropic elasticity requires exactly 2 elastic material properties ({0} given)")]
    InvalidElasticPropertiesCount(usize),

    #[error("gradient '{gradient}' and thermodynamic force '{force}' have different array sizes")]
    MainVariablesArraySizeMismatch { gradient: String, force: String },

    #[error("derivative of 'f{residual}' with respect to '{unknown}' is missing")]
    MissingDerivativeTerm { residual: String, unknown: String },

    #[error("'{0}' is not the derivative of a residual with respect to an unknown")]
    UnknownDerivative(String),

    #[error("invalid value for parameter '{name}': {reason}")]
    InvalidParameterValue { name: String, reason: StrError },

    #[error("the legacy behaviour emitter is deprecated and not available")]
    DeprecatedLegacyEmitter,

    #[error("cannot write '{path}': {message}")]
    Io { path: String, message: String },

    #[error("invalid behaviour file: {0}")]
    InvalidBehaviourFile(String),
}

impl From<StrError> for GenError {
    fn from(message: StrError) -> Self {
        GenError::Message(message)
    }
}

impl From<serde_json::Error> for GenError {
    fn from(err: serde_json::Error) -> Self {
        GenError::InvalidBehaviourFile(err.to_string())
    }
}

/// Returns the uniform generation error, prefixed by the reporting method
///
/// This is the single reporting channel of the generators.
pub fn throw_runtime_error(method: &str, message: &str) -> GenError {
    GenError::Runtime(format!("{}: {}", method, message))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
