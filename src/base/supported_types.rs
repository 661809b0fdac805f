use super::GenError;
use crate::tensor::{stensor_dime_to_size, tensor_dime_to_size};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul};

/// Defines the maximum array size of a variable
pub const ARRAY_SIZE_LIMIT: usize = 10;

/// Defines the mathematical nature of a type
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum TypeFlag {
    Scalar,
    TVector,
    Stensor,
    Tensor,
}

impl TypeFlag {
    /// Returns the name used in generated code
    pub fn name(&self) -> &'static str {
        match self {
            TypeFlag::Scalar => "Scalar",
            TypeFlag::TVector => "TVector",
            TypeFlag::Stensor => "Stensor",
            TypeFlag::Tensor => "Tensor",
        }
    }
}

/// Holds the names of the types accepted in behaviour descriptions
const SUPPORTED_TYPES: [(&str, TypeFlag); 21] = [
    ("real", TypeFlag::Scalar),
    ("frequency", TypeFlag::Scalar),
    ("stress", TypeFlag::Scalar),
    ("strain", TypeFlag::Scalar),
    ("strainrate", TypeFlag::Scalar),
    ("temperature", TypeFlag::Scalar),
    ("energy_density", TypeFlag::Scalar),
    ("thermalexpansion", TypeFlag::Scalar),
    ("density", TypeFlag::Scalar),
    ("DstrainDt", TypeFlag::Scalar),
    ("DF_DSEQ_TYPE", TypeFlag::Scalar),
    ("TVector", TypeFlag::TVector),
    ("DisplacementTVector", TypeFlag::TVector),
    ("ForceTVector", TypeFlag::TVector),
    ("Stensor", TypeFlag::Stensor),
    ("StressStensor", TypeFlag::Stensor),
    ("StressRateStensor", TypeFlag::Stensor),
    ("StrainStensor", TypeFlag::Stensor),
    ("StrainRateStensor", TypeFlag::Stensor),
    ("Tensor", TypeFlag::Tensor),
    ("DeformationGradientTensor", TypeFlag::Tensor),
];

/// Holds the types only accepted for local variables (they do not enter the integration data)
const LOCAL_ONLY_TYPES: [&str; 3] = ["bool", "Stensor4", "StiffnessTensor"];

/// Returns true if the type may only be used by local variables
///
/// Besides the types listed above, the parameters of the standard stress
/// criteria (e.g. `Mises1StressCriterionParameters<StressStensor>`) are accepted.
pub fn is_local_only_type(type_name: &str) -> bool {
    LOCAL_ONLY_TYPES.contains(&type_name) || type_name.ends_with("StressCriterionParameters<StressStensor>")
}

/// Returns the flag of a supported type
pub fn type_flag(type_name: &str) -> Result<TypeFlag, GenError> {
    SUPPORTED_TYPES
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, flag)| *flag)
        .ok_or_else(|| GenError::UnsupportedType(type_name.to_string()))
}

/// Returns true if the type can be used in a behaviour description
pub fn is_supported_type(type_name: &str) -> bool {
    SUPPORTED_TYPES.iter().any(|(name, _)| *name == type_name)
}

/// Holds a size that depends on the (still unknown) space dimension
///
/// The size is `scalar + tvector·N + stensor·StensorSize + tensor·TensorSize`;
/// it is printed symbolically in generated code (e.g. `1+StensorSize`) and
/// evaluated once a modelling hypothesis is chosen.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct TypeSize {
    /// Number of scalars
    pub scalar: u16,

    /// Number of vectors
    pub tvector: u16,

    /// Number of symmetric tensors
    pub stensor: u16,

    /// Number of unsymmetric tensors
    pub tensor: u16,
}

impl TypeSize {
    /// Allocates a new instance
    pub fn new(scalar: u16, tvector: u16, stensor: u16, tensor: u16) -> Self {
        TypeSize {
            scalar,
            tvector,
            stensor,
            tensor,
        }
    }

    /// Returns the size of an array of the given type
    pub fn of(type_name: &str, array_size: usize) -> Result<Self, GenError> {
        let n = array_size as u16;
        let size = match type_flag(type_name)? {
            TypeFlag::Scalar => TypeSize::new(n, 0, 0, 0),
            TypeFlag::TVector => TypeSize::new(0, n, 0, 0),
            TypeFlag::Stensor => TypeSize::new(0, 0, n, 0),
            TypeFlag::Tensor => TypeSize::new(0, 0, 0, n),
        };
        Ok(size)
    }

    /// Evaluates the size for a given space dimension
    pub fn value_for_dimension(&self, n: usize) -> usize {
        self.scalar as usize
            + self.tvector as usize * n
            + self.stensor as usize * stensor_dime_to_size(n)
            + self.tensor as usize * tensor_dime_to_size(n)
    }

    /// Returns true if all counters are zero
    pub fn is_null(&self) -> bool {
        self.scalar == 0 && self.tvector == 0 && self.stensor == 0 && self.tensor == 0
    }
}

impl Add for TypeSize {
    type Output = TypeSize;
    fn add(self, rhs: TypeSize) -> TypeSize {
        TypeSize::new(
            self.scalar + rhs.scalar,
            self.tvector + rhs.tvector,
            self.stensor + rhs.stensor,
            self.tensor + rhs.tensor,
        )
    }
}

impl AddAssign for TypeSize {
    fn add_assign(&mut self, rhs: TypeSize) {
        *self = *self + rhs;
    }
}

impl Mul<u16> for TypeSize {
    type Output = TypeSize;
    fn mul(self, rhs: u16) -> TypeSize {
        TypeSize::new(self.scalar * rhs, self.tvector * rhs, self.stensor * rhs, self.tensor * rhs)
    }
}

impl fmt::Display for TypeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut terms = Vec::new();
        if self.scalar != 0 {
            terms.push(format!("{}", self.scalar));
        }
        for (count, name) in [
            (self.tvector, "TVectorSize"),
            (self.stensor, "StensorSize"),
            (self.tensor, "TensorSize"),
        ] {
            match count {
                0 => (),
                1 => terms.push(name.to_string()),
                _ => terms.push(format!("{}*{}", count, name)),
            }
        }
        if terms.is_empty() {
            write!(f, "0u")
        } else {
            write!(f, "{}", terms.join("+"))
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
