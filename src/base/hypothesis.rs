use crate::tensor::{stensor_dime_to_size, tensor_dime_to_size};
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines the modelling hypotheses
///
/// Note: The declaration order is the emission order of the per-hypothesis
/// specialisations, so it must not change.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum ModellingHypothesis {
    /// 1D axisymmetrical generalised plane strain
    AxisymmetricalGeneralisedPlaneStrain,

    /// 2D axisymmetrical
    Axisymmetrical,

    /// 2D plane stress
    PlaneStress,

    /// 2D plane strain
    PlaneStrain,

    /// 2D generalised plane strain
    GeneralisedPlaneStrain,

    /// 3D
    Tridimensional,

    /// Placeholder meaning "all hypotheses not explicitly specialised"
    Undefined,
}

impl ModellingHypothesis {
    /// Holds all defined hypotheses in emission order
    pub const ALL: [ModellingHypothesis; 6] = [
        ModellingHypothesis::AxisymmetricalGeneralisedPlaneStrain,
        ModellingHypothesis::Axisymmetrical,
        ModellingHypothesis::PlaneStress,
        ModellingHypothesis::PlaneStrain,
        ModellingHypothesis::GeneralisedPlaneStrain,
        ModellingHypothesis::Tridimensional,
    ];

    /// Returns the name used in behaviour files
    pub fn name(&self) -> &'static str {
        match self {
            ModellingHypothesis::AxisymmetricalGeneralisedPlaneStrain => "AxisymmetricalGeneralisedPlaneStrain",
            ModellingHypothesis::Axisymmetrical => "Axisymmetrical",
            ModellingHypothesis::PlaneStress => "PlaneStress",
            ModellingHypothesis::PlaneStrain => "PlaneStrain",
            ModellingHypothesis::GeneralisedPlaneStrain => "GeneralisedPlaneStrain",
            ModellingHypothesis::Tridimensional => "Tridimensional",
            ModellingHypothesis::Undefined => "Undefined",
        }
    }

    /// Returns the name of the enumeration value in generated code
    pub fn upper_case_name(&self) -> &'static str {
        match self {
            ModellingHypothesis::AxisymmetricalGeneralisedPlaneStrain => "AXISYMMETRICALGENERALISEDPLANESTRAIN",
            ModellingHypothesis::Axisymmetrical => "AXISYMMETRICAL",
            ModellingHypothesis::PlaneStress => "PLANESTRESS",
            ModellingHypothesis::PlaneStrain => "PLANESTRAIN",
            ModellingHypothesis::GeneralisedPlaneStrain => "GENERALISEDPLANESTRAIN",
            ModellingHypothesis::Tridimensional => "TRIDIMENSIONAL",
            ModellingHypothesis::Undefined => "UNDEFINEDHYPOTHESIS",
        }
    }

    /// Finds a hypothesis by its name or its upper case name
    pub fn from_name(name: &str) -> Result<Self, StrError> {
        let all = ModellingHypothesis::ALL.iter().chain([ModellingHypothesis::Undefined].iter());
        for h in all {
            if h.name() == name || h.upper_case_name() == name {
                return Ok(*h);
            }
        }
        Err("unknown modelling hypothesis")
    }

    /// Returns true unless this is the undefined hypothesis
    pub fn is_defined(&self) -> bool {
        *self != ModellingHypothesis::Undefined
    }

    /// Returns the space dimension N ∈ {1,2,3}
    pub fn space_dimension(&self) -> Result<usize, StrError> {
        match self {
            ModellingHypothesis::AxisymmetricalGeneralisedPlaneStrain => Ok(1),
            ModellingHypothesis::Axisymmetrical
            | ModellingHypothesis::PlaneStress
            | ModellingHypothesis::PlaneStrain
            | ModellingHypothesis::GeneralisedPlaneStrain => Ok(2),
            ModellingHypothesis::Tridimensional => Ok(3),
            ModellingHypothesis::Undefined => Err("the undefined hypothesis has no space dimension"),
        }
    }

    /// Returns the number of components of a symmetric tensor
    pub fn stensor_size(&self) -> Result<usize, StrError> {
        Ok(stensor_dime_to_size(self.space_dimension()?))
    }

    /// Returns the number of components of an unsymmetric tensor
    pub fn tensor_size(&self) -> Result<usize, StrError> {
        Ok(tensor_dime_to_size(self.space_dimension()?))
    }
}

impl fmt::Display for ModellingHypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::ModellingHypothesis;

    #[test]
    fn derive_works() {
        let h = ModellingHypothesis::PlaneStrain;
        let clone = h.clone();
        assert_eq!(format!("{:?}", clone), "PlaneStrain");
        assert!(ModellingHypothesis::Axisymmetrical < ModellingHypothesis::Tridimensional);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, "\"PlaneStrain\"");
        let read: ModellingHypothesis = serde_json::from_str(&json).unwrap();
        assert_eq!(read, h);
    }

    #[test]
    fn space_dimension_works() {
        for h in ModellingHypothesis::ALL {
            let n = h.space_dimension().unwrap();
            assert!(n >= 1 && n <= 3);
        }
        assert_eq!(ModellingHypothesis::AxisymmetricalGeneralisedPlaneStrain.space_dimension(), Ok(1));
        assert_eq!(ModellingHypothesis::PlaneStress.space_dimension(), Ok(2));
        assert_eq!(ModellingHypothesis::Tridimensional.space_dimension(), Ok(3));
        assert_eq!(
            ModellingHypothesis::Undefined.space_dimension().err(),
            Some("the undefined hypothesis has no space dimension")
        );
    }

    #[test]
    fn stensor_size_works() {
        assert_eq!(ModellingHypothesis::AxisymmetricalGeneralisedPlaneStrain.stensor_size(), Ok(3));
        assert_eq!(ModellingHypothesis::PlaneStrain.stensor_size(), Ok(4));
        assert_eq!(ModellingHypothesis::Tridimensional.stensor_size(), Ok(6));
        assert_eq!(ModellingHypothesis::Axisymmetrical.tensor_size(), Ok(5));
        assert_eq!(ModellingHypothesis::Tridimensional.tensor_size(), Ok(9));
    }

    #[test]
    fn from_name_works() {
        assert_eq!(
            ModellingHypothesis::from_name("PlaneStress"),
            Ok(ModellingHypothesis::PlaneStress)
        );
        assert_eq!(
            ModellingHypothesis::from_name("GENERALISEDPLANESTRAIN"),
            Ok(ModellingHypothesis::GeneralisedPlaneStrain)
        );
        assert_eq!(
            ModellingHypothesis::from_name("UNDEFINEDHYPOTHESIS"),
            Ok(ModellingHypothesis::Undefined)
        );
        assert_eq!(
            ModellingHypothesis::from_name("PlaneStrainX").err(),
            Some("unknown modelling hypothesis")
        );
        for h in ModellingHypothesis::ALL {
            assert_eq!(ModellingHypothesis::from_name(h.name()), Ok(h));
            assert_eq!(format!("{}", h), h.name());
        }
    }
}
