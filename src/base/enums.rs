use crate::StrError;
use serde::{Deserialize, Serialize};

/// Defines the symmetry of a behaviour
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum BehaviourSymmetry {
    Isotropic,
    Orthotropic,
}

impl BehaviourSymmetry {
    /// Returns the name of the enumeration value in generated code
    pub fn name(&self) -> &'static str {
        match self {
            BehaviourSymmetry::Isotropic => "ISOTROPIC",
            BehaviourSymmetry::Orthotropic => "ORTHOTROPIC",
        }
    }
}

/// Defines how the orthotropic axes are oriented with respect to the hypothesis
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum OrthotropicAxesConvention {
    /// No convention (3D only)
    Default,

    /// Axes (r, z, θ) of pipes
    Pipe,

    /// Axes (rolling, transverse, normal) of plates
    Plate,
}

impl OrthotropicAxesConvention {
    /// Returns the name used in generated code
    pub fn name(&self) -> &'static str {
        match self {
            OrthotropicAxesConvention::Default => "DEFAULT",
            OrthotropicAxesConvention::Pipe => "PIPE",
            OrthotropicAxesConvention::Plate => "PLATE",
        }
    }
}

/// Defines the kind of mechanical behaviour
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum BehaviourType {
    /// Small strain behaviour (strain `eto` / stress `sig`)
    StandardStrainBasedBehaviour,

    /// Finite strain behaviour (deformation gradient `F` / Cauchy stress `sig`)
    StandardFiniteStrainBehaviour,
}

impl BehaviourType {
    /// Returns the name of the enumeration value in generated code
    pub fn name(&self) -> &'static str {
        match self {
            BehaviourType::StandardStrainBasedBehaviour => "STANDARDSTRAINBASEDBEHAVIOUR",
            BehaviourType::StandardFiniteStrainBehaviour => "STANDARDFINITESTRAINBEHAVIOUR",
        }
    }
}

/// Defines the target solvers
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Solver {
    Ansys,
    LsDyna,
}

impl Solver {
    /// Returns the lower case name (used in file names and on the command line)
    pub fn name(&self) -> &'static str {
        match self {
            Solver::Ansys => "ansys",
            Solver::LsDyna => "lsdyna",
        }
    }

    /// Returns the upper case name (used in macros and namespaces of generated code)
    pub fn upper_case_name(&self) -> &'static str {
        match self {
            Solver::Ansys => "ANSYS",
            Solver::LsDyna => "LSDYNA",
        }
    }

    /// Finds a solver by its name
    pub fn from_name(name: &str) -> Result<Self, StrError> {
        match name.to_lowercase().as_str() {
            "ansys" => Ok(Solver::Ansys),
            "lsdyna" | "ls-dyna" => Ok(Solver::LsDyna),
            _ => Err("unknown solver interface"),
        }
    }
}

/// Defines the response to a value crossing a declared bound
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum OutOfBoundsPolicy {
    None,
    Warning,
    Strict,
}

impl OutOfBoundsPolicy {
    /// Returns the name of the enumeration value in generated code
    pub fn name(&self) -> &'static str {
        match self {
            OutOfBoundsPolicy::None => "None",
            OutOfBoundsPolicy::Warning => "Warning",
            OutOfBoundsPolicy::Strict => "Strict",
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{BehaviourSymmetry, BehaviourType, OrthotropicAxesConvention, OutOfBoundsPolicy, Solver};

    #[test]
    fn derive_works() {
        let s = BehaviourSymmetry::Orthotropic;
        let clone = s.clone();
        assert_eq!(format!("{:?}", clone), "Orthotropic");
        let json = serde_json::to_string(&Solver::LsDyna).unwrap();
        assert_eq!(json, "\"LsDyna\"");
        let read: Solver = serde_json::from_str(&json).unwrap();
        assert_eq!(read, Solver::LsDyna);
    }

    #[test]
    fn names_work() {
        assert_eq!(BehaviourSymmetry::Isotropic.name(), "ISOTROPIC");
        assert_eq!(OrthotropicAxesConvention::Plate.name(), "PLATE");
        assert_eq!(BehaviourType::StandardStrainBasedBehaviour.name(), "STANDARDSTRAINBASEDBEHAVIOUR");
        assert_eq!(Solver::Ansys.upper_case_name(), "ANSYS");
        assert_eq!(OutOfBoundsPolicy::Strict.name(), "Strict");
    }

    #[test]
    fn from_name_works() {
        assert_eq!(Solver::from_name("ANSYS"), Ok(Solver::Ansys));
        assert_eq!(Solver::from_name("ls-dyna"), Ok(Solver::LsDyna));
        assert_eq!(Solver::from_name("abaqus").err(), Some("unknown solver interface"));
    }
}
