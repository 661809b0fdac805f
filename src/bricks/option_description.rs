use super::{Data, DataMap};
use crate::base::GenError;
use serde::{Deserialize, Serialize};

/// Defines the expected type of a brick option
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum OptionType {
    /// A constant, a formula or an external law
    MaterialProperty,

    /// An array of material properties
    ArrayOfMaterialProperties,

    Boolean,

    Real,

    String,

    /// A map of data
    DataMap,

    /// A named structure: either its name or a map holding its options
    DataStructure,

    /// An array of named structures
    DataStructures,
}

impl OptionType {
    /// Returns the name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            OptionType::MaterialProperty => "material property",
            OptionType::ArrayOfMaterialProperties => "array of material properties",
            OptionType::Boolean => "boolean",
            OptionType::Real => "real",
            OptionType::String => "string",
            OptionType::DataMap => "map",
            OptionType::DataStructure => "data structure",
            OptionType::DataStructures => "array of data structures",
        }
    }

    /// Returns true if the data is of this type
    pub fn accepts(&self, data: &Data) -> bool {
        let is_structure = |d: &Data| matches!(d, Data::String(_) | Data::Map(_));
        match self {
            OptionType::MaterialProperty => matches!(data, Data::Real(_) | Data::String(_) | Data::Map(_)),
            OptionType::ArrayOfMaterialProperties => match data {
                Data::Array(items) => items
                    .iter()
                    .all(|d| matches!(d, Data::Real(_) | Data::String(_) | Data::Map(_))),
                _ => false,
            },
            OptionType::Boolean => matches!(data, Data::Boolean(_)),
            OptionType::Real => matches!(data, Data::Real(_)),
            OptionType::String => matches!(data, Data::String(_)),
            OptionType::DataMap => matches!(data, Data::Map(_)),
            OptionType::DataStructure => is_structure(data),
            OptionType::DataStructures => match data {
                Data::Array(items) => items.iter().all(is_structure),
                _ => is_structure(data),
            },
        }
    }
}

/// Describes an option accepted by a brick
#[derive(Clone, Debug, PartialEq)]
pub struct OptionDescription {
    /// Name of the option
    pub name: String,

    /// Human readable description
    pub description: String,

    /// Expected type
    pub option_type: OptionType,

    /// Options that must be given together with this one
    pub required: Vec<String>,

    /// Options that must not be given together with this one
    pub incompatible: Vec<String>,
}

impl OptionDescription {
    /// Allocates a new instance
    pub fn new(name: &str, description: &str, option_type: OptionType) -> Self {
        OptionDescription {
            name: name.to_string(),
            description: description.to_string(),
            option_type,
            required: Vec::new(),
            incompatible: Vec::new(),
        }
    }

    /// Sets the options required by this one
    pub fn requires(mut self, names: &[&str]) -> Self {
        self.required = names.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Sets the options incompatible with this one
    pub fn incompatible_with(mut self, names: &[&str]) -> Self {
        self.incompatible = names.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// Checks that some data satisfy the options of a brick
///
/// Every key must be a declared option with a matching type; the options
/// required by a given option must be given and its incompatible options
/// must be absent.
pub fn check(brick: &str, data: &DataMap, options: &[OptionDescription]) -> Result<(), GenError> {
    for (key, value) in data {
        let option = options.iter().find(|o| &o.name == key).ok_or_else(|| GenError::UnknownOption {
            brick: brick.to_string(),
            option: key.clone(),
        })?;
        if !option.option_type.accepts(value) {
            return Err(GenError::OptionTypeMismatch {
                option: key.clone(),
                expected: option.option_type.name().to_string(),
            });
        }
        if let Some(required) = option.required.iter().find(|r| !data.contains_key(r.as_str())) {
            return Err(GenError::MissingRequiredOption {
                option: key.clone(),
                required: required.clone(),
            });
        }
        if let Some(incompatible) = option.incompatible.iter().find(|i| data.contains_key(i.as_str())) {
            return Err(GenError::IncompatibleOptions {
                option: key.clone(),
                incompatible: incompatible.clone(),
            });
        }
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{check, OptionDescription, OptionType};
    use crate::base::GenError;
    use crate::bricks::{data_map, Data};

    fn options() -> Vec<OptionDescription> {
        vec![
            OptionDescription::new("C", "kinematic moduli", OptionType::MaterialProperty),
            OptionDescription::new("Phi_inf", "", OptionType::MaterialProperty).requires(&["b"]),
            OptionDescription::new("b", "", OptionType::MaterialProperty).requires(&["Phi_inf"]),
            OptionDescription::new("eta", "", OptionType::Real).incompatible_with(&["C0"]),
            OptionDescription::new("C0", "", OptionType::Real),
            OptionDescription::new("Rs", "", OptionType::ArrayOfMaterialProperties),
        ]
    }

    #[test]
    fn accepts_works() {
        assert!(OptionType::MaterialProperty.accepts(&Data::from(1.0)));
        assert!(OptionType::MaterialProperty.accepts(&Data::from("2*young")));
        assert!(!OptionType::MaterialProperty.accepts(&Data::from(true)));
        assert!(OptionType::ArrayOfMaterialProperties.accepts(&Data::Array(vec![Data::from(1.0), Data::from("a")])));
        assert!(!OptionType::ArrayOfMaterialProperties.accepts(&Data::from(1.0)));
        assert!(OptionType::DataStructure.accepts(&Data::from("Mises")));
        assert!(OptionType::DataStructures.accepts(&Data::Array(vec![Data::from("Linear")])));
    }

    #[test]
    fn check_works() {
        let d = data_map([("C", Data::from(1e3)), ("Phi_inf", Data::from(0.5)), ("b", Data::from(3.0))]);
        check("Chaboche2012", &d, &options()).unwrap();
        let d = data_map([("eta", Data::from(0.2))]);
        check("Chaboche2012", &d, &options()).unwrap();
    }

    #[test]
    fn check_captures_errors() {
        let d = data_map([("K", Data::from(1e3))]);
        assert_eq!(
            check("Prager", &d, &options()).err(),
            Some(GenError::UnknownOption {
                brick: "Prager".to_string(),
                option: "K".to_string()
            })
        );
        let d = data_map([("eta", Data::from("x"))]);
        assert_eq!(
            check("Prager", &d, &options()).err(),
            Some(GenError::OptionTypeMismatch {
                option: "eta".to_string(),
                expected: "real".to_string()
            })
        );
        let d = data_map([("Phi_inf", Data::from(0.5))]);
        assert_eq!(
            check("Prager", &d, &options()).err(),
            Some(GenError::MissingRequiredOption {
                option: "Phi_inf".to_string(),
                required: "b".to_string()
            })
        );
        let d = data_map([("eta", Data::from(0.5)), ("C0", Data::from(1.0))]);
        assert_eq!(
            check("Prager", &d, &options()).err(),
            Some(GenError::IncompatibleOptions {
                option: "eta".to_string(),
                incompatible: "C0".to_string()
            })
        );
    }
}
