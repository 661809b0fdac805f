use super::{is_local_only_type, type_flag, GenError, TypeFlag, TypeSize, ARRAY_SIZE_LIMIT};
use serde::{Deserialize, Serialize};

/// Defines the collections a variable may belong to
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum VariableCategory {
    MaterialProperty,
    StateVariable,
    IntegrationVariable,
    AuxiliaryStateVariable,
    ExternalStateVariable,
    LocalVariable,
    Parameter,
}

impl VariableCategory {
    /// Returns a human readable name
    pub fn name(&self) -> &'static str {
        match self {
            VariableCategory::MaterialProperty => "material property",
            VariableCategory::StateVariable => "state variable",
            VariableCategory::IntegrationVariable => "integration variable",
            VariableCategory::AuxiliaryStateVariable => "auxiliary state variable",
            VariableCategory::ExternalStateVariable => "external state variable",
            VariableCategory::LocalVariable => "local variable",
            VariableCategory::Parameter => "parameter",
        }
    }

    /// Indicates that the variable has an increment `d<name>`
    pub fn has_increment(&self) -> bool {
        matches!(
            self,
            VariableCategory::StateVariable | VariableCategory::IntegrationVariable | VariableCategory::ExternalStateVariable
        )
    }
}

/// Holds lower and/or upper bounds of a scalar variable (or of each component)
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Bounds {
    /// Lower bound
    pub lower: Option<f64>,

    /// Upper bound
    pub upper: Option<f64>,
}

impl Bounds {
    /// Returns bounds with a lower value only
    pub fn lower(value: f64) -> Self {
        Bounds {
            lower: Some(value),
            upper: None,
        }
    }

    /// Returns bounds with both values
    pub fn range(lower: f64, upper: f64) -> Self {
        Bounds {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Checks a value
    pub fn contains(&self, value: f64) -> bool {
        if let Some(l) = self.lower {
            if value < l {
                return false;
            }
        }
        if let Some(u) = self.upper {
            if value > u {
                return false;
            }
        }
        true
    }
}

/// Describes a variable of a behaviour
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct VariableDescription {
    /// Type name (see the supported types)
    pub type_name: String,

    /// Name of the variable in generated code
    pub name: String,

    /// Array size (1 for a plain variable)
    pub array_size: usize,

    /// Glossary name used by solvers, if any
    pub glossary_name: Option<String>,

    /// Entry name used when no glossary name applies
    pub entry_name: Option<String>,

    /// Bounds checked according to the out-of-bounds policy
    pub bounds: Option<Bounds>,

    /// Physical bounds, always checked
    pub physical_bounds: Option<Bounds>,
}

impl VariableDescription {
    /// Allocates a new instance
    pub fn new(type_name: &str, name: &str) -> Result<Self, GenError> {
        type_flag(type_name)?;
        if !is_valid_identifier(name) {
            return Err(GenError::InvalidIdentifier(name.to_string()));
        }
        Ok(VariableDescription {
            type_name: type_name.to_string(),
            name: name.to_string(),
            array_size: 1,
            glossary_name: None,
            entry_name: None,
            bounds: None,
            physical_bounds: None,
        })
    }

    /// Allocates a new local variable whose type may be a local-only type (`bool`, `Stensor4`)
    pub fn new_local(type_name: &str, name: &str) -> Result<Self, GenError> {
        if !is_local_only_type(type_name) {
            return VariableDescription::new(type_name, name);
        }
        if !is_valid_identifier(name) {
            return Err(GenError::InvalidIdentifier(name.to_string()));
        }
        Ok(VariableDescription {
            type_name: type_name.to_string(),
            name: name.to_string(),
            array_size: 1,
            glossary_name: None,
            entry_name: None,
            bounds: None,
            physical_bounds: None,
        })
    }

    /// Allocates a new array variable
    pub fn new_array(type_name: &str, name: &str, array_size: usize) -> Result<Self, GenError> {
        if array_size == 0 || array_size > ARRAY_SIZE_LIMIT {
            return Err(GenError::InvalidArraySize {
                name: name.to_string(),
                size: array_size,
            });
        }
        let mut v = VariableDescription::new(type_name, name)?;
        v.array_size = array_size;
        Ok(v)
    }

    /// Sets the glossary name
    pub fn with_glossary_name(mut self, glossary_name: &str) -> Self {
        self.glossary_name = Some(glossary_name.to_string());
        self
    }

    /// Sets the entry name
    pub fn with_entry_name(mut self, entry_name: &str) -> Self {
        self.entry_name = Some(entry_name.to_string());
        self
    }

    /// Sets the bounds
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Sets the physical bounds
    pub fn with_physical_bounds(mut self, bounds: Bounds) -> Self {
        self.physical_bounds = Some(bounds);
        self
    }

    /// Returns the name seen by solvers
    pub fn external_name(&self) -> &str {
        if let Some(n) = &self.glossary_name {
            return n;
        }
        if let Some(n) = &self.entry_name {
            return n;
        }
        &self.name
    }

    /// Returns the flag of the underlying type
    pub fn type_flag(&self) -> TypeFlag {
        // the type was validated at construction
        type_flag(&self.type_name).unwrap_or(TypeFlag::Scalar)
    }

    /// Returns the symbolic size of the variable
    pub fn size(&self) -> TypeSize {
        TypeSize::of(&self.type_name, self.array_size).unwrap_or_default()
    }

    /// Returns true for a plain scalar
    pub fn is_scalar(&self) -> bool {
        self.array_size == 1 && self.type_flag() == TypeFlag::Scalar
    }

    /// Returns the type used in a declaration, e.g. `tfel::math::fsarray<3u, stress>`
    pub fn declaration_type(&self) -> String {
        if self.array_size == 1 {
            self.type_name.clone()
        } else {
            format!("tfel::math::fsarray<{}u, {}>", self.array_size, self.type_name)
        }
    }
}

/// Returns the total symbolic size of a list of variables
pub fn total_size(variables: &[VariableDescription]) -> TypeSize {
    variables.iter().fold(TypeSize::default(), |acc, v| acc + v.size())
}

/// Checks that a name is a valid C++ identifier
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => (),
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
