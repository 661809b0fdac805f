use super::{append_initialization_code, orthotropic_axes_convention, Data, DataMap};
use crate::base::{throw_runtime_error, BehaviourDescription, GenError};
use crate::base::{ModellingHypothesis, VariableCategory, VariableDescription};
use crate::codegen::{real_literal, rewrite_identifiers};
use serde::{Deserialize, Serialize};

/// Defines how an input of a material property is evaluated in the generated code
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum InputCategory {
    /// The temperature, taken at the middle of the time step
    Temperature,

    MaterialProperty,

    Parameter,

    /// An external state variable, taken at the middle of the time step
    ExternalStateVariable,

    /// An auxiliary state variable, taken at the beginning of the time step
    AuxiliaryStateVariable,

    /// A static variable (constant of the behaviour)
    StaticVariable,
}

impl InputCategory {
    /// Returns the name of the category
    pub fn name(&self) -> &'static str {
        match self {
            InputCategory::Temperature => "TEMPERATURE",
            InputCategory::MaterialProperty => "MATERIALPROPERTY",
            InputCategory::Parameter => "PARAMETER",
            InputCategory::ExternalStateVariable => "EXTERNALSTATEVARIABLE",
            InputCategory::AuxiliaryStateVariable => "AUXILIARYSTATEVARIABLE",
            InputCategory::StaticVariable => "STATICVARIABLE",
        }
    }

    /// Finds the category of a member of a behaviour
    pub fn of(bd: &BehaviourDescription, name: &str) -> Result<Self, GenError> {
        if name == "T" {
            return Ok(InputCategory::Temperature);
        }
        let data = bd.data(ModellingHypothesis::Undefined);
        match data.find_variable(name) {
            Some((VariableCategory::MaterialProperty, _)) => Ok(InputCategory::MaterialProperty),
            Some((VariableCategory::Parameter, _)) => Ok(InputCategory::Parameter),
            Some((VariableCategory::ExternalStateVariable, _)) => Ok(InputCategory::ExternalStateVariable),
            Some((VariableCategory::AuxiliaryStateVariable, _)) => Ok(InputCategory::AuxiliaryStateVariable),
            Some((VariableCategory::LocalVariable, _)) => Ok(InputCategory::StaticVariable),
            _ => Err(GenError::UnknownVariable(name.to_string())),
        }
    }

    /// Returns the expression of an input of this category at the middle of the time step
    pub fn expression(&self, name: &str) -> String {
        match self {
            InputCategory::Temperature | InputCategory::ExternalStateVariable => {
                format!("(this->{}+(this->theta)*(this->d{}))", name, name)
            }
            _ => format!("this->{}", name),
        }
    }
}

/// Holds a material property given to a brick
#[derive(Clone, Debug, PartialEq)]
pub enum MaterialProperty {
    /// Constant value, declared as a parameter
    Constant(f64),

    /// Formula using members of the behaviour (and `T`)
    Formula(String),

    /// External material law called with the given members as arguments
    External { law: String, inputs: Vec<String> },
}

impl MaterialProperty {
    /// Reads a material property
    ///
    /// A number is a constant, a string a formula, and a map `{"law": ..., "inputs": [...]}`
    /// an external law.
    pub fn from_data(name: &str, data: &Data) -> Result<Self, GenError> {
        match data {
            Data::Real(v) => Ok(MaterialProperty::Constant(*v)),
            Data::String(f) => Ok(MaterialProperty::Formula(f.clone())),
            Data::Map(m) => {
                let law = m.get("law").and_then(|d| d.as_str()).ok_or_else(|| GenError::OptionTypeMismatch {
                    option: name.to_string(),
                    expected: "external law".to_string(),
                })?;
                let mut inputs = Vec::new();
                if let Some(list) = m.get("inputs") {
                    let list = list.as_array().ok_or_else(|| GenError::OptionTypeMismatch {
                        option: format!("{}.inputs", name),
                        expected: "array".to_string(),
                    })?;
                    for input in list {
                        let input = input.as_str().ok_or_else(|| GenError::OptionTypeMismatch {
                            option: format!("{}.inputs", name),
                            expected: "string".to_string(),
                        })?;
                        inputs.push(input.to_string());
                    }
                }
                Ok(MaterialProperty::External {
                    law: law.to_string(),
                    inputs,
                })
            }
            _ => Err(GenError::OptionTypeMismatch {
                option: name.to_string(),
                expected: "material property".to_string(),
            }),
        }
    }

    /// Reads a required material property from the data of a brick
    pub fn required(brick: &str, d: &DataMap, name: &str) -> Result<Self, GenError> {
        let data = d.get(name).ok_or_else(|| {
            throw_runtime_error(
                &format!("{}::initialize", brick),
                &format!("material property '{}' is not defined", name),
            )
        })?;
        MaterialProperty::from_data(name, data)
    }

    /// Reads an optional material property from the data of a brick
    pub fn optional(d: &DataMap, name: &str) -> Result<Option<Self>, GenError> {
        d.get(name).map(|data| MaterialProperty::from_data(name, data)).transpose()
    }

    /// Reads a material property, using a constant if it is not given
    pub fn or_constant(d: &DataMap, name: &str, value: f64) -> Result<Self, GenError> {
        Ok(MaterialProperty::optional(d, name)?.unwrap_or(MaterialProperty::Constant(value)))
    }

    /// Returns true if the property is a constant
    pub fn is_constant(&self) -> bool {
        matches!(self, MaterialProperty::Constant(_))
    }

    /// Declares the member holding the property
    ///
    /// Constants become parameters; other properties become local variables
    /// evaluated by [MaterialProperty::initialization_code].
    pub fn declare(&self, bd: &mut BehaviourDescription, type_name: &str, id: &str) -> Result<(), GenError> {
        let h = ModellingHypothesis::Undefined;
        let variable = VariableDescription::new(type_name, id)?;
        match self {
            MaterialProperty::Constant(value) => bd.add_parameter(h, variable, *value),
            _ => bd.add_local_variable(h, variable),
        }
    }

    /// Returns the code evaluating the property at the middle of the time step
    pub fn initialization_code(&self, bd: &BehaviourDescription, id: &str) -> Result<String, GenError> {
        match self {
            MaterialProperty::Constant(_) => Ok(String::new()),
            MaterialProperty::Formula(formula) => {
                let data = bd.data(ModellingHypothesis::Undefined);
                let mut error = None;
                let rhs = rewrite_identifiers(formula, |word| {
                    if word == "T" || data.find_variable(word).is_some() {
                        match InputCategory::of(bd, word) {
                            Ok(c) => Some(c.expression(word)),
                            Err(e) => {
                                error.get_or_insert(e);
                                None
                            }
                        }
                    } else {
                        None
                    }
                });
                match error {
                    Some(e) => Err(e),
                    None => Ok(format!("this->{} = {};\n", id, rhs)),
                }
            }
            MaterialProperty::External { law, inputs } => {
                let mut args = Vec::new();
                for input in inputs {
                    args.push(InputCategory::of(bd, input)?.expression(input));
                }
                Ok(format!("this->{} = {}({});\n", id, law, args.join(",")))
            }
        }
    }
}

/// Declares a list of material properties and writes their initialization
///
/// Each entry is (property, type, identifier).
pub fn declare_material_properties(
    bd: &mut BehaviourDescription,
    properties: &[(&MaterialProperty, &str, String)],
) -> Result<(), GenError> {
    for (mp, type_name, id) in properties {
        mp.declare(bd, type_name, id)?;
    }
    let mut code = String::new();
    let mut members = Vec::new();
    for (mp, _, id) in properties {
        let c = mp.initialization_code(bd, id)?;
        if !c.is_empty() {
            members.push(id.as_str());
            code.push_str(&c);
        }
    }
    append_initialization_code(bd, &code, &members)
}

/// Holds the six coefficients of a Hill tensor, declared as a local array
#[derive(Clone, Debug, PartialEq)]
pub struct HillCoefficients {
    /// Coefficients
    pub values: Vec<MaterialProperty>,
}

impl HillCoefficients {
    /// Reads the coefficients from an array of material properties
    pub fn from_data(name: &str, d: &DataMap) -> Result<Self, GenError> {
        let items = d.get(name).and_then(|x| x.as_array()).ok_or_else(|| GenError::OptionTypeMismatch {
            option: name.to_string(),
            expected: "array of 6 material properties".to_string(),
        })?;
        if items.len() != 6 {
            return Err(GenError::OptionTypeMismatch {
                option: name.to_string(),
                expected: "array of 6 material properties".to_string(),
            });
        }
        let mut values = Vec::new();
        for item in items {
            values.push(MaterialProperty::from_data(name, item)?);
        }
        Ok(HillCoefficients { values })
    }

    /// Declares the local array `<id>_coefficients` and the Hill tensor `<id>`
    pub fn declare(&self, bd: &mut BehaviourDescription, id: &str) -> Result<(), GenError> {
        let h = ModellingHypothesis::Undefined;
        let coefficients = format!("{}_coefficients", id);
        let convention = orthotropic_axes_convention(bd)?;
        let mut code = String::new();
        for (i, mp) in self.values.iter().enumerate() {
            let c = match mp {
                MaterialProperty::Constant(v) => format!("this->{}[{}] = {};\n", coefficients, i, real_literal(*v)),
                _ => mp.initialization_code(bd, &format!("{}[{}]", coefficients, i))?,
            };
            code.push_str(&c);
        }
        code.push_str(&format!("this->{} = makeHillTensor<hypothesis, {}, real>(", id, convention));
        let args: Vec<String> = (0..6).map(|i| format!("this->{}[{}]", coefficients, i)).collect();
        code.push_str(&args.join(",\n"));
        code.push_str(");\n");
        let array = VariableDescription::new_array("real", &coefficients, 6)?;
        let tensor = VariableDescription::new_local("Stensor4", id)?;
        bd.transaction(|bd| {
            bd.add_local_variable(h, array)?;
            bd.add_local_variable(h, tensor)?;
            append_initialization_code(bd, &code, &[id, &coefficients])
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
