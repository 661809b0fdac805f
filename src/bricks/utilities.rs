use super::{Data, DataMap};
use crate::base::{throw_runtime_error, BehaviourDescription, CodeBlock, CodeBlockSlot, GenError, Mode};
use crate::base::{ModellingHypothesis, OrthotropicAxesConvention, Position, VariableDescription};

/// Returns the identifier of a brick variable, e.g. `a` + flow id + kinematic id
pub fn variable_id(name: &str, fid: &str, kid: &str) -> String {
    format!("{}{}{}", name, fid, kid)
}

/// Returns the value of a variable at the middle of the time step
pub fn mid_step(name: &str) -> String {
    format!("(this->{}+(this->theta)*(this->d{}))", name, name)
}

/// Adds a local variable valid for all modelling hypotheses
pub fn add_local_variable(bd: &mut BehaviourDescription, type_name: &str, name: &str) -> Result<(), GenError> {
    bd.add_local_variable(ModellingHypothesis::Undefined, VariableDescription::new_local(type_name, name)?)
}

/// Reserves names used by the code of a brick
pub fn reserve_names(bd: &mut BehaviourDescription, names: &[String]) -> Result<(), GenError> {
    for name in names {
        bd.reserve_name(ModellingHypothesis::Undefined, name)?;
    }
    Ok(())
}

/// Appends code to a code block shared by all modelling hypotheses
pub fn append_code(bd: &mut BehaviourDescription, slot: CodeBlockSlot, code: &str, members: &[&str]) -> Result<(), GenError> {
    if code.trim().is_empty() {
        return Ok(());
    }
    bd.set_code(
        ModellingHypothesis::Undefined,
        slot,
        CodeBlock::with_members(code, members),
        Mode::CreateOrAppend,
        Position::AtEnd,
    )
}

/// Appends code to the initialization of the local variables
pub fn append_initialization_code(bd: &mut BehaviourDescription, code: &str, members: &[&str]) -> Result<(), GenError> {
    append_code(bd, CodeBlockSlot::BeforeInitializeLocalVariables, code, members)
}

/// Splits a data structure into its name and its options
///
/// A data structure is either a name (`"Mises"`) or a map holding the name
/// under the `name` key (`{"name": "Voce", "R0": 200e6, ...}`).
pub fn data_structure(option: &str, data: &Data) -> Result<(String, DataMap), GenError> {
    let mismatch = || GenError::OptionTypeMismatch {
        option: option.to_string(),
        expected: "data structure".to_string(),
    };
    match data {
        Data::String(name) => Ok((name.clone(), DataMap::new())),
        Data::Map(map) => {
            let name = map.get("name").and_then(|n| n.as_str()).ok_or_else(mismatch)?;
            let mut options = map.clone();
            options.remove("name");
            Ok((name.to_string(), options))
        }
        _ => Err(mismatch()),
    }
}

/// Splits a list of data structures (or a single one)
pub fn data_structures(option: &str, data: &Data) -> Result<Vec<(String, DataMap)>, GenError> {
    match data {
        Data::Array(items) => items.iter().map(|d| data_structure(option, d)).collect(),
        _ => Ok(vec![data_structure(option, data)?]),
    }
}

/// Returns the orthotropic axes convention used to build Hill tensors
///
/// The default convention is only valid for tridimensional behaviours.
pub fn orthotropic_axes_convention(bd: &BehaviourDescription) -> Result<String, GenError> {
    if bd.axes_convention == OrthotropicAxesConvention::Default
        && bd
            .modelling_hypotheses()
            .iter()
            .any(|h| *h != ModellingHypothesis::Tridimensional)
    {
        return Err(throw_runtime_error(
            "makeHillTensor",
            "an orthotropic axes convention must be chosen for behaviours valid in other modelling hypotheses than 'Tridimensional'",
        ));
    }
    Ok(format!(
        "tfel::material::OrthotropicAxesConvention::{}",
        bd.axes_convention.name()
    ))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
