use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Defines a map of named brick data
pub type DataMap = BTreeMap<String, Data>;

/// Holds a value given to a behaviour brick
///
/// The JSON form is untagged: `true`, `1.5`, `"young*2"`, `[1, 2]` or `{"K": 1e3}`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Data {
    Boolean(bool),
    Real(f64),
    String(String),
    Array(Vec<Data>),
    Map(DataMap),
}

impl Data {
    /// Returns a short description of the kind of value
    pub fn kind(&self) -> &'static str {
        match self {
            Data::Boolean(_) => "boolean",
            Data::Real(_) => "real",
            Data::String(_) => "string",
            Data::Array(_) => "array",
            Data::Map(_) => "map",
        }
    }

    /// Returns the boolean value, if any
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Data::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the real value, if any
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Data::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Data::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the array, if any
    pub fn as_array(&self) -> Option<&[Data]> {
        match self {
            Data::Array(a) => Some(a.as_slice()),
            _ => None,
        }
    }

    /// Returns the map, if any
    pub fn as_map(&self) -> Option<&DataMap> {
        match self {
            Data::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<f64> for Data {
    fn from(value: f64) -> Self {
        Data::Real(value)
    }
}

impl From<bool> for Data {
    fn from(value: bool) -> Self {
        Data::Boolean(value)
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Data::String(value.to_string())
    }
}

impl From<DataMap> for Data {
    fn from(value: DataMap) -> Self {
        Data::Map(value)
    }
}

/// Builds a data map from a list of pairs
pub fn data_map<const N: usize>(entries: [(&str, Data); N]) -> DataMap {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
