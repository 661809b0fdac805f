use super::{BehaviourData, Bounds, GenError};
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds the values of the parameters of a behaviour
///
/// This is the explicit, process-wide configuration object handed to the
/// generated behaviours (as a `<Behaviour>Parameters` structure passed by
/// const reference). It is built once from the defaults of the description
/// and may be overridden by a JSON file before the solver calls start.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct BehaviourParameters {
    /// Values by parameter name
    pub values: BTreeMap<String, f64>,

    /// Bounds by parameter name
    #[serde(skip)]
    bounds: BTreeMap<String, Bounds>,
}

impl BehaviourParameters {
    /// Allocates a new instance with the default values of the parameters
    pub fn new(data: &BehaviourData) -> Self {
        let mut params = BehaviourParameters::default();
        for p in &data.parameters {
            if let Some(value) = data.parameter_default(&p.name) {
                params.values.insert(p.name.clone(), value);
            }
            if let Some(b) = p.bounds {
                params.bounds.insert(p.name.clone(), b);
            }
        }
        params
    }

    /// Returns the value of a parameter
    pub fn get(&self, name: &str) -> Result<f64, GenError> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| GenError::UnknownVariable(name.to_string()))
    }

    /// Sets the value of an existing parameter
    pub fn set(&mut self, name: &str, value: f64) -> Result<&mut Self, GenError> {
        if !self.values.contains_key(name) {
            return Err(GenError::UnknownVariable(name.to_string()));
        }
        if let Some(b) = self.bounds.get(name) {
            if !b.contains(value) {
                return Err(GenError::InvalidParameterValue {
                    name: name.to_string(),
                    reason: "value is out of bounds",
                });
            }
        }
        self.values.insert(name.to_string(), value);
        Ok(self)
    }

    /// Overrides values with those given in a JSON file
    ///
    /// The file holds a flat object mapping parameter names to values.
    pub fn update_from_file<P>(&mut self, full_path: &P) -> Result<&mut Self, GenError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let file = File::open(&path).map_err(|_| GenError::Message("file not found"))?;
        let reader = BufReader::new(file);
        let values: BTreeMap<String, f64> = serde_json::from_reader(reader)?;
        for (name, value) in values {
            self.set(&name, value)?;
        }
        Ok(self)
    }

    /// Writes a JSON file with the values
    pub fn write<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer_pretty(&mut file, &self.values).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::BehaviourParameters;
    use crate::base::{BehaviourData, Bounds, GenError, VariableDescription, DEFAULT_TEST_DIR};
    use std::fs;

    fn sample_data() -> BehaviourData {
        let mut data = BehaviourData::new();
        let theta = VariableDescription::new("real", "theta")
            .unwrap()
            .with_bounds(Bounds::range(0.0, 1.0));
        let iter_max = VariableDescription::new("real", "iterMax")
            .unwrap()
            .with_bounds(Bounds::lower(1.0));
        data.add_parameter(theta, 0.5).unwrap();
        data.add_parameter(iter_max, 100.0).unwrap();
        data
    }

    #[test]
    fn new_works() {
        let params = BehaviourParameters::new(&sample_data());
        assert_eq!(params.get("theta"), Ok(0.5));
        assert_eq!(params.get("iterMax"), Ok(100.0));
        assert_eq!(params.get("epsilon"), Err(GenError::UnknownVariable("epsilon".to_string())));
    }

    #[test]
    fn set_captures_errors() {
        let mut params = BehaviourParameters::new(&sample_data());
        params.set("theta", 1.0).unwrap();
        assert_eq!(params.get("theta"), Ok(1.0));
        assert_eq!(
            params.set("theta", -0.1).err(),
            Some(GenError::InvalidParameterValue {
                name: "theta".to_string(),
                reason: "value is out of bounds"
            })
        );
        assert_eq!(
            params.set("alpha", 1.0).err(),
            Some(GenError::UnknownVariable("alpha".to_string()))
        );
    }

    #[test]
    fn write_and_update_work() {
        let mut params = BehaviourParameters::new(&sample_data());
        params.set("iterMax", 20.0).unwrap();
        let path = format!("{}/parameters_write_works.json", DEFAULT_TEST_DIR);
        params.write(&path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "{\n  \"iterMax\": 20.0,\n  \"theta\": 0.5\n}");

        let mut other = BehaviourParameters::new(&sample_data());
        other.update_from_file(&path).unwrap();
        assert_eq!(other.get("iterMax"), Ok(20.0));

        let bad = format!("{}/parameters_update_captures_errors.json", DEFAULT_TEST_DIR);
        fs::create_dir_all(DEFAULT_TEST_DIR).unwrap();
        fs::write(&bad, "{\"theta\": 2.0}").unwrap();
        assert_eq!(
            other.update_from_file(&bad).err(),
            Some(GenError::InvalidParameterValue {
                name: "theta".to_string(),
                reason: "value is out of bounds"
            })
        );
        assert_eq!(
            other.update_from_file("/tmp/mbgen/__not_found__.json").err(),
            Some(GenError::Message("file not found"))
        );
    }
}
