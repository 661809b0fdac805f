use super::{ModellingHypothesis, OutOfBoundsPolicy, Solver, DEFAULT_OUT_DIR};
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Holds configuration data for the generation of a behaviour
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GeneratorConfig {
    /// Directory where the generated files are written
    pub out_dir: String,

    /// Makes the generated code print trace statements in the local Newton loops
    pub debug_mode: bool,

    /// Generates code using quantities (units) instead of plain reals
    pub use_qt: bool,

    /// Disables the NPROPS/NSTATV/NTENS checks of the solver interfaces
    pub no_runtime_checks: bool,

    /// Default out-of-bounds policy of the generated behaviours
    pub out_of_bounds_policy: OutOfBoundsPolicy,

    /// Target solvers
    pub interfaces: Vec<Solver>,

    /// Restricts the modelling hypotheses (None means all supported hypotheses)
    pub hypotheses: Option<Vec<ModellingHypothesis>>,
}

impl GeneratorConfig {
    /// Allocates a new instance
    pub fn new() -> Self {
        GeneratorConfig {
            out_dir: DEFAULT_OUT_DIR.to_string(),
            debug_mode: false,
            use_qt: false,
            no_runtime_checks: false,
            out_of_bounds_policy: OutOfBoundsPolicy::None,
            interfaces: Vec::new(),
            hypotheses: None,
        }
    }

    /// Sets the output directory
    pub fn set_out_dir(&mut self, out_dir: &str) -> Result<&mut Self, StrError> {
        if out_dir.trim().is_empty() {
            return Err("output directory must not be empty");
        }
        self.out_dir = out_dir.to_string();
        Ok(self)
    }

    /// Sets the debug mode of the generated code
    pub fn set_debug_mode(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        self.debug_mode = flag;
        Ok(self)
    }

    /// Sets the use of quantities
    pub fn set_use_qt(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        self.use_qt = flag;
        Ok(self)
    }

    /// Disables (or enables) the runtime checks of the solver interfaces
    pub fn set_no_runtime_checks(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        self.no_runtime_checks = flag;
        Ok(self)
    }

    /// Sets the default out-of-bounds policy
    pub fn set_out_of_bounds_policy(&mut self, policy: OutOfBoundsPolicy) -> Result<&mut Self, StrError> {
        self.out_of_bounds_policy = policy;
        Ok(self)
    }

    /// Adds a target solver
    pub fn add_interface(&mut self, solver: Solver) -> Result<&mut Self, StrError> {
        if self.interfaces.contains(&solver) {
            return Err("interface has already been added");
        }
        self.interfaces.push(solver);
        Ok(self)
    }

    /// Restricts the generation to the given hypotheses
    pub fn set_hypotheses(&mut self, hypotheses: &[ModellingHypothesis]) -> Result<&mut Self, StrError> {
        if hypotheses.is_empty() {
            return Err("the list of modelling hypotheses must not be empty");
        }
        if hypotheses.iter().any(|h| !h.is_defined()) {
            return Err("the undefined hypothesis cannot be requested");
        }
        let mut list = hypotheses.to_vec();
        list.sort();
        list.dedup();
        self.hypotheses = Some(list);
        Ok(self)
    }
}

impl fmt::Display for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration data\n")?;
        write!(f, "==================\n")?;
        write!(f, "out_dir = {:?}\n", self.out_dir)?;
        write!(f, "debug_mode = {:?}\n", self.debug_mode)?;
        write!(f, "use_qt = {:?}\n", self.use_qt)?;
        write!(f, "no_runtime_checks = {:?}\n", self.no_runtime_checks)?;
        write!(f, "out_of_bounds_policy = {:?}\n", self.out_of_bounds_policy)?;
        let names: Vec<_> = self.interfaces.iter().map(|s| s.name()).collect();
        write!(f, "interfaces = {:?}\n", names)?;
        match &self.hypotheses {
            Some(list) => {
                let names: Vec<_> = list.iter().map(|h| h.name()).collect();
                write!(f, "hypotheses = {:?}\n", names)?;
            }
            None => write!(f, "hypotheses = all\n")?,
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
