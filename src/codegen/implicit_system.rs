use crate::base::{throw_runtime_error, BehaviourData, GenError, TypeSize, VariableDescription};
use std::collections::{BTreeMap, BTreeSet};

/// Holds a contribution to one residual of the implicit system
///
/// The code updates the residual `f<residual>`; `depends_on` lists the
/// unknowns the contribution depends on and `jacobian` holds, for some of
/// them, the code updating the block `df<residual>_dd<unknown>`.
///
/// Consecutive terms sharing the same guard are emitted in a single
/// conditional block, so that the first one may declare values used by the
/// following ones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResidualTerm {
    /// Name of the unknown whose residual is updated
    pub residual: String,

    /// Code updating the residual
    pub code: String,

    /// Unknowns the contribution depends on
    pub depends_on: BTreeSet<String>,

    /// Code updating the jacobian blocks, by unknown
    pub jacobian: BTreeMap<String, String>,

    /// Condition under which the term is evaluated
    pub guard: Option<String>,
}

impl ResidualTerm {
    /// Allocates a new instance
    pub fn new(residual: &str, code: &str) -> Self {
        ResidualTerm {
            residual: residual.to_string(),
            code: code.to_string(),
            depends_on: BTreeSet::new(),
            jacobian: BTreeMap::new(),
            guard: None,
        }
    }

    /// Sets the condition under which the term is evaluated
    pub fn with_guard(mut self, condition: &str) -> Self {
        self.guard = Some(condition.to_string());
        self
    }

    /// Declares a dependency whose jacobian block is updated by the code of the term itself
    pub fn with_inline_derivative(mut self, unknown: &str) -> Self {
        self.depends_on.insert(unknown.to_string());
        self.jacobian.entry(unknown.to_string()).or_default();
        self
    }

    /// Declares a dependency and the code of the corresponding jacobian block
    pub fn with_derivative(mut self, unknown: &str, code: &str) -> Self {
        self.depends_on.insert(unknown.to_string());
        self.jacobian
            .entry(unknown.to_string())
            .and_modify(|c| {
                c.push('\n');
                c.push_str(code);
            })
            .or_insert_with(|| code.to_string());
        self
    }

    /// Declares a dependency without derivative code
    pub fn with_dependency(mut self, unknown: &str) -> Self {
        self.depends_on.insert(unknown.to_string());
        self
    }
}

/// Returns the name of the derivative of the residual of `a` with respect to `b`
pub fn derivative_name(a: &str, b: &str) -> String {
    format!("df{}_dd{}", a, b)
}

/// Describes the layout of the unknowns of an implicit system
///
/// The unknowns are the state variables followed by the integration
/// variables; their offsets in the flat vector `zeros` are symbolic sizes.
#[derive(Clone, Debug, PartialEq)]
pub struct ImplicitSystem {
    /// Unknowns and their offsets
    unknowns: Vec<(VariableDescription, TypeSize)>,

    /// Total size
    size: TypeSize,
}

impl ImplicitSystem {
    /// Allocates a new instance from the unknowns of the data
    pub fn new(data: &BehaviourData) -> Result<Self, GenError> {
        let mut unknowns = Vec::new();
        let mut offset = TypeSize::default();
        for v in data.unknowns() {
            let size = v.size();
            unknowns.push((v, offset));
            offset += size;
        }
        if unknowns.is_empty() {
            return Err(throw_runtime_error("ImplicitSystem::new", "no unknown defined"));
        }
        Ok(ImplicitSystem { unknowns, size: offset })
    }

    /// Returns the symbolic size of the system
    pub fn size(&self) -> TypeSize {
        self.size
    }

    /// Returns the unknowns
    pub fn unknowns(&self) -> impl Iterator<Item = &VariableDescription> {
        self.unknowns.iter().map(|(v, _)| v)
    }

    /// Returns an unknown and its offset
    pub fn find(&self, name: &str) -> Option<(&VariableDescription, TypeSize)> {
        self.unknowns
            .iter()
            .find(|(v, _)| v.name == name)
            .map(|(v, offset)| (v, *offset))
    }

    /// Returns the offset of an unknown
    pub fn offset(&self, name: &str) -> Result<TypeSize, GenError> {
        self.find(name)
            .map(|(_, o)| o)
            .ok_or_else(|| GenError::UnknownVariable(name.to_string()))
    }

    /// Splits the name of a derivative `df<a>_dd<b>` into the two unknowns
    pub fn split_derivative_name(&self, name: &str) -> Result<(String, String), GenError> {
        let err = || GenError::UnknownDerivative(name.to_string());
        let rest = name.strip_prefix("df").ok_or_else(err)?;
        for (a, _) in &self.unknowns {
            if let Some(b) = rest.strip_prefix(a.name.as_str()).and_then(|r| r.strip_prefix("_dd")) {
                if self.find(b).is_some() {
                    return Ok((a.name.clone(), b.to_string()));
                }
            }
        }
        Err(err())
    }

    /// Returns the expression mapping an unknown onto a part of a flat vector
    pub fn vector_map(&self, name: &str, vector: &str) -> Result<String, GenError> {
        let (v, offset) = self
            .find(name)
            .ok_or_else(|| GenError::UnknownVariable(name.to_string()))?;
        if v.array_size == 1 {
            Ok(format!("tfel::math::map<{}, {}>({})", v.type_name, offset, vector))
        } else {
            Ok(format!(
                "tfel::math::map<{}, {}, {}>({})",
                v.array_size, v.type_name, offset, vector
            ))
        }
    }

    /// Returns the declaration of a view of a part of a flat vector
    ///
    /// `prefix` is prepended to the name of the unknown (e.g. `f` for residuals).
    pub fn vector_view(&self, name: &str, prefix: &str, vector: &str) -> Result<String, GenError> {
        let map = self.vector_map(name, vector)?;
        Ok(format!("auto&& {}{} = {};", prefix, name, map))
    }

    /// Returns the declaration of a view of the jacobian block `df<a>_dd<b>`
    pub fn derivative_view(&self, a: &str, b: &str, matrix: &str) -> Result<String, GenError> {
        let (va, ra) = self.find(a).ok_or_else(|| GenError::UnknownVariable(a.to_string()))?;
        let (vb, cb) = self.find(b).ok_or_else(|| GenError::UnknownVariable(b.to_string()))?;
        let name = derivative_name(a, b);
        let sa = TypeSize::of(&va.type_name, 1)?;
        let sb = TypeSize::of(&vb.type_name, 1)?;
        let code = match (va.array_size == 1, vb.array_size == 1) {
            (true, true) => format!(
                "auto&& {} = tfel::math::map_derivative<{}, {}, {}, {}>({});",
                name, ra, cb, va.type_name, vb.type_name, matrix
            ),
            (false, true) => format!(
                "auto {} = [&](const ushort idx){{\n\
                 return tfel::math::map_derivative<{}, {}>({}, {} + idx * ({}), {});\n\
                 }};",
                name, va.type_name, vb.type_name, matrix, ra, sa, cb
            ),
            (true, false) => format!(
                "auto {} = [&](const ushort idx){{\n\
                 return tfel::math::map_derivative<{}, {}>({}, {}, {} + idx * ({}));\n\
                 }};",
                name, va.type_name, vb.type_name, matrix, ra, cb, sb
            ),
            (false, false) => format!(
                "auto {} = [&](const ushort idx, const ushort idx2){{\n\
                 return tfel::math::map_derivative<{}, {}>({}, {} + idx * ({}), {} + idx2 * ({}));\n\
                 }};",
                name, va.type_name, vb.type_name, matrix, ra, sa, cb, sb
            ),
        };
        Ok(code)
    }

    /// Checks the residual terms
    ///
    /// Every residual and dependency must be an unknown. When the jacobian is
    /// computed analytically, every dependency must come with its derivative.
    pub fn check_terms(&self, terms: &[ResidualTerm], analytical_jacobian: bool) -> Result<(), GenError> {
        for term in terms {
            if self.find(&term.residual).is_none() {
                return Err(GenError::UnknownVariable(term.residual.clone()));
            }
            for unknown in term.depends_on.iter().chain(term.jacobian.keys()) {
                if self.find(unknown).is_none() {
                    return Err(GenError::UnknownDerivative(derivative_name(&term.residual, unknown)));
                }
            }
            if analytical_jacobian {
                for unknown in &term.depends_on {
                    if !term.jacobian.contains_key(unknown) {
                        return Err(GenError::MissingDerivativeTerm {
                            residual: term.residual.clone(),
                            unknown: unknown.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{derivative_name, ImplicitSystem, ResidualTerm};
    use crate::base::{BehaviourData, GenError, TypeSize, VariableCategory, VariableDescription};

    fn sample_data() -> BehaviourData {
        let mut data = BehaviourData::new();
        let eel = VariableDescription::new("StrainStensor", "eel").unwrap();
        let p = VariableDescription::new("strain", "p").unwrap();
        let a = VariableDescription::new_array("StrainStensor", "a", 2).unwrap();
        data.add_variable(VariableCategory::StateVariable, eel).unwrap();
        data.add_variable(VariableCategory::StateVariable, p).unwrap();
        data.add_variable(VariableCategory::IntegrationVariable, a).unwrap();
        data
    }

    #[test]
    fn new_works() {
        let system = ImplicitSystem::new(&sample_data()).unwrap();
        assert_eq!(system.size(), TypeSize::new(1, 0, 3, 0));
        assert_eq!(system.offset("eel"), Ok(TypeSize::default()));
        assert_eq!(system.offset("p"), Ok(TypeSize::new(0, 0, 1, 0)));
        assert_eq!(system.offset("a"), Ok(TypeSize::new(1, 0, 1, 0)));
        assert_eq!(system.unknowns().count(), 3);
        assert_eq!(
            ImplicitSystem::new(&BehaviourData::new()).err(),
            Some(GenError::Runtime("ImplicitSystem::new: no unknown defined".to_string()))
        );
    }

    #[test]
    fn views_work() {
        let system = ImplicitSystem::new(&sample_data()).unwrap();
        assert_eq!(
            system.vector_view("p", "f", "this->fzeros").unwrap(),
            "auto&& fp = tfel::math::map<strain, StensorSize>(this->fzeros);"
        );
        assert_eq!(
            system.vector_view("a", "f", "this->fzeros").unwrap(),
            "auto&& fa = tfel::math::map<2, StrainStensor, 1+StensorSize>(this->fzeros);"
        );
        assert_eq!(
            system.derivative_view("eel", "p", "this->jacobian").unwrap(),
            "auto&& dfeel_ddp = tfel::math::map_derivative<0u, StensorSize, StrainStensor, strain>(this->jacobian);"
        );
        let code = system.derivative_view("a", "p", "this->jacobian").unwrap();
        assert!(code.starts_with("auto dfa_ddp = [&](const ushort idx){"));
        assert!(code.contains("1+StensorSize + idx * (StensorSize)"));
        assert_eq!(derivative_name("eel", "p"), "dfeel_ddp");
    }

    #[test]
    fn split_derivative_name_works() {
        let system = ImplicitSystem::new(&sample_data()).unwrap();
        assert_eq!(
            system.split_derivative_name("dfeel_ddp"),
            Ok(("eel".to_string(), "p".to_string()))
        );
        assert_eq!(
            system.split_derivative_name("dfeel_ddq").err(),
            Some(GenError::UnknownDerivative("dfeel_ddq".to_string()))
        );
        assert_eq!(
            system.split_derivative_name("eel_ddp").err(),
            Some(GenError::UnknownDerivative("eel_ddp".to_string()))
        );
    }

    #[test]
    fn check_terms_captures_errors() {
        let system = ImplicitSystem::new(&sample_data()).unwrap();
        let good = ResidualTerm::new("eel", "feel += this->dp*this->n;")
            .with_derivative("p", "dfeel_ddp = this->n;")
            .with_derivative("eel", "dfeel_ddeel += this->dp*this->dn_ddeel;");
        assert_eq!(system.check_terms(&[good.clone()], true), Ok(()));
        let missing = ResidualTerm::new("p", "fp -= 1;").with_dependency("eel");
        assert_eq!(
            system.check_terms(&[good, missing.clone()], true).err(),
            Some(GenError::MissingDerivativeTerm {
                residual: "p".to_string(),
                unknown: "eel".to_string()
            })
        );
        // numerical jacobian: derivatives are not needed
        assert_eq!(system.check_terms(&[missing], false), Ok(()));
        let inline = ResidualTerm::new("p", "fp -= 1;\ndfp_ddeel = Stensor(0);").with_inline_derivative("eel");
        assert_eq!(system.check_terms(&[inline.clone()], true), Ok(()));
        assert_eq!(inline.jacobian.get("eel"), Some(&String::new()));
        let unknown = ResidualTerm::new("p", "").with_derivative("q", "");
        assert_eq!(
            system.check_terms(&[unknown], true).err(),
            Some(GenError::UnknownDerivative("dfp_ddq".to_string()))
        );
        let bad_residual = ResidualTerm::new("q", "");
        assert_eq!(
            system.check_terms(&[bad_residual], false).err(),
            Some(GenError::UnknownVariable("q".to_string()))
        );
    }
}
