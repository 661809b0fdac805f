use super::traits::write_traits;
use super::{isotropic, EmitContext, LocalSolveStrategy, SourceWriter};
use crate::base::{throw_runtime_error, BehaviourDescription, BehaviourParameters, Bounds};
use crate::base::{CodeBlockSlot, GenError, GeneratorConfig, ModellingHypothesis, OutOfBoundsPolicy};
use crate::base::VariableDescription;
use crate::interfaces::write_interface_files;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Holds the generated files as (relative path, content) pairs, in emission order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeneratedFiles {
    /// Relative paths and contents
    pub files: Vec<(String, String)>,
}

impl GeneratedFiles {
    /// Returns the content of a file
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.iter().find(|(p, _)| p == path).map(|(_, c)| c.as_str())
    }

    /// Returns the relative paths
    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(|(p, _)| p.as_str()).collect()
    }

    /// Writes all files below a directory, creating sub-directories as needed
    pub fn write_to<P>(&self, out_dir: &P) -> Result<Vec<PathBuf>, GenError>
    where
        P: AsRef<Path> + ?Sized,
    {
        let mut written = Vec::new();
        for (path, content) in &self.files {
            let full_path = out_dir.as_ref().join(path);
            let io_error = |e: std::io::Error| GenError::Io {
                path: full_path.display().to_string(),
                message: e.to_string(),
            };
            if let Some(dir) = full_path.parent() {
                fs::create_dir_all(dir).map_err(io_error)?;
            }
            fs::write(&full_path, content).map_err(io_error)?;
            debug!("wrote '{}'", full_path.display());
            written.push(full_path);
        }
        Ok(written)
    }
}

/// Returns a C++ floating point literal
pub(crate) fn real_literal(value: f64) -> String {
    let text = format!("{}", value);
    let integral = !text.contains(['.', 'e', 'E', 'i', 'N']);
    if value != 0.0 && (value.abs() < 1e-4 || value.abs() >= 1e9) {
        format!("{:e}", value)
    } else if integral {
        format!("{}.", text)
    } else {
        text
    }
}

/// Generates the behaviour data, integration data, behaviour and source files of a behaviour
///
/// Emission is all-or-nothing: every precondition is checked before the
/// first line is written, and the description is never modified.
pub struct BehaviourCodeGenerator<'a> {
    /// Behaviour being generated
    bd: &'a BehaviourDescription,

    /// Configuration
    config: &'a GeneratorConfig,

    /// Local integration algorithm
    strategy: &'a LocalSolveStrategy,

    /// Overridden values of the parameters
    parameters: Option<&'a BehaviourParameters>,
}

impl<'a> BehaviourCodeGenerator<'a> {
    /// Allocates a new instance
    pub fn new(bd: &'a BehaviourDescription, config: &'a GeneratorConfig, strategy: &'a LocalSolveStrategy) -> Self {
        BehaviourCodeGenerator {
            bd,
            config,
            strategy,
            parameters: None,
        }
    }

    /// Overrides the default values of the parameters
    pub fn with_parameters(mut self, parameters: &'a BehaviourParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Returns the treated hypotheses after checking the preconditions
    pub fn check(&self) -> Result<Vec<ModellingHypothesis>, GenError> {
        self.bd.check_array_size_of_main_variables()?;
        let hypotheses = self.bd.select_hypotheses(self.config.hypotheses.as_deref())?;
        self.strategy.check(self.bd, &hypotheses)?;
        for h in self.targets(&hypotheses) {
            let data = self.bd.data(h);
            data.check_code_block_members()?;
            if data.parameters.iter().any(|p| p.array_size != 1 || !p.is_scalar()) {
                return Err(throw_runtime_error(
                    "BehaviourCodeGenerator::check",
                    "parameters must be scalars",
                ));
            }
        }
        Ok(hypotheses)
    }

    /// Returns the hypotheses for which a class is written
    ///
    /// The generic class (undefined hypothesis) comes first, unless every
    /// treated hypothesis has its own data.
    fn targets(&self, hypotheses: &[ModellingHypothesis]) -> Vec<ModellingHypothesis> {
        let mut targets = Vec::new();
        if !self.bd.are_all_specialised(hypotheses) {
            targets.push(ModellingHypothesis::Undefined);
        }
        targets.extend(hypotheses.iter().copied().filter(|h| self.bd.has_specialised_data(*h)));
        targets
    }

    /// Generates all the files
    pub fn generate(&self) -> Result<GeneratedFiles, GenError> {
        let hypotheses = self.check()?;
        let targets = self.targets(&hypotheses);
        info!(
            "generating behaviour '{}' ({} hypotheses, strategy {})",
            self.bd.class_name(),
            hypotheses.len(),
            self.strategy.name()
        );
        for h in &targets {
            debug!("writing classes for hypothesis '{}'", h);
        }
        let mut generated = GeneratedFiles::default();
        generated.files.push((
            self.bd.behaviour_data_file_name(),
            self.write_behaviour_data_file(&targets)?,
        ));
        generated.files.push((
            self.bd.integration_data_file_name(),
            self.write_integration_data_file(&targets)?,
        ));
        generated.files.push((
            self.bd.behaviour_file_name(),
            self.write_behaviour_file(&targets, &hypotheses)?,
        ));
        generated.files.push((self.bd.src_file_name(), self.write_src_file(&targets)?));
        for solver in &self.config.interfaces {
            generated
                .files
                .extend(write_interface_files(self.bd, *solver, &hypotheses, self.config)?);
        }
        for path in generated.paths() {
            debug!("generated '{}'", path);
        }
        info!("behaviour '{}' generated", self.bd.class_name());
        Ok(generated)
    }

    /// Returns a writer whose outer scope holds the members of the data
    fn writer(&self, h: ModellingHypothesis) -> SourceWriter {
        SourceWriter::new(self.bd.data(h).registered_names().iter().cloned())
    }

    fn context(&self, h: ModellingHypothesis) -> EmitContext<'a> {
        EmitContext {
            bd: self.bd,
            hypothesis: h,
            config: self.config,
            strategy: self.strategy,
        }
    }

    fn write_file_header(&self, w: &mut SourceWriter, file: &str, brief: &str, guard_suffix: &str) {
        w.line("/*!");
        w.line(&format!("* \\file   {}", file));
        w.line(&format!("* \\brief  {}", brief));
        w.line("*         File generated by mbgen");
        w.line("*/");
        w.blank();
        let guard = self.bd.header_guard(guard_suffix);
        w.line(&format!("#ifndef {}", guard));
        w.line(&format!("#define {}", guard));
        w.blank();
    }

    fn write_file_footer(&self, w: &mut SourceWriter, guard_suffix: &str) {
        w.line("} // end of namespace tfel::material");
        w.blank();
        w.line(&format!("#endif /* {} */", self.bd.header_guard(guard_suffix)));
    }

    fn write_template_begin(&self, w: &mut SourceWriter, h: ModellingHypothesis, class: &str, inheritance: &str) {
        if h.is_defined() {
            w.line("template<typename NumericType,bool use_qt>");
            w.line(&format!(
                "class {}<ModellingHypothesis::{},NumericType,use_qt>{}",
                class,
                h.upper_case_name(),
                inheritance
            ));
        } else {
            w.line("template<ModellingHypothesis::Hypothesis hypothesis,typename NumericType,bool use_qt>");
            w.line(&format!("class {}{}", class, inheritance));
        }
    }

    fn template_arguments(h: ModellingHypothesis) -> String {
        if h.is_defined() {
            format!("ModellingHypothesis::{},NumericType,use_qt", h.upper_case_name())
        } else {
            String::from("hypothesis,NumericType,use_qt")
        }
    }

    /// Writes the forward declarations of a class template and of its output operators
    fn write_forward_declarations(&self, w: &mut SourceWriter, targets: &[ModellingHypothesis], class: &str) {
        w.line("//! \\brief forward declaration");
        w.line("template<ModellingHypothesis::Hypothesis hypothesis,typename NumericType,bool use_qt>");
        w.line(&format!("class {};", class));
        w.blank();
        for h in targets {
            if h.is_defined() {
                w.line("template<typename NumericType,bool use_qt>");
            } else {
                w.line("template<ModellingHypothesis::Hypothesis hypothesis,typename NumericType,bool use_qt>");
            }
            w.line(&format!(
                "std::ostream&\n operator <<(std::ostream&,const {}<{}>&);",
                class,
                Self::template_arguments(*h)
            ));
            w.blank();
        }
    }

    fn write_static_asserts(&self, w: &mut SourceWriter, h: ModellingHypothesis) {
        if h.is_defined() {
            w.line(&format!(
                "static constexpr ModellingHypothesis::Hypothesis hypothesis = ModellingHypothesis::{};",
                h.upper_case_name()
            ));
        }
        w.line("static constexpr unsigned short N = ModellingHypothesisToSpaceDimension<hypothesis>::value;");
        w.line("static_assert(N==1||N==2||N==3);");
        w.line("static_assert(tfel::typetraits::IsFundamentalNumericType<NumericType>::cond);");
        w.line("static_assert(tfel::typetraits::IsReal<NumericType>::cond);");
    }

    fn write_type_aliases(&self, w: &mut SourceWriter) {
        w.line("static constexpr unsigned short TVectorSize = N;");
        w.line("using StensorDimeToSize = tfel::math::StensorDimeToSize<N>;");
        w.line("static constexpr unsigned short StensorSize = StensorDimeToSize::value;");
        w.line("using TensorDimeToSize = tfel::math::TensorDimeToSize<N>;");
        w.line("static constexpr unsigned short TensorSize = TensorDimeToSize::value;");
        w.line("using ushort =  unsigned short;");
        w.line("using Types = tfel::config::Types<N, NumericType, use_qt>;");
        for alias in [
            "real",
            "time",
            "length",
            "frequency",
            "stress",
            "strain",
            "strainrate",
            "stressrate",
            "temperature",
            "thermalexpansion",
            "density",
            "energy_density",
            "TVector",
            "Stensor",
            "Stensor4",
            "FrequencyStensor",
            "ForceTVector",
            "StressStensor",
            "StressRateStensor",
            "DisplacementTVector",
            "StrainStensor",
            "StrainRateStensor",
            "StiffnessTensor",
            "Tensor",
            "DeformationGradientTensor",
            "ThermalExpansionCoefficientTensor",
        ] {
            w.line(&format!("using {} = typename Types::{};", alias, alias));
        }
        w.line("using DstrainDt = tfel::math::derivative_type<strain, time>;");
        w.line("using DF_DSEQ_TYPE = tfel::math::derivative_type<DstrainDt, stress>;");
    }

    fn write_declarations<'v, I>(w: &mut SourceWriter, variables: I, prefix: &str)
    where
        I: IntoIterator<Item = &'v VariableDescription>,
    {
        for v in variables {
            w.line(&format!("{} {}{};", v.declaration_type(), prefix, v.name));
        }
    }

    fn write_output_operator<'v, I>(w: &mut SourceWriter, h: ModellingHypothesis, class: &str, variables: I)
    where
        I: IntoIterator<Item = (String, &'v VariableDescription)>,
    {
        if h.is_defined() {
            w.line("template<typename NumericType,bool use_qt>");
        } else {
            w.line("template<ModellingHypothesis::Hypothesis hypothesis,typename NumericType,bool use_qt>");
        }
        w.open(&format!(
            "std::ostream&\noperator <<(std::ostream& os,const {}<{}>& b)",
            class,
            Self::template_arguments(h)
        ));
        for (name, v) in variables {
            if v.array_size == 1 {
                w.line(&format!("os << \"{} : \" << b.{} << '\\n';", name, name));
            } else {
                w.open(&format!("for(unsigned short i=0;i!={};++i)", v.array_size));
                w.line(&format!("os << \"{}[\" << i << \"] : \" << b.{}[i] << '\\n';", name, name));
                w.close("");
            }
        }
        w.line("return os;");
        w.close("");
        w.blank();
    }

    fn main_variables(bd: &BehaviourDescription) -> Vec<VariableDescription> {
        bd.main_variables()
            .iter()
            .flat_map(|m| [m.gradient.clone(), m.force.clone()])
            .collect()
    }

    /// Writes the file holding the state at the beginning of the time step
    fn write_behaviour_data_file(&self, targets: &[ModellingHypothesis]) -> Result<String, GenError> {
        let cn = self.bd.class_name();
        let class = format!("{}BehaviourData", cn);
        let mut w = SourceWriter::new(Vec::<String>::new());
        self.write_file_header(
            &mut w,
            &self.bd.behaviour_data_file_name(),
            &format!("this file implements the {} class.", class),
            "_BEHAVIOUR_DATA",
        );
        for include in ["limits", "string", "sstream", "iostream", "stdexcept", "algorithm"] {
            w.line(&format!("#include<{}>", include));
        }
        w.blank();
        for include in [
            "TFEL/Raise.hxx",
            "TFEL/PhysicalConstants.hxx",
            "TFEL/Config/TFELConfig.hxx",
            "TFEL/Config/TFELTypes.hxx",
            "TFEL/TypeTraits/IsFundamentalNumericType.hxx",
            "TFEL/TypeTraits/IsReal.hxx",
            "TFEL/Math/General/IEEE754.hxx",
            "TFEL/Math/Array/ViewsArrayIO.hxx",
            "TFEL/Math/fsarray.hxx",
            "TFEL/Math/stensor.hxx",
            "TFEL/Math/st2tost2.hxx",
            "TFEL/Material/ModellingHypothesis.hxx",
        ] {
            w.line(&format!("#include\"{}\"", include));
        }
        w.blank();
        w.line("namespace tfel::material{");
        w.blank();
        self.write_forward_declarations(&mut w, targets, &class);
        w.line("template<ModellingHypothesis::Hypothesis hypothesis,typename NumericType,bool use_qt>");
        w.line(&format!("class {}IntegrationData;", cn));
        w.blank();
        for h in targets {
            let data = self.bd.data(*h);
            self.write_template_begin(&mut w, *h, &class, "");
            w.open("");
            self.write_static_asserts(&mut w, *h);
            w.line(&format!("friend std::ostream& operator<< <>(std::ostream&,const {}&);", class));
            w.line("/* integration data is declared friend to access driving variables at the beginning of the time step */");
            w.line(&format!("friend class {}IntegrationData<hypothesis, NumericType, use_qt>;", cn));
            w.blank();
            self.write_type_aliases(&mut w);
            w.line("protected:");
            w.blank();
            let main = Self::main_variables(self.bd);
            Self::write_declarations(&mut w, &main, "");
            Self::write_declarations(&mut w, &data.material_properties, "");
            Self::write_declarations(&mut w, data.persistent_variables(), "");
            Self::write_declarations(&mut w, &data.external_state_variables, "");
            w.blank();
            w.line("public:");
            w.blank();
            w.line(&format!("{}() = default;", class));
            w.line(&format!("{}(const {}&) = default;", class, class));
            w.line(&format!("{}& operator=(const {}&) = default;", class, class));
            w.close(";");
            w.blank();
            let printed = main
                .iter()
                .chain(data.material_properties.iter())
                .chain(data.persistent_variables())
                .chain(data.external_state_variables.iter())
                .map(|v| (v.name.clone(), v));
            Self::write_output_operator(&mut w, *h, &class, printed);
        }
        self.write_file_footer(&mut w, "_BEHAVIOUR_DATA");
        Ok(w.finish())
    }

    /// Writes the file holding the increments over the time step
    fn write_integration_data_file(&self, targets: &[ModellingHypothesis]) -> Result<String, GenError> {
        let cn = self.bd.class_name();
        let class = format!("{}IntegrationData", cn);
        let mut w = SourceWriter::new(Vec::<String>::new());
        self.write_file_header(
            &mut w,
            &self.bd.integration_data_file_name(),
            &format!("this file implements the {} class.", class),
            "_INTEGRATION_DATA",
        );
        for include in ["string", "iostream", "limits", "stdexcept", "algorithm"] {
            w.line(&format!("#include<{}>", include));
        }
        w.blank();
        for include in [
            "TFEL/Raise.hxx",
            "TFEL/Config/TFELConfig.hxx",
            "TFEL/Config/TFELTypes.hxx",
            "TFEL/TypeTraits/IsFundamentalNumericType.hxx",
            "TFEL/TypeTraits/IsReal.hxx",
            "TFEL/Math/General/IEEE754.hxx",
            "TFEL/Math/fsarray.hxx",
            "TFEL/Math/stensor.hxx",
            "TFEL/Math/st2tost2.hxx",
            "TFEL/Material/ModellingHypothesis.hxx",
        ] {
            w.line(&format!("#include\"{}\"", include));
        }
        w.blank();
        w.line("namespace tfel::material{");
        w.blank();
        self.write_forward_declarations(&mut w, targets, &class);
        w.line("template<ModellingHypothesis::Hypothesis hypothesis,typename NumericType,bool use_qt>");
        w.line(&format!("class {}BehaviourData;", cn));
        w.blank();
        for h in targets {
            let data = self.bd.data(*h);
            self.write_template_begin(&mut w, *h, &class, "");
            w.open("");
            self.write_static_asserts(&mut w, *h);
            w.line(&format!("friend std::ostream& operator<< <>(std::ostream&,const {}&);", class));
            w.blank();
            self.write_type_aliases(&mut w);
            w.line("protected:");
            w.blank();
            let main = Self::main_variables(self.bd);
            let gradients: Vec<&VariableDescription> = main.iter().step_by(2).collect();
            w.line("time dt;");
            Self::write_declarations(&mut w, gradients.iter().copied(), "d");
            Self::write_declarations(&mut w, &data.external_state_variables, "d");
            w.blank();
            w.line("public:");
            w.blank();
            w.line(&format!("{}() = default;", class));
            w.line(&format!("{}(const {}&) = default;", class, class));
            w.line(&format!("{}& operator=(const {}&) = default;", class, class));
            w.line("/*!");
            w.line("* \\brief scale the integration data by a scalar.");
            w.line("*/");
            w.line("template<typename Scal>");
            w.line("std::enable_if_t<tfel::typetraits::IsFundamentalNumericType<Scal>::cond&&");
            w.line("tfel::typetraits::IsScalar<Scal>::cond&&");
            w.line("tfel::typetraits::IsReal<Scal>::cond&&");
            w.line("std::is_same<NumericType,typename tfel::typetraits::Promote<NumericType,Scal>::type>::value,");
            w.open(&format!("{}&>\nscale(const {}BehaviourData<hypothesis, NumericType, use_qt>&, const Scal time_scaling_factor)", class, cn));
            w.line("this->dt   *= time_scaling_factor;");
            for v in gradients.iter().copied().chain(data.external_state_variables.iter()) {
                w.line(&format!("this->d{} *= time_scaling_factor;", v.name));
            }
            w.line("return *this;");
            w.close("");
            w.blank();
            w.close(";");
            w.blank();
            let printed = std::iter::once((String::from("dt"), &main[0]))
                .chain(gradients.iter().map(|v| (format!("d{}", v.name), *v)))
                .chain(data.external_state_variables.iter().map(|v| (format!("d{}", v.name), v)))
                .collect::<Vec<_>>();
            Self::write_output_operator(&mut w, *h, &class, printed);
        }
        self.write_file_footer(&mut w, "_INTEGRATION_DATA");
        Ok(w.finish())
    }

    /// Returns the parameters of all the written classes, with their default values
    fn parameters(&self, targets: &[ModellingHypothesis]) -> Vec<(VariableDescription, f64)> {
        let mut list: Vec<(VariableDescription, f64)> = Vec::new();
        for h in targets {
            let data = self.bd.data(*h);
            for p in &data.parameters {
                if list.iter().any(|(q, _)| q.name == p.name) {
                    continue;
                }
                let default = self
                    .parameters
                    .and_then(|params| params.get(&p.name).ok())
                    .or_else(|| data.parameter_default(&p.name))
                    .unwrap_or(0.0);
                list.push((p.clone(), default));
            }
        }
        list
    }

    fn write_parameters_declaration(&self, w: &mut SourceWriter, targets: &[ModellingHypothesis]) {
        let name = format!("{}Parameters", self.bd.class_name());
        w.line("/*!");
        w.line(&format!("* \\brief values of the parameters of the {} behaviour", self.bd.class_name()));
        w.line("*/");
        w.open(&format!("struct {}", name));
        w.line("//! \\brief default constructor");
        w.line(&format!("{}();", name));
        w.line("/*!");
        w.line("* \\brief set the value of a parameter");
        w.line("* \\param[in] n: name of the parameter");
        w.line("* \\param[in] v: value");
        w.line("*/");
        w.line("void set(const char* const,const double);");
        for (p, _) in self.parameters(targets) {
            w.line(&format!("double {};", p.name));
        }
        w.close(";");
        w.blank();
    }

    fn write_bound_check(w: &mut SourceWriter, v: &VariableDescription, bounds: &Bounds, policy: bool) {
        let name = v.external_name();
        let policy = if policy { ",this->policy" } else { "" };
        let check = match (bounds.lower, bounds.upper) {
            (Some(l), Some(u)) => format!(
                "lowerAndUpperBoundsChecks(\"{}\",this->{}{{}},static_cast<real>({}),static_cast<real>({}){});",
                name,
                v.name,
                real_literal(l),
                real_literal(u),
                policy
            ),
            (Some(l), None) => format!(
                "lowerBoundCheck(\"{}\",this->{}{{}},static_cast<real>({}){});",
                name,
                v.name,
                real_literal(l),
                policy
            ),
            (None, Some(u)) => format!(
                "upperBoundCheck(\"{}\",this->{}{{}},static_cast<real>({}){});",
                name,
                v.name,
                real_literal(u),
                policy
            ),
            (None, None) => return,
        };
        if v.array_size == 1 {
            w.line(&format!("tfel::material::BoundsCheck<N>::{}", check.replace("{}", "")));
        } else {
            w.open(&format!("for(unsigned short idx=0;idx!={};++idx)", v.array_size));
            w.line(&format!("tfel::material::BoundsCheck<N>::{}", check.replace("{}", "[idx]")));
            w.close("");
        }
    }

    fn write_bounds_checks<'v, I>(&self, w: &mut SourceWriter, variables: I)
    where
        I: IntoIterator<Item = &'v VariableDescription> + Clone,
    {
        for v in variables.clone() {
            if let Some(b) = &v.physical_bounds {
                Self::write_bound_check(w, v, b, false);
            }
        }
        if self.config.out_of_bounds_policy == OutOfBoundsPolicy::None {
            return;
        }
        for v in variables {
            if let Some(b) = &v.bounds {
                Self::write_bound_check(w, v, b, true);
            }
        }
    }

    /// Writes the behaviour class of one hypothesis
    fn write_behaviour_class(&self, w: &mut SourceWriter, h: ModellingHypothesis) -> Result<(), GenError> {
        let cn = self.bd.class_name();
        let data = self.bd.data(h);
        let ctx = self.context(h);
        let hooks = self.strategy.hooks();
        let base = format!(
            "MechanicalBehaviour<MechanicalBehaviourBase::{},hypothesis, NumericType,use_qt>",
            self.bd.behaviour_type.name()
        );
        w.line("/*!");
        w.line(&format!("* \\class {}", cn));
        w.line(&format!("* \\brief This class implements the {} behaviour.", cn));
        w.line("*/");
        let inheritance = format!(
            " final\n: public {},\npublic {}BehaviourData<hypothesis, NumericType, use_qt>,\npublic {}IntegrationData<hypothesis, NumericType, use_qt>",
            base, cn, cn
        );
        self.write_template_begin(w, h, &cn, &inheritance);
        w.open("");
        self.write_static_asserts(w, h);
        w.line(&format!("friend std::ostream& operator<< <>(std::ostream&,const {}&);", cn));
        w.blank();
        w.line(&format!("using BehaviourData = {}BehaviourData<hypothesis, NumericType, use_qt>;", cn));
        w.line(&format!("using IntegrationData = {}IntegrationData<hypothesis, NumericType, use_qt>;", cn));
        self.write_type_aliases(w);
        w.line("public:");
        w.blank();
        w.line(&format!("using IntegrationResult = typename {}::IntegrationResult;", base));
        for v in ["SUCCESS", "FAILURE", "UNRELIABLE_RESULTS"] {
            w.line(&format!("using {}::{};", base, v));
        }
        w.line(&format!("using SMFlag = typename {}::SMFlag;", base));
        w.line(&format!("using SMType = typename {}::SMType;", base));
        for v in [
            "ELASTIC",
            "SECANTOPERATOR",
            "TANGENTOPERATOR",
            "CONSISTENTTANGENTOPERATOR",
            "NOSTIFFNESSREQUESTED",
        ] {
            w.line(&format!("using {}::{};", base, v));
        }
        w.blank();
        w.line("private:");
        w.blank();
        Self::write_declarations(w, &data.parameters, "");
        Self::write_declarations(w, &data.state_variables, "d");
        Self::write_declarations(w, &data.integration_variables, "");
        Self::write_declarations(w, &data.integration_variables, "d");
        Self::write_declarations(w, &data.local_variables, "");
        w.line("StiffnessTensor Dt;");
        w.blank();
        (hooks.members)(&ctx, w)?;

        // state updates
        w.line("/*!");
        w.line("* \\brief Update internal variables at end of integration");
        w.line("*/");
        w.open("void updateStateVariables()");
        for v in &data.state_variables {
            w.line(&format!("this->{} += this->d{};", v.name, v.name));
        }
        w.close("");
        w.blank();
        w.line("/*!");
        w.line("* \\brief Update auxiliary state variables at end of integration");
        w.line("*/");
        w.open("void updateAuxiliaryStateVariables()");
        if let Some(code) = ctx.code(CodeBlockSlot::UpdateAuxiliaryStateVariables) {
            w.line("using namespace std;");
            w.line("using namespace tfel::math;");
            w.lines(code);
        }
        w.close("");
        w.blank();
        w.line("//! \\brief policy for treating out of bounds conditions");
        w.line("OutOfBoundsPolicy policy = tfel::material::None;");
        w.blank();
        w.line(&format!("{}(const {}&) = delete;", cn, cn));
        w.line(&format!("{}& operator = (const {}&) = delete;", cn, cn));
        w.blank();
        w.line("public:");
        w.blank();

        // constructor
        w.line("/*!");
        w.line("* \\brief Constructor");
        w.line("*/");
        let mut initializers = vec![
            String::from("BehaviourData(src1)"),
            String::from("IntegrationData(src2)"),
        ];
        initializers.extend(data.parameters.iter().map(|p| format!("{}(params.{})", p.name, p.name)));
        w.open(&format!(
            "{}(const BehaviourData& src1,\nconst IntegrationData& src2,\nconst {}Parameters& params)\n: {}\n",
            cn,
            cn,
            initializers.join(",\n")
        ));
        w.line("this->initialize();");
        w.close("");
        w.blank();

        // initialize
        w.line("/*!");
        w.line("* \\brief Initialize local variables");
        w.line("*/");
        w.open("void initialize()");
        w.line("using namespace std;");
        w.line("using namespace tfel::math;");
        if self.strategy.is_isotropic() {
            isotropic::write_lame_coefficients(&ctx, w)?;
            isotropic::write_mid_step_external_state_variables(&ctx, w);
        }
        for slot in [
            CodeBlockSlot::BeforeInitializeLocalVariables,
            CodeBlockSlot::InitializeLocalVariables,
            CodeBlockSlot::AfterInitializeLocalVariables,
        ] {
            if let Some(code) = ctx.code(slot) {
                w.lines(code);
            }
        }
        (hooks.initialize)(&ctx, w)?;
        w.close("");
        w.blank();

        w.line("/*!");
        w.line("* \\brief set the policy for \"out of bounds\" conditions");
        w.line("*/");
        w.open("void setOutOfBoundsPolicy(const OutOfBoundsPolicy policy_value)");
        w.line("this->policy = policy_value;");
        w.close("");
        w.blank();
        w.open("static ModellingHypothesis::Hypothesis getModellingHypothesis()");
        w.line("return hypothesis;");
        w.close("");
        w.blank();

        // bounds
        w.line("/*!");
        w.line("* \\brief check bounds");
        w.line("*/");
        w.open("void checkBounds() const");
        let checked: Vec<&VariableDescription> = data
            .material_properties
            .iter()
            .chain(data.persistent_variables())
            .chain(data.external_state_variables.iter())
            .chain(data.local_variables.iter())
            .collect();
        self.write_bounds_checks(w, checked.iter().copied());
        w.close("");
        w.blank();

        // prediction operator
        w.line("/*!");
        w.line("* \\brief compute the prediction operator");
        w.line("*/");
        w.open("IntegrationResult\ncomputePredictionOperator(const SMFlag smflag,const SMType smt) override");
        w.line("using namespace std;");
        w.line("using namespace tfel::math;");
        w.open("if(smflag!=MechanicalBehaviourBase::STANDARDTANGENTOPERATOR)");
        w.line(&format!(
            "tfel::raise(\"{}::computePredictionOperator: invalid tangent operator flag\");",
            cn
        ));
        w.close("");
        match ctx.code(CodeBlockSlot::ComputePredictionOperator) {
            Some(code) => w.lines(code),
            None => (hooks.prediction_operator)(&ctx, w)?,
        }
        w.line("return SUCCESS;");
        w.close("");
        w.blank();

        // time step scaling
        w.open("real getMinimalTimeStepScalingFactor() const noexcept override");
        w.line(&format!(
            "return real({});",
            real_literal(crate::base::MIN_TIME_STEP_SCALING_FACTOR)
        ));
        w.close("");
        w.blank();
        for (method, slot) in [
            ("computeAPrioriTimeStepScalingFactor", CodeBlockSlot::APrioriTimeStepScalingFactor),
            ("computeAPosterioriTimeStepScalingFactor", CodeBlockSlot::APosterioriTimeStepScalingFactor),
        ] {
            w.open(&format!(
                "std::pair<bool,real>\n{}(const real current_time_step_scaling_factor) const override",
                method
            ));
            match ctx.code(slot) {
                Some(code) => {
                    w.line("using namespace std;");
                    w.line("auto time_scaling_factor = current_time_step_scaling_factor;");
                    w.lines(code);
                    w.line("return {true,time_scaling_factor};");
                }
                None => w.line("return {true,current_time_step_scaling_factor};"),
            }
            w.close("");
            w.blank();
        }

        // integrator
        w.line("/*!");
        w.line("* \\brief Integrate behaviour law over the time step");
        w.line("*/");
        w.open("IntegrationResult\nintegrate(const SMFlag smflag, const SMType smt) override");
        w.line("using namespace std;");
        w.line("using namespace tfel::math;");
        w.open("if(smflag!=MechanicalBehaviourBase::STANDARDTANGENTOPERATOR)");
        w.line(&format!("tfel::raise(\"{}::integrate: invalid tangent operator flag\");", cn));
        w.close("");
        ctx.debug(w, "integrate", "\"beginning of integration\"")?;
        (hooks.integrator)(&ctx, w)?;
        if !self.config.no_runtime_checks {
            self.write_bounds_checks(w, data.persistent_variables());
        }
        w.line("return SUCCESS;");
        w.close("");
        w.blank();

        // tangent operator
        w.line("/*!");
        w.line("* \\brief compute the consistent tangent operator");
        w.line("*/");
        w.open("bool computeConsistentTangentOperator(const SMType smt)");
        w.line("using namespace std;");
        (hooks.tangent_operator)(&ctx, w)?;
        w.close("");
        w.blank();
        w.open("const StiffnessTensor& getTangentOperator() const");
        w.line("return this->Dt;");
        w.close("");
        w.blank();
        w.line("/*!");
        w.line("* \\brief Update the driving variables and the external state variables");
        w.line("*/");
        w.open("void updateExternalStateVariables()");
        for m in self.bd.main_variables() {
            w.line(&format!("this->{} += this->d{};", m.gradient.name, m.gradient.name));
        }
        for v in &data.external_state_variables {
            w.line(&format!("this->{} += this->d{};", v.name, v.name));
        }
        w.close("");
        w.blank();
        w.line("/*!");
        w.line("* \\brief Destructor");
        w.line("*/");
        w.line(&format!("~{}()", cn));
        w.line("override = default;");
        w.blank();
        w.close(";");
        w.blank();

        // output operator
        let main = Self::main_variables(self.bd);
        let mut printed: Vec<(String, &VariableDescription)> = Vec::new();
        for v in &main {
            printed.push((v.name.clone(), v));
        }
        for v in &main[0..1] {
            printed.push((format!("d{}", v.name), v));
        }
        for v in &data.material_properties {
            printed.push((v.name.clone(), v));
        }
        for v in &data.state_variables {
            printed.push((v.name.clone(), v));
            printed.push((format!("d{}", v.name), v));
        }
        for v in &data.auxiliary_state_variables {
            printed.push((v.name.clone(), v));
        }
        for v in &data.external_state_variables {
            printed.push((v.name.clone(), v));
            printed.push((format!("d{}", v.name), v));
        }
        Self::write_output_operator(w, h, &cn, printed);
        Ok(())
    }

    /// Writes the file holding the behaviour classes and the traits
    fn write_behaviour_file(
        &self,
        targets: &[ModellingHypothesis],
        hypotheses: &[ModellingHypothesis],
    ) -> Result<String, GenError> {
        let cn = self.bd.class_name();
        let mut w = SourceWriter::new(Vec::<String>::new());
        self.write_file_header(
            &mut w,
            &self.bd.behaviour_file_name(),
            &format!("this file implements the {} Behaviour.", cn),
            "",
        );
        for include in ["string", "iostream", "limits", "stdexcept", "algorithm"] {
            w.line(&format!("#include<{}>", include));
        }
        w.blank();
        for include in [
            "TFEL/Raise.hxx",
            "TFEL/PhysicalConstants.hxx",
            "TFEL/Config/TFELConfig.hxx",
            "TFEL/Config/TFELTypes.hxx",
            "TFEL/TypeTraits/IsFundamentalNumericType.hxx",
            "TFEL/TypeTraits/IsReal.hxx",
            "TFEL/Math/General/IEEE754.hxx",
            "TFEL/Material/MaterialException.hxx",
            "TFEL/Material/MechanicalBehaviour.hxx",
            "TFEL/Material/MechanicalBehaviourTraits.hxx",
            "TFEL/Material/OutOfBoundsPolicy.hxx",
            "TFEL/Material/BoundsCheck.hxx",
            "TFEL/Material/IsotropicPlasticity.hxx",
            "TFEL/Material/Hill.hxx",
        ] {
            w.line(&format!("#include\"{}\"", include));
        }
        for include in self.strategy.includes() {
            w.line(&format!("#include\"{}\"", include));
        }
        for include in self.bd.includes() {
            w.line(&format!("#include\"{}\"", include));
        }
        w.line(&format!("#include\"{}\"", self.bd.behaviour_data_file_name()));
        w.line(&format!("#include\"{}\"", self.bd.integration_data_file_name()));
        w.blank();
        w.line("namespace tfel::material{");
        w.blank();
        self.write_parameters_declaration(&mut w, targets);
        self.write_forward_declarations(&mut w, targets, &cn);
        for h in targets {
            // each class gets its own scope of member names
            let mut cw = self.writer(*h);
            self.write_behaviour_class(&mut cw, *h)?;
            w.append(&cw.finish());
        }
        write_traits(self.bd, self.config, self.strategy, hypotheses, &mut w);
        self.write_file_footer(&mut w, "");
        Ok(w.finish())
    }

    /// Writes the source file defining the parameters
    fn write_src_file(&self, targets: &[ModellingHypothesis]) -> Result<String, GenError> {
        let cn = self.bd.class_name();
        let name = format!("{}Parameters", cn);
        let parameters = self.parameters(targets);
        let mut w = SourceWriter::new(Vec::<String>::new());
        w.line("/*!");
        w.line(&format!("* \\file   {}", self.bd.src_file_name()));
        w.line(&format!("* \\brief  this file implements the {} Behaviour.", cn));
        w.line("*         File generated by mbgen");
        w.line("*/");
        w.blank();
        for include in ["string", "cstring", "sstream", "fstream", "stdexcept"] {
            w.line(&format!("#include<{}>", include));
        }
        w.blank();
        w.line("#include\"TFEL/Raise.hxx\"");
        w.line(&format!("#include\"{}\"", self.bd.behaviour_data_file_name()));
        w.line(&format!("#include\"{}\"", self.bd.integration_data_file_name()));
        w.line(&format!("#include\"{}\"", self.bd.behaviour_file_name()));
        w.blank();
        w.line("namespace tfel::material{");
        w.blank();
        w.open(&format!("{}::{}()", name, name));
        for (p, value) in &parameters {
            w.line(&format!("this->{} = {};", p.name, real_literal(*value)));
        }
        w.close("");
        w.blank();
        w.open(&format!("void {}::set(const char* const key,\nconst double v)", name));
        w.line("using namespace std;");
        let mut first = true;
        for (p, _) in &parameters {
            let header = format!("if(::strcmp(\"{}\",key)==0)", p.external_name());
            if first {
                w.open(&header);
                first = false;
            } else {
                w.reopen(&format!(" else {}", header));
            }
            if let Some(b) = &p.bounds {
                if let Some(l) = b.lower {
                    w.open(&format!("if(v<{})", real_literal(l)));
                    w.line(&format!(
                        "tfel::raise(\"{}::set: value of parameter '{}' is below its lower bound\");",
                        name,
                        p.external_name()
                    ));
                    w.close("");
                }
                if let Some(u) = b.upper {
                    w.open(&format!("if(v>{})", real_literal(u)));
                    w.line(&format!(
                        "tfel::raise(\"{}::set: value of parameter '{}' is over its upper bound\");",
                        name,
                        p.external_name()
                    ));
                    w.close("");
                }
            }
            w.line(&format!("this->{} = v;", p.name));
        }
        let unknown = format!(
            "tfel::raise(\"{}::set: no parameter named '\"+std::string(key)+\"'\");",
            name
        );
        if first {
            w.line("static_cast<void>(v);");
            w.line(&unknown);
        } else {
            w.reopen(" else ");
            w.line(&unknown);
            w.close("");
        }
        w.close("");
        w.blank();
        w.line("} // end of namespace tfel::material");
        Ok(w.finish())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{real_literal, BehaviourCodeGenerator, GeneratedFiles};
    use crate::base::{count_occurrences, new_sample_description, BehaviourDescription, BehaviourParameters, Bounds};
    use crate::base::{CodeBlock, CodeBlockSlot, GenError, GeneratorConfig, Mode, ModellingHypothesis, OutOfBoundsPolicy};
    use crate::base::{Position, VariableDescription, DEFAULT_TEST_DIR};
    use crate::codegen::LocalSolveStrategy;

    fn sample() -> BehaviourDescription {
        let mut bd = new_sample_description("Norton");
        let h = ModellingHypothesis::Undefined;
        for (name, type_name) in [("lambda", "stress"), ("mu", "stress"), ("lambda_tdt", "stress"), ("mu_tdt", "stress")] {
            bd.add_local_variable(h, VariableDescription::new(type_name, name).unwrap())
                .unwrap();
        }
        let theta = VariableDescription::new("real", "theta")
            .unwrap()
            .with_bounds(Bounds::range(0.0, 1.0));
        bd.add_parameter(h, theta, 0.5).unwrap();
        bd.add_parameter(h, VariableDescription::new("real", "epsilon").unwrap(), 1e-8)
            .unwrap();
        bd.set_code(
            h,
            CodeBlockSlot::FlowRule,
            CodeBlock::new("this->f = 1.e-10*pow(this->seq,5);\nthis->df_dseq = 5*this->f/this->seq;"),
            Mode::Create,
            Position::AtEnd,
        )
        .unwrap();
        bd
    }

    #[test]
    fn real_literal_works() {
        assert_eq!(real_literal(0.5), "0.5");
        assert_eq!(real_literal(100.0), "100.");
        assert_eq!(real_literal(0.0), "0.");
        assert_eq!(real_literal(1e-8), "1e-8");
        assert_eq!(real_literal(2e11), "2e11");
    }

    #[test]
    fn generate_works() {
        let bd = sample();
        let mut config = GeneratorConfig::new();
        config.set_hypotheses(&[ModellingHypothesis::Tridimensional]).unwrap();
        let strategy = LocalSolveStrategy::IsotropicMisesCreep;
        let files = BehaviourCodeGenerator::new(&bd, &config, &strategy).generate().unwrap();
        assert_eq!(
            files.paths(),
            &[
                "TFEL/Material/NortonBehaviourData.hxx",
                "TFEL/Material/NortonIntegrationData.hxx",
                "TFEL/Material/Norton.hxx",
                "Norton.cxx"
            ]
        );
        let data = files.get("TFEL/Material/NortonBehaviourData.hxx").unwrap();
        assert!(data.contains("#ifndef LIB_TFEL_MATERIAL_NORTON_BEHAVIOUR_DATA_HXX"));
        assert!(data.contains("StrainStensor eto;"));
        assert!(data.contains("stress young;"));
        assert!(data.contains("strain p;"));
        assert!(data.contains("temperature T;"));
        let idata = files.get("TFEL/Material/NortonIntegrationData.hxx").unwrap();
        assert!(idata.contains("StrainStensor deto;"));
        assert!(idata.contains("this->dT *= time_scaling_factor;"));
        let behaviour = files.get("TFEL/Material/Norton.hxx").unwrap();
        assert!(behaviour.contains("struct NortonParameters{"));
        assert!(behaviour.contains("strain dp;"));
        assert!(behaviour.contains("theta(params.theta)"));
        assert!(behaviour.contains("this->lambda=tfel::material::computeLambda(this->young,this->nu);"));
        assert!(behaviour.contains("bool NewtonIntegration(){"));
        assert!(behaviour.contains("this->p += this->dp;"));
        assert!(behaviour.contains("return real(0.1);"));
        assert!(behaviour.contains("class MechanicalBehaviourTraits<Norton<ModellingHypothesis::TRIDIMENSIONAL, NumericType, false> >"));
        // the hooks of the strategy come before the generic epilogue of integrate()
        let hook = behaviour.find("if(!this->NewtonIntegration()){").unwrap();
        let epilogue = behaviour.rfind("return SUCCESS;").unwrap();
        assert!(hook < epilogue);
        let src = files.get("Norton.cxx").unwrap();
        assert!(src.contains("this->theta = 0.5;"));
        assert!(src.contains("this->epsilon = 1e-8;"));
        assert!(src.contains("if(::strcmp(\"theta\",key)==0){"));
        assert!(src.contains("} else if(::strcmp(\"epsilon\",key)==0){"));
        assert!(src.contains("tfel::raise(\"NortonParameters::set: no parameter named '\"+std::string(key)+\"'\");"));
    }

    #[test]
    fn generate_is_idempotent() {
        let bd = sample();
        let config = GeneratorConfig::new();
        let strategy = LocalSolveStrategy::IsotropicMisesCreep;
        let generator = BehaviourCodeGenerator::new(&bd, &config, &strategy);
        assert_eq!(generator.generate().unwrap(), generator.generate().unwrap());
    }

    #[test]
    fn parameters_and_bounds_work() {
        let mut bd = sample();
        let h = ModellingHypothesis::Undefined;
        bd.add_state_variable(
            h,
            VariableDescription::new("real", "f")
                .unwrap()
                .with_physical_bounds(Bounds::range(0.0, 1.0))
                .with_bounds(Bounds::lower(0.0)),
        )
        .unwrap();
        let mut config = GeneratorConfig::new();
        config.set_out_of_bounds_policy(OutOfBoundsPolicy::Strict).unwrap();
        let strategy = LocalSolveStrategy::IsotropicMisesCreep;
        let mut params = BehaviourParameters::new(bd.data(h));
        params.set("theta", 1.0).unwrap();
        let files = BehaviourCodeGenerator::new(&bd, &config, &strategy)
            .with_parameters(&params)
            .generate()
            .unwrap();
        let behaviour = files.get("TFEL/Material/Norton.hxx").unwrap();
        assert!(behaviour.contains(
            "tfel::material::BoundsCheck<N>::lowerAndUpperBoundsChecks(\"f\",this->f,static_cast<real>(0.),static_cast<real>(1.));"
        ));
        assert!(behaviour.contains("tfel::material::BoundsCheck<N>::lowerBoundCheck(\"f\",this->f,static_cast<real>(0.),this->policy);"));
        // checkBounds() and the end of integrate()
        assert_eq!(count_occurrences(behaviour, "lowerAndUpperBoundsChecks(\"f\""), 2);
        let src = files.get("Norton.cxx").unwrap();
        assert!(src.contains("this->theta = 1.;"));
        assert!(src.contains("if(v<0.){"));

        config.set_no_runtime_checks(true).unwrap();
        let files = BehaviourCodeGenerator::new(&bd, &config, &strategy).generate().unwrap();
        let behaviour = files.get("TFEL/Material/Norton.hxx").unwrap();
        assert_eq!(count_occurrences(behaviour, "lowerAndUpperBoundsChecks(\"f\""), 1);
    }

    #[test]
    fn specialised_hypotheses_work() {
        let mut bd = sample();
        bd.specialise(ModellingHypothesis::PlaneStrain).unwrap();
        let mut config = GeneratorConfig::new();
        config.set_hypotheses(&[ModellingHypothesis::PlaneStrain]).unwrap();
        let strategy = LocalSolveStrategy::IsotropicMisesCreep;
        let files = BehaviourCodeGenerator::new(&bd, &config, &strategy).generate().unwrap();
        let behaviour = files.get("TFEL/Material/Norton.hxx").unwrap();
        // all treated hypotheses are specialised: no generic class
        assert!(!behaviour.contains("class Norton final"));
        assert!(behaviour.contains("class Norton<ModellingHypothesis::PLANESTRAIN,NumericType,use_qt> final"));
        assert!(behaviour.contains(
            "static constexpr ModellingHypothesis::Hypothesis hypothesis = ModellingHypothesis::PLANESTRAIN;"
        ));
    }

    #[test]
    fn generate_captures_errors() {
        let bd = new_sample_description("Norton");
        let config = GeneratorConfig::new();
        let strategy = LocalSolveStrategy::IsotropicMisesCreep;
        assert_eq!(
            BehaviourCodeGenerator::new(&bd, &config, &strategy).generate().err(),
            Some(GenError::MissingCodeBlock {
                slot: "FlowRule".to_string(),
                hypothesis: "AxisymmetricalGeneralisedPlaneStrain".to_string()
            })
        );
        let mut bd = sample();
        bd.set_modelling_hypotheses(&[ModellingHypothesis::Tridimensional]).unwrap();
        let mut config = GeneratorConfig::new();
        config.set_hypotheses(&[ModellingHypothesis::PlaneStress]).unwrap();
        assert_eq!(
            BehaviourCodeGenerator::new(&bd, &config, &strategy).generate().err(),
            Some(GenError::UnsupportedHypothesis("PlaneStress".to_string()))
        );
        let mut bd = sample();
        bd.set_code(
            ModellingHypothesis::Undefined,
            CodeBlockSlot::Integrator,
            CodeBlock::with_members("this->q += 1;", &["q"]),
            Mode::Create,
            Position::AtEnd,
        )
        .unwrap();
        let config = GeneratorConfig::new();
        assert_eq!(
            BehaviourCodeGenerator::new(&bd, &config, &strategy).generate().err(),
            Some(GenError::UnknownVariable("q".to_string()))
        );
    }

    #[test]
    fn write_to_works() {
        let files = GeneratedFiles {
            files: vec![(String::from("TFEL/Material/Test.hxx"), String::from("// test\n"))],
        };
        let out_dir = format!("{}/generator", DEFAULT_TEST_DIR);
        let written = files.write_to(&out_dir).unwrap();
        assert_eq!(written.len(), 1);
        let content = std::fs::read_to_string(&written[0]).unwrap();
        assert_eq!(content, "// test\n");
    }
}
