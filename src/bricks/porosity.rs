use super::{check, data_structure, declare_material_properties, reserve_names, DataMap, FlowEquationContext};
use super::{MaterialProperty, OptionDescription, OptionType};
use crate::base::{throw_runtime_error, BehaviourDescription, Bounds, GenError, ModellingHypothesis, VariableDescription};
use crate::base::{DEFAULT_STAGGERED_CONVERGENCE_CRITERION, DEFAULT_STAGGERED_MAXIMUM_ITERATIONS, POROSITY_UPPER_BOUND_SAFETY_FACTOR};
use crate::codegen::{ResidualTerm, StaggeredAcceleration, StaggeredPorosityScheme};

/// Name of the porosity
pub const POROSITY: &str = "f";

/// Name of the parameter stopping the staggered scheme
pub const STAGGERED_CONVERGENCE_CRITERION: &str = "staggered_scheme_convergence_criterion";

/// Name of the parameter limiting the number of iterations of the staggered scheme
pub const STAGGERED_MAXIMUM_ITERATIONS: &str = "staggered_scheme_maximum_number_of_iterations";

/// Name of the flag selecting the full system of implicit equations
pub const COMPUTE_STANDARD_SYSTEM: &str = "computeStandardSystemOfImplicitEquations";

/// Name of the current estimate of the porosity increment (staggered scheme)
pub const CURRENT_ESTIMATE: &str = "current_estimate_of_the_porosity_increment";

/// Defines how the porosity evolution is coupled to the other equations
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PorosityEvolutionAlgorithm {
    /// The porosity is an unknown of the implicit system like the others
    StandardImplicitScheme,

    /// Fixed-point iterations on the porosity increment around the implicit system
    StaggeredScheme {
        /// Criterion on the difference between two successive estimates
        convergence_criterion: f64,

        /// Maximum number of fixed-point iterations
        maximum_number_of_iterations: usize,

        /// Acceleration of the fixed-point iterations
        acceleration: StaggeredAcceleration,
    },
}

impl Default for PorosityEvolutionAlgorithm {
    fn default() -> Self {
        PorosityEvolutionAlgorithm::StaggeredScheme {
            convergence_criterion: DEFAULT_STAGGERED_CONVERGENCE_CRITERION,
            maximum_number_of_iterations: DEFAULT_STAGGERED_MAXIMUM_ITERATIONS,
            acceleration: StaggeredAcceleration::Aitken,
        }
    }
}

impl PorosityEvolutionAlgorithm {
    /// Returns the options of the staggered scheme
    fn staggered_options() -> Vec<OptionDescription> {
        vec![
            OptionDescription::new("convergence_criterion", "stopping criterion", OptionType::Real),
            OptionDescription::new(
                "maximum_number_of_iterations",
                "maximum number of iterations",
                OptionType::Real,
            ),
            OptionDescription::new("acceleration_algorithm", "Relaxation or Aitken", OptionType::String),
            OptionDescription::new("relaxation_factor", "relaxation factor", OptionType::Real)
                .requires(&["acceleration_algorithm"]),
        ]
    }

    /// Reads the algorithm from its name and options
    pub fn new(name: &str, d: &DataMap) -> Result<Self, GenError> {
        match name {
            "standard_implicit_scheme" => {
                check(name, d, &[])?;
                Ok(PorosityEvolutionAlgorithm::StandardImplicitScheme)
            }
            "staggered_scheme" => {
                check(name, d, &PorosityEvolutionAlgorithm::staggered_options())?;
                let invalid = |n: &str, reason| GenError::InvalidParameterValue {
                    name: n.to_string(),
                    reason,
                };
                let mut convergence_criterion = DEFAULT_STAGGERED_CONVERGENCE_CRITERION;
                if let Some(value) = d.get("convergence_criterion").and_then(|x| x.as_real()) {
                    if value <= 0.0 {
                        return Err(invalid("convergence_criterion", "must be positive"));
                    }
                    convergence_criterion = value;
                }
                let mut maximum_number_of_iterations = DEFAULT_STAGGERED_MAXIMUM_ITERATIONS;
                if let Some(value) = d.get("maximum_number_of_iterations").and_then(|x| x.as_real()) {
                    if value < 1.0 || value.fract() != 0.0 {
                        return Err(invalid("maximum_number_of_iterations", "must be a positive integer"));
                    }
                    maximum_number_of_iterations = value as usize;
                }
                let factor = d.get("relaxation_factor").and_then(|x| x.as_real());
                let acceleration = match d.get("acceleration_algorithm").and_then(|x| x.as_str()) {
                    None | Some("Aitken") => {
                        if factor.is_some() {
                            return Err(GenError::IncompatibleOptions {
                                option: "relaxation_factor".to_string(),
                                incompatible: "Aitken".to_string(),
                            });
                        }
                        StaggeredAcceleration::Aitken
                    }
                    Some("Relaxation") => {
                        let factor = factor.unwrap_or(1.0);
                        if factor <= 0.0 || factor > 1.0 {
                            return Err(invalid("relaxation_factor", "must be in ]0,1]"));
                        }
                        StaggeredAcceleration::Relaxation(factor)
                    }
                    Some(other) => {
                        return Err(throw_runtime_error(
                            "StandardElastoViscoPlasticityBrick::treatPorosityEvolutionAlgorithmSection",
                            &format!("unsupported acceleration algorithm '{}'", other),
                        ))
                    }
                };
                Ok(PorosityEvolutionAlgorithm::StaggeredScheme {
                    convergence_criterion,
                    maximum_number_of_iterations,
                    acceleration,
                })
            }
            _ => Err(throw_runtime_error(
                "StandardElastoViscoPlasticityBrick::treatPorosityEvolutionAlgorithmSection",
                &format!("unsupported porosity evolution algorithm '{}'", name),
            )),
        }
    }
}

/// Holds the treatment of the porosity `f`
///
/// Inelastic flows whose normal is not deviatoric make the porosity grow as
/// `(1-f)*dp*trace(n)`; nucleation models add their own contributions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PorosityEvolution {
    /// Coupling algorithm
    pub algorithm: PorosityEvolutionAlgorithm,

    /// Takes the volume change of the elastic strain into account
    pub elastic_contribution: bool,
}

impl PorosityEvolution {
    /// Returns the options of the `porosity_evolution` section
    pub fn options() -> Vec<OptionDescription> {
        vec![
            OptionDescription::new("algorithm", "porosity evolution algorithm", OptionType::DataStructure),
            OptionDescription::new(
                "elastic_contribution",
                "elastic contribution to the porosity growth",
                OptionType::Boolean,
            ),
        ]
    }

    /// Reads the `porosity_evolution` section
    pub fn new(d: &DataMap) -> Result<Self, GenError> {
        check("porosity_evolution", d, &PorosityEvolution::options())?;
        let algorithm = match d.get("algorithm") {
            Some(data) => {
                let (name, options) = data_structure("algorithm", data)?;
                PorosityEvolutionAlgorithm::new(&name, &options)?
            }
            None => PorosityEvolutionAlgorithm::default(),
        };
        Ok(PorosityEvolution {
            algorithm,
            elastic_contribution: d.get("elastic_contribution").and_then(|x| x.as_bool()).unwrap_or(false),
        })
    }

    /// Indicates that the staggered scheme is used
    pub fn is_staggered(&self) -> bool {
        matches!(self.algorithm, PorosityEvolutionAlgorithm::StaggeredScheme { .. })
    }

    /// Declares the porosity and the parameters of the staggered scheme
    pub fn initialize(&self, bd: &mut BehaviourDescription) -> Result<(), GenError> {
        let h = ModellingHypothesis::Undefined;
        let f = VariableDescription::new("real", POROSITY)?
            .with_glossary_name("Porosity")
            .with_physical_bounds(Bounds::range(0.0, 1.0))
            .with_bounds(Bounds::range(0.0, POROSITY_UPPER_BOUND_SAFETY_FACTOR));
        bd.add_state_variable(h, f)?;
        reserve_names(bd, &[format!("{}_", POROSITY)])?;
        if let PorosityEvolutionAlgorithm::StaggeredScheme {
            convergence_criterion,
            maximum_number_of_iterations,
            ..
        } = self.algorithm
        {
            reserve_names(bd, &[COMPUTE_STANDARD_SYSTEM.to_string(), CURRENT_ESTIMATE.to_string()])?;
            bd.add_parameter(
                h,
                VariableDescription::new("real", STAGGERED_CONVERGENCE_CRITERION)?,
                convergence_criterion,
            )?;
            bd.add_parameter(
                h,
                VariableDescription::new("real", STAGGERED_MAXIMUM_ITERATIONS)?,
                maximum_number_of_iterations as f64,
            )?;
        }
        Ok(())
    }

    /// Returns the setup of the staggered scheme, if any
    pub fn staggered_scheme(&self) -> Option<StaggeredPorosityScheme> {
        match self.algorithm {
            PorosityEvolutionAlgorithm::StandardImplicitScheme => None,
            PorosityEvolutionAlgorithm::StaggeredScheme { acceleration, .. } => Some(StaggeredPorosityScheme {
                porosity: POROSITY.to_string(),
                acceleration,
            }),
        }
    }

    /// Returns the term declaring the porosity at the middle of the time step
    ///
    /// It must precede every term using `f_`.
    pub fn mid_step_term(&self) -> ResidualTerm {
        ResidualTerm::new(
            POROSITY,
            &format!(
                "const auto {f}_ = this->{f}+(this->theta)*(this->d{f});",
                f = POROSITY
            ),
        )
    }

    /// Restricts some code to the full system of implicit equations
    pub fn contribution(&self, code: &str) -> String {
        if self.is_staggered() {
            format!("if(this->{}){{\n{}}}\n", COMPUTE_STANDARD_SYSTEM, code)
        } else {
            code.to_string()
        }
    }

    /// Returns the growth of the porosity due to the inelastic flow
    pub fn growth_term(&self, ctx: &FlowEquationContext) -> ResidualTerm {
        let fid = ctx.fid.as_str();
        let f = POROSITY;
        let dp = format!("(this->dp{})", fid);
        let mut c = format!("f{f} -= (1-{f}_)*{dp}*trace(n{fid});\n", f = f, dp = dp, fid = fid);
        if ctx.analytical {
            c.push_str(&format!("df{f}_ddp{fid} -= (1-{f}_)*trace(n{fid});\n", f = f, fid = fid));
            c.push_str(&format!(
                "df{f}_dd{f} += (this->theta)*{dp}*trace(n{fid});\n",
                f = f,
                dp = dp,
                fid = fid
            ));
            c.push_str(&ctx.stress_derivatives(
                f,
                &format!("(1-{f}_)*{dp}*((Stensor::Id())*(dn{fid}_ds{fid}))", f = f, dp = dp, fid = fid),
                true,
            ));
            c.push_str(&ctx.porosity_derivative(
                f,
                &format!("-(1-{f}_)*{dp}*trace(dn{fid}_d{f})", f = f, dp = dp, fid = fid),
            ));
        }
        ctx.term(f, &self.contribution(&c), &[f])
    }

    /// Returns the final terms: elastic contribution and fixed-point estimate
    pub fn final_terms(&self, analytical: bool) -> Vec<ResidualTerm> {
        let f = POROSITY;
        let mut terms = Vec::new();
        if self.elastic_contribution {
            let mut c = format!("f{f} -= (1-{f}_)*trace(this->deel);\n", f = f);
            if analytical {
                c.push_str(&format!("df{f}_ddeel -= (1-{f}_)*Stensor::Id();\n", f = f));
                c.push_str(&format!("df{f}_dd{f} += (this->theta)*trace(this->deel);\n", f = f));
            }
            let term = ResidualTerm::new(f, &self.contribution(&c));
            terms.push(if analytical {
                term.with_inline_derivative("eel").with_inline_derivative(f)
            } else {
                term.with_dependency("eel").with_dependency(f)
            });
        }
        if self.is_staggered() {
            terms.push(ResidualTerm::new(
                f,
                &format!(
                    "if(!this->{}){{\nf{} -= this->{};\n}}\n",
                    COMPUTE_STANDARD_SYSTEM, f, CURRENT_ESTIMATE
                ),
            ));
        }
        terms
    }
}

/// Implements the porosity nucleation models
///
/// The nucleated porosity is `An*dp`, clamped so that the porosity never
/// exceeds `fmax`. Beyond the clamp, the derivatives are dropped.
#[derive(Clone, Debug, PartialEq)]
pub enum PorosityNucleationModel {
    /// Gaussian distribution of the nucleation strain
    ChuNeedleman1980StrainBased {
        fn_: MaterialProperty,
        en: MaterialProperty,
        sn: MaterialProperty,
        fmax: MaterialProperty,
    },

    /// Gaussian distribution of the nucleation stress, evaluated on the maximum principal stress
    ChuNeedleman1980StressBased {
        fn_: MaterialProperty,
        sigm: MaterialProperty,
        sn: MaterialProperty,
        fmax: MaterialProperty,
    },
}

impl PorosityNucleationModel {
    /// Returns the options of a model given its name
    pub fn options(name: &str) -> Result<Vec<OptionDescription>, GenError> {
        let mp = |n: &str, d: &str| OptionDescription::new(n, d, OptionType::MaterialProperty);
        let fmax = mp("fmax", "maximum porosity reachable by nucleation");
        match name {
            "ChuNeedleman1980 (strain)" => Ok(vec![
                mp("fn", "nucleated porosity"),
                mp("en", "mean nucleation strain"),
                mp("sn", "standard deviation of the nucleation strain"),
                fmax,
            ]),
            "ChuNeedleman1980 (stress)" => Ok(vec![
                mp("fn", "nucleated porosity"),
                mp("sigm", "mean nucleation stress"),
                mp("sn", "standard deviation of the nucleation stress"),
                fmax,
            ]),
            _ => Err(throw_runtime_error(
                "PorosityNucleationModelFactory::generate",
                &format!("no porosity nucleation model named '{}'", name),
            )),
        }
    }

    /// Reads a model from its name and options
    pub fn new(name: &str, d: &DataMap) -> Result<Self, GenError> {
        check(name, d, &PorosityNucleationModel::options(name)?)?;
        let fn_ = MaterialProperty::required(name, d, "fn")?;
        let sn = MaterialProperty::required(name, d, "sn")?;
        let fmax = MaterialProperty::or_constant(d, "fmax", 1.0)?;
        if name == "ChuNeedleman1980 (strain)" {
            return Ok(PorosityNucleationModel::ChuNeedleman1980StrainBased {
                fn_,
                en: MaterialProperty::required(name, d, "en")?,
                sn,
                fmax,
            });
        }
        Ok(PorosityNucleationModel::ChuNeedleman1980StressBased {
            fn_,
            sigm: MaterialProperty::required(name, d, "sigm")?,
            sn,
            fmax,
        })
    }

    /// Returns the name of a member of the model
    fn id(&self, option: &str, fid: &str, nid: &str) -> String {
        let prefix = match self {
            PorosityNucleationModel::ChuNeedleman1980StrainBased { .. } => "cn",
            PorosityNucleationModel::ChuNeedleman1980StressBased { .. } => "cns",
        };
        format!("{}_{}{}_{}", prefix, option, fid, nid)
    }

    /// Declares the material properties of the model
    pub fn initialize(&self, bd: &mut BehaviourDescription, fid: &str, nid: &str) -> Result<(), GenError> {
        let id = |n: &str| self.id(n, fid, nid);
        match self {
            PorosityNucleationModel::ChuNeedleman1980StrainBased { fn_, en, sn, fmax } => declare_material_properties(
                bd,
                &[
                    (fn_, "real", id("fn")),
                    (en, "strain", id("en")),
                    (sn, "strain", id("sn")),
                    (fmax, "real", id("fmax")),
                ],
            ),
            PorosityNucleationModel::ChuNeedleman1980StressBased { fn_, sigm, sn, fmax } => {
                declare_material_properties(
                    bd,
                    &[
                        (fn_, "real", id("fn")),
                        (sigm, "stress", id("sigm")),
                        (sn, "stress", id("sn")),
                        (fmax, "real", id("fmax")),
                    ],
                )
            }
        }
    }

    /// Returns the term adding the nucleated porosity to the porosity residual
    pub fn nucleation_term(&self, ctx: &FlowEquationContext, nid: &str, evolution: &PorosityEvolution) -> ResidualTerm {
        let fid = ctx.fid.as_str();
        let f = POROSITY;
        let id = |n: &str| format!("this->{}", self.id(n, fid, nid));
        let suffix = format!("{}_{}", fid, nid);
        let an = format!("An{}", suffix);
        let xn = format!("xn{}", suffix);
        let dfn = format!("dfn{}", suffix);
        let dp = format!("(this->dp{})", fid);
        let mut c = String::new();
        match self {
            PorosityNucleationModel::ChuNeedleman1980StrainBased { .. } => {
                c.push_str(&format!(
                    "const auto {} = ((this->p{}+(this->theta)*{})-({}))/({});\n",
                    xn,
                    fid,
                    dp,
                    id("en"),
                    id("sn")
                ));
            }
            PorosityNucleationModel::ChuNeedleman1980StressBased { .. } => {
                let vp = format!("vp{}", suffix);
                c.push_str(&format!("const auto {} = (this->sig).computeEigenValues();\n", vp));
                c.push_str(&format!(
                    "const auto {xn} = (*(std::max_element({vp}.begin(),{vp}.end()))-({sigm}))/({sn});\n",
                    xn = xn,
                    vp = vp,
                    sigm = id("sigm"),
                    sn = id("sn")
                ));
            }
        }
        c.push_str(&format!(
            "const auto {an} = ({fn_})/(({sn})*std::sqrt(2*M_PI))*std::exp(-{xn}*{xn}/2);\n",
            an = an,
            fn_ = id("fn"),
            sn = id("sn"),
            xn = xn
        ));
        c.push_str(&format!("const auto {} = {}*{};\n", dfn, an, dp));
        c.push_str(&format!("if(this->{f}+{dfn}>{fmax}){{\n", f = f, dfn = dfn, fmax = id("fmax")));
        c.push_str(&format!("f{f} -= ({fmax})-(this->{f});\n", f = f, fmax = id("fmax")));
        c.push_str("} else {\n");
        c.push_str(&format!("f{} -= {};\n", f, dfn));
        if ctx.analytical {
            match self {
                PorosityNucleationModel::ChuNeedleman1980StrainBased { .. } => {
                    c.push_str(&format!(
                        "df{f}_ddp{fid} -= {an}-{dp}*{an}*{xn}*(this->theta)/({sn});\n",
                        f = f,
                        fid = fid,
                        an = an,
                        dp = dp,
                        xn = xn,
                        sn = id("sn")
                    ));
                }
                PorosityNucleationModel::ChuNeedleman1980StressBased { .. } => {
                    c.push_str(&format!("df{}_ddp{} -= {};\n", f, fid, an));
                }
            }
        }
        c.push_str("}\n");
        ctx.term(f, &evolution.contribution(&c), &[f])
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
