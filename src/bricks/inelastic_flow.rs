use super::{add_local_variable, append_code, check, data_structure, data_structures, declare_material_properties};
use super::{elastic_prediction, radius, variable_id, CriterionRole, DataMap, HookeStressPotential};
use super::{IsotropicHardeningRule, KinematicHardeningRule, MaterialProperty, OptionDescription, OptionType};
use super::{PorosityEvolution, PorosityNucleationModel, StressCriterion, ELASTIC_STRAIN, POROSITY};
use crate::base::{throw_runtime_error, BehaviourDescription, CodeBlockSlot, GenError, ModellingHypothesis};
use crate::base::VariableDescription;
use crate::codegen::ResidualTerm;

/// Holds what the equations of one inelastic flow share
pub struct FlowEquationContext<'a> {
    /// Flow id (empty if the behaviour has a single flow)
    pub fid: String,

    /// Stress potential
    pub hooke: &'a HookeStressPotential,

    /// Kinematic hardening rules of the flow (their ids are their indices)
    pub kinematic: &'a [KinematicHardeningRule],

    /// Name of the porosity, if the flow direction depends on it
    pub porosity: Option<&'a str>,

    /// Writes the jacobian blocks
    pub analytical: bool,

    /// Condition activating the flow
    pub guard: Option<String>,
}

impl<'a> FlowEquationContext<'a> {
    /// Returns the unknowns the equations of the flow depend on
    pub fn unknowns(&self) -> Vec<String> {
        let mut unknowns = vec![ELASTIC_STRAIN.to_string(), format!("p{}", self.fid)];
        for kid in 0..self.kinematic.len() {
            unknowns.push(variable_id("a", &self.fid, &kid.to_string()));
        }
        if let Some(f) = self.porosity {
            unknowns.push(f.to_string());
        }
        unknowns
    }

    /// Returns the code propagating a derivative with respect to the effective stress
    ///
    /// `mdf_ds` is the opposite of the derivative of the residual with respect to
    /// the effective stress, which depends on the elastic strain and the back strains.
    pub fn stress_derivatives(&self, residual: &str, mdf_ds: &str, scalar_residual: bool) -> String {
        let mut c = self
            .hooke
            .stress_derivative(residual, &format!("-({})", mdf_ds), scalar_residual);
        for (kid, rule) in self.kinematic.iter().enumerate() {
            c.push_str(&rule.stress_derivative(residual, mdf_ds, &self.fid, &kid.to_string()));
        }
        c
    }

    /// Returns the code adding the derivative with respect to the porosity
    ///
    /// `df_df` is the derivative with respect to the mid-step porosity.
    pub fn porosity_derivative(&self, residual: &str, df_df: &str) -> String {
        match self.porosity {
            Some(f) => format!("df{}_dd{} += (this->theta)*({});\n", residual, f, df_df),
            None => String::new(),
        }
    }

    /// Returns the derivatives of a residual holding `-factor*n<fid>`
    pub fn normal_derivatives(&self, residual: &str, factor: &str) -> String {
        let fid = &self.fid;
        let mut c = self.stress_derivatives(residual, &format!("{}*dn{}_ds{}", factor, fid, fid), false);
        if let Some(f) = self.porosity {
            c.push_str(&self.porosity_derivative(residual, &format!("-{}*dn{}_d{}", factor, fid, f)));
        }
        c
    }

    /// Builds a residual term of the flow
    ///
    /// The term depends on all the unknowns of the flow and on `extra`. With an
    /// analytical jacobian, the code is expected to update the jacobian blocks.
    pub fn term(&self, residual: &str, code: &str, extra: &[&str]) -> ResidualTerm {
        let mut term = ResidualTerm::new(residual, code);
        if let Some(guard) = &self.guard {
            term = term.with_guard(guard);
        }
        let mut unknowns = self.unknowns();
        for e in extra {
            if !unknowns.iter().any(|u| u == e) {
                unknowns.push(e.to_string());
            }
        }
        for u in &unknowns {
            term = if self.analytical {
                term.with_inline_derivative(u)
            } else {
                term.with_dependency(u)
            };
        }
        term
    }
}

/// Defines the flow rules
#[derive(Clone, Debug, PartialEq)]
pub enum FlowRule {
    /// Rate-independent plasticity `seq - R = 0`
    Plastic,

    /// `dp/dt = A*<(seq-R)/K>^n`
    Norton {
        k: MaterialProperty,
        n: MaterialProperty,
        a: MaterialProperty,
    },
}

/// Implements an inelastic flow `deel = -dp*n`
#[derive(Clone, Debug, PartialEq)]
pub struct InelasticFlow {
    /// Flow rule
    pub rule: FlowRule,

    /// Stress criterion giving the yield surface (and the flow direction if no flow criterion is given)
    pub criterion: StressCriterion,

    /// Stress criterion giving the flow direction (non associated flow)
    pub flow_criterion: Option<StressCriterion>,

    /// Isotropic hardening rules, summed
    pub isotropic_hardening: Vec<IsotropicHardeningRule>,

    /// Kinematic hardening rules
    pub kinematic_hardening: Vec<KinematicHardeningRule>,

    /// Porosity nucleation models
    pub nucleation: Vec<PorosityNucleationModel>,
}

impl InelasticFlow {
    /// Returns the options of a flow given its name
    pub fn options(name: &str) -> Result<Vec<OptionDescription>, GenError> {
        let mut opts = vec![
            OptionDescription::new("criterion", "stress criterion", OptionType::DataStructure),
            OptionDescription::new("flow_criterion", "flow criterion", OptionType::DataStructure),
            OptionDescription::new(
                "isotropic_hardening",
                "isotropic hardening rules",
                OptionType::DataStructures,
            ),
            OptionDescription::new(
                "kinematic_hardening",
                "kinematic hardening rules",
                OptionType::DataStructures,
            ),
            OptionDescription::new("nucleation_model", "porosity nucleation models", OptionType::DataStructures),
        ];
        match name {
            "Plastic" => Ok(opts),
            "Norton" => {
                let mp = |n: &str, d: &str| OptionDescription::new(n, d, OptionType::MaterialProperty);
                opts.push(mp("K", "Norton coefficient"));
                opts.push(mp("n", "Norton exponent"));
                opts.push(mp("A", "Norton rate factor"));
                Ok(opts)
            }
            _ => Err(throw_runtime_error(
                "InelasticFlowFactory::generate",
                &format!("no inelastic flow named '{}'", name),
            )),
        }
    }

    /// Reads a flow from its name and options
    pub fn new(name: &str, d: &DataMap) -> Result<Self, GenError> {
        check(name, d, &InelasticFlow::options(name)?)?;
        let criterion = match d.get("criterion") {
            Some(data) => {
                let (n, options) = data_structure("criterion", data)?;
                StressCriterion::new(&n, &options)?
            }
            None => {
                return Err(throw_runtime_error(
                    "InelasticFlowBase::initialize",
                    "no stress criterion defined",
                ))
            }
        };
        let flow_criterion = match d.get("flow_criterion") {
            Some(data) => {
                let (n, options) = data_structure("flow_criterion", data)?;
                Some(StressCriterion::new(&n, &options)?)
            }
            None => None,
        };
        let mut isotropic_hardening = Vec::new();
        if let Some(data) = d.get("isotropic_hardening") {
            for (n, options) in data_structures("isotropic_hardening", data)? {
                isotropic_hardening.push(IsotropicHardeningRule::new(&n, &options)?);
            }
        }
        let mut kinematic_hardening = Vec::new();
        if let Some(data) = d.get("kinematic_hardening") {
            for (n, options) in data_structures("kinematic_hardening", data)? {
                kinematic_hardening.push(KinematicHardeningRule::new(&n, &options)?);
            }
        }
        let mut nucleation = Vec::new();
        if let Some(data) = d.get("nucleation_model") {
            for (n, options) in data_structures("nucleation_model", data)? {
                nucleation.push(PorosityNucleationModel::new(&n, &options)?);
            }
        }
        let rule = match name {
            "Norton" => FlowRule::Norton {
                k: MaterialProperty::required(name, d, "K")?,
                n: MaterialProperty::required(name, d, "n")?,
                a: MaterialProperty::or_constant(d, "A", 1.0)?,
            },
            _ => {
                if isotropic_hardening.is_empty() {
                    return Err(throw_runtime_error(
                        "PlasticInelasticFlow::initialize",
                        "no isotropic hardening rule defined",
                    ));
                }
                FlowRule::Plastic
            }
        };
        Ok(InelasticFlow {
            rule,
            criterion,
            flow_criterion,
            isotropic_hardening,
            kinematic_hardening,
            nucleation,
        })
    }

    /// Returns the criterion giving the flow direction
    pub fn flow_direction_criterion(&self) -> &StressCriterion {
        self.flow_criterion.as_ref().unwrap_or(&self.criterion)
    }

    /// Indicates that the flow depends on the porosity
    pub fn is_coupled_with_porosity_evolution(&self) -> bool {
        self.criterion.is_coupled_with_porosity_evolution()
            || self.flow_direction_criterion().is_coupled_with_porosity_evolution()
            || !self.nucleation.is_empty()
    }

    /// Indicates that the flow is only active above the yield surface
    pub fn has_activation(&self) -> bool {
        !self.isotropic_hardening.is_empty()
    }

    /// Returns the flag activating the flow
    fn activation_flag(fid: &str) -> String {
        format!("bpl{}", fid)
    }

    /// Returns the code computing the back stresses and the effective stress `s<fid>`
    fn effective_stress(&self, fid: &str) -> String {
        let mut c = String::new();
        let mut x = String::new();
        for (kid, rule) in self.kinematic_hardening.iter().enumerate() {
            let kid = kid.to_string();
            c.push_str(&rule.kinematic_hardenings(fid, &kid));
            x.push_str(&format!("-{}_", rule.variables(fid, &kid)[0]));
        }
        if x.is_empty() {
            c.push_str(&format!("const auto& s{} = this->sig;\n", fid));
        } else {
            c.push_str(&format!("const auto s{} = eval(this->sig{});\n", fid, x));
        }
        c
    }

    /// Declares the equivalent strain, the material properties and the activation code
    pub fn initialize(
        &self,
        bd: &mut BehaviourDescription,
        hooke: &HookeStressPotential,
        fid: &str,
        porosity: Option<&PorosityEvolution>,
    ) -> Result<(), GenError> {
        let h = ModellingHypothesis::Undefined;
        let p = format!("p{}", fid);
        let mut variable = VariableDescription::new("strain", &p)?;
        variable = if fid.is_empty() {
            variable.with_glossary_name("EquivalentPlasticStrain")
        } else {
            variable.with_entry_name(&format!("EquivalentPlasticStrain{}", fid))
        };
        bd.add_state_variable(h, variable)?;
        match &self.flow_criterion {
            Some(flow) => {
                self.criterion.initialize(bd, fid, CriterionRole::Stress)?;
                flow.initialize(bd, fid, CriterionRole::Flow)?;
            }
            None => self.criterion.initialize(bd, fid, CriterionRole::StressAndFlow)?,
        }
        for (ihid, rule) in self.isotropic_hardening.iter().enumerate() {
            rule.initialize(bd, fid, &ihid.to_string())?;
        }
        for (kid, rule) in self.kinematic_hardening.iter().enumerate() {
            rule.initialize(bd, fid, &kid.to_string())?;
        }
        if let FlowRule::Norton { k, n, a } = &self.rule {
            declare_material_properties(
                bd,
                &[
                    (k, "stress", format!("K{}", fid)),
                    (n, "real", format!("E{}", fid)),
                    (a, "strainrate", format!("A{}", fid)),
                ],
            )?;
        }
        if !self.nucleation.is_empty() && porosity.is_none() {
            return Err(throw_runtime_error(
                "InelasticFlowBase::initialize",
                "nucleation models require the porosity evolution",
            ));
        }
        for (nid, model) in self.nucleation.iter().enumerate() {
            model.initialize(bd, fid, &nid.to_string())?;
        }
        if !self.has_activation() {
            return Ok(());
        }
        let flag = InelasticFlow::activation_flag(fid);
        add_local_variable(bd, "bool", &flag)?;
        let porous = self.criterion.is_coupled_with_porosity_evolution();
        let f = if porous { Some(POROSITY) } else { None };
        let mut c = String::new();
        let mut x = String::new();
        for (kid, rule) in self.kinematic_hardening.iter().enumerate() {
            let kid = kid.to_string();
            c.push_str(&rule.initial_values(fid, &kid));
            x.push_str(&format!("-{}", rule.variables(fid, &kid)[0]));
        }
        c.push_str(&format!("const auto sel{} = eval(this->sigel{});\n", fid, x));
        c.push_str(&self.criterion.elastic_prediction(fid, &hooke.equivalent_stress_lower_bound(), f)?);
        c.push_str(&elastic_prediction(&self.isotropic_hardening, fid));
        c.push_str(&format!("this->{} = seqel{} > Rel{};\n", flag, fid, fid));
        append_code(bd, CodeBlockSlot::InitializeLocalVariables, &c, &[&flag, "sigel"])?;
        let mut check = format!("if(converged){{\nif(this->{}){{\n", flag);
        check.push_str(&format!("if(this->dp{} < 0){{\n", fid));
        check.push_str("// deactivating the flow\n");
        check.push_str(&format!("converged = false;\nthis->{} = false;\n}}\n", flag));
        check.push_str("} else {\n");
        if porous {
            check.push_str(&format!("const auto {f}_ = this->{f}+(this->theta)*(this->d{f});\n", f = POROSITY));
        }
        check.push_str(&self.effective_stress(fid));
        check.push_str(&self.criterion.criterion(fid, &hooke.equivalent_stress_lower_bound(), f)?);
        check.push_str(&radius(&self.isotropic_hardening, fid, false));
        check.push_str(&format!("if(seq{} > R{}){{\n", fid, fid));
        check.push_str("// activating the flow\n");
        check.push_str(&format!("converged = false;\nthis->{} = true;\n}}\n", flag));
        check.push_str("}\n}\n");
        append_code(bd, CodeBlockSlot::AdditionalConvergenceChecks, &check, &[&flag])
    }

    /// Builds the residual terms of the flow
    ///
    /// The first term (on the elastic strain) declares the effective stress and
    /// the normal used by the following ones.
    pub fn residual_terms(
        &self,
        hooke: &HookeStressPotential,
        fid: &str,
        porosity: Option<&PorosityEvolution>,
        analytical: bool,
    ) -> Result<Vec<ResidualTerm>, GenError> {
        let lb = hooke.equivalent_stress_lower_bound();
        let flow = self.flow_direction_criterion();
        let f = POROSITY;
        let porous_stress = self.criterion.is_coupled_with_porosity_evolution();
        let porous_normal = flow.is_coupled_with_porosity_evolution();
        if (porous_stress || porous_normal) && porosity.is_none() {
            return Err(throw_runtime_error(
                "InelasticFlowBase::endTreatment",
                "the porosity is not defined",
            ));
        }
        let ctx = FlowEquationContext {
            fid: fid.to_string(),
            hooke,
            kinematic: &self.kinematic_hardening,
            porosity: if porous_normal { Some(f) } else { None },
            analytical,
            guard: if self.has_activation() {
                Some(format!("this->{}", InelasticFlow::activation_flag(fid)))
            } else {
                None
            },
        };
        let fs = if porous_stress || porous_normal { Some(f) } else { None };
        let extra: Vec<&str> = fs.into_iter().collect();
        let mut terms = Vec::new();

        // flow direction
        let mut c = self.effective_stress(fid);
        match &self.flow_criterion {
            Some(flow) => {
                c.push_str(&self.criterion.normal(fid, CriterionRole::Stress, &lb, fs, analytical)?);
                c.push_str(&flow.normal(fid, CriterionRole::Flow, &lb, fs, analytical)?);
            }
            None => c.push_str(&self.criterion.normal(fid, CriterionRole::StressAndFlow, &lb, fs, analytical)?),
        }
        c.push_str(&format!("feel += (this->dp{})*n{};\n", fid, fid));
        if analytical {
            c.push_str(&format!("dfeel_ddp{} = n{};\n", fid, fid));
            c.push_str(&ctx.normal_derivatives(ELASTIC_STRAIN, &format!("(-(this->dp{}))", fid)));
        }
        terms.push(ctx.term(ELASTIC_STRAIN, &c, &extra));

        // flow rule
        let p = format!("p{}", fid);
        let dseq_ds = format!("dseq{}_ds{}", fid, fid);
        let dseq_df = format!("dseq{}_d{}", fid, f);
        let mut c = String::new();
        if self.has_activation() {
            c.push_str(&radius(&self.isotropic_hardening, fid, analytical));
        }
        match &self.rule {
            FlowRule::Plastic => {
                c.push_str(&format!("f{} = (seq{}-R{})/(this->young);\n", p, fid, fid));
                if analytical {
                    c.push_str(&format!("df{}_dd{} = -dR{}_dd{}/(this->young);\n", p, p, fid, p));
                    c.push_str(&ctx.stress_derivatives(&p, &format!("-({})/(this->young)", dseq_ds), true));
                    if porous_stress {
                        c.push_str(&format!("df{}_dd{} += (this->theta)*({})/(this->young);\n", p, f, dseq_df));
                    }
                }
            }
            FlowRule::Norton { .. } => {
                let overstress = if self.has_activation() {
                    format!("seq{}-R{}", fid, fid)
                } else {
                    format!("seq{}", fid)
                };
                let vp = format!("vp{}", fid);
                let dvp = format!("dvp{}_dseq{}", fid, fid);
                c.push_str(&format!(
                    "const auto {vp}_arg = std::max({o},stress(0))/(this->K{fid});\n",
                    vp = vp,
                    o = overstress,
                    fid = fid
                ));
                c.push_str(&format!(
                    "const auto {vp} = (this->A{fid})*pow({vp}_arg,this->E{fid});\n",
                    vp = vp,
                    fid = fid
                ));
                c.push_str(&format!("f{} -= (this->dt)*{};\n", p, vp));
                if analytical {
                    c.push_str(&format!(
                        "const auto {dvp} = (this->A{fid})*(this->E{fid})*pow({vp}_arg,this->E{fid}-1)/(this->K{fid});\n",
                        dvp = dvp,
                        vp = vp,
                        fid = fid
                    ));
                    if self.has_activation() {
                        c.push_str(&format!("df{}_dd{} += (this->dt)*{}*dR{}_dd{};\n", p, p, dvp, fid, p));
                    }
                    c.push_str(&ctx.stress_derivatives(&p, &format!("(this->dt)*{}*{}", dvp, dseq_ds), true));
                    if porous_stress {
                        c.push_str(&format!(
                            "df{}_dd{} -= (this->theta)*(this->dt)*{}*{};\n",
                            p, f, dvp, dseq_df
                        ));
                    }
                }
            }
        }
        terms.push(ctx.term(&p, &c, &extra));

        for kid in 0..self.kinematic_hardening.len() {
            terms.push(self.kinematic_hardening[kid].back_strain_equation(&ctx, &kid.to_string())?);
        }
        if let Some(evolution) = porosity {
            if !flow.is_normal_deviatoric() {
                terms.push(evolution.growth_term(&ctx));
            }
            for (nid, model) in self.nucleation.iter().enumerate() {
                terms.push(model.nucleation_term(&ctx, &nid.to_string(), evolution));
            }
        }
        Ok(terms)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
