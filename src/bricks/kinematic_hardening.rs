use super::{check, declare_material_properties, variable_id, DataMap, FlowEquationContext, HillCoefficients};
use super::{MaterialProperty, OptionDescription, OptionType};
use crate::base::{throw_runtime_error, BehaviourDescription, GenError, ModellingHypothesis, VariableDescription};
use crate::codegen::ResidualTerm;

/// Defines the kinds of kinematic hardening rules
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KinematicHardeningKind {
    /// Linear hardening `da = dp*n`
    Prager,

    /// Linear dynamic recovery `da = dp*(n - D*a)`
    ArmstrongFrederick,

    /// Dynamic recovery blended between the back strain and the normal directions
    BurletCailletaud,

    /// Dynamic recovery gated by a memory threshold `w`
    Chaboche1991,

    /// Dynamic recovery gated by `2*D*J(a) > 3*w`, with an optional saturation `Phi`
    Chaboche2012,

    /// Dynamic recovery activated by the alignment of the back strain and the normal
    OhnoWang,

    /// Anisotropic dynamic and static recovery
    DelobelleRobinetSchaffler,

    /// Same as DelobelleRobinetSchaffler without jacobian
    Orthotropic,
}

impl KinematicHardeningKind {
    /// Finds a rule by its name
    pub fn from_name(name: &str) -> Result<Self, GenError> {
        match name {
            "Prager" => Ok(KinematicHardeningKind::Prager),
            "Armstrong-Frederick" | "ArmstrongFrederick" => Ok(KinematicHardeningKind::ArmstrongFrederick),
            "Burlet-Cailletaud" | "BurletCailletaud" => Ok(KinematicHardeningKind::BurletCailletaud),
            "Chaboche 1991" | "Chaboche1991" => Ok(KinematicHardeningKind::Chaboche1991),
            "Chaboche 2012" | "Chaboche2012" => Ok(KinematicHardeningKind::Chaboche2012),
            "Ohno-Wang" | "OhnoWang" => Ok(KinematicHardeningKind::OhnoWang),
            "DelobelleRobinetSchaffler" => Ok(KinematicHardeningKind::DelobelleRobinetSchaffler),
            "Orthotropic" => Ok(KinematicHardeningKind::Orthotropic),
            _ => Err(throw_runtime_error(
                "KinematicHardeningRuleFactory::generate",
                &format!("no kinematic hardening rule named '{}'", name),
            )),
        }
    }

    /// Returns the name of the rule
    pub fn name(&self) -> &'static str {
        match self {
            KinematicHardeningKind::Prager => "Prager",
            KinematicHardeningKind::ArmstrongFrederick => "Armstrong-Frederick",
            KinematicHardeningKind::BurletCailletaud => "Burlet-Cailletaud",
            KinematicHardeningKind::Chaboche1991 => "Chaboche 1991",
            KinematicHardeningKind::Chaboche2012 => "Chaboche 2012",
            KinematicHardeningKind::OhnoWang => "Ohno-Wang",
            KinematicHardeningKind::DelobelleRobinetSchaffler => "DelobelleRobinetSchaffler",
            KinematicHardeningKind::Orthotropic => "Orthotropic",
        }
    }

    /// Returns the options of the rule
    pub fn options(&self) -> Vec<OptionDescription> {
        let mp = |n: &str, d: &str| OptionDescription::new(n, d, OptionType::MaterialProperty);
        let hill = |n: &str, d: &str| OptionDescription::new(n, d, OptionType::ArrayOfMaterialProperties);
        let mut opts = vec![mp("C", "kinematic moduli")];
        let recovery = || mp("D", "back-strain callback coefficient");
        match self {
            KinematicHardeningKind::Prager => (),
            KinematicHardeningKind::ArmstrongFrederick => opts.push(recovery()),
            KinematicHardeningKind::BurletCailletaud => {
                opts.push(recovery());
                opts.push(mp("eta", "weight of the back strain direction in the dynamic recovery"));
            }
            KinematicHardeningKind::Chaboche1991 => {
                opts.push(recovery());
                opts.push(mp("m1", "first exponent of the saturation function"));
                opts.push(mp("m2", "second exponent of the saturation function"));
                opts.push(mp("w", "memory threshold"));
            }
            KinematicHardeningKind::Chaboche2012 => {
                opts.push(recovery());
                opts.push(mp("m", "exponent of the saturation function"));
                opts.push(mp("w", "memory threshold"));
                opts.push(mp("Phi_inf", "saturated value of the Phi function").requires(&["b"]));
                opts.push(mp("b", "rate of convergence of the Phi function").requires(&["Phi_inf"]));
            }
            KinematicHardeningKind::OhnoWang => {
                opts.push(recovery());
                opts.push(mp("m", "exponent of the recovery"));
                opts.push(hill("Rd", "linear transformation of the dynamic recovery"));
            }
            KinematicHardeningKind::DelobelleRobinetSchaffler | KinematicHardeningKind::Orthotropic => {
                opts.push(recovery());
                opts.push(mp("f", "memory coefficient"));
                opts.push(mp("a0", "normalisation coefficient of the equivalent back strain"));
                opts.push(mp("m", "memory exponent"));
                opts.push(hill("Ec", "coefficients of the linear transformation of the inelastic strain rate"));
                opts.push(hill("Rs", "first linear transformation coefficients"));
                opts.push(hill("Rd", "second linear transformation coefficients"));
            }
        }
        opts
    }
}

/// Implements a kinematic hardening rule
///
/// Each instance declares the back strain `a<fid><kid>` as a state variable;
/// the back stress is `X = (2*C/3)*a`.
#[derive(Clone, Debug, PartialEq)]
pub struct KinematicHardeningRule {
    /// Kind of rule
    pub kind: KinematicHardeningKind,

    /// Scalar material properties, by option name
    pub properties: Vec<(&'static str, MaterialProperty)>,

    /// Fourth order tensors built from 6 coefficients, by option name
    pub tensors: Vec<(&'static str, HillCoefficients)>,
}

impl KinematicHardeningRule {
    /// Reads a rule from its name and options
    pub fn new(name: &str, d: &DataMap) -> Result<Self, GenError> {
        let kind = KinematicHardeningKind::from_name(name)?;
        check(name, d, &kind.options())?;
        let mut required = vec!["C"];
        let mut defaults = Vec::new();
        let mut hill = Vec::new();
        match kind {
            KinematicHardeningKind::Prager => (),
            KinematicHardeningKind::ArmstrongFrederick => required.push("D"),
            KinematicHardeningKind::BurletCailletaud => required.extend(["D", "eta"]),
            KinematicHardeningKind::Chaboche1991 => required.extend(["D", "m1", "m2", "w"]),
            KinematicHardeningKind::Chaboche2012 => {
                required.extend(["D", "m", "w"]);
                if d.contains_key("Phi_inf") {
                    required.extend(["Phi_inf", "b"]);
                }
            }
            KinematicHardeningKind::OhnoWang => {
                required.extend(["D", "m"]);
                if d.contains_key("Rd") {
                    hill.push("Rd");
                }
            }
            KinematicHardeningKind::DelobelleRobinetSchaffler | KinematicHardeningKind::Orthotropic => {
                required.push("m");
                defaults.extend(["D", "f", "a0"]);
                hill.extend(["Ec", "Rs", "Rd"]);
            }
        }
        let mut properties = Vec::new();
        for n in required {
            properties.push((n, MaterialProperty::required(name, d, n)?));
        }
        for n in defaults {
            properties.push((n, MaterialProperty::or_constant(d, n, 1.0)?));
        }
        let mut tensors = Vec::new();
        for n in hill {
            tensors.push((n, HillCoefficients::from_data(n, d)?));
        }
        Ok(KinematicHardeningRule {
            kind,
            properties,
            tensors,
        })
    }

    /// Returns true if an option is defined
    fn has(&self, option: &str) -> bool {
        self.properties.iter().any(|(n, _)| *n == option) || self.tensors.iter().any(|(n, _)| *n == option)
    }

    /// Declares the back strain and the material properties
    pub fn initialize(&self, bd: &mut BehaviourDescription, fid: &str, kid: &str) -> Result<(), GenError> {
        let a = variable_id("a", fid, kid);
        let back_strain = VariableDescription::new("StrainStensor", &a)?.with_entry_name(&format!("BackStrain{}{}", fid, kid));
        bd.add_state_variable(ModellingHypothesis::Undefined, back_strain)?;
        let entries: Vec<(&MaterialProperty, &str, String)> = self
            .properties
            .iter()
            .map(|(n, mp)| (mp, if *n == "C" { "stress" } else { "real" }, variable_id(n, fid, kid)))
            .collect();
        declare_material_properties(bd, &entries)?;
        for (n, coefficients) in &self.tensors {
            coefficients.declare(bd, &variable_id(n, fid, kid))?;
        }
        Ok(())
    }

    /// Returns the names of the back stresses of the rule
    pub fn variables(&self, fid: &str, kid: &str) -> Vec<String> {
        vec![variable_id("X", fid, kid)]
    }

    /// Returns the code computing the back stress at the beginning of the time step
    pub fn initial_values(&self, fid: &str, kid: &str) -> String {
        format!(
            "const auto {} = (2*(this->{})/3)*(this->{});\n",
            variable_id("X", fid, kid),
            variable_id("C", fid, kid),
            variable_id("a", fid, kid)
        )
    }

    /// Returns the code computing the back strain `a<id>_` and the back stress `X<id>_` at the middle of the time step
    pub fn kinematic_hardenings(&self, fid: &str, kid: &str) -> String {
        let a = variable_id("a", fid, kid);
        format!(
            "const auto {a}_ = eval(this->{a}+(this->theta)*(this->d{a}));\n\
             const auto {x}_ = eval((2*(this->{c})/3)*{a}_);\n",
            a = a,
            x = variable_id("X", fid, kid),
            c = variable_id("C", fid, kid)
        )
    }

    /// Returns the code adding the derivative of residual `f<residual>` with respect to the back strain
    ///
    /// `mdf_ds` is the opposite of the derivative of the residual with respect to the effective stress.
    pub fn stress_derivative(&self, residual: &str, mdf_ds: &str, fid: &str, kid: &str) -> String {
        let a = variable_id("a", fid, kid);
        format!(
            "df{}_dd{} += (2*(this->{})/3)*(this->theta)*({});\n",
            residual,
            a,
            variable_id("C", fid, kid),
            mdf_ds
        )
    }

    /// Builds the implicit equation of the back strain
    pub fn back_strain_equation(&self, ctx: &FlowEquationContext, kid: &str) -> Result<ResidualTerm, GenError> {
        let fid = ctx.fid.as_str();
        let b = ctx.analytical;
        let a = variable_id("a", fid, kid);
        let id = |n: &str| format!("this->{}", variable_id(n, fid, kid));
        let local = |n: &str| variable_id(n, fid, kid);
        let a_ = format!("{}_", a);
        let n = format!("n{}", fid);
        let dp = format!("this->dp{}", fid);
        let df_ddp = format!("df{}_ddp{}", a, fid);
        let mut c = String::new();
        match self.kind {
            KinematicHardeningKind::Prager => {
                c.push_str(&format!("f{} -= ({})*{};\n", a, dp, n));
                if b {
                    c.push_str(&format!("{} = -{};\n", df_ddp, n));
                    c.push_str(&ctx.normal_derivatives(&a, &format!("({})", dp)));
                }
            }
            KinematicHardeningKind::ArmstrongFrederick => {
                let direction = format!("({}-({})*{})", n, id("D"), a_);
                c.push_str(&format!("f{} -= ({})*{};\n", a, dp, direction));
                if b {
                    c.push_str(&format!("{} = -{};\n", df_ddp, direction));
                    c.push_str(&format!(
                        "df{a}_dd{a} += (this->theta)*({dp})*({d})*Stensor4::Id();\n",
                        a = a,
                        dp = dp,
                        d = id("D")
                    ));
                    c.push_str(&ctx.normal_derivatives(&a, &format!("({})", dp)));
                }
            }
            KinematicHardeningKind::BurletCailletaud => {
                let ra = local("ra");
                c.push_str(&format!(
                    "const auto {ra} = eval(({eta})*{a_}+(1-({eta}))*(2*({n}|{a_})/3)*{n});\n",
                    ra = ra,
                    eta = id("eta"),
                    a_ = a_,
                    n = n
                ));
                let direction = format!("({}-({})*{})", n, id("D"), ra);
                c.push_str(&format!("f{} -= ({})*{};\n", a, dp, direction));
                if b {
                    c.push_str(&format!("{} = -{};\n", df_ddp, direction));
                    c.push_str(&format!(
                        "df{a}_dd{a} += (this->theta)*({dp})*({d})*(({eta})*Stensor4::Id()+(1-({eta}))*(2*({n}^{n})/3));\n",
                        a = a,
                        dp = dp,
                        d = id("D"),
                        eta = id("eta"),
                        n = n
                    ));
                    c.push_str(&ctx.normal_derivatives(&a, &format!("({})", dp)));
                }
            }
            KinematicHardeningKind::Chaboche1991 => {
                let dja = local("DJa");
                let idja = local("iDJa");
                let phi = local("Phi");
                let w = id("w");
                c.push_str(&format!("const auto {} = ({})*sigmaeq(this->{});\n", dja, id("D"), a));
                c.push_str(&format!("const auto {} = 1/(std::max({},real(1e-12)));\n", idja, dja));
                c.push_str(&format!(
                    "const auto {phi} = [this,&{dja},&{idja}]() -> real {{\n\
                     if(({dja}-{w})>0){{\n\
                     const auto r{dja} = ({dja}-{w})/(1-{w});\n\
                     return pow(r{dja},{m1})*pow({idja},{m2});\n\
                     }}\n\
                     return 0;\n\
                     }}();\n",
                    phi = phi,
                    dja = dja,
                    idja = idja,
                    w = w,
                    m1 = id("m1"),
                    m2 = id("m2")
                ));
                let direction = format!("-{}+({})*{}*{}", n, id("D"), phi, a_);
                if b {
                    c.push_str(&format!("{} = {};\n", df_ddp, direction));
                } else {
                    c.push_str(&format!("const auto {} = eval({});\n", df_ddp, direction));
                }
                c.push_str(&format!("f{} += ({})*({});\n", a, dp, df_ddp));
                if b {
                    c.push_str(&format!(
                        "df{a}_dd{a} += (this->theta)*({dp})*({d})*{phi}*Stensor4::Id();\n",
                        a = a,
                        dp = dp,
                        d = id("D"),
                        phi = phi
                    ));
                    c.push_str(&ctx.normal_derivatives(&a, &format!("({})", dp)));
                }
            }
            KinematicHardeningKind::Chaboche2012 => {
                let dja = local("DJa");
                let psi = local("Psi");
                let dpsi = format!("dPsi{}{}_dJa{}{}", fid, kid, fid, kid);
                let phi = local("Phi");
                let dphi = format!("dPhi{}{}_ddp{}", fid, kid, fid);
                let (d, m, w) = (id("D"), id("m"), id("w"));
                let saturation = self.has("Phi_inf");
                c.push_str(&format!("const auto {} = ({})*sigmaeq({});\n", dja, d, a_));
                c.push_str(&format!("if((2 * {} > 3 * ({}))&&({}>0)){{\n", dja, w, dp));
                if b {
                    c.push_str(&format!(
                        "const auto [{psi},{dpsi}] = [this,{dja}]() -> std::pair<real,real>{{\n\
                         const auto r{dja} = ({dja}-3*({w})/2)/((1 - ({w}))*{dja});\n\
                         const auto r{dja}_m = pow(r{dja},{m});\n\
                         return {{r{dja}_m,r{dja}_m * 3 * ({w}) * ({d}) *({m})/((2 * {dja}-3 * ({w})) * {dja})}};\n\
                         }}();\n",
                        psi = psi,
                        dpsi = dpsi,
                        dja = dja,
                        w = w,
                        m = m,
                        d = d
                    ));
                } else {
                    c.push_str(&format!(
                        "const auto {} = pow(({}-3*({})/2)/((1-{})*{}),{});\n",
                        psi, dja, w, w, dja, m
                    ));
                }
                let recovery = if saturation {
                    let exp_mbp = local("exp_mbp");
                    let phi_inf = id("Phi_inf");
                    c.push_str(&format!(
                        "const auto {} = exp(-({})*(this->p{} + ((this->theta) * ({}))));\n",
                        exp_mbp,
                        id("b"),
                        fid,
                        dp
                    ));
                    c.push_str(&format!(
                        "const auto {} = {} + (1 - {}) * {};\n",
                        phi, phi_inf, phi_inf, exp_mbp
                    ));
                    if b {
                        c.push_str(&format!(
                            "const auto {} = -({}) * (this->theta) * (1 - {}) * {};\n",
                            dphi,
                            id("b"),
                            phi_inf,
                            exp_mbp
                        ));
                    }
                    format!("({}) * {} * {}", d, phi, psi)
                } else {
                    format!("({}) * {}", d, psi)
                };
                c.push_str(&format!("f{} -= ({}) * ({} - {} * {});\n", a, dp, n, recovery, a_));
                if b {
                    c.push_str(&format!(
                        "const auto dJ{a}_d{a} = 3 * ({d}) * deviator({a_}) / (2 * {dja});\n",
                        a = a,
                        d = d,
                        a_ = a_,
                        dja = dja
                    ));
                    c.push_str(&format!("{} = -({} - {} * {});\n", df_ddp, n, recovery, a_));
                    if saturation {
                        c.push_str(&format!(
                            "{} += ({}) * ({}) * {} * {} * {};\n",
                            df_ddp, dp, d, dphi, psi, a_
                        ));
                    }
                    c.push_str(&ctx.normal_derivatives(&a, &format!("({})", dp)));
                    let factor = if saturation { format!("{} * ", phi) } else { String::new() };
                    c.push_str(&format!(
                        "df{a}_dd{a} += {factor}({d}) * (this->theta) * ({dp}) * ({psi} * Stensor4::Id() + {dpsi} * ({a_}^dJ{a}_d{a}));\n",
                        a = a,
                        factor = factor,
                        d = d,
                        dp = dp,
                        psi = psi,
                        dpsi = dpsi,
                        a_ = a_
                    ));
                }
                c.push_str("} else {\n");
                c.push_str(&format!("f{} -= ({}) * {};\n", a, dp, n));
                if b {
                    c.push_str(&format!("{} = - {};\n", df_ddp, n));
                    c.push_str(&ctx.normal_derivatives(&a, &format!("({})", dp)));
                }
                c.push_str("}\n");
            }
            KinematicHardeningKind::OhnoWang => {
                let ja = local("Ja");
                let ija = local("iJa");
                let ra = local("Ra");
                let psi = local("Psi");
                let (d, m) = (id("D"), id("m"));
                let rd = if self.has("Rd") { Some(id("Rd")) } else { None };
                match &rd {
                    Some(rd) => {
                        c.push_str(&format!("const auto {} = eval(({})*{});\n", ra, rd, a_));
                        c.push_str(&format!(
                            "const auto {} = std::sqrt(std::max({}|{},strain(0)*strain(0)));\n",
                            ja, a_, ra
                        ));
                    }
                    None => {
                        c.push_str(&format!("const auto& {} = {};\n", ra, a_));
                        c.push_str(&format!("const auto {} = sigmaeq({});\n", ja, a_));
                    }
                }
                c.push_str(&format!("const auto {} = 1/(std::max({},real(1e-12)));\n", ija, ja));
                c.push_str(&format!(
                    "const auto {} = pow(({})*{},{})*std::max(({}|{})*{},real(0));\n",
                    psi, d, ja, m, n, a_, ija
                ));
                let direction = format!("({}-({})*{}*{})", n, d, psi, ra);
                c.push_str(&format!("f{} -= ({})*{};\n", a, dp, direction));
                if b {
                    c.push_str(&format!("{} = -{};\n", df_ddp, direction));
                    let operator = rd.unwrap_or_else(|| "Stensor4::Id()".to_string());
                    c.push_str(&format!(
                        "df{a}_dd{a} += (this->theta)*({dp})*({d})*{psi}*({op});\n",
                        a = a,
                        dp = dp,
                        d = d,
                        psi = psi,
                        op = operator
                    ));
                    c.push_str(&ctx.normal_derivatives(&a, &format!("({})", dp)));
                }
            }
            KinematicHardeningKind::DelobelleRobinetSchaffler | KinematicHardeningKind::Orthotropic => {
                if b && self.kind == KinematicHardeningKind::Orthotropic {
                    return Err(throw_runtime_error(
                        "OrthotropicKinematicHardeningRule::buildBackStrainImplicitEquations",
                        "computation of derivatives are not supported yet",
                    ));
                }
                let aeq = local("aeq");
                let iaeq = local("iaeq");
                let na = local("na");
                let aeq_a0_m = local("aeq_a0_m");
                let ec_n = local("Ec_n");
                let rd_a = local("Rd_a");
                let rs_a = local("Rs_a");
                let (d, f, a0, m) = (id("D"), id("f"), id("a0"), id("m"));
                let (ec, rs, rd) = (id("Ec"), id("Rs"), id("Rd"));
                c.push_str(&format!(
                    "const auto {} = std::sqrt(std::max(({}) | (({}) * ({})), strain(0) * strain(0)));\n",
                    aeq, a_, rs, a_
                ));
                c.push_str(&format!("const auto {} = 1/std::max(strain(1e-14),{});\n", iaeq, aeq));
                c.push_str(&format!("const auto {} = eval(({}) * {});\n", ec_n, ec, n));
                c.push_str(&format!("const auto {} = eval(({}) * ({}));\n", rd_a, rd, a_));
                c.push_str(&format!("const auto {} = eval(({}) * ({}));\n", rs_a, rs, a_));
                c.push_str(&format!("const auto {} = {} * {};\n", na, rs_a, iaeq));
                c.push_str(&format!("const auto {} = pow({} / ({}), {});\n", aeq_a0_m, aeq, a0, m));
                c.push_str(&format!(
                    "f{} -= ({}) * {} - ({}) * ({}) * {} - (this->dt) * ({}) * {} * {};\n",
                    a, dp, ec_n, d, dp, rd_a, f, aeq_a0_m, na
                ));
                if b {
                    let dna_da = local("dna_da");
                    c.push_str(&format!("{} = - {} + ({}) * {};\n", df_ddp, ec_n, d, rd_a));
                    c.push_str(&ctx.normal_derivatives(&a, &format!("({})*({})", dp, ec)));
                    c.push_str(&format!(
                        "const auto {} = ({} - (({}) ^ ({}))) * {};\n",
                        dna_da, rs, na, na, iaeq
                    ));
                    c.push_str(&format!(
                        "df{a}_dd{a} += (this->theta) * ({dp}) * ({d}) * {rd} + (this->dt) * ({f}) * {aeq_a0_m} * (this->theta) * ({dna_da} + ({m}) * (({na})^({na})) * {iaeq});\n",
                        a = a,
                        dp = dp,
                        d = d,
                        rd = rd,
                        f = f,
                        aeq_a0_m = aeq_a0_m,
                        dna_da = dna_da,
                        m = m,
                        na = na,
                        iaeq = iaeq
                    ));
                }
            }
        }
        Ok(ctx.term(&a, &c, &[]))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{KinematicHardeningKind, KinematicHardeningRule};
    use crate::base::{new_sample_description, GenError, ModellingHypothesis, VariableCategory};
    use crate::bricks::{data_map, Data, FlowEquationContext, HookeStressPotential};

    fn context<'a>(
        hooke: &'a HookeStressPotential,
        rules: &'a [KinematicHardeningRule],
        analytical: bool,
    ) -> FlowEquationContext<'a> {
        FlowEquationContext {
            fid: String::new(),
            hooke,
            kinematic: rules,
            porosity: None,
            analytical,
            guard: None,
        }
    }

    #[test]
    fn from_name_works() {
        assert_eq!(
            KinematicHardeningKind::from_name("Armstrong-Frederick"),
            Ok(KinematicHardeningKind::ArmstrongFrederick)
        );
        assert_eq!(KinematicHardeningKind::Chaboche2012.name(), "Chaboche 2012");
        assert_eq!(
            KinematicHardeningKind::from_name("Ziegler").err(),
            Some(GenError::Runtime(
                "KinematicHardeningRuleFactory::generate: no kinematic hardening rule named 'Ziegler'".to_string()
            ))
        );
    }

    #[test]
    fn new_captures_errors() {
        let d = data_map([("C", Data::from(1e3)), ("D", Data::from(10.0)), ("Phi_inf", Data::from(0.5))]);
        assert_eq!(
            KinematicHardeningRule::new("Chaboche2012", &d).err(),
            Some(GenError::MissingRequiredOption {
                option: "Phi_inf".to_string(),
                required: "b".to_string()
            })
        );
        let d = data_map([("D", Data::from(10.0))]);
        assert_eq!(
            KinematicHardeningRule::new("Armstrong-Frederick", &d).err(),
            Some(GenError::Runtime(
                "Armstrong-Frederick::initialize: material property 'C' is not defined".to_string()
            ))
        );
        let d = data_map([("C", Data::from(1e3)), ("eta", Data::from(0.5))]);
        assert_eq!(
            KinematicHardeningRule::new("Prager", &d).err(),
            Some(GenError::UnknownOption {
                brick: "Prager".to_string(),
                option: "eta".to_string()
            })
        );
    }

    #[test]
    fn initialize_works() {
        let mut bd = new_sample_description("Kinematic");
        let d = data_map([("C", Data::from(1e3)), ("D", Data::from("2*young/young"))]);
        let af = KinematicHardeningRule::new("Armstrong-Frederick", &d).unwrap();
        af.initialize(&mut bd, "", "0").unwrap();
        let data = bd.data(ModellingHypothesis::Undefined);
        assert!(data.has_variable(VariableCategory::StateVariable, "a0"));
        assert!(data.has_variable(VariableCategory::Parameter, "C0"));
        assert!(data.has_variable(VariableCategory::LocalVariable, "D0"));
        assert_eq!(af.variables("", "0"), vec!["X0".to_string()]);
        assert_eq!(af.initial_values("", "0"), "const auto X0 = (2*(this->C0)/3)*(this->a0);\n");
        assert!(af
            .kinematic_hardenings("", "0")
            .contains("const auto X0_ = eval((2*(this->C0)/3)*a0_);"));
    }

    #[test]
    fn armstrong_frederick_equation_works() {
        let hooke = HookeStressPotential::default();
        let d = data_map([("C", Data::from(1e3)), ("D", Data::from(10.0))]);
        let rules = vec![KinematicHardeningRule::new("Armstrong-Frederick", &d).unwrap()];
        let ctx = context(&hooke, &rules, true);
        let term = rules[0].back_strain_equation(&ctx, "0").unwrap();
        assert_eq!(term.residual, "a0");
        assert!(term.code.contains("fa0 -= (this->dp)*(n-(this->D0)*a0_);"));
        assert!(term.code.contains("dfa0_ddp = -(n-(this->D0)*a0_);"));
        assert!(term.code.contains("dfa0_dda0 += (2*(this->C0)/3)*(this->theta)*((this->dp)*dn_ds);"));
        assert!(term.jacobian.contains_key("eel"));
        let ctx = context(&hooke, &rules, false);
        let term = rules[0].back_strain_equation(&ctx, "0").unwrap();
        assert!(!term.code.contains("dfa0_ddp"));
    }

    #[test]
    fn chaboche_predicates_work() {
        let hooke = HookeStressPotential::default();
        let d = data_map([
            ("C", Data::from(1e3)),
            ("D", Data::from(10.0)),
            ("m1", Data::from(2.0)),
            ("m2", Data::from(1.0)),
            ("w", Data::from(0.1)),
        ]);
        let rules = vec![KinematicHardeningRule::new("Chaboche1991", &d).unwrap()];
        let ctx = context(&hooke, &rules, false);
        let code = rules[0].back_strain_equation(&ctx, "0").unwrap().code;
        assert!(code.contains("if((DJa0-this->w0)>0){"));
        assert!(code.contains("fa0 += (this->dp)*(dfa0_ddp);"));
        let d = data_map([
            ("C", Data::from(1e3)),
            ("D", Data::from(10.0)),
            ("m", Data::from(2.0)),
            ("w", Data::from(0.1)),
            ("Phi_inf", Data::from(0.5)),
            ("b", Data::from(3.0)),
        ]);
        let rules = vec![KinematicHardeningRule::new("Chaboche2012", &d).unwrap()];
        let ctx = context(&hooke, &rules, true);
        let code = rules[0].back_strain_equation(&ctx, "0").unwrap().code;
        assert!(code.contains("if((2 * DJa0 > 3 * (this->w0))&&(this->dp>0)){"));
        assert!(code.contains("const auto Phi0 = this->Phi_inf0 + (1 - this->Phi_inf0) * exp_mbp0;"));
        assert!(code.contains("} else {\nfa0 -= (this->dp) * n;"));
    }

    #[test]
    fn orthotropic_rule_captures_errors() {
        let hooke = HookeStressPotential::default();
        let hill = || Data::Array(vec![Data::from(1.0); 6]);
        let d = data_map([
            ("C", Data::from(1e3)),
            ("m", Data::from(2.0)),
            ("Ec", hill()),
            ("Rs", hill()),
            ("Rd", hill()),
        ]);
        let rules = vec![KinematicHardeningRule::new("Orthotropic", &d).unwrap()];
        let ctx = context(&hooke, &rules, true);
        assert_eq!(
            rules[0].back_strain_equation(&ctx, "0").err(),
            Some(GenError::Runtime(
                "OrthotropicKinematicHardeningRule::buildBackStrainImplicitEquations: computation of derivatives are not supported yet"
                    .to_string()
            ))
        );
        let ctx = context(&hooke, &rules, false);
        let code = rules[0].back_strain_equation(&ctx, "0").unwrap().code;
        assert!(code.contains("const auto na0 = Rs_a0 * iaeq0;"));
        assert!(code.contains("(this->dt) * (this->f0) * aeq_a0_m0 * na0;"));
    }
}
