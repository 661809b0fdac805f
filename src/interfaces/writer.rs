use super::{function_name, hypotheses_to_be_treated, tangent_conversion_lines, InterfaceLayout};
use crate::base::{throw_runtime_error, total_size, BehaviourDescription, BehaviourType, GenError, GeneratorConfig};
use crate::base::{BehaviourSymmetry, ModellingHypothesis, Solver, VariableDescription};
use crate::base::{ATTRIBUTE_REQUIRES_STIFFNESS_TENSOR, ATTRIBUTE_REQUIRES_THERMAL_EXPANSION_COEFFICIENT_TENSOR};
use crate::base::ATTRIBUTE_REQUIRES_UNALTERED_STIFFNESS_TENSOR;
use crate::codegen::SourceWriter;
use log::debug;

/// Writes the files wrapping a behaviour for a solver
///
/// Returns (relative path, content) pairs: the header and the source of the
/// entry points, and for Ansys an example of input file.
pub fn write_interface_files(
    bd: &BehaviourDescription,
    solver: Solver,
    hypotheses: &[ModellingHypothesis],
    config: &GeneratorConfig,
) -> Result<Vec<(String, String)>, GenError> {
    let treated = hypotheses_to_be_treated(bd, solver, hypotheses)?;
    let mut layouts = Vec::with_capacity(treated.len());
    for h in &treated {
        debug!("{} interface: treating hypothesis '{}'", solver.name(), h.name());
        layouts.push(InterfaceLayout::new(bd, solver, *h)?);
    }
    let writer = InterfaceWriter {
        bd,
        solver,
        config,
        layouts,
    };
    let mut files = vec![
        (writer.header_file_name(), writer.write_header()?),
        (writer.src_file_name(), writer.write_src()?),
    ];
    if solver == Solver::Ansys {
        files.push((format!("ansys/{}.dat", writer.name()), writer.write_input_file_example()));
    }
    Ok(files)
}

struct InterfaceWriter<'a> {
    bd: &'a BehaviourDescription,
    solver: Solver,
    config: &'a GeneratorConfig,
    layouts: Vec<InterfaceLayout>,
}

impl<'a> InterfaceWriter<'a> {
    fn name(&self) -> String {
        format!("{}{}", self.bd.library, self.bd.class_name())
    }

    fn directory(&self) -> &'static str {
        match self.solver {
            Solver::Ansys => "Ansys",
            Solver::LsDyna => "LSDYNA",
        }
    }

    fn header_file_name(&self) -> String {
        format!("MFront/{}/{}{}.hxx", self.directory(), self.solver.name(), self.name())
    }

    fn src_file_name(&self) -> String {
        format!("{}{}.cxx", self.solver.name(), self.name())
    }

    fn header_guard(&self) -> String {
        format!("LIB_{}_{}_HXX", self.solver.upper_case_name(), self.name()).to_uppercase()
    }

    /// Returns the namespace (and prefix of the types) of the solver's support library
    fn ns(&self) -> &'static str {
        self.solver.name()
    }

    fn prefix(&self) -> &'static str {
        match self.solver {
            Solver::Ansys => "Ansys",
            Solver::LsDyna => "LSDYNA",
        }
    }

    fn write_file_header(&self, w: &mut SourceWriter, file: &str, brief: &str) {
        w.line("/*!");
        w.line(&format!("* \\file   {}", file));
        w.line(&format!("* \\brief  {}", brief));
        w.line("*         File generated by mbgen");
        w.line("*/");
        w.blank();
    }

    /// Writes the argument list of an entry point, `end` following the closing parenthesis
    fn write_arguments(&self, w: &mut SourceWriter, end: &str) {
        let (int, real) = (format!("{}::{}Int", self.ns(), self.prefix()), format!("{}::{}Real", self.ns(), self.prefix()));
        let arguments = match self.solver {
            Solver::Ansys => vec![
                format!("(const {} *const matId,", int),
                format!(" const {} *const elemId,", int),
                format!(" const {} *const kDomIntPt,", int),
                format!(" const {} *const kLayer,", int),
                format!(" const {} *const kSectPt,", int),
                format!(" const {} *const ldsetp,", int),
                format!(" const {} *const isubst,", int),
                format!("       {} *const keycut,", int),
                format!(" const {} *const nDirect,", int),
                format!(" const {} *const nShear,", int),
                format!(" const {} *const NTENS,", int),
                format!(" const {} *const NSTATV,", int),
                format!(" const {} *const NPROPS,", int),
                format!(" const {} *const TIME,", real),
                format!(" const {} *const DTIME,", real),
                format!(" const {} *const TEMP,", real),
                format!(" const {} *const DTEMP,", real),
                format!("       {} *const STRESS,", real),
                format!("       {} *const STATEV,", real),
                format!("       {} *const DDSDDE,", real),
                format!("       {} *const SEDEL,", real),
                format!("       {} *const SEDPL,", real),
                format!("       {} *const EPSEQ,", real),
                format!(" const {} *const STRAN,", real),
                format!(" const {} *const DSTRAN,", real),
                format!("       {} *const EPSPL,", real),
                format!(" const {} *const PROPS,", real),
                format!(" const {} *const coords,", real),
                format!(" const {} *const DROT,", real),
                format!(" const {} *const F0,", real),
                format!(" const {} *const F1,", real),
                format!(" const {} *const tsstif,", real),
                format!("       {} *const EPSZZ)", real),
            ],
            Solver::LsDyna => vec![
                format!("(const {} *const NTENS,", int),
                format!(" const {} *const NPROPS,", int),
                format!(" const {} *const NSTATV,", int),
                format!(" const {} *const DTIME,", real),
                format!(" const {} *const STRAN,", real),
                format!(" const {} *const DSTRAN,", real),
                format!(" const {} *const TEMP,", real),
                format!(" const {} *const DTEMP,", real),
                format!(" const {} *const PROPS,", real),
                format!("       {} *const STRESS,", real),
                format!("       {} *const STATEV,", real),
                format!("       {} *const DDSDDE,", real),
                format!("       {} *const PNEWDT)", real),
            ],
        };
        let last = arguments.len() - 1;
        for (i, a) in arguments.iter().enumerate() {
            if i == last {
                w.line(&format!("{}{}", a, end));
            } else {
                w.line(a);
            }
        }
    }

    fn return_type(&self) -> String {
        match self.solver {
            Solver::Ansys => String::from("void"),
            Solver::LsDyna => format!("{}::{}Int", self.ns(), self.prefix()),
        }
    }

    fn write_traits(&self, w: &mut SourceWriter) -> Result<(), GenError> {
        let bd = self.bd;
        let (ns, prefix) = (self.ns(), self.prefix());
        let btype = match bd.behaviour_type {
            BehaviourType::StandardStrainBasedBehaviour => "STANDARDSTRAINBASEDBEHAVIOUR",
            BehaviourType::StandardFiniteStrainBehaviour => {
                if bd.has_stress_free_expansion {
                    return Err(throw_runtime_error(
                        &format!("{}Interface::writeBehaviourTraits", self.solver.upper_case_name()),
                        "stress free expansion is not supported for finite strain behaviours",
                    ));
                }
                "STANDARDFINITESTRAINBEHAVIOUR"
            }
        };
        let d = bd.data(ModellingHypothesis::Undefined);
        let requires_stiffness = d.attribute(ATTRIBUTE_REQUIRES_STIFFNESS_TENSOR);
        let provided: Vec<VariableDescription> = d
            .material_properties
            .iter()
            .filter(|v| !(requires_stiffness && bd.elastic_material_properties().contains(&v.name)))
            .cloned()
            .collect();
        let gradient_size = match bd.behaviour_type {
            BehaviourType::StandardStrainBasedBehaviour => "StensorSize",
            BehaviourType::StandardFiniteStrainBehaviour => "TensorSize",
        };
        let flag = |name: &str| if d.attribute(name) { "true" } else { "false" };
        w.line("template<tfel::material::ModellingHypothesis::Hypothesis H,typename Type,bool use_qt>");
        w.open(&format!(
            "struct {}Traits<tfel::material::{}<H,Type,use_qt> >",
            prefix,
            bd.class_name()
        ));
        w.line("//! behaviour type");
        w.line(&format!("static constexpr {}BehaviourType btype = {}::{};", prefix, ns, btype));
        w.line("//! space dimension");
        w.line("static constexpr unsigned short N = tfel::material::ModellingHypothesisToSpaceDimension<H>::value;");
        w.line("//! tiny vector size");
        w.line("static constexpr unsigned short TVectorSize = N;");
        w.line("//! symmetric tensor size");
        w.line("static constexpr unsigned short StensorSize = tfel::math::StensorDimeToSize<N>::value;");
        w.line("//! tensor size");
        w.line("static constexpr unsigned short TensorSize = tfel::math::TensorDimeToSize<N>::value;");
        w.line("//! size of the driving variable array");
        w.line(&format!("static constexpr unsigned short GradientSize = {};", gradient_size));
        w.line("//! size of the thermodynamic force variable array");
        w.line("static constexpr unsigned short ThermodynamicForceVariableSize = StensorSize;");
        w.line(&format!(
            "static constexpr bool requiresUnAlteredStiffnessTensor = {};",
            flag(ATTRIBUTE_REQUIRES_UNALTERED_STIFFNESS_TENSOR)
        ));
        w.line(&format!(
            "static constexpr bool requiresStiffnessTensor = {};",
            flag(ATTRIBUTE_REQUIRES_STIFFNESS_TENSOR)
        ));
        w.line(&format!(
            "static constexpr bool requiresThermalExpansionCoefficientTensor = {};",
            flag(ATTRIBUTE_REQUIRES_THERMAL_EXPANSION_COEFFICIENT_TENSOR)
        ));
        w.line(&format!(
            "static constexpr {}SymmetryType type = {}::{};",
            prefix,
            ns,
            bd.symmetry.name()
        ));
        w.line(&format!(
            "static constexpr unsigned short material_properties_nb = {};",
            total_size(&provided)
        ));
        w.line(&format!(
            "static constexpr {}SymmetryType etype = {}::{};",
            prefix,
            ns,
            bd.elastic_symmetry.name()
        ));
        // the offsets are written symbolically, the layouts hold their values
        let orthotropic = bd.elastic_symmetry == BehaviourSymmetry::Orthotropic;
        let elastic_offset = match (requires_stiffness, orthotropic) {
            (false, _) => String::from("0u"),
            (true, false) => String::from("2u"),
            (true, true) => format!("{}OrthotropicElasticPropertiesOffset<N>::value", prefix),
        };
        let thermal_offset = match (d.attribute(ATTRIBUTE_REQUIRES_THERMAL_EXPANSION_COEFFICIENT_TENSOR), orthotropic) {
            (false, _) => "0u",
            (true, false) => "1u",
            (true, true) => "3u",
        };
        let axes_offset = if self.solver == Solver::Ansys && bd.symmetry == BehaviourSymmetry::Orthotropic {
            format!("{}OrthotropicAxesOffset<N>::value", prefix)
        } else {
            String::from("0u")
        };
        w.line(&format!("static constexpr unsigned short elasticPropertiesOffset = {};", elastic_offset));
        w.line(&format!(
            "static constexpr unsigned short thermalExpansionPropertiesOffset = {};",
            thermal_offset
        ));
        w.line(&format!("static constexpr unsigned short orthotropicAxesOffset = {};", axes_offset));
        w.close(&format!("; // end of struct {}Traits", prefix));
        Ok(())
    }

    fn write_header(&self) -> Result<String, GenError> {
        let mut w = SourceWriter::new(Vec::<String>::new());
        let file = self.header_file_name();
        self.write_file_header(
            &mut w,
            &file,
            &format!(
                "This file declares the {} interface for the {} behaviour law",
                self.solver.name(),
                self.bd.class_name()
            ),
        );
        let guard = self.header_guard();
        w.line(&format!("#ifndef {}", guard));
        w.line(&format!("#define {}", guard));
        w.blank();
        w.line("#include\"TFEL/Config/TFELConfig.hxx\"");
        w.line(&format!("#include\"MFront/{}/{}.hxx\"", self.directory(), self.prefix()));
        w.blank();
        w.line("#ifdef __cplusplus");
        w.line(&format!("#include\"MFront/{}/{}Traits.hxx\"", self.directory(), self.prefix()));
        w.line(&format!("#include\"TFEL/Material/{}.hxx\"", self.bd.class_name()));
        w.line("#endif /* __cplusplus */");
        w.blank();
        w.line("#ifdef __cplusplus");
        w.blank();
        w.open(&format!("namespace {}", self.ns()));
        w.blank();
        self.write_traits(&mut w)?;
        w.blank();
        w.close(&format!(" // end of namespace {}", self.ns()));
        w.blank();
        w.line("#endif /* __cplusplus */");
        w.blank();
        w.line("#ifdef __cplusplus");
        w.line("extern \"C\"{");
        w.line("#endif /* __cplusplus */");
        w.blank();
        w.line("MFRONT_SHAREDOBJ void");
        w.line(&format!("{}_setOutOfBoundsPolicy(const int);", self.name()));
        w.blank();
        for layout in &self.layouts {
            w.line(&format!("MFRONT_SHAREDOBJ {}", self.return_type()));
            w.line(&function_name(self.solver, &self.name(), layout.hypothesis)?);
            self.write_arguments(&mut w, ";");
            w.blank();
        }
        w.line("#ifdef __cplusplus");
        w.line("}");
        w.line("#endif /* __cplusplus */");
        w.blank();
        w.line(&format!("#endif /* {} */", guard));
        Ok(w.finish())
    }

    fn write_metadata(&self, w: &mut SourceWriter, fname: &str, layout: &InterfaceLayout) {
        let names = |prefix: &str, list: &[String]| {
            if list.is_empty() {
                format!("MFRONT_SHAREDOBJ const char * const * {}_{} = nullptr;", fname, prefix)
            } else {
                let quoted: Vec<_> = list.iter().map(|n| format!("\"{}\"", n)).collect();
                format!(
                    "MFRONT_SHAREDOBJ const char * {}_{}[{}] = {{{}}};",
                    fname,
                    prefix,
                    list.len(),
                    quoted.join(",")
                )
            }
        };
        let internal: Vec<String> = self
            .bd
            .data(layout.hypothesis)
            .persistent_variables()
            .iter()
            .map(|v| v.external_name().to_string())
            .collect();
        w.line(&format!(
            "MFRONT_SHAREDOBJ unsigned short {}_nMaterialProperties = {};",
            fname,
            layout.material_properties.len()
        ));
        w.line(&names("MaterialProperties", &layout.material_properties));
        w.line(&format!(
            "MFRONT_SHAREDOBJ unsigned short {}_nInternalStateVariables = {};",
            fname,
            internal.len()
        ));
        w.line(&names("InternalStateVariables", &internal));
        w.line(&format!(
            "MFRONT_SHAREDOBJ unsigned short {}_nProps = {};",
            fname, layout.nprops
        ));
        w.line(&format!(
            "MFRONT_SHAREDOBJ unsigned short {}_nStatev = {};",
            fname, layout.nstatv
        ));
        w.blank();
    }

    fn write_tangent_operator_conversion(&self, w: &mut SourceWriter, fname: &str, h: ModellingHypothesis) -> Result<(), GenError> {
        let real = format!("{}::{}Real", self.ns(), self.prefix());
        let n = h.space_dimension()?;
        w.open(&format!(
            "static void {}_convertTangentOperator({} *const DDSDDE,\n const tfel::math::st2tost2<{}u,{}>& Dt)",
            fname, real, n, real
        ));
        if self.bd.is_consistent_tangent_operator_symmetric {
            w.line(&format!("const auto cste = tfel::math::Cste<{}>::sqrt2;", real));
        } else {
            w.line(&format!("const auto cste = 1/tfel::math::Cste<{}>::sqrt2;", real));
        }
        for l in tangent_conversion_lines(self.solver, h)? {
            w.line(&l);
        }
        w.close(&format!(" // end of {}_convertTangentOperator", fname));
        w.blank();
        Ok(())
    }

    fn write_src(&self) -> Result<String, GenError> {
        let bd = self.bd;
        let (ns, prefix) = (self.ns(), self.prefix());
        let name = self.name();
        let mut w = SourceWriter::new(Vec::<String>::new());
        let file = self.src_file_name();
        self.write_file_header(
            &mut w,
            &file,
            &format!(
                "This file implements the {} interface for the {} behaviour law",
                self.solver.name(),
                bd.class_name()
            ),
        );
        if self.config.no_runtime_checks {
            w.line(&format!("#define MFRONT_{}_NORUNTIMECHECKS", self.solver.upper_case_name()));
            w.blank();
        }
        for include in [
            String::from("#include<cmath>"),
            String::from("#include<limits>"),
            String::from("#include<cstdlib>"),
            String::from("#include\"TFEL/Math/General/Constants.hxx\""),
            String::from("#include\"TFEL/Material/OutOfBoundsPolicy.hxx\""),
            format!("#include\"TFEL/Material/{}.hxx\"", bd.class_name()),
            format!("#include\"MFront/{}/{}StressFreeExpansionHandler.hxx\"", self.directory(), prefix),
            format!("#include\"MFront/{}/{}Interface.hxx\"", self.directory(), prefix),
            format!("#include\"{}\"", self.header_file_name()),
        ] {
            w.line(&include);
        }
        w.blank();
        w.line("static tfel::material::OutOfBoundsPolicy&");
        w.open(&format!("{}_getOutOfBoundsPolicy()", name));
        w.line(&format!(
            "static auto policy = tfel::material::{};",
            self.config.out_of_bounds_policy.name()
        ));
        w.line("return policy;");
        w.close(&format!(" // end of {}_getOutOfBoundsPolicy", name));
        w.blank();
        for layout in &self.layouts {
            let fname = function_name(self.solver, &name, layout.hypothesis)?;
            self.write_tangent_operator_conversion(&mut w, &fname, layout.hypothesis)?;
        }
        w.line("extern \"C\"{");
        w.blank();
        w.line("MFRONT_SHAREDOBJ void");
        w.open(&format!("{}_setOutOfBoundsPolicy(const int p)", name));
        w.open("if(p==0)");
        w.line(&format!("{}_getOutOfBoundsPolicy() = tfel::material::None;", name));
        w.reopen(" else if(p==1)");
        w.line(&format!("{}_getOutOfBoundsPolicy() = tfel::material::Warning;", name));
        w.reopen(" else if(p==2)");
        w.line(&format!("{}_getOutOfBoundsPolicy() = tfel::material::Strict;", name));
        w.reopen(" else ");
        w.line(&format!(
            "std::cerr << \"{}_setOutOfBoundsPolicy: invalid argument\\n\";",
            name
        ));
        w.close("");
        w.close("");
        w.blank();
        let (gradient0, gradient1) = match bd.behaviour_type {
            BehaviourType::StandardStrainBasedBehaviour => ("STRAN", "DSTRAN"),
            BehaviourType::StandardFiniteStrainBehaviour => ("F0", "F1"),
        };
        let sfeh = if bd.has_stress_free_expansion && bd.behaviour_type == BehaviourType::StandardStrainBasedBehaviour {
            format!("{}::{}StandardSmallStrainStressFreeExpansionHandler", ns, prefix)
        } else {
            String::from("nullptr")
        };
        for layout in &self.layouts {
            let h = layout.hypothesis;
            let fname = function_name(self.solver, &name, h)?;
            self.write_metadata(&mut w, &fname, layout);
            w.line(&format!("MFRONT_SHAREDOBJ {}", self.return_type()));
            w.line(&fname);
            self.write_arguments(&mut w, "");
            w.open("");
            let (pnewdt, keycut) = match self.solver {
                Solver::Ansys => ("nullptr", true),
                Solver::LsDyna => ("PNEWDT", false),
            };
            w.line(&format!(
                "{}::{}Data d = {{STRESS,DDSDDE,STATEV,*NTENS,*NPROPS,*NSTATV,*DTIME,",
                ns, prefix
            ));
            w.line(&format!(
                "                      {},{},TEMP,DTEMP,PROPS,{},",
                gradient0, gradient1, pnewdt
            ));
            w.line(&format!(
                "                      {}_getOutOfBoundsPolicy(),{},{}_convertTangentOperator}};",
                name, sfeh, fname
            ));
            let call = format!(
                "{}::{}Interface<tfel::material::ModellingHypothesis::{},tfel::material::{}>::exe(d)",
                ns,
                prefix,
                h.upper_case_name(),
                bd.class_name()
            );
            if keycut {
                w.open(&format!("if({}!=0)", call));
                w.line("*keycut = 1;");
                w.line("return;");
                w.close("");
            } else {
                w.line(&format!("return {};", call));
            }
            w.close(&format!(" // end of {}", fname));
            w.blank();
        }
        w.line("} // end of extern \"C\"");
        Ok(w.finish())
    }

    fn write_input_file_example(&self) -> String {
        let mut out = String::new();
        out.push_str("/com, \n");
        out.push_str("/com, File generated by mbgen\n");
        out.push_str(&format!(
            "/com, Example of how to use the {} behaviour law\n",
            self.bd.class_name()
        ));
        out.push_str("/com,\n\n");
        for layout in &self.layouts {
            out.push_str(&format!(
                "/com, Example for the '{}' modelling hypothesis\n",
                layout.hypothesis.name()
            ));
            out.push_str("/com, List of material properties\n");
            for mp in &layout.material_properties {
                out.push_str(&format!("/com, -{}\n", mp));
            }
            out.push_str(&format!(
                "tb,user,<mat_id>,<number of temperatures>,{}\n",
                layout.nprops
            ));
            out.push_str("/com, you shall now declare your material properties\n");
            out.push_str("/com, using the tbtemp an tbdata commands.\n");
            out.push_str("/com, Declaration of state variables\n");
            out.push_str(&format!("tb,state,<mat_id>,,{}\n\n\n", layout.nstatv));
        }
        out
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::write_interface_files;
    use crate::base::{count_occurrences, new_sample_description, BehaviourType, GeneratorConfig, ModellingHypothesis};
    use crate::base::{Solver, ATTRIBUTE_REQUIRES_STIFFNESS_TENSOR};

    #[test]
    fn ansys_files_work() {
        let mut bd = new_sample_description("Norton");
        bd.is_consistent_tangent_operator_symmetric = true;
        let config = GeneratorConfig::new();
        let hypotheses = bd.modelling_hypotheses();
        let files = write_interface_files(&bd, Solver::Ansys, &hypotheses, &config).unwrap();
        let paths: Vec<_> = files.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, &["MFront/Ansys/ansysNorton.hxx", "ansysNorton.cxx", "ansys/Norton.dat"]);
        let header = &files[0].1;
        assert!(header.contains("#ifndef LIB_ANSYS_NORTON_HXX"));
        assert!(header.contains("struct AnsysTraits<tfel::material::Norton<H,Type,use_qt> >{"));
        assert!(header.contains("static constexpr AnsysBehaviourType btype = ansys::STANDARDSTRAINBASEDBEHAVIOUR;"));
        assert!(header.contains("static constexpr unsigned short material_properties_nb = 2;"));
        assert!(header.contains("Norton_pstress\n"));
        assert!(header.contains("Norton_3D\n"));
        assert!(!header.contains("Norton_GPSTRAIN"));
        let src = &files[1].1;
        assert!(!src.contains("NORUNTIMECHECKS"));
        assert!(src.contains("const auto cste = tfel::math::Cste<ansys::AnsysReal>::sqrt2;"));
        assert!(src.contains("DDSDDE[2] = Dt(3,0)*cste;"));
        assert!(src.contains("*keycut = 1;"));
        assert_eq!(count_occurrences(src, "_convertTangentOperator(ansys::AnsysReal *const DDSDDE"), 4);
        assert!(src.contains("MFRONT_SHAREDOBJ unsigned short Norton_3D_nStatev = 1;"));
        assert!(src.contains("MFRONT_SHAREDOBJ const char * Norton_3D_MaterialProperties[2] = {\"YoungModulus\",\"PoissonRatio\"};"));
        let dat = &files[2].1;
        assert!(dat.contains("tb,user,<mat_id>,<number of temperatures>,2\n"));
        assert!(dat.contains("tb,state,<mat_id>,,1\n"));
    }

    #[test]
    fn lsdyna_files_work() {
        let mut bd = new_sample_description("Norton");
        bd.set_library("Mat").unwrap();
        bd.set_attribute(ModellingHypothesis::Undefined, ATTRIBUTE_REQUIRES_STIFFNESS_TENSOR, true)
            .unwrap();
        let mut config = GeneratorConfig::new();
        config.set_no_runtime_checks(true).unwrap();
        let hypotheses = [ModellingHypothesis::Tridimensional, ModellingHypothesis::PlaneStress];
        let files = write_interface_files(&bd, Solver::LsDyna, &hypotheses, &config).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].0, "MFront/LSDYNA/lsdynaMatNorton.hxx");
        assert_eq!(files[1].0, "lsdynaMatNorton.cxx");
        let header = &files[0].1;
        assert!(header.contains("static constexpr unsigned short material_properties_nb = 0u;"));
        assert!(header.contains("static constexpr unsigned short elasticPropertiesOffset = 2u;"));
        let src = &files[1].1;
        assert!(src.starts_with("/*!"));
        assert!(src.contains("#define MFRONT_LSDYNA_NORUNTIMECHECKS"));
        assert!(src.contains("MatNorton_PSTRESS\n"));
        assert!(src.contains("const auto cste = 1/tfel::math::Cste<lsdyna::LSDYNAReal>::sqrt2;"));
        assert!(src.contains("return lsdyna::LSDYNAInterface<tfel::material::ModellingHypothesis::TRIDIMENSIONAL"));
    }

    #[test]
    fn write_interface_files_captures_errors() {
        let mut bd = new_sample_description("Norton");
        let config = GeneratorConfig::new();
        let only_1d = [ModellingHypothesis::AxisymmetricalGeneralisedPlaneStrain];
        assert!(write_interface_files(&bd, Solver::Ansys, &only_1d, &config).is_err());
        bd.behaviour_type = BehaviourType::StandardFiniteStrainBehaviour;
        bd.has_stress_free_expansion = true;
        let hypotheses = [ModellingHypothesis::Tridimensional];
        assert_eq!(
            write_interface_files(&bd, Solver::Ansys, &hypotheses, &config)
                .err()
                .map(|e| e.to_string()),
            Some(
                "ANSYSInterface::writeBehaviourTraits: stress free expansion is not supported for finite strain behaviours"
                    .to_string()
            )
        );
    }
}
