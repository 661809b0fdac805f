use super::{LocalSolveStrategy, SourceWriter};
use crate::base::{BehaviourDescription, BehaviourSymmetry, CodeBlockSlot, GeneratorConfig, ModellingHypothesis};
use crate::base::{TypeSize, VariableDescription};

fn boolean(flag: bool) -> &'static str {
    if flag {
        "true"
    } else {
        "false"
    }
}

fn sum_sizes<'a, I>(variables: I) -> TypeSize
where
    I: IntoIterator<Item = &'a VariableDescription>,
{
    variables.into_iter().fold(TypeSize::default(), |acc, v| acc + v.size())
}

/// Writes the specialisations of `MechanicalBehaviourTraits`
///
/// When at least four hypotheses are treated, the generic specialisation is
/// defined and the untreated hypotheses are explicitly undefined. Otherwise
/// the generic specialisation is undefined and each treated hypothesis gets
/// its own definition.
pub fn write_traits(
    bd: &BehaviourDescription,
    config: &GeneratorConfig,
    strategy: &LocalSolveStrategy,
    hypotheses: &[ModellingHypothesis],
    w: &mut SourceWriter,
) {
    if hypotheses.len() >= 4 {
        write_traits_specialisation(bd, config, strategy, ModellingHypothesis::Undefined, true, w);
        for h in ModellingHypothesis::ALL {
            if hypotheses.contains(&h) {
                if bd.has_specialised_data(h) {
                    write_traits_specialisation(bd, config, strategy, h, true, w);
                }
            } else {
                write_traits_specialisation(bd, config, strategy, h, false, w);
            }
        }
    } else {
        write_traits_specialisation(bd, config, strategy, ModellingHypothesis::Undefined, false, w);
        for h in hypotheses {
            write_traits_specialisation(bd, config, strategy, *h, true, w);
        }
    }
}

/// Writes one specialisation of `MechanicalBehaviourTraits`
///
/// `defined` is false for hypotheses the behaviour does not handle.
pub fn write_traits_specialisation(
    bd: &BehaviourDescription,
    config: &GeneratorConfig,
    strategy: &LocalSolveStrategy,
    h: ModellingHypothesis,
    defined: bool,
    w: &mut SourceWriter,
) {
    let cn = bd.class_name();
    let data = bd.data(h);
    let (coef_size, state_vars_size, external_vars_size) = if defined {
        (
            sum_sizes(&data.material_properties),
            sum_sizes(data.persistent_variables()),
            sum_sizes(&data.external_state_variables),
        )
    } else {
        (TypeSize::default(), TypeSize::default(), TypeSize::default())
    };
    let qt = if config.use_qt { "use_qt" } else { "false" };
    w.line("/*!");
    w.line(&format!("* Partial specialisation for {}.", cn));
    w.line("*/");
    if h.is_defined() {
        if config.use_qt {
            w.line("template<typename NumericType,bool use_qt>");
        } else {
            w.line("template<typename NumericType>");
        }
        w.line(&format!(
            "class MechanicalBehaviourTraits<{}<ModellingHypothesis::{}, NumericType, {}> >",
            cn,
            h.upper_case_name(),
            qt
        ));
    } else {
        if config.use_qt {
            w.line("template<ModellingHypothesis::Hypothesis hypothesis, typename NumericType,bool use_qt>");
        } else {
            w.line("template<ModellingHypothesis::Hypothesis hypothesis, typename NumericType>");
        }
        w.line(&format!(
            "class MechanicalBehaviourTraits<{}<hypothesis, NumericType, {}> >",
            cn, qt
        ));
    }
    w.open("");
    w.line("using size_type = unsigned short;");
    if defined {
        let hypothesis = if h.is_defined() {
            format!("ModellingHypothesis::{}", h.upper_case_name())
        } else {
            String::from("hypothesis")
        };
        w.line(&format!(
            "static constexpr unsigned short N = ModellingHypothesisToSpaceDimension<{}>::value;",
            hypothesis
        ));
        w.line("static constexpr unsigned short TVectorSize = N;");
        w.line("static constexpr unsigned short StensorSize = tfel::math::StensorDimeToSize<N>::value;");
        w.line("static constexpr unsigned short TensorSize = tfel::math::TensorDimeToSize<N>::value;");
    }
    w.line("public:");
    w.line(&format!("static constexpr bool is_defined = {};", boolean(defined)));
    w.line(&format!("static constexpr bool use_quantities = {};", qt));
    if bd.symmetry == BehaviourSymmetry::Orthotropic {
        w.line("//! orthotropic axes convention");
        w.line(&format!(
            "static constexpr OrthotropicAxesConvention oac = OrthotropicAxesConvention::{};",
            bd.axes_convention.name()
        ));
    }
    w.line(&format!(
        "static constexpr bool hasStressFreeExpansion = {};",
        boolean(defined && bd.has_stress_free_expansion)
    ));
    w.line("static constexpr bool handlesThermalExpansion = false;");
    w.line(if defined {
        "static constexpr unsigned short dimension = N;"
    } else {
        "static constexpr unsigned short dimension = 0u;"
    });
    w.line(&format!("static constexpr size_type material_properties_nb = {};", coef_size));
    w.line(&format!("static constexpr size_type internal_variables_nb  = {};", state_vars_size));
    w.line(&format!("static constexpr size_type external_variables_nb  = {};", external_vars_size));
    w.line(&format!(
        "static constexpr bool hasConsistentTangentOperator = {};",
        boolean(defined && bd.has_consistent_tangent_operator)
    ));
    w.line(&format!(
        "static constexpr bool isConsistentTangentOperatorSymmetric = {};",
        boolean(defined && bd.is_consistent_tangent_operator_symmetric)
    ));
    w.line(&format!(
        "static constexpr bool hasPredictionOperator = {};",
        boolean(defined && strategy.has_prediction_operator(data))
    ));
    w.line(&format!(
        "static constexpr bool hasAPrioriTimeStepScalingFactor = {};",
        boolean(defined && data.has_code(CodeBlockSlot::APrioriTimeStepScalingFactor))
    ));
    w.line(&format!(
        "static constexpr bool hasTimeStepScalingFactor = {};",
        boolean(defined && bd.has_time_step_scaling_factor)
    ));
    w.line(&format!(
        "static constexpr bool hasAPosterioriTimeStepScalingFactor = {};",
        boolean(defined && data.has_code(CodeBlockSlot::APosterioriTimeStepScalingFactor))
    ));
    w.line("/*!");
    w.line("* \\return the name of the class.");
    w.line("*/");
    w.open("static const char* getName()");
    w.line(&format!("return \"{}\";", cn));
    w.close("");
    w.blank();
    w.close(";");
    w.blank();
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::write_traits;
    use crate::base::{count_occurrences, new_sample_description, GeneratorConfig, ModellingHypothesis};
    use crate::codegen::{LocalSolveStrategy, SourceWriter};

    fn write(hypotheses: &[ModellingHypothesis]) -> String {
        let mut bd = new_sample_description("Norton");
        bd.has_consistent_tangent_operator = true;
        let config = GeneratorConfig::new();
        let mut w = SourceWriter::new(Vec::<String>::new());
        write_traits(&bd, &config, &LocalSolveStrategy::IsotropicMisesCreep, hypotheses, &mut w);
        w.finish()
    }

    #[test]
    fn write_traits_works() {
        let code = write(&[ModellingHypothesis::Tridimensional]);
        assert!(code.contains("class MechanicalBehaviourTraits<Norton<hypothesis, NumericType, false> >"));
        assert!(code.contains("class MechanicalBehaviourTraits<Norton<ModellingHypothesis::TRIDIMENSIONAL, NumericType, false> >"));
        assert_eq!(count_occurrences(&code, "static constexpr bool is_defined = false;"), 1);
        assert_eq!(count_occurrences(&code, "static constexpr bool is_defined = true;"), 1);
        // young and nu
        assert!(code.contains("static constexpr size_type material_properties_nb = 2;"));
        // p
        assert!(code.contains("static constexpr size_type internal_variables_nb  = 1;"));
        assert!(code.contains("static constexpr bool hasConsistentTangentOperator = true;"));
        assert!(code.contains("static constexpr bool hasPredictionOperator = true;"));
        assert!(code.contains("return \"Norton\";"));
    }

    #[test]
    fn write_traits_with_many_hypotheses_works() {
        let hypotheses = [
            ModellingHypothesis::Axisymmetrical,
            ModellingHypothesis::PlaneStrain,
            ModellingHypothesis::GeneralisedPlaneStrain,
            ModellingHypothesis::Tridimensional,
        ];
        let code = write(&hypotheses);
        // generic class plus the two untreated hypotheses
        assert_eq!(count_occurrences(&code, "static constexpr bool is_defined = true;"), 1);
        assert_eq!(count_occurrences(&code, "static constexpr bool is_defined = false;"), 2);
        assert!(code.contains("Norton<ModellingHypothesis::PLANESTRESS, NumericType, false>"));
        assert!(code.contains("Norton<ModellingHypothesis::AXISYMMETRICALGENERALISEDPLANESTRAIN, NumericType, false>"));
        assert!(code.contains("static constexpr unsigned short dimension = 0u;"));
    }
}
