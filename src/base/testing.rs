use super::{BehaviourDescription, ModellingHypothesis, VariableDescription};

/// Returns a small strain description with Young's modulus, Poisson ratio and a scalar state variable
#[allow(dead_code)]
pub(crate) fn new_sample_description(name: &str) -> BehaviourDescription {
    let h = ModellingHypothesis::Undefined;
    let mut bd = BehaviourDescription::new(name).unwrap();
    let young = VariableDescription::new("stress", "young")
        .unwrap()
        .with_glossary_name("YoungModulus");
    let nu = VariableDescription::new("real", "nu")
        .unwrap()
        .with_glossary_name("PoissonRatio");
    bd.add_material_property(h, young).unwrap();
    bd.add_material_property(h, nu).unwrap();
    bd.set_elastic_material_properties(&["young", "nu"]).unwrap();
    let p = VariableDescription::new("strain", "p")
        .unwrap()
        .with_glossary_name("EquivalentPlasticStrain");
    bd.add_state_variable(h, p).unwrap();
    bd
}

/// Returns the number of times a pattern appears in a text
#[allow(dead_code)]
pub(crate) fn count_occurrences(text: &str, pattern: &str) -> usize {
    text.matches(pattern).count()
}
