use mbgen::base::{GeneratorConfig, ModellingHypothesis, Solver, DEFAULT_TEST_DIR};
use mbgen::dsl::BehaviourFile;
use std::fs;

// Generation of the sample behaviours
//
// TEST GOAL
//
// Reads the behaviour files in data/behaviours, generates the four files of
// each behaviour (plus the solver interfaces) and checks that regenerating
// from an unchanged description gives byte-identical files, in memory and
// once written to disk.
//
// BEHAVIOURS
//
// norton.json                  IsotropicMisesCreep
// linear_hardening.json        IsotropicMisesPlasticFlow
// strain_hardening_creep.json  IsotropicStrainHardeningMisesCreep
// two_flows.json               MultipleIsotropicMisesFlows

const SAMPLES: [(&str, &str); 4] = [
    ("norton", "Inconel600_Norton"),
    ("linear_hardening", "LinearHardening"),
    ("strain_hardening_creep", "StrainHardeningCreep"),
    ("two_flows", "PlasticityAndCreep"),
];

#[test]
fn test_sample_behaviours() -> Result<(), mbgen::base::GenError> {
    let mut config = GeneratorConfig::new();
    config.set_out_dir(DEFAULT_TEST_DIR)?;
    for (stem, class_name) in SAMPLES {
        let path = format!("data/behaviours/{}.json", stem);
        let behaviour = BehaviourFile::read(&path)?.to_behaviour()?;
        assert_eq!(behaviour.description.class_name(), class_name);

        // the four files of the behaviour, in emission order
        let files = behaviour.generate(&config)?;
        assert_eq!(
            files.paths(),
            &[
                format!("TFEL/Material/{}BehaviourData.hxx", class_name),
                format!("TFEL/Material/{}IntegrationData.hxx", class_name),
                format!("TFEL/Material/{}.hxx", class_name),
                format!("{}.cxx", class_name),
            ]
        );

        // regeneration is idempotent
        let again = BehaviourFile::read(&path)?.to_behaviour()?.generate(&config)?;
        assert_eq!(files, again);

        // written files hold the generated text
        let out_dir = format!("{}/{}", DEFAULT_TEST_DIR, stem);
        let written = files.write_to(&out_dir)?;
        assert_eq!(written.len(), 4);
        for ((_, content), full_path) in files.files.iter().zip(&written) {
            let read = fs::read_to_string(full_path).unwrap();
            assert_eq!(&read, content);
        }
    }
    Ok(())
}

#[test]
fn test_sample_behaviours_with_interfaces() -> Result<(), mbgen::base::GenError> {
    let behaviour = BehaviourFile::read("data/behaviours/linear_hardening.json")?.to_behaviour()?;
    let mut config = GeneratorConfig::new();
    config
        .add_interface(Solver::Ansys)?
        .add_interface(Solver::LsDyna)?
        .set_hypotheses(&[ModellingHypothesis::PlaneStrain, ModellingHypothesis::Tridimensional])?;
    let files = behaviour.generate(&config)?;
    let paths = files.paths();
    assert_eq!(paths.len(), 4 + 3 + 2);
    assert_eq!(
        &paths[4..],
        &[
            "MFront/Ansys/ansysLinearHardening.hxx",
            "ansysLinearHardening.cxx",
            "ansys/LinearHardening.dat",
            "MFront/LSDYNA/lsdynaLinearHardening.hxx",
            "lsdynaLinearHardening.cxx",
        ]
    );

    // only the requested hypotheses get an entry point
    let ansys = files.get("ansysLinearHardening.cxx").unwrap();
    assert!(ansys.contains("LinearHardening_pstrain\n"));
    assert!(ansys.contains("LinearHardening_3D\n"));
    assert!(!ansys.contains("LinearHardening_axis\n"));
    assert!(!ansys.contains("MFRONT_ANSYS_NORUNTIMECHECKS"));
    let lsdyna = files.get("lsdynaLinearHardening.cxx").unwrap();
    assert!(lsdyna.contains("LinearHardening_PSTRAIN\n"));
    assert!(lsdyna.contains("return lsdyna::LSDYNAInterface<tfel::material::ModellingHypothesis::PLANESTRAIN"));

    // R0 and H follow the elastic properties in PROPS
    let dat = files.get("ansys/LinearHardening.dat").unwrap();
    assert!(dat.contains("/com, -YoungModulus\n"));
    assert!(dat.contains("/com, -R0\n"));
    assert!(dat.contains("tb,user,<mat_id>,<number of temperatures>,4\n"));

    // the escape hatch of the runtime checks
    config.set_no_runtime_checks(true)?;
    let files = behaviour.generate(&config)?;
    let ansys = files.get("ansysLinearHardening.cxx").unwrap();
    assert!(ansys.starts_with("/*!"));
    assert!(ansys.contains("#define MFRONT_ANSYS_NORUNTIMECHECKS\n"));
    Ok(())
}
