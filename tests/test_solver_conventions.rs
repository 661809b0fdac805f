use approx::assert_relative_eq;
use mbgen::base::{GeneratorConfig, ModellingHypothesis, Solver};
use mbgen::dsl::BehaviourFile;
use mbgen::interfaces::{conversion_table, convert_tangent_operator, ntens, revert_tangent_operator};
use mbgen::interfaces::{solver_components, stress_from_solver, stress_to_solver, supported_hypotheses};
use mbgen::tensor::stensor_dime_to_size;
use nalgebra::DMatrix;

// Storage conventions of the solver interfaces
//
// TEST GOAL
//
// Checks the conversions between the solver arrays and the TFEL symmetric
// tensors: the sizes of the buffers, the round trip of the tangent operator
// and the plane stress case, where the solvers don't store the zz component.
//
// PLANE STRESS (Ansys)
//
// Solver order (xx, yy, xy), TFEL order (xx, yy, zz, xy). The third entry of
// the column-major DDSDDE is therefore Dt(3,0), scaled once for the shear.

const IMPLICIT_NORTON: &str = r#"{
  "dsl": "Implicit",
  "name": "ImplicitNorton",
  "hypotheses": ["PlaneStress"],
  "brick": {
    "stress_potential": "Hooke",
    "inelastic_flow": { "name": "Norton", "criterion": "Mises", "K": 100e6, "n": 5 }
  }
}"#;

#[test]
fn test_ansys_plane_stress() -> Result<(), mbgen::base::GenError> {
    let behaviour = BehaviourFile::from_json(IMPLICIT_NORTON)?.to_behaviour()?;
    let mut config = GeneratorConfig::new();
    config.add_interface(Solver::Ansys)?;
    let files = behaviour.generate(&config)?;
    let src = files.get("ansysImplicitNorton.cxx").unwrap();
    assert!(src.contains("ImplicitNorton_pstress_convertTangentOperator"));
    assert!(src.contains("DDSDDE[2] = Dt(3,0)*cste;"));
    assert!(src.contains("DDSDDE[8] = Dt(3,3)*cste*cste;"));
    assert!(!src.contains("ImplicitNorton_3D"));
    Ok(())
}

#[test]
fn test_buffer_sizes() {
    for h in ModellingHypothesis::ALL {
        let dim = h.space_dimension().unwrap();
        assert!(dim >= 1 && dim <= 3);
        assert_eq!(h.stensor_size().unwrap(), stensor_dime_to_size(dim));
    }
    for solver in [Solver::Ansys, Solver::LsDyna] {
        for h in supported_hypotheses(solver) {
            let n = ntens(solver, *h).unwrap();
            let components = solver_components(solver, *h).unwrap();
            assert_eq!(components.len(), n);
            assert!(components.iter().all(|c| *c < h.stensor_size().unwrap()));
            assert_eq!(conversion_table(solver, *h).unwrap().len(), n * n);
        }
        assert_eq!(ntens(solver, ModellingHypothesis::AxisymmetricalGeneralisedPlaneStrain), None);
    }
}

#[test]
fn test_tangent_round_trip() {
    for solver in [Solver::Ansys, Solver::LsDyna] {
        for h in supported_hypotheses(solver) {
            let size = h.stensor_size().unwrap();
            let n = ntens(solver, *h).unwrap();
            let dt = DMatrix::<f64>::from_fn(size, size, |i, j| 1.0 + (i * size + j) as f64);
            for symmetric in [true, false] {
                let mut ddsdde = vec![0.0; n * n];
                convert_tangent_operator(&mut ddsdde, &dt, solver, *h, symmetric).unwrap();
                let back = revert_tangent_operator(&ddsdde, solver, *h, symmetric).unwrap();
                for i in 0..size {
                    for j in 0..size {
                        if *h == ModellingHypothesis::PlaneStress && (i == 2 || j == 2) {
                            assert_eq!(back[(i, j)], 0.0);
                        } else {
                            assert_relative_eq!(back[(i, j)], dt[(i, j)], epsilon = 1e-12);
                        }
                    }
                }
            }
            // stresses
            let sig: Vec<_> = (0..size).map(|i| 10.0 * (i + 1) as f64).collect();
            let values = stress_to_solver(&sig, solver, *h).unwrap();
            assert_eq!(values.len(), n);
            let back = stress_from_solver(&values, solver, *h).unwrap();
            for (i, s) in back.iter().enumerate() {
                if *h == ModellingHypothesis::PlaneStress && i == 2 {
                    assert_eq!(*s, 0.0);
                } else {
                    assert_relative_eq!(*s, sig[i], epsilon = 1e-12);
                }
            }
        }
    }
}
