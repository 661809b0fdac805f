use super::{check, data_structure, data_structures, DataMap, HookeStressPotential, InelasticFlow};
use super::{OptionDescription, OptionType, PorosityEvolution};
use crate::base::{throw_runtime_error, BehaviourDescription, GenError};
use crate::codegen::{ImplicitScheme, NonLinearSystemSolver};
use log::debug;

/// Composes a stress potential, inelastic flows and the porosity evolution
///
/// ```text
/// feel = deel - deto + sum_i dp_i*n_i
/// fp_i = flow rule of flow i
/// fa_ik = back strain equation k of flow i
/// ff = df - sum_i growth_i - sum_i nucleation_i
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ElastoViscoPlasticityBrick {
    /// Stress potential
    pub stress_potential: HookeStressPotential,

    /// Inelastic flows
    pub inelastic_flows: Vec<InelasticFlow>,

    /// Porosity evolution (required by porous criteria and nucleation models)
    pub porosity_evolution: Option<PorosityEvolution>,
}

impl ElastoViscoPlasticityBrick {
    /// Returns the name of the brick
    pub fn name() -> &'static str {
        "StandardElastoViscoPlasticity"
    }

    /// Returns the options of the brick
    pub fn options() -> Vec<OptionDescription> {
        vec![
            OptionDescription::new("stress_potential", "stress potential", OptionType::DataStructure),
            OptionDescription::new("inelastic_flow", "inelastic flows", OptionType::DataStructures),
            OptionDescription::new("porosity_evolution", "porosity evolution", OptionType::DataMap),
        ]
    }

    /// Reads the brick
    pub fn new(d: &DataMap) -> Result<Self, GenError> {
        check(ElastoViscoPlasticityBrick::name(), d, &ElastoViscoPlasticityBrick::options())?;
        let stress_potential = match d.get("stress_potential") {
            Some(data) => {
                let (name, options) = data_structure("stress_potential", data)?;
                if name != "Hooke" {
                    return Err(throw_runtime_error(
                        "StandardElastoViscoPlasticityBrick::treatStressPotential",
                        &format!("unsupported stress potential '{}'", name),
                    ));
                }
                HookeStressPotential::new(&options)?
            }
            None => {
                return Err(throw_runtime_error(
                    "StandardElastoViscoPlasticityBrick::initialize",
                    "no stress potential defined",
                ))
            }
        };
        let mut inelastic_flows = Vec::new();
        if let Some(data) = d.get("inelastic_flow") {
            for (name, options) in data_structures("inelastic_flow", data)? {
                inelastic_flows.push(InelasticFlow::new(&name, &options)?);
            }
        }
        let porosity_evolution = match d.get("porosity_evolution") {
            Some(data) => {
                let map = data.as_map().ok_or(GenError::OptionTypeMismatch {
                    option: "porosity_evolution".to_string(),
                    expected: "map".to_string(),
                })?;
                Some(PorosityEvolution::new(map)?)
            }
            None => {
                if inelastic_flows.iter().any(|f| f.is_coupled_with_porosity_evolution()) {
                    Some(PorosityEvolution::default())
                } else {
                    None
                }
            }
        };
        Ok(ElastoViscoPlasticityBrick {
            stress_potential,
            inelastic_flows,
            porosity_evolution,
        })
    }

    /// Returns the id of a flow (empty if there is only one)
    pub fn flow_id(&self, index: usize) -> String {
        if self.inelastic_flows.len() == 1 {
            String::new()
        } else {
            index.to_string()
        }
    }

    /// Declares the variables and the code blocks of all the bricks
    pub fn initialize(&self, bd: &mut BehaviourDescription) -> Result<(), GenError> {
        self.stress_potential.initialize(bd)?;
        if let Some(evolution) = &self.porosity_evolution {
            evolution.initialize(bd)?;
        }
        for (i, flow) in self.inelastic_flows.iter().enumerate() {
            let fid = self.flow_id(i);
            debug!("initializing inelastic flow '{}'", fid);
            flow.initialize(bd, &self.stress_potential, &fid, self.porosity_evolution.as_ref())?;
        }
        Ok(())
    }

    /// Builds the implicit scheme
    ///
    /// Terms are ordered as: elastic strain, mid-step porosity, flows (in
    /// declaration order), closing porosity terms.
    pub fn implicit_scheme(&self, solver: NonLinearSystemSolver) -> Result<ImplicitScheme, GenError> {
        let analytical = !solver.requires_numerical_jacobian();
        let evolution = self.porosity_evolution.as_ref();
        let mut terms = self.stress_potential.residual_terms();
        if let Some(evolution) = evolution {
            terms.push(evolution.mid_step_term());
        }
        for (i, flow) in self.inelastic_flows.iter().enumerate() {
            let fid = self.flow_id(i);
            terms.extend(flow.residual_terms(&self.stress_potential, &fid, evolution, analytical)?);
        }
        if let Some(evolution) = evolution {
            terms.extend(evolution.final_terms(analytical));
        }
        let mut scheme = ImplicitScheme::new(solver, terms);
        scheme.staggered = evolution.and_then(|e| e.staggered_scheme());
        Ok(scheme)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
