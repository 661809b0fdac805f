use log::{info, LevelFilter};
use mbgen::base::{BehaviourParameters, GenError, GeneratorConfig, ModellingHypothesis, Solver};
use mbgen::dsl::BehaviourFile;
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "mbgen",
    about = "Generates the C++ integration code of a mechanical behaviour described in a JSON file"
)]
struct Options {
    /// Behaviour file (JSON)
    input: String,

    /// Output directory
    #[structopt(long, default_value = "/tmp/mbgen/results")]
    out_dir: String,

    /// Restricts the modelling hypotheses (may be repeated)
    #[structopt(long = "hypothesis", parse(try_from_str = ModellingHypothesis::from_name))]
    hypotheses: Vec<ModellingHypothesis>,

    /// Generates the entry points for a solver: ansys or lsdyna (may be repeated)
    #[structopt(long = "interface", parse(try_from_str = Solver::from_name))]
    interfaces: Vec<Solver>,

    /// Overrides the default values of the parameters (JSON file)
    #[structopt(long)]
    parameters: Option<String>,

    /// Makes the generated code print the Newton iterations
    #[structopt(long)]
    debug: bool,

    /// Disables the NPROPS/NSTATV/NTENS checks of the solver interfaces
    #[structopt(long)]
    no_runtime_checks: bool,

    /// Shows debug messages
    #[structopt(short, long)]
    verbose: bool,
}

fn initialize_logging(verbose: bool) -> Result<(), GenError> {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, false),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .map_err(|_| GenError::Message("cannot initialize the logger"))
}

fn main() -> Result<(), GenError> {
    // parse options
    let options = Options::from_args();
    initialize_logging(options.verbose)?;

    // configuration
    let mut config = GeneratorConfig::new();
    config
        .set_out_dir(&options.out_dir)?
        .set_debug_mode(options.debug)?
        .set_no_runtime_checks(options.no_runtime_checks)?;
    for solver in &options.interfaces {
        config.add_interface(*solver)?;
    }
    if !options.hypotheses.is_empty() {
        config.set_hypotheses(&options.hypotheses)?;
    }
    info!("{}", config);

    // read behaviour
    let behaviour = BehaviourFile::read(&options.input)?.to_behaviour()?;

    // generate
    let files = match &options.parameters {
        Some(path) => {
            let mut parameters: BehaviourParameters = behaviour.parameters();
            parameters.update_from_file(path)?;
            behaviour.generate_with_parameters(&config, &parameters)?
        }
        None => behaviour.generate(&config)?,
    };
    let written = files.write_to(&config.out_dir)?;

    // message
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}
