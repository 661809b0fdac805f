/// Defines the directory where the generated files are saved
pub const DEFAULT_OUT_DIR: &str = "/tmp/mbgen/results";

/// Defines an auxiliary directory where the test result files are saved
pub const DEFAULT_TEST_DIR: &str = "/tmp/mbgen/test";

/// Defines the default value of the time integration parameter θ
pub const DEFAULT_THETA: f64 = 0.5;

/// Defines the default value of the local convergence criterion
pub const DEFAULT_EPSILON: f64 = 1e-8;

/// Defines the default maximum number of local iterations
pub const DEFAULT_ITER_MAX: usize = 100;

/// Defines the time step scaling factor suggested to the solver on failure
pub const MIN_TIME_STEP_SCALING_FACTOR: f64 = 0.1;

/// Defines the default convergence criterion of the staggered porosity scheme
pub const DEFAULT_STAGGERED_CONVERGENCE_CRITERION: f64 = 1e-10;

/// Defines the default maximum number of iterations of the staggered porosity scheme
pub const DEFAULT_STAGGERED_MAXIMUM_ITERATIONS: usize = 100;

/// Defines the safety factor applied to the porosity upper bound
pub const POROSITY_UPPER_BOUND_SAFETY_FACTOR: f64 = 0.985;
