pub mod correlation;
pub mod distribution;
pub mod engine;
pub mod sensitivity;
pub mod simulation;
pub mod statistics;

pub use correlation::{apply_correlation, CorrelationMatrix};
pub use distribution::{Distribution, DistributionKind, Variable, VariableSpec};
pub use engine::{MonteCarloEngine, OutcomeModel, SampleSet, SimulationResult, TrialValues};
pub use sensitivity::sensitivity_analysis;
pub use simulation::{run_monte_carlo_simulation, SimulationInput, SimulationOutput};
pub use statistics::{confidence_interval, Percentiles, SummaryStatistics};
