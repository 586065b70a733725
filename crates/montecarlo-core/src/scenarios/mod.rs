pub mod business;
pub mod tornado;

pub use business::{run_business_scenario, BusinessScenarioInput, BusinessScenarioOutput};
pub use tornado::{run_tornado_analysis, TornadoInput, TornadoOutput};
