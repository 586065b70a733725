pub mod confidence;
pub mod robustness;

pub use confidence::{validate_reasoning_confidence, ConfidenceInput, ConfidenceOutput};
pub use robustness::{test_assumption_robustness, RobustnessInput, RobustnessOutput};
