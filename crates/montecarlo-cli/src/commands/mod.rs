pub mod scenarios;
pub mod simulation;
pub mod validation;
