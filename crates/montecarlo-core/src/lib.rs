pub mod config;
pub mod error;
pub mod monte_carlo;
pub mod types;

#[cfg(feature = "business")]
pub mod scenarios;

#[cfg(feature = "validation")]
pub mod validation;

pub use error::McError;
pub use types::*;

/// Standard result type for all montecarlo-core operations
pub type McResult<T> = Result<T, McError>;
