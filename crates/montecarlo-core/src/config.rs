//! Input limits and shared defaults for the collaborator entry points.

use crate::error::McError;
use crate::McResult;

/// Longest free-text field (scenario names, decision contexts) accepted.
pub const MAX_STRING_LENGTH: usize = 500;

/// Most assumptions a single confidence validation may declare.
pub const MAX_ASSUMPTIONS: usize = 20;

/// Upper bound on trials for confidence validation.
pub const MAX_SIMULATIONS: usize = 100_000;

pub(crate) fn default_num_simulations() -> usize {
    10_000
}

pub(crate) fn default_num_scenarios() -> usize {
    1_000
}

/// Reject free text longer than [`MAX_STRING_LENGTH`] characters.
pub fn check_text_length(field: &str, value: &str) -> McResult<()> {
    if value.chars().count() > MAX_STRING_LENGTH {
        return Err(McError::invalid(
            field,
            format!("too long (max {MAX_STRING_LENGTH} chars)"),
        ));
    }
    Ok(())
}

/// Reject a trial count that is zero or above `max`.
pub fn check_simulation_count(field: &str, value: usize, max: Option<usize>) -> McResult<()> {
    if value == 0 {
        return Err(McError::InvalidTrialCount(value));
    }
    if let Some(max) = max {
        if value > max {
            return Err(McError::invalid(
                field,
                format!("too large (max {max}), got {value}"),
            ));
        }
    }
    Ok(())
}
