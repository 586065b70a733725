use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::correlation::{apply_correlation, CorrelationMatrix};
use super::distribution::Variable;
use super::sensitivity;
use super::statistics::{self, Percentiles, SummaryStatistics};
use crate::error::McError;
use crate::McResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One trial's draw: variable name to sampled value, in declaration order.
pub type TrialValues = IndexMap<String, f64>;

/// Per-variable sample vectors, in declaration order.
pub type SampleSet = IndexMap<String, Vec<f64>>;

/// Caller-supplied outcome calculation.
///
/// Any `Fn(&TrialValues) -> McResult<f64>` closure is an `OutcomeModel`.
/// Models that can evaluate every trial at once may override
/// [`evaluate_batch`](OutcomeModel::evaluate_batch); the override must return
/// exactly what trial-by-trial evaluation would.
pub trait OutcomeModel {
    fn evaluate(&self, values: &TrialValues) -> McResult<f64>;

    /// Evaluate all `trials` serially, in trial order, stopping at the first
    /// failure.
    fn evaluate_batch(&self, samples: &SampleSet, trials: usize) -> McResult<Vec<f64>> {
        let mut values: TrialValues = samples.keys().map(|k| (k.clone(), 0.0)).collect();
        let mut outcomes = Vec::with_capacity(trials);
        for i in 0..trials {
            for (slot, column) in values.values_mut().zip(samples.values()) {
                *slot = column[i];
            }
            outcomes.push(self.evaluate(&values)?);
        }
        Ok(outcomes)
    }
}

impl<F> OutcomeModel for F
where
    F: Fn(&TrialValues) -> McResult<f64>,
{
    fn evaluate(&self, values: &TrialValues) -> McResult<f64> {
        self(values)
    }
}

/// Everything a single simulation run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// One outcome per trial, in trial order.
    pub outcomes: Vec<f64>,
    /// Samples fed to the outcome model (after correlation, if any).
    pub samples: SampleSet,
    pub statistics: SummaryStatistics,
    pub percentiles: Percentiles,
    pub num_simulations: usize,
}

impl SimulationResult {
    pub fn confidence_interval(&self, confidence_level: f64) -> McResult<(f64, f64)> {
        statistics::confidence_interval(&self.outcomes, confidence_level)
    }
}

/// Random source owned by an engine.
enum Generator {
    /// Seeded once at construction and advanced by every run.
    Seeded(StdRng),
    /// Fresh thread-local entropy on every sampling call.
    Entropy,
}

impl Generator {
    fn sample(&mut self, variable: &Variable, count: usize) -> McResult<Vec<f64>> {
        match self {
            Generator::Seeded(rng) => variable.sample(count, rng),
            Generator::Entropy => variable.sample(count, &mut rand::thread_rng()),
        }
    }
}

/// Monte Carlo simulation engine.
///
/// Reproducibility comes from the seed: two engines built with the same seed
/// produce identical results for the same sequence of calls. Each run
/// advances the generator, so repeated runs on one engine differ.
pub struct MonteCarloEngine {
    seed: Option<u64>,
    generator: Generator,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

impl MonteCarloEngine {
    pub fn new(seed: Option<u64>) -> Self {
        let generator = match seed {
            Some(s) => Generator::Seeded(StdRng::seed_from_u64(s)),
            None => Generator::Entropy,
        };
        MonteCarloEngine { seed, generator }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    pub fn unseeded() -> Self {
        Self::new(None)
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Draw `count` samples of `variable` from this engine's generator.
    pub fn sample(&mut self, variable: &Variable, count: usize) -> McResult<Vec<f64>> {
        self.generator.sample(variable, count)
    }

    /// Sample every variable `trial_count` times, optionally impose
    /// `correlation`, evaluate `outcome` once per trial and summarise.
    ///
    /// An outcome failure aborts the run and is returned unchanged.
    pub fn run_simulation<M: OutcomeModel + ?Sized>(
        &mut self,
        variables: &[Variable],
        outcome: &M,
        trial_count: usize,
        correlation: Option<&CorrelationMatrix>,
    ) -> McResult<SimulationResult> {
        if trial_count == 0 {
            return Err(McError::InvalidTrialCount(trial_count));
        }
        let mut seen = HashSet::with_capacity(variables.len());
        for var in variables {
            if !seen.insert(var.name()) {
                return Err(McError::invalid(
                    "variables",
                    format!("duplicate variable name '{}'", var.name()),
                ));
            }
        }

        tracing::debug!(
            trials = trial_count,
            variables = variables.len(),
            seeded = self.seed.is_some(),
            correlated = correlation.is_some(),
            "starting simulation"
        );

        let mut samples = SampleSet::with_capacity(variables.len());
        for var in variables {
            samples.insert(var.name().to_string(), self.sample(var, trial_count)?);
        }

        if let Some(matrix) = correlation {
            samples = apply_correlation(&samples, matrix, variables)?;
        }

        let outcomes = outcome.evaluate_batch(&samples, trial_count)?;
        if outcomes.len() != trial_count {
            return Err(McError::OutcomeEvaluation(format!(
                "expected {trial_count} outcomes, got {}",
                outcomes.len()
            )));
        }

        let (stats, percentiles) = statistics::describe(&outcomes)?;
        tracing::debug!(
            trials = trial_count,
            mean = stats.mean,
            std = stats.std,
            "simulation finished"
        );

        Ok(SimulationResult {
            outcomes,
            samples,
            statistics: stats,
            percentiles,
            num_simulations: trial_count,
        })
    }

    /// See [`statistics::confidence_interval`].
    pub fn confidence_interval(&self, outcomes: &[f64], confidence_level: f64) -> McResult<(f64, f64)> {
        statistics::confidence_interval(outcomes, confidence_level)
    }

    /// See [`sensitivity::sensitivity_analysis`].
    pub fn sensitivity_analysis<M: OutcomeModel + ?Sized>(
        &self,
        variables: &[Variable],
        outcome: &M,
        outcomes: &[f64],
        samples: &SampleSet,
    ) -> McResult<IndexMap<String, f64>> {
        sensitivity::sensitivity_analysis(variables, outcome, outcomes, samples)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
