use rand::distributions::Distribution as RandDistribution;
use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta, ContinuousCDF, Exp, Gamma, LogNormal, Normal, Triangular, Uniform};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::McError;
use crate::McResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The seven supported distribution families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionKind {
    Normal,
    LogNormal,
    Uniform,
    Triangular,
    Exponential,
    Beta,
    Gamma,
}

impl DistributionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionKind::Normal => "normal",
            DistributionKind::LogNormal => "lognormal",
            DistributionKind::Uniform => "uniform",
            DistributionKind::Triangular => "triangular",
            DistributionKind::Exponential => "exponential",
            DistributionKind::Beta => "beta",
            DistributionKind::Gamma => "gamma",
        }
    }

    /// Parameter keys a declaration of this kind must carry.
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            DistributionKind::Normal => &["mean", "std"],
            DistributionKind::LogNormal => &["mean", "sigma"],
            DistributionKind::Uniform => &["min", "max"],
            DistributionKind::Triangular => &["left", "mode", "right"],
            DistributionKind::Exponential => &["scale"],
            DistributionKind::Beta => &["a", "b"],
            DistributionKind::Gamma => &["shape", "scale"],
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributionKind {
    type Err = McError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(DistributionKind::Normal),
            "lognormal" => Ok(DistributionKind::LogNormal),
            "uniform" => Ok(DistributionKind::Uniform),
            "triangular" => Ok(DistributionKind::Triangular),
            "exponential" => Ok(DistributionKind::Exponential),
            "beta" => Ok(DistributionKind::Beta),
            "gamma" => Ok(DistributionKind::Gamma),
            other => Err(McError::UnsupportedDistributionKind(other.to_string())),
        }
    }
}

/// A parametric distribution with its parameters already resolved.
///
/// `LogNormal::mean`/`sigma` describe the underlying normal, not the
/// log-normal itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distribution {
    Normal { mean: f64, std: f64 },
    LogNormal { mean: f64, sigma: f64 },
    Uniform { min: f64, max: f64 },
    Triangular { left: f64, mode: f64, right: f64 },
    Exponential { scale: f64 },
    Beta { a: f64, b: f64 },
    Gamma { shape: f64, scale: f64 },
}

/// A named, validated simulation input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VariableSpec", into = "VariableSpec")]
pub struct Variable {
    name: String,
    distribution: Distribution,
}

/// Wire form of a [`Variable`]: `{"name", "distribution", "params"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    pub distribution: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

fn lookup(variable: &str, params: &BTreeMap<String, f64>, key: &str) -> McResult<f64> {
    params
        .get(key)
        .copied()
        .ok_or_else(|| McError::MissingParameter {
            variable: variable.to_string(),
            parameter: key.to_string(),
        })
}

impl Distribution {
    /// Resolve the parameters `kind` requires from a name → value mapping.
    /// Extra keys are ignored.
    pub fn from_params(
        variable: &str,
        kind: DistributionKind,
        params: &BTreeMap<String, f64>,
    ) -> McResult<Self> {
        let p = |key: &str| lookup(variable, params, key);
        Ok(match kind {
            DistributionKind::Normal => Distribution::Normal {
                mean: p("mean")?,
                std: p("std")?,
            },
            DistributionKind::LogNormal => Distribution::LogNormal {
                mean: p("mean")?,
                sigma: p("sigma")?,
            },
            DistributionKind::Uniform => Distribution::Uniform {
                min: p("min")?,
                max: p("max")?,
            },
            DistributionKind::Triangular => Distribution::Triangular {
                left: p("left")?,
                mode: p("mode")?,
                right: p("right")?,
            },
            DistributionKind::Exponential => Distribution::Exponential {
                scale: p("scale")?,
            },
            DistributionKind::Beta => Distribution::Beta {
                a: p("a")?,
                b: p("b")?,
            },
            DistributionKind::Gamma => Distribution::Gamma {
                shape: p("shape")?,
                scale: p("scale")?,
            },
        })
    }

    pub fn kind(&self) -> DistributionKind {
        match self {
            Distribution::Normal { .. } => DistributionKind::Normal,
            Distribution::LogNormal { .. } => DistributionKind::LogNormal,
            Distribution::Uniform { .. } => DistributionKind::Uniform,
            Distribution::Triangular { .. } => DistributionKind::Triangular,
            Distribution::Exponential { .. } => DistributionKind::Exponential,
            Distribution::Beta { .. } => DistributionKind::Beta,
            Distribution::Gamma { .. } => DistributionKind::Gamma,
        }
    }

    /// Parameters keyed the way [`Distribution::from_params`] reads them.
    pub fn params(&self) -> BTreeMap<String, f64> {
        let pairs: Vec<(&str, f64)> = match *self {
            Distribution::Normal { mean, std } => vec![("mean", mean), ("std", std)],
            Distribution::LogNormal { mean, sigma } => vec![("mean", mean), ("sigma", sigma)],
            Distribution::Uniform { min, max } => vec![("min", min), ("max", max)],
            Distribution::Triangular { left, mode, right } => {
                vec![("left", left), ("mode", mode), ("right", right)]
            }
            Distribution::Exponential { scale } => vec![("scale", scale)],
            Distribution::Beta { a, b } => vec![("a", a), ("b", b)],
            Distribution::Gamma { shape, scale } => vec![("shape", shape), ("scale", scale)],
        };
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    /// Build the statrs sampler backing this distribution.
    ///
    /// A zero spread (normal `std`, lognormal `sigma`, equal uniform or
    /// triangular bounds) collapses to a point mass, which statrs itself
    /// refuses to construct.
    fn marginal(&self, variable: &str) -> McResult<Marginal> {
        let invalid = |e: &dyn fmt::Display| {
            McError::invalid(
                format!("variable:{variable}"),
                format!("Invalid {} parameters: {e}", self.kind()),
            )
        };
        let m = match *self {
            Distribution::Normal { mean, std } if std == 0.0 && mean.is_finite() => {
                Marginal::Point(mean)
            }
            Distribution::Normal { mean, std } => {
                Marginal::Normal(Normal::new(mean, std).map_err(|e| invalid(&e))?)
            }
            Distribution::LogNormal { mean, sigma } if sigma == 0.0 && mean.is_finite() => {
                Marginal::Point(mean.exp())
            }
            Distribution::LogNormal { mean, sigma } => {
                Marginal::LogNormal(LogNormal::new(mean, sigma).map_err(|e| invalid(&e))?)
            }
            Distribution::Uniform { min, max } if min == max && min.is_finite() => {
                Marginal::Point(min)
            }
            Distribution::Uniform { min, max } => {
                Marginal::Uniform(Uniform::new(min, max).map_err(|e| invalid(&e))?)
            }
            Distribution::Triangular { left, mode, right }
                if left == right && mode == left && left.is_finite() =>
            {
                Marginal::Point(left)
            }
            Distribution::Triangular { left, mode, right } => Marginal::Triangular(
                Triangular::new(left, right, mode).map_err(|e| invalid(&e))?,
            ),
            Distribution::Exponential { scale } => {
                if !(scale > 0.0) {
                    return Err(invalid(&"scale must be positive"));
                }
                Marginal::Exponential(Exp::new(1.0 / scale).map_err(|e| invalid(&e))?)
            }
            Distribution::Beta { a, b } => {
                Marginal::Beta(Beta::new(a, b).map_err(|e| invalid(&e))?)
            }
            Distribution::Gamma { shape, scale } => {
                if !(scale > 0.0) {
                    return Err(invalid(&"scale must be positive"));
                }
                Marginal::Gamma(Gamma::new(shape, 1.0 / scale).map_err(|e| invalid(&e))?)
            }
        };
        Ok(m)
    }
}

impl Variable {
    /// Declare a variable, checking its parameters can be sampled.
    pub fn new(name: impl Into<String>, distribution: Distribution) -> McResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(McError::invalid("variable.name", "must not be empty"));
        }
        distribution.marginal(&name)?;
        Ok(Variable { name, distribution })
    }

    /// Declare a variable from a distribution name and a parameter mapping.
    pub fn from_params(
        name: impl Into<String>,
        kind: &str,
        params: &BTreeMap<String, f64>,
    ) -> McResult<Self> {
        let name = name.into();
        let kind: DistributionKind = kind.parse()?;
        let distribution = Distribution::from_params(&name, kind, params)?;
        Variable::new(name, distribution)
    }

    pub fn normal(name: impl Into<String>, mean: f64, std: f64) -> McResult<Self> {
        Variable::new(name, Distribution::Normal { mean, std })
    }

    pub fn uniform(name: impl Into<String>, min: f64, max: f64) -> McResult<Self> {
        Variable::new(name, Distribution::Uniform { min, max })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn kind(&self) -> DistributionKind {
        self.distribution.kind()
    }

    // -----------------------------------------------------------------------
    // Sampling
    // -----------------------------------------------------------------------

    /// Draw `count` independent samples using the provided generator.
    pub fn sample<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> McResult<Vec<f64>> {
        let marginal = self.distribution.marginal(&self.name)?;
        Ok((0..count).map(|_| marginal.draw(rng)).collect())
    }

    /// Whether every draw of this variable returns the same value.
    pub fn is_point_mass(&self) -> bool {
        matches!(self.distribution.marginal(&self.name), Ok(Marginal::Point(_)))
    }

    /// Probability that this variable falls at or below `x`.
    pub fn cdf(&self, x: f64) -> McResult<f64> {
        Ok(self.distribution.marginal(&self.name)?.cdf(x))
    }

    /// Closed-form inverse CDF, available for normal and uniform only.
    pub fn exact_inverse_cdf(&self, p: f64) -> Option<f64> {
        match self.distribution {
            Distribution::Normal { mean, std } => {
                if std == 0.0 {
                    Some(mean)
                } else {
                    Normal::new(mean, std).ok().map(|n| n.inverse_cdf(p))
                }
            }
            Distribution::Uniform { min, max } => Some(min + p * (max - min)),
            _ => None,
        }
    }
}

impl TryFrom<VariableSpec> for Variable {
    type Error = McError;

    fn try_from(spec: VariableSpec) -> Result<Self, Self::Error> {
        Variable::from_params(spec.name, &spec.distribution, &spec.params)
    }
}

impl From<Variable> for VariableSpec {
    fn from(v: Variable) -> Self {
        VariableSpec {
            distribution: v.kind().as_str().to_string(),
            params: v.distribution.params(),
            name: v.name,
        }
    }
}

// ---------------------------------------------------------------------------
// Marginal samplers
// ---------------------------------------------------------------------------

enum Marginal {
    Point(f64),
    Normal(Normal),
    LogNormal(LogNormal),
    Uniform(Uniform),
    Triangular(Triangular),
    Exponential(Exp),
    Beta(Beta),
    Gamma(Gamma),
}

impl Marginal {
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Marginal::Point(v) => *v,
            Marginal::Normal(d) => d.sample(rng),
            Marginal::LogNormal(d) => d.sample(rng),
            Marginal::Uniform(d) => d.sample(rng),
            Marginal::Triangular(d) => d.sample(rng),
            Marginal::Exponential(d) => d.sample(rng),
            Marginal::Beta(d) => d.sample(rng),
            Marginal::Gamma(d) => d.sample(rng),
        }
    }

    fn cdf(&self, x: f64) -> f64 {
        match self {
            Marginal::Point(v) => {
                if x < *v {
                    0.0
                } else {
                    1.0
                }
            }
            Marginal::Normal(d) => d.cdf(x),
            Marginal::LogNormal(d) => d.cdf(x),
            Marginal::Uniform(d) => d.cdf(x),
            Marginal::Triangular(d) => d.cdf(x),
            Marginal::Exponential(d) => d.cdf(x),
            Marginal::Beta(d) => d.cdf(x),
            Marginal::Gamma(d) => d.cdf(x),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
