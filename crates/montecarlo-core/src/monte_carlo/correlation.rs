use indexmap::IndexMap;
use nalgebra::{Cholesky, DMatrix, SymmetricEigen};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use super::distribution::Variable;
use crate::error::McError;
use crate::McResult;

/// Largest tolerated |A - Aᵀ| entry.
pub const SYMMETRY_TOLERANCE: f64 = 1e-8;

/// Smallest tolerated eigenvalue; absorbs round-off in PSD matrices.
pub const EIGENVALUE_TOLERANCE: f64 = -1e-10;

/// Uniform scores are kept this far inside (0, 1) so the probit stays finite.
const UNIFORM_CLAMP: f64 = 1e-12;

/// Target correlation structure, indexed like the variable list it applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct CorrelationMatrix {
    matrix: DMatrix<f64>,
}

impl CorrelationMatrix {
    /// Build from row vectors. Only shape and finiteness are checked here;
    /// symmetry and positive semi-definiteness are checked by [`validate`].
    ///
    /// [`validate`]: CorrelationMatrix::validate
    pub fn from_rows(rows: &[Vec<f64>]) -> McResult<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(McError::InvalidCorrelationMatrix(
                "matrix must not be empty".into(),
            ));
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != n) {
            return Err(McError::InvalidCorrelationMatrix(format!(
                "matrix must be square: row {bad} has {} entries, expected {n}",
                rows[bad].len()
            )));
        }
        if rows.iter().flatten().any(|v| !v.is_finite()) {
            return Err(McError::InvalidCorrelationMatrix(
                "matrix entries must be finite".into(),
            ));
        }
        Ok(CorrelationMatrix {
            matrix: DMatrix::from_fn(n, n, |i, j| rows[i][j]),
        })
    }

    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix[(i, j)]
    }

    /// Check symmetry within [`SYMMETRY_TOLERANCE`] and that no eigenvalue
    /// falls below [`EIGENVALUE_TOLERANCE`].
    pub fn validate(&self) -> McResult<()> {
        let asymmetry = (&self.matrix - self.matrix.transpose()).amax();
        if asymmetry > SYMMETRY_TOLERANCE {
            return Err(McError::InvalidCorrelationMatrix(format!(
                "matrix must be symmetric (max |A - Aᵀ| = {asymmetry:e})"
            )));
        }
        let eigen = SymmetricEigen::new(self.matrix.clone());
        let min_eigenvalue = eigen.eigenvalues.min();
        if min_eigenvalue < EIGENVALUE_TOLERANCE {
            return Err(McError::InvalidCorrelationMatrix(format!(
                "matrix must be positive semi-definite (min eigenvalue = {min_eigenvalue:e})"
            )));
        }
        Ok(())
    }

    /// Lower-triangular Cholesky factor.
    fn cholesky_lower(&self) -> McResult<DMatrix<f64>> {
        Cholesky::new(self.matrix.clone())
            .map(|c| c.l())
            .ok_or_else(|| {
                McError::CorrelationFactorizationFailed(
                    "matrix is not positive definite".into(),
                )
            })
    }
}

impl TryFrom<Vec<Vec<f64>>> for CorrelationMatrix {
    type Error = McError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        CorrelationMatrix::from_rows(&rows)
    }
}

impl From<CorrelationMatrix> for Vec<Vec<f64>> {
    fn from(c: CorrelationMatrix) -> Self {
        c.matrix
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }
}

/// Impose `matrix` on independently drawn samples with a Gaussian copula.
///
/// Each variable is pushed through its own CDF and the standard-normal
/// quantile, the scores are mixed by the Cholesky factor, and the result is
/// mapped back through Φ. Only normal and uniform variables have a closed-form
/// inverse CDF; every other variable keeps its original samples, so only
/// normal and uniform variables actually receive the requested correlation.
///
/// Point-mass variables are decoupled from the matrix so their partners keep
/// their own marginals.
///
/// Returns a fresh mapping. Entries for names not in `variables` are copied
/// through unchanged.
pub fn apply_correlation(
    samples: &IndexMap<String, Vec<f64>>,
    matrix: &CorrelationMatrix,
    variables: &[Variable],
) -> McResult<IndexMap<String, Vec<f64>>> {
    matrix.validate()?;

    if matrix.dim() != variables.len() {
        return Err(McError::InvalidCorrelationMatrix(format!(
            "matrix is {0}x{0} but {1} variables were supplied",
            matrix.dim(),
            variables.len()
        )));
    }

    let columns: Vec<&Vec<f64>> = variables
        .iter()
        .map(|v| {
            samples
                .get(v.name())
                .ok_or_else(|| McError::invalid("samples", format!("no samples for '{}'", v.name())))
        })
        .collect::<McResult<_>>()?;

    let trials = columns.first().map_or(0, |c| c.len());
    if columns.iter().any(|c| c.len() != trials) {
        return Err(McError::invalid(
            "samples",
            "all variables must have the same number of samples",
        ));
    }

    let standard = Normal::new(0.0, 1.0)
        .map_err(|e| McError::CorrelationFactorizationFailed(e.to_string()))?;

    // variables x trials matrix of independent normal scores; point masses
    // keep a score of 0
    let mut scores = DMatrix::<f64>::zeros(variables.len(), trials);
    for (i, (var, column)) in variables.iter().zip(&columns).enumerate() {
        if var.is_point_mass() {
            continue;
        }
        for (j, &x) in column.iter().enumerate() {
            let u = var.cdf(x)?.clamp(UNIFORM_CLAMP, 1.0 - UNIFORM_CLAMP);
            scores[(i, j)] = standard.inverse_cdf(u);
        }
    }

    // a constant has no correlation with anything; decouple it entirely
    let mut effective = matrix.clone();
    for (i, var) in variables.iter().enumerate() {
        if var.is_point_mass() {
            effective.matrix.row_mut(i).fill(0.0);
            effective.matrix.column_mut(i).fill(0.0);
            effective.matrix[(i, i)] = 1.0;
        }
    }

    let lower = effective.cholesky_lower()?;
    let correlated = lower * scores;

    let mut out = samples.clone();
    for (i, var) in variables.iter().enumerate() {
        if var.exact_inverse_cdf(0.5).is_none() {
            continue;
        }
        let transformed: Vec<f64> = correlated
            .row(i)
            .iter()
            .map(|&z| {
                let u = standard.cdf(z).clamp(UNIFORM_CLAMP, 1.0 - UNIFORM_CLAMP);
                var.exact_inverse_cdf(u).unwrap_or(f64::NAN)
            })
            .collect();
        out.insert(var.name().to_string(), transformed);
    }

    tracing::debug!(
        variables = variables.len(),
        trials,
        "applied correlation structure"
    );
    Ok(out)
}
