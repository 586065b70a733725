use indexmap::IndexMap;

use super::distribution::Variable;
use super::engine::OutcomeModel;
use crate::error::McError;
use crate::McResult;

/// Ranks (1-based) with ties sharing their average rank.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold ranks start+1..=end
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in x.iter().zip(y) {
        cov += (a - mx) * (b - my);
        vx += (a - mx).powi(2);
        vy += (b - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return 0.0;
    }
    (cov / (vx.sqrt() * vy.sqrt())).clamp(-1.0, 1.0)
}

/// Spearman rank correlation. A constant series has no rank order and
/// yields 0.
pub fn spearman(x: &[f64], y: &[f64]) -> McResult<f64> {
    if x.len() != y.len() {
        return Err(McError::invalid(
            "samples",
            format!("length mismatch: {} vs {}", x.len(), y.len()),
        ));
    }
    if x.len() < 2 {
        return Ok(0.0);
    }
    Ok(pearson(&average_ranks(x), &average_ranks(y)))
}

/// Rank each variable's influence on the outcome.
///
/// The score is the squared Spearman correlation between the variable's
/// samples and the outcomes, so it lies in [0, 1] and picks up monotonic
/// non-linear effects. Results are ordered by descending score; equal
/// scores keep declaration order. `outcome` is not re-evaluated.
pub fn sensitivity_analysis<M: OutcomeModel + ?Sized>(
    variables: &[Variable],
    _outcome: &M,
    outcomes: &[f64],
    samples: &IndexMap<String, Vec<f64>>,
) -> McResult<IndexMap<String, f64>> {
    let mut scores: Vec<(String, f64)> = variables
        .iter()
        .map(|var| {
            let column = samples.get(var.name()).ok_or_else(|| {
                McError::invalid("samples", format!("no samples for '{}'", var.name()))
            })?;
            let rho = spearman(column, outcomes)?;
            Ok((var.name().to_string(), rho * rho))
        })
        .collect::<McResult<_>>()?;

    scores.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    Ok(scores.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monte_carlo::engine::TrialValues;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sum_model(values: &TrialValues) -> McResult<f64> {
        Ok(values.values().sum())
    }

    #[test]
    fn test_average_ranks_with_ties() {
        assert_eq!(average_ranks(&[10.0, 20.0, 20.0, 5.0]), vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn test_spearman_monotonic_nonlinear() {
        let x: Vec<f64> = (1..=50).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| v.powi(3)).collect();
        assert!((spearman(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        let z: Vec<f64> = x.iter().map(|v| -v.exp()).collect();
        assert!((spearman(&x, &z).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_spearman_constant_is_zero() {
        assert_eq!(spearman(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_spearman_length_mismatch() {
        assert!(spearman(&[1.0, 2.0], &[1.0]).is_err());
    }

    #[test]
    fn test_dominant_variable_ranked_first() {
        let vars = vec![
            Variable::normal("y", 0.0, 1.0).unwrap(),
            Variable::normal("x", 0.0, 1.0).unwrap(),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let samples: IndexMap<String, Vec<f64>> = vars
            .iter()
            .map(|v| (v.name().to_string(), v.sample(2000, &mut rng).unwrap()))
            .collect();
        let outcomes: Vec<f64> = samples["x"]
            .iter()
            .zip(&samples["y"])
            .map(|(x, y)| 2.0 * x + y)
            .collect();

        let ranking = sensitivity_analysis(&vars, &sum_model, &outcomes, &samples).unwrap();
        let names: Vec<&str> = ranking.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert!(ranking["x"] > ranking["y"]);
        assert!(ranking.values().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_missing_samples_rejected() {
        let vars = vec![Variable::normal("x", 0.0, 1.0).unwrap()];
        let samples = IndexMap::new();
        assert!(sensitivity_analysis(&vars, &sum_model, &[1.0, 2.0], &samples).is_err());
    }
}
