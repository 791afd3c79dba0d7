//! Rank correlation between sampled parameters
//!
//! Correlation is induced by reordering each parameter's own samples, so the
//! marginal distributions are left untouched:
//! 1. ranks of each sample vector mapped to normal scores `ppf((rank + 0.5) / n)`
//! 2. scores multiplied by the lower Cholesky factor of the target matrix
//! 3. each parameter's sorted samples reordered by the ranks of its
//!    correlated scores

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{Result, ValuationError};

/// Target correlation between two named parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub first: String,
    pub second: String,
    pub rho: f64,
}

/// Pairwise correlations between parameters; unlisted pairs are independent.
/// Pairs are unordered and a later entry overrides an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationSpec {
    pairs: Vec<CorrelationPair>,
}

impl CorrelationSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pair
    #[must_use]
    pub fn with(mut self, first: impl Into<String>, second: impl Into<String>, rho: f64) -> Self {
        self.insert(first, second, rho);
        self
    }

    pub fn insert(&mut self, first: impl Into<String>, second: impl Into<String>, rho: f64) {
        self.pairs.push(CorrelationPair {
            first: first.into(),
            second: second.into(),
            rho,
        });
    }

    #[must_use]
    pub fn pairs(&self) -> &[CorrelationPair] {
        &self.pairs
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Full correlation matrix over `names`, in that order.
    ///
    /// Fails on unknown names, self-pairs, and coefficients outside [-1, 1].
    pub fn matrix(&self, names: &[String]) -> Result<DMatrix<f64>> {
        let index_of = |name: &str| {
            names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| ValuationError::UnknownParameter(name.to_string()))
        };

        let mut matrix = DMatrix::<f64>::identity(names.len(), names.len());
        for pair in &self.pairs {
            let i = index_of(&pair.first)?;
            let j = index_of(&pair.second)?;
            if !pair.rho.is_finite() || pair.rho.abs() > 1.0 {
                return Err(ValuationError::CorrelationOutOfRange {
                    first: pair.first.clone(),
                    second: pair.second.clone(),
                    rho: pair.rho,
                });
            }
            if i == j {
                return Err(ValuationError::InvalidParameter {
                    name: "correlation",
                    value: pair.rho,
                    reason: "a parameter cannot be correlated with itself",
                });
            }
            matrix[(i, j)] = pair.rho;
            matrix[(j, i)] = pair.rho;
        }
        Ok(matrix)
    }
}

/// Rank of each element, 0-based; ties keep index order
fn ranks(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut ranks = vec![0; values.len()];
    for (rank, idx) in order.into_iter().enumerate() {
        ranks[idx] = rank;
    }
    ranks
}

/// Reorder `samples` (one vector per parameter, all the same length) towards
/// the rank correlation in `target`.
///
/// Returns false and leaves the samples untouched when the matrix has no
/// Cholesky factorization or there are fewer than two draws.
pub fn induce_rank_correlation(samples: &mut [Vec<f64>], target: &DMatrix<f64>) -> bool {
    let k = samples.len();
    let n = samples.first().map_or(0, Vec::len);
    if k < 2 || n < 2 || target.nrows() != k || target.ncols() != k {
        return false;
    }

    let Some(cholesky) = target.clone().cholesky() else {
        tracing::warn!(
            parameters = k,
            "correlation matrix is not positive definite, sampling without correlation"
        );
        return false;
    };
    let Ok(standard_normal) = Normal::new(0.0, 1.0) else {
        return false;
    };

    let mut scores = DMatrix::<f64>::zeros(k, n);
    for (p, values) in samples.iter().enumerate() {
        for (i, rank) in ranks(values).into_iter().enumerate() {
            let u = (rank as f64 + 0.5) / n as f64;
            scores[(p, i)] = standard_normal.inverse_cdf(u);
        }
    }

    let correlated = cholesky.l() * scores;

    for (p, values) in samples.iter_mut().enumerate() {
        let row: Vec<f64> = correlated.row(p).iter().copied().collect();
        let mut sorted = values.clone();
        sorted.sort_by(f64::total_cmp);
        for (slot, rank) in values.iter_mut().zip(ranks(&row)) {
            *slot = sorted[rank];
        }
    }
    true
}

/// Spearman rank correlation of two equally long series
#[must_use]
pub fn rank_correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let ra = ranks(a);
    let rb = ranks(b);
    let n = a.len() as f64;
    let mean = (n - 1.0) / 2.0;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (&x, &y) in ra.iter().zip(&rb) {
        let dx = x as f64 - mean;
        let dy = y as f64 - mean;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let denom = (var_a * var_b).sqrt();
    (denom > 0.0).then(|| cov / denom)
}
