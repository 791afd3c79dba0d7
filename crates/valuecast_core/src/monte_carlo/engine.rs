//! Monte Carlo simulation over named stochastic parameters

use rand::SeedableRng;
use rand::rngs::SmallRng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::correlation::{CorrelationSpec, induce_rank_correlation};
use super::distribution::StochasticParameterSpec;
use super::stats::{Histogram, SummaryStatistics};
use crate::error::{Result, ValuationError};

pub const DEFAULT_DRAWS: usize = 10_000;

/// Mix a run seed and a draw index into an independent per-draw seed
/// (SplitMix64 finalizer)
#[must_use]
pub fn draw_seed(seed: u64, draw: u64) -> u64 {
    let mut z = seed ^ draw.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Named values of one draw
#[derive(Debug, Clone, Copy)]
pub struct ParameterSet<'a> {
    /// Sorted ascending
    names: &'a [String],
    values: &'a [f64],
}

impl<'a> ParameterSet<'a> {
    /// `names` must be sorted and the same length as `values`
    pub(crate) fn new(names: &'a [String], values: &'a [f64]) -> Self {
        Self { names, values }
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<f64> {
        self.names
            .binary_search_by(|n| n.as_str().cmp(name))
            .ok()
            .and_then(|idx| self.values.get(idx).copied())
    }

    /// Value of `name`, failing the draw when it is absent
    pub fn get(&self, name: &str) -> Result<f64> {
        self.value(name)
            .ok_or_else(|| ValuationError::MissingParameter(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of a simulation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    /// Valid outcomes in draw order
    pub values: Vec<f64>,
    /// `None` when no draw was valid
    pub statistics: Option<SummaryStatistics>,
    pub valid_count: usize,
    pub failed_count: usize,
    /// Seed the run used, drawn at random when none was supplied
    pub seed: u64,
    /// Whether the requested correlation was applied
    pub correlated: bool,
    /// Number of failed draws per failure class
    pub failure_reasons: FxHashMap<&'static str, usize>,
}

impl SimulationResult {
    #[must_use]
    pub fn total_draws(&self) -> usize {
        self.valid_count + self.failed_count
    }

    #[must_use]
    pub fn histogram(&self, bins: usize) -> Option<Histogram> {
        Histogram::from_values(&self.values, bins)
    }

    /// Most frequent failure reason and its count
    #[must_use]
    pub fn dominant_failure(&self) -> Option<(&str, usize)> {
        self.failure_reasons
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(&reason, &count)| (reason, count))
    }
}

/// Serializable run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    #[serde(default = "default_draws")]
    pub draws: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub parameters: Vec<StochasticParameterSpec>,
    #[serde(default)]
    pub correlations: CorrelationSpec,
}

fn default_draws() -> usize {
    DEFAULT_DRAWS
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            draws: DEFAULT_DRAWS,
            seed: None,
            parameters: Vec::new(),
            correlations: CorrelationSpec::default(),
        }
    }
}

/// Validate and sort specs by name
fn prepare_specs(specs: &[StochasticParameterSpec]) -> Result<Vec<StochasticParameterSpec>> {
    if specs.is_empty() {
        return Err(ValuationError::EmptyInput("stochastic parameter list"));
    }
    let mut seen = FxHashSet::default();
    for spec in specs {
        spec.validate()?;
        if !seen.insert(spec.name.as_str()) {
            return Err(ValuationError::DuplicateParameter(spec.name.clone()));
        }
    }
    let mut sorted = specs.to_vec();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(sorted)
}

/// Valid finite value, or the class of the failure
fn classify(result: Result<f64>) -> std::result::Result<f64, &'static str> {
    match result {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(_) => Err("non-finite result"),
        Err(err) => Err(err.kind().label()),
    }
}

fn sample_draw(specs: &[StochasticParameterSpec], seed: u64, draw: usize) -> Result<Vec<f64>> {
    let mut rng = SmallRng::seed_from_u64(draw_seed(seed, draw as u64));
    specs
        .iter()
        .map(|spec| spec.distribution.sample(&mut rng))
        .collect()
}

/// Draw `num_draws` parameter vectors, evaluate `valuation` on each and
/// summarize the valid outcomes.
///
/// Structural problems (no specs, duplicate names, bad distributions, bad
/// correlations, zero draws) fail before sampling. A draw whose valuation
/// errors or is not finite is counted as failed.
pub fn simulate<F>(
    specs: &[StochasticParameterSpec],
    valuation: F,
    num_draws: usize,
    seed: Option<u64>,
    correlations: Option<&CorrelationSpec>,
) -> Result<SimulationResult>
where
    F: Fn(&ParameterSet<'_>) -> Result<f64> + Sync,
{
    let specs = prepare_specs(specs)?;
    if num_draws == 0 {
        return Err(ValuationError::InvalidParameter {
            name: "num_draws",
            value: 0.0,
            reason: "must be at least 1",
        });
    }
    let names: Vec<String> = specs.iter().map(|s| s.name.clone()).collect();
    let target = match correlations {
        Some(spec) if !spec.is_empty() => Some(spec.matrix(&names)?),
        _ => None,
    };

    let seed = seed.unwrap_or_else(rand::random);
    tracing::debug!(
        draws = num_draws,
        parameters = names.len(),
        seed,
        correlated = target.is_some(),
        "starting Monte Carlo simulation"
    );

    #[cfg(feature = "parallel")]
    let draws: Vec<Vec<f64>> = (0..num_draws)
        .into_par_iter()
        .map(|i| sample_draw(&specs, seed, i))
        .collect::<Result<_>>()?;

    #[cfg(not(feature = "parallel"))]
    let draws: Vec<Vec<f64>> = (0..num_draws)
        .map(|i| sample_draw(&specs, seed, i))
        .collect::<Result<_>>()?;

    // One column per parameter for the correlation step
    let mut columns: Vec<Vec<f64>> = (0..names.len())
        .map(|p| draws.iter().map(|row| row[p]).collect())
        .collect();
    let correlated = match &target {
        Some(matrix) => induce_rank_correlation(&mut columns, matrix),
        None => false,
    };

    let evaluate = |i: usize| {
        let row: Vec<f64> = columns.iter().map(|col| col[i]).collect();
        classify(valuation(&ParameterSet::new(&names, &row)))
    };

    #[cfg(feature = "parallel")]
    let outcomes: Vec<std::result::Result<f64, &'static str>> =
        (0..num_draws).into_par_iter().map(evaluate).collect();

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<std::result::Result<f64, &'static str>> =
        (0..num_draws).map(evaluate).collect();

    let mut values = Vec::with_capacity(num_draws);
    let mut failure_reasons: FxHashMap<&'static str, usize> = FxHashMap::default();
    for outcome in outcomes {
        match outcome {
            Ok(v) => values.push(v),
            Err(reason) => *failure_reasons.entry(reason).or_insert(0) += 1,
        }
    }

    let valid_count = values.len();
    let failed_count = num_draws - valid_count;
    let statistics = SummaryStatistics::from_values(&values);
    if statistics.is_none() {
        tracing::warn!(draws = num_draws, "no valid Monte Carlo draws");
    }
    tracing::debug!(valid = valid_count, failed = failed_count, "Monte Carlo simulation complete");

    Ok(SimulationResult {
        values,
        statistics,
        valid_count,
        failed_count,
        seed,
        correlated,
        failure_reasons,
    })
}

/// [`simulate`] driven by a [`MonteCarloConfig`]
pub fn simulate_with_config<F>(config: &MonteCarloConfig, valuation: F) -> Result<SimulationResult>
where
    F: Fn(&ParameterSet<'_>) -> Result<f64> + Sync,
{
    simulate(
        &config.parameters,
        valuation,
        config.draws,
        config.seed,
        Some(&config.correlations),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monte_carlo::Distribution;

    fn specs() -> Vec<StochasticParameterSpec> {
        vec![
            StochasticParameterSpec::normal("x", 0.0, 1.0).unwrap(),
            StochasticParameterSpec::uniform("y", 1.0, 2.0).unwrap(),
        ]
    }

    #[test]
    fn test_draw_seed_spreads() {
        assert_ne!(draw_seed(42, 0), draw_seed(42, 1));
        assert_ne!(draw_seed(42, 0), draw_seed(43, 0));
        assert_eq!(draw_seed(7, 3), draw_seed(7, 3));
    }

    #[test]
    fn test_parameter_set_lookup() {
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let values = [1.0, 2.0, 3.0];
        let params = ParameterSet::new(&names, &values);
        assert_eq!(params.value("b"), Some(2.0));
        assert_eq!(params.value("z"), None);
        assert_eq!(
            params.get("z"),
            Err(ValuationError::MissingParameter("z".into()))
        );
        assert_eq!(params.len(), 3);
        assert_eq!(params.iter().map(|(n, _)| n).collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[test]
    fn test_structural_errors_abort() {
        let f = |p: &ParameterSet<'_>| p.get("x");
        assert!(matches!(
            simulate(&[], f, 10, Some(1), None),
            Err(ValuationError::EmptyInput(_))
        ));

        let dup = vec![
            StochasticParameterSpec::normal("x", 0.0, 1.0).unwrap(),
            StochasticParameterSpec::normal("x", 1.0, 1.0).unwrap(),
        ];
        assert_eq!(
            simulate(&dup, f, 10, Some(1), None),
            Err(ValuationError::DuplicateParameter("x".into()))
        );

        assert!(simulate(&specs(), f, 0, Some(1), None).is_err());

        let bad = vec![StochasticParameterSpec {
            name: "x".into(),
            distribution: Distribution::Normal {
                mean: 0.0,
                std_dev: -1.0,
            },
        }];
        assert!(matches!(
            simulate(&bad, f, 10, Some(1), None),
            Err(ValuationError::InvalidDistribution { .. })
        ));

        let unknown = CorrelationSpec::new().with("x", "w", 0.3);
        assert_eq!(
            simulate(&specs(), f, 10, Some(1), Some(&unknown)),
            Err(ValuationError::UnknownParameter("w".into()))
        );
    }

    #[test]
    fn test_spec_order_does_not_matter() {
        let f = |p: &ParameterSet<'_>| Ok(p.get("x")? * p.get("y")?);
        let mut reversed = specs();
        reversed.reverse();
        let a = simulate(&specs(), f, 500, Some(9), None).unwrap();
        let b = simulate(&reversed, f, 500, Some(9), None).unwrap();
        assert_eq!(a.values, b.values);
    }

    #[test]
    fn test_failed_draws_are_counted() {
        let f = |p: &ParameterSet<'_>| {
            let x = p.get("x")?;
            if x < 0.0 {
                Err(ValuationError::Infeasible {
                    name: "x",
                    value: x,
                    reason: "negative",
                })
            } else {
                Ok(x)
            }
        };
        let result = simulate(&specs(), f, 2_000, Some(3), None).unwrap();
        assert_eq!(result.total_draws(), 2_000);
        assert!(result.failed_count > 800 && result.failed_count < 1_200);
        assert!(result.values.iter().all(|&v| v >= 0.0));
        let (reason, count) = result.dominant_failure().unwrap();
        assert_eq!(reason, "domain infeasibility");
        assert_eq!(count, result.failed_count);
    }

    #[test]
    fn test_seed_is_recorded() {
        let f = |p: &ParameterSet<'_>| p.get("y");
        let first = simulate(&specs(), f, 50, None, None).unwrap();
        let replay = simulate(&specs(), f, 50, Some(first.seed), None).unwrap();
        assert_eq!(first.values, replay.values);
    }

    #[test]
    fn test_config_round_trip_drives_run() {
        let config = MonteCarloConfig {
            draws: 100,
            seed: Some(11),
            parameters: specs(),
            correlations: CorrelationSpec::new().with("x", "y", 0.5),
        };
        let result = simulate_with_config(&config, |p| p.get("y")).unwrap();
        assert_eq!(result.valid_count, 100);
        assert!(result.correlated);
    }
}
