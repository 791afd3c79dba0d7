//! Probability-weighted scenario analysis

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValuationError};
use crate::monte_carlo::ParameterSet;

/// Probabilities may miss 1.0 by less than this
pub const PROBABILITY_TOLERANCE: f64 = 0.001;

fn check_probability(probability: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(ValuationError::InvalidParameter {
            name: "probability",
            value: probability,
            reason: "must be between 0 and 1",
        });
    }
    Ok(())
}

/// Named inputs of one scenario, before evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    pub probability: f64,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
}

impl ScenarioDefinition {
    /// Zip parallel lists into definitions; all three must be the same length
    pub fn from_lists(
        names: &[String],
        parameters: &[BTreeMap<String, f64>],
        probabilities: &[f64],
    ) -> Result<Vec<Self>> {
        if parameters.len() != names.len() {
            return Err(ValuationError::DimensionMismatch {
                what: "scenario parameter sets",
                expected: names.len(),
                actual: parameters.len(),
            });
        }
        if probabilities.len() != names.len() {
            return Err(ValuationError::DimensionMismatch {
                what: "scenario probabilities",
                expected: names.len(),
                actual: probabilities.len(),
            });
        }
        Ok(names
            .iter()
            .zip(parameters)
            .zip(probabilities)
            .map(|((name, params), &probability)| Self {
                name: name.clone(),
                probability,
                parameters: params.clone(),
            })
            .collect())
    }
}

/// One evaluated scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub probability: f64,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
    /// Value per share; `None` when the valuation failed
    pub value: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, probability: f64, value: Option<f64>) -> Result<Self> {
        check_probability(probability)?;
        Ok(Self {
            name: name.into(),
            probability,
            parameters: BTreeMap::new(),
            value,
            note: None,
        })
    }

    /// Value times probability, zero when the value is missing
    #[must_use]
    pub fn weighted_value(&self) -> f64 {
        self.value.map_or(0.0, |v| v * self.probability)
    }
}

/// A set of mutually exclusive scenarios
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub scenarios: Vec<Scenario>,
}

impl ScenarioAnalysis {
    /// Best, base and worst case around `base_value`.
    ///
    /// Best is `base * (1 + upside)`, worst is `base * (1 - downside)`.
    pub fn standard(
        base_value: f64,
        upside: f64,
        downside: f64,
        p_best: f64,
        p_base: f64,
        p_worst: f64,
    ) -> Result<Self> {
        let mut best = Scenario::new("Best Case", p_best, Some(base_value * (1.0 + upside)))?;
        best.parameters.insert("upside".into(), upside);
        let base = Scenario::new("Base Case", p_base, Some(base_value))?;
        let mut worst = Scenario::new("Worst Case", p_worst, Some(base_value * (1.0 - downside)))?;
        worst.parameters.insert("downside".into(), downside);

        Ok(Self {
            scenarios: vec![best, base, worst],
        })
    }

    /// [`ScenarioAnalysis::standard`] with +30% / -25% and 20/55/25 weights
    pub fn standard_default(base_value: f64) -> Result<Self> {
        Self::standard(base_value, 0.30, 0.25, 0.20, 0.55, 0.25)
    }

    /// Run `valuation` on each definition's parameters.
    ///
    /// A failing or non-finite valuation leaves that scenario without a value
    /// and records the reason in its note; invalid probabilities abort.
    pub fn evaluate<F>(valuation: F, definitions: &[ScenarioDefinition]) -> Result<Self>
    where
        F: Fn(&ParameterSet<'_>) -> Result<f64>,
    {
        for definition in definitions {
            check_probability(definition.probability)?;
        }

        let scenarios = definitions
            .iter()
            .map(|definition| {
                let names: Vec<String> = definition.parameters.keys().cloned().collect();
                let values: Vec<f64> = definition.parameters.values().copied().collect();
                let (value, note) = match valuation(&ParameterSet::new(&names, &values)) {
                    Ok(v) if v.is_finite() => (Some(v), None),
                    Ok(v) => (None, Some(format!("calculation failed: non-finite result ({v})"))),
                    Err(err) => {
                        tracing::debug!(scenario = %definition.name, %err, "scenario valuation failed");
                        (None, Some(format!("calculation failed: {err}")))
                    }
                };
                Scenario {
                    name: definition.name.clone(),
                    probability: definition.probability,
                    parameters: definition.parameters.clone(),
                    value,
                    note,
                }
            })
            .collect();

        Ok(Self { scenarios })
    }

    /// Probability-weighted value; failed scenarios contribute zero
    #[must_use]
    pub fn expected_value(&self) -> f64 {
        self.scenarios.iter().map(Scenario::weighted_value).sum()
    }

    #[must_use]
    pub fn probability_sum(&self) -> f64 {
        self.scenarios.iter().map(|s| s.probability).sum()
    }

    #[must_use]
    pub fn probabilities_valid(&self) -> bool {
        (self.probability_sum() - 1.0).abs() < PROBABILITY_TOLERANCE
    }

    /// Case-insensitive lookup by name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Scenario> {
        let needle = name.to_lowercase();
        self.scenarios
            .iter()
            .find(|s| s.name.to_lowercase() == needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scenarios() {
        let analysis = ScenarioAnalysis::standard_default(100.0).unwrap();
        assert_eq!(analysis.scenarios.len(), 3);
        assert!((analysis.find("best case").unwrap().value.unwrap() - 130.0).abs() < 1e-9);
        assert!((analysis.find("WORST CASE").unwrap().value.unwrap() - 75.0).abs() < 1e-9);
        assert!(analysis.probabilities_valid());

        let expected = 0.20 * 130.0 + 0.55 * 100.0 + 0.25 * 75.0;
        assert!((analysis.expected_value() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_probability_checks() {
        assert!(ScenarioAnalysis::standard(100.0, 0.3, 0.25, 1.2, 0.0, 0.0).is_err());
        let off = ScenarioAnalysis::standard(100.0, 0.3, 0.25, 0.3, 0.3, 0.3).unwrap();
        assert!(!off.probabilities_valid());
        assert!((off.probability_sum() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_records_failures() {
        let definitions = vec![
            ScenarioDefinition {
                name: "Bull".into(),
                probability: 0.5,
                parameters: BTreeMap::from([("growth".to_string(), 0.04), ("wacc".to_string(), 0.08)]),
            },
            ScenarioDefinition {
                name: "Broken".into(),
                probability: 0.5,
                parameters: BTreeMap::from([("growth".to_string(), 0.09), ("wacc".to_string(), 0.08)]),
            },
        ];
        let analysis = ScenarioAnalysis::evaluate(
            |p| crate::primitives::gordon_growth(100.0, p.get("wacc")?, p.get("growth")?),
            &definitions,
        )
        .unwrap();

        let bull = analysis.find("bull").unwrap();
        assert!((bull.value.unwrap() - 100.0 * 1.04 / 0.04).abs() < 1e-9);
        assert!(bull.note.is_none());

        let broken = analysis.find("broken").unwrap();
        assert!(broken.value.is_none());
        assert!(broken.note.as_deref().unwrap().starts_with("calculation failed"));
        assert!((analysis.expected_value() - bull.weighted_value()).abs() < 1e-12);
    }

    #[test]
    fn test_from_lists_checks_lengths() {
        let names = vec!["a".to_string(), "b".to_string()];
        let params = vec![BTreeMap::new()];
        assert!(matches!(
            ScenarioDefinition::from_lists(&names, &params, &[0.5, 0.5]),
            Err(ValuationError::DimensionMismatch { .. })
        ));
        let params = vec![BTreeMap::new(), BTreeMap::new()];
        assert_eq!(
            ScenarioDefinition::from_lists(&names, &params, &[0.5, 0.5])
                .unwrap()
                .len(),
            2
        );
    }
}
