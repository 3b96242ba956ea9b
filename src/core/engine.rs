use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::registry::CalculatorRegistry;
use super::types::{
    BreakdownChart, CalculatorDefinition, CalculatorKind, Derived, GrowthSeries, InputSpec,
    InputValues, ResultRow,
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("calculator not available: {0}")]
    UnknownCalculator(String),
    #[error("calculator '{calculator}' has no input '{input}'")]
    UnknownInput {
        calculator: &'static str,
        input: String,
    },
    #[error("no calculator selected")]
    NotReady,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub kind: CalculatorKind,
    pub inputs: InputValues,
    pub derived: Derived,
    pub results: Vec<ResultRow>,
    pub breakdown: BreakdownChart,
    pub growth: GrowthSeries,
}

impl Snapshot {
    fn compute(definition: &CalculatorDefinition, inputs: InputValues) -> Self {
        let derived = (definition.compute)(&inputs);
        let results = (definition.results)(&inputs, &derived);
        let breakdown = (definition.breakdown)(&inputs, &derived);
        let growth = (definition.growth)(&inputs);
        Self {
            kind: definition.kind,
            inputs,
            derived,
            results,
            breakdown,
            growth,
        }
    }
}

#[derive(Debug, Clone)]
pub enum EngineState<'r> {
    Uninitialized,
    Ready {
        definition: &'r CalculatorDefinition,
        snapshot: Snapshot,
    },
    NotFound {
        requested: String,
    },
}

#[derive(Debug)]
pub struct CalculatorEngine<'r> {
    registry: &'r CalculatorRegistry,
    state: EngineState<'r>,
}

impl<'r> CalculatorEngine<'r> {
    pub fn new(registry: &'r CalculatorRegistry) -> Self {
        Self {
            registry,
            state: EngineState::Uninitialized,
        }
    }

    pub fn state(&self) -> &EngineState<'r> {
        &self.state
    }

    pub fn definition(&self) -> Option<&'r CalculatorDefinition> {
        match &self.state {
            EngineState::Ready { definition, .. } => Some(*definition),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match &self.state {
            EngineState::Ready { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    pub fn select_type(&mut self, key: &str) -> Result<&Snapshot, EngineError> {
        let registry = self.registry;
        let Some(definition) = registry.resolve(key) else {
            debug!(requested = key, "unknown calculator requested");
            self.state = EngineState::NotFound {
                requested: key.to_string(),
            };
            return Err(EngineError::UnknownCalculator(key.to_string()));
        };

        debug!(calculator = definition.kind.key(), "calculator selected");
        let snapshot = Snapshot::compute(definition, definition.default_values());
        self.state = EngineState::Ready {
            definition,
            snapshot,
        };
        self.snapshot().ok_or(EngineError::NotReady)
    }

    /// Selects `key`, or `fallback` when `key` is unknown. The error for `key`
    /// is returned when neither resolves.
    pub fn select_type_or(
        &mut self,
        key: &str,
        fallback: Option<&str>,
    ) -> Result<&Snapshot, EngineError> {
        let registry = self.registry;
        let target = match fallback {
            Some(fallback) if registry.resolve(key).is_none() => {
                if registry.resolve(fallback).is_none() {
                    return self.select_type(key);
                }
                debug!(requested = key, fallback, "falling back to override calculator");
                fallback
            }
            _ => key,
        };
        self.select_type(target)
    }

    // Non-finite values keep the previous value.
    pub fn set_input_value(&mut self, key: &str, raw: f64) -> Result<f64, EngineError> {
        let EngineState::Ready {
            definition,
            snapshot,
        } = &mut self.state
        else {
            return Err(EngineError::NotReady);
        };
        let definition: &'r CalculatorDefinition = *definition;

        let spec = definition
            .input(key)
            .ok_or_else(|| EngineError::UnknownInput {
                calculator: definition.kind.key(),
                input: key.to_string(),
            })?;

        let previous = snapshot.inputs.try_get(spec.key);
        let candidate = if raw.is_finite() {
            raw
        } else {
            debug!(input = spec.key, "non-finite input coerced to previous value");
            previous.unwrap_or(0.0)
        };
        let stored = quantize(spec, candidate);
        if stored != raw {
            debug!(input = spec.key, raw, stored, "input adjusted to bounds and step");
        }

        let mut inputs = snapshot.inputs.clone();
        inputs.set(spec.key, stored);
        *snapshot = Snapshot::compute(definition, inputs);
        Ok(stored)
    }

    pub fn set_input_text(&mut self, key: &str, raw: &str) -> Result<f64, EngineError> {
        let parsed = raw.trim().parse::<f64>().ok().filter(|value| value.is_finite());
        let value = match parsed {
            Some(value) => value,
            None => {
                let definition = self.definition().ok_or(EngineError::NotReady)?;
                let previous = self.snapshot().and_then(|snapshot| snapshot.inputs.try_get(key));
                debug!(
                    calculator = definition.kind.key(),
                    input = key,
                    "non-numeric input ignored"
                );
                previous.unwrap_or(0.0)
            }
        };
        self.set_input_value(key, value)
    }
}

/// Clamps into `[min, max]` and snaps to the step grid counted from `min`.
pub fn quantize(spec: &InputSpec, value: f64) -> f64 {
    let clamped = value.clamp(spec.min, spec.max);
    let steps = ((clamped - spec.min) / spec.step).round();
    let snapped = spec.min + steps * spec.step;
    let scale = 10f64.powi(step_decimals(spec.step) as i32);
    let tidy = (snapped * scale).round() / scale;
    tidy.clamp(spec.min, spec.max)
}

fn step_decimals(step: f64) -> u32 {
    let mut scaled = step;
    for places in 0..9 {
        if (scaled - scaled.round()).abs() < 1e-9 {
            return places;
        }
        scaled *= 10.0;
    }
    9
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::UnitFormat;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn registry() -> CalculatorRegistry {
        CalculatorRegistry::builtin().expect("builtin registry is valid")
    }

    fn spec(min: f64, max: f64, step: f64) -> InputSpec {
        InputSpec {
            key: "x",
            label: "X",
            min,
            max,
            step,
            default: min,
            unit: UnitFormat::Plain,
        }
    }

    #[test]
    fn starts_uninitialized_and_rejects_edits() {
        let registry = registry();
        let mut engine = CalculatorEngine::new(&registry);
        assert!(matches!(engine.state(), EngineState::Uninitialized));
        assert!(engine.snapshot().is_none());
        assert_eq!(
            engine.set_input_value("years", 5.0),
            Err(EngineError::NotReady)
        );
    }

    #[test]
    fn select_type_seeds_defaults() {
        let registry = registry();
        let mut engine = CalculatorEngine::new(&registry);
        let snapshot = engine.select_type("sip-calculator").expect("known calculator");
        assert_eq!(snapshot.kind, CalculatorKind::Sip);
        assert_eq!(snapshot.inputs.get("monthlyInvestment"), 10_000.0);
        assert_eq!(snapshot.inputs.get("years"), 10.0);
        assert_eq!(snapshot.derived.get("invested"), 1_200_000.0);
        assert_eq!(snapshot.results.len(), 4);
        assert_eq!(snapshot.growth.period_labels.len(), 10);
    }

    #[test]
    fn unknown_type_enters_not_found_and_recovers() {
        let registry = registry();
        let mut engine = CalculatorEngine::new(&registry);
        engine.select_type("sip").expect("known calculator");

        let err = engine.select_type("crypto-calculator").expect_err("unknown");
        assert_eq!(
            err,
            EngineError::UnknownCalculator("crypto-calculator".to_string())
        );
        assert!(matches!(
            engine.state(),
            EngineState::NotFound { requested } if requested == "crypto-calculator"
        ));
        assert!(engine.snapshot().is_none());
        assert_eq!(
            engine.set_input_value("years", 5.0),
            Err(EngineError::NotReady)
        );

        engine.select_type("delay").expect("recovers");
        assert_eq!(engine.snapshot().map(|s| s.kind), Some(CalculatorKind::Delay));
    }

    #[test]
    fn switching_type_discards_previous_inputs() {
        let registry = registry();
        let mut engine = CalculatorEngine::new(&registry);
        engine.select_type("sip").expect("sip");
        engine.set_input_value("years", 25.0).expect("valid input");
        engine.select_type("lumpsum").expect("lumpsum");
        let snapshot = engine.snapshot().expect("ready");
        assert_eq!(snapshot.inputs.get("years"), 10.0);
        assert!(snapshot.inputs.try_get("monthlyInvestment").is_none());

        engine.select_type("sip").expect("sip again");
        assert_eq!(engine.snapshot().expect("ready").inputs.get("years"), 10.0);
    }

    #[test]
    fn set_input_clamps_to_bounds() {
        let registry = registry();
        let mut engine = CalculatorEngine::new(&registry);
        engine.select_type("sip").expect("sip");
        assert_eq!(engine.set_input_value("years", 400.0), Ok(40.0));
        assert_eq!(engine.set_input_value("years", -3.0), Ok(1.0));
        assert_eq!(engine.set_input_value("rateOfReturn", 99.0), Ok(30.0));
        assert_eq!(engine.set_input_value("rateOfReturn", 0.0), Ok(1.0));
    }

    #[test]
    fn set_input_snaps_to_step_and_recomputes() {
        let registry = registry();
        let mut engine = CalculatorEngine::new(&registry);
        engine.select_type("sip").expect("sip");
        assert_eq!(engine.set_input_value("monthlyInvestment", 10_240.0), Ok(10_000.0));
        assert_eq!(engine.set_input_value("monthlyInvestment", 10_260.0), Ok(10_500.0));
        assert_eq!(engine.set_input_value("rateOfReturn", 7.3), Ok(7.5));

        let snapshot = engine.snapshot().expect("ready");
        assert_eq!(snapshot.inputs.get("monthlyInvestment"), 10_500.0);
        assert_eq!(snapshot.derived.get("invested"), 10_500.0 * 120.0);
        assert_eq!(snapshot.results[0].value, 10_500.0);
        assert_eq!(snapshot.breakdown.values[0], 10_500.0 * 120.0);
        assert_eq!(snapshot.breakdown.values[1], snapshot.derived.get("returns"));

        let invested = &snapshot.growth.series[0];
        let projected = &snapshot.growth.series[1];
        assert_eq!(invested.values.last().copied(), Some(10_500.0 * 120.0));
        assert_eq!(
            projected.values.last().copied(),
            Some(snapshot.derived.get("futureValue"))
        );
    }

    #[test]
    fn select_type_or_uses_override_only_for_unknown_keys() {
        let registry = registry();
        let mut engine = CalculatorEngine::new(&registry);

        let snapshot = engine
            .select_type_or("retirement", Some("sip"))
            .expect("falls back");
        assert_eq!(snapshot.kind, CalculatorKind::Sip);

        let snapshot = engine
            .select_type_or("car", Some("sip"))
            .expect("known key wins");
        assert_eq!(snapshot.kind, CalculatorKind::Car);

        let err = engine
            .select_type_or("retirement", Some("pension"))
            .expect_err("both unknown");
        assert_eq!(err, EngineError::UnknownCalculator("retirement".to_string()));
        assert!(matches!(engine.state(), EngineState::NotFound { .. }));

        assert!(engine.select_type_or("retirement", None).is_err());
    }

    #[test]
    fn unknown_input_is_rejected_without_touching_state() {
        let registry = registry();
        let mut engine = CalculatorEngine::new(&registry);
        engine.select_type("house").expect("house");
        let before = engine.snapshot().cloned();
        let err = engine.set_input_value("monthlyInvestment", 5.0).expect_err("unknown");
        assert!(matches!(err, EngineError::UnknownInput { calculator: "house", .. }));
        assert_eq!(engine.snapshot().cloned(), before);
    }

    #[test]
    fn non_numeric_text_keeps_previous_value() {
        let registry = registry();
        let mut engine = CalculatorEngine::new(&registry);
        engine.select_type("car").expect("car");
        engine.set_input_text("years", "8").expect("numeric text");
        assert_eq!(engine.set_input_text("years", "eight"), Ok(8.0));
        assert_eq!(engine.set_input_text("years", ""), Ok(8.0));
        assert_eq!(engine.set_input_value("years", f64::NAN), Ok(8.0));
        assert_eq!(engine.set_input_text("years", " 12 "), Ok(12.0));
        let snapshot = engine.snapshot().expect("ready");
        assert!(snapshot.derived.get("futureCost").is_finite());
    }

    #[test]
    fn snapshots_are_deterministic() {
        let registry = registry();
        for kind in CalculatorKind::ALL {
            let mut first = CalculatorEngine::new(&registry);
            let mut second = CalculatorEngine::new(&registry);
            let a = first.select_type(kind.key()).expect("known").clone();
            let b = second.select_type(kind.key()).expect("known").clone();
            assert_eq!(a, b);
            let json_a = serde_json::to_string(&a).expect("serialize");
            let json_b = serde_json::to_string(&b).expect("serialize");
            assert_eq!(json_a, json_b);
        }
    }

    #[test]
    fn quantize_tidies_decimal_steps() {
        let s = spec(1.0, 30.0, 0.1);
        assert_eq!(quantize(&s, 12.04), 12.0);
        assert_eq!(quantize(&s, 12.06), 12.1);
        assert_eq!(quantize(&s, 30.0), 30.0);
        assert_eq!(quantize(&spec(0.0, 10.0, 2.5), 11.0), 10.0);
        assert_eq!(quantize(&spec(0.0, 10.0, 2.5), 6.0), 5.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_set_input_stays_within_bounds(
            raw in -1_000_000_000i64..1_000_000_000,
            kind_index in 0usize..8,
            input_index in 0usize..5
        ) {
            let registry = registry();
            let kind = CalculatorKind::ALL[kind_index];
            let mut engine = CalculatorEngine::new(&registry);
            engine.select_type(kind.key()).expect("known");
            let definition = engine.definition().expect("ready");
            let spec = definition.inputs[input_index % definition.inputs.len()];

            let stored = engine.set_input_value(spec.key, raw as f64 / 100.0).expect("valid key");
            prop_assert!(stored >= spec.min && stored <= spec.max);

            let above = engine.set_input_value(spec.key, spec.max + 1_000.0).expect("valid key");
            prop_assert_eq!(above, spec.max);
            let below = engine.set_input_value(spec.key, spec.min - 1_000.0).expect("valid key");
            prop_assert_eq!(below, spec.min);

            let snapshot = engine.snapshot().expect("ready");
            for (_, value) in snapshot.inputs.iter() {
                prop_assert!(value.is_finite());
            }
            for row in &snapshot.results {
                prop_assert!(row.value.is_finite());
            }
        }
    }
}
