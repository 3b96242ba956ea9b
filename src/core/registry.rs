use std::collections::HashSet;

use thiserror::Error;
use tracing::info;

use super::calculators::builtin_definitions;
use super::types::{CalculatorDefinition, CalculatorKind};

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("calculator '{0}' is registered more than once")]
    DuplicateCalculator(&'static str),
    #[error("calculator '{0}' declares no inputs")]
    NoInputs(&'static str),
    #[error("calculator '{calculator}' declares input '{input}' more than once")]
    DuplicateInput {
        calculator: &'static str,
        input: &'static str,
    },
    #[error("calculator '{calculator}' input '{input}': {reason}")]
    InvalidInput {
        calculator: &'static str,
        input: &'static str,
        reason: String,
    },
}

/// Read-only lookup from calculator kind to its definition, validated once
/// when built.
#[derive(Debug)]
pub struct CalculatorRegistry {
    definitions: Vec<CalculatorDefinition>,
}

impl CalculatorRegistry {
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_definitions(builtin_definitions())
    }

    pub fn from_definitions(definitions: Vec<CalculatorDefinition>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for definition in &definitions {
            if !seen.insert(definition.kind) {
                return Err(RegistryError::DuplicateCalculator(definition.kind.key()));
            }
            validate_definition(definition)?;
        }
        info!(calculators = definitions.len(), "calculator registry ready");
        Ok(Self { definitions })
    }

    pub fn get(&self, kind: CalculatorKind) -> Option<&CalculatorDefinition> {
        self.definitions.iter().find(|definition| definition.kind == kind)
    }

    /// Looks up a canonical key or route slug. Unknown keys yield `None`;
    /// there is no fallback calculator.
    pub fn resolve(&self, key: &str) -> Option<&CalculatorDefinition> {
        CalculatorKind::from_key(key).and_then(|kind| self.get(kind))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalculatorDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn validate_definition(definition: &CalculatorDefinition) -> Result<(), RegistryError> {
    let calculator = definition.kind.key();
    if definition.inputs.is_empty() {
        return Err(RegistryError::NoInputs(calculator));
    }

    let mut keys = HashSet::new();
    for spec in &definition.inputs {
        if !keys.insert(spec.key) {
            return Err(RegistryError::DuplicateInput {
                calculator,
                input: spec.key,
            });
        }

        let invalid = |reason: String| RegistryError::InvalidInput {
            calculator,
            input: spec.key,
            reason,
        };

        if ![spec.min, spec.max, spec.step, spec.default]
            .iter()
            .all(|value| value.is_finite())
        {
            return Err(invalid("bounds, step and default must be finite".to_string()));
        }
        if spec.min > spec.max {
            return Err(invalid(format!("min {} exceeds max {}", spec.min, spec.max)));
        }
        if spec.step <= 0.0 {
            return Err(invalid(format!("step must be > 0, got {}", spec.step)));
        }
        if spec.default < spec.min || spec.default > spec.max {
            return Err(invalid(format!(
                "default {} outside [{}, {}]",
                spec.default, spec.min, spec.max
            )));
        }
        if !on_step_grid(spec.max, spec.min, spec.step) {
            return Err(invalid(format!(
                "max {} is not a whole number of {} steps from min {}",
                spec.max, spec.step, spec.min
            )));
        }
        if !on_step_grid(spec.default, spec.min, spec.step) {
            return Err(invalid(format!(
                "default {} is not on the {} step grid from min {}",
                spec.default, spec.step, spec.min
            )));
        }
    }
    Ok(())
}

fn on_step_grid(value: f64, min: f64, step: f64) -> bool {
    let steps = (value - min) / step;
    (steps - steps.round()).abs() <= 1e-9 * steps.abs().max(1.0)
}
