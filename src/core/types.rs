use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalculatorKind {
    Sip,
    Lumpsum,
    House,
    Education,
    Car,
    Insurance,
    Delay,
    Marriage,
}

impl CalculatorKind {
    pub const ALL: [CalculatorKind; 8] = [
        CalculatorKind::Sip,
        CalculatorKind::Lumpsum,
        CalculatorKind::House,
        CalculatorKind::Education,
        CalculatorKind::Car,
        CalculatorKind::Insurance,
        CalculatorKind::Delay,
        CalculatorKind::Marriage,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CalculatorKind::Sip => "sip",
            CalculatorKind::Lumpsum => "lumpsum",
            CalculatorKind::House => "house",
            CalculatorKind::Education => "education",
            CalculatorKind::Car => "car",
            CalculatorKind::Insurance => "insurance",
            CalculatorKind::Delay => "delay",
            CalculatorKind::Marriage => "marriage",
        }
    }

    /// Path segment used by the public site under `/tools/financial-calculators/`.
    pub fn route_slug(self) -> &'static str {
        match self {
            CalculatorKind::Sip => "sip-calculator",
            CalculatorKind::Lumpsum => "lumpsum-calculator",
            CalculatorKind::House => "house-planning-calculator",
            CalculatorKind::Education => "education-planning-calculator",
            CalculatorKind::Car => "car-planning-calculator",
            CalculatorKind::Insurance => "life-insurance-calculator",
            CalculatorKind::Delay => "delay-planning-calculator",
            CalculatorKind::Marriage => "marriage-calculator",
        }
    }

    // Exact, case-insensitive match on key, slug or planning alias.
    pub fn from_key(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        let kind = match value.as_str() {
            "sip" | "sip-calculator" => CalculatorKind::Sip,
            "lumpsum" | "lumpsum-calculator" => CalculatorKind::Lumpsum,
            "house" | "house-planning" | "house-planning-calculator" => CalculatorKind::House,
            "education" | "education-planning" | "education-planning-calculator" => {
                CalculatorKind::Education
            }
            "car" | "car-planning" | "car-planning-calculator" => CalculatorKind::Car,
            "insurance" | "life-insurance" | "life-insurance-calculator" => {
                CalculatorKind::Insurance
            }
            "delay" | "delay-planning" | "delay-planning-calculator" => CalculatorKind::Delay,
            "marriage" | "marriage-planning" | "marriage-calculator" => CalculatorKind::Marriage,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitFormat {
    Currency,
    Percentage,
    Years,
    Months,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
    pub unit: UnitFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InputValues(BTreeMap<&'static str, f64>);

impl InputValues {
    pub fn from_defaults(specs: &[InputSpec]) -> Self {
        Self(specs.iter().map(|spec| (spec.key, spec.default)).collect())
    }

    /// Missing keys read as zero so formulas never see an absent value.
    pub fn get(&self, key: &str) -> f64 {
        self.0.get(key).copied().unwrap_or(0.0)
    }

    pub fn try_get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn set(&mut self, key: &'static str, value: f64) {
        self.0.insert(key, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.0.iter().map(|(key, value)| (*key, *value))
    }
}

impl<const N: usize> From<[(&'static str, f64); N]> for InputValues {
    fn from(pairs: [(&'static str, f64); N]) -> Self {
        Self(pairs.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Derived(BTreeMap<&'static str, f64>);

impl Derived {
    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    pub fn try_get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[(&'static str, f64); N]> for Derived {
    fn from(pairs: [(&'static str, f64); N]) -> Self {
        Self(pairs.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub label: &'static str,
    pub value: f64,
    pub unit: UnitFormat,
}

impl ResultRow {
    pub fn new(label: &'static str, value: f64, unit: UnitFormat) -> Self {
        Self { label, value, unit }
    }

    pub fn currency(label: &'static str, value: f64) -> Self {
        Self::new(label, value, UnitFormat::Currency)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownChart {
    pub categories: [&'static str; 2],
    pub values: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub name: &'static str,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthSeries {
    pub period_labels: Vec<String>,
    pub series: Vec<Series>,
}

impl GrowthSeries {
    pub fn yearly<F>(years: u32, names: &[&'static str], mut point: F) -> Self
    where
        F: FnMut(u32) -> Vec<f64>,
    {
        let mut series: Vec<Series> = names
            .iter()
            .map(|name| Series {
                name: *name,
                values: Vec::with_capacity(years as usize),
            })
            .collect();
        let mut period_labels = Vec::with_capacity(years as usize);

        for year in 1..=years {
            period_labels.push(format!("Year {year}"));
            let values = point(year);
            for (column, value) in series.iter_mut().zip(values) {
                column.values.push(value);
            }
        }

        Self {
            period_labels,
            series,
        }
    }
}

pub type ComputeFn = fn(&InputValues) -> Derived;
pub type ResultsFn = fn(&InputValues, &Derived) -> Vec<ResultRow>;
pub type BreakdownFn = fn(&InputValues, &Derived) -> BreakdownChart;
pub type GrowthFn = fn(&InputValues) -> GrowthSeries;

#[derive(Debug, Clone)]
pub struct CalculatorDefinition {
    pub kind: CalculatorKind,
    pub display_name: &'static str,
    pub description: &'static str,
    pub inputs: Vec<InputSpec>,
    pub compute: ComputeFn,
    pub results: ResultsFn,
    pub breakdown: BreakdownFn,
    pub growth: GrowthFn,
}

impl CalculatorDefinition {
    pub fn input(&self, key: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|spec| spec.key == key)
    }

    pub fn default_values(&self) -> InputValues {
        InputValues::from_defaults(&self.inputs)
    }
}
