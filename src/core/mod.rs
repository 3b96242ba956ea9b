mod calculators;
mod engine;
mod format;
mod formulas;
mod performance;
mod registry;
mod types;

pub use calculators::builtin_definitions;
pub use engine::{CalculatorEngine, EngineError, EngineState, Snapshot, quantize};
pub use format::{RUPEE, format_value, group_indian};
pub use formulas::{
    absolute_return, annuity_future_value, cagr, compound_future_value, inflated_expense_total,
    inflation_adjusted_cost, present_value, required_insurance_cover, required_sip_for_target,
};
pub use performance::{
    BacktestPoint, BacktestSummary, DateWindow, InMemoryNavSource, NavPoint, NavSource,
    NavSourceError, SipBacktest, backtest_from_source, backtest_sip,
};
pub use registry::{CalculatorRegistry, RegistryError};
pub use types::{
    BreakdownChart, CalculatorDefinition, CalculatorKind, Derived, GrowthSeries, InputSpec,
    InputValues, ResultRow, Series, UnitFormat,
};
