//! Replays a monthly SIP against a fund's historical NAVs.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::formulas::absolute_return;

/// One installment per this many NAV observations (roughly monthly for
/// business-day series).
pub const INSTALLMENT_INTERVAL: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NavSourceError {
    #[error("unknown scheme '{0}'")]
    UnknownScheme(String),
    #[error("nav source unavailable: {0}")]
    Unavailable(String),
}

pub trait NavSource {
    fn nav_history(
        &self,
        scheme: &str,
        window: DateWindow,
    ) -> Result<Vec<NavPoint>, NavSourceError>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryNavSource {
    schemes: HashMap<String, Vec<NavPoint>>,
}

impl InMemoryNavSource {
    pub fn with_scheme(mut self, scheme: impl Into<String>, points: Vec<NavPoint>) -> Self {
        self.schemes.insert(scheme.into(), points);
        self
    }
}

impl NavSource for InMemoryNavSource {
    fn nav_history(
        &self,
        scheme: &str,
        window: DateWindow,
    ) -> Result<Vec<NavPoint>, NavSourceError> {
        let points = self
            .schemes
            .get(scheme)
            .ok_or_else(|| NavSourceError::UnknownScheme(scheme.to_string()))?;
        Ok(points
            .iter()
            .copied()
            .filter(|point| window.contains(point.date))
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestPoint {
    pub date: NaiveDate,
    pub nav: f64,
    pub invested: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestSummary {
    pub invested: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    pub absolute_return: f64,
    pub current_nav: f64,
    pub installments: u32,
    pub units: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipBacktest {
    pub points: Vec<BacktestPoint>,
    pub summary: BacktestSummary,
}

pub fn backtest_sip(points: &[NavPoint], sip_amount: f64, window: DateWindow) -> SipBacktest {
    let mut history: Vec<NavPoint> = points
        .iter()
        .copied()
        .filter(|point| window.contains(point.date) && point.nav.is_finite())
        .collect();
    history.sort_by_key(|point| point.date);

    let amount = if sip_amount.is_finite() {
        sip_amount.max(0.0)
    } else {
        0.0
    };
    let mut invested = 0.0;
    let mut units = 0.0;
    let mut installments = 0u32;
    let mut replay = Vec::with_capacity(history.len());

    for (index, point) in history.iter().enumerate() {
        if index % INSTALLMENT_INTERVAL == 0 && point.nav > 0.0 {
            invested += amount;
            units += amount / point.nav;
            installments += 1;
        }
        replay.push(BacktestPoint {
            date: point.date,
            nav: point.nav,
            invested,
            value: units * point.nav,
        });
    }

    let Some(last) = replay.last() else {
        return SipBacktest::default();
    };
    let summary = BacktestSummary {
        invested: last.invested,
        current_value: last.value,
        profit_loss: last.value - last.invested,
        absolute_return: absolute_return(last.invested, last.value),
        current_nav: last.nav,
        installments,
        units,
    };
    SipBacktest {
        points: replay,
        summary,
    }
}

/// Fetches `scheme` from `source` and replays the SIP over the window.
pub fn backtest_from_source(
    source: &dyn NavSource,
    scheme: &str,
    sip_amount: f64,
    window: DateWindow,
) -> Result<SipBacktest, NavSourceError> {
    let history = source.nav_history(scheme, window)?;
    Ok(backtest_sip(&history, sip_amount, window))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn daily_series(start: NaiveDate, days: u64, nav: impl Fn(u64) -> f64) -> Vec<NavPoint> {
        (0..days)
            .map(|offset| NavPoint {
                date: start + chrono::Days::new(offset),
                nav: nav(offset),
            })
            .collect()
    }

    #[test]
    fn flat_nav_returns_exactly_what_was_invested() {
        let series = daily_series(date(2024, 1, 1), 90, |_| 10.0);
        let result = backtest_sip(&series, 1_000.0, DateWindow::unbounded());
        assert_eq!(result.summary.installments, 3);
        assert_eq!(result.summary.invested, 3_000.0);
        assert!((result.summary.current_value - 3_000.0).abs() < 1e-9);
        assert!(result.summary.profit_loss.abs() < 1e-9);
        assert_eq!(result.points.len(), 90);
    }

    #[test]
    fn rising_nav_yields_profit() {
        let series = daily_series(date(2024, 1, 1), 61, |day| 10.0 + day as f64 / 10.0);
        let result = backtest_sip(&series, 1_000.0, DateWindow::unbounded());
        // Buys at 10, 13 and 16; values everything at 16.
        let units = 100.0 + 1_000.0 / 13.0 + 62.5;
        assert!((result.summary.units - units).abs() < 1e-9);
        assert!((result.summary.current_value - units * 16.0).abs() < 1e-9);
        assert!(result.summary.absolute_return > 0.0);
        assert_eq!(result.summary.current_nav, 16.0);
    }

    #[test]
    fn unsorted_input_is_replayed_in_date_order() {
        let mut series = daily_series(date(2024, 1, 1), 31, |day| 10.0 + day as f64);
        series.reverse();
        let result = backtest_sip(&series, 500.0, DateWindow::unbounded());
        assert_eq!(result.points.first().map(|p| p.date), Some(date(2024, 1, 1)));
        assert_eq!(result.summary.installments, 2);
    }

    #[test]
    fn window_filters_observations() {
        let series = daily_series(date(2024, 1, 1), 120, |_| 20.0);
        let window = DateWindow {
            start: Some(date(2024, 2, 1)),
            end: Some(date(2024, 2, 29)),
        };
        let result = backtest_sip(&series, 1_000.0, window);
        assert_eq!(result.points.len(), 29);
        assert_eq!(result.summary.installments, 1);
    }

    #[test]
    fn empty_history_gives_zero_summary() {
        let result = backtest_sip(&[], 1_000.0, DateWindow::unbounded());
        assert!(result.points.is_empty());
        assert_eq!(result.summary, BacktestSummary::default());
    }

    #[test]
    fn source_reports_unknown_scheme() {
        let source = InMemoryNavSource::default()
            .with_scheme("120503", daily_series(date(2024, 1, 1), 10, |_| 50.0));
        let err = backtest_from_source(&source, "999", 1_000.0, DateWindow::unbounded())
            .expect_err("unknown scheme");
        assert_eq!(err, NavSourceError::UnknownScheme("999".to_string()));

        let ok = backtest_from_source(&source, "120503", 1_000.0, DateWindow::unbounded())
            .expect("known scheme");
        assert_eq!(ok.summary.installments, 1);
        assert_eq!(ok.summary.current_nav, 50.0);
    }
}
