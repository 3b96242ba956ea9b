use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::core::{
    BreakdownChart, CalculatorDefinition, CalculatorEngine, CalculatorRegistry, DateWindow,
    Derived, EngineError, GrowthSeries, InMemoryNavSource, NavPoint, SipBacktest, Snapshot,
    UnitFormat, backtest_from_source, format_value,
};
use crate::error::AppError;

const DEFAULT_SIP_AMOUNT: f64 = 10_000.0;
const INLINE_SCHEME: &str = "inline";
const FALLBACK_PARAM: &str = "fallback";

#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<CalculatorRegistry>,
    pub currency_symbol: Arc<str>,
}

impl AppState {
    pub fn new(registry: CalculatorRegistry, currency_symbol: &str) -> Self {
        Self {
            registry: Arc::new(registry),
            currency_symbol: Arc::from(currency_symbol),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorSummary {
    pub key: &'static str,
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputFieldView {
    pub key: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub unit: UnitFormat,
    pub value: f64,
    pub display: String,
    /// Slider fill, 0 to 100.
    pub progress: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub label: &'static str,
    pub value: f64,
    pub unit: UnitFormat,
    pub display: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorView {
    pub key: &'static str,
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub inputs: Vec<InputFieldView>,
    pub derived: Derived,
    pub results: Vec<ResultView>,
    pub breakdown: BreakdownChart,
    pub growth: GrowthSeries,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawInput {
    Number(f64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    fallback: Option<String>,
    inputs: BTreeMap<String, RawInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NavEntry {
    date: String,
    nav: RawInput,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SipPerformancePayload {
    sip_amount: Option<f64>,
    start_date: Option<String>,
    end_date: Option<String>,
    navs: Vec<NavEntry>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn summarize(definition: &CalculatorDefinition) -> CalculatorSummary {
    CalculatorSummary {
        key: definition.kind.key(),
        slug: definition.kind.route_slug(),
        name: definition.display_name,
        description: definition.description,
    }
}

pub fn build_view(
    definition: &CalculatorDefinition,
    snapshot: &Snapshot,
    currency_symbol: &str,
) -> CalculatorView {
    let inputs = definition
        .inputs
        .iter()
        .map(|spec| {
            let value = snapshot.inputs.get(spec.key);
            let progress = if spec.max > spec.min {
                (value - spec.min) / (spec.max - spec.min) * 100.0
            } else {
                0.0
            };
            InputFieldView {
                key: spec.key,
                label: spec.label,
                min: spec.min,
                max: spec.max,
                step: spec.step,
                unit: spec.unit,
                value,
                display: format_value(value, spec.unit, currency_symbol),
                progress,
            }
        })
        .collect();

    let results = snapshot
        .results
        .iter()
        .map(|row| ResultView {
            label: row.label,
            value: row.value,
            unit: row.unit,
            display: format_value(row.value, row.unit, currency_symbol),
        })
        .collect();

    CalculatorView {
        key: definition.kind.key(),
        slug: definition.kind.route_slug(),
        name: definition.display_name,
        description: definition.description,
        inputs,
        derived: snapshot.derived.clone(),
        results,
        breakdown: snapshot.breakdown.clone(),
        growth: snapshot.growth.clone(),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/calculators", get(list_handler))
        .route(
            "/api/calculators/:key",
            get(calculator_get_handler).post(calculator_post_handler),
        )
        .route("/api/performance/sip", post(sip_performance_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: &AppConfig) -> Result<(), AppError> {
    let registry = CalculatorRegistry::builtin()?;
    let state = AppState::new(registry, &config.currency_symbol);
    let addr = config.server.socket_addr()?;
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "calculator API listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn list_handler(State(state): State<AppState>) -> Response {
    let calculators: Vec<CalculatorSummary> = state.registry.iter().map(summarize).collect();
    json_response(StatusCode::OK, calculators)
}

async fn calculator_get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(mut query): Query<BTreeMap<String, String>>,
) -> Result<Response, AppError> {
    let fallback = query.remove(FALLBACK_PARAM);
    let inputs = query
        .into_iter()
        .map(|(name, value)| (name, RawInput::Text(value)))
        .collect();
    calculate(&state, &key, fallback.as_deref(), inputs)
}

async fn calculator_post_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(payload): Json<CalculatePayload>,
) -> Result<Response, AppError> {
    calculate(&state, &key, payload.fallback.as_deref(), payload.inputs)
}

fn calculate(
    state: &AppState,
    key: &str,
    fallback: Option<&str>,
    inputs: BTreeMap<String, RawInput>,
) -> Result<Response, AppError> {
    let mut engine = CalculatorEngine::new(&state.registry);
    if let Err(err) = engine.select_type_or(key, fallback) {
        warn!(calculator = key, "calculator not available");
        return Err(err.into());
    }

    for (name, raw) in &inputs {
        match raw {
            RawInput::Number(value) => engine.set_input_value(name, *value)?,
            RawInput::Text(text) => engine.set_input_text(name, text)?,
        };
    }

    let definition = engine.definition().ok_or(EngineError::NotReady)?;
    let snapshot = engine.snapshot().ok_or(EngineError::NotReady)?;
    let view = build_view(definition, snapshot, &state.currency_symbol);
    Ok(json_response(StatusCode::OK, view))
}

async fn sip_performance_handler(
    Json(payload): Json<SipPerformancePayload>,
) -> Result<Response, AppError> {
    let backtest = run_sip_performance(payload)?;
    Ok(json_response(StatusCode::OK, backtest))
}

fn run_sip_performance(payload: SipPerformancePayload) -> Result<SipBacktest, AppError> {
    let window = DateWindow {
        start: payload.start_date.as_deref().map(parse_nav_date).transpose()?,
        end: payload.end_date.as_deref().map(parse_nav_date).transpose()?,
    };
    if let (Some(start), Some(end)) = (window.start, window.end) {
        if start > end {
            return Err(AppError::InvalidRequest(
                "startDate must not be after endDate".to_string(),
            ));
        }
    }

    let sip_amount = payload.sip_amount.unwrap_or(DEFAULT_SIP_AMOUNT);
    if !sip_amount.is_finite() || sip_amount <= 0.0 {
        return Err(AppError::InvalidRequest("sipAmount must be > 0".to_string()));
    }

    let points = payload
        .navs
        .iter()
        .map(|entry| {
            Ok(NavPoint {
                date: parse_nav_date(&entry.date)?,
                nav: parse_nav(&entry.nav)?,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let source = InMemoryNavSource::default().with_scheme(INLINE_SCHEME, points);
    Ok(backtest_from_source(&source, INLINE_SCHEME, sip_amount, window)?)
}

/// Accepts the `dd-mm-yyyy` dates used by public NAV feeds as well as ISO
/// dates.
fn parse_nav_date(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%d-%m-%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map_err(|_| AppError::InvalidRequest(format!("invalid date '{raw}'")))
}

fn parse_nav(raw: &RawInput) -> Result<f64, AppError> {
    let value = match raw {
        RawInput::Number(value) => Some(*value),
        RawInput::Text(text) => text.trim().parse::<f64>().ok(),
    };
    value
        .filter(|nav| nav.is_finite())
        .ok_or_else(|| AppError::InvalidRequest(format!("invalid nav {raw:?}")))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
