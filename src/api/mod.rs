use std::fmt::Write as _;

use anyhow::anyhow;
use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::commentary::{OllamaCommentary, build_prompt, commentary_or_fallback};
use crate::config::ServerConfig;
use crate::core::{
    CalculationMode, Composition, GOAL, HorizonUnit, MAX_MONTHS, RatePeriod, SimulationInput,
    SimulationResult, format_currency, format_duration, simulate,
};

mod error;

pub use error::InputError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliMode {
    Contribution,
    Time,
}

impl From<CliMode> for CalculationMode {
    fn from(value: CliMode) -> Self {
        match value {
            CliMode::Contribution => CalculationMode::SolveForContribution,
            CliMode::Time => CalculationMode::SolveForTime,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliRateUnit {
    Annual,
    Monthly,
}

impl From<CliRateUnit> for RatePeriod {
    fn from(value: CliRateUnit) -> Self {
        match value {
            CliRateUnit::Annual => RatePeriod::Annual,
            CliRateUnit::Monthly => RatePeriod::Monthly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliPeriodUnit {
    Years,
    Months,
}

impl From<CliPeriodUnit> for HorizonUnit {
    fn from(value: CliPeriodUnit) -> Self {
        match value {
            CliPeriodUnit::Years => HorizonUnit::Years,
            CliPeriodUnit::Months => HorizonUnit::Months,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiMode {
    #[serde(alias = "solveForContribution", alias = "CONTRIBUTION")]
    Contribution,
    #[serde(alias = "solveForTime", alias = "TIME")]
    Time,
}

impl From<ApiMode> for CliMode {
    fn from(value: ApiMode) -> Self {
        match value {
            ApiMode::Contribution => CliMode::Contribution,
            ApiMode::Time => CliMode::Time,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiRateUnit {
    #[serde(alias = "ANNUAL", alias = "yearly")]
    Annual,
    #[serde(alias = "MONTHLY")]
    Monthly,
}

impl From<ApiRateUnit> for CliRateUnit {
    fn from(value: ApiRateUnit) -> Self {
        match value {
            ApiRateUnit::Annual => CliRateUnit::Annual,
            ApiRateUnit::Monthly => CliRateUnit::Monthly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiPeriodUnit {
    #[serde(alias = "YEARS")]
    Years,
    #[serde(alias = "MONTHS")]
    Months,
}

impl From<ApiPeriodUnit> for CliPeriodUnit {
    fn from(value: ApiPeriodUnit) -> Self {
        match value {
            ApiPeriodUnit::Years => CliPeriodUnit::Years,
            ApiPeriodUnit::Months => CliPeriodUnit::Months,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum ResponseMode {
    Contribution,
    Time,
}

impl From<CalculationMode> for ResponseMode {
    fn from(value: CalculationMode) -> Self {
        match value {
            CalculationMode::SolveForContribution => ResponseMode::Contribution,
            CalculationMode::SolveForTime => ResponseMode::Time,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    mode: Option<ApiMode>,
    initial_value: Option<f64>,
    monthly_contribution: Option<f64>,
    interest_rate: Option<f64>,
    rate_unit: Option<ApiRateUnit>,
    period: Option<f64>,
    period_unit: Option<ApiPeriodUnit>,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[arg(
        long,
        value_enum,
        default_value_t = CliMode::Contribution,
        help = "What to solve for: the monthly contribution or the time to reach the goal"
    )]
    pub mode: CliMode,
    #[arg(long, default_value_t = 0.0)]
    pub initial_value: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Monthly deposit, used when --mode=time"
    )]
    pub monthly_contribution: f64,
    #[arg(long, default_value_t = 0.0, help = "Interest rate in percent, e.g. 10")]
    pub interest_rate: f64,
    #[arg(long, value_enum, default_value_t = CliRateUnit::Annual)]
    pub rate_unit: CliRateUnit,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Horizon length, used when --mode=contribution"
    )]
    pub period: f64,
    #[arg(long, value_enum, default_value_t = CliPeriodUnit::Years)]
    pub period_unit: CliPeriodUnit,
}

impl Default for SimulateArgs {
    fn default() -> Self {
        Self {
            mode: CliMode::Contribution,
            initial_value: 0.0,
            monthly_contribution: 0.0,
            interest_rate: 0.0,
            rate_unit: CliRateUnit::Annual,
            period: 0.0,
            period_unit: CliPeriodUnit::Years,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormattedSummary {
    total_final: String,
    total_invested: String,
    total_interest: String,
    monthly_contribution: String,
    period: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    mode: ResponseMode,
    goal: f64,
    composition: Composition,
    formatted: FormattedSummary,
    #[serde(flatten)]
    result: SimulationResult,
}

#[derive(Debug, Serialize)]
struct CommentaryResponse {
    prompt: String,
    commentary: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
struct AppState {
    commentary: Option<OllamaCommentary>,
}

pub fn build_inputs(args: &SimulateArgs) -> Result<SimulationInput, InputError> {
    let input = SimulationInput {
        mode: args.mode.into(),
        initial_value: InputError::check_amount("--initial-value", args.initial_value)?,
        monthly_contribution: InputError::check_amount(
            "--monthly-contribution",
            args.monthly_contribution,
        )?,
        interest_rate: InputError::check_amount("--interest-rate", args.interest_rate)?,
        rate_period: args.rate_unit.into(),
        horizon_length: InputError::check_amount("--period", args.period)?,
        horizon_unit: args.period_unit.into(),
    };
    if input.mode == CalculationMode::SolveForContribution && input.horizon_months().is_none() {
        return Err(InputError::HorizonTooLong {
            flag: "--period",
            max_months: MAX_MONTHS,
        });
    }
    Ok(input)
}

pub fn build_simulate_response(input: &SimulationInput, result: SimulationResult) -> SimulateResponse {
    SimulateResponse {
        mode: input.mode.into(),
        goal: GOAL,
        composition: result.composition(),
        formatted: FormattedSummary {
            total_final: format_currency(result.total_final),
            total_invested: format_currency(result.total_invested),
            total_interest: format_currency(result.total_interest),
            monthly_contribution: format_currency(result.monthly_contribution),
            period: format_duration(result.period_in_months),
        },
        result,
    }
}

/// Plain-text summary plus the year-by-year table.
pub fn render_report(input: &SimulationInput, result: &SimulationResult) -> String {
    let mut out = String::new();
    let composition = result.composition();

    let _ = writeln!(out, "Goal:                 {}", format_currency(GOAL));
    let _ = writeln!(out, "Outcome:              {:?}", result.outcome);
    match input.mode {
        CalculationMode::SolveForContribution => {
            let _ = writeln!(
                out,
                "Monthly contribution: {}",
                format_currency(result.monthly_contribution)
            );
        }
        CalculationMode::SolveForTime => {
            let _ = writeln!(
                out,
                "Time to goal:         {}",
                format_duration(result.period_in_months)
            );
        }
    }
    let _ = writeln!(out, "Total accumulated:    {}", format_currency(result.total_final));
    let _ = writeln!(
        out,
        "Total invested:       {} ({:.1}%)",
        format_currency(result.total_invested),
        composition.invested_share * 100.0
    );
    let _ = writeln!(
        out,
        "Total interest:       {} ({:.1}%)",
        format_currency(result.total_interest),
        composition.interest_share * 100.0
    );

    if result.annual_history.is_empty() {
        return out;
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:>4} {:>20} {:>20} {:>22}",
        "Year", "Invested", "Interest", "Accumulated"
    );
    for row in &result.annual_history {
        let _ = writeln!(
            out,
            "{:>4} {:>20} {:>20} {:>22}",
            row.year,
            format_currency(row.annual_investment),
            format_currency(row.annual_interest),
            format_currency(row.total_accumulated)
        );
    }
    out
}

pub async fn run_http_server(config: &ServerConfig) -> std::io::Result<()> {
    let commentary = match OllamaCommentary::new(config) {
        Ok(client) => Some(client),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "commentary disabled");
            None
        }
    };
    let app = router(AppState { commentary });

    let addr = config.socket_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("million HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/commentary", post(commentary_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(
    payload: Result<Query<SimulatePayload>, QueryRejection>,
) -> Response {
    let payload = payload
        .map(|Query(payload)| payload)
        .map_err(|rejection| InputError::Query(rejection.body_text()));
    simulate_handler_impl(payload)
}

async fn simulate_post_handler(payload: Result<Json<SimulatePayload>, JsonRejection>) -> Response {
    simulate_handler_impl(json_payload(payload))
}

fn simulate_handler_impl(payload: Result<SimulatePayload, InputError>) -> Response {
    let input = match payload.and_then(api_input_from_payload) {
        Ok(input) => input,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    };
    let result = simulate(&input);
    json_response(StatusCode::OK, build_simulate_response(&input, result))
}

async fn commentary_handler(
    State(state): State<AppState>,
    payload: Result<Json<SimulatePayload>, JsonRejection>,
) -> Response {
    let input = match json_payload(payload).and_then(api_input_from_payload) {
        Ok(input) => input,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    };
    let result = simulate(&input);
    let prompt = build_prompt(&input, &result);

    let reply = match &state.commentary {
        Some(client) => client.generate(&prompt).await,
        None => Err(anyhow!("commentary client is not configured")),
    };
    let commentary = commentary_or_fallback(reply);

    json_response(StatusCode::OK, CommentaryResponse { prompt, commentary })
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn json_payload(
    payload: Result<Json<SimulatePayload>, JsonRejection>,
) -> Result<SimulatePayload, InputError> {
    payload
        .map(|Json(payload)| payload)
        .map_err(|rejection| InputError::Payload(rejection.body_text()))
}

#[cfg(test)]
fn api_input_from_json(json: &str) -> Result<SimulationInput, InputError> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| InputError::Payload(e.to_string()))?;
    api_input_from_payload(payload)
}

fn api_input_from_payload(payload: SimulatePayload) -> Result<SimulationInput, InputError> {
    let mut args = SimulateArgs::default();

    if let Some(v) = payload.mode {
        args.mode = v.into();
    }
    if let Some(v) = payload.initial_value {
        args.initial_value = v;
    }
    if let Some(v) = payload.monthly_contribution {
        args.monthly_contribution = v;
    }
    if let Some(v) = payload.interest_rate {
        args.interest_rate = v;
    }
    if let Some(v) = payload.rate_unit {
        args.rate_unit = v.into();
    }
    if let Some(v) = payload.period {
        args.period = v;
    }
    if let Some(v) = payload.period_unit {
        args.period_unit = v.into();
    }

    build_inputs(&args)
}
