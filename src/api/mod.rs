use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::core::{
    AmortizationRow, CorpusMethod, DEFAULT_WITHDRAWAL_RATE_PERCENT, DEFAULT_WITHDRAWAL_YEARS,
    GoalSolveParameters, GoalSolveResult, GoalSweepAxis, GoalSweepParameters, GrowthParameters,
    GrowthResult, GrowthSweepAxis, GrowthSweepParameters, LoanParameters, LoanResult,
    MonteCarloParameters, MonteCarloResult, ProjectionError, ProjectionPoint, RateSearchConfig,
    RequiredReturnParameters, RequiredReturnResult, RetirementParameters, RetirementResult,
    ScenarioSweepResult, amortization_schedule, calculate_loan, plan_retirement, project_growth,
    project_growth_series, run_monte_carlo_with_seed, solve_goal, solve_required_return_rate,
    sweep_goal, sweep_growth,
};

type AppState = Arc<ServerConfig>;

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Projection(ProjectionError),
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        ApiError::Projection(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid API JSON payload: {}", rejection.body_text()))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => f.write_str(msg),
            ApiError::Projection(err) => write!(f, "{err}"),
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiSweepKind {
    #[serde(alias = "sip")]
    Growth,
    Goal,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiSweepAxis {
    #[serde(alias = "returnRate", alias = "return_rate", alias = "rate")]
    ReturnRate,
    #[serde(
        alias = "monthlyContribution",
        alias = "monthly_contribution",
        alias = "contribution"
    )]
    MonthlyContribution,
    #[serde(alias = "targetAmount", alias = "target_amount", alias = "target")]
    TargetAmount,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GrowthPayload {
    #[serde(alias = "present_value", alias = "initialInvestment", alias = "currentValue")]
    present_value: Option<f64>,
    #[serde(alias = "monthly_contribution", alias = "monthlyInvestment", alias = "sipAmount")]
    monthly_contribution: Option<f64>,
    #[serde(
        alias = "annual_return_rate_percent",
        alias = "expectedReturn",
        alias = "annualReturn",
        alias = "rate"
    )]
    annual_return_rate_percent: Option<f64>,
    months: Option<i32>,
    years: Option<i32>,
    #[serde(alias = "include_projections")]
    include_projections: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GoalPayload {
    #[serde(alias = "present_value", alias = "currentAmount", alias = "currentSavings")]
    present_value: Option<f64>,
    #[serde(alias = "target_amount", alias = "goalAmount", alias = "target")]
    target_amount: Option<f64>,
    #[serde(
        alias = "annual_return_rate_percent",
        alias = "expectedReturn",
        alias = "annualReturn",
        alias = "rate"
    )]
    annual_return_rate_percent: Option<f64>,
    months: Option<i32>,
    years: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RequiredReturnPayload {
    #[serde(alias = "present_value", alias = "currentAmount")]
    present_value: Option<f64>,
    #[serde(alias = "monthly_contribution", alias = "monthlyInvestment")]
    monthly_contribution: Option<f64>,
    #[serde(alias = "target_amount", alias = "goalAmount", alias = "target")]
    target_amount: Option<f64>,
    months: Option<i32>,
    years: Option<i32>,
    search_min_percent: Option<f64>,
    search_max_percent: Option<f64>,
    tolerance_percent: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RetirementPayload {
    #[serde(alias = "current_age")]
    current_age: Option<u32>,
    #[serde(alias = "retirement_age")]
    retirement_age: Option<u32>,
    #[serde(alias = "current_savings", alias = "presentValue")]
    current_savings: Option<f64>,
    #[serde(alias = "monthly_contribution", alias = "monthlyInvestment")]
    monthly_contribution: Option<f64>,
    #[serde(
        alias = "annual_return_rate_percent",
        alias = "expectedReturn",
        alias = "annualReturn",
        alias = "rate"
    )]
    annual_return_rate_percent: Option<f64>,
    #[serde(alias = "desired_monthly_income", alias = "monthlyExpenses")]
    desired_monthly_income: Option<f64>,
    #[serde(alias = "withdrawal_years", alias = "lifeExpectancyYears")]
    withdrawal_years: Option<u32>,
    #[serde(alias = "withdrawal_rate_percent", alias = "withdrawalRate")]
    withdrawal_rate_percent: Option<f64>,
    #[serde(alias = "corpus_method")]
    corpus_method: Option<CorpusMethod>,
    #[serde(alias = "inflation_rate_percent", alias = "inflationRate", alias = "inflation")]
    inflation_rate_percent: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LoanPayload {
    #[serde(alias = "loanAmount", alias = "amount")]
    principal: Option<f64>,
    #[serde(
        alias = "annual_interest_rate_percent",
        alias = "interestRate",
        alias = "rate"
    )]
    annual_interest_rate_percent: Option<f64>,
    #[serde(alias = "tenure_months", alias = "tenure")]
    tenure_months: Option<i32>,
    #[serde(alias = "tenure_years")]
    tenure_years: Option<i32>,
    #[serde(alias = "extra_monthly_payment", alias = "extraPayment")]
    extra_monthly_payment: Option<f64>,
    #[serde(alias = "include_schedule")]
    include_schedule: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WhatIfPayload {
    kind: Option<ApiSweepKind>,
    axis: Option<ApiSweepAxis>,
    #[serde(alias = "values")]
    variants: Vec<f64>,
    #[serde(alias = "present_value", alias = "currentAmount")]
    present_value: Option<f64>,
    #[serde(alias = "monthly_contribution", alias = "monthlyInvestment")]
    monthly_contribution: Option<f64>,
    #[serde(alias = "target_amount", alias = "goalAmount", alias = "target")]
    target_amount: Option<f64>,
    #[serde(
        alias = "annual_return_rate_percent",
        alias = "expectedReturn",
        alias = "rate"
    )]
    annual_return_rate_percent: Option<f64>,
    months: Option<i32>,
    years: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MonteCarloPayload {
    #[serde(alias = "present_value", alias = "initialInvestment")]
    present_value: Option<f64>,
    #[serde(alias = "monthly_contribution", alias = "monthlyInvestment")]
    monthly_contribution: Option<f64>,
    #[serde(
        alias = "expected_annual_return_percent",
        alias = "expectedReturn",
        alias = "annualReturnRatePercent"
    )]
    expected_annual_return_percent: Option<f64>,
    #[serde(alias = "annual_volatility_percent", alias = "volatility")]
    annual_volatility_percent: Option<f64>,
    months: Option<i32>,
    years: Option<i32>,
    #[serde(alias = "simulations")]
    trials: Option<i32>,
    seed: Option<u64>,
    #[serde(alias = "target_amount", alias = "goalAmount", alias = "target")]
    target_amount: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GrowthResponse {
    #[serde(flatten)]
    result: GrowthResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    projections: Option<Vec<ProjectionPoint>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoanResponse {
    #[serde(flatten)]
    result: LoanResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<Vec<AmortizationRow>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MonteCarloResponse {
    #[serde(flatten)]
    result: MonteCarloResult,
    seed: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WhatIfResponse<T> {
    kind: &'static str,
    axis: &'static str,
    entries: ScenarioSweepResult<T>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn build_router(config: ServerConfig) -> Router {
    let state: AppState = Arc::new(config);
    Router::new()
        .route("/health", get(health_handler))
        .route("/calculators/sip", post(sip_handler))
        .route("/calculators/goal", post(goal_handler))
        .route("/calculators/retirement", post(retirement_handler))
        .route("/calculators/loan", post(loan_handler))
        .route("/investments/simulate-growth", post(simulate_growth_handler))
        .route("/investments/minimum-for-target", post(goal_handler))
        .route("/investments/required-return", post(required_return_handler))
        .route("/scenarios/what-if", post(what_if_handler))
        .route("/simulations/monte-carlo", post(monte_carlo_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let addr = config.addr;
    let app = build_router(config);

    let listener = TcpListener::bind(addr).await?;
    info!("wealthcalc HTTP API listening on http://{addr}");
    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn sip_handler(
    State(config): State<AppState>,
    payload: Result<Json<GrowthPayload>, JsonRejection>,
) -> Response {
    respond("sip", sip_impl(&config, payload, false))
}

async fn simulate_growth_handler(
    State(config): State<AppState>,
    payload: Result<Json<GrowthPayload>, JsonRejection>,
) -> Response {
    respond("simulate-growth", sip_impl(&config, payload, true))
}

async fn goal_handler(
    State(config): State<AppState>,
    payload: Result<Json<GoalPayload>, JsonRejection>,
) -> Response {
    respond("goal", goal_impl(&config, payload))
}

async fn required_return_handler(
    State(config): State<AppState>,
    payload: Result<Json<RequiredReturnPayload>, JsonRejection>,
) -> Response {
    respond("required-return", required_return_impl(&config, payload))
}

async fn retirement_handler(
    State(config): State<AppState>,
    payload: Result<Json<RetirementPayload>, JsonRejection>,
) -> Response {
    respond("retirement", retirement_impl(&config, payload))
}

async fn loan_handler(
    State(config): State<AppState>,
    payload: Result<Json<LoanPayload>, JsonRejection>,
) -> Response {
    respond("loan", loan_impl(&config, payload))
}

async fn what_if_handler(
    State(config): State<AppState>,
    payload: Result<Json<WhatIfPayload>, JsonRejection>,
) -> Response {
    match what_if_impl(&config, payload) {
        Ok(response) => response,
        Err(err) => reject("what-if", err),
    }
}

async fn monte_carlo_handler(
    State(config): State<AppState>,
    payload: Result<Json<MonteCarloPayload>, JsonRejection>,
) -> Response {
    respond("monte-carlo", monte_carlo_impl(&config, payload))
}

fn sip_impl(
    config: &ServerConfig,
    payload: Result<Json<GrowthPayload>, JsonRejection>,
    always_project: bool,
) -> ApiResult<GrowthResponse> {
    let Json(payload) = payload?;
    let include_projections = always_project || payload.include_projections.unwrap_or(false);
    let params = GrowthParameters {
        present_value: payload.present_value.unwrap_or(0.0),
        monthly_contribution: payload.monthly_contribution.unwrap_or(0.0),
        annual_return_rate_percent: required(
            payload.annual_return_rate_percent,
            "annualReturnRatePercent",
        )?,
        months: horizon_months(config, payload.months, payload.years)?,
    };

    let result = project_growth(&params)?;
    let projections = if include_projections {
        Some(project_growth_series(&params)?)
    } else {
        None
    };
    Ok(GrowthResponse {
        result,
        projections,
    })
}

fn goal_impl(
    config: &ServerConfig,
    payload: Result<Json<GoalPayload>, JsonRejection>,
) -> ApiResult<GoalSolveResult> {
    let Json(payload) = payload?;
    let params = GoalSolveParameters {
        present_value: payload.present_value.unwrap_or(0.0),
        target_amount: required(payload.target_amount, "targetAmount")?,
        annual_return_rate_percent: required(
            payload.annual_return_rate_percent,
            "annualReturnRatePercent",
        )?,
        months: horizon_months(config, payload.months, payload.years)?,
    };
    Ok(solve_goal(&params)?)
}

fn required_return_impl(
    config: &ServerConfig,
    payload: Result<Json<RequiredReturnPayload>, JsonRejection>,
) -> ApiResult<RequiredReturnResult> {
    let Json(payload) = payload?;
    let params = RequiredReturnParameters {
        present_value: payload.present_value.unwrap_or(0.0),
        monthly_contribution: payload.monthly_contribution.unwrap_or(0.0),
        target_amount: required(payload.target_amount, "targetAmount")?,
        months: horizon_months(config, payload.months, payload.years)?,
    };
    let defaults = RateSearchConfig::default();
    let search = RateSearchConfig {
        search_min_percent: payload
            .search_min_percent
            .unwrap_or(defaults.search_min_percent),
        search_max_percent: payload
            .search_max_percent
            .unwrap_or(defaults.search_max_percent),
        tolerance_percent: payload
            .tolerance_percent
            .unwrap_or(defaults.tolerance_percent),
        max_iterations: payload.max_iterations.unwrap_or(defaults.max_iterations),
    };
    Ok(solve_required_return_rate(&params, search)?)
}

fn retirement_impl(
    config: &ServerConfig,
    payload: Result<Json<RetirementPayload>, JsonRejection>,
) -> ApiResult<RetirementResult> {
    let Json(payload) = payload?;
    let current_age = required(payload.current_age, "currentAge")?;
    let retirement_age = required(payload.retirement_age, "retirementAge")?;
    within_horizon(
        config,
        "retirementAge",
        i64::from(retirement_age.saturating_sub(current_age)) * 12,
    )?;
    let params = RetirementParameters {
        current_age,
        retirement_age,
        current_savings: payload.current_savings.unwrap_or(0.0),
        monthly_contribution: payload.monthly_contribution.unwrap_or(0.0),
        annual_return_rate_percent: required(
            payload.annual_return_rate_percent,
            "annualReturnRatePercent",
        )?,
        desired_monthly_income: required(payload.desired_monthly_income, "desiredMonthlyIncome")?,
        withdrawal_years: payload.withdrawal_years.unwrap_or(DEFAULT_WITHDRAWAL_YEARS),
        withdrawal_rate_percent: payload
            .withdrawal_rate_percent
            .unwrap_or(DEFAULT_WITHDRAWAL_RATE_PERCENT),
        corpus_method: payload.corpus_method.unwrap_or_default(),
        inflation_rate_percent: payload.inflation_rate_percent,
    };
    Ok(plan_retirement(&params)?)
}

fn loan_impl(
    config: &ServerConfig,
    payload: Result<Json<LoanPayload>, JsonRejection>,
) -> ApiResult<LoanResponse> {
    let Json(payload) = payload?;
    let tenure_months = match (payload.tenure_months, payload.tenure_years) {
        (Some(months), _) => months,
        (None, Some(years)) => years_to_months(years)?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "tenureMonths (or tenureYears) is required".to_string(),
            ));
        }
    };
    within_horizon(config, "tenureMonths", i64::from(tenure_months))?;
    let params = LoanParameters {
        principal: required(payload.principal, "principal")?,
        annual_interest_rate_percent: required(
            payload.annual_interest_rate_percent,
            "annualInterestRatePercent",
        )?,
        tenure_months,
        extra_monthly_payment: payload.extra_monthly_payment.unwrap_or(0.0),
    };

    let result = calculate_loan(&params)?;
    let schedule = if payload.include_schedule.unwrap_or(false) {
        Some(amortization_schedule(&params)?)
    } else {
        None
    };
    Ok(LoanResponse { result, schedule })
}

fn what_if_impl(
    config: &ServerConfig,
    payload: Result<Json<WhatIfPayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    if payload.variants.len() > config.max_sweep_variants {
        return Err(ApiError::BadRequest(format!(
            "variants must contain at most {} values",
            config.max_sweep_variants
        )));
    }
    let kind = payload.kind.unwrap_or(ApiSweepKind::Growth);
    let axis = required(payload.axis, "axis")?;
    let months = horizon_months(config, payload.months, payload.years)?;
    debug!("what-if sweep {kind:?} over {axis:?} with {} variants", payload.variants.len());

    match kind {
        ApiSweepKind::Growth => {
            let (axis, axis_name) = match axis {
                ApiSweepAxis::ReturnRate => (GrowthSweepAxis::ReturnRate, "return-rate"),
                ApiSweepAxis::MonthlyContribution => {
                    (GrowthSweepAxis::MonthlyContribution, "monthly-contribution")
                }
                ApiSweepAxis::TargetAmount => {
                    return Err(ApiError::BadRequest(
                        "growth sweeps vary return-rate or monthly-contribution".to_string(),
                    ));
                }
            };
            let base = GrowthParameters {
                present_value: payload.present_value.unwrap_or(0.0),
                monthly_contribution: payload.monthly_contribution.unwrap_or(0.0),
                annual_return_rate_percent: payload.annual_return_rate_percent.unwrap_or(0.0),
                months,
            };
            let entries = sweep_growth(&GrowthSweepParameters {
                base,
                axis,
                variants: payload.variants,
            })?;
            Ok(json_response(
                StatusCode::OK,
                WhatIfResponse {
                    kind: "growth",
                    axis: axis_name,
                    entries,
                },
            ))
        }
        ApiSweepKind::Goal => {
            let (axis, axis_name) = match axis {
                ApiSweepAxis::ReturnRate => (GoalSweepAxis::ReturnRate, "return-rate"),
                ApiSweepAxis::TargetAmount => (GoalSweepAxis::TargetAmount, "target-amount"),
                ApiSweepAxis::MonthlyContribution => {
                    return Err(ApiError::BadRequest(
                        "goal sweeps vary return-rate or target-amount".to_string(),
                    ));
                }
            };
            let base = GoalSolveParameters {
                present_value: payload.present_value.unwrap_or(0.0),
                target_amount: payload.target_amount.unwrap_or(0.0),
                annual_return_rate_percent: payload.annual_return_rate_percent.unwrap_or(0.0),
                months,
            };
            let entries = sweep_goal(&GoalSweepParameters {
                base,
                axis,
                variants: payload.variants,
            })?;
            Ok(json_response(
                StatusCode::OK,
                WhatIfResponse {
                    kind: "goal",
                    axis: axis_name,
                    entries,
                },
            ))
        }
    }
}

fn monte_carlo_impl(
    config: &ServerConfig,
    payload: Result<Json<MonteCarloPayload>, JsonRejection>,
) -> ApiResult<MonteCarloResponse> {
    let Json(payload) = payload?;
    let trials = payload.trials.unwrap_or(config.default_trials);
    if trials > config.max_trials {
        return Err(ApiError::BadRequest(format!(
            "trials must be <= {}",
            config.max_trials
        )));
    }
    let params = MonteCarloParameters {
        present_value: payload.present_value.unwrap_or(0.0),
        monthly_contribution: payload.monthly_contribution.unwrap_or(0.0),
        expected_annual_return_percent: required(
            payload.expected_annual_return_percent,
            "expectedAnnualReturnPercent",
        )?,
        annual_volatility_percent: required(
            payload.annual_volatility_percent,
            "annualVolatilityPercent",
        )?,
        months: horizon_months(config, payload.months, payload.years)?,
        trials,
        target_amount: payload.target_amount,
    };

    // Echoed back so the run can be reproduced.
    let seed = payload.seed.unwrap_or_else(rand::random);
    let result = run_monte_carlo_with_seed(&params, seed)?;
    Ok(MonteCarloResponse { result, seed })
}

fn required<T>(value: Option<T>, field: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
}

fn horizon_months(config: &ServerConfig, months: Option<i32>, years: Option<i32>) -> ApiResult<i32> {
    let months = match (months, years) {
        (Some(months), _) => months,
        (None, Some(years)) => years_to_months(years)?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "months (or years) is required".to_string(),
            ));
        }
    };
    within_horizon(config, "months", i64::from(months))?;
    Ok(months)
}

fn within_horizon(config: &ServerConfig, field: &str, months: i64) -> ApiResult<()> {
    if months > i64::from(config.max_months) {
        return Err(ApiError::BadRequest(format!(
            "{field} must be <= {} months",
            config.max_months
        )));
    }
    Ok(())
}

fn years_to_months(years: i32) -> ApiResult<i32> {
    years
        .checked_mul(12)
        .ok_or_else(|| ApiError::BadRequest("years is too large".to_string()))
}

fn respond<T: Serialize>(endpoint: &str, result: ApiResult<T>) -> Response {
    match result {
        Ok(body) => {
            debug!("{endpoint} calculation succeeded");
            json_response(StatusCode::OK, body)
        }
        Err(err) => reject(endpoint, err),
    }
}

fn reject(endpoint: &str, err: ApiError) -> Response {
    warn!("{endpoint} request rejected: {err}");
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
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
