use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use crate::core::coerce;
use crate::core::{
    Debt, ExtraPaymentSolveConfig, FilingStatus, Goal, GoalTracker, IncomeType, MonteCarloParams,
    PayoffStrategy, ScenarioData, ScenarioError, ScenarioPatch, ScenarioStore, TaxBreakdown,
    calculate_payoff_plan, compare_scenarios, compare_strategies, effective_rate, project,
    solve_extra_payment, tax_breakdown, validate_horizon,
};

/// Upper bounds for a single Monte Carlo request.
pub const MAX_SIMULATIONS: u32 = 100_000;
pub const MAX_SIMULATION_YEARS: u32 = 200;

#[derive(Clone)]
pub struct AppState {
    pub scenarios: Arc<RwLock<ScenarioStore>>,
}

impl AppState {
    pub fn new(store: ScenarioStore) -> Self {
        Self {
            scenarios: Arc::new(RwLock::new(store)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaxRequest {
    #[serde(default, deserialize_with = "coerce::number")]
    income: f64,
    #[serde(default = "default_income_type")]
    income_type: IncomeType,
    #[serde(default)]
    state: String,
    #[serde(default)]
    filing_status: FilingStatus,
}

fn default_income_type() -> IncomeType {
    IncomeType::Salary
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaxResponse {
    federal: f64,
    state: f64,
    total: f64,
    effective_rate: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebtPlanRequest {
    #[serde(default)]
    debts: Vec<Debt>,
    #[serde(default, deserialize_with = "coerce::number")]
    extra_payment: f64,
    #[serde(default)]
    strategy: PayoffStrategy,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebtSolveRequest {
    #[serde(default)]
    debts: Vec<Debt>,
    #[serde(default)]
    strategy: PayoffStrategy,
    #[serde(default, deserialize_with = "coerce::whole")]
    target_months: u32,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

impl DebtSolveRequest {
    fn config(&self) -> ExtraPaymentSolveConfig {
        let defaults = ExtraPaymentSolveConfig::default();
        ExtraPaymentSolveConfig {
            target_months: self.target_months,
            search_max: self.search_max.unwrap_or(defaults.search_max),
            tolerance: self.tolerance.unwrap_or(defaults.tolerance),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoalsRequest {
    /// Falls back to the active scenario when omitted.
    scenario: Option<ScenarioData>,
    #[serde(default)]
    goals: Vec<Goal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateScenarioRequest {
    name: String,
    base_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SetCurrentRequest {
    id: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/api/project", post(project_handler))
        .route("/api/tax", post(tax_handler))
        .route("/api/debts/plan", post(debt_plan_handler))
        .route("/api/debts/compare", post(debt_compare_handler))
        .route("/api/debts/solve", post(debt_solve_handler))
        .route("/api/simulate", post(simulate_handler))
        .route("/api/goals", post(goals_handler))
        .route(
            "/api/scenarios",
            get(list_scenarios_handler).post(create_scenario_handler),
        )
        .route(
            "/api/scenarios/current",
            get(current_scenario_handler).put(set_current_scenario_handler),
        )
        .route("/api/scenarios/compare", get(compare_scenarios_handler))
        .route(
            "/api/scenarios/:id",
            get(get_scenario_handler)
                .patch(update_scenario_handler)
                .delete(delete_scenario_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(addr: SocketAddr, store: ScenarioStore) -> std::io::Result<()> {
    let app = app_router(AppState::new(store));
    let listener = TcpListener::bind(addr).await?;
    log::info!("wealthcast HTTP API listening on http://{addr}");
    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_handler(payload: Result<Json<ScenarioData>, JsonRejection>) -> Response {
    let data = match payload {
        Ok(Json(data)) => data,
        Err(rejection) => return rejection_response(rejection),
    };
    if let Err(err) = validate_horizon(data.projection_years) {
        return error_response(StatusCode::BAD_REQUEST, &err.to_string());
    }
    json_response(
        StatusCode::OK,
        serde_json::json!({ "years": project(&data) }),
    )
}

async fn tax_handler(payload: Result<Json<TaxRequest>, JsonRejection>) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection),
    };
    json_response(StatusCode::OK, tax_response(&request))
}

fn tax_response(request: &TaxRequest) -> TaxResponse {
    let TaxBreakdown { federal, state } = tax_breakdown(
        request.income,
        request.income_type,
        &request.state,
        request.filing_status,
    );
    TaxResponse {
        federal,
        state,
        total: federal + state,
        effective_rate: effective_rate(
            request.income,
            request.income_type,
            &request.state,
            request.filing_status,
        ),
    }
}

async fn debt_plan_handler(payload: Result<Json<DebtPlanRequest>, JsonRejection>) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection),
    };
    let plan = calculate_payoff_plan(&request.debts, request.extra_payment, request.strategy);
    json_response(StatusCode::OK, plan)
}

async fn debt_compare_handler(payload: Result<Json<DebtPlanRequest>, JsonRejection>) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection),
    };
    json_response(
        StatusCode::OK,
        compare_strategies(&request.debts, request.extra_payment),
    )
}

async fn debt_solve_handler(payload: Result<Json<DebtSolveRequest>, JsonRejection>) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection),
    };
    match solve_extra_payment(&request.debts, request.strategy, request.config()) {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

fn validate_simulation(params: &MonteCarloParams) -> Result<(), String> {
    if params.simulations == 0 {
        return Err("simulations must be > 0".to_string());
    }
    if params.simulations > MAX_SIMULATIONS {
        return Err(format!("simulations must be <= {MAX_SIMULATIONS}"));
    }
    if params.years > MAX_SIMULATION_YEARS {
        return Err(format!("years must be <= {MAX_SIMULATION_YEARS}"));
    }
    if params.volatility < 0.0 {
        return Err("volatility must be >= 0".to_string());
    }
    Ok(())
}

async fn simulate_handler(payload: Result<Json<MonteCarloParams>, JsonRejection>) -> Response {
    let params = match payload {
        Ok(Json(params)) => params,
        Err(rejection) => return rejection_response(rejection),
    };
    if let Err(msg) = validate_simulation(&params) {
        return error_response(StatusCode::BAD_REQUEST, &msg);
    }

    // Runs to completion on the blocking pool; no partial results.
    match tokio::task::spawn_blocking(move || crate::core::simulate(&params)).await {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(err) => {
            log::error!("monte carlo task failed: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation failed")
        }
    }
}

async fn goals_handler(
    State(state): State<AppState>,
    payload: Result<Json<GoalsRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection),
    };
    let data = match request.scenario {
        Some(data) => data,
        None => state.scenarios.read().await.current().data.clone(),
    };
    if let Err(err) = validate_horizon(data.projection_years) {
        return error_response(StatusCode::BAD_REQUEST, &err.to_string());
    }
    let tracker = GoalTracker::new(request.goals);
    let progress = tracker.evaluate(&project(&data));
    json_response(StatusCode::OK, serde_json::json!({ "progress": progress }))
}

async fn list_scenarios_handler(State(state): State<AppState>) -> Response {
    let store = state.scenarios.read().await;
    json_response(
        StatusCode::OK,
        serde_json::json!({
            "currentId": store.current_id(),
            "scenarios": store.list(),
        }),
    )
}

async fn create_scenario_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateScenarioRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection),
    };
    let mut store = state.scenarios.write().await;
    let base_id = request
        .base_id
        .unwrap_or_else(|| store.current_id().to_string());
    match store.create(&request.name, &base_id) {
        Ok(scenario) => json_response(StatusCode::CREATED, scenario),
        Err(err) => scenario_error_response(err),
    }
}

async fn current_scenario_handler(State(state): State<AppState>) -> Response {
    let store = state.scenarios.read().await;
    json_response(StatusCode::OK, store.current())
}

async fn set_current_scenario_handler(
    State(state): State<AppState>,
    payload: Result<Json<SetCurrentRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection),
    };
    let mut store = state.scenarios.write().await;
    match store.set_current(&request.id) {
        Ok(scenario) => json_response(StatusCode::OK, scenario),
        Err(err) => scenario_error_response(err),
    }
}

async fn get_scenario_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let store = state.scenarios.read().await;
    match store.get(&id) {
        Ok(scenario) => json_response(StatusCode::OK, scenario),
        Err(err) => scenario_error_response(err),
    }
}

async fn update_scenario_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ScenarioPatch>, JsonRejection>,
) -> Response {
    let patch = match payload {
        Ok(Json(patch)) => patch,
        Err(rejection) => return rejection_response(rejection),
    };
    if let Some(years) = patch.projection_years {
        if let Err(err) = validate_horizon(years) {
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    }
    let mut store = state.scenarios.write().await;
    match store.update(&id, patch) {
        Ok(scenario) => json_response(StatusCode::OK, scenario),
        Err(err) => scenario_error_response(err),
    }
}

async fn delete_scenario_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let mut store = state.scenarios.write().await;
    match store.delete(&id) {
        Ok(removed) => json_response(StatusCode::OK, removed),
        Err(err) => scenario_error_response(err),
    }
}

async fn compare_scenarios_handler(State(state): State<AppState>) -> Response {
    let store = state.scenarios.read().await;
    json_response(
        StatusCode::OK,
        serde_json::json!({ "scenarios": compare_scenarios(&store) }),
    )
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

fn rejection_response(rejection: JsonRejection) -> Response {
    error_response(StatusCode::BAD_REQUEST, &rejection.body_text())
}

fn scenario_error_response(err: ScenarioError) -> Response {
    let status = match err {
        ScenarioError::NotFound(_) => StatusCode::NOT_FOUND,
        ScenarioError::DefaultNotDeletable(_) => StatusCode::CONFLICT,
    };
    error_response(status, &err.to_string())
}
