//! HTTP request handlers for the HR engine API.
//!
//! Every handler authenticates the caller from the identity headers, checks
//! access through the policy, calls one engine operation and maps the result.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::AccessPolicy;
use crate::engine::{BulkOutcome, CalculationOutcome};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AccessLevel, CalculationInput, CalendarEntry, CalendarFilter, Claims, Period, Role,
    SalaryFilter, SalaryLine, SalaryRecord, VacationBalance, VacationFilter, VacationRequest,
};

use super::request::{
    BulkCalculateRequest, CalendarQuery, Caller, CreateSalaryRequest, CreateVacationRequest,
    OpenBalanceRequest, RejectVacationRequest, SalaryListQuery, VacationListQuery,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

type ApiResult<T> = Result<(StatusCode, Json<T>), ApiErrorResponse>;

/// Body returned by the delete endpoints.
#[derive(Debug, Serialize)]
struct Deleted {
    id: u64,
    deleted: bool,
}

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/salaries", post(create_salary).get(list_salaries))
        .route("/salaries/bulk-calculate", post(bulk_calculate))
        .route("/salaries/:id", get(get_salary).delete(delete_salary))
        .route("/salaries/:id/lines", get(salary_lines))
        .route("/salaries/:id/calculate", post(calculate_salary))
        .route("/salaries/:id/approve", post(approve_salary))
        .route("/salaries/:id/pay", post(pay_salary))
        .route("/vacations", post(create_vacation).get(list_vacations))
        .route("/vacations/calendar", get(vacation_calendar))
        .route("/vacations/balance", post(open_balance))
        .route("/vacations/balance/:employee_id/:year", get(get_balance))
        .route("/vacations/:id", get(get_vacation).delete(delete_vacation))
        .route("/vacations/:id/submit", post(submit_vacation))
        .route("/vacations/:id/approve", post(approve_vacation))
        .route("/vacations/:id/reject", post(reject_vacation))
        .route("/vacations/:id/cancel", post(cancel_vacation))
        .with_state(state)
}

/// Generates the correlation id for a request and logs its start.
fn begin(operation: &'static str, claims: &Claims) -> Uuid {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        operation,
        user_id = claims.user_id,
        "Processing request"
    );
    correlation_id
}

/// Logs the outcome of an engine call and turns it into a response.
fn respond<T: Serialize>(
    correlation_id: Uuid,
    operation: &'static str,
    status: StatusCode,
    result: EngineResult<T>,
) -> ApiResult<T> {
    match result {
        Ok(body) => {
            info!(correlation_id = %correlation_id, operation, "Request completed");
            Ok((status, Json(body)))
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                operation,
                error = %err,
                "Request failed"
            );
            Err(err.into())
        }
    }
}

/// Unwraps a JSON body, mapping decode failures to 400 responses.
fn decode<T: DeserializeOwned>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> Result<T, ApiErrorResponse> {
    let rejection = match payload {
        Ok(Json(body)) => return Ok(body),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            ApiError::new("VALIDATION_ERROR", body_text)
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    Err(ApiErrorResponse::bad_request(error))
}

/// Unwraps a query string, mapping decode failures to 400 responses.
fn decode_query<T>(
    query: Result<Query<T>, QueryRejection>,
    correlation_id: Uuid,
) -> Result<T, ApiErrorResponse> {
    query.map(|Query(q)| q).map_err(|rejection| {
        let body_text = rejection.body_text();
        warn!(
            correlation_id = %correlation_id,
            error = %body_text,
            "Invalid query string"
        );
        ApiErrorResponse::bad_request(ApiError::new("INVALID_QUERY", body_text))
    })
}

fn require_privileged(claims: &Claims) -> EngineResult<()> {
    if AccessPolicy::has_any_role(claims, &Role::PRIVILEGED) {
        Ok(())
    } else {
        Err(EngineError::access_denied(format!(
            "user {} lacks an admin or hr role",
            claims.user_id
        )))
    }
}

fn authorize_salary(state: &AppState, claims: &Claims, employee_id: u64) -> EngineResult<()> {
    if state.policy().can_access_salary_data(claims, employee_id)? {
        Ok(())
    } else {
        Err(EngineError::access_denied(format!(
            "user {} may not view salary of employee {}",
            claims.user_id, employee_id
        )))
    }
}

fn authorize_leave(
    state: &AppState,
    claims: &Claims,
    employee_id: u64,
    minimum: AccessLevel,
) -> EngineResult<()> {
    let (allowed, level) = state.policy().can_access_employee_data(claims, employee_id)?;
    if allowed && level >= minimum {
        Ok(())
    } else {
        Err(EngineError::access_denied(format!(
            "user {} may not act on leave of employee {}",
            claims.user_id, employee_id
        )))
    }
}

// Salaries

async fn create_salary(
    State(state): State<AppState>,
    Caller(claims): Caller,
    payload: Result<Json<CreateSalaryRequest>, JsonRejection>,
) -> ApiResult<SalaryRecord> {
    let correlation_id = begin("create_salary", &claims);
    let request = decode(payload, correlation_id)?;

    let result = require_privileged(&claims).and_then(|()| {
        let period = Period::new(request.period_year, request.period_month)?;
        state.compensation().create(request.employee_id, period)
    });
    respond(correlation_id, "create_salary", StatusCode::CREATED, result)
}

async fn list_salaries(
    State(state): State<AppState>,
    Caller(claims): Caller,
    query: Result<Query<SalaryListQuery>, QueryRejection>,
) -> ApiResult<Vec<SalaryRecord>> {
    let correlation_id = begin("list_salaries", &claims);
    let query = decode_query(query, correlation_id)?;

    let result = state
        .policy()
        .salary_query_scope(&claims, query.employee_id)
        .and_then(|scope| {
            state.compensation().list(&SalaryFilter {
                employee_ids: scope.employee_ids(),
                period_year: query.period_year,
                period_month: query.period_month,
                status: query.status,
            })
        });
    respond(correlation_id, "list_salaries", StatusCode::OK, result)
}

async fn get_salary(
    State(state): State<AppState>,
    Caller(claims): Caller,
    Path(id): Path<u64>,
) -> ApiResult<SalaryRecord> {
    let correlation_id = begin("get_salary", &claims);

    let result = state.compensation().get(id).and_then(|record| {
        authorize_salary(&state, &claims, record.employee_id)?;
        Ok(record)
    });
    respond(correlation_id, "get_salary", StatusCode::OK, result)
}

async fn salary_lines(
    State(state): State<AppState>,
    Caller(claims): Caller,
    Path(id): Path<u64>,
) -> ApiResult<Vec<SalaryLine>> {
    let correlation_id = begin("salary_lines", &claims);

    let result = state.compensation().get(id).and_then(|record| {
        authorize_salary(&state, &claims, record.employee_id)?;
        state.compensation().line_items(id)
    });
    respond(correlation_id, "salary_lines", StatusCode::OK, result)
}

async fn calculate_salary(
    State(state): State<AppState>,
    Caller(claims): Caller,
    Path(id): Path<u64>,
    payload: Result<Json<CalculationInput>, JsonRejection>,
) -> ApiResult<CalculationOutcome> {
    let correlation_id = begin("calculate_salary", &claims);
    let input = decode(payload, correlation_id)?;

    let result =
        require_privileged(&claims).and_then(|()| state.compensation().calculate(id, input));
    if let Ok(outcome) = &result {
        if !outcome.unsaved_line_items.is_empty() {
            warn!(
                correlation_id = %correlation_id,
                salary_id = id,
                unsaved = outcome.unsaved_line_items.len(),
                "Calculation committed with unsaved line items"
            );
        }
    }
    respond(correlation_id, "calculate_salary", StatusCode::OK, result)
}

async fn approve_salary(
    State(state): State<AppState>,
    Caller(claims): Caller,
    Path(id): Path<u64>,
) -> ApiResult<SalaryRecord> {
    let correlation_id = begin("approve_salary", &claims);

    let result = require_privileged(&claims)
        .and_then(|()| state.compensation().approve(id, claims.user_id));
    respond(correlation_id, "approve_salary", StatusCode::OK, result)
}

async fn pay_salary(
    State(state): State<AppState>,
    Caller(claims): Caller,
    Path(id): Path<u64>,
) -> ApiResult<SalaryRecord> {
    let correlation_id = begin("pay_salary", &claims);

    let result = require_privileged(&claims).and_then(|()| state.compensation().mark_paid(id));
    respond(correlation_id, "pay_salary", StatusCode::OK, result)
}

async fn delete_salary(
    State(state): State<AppState>,
    Caller(claims): Caller,
    Path(id): Path<u64>,
) -> ApiResult<Deleted> {
    let correlation_id = begin("delete_salary", &claims);

    let result = require_privileged(&claims)
        .and_then(|()| state.compensation().delete(id))
        .map(|()| Deleted { id, deleted: true });
    respond(correlation_id, "delete_salary", StatusCode::OK, result)
}

async fn bulk_calculate(
    State(state): State<AppState>,
    Caller(claims): Caller,
    payload: Result<Json<BulkCalculateRequest>, JsonRejection>,
) -> ApiResult<BulkOutcome> {
    let correlation_id = begin("bulk_calculate", &claims);
    let request = decode(payload, correlation_id)?;

    let prepared = require_privileged(&claims)
        .and_then(|()| Period::new(request.period_year, request.period_month));
    let result = match prepared {
        Ok(period) => {
            let engine = state.compensation().clone();
            let department_id = request.department_id;
            tokio::task::spawn_blocking(move || engine.bulk_calculate(period, department_id))
                .await
                .unwrap_or_else(|e| {
                    Err(EngineError::Store {
                        message: format!("bulk calculation task failed: {}", e),
                    })
                })
        }
        Err(e) => Err(e),
    };
    respond(correlation_id, "bulk_calculate", StatusCode::OK, result)
}

// Vacations

async fn create_vacation(
    State(state): State<AppState>,
    Caller(claims): Caller,
    payload: Result<Json<CreateVacationRequest>, JsonRejection>,
) -> ApiResult<VacationRequest> {
    let correlation_id = begin("create_vacation", &claims);
    let request = decode(payload, correlation_id)?;

    let result = (|| {
        let employee_id = match request.employee_id {
            Some(id) => id,
            None => state
                .policy()
                .own_employee_id(&claims)?
                .ok_or_else(|| EngineError::validation("employee_id", "is required"))?,
        };
        authorize_leave(&state, &claims, employee_id, AccessLevel::OwnRecord)?;
        state.leave().create(request.into_new_request(employee_id))
    })();
    respond(correlation_id, "create_vacation", StatusCode::CREATED, result)
}

async fn list_vacations(
    State(state): State<AppState>,
    Caller(claims): Caller,
    query: Result<Query<VacationListQuery>, QueryRejection>,
) -> ApiResult<Vec<VacationRequest>> {
    let correlation_id = begin("list_vacations", &claims);
    let query = decode_query(query, correlation_id)?;

    let result = state
        .policy()
        .employee_query_scope(&claims, query.employee_id)
        .and_then(|scope| {
            state.leave().list(&VacationFilter {
                employee_ids: scope.employee_ids(),
                status: query.status,
                from: query.from,
                to: query.to,
            })
        });
    respond(correlation_id, "list_vacations", StatusCode::OK, result)
}

async fn get_vacation(
    State(state): State<AppState>,
    Caller(claims): Caller,
    Path(id): Path<u64>,
) -> ApiResult<VacationRequest> {
    let correlation_id = begin("get_vacation", &claims);

    let result = state.leave().get(id).and_then(|vacation| {
        authorize_leave(&state, &claims, vacation.employee_id, AccessLevel::OwnRecord)?;
        Ok(vacation)
    });
    respond(correlation_id, "get_vacation", StatusCode::OK, result)
}

/// Loads a request, checks the caller's level on its employee, then runs `f`.
fn with_vacation<T>(
    state: &AppState,
    claims: &Claims,
    id: u64,
    minimum: AccessLevel,
    f: impl FnOnce() -> EngineResult<T>,
) -> EngineResult<T> {
    let vacation = state.leave().get(id)?;
    authorize_leave(state, claims, vacation.employee_id, minimum)?;
    f()
}

async fn submit_vacation(
    State(state): State<AppState>,
    Caller(claims): Caller,
    Path(id): Path<u64>,
) -> ApiResult<VacationRequest> {
    let correlation_id = begin("submit_vacation", &claims);

    let result = with_vacation(&state, &claims, id, AccessLevel::OwnRecord, || {
        state.leave().submit(id)
    });
    respond(correlation_id, "submit_vacation", StatusCode::OK, result)
}

async fn approve_vacation(
    State(state): State<AppState>,
    Caller(claims): Caller,
    Path(id): Path<u64>,
) -> ApiResult<VacationRequest> {
    let correlation_id = begin("approve_vacation", &claims);

    let result = with_vacation(&state, &claims, id, AccessLevel::Subordinate, || {
        state.leave().approve(id, claims.user_id)
    });
    respond(correlation_id, "approve_vacation", StatusCode::OK, result)
}

async fn reject_vacation(
    State(state): State<AppState>,
    Caller(claims): Caller,
    Path(id): Path<u64>,
    payload: Result<Json<RejectVacationRequest>, JsonRejection>,
) -> ApiResult<VacationRequest> {
    let correlation_id = begin("reject_vacation", &claims);
    let request = decode(payload, correlation_id)?;

    let result = with_vacation(&state, &claims, id, AccessLevel::Subordinate, || {
        state.leave().reject(id, claims.user_id, request.reason)
    });
    respond(correlation_id, "reject_vacation", StatusCode::OK, result)
}

async fn cancel_vacation(
    State(state): State<AppState>,
    Caller(claims): Caller,
    Path(id): Path<u64>,
) -> ApiResult<VacationRequest> {
    let correlation_id = begin("cancel_vacation", &claims);

    let result = with_vacation(&state, &claims, id, AccessLevel::OwnRecord, || {
        state.leave().cancel(id)
    });
    respond(correlation_id, "cancel_vacation", StatusCode::OK, result)
}

async fn delete_vacation(
    State(state): State<AppState>,
    Caller(claims): Caller,
    Path(id): Path<u64>,
) -> ApiResult<Deleted> {
    let correlation_id = begin("delete_vacation", &claims);

    let result = with_vacation(&state, &claims, id, AccessLevel::OwnRecord, || {
        state.leave().delete(id)
    })
    .map(|()| Deleted { id, deleted: true });
    respond(correlation_id, "delete_vacation", StatusCode::OK, result)
}

async fn get_balance(
    State(state): State<AppState>,
    Caller(claims): Caller,
    Path((employee_id, year)): Path<(u64, i32)>,
) -> ApiResult<VacationBalance> {
    let correlation_id = begin("get_balance", &claims);

    let result = authorize_leave(&state, &claims, employee_id, AccessLevel::OwnRecord)
        .and_then(|()| state.leave().get_balance(employee_id, year));
    respond(correlation_id, "get_balance", StatusCode::OK, result)
}

async fn open_balance(
    State(state): State<AppState>,
    Caller(claims): Caller,
    payload: Result<Json<OpenBalanceRequest>, JsonRejection>,
) -> ApiResult<VacationBalance> {
    let correlation_id = begin("open_balance", &claims);
    let request = decode(payload, correlation_id)?;

    let result = require_privileged(&claims).and_then(|()| {
        state
            .leave()
            .open_balance(request.employee_id, request.year, request.carried_over_days)
    });
    respond(correlation_id, "open_balance", StatusCode::CREATED, result)
}

async fn vacation_calendar(
    State(state): State<AppState>,
    Caller(claims): Caller,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> ApiResult<Vec<CalendarEntry>> {
    let correlation_id = begin("vacation_calendar", &claims);
    let query = decode_query(query, correlation_id)?;

    let result = state
        .policy()
        .employee_query_scope(&claims, query.employee_id)
        .and_then(|scope| {
            state.leave().calendar(&CalendarFilter {
                from: query.from,
                to: query.to,
                department_id: query.department_id,
                employee_ids: scope.employee_ids(),
                include_pending: query.include_pending,
            })
        });
    respond(correlation_id, "vacation_calendar", StatusCode::OK, result)
}
