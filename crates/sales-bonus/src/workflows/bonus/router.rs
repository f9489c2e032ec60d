use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::cache::ComputationCache;
use super::domain::EmployeeId;
use super::hr::ExternalHrClient;
use super::repository::{expected_label, RecordsStore, RepositoryError};
use super::service::{BonusServiceError, BonusWorkflowService};

/// Router builder exposing the bonus workflow over HTTP. Actor identity
/// arrives in the request body; authentication sits in front of this service
/// and is out of scope here.
pub fn bonus_router<R, H, C>(service: Arc<BonusWorkflowService<R, H, C>>) -> Router
where
    R: RecordsStore + 'static,
    H: ExternalHrClient + 'static,
    C: ComputationCache + 'static,
{
    Router::new()
        .route(
            "/api/v1/bonus/:employee_id/compute",
            post(compute_handler::<R, H, C>),
        )
        .route("/api/v1/bonus/:employee_id", get(get_handler::<R, H, C>))
        .route(
            "/api/v1/bonus/:employee_id/history",
            get(history_handler::<R, H, C>),
        )
        .route(
            "/api/v1/bonus/:employee_id/remarks",
            post(remark_handler::<R, H, C>),
        )
        .route(
            "/api/v1/bonus/:employee_id/approvals/ceo",
            post(approve_ceo_handler::<R, H, C>),
        )
        .route(
            "/api/v1/bonus/:employee_id/approvals/hr",
            post(approve_hr_handler::<R, H, C>),
        )
        .route(
            "/api/v1/bonus/:employee_id/release",
            post(release_handler::<R, H, C>),
        )
        .route(
            "/api/v1/bonus/:employee_id/confirmation",
            post(confirm_handler::<R, H, C>),
        )
        .with_state(service)
}

fn current_year() -> i32 {
    Utc::now().year()
}

#[derive(Debug, Deserialize)]
pub(crate) struct YearQuery {
    year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorRequest {
    #[serde(default = "current_year")]
    year: i32,
    actor: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReleaseRequest {
    #[serde(default = "current_year")]
    year: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfirmRequest {
    #[serde(default = "current_year")]
    year: i32,
    acting_employee_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemarkRequest {
    #[serde(default = "current_year")]
    year: i32,
    actor: String,
    role: String,
    text: String,
}

type ServiceState<R, H, C> = State<Arc<BonusWorkflowService<R, H, C>>>;

/// Workflow operations are synchronous and may do blocking HTTP (OrangeHRM
/// store, shared cache) up to the configured timeout, so every handler runs
/// them on the blocking pool instead of a tokio worker thread.
async fn run_blocking<T, F>(task: F) -> Result<T, BonusServiceError>
where
    F: FnOnce() -> Result<T, BonusServiceError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result,
        Err(err) => Err(BonusServiceError::Repository(RepositoryError::Unavailable(
            format!("blocking task failed: {err}"),
        ))),
    }
}

fn json_or_error<T: Serialize>(result: Result<T, BonusServiceError>) -> Response {
    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(err) => error_response(&err),
    }
}

pub(crate) async fn compute_handler<R, H, C>(
    State(service): ServiceState<R, H, C>,
    Path(employee_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    R: RecordsStore + 'static,
    H: ExternalHrClient + 'static,
    C: ComputationCache + 'static,
{
    let employee_id = EmployeeId(employee_id);
    let result =
        run_blocking(move || service.compute(&employee_id, request.year, &request.actor)).await;
    json_or_error(result)
}

pub(crate) async fn get_handler<R, H, C>(
    State(service): ServiceState<R, H, C>,
    Path(employee_id): Path<String>,
    Query(query): Query<YearQuery>,
) -> Response
where
    R: RecordsStore + 'static,
    H: ExternalHrClient + 'static,
    C: ComputationCache + 'static,
{
    let employee_id = EmployeeId(employee_id);
    let year = query.year.unwrap_or_else(current_year);
    let result = run_blocking(move || service.get(&employee_id, year)).await;
    json_or_error(result)
}

pub(crate) async fn history_handler<R, H, C>(
    State(service): ServiceState<R, H, C>,
    Path(employee_id): Path<String>,
) -> Response
where
    R: RecordsStore + 'static,
    H: ExternalHrClient + 'static,
    C: ComputationCache + 'static,
{
    let employee_id = EmployeeId(employee_id);
    let result = run_blocking(move || service.history(&employee_id)).await;
    json_or_error(result)
}

pub(crate) async fn remark_handler<R, H, C>(
    State(service): ServiceState<R, H, C>,
    Path(employee_id): Path<String>,
    Json(request): Json<RemarkRequest>,
) -> Response
where
    R: RecordsStore + 'static,
    H: ExternalHrClient + 'static,
    C: ComputationCache + 'static,
{
    let employee_id = EmployeeId(employee_id);
    let result = run_blocking(move || {
        service.add_remark(
            &employee_id,
            request.year,
            &request.actor,
            &request.role,
            &request.text,
        )
    })
    .await;
    json_or_error(result)
}

pub(crate) async fn approve_ceo_handler<R, H, C>(
    State(service): ServiceState<R, H, C>,
    Path(employee_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    R: RecordsStore + 'static,
    H: ExternalHrClient + 'static,
    C: ComputationCache + 'static,
{
    let employee_id = EmployeeId(employee_id);
    let result =
        run_blocking(move || service.approve_ceo(&employee_id, request.year, &request.actor)).await;
    json_or_error(result)
}

pub(crate) async fn approve_hr_handler<R, H, C>(
    State(service): ServiceState<R, H, C>,
    Path(employee_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    R: RecordsStore + 'static,
    H: ExternalHrClient + 'static,
    C: ComputationCache + 'static,
{
    let employee_id = EmployeeId(employee_id);
    let result = run_blocking(move || {
        service.approve_hr_and_store(&employee_id, request.year, &request.actor)
    })
    .await;
    json_or_error(result)
}

pub(crate) async fn release_handler<R, H, C>(
    State(service): ServiceState<R, H, C>,
    Path(employee_id): Path<String>,
    Json(request): Json<ReleaseRequest>,
) -> Response
where
    R: RecordsStore + 'static,
    H: ExternalHrClient + 'static,
    C: ComputationCache + 'static,
{
    let employee_id = EmployeeId(employee_id);
    let result = run_blocking(move || service.release(&employee_id, request.year)).await;
    json_or_error(result)
}

pub(crate) async fn confirm_handler<R, H, C>(
    State(service): ServiceState<R, H, C>,
    Path(employee_id): Path<String>,
    Json(request): Json<ConfirmRequest>,
) -> Response
where
    R: RecordsStore + 'static,
    H: ExternalHrClient + 'static,
    C: ComputationCache + 'static,
{
    let employee_id = EmployeeId(employee_id);
    let acting = EmployeeId(request.acting_employee_id);
    let result = run_blocking(move || service.confirm(&employee_id, request.year, &acting)).await;
    json_or_error(result)
}

/// Map the service taxonomy onto HTTP. The payload always carries `kind` and
/// `error`; conflicts additionally spell out expected vs. actual status so
/// clients can render a precise message. No stack detail leaves the service.
pub(crate) fn error_response(err: &BonusServiceError) -> Response {
    let (status, kind) = match err {
        BonusServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
        BonusServiceError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        BonusServiceError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
        BonusServiceError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
        BonusServiceError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream"),
        BonusServiceError::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, "repository"),
    };

    let mut payload = json!({
        "kind": kind,
        "error": err.to_string(),
    });

    if let BonusServiceError::Conflict { expected, actual } = err {
        payload["expected"] = json!(expected_label(expected));
        payload["actual"] = json!(actual.label());
    }

    (status, Json(payload)).into_response()
}
