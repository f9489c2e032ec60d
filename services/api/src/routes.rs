use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use serde_json::json;

use sales_bonus::workflows::bonus::{
    bonus_router, BonusWorkflowService, ComputationCache, ExternalHrClient,
    OrderEvaluationRecord, SocialPerformanceRecord,
};

use crate::infra::{AppState, InMemoryRecordsStore};

/// Assemble the full HTTP surface: workflow routes from the core crate,
/// record intake against the in-memory store, and the operational endpoints.
pub(crate) fn with_bonus_routes<H, C>(
    service: Arc<BonusWorkflowService<InMemoryRecordsStore, H, C>>,
    store: Arc<InMemoryRecordsStore>,
) -> Router
where
    H: ExternalHrClient + 'static,
    C: ComputationCache + 'static,
{
    let intake = Router::new()
        .route("/api/v1/records/social", put(put_social_record))
        .route("/api/v1/records/orders", put(put_order_record))
        .with_state(store);

    bonus_router(service)
        .merge(intake)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn put_social_record(
    State(store): State<Arc<InMemoryRecordsStore>>,
    Json(record): Json<SocialPerformanceRecord>,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Err(reason) = record.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "kind": "validation", "error": reason })),
        );
    }

    store.put_social_record(record.clone());
    (StatusCode::OK, Json(json!(record)))
}

pub(crate) async fn put_order_record(
    State(store): State<Arc<InMemoryRecordsStore>>,
    Json(record): Json<OrderEvaluationRecord>,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Err(reason) = record.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "kind": "validation", "error": reason })),
        );
    }

    store.put_order_record(record.clone());
    (StatusCode::OK, Json(json!(record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sales_bonus::workflows::bonus::{EmployeeId, RecordsStore};

    fn social_record(weight: f64) -> SocialPerformanceRecord {
        SocialPerformanceRecord {
            employee_id: EmployeeId("90001".to_string()),
            year: 2025,
            criterion_key: "leadership".to_string(),
            criterion_name: "Leadership Competence".to_string(),
            target_value: 4.0,
            actual_value: 3.0,
            weight,
            supervisor_rating: 4,
            peer_rating: 5,
            computed_bonus_eur: 0.0,
            remark: String::new(),
        }
    }

    #[tokio::test]
    async fn social_intake_upserts_by_criterion() {
        let store = Arc::new(InMemoryRecordsStore::default());

        let (status, _) =
            put_social_record(State(store.clone()), Json(social_record(0.5))).await;
        assert_eq!(status, StatusCode::OK);

        // Same (employee, year, criterion) key replaces rather than appends.
        let (status, _) =
            put_social_record(State(store.clone()), Json(social_record(0.7))).await;
        assert_eq!(status, StatusCode::OK);

        let records = store
            .social_records(&EmployeeId("90001".to_string()), 2025)
            .expect("records load");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].weight, 0.7);
    }

    #[tokio::test]
    async fn social_intake_rejects_out_of_range_weight() {
        let store = Arc::new(InMemoryRecordsStore::default());

        let (status, Json(body)) =
            put_social_record(State(store.clone()), Json(social_record(1.4))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");

        let records = store
            .social_records(&EmployeeId("90001".to_string()), 2025)
            .expect("records load");
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn order_intake_rejects_bad_ranking() {
        let store = Arc::new(InMemoryRecordsStore::default());
        let record = OrderEvaluationRecord {
            employee_id: EmployeeId("90001".to_string()),
            year: 2025,
            order_id: "ORD-1".to_string(),
            product_name: "HooverClean Basic".to_string(),
            client_name: "Fixture GmbH".to_string(),
            client_ranking: 9,
            closing_probability: 0.5,
            items_count: 2,
            revenue_eur: 800.0,
            computed_bonus_eur: 0.0,
            remark: String::new(),
        };

        let (status, Json(body)) = put_order_record(State(store), Json(record)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
    }
}
