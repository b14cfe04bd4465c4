use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{ApplicationId, LoanApplicationSubmission};
use super::repository::{ApplicationRepository, NoticePublisher, RepositoryError};
use super::service::{LoanApplicationService, LoanServiceError};

/// Router builder exposing HTTP endpoints for intake, assessment, and status.
pub fn application_router<R, N>(service: Arc<LoanApplicationService<R, N>>) -> Router
where
    R: ApplicationRepository + 'static,
    N: NoticePublisher + 'static,
{
    Router::new()
        .route("/api/v1/loans/applications", post(submit_handler::<R, N>))
        .route(
            "/api/v1/loans/applications/:application_id/assess",
            post(assess_handler::<R, N>),
        )
        .route(
            "/api/v1/loans/applications/:application_id",
            get(status_handler::<R, N>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<R, N>(
    State(service): State<Arc<LoanApplicationService<R, N>>>,
    axum::Json(submission): axum::Json<LoanApplicationSubmission>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NoticePublisher + 'static,
{
    match service.submit(submission) {
        Ok(record) => {
            let view = record.status_view();
            (StatusCode::ACCEPTED, axum::Json(view)).into_response()
        }
        Err(LoanServiceError::Intake(error)) => {
            let payload = json!({
                "error": error.to_string(),
                "field": error.field(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(LoanServiceError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({
                "error": "application already exists",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn assess_handler<R, N>(
    State(service): State<Arc<LoanApplicationService<R, N>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NoticePublisher + 'static,
{
    let id = ApplicationId(application_id);
    match service.assess(&id) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(LoanServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": "application not found",
                "application_id": id.0,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn status_handler<R, N>(
    State(service): State<Arc<LoanApplicationService<R, N>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NoticePublisher + 'static,
{
    let id = ApplicationId(application_id);
    match service.get(&id) {
        Ok(record) => {
            let view = record.status_view();
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(LoanServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": "application not found",
                "application_id": id.0,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
