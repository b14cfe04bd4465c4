use super::common::*;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::loans::applications::router::{application_router, submit_handler};
use crate::workflows::loans::applications::service::LoanApplicationService;

#[tokio::test]
async fn submit_handler_returns_conflict_on_duplicate() {
    let service = Arc::new(
        LoanApplicationService::new(
            Arc::new(ConflictRepository),
            Arc::new(MemoryNotices::default()),
            policy(),
        )
        .expect("policy validates"),
    );

    let response = submit_handler::<ConflictRepository, MemoryNotices>(
        State(service),
        axum::Json(strong_submission()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn submit_handler_returns_unprocessable_for_missing_field() {
    let service = Arc::new(
        LoanApplicationService::new(
            Arc::new(MemoryRepository::default()),
            Arc::new(MemoryNotices::default()),
            policy(),
        )
        .expect("policy validates"),
    );

    let mut submission = strong_submission();
    submission.credit_score = None;

    let response = submit_handler::<MemoryRepository, MemoryNotices>(
        State(service),
        axum::Json(submission),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let payload: Value = serde_json::from_slice(&bytes).expect("body is json");
    assert_eq!(payload["field"], "credit_score");
}

#[tokio::test]
async fn submit_handler_returns_internal_error_on_repository_failure() {
    let service = Arc::new(
        LoanApplicationService::new(
            Arc::new(UnavailableRepository),
            Arc::new(MemoryNotices::default()),
            policy(),
        )
        .expect("policy validates"),
    );

    let response = submit_handler::<UnavailableRepository, MemoryNotices>(
        State(service),
        axum::Json(strong_submission()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn submit_route_accepts_payloads() {
    let (service, _, _) = build_service();
    let router = application_router(service);

    let response = router
        .oneshot(
            axum::http::Request::post("/api/v1/loans/applications")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&strong_submission()).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let payload: Value = serde_json::from_slice(&bytes).expect("body is json");
    assert_eq!(payload["status"], "submitted");
    assert!(payload["application_id"]
        .as_str()
        .expect("id is a string")
        .starts_with("loan-"));
}

#[tokio::test]
async fn assess_route_returns_full_result() {
    let (service, _, _) = build_service();
    let record = service.submit(strong_submission()).expect("submits");
    let id = record.profile.application_id.0.clone();
    let router = application_router(service);

    let response = router
        .oneshot(
            axum::http::Request::post(format!("/api/v1/loans/applications/{id}/assess"))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let payload: Value = serde_json::from_slice(&bytes).expect("body is json");
    assert_eq!(payload["recommendation"], "approve");
    assert_eq!(payload["overall_risk_level"], "low");
    assert_eq!(payload["metrics"].as_array().expect("metrics array").len(), 5);
}

#[tokio::test]
async fn assess_route_returns_not_found_for_unknown_id() {
    let (service, _, _) = build_service();
    let router = application_router(service);

    let response = router
        .oneshot(
            axum::http::Request::post("/api/v1/loans/applications/loan-999999/assess")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_route_reflects_assessment() {
    let (service, _, _) = build_service();
    let record = service.submit(weak_submission()).expect("submits");
    let id = record.profile.application_id.clone();
    service.assess(&id).expect("assesses");
    let router = application_router(service);

    let response = router
        .oneshot(
            axum::http::Request::get(format!("/api/v1/loans/applications/{}", id.0))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let payload: Value = serde_json::from_slice(&bytes).expect("body is json");
    assert_eq!(payload["status"], "denied");
    assert_eq!(payload["recommendation"], "deny");
}

#[tokio::test]
async fn status_route_returns_not_found_for_unknown_id() {
    let (service, _, _) = build_service();
    let router = application_router(service);

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/loans/applications/loan-999999")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
