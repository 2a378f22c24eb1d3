use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use rotation_api::{create_routes, AppState};
use rotation_dispatcher::{AssignmentEngine, LeadSubmissionCoordinator};
use rotation_testing_utils::{
    fast_rotation_config, numbered_dealers, MockDealerRepository, MockLeadRepository,
    MockNotifier,
};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    dealers: MockDealerRepository,
    leads: MockLeadRepository,
}

fn test_app(dealer_count: usize, notifier: MockNotifier) -> TestApp {
    let dealers = MockDealerRepository::with_dealers(numbered_dealers(dealer_count));
    let leads = MockLeadRepository::new();

    let engine = Arc::new(AssignmentEngine::from_config(
        Arc::new(dealers.clone()),
        &fast_rotation_config(),
    ));
    let coordinator = Arc::new(LeadSubmissionCoordinator::new(
        engine.clone(),
        Arc::new(leads.clone()),
        Arc::new(notifier),
    ));

    let state = AppState {
        coordinator,
        engine,
        dealer_repo: Arc::new(dealers.clone()),
        submit_timeout: Duration::from_secs(5),
        metrics_handle: None,
        metrics_endpoint: "/metrics".to_string(),
    };

    TestApp {
        router: create_routes(state),
        dealers,
        leads,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn lead_body() -> Value {
    json!({
        "full_name": "Dana Levi",
        "id_number": "123456782",
        "email": "dana@example.com",
        "phone": "+972501234567",
        "agreement_accepted": true
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app(2, MockNotifier::new());
    let (status, body) = send(&app.router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["dealers"], 2);
}

#[tokio::test]
async fn test_submit_lead_assigns_first_dealer() {
    let app = test_app(2, MockNotifier::new());

    let (status, body) = send(&app.router, json_request("POST", "/api/leads", lead_body())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["assigned_dealer_display_name"], "Dealer d0");
    assert_eq!(body["data"]["delivery_status"], "DELIVERED");
    assert_eq!(app.dealers.available_ids(), vec!["d1"]);

    let id = body["data"]["submission_id"].as_i64().unwrap();
    let (status, body) = send(&app.router, get(&format!("/api/leads/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["assigned_dealer_id"], "d0");
}

#[tokio::test]
async fn test_submit_lead_with_failed_delivery_is_still_created() {
    let app = test_app(1, MockNotifier::failing());

    let (status, body) = send(&app.router, json_request("POST", "/api/leads", lead_body())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["delivery_status"], "DELIVERY_FAILED");
    assert!(app.dealers.available_ids().is_empty());
}

#[tokio::test]
async fn test_submit_incomplete_lead_is_rejected() {
    let app = test_app(2, MockNotifier::new());
    let mut body = lead_body();
    body["agreement_accepted"] = json!(false);

    let (status, body) = send(&app.router, json_request("POST", "/api/leads", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_LEAD");
    assert_eq!(app.leads.count(), 0);
    assert_eq!(app.dealers.available_ids().len(), 2);
}

#[tokio::test]
async fn test_submit_lead_with_empty_pool() {
    let app = test_app(0, MockNotifier::new());

    let (status, body) = send(&app.router, json_request("POST", "/api/leads", lead_body())).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "POOL_EMPTY");
    assert_eq!(app.leads.count(), 0);
}

#[tokio::test]
async fn test_get_unknown_lead() {
    let app = test_app(1, MockNotifier::new());
    let (status, body) = send(&app.router, get("/api/leads/404")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "LEAD_NOT_FOUND");
}

#[tokio::test]
async fn test_register_list_and_remove_dealer() {
    let app = test_app(1, MockNotifier::new());

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/dealers",
            json!({
                "id": "north-01",
                "display_name": "North Motors",
                "contact_channel": "north@example.com"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["pool_position"], 1);

    let (status, body) = send(&app.router, get("/api/dealers")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["d0", "north-01"]);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/dealers/north-01")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.dealers.snapshot().len(), 1);
}

#[tokio::test]
async fn test_register_duplicate_and_invalid_dealer() {
    let app = test_app(1, MockNotifier::new());

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/dealers",
            json!({"id": "d0", "display_name": "Again", "contact_channel": "x@example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DEALER_ALREADY_EXISTS");

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/dealers",
            json!({"id": "bad id", "display_name": "Bad", "contact_channel": "x@example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_remove_unknown_dealer() {
    let app = test_app(1, MockNotifier::new());
    let request = Request::builder()
        .method("DELETE")
        .uri("/api/dealers/ghost")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "DEALER_NOT_FOUND");
}

#[tokio::test]
async fn test_dealer_leads() {
    let app = test_app(1, MockNotifier::new());
    for _ in 0..2 {
        send(&app.router, json_request("POST", "/api/leads", lead_body())).await;
    }

    let (status, body) = send(&app.router, get("/api/dealers/d0/leads?limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app.router, get("/api/dealers/ghost/leads")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rotation_progress_and_reset() {
    let app = test_app(2, MockNotifier::new());
    send(&app.router, json_request("POST", "/api/leads", lead_body())).await;

    let (status, body) = send(&app.router, get("/api/rotation/progress")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["claimed"], 1);
    assert_eq!(body["data"]["next_dealer_id"], "d1");

    // 池未耗尽时普通重置不生效
    let (status, body) = send(
        &app.router,
        json_request("POST", "/api/rotation/reset", json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reset_count"], 0);

    let (status, body) = send(
        &app.router,
        json_request("POST", "/api/rotation/reset?force=true", json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reset_count"], 1);
    assert_eq!(body["data"]["forced"], true);
    assert_eq!(app.dealers.available_ids().len(), 2);
}

#[tokio::test]
async fn test_metrics_disabled_returns_not_found() {
    let app = test_app(1, MockNotifier::new());
    let (status, _) = send(&app.router, get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
