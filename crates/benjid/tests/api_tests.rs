//! HTTP surface tests: routes exercised through the router with a fake
//! gateway and an in-memory fact store.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use benjid::config::BenjiConfig;
use benjid::gateway::FakeGateway;
use benjid::server::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_router(fake: Arc<FakeGateway>) -> axum::Router {
    let state = AppState::for_tests(BenjiConfig::default(), fake).unwrap();
    build_router(Arc::new(state))
}

async fn send(router: &axum::Router, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder().method(method).uri(path).body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_ok_and_lists_tools() {
    let router = test_router(Arc::new(FakeGateway::new()));
    let (status, body) = send(&router, "GET", "/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let tools = body["tools"].as_array().unwrap();
    assert!(tools.contains(&json!("goal_classifier")));
}

#[tokio::test]
async fn run_returns_generated_response() {
    let fake = Arc::new(FakeGateway::new());
    fake.push_response("[]"); // optional tool selection
    fake.push_response("Start with three short runs this week.");
    let router = test_router(fake);

    let (status, body) = send(
        &router,
        "POST",
        "/run",
        Some(json!({
            "user_input": "I want to get into running",
            "user_facts": {"goal": "run a 5k", "fitness_level": "beginner"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Start with three short runs this week.");
}

#[tokio::test]
async fn run_surfaces_gateway_outage_as_503() {
    let fake = Arc::new(FakeGateway::new());
    fake.push_error("quota exceeded");
    let router = test_router(fake);

    let (status, _) = send(
        &router,
        "POST",
        "/run",
        Some(json!({"user_input": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn update_facts_merges_into_store() {
    let router = test_router(Arc::new(FakeGateway::new()));

    let (status, body) = send(
        &router,
        "POST",
        "/update_facts",
        Some(json!({"user_id": "u1", "user_facts": {"age": 30, "goal": "build muscle"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["age"], 30);

    let (_, merged) = send(
        &router,
        "POST",
        "/update_facts",
        Some(json!({"user_id": "u1", "user_facts": {"age": 31, "goal": null}})),
    )
    .await;
    assert_eq!(merged["age"], 31);
    assert_eq!(merged["goal"], "build muscle");
}

#[tokio::test]
async fn profile_lifecycle() {
    let router = test_router(Arc::new(FakeGateway::new()));

    let (status, _) = send(&router, "GET", "/profileinfo/u1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &router,
        "POST",
        "/profileinfo/u1",
        Some(json!({"name": "Sam", "age": 30})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &router,
        "PATCH",
        "/profileinfo/u1",
        Some(json!({"age": 31})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Sam");
    assert_eq!(body["age"], 31);
}

#[tokio::test]
async fn goal_generation_persists_and_reads_back() {
    let fake = Arc::new(FakeGateway::always(
        json!({"smart_goals": [{
            "Specific": "Run 3x weekly",
            "Measurable": "3 runs",
            "Attainable": "yes",
            "Relevant": "yes",
            "Time_Bound": "6 weeks",
            "Duration_Days": 42
        }]})
        .to_string(),
    ));
    let router = test_router(fake);

    let (status, body) = send(
        &router,
        "POST",
        "/goals",
        Some(json!({"user_goal": "run a 10k", "user_id": "u1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["smart_goals"][0]["Specific"], "Run 3x weekly");
    // EndDate is computed locally from Duration_Days.
    assert!(body["smart_goals"][0]["EndDate"].is_string());

    let (status, doc) = send(&router, "GET", "/goals/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["generated"][0]["Duration_Days"], 42);
    assert_eq!(doc["schema_version"], 1);
}

#[tokio::test]
async fn accepted_goals_round_trip() {
    let router = test_router(Arc::new(FakeGateway::new()));
    let goal = json!({
        "Specific": "Walk daily",
        "Measurable": "30 minutes",
        "Attainable": "yes",
        "Relevant": "yes",
        "Time_Bound": "ongoing"
    });

    let (status, _) = send(
        &router,
        "POST",
        "/goals/u1/accepted",
        Some(json!({"goals": [goal]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, doc) = send(&router, "GET", "/goals/u1", None).await;
    assert_eq!(doc["accepted"][0]["Specific"], "Walk daily");
}

#[tokio::test]
async fn upcoming_falls_back_to_empty_days() {
    let fake = Arc::new(FakeGateway::always("not json"));
    let router = test_router(fake);

    let (status, body) = send(&router, "POST", "/upcoming", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["upcoming"]["today"], json!([]));
    assert_eq!(body["upcoming"]["tomorrow"], json!([]));
}

#[tokio::test]
async fn checkins_append_and_read_back() {
    let router = test_router(Arc::new(FakeGateway::new()));

    let (status, _) = send(
        &router,
        "POST",
        "/checkins",
        Some(json!({"user_id": "u1", "date": "2026-08-29", "sleep": 4, "stress": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&router, "GET", "/checkins/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    let history = body.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["sleep"], 4.0);
    assert_eq!(history[0]["date"], "2026-08-29");
    assert!(history[0]["id"].is_string());
}

#[tokio::test]
async fn medication_schedule_rules_path() {
    let router = test_router(Arc::new(FakeGateway::new()));
    send(
        &router,
        "POST",
        "/update_facts",
        Some(json!({"user_id": "u1", "user_facts": {"medications": [
            {"name": "Levothyroxine", "frequency": "once daily"},
            {"name": "Metformin", "frequency": "twice daily, with food"}
        ]}})),
    )
    .await;

    let (status, body) = send(&router, "GET", "/medication-schedule/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timeSlots"]["morning"][0], "Levothyroxine");
    assert_eq!(body["foodInstructions"][0], "Metformin: Take with food");
    assert!(body["timeSlotsDetailed"].is_array());
    assert!(!body["timeSlotsDetailed"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn medication_schedule_unknown_user_is_404() {
    let router = test_router(Arc::new(FakeGateway::new()));
    let (status, _) = send(&router, "GET", "/medication-schedule/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ai_schedule_falls_back_to_rules_on_garbage() {
    let fake = Arc::new(FakeGateway::always("no schedule for you"));
    let router = test_router(fake);
    send(
        &router,
        "POST",
        "/update_facts",
        Some(json!({"user_id": "u1", "user_facts": {"medications": [
            {"name": "Metformin", "frequency": "twice daily"}
        ]}})),
    )
    .await;

    let (status, body) = send(&router, "GET", "/medication-schedule/u1?use_ai=true", None).await;
    assert_eq!(status, StatusCode::OK);
    // Deterministic fallback still assigns both doses.
    let detailed = body["timeSlotsDetailed"].as_array().unwrap();
    let assigned: usize = detailed
        .iter()
        .map(|s| s["medications"].as_array().map(Vec::len).unwrap_or(0))
        .sum();
    assert_eq!(assigned, 2);
}

#[tokio::test]
async fn cycle_endpoint_returns_summary_without_flow_data() {
    let router = test_router(Arc::new(FakeGateway::new()));
    send(
        &router,
        "POST",
        "/update_facts",
        Some(json!({"user_id": "u1", "user_facts": {"age": 30}})),
    )
    .await;

    let (status, body) = send(&router, "GET", "/menstrual-recommendations/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["current_phase"].is_null());
    assert_eq!(body["recommendations"], json!([]));
}

#[tokio::test]
async fn cycle_endpoint_computes_phase_from_flow_log() {
    let fake = Arc::new(FakeGateway::always(
        json!({"recommendations": [
            {"icon": "fa-bed", "title": "Rest", "text": "Take it easy."}
        ]})
        .to_string(),
    ));
    let router = test_router(fake);

    let today = chrono::Utc::now().date_naive();
    let start = today - chrono::Duration::days(2);
    let mut flow_log = serde_json::Map::new();
    flow_log.insert(start.format("%Y-%m-%d").to_string(), json!({"flow": "medium"}));
    send(
        &router,
        "POST",
        "/update_facts",
        Some(json!({"user_id": "u1", "user_facts": {"flow_log": flow_log}})),
    )
    .await;

    let (status, body) = send(&router, "GET", "/menstrual-recommendations/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cycle_day"], 3);
    assert_eq!(body["current_phase"], "Menstrual");
    assert_eq!(body["recommendations"][0]["title"], "Rest");
}
