//! API routes for benjid
//!
//! Route groups mirror the frontend surface: chat, profile, goals, plans,
//! check-ins, medication schedules, cycle recommendations. Structured
//! endpoints always answer with a well-typed (possibly empty) body; only a
//! gateway outage surfaces as an error status.

use crate::generators::{cycle, schedule, smart_goals, upcoming};
use crate::gateway::GatewayError;
use crate::orchestrator::Session;
use crate::server::AppState;
use crate::store;
use crate::tools::medication::assign_time_slots;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use benji_common::{CheckIn, FactBundle, SmartGoal, Versioned};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

type AppStateArc = Arc<AppState>;
type ApiError = (StatusCode, String);

fn store_error(e: anyhow::Error) -> ApiError {
    error!("  Fact store failure: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "fact store failure".to_string())
}

/// Gateway outages are the one failure structured endpoints surface.
fn gateway_error(e: GatewayError) -> ApiError {
    error!("  LLM gateway failure: {}", e);
    (StatusCode::SERVICE_UNAVAILABLE, "assistant temporarily unavailable".to_string())
}

fn not_found(what: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("{} not found", what))
}

/// Load the user's bundle and fold in check-in context so the wellness tools
/// have something to read.
fn load_bundle(state: &AppState, user_id: &str) -> anyhow::Result<FactBundle> {
    let mut bundle = state.store.facts(user_id)?;
    if let Some(Value::Array(history)) = state.store.get(user_id, store::CHECKINS)? {
        if let Some(latest) = history.last() {
            bundle.insert("latest_checkin", latest.clone());
        }
        bundle.insert("checkin_history", Value::Array(history));
    }
    Ok(bundle)
}

// ============================================================================
// Chat Routes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub user_input: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_facts: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFactsRequest {
    pub user_id: String,
    pub user_facts: Value,
}

pub fn chat_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/run", post(run_agent))
        .route("/update_facts", post(update_facts))
}

/// Full orchestration pipeline for one chat message.
async fn run_agent(
    State(state): State<AppStateArc>,
    Json(req): Json<RunRequest>,
) -> Result<Json<Value>, ApiError> {
    info!("  /run ({} chars)", req.user_input.len());

    let bundle = match &req.user_id {
        Some(user_id) => load_bundle(&state, user_id).map_err(store_error)?,
        None => FactBundle::new(),
    };

    let mut session = Session::new(
        state.gateway.as_ref(),
        bundle,
        state.config.llm.fact_excerpt_chars,
    );
    if let Some(facts) = &req.user_facts {
        session.merge_facts(facts);
    }

    let response = session.respond(&req.user_input).await.map_err(gateway_error)?;
    Ok(Json(json!({"response": response})))
}

async fn update_facts(
    State(state): State<AppStateArc>,
    Json(req): Json<UpdateFactsRequest>,
) -> Result<Json<Value>, ApiError> {
    let merged = state
        .store
        .merge(&req.user_id, store::FACTS, &req.user_facts)
        .map_err(store_error)?;
    Ok(Json(merged))
}

// ============================================================================
// Profile Routes
// ============================================================================

pub fn profile_routes() -> Router<AppStateArc> {
    Router::new()
        .route(
            "/profileinfo/:user_id",
            get(get_profile).post(put_profile).patch(patch_profile),
        )
}

async fn get_profile(
    State(state): State<AppStateArc>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .get(&user_id, store::PROFILE)
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| not_found("profile"))
}

async fn put_profile(
    State(state): State<AppStateArc>,
    Path(user_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .put(&user_id, store::PROFILE, &body)
        .map_err(store_error)?;
    Ok(Json(body))
}

/// Shallow merge, so a partial edit never erases the rest of the profile.
async fn patch_profile(
    State(state): State<AppStateArc>,
    Path(user_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    if state
        .store
        .get(&user_id, store::PROFILE)
        .map_err(store_error)?
        .is_none()
    {
        return Err(not_found("profile"));
    }
    let merged = state
        .store
        .merge(&user_id, store::PROFILE, &body)
        .map_err(store_error)?;
    Ok(Json(merged))
}

// ============================================================================
// Goal Routes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateGoalsRequest {
    pub user_goal: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_facts: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct AcceptGoalsRequest {
    pub goals: Vec<SmartGoal>,
}

pub fn goal_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/goals", post(generate_goals))
        .route("/goals/:user_id", get(get_goals))
        .route("/goals/:user_id/accepted", post(accept_goals))
}

async fn generate_goals(
    State(state): State<AppStateArc>,
    Json(req): Json<GenerateGoalsRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut bundle = match &req.user_id {
        Some(user_id) => state.store.facts(user_id).map_err(store_error)?,
        None => FactBundle::new(),
    };
    if let Some(facts) = &req.user_facts {
        bundle.merge(facts);
    }

    let outcome = smart_goals::generate(
        state.gateway.as_ref(),
        &req.user_goal,
        &bundle,
        state.config.llm.fact_excerpt_chars,
    )
    .await;
    let goals = outcome.into_inner();

    if let Some(user_id) = &req.user_id {
        let existing = state
            .store
            .get(user_id, store::GOALS)
            .map_err(store_error)?
            .unwrap_or_else(|| json!({"accepted": [], "generated": []}));
        let mut doc = existing;
        doc["generated"] = serde_json::to_value(&goals).unwrap_or_else(|_| json!([]));
        let versioned = serde_json::to_value(Versioned::new(doc)).unwrap_or_default();
        state
            .store
            .put(user_id, store::GOALS, &versioned)
            .map_err(store_error)?;
    }

    Ok(Json(json!({"smart_goals": goals})))
}

async fn get_goals(
    State(state): State<AppStateArc>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .get(&user_id, store::GOALS)
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| not_found("goals"))
}

async fn accept_goals(
    State(state): State<AppStateArc>,
    Path(user_id): Path<String>,
    Json(req): Json<AcceptGoalsRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut doc = state
        .store
        .get(&user_id, store::GOALS)
        .map_err(store_error)?
        .unwrap_or_else(|| json!({"accepted": [], "generated": []}));
    doc["accepted"] = serde_json::to_value(&req.goals).unwrap_or_else(|_| json!([]));
    let versioned = serde_json::to_value(Versioned::new(doc)).unwrap_or_default();
    state
        .store
        .put(&user_id, store::GOALS, &versioned)
        .map_err(store_error)?;
    Ok(Json(versioned))
}

// ============================================================================
// Plan Routes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpcomingRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_facts: Option<Value>,
    #[serde(default)]
    pub smart_goals: Option<Vec<SmartGoal>>,
}

pub fn plan_routes() -> Router<AppStateArc> {
    Router::new().route("/upcoming", post(generate_upcoming))
}

async fn generate_upcoming(
    State(state): State<AppStateArc>,
    Json(req): Json<UpcomingRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut bundle = match &req.user_id {
        Some(user_id) => state.store.facts(user_id).map_err(store_error)?,
        None => FactBundle::new(),
    };
    if let Some(facts) = &req.user_facts {
        bundle.merge(facts);
    }

    // Prefer goals from the request; fall back to the stored accepted list.
    let goals = match req.smart_goals {
        Some(goals) => goals,
        None => match &req.user_id {
            Some(user_id) => state
                .store
                .get(user_id, store::GOALS)
                .map_err(store_error)?
                .and_then(|doc| {
                    serde_json::from_value::<Vec<SmartGoal>>(doc.get("accepted")?.clone()).ok()
                })
                .unwrap_or_default(),
            None => Vec::new(),
        },
    };

    let plan = upcoming::generate(
        state.gateway.as_ref(),
        &bundle,
        &goals,
        state.config.llm.fact_excerpt_chars,
    )
    .await
    .into_inner();
    Ok(Json(json!({"upcoming": plan})))
}

// ============================================================================
// Check-in Routes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckinRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub entry: Value,
}

pub fn checkin_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/checkins", post(save_checkin))
        .route("/checkins/:user_id", get(get_checkins))
        .route("/checkin-recommendations", post(checkin_recommendations))
}

async fn save_checkin(
    State(state): State<AppStateArc>,
    Json(req): Json<CheckinRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut history = match state
        .store
        .get(&req.user_id, store::CHECKINS)
        .map_err(store_error)?
    {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    let mut checkin: CheckIn = serde_json::from_value(req.entry)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid check-in: {}", e)))?;
    if checkin.date.is_empty() {
        checkin.date = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    }
    let mut entry = serde_json::to_value(&checkin).unwrap_or_else(|_| json!({}));
    if let Value::Object(map) = &mut entry {
        map.entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
    }
    history.push(entry);
    let doc = Value::Array(history);
    state
        .store
        .put(&req.user_id, store::CHECKINS, &doc)
        .map_err(store_error)?;
    Ok(Json(doc))
}

async fn get_checkins(
    State(state): State<AppStateArc>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .get(&user_id, store::CHECKINS)
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| not_found("check-ins"))
}

#[derive(Debug, Deserialize)]
pub struct CheckinRecommendationsRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub checkin: Option<Value>,
}

/// Short advice generated from the latest check-in plus trends.
async fn checkin_recommendations(
    State(state): State<AppStateArc>,
    Json(req): Json<CheckinRecommendationsRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut bundle = match &req.user_id {
        Some(user_id) => load_bundle(&state, user_id).map_err(store_error)?,
        None => FactBundle::new(),
    };
    if let Some(checkin) = req.checkin {
        bundle.insert("latest_checkin", checkin);
    }

    let mut session = Session::new(
        state.gateway.as_ref(),
        bundle,
        state.config.llm.fact_excerpt_chars,
    );
    let mut results = session.run_mandatory_tools();
    let wellness: Vec<String> = ["checkin_score", "trend_analysis"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    results.extend(session.run_optional_tools(&wellness));

    let context = session.build_context(
        "Give me 2-3 short, practical recommendations based on my latest check-in.",
        &results,
    );
    let response = session.generate(&context).await.map_err(gateway_error)?;
    Ok(Json(json!({"response": response})))
}

// ============================================================================
// Medication Routes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    #[serde(default)]
    pub use_ai: bool,
}

pub fn medication_routes() -> Router<AppStateArc> {
    Router::new().route("/medication-schedule/:user_id", get(medication_schedule))
}

/// Deterministic schedule by default; `?use_ai=true` runs the AI generator
/// whose validation gate falls back to the deterministic schedule.
async fn medication_schedule(
    State(state): State<AppStateArc>,
    Path(user_id): Path<String>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Value>, ApiError> {
    if state
        .store
        .get(&user_id, store::FACTS)
        .map_err(store_error)?
        .is_none()
    {
        return Err(not_found("user facts"));
    }
    let bundle = state.store.facts(&user_id).map_err(store_error)?;
    let medications = bundle.medications();

    let rules = assign_time_slots(&medications);
    let mut body = serde_json::to_value(&rules).unwrap_or_else(|_| json!({}));

    let detailed = if query.use_ai {
        schedule::generate(
            state.gateway.as_ref(),
            &medications,
            &rules.warnings,
            &rules.food_instructions,
        )
        .await
        .into_inner()
    } else {
        schedule::deterministic_schedule(&medications)
    };

    body["timeSlotsDetailed"] =
        serde_json::to_value(&detailed.time_slots).unwrap_or_else(|_| json!([]));
    body["personalizationNotes"] = detailed
        .personalization_notes
        .map(Value::String)
        .unwrap_or(Value::Null);
    Ok(Json(body))
}

// ============================================================================
// Cycle Routes
// ============================================================================

pub fn cycle_routes() -> Router<AppStateArc> {
    Router::new().route("/menstrual-recommendations/:user_id", get(menstrual_recommendations))
}

async fn menstrual_recommendations(
    State(state): State<AppStateArc>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let bundle = state.store.facts(&user_id).map_err(store_error)?;
    let flow_log = bundle.get("flow_log").cloned().unwrap_or(json!({}));

    let summary = cycle::generate(
        state.gateway.as_ref(),
        &flow_log,
        Utc::now().date_naive(),
    )
    .await
    .into_inner();
    Ok(Json(serde_json::to_value(&summary).unwrap_or_else(|_| json!({}))))
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health))
}

async fn health(State(state): State<AppStateArc>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.config.llm.model,
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "tools": crate::tools::ToolRegistry::standard().names(),
    }))
}
