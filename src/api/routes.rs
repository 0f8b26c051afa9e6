//! API route definitions.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::state::AppState;
use super::ApiError;
use crate::meeting::{JoinRequest, Meeting};
use crate::roster::RosterEntry;

type ApiResult = Result<Json<Value>, ApiError>;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/meetings", get(list_meetings).post(open_meeting))
        .route("/meetings/{id}", get(meeting_info).delete(close_meeting))
        .route("/meetings/{id}/roster", get(get_roster).put(put_roster))
        .route(
            "/meetings/{id}/attendance",
            get(list_attendance).post(take_attendance),
        )
        .route("/meetings/{id}/session", get(session_view))
        .route("/meetings/{id}/session/{action}", post(session_action))
        .route("/meetings/{id}/auto", get(auto_status))
        .route("/meetings/{id}/auto/start", post(auto_start))
        .route("/meetings/{id}/auto/stop", post(auto_stop))
        .route("/meetings/{id}/auto/interval", put(auto_interval))
        .route("/meetings/{id}/export.csv", get(export_csv))
}

fn envelope<T: Serialize>(data: T, meta: Value) -> ApiResult {
    Ok(Json(json!({ "data": data, "meta": meta })))
}

async fn lookup(state: &AppState, id: &str) -> Result<Meeting, ApiError> {
    state
        .meetings
        .get(id)
        .await
        .ok_or_else(|| ApiError::MeetingNotFound(id.to_string()))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let uptime = chrono::Utc::now() - state.started_at;
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_secs": uptime.num_seconds(),
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

async fn list_meetings(State(state): State<AppState>) -> ApiResult {
    let ids = state.meetings.list().await;
    let total = ids.len();
    envelope(ids, json!({ "total": total }))
}

async fn open_meeting(State(state): State<AppState>, Json(req): Json<JoinRequest>) -> ApiResult {
    let meeting = state.meetings.open(req).await?;
    envelope(meeting.info(), json!({ "roster": meeting.roster() }))
}

async fn meeting_info(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let meeting = lookup(&state, &id).await?;
    envelope(
        meeting.info(),
        json!({ "connection": meeting.connection_status() }),
    )
}

async fn close_meeting(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if !state.meetings.close(&id).await {
        return Err(ApiError::MeetingNotFound(id));
    }
    envelope(json!({ "closed": id }), json!({}))
}

async fn get_roster(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let roster = lookup(&state, &id).await?.roster();
    let total = roster.len();
    envelope(roster, json!({ "total": total }))
}

async fn put_roster(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(snapshot): Json<Vec<RosterEntry>>,
) -> ApiResult {
    let roster = lookup(&state, &id).await?.update_roster(snapshot);
    let total = roster.len();
    envelope(roster, json!({ "total": total }))
}

async fn list_attendance(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let records = lookup(&state, &id).await?.records();
    let total = records.len();
    envelope(records, json!({ "total": total }))
}

#[derive(Debug, Deserialize)]
struct TakeAttendance {
    target: String,
}

async fn take_attendance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<TakeAttendance>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let meeting = lookup(&state, &id).await?;
    let session = meeting.take_attendance(&body.target)?;
    let Json(body) = envelope(
        json!({ "session": session, "view": meeting.session_view() }),
        json!({}),
    )?;
    Ok((StatusCode::ACCEPTED, Json(body)))
}

async fn session_view(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let meeting = lookup(&state, &id).await?;
    envelope(meeting.session_view(), json!({}))
}

async fn session_action(
    State(state): State<AppState>,
    Path((id, action)): Path<(String, String)>,
) -> Result<axum::response::Response, ApiError> {
    let meeting = lookup(&state, &id).await?;
    match action.as_str() {
        "verify" => meeting.verify_now().await?,
        "retry" => meeting.retry().await?,
        "retry-device" => meeting.retry_device().await?,
        "cancel" => meeting.cancel().await?,
        _ => return Ok((StatusCode::NOT_FOUND, "not found").into_response()),
    }
    Ok(envelope(meeting.session_view(), json!({ "action": action }))?.into_response())
}

async fn auto_status(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let meeting = lookup(&state, &id).await?;
    envelope(meeting.auto_status(), json!({}))
}

async fn auto_start(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let meeting = lookup(&state, &id).await?;
    let started = meeting.start_auto()?;
    envelope(meeting.auto_status(), json!({ "started": started }))
}

async fn auto_stop(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let meeting = lookup(&state, &id).await?;
    meeting.stop_auto()?;
    envelope(meeting.auto_status(), json!({}))
}

#[derive(Debug, Deserialize)]
struct SetInterval {
    interval_secs: u64,
}

async fn auto_interval(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SetInterval>,
) -> ApiResult {
    let meeting = lookup(&state, &id).await?;
    meeting.set_auto_interval(body.interval_secs)?;
    envelope(meeting.auto_status(), json!({}))
}

async fn export_csv(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let meeting = lookup(&state, &id).await?;
    let (filename, csv) = meeting.export_csv()?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}
