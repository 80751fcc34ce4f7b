// HTTP surface.
//
// One public read endpoint (`/api/v1/display-state`) polled by the screens,
// plus the admin CRUD the back office uses to manage schedules and videos.
// All store calls run on the blocking pool.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::warn;
use uuid::Uuid;

use crate::config::Clock;
use crate::db::{
    Database, NewSchedule, NewVideo, SchedulePatch, ScheduleStore, StoreError, VideoLibrary,
    VideoPatch,
};
use crate::model::{ScheduleRecord, Video, VideoCategory};
use crate::state::StateComputer;

#[derive(Clone)]
pub struct AppState {
    pub version: String,
    pub db: Database,
    pub computer: StateComputer,
    pub clock: Clock,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let status = match &e {
            StoreError::DuplicateDate(_) => StatusCode::CONFLICT,
            StoreError::InvalidSchedule(_) | StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Backend(_) => {
                warn!("store failure: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({"ok": false, "error": self.message}))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Run a store call on the blocking pool.
async fn blocking<T, F>(db: &Database, f: F) -> ApiResult<T>
where
    F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| ApiError::internal(format!("store task failed: {e}")))?
        .map_err(ApiError::from)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "OK" }))
        .route("/api/v1/ping", get(ping))
        .route("/api/v1/display-state", get(display_state))
        .route("/api/v1/tvc-videos", get(list_tvc).post(create_tvc))
        .route("/api/v1/tvc-videos/:id", put(update_tvc).delete(delete_tvc))
        .route("/api/v1/berbuka-videos", get(list_berbuka).post(create_berbuka))
        .route("/api/v1/berbuka-videos/:id", put(update_berbuka).delete(delete_berbuka))
        .route("/api/v1/schedules", get(list_schedules).post(create_schedule))
        .route("/api/v1/schedules/bulk", post(create_schedules_bulk))
        .route("/api/v1/schedules/:id", put(update_schedule).delete(delete_schedule))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "Signage engine is running. Screens poll /api/v1/display-state"
}

async fn ping(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "ok": true,
        "version": state.version,
        "features": ["display-state", "schedules", "videos"]
    }))
}

async fn display_state(State(state): State<AppState>) -> Result<Response, StatusCode> {
    let now = state.clock.now();
    let today = now.date();

    let loaded = blocking(&state.db, move |db| {
        let schedule = db.get_schedule(today)?;
        let tvc = db.list_active_videos(VideoCategory::Tvc)?;
        let berbuka = db.list_active_videos(VideoCategory::Berbuka)?.into_iter().next();
        Ok((schedule, tvc, berbuka))
    })
    .await;

    // The screens keep their last snapshot on a failed poll, so a 503 is
    // better than a made-up default here.
    let (schedule, tvc, berbuka) = loaded.map_err(|e| {
        warn!("display-state unavailable: {}", e.message);
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    let snapshot = state
        .computer
        .compute(now, schedule.as_ref(), &tvc, berbuka.as_ref());

    Ok(([(header::CACHE_CONTROL, "no-store")], Json(snapshot)).into_response())
}

// --- Videos ---------------------------------------------------------------

async fn list_videos(state: AppState, category: VideoCategory) -> ApiResult<Json<Vec<Video>>> {
    let videos = blocking(&state.db, move |db| db.list_videos(category)).await?;
    Ok(Json(videos))
}

async fn create_video(
    state: AppState,
    category: VideoCategory,
    new: NewVideo,
) -> ApiResult<Json<Video>> {
    let video = blocking(&state.db, move |db| db.create_video(category, new)).await?;
    Ok(Json(video))
}

async fn update_video(
    state: AppState,
    category: VideoCategory,
    id: Uuid,
    patch: VideoPatch,
) -> ApiResult<Json<Video>> {
    let video = blocking(&state.db, move |db| db.update_video(category, id, patch)).await?;
    Ok(Json(video))
}

async fn delete_video(
    state: AppState,
    category: VideoCategory,
    id: Uuid,
) -> ApiResult<Json<serde_json::Value>> {
    blocking(&state.db, move |db| db.delete_video(category, id)).await?;
    Ok(Json(json!({"ok": true})))
}

async fn list_tvc(State(state): State<AppState>) -> ApiResult<Json<Vec<Video>>> {
    list_videos(state, VideoCategory::Tvc).await
}

async fn create_tvc(
    State(state): State<AppState>,
    Json(new): Json<NewVideo>,
) -> ApiResult<Json<Video>> {
    create_video(state, VideoCategory::Tvc, new).await
}

async fn update_tvc(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<VideoPatch>,
) -> ApiResult<Json<Video>> {
    update_video(state, VideoCategory::Tvc, id, patch).await
}

async fn delete_tvc(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    delete_video(state, VideoCategory::Tvc, id).await
}

async fn list_berbuka(State(state): State<AppState>) -> ApiResult<Json<Vec<Video>>> {
    list_videos(state, VideoCategory::Berbuka).await
}

async fn create_berbuka(
    State(state): State<AppState>,
    Json(new): Json<NewVideo>,
) -> ApiResult<Json<Video>> {
    create_video(state, VideoCategory::Berbuka, new).await
}

async fn update_berbuka(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<VideoPatch>,
) -> ApiResult<Json<Video>> {
    update_video(state, VideoCategory::Berbuka, id, patch).await
}

async fn delete_berbuka(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    delete_video(state, VideoCategory::Berbuka, id).await
}

// --- Schedules ------------------------------------------------------------

async fn list_schedules(State(state): State<AppState>) -> ApiResult<Json<Vec<ScheduleRecord>>> {
    let records = blocking(&state.db, |db| db.list_schedules()).await?;
    Ok(Json(records))
}

async fn create_schedule(
    State(state): State<AppState>,
    Json(new): Json<NewSchedule>,
) -> ApiResult<Json<ScheduleRecord>> {
    let record = blocking(&state.db, move |db| db.create_schedule(new)).await?;
    Ok(Json(record))
}

async fn create_schedules_bulk(
    State(state): State<AppState>,
    Json(batch): Json<Vec<NewSchedule>>,
) -> ApiResult<Json<Vec<ScheduleRecord>>> {
    let created = blocking(&state.db, move |db| db.create_schedules(batch)).await?;
    Ok(Json(created))
}

async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<SchedulePatch>,
) -> ApiResult<Json<ScheduleRecord>> {
    let record = blocking(&state.db, move |db| db.update_schedule(id, patch)).await?;
    Ok(Json(record))
}

async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    blocking(&state.db, move |db| db.delete_schedule(id)).await?;
    Ok(Json(json!({"ok": true})))
}
