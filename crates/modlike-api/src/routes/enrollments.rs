use axum::{
    extract::{Path, State},
    Json,
};
use modlike_core::{enrollment, AppState};
use modlike_db::users;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{require_role, AuthUser};
use crate::routes::events::{event_json, event_with_org_json};

pub async fn enroll(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    require_role(&auth.user, &[users::ROLE_USER])?;
    enrollment::enroll(&state.db, id, &auth.user).await?;
    Ok(Json(json!({ "message": "Successfully enrolled" })))
}

/// Detail view for the enroll page: the event plus the caller's
/// enrollment state and whether a seat is still open.
pub async fn detail(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let detail = enrollment::event_detail(&state.db, id, &auth.user).await?;
    Ok(Json(json!({
        "event": event_with_org_json(&detail.event),
        "currentParticipants": detail.current_participants,
        "isEnrolled": detail.is_enrolled,
        "canEnroll": detail.can_enroll,
    })))
}

pub async fn list_enrolled(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    require_role(&auth.user, &[users::ROLE_USER])?;
    let events = enrollment::list_enrolled(&state.db, &auth.user).await?;
    let events: Vec<Value> = events.iter().map(event_json).collect();
    Ok(Json(json!({ "events": events })))
}
