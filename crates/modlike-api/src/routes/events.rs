use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use modlike_core::lifecycle::{self, EventInput, EventStatus};
use modlike_core::AppState;
use modlike_db::events::{EventRow, EventWithOrganizer};
use modlike_db::users;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{require_role, AdminUser, AuthUser};

/// Parse the datetime formats the form widgets actually emit. RFC 3339
/// first, then the `datetime-local` shapes, taken as UTC.
fn parse_datetime(field: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(ApiError::BadRequest(format!(
        "{field} is not a valid date-time: {raw}"
    )))
}

fn parse_capacity(field: &str, raw: &str) -> Result<Option<i64>, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("{field} must be an integer")))
}

/// Raw multipart fields of the event form. Everything arrives as text
/// except the optional image part.
#[derive(Default)]
struct EventForm {
    title: Option<String>,
    start: Option<String>,
    end: Option<String>,
    location: Option<String>,
    max_participant: Option<String>,
    max_staff: Option<String>,
    event_info: Option<String>,
    status: Option<String>,
    image: Option<(String, Vec<u8>)>,
}

async fn read_event_form(mut multipart: Multipart) -> Result<EventForm, ApiError> {
    let mut form = EventForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed form data: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "image" {
            let filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| ApiError::BadRequest("image part is missing a filename".into()))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read image: {e}")))?;
            if !bytes.is_empty() {
                form.image = Some((filename, bytes.to_vec()));
            }
            continue;
        }
        let text = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read field {name}: {e}")))?;
        match name.as_str() {
            "title" => form.title = Some(text),
            "startDateTime" => form.start = Some(text),
            "endDateTime" => form.end = Some(text),
            "location" => form.location = Some(text),
            "maxParticipant" => form.max_participant = Some(text),
            "maxStaff" => form.max_staff = Some(text),
            "eventInfo" => form.event_info = Some(text),
            "status" => form.status = Some(text),
            _ => {}
        }
    }
    Ok(form)
}

fn require_text(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
}

impl EventForm {
    /// Convert the raw form into validated input. `strict_status` is
    /// the update path: an unknown status string is an error rather
    /// than silently clamped.
    fn into_input(self, strict_status: bool) -> Result<EventInput, ApiError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parsed = raw.parse::<EventStatus>();
                match parsed {
                    Ok(status) => Some(status),
                    Err(e) if strict_status => return Err(e.into()),
                    Err(_) => None,
                }
            }
        };

        Ok(EventInput {
            name: require_text(self.title, "title")?,
            starts_at: parse_datetime(
                "startDateTime",
                require_text(self.start, "startDateTime")?.trim(),
            )?,
            ends_at: parse_datetime(
                "endDateTime",
                require_text(self.end, "endDateTime")?.trim(),
            )?,
            max_participants: parse_capacity(
                "maxParticipant",
                self.max_participant.as_deref().unwrap_or(""),
            )?,
            max_staff: parse_capacity("maxStaff", self.max_staff.as_deref().unwrap_or(""))?,
            description: self.event_info.filter(|v| !v.trim().is_empty()),
            location: require_text(self.location, "location")?,
            status,
        })
    }
}

pub(crate) fn event_json(event: &EventRow) -> Value {
    json!({
        "id": event.id,
        "organizer_id": event.organizer_id,
        "title": event.name,
        "startDateTime": event.starts_at.to_rfc3339(),
        "endDateTime": event.ends_at.to_rfc3339(),
        "maxParticipant": event.max_participants,
        "maxStaff": event.max_staff,
        "eventInfo": event.description,
        "location": event.location,
        "status": event.status,
        "image": event.image_path,
        "created_at": event.created_at.to_rfc3339(),
    })
}

pub(crate) fn event_with_org_json(event: &EventWithOrganizer) -> Value {
    json!({
        "id": event.id,
        "organizer_id": event.organizer_id,
        "organizer_name": event.organizer_name,
        "title": event.name,
        "startDateTime": event.starts_at.to_rfc3339(),
        "endDateTime": event.ends_at.to_rfc3339(),
        "maxParticipant": event.max_participants,
        "maxStaff": event.max_staff,
        "eventInfo": event.description,
        "location": event.location,
        "status": event.status,
        "image": event.image_path,
        "created_at": event.created_at.to_rfc3339(),
    })
}

async fn store_form_image(
    state: &AppState,
    image: Option<(String, Vec<u8>)>,
) -> Result<Option<String>, ApiError> {
    match image {
        Some((filename, data)) => {
            let stored = state.images.store_image(&filename, &data).await?;
            Ok(Some(stored.public_path))
        }
        None => Ok(None),
    }
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    require_role(&auth.user, &[users::ROLE_USER])?;

    let mut form = read_event_form(multipart).await?;
    let image = form.image.take();
    let input = form.into_input(false)?;
    lifecycle::validate_input(&input).map_err(ApiError::from)?;

    let image_path = store_form_image(&state, image).await?;
    let result =
        lifecycle::create_event(&state.db, auth.user.id, &input, image_path.as_deref()).await;

    match result {
        Ok(event) => Ok(Json(json!({
            "message": "Event created successfully",
            "event": event_json(&event),
        }))),
        Err(e) => {
            // Don't leave an orphaned file behind a failed insert.
            if let Some(path) = image_path {
                let _ = state.images.delete(&path).await;
            }
            Err(e.into())
        }
    }
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    require_role(&auth.user, &[users::ROLE_USER])?;

    let mut form = read_event_form(multipart).await?;
    let image = form.image.take();
    let input = form.into_input(true)?;
    lifecycle::validate_input(&input).map_err(ApiError::from)?;

    let image_path = store_form_image(&state, image).await?;
    let result =
        lifecycle::update_event(&state.db, id, &auth.user, &input, image_path.as_deref()).await;

    match result {
        Ok(updated) => {
            if let Some(old) = updated.replaced_image.as_deref() {
                if let Err(e) = state.images.delete(old).await {
                    tracing::warn!(path = old, "failed to remove replaced image: {e}");
                }
            }
            Ok(Json(json!({
                "message": "Event updated successfully",
                "event": event_json(&updated.event),
            })))
        }
        Err(e) => {
            if let Some(path) = image_path {
                let _ = state.images.delete(&path).await;
            }
            Err(e.into())
        }
    }
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let event = lifecycle::get_event_checked(&state.db, id, &auth.user).await?;
    Ok(Json(json!({ "event": event_with_org_json(&event) })))
}

pub async fn list_approved(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    require_role(&auth.user, &[users::ROLE_USER, users::ROLE_ADMIN])?;
    let events = modlike_db::events::list_approved(&state.db).await?;
    let events: Vec<Value> = events.iter().map(event_with_org_json).collect();
    Ok(Json(json!({ "events": events })))
}

pub async fn list_mine(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    require_role(&auth.user, &[users::ROLE_USER])?;
    let events = modlike_db::events::list_by_organizer(&state.db, auth.user.id).await?;
    let events: Vec<Value> = events.iter().map(event_json).collect();
    Ok(Json(json!({ "events": events })))
}

pub async fn list_pending(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Value>, ApiError> {
    let events = modlike_db::events::list_pending(&state.db).await?;
    let events: Vec<Value> = events.iter().map(event_with_org_json).collect();
    Ok(Json(json!({ "events": events })))
}

#[derive(Deserialize)]
pub struct ListAllQuery {
    pub status: Option<String>,
}

pub async fn list_all(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ListAllQuery>,
) -> Result<Json<Value>, ApiError> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<EventStatus>().map_err(ApiError::from)?),
    };
    let events =
        modlike_db::events::list_all(&state.db, status.map(|s| s.as_str())).await?;
    let events: Vec<Value> = events.iter().map(event_with_org_json).collect();
    Ok(Json(json!({ "events": events })))
}

pub async fn approve(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let event = lifecycle::approve_event(&state.db, id).await?;
    tracing::info!(event_id = id, admin_id = admin.user.id, "approval recorded");
    Ok(Json(json!({
        "message": "Event approved successfully",
        "event": event_json(&event),
    })))
}

#[derive(Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

pub async fn reject(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<Value>, ApiError> {
    let reason = body.and_then(|Json(b)| b.reason);
    let event = lifecycle::reject_event(&state.db, id, reason.as_deref()).await?;
    tracing::info!(event_id = id, admin_id = admin.user.id, "rejection recorded");
    Ok(Json(json!({
        "message": "Event rejected successfully",
        "event": event_json(&event),
    })))
}

pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    require_role(&auth.user, &[users::ROLE_USER])?;
    let event = lifecycle::cancel_event(&state.db, id, &auth.user).await?;
    Ok(Json(json!({
        "message": "Event cancelled successfully",
        "event": event_json(&event),
    })))
}

pub async fn resubmit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    require_role(&auth.user, &[users::ROLE_USER])?;
    let event = lifecycle::resubmit_event(&state.db, id, &auth.user).await?;
    Ok(Json(json!({
        "message": "Event resubmitted successfully",
        "event": event_json(&event),
    })))
}
