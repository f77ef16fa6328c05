use chrono::{DateTime, Utc};
use modlike_db::events::{self, EventRow, EventWithOrganizer};
use modlike_db::users::UserRow;
use modlike_db::DbPool;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 1000;
const MAX_LOCATION_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "Draft",
            EventStatus::Pending => "Pending",
            EventStatus::Approved => "Approved",
            EventStatus::Rejected => "Rejected",
            EventStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Draft" => Ok(EventStatus::Draft),
            "Pending" => Ok(EventStatus::Pending),
            "Approved" => Ok(EventStatus::Approved),
            "Rejected" => Ok(EventStatus::Rejected),
            "Cancelled" => Ok(EventStatus::Cancelled),
            other => Err(CoreError::Validation(format!("unknown status: {other}"))),
        }
    }
}

/// Validated organizer input for create and update. `status` is the
/// caller's requested target; only `Draft` and `Pending` are ever
/// accepted from a client.
#[derive(Debug, Clone)]
pub struct EventInput {
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_participants: Option<i64>,
    pub max_staff: Option<i64>,
    pub description: Option<String>,
    pub location: String,
    pub status: Option<EventStatus>,
}

pub fn validate_input(input: &EventInput) -> Result<(), CoreError> {
    // Limits are counted in characters, not bytes: titles and locations
    // are routinely non-ASCII.
    let name = input.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(
            "title must be 1-100 characters".into(),
        ));
    }
    let location = input.location.trim();
    if location.is_empty() || location.chars().count() > MAX_LOCATION_LEN {
        return Err(CoreError::Validation(
            "location must be 1-200 characters".into(),
        ));
    }
    if let Some(desc) = input.description.as_deref() {
        if desc.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(CoreError::Validation("description too long".into()));
        }
    }
    if input.starts_at >= input.ends_at {
        return Err(CoreError::Validation(
            "start time must precede end time".into(),
        ));
    }
    for (field, value) in [
        ("maxParticipant", input.max_participants),
        ("maxStaff", input.max_staff),
    ] {
        if value.is_some_and(|v| v < 0) {
            return Err(CoreError::Validation(format!(
                "{field} must be non-negative"
            )));
        }
    }
    if let Some(status) = input.status {
        if !matches!(status, EventStatus::Draft | EventStatus::Pending) {
            return Err(CoreError::Validation(format!(
                "events can only be submitted as Draft or Pending, not {status}"
            )));
        }
    }
    Ok(())
}

/// Create an event owned by `organizer_id`. An explicit `Draft` request
/// is honored; everything else lands in `Pending`.
pub async fn create_event(
    pool: &DbPool,
    organizer_id: i64,
    input: &EventInput,
    image_path: Option<&str>,
) -> Result<EventRow, CoreError> {
    validate_input(input)?;
    let status = match input.status {
        Some(EventStatus::Draft) => EventStatus::Draft,
        _ => EventStatus::Pending,
    };

    let event = events::create_event(
        pool,
        organizer_id,
        input.name.trim(),
        input.starts_at,
        input.ends_at,
        input.max_participants,
        input.max_staff,
        input.description.as_deref(),
        input.location.trim(),
        status.as_str(),
        image_path,
    )
    .await?;
    tracing::info!(event_id = event.id, organizer_id, status = %status, "event created");
    Ok(event)
}

/// Outcome of an update: the new row plus the image path it displaced,
/// which the caller should remove from storage.
#[derive(Debug)]
pub struct UpdatedEvent {
    pub event: EventRow,
    pub replaced_image: Option<String>,
}

/// Rewrite an event's fields. Only the owning organizer may update, and
/// only while the event sits in Draft, Pending or Rejected. The target
/// status defaults to the current one; requesting `Pending` from
/// `Rejected` is the resubmit-via-update path.
pub async fn update_event(
    pool: &DbPool,
    event_id: i64,
    organizer: &UserRow,
    input: &EventInput,
    new_image_path: Option<&str>,
) -> Result<UpdatedEvent, CoreError> {
    validate_input(input)?;

    let existing = events::get_event(pool, event_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    if existing.organizer_id != organizer.id {
        return Err(CoreError::Forbidden);
    }
    let current: EventStatus = existing.status.parse()?;
    if !matches!(
        current,
        EventStatus::Draft | EventStatus::Pending | EventStatus::Rejected
    ) {
        return Err(CoreError::InvalidTransition {
            from: existing.status.clone(),
            action: "update",
        });
    }

    let target = input.status.unwrap_or(current);
    let updated = events::update_event(
        pool,
        event_id,
        organizer.id,
        input.name.trim(),
        input.starts_at,
        input.ends_at,
        input.max_participants,
        input.max_staff,
        input.description.as_deref(),
        input.location.trim(),
        target.as_str(),
        new_image_path,
    )
    .await?
    .ok_or(CoreError::NotFound)?;

    let replaced_image = match new_image_path {
        Some(_) => existing.image_path.filter(|old| {
            updated
                .image_path
                .as_deref()
                .is_some_and(|new| new != old.as_str())
        }),
        None => None,
    };

    tracing::info!(event_id, status = %target, "event updated");
    Ok(UpdatedEvent {
        event: updated,
        replaced_image,
    })
}

pub async fn approve_event(pool: &DbPool, event_id: i64) -> Result<EventRow, CoreError> {
    let existing = events::get_event(pool, event_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    let approved = events::approve_event(pool, event_id)
        .await?
        .ok_or(CoreError::InvalidTransition {
            from: existing.status,
            action: "approve",
        })?;
    tracing::info!(event_id, "event approved");
    Ok(approved)
}

/// Reject a pending event. A reason may accompany the decision; it is
/// logged for the audit trail but not persisted.
pub async fn reject_event(
    pool: &DbPool,
    event_id: i64,
    reason: Option<&str>,
) -> Result<EventRow, CoreError> {
    let existing = events::get_event(pool, event_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    let rejected = events::reject_event(pool, event_id)
        .await?
        .ok_or(CoreError::InvalidTransition {
            from: existing.status,
            action: "reject",
        })?;
    tracing::info!(event_id, reason = reason.unwrap_or(""), "event rejected");
    Ok(rejected)
}

pub async fn cancel_event(
    pool: &DbPool,
    event_id: i64,
    organizer: &UserRow,
) -> Result<EventRow, CoreError> {
    let existing = events::get_event(pool, event_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    if existing.organizer_id != organizer.id {
        return Err(CoreError::Forbidden);
    }
    let cancelled = events::cancel_event(pool, event_id, organizer.id)
        .await?
        .ok_or(CoreError::InvalidTransition {
            from: existing.status,
            action: "cancel",
        })?;
    tracing::info!(event_id, "event cancelled");
    Ok(cancelled)
}

pub async fn resubmit_event(
    pool: &DbPool,
    event_id: i64,
    organizer: &UserRow,
) -> Result<EventRow, CoreError> {
    let existing = events::get_event(pool, event_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    if existing.organizer_id != organizer.id {
        return Err(CoreError::Forbidden);
    }
    let resubmitted = events::resubmit_event(pool, event_id, organizer.id)
        .await?
        .ok_or(CoreError::InvalidTransition {
            from: existing.status,
            action: "resubmit",
        })?;
    tracing::info!(event_id, "event resubmitted for approval");
    Ok(resubmitted)
}

/// A single event is visible to its owner, to admins, and to anyone
/// once it is Approved.
pub fn can_view(organizer_id: i64, status: &str, user: &UserRow) -> bool {
    organizer_id == user.id || user.is_admin() || status == events::STATUS_APPROVED
}

pub async fn get_event_checked(
    pool: &DbPool,
    event_id: i64,
    user: &UserRow,
) -> Result<EventWithOrganizer, CoreError> {
    let event = events::get_event_with_organizer(pool, event_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    if !can_view(event.organizer_id, &event.status, user) {
        return Err(CoreError::Forbidden);
    }
    Ok(event)
}
