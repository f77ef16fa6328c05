use modlike_db::enrollments::{self, Admission};
use modlike_db::events::{self, EventRow, EventWithOrganizer};
use modlike_db::users::UserRow;
use modlike_db::DbPool;

use crate::error::CoreError;
use crate::lifecycle;

/// Event plus the enrollment-derived fields the detail page shows.
#[derive(Debug, Clone)]
pub struct EventDetail {
    pub event: EventWithOrganizer,
    pub current_participants: i64,
    pub is_enrolled: bool,
    pub can_enroll: bool,
}

/// Register `user` as a participant of `event_id`. The capacity check
/// and the insert are one atomic admission decision in the store; this
/// function only orders the domain errors around it.
pub async fn enroll(pool: &DbPool, event_id: i64, user: &UserRow) -> Result<(), CoreError> {
    let event = events::get_event(pool, event_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    if event.organizer_id == user.id {
        return Err(CoreError::SelfEnrollment);
    }

    match enrollments::try_enroll(pool, event_id, user.id).await? {
        Admission::Admitted => {
            tracing::info!(event_id, user_id = user.id, "user enrolled");
            Ok(())
        }
        Admission::Full => Err(CoreError::CapacityExceeded),
        Admission::Duplicate => Err(CoreError::AlreadyEnrolled),
    }
}

pub async fn event_detail(
    pool: &DbPool,
    event_id: i64,
    user: &UserRow,
) -> Result<EventDetail, CoreError> {
    let event = events::get_event_with_organizer(pool, event_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    if !lifecycle::can_view(event.organizer_id, &event.status, user) {
        return Err(CoreError::Forbidden);
    }

    let current_participants = enrollments::count_for_event(pool, event_id).await?;
    let is_enrolled = enrollments::is_enrolled(pool, event_id, user.id).await?;
    let under_capacity = event
        .max_participants
        .is_none_or(|cap| current_participants < cap);
    let can_enroll = event.organizer_id != user.id && under_capacity && !is_enrolled;

    Ok(EventDetail {
        event,
        current_participants,
        is_enrolled,
        can_enroll,
    })
}

pub async fn list_enrolled(pool: &DbPool, user: &UserRow) -> Result<Vec<EventRow>, CoreError> {
    Ok(enrollments::list_enrolled_events(pool, user.id).await?)
}
