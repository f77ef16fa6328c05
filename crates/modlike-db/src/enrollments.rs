use crate::events::EventRow;
use crate::{DbError, DbPool};

/// Outcome of the single-statement admission insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// The capacity guard matched zero rows: the event is full.
    Full,
    /// The (event, user) primary key already exists.
    Duplicate,
}

pub async fn count_for_event(pool: &DbPool, event_id: i64) -> Result<i64, DbError> {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM enrollments WHERE event_id = ?1")
            .bind(event_id)
            .fetch_one(pool)
            .await?;
    Ok(count.0)
}

pub async fn is_enrolled(pool: &DbPool, event_id: i64, user_id: i64) -> Result<bool, DbError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT 1 FROM enrollments WHERE event_id = ?1 AND user_id = ?2",
    )
    .bind(event_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

/// Admit `user_id` to `event_id` if and only if the current enrollment
/// count is below the event's capacity. The count-vs-capacity check and
/// the insert are one statement, so two concurrent requests for the last
/// slot cannot both succeed. A NULL `max_participants` means unbounded.
pub async fn try_enroll(pool: &DbPool, event_id: i64, user_id: i64) -> Result<Admission, DbError> {
    let result = sqlx::query(
        "INSERT INTO enrollments (event_id, user_id)
         SELECT ?1, ?2
         WHERE (SELECT COUNT(*) FROM enrollments WHERE event_id = ?1)
               < (SELECT COALESCE(max_participants, 9223372036854775807)
                  FROM events WHERE id = ?1)",
    )
    .bind(event_id)
    .bind(user_id)
    .execute(pool)
    .await;

    match result {
        Ok(done) if done.rows_affected() == 1 => Ok(Admission::Admitted),
        Ok(_) => Ok(Admission::Full),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Ok(Admission::Duplicate),
        Err(e) => Err(e.into()),
    }
}

/// Events the user holds an enrollment for, soonest first.
pub async fn list_enrolled_events(pool: &DbPool, user_id: i64) -> Result<Vec<EventRow>, DbError> {
    let rows = sqlx::query_as::<_, EventRow>(
        "SELECT e.id, e.organizer_id, e.name, e.starts_at, e.ends_at, e.max_participants,
                e.max_staff, e.description, e.location, e.status, e.image_path, e.created_at
         FROM events e
         JOIN enrollments en ON en.event_id = e.id
         WHERE en.user_id = ?1
         ORDER BY e.starts_at ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
