use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

pub const STATUS_DRAFT: &str = "Draft";
pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_APPROVED: &str = "Approved";
pub const STATUS_REJECTED: &str = "Rejected";
pub const STATUS_CANCELLED: &str = "Cancelled";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    pub organizer_id: i64,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_participants: Option<i64>,
    pub max_staff: Option<i64>,
    pub description: Option<String>,
    pub location: String,
    pub status: String,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Event joined with the organizer's display name, for list and detail
/// responses shown to participants.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventWithOrganizer {
    pub id: i64,
    pub organizer_id: i64,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_participants: Option<i64>,
    pub max_staff: Option<i64>,
    pub description: Option<String>,
    pub location: String,
    pub status: String,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub organizer_name: String,
}

#[allow(clippy::too_many_arguments)]
pub async fn create_event(
    pool: &DbPool,
    organizer_id: i64,
    name: &str,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    max_participants: Option<i64>,
    max_staff: Option<i64>,
    description: Option<&str>,
    location: &str,
    status: &str,
    image_path: Option<&str>,
) -> Result<EventRow, DbError> {
    let row = sqlx::query_as::<_, EventRow>(
        "INSERT INTO events
            (organizer_id, name, starts_at, ends_at, max_participants, max_staff, description, location, status, image_path)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         RETURNING id, organizer_id, name, starts_at, ends_at, max_participants, max_staff,
                   description, location, status, image_path, created_at",
    )
    .bind(organizer_id)
    .bind(name)
    .bind(starts_at)
    .bind(ends_at)
    .bind(max_participants)
    .bind(max_staff)
    .bind(description)
    .bind(location)
    .bind(status)
    .bind(image_path)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_event(pool: &DbPool, id: i64) -> Result<Option<EventRow>, DbError> {
    let row = sqlx::query_as::<_, EventRow>(
        "SELECT id, organizer_id, name, starts_at, ends_at, max_participants, max_staff,
                description, location, status, image_path, created_at
         FROM events WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_event_with_organizer(
    pool: &DbPool,
    id: i64,
) -> Result<Option<EventWithOrganizer>, DbError> {
    let row = sqlx::query_as::<_, EventWithOrganizer>(
        "SELECT e.id, e.organizer_id, e.name, e.starts_at, e.ends_at, e.max_participants,
                e.max_staff, e.description, e.location, e.status, e.image_path, e.created_at,
                u.name AS organizer_name
         FROM events e
         JOIN users u ON u.id = e.organizer_id
         WHERE e.id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Full-field update scoped to the owning organizer. `image_path` is
/// `None` to keep the stored path untouched. Returns `None` when the
/// event does not exist or belongs to someone else.
#[allow(clippy::too_many_arguments)]
pub async fn update_event(
    pool: &DbPool,
    id: i64,
    organizer_id: i64,
    name: &str,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    max_participants: Option<i64>,
    max_staff: Option<i64>,
    description: Option<&str>,
    location: &str,
    status: &str,
    image_path: Option<&str>,
) -> Result<Option<EventRow>, DbError> {
    let row = sqlx::query_as::<_, EventRow>(
        "UPDATE events
         SET name = ?3, starts_at = ?4, ends_at = ?5, max_participants = ?6, max_staff = ?7,
             description = ?8, location = ?9, status = ?10,
             image_path = COALESCE(?11, image_path)
         WHERE id = ?1 AND organizer_id = ?2
         RETURNING id, organizer_id, name, starts_at, ends_at, max_participants, max_staff,
                   description, location, status, image_path, created_at",
    )
    .bind(id)
    .bind(organizer_id)
    .bind(name)
    .bind(starts_at)
    .bind(ends_at)
    .bind(max_participants)
    .bind(max_staff)
    .bind(description)
    .bind(location)
    .bind(status)
    .bind(image_path)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

// Status transitions are guarded updates: the from-state precondition
// sits in the WHERE clause, so a raced double-apply matches zero rows.

pub async fn approve_event(pool: &DbPool, id: i64) -> Result<Option<EventRow>, DbError> {
    let row = sqlx::query_as::<_, EventRow>(
        "UPDATE events SET status = 'Approved'
         WHERE id = ?1 AND status = 'Pending'
         RETURNING id, organizer_id, name, starts_at, ends_at, max_participants, max_staff,
                   description, location, status, image_path, created_at",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn reject_event(pool: &DbPool, id: i64) -> Result<Option<EventRow>, DbError> {
    let row = sqlx::query_as::<_, EventRow>(
        "UPDATE events SET status = 'Rejected'
         WHERE id = ?1 AND status = 'Pending'
         RETURNING id, organizer_id, name, starts_at, ends_at, max_participants, max_staff,
                   description, location, status, image_path, created_at",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn cancel_event(
    pool: &DbPool,
    id: i64,
    organizer_id: i64,
) -> Result<Option<EventRow>, DbError> {
    let row = sqlx::query_as::<_, EventRow>(
        "UPDATE events SET status = 'Cancelled'
         WHERE id = ?1 AND organizer_id = ?2
           AND status IN ('Draft', 'Pending', 'Approved')
         RETURNING id, organizer_id, name, starts_at, ends_at, max_participants, max_staff,
                   description, location, status, image_path, created_at",
    )
    .bind(id)
    .bind(organizer_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn resubmit_event(
    pool: &DbPool,
    id: i64,
    organizer_id: i64,
) -> Result<Option<EventRow>, DbError> {
    let row = sqlx::query_as::<_, EventRow>(
        "UPDATE events SET status = 'Pending'
         WHERE id = ?1 AND organizer_id = ?2 AND status = 'Rejected'
         RETURNING id, organizer_id, name, starts_at, ends_at, max_participants, max_staff,
                   description, location, status, image_path, created_at",
    )
    .bind(id)
    .bind(organizer_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// All of an organizer's events across every status, grouped the way the
/// "my events" page shows them: actionable statuses first, newest first
/// within each group.
pub async fn list_by_organizer(
    pool: &DbPool,
    organizer_id: i64,
) -> Result<Vec<EventRow>, DbError> {
    let rows = sqlx::query_as::<_, EventRow>(
        "SELECT id, organizer_id, name, starts_at, ends_at, max_participants, max_staff,
                description, location, status, image_path, created_at
         FROM events
         WHERE organizer_id = ?1
         ORDER BY CASE status
                      WHEN 'Draft' THEN 0
                      WHEN 'Pending' THEN 1
                      WHEN 'Rejected' THEN 2
                      WHEN 'Approved' THEN 3
                      ELSE 4
                  END,
                  starts_at DESC",
    )
    .bind(organizer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_approved(pool: &DbPool) -> Result<Vec<EventWithOrganizer>, DbError> {
    let rows = sqlx::query_as::<_, EventWithOrganizer>(
        "SELECT e.id, e.organizer_id, e.name, e.starts_at, e.ends_at, e.max_participants,
                e.max_staff, e.description, e.location, e.status, e.image_path, e.created_at,
                u.name AS organizer_name
         FROM events e
         JOIN users u ON u.id = e.organizer_id
         WHERE e.status = 'Approved'
         ORDER BY e.starts_at ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_pending(pool: &DbPool) -> Result<Vec<EventWithOrganizer>, DbError> {
    let rows = sqlx::query_as::<_, EventWithOrganizer>(
        "SELECT e.id, e.organizer_id, e.name, e.starts_at, e.ends_at, e.max_participants,
                e.max_staff, e.description, e.location, e.status, e.image_path, e.created_at,
                u.name AS organizer_name
         FROM events e
         JOIN users u ON u.id = e.organizer_id
         WHERE e.status = 'Pending'
         ORDER BY e.starts_at ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Admin listing, optionally filtered to a single status.
pub async fn list_all(
    pool: &DbPool,
    status: Option<&str>,
) -> Result<Vec<EventWithOrganizer>, DbError> {
    let rows = sqlx::query_as::<_, EventWithOrganizer>(
        "SELECT e.id, e.organizer_id, e.name, e.starts_at, e.ends_at, e.max_participants,
                e.max_staff, e.description, e.location, e.status, e.image_path, e.created_at,
                u.name AS organizer_name
         FROM events e
         JOIN users u ON u.id = e.organizer_id
         WHERE (?1 IS NULL OR e.status = ?1)
         ORDER BY e.starts_at DESC",
    )
    .bind(status)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations, users};
    use chrono::TimeZone;

    async fn setup() -> DbPool {
        let pool = create_pool("sqlite::memory:", 1).await.expect("pool");
        run_migrations(&pool).await.expect("migrations");
        users::upsert_local_user(&pool, "org", "h", "Organizer", users::ROLE_USER)
            .await
            .expect("organizer");
        pool
    }

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 1, hour, 0, 0).unwrap()
    }

    async fn seed_event(pool: &DbPool, status: &str) -> EventRow {
        create_event(
            pool,
            1,
            "Career Fair",
            ts(9),
            ts(17),
            Some(50),
            Some(5),
            Some("annual fair"),
            "Main Hall",
            status,
            None,
        )
        .await
        .expect("create event")
    }

    #[tokio::test]
    async fn approve_requires_pending() {
        let pool = setup().await;
        let event = seed_event(&pool, STATUS_PENDING).await;

        let approved = approve_event(&pool, event.id).await.expect("approve");
        assert_eq!(approved.expect("row").status, STATUS_APPROVED);

        // Second approve hits a non-Pending row and must not apply.
        let again = approve_event(&pool, event.id).await.expect("approve");
        assert!(again.is_none());
        let rejected = reject_event(&pool, event.id).await.expect("reject");
        assert!(rejected.is_none());
    }

    #[tokio::test]
    async fn cancel_is_owner_scoped_and_not_repeatable() {
        let pool = setup().await;
        let event = seed_event(&pool, STATUS_APPROVED).await;

        assert!(cancel_event(&pool, event.id, 999)
            .await
            .expect("cancel")
            .is_none());

        let cancelled = cancel_event(&pool, event.id, 1).await.expect("cancel");
        assert_eq!(cancelled.expect("row").status, STATUS_CANCELLED);

        assert!(cancel_event(&pool, event.id, 1)
            .await
            .expect("cancel")
            .is_none());
    }

    #[tokio::test]
    async fn resubmit_moves_rejected_back_to_pending() {
        let pool = setup().await;
        let event = seed_event(&pool, STATUS_REJECTED).await;

        let resubmitted = resubmit_event(&pool, event.id, 1).await.expect("resubmit");
        assert_eq!(resubmitted.expect("row").status, STATUS_PENDING);

        // Only Rejected events can be resubmitted.
        assert!(resubmit_event(&pool, event.id, 1)
            .await
            .expect("resubmit")
            .is_none());
    }

    #[tokio::test]
    async fn update_keeps_image_when_none_given() {
        let pool = setup().await;
        let event = create_event(
            &pool,
            1,
            "Workshop",
            ts(10),
            ts(12),
            None,
            None,
            None,
            "Lab 2",
            STATUS_DRAFT,
            Some("uploads/events/a.png"),
        )
        .await
        .expect("create");

        let updated = update_event(
            &pool,
            event.id,
            1,
            "Workshop v2",
            ts(10),
            ts(13),
            Some(30),
            None,
            Some("hands-on"),
            "Lab 3",
            STATUS_PENDING,
            None,
        )
        .await
        .expect("update")
        .expect("owned row");
        assert_eq!(updated.name, "Workshop v2");
        assert_eq!(updated.image_path.as_deref(), Some("uploads/events/a.png"));

        let replaced = update_event(
            &pool,
            event.id,
            1,
            "Workshop v2",
            ts(10),
            ts(13),
            Some(30),
            None,
            Some("hands-on"),
            "Lab 3",
            STATUS_PENDING,
            Some("uploads/events/b.png"),
        )
        .await
        .expect("update")
        .expect("owned row");
        assert_eq!(replaced.image_path.as_deref(), Some("uploads/events/b.png"));
    }

    #[tokio::test]
    async fn approved_list_is_ordered_by_start_time() {
        let pool = setup().await;
        let late = create_event(
            &pool, 1, "Late", ts(15), ts(16), None, None, None, "A", STATUS_APPROVED, None,
        )
        .await
        .expect("create");
        let early = create_event(
            &pool, 1, "Early", ts(8), ts(9), None, None, None, "B", STATUS_APPROVED, None,
        )
        .await
        .expect("create");
        seed_event(&pool, STATUS_PENDING).await;

        let approved = list_approved(&pool).await.expect("list");
        let ids: Vec<i64> = approved.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);
        assert!(approved.iter().all(|e| e.organizer_name == "Organizer"));
    }

    #[tokio::test]
    async fn organizer_list_groups_by_status_then_newest_first() {
        let pool = setup().await;

        let make = |status: &'static str, hour: u32| {
            let pool = pool.clone();
            async move {
                create_event(
                    &pool, 1, "Event", ts(hour), ts(hour + 1), None, None, None, "Hall", status,
                    None,
                )
                .await
                .expect("create")
                .id
            }
        };
        let approved = make(STATUS_APPROVED, 9).await;
        let draft = make(STATUS_DRAFT, 8).await;
        let cancelled = make(STATUS_CANCELLED, 10).await;
        let pending_early = make(STATUS_PENDING, 7).await;
        let pending_late = make(STATUS_PENDING, 14).await;
        let rejected = make(STATUS_REJECTED, 11).await;

        let mine = list_by_organizer(&pool, 1).await.expect("list");
        let ids: Vec<i64> = mine.iter().map(|e| e.id).collect();
        // Actionable statuses first; later start times first inside a group.
        assert_eq!(
            ids,
            vec![
                draft,
                pending_late,
                pending_early,
                rejected,
                approved,
                cancelled
            ]
        );

        assert!(list_by_organizer(&pool, 999)
            .await
            .expect("list")
            .is_empty());
    }

    #[tokio::test]
    async fn admin_list_filters_by_status() {
        let pool = setup().await;
        seed_event(&pool, STATUS_PENDING).await;
        seed_event(&pool, STATUS_REJECTED).await;

        let all = list_all(&pool, None).await.expect("list");
        assert_eq!(all.len(), 2);
        let rejected = list_all(&pool, Some(STATUS_REJECTED)).await.expect("list");
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].status, STATUS_REJECTED);
    }
}
