pub mod error;
pub mod middleware;
pub mod routes;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use modlike_core::AppState;

/// Upper bound on a whole multipart request. Individual images are
/// additionally capped by the store's `max_file_size`.
const MAX_FORM_BODY: usize = 8 * 1024 * 1024;

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/", get(routes::health))
        .route("/api/login", post(routes::auth::login))
        .route("/auth/google", get(routes::auth::google_login))
        .route("/auth/google/callback", get(routes::auth::google_callback))
        .route("/api/me", get(routes::auth::me))
        .route("/api/events", post(routes::events::create))
        .route("/api/events/approved", get(routes::events::list_approved))
        .route("/api/events/mine", get(routes::events::list_mine))
        .route("/api/events/pending", get(routes::events::list_pending))
        .route("/api/events/all", get(routes::events::list_all))
        .route(
            "/api/events/{id}",
            get(routes::events::get).put(routes::events::update),
        )
        .route("/api/events/{id}/approve", put(routes::events::approve))
        .route("/api/events/{id}/reject", put(routes::events::reject))
        .route("/api/events/{id}/cancel", put(routes::events::cancel))
        .route("/api/events/{id}/resubmit", put(routes::events::resubmit))
        .route("/api/events/{id}/detail", get(routes::enrollments::detail))
        .route("/api/events/{id}/enroll", post(routes::enrollments::enroll))
        .route(
            "/api/enrolled-events",
            get(routes::enrollments::list_enrolled),
        )
        .layer(DefaultBodyLimit::max(MAX_FORM_BODY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use modlike_core::{auth, AppConfig, AppState};
    use modlike_db::users::{self, UserRow};
    use modlike_db::{create_pool, run_migrations};
    use modlike_media::{ImageStore, StorageConfig};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const SECRET: &str = "router-test-secret";

    async fn test_app() -> (Router, AppState, TempDir) {
        let pool = create_pool("sqlite::memory:", 1).await.expect("pool");
        run_migrations(&pool).await.expect("migrations");

        let dir = TempDir::new().expect("tempdir");
        let state = AppState {
            db: pool,
            config: AppConfig {
                jwt_secret: SECRET.to_string(),
                jwt_expiry_seconds: 3600,
                frontend_url: "http://localhost:5173".to_string(),
                storage_path: dir.path().display().to_string(),
                max_upload_size: 5 * 1024 * 1024,
                google: None,
            },
            images: Arc::new(ImageStore::new(StorageConfig {
                base_path: dir.path().to_path_buf(),
                max_file_size: 5 * 1024 * 1024,
            })),
        };
        let router = build_router().with_state(state.clone());
        (router, state, dir)
    }

    async fn seed_user(state: &AppState, username: &str, role: &str) -> (UserRow, String) {
        let hash = auth::hash_password("hunter2").expect("hash");
        let user = users::upsert_local_user(&state.db, username, &hash, username, role)
            .await
            .expect("user");
        let token = auth::issue_token(&user, SECRET, 3600).expect("token");
        (user, token)
    }

    async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = router.clone().oneshot(req).await.expect("response");
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    fn multipart_body(fields: &[(&str, &str)]) -> (String, Vec<u8>) {
        let boundary = "VGhlRm9ybUJvdW5kYXJ5";
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        (
            format!("multipart/form-data; boundary={boundary}"),
            body,
        )
    }

    fn event_fields<'a>(status: Option<&'a str>) -> Vec<(&'a str, &'a str)> {
        let mut fields = vec![
            ("title", "Campus Hackathon"),
            ("startDateTime", "2026-10-03T09:00"),
            ("endDateTime", "2026-10-04T18:00"),
            ("location", "Engineering Hall"),
            ("maxParticipant", "2"),
            ("maxStaff", "5"),
            ("eventInfo", "48 hours of building"),
        ];
        if let Some(status) = status {
            fields.push(("status", status));
        }
        fields
    }

    async fn create_event_via_api(
        router: &Router,
        token: &str,
        fields: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let (content_type, body) = multipart_body(fields);
        let req = Request::builder()
            .method("POST")
            .uri("/api/events")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("request");
        send(router, req).await
    }

    fn authed_req(method: &str, uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let (router, _, _dir) = test_app().await;

        let req = Request::builder()
            .uri("/api/me")
            .body(Body::empty())
            .expect("request");
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let req = Request::builder()
            .uri("/api/me")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .expect("request");
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid token");
    }

    #[tokio::test]
    async fn login_then_me_round_trip() {
        let (router, state, _dir) = test_app().await;
        seed_user(&state, "nadia", users::ROLE_USER).await;

        let req = Request::builder()
            .method("POST")
            .uri("/api/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"username": "nadia", "password": "hunter2"}).to_string(),
            ))
            .expect("request");
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Login successful");
        assert_eq!(body["role"], "user");
        let token = body["token"].as_str().expect("token").to_string();

        let (status, body) = send(&router, authed_req("GET", "/api/me", &token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "nadia");

        let req = Request::builder()
            .method("POST")
            .uri("/api/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"username": "nadia", "password": "wrong"}).to_string(),
            ))
            .expect("request");
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn create_approve_and_enroll_happy_path() {
        let (router, state, _dir) = test_app().await;
        let (_organizer, org_token) = seed_user(&state, "org", users::ROLE_USER).await;
        let (_admin, admin_token) = seed_user(&state, "admin", users::ROLE_ADMIN).await;
        let (_student, student_token) = seed_user(&state, "student", users::ROLE_USER).await;

        let (status, body) = create_event_via_api(&router, &org_token, &event_fields(None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event"]["status"], "Pending");
        let event_id = body["event"]["id"].as_i64().expect("id");

        // Admin sees it in the pending queue; the organizer does not.
        let (status, body) =
            send(&router, authed_req("GET", "/api/events/pending", &admin_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"].as_array().expect("events").len(), 1);

        let (status, _) =
            send(&router, authed_req("GET", "/api/events/pending", &org_token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let approve_uri = format!("/api/events/{event_id}/approve");
        let (status, body) = send(&router, authed_req("PUT", &approve_uri, &admin_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event"]["status"], "Approved");

        // Approving twice conflicts with the current status.
        let (status, body) = send(&router, authed_req("PUT", &approve_uri, &admin_token)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, body) =
            send(&router, authed_req("GET", "/api/events/approved", &student_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"][0]["organizer_name"], "org");

        let enroll_uri = format!("/api/events/{event_id}/enroll");
        let (status, body) =
            send(&router, authed_req("POST", &enroll_uri, &student_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Successfully enrolled");

        // Enrolling again is idempotent-rejected, not a second seat.
        let (status, body) =
            send(&router, authed_req("POST", &enroll_uri, &student_token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "already enrolled");

        let detail_uri = format!("/api/events/{event_id}/detail");
        let (status, body) =
            send(&router, authed_req("GET", &detail_uri, &student_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currentParticipants"], 1);
        assert_eq!(body["isEnrolled"], true);
        assert_eq!(body["canEnroll"], false);

        let (status, body) =
            send(&router, authed_req("GET", "/api/enrolled-events", &student_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"][0]["id"], event_id);
    }

    #[tokio::test]
    async fn full_event_turns_enrollment_away() {
        let (router, state, _dir) = test_app().await;
        let (_organizer, org_token) = seed_user(&state, "org", users::ROLE_USER).await;
        let (_admin, admin_token) = seed_user(&state, "admin", users::ROLE_ADMIN).await;
        let (_a, a_token) = seed_user(&state, "alice", users::ROLE_USER).await;
        let (_b, b_token) = seed_user(&state, "bob", users::ROLE_USER).await;

        let mut fields = event_fields(None);
        fields.retain(|(name, _)| *name != "maxParticipant");
        fields.push(("maxParticipant", "1"));
        let (status, body) = create_event_via_api(&router, &org_token, &fields).await;
        assert_eq!(status, StatusCode::OK);
        let event_id = body["event"]["id"].as_i64().expect("id");

        let approve_uri = format!("/api/events/{event_id}/approve");
        let (status, _) = send(&router, authed_req("PUT", &approve_uri, &admin_token)).await;
        assert_eq!(status, StatusCode::OK);

        let enroll_uri = format!("/api/events/{event_id}/enroll");
        let (status, _) = send(&router, authed_req("POST", &enroll_uri, &a_token)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&router, authed_req("POST", &enroll_uri, &b_token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "event is full");

        // The organizer is turned away regardless of capacity.
        let (status, body) = send(&router, authed_req("POST", &enroll_uri, &org_token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn drafts_are_hidden_from_other_users() {
        let (router, state, _dir) = test_app().await;
        let (_organizer, org_token) = seed_user(&state, "org", users::ROLE_USER).await;
        let (_other, other_token) = seed_user(&state, "other", users::ROLE_USER).await;
        let (_admin, admin_token) = seed_user(&state, "admin", users::ROLE_ADMIN).await;

        let (status, body) =
            create_event_via_api(&router, &org_token, &event_fields(Some("Draft"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event"]["status"], "Draft");
        let event_id = body["event"]["id"].as_i64().expect("id");

        let uri = format!("/api/events/{event_id}");
        let (status, _) = send(&router, authed_req("GET", &uri, &org_token)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&router, authed_req("GET", &uri, &admin_token)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&router, authed_req("GET", &uri, &other_token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // A draft never appears in the organizer-facing public list.
        let (status, body) =
            send(&router, authed_req("GET", "/api/events/approved", &other_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"].as_array().expect("events").len(), 0);
    }

    #[tokio::test]
    async fn reject_accepts_optional_reason_and_allows_resubmit() {
        let (router, state, _dir) = test_app().await;
        let (_organizer, org_token) = seed_user(&state, "org", users::ROLE_USER).await;
        let (_admin, admin_token) = seed_user(&state, "admin", users::ROLE_ADMIN).await;

        let (status, body) = create_event_via_api(&router, &org_token, &event_fields(None)).await;
        assert_eq!(status, StatusCode::OK);
        let event_id = body["event"]["id"].as_i64().expect("id");

        let reject_uri = format!("/api/events/{event_id}/reject");
        let req = Request::builder()
            .method("PUT")
            .uri(&reject_uri)
            .header(header::AUTHORIZATION, format!("Bearer {admin_token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"reason": "date clashes"}).to_string()))
            .expect("request");
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event"]["status"], "Rejected");

        let resubmit_uri = format!("/api/events/{event_id}/resubmit");
        let (status, body) = send(&router, authed_req("PUT", &resubmit_uri, &org_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event"]["status"], "Pending");

        // Reject with no body at all is also accepted.
        let (status, body) = send(&router, authed_req("PUT", &reject_uri, &admin_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event"]["status"], "Rejected");
    }

    #[tokio::test]
    async fn create_validates_form_fields() {
        let (router, state, _dir) = test_app().await;
        let (_organizer, token) = seed_user(&state, "org", users::ROLE_USER).await;

        let mut inverted = event_fields(None);
        inverted.retain(|(name, _)| *name != "endDateTime");
        inverted.push(("endDateTime", "2026-10-03T08:00"));
        let (status, body) = create_event_via_api(&router, &token, &inverted).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");

        let mut missing_title = event_fields(None);
        missing_title.retain(|(name, _)| *name != "title");
        let (status, _) = create_event_via_api(&router, &token, &missing_title).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut bad_date = event_fields(None);
        bad_date.retain(|(name, _)| *name != "startDateTime");
        bad_date.push(("startDateTime", "next tuesday"));
        let (status, _) = create_event_via_api(&router, &token, &bad_date).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_owner_and_state_rules_over_http() {
        let (router, state, _dir) = test_app().await;
        let (_organizer, org_token) = seed_user(&state, "org", users::ROLE_USER).await;
        let (_other, other_token) = seed_user(&state, "other", users::ROLE_USER).await;
        let (_admin, admin_token) = seed_user(&state, "admin", users::ROLE_ADMIN).await;

        let (status, body) = create_event_via_api(&router, &org_token, &event_fields(None)).await;
        assert_eq!(status, StatusCode::OK);
        let event_id = body["event"]["id"].as_i64().expect("id");
        let uri = format!("/api/events/{event_id}");

        let mut renamed = event_fields(None);
        renamed.retain(|(name, _)| *name != "title");
        renamed.push(("title", "Campus Hackathon v2"));
        let (content_type, form) = multipart_body(&renamed);

        // A non-owner cannot touch it.
        let req = Request::builder()
            .method("PUT")
            .uri(&uri)
            .header(header::AUTHORIZATION, format!("Bearer {other_token}"))
            .header(header::CONTENT_TYPE, &content_type)
            .body(Body::from(form.clone()))
            .expect("request");
        let (status, _) = send(&router, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let req = Request::builder()
            .method("PUT")
            .uri(&uri)
            .header(header::AUTHORIZATION, format!("Bearer {org_token}"))
            .header(header::CONTENT_TYPE, &content_type)
            .body(Body::from(form.clone()))
            .expect("request");
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event"]["title"], "Campus Hackathon v2");

        // Once approved the event is frozen for the organizer.
        let approve_uri = format!("/api/events/{event_id}/approve");
        let (status, _) = send(&router, authed_req("PUT", &approve_uri, &admin_token)).await;
        assert_eq!(status, StatusCode::OK);

        let req = Request::builder()
            .method("PUT")
            .uri(&uri)
            .header(header::AUTHORIZATION, format!("Bearer {org_token}"))
            .header(header::CONTENT_TYPE, &content_type)
            .body(Body::from(form))
            .expect("request");
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn admin_list_all_filters_by_status() {
        let (router, state, _dir) = test_app().await;
        let (_organizer, org_token) = seed_user(&state, "org", users::ROLE_USER).await;
        let (_admin, admin_token) = seed_user(&state, "admin", users::ROLE_ADMIN).await;

        create_event_via_api(&router, &org_token, &event_fields(Some("Draft"))).await;
        create_event_via_api(&router, &org_token, &event_fields(None)).await;

        let (status, body) =
            send(&router, authed_req("GET", "/api/events/all", &admin_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"].as_array().expect("events").len(), 2);

        let (status, body) = send(
            &router,
            authed_req("GET", "/api/events/all?status=Draft", &admin_token),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"].as_array().expect("events").len(), 1);

        let (status, _) = send(
            &router,
            authed_req("GET", "/api/events/all?status=Bogus", &admin_token),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn google_login_is_unavailable_without_configuration() {
        let (router, _, _dir) = test_app().await;
        let req = Request::builder()
            .uri("/auth/google")
            .body(Body::empty())
            .expect("request");
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn image_upload_is_stored_and_replaced_on_update() {
        let (router, state, _dir) = test_app().await;
        let (_organizer, token) = seed_user(&state, "org", users::ROLE_USER).await;

        let boundary = "VGhlRm9ybUJvdW5kYXJ5";
        let mut body = Vec::new();
        for (name, value) in event_fields(None) {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"poster.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"\x89PNG\r\n\x1a\nfakepixels");
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri("/api/events")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request");
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::OK);
        let image = body["event"]["image"].as_str().expect("image path");
        assert!(image.starts_with("uploads/events/"));
        assert!(image.ends_with(".png"));
        assert!(state.images.exists(image).await);
    }
}
