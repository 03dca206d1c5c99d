use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use mongodb::bson::oid::ObjectId;
use tower::ServiceExt;

use internboard::api::{AppState, create_router};
use internboard::config::Config;
use internboard::db::Database;
use internboard::mail::MemoryMailer;

mod test_helpers {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static TEST_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

    pub fn unique_test_db_name() -> String {
        let count = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let timestamp = chrono::Utc::now().timestamp_millis();
        format!("internboard_api_test_{}_{}", timestamp, count)
    }

    pub fn test_uri() -> String {
        dotenvy::dotenv().ok();
        std::env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
    }

    /// State over a client that has not talked to MongoDB yet. Only routes that
    /// finish before touching storage may be exercised with it.
    pub async fn offline_state() -> Result<AppState> {
        let db = Database::connect_lazy(&test_uri(), &unique_test_db_name()).await?;
        Ok(AppState::new(
            db,
            Arc::new(MemoryMailer::default()),
            Config::default(),
        ))
    }

    pub fn get(uri: &str, session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = session {
            builder = builder.header(header::COOKIE, format!("internboard_session={token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    pub async fn body_json(app: Router, request: Request<Body>) -> Result<(StatusCode, serde_json::Value)> {
        let response = app.oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }
}

use test_helpers::*;

mod auth_guard {
    use super::*;

    #[tokio::test]
    async fn test_search_redirects_without_session() -> Result<()> {
        let app = create_router(offline_state().await?);
        let response = app.oneshot(get("/admin/search?q=dashboard", None)).await?;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/admin/login");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_session_redirects() -> Result<()> {
        let app = create_router(offline_state().await?);
        let response = app
            .oneshot(get("/admin/dashboard", Some("not-a-real-token")))
            .await?;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/admin/login");
        Ok(())
    }

    #[tokio::test]
    async fn test_every_admin_page_is_guarded() -> Result<()> {
        let state = offline_state().await?;
        let id = ObjectId::new().to_hex();
        let pages = [
            "/admin/dashboard".to_string(),
            "/admin/internships".to_string(),
            format!("/admin/internships/{id}/edit"),
            "/admin/applicants".to_string(),
            format!("/admin/applicants/{id}"),
            "/admin/mail".to_string(),
            "/admin/messages".to_string(),
            format!("/admin/messages/{id}"),
            "/admin/settings".to_string(),
            "/admin/search".to_string(),
        ];

        for page in pages {
            let response = create_router(state.clone()).oneshot(get(&page, None)).await?;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{page}");
        }
        Ok(())
    }
}

mod search_endpoint {
    use super::*;

    #[tokio::test]
    async fn test_empty_query_returns_empty_array() -> Result<()> {
        let state = offline_state().await?;
        let token = state.sessions.create(ObjectId::new(), "admin");

        for uri in ["/admin/search", "/admin/search?q=", "/admin/search?q=%20%20"] {
            let (status, body) =
                body_json(create_router(state.clone()), get(uri, Some(&token))).await?;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body, serde_json::json!([]), "{uri}");
        }
        Ok(())
    }
}

mod sessions {
    use super::*;

    #[tokio::test]
    async fn test_login_page_when_logged_out() -> Result<()> {
        let app = create_router(offline_state().await?);
        let (status, body) = body_json(app, get("/admin/login", None)).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["login_required"], true);
        Ok(())
    }

    #[tokio::test]
    async fn test_login_page_redirects_when_logged_in() -> Result<()> {
        let state = offline_state().await?;
        let token = state.sessions.create(ObjectId::new(), "admin");
        let response = create_router(state)
            .oneshot(get("/admin/login", Some(&token)))
            .await?;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/admin/dashboard");
        Ok(())
    }

    #[tokio::test]
    async fn test_logout_drops_session() -> Result<()> {
        let state = offline_state().await?;
        let token = state.sessions.create(ObjectId::new(), "admin");

        let response = create_router(state.clone())
            .oneshot(get("/admin/logout", Some(&token)))
            .await?;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        let cookie = response.headers()[header::SET_COOKIE].to_str()?;
        assert!(cookie.contains("Max-Age=0"));

        assert!(state.sessions.get(&token).is_none());
        Ok(())
    }
}

/// Full round trips against a live MongoDB.
mod with_database {
    use super::*;
    use chrono::NaiveDate;
    use internboard::data_models::{Applicant, Internship};
    use internboard::db::{ApplicantRepo, InternshipRepo};

    async fn live_state() -> Result<(AppState, String)> {
        let db_name = unique_test_db_name();
        let db = Database::new(&test_uri(), &db_name).await?;
        let state = AppState::new(db, Arc::new(MemoryMailer::default()), Config::default());
        Ok((state, db_name))
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB"]
    async fn test_search_reads_fresh_records() -> Result<()> {
        let (state, db_name) = live_state().await?;
        let token = state.sessions.create(ObjectId::new(), "admin");

        let internship = Internship::new(
            "Data Analyst".to_string(),
            "data-analyst".to_string(),
            "Crunch numbers".to_string(),
            "SQL".to_string(),
            "Remote".to_string(),
            "remote".to_string(),
            NaiveDate::from_ymd_opt(2030, 1, 31).unwrap(),
        );
        InternshipRepo::new(&state.db).insert(&internship).await?;

        let (_, body) = body_json(
            create_router(state.clone()),
            get("/admin/search?q=asha", Some(&token)),
        )
        .await?;
        assert_eq!(body, serde_json::json!([]));

        let applicant = Applicant::new(
            internship.id,
            "Asha Rao".to_string(),
            "asha@example.com".to_string(),
            "555-0100".to_string(),
            "resume.pdf".to_string(),
        );
        ApplicantRepo::new(&state.db).insert(&applicant).await?;

        let (status, body) = body_json(
            create_router(state.clone()),
            get("/admin/search?q=asha", Some(&token)),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["title"], "Asha Rao");
        assert_eq!(
            body[0]["subtitle"],
            "asha@example.com • Applied for Data Analyst"
        );

        state.db.client().database(&db_name).drop().await?;
        Ok(())
    }
}
