use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::auth::SessionStore;
use crate::config::Config;
use crate::db::Database;
use crate::mail::Mailer;
use crate::uploads::UploadStore;

pub mod admin;
pub mod handlers;
pub mod models;
pub mod public;

/// Shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: Arc<SessionStore>,
    pub mailer: Arc<dyn Mailer>,
    pub uploads: UploadStore,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self {
            db,
            sessions: Arc::new(SessionStore::new(chrono::Duration::hours(
                config.session_ttl_hours,
            ))),
            mailer,
            uploads: UploadStore::new(&config.upload_folder),
            config: Arc::new(config),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin_routes = Router::new()
        .route("/login", get(admin::login_page).post(admin::login))
        .route("/logout", get(admin::logout))
        .route("/dashboard", get(admin::dashboard))
        .route("/post_intern", post(admin::post_internship))
        .route("/internships", get(admin::internships))
        .route(
            "/internships/:id/edit",
            get(admin::edit_internship_page).post(admin::edit_internship),
        )
        .route("/internships/:id/delete", post(admin::delete_internship))
        .route("/applicants", get(admin::applicants))
        .route("/applicants/:id", get(admin::view_applicant))
        .route("/applicants/:id/status", post(admin::update_applicant_status))
        .route("/mail", get(admin::mail_page).post(admin::send_mail))
        .route("/messages", get(admin::messages))
        .route("/messages/:id", get(admin::view_message))
        .route("/messages/:id/delete", post(admin::delete_message))
        .route("/settings", get(admin::settings).post(admin::update_settings))
        .route("/search", get(handlers::search_handler));

    let uploads = ServeDir::new(state.uploads.root());
    let static_files = ServeDir::new(&state.config.static_dir);
    let body_limit = state.config.max_content_length;

    Router::new()
        .route("/", get(public::index))
        .route("/internships", get(public::internships))
        .route("/internships/:slug", get(public::internship_detail))
        .route(
            "/apply/:slug",
            get(public::internship_detail).post(public::apply),
        )
        .route("/contact", post(public::contact))
        .nest("/admin", admin_routes)
        .nest_service("/uploads", uploads)
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
