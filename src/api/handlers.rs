use axum::{
    Json,
    extract::{Query, State},
};
use std::time::Instant;

use crate::auth::AdminSession;
use crate::db::{ApplicantRepo, InternshipRepo};
use crate::error::AppResult;
use crate::search::{self, SearchResult, normalize_query};

use super::AppState;
use super::models::SearchParams;

/// Admin instant search. Re-reads every internship and applicant on each call.
pub async fn search_handler(
    session: AdminSession,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<SearchResult>>> {
    let start = Instant::now();

    let Some(query) = params.q.as_deref().and_then(normalize_query) else {
        return Ok(Json(Vec::new()));
    };

    let internships = InternshipRepo::new(&state.db).list_all().await?;
    let applicants = ApplicantRepo::new(&state.db).list_all().await?;

    let results = search::search(&query, &internships, &applicants);

    tracing::debug!(
        admin = %session.username,
        query = %query,
        catalog = search::SHORTCUTS.len() + internships.len() + applicants.len(),
        results = results.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Admin search"
    );

    Ok(Json(results))
}
