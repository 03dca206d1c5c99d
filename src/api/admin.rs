use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Local, NaiveDate};
use mongodb::bson::{DateTime, oid::ObjectId};

use crate::auth::{self, AdminSession, expired_session_cookie, session_cookie, session_token};
use crate::data_models::{ApplicantStatus, Internship, LOCATION_TYPES, create_slug};
use crate::db::{
    AdminRepo, ApplicantRepo, ContactMessageRepo, InternshipRepo, Paginated, SiteSettingsRepo,
};
use crate::error::{AppError, AppResult};
use crate::mail;
use crate::urls::{Destination, url_for};

use super::AppState;
use super::models::{
    ActionResponse, ApplicantDetailResponse, ApplicantListParams, ApplicantListResponse,
    ApplicantView, DashboardResponse, InternshipForm, InternshipView, LoginRequest, LoginStatus,
    MailRequest, MessageDetailResponse, MessageView, PageParams, SettingsForm, SettingsView,
    StatusUpdate,
};

const RECENT_ITEMS: i64 = 5;

/// Record ids come in as hex; anything else cannot name a record.
fn parse_id(raw: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| AppError::NotFound)
}

// =============================================================================
// Login / logout
// =============================================================================

pub async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let logged_in = session_token(&headers)
        .and_then(|token| state.sessions.get(&token))
        .is_some();
    if logged_in {
        return Redirect::to(&url_for(Destination::AdminDashboard)).into_response();
    }
    Json(LoginStatus {
        login_required: true,
        login_url: url_for(Destination::AdminLogin),
    })
    .into_response()
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Response> {
    let username = request.username.trim().to_string();
    let Some(admin) = AdminRepo::new(&state.db)
        .find_by_username(&username)
        .await?
    else {
        tracing::warn!(username = %username, "Failed admin login");
        return Err(AppError::InvalidCredentials);
    };

    // argon2 verification is CPU bound
    let stored = admin.password.clone();
    let verified =
        tokio::task::spawn_blocking(move || auth::verify_password(&stored, &request.password))
            .await
            .map_err(|e| anyhow::anyhow!("Password check aborted: {e}"))?;
    if !verified {
        tracing::warn!(username = %username, "Failed admin login");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.sessions.create(admin.id, &admin.username);
    let ttl = chrono::Duration::hours(state.config.session_ttl_hours);
    tracing::info!(username = %admin.username, "Admin logged in");

    Ok((
        [(header::SET_COOKIE, session_cookie(&token, ttl))],
        Redirect::to(&url_for(Destination::AdminDashboard)),
    )
        .into_response())
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(session) = session_token(&headers).and_then(|token| state.sessions.remove(&token))
    {
        tracing::info!(username = %session.username, "Admin logged out");
    }
    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to(&url_for(Destination::Index)),
    )
        .into_response()
}

// =============================================================================
// Dashboard
// =============================================================================

pub async fn dashboard(
    _session: AdminSession,
    State(state): State<AppState>,
) -> AppResult<Json<DashboardResponse>> {
    let internships = InternshipRepo::new(&state.db);
    let applicants = ApplicantRepo::new(&state.db);
    let messages = ContactMessageRepo::new(&state.db);

    Ok(Json(DashboardResponse {
        total_internships: internships.count_all().await?,
        active_internships: internships.count_active().await?,
        total_applicants: applicants.count_all().await?,
        pending_applicants: applicants.count_pending().await?,
        total_messages: messages.count_all().await?,
        unread_messages: messages.count_unread().await?,
        recent_applicants: applicants
            .recent(RECENT_ITEMS)
            .await?
            .into_iter()
            .map(Into::into)
            .collect(),
        recent_internships: internships
            .recent(RECENT_ITEMS)
            .await?
            .into_iter()
            .map(Into::into)
            .collect(),
        search_url: url_for(Destination::AdminSearch),
    }))
}

// =============================================================================
// Internships
// =============================================================================

/// Validated contents of the post/edit form.
struct InternshipFields {
    title: String,
    description: String,
    skills: String,
    location: String,
    location_type: String,
    deadline: NaiveDate,
    duration: Option<String>,
    stipend: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl TryFrom<InternshipForm> for InternshipFields {
    type Error = AppError;

    fn try_from(form: InternshipForm) -> Result<Self, Self::Error> {
        let title = form.title.trim().to_string();
        let description = form.description.trim().to_string();
        let skills = form.skills.trim().to_string();
        let location = form.location.trim().to_string();
        let deadline = form.deadline.trim();

        if title.is_empty()
            || description.is_empty()
            || skills.is_empty()
            || location.is_empty()
            || deadline.is_empty()
        {
            return Err(AppError::bad_request("Please fill all required fields."));
        }

        let deadline = NaiveDate::parse_from_str(deadline, "%Y-%m-%d")
            .map_err(|_| AppError::bad_request("Deadline must be a date in YYYY-MM-DD format."))?;

        let location_type = form
            .location_type
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "remote".to_string());
        if !LOCATION_TYPES.contains(&location_type.as_str()) {
            return Err(AppError::bad_request(format!(
                "Unknown location type: {location_type}"
            )));
        }

        Ok(InternshipFields {
            title,
            description,
            skills,
            location,
            location_type,
            deadline,
            duration: non_empty(form.duration),
            stipend: non_empty(form.stipend),
        })
    }
}

pub async fn post_internship(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(form): Json<InternshipForm>,
) -> AppResult<Json<ActionResponse>> {
    let fields = InternshipFields::try_from(form)?;
    let repo = InternshipRepo::new(&state.db);

    let mut slug = create_slug(&fields.title);
    if repo.slug_exists(&slug).await? {
        slug = format!("{slug}-{}", Local::now().format("%Y%m%d%H%M%S"));
    }

    let mut internship = Internship::new(
        fields.title,
        slug,
        fields.description,
        fields.skills,
        fields.location,
        fields.location_type,
        fields.deadline,
    );
    internship.duration = fields.duration;
    internship.stipend = fields.stipend;
    repo.insert(&internship).await?;
    tracing::info!(slug = %internship.slug, "Internship posted");

    Ok(Json(ActionResponse::new(
        "Internship posted successfully!",
        Destination::AdminInternships,
    )))
}

pub async fn internships(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Paginated<InternshipView>>> {
    let page = InternshipRepo::new(&state.db)
        .admin_page(params.page.unwrap_or(1))
        .await?;
    Ok(Json(page.map(Into::into)))
}

pub async fn edit_internship_page(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<InternshipView>> {
    let internship = InternshipRepo::new(&state.db)
        .find_by_id(parse_id(&id)?)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(internship.into()))
}

pub async fn edit_internship(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<InternshipForm>,
) -> AppResult<Json<ActionResponse>> {
    let repo = InternshipRepo::new(&state.db);
    let mut internship = repo
        .find_by_id(parse_id(&id)?)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_active = form.is_active.unwrap_or(false);
    let fields = InternshipFields::try_from(form)?;
    internship.title = fields.title;
    internship.description = fields.description;
    internship.skills = fields.skills;
    internship.location = fields.location;
    internship.location_type = fields.location_type;
    internship.deadline = fields.deadline;
    internship.duration = fields.duration;
    internship.stipend = fields.stipend;
    internship.is_active = is_active;
    internship.updated_at = DateTime::now();

    repo.update(&internship).await?;

    Ok(Json(ActionResponse::new(
        "Internship updated successfully!",
        Destination::AdminInternships,
    )))
}

pub async fn delete_internship(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ActionResponse>> {
    let id = parse_id(&id)?;
    if !InternshipRepo::new(&state.db).delete(id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(internship = %id, "Internship deleted");

    Ok(Json(ActionResponse::new(
        "Internship deleted successfully!",
        Destination::AdminInternships,
    )))
}

// =============================================================================
// Applicants
// =============================================================================

pub async fn applicants(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(params): Query<ApplicantListParams>,
) -> AppResult<Json<ApplicantListResponse>> {
    // unparseable filters are ignored, same as "all"
    let internship_id = params
        .internship
        .as_deref()
        .and_then(|raw| ObjectId::parse_str(raw.trim()).ok());
    let status = params
        .status
        .as_deref()
        .and_then(|raw| raw.parse::<ApplicantStatus>().ok());

    let page = ApplicantRepo::new(&state.db)
        .list_page(internship_id, status, params.page.unwrap_or(1))
        .await?;
    let internships = InternshipRepo::new(&state.db).list_all().await?;

    Ok(Json(ApplicantListResponse {
        applicants: page.map(Into::into),
        internships: internships.into_iter().map(Into::into).collect(),
        selected_internship: internship_id.map(|id| id.to_hex()),
        status_filter: status.map_or("all", |s| s.as_str()).to_string(),
    }))
}

pub async fn view_applicant(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApplicantDetailResponse>> {
    let applicant = ApplicantRepo::new(&state.db)
        .find_by_id(parse_id(&id)?)
        .await?
        .ok_or(AppError::NotFound)?;
    let internship = InternshipRepo::new(&state.db)
        .find_by_id(applicant.internship_id)
        .await?;

    Ok(Json(ApplicantDetailResponse {
        status_url: url_for(Destination::ApplicantStatus(applicant.id)),
        applicant: applicant.into(),
        internship: internship.map(Into::into),
    }))
}

pub async fn update_applicant_status(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> AppResult<Json<ActionResponse>> {
    let id = parse_id(&id)?;
    let status = match update.status.as_deref() {
        None => ApplicantStatus::Pending,
        Some(raw) => raw.parse::<ApplicantStatus>().map_err(AppError::BadRequest)?,
    };

    if !ApplicantRepo::new(&state.db).set_status(id, status).await? {
        return Err(AppError::NotFound);
    }

    Ok(Json(ActionResponse::new(
        "Status updated successfully!",
        Destination::ViewApplicant(id),
    )))
}

// =============================================================================
// Mail
// =============================================================================

pub async fn mail_page(
    _session: AdminSession,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ApplicantView>>> {
    let applicants = ApplicantRepo::new(&state.db).newest_first().await?;
    Ok(Json(applicants.into_iter().map(Into::into).collect()))
}

pub async fn send_mail(
    session: AdminSession,
    State(state): State<AppState>,
    Json(request): Json<MailRequest>,
) -> AppResult<Json<ActionResponse>> {
    let subject = request.subject.trim();
    let body = request.message.trim();
    if request.recipients.is_empty() || subject.is_empty() || body.is_empty() {
        return Err(AppError::bad_request(
            "Please fill all required fields and select recipients.",
        ));
    }

    let ids: Vec<ObjectId> = request
        .recipients
        .iter()
        .filter_map(|raw| ObjectId::parse_str(raw.trim()).ok())
        .collect();
    let recipients = ApplicantRepo::new(&state.db).find_many(&ids).await?;
    let settings = SiteSettingsRepo::new(&state.db).get_or_create().await?;

    for recipient in &recipients {
        let email = mail::custom_email(recipient, subject, body, &settings);
        state.mailer.send(email).await?;
    }
    tracing::info!(
        admin = %session.username,
        recipients = recipients.len(),
        "Bulk email sent"
    );

    Ok(Json(ActionResponse::new(
        format!(
            "Email sent successfully to {} recipient(s)!",
            recipients.len()
        ),
        Destination::AdminMail,
    )))
}

// =============================================================================
// Contact messages
// =============================================================================

pub async fn messages(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Paginated<MessageView>>> {
    let page = ContactMessageRepo::new(&state.db)
        .page(params.page.unwrap_or(1))
        .await?;
    Ok(Json(page.map(Into::into)))
}

pub async fn view_message(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageDetailResponse>> {
    let message = ContactMessageRepo::new(&state.db)
        .open(parse_id(&id)?)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(MessageDetailResponse {
        delete_url: url_for(Destination::DeleteMessage(message.id)),
        message: message.into(),
    }))
}

pub async fn delete_message(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ActionResponse>> {
    if !ContactMessageRepo::new(&state.db)
        .delete(parse_id(&id)?)
        .await?
    {
        return Err(AppError::NotFound);
    }

    Ok(Json(ActionResponse::new(
        "Message deleted successfully!",
        Destination::AdminMessages,
    )))
}

// =============================================================================
// Site settings
// =============================================================================

pub async fn settings(
    _session: AdminSession,
    State(state): State<AppState>,
) -> AppResult<Json<SettingsView>> {
    let settings = SiteSettingsRepo::new(&state.db).get_or_create().await?;
    Ok(Json(settings.into()))
}

pub async fn update_settings(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(form): Json<SettingsForm>,
) -> AppResult<Json<ActionResponse>> {
    let repo = SiteSettingsRepo::new(&state.db);
    let mut settings = repo.get_or_create().await?;

    settings.company_name = form.company_name.trim().to_string();
    settings.tagline = form.tagline.trim().to_string();
    settings.about_text = non_empty(form.about_text);
    settings.contact_email = non_empty(form.contact_email);
    settings.contact_phone = non_empty(form.contact_phone);
    settings.social_linkedin = non_empty(form.social_linkedin);
    settings.social_twitter = non_empty(form.social_twitter);
    settings.social_facebook = non_empty(form.social_facebook);

    repo.update(&settings).await?;

    Ok(Json(ActionResponse::new(
        "Settings updated successfully!",
        Destination::AdminSettings,
    )))
}
