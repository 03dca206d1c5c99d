use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, Query, State},
};

use crate::data_models::{Applicant, ContactMessage, LOCATION_TYPES};
use crate::db::{ApplicantRepo, ContactMessageRepo, InternshipRepo, SiteSettingsRepo};
use crate::error::{AppError, AppResult};
use crate::mail;
use crate::uploads::allowed_file;
use crate::urls::Destination;

use super::AppState;
use super::models::{
    ActionResponse, ContactForm, HomeResponse, InternshipDetailResponse, InternshipListParams,
    InternshipListResponse,
};

const FEATURED_INTERNSHIPS: i64 = 6;

pub async fn index(State(state): State<AppState>) -> AppResult<Json<HomeResponse>> {
    let settings = SiteSettingsRepo::new(&state.db).get_or_create().await?;
    let featured = InternshipRepo::new(&state.db)
        .featured(FEATURED_INTERNSHIPS)
        .await?;

    Ok(Json(HomeResponse {
        settings: settings.into(),
        internships: featured.into_iter().map(Into::into).collect(),
    }))
}

/// `all` and unknown values mean no filter.
fn location_filter(raw: Option<&str>) -> Option<&'static str> {
    let raw = raw?.trim().to_lowercase();
    LOCATION_TYPES.iter().copied().find(|t| *t == raw)
}

pub async fn internships(
    State(state): State<AppState>,
    Query(params): Query<InternshipListParams>,
) -> AppResult<Json<InternshipListResponse>> {
    let filter = location_filter(params.location.as_deref());
    let page = InternshipRepo::new(&state.db)
        .list_active_page(filter, params.page.unwrap_or(1))
        .await?;

    Ok(Json(InternshipListResponse {
        internships: page.map(Into::into),
        location_filter: filter.unwrap_or("all").to_string(),
    }))
}

pub async fn internship_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<InternshipDetailResponse>> {
    let settings = SiteSettingsRepo::new(&state.db).get_or_create().await?;
    let internship = InternshipRepo::new(&state.db)
        .find_by_slug(&slug, true)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(InternshipDetailResponse {
        settings: settings.into(),
        internship: internship.into(),
    }))
}

/// The fields of an application form, read off a multipart body.
#[derive(Debug, Default)]
struct ApplicationForm {
    fields: HashMap<String, String>,
    resume: Option<(String, Bytes)>,
}

impl ApplicationForm {
    async fn read(multipart: &mut Multipart) -> AppResult<Self> {
        let mut form = ApplicationForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::bad_request(format!("Malformed form data: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "resume" {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(format!("Failed to read resume: {e}")))?;
                form.resume = Some((filename, bytes));
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::bad_request(format!("Malformed field {name}: {e}")))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    fn text(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    fn optional(&self, name: &str) -> Option<String> {
        Some(self.text(name)).filter(|v| !v.is_empty())
    }
}

pub async fn apply(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<ActionResponse>> {
    let settings = SiteSettingsRepo::new(&state.db).get_or_create().await?;
    let internship = InternshipRepo::new(&state.db)
        .find_by_slug(&slug, true)
        .await?
        .ok_or(AppError::NotFound)?;

    let form = ApplicationForm::read(&mut multipart).await?;
    let full_name = form.text("full_name");
    let email = form.text("email");
    let phone = form.text("phone");
    if full_name.is_empty() || email.is_empty() || phone.is_empty() {
        return Err(AppError::bad_request("Please fill all required fields."));
    }

    let Some((filename, bytes)) = &form.resume else {
        return Err(AppError::bad_request("Resume is required."));
    };
    if filename.is_empty() {
        return Err(AppError::bad_request("Please select a resume file."));
    }
    if !allowed_file(filename) {
        return Err(AppError::bad_request(
            "Invalid file format. Please upload PDF, DOC, or DOCX.",
        ));
    }

    let resume_path = state.uploads.save(filename, bytes).await?;

    let mut applicant = Applicant::new(internship.id, full_name, email, phone, resume_path);
    applicant.cover_letter = form.optional("cover_letter");
    applicant.linkedin_url = form.optional("linkedin_url");
    applicant.portfolio_url = form.optional("portfolio_url");
    ApplicantRepo::new(&state.db).insert(&applicant).await?;

    tracing::info!(
        internship = %internship.slug,
        applicant = %applicant.id,
        "Application received"
    );

    let confirmation = mail::application_confirmation(&applicant, &internship, &settings);
    if let Err(e) = state.mailer.send(confirmation).await {
        tracing::warn!("Email error: {e:#}");
    }

    Ok(Json(ActionResponse::new(
        "Application submitted successfully! We will contact you soon.",
        Destination::Internships,
    )))
}

pub async fn contact(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> AppResult<Json<ActionResponse>> {
    let name = form.name.trim().to_string();
    let email = form.email.trim().to_string();
    let message = form.message.trim().to_string();
    if name.is_empty() || email.is_empty() || message.is_empty() {
        return Err(AppError::bad_request("Please fill all required fields."));
    }
    let subject = form
        .subject
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let contact_message = ContactMessage::new(name, email, subject, message);
    ContactMessageRepo::new(&state.db)
        .insert(&contact_message)
        .await?;

    Ok(Json(ActionResponse::new(
        "Your message has been sent successfully!",
        Destination::Contact,
    )))
}
