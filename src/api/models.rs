use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::data_models::{Applicant, ContactMessage, Internship, SiteSettings};
use crate::db::Paginated;
use crate::urls::{Destination, url_for};

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InternshipListParams {
    pub page: Option<u64>,
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplicantListParams {
    pub page: Option<u64>,
    pub internship: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct InternshipForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub location: String,
    pub location_type: Option<String>,
    #[serde(default)]
    pub deadline: String,
    pub duration: Option<String>,
    pub stipend: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MailRequest {
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub tagline: String,
    pub about_text: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub social_linkedin: Option<String>,
    pub social_twitter: Option<String>,
    pub social_facebook: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

/// What a mutation answers with: a human-readable outcome and where to go next.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub message: String,
    pub redirect: String,
}

impl ActionResponse {
    pub fn new(message: impl Into<String>, redirect: Destination<'_>) -> Self {
        Self {
            message: message.into(),
            redirect: url_for(redirect),
        }
    }
}

fn timestamp(dt: DateTime) -> String {
    dt.try_to_rfc3339_string().unwrap_or_default()
}

#[derive(Debug, Serialize)]
pub struct InternshipView {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub skills: String,
    pub location: String,
    pub location_type: String,
    pub deadline: String,
    pub duration: Option<String>,
    pub stipend: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub url: String,
    pub apply_url: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Internship> for InternshipView {
    fn from(internship: Internship) -> Self {
        InternshipView {
            id: internship.id.to_hex(),
            url: url_for(Destination::InternshipDetail(&internship.slug)),
            apply_url: url_for(Destination::Apply(&internship.slug)),
            deadline: internship.deadline.format("%Y-%m-%d").to_string(),
            created_at: timestamp(internship.created_at),
            updated_at: timestamp(internship.updated_at),
            title: internship.title,
            slug: internship.slug,
            description: internship.description,
            skills: internship.skills,
            location: internship.location,
            location_type: internship.location_type,
            duration: internship.duration,
            stipend: internship.stipend,
            image_url: internship.image_url,
            is_active: internship.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApplicantView {
    pub id: String,
    pub internship_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub resume_url: String,
    pub cover_letter: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub status: String,
    pub applied_at: String,
    pub url: String,
}

impl From<Applicant> for ApplicantView {
    fn from(applicant: Applicant) -> Self {
        ApplicantView {
            id: applicant.id.to_hex(),
            internship_id: applicant.internship_id.to_hex(),
            resume_url: url_for(Destination::Upload(&applicant.resume_path)),
            url: url_for(Destination::ViewApplicant(applicant.id)),
            status: applicant.status.to_string(),
            applied_at: timestamp(applicant.applied_at),
            full_name: applicant.full_name,
            email: applicant.email,
            phone: applicant.phone,
            cover_letter: applicant.cover_letter,
            linkedin_url: applicant.linkedin_url,
            portfolio_url: applicant.portfolio_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
    pub url: String,
}

impl From<ContactMessage> for MessageView {
    fn from(message: ContactMessage) -> Self {
        MessageView {
            id: message.id.to_hex(),
            url: url_for(Destination::ViewMessage(message.id)),
            created_at: timestamp(message.created_at),
            name: message.name,
            email: message.email,
            subject: message.subject,
            message: message.message,
            is_read: message.is_read,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub company_name: String,
    pub tagline: String,
    pub about_text: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub social_linkedin: Option<String>,
    pub social_twitter: Option<String>,
    pub social_facebook: Option<String>,
    pub logo_url: String,
}

impl From<SiteSettings> for SettingsView {
    fn from(settings: SiteSettings) -> Self {
        SettingsView {
            company_name: settings.company_name,
            tagline: settings.tagline,
            about_text: settings.about_text,
            contact_email: settings.contact_email,
            contact_phone: settings.contact_phone,
            social_linkedin: settings.social_linkedin,
            social_twitter: settings.social_twitter,
            social_facebook: settings.social_facebook,
            logo_url: settings.logo_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub settings: SettingsView,
    pub internships: Vec<InternshipView>,
}

#[derive(Debug, Serialize)]
pub struct InternshipListResponse {
    pub internships: Paginated<InternshipView>,
    pub location_filter: String,
}

#[derive(Debug, Serialize)]
pub struct InternshipDetailResponse {
    pub settings: SettingsView,
    pub internship: InternshipView,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_internships: u64,
    pub active_internships: u64,
    pub total_applicants: u64,
    pub pending_applicants: u64,
    pub total_messages: u64,
    pub unread_messages: u64,
    pub recent_applicants: Vec<ApplicantView>,
    pub recent_internships: Vec<InternshipView>,
    pub search_url: String,
}

#[derive(Debug, Serialize)]
pub struct ApplicantListResponse {
    pub applicants: Paginated<ApplicantView>,
    pub internships: Vec<InternshipView>,
    pub selected_internship: Option<String>,
    pub status_filter: String,
}

#[derive(Debug, Serialize)]
pub struct ApplicantDetailResponse {
    pub applicant: ApplicantView,
    pub internship: Option<InternshipView>,
    pub status_url: String,
}

#[derive(Debug, Serialize)]
pub struct MessageDetailResponse {
    pub message: MessageView,
    pub delete_url: String,
}

#[derive(Debug, Serialize)]
pub struct LoginStatus {
    pub login_required: bool,
    pub login_url: String,
}
