use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Deserializer, Serialize};

/// Where the work happens. Stored lower-case, `remote` when the form leaves it out.
pub const LOCATION_TYPES: [&str; 3] = ["remote", "onsite", "hybrid"];

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Internship {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location: String,
    #[serde(
        default = "default_location_type",
        deserialize_with = "null_as_location_type"
    )]
    pub location_type: String,
    pub deadline: NaiveDate,
    pub duration: Option<String>,
    pub stipend: Option<String>,
    /// JSON-encoded list of extra form fields the applicant must fill.
    pub required_fields: Option<String>,
    pub optional_fields: Option<String>,
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

fn default_location_type() -> String {
    "remote".to_string()
}

fn default_true() -> bool {
    true
}

/// Older records carry explicit nulls for text they never filled in.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_location_type<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_location_type))
}

impl Internship {
    pub fn new(
        title: String,
        slug: String,
        description: String,
        skills: String,
        location: String,
        location_type: String,
        deadline: NaiveDate,
    ) -> Internship {
        let now = DateTime::now();
        Internship {
            id: ObjectId::new(),
            title,
            slug,
            description,
            skills,
            location,
            location_type,
            deadline,
            duration: None,
            stipend: None,
            required_fields: None,
            optional_fields: None,
            image_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lower-cases the title and turns spaces and slashes into dashes.
pub fn create_slug(title: &str) -> String {
    title.to_lowercase().replace([' ', '/'], "-")
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplicantStatus {
    #[default]
    Pending,
    Reviewed,
    Shortlisted,
    Rejected,
}

impl ApplicantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicantStatus::Pending => "pending",
            ApplicantStatus::Reviewed => "reviewed",
            ApplicantStatus::Shortlisted => "shortlisted",
            ApplicantStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ApplicantStatus::Pending),
            "reviewed" => Ok(ApplicantStatus::Reviewed),
            "shortlisted" => Ok(ApplicantStatus::Shortlisted),
            "rejected" => Ok(ApplicantStatus::Rejected),
            other => Err(format!("unknown applicant status: {other}")),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Applicant {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub internship_id: ObjectId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub resume_path: String,
    pub cover_letter: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    /// JSON-encoded answers to the internship's extra fields.
    pub additional_info: Option<String>,
    #[serde(default)]
    pub status: ApplicantStatus,
    pub applied_at: DateTime,
}

impl Applicant {
    pub fn new(
        internship_id: ObjectId,
        full_name: String,
        email: String,
        phone: String,
        resume_path: String,
    ) -> Applicant {
        Applicant {
            id: ObjectId::new(),
            internship_id,
            full_name,
            email,
            phone,
            resume_path,
            cover_letter: None,
            linkedin_url: None,
            portfolio_url: None,
            additional_info: None,
            status: ApplicantStatus::Pending,
            applied_at: DateTime::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    /// Salted hash, see `auth::hash_password`.
    pub password: String,
    pub email: String,
    pub created_at: DateTime,
}

impl Admin {
    pub fn new(username: String, password_hash: String, email: String) -> Admin {
        Admin {
            id: ObjectId::new(),
            username,
            password: password_hash,
            email,
            created_at: DateTime::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SiteSettings {
    #[serde(rename = "_id")]
    pub id: ObjectId,
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

impl Default for SiteSettings {
    fn default() -> Self {
        SiteSettings {
            id: ObjectId::new(),
            company_name: "Internboard".to_string(),
            tagline: "Empowering Careers Through Excellence".to_string(),
            about_text: None,
            contact_email: None,
            contact_phone: None,
            social_linkedin: None,
            social_twitter: None,
            social_facebook: None,
            logo_url: "/static/img/logo.png".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ContactMessage {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: DateTime,
    #[serde(default)]
    pub is_read: bool,
}

impl ContactMessage {
    pub fn new(name: String, email: String, subject: Option<String>, message: String) -> Self {
        ContactMessage {
            id: ObjectId::new(),
            name,
            email,
            subject,
            message,
            created_at: DateTime::now(),
            is_read: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{Bson, doc, from_document};

    #[test]
    fn test_create_slug() {
        assert_eq!(create_slug("Data Analyst"), "data-analyst");
        assert_eq!(create_slug("UI/UX Design Intern"), "ui-ux-design-intern");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Shortlisted".parse::<ApplicantStatus>(), Ok(ApplicantStatus::Shortlisted));
        assert!("hired".parse::<ApplicantStatus>().is_err());
        assert_eq!(ApplicantStatus::default().to_string(), "pending");
    }

    #[test]
    fn test_internship_missing_text_fields_deserialize_empty() {
        let stored = doc! {
            "_id": ObjectId::new(),
            "title": "Data Analyst",
            "slug": "data-analyst",
            "deadline": "2030-01-31",
            "created_at": DateTime::now(),
            "updated_at": DateTime::now(),
        };
        let internship: Internship = from_document(stored).unwrap();
        assert_eq!(internship.skills, "");
        assert_eq!(internship.location, "");
        assert_eq!(internship.location_type, "remote");
        assert!(internship.is_active);
    }

    #[test]
    fn test_internship_null_text_fields_deserialize_empty() {
        let stored = doc! {
            "_id": ObjectId::new(),
            "title": "Data Analyst",
            "slug": "data-analyst",
            "description": Bson::Null,
            "skills": Bson::Null,
            "location": Bson::Null,
            "location_type": Bson::Null,
            "deadline": "2030-01-31",
            "created_at": DateTime::now(),
            "updated_at": DateTime::now(),
        };
        let internship: Internship = from_document(stored).unwrap();
        assert_eq!(internship.description, "");
        assert_eq!(internship.skills, "");
        assert_eq!(internship.location, "");
        assert_eq!(internship.location_type, "remote");
    }

    #[test]
    fn test_applicant_null_text_fields_deserialize_empty() {
        let stored = doc! {
            "_id": ObjectId::new(),
            "internship_id": ObjectId::new(),
            "full_name": "Asha Rao",
            "email": Bson::Null,
            "phone": Bson::Null,
            "resume_path": Bson::Null,
            "status": "pending",
            "applied_at": DateTime::now(),
        };
        let applicant: Applicant = from_document(stored).unwrap();
        assert_eq!(applicant.full_name, "Asha Rao");
        assert_eq!(applicant.email, "");
        assert_eq!(applicant.phone, "");
        assert_eq!(applicant.resume_path, "");
    }
}
