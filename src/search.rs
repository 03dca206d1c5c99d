//! Admin instant search.
//!
//! Every call assembles a catalog out of the fixed navigation shortcuts plus one entry
//! per internship and applicant currently in storage, then keeps the entries whose
//! title, keywords, category or subtitle match the query. Nothing is cached, so results
//! always reflect the records passed in.

use std::collections::HashMap;

use mongodb::bson::oid::ObjectId;
use serde::Serialize;

use crate::data_models::{Applicant, Internship};
use crate::urls::{Destination, url_for};

/// Upper bound on the number of results a single search returns.
pub const MAX_RESULTS: usize = 15;

/// A hand-authored admin navigation target.
#[derive(Debug)]
pub struct Shortcut {
    pub title: &'static str,
    pub destination: Destination<'static>,
    pub icon: &'static str,
    pub category: &'static str,
    pub keywords: &'static [&'static str],
}

pub const SHORTCUTS: &[Shortcut] = &[
    Shortcut {
        title: "Dashboard",
        destination: Destination::AdminDashboard,
        icon: "home",
        category: "Navigation",
        keywords: &["home", "overview", "stats", "statistics", "dashboard"],
    },
    Shortcut {
        title: "Post Internship",
        destination: Destination::PostInternship,
        icon: "plus-circle",
        category: "Internships",
        keywords: &["create", "add", "new", "posting", "post", "internship"],
    },
    Shortcut {
        title: "Manage Internships",
        destination: Destination::AdminInternships,
        icon: "briefcase",
        category: "Internships",
        keywords: &["edit", "delete", "view", "all", "manage", "internship", "internships"],
    },
    Shortcut {
        title: "All Applicants",
        destination: Destination::AdminApplicants,
        icon: "users",
        category: "Applications",
        keywords: &["candidates", "applications", "resumes", "applicants", "applicant"],
    },
    Shortcut {
        title: "Send Email",
        destination: Destination::AdminMail,
        icon: "envelope",
        category: "Communication",
        keywords: &["mail", "message", "contact", "send", "email"],
    },
    Shortcut {
        title: "Messages",
        destination: Destination::AdminMessages,
        icon: "inbox",
        category: "Communication",
        keywords: &["inbox", "contact", "queries", "feedback", "messages", "message"],
    },
    Shortcut {
        title: "Site Settings",
        destination: Destination::AdminSettings,
        icon: "cog",
        category: "Settings",
        keywords: &["configuration", "preferences", "setup", "settings", "site"],
    },
    Shortcut {
        title: "View Site",
        destination: Destination::Index,
        icon: "external-link-alt",
        category: "Navigation",
        keywords: &["website", "public", "frontend", "view", "site"],
    },
    Shortcut {
        title: "Logout",
        destination: Destination::AdminLogout,
        icon: "sign-out-alt",
        category: "Account",
        keywords: &["signout", "exit", "leave", "logout"],
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct SearchableItem {
    pub title: String,
    pub url: String,
    pub icon: &'static str,
    pub category: &'static str,
    pub keywords: Vec<String>,
    pub subtitle: Option<String>,
}

impl From<&Shortcut> for SearchableItem {
    fn from(shortcut: &Shortcut) -> Self {
        SearchableItem {
            title: shortcut.title.to_string(),
            url: url_for(shortcut.destination),
            icon: shortcut.icon,
            category: shortcut.category,
            keywords: shortcut.keywords.iter().map(|k| k.to_string()).collect(),
            subtitle: None,
        }
    }
}

impl From<&Internship> for SearchableItem {
    fn from(internship: &Internship) -> Self {
        SearchableItem {
            title: internship.title.clone(),
            url: url_for(Destination::EditInternship(internship.id)),
            icon: "briefcase",
            category: "Internship",
            keywords: vec![
                internship.location.to_lowercase(),
                internship.skills.to_lowercase(),
                internship.location_type.to_lowercase(),
                internship.title.to_lowercase(),
            ],
            subtitle: Some(format!(
                "{} • {}",
                internship.location, internship.location_type
            )),
        }
    }
}

impl SearchableItem {
    /// `internship_title` is empty when the applicant points at a deleted posting.
    pub fn from_applicant(applicant: &Applicant, internship_title: &str) -> Self {
        SearchableItem {
            title: applicant.full_name.clone(),
            url: url_for(Destination::ViewApplicant(applicant.id)),
            icon: "user",
            category: "Applicant",
            keywords: vec![
                applicant.email.to_lowercase(),
                applicant.phone.clone(),
                internship_title.to_lowercase(),
                applicant.full_name.to_lowercase(),
            ],
            subtitle: Some(format!(
                "{} • Applied for {}",
                applicant.email, internship_title
            )),
        }
    }

    /// `query` must already be trimmed and lower-cased.
    pub fn matches(&self, query: &str) -> bool {
        matches(&self.title, query)
            || self.keywords.iter().any(|keyword| matches(keyword, query))
            || matches(self.category, query)
            || self
                .subtitle
                .as_deref()
                .is_some_and(|subtitle| !subtitle.is_empty() && matches(subtitle, query))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub icon: String,
    pub category: String,
    pub subtitle: String,
}

impl From<SearchableItem> for SearchResult {
    fn from(item: SearchableItem) -> Self {
        SearchResult {
            title: item.title,
            url: item.url,
            icon: item.icon.to_string(),
            category: item.category.to_string(),
            subtitle: item.subtitle.unwrap_or_default(),
        }
    }
}

/// Substring match, or any whitespace-separated word of `text` starting with `query`.
/// Case-insensitive on `text`.
pub fn matches(text: &str, query: &str) -> bool {
    let text = text.to_lowercase();
    let query = query.to_lowercase();

    text.contains(&query) || text.split_whitespace().any(|word| word.starts_with(&query))
}

/// Trim and lower-case a raw query. `None` when nothing is left to search for.
pub fn normalize_query(raw: &str) -> Option<String> {
    let query = raw.trim().to_lowercase();
    (!query.is_empty()).then_some(query)
}

/// Shortcuts first, then internships and applicants in the order they were fetched.
pub fn build_catalog(
    internships: &[Internship],
    applicants: &[Applicant],
) -> Vec<SearchableItem> {
    let titles: HashMap<ObjectId, &str> = internships
        .iter()
        .map(|internship| (internship.id, internship.title.as_str()))
        .collect();

    let mut catalog = Vec::with_capacity(SHORTCUTS.len() + internships.len() + applicants.len());
    catalog.extend(SHORTCUTS.iter().map(SearchableItem::from));
    catalog.extend(internships.iter().map(SearchableItem::from));
    catalog.extend(applicants.iter().map(|applicant| {
        let internship_title = titles
            .get(&applicant.internship_id)
            .copied()
            .unwrap_or_default();
        SearchableItem::from_applicant(applicant, internship_title)
    }));
    catalog
}

/// Filter the catalog built from these records, keeping catalog order and at most
/// `MAX_RESULTS` entries.
pub fn search(
    raw_query: &str,
    internships: &[Internship],
    applicants: &[Applicant],
) -> Vec<SearchResult> {
    let Some(query) = normalize_query(raw_query) else {
        return Vec::new();
    };

    build_catalog(internships, applicants)
        .into_iter()
        .filter(|item| item.matches(&query))
        .take(MAX_RESULTS)
        .map(SearchResult::from)
        .collect()
}
