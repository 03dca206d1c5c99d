use mongodb::bson::oid::ObjectId;

/// Named places in the site. Handlers and the admin search resolve links through
/// `url_for` so route paths live in one spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination<'a> {
    Index,
    Internships,
    InternshipDetail(&'a str),
    Apply(&'a str),
    Contact,
    Upload(&'a str),
    AdminLogin,
    AdminLogout,
    AdminDashboard,
    PostInternship,
    AdminInternships,
    EditInternship(ObjectId),
    AdminApplicants,
    ViewApplicant(ObjectId),
    ApplicantStatus(ObjectId),
    AdminMail,
    AdminMessages,
    ViewMessage(ObjectId),
    DeleteMessage(ObjectId),
    AdminSettings,
    AdminSearch,
}

pub fn url_for(destination: Destination<'_>) -> String {
    match destination {
        Destination::Index => "/".to_string(),
        Destination::Internships => "/internships".to_string(),
        Destination::InternshipDetail(slug) => format!("/internships/{slug}"),
        Destination::Apply(slug) => format!("/apply/{slug}"),
        Destination::Contact => "/contact".to_string(),
        Destination::Upload(filename) => format!("/uploads/{filename}"),
        Destination::AdminLogin => "/admin/login".to_string(),
        Destination::AdminLogout => "/admin/logout".to_string(),
        Destination::AdminDashboard => "/admin/dashboard".to_string(),
        Destination::PostInternship => "/admin/post_intern".to_string(),
        Destination::AdminInternships => "/admin/internships".to_string(),
        Destination::EditInternship(id) => format!("/admin/internships/{}/edit", id.to_hex()),
        Destination::AdminApplicants => "/admin/applicants".to_string(),
        Destination::ViewApplicant(id) => format!("/admin/applicants/{}", id.to_hex()),
        Destination::ApplicantStatus(id) => format!("/admin/applicants/{}/status", id.to_hex()),
        Destination::AdminMail => "/admin/mail".to_string(),
        Destination::AdminMessages => "/admin/messages".to_string(),
        Destination::ViewMessage(id) => format!("/admin/messages/{}", id.to_hex()),
        Destination::DeleteMessage(id) => format!("/admin/messages/{}/delete", id.to_hex()),
        Destination::AdminSettings => "/admin/settings".to_string(),
        Destination::AdminSearch => "/admin/search".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_destinations_use_hex_ids() {
        let id = ObjectId::parse_str("65a1b2c3d4e5f60718293a4b").unwrap();
        assert_eq!(
            url_for(Destination::EditInternship(id)),
            "/admin/internships/65a1b2c3d4e5f60718293a4b/edit"
        );
        assert_eq!(
            url_for(Destination::ViewApplicant(id)),
            "/admin/applicants/65a1b2c3d4e5f60718293a4b"
        );
        assert_eq!(url_for(Destination::Apply("data-analyst")), "/apply/data-analyst");
    }
}
