use anyhow::{Result, anyhow};
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, HeaderValue, header, request::Parts};
use axum::response::Redirect;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use mongodb::bson::oid::ObjectId;
use nanoid::nanoid;

use crate::api::AppState;
use crate::urls::{Destination, url_for};

pub const SESSION_COOKIE: &str = "internboard_session";

/// Argon2id with a fresh random salt, encoded as a PHC string
/// (`$argon2id$v=19$m=...,t=...,p=...$<salt>$<hash>`).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {e}"))
}

/// False for a wrong password and for anything that is not a PHC hash.
pub fn verify_password(stored: &str, password: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is unreadable: {e}");
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminSession {
    pub admin_id: ObjectId,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Logged-in admins keyed by the token handed out in the session cookie.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, AdminSession>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Start a session and return its token. Expired sessions are swept first, so
    /// cookies that were never logged out do not pile up.
    pub fn create(&self, admin_id: ObjectId, username: &str) -> String {
        let now = Utc::now();
        self.sessions.retain(|_, session| session.expires_at > now);

        let token = nanoid!(32);
        self.sessions.insert(
            token.clone(),
            AdminSession {
                admin_id,
                username: username.to_string(),
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Look up a live session. Expired entries are dropped on the way.
    pub fn get(&self, token: &str) -> Option<AdminSession> {
        let session = self.sessions.get(token)?.clone();
        if session.expires_at <= Utc::now() {
            self.sessions.remove(token);
            return None;
        }
        Some(session)
    }

    pub fn remove(&self, token: &str) -> Option<AdminSession> {
        self.sessions.remove(token).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Value of our session cookie, if the request carries one.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(token: &str, max_age: Duration) -> HeaderValue {
    let cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        max_age.num_seconds()
    );
    // tokens are nanoid output, always a valid header value
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

pub fn expired_session_cookie() -> HeaderValue {
    HeaderValue::from_static("internboard_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let login = || Redirect::to(&url_for(Destination::AdminLogin));
        let token = session_token(&parts.headers).ok_or_else(login)?;
        match state.sessions.get(&token) {
            Some(session) => Ok(session),
            None => {
                tracing::debug!("Rejected unknown or expired admin session");
                Err(login())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let stored = hash_password("Secret@2025").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password(&stored, "Secret@2025"));
        assert!(!verify_password(&stored, "secret@2025"));
        assert!(!verify_password("plaintext", "plaintext"));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_session_lifecycle() {
        let store = SessionStore::new(Duration::hours(1));
        let id = ObjectId::new();
        let token = store.create(id, "admin");
        assert_eq!(token.len(), 32);

        let session = store.get(&token).unwrap();
        assert_eq!(session.admin_id, id);
        assert_eq!(session.username, "admin");

        assert!(store.remove(&token).is_some());
        assert!(store.get(&token).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_session_is_dropped() {
        let store = SessionStore::new(Duration::seconds(-1));
        let token = store.create(ObjectId::new(), "admin");
        assert_eq!(store.len(), 1);
        assert!(store.get(&token).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_create_sweeps_abandoned_sessions() {
        let store = SessionStore::new(Duration::hours(1));
        for i in 0..3 {
            store.sessions.insert(
                format!("abandoned-{i}"),
                AdminSession {
                    admin_id: ObjectId::new(),
                    username: "admin".to_string(),
                    expires_at: Utc::now() - Duration::minutes(5),
                },
            );
        }
        let live = store.create(ObjectId::new(), "admin");
        let other = store.create(ObjectId::new(), "editor");

        assert_eq!(store.len(), 2);
        assert!(store.get(&live).is_some());
        assert!(store.get(&other).is_some());
        assert!(store.get("abandoned-0").is_none());
    }

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; internboard_session=abc123; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("internboard_session="));
        assert_eq!(session_token(&headers), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }
}
