use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config::from_env()
});

#[derive(Debug, Clone)]
pub struct Config {
    pub mongo_uri: String,
    pub mongo_db_name: String,
    pub bind_addr: String,
    pub static_dir: String,
    pub upload_folder: String,
    pub max_content_length: usize,
    pub session_ttl_hours: i64,
    pub mail: MailConfig,
    pub default_admin: DefaultAdmin,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub enabled: bool,
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub default_sender: String,
}

/// Credentials seeded by `init-db` when no admin exists yet.
#[derive(Debug, Clone)]
pub struct DefaultAdmin {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            mongo_uri: get_env("MONGO_URI"),
            mongo_db_name: get_env_or_default("MONGO_DB_NAME", "internboard"),
            bind_addr: get_env_or_default("BIND_ADDR", "0.0.0.0:5000"),
            static_dir: get_env_or_default("STATIC_DIR", "static"),
            upload_folder: get_env_or_default("UPLOAD_FOLDER", "static/uploads"),
            max_content_length: get_env_parsed("MAX_CONTENT_LENGTH", 16 * 1024 * 1024),
            session_ttl_hours: get_env_parsed("SESSION_TTL_HOURS", 12),
            mail: MailConfig {
                enabled: get_env_parsed("MAIL_ENABLED", false),
                server: get_env_or_default("MAIL_SERVER", "smtp.gmail.com"),
                port: get_env_parsed("MAIL_PORT", 587),
                username: get_env_or_default("MAIL_USERNAME", ""),
                password: get_env_or_default("MAIL_PASSWORD", ""),
                default_sender: get_env_or_default(
                    "MAIL_DEFAULT_SENDER",
                    "Internboard <noreply@localhost>",
                ),
            },
            default_admin: DefaultAdmin {
                username: get_env_or_default("DEFAULT_ADMIN_USERNAME", "admin"),
                password: get_env_or_default("DEFAULT_ADMIN_PASSWORD", "change-me"),
                email: get_env_or_default("DEFAULT_ADMIN_EMAIL", "admin@localhost"),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mongo_uri: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "internboard".to_string(),
            bind_addr: "0.0.0.0:5000".to_string(),
            static_dir: "static".to_string(),
            upload_folder: "static/uploads".to_string(),
            max_content_length: 16 * 1024 * 1024,
            session_ttl_hours: 12,
            mail: MailConfig {
                enabled: false,
                server: "smtp.gmail.com".to_string(),
                port: 587,
                username: String::new(),
                password: String::new(),
                default_sender: "Internboard <noreply@localhost>".to_string(),
            },
            default_admin: DefaultAdmin {
                username: "admin".to_string(),
                password: "change-me".to_string(),
                email: "admin@localhost".to_string(),
            },
        }
    }
}

fn get_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("Missing required environment variable: {key}"))
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
        Err(_) => default,
    }
}
