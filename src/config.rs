//! Runtime configuration, read from the environment (and `.env` outside tests).

use std::fmt;

use thiserror::Error;

const DEFAULT_ED_API_BASE: &str = "https://us.edstem.org/api";
const DEFAULT_ED_LOGIN_URL: &str = "https://edstem.org/us/login";
const DEFAULT_COURSE_ID: &str = "72657";
const DEFAULT_INGEST_URL: &str = "http://localhost:3000/api/ingest";
const DEFAULT_INGEST_PDF_URL: &str = "http://localhost:3000/api/ingest-instructions";
const DEFAULT_BROWSERLESS_URL: &str = "http://localhost:3001";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Forum account credentials. Never persisted; the password never reaches logs.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub ed_email: Option<String>,
    pub ed_password: Option<String>,
    pub ed_api_base: String,
    pub ed_login_url: String,
    pub course_id: String,
    pub ingest_api_key: String,
    pub ingest_url: String,
    pub ingest_pdf_url: String,
    pub browserless_url: String,
    pub browserless_token: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("ed_email", &self.ed_email)
            .field("ed_api_base", &self.ed_api_base)
            .field("course_id", &self.course_id)
            .field("ingest_url", &self.ingest_url)
            .field("ingest_pdf_url", &self.ingest_pdf_url)
            .field("browserless_url", &self.browserless_url)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// A missing `INGESTION_API_KEY` fails here, before any request is made.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let ingest_api_key =
            get("INGESTION_API_KEY").ok_or_else(|| ConfigError::MissingVar("INGESTION_API_KEY".into()))?;

        let ed_api_base = get_or("ED_API_BASE", DEFAULT_ED_API_BASE);
        if !ed_api_base.starts_with("http://") && !ed_api_base.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "ED_API_BASE".to_string(),
                format!("'{}' is not an http(s) URL", ed_api_base),
            ));
        }

        Ok(Self {
            ed_email: get("ED_EMAIL"),
            ed_password: get("ED_PASSWORD"),
            ed_api_base: ed_api_base.trim_end_matches('/').to_string(),
            ed_login_url: get_or("ED_LOGIN_URL", DEFAULT_ED_LOGIN_URL),
            course_id: get_or("ED_COURSE_ID", DEFAULT_COURSE_ID),
            ingest_api_key,
            ingest_url: get_or("INGEST_URL", DEFAULT_INGEST_URL),
            ingest_pdf_url: get_or("INGEST_PDF_URL", DEFAULT_INGEST_PDF_URL),
            browserless_url: get_or("BROWSERLESS_URL", DEFAULT_BROWSERLESS_URL),
            browserless_token: get("BROWSERLESS_TOKEN"),
        })
    }

    /// Forum credentials, required only by commands that log in.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let email = self
            .ed_email
            .clone()
            .ok_or_else(|| ConfigError::MissingVar("ED_EMAIL".into()))?;
        let password = self
            .ed_password
            .clone()
            .ok_or_else(|| ConfigError::MissingVar("ED_PASSWORD".into()))?;
        Ok(Credentials { email, password })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn missing_ingestion_key_is_fatal() {
        let err = load(&[("ED_EMAIL", "a@b.c")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref v) if v == "INGESTION_API_KEY"));
    }

    #[test]
    fn blank_ingestion_key_counts_as_missing() {
        assert!(load(&[("INGESTION_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn defaults_apply() {
        let c = load(&[("INGESTION_API_KEY", "k")]).unwrap();
        assert_eq!(c.ed_api_base, "https://us.edstem.org/api");
        assert_eq!(c.course_id, "72657");
        assert_eq!(c.ingest_pdf_url, "http://localhost:3000/api/ingest-instructions");
        assert!(c.browserless_token.is_none());
    }

    #[test]
    fn api_base_trailing_slash_trimmed() {
        let c = load(&[("INGESTION_API_KEY", "k"), ("ED_API_BASE", "http://localhost:9/api/")]).unwrap();
        assert_eq!(c.ed_api_base, "http://localhost:9/api");
    }

    #[test]
    fn api_base_must_be_http() {
        let err = load(&[("INGESTION_API_KEY", "k"), ("ED_API_BASE", "ftp://x")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(..)));
    }

    #[test]
    fn config_debug_hides_secrets() {
        let c = load(&[("INGESTION_API_KEY", "sk-live"), ("ED_PASSWORD", "hunter2")]).unwrap();
        let shown = format!("{:?}", c);
        assert!(!shown.contains("sk-live"));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn credentials_require_both_fields() {
        let c = load(&[("INGESTION_API_KEY", "k"), ("ED_EMAIL", "a@b.c")]).unwrap();
        let err = c.credentials().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref v) if v == "ED_PASSWORD"));
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials { email: "a@b.c".into(), password: "hunter2".into() };
        let shown = format!("{:?}", creds);
        assert!(shown.contains("a@b.c"));
        assert!(!shown.contains("hunter2"));
    }
}
