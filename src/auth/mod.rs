pub mod browser;
pub mod direct;

use std::fmt;

use async_trait::async_trait;

use crate::config::Credentials;
use crate::error::AuthError;

pub use browser::BrowserLogin;
pub use direct::DirectLogin;

/// Opaque forum token. Valid for the whole run; there is no refresh.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Anything that can turn credentials into a session token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<SessionToken, AuthError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum AuthMethod {
    /// Call the login/token endpoints directly
    #[default]
    Direct,
    /// Drive the login form in a headless browser (Browserless)
    Browser,
}

/// Treat a missing or blank token field as no token at all.
pub(crate) fn non_empty_token(raw: Option<String>) -> Result<SessionToken, AuthError> {
    match raw {
        Some(t) if !t.trim().is_empty() => Ok(SessionToken::new(t)),
        _ => Err(AuthError::MissingToken),
    }
}
