use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{non_empty_token, Authenticator, SessionToken};
use crate::config::Credentials;
use crate::ed::EdClient;
use crate::error::AuthError;

#[derive(Serialize)]
struct LoginTypeRequest<'a> {
    login: &'a str,
    force_code: bool,
    force_reauth: bool,
}

#[derive(Deserialize)]
struct LoginTypeResponse {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    login: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Password login against the forum's own REST endpoints.
pub struct DirectLogin {
    client: EdClient,
}

impl DirectLogin {
    pub fn new(client: EdClient) -> Self {
        Self { client }
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, AuthError> {
        let resp = self
            .client
            .http()
            .post(self.client.url(path))
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| AuthError::Decode(format!("bad response from {}: {}", path, e)))
    }
}

#[async_trait]
impl Authenticator for DirectLogin {
    async fn login(&self, credentials: &Credentials) -> Result<SessionToken, AuthError> {
        let login_type: LoginTypeResponse = self
            .post(
                "login_type",
                &LoginTypeRequest {
                    login: &credentials.email,
                    force_code: false,
                    force_reauth: false,
                },
            )
            .await?;

        match login_type.kind.as_deref() {
            Some("password") => {}
            other => {
                return Err(AuthError::UnsupportedLoginType(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        }

        let token: TokenResponse = self
            .post(
                "token",
                &TokenRequest {
                    login: &credentials.email,
                    password: &credentials.password,
                },
            )
            .await?;

        let token = non_empty_token(token.token)?;
        info!("Obtained session token via direct login");
        Ok(token)
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}
