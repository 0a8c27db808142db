//! Form login through a headless browser hosted by a Browserless service.
//!
//! The login form is driven by a script posted to `/function`. The browser
//! lives inside the service and is torn down when the script returns, whether
//! it succeeded or threw, so nothing is left for the caller to close.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::{non_empty_token, Authenticator, SessionToken};
use crate::config::Credentials;
use crate::error::AuthError;

/// Covers the scripted waits below plus page loads.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);
const STEP_DELAY_MS: u64 = 2_000;
const STEP_TIMEOUT_MS: u64 = 15_000;

const LOGIN_SCRIPT: &str = r#"
export default async function ({ page, context }) {
  const { loginUrl, email, password, stepDelayMs, stepTimeoutMs } = context;
  const sleep = (ms) => new Promise((resolve) => setTimeout(resolve, ms));

  await page.goto(loginUrl, { waitUntil: "networkidle0", timeout: stepTimeoutMs });

  await page.waitForSelector("input.start-input", { timeout: stepTimeoutMs });
  await page.type("input.start-input", email);
  await page.click("button.start-btn");

  await sleep(stepDelayMs);
  await page.waitForSelector('input.start-input[type="password"]', { timeout: stepTimeoutMs });
  await page.type('input.start-input[type="password"]', password);

  await Promise.all([
    page.waitForNavigation({ waitUntil: "networkidle0", timeout: stepTimeoutMs }),
    page.click('button.start-btn[type="submit"]'),
  ]);

  const token = await page.evaluate(
    () => localStorage.getItem("authToken") || localStorage.getItem("authToken:us")
  );
  return { data: { token }, type: "application/json" };
}
"#;

#[derive(Deserialize)]
struct ScriptResult {
    #[serde(default)]
    token: Option<String>,
}

pub struct BrowserLogin {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    login_url: String,
}

impl BrowserLogin {
    pub fn new(base_url: &str, token: Option<&str>, login_url: &str) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            login_url: login_url.to_string(),
        })
    }

}

#[async_trait]
impl Authenticator for BrowserLogin {
    async fn login(&self, credentials: &Credentials) -> Result<SessionToken, AuthError> {
        info!("Logging in through browser at {}", self.login_url);

        let body = serde_json::json!({
            "code": LOGIN_SCRIPT,
            "context": {
                "loginUrl": self.login_url,
                "email": credentials.email,
                "password": credentials.password,
                "stepDelayMs": STEP_DELAY_MS,
                "stepTimeoutMs": STEP_TIMEOUT_MS,
            },
        });

        let mut req = self.http.post(format!("{}/function", self.base_url));
        if let Some(ref token) = self.token {
            req = req.query(&[("token", token)]);
        }
        let resp = req
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Browser(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(AuthError::Browser(format!("status {}: {}", status.as_u16(), message)));
        }

        let result: ScriptResult = resp.json().await.map_err(|e| {
            if e.is_decode() {
                AuthError::Decode(e.to_string())
            } else {
                AuthError::Browser(e.to_string())
            }
        })?;
        let token = non_empty_token(result.token)?;
        info!("Obtained session token via browser login");
        Ok(token)
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}
