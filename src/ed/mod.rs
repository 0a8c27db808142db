pub mod threads;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::auth::SessionToken;
use crate::error::FetchError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SITE_ORIGIN: &str = "https://edstem.org";
const BROWSER_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36";

// ── Wire types ──

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadSummary {
    pub id: u64,
    #[serde(default)]
    pub course_id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThreadList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub threads: Vec<ThreadSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadDetail {
    pub id: u64,
    #[serde(default)]
    pub course_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub document: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subcategory: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_answered: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_staff_answered: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Answer {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub document: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_endorsed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForumUser {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub course_role: String,
}

/// Body of `GET /threads/{id}`: the thread plus the users it references.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadResponse {
    pub thread: ThreadDetail,
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<ForumUser>,
}

/// The API sends `null` for absent strings and lists; treat it as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Clients ──

/// Unauthenticated client for the forum API. Used by the login calls.
#[derive(Clone)]
pub struct EdClient {
    http: reqwest::Client,
    base_url: String,
}

impl EdClient {
    pub fn new(base_url: &str) -> reqwest::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ORIGIN, HeaderValue::from_static(SITE_ORIGIN));
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Attach a token; every request made through the session carries `x-token`.
    pub fn session(&self, token: SessionToken) -> EdSession {
        EdSession {
            client: self.clone(),
            token,
        }
    }
}

pub struct EdSession {
    client: EdClient,
    token: SessionToken,
}

impl EdSession {
    /// One page of thread summaries for a course, newest first.
    pub async fn threads_page(
        &self,
        course_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ThreadSummary>, FetchError> {
        let url = self.client.url(&format!("courses/{}/threads", course_id));
        let query = [
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
            ("sort", "new".to_string()),
        ];
        let list: ThreadList = self.get_json(&url, &query).await?;
        Ok(list.threads)
    }

    /// Full thread detail including answers and the referenced users.
    pub async fn thread(&self, thread_id: u64) -> Result<ThreadResponse, FetchError> {
        let url = self.client.url(&format!("threads/{}", thread_id));
        self.get_json(&url, &[("view", "1".to_string())]).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        debug!("GET {}", url);
        let resp = self
            .client
            .http()
            .get(url)
            .header("x-token", self.token.expose())
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
