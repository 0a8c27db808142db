use tracing::{info, warn};

use super::{EdSession, ThreadSummary};
use crate::collected::Collected;
use crate::error::FetchError;

pub const PAGE_SIZE: usize = 30;

/// Offset-based walk over a course's thread list.
///
/// Stops on an empty page, on a page shorter than `page_size`, or on the
/// first error. Restart by building a new pager.
pub struct ThreadPager<'a> {
    session: &'a EdSession,
    course_id: &'a str,
    page_size: usize,
    offset: usize,
    done: bool,
}

impl<'a> ThreadPager<'a> {
    pub fn new(session: &'a EdSession, course_id: &'a str, page_size: usize) -> Self {
        Self {
            session,
            course_id,
            page_size: page_size.max(1),
            offset: 0,
            done: false,
        }
    }

    pub async fn next_page(&mut self) -> Result<Option<Vec<ThreadSummary>>, FetchError> {
        if self.done {
            return Ok(None);
        }

        info!("Fetching threads with offset {}...", self.offset);
        let page = match self
            .session
            .threads_page(self.course_id, self.page_size, self.offset)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };

        if page.is_empty() {
            self.done = true;
            return Ok(None);
        }
        if page.len() < self.page_size {
            self.done = true;
        } else {
            self.offset += self.page_size;
        }
        Ok(Some(page))
    }
}

/// Drain a pager into one list. Errors end the walk but keep earlier pages.
pub async fn collect_threads(
    session: &EdSession,
    course_id: &str,
    page_size: usize,
) -> Collected<ThreadSummary> {
    let mut pager = ThreadPager::new(session, course_id, page_size);
    let mut out = Collected::default();

    loop {
        match pager.next_page().await {
            Ok(Some(page)) => {
                out.items.extend(page);
                info!("Collected {} threads so far...", out.items.len());
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Error fetching threads: {}", e);
                out.interrupted = Some(e);
                break;
            }
        }
    }

    info!("Total threads collected: {}", out.items.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionToken;
    use crate::ed::EdClient;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page_body(ids: std::ops::Range<u64>) -> serde_json::Value {
        let threads: Vec<_> = ids
            .map(|id| serde_json::json!({ "id": id, "course_id": 1 }))
            .collect();
        serde_json::json!({ "threads": threads })
    }

    async fn mount_page(server: &MockServer, offset: usize, limit: usize, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/api/courses/1/threads"))
            .and(query_param("offset", offset.to_string()))
            .and(query_param("limit", limit.to_string()))
            .and(query_param("sort", "new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    fn session(server: &MockServer) -> EdSession {
        EdClient::new(&format!("{}/api", server.uri()))
            .unwrap()
            .session(SessionToken::new("t"))
    }

    #[tokio::test]
    async fn short_page_ends_walk() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 30, page_body(0..30)).await;
        mount_page(&server, 30, 30, page_body(30..35)).await;

        let s = session(&server);
        let got = collect_threads(&s, "1", 30).await;

        assert!(got.is_complete());
        assert_eq!(got.items.len(), 35);
        let ids: Vec<u64> = got.items.iter().map(|t| t.id).collect();
        assert_eq!(ids, (0..35u64).collect::<Vec<_>>());
        // `expect(1)` on each mock is verified when the server drops
    }

    #[tokio::test]
    async fn exact_multiple_needs_empty_page() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 30, page_body(0..30)).await;
        mount_page(&server, 30, 30, page_body(30..60)).await;
        mount_page(&server, 60, 30, page_body(0..0)).await;

        let s = session(&server);
        let got = collect_threads(&s, "1", 30).await;
        assert_eq!(got.items.len(), 60);
        assert!(got.interrupted.is_none());
    }

    #[tokio::test]
    async fn small_page_size() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 2, page_body(0..2)).await;
        mount_page(&server, 2, 2, page_body(2..4)).await;
        mount_page(&server, 4, 2, page_body(4..5)).await;

        let s = session(&server);
        let got = collect_threads(&s, "1", 2).await;
        assert_eq!(got.items.len(), 5);
    }

    #[tokio::test]
    async fn error_keeps_earlier_pages() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 30, page_body(0..30)).await;
        Mock::given(method("GET"))
            .and(path("/api/courses/1/threads"))
            .and(query_param("offset", "30"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let s = session(&server);
        let got = collect_threads(&s, "1", 30).await;
        assert_eq!(got.items.len(), 30);
        assert!(!got.is_complete());
        assert!(matches!(got.interrupted, Some(FetchError::Status { status: 502, .. })));
    }

    #[tokio::test]
    async fn pager_stays_finished() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 30, page_body(0..3)).await;

        let s = session(&server);
        let mut pager = ThreadPager::new(&s, "1", 30);
        assert_eq!(pager.next_page().await.unwrap().unwrap().len(), 3);
        assert!(pager.next_page().await.unwrap().is_none());
        assert!(pager.next_page().await.unwrap().is_none());
    }
}
