use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::clean::clean_text;
use crate::ed::{Answer, ThreadResponse};

const STAFF_ROLES: &[&str] = &["staff", "admin"];
const THREAD_URL_BASE: &str = "https://edstem.org/us/courses";

/// One thread flattened for ingestion. Built once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedRecord {
    content: String,
    metadata: ThreadMetadata,
}

impl NormalizedRecord {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &ThreadMetadata {
        &self.metadata
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadMetadata {
    pub thread_id: u64,
    pub course_id: u64,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub subcategory: String,
    pub created_at: String,
    pub is_answered: bool,
    pub is_staff_answered: bool,
    pub view_count: u64,
    pub answer_count: usize,
    pub url: String,
}

pub fn build_record(resp: &ThreadResponse) -> NormalizedRecord {
    let thread = &resp.thread;
    let roles: HashMap<u64, &str> = resp
        .users
        .iter()
        .map(|u| (u.id, u.course_role.as_str()))
        .collect();

    let mut parts = vec![format!("Question: {}", clean_text(&thread.title))];

    let body = clean_text(&thread.document);
    if !body.is_empty() {
        parts.push(body);
    }

    for answer in &thread.answers {
        let staff = roles.get(&answer.user_id).is_some_and(|r| is_staff_role(r));
        debug!(
            "Thread {}: answer {} posted {} (endorsed: {}, staff: {})",
            thread.id,
            answer.id,
            strip_utc_offset(&answer.created_at),
            answer.is_endorsed,
            staff
        );
        // An empty body must not leave the prefix hanging.
        let line = format!(
            "Answer: {}{}",
            answer_prefix(answer, staff),
            clean_text(&answer.document)
        );
        parts.push(line.trim_end().to_string());
    }

    NormalizedRecord {
        content: parts.join("\n\n"),
        metadata: ThreadMetadata {
            thread_id: thread.id,
            course_id: thread.course_id,
            title: thread.title.clone(),
            kind: thread.kind.clone(),
            category: thread.category.clone(),
            subcategory: thread.subcategory.clone(),
            created_at: strip_utc_offset(&thread.created_at).to_string(),
            is_answered: thread.is_answered,
            is_staff_answered: thread.is_staff_answered,
            view_count: thread.view_count,
            answer_count: thread.answers.len(),
            url: thread_url(thread.course_id, thread.id),
        },
    }
}

fn is_staff_role(role: &str) -> bool {
    STAFF_ROLES.iter().any(|s| s.eq_ignore_ascii_case(role))
}

fn answer_prefix(answer: &Answer, staff: bool) -> &'static str {
    match (answer.is_endorsed, staff) {
        (true, true) => "[ENDORSED | STAFF RESPONSE] ",
        (true, false) => "[ENDORSED] ",
        (false, true) => "[STAFF RESPONSE] ",
        (false, false) => "",
    }
}

/// `2024-01-01T00:00:00+00:00` -> `2024-01-01T00:00:00`
pub fn strip_utc_offset(ts: &str) -> &str {
    ts.split_once('+').map_or(ts, |(head, _)| head)
}

pub fn thread_url(course_id: u64, thread_id: u64) -> String {
    format!("{}/{}/discussion/{}", THREAD_URL_BASE, course_id, thread_id)
}
