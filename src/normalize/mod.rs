pub mod clean;
pub mod record;

pub use record::{build_record, NormalizedRecord};

use crate::ed::EdSession;
use crate::error::FetchError;

/// Fetch one thread and flatten it: detail request → clean → record.
pub async fn fetch_record(session: &EdSession, thread_id: u64) -> Result<NormalizedRecord, FetchError> {
    let resp = session.thread(thread_id).await?;
    Ok(build_record(&resp))
}
