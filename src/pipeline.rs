use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::collected::Collected;
use crate::ed::threads::collect_threads;
use crate::ed::EdSession;
use crate::error::DeliveryError;
use crate::normalize::{fetch_record, NormalizedRecord};
use crate::sink::IngestClient;

/// What happened to the harvested batch.
#[derive(Debug)]
pub enum Delivery {
    /// Collected for inspection only.
    DryRun,
    /// Nothing was collected, so nothing was sent.
    Nothing,
    /// Accepted; holds the endpoint's parsed response.
    Sent(serde_json::Value),
    /// Refused or unreachable. The batch is still in the report.
    Failed(DeliveryError),
}

/// Outcome of one thread run. Owns the harvested records so a failed
/// delivery can be retried by the caller.
#[derive(Debug)]
pub struct RunReport {
    pub harvest: Collected<NormalizedRecord>,
    pub delivery: Delivery,
}

impl RunReport {
    pub fn dry_run(harvest: Collected<NormalizedRecord>) -> Self {
        Self {
            harvest,
            delivery: Delivery::DryRun,
        }
    }

    pub fn summary(&self) -> Vec<String> {
        let outcome = match &self.delivery {
            Delivery::DryRun => ", not delivered (dry run)".to_string(),
            Delivery::Nothing => String::new(),
            Delivery::Sent(resp) if resp.is_null() => ", delivered".to_string(),
            Delivery::Sent(resp) => format!(", delivered (response: {})", resp),
            Delivery::Failed(e) => format!(", delivery failed: {}", e),
        };
        let mut lines = vec![format!(
            "Collected {} threads ({} skipped){}.",
            self.harvest.items.len(),
            self.harvest.skipped,
            outcome
        )];
        if let Some(ref e) = self.harvest.interrupted {
            lines.push(format!("Thread listing stopped early: {}", e));
        }
        lines
    }

    pub fn print(&self) {
        for line in self.summary() {
            println!("{}", line);
        }
    }

    /// Turn a failed delivery into an error, after the report has been shown.
    pub fn into_result(self) -> Result<Collected<NormalizedRecord>, DeliveryError> {
        match self.delivery {
            Delivery::Failed(e) => Err(e),
            _ => Ok(self.harvest),
        }
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

/// List every thread in a course, then fetch and normalize each one in turn.
///
/// A failed detail fetch drops that thread only. A failed listing page stops
/// the listing; threads already listed are still fetched.
pub async fn harvest_threads(
    session: &EdSession,
    course_id: &str,
    page_size: usize,
) -> Collected<NormalizedRecord> {
    let listing = collect_threads(session, course_id, page_size).await;

    let mut out = Collected {
        items: Vec::with_capacity(listing.items.len()),
        skipped: listing.skipped,
        interrupted: listing.interrupted,
    };

    let pb = progress_bar(listing.items.len());
    for summary in &listing.items {
        match fetch_record(session, summary.id).await {
            Ok(record) => out.items.push(record),
            Err(e) => {
                warn!(
                    "Error fetching thread {} (course {}): {}",
                    summary.id, summary.course_id, e
                );
                out.skipped += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        "Total threads processed: {} ({} skipped)",
        out.items.len(),
        out.skipped
    );
    out
}

/// Harvest then deliver in one batch. Nothing is sent when nothing was collected.
pub async fn run_threads(
    session: &EdSession,
    sink: &IngestClient,
    course_id: &str,
    page_size: usize,
) -> RunReport {
    let harvest = harvest_threads(session, course_id, page_size).await;
    if harvest.items.is_empty() {
        info!("No threads to deliver");
        return RunReport {
            harvest,
            delivery: Delivery::Nothing,
        };
    }

    let delivery = match sink.deliver(&harvest.items).await {
        Ok(resp) => {
            debug!("Ingestion response: {}", resp);
            Delivery::Sent(resp)
        }
        Err(e) => {
            warn!("Delivery of {} threads failed: {}", harvest.items.len(), e);
            Delivery::Failed(e)
        }
    };
    RunReport { harvest, delivery }
}
