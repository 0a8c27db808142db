mod auth;
mod collected;
mod config;
mod ed;
mod error;
mod normalize;
mod pdf;
mod pipeline;
mod sink;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use auth::{AuthMethod, Authenticator, BrowserLogin, DirectLogin};
use config::Config;
use ed::threads::PAGE_SIZE;
use ed::{EdClient, EdSession};
use normalize::NormalizedRecord;
use pipeline::RunReport;
use sink::IngestClient;

#[derive(Parser)]
#[command(name = "ed_ingest", about = "Ed Discussion + PDF ingestion for the course chatbot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest every thread in a course and send it to the ingestion endpoint
    Threads {
        /// Course id (default: ED_COURSE_ID or 72657)
        #[arg(short, long)]
        course: Option<String>,
        /// How to obtain the session token
        #[arg(long, value_enum, default_value_t = AuthMethod::Direct)]
        auth: AuthMethod,
        /// Threads requested per listing page
        #[arg(long, default_value_t = PAGE_SIZE)]
        page_size: usize,
        /// Collect and print a sample instead of delivering
        #[arg(long)]
        dry_run: bool,
    },
    /// Extract every PDF in a directory and send it to the ingestion endpoint
    Pdfs {
        /// Directory holding the PDFs
        #[arg(short, long, default_value = "pdfs")]
        dir: PathBuf,
        /// Extract and print a sample instead of delivering
        #[arg(long)]
        dry_run: bool,
    },
    /// Check that the configured credentials can log in
    Login {
        #[arg(long, value_enum, default_value_t = AuthMethod::Direct)]
        auth: AuthMethod,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    // Fails on a missing ingestion key before anything touches the network.
    let config = Config::from_env()?;

    let result = match cli.command {
        Commands::Threads {
            course,
            auth,
            page_size,
            dry_run,
        } => {
            let course_id = course.unwrap_or_else(|| config.course_id.clone());
            let session = login(&config, auth).await?;

            if dry_run {
                let harvest = pipeline::harvest_threads(&session, &course_id, page_size).await;
                print_thread_sample(&harvest.items)?;
                RunReport::dry_run(harvest).print();
                return Ok(());
            }

            let sink = IngestClient::new(&config.ingest_url, &config.ingest_api_key)?;
            let report = pipeline::run_threads(&session, &sink, &course_id, page_size).await;
            report.print();
            report.into_result()?;
            Ok(())
        }
        Commands::Pdfs { dir, dry_run } => {
            let docs = pdf::collect_pdfs(&dir)?;
            if !docs.is_complete() {
                warn!("{} PDF files could not be used", docs.skipped);
            }
            if docs.items.is_empty() {
                println!("No documents to process ({} skipped).", docs.skipped);
                return Ok(());
            }

            if dry_run {
                println!("{}", serde_json::to_string_pretty(&docs.items[0])?);
                println!(
                    "Extracted {} documents ({} skipped), not delivered (dry run).",
                    docs.items.len(),
                    docs.skipped
                );
                return Ok(());
            }

            let sink = IngestClient::new(&config.ingest_pdf_url, &config.ingest_api_key)?;
            let resp = sink.deliver(&docs.items).await?;
            info!("Ingestion response: {}", resp);
            println!(
                "Delivered {} documents ({} skipped).",
                docs.items.len(),
                docs.skipped
            );
            Ok(())
        }
        Commands::Login { auth } => {
            login(&config, auth).await?;
            println!("Login OK.");
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn login(config: &Config, method: AuthMethod) -> anyhow::Result<EdSession> {
    let credentials = config.credentials()?;
    let client = EdClient::new(&config.ed_api_base)?;

    let authenticator: Box<dyn Authenticator> = match method {
        AuthMethod::Direct => Box::new(DirectLogin::new(client.clone())),
        AuthMethod::Browser => Box::new(BrowserLogin::new(
            &config.browserless_url,
            config.browserless_token.as_deref(),
            &config.ed_login_url,
        )?),
    };

    info!("Logging in as {} ({})", credentials.email, authenticator.name());
    let token = authenticator.login(&credentials).await?;
    Ok(client.session(token))
}

fn print_thread_sample(records: &[NormalizedRecord]) -> anyhow::Result<()> {
    let Some(first) = records.first() else {
        println!("No threads found.");
        return Ok(());
    };

    println!(
        "{:>3} | {:<48} | {:<16} | {:>7} | {:>6}",
        "#", "Title", "Category", "Answers", "Chars"
    );
    println!("{}", "-".repeat(93));
    for (i, r) in records.iter().take(20).enumerate() {
        let m = r.metadata();
        println!(
            "{:>3} | {:<48} | {:<16} | {:>7} | {:>6}",
            i + 1,
            truncate(&m.title, 48),
            truncate(&m.category, 16),
            m.answer_count,
            r.content().chars().count()
        );
    }

    println!("\nFirst record:");
    println!("{}", serde_json::to_string_pretty(first)?);
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
