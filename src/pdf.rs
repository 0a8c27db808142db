//! Local PDF handouts → one ingestion document per file.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::collected::Collected;
use crate::error::PdfError;
use crate::normalize::clean::clean_page_text;

const SECTION: &str = "instructions";

#[derive(Debug, Clone, Serialize)]
pub struct PdfDocument {
    pub content: String,
    pub metadata: PdfMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfMetadata {
    pub document_id: String,
    pub title: String,
    pub created_at: String,
    pub section: String,
    pub assignment_type: String,
    pub total_pages: usize,
}

/// Guess the kind of handout from its file name.
pub fn assignment_type(filename: &str) -> &'static str {
    let name = filename.to_lowercase();
    if name.contains("homework") || name.contains("hw") {
        "homework"
    } else if name.contains("project") {
        "project"
    } else if name.contains("syllabus") {
        "syllabus"
    } else {
        "other"
    }
}

/// Every `*.pdf` directly inside `dir`, sorted by name.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, PdfError> {
    if !dir.is_dir() {
        return Err(PdfError::MissingDirectory(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn extract_pages(path: &Path) -> Result<Vec<String>, PdfError> {
    let bytes = std::fs::read(path)?;
    // pdf-extract panics on some malformed files instead of returning an error
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
    }));
    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(PdfError::Extract {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        Err(_) => Err(PdfError::Extract {
            path: path.to_path_buf(),
            message: "parser panicked".to_string(),
        }),
    }
}

/// Build a document from already-extracted page text.
///
/// Returns `None` when no page has any text left after cleaning.
pub fn document_from_pages(file_name: &str, pages: &[String]) -> Option<PdfDocument> {
    let cleaned: Vec<String> = pages
        .iter()
        .map(|p| clean_page_text(p))
        .filter(|p| !p.is_empty())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string();

    Some(PdfDocument {
        content: cleaned.join("\n\n"),
        metadata: PdfMetadata {
            document_id: stem.clone(),
            title: stem,
            created_at: chrono::Local::now()
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            section: SECTION.to_string(),
            assignment_type: assignment_type(file_name).to_string(),
            total_pages: pages.len(),
        },
    })
}

pub fn process_pdf(path: &Path) -> Result<Option<PdfDocument>, PdfError> {
    let pages = extract_pages(path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    Ok(document_from_pages(file_name, &pages))
}

/// Process every PDF in `dir`. Unreadable or empty files are skipped.
pub fn collect_pdfs(dir: &Path) -> Result<Collected<PdfDocument>, PdfError> {
    let mut out = Collected::default();

    for path in list_pdfs(dir)? {
        info!("Processing {}...", path.display());
        match process_pdf(&path) {
            Ok(Some(doc)) => out.items.push(doc),
            Ok(None) => {
                warn!("No text in {}, skipping", path.display());
                out.skipped += 1;
            }
            Err(e) => {
                warn!("Error processing PDF {}: {}", path.display(), e);
                out.skipped += 1;
            }
        }
    }

    Ok(out)
}
