use crate::error::FetchError;

/// Items gathered by a best-effort pass, with what was lost along the way.
#[derive(Debug)]
pub struct Collected<T> {
    pub items: Vec<T>,
    /// Items dropped individually (one failed fetch each).
    pub skipped: usize,
    /// Set when the pass stopped early; `items` holds what came before.
    pub interrupted: Option<FetchError>,
}

impl<T> Collected<T> {
    pub fn is_complete(&self) -> bool {
        self.skipped == 0 && self.interrupted.is_none()
    }
}

impl<T> Default for Collected<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: 0,
            interrupted: None,
        }
    }
}
