//! Random candidate selection.
//!
//! A generation samples discover pages at random, drops entries that were
//! already surfaced or have no usable overview, picks one survivor at random
//! and confirms it against its detail record. Empty or invalid picks are
//! retried up to [`MAX_GENERATION_ATTEMPTS`] times.

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    error::AppError,
    models::{CandidateItem, FilterCriteria, MediaId, MediaKind, MediaSummary},
    services::{
        catalog::{clamp_total_pages, CatalogProvider},
        seen::SeenSet,
    },
};

/// Pages sampled per generation before giving up
pub const MAX_GENERATION_ATTEMPTS: usize = 5;

/// Seen-set size above which an exhausted page wipes the history
pub const SEEN_RESET_THRESHOLD: usize = 500;

/// Error types for a generation
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The filters match nothing at all; retrying will not help
    #[error("No results found with these filters")]
    NoResults,

    /// Every attempt hit an empty, fully seen or undescribed page
    #[error("No content found. Try modifying the filters.")]
    ExhaustedAttempts { attempts: usize },

    #[error("Catalog request failed: {0}")]
    Transport(#[source] AppError),
}

impl From<AppError> for GenerationError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NoResults => GenerationError::NoResults,
            other => GenerationError::Transport(other),
        }
    }
}

impl GenerationError {
    /// Text to show the user
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Transport(_) => {
                "An error occurred. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Picks random catalog entries that satisfy a filter set
pub struct SelectionEngine {
    catalog: Arc<dyn CatalogProvider>,
    rng: Mutex<StdRng>,
}

impl SelectionEngine {
    pub fn new(catalog: Arc<dyn CatalogProvider>) -> Self {
        Self::with_rng(catalog, StdRng::from_os_rng())
    }

    /// Uses the given random source, e.g. a seeded one for reproducible runs
    pub fn with_rng(catalog: Arc<dyn CatalogProvider>, rng: StdRng) -> Self {
        Self {
            catalog,
            rng: Mutex::new(rng),
        }
    }

    /// Returns one unseen item with a usable description and records it in `seen`
    ///
    /// `seen` is cleared when it holds more than [`SEEN_RESET_THRESHOLD`]
    /// items and a sampled page has nothing left after filtering.
    pub async fn generate(
        &self,
        filters: &FilterCriteria,
        kind: MediaKind,
        seen: &mut SeenSet,
    ) -> Result<CandidateItem, GenerationError> {
        let (query, total_pages) = self.catalog.build_query(kind, filters).await?;
        let total_pages = clamp_total_pages(total_pages);

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let page = self.sample_page(total_pages).await;
            let summaries = self.catalog.fetch_page(&query, page).await?;

            let candidates: Vec<&MediaSummary> = summaries
                .iter()
                .filter(|summary| !seen.contains(summary.id) && summary.has_usable_description())
                .collect();

            if candidates.is_empty() {
                if seen.len() > SEEN_RESET_THRESHOLD {
                    tracing::info!(seen = seen.len(), "Seen set over threshold, resetting");
                    seen.clear();
                }
                tracing::debug!(attempt, page, "No unseen candidates on page");
                continue;
            }

            let picked = self.pick(&candidates).await;
            let item = self.catalog.fetch_detail(kind, picked).await?;

            if !item.has_usable_description() {
                tracing::debug!(attempt, id = item.id, "Detail record has no usable description");
                continue;
            }

            tracing::info!(
                id = item.id,
                kind = %kind,
                attempt,
                page,
                provider = self.catalog.name(),
                "Candidate selected"
            );

            seen.add(item.clone());
            return Ok(item);
        }

        tracing::warn!(
            attempts = MAX_GENERATION_ATTEMPTS,
            kind = %kind,
            "Generation exhausted its attempts"
        );

        Err(GenerationError::ExhaustedAttempts {
            attempts: MAX_GENERATION_ATTEMPTS,
        })
    }

    async fn sample_page(&self, total_pages: u32) -> u32 {
        self.rng.lock().await.random_range(1..=total_pages)
    }

    async fn pick(&self, candidates: &[&MediaSummary]) -> MediaId {
        let index = self.rng.lock().await.random_range(0..candidates.len());
        candidates[index].id
    }
}

/// One user's generation history
///
/// Calls to [`DiscoverySession::generate`] are serialized: the seen set stays
/// locked for the whole generation, so concurrent requests can never surface
/// the same item twice.
pub struct DiscoverySession {
    engine: Arc<SelectionEngine>,
    seen: Mutex<SeenSet>,
}

impl DiscoverySession {
    pub fn new(engine: Arc<SelectionEngine>) -> Self {
        Self {
            engine,
            seen: Mutex::new(SeenSet::new()),
        }
    }

    /// Generates for the media kind selected in `filters`
    pub async fn generate(
        &self,
        filters: &FilterCriteria,
    ) -> Result<CandidateItem, GenerationError> {
        let mut seen = self.seen.lock().await;
        self.engine.generate(filters, filters.kind, &mut seen).await
    }

    pub async fn seen_count(&self) -> usize {
        self.seen.lock().await.len()
    }

    pub async fn seen_items(&self) -> Vec<CandidateItem> {
        self.seen.lock().await.iter().cloned().collect()
    }

    pub async fn reset(&self) {
        self.seen.lock().await.clear();
    }
}
