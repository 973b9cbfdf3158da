// crates/stage-sync-core/src/runtime/paging.rs
// ============================================================================
// Module: Paged Search
// Description: Generic first-match search over paginated control-plane listings.
// Purpose: Share one pagination discipline between REST API and deployment lookup.
// Dependencies: crate::interfaces, async-trait, thiserror
// ============================================================================

//! ## Overview
//! The control plane has no lookup-by-name call, so resolution scans listing
//! pages until a predicate matches. Continuation tokens are opaque. A source
//! that hands back any token already sent in the same search would loop
//! forever, so that case fails the search.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::interfaces::ControlPlaneError;
use crate::interfaces::Page;
use crate::interfaces::PageRequest;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest page size accepted by the listing APIs.
pub const MAX_PAGE_SIZE: u32 = 500;

// ============================================================================
// SECTION: Paged Source
// ============================================================================

/// A listing that can be read one page at a time.
#[async_trait]
pub trait PagedSource: Send + Sync {
    /// Listing item type.
    type Item: Send;

    /// Fetches one page.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError`] when the listing call fails.
    async fn fetch_page(&self, request: PageRequest)
    -> Result<Page<Self::Item>, ControlPlaneError>;
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Paged search failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PagingError {
    /// Listing call failed.
    #[error(transparent)]
    ControlPlane(#[from] ControlPlaneError),
    /// Listing returned a continuation token already sent in this search.
    #[error("pagination stalled at position {0}")]
    Stalled(String),
}

// ============================================================================
// SECTION: Paged Search
// ============================================================================

/// First-match search parameterized by page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagedSearch {
    /// Items requested per page.
    page_size: u32,
}

impl PagedSearch {
    /// Creates a search; the page size is clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub const fn new(page_size: u32) -> Self {
        let page_size = if page_size == 0 {
            1
        } else if page_size > MAX_PAGE_SIZE {
            MAX_PAGE_SIZE
        } else {
            page_size
        };
        Self {
            page_size,
        }
    }

    /// Returns the page size used for each request.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the first item matching `predicate`, or `None` when the
    /// listing is exhausted without a match.
    ///
    /// # Errors
    ///
    /// Returns [`PagingError`] when a listing call fails or pagination stalls.
    pub async fn find_first<S, F>(
        &self,
        source: &S,
        mut predicate: F,
    ) -> Result<Option<S::Item>, PagingError>
    where
        S: PagedSource + ?Sized,
        F: FnMut(&S::Item) -> bool + Send,
    {
        let mut position: Option<String> = None;
        let mut sent: BTreeSet<String> = BTreeSet::new();
        loop {
            let request = PageRequest {
                page_size: self.page_size,
                position: position.clone(),
            };
            let page = source.fetch_page(request).await?;
            if let Some(found) = page.items.into_iter().find(&mut predicate) {
                return Ok(Some(found));
            }
            match page.next_position {
                None => return Ok(None),
                Some(next) if sent.contains(&next) => {
                    return Err(PagingError::Stalled(next));
                }
                Some(next) => {
                    sent.insert(next.clone());
                    position = Some(next);
                }
            }
        }
    }
}

impl Default for PagedSearch {
    fn default() -> Self {
        Self::new(MAX_PAGE_SIZE)
    }
}
