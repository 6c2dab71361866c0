//! Cursor pagination with a hard page cap.
//!
//! The cap guards against a provider that never stops handing out cursors.
//! Hitting it is not an error: the items fetched so far are returned with
//! `truncated = true` so callers can warn that the data is incomplete.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default page cap for every paginated roster fetch.
pub const DEFAULT_MAX_PAGES: u32 = 15;

/// One page returned by a paginated collaborator call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Opaque continuation token. `None` or `""` both mean "last page".
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }

    pub fn more(items: Vec<T>, next_cursor: impl Into<String>) -> Self {
        Self {
            items,
            next_cursor: Some(next_cursor.into()),
        }
    }
}

/// Accumulated result of a paginated fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    /// Number of pages actually requested.
    pub pages: u32,
    /// The cap stopped the loop while a next cursor was still outstanding.
    pub truncated: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerPolicy {
    pub max_pages: u32,
}

impl Default for PagerPolicy {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl PagerPolicy {
    pub fn with_max_pages(max_pages: u32) -> Self {
        Self { max_pages }
    }

    /// The first page is always requested, so a cap of 0 behaves as 1.
    pub fn effective_max_pages(&self) -> u32 {
        self.max_pages.max(1)
    }
}

/// Follow cursors from `initial_cursor` until the provider stops returning
/// one or `policy` caps the number of pages.
///
/// Any page error aborts immediately and discards what was fetched so far.
pub async fn fetch_all<T, E, F, Fut>(
    policy: &PagerPolicy,
    initial_cursor: Option<String>,
    mut page_fn: F,
) -> Result<Paged<T>, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let max_pages = policy.effective_max_pages();
    let mut items: Vec<T> = Vec::new();
    let mut cursor = initial_cursor.filter(|c| !c.is_empty());
    let mut pages: u32 = 0;

    loop {
        let page = page_fn(cursor.take()).await?;
        pages += 1;
        items.extend(page.items);

        cursor = page.next_cursor.filter(|c| !c.is_empty());
        if cursor.is_none() {
            debug!(pages, items = items.len(), "pagination complete");
            return Ok(Paged {
                items,
                pages,
                truncated: false,
            });
        }

        if pages >= max_pages {
            warn!(
                pages,
                items = items.len(),
                "page cap reached with cursor outstanding; result truncated"
            );
            return Ok(Paged {
                items,
                pages,
                truncated: true,
            });
        }
    }
}
