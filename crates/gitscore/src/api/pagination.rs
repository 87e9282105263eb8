//! Page-number pagination over the resilient client.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::client::{ApiClient, FetchOutcome, RequestStats};
use super::error::ApiError;
use super::request::MediaType;

/// Default page size used by the forge APIs.
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Default upper bound on pages for bounded walks such as commit search.
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// A page body that yields a list of items.
///
/// Plain JSON arrays are pages. Search endpoints wrap the page in an envelope.
pub trait PagePayload<T>: DeserializeOwned {
    fn into_items(self) -> Vec<T>;
}

impl<T: DeserializeOwned> PagePayload<T> for Vec<T> {
    fn into_items(self) -> Vec<T> {
        self
    }
}

/// Search envelope: `{ total_count, incomplete_results, items: [...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage<T> {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T: DeserializeOwned> PagePayload<T> for SearchPage<T> {
    fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Configuration for a paginated fetch.
pub struct PageRequest<'a> {
    /// Short label for log lines.
    pub label: &'a str,
    /// Builds the absolute URL for a 1-based page number.
    pub route_fn: Box<dyn Fn(u32) -> String + Send + Sync + 'a>,
    /// Page size the route requests. A shorter page is the last page.
    pub per_page: u32,
    /// Stop after this many pages.
    pub max_pages: Option<u32>,
    pub accept: MediaType,
}

impl<'a> PageRequest<'a> {
    pub fn new(label: &'a str, route_fn: impl Fn(u32) -> String + Send + Sync + 'a) -> Self {
        Self {
            label,
            route_fn: Box::new(route_fn),
            per_page: DEFAULT_PER_PAGE,
            max_pages: None,
            accept: MediaType::default(),
        }
    }

    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    #[must_use]
    pub fn with_accept(mut self, accept: MediaType) -> Self {
        self.accept = accept;
        self
    }
}

impl ApiClient {
    /// Walk pages 1, 2, 3, … and concatenate their items in fetch order.
    ///
    /// Stops when:
    /// - a page is empty or shorter than `per_page`
    /// - `keep_going` returns `false` for the items collected so far
    /// - `max_pages` pages have been fetched
    /// - a page resolves to a skip (409)
    ///
    /// Any page error aborts the walk.
    pub async fn paginate<T, P>(
        &self,
        request: &PageRequest<'_>,
        stats: &mut RequestStats,
        mut keep_going: impl FnMut(&[T]) -> bool,
    ) -> Result<Vec<T>, ApiError>
    where
        P: PagePayload<T>,
    {
        let mut all_items: Vec<T> = Vec::new();
        let mut page = 1u32;

        loop {
            let url = (request.route_fn)(page);
            let payload: P = match self.fetch_json(&url, request.accept, stats).await? {
                FetchOutcome::Data(payload) => payload,
                FetchOutcome::Skip => {
                    tracing::debug!(label = request.label, page, "Page skipped (409), stopping");
                    break;
                }
            };

            let items = payload.into_items();
            let count = items.len();
            all_items.extend(items);

            tracing::debug!(
                label = request.label,
                page,
                count,
                total = all_items.len(),
                "Fetched page"
            );

            if count == 0 || (count as u64) < u64::from(request.per_page) {
                break;
            }
            if !keep_going(&all_items) {
                break;
            }
            if let Some(max_pages) = request.max_pages
                && page >= max_pages
            {
                tracing::debug!(label = request.label, max_pages, "Page cap reached");
                break;
            }

            page += 1;
        }

        Ok(all_items)
    }

    /// [`ApiClient::paginate`] over plain JSON arrays, until the last page.
    pub async fn paginate_all<T: DeserializeOwned>(
        &self,
        request: &PageRequest<'_>,
        stats: &mut RequestStats,
    ) -> Result<Vec<T>, ApiError> {
        self.paginate::<T, Vec<T>>(request, stats, |_| true).await
    }
}
