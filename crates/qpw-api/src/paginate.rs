// Page-number pagination over list endpoints.
//
// Servers disagree on the entity-list field name and signal more pages
// only through a continuation link. `PageShape` hides both behind one
// adapter; the walk loop only sees `PageResult`.

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::Error;
use crate::query::QueryParams;

/// Largest page size the platform accepts.
pub const MAX_PAGE_SIZE: u32 = 200;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Hard ceiling on pages fetched per walk.
pub const DEFAULT_MAX_PAGES: u32 = 50;

/// One page, normalised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    pub entities: Vec<Value>,
    pub has_next: bool,
}

/// Response adapter: where a page keeps its entities and its continuation link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageShape {
    /// Candidate entity-list fields, first match wins.
    pub list_fields: &'static [&'static str],
    /// Candidate continuation fields; any non-null one means "more pages".
    pub continuation_fields: &'static [&'static str],
}

impl Default for PageShape {
    fn default() -> Self {
        Self {
            list_fields: &["entities", "items"],
            continuation_fields: &["nextUri", "nextPage"],
        }
    }
}

impl PageShape {
    pub fn adapt(&self, body: Option<Value>) -> PageResult {
        let Some(Value::Object(mut obj)) = body else {
            return PageResult::default();
        };

        let has_next = self
            .continuation_fields
            .iter()
            .any(|f| obj.get(*f).is_some_and(|v| !v.is_null()));

        let entities = self
            .list_fields
            .iter()
            .find_map(|f| match obj.remove(*f) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default();

        PageResult { entities, has_next }
    }
}

/// Walk tuning. Out-of-range values are clamped, not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    pub page_size: u32,
    pub max_pages: u32,
    pub start_page: u32,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            start_page: 1,
        }
    }
}

impl WalkOptions {
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn start_page(mut self, start_page: u32) -> Self {
        self.start_page = start_page;
        self
    }

    fn normalized(self) -> Self {
        Self {
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
            max_pages: self.max_pages.max(1),
            start_page: self.start_page.max(1),
        }
    }
}

impl ApiClient {
    /// Collect every entity of a paginated resource, using the default shape.
    pub async fn walk(
        &self,
        path: &str,
        base_params: &QueryParams,
        options: &WalkOptions,
    ) -> Result<Vec<Value>, Error> {
        self.walk_with_shape(path, base_params, options, &PageShape::default())
            .await
    }

    /// Collect every entity of a paginated resource.
    ///
    /// Pages are fetched strictly in sequence. The walk stops when a page
    /// carries no continuation link, or after `max_pages` pages even if
    /// the server keeps signalling more; the truncated result is still
    /// returned as success. Any failed page aborts the walk.
    pub async fn walk_with_shape(
        &self,
        path: &str,
        base_params: &QueryParams,
        options: &WalkOptions,
        shape: &PageShape,
    ) -> Result<Vec<Value>, Error> {
        let opts = options.normalized();
        let mut params = base_params.clone();
        let mut all = Vec::new();
        let mut page_number = opts.start_page;

        for fetched in 1..=opts.max_pages {
            params.insert("pageNumber", page_number);
            params.insert("pageSize", opts.page_size);

            let body = self.request(path, Some(&params), None).await?;
            let page = shape.adapt(body);
            debug!(
                %path,
                page_number,
                received = page.entities.len(),
                has_next = page.has_next,
                "fetched page"
            );
            all.extend(page.entities);

            if !page.has_next {
                return Ok(all);
            }
            if fetched == opts.max_pages {
                warn!(
                    %path,
                    max_pages = opts.max_pages,
                    collected = all.len(),
                    "page ceiling reached, result truncated"
                );
                break;
            }
            let Some(next) = page_number.checked_add(1) else {
                warn!(
                    %path,
                    page_number,
                    collected = all.len(),
                    "page number exhausted, result truncated"
                );
                break;
            };
            page_number = next;
        }

        Ok(all)
    }
}
