use crate::cursor::{PageParams, PagePaths, PageRequest, PAGE_SIZE_LARGE};
use crate::events::PageEvent;
use crate::filter::{FieldFn, ItemFilter};
use cloudops_core::events::{EventListeners, FnListener};
use regex::Regex;
use std::collections::HashSet;

#[cfg(feature = "metrics")]
use metrics::describe_counter;
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Configuration for enumerating a list call.
pub struct PaginatorConfig<T> {
    pub(crate) name: String,
    pub(crate) first: PageRequest,
    pub(crate) params: PageParams,
    pub(crate) paths: Option<PagePaths>,
    pub(crate) max_pages: Option<usize>,
    pub(crate) filter: ItemFilter<T>,
    pub(crate) event_listeners: EventListeners<PageEvent>,
}

impl<T> Clone for PaginatorConfig<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            first: self.first.clone(),
            params: self.params.clone(),
            paths: self.paths.clone(),
            max_pages: self.max_pages,
            filter: self.filter.clone(),
            event_listeners: self.event_listeners.clone(),
        }
    }
}

impl<T> PaginatorConfig<T> {
    /// Creates a new builder.
    pub fn builder() -> PaginatorConfigBuilder<T> {
        #[cfg(feature = "metrics")]
        {
            METRICS_INIT.call_once(|| {
                describe_counter!("paginator_pages_total", "Total number of pages fetched");
                describe_counter!(
                    "paginator_items_total",
                    "Total number of items fetched, labelled by whether the filters kept them"
                );
            });
        }
        PaginatorConfigBuilder::new()
    }

    /// The name used in events and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The request for the first page.
    pub fn first_request(&self) -> &PageRequest {
        &self.first
    }

    /// The item filter.
    pub fn filter(&self) -> &ItemFilter<T> {
        &self.filter
    }
}

impl<T> std::fmt::Debug for PaginatorConfig<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatorConfig")
            .field("name", &self.name)
            .field("first", &self.first)
            .field("max_pages", &self.max_pages)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PaginatorConfig`].
pub struct PaginatorConfigBuilder<T> {
    name: String,
    first: PageRequest,
    params: PageParams,
    paths: Option<PagePaths>,
    max_pages: Option<usize>,
    filter: ItemFilter<T>,
    event_listeners: EventListeners<PageEvent>,
}

impl<T> Default for PaginatorConfigBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PaginatorConfigBuilder<T> {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - page-number enumeration with a page size of [`PAGE_SIZE_LARGE`]
    /// - `PageNumber`/`PageSize`/`NextToken`/`MaxResults` parameter names
    /// - no page limit, no filters
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            name: "<unnamed>".to_string(),
            first: PageRequest::page_number(PAGE_SIZE_LARGE),
            params: PageParams::default(),
            paths: None,
            max_pages: None,
            filter: ItemFilter::new(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name for this paginator (used in events and metrics).
    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Enumerates by page number with `page_size` items per page.
    pub fn page_number(mut self, page_size: usize) -> Self {
        self.first = PageRequest::page_number(page_size);
        self
    }

    /// Enumerates by next token.
    pub fn next_token(mut self) -> Self {
        self.first = PageRequest::next_token(None);
        self
    }

    /// Enumerates by next token, asking for `max_results` items per page.
    pub fn next_token_with_max_results(mut self, max_results: usize) -> Self {
        self.first = PageRequest::next_token(Some(max_results));
        self
    }

    /// Overrides request parameter names.
    pub fn params(mut self, params: PageParams) -> Self {
        self.params = params;
        self
    }

    /// Sets where JSON list responses keep their items, next token and
    /// total count. Required by the operation-driven enumeration.
    pub fn paths(mut self, paths: PagePaths) -> Self {
        self.paths = Some(paths);
        self
    }

    /// Shorthand for [`paths`](Self::paths) with default token and count
    /// locations.
    pub fn items_path(self, items: impl Into<String>) -> Self {
        self.paths(PagePaths::new(items))
    }

    /// Fails enumeration with
    /// [`OperationError::Pagination`](cloudops_core::OperationError::Pagination)
    /// if more than `max_pages` pages would be fetched.
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages.max(1));
        self
    }

    /// Replaces the item filter.
    pub fn filter(mut self, filter: ItemFilter<T>) -> Self {
        self.filter = filter;
        self
    }

    /// Sets how item names are read for [`name_regex`](Self::name_regex).
    pub fn name_field(mut self, f: FieldFn<T>) -> Self {
        self.filter = self.filter.name_field(f);
        self
    }

    /// Sets how item ids are read for [`ids`](Self::ids).
    pub fn id_field(mut self, f: FieldFn<T>) -> Self {
        self.filter = self.filter.id_field(f);
        self
    }

    /// Keeps items whose name matches `regex`. Requires
    /// [`name_field`](Self::name_field).
    pub fn name_regex(mut self, regex: Regex) -> Self {
        self.filter = self.filter.name_regex(regex);
        self
    }

    /// Keeps items whose id is in `ids`. An empty set keeps everything.
    /// A non-empty set requires [`id_field`](Self::id_field).
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: HashSet<String> = ids.into_iter().map(Into::into).collect();
        self.filter = self.filter.ids(ids);
        self
    }

    /// Keeps items for which `predicate` returns `true`.
    pub fn keep_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter = self.filter.predicate(predicate);
        self
    }

    /// Registers a callback after each page.
    ///
    /// # Callback Signature
    /// `Fn(usize, usize, usize)` - page number (1-based), items fetched and
    /// items kept by the filters.
    pub fn on_page<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, usize, usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let PageEvent::Fetched {
                page, fetched, kept, ..
            } = event
            {
                f(*page, *fetched, *kept);
            }
        }));
        self
    }

    /// Registers a callback when enumeration finishes.
    ///
    /// # Callback Signature
    /// `Fn(usize, usize)` - pages fetched and items kept.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let PageEvent::Completed { pages, items, .. } = event {
                f(*pages, *items);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> PaginatorConfig<T> {
        PaginatorConfig {
            name: self.name,
            first: self.first,
            params: self.params,
            paths: self.paths,
            max_pages: self.max_pages,
            filter: self.filter,
            event_listeners: self.event_listeners,
        }
    }
}
