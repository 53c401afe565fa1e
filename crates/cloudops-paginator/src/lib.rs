//! Enumeration of paginated cloud list calls.
//!
//! Two cursor styles are supported: page numbers starting at 1 (ending on
//! the first short page) and opaque next tokens (ending on the first page
//! without one). Items are filtered page by page as they arrive; the name
//! regex, the id set and the custom predicate must all accept an item for
//! it to be kept.
//!
//! # Examples
//!
//! ```
//! use cloudops_core::OperationError;
//! use cloudops_paginator::{Page, PaginatorConfig};
//!
//! # async fn example() -> Result<(), OperationError> {
//! let paginator = PaginatorConfig::builder()
//!     .name("vswitches")
//!     .page_number(2)
//!     .keep_if(|n: &u32| n % 2 == 1)
//!     .build();
//!
//! let odd = paginator
//!     .collect(|request| async move {
//!         let items = match request.cursor {
//!             cloudops_paginator::PageCursor::Number(1) => vec![1, 2],
//!             _ => vec![3],
//!         };
//!         Ok(Page::new(items))
//!     })
//!     .await?;
//! assert_eq!(odd, vec![1, 3]);
//! # Ok(())
//! # }
//! ```

mod config;
mod cursor;
mod events;
mod filter;

pub use config::{PaginatorConfig, PaginatorConfigBuilder};
pub use cursor::{Page, PageCursor, PageParams, PagePaths, PageRequest, PAGE_SIZE_LARGE};
pub use events::PageEvent;
pub use filter::{json_field, FieldFn, ItemFilter, Predicate};

use cloudops_core::{ApiError, Operation, OperationError, Payload};
use cloudops_retry::RetryConfig;
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::time::Instant;
use tower::Service;

#[cfg(feature = "metrics")]
use metrics::counter;

impl<T> PaginatorConfig<T> {
    /// Fetches pages with `list` until the cursor runs out, returning the
    /// items every filter kept, in page order.
    ///
    /// `list` receives the request for each page; an error from it ends
    /// enumeration and is returned as is. A name or id filter configured
    /// without its field reader fails with [`OperationError::Pagination`]
    /// before the first page is requested.
    pub async fn collect<F, Fut>(&self, mut list: F) -> Result<Vec<T>, OperationError>
    where
        F: FnMut(PageRequest) -> Fut,
        Fut: Future<Output = Result<Page<T>, OperationError>>,
    {
        self.collect_labelled("list", move |request| list(request)).await
    }

    async fn collect_labelled<F, Fut>(&self, action: &str, mut list: F) -> Result<Vec<T>, OperationError>
    where
        F: FnMut(PageRequest) -> Fut,
        Fut: Future<Output = Result<Page<T>, OperationError>>,
    {
        if let Some(field) = self.filter.missing_reader() {
            return Err(OperationError::Pagination {
                action: action.to_string(),
                reason: format!("{field} filter set without a {field} field reader"),
            });
        }

        let mut request = self.first.clone();
        let mut kept = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut pages = 0usize;

        loop {
            pages += 1;

            #[cfg(feature = "tracing")]
            tracing::debug!(paginator = %self.name, action, page = pages, cursor = ?request.cursor, "fetching page");

            let page = list(request.clone()).await?;
            let next = request.advance(&page);
            let fetched = page.items.len();

            let before = kept.len();
            kept.extend(page.items.into_iter().filter(|item| self.filter.matches(item)));
            let kept_now = kept.len() - before;

            self.event_listeners.emit(&PageEvent::Fetched {
                pattern_name: self.name.clone(),
                timestamp: Instant::now(),
                page: pages,
                fetched,
                kept: kept_now,
            });

            #[cfg(feature = "metrics")]
            {
                counter!("paginator_pages_total", "paginator" => self.name.clone()).increment(1);
                counter!("paginator_items_total", "paginator" => self.name.clone(), "kept" => "true")
                    .increment(kept_now as u64);
                counter!("paginator_items_total", "paginator" => self.name.clone(), "kept" => "false")
                    .increment((fetched - kept_now) as u64);
            }

            let Some(next) = next else {
                break;
            };

            if let PageCursor::Token(Some(token)) = &next.cursor {
                if !seen_tokens.insert(token.clone()) {
                    return Err(OperationError::Pagination {
                        action: action.to_string(),
                        reason: format!("next token {token:?} was returned twice"),
                    });
                }
            }

            if matches!(self.max_pages, Some(max) if pages >= max) {
                return Err(OperationError::Pagination {
                    action: action.to_string(),
                    reason: format!("more than {pages} pages"),
                });
            }

            request = next;
        }

        self.event_listeners.emit(&PageEvent::Completed {
            pattern_name: self.name.clone(),
            timestamp: Instant::now(),
            pages,
            items: kept.len(),
        });

        Ok(kept)
    }
}

impl PaginatorConfig<Value> {
    /// Enumerates a JSON list call: each page request is written into
    /// `op`, sent through `client` under `retry`, and parsed with the
    /// configured [`PagePaths`].
    pub async fn collect_operation<S>(
        &self,
        retry: &RetryConfig,
        client: S,
        op: &Operation,
    ) -> Result<Vec<Value>, OperationError>
    where
        S: Service<Operation, Response = Payload, Error = ApiError> + Clone,
    {
        let Some(paths) = self.paths.as_ref() else {
            return Err(OperationError::Pagination {
                action: op.action().to_string(),
                reason: "no item path configured".to_string(),
            });
        };

        self.collect_labelled(op.action(), |request| {
            let page_op = request.apply_with(op, &self.params);
            let client = client.clone();
            async move {
                let action = page_op.action().to_string();
                let body = retry.invoke_operation(client, page_op).await?;
                Page::from_response(&Value::Object(body), paths, &action)
            }
        })
        .await
    }
}
