//! Page cursors, page requests and fetched pages.

use cloudops_core::response::{array_at, string_at, value_at};
use cloudops_core::{Operation, OperationError};
use serde_json::Value;

/// Page size most list calls accept as their maximum.
pub const PAGE_SIZE_LARGE: usize = 50;

/// Position within an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// 1-based page number.
    Number(usize),
    /// Opaque continuation token; `None` for the first page.
    Token(Option<String>),
}

/// Request parameter names a list call uses for its cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageParams {
    /// Page number parameter, `PageNumber` by default.
    pub page_number: String,
    /// Page size parameter, `PageSize` by default.
    pub page_size: String,
    /// Continuation token parameter, `NextToken` by default.
    pub next_token: String,
    /// Page size parameter of token-style calls, `MaxResults` by default.
    pub max_results: String,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page_number: "PageNumber".to_string(),
            page_size: "PageSize".to_string(),
            next_token: "NextToken".to_string(),
            max_results: "MaxResults".to_string(),
        }
    }
}

/// The cursor and size of one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Which page to fetch.
    pub cursor: PageCursor,
    /// Requested page size. Always set for page-number requests.
    pub page_size: Option<usize>,
}

impl PageRequest {
    /// The first page of a page-number enumeration.
    pub fn page_number(page_size: usize) -> Self {
        Self {
            cursor: PageCursor::Number(1),
            page_size: Some(page_size.max(1)),
        }
    }

    /// The first page of a next-token enumeration.
    pub fn next_token(max_results: Option<usize>) -> Self {
        Self {
            cursor: PageCursor::Token(None),
            page_size: max_results,
        }
    }

    /// Writes this request's cursor into `op` using the default parameter
    /// names.
    ///
    /// ```
    /// use cloudops_core::Operation;
    /// use cloudops_paginator::PageRequest;
    ///
    /// let op = Operation::new("DescribeVpcs", "2016-04-28");
    /// let first = PageRequest::page_number(50).apply_to(&op);
    /// assert_eq!(first.params()["PageNumber"], 1);
    /// assert_eq!(first.params()["PageSize"], 50);
    /// ```
    pub fn apply_to(&self, op: &Operation) -> Operation {
        self.apply_with(op, &PageParams::default())
    }

    /// Writes this request's cursor into `op` using `params` names.
    pub fn apply_with(&self, op: &Operation, params: &PageParams) -> Operation {
        match &self.cursor {
            PageCursor::Number(page) => {
                let size = self.page_size.unwrap_or(PAGE_SIZE_LARGE);
                op.with_param(params.page_number.as_str(), *page)
                    .param(params.page_size.as_str(), size)
            }
            PageCursor::Token(token) => {
                let op = match token {
                    Some(token) => op.with_param(params.next_token.as_str(), token.as_str()),
                    None => op.without_param(&params.next_token),
                };
                match self.page_size {
                    Some(max) => op.param(params.max_results.as_str(), max),
                    None => op,
                }
            }
        }
    }

    /// The request for the page after `page`, or `None` when `page` was
    /// the last one.
    ///
    /// Page-number enumeration ends on the first page shorter than the
    /// page size. Token enumeration ends on the first page without a
    /// non-empty next token.
    pub fn advance<T>(&self, page: &Page<T>) -> Option<PageRequest> {
        match &self.cursor {
            PageCursor::Number(number) => {
                let size = self.page_size.unwrap_or(PAGE_SIZE_LARGE);
                if page.items.len() < size {
                    return None;
                }
                Some(PageRequest {
                    cursor: PageCursor::Number(number + 1),
                    page_size: self.page_size,
                })
            }
            PageCursor::Token(_) => match page.next_token.as_deref() {
                Some(token) if !token.is_empty() => Some(PageRequest {
                    cursor: PageCursor::Token(Some(token.to_string())),
                    page_size: self.page_size,
                }),
                _ => None,
            },
        }
    }
}

/// Where a list response keeps its items, next token and total count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePaths {
    /// Path of the item array, e.g. `$.Vpcs.Vpc`.
    pub items: String,
    /// Path of the next token, `$.NextToken` by default.
    pub next_token: Option<String>,
    /// Path of the total count, `$.TotalCount` by default.
    pub total_count: Option<String>,
}

impl PagePaths {
    /// Paths with `items` and the default token and count locations.
    pub fn new(items: impl Into<String>) -> Self {
        Self {
            items: items.into(),
            next_token: Some("$.NextToken".to_string()),
            total_count: Some("$.TotalCount".to_string()),
        }
    }
}

/// One fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page, before filtering.
    pub items: Vec<T>,
    /// Continuation token reported by the page, if any.
    pub next_token: Option<String>,
    /// Total number of items reported by the API, if any.
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    /// A page with only items.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
            total_count: None,
        }
    }

    /// Sets the continuation token.
    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }
}

impl Page<Value> {
    /// Extracts a page from a JSON list response.
    ///
    /// A missing or `null` item array is an empty page.
    pub fn from_response(body: &Value, paths: &PagePaths, action: &str) -> Result<Self, OperationError> {
        let items = array_at(body, &paths.items, "", action)?.to_vec();
        let next_token = paths
            .next_token
            .as_deref()
            .and_then(|path| string_at(body, path))
            .filter(|token| !token.is_empty());
        let total_count = paths
            .total_count
            .as_deref()
            .and_then(|path| value_at(body, path))
            .and_then(|count| match count {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            });

        Ok(Self {
            items,
            next_token,
            total_count,
        })
    }
}
