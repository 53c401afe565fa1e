//! Client-side item filters.
//!
//! Every active filter must accept an item for it to be kept.

use cloudops_core::response::string_at;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Reads a string field from an item.
pub type FieldFn<T> = Arc<dyn Fn(&T) -> Option<String> + Send + Sync>;

/// Decides whether an item is kept.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A [`FieldFn`] reading `path` from JSON items.
pub fn json_field(path: impl Into<String>) -> FieldFn<Value> {
    let path = path.into();
    Arc::new(move |item: &Value| string_at(item, &path))
}

/// Name regex, id set and custom predicate, ANDed.
pub struct ItemFilter<T> {
    name_regex: Option<Regex>,
    name_fn: Option<FieldFn<T>>,
    ids: HashSet<String>,
    id_fn: Option<FieldFn<T>>,
    predicate: Option<Predicate<T>>,
}

impl<T> Default for ItemFilter<T> {
    fn default() -> Self {
        Self {
            name_regex: None,
            name_fn: None,
            ids: HashSet::new(),
            id_fn: None,
            predicate: None,
        }
    }
}

impl<T> Clone for ItemFilter<T> {
    fn clone(&self) -> Self {
        Self {
            name_regex: self.name_regex.clone(),
            name_fn: self.name_fn.clone(),
            ids: self.ids.clone(),
            id_fn: self.id_fn.clone(),
            predicate: self.predicate.clone(),
        }
    }
}

impl<T> ItemFilter<T> {
    /// A filter that keeps everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps items whose name matches `regex`.
    pub fn name_regex(mut self, regex: Regex) -> Self {
        self.name_regex = Some(regex);
        self
    }

    /// Sets how an item's name is read.
    pub fn name_field(mut self, f: FieldFn<T>) -> Self {
        self.name_fn = Some(f);
        self
    }

    /// Keeps items whose id is in `ids`. An empty set disables the filter.
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets how an item's id is read.
    pub fn id_field(mut self, f: FieldFn<T>) -> Self {
        self.id_fn = Some(f);
        self
    }

    /// Keeps items for which `predicate` returns `true`.
    pub fn predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Returns `true` when no filter is active.
    pub fn is_empty(&self) -> bool {
        self.name_regex.is_none() && self.ids.is_empty() && self.predicate.is_none()
    }

    /// Names the field an active filter needs but has no reader for.
    ///
    /// A name regex without [`name_field`](Self::name_field), or an id set
    /// without [`id_field`](Self::id_field), would reject every item.
    pub fn missing_reader(&self) -> Option<&'static str> {
        if self.name_regex.is_some() && self.name_fn.is_none() {
            return Some("name");
        }
        if !self.ids.is_empty() && self.id_fn.is_none() {
            return Some("id");
        }
        None
    }

    /// Returns `true` if `item` passes every active filter.
    ///
    /// An item whose name or id cannot be read fails the corresponding
    /// filter.
    pub fn matches(&self, item: &T) -> bool {
        if let Some(regex) = &self.name_regex {
            let name = self.name_fn.as_ref().and_then(|f| f(item));
            if !name.is_some_and(|name| regex.is_match(&name)) {
                return false;
            }
        }

        if !self.ids.is_empty() {
            let id = self.id_fn.as_ref().and_then(|f| f(item));
            if !id.is_some_and(|id| self.ids.contains(&id)) {
                return false;
            }
        }

        match &self.predicate {
            Some(predicate) => predicate(item),
            None => true,
        }
    }
}

impl<T> fmt::Debug for ItemFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemFilter")
            .field("name_regex", &self.name_regex.as_ref().map(Regex::as_str))
            .field("ids", &self.ids.len())
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}
