//! # Paginated Containers
//!
//! A [`Container`] is a lazy view over one remote listing: a resource type,
//! its filter parameters and, for relationship listings, the owning resource.
//! Pages are fetched only when an access needs them.
//!
//! ## State
//!
//! - `buffer`: proxies from every page fetched so far, in order
//! - `cursor`: the next-page link of the last page, followed verbatim
//! - `exhausted`: set once a page arrives without a next link; no page
//!   request is issued after that
//!
//! ## Access Patterns
//!
//! | Call | Pages fetched |
//! |------|---------------|
//! | [`Container::iter`] | one at a time, as the buffer runs out |
//! | [`Container::get`] with `i >= 0` | until `i` is buffered |
//! | [`Container::get`] with `i < 0` | all |
//! | [`Container::slice`] | up to the stop bound, or all if a bound is negative or open |
//! | [`Container::lookup`] | none |
//! | [`Container::len`] | none with a length hint, otherwise all |
//! | [`Container::find`], [`Container::filter`] | all |
//!
//! Iterating the same container again replays the buffer and resumes from
//! the cursor. A fresh remote traversal comes from [`Container::restart`] or
//! from a new container; every collection accessor builds a new one.

use crate::error::{Result, SparkError};
use crate::hints::HintKey;
use crate::ident::{ResourceId, ResourceType};
use crate::resource::Resource;
use crate::schema::get_spec;
use crate::session::Spark;
use crate::transport::{Request, Transport};
use crate::value::FieldValue;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

pub struct Container<'s, T: Transport> {
    session: &'s Spark<T>,
    resource_type: ResourceType,
    params: BTreeMap<String, String>,
    parent: Option<ResourceId>,
    buffer: Vec<Resource<'s, T>>,
    cursor: Option<String>,
    exhausted: bool,
}

impl<'s, T: Transport> Container<'s, T> {
    pub(crate) fn new(
        session: &'s Spark<T>,
        resource_type: ResourceType,
        params: BTreeMap<String, String>,
        parent: Option<ResourceId>,
    ) -> Self {
        Self {
            session,
            resource_type,
            params,
            parent,
            buffer: Vec::new(),
            cursor: None,
            exhausted: false,
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn parent(&self) -> Option<&ResourceId> {
        self.parent.as_ref()
    }

    /// Items fetched so far.
    pub fn buffered(&self) -> &[Resource<'s, T>] {
        &self.buffer
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn hint_key(&self) -> HintKey {
        HintKey::new(
            self.parent.as_ref().map(ResourceId::as_str),
            self.resource_type,
            &self.params,
        )
    }

    /// Drop everything fetched; the next access starts from the first page.
    pub fn restart(&mut self) {
        self.buffer.clear();
        self.cursor = None;
        self.exhausted = false;
    }

    fn first_request(&self) -> Request {
        let mut request = Request::get(self.resource_type.path()).with_query(
            self.params
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        if !self.params.contains_key("max") {
            request = request.with_query([("max".to_string(), self.session.per_page().to_string())]);
        }
        request
    }

    /// Fetch one more page into the buffer. Returns how many items it held;
    /// zero once exhausted.
    pub fn next_page(&mut self) -> Result<usize> {
        if self.exhausted {
            return Ok(0);
        }
        let request = match &self.cursor {
            Some(next) => Request::get(next.clone()),
            None => self.first_request(),
        };
        debug!("Fetching {} page from {}", self.resource_type, request.url);

        let response = self.session.transport().request(&request)?;
        if !response.is_success() {
            return Err(SparkError::RequestFailed {
                status: response.status,
                body: response.body,
            });
        }
        let body = response.json()?;
        let items = body
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                SparkError::UnexpectedResponse(format!(
                    "{} page has no items array",
                    self.resource_type
                ))
            })?;

        // a page is taken whole or not at all
        let page = items
            .iter()
            .map(|item| {
                Resource::from_record(
                    self.session,
                    self.resource_type,
                    item,
                    self.parent.clone(),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        self.buffer.extend(page);

        self.cursor = response.next_link;
        if self.cursor.is_none() {
            self.exhausted = true;
            self.session
                .hints()
                .record(self.hint_key(), self.buffer.len());
        }
        Ok(items.len())
    }

    fn fill_to(&mut self, count: usize) -> Result<()> {
        while self.buffer.len() < count && !self.exhausted {
            self.next_page()?;
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        while !self.exhausted {
            self.next_page()?;
        }
        Ok(())
    }

    /// Iterate over every item, fetching pages as the buffer runs out.
    pub fn iter(&mut self) -> ContainerIter<'_, 's, T> {
        ContainerIter {
            container: self,
            position: 0,
            failed: false,
        }
    }

    /// Item at `index`. Negative indices count from the end and fetch every
    /// page first.
    pub fn get(&mut self, index: isize) -> Result<&Resource<'s, T>> {
        let position = if index >= 0 {
            let position = index.unsigned_abs();
            self.fill_to(position + 1)?;
            Some(position)
        } else {
            self.drain()?;
            self.buffer.len().checked_sub(index.unsigned_abs())
        };
        let len = self.buffer.len();
        position
            .and_then(|p| self.buffer.get(p))
            .ok_or(SparkError::IndexOutOfRange { index, len })
    }

    /// Items in `start..stop`, with list-slice semantics: negative bounds
    /// count from the end and out-of-range bounds are clamped.
    pub fn slice(&mut self, start: Option<isize>, stop: Option<isize>) -> Result<&[Resource<'s, T>]> {
        match (start, stop) {
            (Some(a), _) if a < 0 => self.drain()?,
            (_, Some(b)) if b < 0 => self.drain()?,
            (_, None) => self.drain()?,
            (_, Some(b)) => self.fill_to(b.unsigned_abs())?,
        }

        let len = self.buffer.len();
        let clamp = |bound: isize| -> usize {
            if bound < 0 {
                len.saturating_sub(bound.unsigned_abs())
            } else {
                bound.unsigned_abs().min(len)
            }
        };
        let start = start.map(clamp).unwrap_or(0);
        let stop = stop.map(clamp).unwrap_or(len);
        if start >= stop {
            Ok(&[])
        } else {
            Ok(&self.buffer[start..stop])
        }
    }

    /// Proxy for an identifier or uuid of this container's type.
    ///
    /// Never touches the buffer or lists anything.
    pub fn lookup(&self, key: &str) -> Result<Resource<'s, T>> {
        let id = self.session.resolve_key(self.resource_type, key)?;
        Resource::new(self.session, id, self.parent.clone())
    }

    /// Advisory item count.
    ///
    /// Served from the session's length hints when a matching listing was
    /// drained before; otherwise drains this one and records the count.
    pub fn len(&mut self) -> Result<usize> {
        let key = self.hint_key();
        if let Some(hint) = self.session.hints().get(&key) {
            return Ok(hint);
        }
        self.drain()?;
        Ok(self.session.hints().record(key, self.buffer.len()))
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        self.fill_to(1)?;
        Ok(self.buffer.is_empty())
    }

    /// Every item whose text field `field` matches `pattern`.
    ///
    /// Items where the field is absent or not text never match.
    pub fn find(&mut self, field: &str, pattern: &str) -> Result<Vec<Resource<'s, T>>> {
        if get_spec(self.resource_type, field).is_none() {
            return Err(SparkError::UnknownAttribute {
                resource: self.resource_type.to_string(),
                name: field.to_string(),
            });
        }
        let pattern = Regex::new(pattern)?;
        self.filter(|item| match item.get(field) {
            Ok(FieldValue::Text(text)) => pattern.is_match(&text),
            _ => false,
        })
    }

    /// Every item for which `predicate` holds.
    pub fn filter<F>(&mut self, mut predicate: F) -> Result<Vec<Resource<'s, T>>>
    where
        F: FnMut(&Resource<'s, T>) -> bool,
    {
        self.drain()?;
        Ok(self
            .buffer
            .iter()
            .filter(|item| predicate(*item))
            .cloned()
            .collect())
    }

    /// Every item, fetching all pages.
    pub fn items(&mut self) -> Result<Vec<Resource<'s, T>>> {
        self.iter().collect()
    }
}

impl<T: Transport> fmt::Debug for Container<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("type", &self.resource_type)
            .field("params", &self.params)
            .field("buffered", &self.buffer.len())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

/// Cursor over a container.
///
/// Yields clones of buffered proxies and pulls the next page when it reaches
/// the end of the buffer. A failed page request is yielded once, then the
/// iterator ends.
pub struct ContainerIter<'c, 's, T: Transport> {
    container: &'c mut Container<'s, T>,
    position: usize,
    failed: bool,
}

impl<'s, T: Transport> Iterator for ContainerIter<'_, 's, T> {
    type Item = Result<Resource<'s, T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(item) = self.container.buffer.get(self.position) {
                self.position += 1;
                return Some(Ok(item.clone()));
            }
            if self.container.exhausted {
                return None;
            }
            if let Err(e) = self.container.next_page() {
                self.failed = true;
                return Some(Err(e));
            }
        }
    }
}

impl<'c, 's, T: Transport> IntoIterator for &'c mut Container<'s, T> {
    type Item = Result<Resource<'s, T>>;
    type IntoIter = ContainerIter<'c, 's, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
