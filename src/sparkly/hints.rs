//! Advisory length hints for containers.
//!
//! A hint is the largest item count ever observed by fully draining a
//! container with the same parent, resource type and filter parameters. Hints
//! only grow. They are never authoritative: the remote collection can change
//! between calls.
//!
//! The cache is an ordinary object owned by the session and shared with its
//! containers, so tests get isolated instances.

use crate::ident::ResourceType;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HintKey {
    /// Identifier of the owning resource, for relationship collections.
    pub parent: Option<String>,
    pub resource_type: ResourceType,
    /// Filter parameters, sorted by name.
    pub params: Vec<(String, String)>,
}

impl HintKey {
    pub fn new(
        parent: Option<&str>,
        resource_type: ResourceType,
        params: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            parent: parent.map(str::to_string),
            resource_type,
            params: params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct LengthHints {
    counts: RefCell<HashMap<HintKey, usize>>,
}

impl LengthHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &HintKey) -> Option<usize> {
        self.counts.borrow().get(key).copied()
    }

    /// Record an observed count, keeping the maximum. Returns the stored hint.
    pub fn record(&self, key: HintKey, count: usize) -> usize {
        let mut counts = self.counts.borrow_mut();
        let entry = counts.entry(key).or_insert(0);
        *entry = (*entry).max(count);
        *entry
    }

    pub fn len(&self) -> usize {
        self.counts.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.counts.borrow_mut().clear();
    }
}
