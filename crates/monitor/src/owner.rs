//! Side table of UI owners.
//!
//! Owners (screens, activities) are referred to by an opaque id only. The
//! table never holds the owner itself, and entries are removed explicitly
//! when the owner is torn down.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque, non-owning reference to a UI owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub u64);

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

/// Presentation traits that decide whether the bar may be shown over an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OwnerTraits {
    pub fullscreen: bool,
    pub action_bar_showing: bool,
}

impl OwnerTraits {
    /// Fullscreen owners and owners with their own action bar get no status bar.
    pub fn hides_status_bar(&self) -> bool {
        self.fullscreen || self.action_bar_showing
    }
}

#[derive(Debug, Default)]
pub struct OwnerTable {
    owners: HashMap<OwnerId, OwnerTraits>,
}

impl OwnerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember an owner's traits. The first traits seen for an owner stick.
    pub fn remember(&mut self, id: OwnerId, traits: OwnerTraits) -> OwnerTraits {
        *self.owners.entry(id).or_insert(traits)
    }

    pub fn get(&self, id: OwnerId) -> Option<OwnerTraits> {
        self.owners.get(&id).copied()
    }

    pub fn remove(&mut self, id: OwnerId) -> Option<OwnerTraits> {
        self.owners.remove(&id)
    }

    pub fn contains(&self, id: OwnerId) -> bool {
        self.owners.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
