//! Provider storage for a context
//!
//! Uses DashMap keyed by `TypeId`, plus a strong reference to the parent
//! context's storage for chain lookups.

use crate::provider::Provider;
use ahash::RandomState;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

/// Providers registered directly in one context, and the way to its ancestors.
///
/// Lookups hand out `Arc<Provider>` clones so no map guard is held while a
/// provider constructs; constructors re-enter the storage to resolve their own
/// dependencies and may auto-register into it.
pub struct ServiceStorage {
    /// Map from TypeId to provider
    providers: DashMap<TypeId, Arc<Provider>, RandomState>,
    /// Optional parent storage for hierarchical resolution
    parent: Option<Arc<ServiceStorage>>,
}

impl ServiceStorage {
    /// Create new empty storage.
    ///
    /// A context typically holds a handful of providers, so 8 shards keep
    /// creation cheap.
    #[inline]
    pub fn new() -> Self {
        Self {
            providers: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
            parent: None,
        }
    }

    /// Create a child storage from this storage.
    #[inline]
    pub fn child(self: &Arc<Self>) -> Self {
        Self {
            providers: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
            parent: Some(Arc::clone(self)),
        }
    }

    /// Insert or replace a provider
    #[inline]
    pub fn insert(&self, type_id: TypeId, provider: Provider) {
        self.providers.insert(type_id, Arc::new(provider));
    }

    /// Return the local provider, inserting the one built by `f` if absent.
    ///
    /// Two callers racing on the same key both get the winner's provider.
    #[inline]
    pub fn get_or_insert_with(&self, type_id: TypeId, f: impl FnOnce() -> Provider) -> Arc<Provider> {
        Arc::clone(self.providers.entry(type_id).or_insert_with(|| Arc::new(f())).value())
    }

    /// Check if type exists locally
    #[inline]
    pub fn contains(&self, type_id: &TypeId) -> bool {
        self.providers.contains_key(type_id)
    }

    /// Local provider for a type
    #[inline]
    pub fn get(&self, type_id: &TypeId) -> Option<Arc<Provider>> {
        self.providers.get(type_id).map(|p| Arc::clone(p.value()))
    }

    /// Find the provider in this storage or the nearest ancestor.
    ///
    /// Returns the provider and how many levels up it was found (0 = local).
    #[inline]
    pub fn lookup(&self, type_id: &TypeId) -> Option<(Arc<Provider>, u32)> {
        let mut current = Some(self);
        let mut distance = 0;

        while let Some(storage) = current {
            if let Some(provider) = storage.get(type_id) {
                return Some((provider, distance));
            }
            current = storage.parent.as_deref();
            distance += 1;
        }

        None
    }

    /// Check if a provider exists in this storage or any parent.
    #[inline]
    pub fn contains_in_chain(&self, type_id: &TypeId) -> bool {
        self.lookup(type_id).is_some()
    }

    /// Get reference to parent storage (if any)
    #[inline]
    pub fn parent(&self) -> Option<&Arc<ServiceStorage>> {
        self.parent.as_ref()
    }

    /// The storage at the top of the parent chain
    #[inline]
    pub fn root(&self) -> &ServiceStorage {
        let mut current = self;
        while let Some(parent) = current.parent.as_deref() {
            current = parent;
        }
        current
    }

    /// Get number of registered providers
    #[inline]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Clear all providers (preserves parent reference)
    #[inline]
    pub fn clear(&self) {
        self.providers.clear();
    }

    /// Remove a provider
    #[inline]
    pub fn remove(&self, type_id: &TypeId) -> bool {
        self.providers.remove(type_id).is_some()
    }

    /// Get all registered type IDs
    pub fn type_ids(&self) -> Vec<TypeId> {
        self.providers.iter().map(|r| *r.key()).collect()
    }
}

impl Default for ServiceStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceStorage")
            .field("count", &self.len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
