//! Rule and group stores.
//!
//! Both stores share one generic core, `Store<T>`:
//!
//! - readers take an `ArcSwap` snapshot and never see a half-applied change
//! - writers serialize on a per-store mutex, apply the change to a copy,
//!   persist the copy, and only then publish it
//!
//! A save failure therefore leaves both memory and disk at their previous
//! state.

mod groups;
pub mod persistence;
mod rules;

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::Utc;
use linkroute_config::{UrlGroup, UrlRule};
use parking_lot::Mutex;
use uuid::Uuid;

pub use crate::error::StoreError;
use crate::error::{EntityKind, RouteError};
pub use persistence::{MemoryPersistence, Persistence, YamlFile};

/// Store of individual rules
pub type RuleStore = Store<UrlRule>;

/// Store of URL groups
pub type GroupStore = Store<UrlGroup>;

/// Something a `Store` can hold
pub trait Entity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;
    /// Plural noun used in log and error messages
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;
    fn set_id(&mut self, id: Uuid);

    /// Canonicalize a brand-new entity before it is stored
    fn prepare_insert(&mut self);

    /// Canonicalize an edited entity, carrying over fields callers may not change
    fn prepare_update(&mut self, existing: &Self);

    /// Canonicalize an entity read from disk or an import bundle, upgrading
    /// fields written by older versions
    fn canonicalize_loaded(&mut self);
}

impl Entity for UrlRule {
    const KIND: EntityKind = EntityKind::Rule;
    const COLLECTION: &'static str = "rules";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn prepare_insert(&mut self) {
        self.pattern = crate::pattern::normalize_pattern(&self.pattern);
        if self.created_at.is_none() {
            self.created_at = Some(Utc::now());
        }
    }

    fn prepare_update(&mut self, existing: &Self) {
        self.pattern = crate::pattern::normalize_pattern(&self.pattern);
        self.created_at = existing.created_at;
    }

    fn canonicalize_loaded(&mut self) {
        self.pattern = crate::pattern::normalize_pattern(&self.pattern);
    }
}

impl Entity for UrlGroup {
    const KIND: EntityKind = EntityKind::Group;
    const COLLECTION: &'static str = "groups";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn prepare_insert(&mut self) {
        groups::canonicalize_group(self);
    }

    fn prepare_update(&mut self, existing: &Self) {
        // Built-in status and the template snapshot belong to the synchronizer.
        self.is_built_in = existing.is_built_in;
        self.template_snapshot = existing.template_snapshot.clone();
        groups::canonicalize_group(self);
    }

    fn canonicalize_loaded(&mut self) {
        if self.migrate_legacy_profile() {
            log::info!("Group '{}': moved legacy default profile into profiles", self.name);
        }
        groups::canonicalize_group(self);
    }
}

/// Copy-on-write collection with write-through persistence
pub struct Store<T: Entity> {
    items: ArcSwap<Vec<T>>,
    write_lock: Mutex<()>,
    persistence: Box<dyn Persistence<T>>,
}

impl<T: Entity> Store<T> {
    /// Create an empty store; call `load_from_persistence` to populate it
    pub fn new(persistence: impl Persistence<T> + 'static) -> Self {
        Self {
            items: ArcSwap::from_pointee(Vec::new()),
            write_lock: Mutex::new(()),
            persistence: Box::new(persistence),
        }
    }

    /// Consistent snapshot of every entity, in store order
    pub fn list(&self) -> Arc<Vec<T>> {
        self.items.load_full()
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.items.load().iter().find(|item| item.id() == *id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.load().is_empty()
    }

    /// Apply `change` to a copy, persist it, then publish it.
    ///
    /// If `change` or the save fails, the published snapshot is untouched.
    pub(crate) fn mutate<R>(
        &self,
        change: impl FnOnce(&mut Vec<T>) -> Result<R, RouteError>,
    ) -> Result<R, RouteError> {
        let _guard = self.write_lock.lock();
        let mut next = Vec::clone(&self.items.load());
        let out = change(&mut next)?;
        if let Err(e) = self.persistence.save(&next) {
            crate::debug_error!("STORE", "Saving {} failed, rolled back: {}", T::COLLECTION, e);
            return Err(e.into());
        }
        self.items.store(Arc::new(next));
        Ok(out)
    }

    /// Insert a new entity and return its id.
    ///
    /// A colliding id is replaced with a fresh one rather than overwriting.
    pub fn add(&self, mut entity: T) -> Result<Uuid, RouteError> {
        entity.prepare_insert();
        self.mutate(|items| {
            if items.iter().any(|item| item.id() == entity.id()) {
                let fresh = Uuid::new_v4();
                log::warn!(
                    "{} id {} already in use, assigning {}",
                    T::KIND,
                    entity.id(),
                    fresh
                );
                entity.set_id(fresh);
            }
            let id = entity.id();
            items.push(entity);
            Ok(id)
        })
    }

    /// Replace the stored entity with the same id, keeping its position
    pub fn update(&self, mut entity: T) -> Result<(), RouteError> {
        self.mutate(|items| {
            let slot = items
                .iter_mut()
                .find(|item| item.id() == entity.id())
                .ok_or_else(|| RouteError::not_found(T::KIND, entity.id()))?;
            entity.prepare_update(slot);
            *slot = entity;
            Ok(())
        })
    }

    /// Remove an entity, returning it
    pub fn delete(&self, id: &Uuid) -> Result<T, RouteError> {
        self.mutate(|items| {
            let index = items
                .iter()
                .position(|item| item.id() == *id)
                .ok_or_else(|| RouteError::not_found(T::KIND, *id))?;
            Ok(items.remove(index))
        })
    }

    /// Edit one entity in place through a closure
    pub(crate) fn modify<R>(
        &self,
        id: &Uuid,
        edit: impl FnOnce(&mut T) -> Result<R, RouteError>,
    ) -> Result<R, RouteError> {
        self.mutate(|items| {
            let slot = items
                .iter_mut()
                .find(|item| item.id() == *id)
                .ok_or_else(|| RouteError::not_found(T::KIND, *id))?;
            edit(slot)
        })
    }

    /// Replace the whole collection (import, template sync).
    ///
    /// Every item is canonicalized the way a loaded file is.
    pub fn replace_all(&self, mut items: Vec<T>) -> Result<(), RouteError> {
        items.iter_mut().for_each(T::canonicalize_loaded);
        self.mutate(|current| {
            *current = items;
            Ok(())
        })
    }

    /// Replace memory with what the backend holds.
    ///
    /// On failure memory is left as it was and the error is returned so the
    /// caller can decide whether to try `load_backup`.
    pub fn load_from_persistence(&self) -> Result<usize, RouteError> {
        let _guard = self.write_lock.lock();
        let mut items = self.persistence.load()?;
        items.iter_mut().for_each(T::canonicalize_loaded);
        let count = items.len();
        self.items.store(Arc::new(items));
        crate::debug_info!("STORE", "Loaded {} {}", count, T::COLLECTION);
        Ok(count)
    }

    /// Replace memory with the backend's last-known-good copy
    pub fn load_backup(&self) -> Result<usize, RouteError> {
        let _guard = self.write_lock.lock();
        let mut items = self.persistence.load_backup()?;
        items.iter_mut().for_each(T::canonicalize_loaded);
        let count = items.len();
        self.items.store(Arc::new(items));
        Ok(count)
    }

    /// Write the current snapshot to the backend
    pub fn save_to_persistence(&self) -> Result<(), RouteError> {
        let _guard = self.write_lock.lock();
        self.persistence.save(&self.items.load())?;
        Ok(())
    }
}
