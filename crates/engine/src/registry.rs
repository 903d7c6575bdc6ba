//! Ordered registry of live entities keyed by identity.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::entity::{
    EntityFailure, EntityHandle, Persistent, WeakHandle, handle_addr, read_identity, weak_addr,
};
use crate::error::RegistryError;

/// Host-specific check that a registered entity is still valid.
///
/// The registry already treats a handle whose last strong reference was
/// dropped as dead; a probe adds liveness rules the host knows about, such as
/// an entity flagged as destroyed but still referenced. A probe that panics
/// marks the entity dead. Entities that are borrowed at the time of the check
/// are not probed.
pub trait LivenessProbe {
    fn is_alive(&self, entity: &dyn Persistent) -> bool;
}

impl<F> LivenessProbe for F
where
    F: Fn(&dyn Persistent) -> bool,
{
    fn is_alive(&self, entity: &dyn Persistent) -> bool {
        self(entity)
    }
}

struct RegistryEntry {
    identity: String,
    handle: WeakHandle,
    /// Position in `entries`; rewritten whenever the registry is compacted.
    index: usize,
}

/// Registered entities in insertion order, which is also save order.
///
/// Identities are unique. The first entity registered under an identity
/// keeps it; later registrants with the same identity are rejected.
#[derive(Default)]
pub struct EntityRegistry {
    entries: Vec<RegistryEntry>,
    by_identity: HashMap<String, usize>,
    probe: Option<Box<dyn LivenessProbe>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the host liveness probe used by [`prune`](Self::prune) and
    /// save-time validation.
    pub fn set_probe(&mut self, probe: impl LivenessProbe + 'static) {
        self.probe = Some(Box::new(probe));
    }

    pub fn register(&mut self, handle: &EntityHandle) -> Result<(), RegistryError> {
        let result = self.try_register(handle);
        if let Err(error) = &result {
            warn!(
                target: "save_engine::registry",
                error = %error,
                "Entity registration rejected"
            );
        }
        result
    }

    fn try_register(&mut self, handle: &EntityHandle) -> Result<(), RegistryError> {
        if let Some(entry) = self.find_by_handle(handle) {
            return Err(RegistryError::AlreadyRegistered {
                identity: entry.identity.clone(),
            });
        }

        let identity = read_identity(handle).map_err(RegistryError::IdentityUnavailable)?;
        if identity.is_empty() {
            return Err(RegistryError::EmptyIdentity);
        }
        if let Some(&index) = self.by_identity.get(&identity) {
            if self.entries[index].handle.strong_count() > 0 {
                return Err(RegistryError::IdentityTaken { identity });
            }
            // The previous holder was dropped without being unregistered.
            self.entries.remove(index);
            self.rebuild_index();
        }

        let index = self.entries.len();
        self.by_identity.insert(identity.clone(), index);
        self.entries.push(RegistryEntry {
            identity: identity.clone(),
            handle: Rc::downgrade(handle),
            index,
        });

        debug!(
            target: "save_engine::registry",
            identity = %identity,
            index,
            "Registered entity"
        );
        Ok(())
    }

    /// Removes `handle` if registered, returning whether it was.
    pub fn unregister(&mut self, handle: &EntityHandle) -> bool {
        let addr = handle_addr(handle);
        let before = self.entries.len();
        self.entries.retain(|entry| weak_addr(&entry.handle) != addr);
        let removed = self.entries.len() != before;
        if removed {
            self.rebuild_index();
        }
        removed
    }

    /// Removes every entry that is no longer alive, returning how many.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        let mut kept = Vec::with_capacity(before);
        for entry in std::mem::take(&mut self.entries) {
            if self.alive(&entry).is_some() {
                kept.push(entry);
            } else {
                debug!(
                    target: "save_engine::registry",
                    identity = %entry.identity,
                    "Pruned dead entity"
                );
            }
        }
        self.entries = kept;
        self.rebuild_index();
        before - self.entries.len()
    }

    /// Drops dead entries and entries whose identity cannot be read, then
    /// returns the survivors in registry order.
    pub(crate) fn validate(&mut self) -> Vec<(String, EntityHandle)> {
        let before = self.entries.len();
        let mut kept = Vec::with_capacity(before);
        let mut live = Vec::with_capacity(before);

        for entry in std::mem::take(&mut self.entries) {
            let Some(handle) = self.alive(&entry) else {
                warn!(
                    target: "save_engine::registry",
                    identity = %entry.identity,
                    "Dropping dead entity"
                );
                continue;
            };
            match read_identity(&handle) {
                // A borrowed entity stays registered; the save reports it.
                Ok(_) | Err(EntityFailure::Busy) => {}
                Err(failure) => {
                    warn!(
                        target: "save_engine::registry",
                        identity = %entry.identity,
                        error = %failure,
                        "Dropping entity whose identity cannot be read"
                    );
                    continue;
                }
            }
            live.push((entry.identity.clone(), handle));
            kept.push(entry);
        }

        self.entries = kept;
        if self.entries.len() != before {
            self.rebuild_index();
        }
        live
    }

    /// Live entries in registry order, without modifying the registry.
    pub(crate) fn live_entries(&self) -> Vec<(String, EntityHandle)> {
        self.entries
            .iter()
            .filter_map(|entry| Some((entry.identity.clone(), self.alive(entry)?)))
            .collect()
    }

    /// The live entity registered under `identity`.
    pub fn get(&self, identity: &str) -> Option<EntityHandle> {
        let index = *self.by_identity.get(identity)?;
        self.alive(&self.entries[index])
    }

    pub fn contains(&self, handle: &EntityHandle) -> bool {
        self.find_by_handle(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identities of registered entities in order, skipping any whose
    /// identity cannot currently be read.
    pub fn identities(&self) -> Vec<String> {
        let mut identities = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let identity = entry
                .handle
                .upgrade()
                .ok_or(None)
                .and_then(|handle| read_identity(&handle).map_err(Some));
            match identity {
                Ok(identity) => identities.push(identity),
                Err(failure) => warn!(
                    target: "save_engine::registry",
                    identity = %entry.identity,
                    error = ?failure,
                    "Skipping entity with unavailable identity"
                ),
            }
        }
        identities
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_identity.clear();
    }

    fn find_by_handle(&self, handle: &EntityHandle) -> Option<&RegistryEntry> {
        let addr = handle_addr(handle);
        self.entries
            .iter()
            .find(|entry| weak_addr(&entry.handle) == addr)
    }

    fn alive(&self, entry: &RegistryEntry) -> Option<EntityHandle> {
        let handle = entry.handle.upgrade()?;
        let Some(probe) = &self.probe else {
            return Some(handle);
        };

        let alive = match handle.try_borrow() {
            Ok(entity) => panic::catch_unwind(AssertUnwindSafe(|| probe.is_alive(&*entity)))
                .unwrap_or_else(|_| {
                    warn!(
                        target: "save_engine::registry",
                        identity = %entry.identity,
                        "Liveness probe panicked, treating entity as dead"
                    );
                    false
                }),
            Err(_) => true,
        };

        alive.then_some(handle)
    }

    fn rebuild_index(&mut self) {
        self.by_identity.clear();
        for (index, entry) in self.entries.iter_mut().enumerate() {
            entry.index = index;
            self.by_identity.insert(entry.identity.clone(), index);
        }
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field(
                "entries",
                &self
                    .entries
                    .iter()
                    .map(|e| (e.index, e.identity.as_str()))
                    .collect::<Vec<_>>(),
            )
            .field("probe", &self.probe.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;

    use save_codec::{ByteReader, ByteWriter, CodecRegistry};

    use super::*;
    use crate::entity::EntityError;

    struct Named {
        id: String,
    }

    impl Named {
        fn handle(id: &str) -> EntityHandle {
            Rc::new(RefCell::new(Named { id: id.to_string() }))
        }
    }

    impl Persistent for Named {
        fn identity(&self) -> &str {
            &self.id
        }

        fn serialize(&self, _: &mut ByteWriter<'_>, _: &CodecRegistry) -> Result<(), EntityError> {
            Ok(())
        }

        fn restore(
            &mut self,
            _: Option<&mut ByteReader<'_>>,
            _: &CodecRegistry,
        ) -> Result<(), EntityError> {
            Ok(())
        }
    }

    #[test]
    fn keeps_insertion_order() {
        let mut registry = EntityRegistry::new();
        let handles: Vec<_> = ["c", "a", "b"].into_iter().map(Named::handle).collect();
        for handle in &handles {
            registry.register(handle).unwrap();
        }
        assert_eq!(registry.identities(), vec!["c", "a", "b"]);
    }

    #[test]
    fn rejects_double_registration_and_identity_collisions() {
        let mut registry = EntityRegistry::new();
        let first = Named::handle("A");
        let second = Named::handle("A");

        registry.register(&first).unwrap();
        assert!(matches!(
            registry.register(&first),
            Err(RegistryError::AlreadyRegistered { .. })
        ));
        assert!(matches!(
            registry.register(&second),
            Err(RegistryError::IdentityTaken { .. })
        ));
        assert_eq!(registry.len(), 1);
        assert!(Rc::ptr_eq(&registry.get("A").unwrap(), &first));
    }

    #[test]
    fn identity_is_reusable_once_holder_is_gone() {
        let mut registry = EntityRegistry::new();
        let first = Named::handle("A");
        registry.register(&first).unwrap();
        drop(first);

        let second = Named::handle("A");
        registry.register(&second).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(Rc::ptr_eq(&registry.get("A").unwrap(), &second));

        assert!(registry.unregister(&second));
        let third = Named::handle("A");
        registry.register(&third).unwrap();
        assert_eq!(registry.identities(), vec!["A"]);
    }

    #[test]
    fn rejects_empty_identity() {
        let mut registry = EntityRegistry::new();
        assert!(matches!(
            registry.register(&Named::handle("")),
            Err(RegistryError::EmptyIdentity)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn unregister_compacts_and_reindexes() {
        let mut registry = EntityRegistry::new();
        let a = Named::handle("a");
        let b = Named::handle("b");
        let c = Named::handle("c");
        for handle in [&a, &b, &c] {
            registry.register(handle).unwrap();
        }

        assert!(registry.unregister(&b));
        assert!(!registry.unregister(&b));
        assert_eq!(registry.identities(), vec!["a", "c"]);
        assert!(Rc::ptr_eq(&registry.get("c").unwrap(), &c));
        assert!(registry.get("b").is_none());
    }

    #[test]
    fn prune_removes_dropped_and_probe_rejected_entities() {
        let mut registry = EntityRegistry::new();
        let kept = Named::handle("kept");
        let dropped = Named::handle("dropped");
        let destroyed = Named::handle("destroyed");
        let graveyard = Rc::new(RefCell::new(HashSet::<String>::new()));

        registry.register(&kept).unwrap();
        registry.register(&dropped).unwrap();
        registry.register(&destroyed).unwrap();
        let probe_view = Rc::clone(&graveyard);
        registry.set_probe(move |entity: &dyn Persistent| {
            !probe_view.borrow().contains(entity.identity())
        });

        assert_eq!(registry.prune(), 0);
        drop(dropped);
        graveyard.borrow_mut().insert("destroyed".to_string());

        assert_eq!(registry.prune(), 2);
        assert_eq!(registry.identities(), vec!["kept"]);
    }

    #[test]
    fn panicking_probe_counts_as_dead() {
        let mut registry = EntityRegistry::new();
        let a = Named::handle("a");
        registry.register(&a).unwrap();
        registry.set_probe(|_: &dyn Persistent| -> bool { panic!("probe failure") });

        assert_eq!(registry.prune(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn identities_skip_dropped_entities() {
        let mut registry = EntityRegistry::new();
        let a = Named::handle("a");
        let b = Named::handle("b");
        registry.register(&a).unwrap();
        registry.register(&b).unwrap();
        drop(a);

        assert_eq!(registry.identities(), vec!["b"]);
        assert_eq!(registry.len(), 2);
    }
}
