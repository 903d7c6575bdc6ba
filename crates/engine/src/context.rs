//! The engine's single entry point.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::SystemTime;

use save_codec::{CodecRegistry, Surrogate};

use crate::config::EngineConfig;
use crate::dead_data::DeadDataCache;
use crate::entity::{EntityHandle, Persistent};
use crate::error::{RegistryError, Result};
use crate::frame::ScratchBuffer;
use crate::registry::{EntityRegistry, LivenessProbe};
use crate::store::SaveStore;

/// Owns everything a save or load touches: the entity registry, the codec
/// registry, the dead-data cache, the scratch arena and the save directory.
///
/// Contexts are independent of one another. A context is not thread-safe;
/// every call must come from the thread that owns it, one at a time.
pub struct SaveContext {
    pub(crate) config: EngineConfig,
    pub(crate) registry: EntityRegistry,
    pub(crate) codecs: CodecRegistry,
    pub(crate) dead_data: DeadDataCache,
    pub(crate) scratch: ScratchBuffer,
    pub(crate) store: SaveStore,
}

impl SaveContext {
    pub fn new(config: EngineConfig) -> Self {
        let store = SaveStore::new(&config);
        Self {
            config,
            registry: EntityRegistry::new(),
            codecs: CodecRegistry::new(),
            dead_data: DeadDataCache::new(),
            scratch: ScratchBuffer::new(),
            store,
        }
    }

    /// Context rooted at `save_dir` with default settings.
    pub fn in_dir(save_dir: impl AsRef<Path>) -> Self {
        Self::new(EngineConfig::new(save_dir.as_ref()))
    }

    pub fn with_probe(mut self, probe: impl LivenessProbe + 'static) -> Self {
        self.registry.set_probe(probe);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Registers a concrete entity.
    ///
    /// The registry holds a weak reference; dropping every `Rc` to the entity
    /// makes it dead.
    pub fn register<E: Persistent + 'static>(
        &mut self,
        entity: &Rc<RefCell<E>>,
    ) -> std::result::Result<(), RegistryError> {
        let handle: EntityHandle = entity.clone();
        self.registry.register(&handle)
    }

    pub fn register_handle(&mut self, handle: &EntityHandle) -> std::result::Result<(), RegistryError> {
        self.registry.register(handle)
    }

    pub fn unregister(&mut self, handle: &EntityHandle) -> bool {
        self.registry.unregister(handle)
    }

    /// Drops dead entities from the registry, returning how many.
    pub fn prune(&mut self) -> usize {
        self.registry.prune()
    }

    pub fn entity_count(&self) -> usize {
        self.registry.len()
    }

    pub fn identities(&self) -> Vec<String> {
        self.registry.identities()
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Codecs
    // ------------------------------------------------------------------

    /// Registers a surrogate, replacing any existing one for the same type.
    pub fn register_codec<S: Surrogate>(&mut self, surrogate: S) -> bool {
        self.codecs.register(surrogate)
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    pub fn codecs_mut(&mut self) -> &mut CodecRegistry {
        &mut self.codecs
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    pub fn store(&self) -> &SaveStore {
        &self.store
    }

    pub fn exists(&self, name: &str) -> bool {
        self.store.exists(name)
    }

    pub fn delete(&self, name: &str) -> Result<bool> {
        self.store.delete(name)
    }

    pub fn size(&self, name: &str) -> Result<u64> {
        self.store.size(name)
    }

    pub fn modified(&self, name: &str) -> Result<SystemTime> {
        self.store.modified(name)
    }

    pub fn list_saves(&self) -> Result<Vec<String>> {
        self.store.list()
    }

    // ------------------------------------------------------------------
    // Reset
    // ------------------------------------------------------------------

    pub fn dead_data(&self) -> &DeadDataCache {
        &self.dead_data
    }

    pub fn clear_registry(&mut self) {
        self.registry.clear();
    }

    pub fn clear_dead_data(&mut self) {
        self.dead_data.clear();
    }

    /// Forgets all entities, surrogates and cached dead data.
    pub fn clear_all(&mut self) {
        self.registry.clear();
        self.codecs.clear();
        self.dead_data.clear();
    }
}

impl std::fmt::Debug for SaveContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveContext")
            .field("save_dir", &self.store.dir())
            .field("registry", &self.registry)
            .field("codecs", &self.codecs)
            .field("dead_data", &self.dead_data.identities())
            .finish()
    }
}
