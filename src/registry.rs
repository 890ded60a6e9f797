//! Process-wide security-model registry.
//!
//! Active USM instances are tracked in a shared namespace so that message
//! dispatch can resolve the model for an incoming engine ID. The registry is
//! an explicit, injectable value rather than a hard-wired singleton: tests
//! and embedders can run each receiver against a fresh registry, while
//! [`SecurityModelRegistry::global`] provides the conventional process-wide
//! instance.
//!
//! Entries are keyed by the engine-generated [`EngineId`], so two receivers
//! running in one process never collide or unregister each other's models.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use crate::v3::{EngineId, Usm};

static GLOBAL: LazyLock<Arc<SecurityModelRegistry>> =
    LazyLock::new(|| Arc::new(SecurityModelRegistry::new()));

/// Registry of active USM instances, keyed by local engine ID.
///
/// All mutation happens under an internal mutex; the registry is safe to
/// share across receiver instances and the engine's dispatch tasks.
#[derive(Default)]
pub struct SecurityModelRegistry {
    models: Mutex<HashMap<EngineId, Arc<Usm>>>,
}

impl SecurityModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default registry.
    pub fn global() -> Arc<Self> {
        GLOBAL.clone()
    }

    /// Register a security model under its engine ID.
    ///
    /// Returns `false` if a model with the same engine ID was already
    /// present (the existing entry is left untouched). Engine IDs carry
    /// random tails, so a collision means the same instance was registered
    /// twice.
    pub fn register(&self, model: Arc<Usm>) -> bool {
        let mut models = self.models.lock().unwrap();
        match models.entry(model.engine_id().clone()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(model);
                true
            }
        }
    }

    /// Remove the model registered under `engine_id`, if any.
    pub fn unregister(&self, engine_id: &EngineId) -> Option<Arc<Usm>> {
        self.models.lock().unwrap().remove(engine_id)
    }

    /// Look up the model registered under `engine_id`.
    pub fn get(&self, engine_id: &EngineId) -> Option<Arc<Usm>> {
        self.models.lock().unwrap().get(engine_id).cloned()
    }

    /// Whether a model is registered under `engine_id`.
    pub fn contains(&self, engine_id: &EngineId) -> bool {
        self.models.lock().unwrap().contains_key(engine_id)
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.lock().unwrap().len()
    }

    /// Whether the registry holds no models.
    pub fn is_empty(&self) -> bool {
        self.models.lock().unwrap().is_empty()
    }
}

impl std::fmt::Debug for SecurityModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityModelRegistry")
            .field("models", &self.len())
            .finish()
    }
}
