//! Registry of delegate modules discovered in the current build

use indexmap::IndexMap;
use log::trace;
use rustc_hash::{FxHashSet, FxHasher};

use crate::host::{ModuleGraph, ModuleId};

/// Type alias for FxHasher-based IndexMap
type FxIndexMap<K, V> = IndexMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// Delegate modules keyed by identity, in first-registration order
#[derive(Debug, Clone, Default)]
pub struct DelegateRegistry {
    modules: FxIndexMap<String, ModuleId>,
}

impl DelegateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every candidate whose identity is one of `known_names`.
    /// A module registered again under the same identity replaces the previous one.
    pub fn register<G: ModuleGraph + ?Sized>(
        &mut self,
        graph: &G,
        candidates: &[ModuleId],
        known_names: &FxHashSet<String>,
    ) {
        for &module in candidates {
            let Some(identity) = graph.module_identity(module) else {
                continue;
            };
            if known_names.contains(identity) {
                trace!("Registering delegate module {identity} ({module})");
                self.modules.insert(identity.to_owned(), module);
            }
        }
    }

    pub fn get(&self, identity: &str) -> Option<ModuleId> {
        self.modules.get(identity).copied()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.modules.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Registered modules in registration order
    pub fn modules(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.modules.values().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ModuleId)> + '_ {
        self.modules
            .iter()
            .map(|(identity, module)| (identity.as_str(), *module))
    }
}
