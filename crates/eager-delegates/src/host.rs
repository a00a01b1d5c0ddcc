//! Contracts of the host build pipeline
//!
//! The placement logic never owns the module graph or the chunk graph. It reads
//! and mutates them through these traits so that the host keeps its own indices
//! consistent. Identifiers are plain copyable handles into host-owned storage.

use std::fmt;

/// Unique identifier for a module in the host's module graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u32);

impl ModuleId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Unique identifier for an outgoing dependency edge of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyId(u32);

impl DependencyId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier for a chunk (output partition)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(u32);

impl ChunkId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Read access to modules and their dependency edges, plus the one build hint
/// the placement logic is allowed to set.
pub trait ModuleGraph {
    /// Stable identity of a module (its resource path), if it has one
    fn module_identity(&self, module: ModuleId) -> Option<&str>;

    /// Outgoing dependency edges of a module, in declaration order
    fn module_dependencies(&self, module: ModuleId) -> Vec<DependencyId>;

    /// Resolve a dependency edge to its target module.
    /// Returns `None` for external or unresolved references.
    fn resolve_dependency(&self, dependency: DependencyId) -> Option<ModuleId>;

    /// Set the `force_eager` build hint on a module.
    /// Returns `false` without doing anything when the module carries no build metadata.
    fn mark_eager(&mut self, module: ModuleId) -> bool;
}

/// Membership queries and mutations on the host's chunk graph
pub trait ChunkGraph {
    fn chunk_name(&self, chunk: ChunkId) -> Option<&str>;

    /// Whether the chunk contains the bootstrap that starts the module runtime
    fn chunk_has_runtime(&self, chunk: ChunkId) -> bool;

    /// Host-assigned debug identifier, only used in diagnostics
    fn chunk_debug_id(&self, chunk: ChunkId) -> u32;

    fn is_module_in_chunk(&self, module: ModuleId, chunk: ChunkId) -> bool;

    fn connect_chunk_and_module(&mut self, chunk: ChunkId, module: ModuleId);

    /// Disconnecting a module that is not in the chunk is a no-op
    fn disconnect_chunk_and_module(&mut self, chunk: ChunkId, module: ModuleId);
}

/// Everything the placement logic needs from a host build
pub trait BuildHost: ModuleGraph + ChunkGraph {}

impl<T: ModuleGraph + ChunkGraph + ?Sized> BuildHost for T {}
