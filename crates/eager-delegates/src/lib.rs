//! Placement of delegate modules in bundler chunks
//!
//! Delegate modules named by the build's remotes must be present, together with
//! their full dependency closure, in the chunk that boots the module runtime
//! (and optionally in a container chunk), and must not be duplicated into
//! chunks that never boot it. The host build pipeline owns the module and chunk
//! graphs; this crate only rewires memberships through the [`host`] traits.

pub mod chunk_selector;
pub mod compilation;
pub mod config;
pub mod delegates;
pub mod host;
pub mod manifest;
pub mod plugin;
pub mod propagation;
pub mod pruning;

pub use compilation::Compilation;
pub use config::DelegateOptions;
pub use delegates::DelegateRegistry;
pub use host::{BuildHost, ChunkGraph, ChunkId, DependencyId, ModuleGraph, ModuleId};
pub use manifest::BuildManifest;
pub use plugin::{CompilationHooks, DelegateModulesPlugin, OptimizeOutcome, SkipReason};
