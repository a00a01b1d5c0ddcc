//! Delegate modules plugin
//!
//! Hooks into two checkpoints of a host build:
//! 1. Modules discovered: remember which modules are delegates.
//! 2. Chunks optimized: attach the delegate closures to the runtime chunk (and
//!    the container chunk when configured), then remove the delegates from
//!    every chunk that has no runtime bootstrap.
//!
//! One plugin instance serves one build.

use anyhow::Result;
use log::debug;

use crate::{
    chunk_selector::find_chunk_by_name,
    config::DelegateOptions,
    delegates::DelegateRegistry,
    host::{BuildHost, ChunkId, ModuleId},
    propagation::attach_all_delegates_to,
    pruning::prune_non_runtime,
};

/// Continuation the host passes to the discovery checkpoint.
/// Must be invoked exactly once or the host build stalls.
pub type DiscoveryDone = Box<dyn FnOnce(Result<()>)>;

/// Two-phase hook interface a host build drives
pub trait CompilationHooks<H: BuildHost + ?Sized> {
    fn on_modules_discovered(&mut self, host: &H, modules: &[ModuleId], done: DiscoveryDone);

    fn on_chunks_optimized(&mut self, host: &mut H, chunks: &[ChunkId]) -> OptimizeOutcome;
}

/// Why the optimization checkpoint did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No chunk carries the configured runtime name (or no name is configured)
    RuntimeChunkMissing,
    /// The runtime chunk exists but has no runtime bootstrap
    RuntimeChunkWithoutRuntime,
}

/// Summary of the optimization checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizeOutcome {
    Skipped(SkipReason),
    Applied {
        /// Chunks the delegate closures were attached to
        targets: usize,
        /// New chunk/module connections
        attached: usize,
        /// Delegate connections removed from non-runtime chunks
        pruned: usize,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DelegateModulesPlugin {
    options: DelegateOptions,
    registry: DelegateRegistry,
}

impl DelegateModulesPlugin {
    pub fn new(options: DelegateOptions) -> Self {
        Self {
            options,
            registry: DelegateRegistry::new(),
        }
    }

    pub fn registry(&self) -> &DelegateRegistry {
        &self.registry
    }

    /// Synchronous body of the discovery checkpoint
    pub fn register_delegates<H: BuildHost + ?Sized>(&mut self, host: &H, modules: &[ModuleId]) {
        let known = self.options.known_delegates();
        self.registry.register(host, modules, &known);
        debug!(
            "Registered {} delegate module(s) out of {} known name(s)",
            self.registry.len(),
            known.len()
        );
    }

    /// Body of the optimization checkpoint
    pub fn optimize_chunks<H: BuildHost + ?Sized>(
        &self,
        host: &mut H,
        chunks: &[ChunkId],
    ) -> OptimizeOutcome {
        let runtime = self.options.runtime.as_deref();
        let Some(runtime_chunk) = find_chunk_by_name(host, chunks, runtime) else {
            debug!("No runtime chunk named {runtime:?}, skipping delegate placement");
            return OptimizeOutcome::Skipped(SkipReason::RuntimeChunkMissing);
        };
        if !host.chunk_has_runtime(runtime_chunk) {
            debug!("Chunk {runtime_chunk} has no runtime bootstrap, skipping delegate placement");
            return OptimizeOutcome::Skipped(SkipReason::RuntimeChunkWithoutRuntime);
        }
        let container_chunk = find_chunk_by_name(host, chunks, self.options.container.as_deref());

        if self.options.debug {
            debug!(
                "Placing {} delegate(s): container {}, runtime {}",
                self.registry.len(),
                container_chunk
                    .and_then(|chunk| host.chunk_name(chunk))
                    .unwrap_or("<no container>"),
                host.chunk_name(runtime_chunk).unwrap_or_default()
            );
        }

        let targets: Vec<ChunkId> = [container_chunk, Some(runtime_chunk)]
            .into_iter()
            .flatten()
            .collect();
        let attached =
            attach_all_delegates_to(host, &self.registry, &targets, self.options.debug);
        let pruned = prune_non_runtime(host, &self.registry, chunks, self.options.debug);

        debug!(
            "Delegate placement: {attached} connection(s) added across {} chunk(s), {pruned} \
             removed",
            targets.len()
        );
        OptimizeOutcome::Applied {
            targets: targets.len(),
            attached,
            pruned,
        }
    }
}

impl<H: BuildHost + ?Sized> CompilationHooks<H> for DelegateModulesPlugin {
    fn on_modules_discovered(&mut self, host: &H, modules: &[ModuleId], done: DiscoveryDone) {
        self.register_delegates(host, modules);
        done(Ok(()));
    }

    fn on_chunks_optimized(&mut self, host: &mut H, chunks: &[ChunkId]) -> OptimizeOutcome {
        self.optimize_chunks(host, chunks)
    }
}
