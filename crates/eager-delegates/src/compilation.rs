//! In-memory build host
//!
//! `Compilation` owns a module graph and a chunk graph and implements the host
//! contracts over them. It drives a [`CompilationHooks`] implementation through
//! the discovery and chunk optimization checkpoints, in that order.

use std::{cell::RefCell, fmt::Write as _, rc::Rc};

use anyhow::{Result, anyhow};
use indexmap::IndexSet;
use log::{debug, trace};
use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::Dfs,
};
use rustc_hash::{FxHashMap, FxHasher};

use crate::{
    host::{ChunkGraph, ChunkId, DependencyId, ModuleGraph, ModuleId},
    plugin::{CompilationHooks, OptimizeOutcome},
};

/// Type alias for FxHasher-based IndexSet
type FxIndexSet<T> = IndexSet<T, std::hash::BuildHasherDefault<FxHasher>>;

/// Mutable build hints attached to a module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildMeta {
    /// Forced into the chunks it is connected to instead of being split lazily
    pub force_eager: bool,
}

#[derive(Debug)]
struct ModuleRecord {
    resource: Option<String>,
    dependencies: Vec<DependencyId>,
    build_meta: Option<BuildMeta>,
    node: NodeIndex,
}

#[derive(Debug)]
struct DependencyRecord {
    request: String,
    target: Option<ModuleId>,
}

#[derive(Debug)]
struct ChunkRecord {
    name: Option<String>,
    has_runtime: bool,
    debug_id: u32,
}

/// First debug id handed out to chunks, matching what bundlers usually print
const FIRST_CHUNK_DEBUG_ID: u32 = 1000;

#[derive(Debug, Default)]
pub struct Compilation {
    modules: Vec<ModuleRecord>,
    dependencies: Vec<DependencyRecord>,
    chunks: Vec<ChunkRecord>,
    /// Resource path to module, first registration wins
    resources: FxHashMap<String, ModuleId>,
    /// Resolved dependency edges, module to dependency target
    graph: DiGraph<ModuleId, DependencyId>,
    chunk_modules: FxHashMap<ChunkId, FxIndexSet<ModuleId>>,
}

impl Compilation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module. Modules created with `build_meta = false` cannot carry build hints.
    pub fn add_module(&mut self, resource: Option<&str>, build_meta: bool) -> ModuleId {
        let id = ModuleId::new(self.modules.len() as u32);
        let node = self.graph.add_node(id);
        if let Some(resource) = resource {
            self.resources.entry(resource.to_owned()).or_insert(id);
        }
        self.modules.push(ModuleRecord {
            resource: resource.map(str::to_owned),
            dependencies: Vec::new(),
            build_meta: build_meta.then(BuildMeta::default),
            node,
        });
        trace!("Added module {id} ({resource:?})");
        id
    }

    /// Add a dependency edge from `module` for `request`.
    /// The request resolves to the module whose resource equals it, if that module
    /// already exists; otherwise the edge stays unresolved.
    ///
    /// # Panics
    ///
    /// Panics if `module` was not created by this compilation.
    pub fn add_dependency(&mut self, module: ModuleId, request: &str) -> DependencyId {
        let id = DependencyId::new(self.dependencies.len() as u32);
        let target = self.resources.get(request).copied();
        if let Some(target) = target {
            let from = self.modules[module.index()].node;
            let to = self.modules[target.index()].node;
            self.graph.add_edge(from, to, id);
        } else {
            trace!("Dependency {request:?} of {module} is unresolved");
        }
        self.dependencies.push(DependencyRecord {
            request: request.to_owned(),
            target,
        });
        self.modules[module.index()].dependencies.push(id);
        id
    }

    pub fn add_chunk(&mut self, name: Option<&str>, has_runtime: bool) -> ChunkId {
        let id = ChunkId::new(self.chunks.len() as u32);
        self.chunks.push(ChunkRecord {
            name: name.map(str::to_owned),
            has_runtime,
            debug_id: FIRST_CHUNK_DEBUG_ID + id.as_u32(),
        });
        id
    }

    /// All modules in creation order
    pub fn modules(&self) -> Vec<ModuleId> {
        (0..self.modules.len() as u32).map(ModuleId::new).collect()
    }

    /// All chunks in creation order
    pub fn chunks(&self) -> Vec<ChunkId> {
        (0..self.chunks.len() as u32).map(ChunkId::new).collect()
    }

    pub fn module_by_resource(&self, resource: &str) -> Option<ModuleId> {
        self.resources.get(resource).copied()
    }

    pub fn chunk_by_name(&self, name: &str) -> Option<ChunkId> {
        self.chunks
            .iter()
            .position(|chunk| chunk.name.as_deref() == Some(name))
            .map(|index| ChunkId::new(index as u32))
    }

    pub fn dependency_request(&self, dependency: DependencyId) -> &str {
        &self.dependencies[dependency.index()].request
    }

    /// Modules of a chunk in connection order
    pub fn chunk_modules(&self, chunk: ChunkId) -> Vec<ModuleId> {
        self.chunk_modules
            .get(&chunk)
            .map(|modules| modules.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_eager(&self, module: ModuleId) -> bool {
        self.modules
            .get(module.index())
            .and_then(|record| record.build_meta)
            .is_some_and(|meta| meta.force_eager)
    }

    /// `module` and every module reachable from it over resolved dependencies, sorted by id.
    /// Empty for a module this compilation does not know.
    pub fn reachable_from(&self, module: ModuleId) -> Vec<ModuleId> {
        let mut reachable = Vec::new();
        let Some(record) = self.modules.get(module.index()) else {
            return reachable;
        };
        let mut dfs = Dfs::new(&self.graph, record.node);
        while let Some(node) = dfs.next(&self.graph) {
            reachable.push(self.graph[node]);
        }
        reachable.sort_unstable();
        reachable
    }

    /// Drive `hooks` through both checkpoints of this build
    pub fn run<P: CompilationHooks<Self>>(&mut self, hooks: &mut P) -> Result<OptimizeOutcome> {
        let modules = self.modules();
        let completion: Rc<RefCell<Option<Result<()>>>> = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&completion);
        hooks.on_modules_discovered(
            self,
            &modules,
            Box::new(move |result| {
                *slot.borrow_mut() = Some(result);
            }),
        );
        let discovered = completion
            .borrow_mut()
            .take()
            .ok_or_else(|| anyhow!("Module discovery never signalled completion"))?;
        discovered?;
        debug!("Discovery finished for {} module(s)", modules.len());

        let chunks = self.chunks();
        let outcome = hooks.on_chunks_optimized(self, &chunks);
        debug!("Chunk optimization finished: {outcome:?}");
        Ok(outcome)
    }

    /// Human readable chunk membership, one chunk per block in creation order
    pub fn placement_report(&self) -> String {
        let mut report = String::new();
        for chunk in self.chunks() {
            let record = &self.chunks[chunk.index()];
            let _ = match &record.name {
                Some(name) => write!(report, "{name}"),
                None => write!(report, "<unnamed {chunk}>"),
            };
            if record.has_runtime {
                report.push_str(" [runtime]");
            }
            report.push('\n');

            let modules = self.chunk_modules(chunk);
            if modules.is_empty() {
                report.push_str("  (empty)\n");
            }
            for module in modules {
                let _ = match self.module_identity(module) {
                    Some(resource) => write!(report, "  {resource}"),
                    None => write!(report, "  <unnamed {module}>"),
                };
                if self.is_eager(module) {
                    report.push_str(" (eager)");
                }
                report.push('\n');
            }
        }
        report
    }
}

impl ModuleGraph for Compilation {
    fn module_identity(&self, module: ModuleId) -> Option<&str> {
        self.modules.get(module.index())?.resource.as_deref()
    }

    fn module_dependencies(&self, module: ModuleId) -> Vec<DependencyId> {
        self.modules
            .get(module.index())
            .map(|record| record.dependencies.clone())
            .unwrap_or_default()
    }

    fn resolve_dependency(&self, dependency: DependencyId) -> Option<ModuleId> {
        self.dependencies.get(dependency.index())?.target
    }

    fn mark_eager(&mut self, module: ModuleId) -> bool {
        match self
            .modules
            .get_mut(module.index())
            .and_then(|record| record.build_meta.as_mut())
        {
            Some(meta) => {
                meta.force_eager = true;
                true
            }
            None => false,
        }
    }
}

impl ChunkGraph for Compilation {
    fn chunk_name(&self, chunk: ChunkId) -> Option<&str> {
        self.chunks.get(chunk.index())?.name.as_deref()
    }

    fn chunk_has_runtime(&self, chunk: ChunkId) -> bool {
        self.chunks
            .get(chunk.index())
            .is_some_and(|record| record.has_runtime)
    }

    fn chunk_debug_id(&self, chunk: ChunkId) -> u32 {
        self.chunks
            .get(chunk.index())
            .map_or(0, |record| record.debug_id)
    }

    fn is_module_in_chunk(&self, module: ModuleId, chunk: ChunkId) -> bool {
        self.chunk_modules
            .get(&chunk)
            .is_some_and(|modules| modules.contains(&module))
    }

    fn connect_chunk_and_module(&mut self, chunk: ChunkId, module: ModuleId) {
        self.chunk_modules.entry(chunk).or_default().insert(module);
    }

    fn disconnect_chunk_and_module(&mut self, chunk: ChunkId, module: ModuleId) {
        if let Some(modules) = self.chunk_modules.get_mut(&chunk) {
            modules.shift_remove(&module);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_dependencies_resolve_by_resource() {
        let mut compilation = Compilation::new();
        let a = compilation.add_module(Some("a.js"), true);
        let b = compilation.add_module(Some("b.js"), true);
        let to_b = compilation.add_dependency(a, "b.js");
        let external = compilation.add_dependency(a, "react");

        assert_eq!(compilation.module_dependencies(a), vec![to_b, external]);
        assert_eq!(compilation.resolve_dependency(to_b), Some(b));
        assert_eq!(compilation.resolve_dependency(external), None);
        assert_eq!(compilation.dependency_request(external), "react");
    }

    #[test]
    fn test_reachable_from_follows_resolved_edges() {
        let mut compilation = Compilation::new();
        let a = compilation.add_module(Some("a.js"), true);
        let b = compilation.add_module(Some("b.js"), true);
        let c = compilation.add_module(Some("c.js"), true);
        let lonely = compilation.add_module(Some("lonely.js"), true);
        compilation.add_dependency(a, "b.js");
        compilation.add_dependency(b, "c.js");
        compilation.add_dependency(c, "a.js");

        assert_eq!(compilation.reachable_from(b), vec![a, b, c]);
        assert_eq!(compilation.reachable_from(lonely), vec![lonely]);
    }

    #[test]
    fn test_mark_eager_requires_build_meta() {
        let mut compilation = Compilation::new();
        let with_meta = compilation.add_module(Some("a.js"), true);
        let without_meta = compilation.add_module(Some("b.js"), false);

        assert!(compilation.mark_eager(with_meta));
        assert!(!compilation.mark_eager(without_meta));
        assert!(compilation.is_eager(with_meta));
        assert!(!compilation.is_eager(without_meta));
    }

    #[test]
    fn test_unknown_module_queries_are_empty() {
        let mut compilation = Compilation::new();
        compilation.add_module(Some("a.js"), true);
        let foreign = ModuleId::new(7);

        assert!(!compilation.is_eager(foreign));
        assert!(compilation.reachable_from(foreign).is_empty());
        assert_eq!(compilation.module_identity(foreign), None);
        assert!(compilation.module_dependencies(foreign).is_empty());
        assert!(!compilation.mark_eager(foreign));
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn test_dependency_from_unknown_module_panics() {
        let mut compilation = Compilation::new();
        compilation.add_module(Some("a.js"), true);
        compilation.add_dependency(ModuleId::new(3), "a.js");
    }

    #[test]
    fn test_chunk_membership() {
        let mut compilation = Compilation::new();
        let a = compilation.add_module(Some("a.js"), true);
        let b = compilation.add_module(None, true);
        let chunk = compilation.add_chunk(None, false);

        compilation.connect_chunk_and_module(chunk, b);
        compilation.connect_chunk_and_module(chunk, a);
        compilation.connect_chunk_and_module(chunk, b);
        assert_eq!(compilation.chunk_modules(chunk), vec![b, a]);

        compilation.disconnect_chunk_and_module(chunk, b);
        compilation.disconnect_chunk_and_module(chunk, b);
        assert_eq!(compilation.chunk_modules(chunk), vec![a]);
        assert_eq!(compilation.chunk_debug_id(chunk), FIRST_CHUNK_DEBUG_ID);
    }

    #[test]
    fn test_run_reports_missing_completion() {
        struct Forgetful;

        impl CompilationHooks<Compilation> for Forgetful {
            fn on_modules_discovered(
                &mut self,
                _host: &Compilation,
                _modules: &[ModuleId],
                _done: crate::plugin::DiscoveryDone,
            ) {
            }

            fn on_chunks_optimized(
                &mut self,
                _host: &mut Compilation,
                _chunks: &[ChunkId],
            ) -> OptimizeOutcome {
                unreachable!("optimization must not run before discovery completes")
            }
        }

        let mut compilation = Compilation::new();
        let err = compilation
            .run(&mut Forgetful)
            .expect_err("missing completion should fail the build");
        assert!(err.to_string().contains("never signalled completion"));
    }
}
