//! TOML description of a build
//!
//! ```toml
//! [options]
//! runtime = "runtime"
//! container = "remoteEntry"
//! remotes = { shop = "internal ./src/shop.js" }
//!
//! [[modules]]
//! resource = "./src/shop.js"
//! dependencies = ["./src/api.js", "react"]
//!
//! [[chunks]]
//! name = "runtime"
//! runtime = true
//! modules = []
//! ```
//!
//! Dependency requests resolve to the module with the same resource; any other
//! request is an unresolved (external) edge.

use std::path::Path;

use anyhow::{Context, Result, bail};
use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::{
    compilation::Compilation,
    config::DelegateOptions,
    host::ChunkGraph,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildManifest {
    #[serde(default)]
    pub options: DelegateOptions,
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
    #[serde(default)]
    pub chunks: Vec<ChunkSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleSpec {
    pub resource: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Whether the module accepts build hints
    #[serde(default = "default_build_meta")]
    pub build_meta: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChunkSpec {
    pub name: Option<String>,
    #[serde(default)]
    pub runtime: bool,
    /// Resources initially placed in the chunk
    #[serde(default)]
    pub modules: Vec<String>,
}

const fn default_build_meta() -> bool {
    true
}

impl BuildManifest {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).context("Failed to parse build manifest")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read build manifest {}", path.display()))?;
        Self::from_toml_str(&source)
            .with_context(|| format!("Invalid build manifest {}", path.display()))
    }

    /// Materialize the described build
    pub fn to_compilation(&self) -> Result<Compilation> {
        let mut compilation = Compilation::new();

        let mut seen = FxHashSet::default();
        let mut modules = Vec::with_capacity(self.modules.len());
        for spec in &self.modules {
            if let Some(resource) = &spec.resource
                && !seen.insert(resource.as_str())
            {
                bail!("Module {resource:?} is declared more than once");
            }
            modules.push(compilation.add_module(spec.resource.as_deref(), spec.build_meta));
        }
        // All modules exist before any request is resolved
        for (spec, &module) in self.modules.iter().zip(&modules) {
            for request in &spec.dependencies {
                compilation.add_dependency(module, request);
            }
        }

        let mut seen = FxHashSet::default();
        for spec in &self.chunks {
            if let Some(name) = &spec.name
                && !seen.insert(name.as_str())
            {
                bail!("Chunk {name:?} is declared more than once");
            }
            let chunk = compilation.add_chunk(spec.name.as_deref(), spec.runtime);
            for resource in &spec.modules {
                let Some(module) = compilation.module_by_resource(resource) else {
                    bail!(
                        "Chunk {:?} lists unknown module {resource:?}",
                        spec.name.as_deref().unwrap_or("<unnamed>")
                    );
                };
                compilation.connect_chunk_and_module(chunk, module);
            }
        }

        Ok(compilation)
    }
}
