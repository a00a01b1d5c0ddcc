//! Removal of delegate modules from chunks that never start the runtime

use log::debug;

use crate::{
    delegates::DelegateRegistry,
    host::{ChunkGraph, ChunkId},
};

/// Disconnect every registered delegate from each chunk in `chunks` that has no
/// runtime bootstrap. Only the delegates themselves are removed, not their
/// dependencies. Returns the number of connections removed.
pub fn prune_non_runtime<G: ChunkGraph + ?Sized>(
    graph: &mut G,
    registry: &DelegateRegistry,
    chunks: &[ChunkId],
    debug: bool,
) -> usize {
    let mut pruned = 0;
    for &chunk in chunks {
        if graph.chunk_has_runtime(chunk) {
            continue;
        }
        if debug {
            debug!(
                "non-runtime chunk: {} {} {}",
                graph.chunk_debug_id(chunk),
                chunk,
                graph.chunk_name(chunk).unwrap_or("<unnamed chunk>")
            );
        }
        for module in registry.modules() {
            if graph.is_module_in_chunk(module, chunk) {
                graph.disconnect_chunk_and_module(chunk, module);
                pruned += 1;
            }
        }
    }
    pruned
}
