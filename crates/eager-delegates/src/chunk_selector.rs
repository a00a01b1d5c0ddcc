//! Lookup of chunks by name

use crate::host::{ChunkGraph, ChunkId};

/// First chunk in `chunks` whose name equals `name`.
/// An unset name never matches, not even an unnamed chunk.
pub fn find_chunk_by_name<G: ChunkGraph + ?Sized>(
    graph: &G,
    chunks: &[ChunkId],
    name: Option<&str>,
) -> Option<ChunkId> {
    let name = name?;
    chunks
        .iter()
        .copied()
        .find(|&chunk| graph.chunk_name(chunk) == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ModuleId;

    struct Names(Vec<Option<&'static str>>);

    impl ChunkGraph for Names {
        fn chunk_name(&self, chunk: ChunkId) -> Option<&str> {
            self.0[chunk.index()]
        }

        fn chunk_has_runtime(&self, _chunk: ChunkId) -> bool {
            false
        }

        fn chunk_debug_id(&self, chunk: ChunkId) -> u32 {
            chunk.as_u32()
        }

        fn is_module_in_chunk(&self, _module: ModuleId, _chunk: ChunkId) -> bool {
            false
        }

        fn connect_chunk_and_module(&mut self, _chunk: ChunkId, _module: ModuleId) {}

        fn disconnect_chunk_and_module(&mut self, _chunk: ChunkId, _module: ModuleId) {}
    }

    #[test]
    fn test_first_match_wins() {
        let graph = Names(vec![Some("main"), None, Some("runtime"), Some("runtime")]);
        let chunks: Vec<_> = (0..4).map(ChunkId::new).collect();

        assert_eq!(
            find_chunk_by_name(&graph, &chunks, Some("runtime")),
            Some(ChunkId::new(2))
        );
        assert_eq!(
            find_chunk_by_name(&graph, &chunks, Some("main")),
            Some(ChunkId::new(0))
        );
    }

    #[test]
    fn test_missing_or_unset_name() {
        let graph = Names(vec![Some("main"), None]);
        let chunks = [ChunkId::new(0), ChunkId::new(1)];

        assert_eq!(find_chunk_by_name(&graph, &chunks, Some("vendors")), None);
        assert_eq!(find_chunk_by_name(&graph, &chunks, None), None);
        assert_eq!(find_chunk_by_name(&graph, &[], Some("main")), None);
    }

    #[test]
    fn test_only_supplied_chunks_are_searched() {
        let graph = Names(vec![Some("main"), Some("runtime")]);
        assert_eq!(
            find_chunk_by_name(&graph, &[ChunkId::new(0)], Some("runtime")),
            None
        );
    }
}
