//! Propagation of delegate modules and their dependency closure into chunks
//!
//! A module is attached to a chunk together with everything it transitively
//! depends on. Membership in the target chunk doubles as the visited marker:
//! connections only grow during a pass, so a module already in the chunk is
//! never descended into again and cyclic graphs terminate. The module the pass
//! starts from is the one exception, its dependencies are always inspected
//! even when it was attached earlier.

use log::{debug, trace};

use crate::{
    delegates::DelegateRegistry,
    host::{BuildHost, ChunkId, ModuleId},
};

/// Attach `module` and its dependency closure to `chunk`.
///
/// Returns the number of modules newly connected to the chunk. Dependencies
/// that do not resolve to a module are skipped.
pub fn attach_closure<H: BuildHost + ?Sized>(
    host: &mut H,
    module: ModuleId,
    chunk: ChunkId,
    debug: bool,
) -> usize {
    let mut attached = 0;
    if connect_if_missing(host, module, chunk, debug) {
        attached += 1;
    }

    let mut stack = Vec::new();
    push_unattached_dependencies(host, module, chunk, &mut stack);

    while let Some(current) = stack.pop() {
        // May have been attached through another path since it was pushed
        if !connect_if_missing(host, current, chunk, debug) {
            continue;
        }
        attached += 1;
        push_unattached_dependencies(host, current, chunk, &mut stack);
    }

    trace!("Attached {attached} module(s) to {chunk} starting from {module}");
    attached
}

/// Attach every registered delegate closure to each of `chunks`, chunk by chunk.
/// Returns the total number of new connections.
pub fn attach_all_delegates_to<H: BuildHost + ?Sized>(
    host: &mut H,
    registry: &DelegateRegistry,
    chunks: &[ChunkId],
    debug: bool,
) -> usize {
    let mut attached = 0;
    for &chunk in chunks {
        for module in registry.modules() {
            attached += attach_closure(host, module, chunk, debug);
        }
    }
    attached
}

fn connect_if_missing<H: BuildHost + ?Sized>(
    host: &mut H,
    module: ModuleId,
    chunk: ChunkId,
    debug: bool,
) -> bool {
    if host.is_module_in_chunk(module, chunk) {
        return false;
    }
    if debug {
        debug!(
            "adding {} to chunk {}",
            host.module_identity(module).unwrap_or("<unnamed module>"),
            host.chunk_name(chunk).unwrap_or("<unnamed chunk>")
        );
    }
    host.mark_eager(module);
    host.connect_chunk_and_module(chunk, module);
    true
}

/// Push dependency targets that are not yet in `chunk`, reversed so that they
/// pop in declaration order.
fn push_unattached_dependencies<H: BuildHost + ?Sized>(
    host: &H,
    module: ModuleId,
    chunk: ChunkId,
    stack: &mut Vec<ModuleId>,
) {
    let start = stack.len();
    for dependency in host.module_dependencies(module) {
        let Some(target) = host.resolve_dependency(dependency) else {
            trace!("Skipping unresolved dependency of {module}");
            continue;
        };
        if !host.is_module_in_chunk(target, chunk) {
            stack.push(target);
        }
    }
    stack[start..].reverse();
}
