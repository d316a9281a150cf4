//! Shortest strong paths from GC roots.

use crate::heap::HeapGraph;
use leak_analysis_common::{ObjectId, ParentList};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use tracing::debug;

/// Breadth-first parent pointers over strong references.
///
/// Every strongly reachable node maps to the node it was first discovered
/// from; GC roots map to themselves.
#[derive(Debug, Clone, Default)]
pub struct Reachability {
    parents: FxHashMap<ObjectId, ObjectId>,
    order: Vec<ObjectId>,
}

impl Reachability {
    pub(crate) fn compute(graph: &HeapGraph) -> Self {
        let mut parents = FxHashMap::default();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();

        for root in graph.gc_roots() {
            if parents.insert(root, root).is_none() {
                queue.push_back(root);
            }
        }

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for target in graph.strong_references(node) {
                if let std::collections::hash_map::Entry::Vacant(entry) = parents.entry(target) {
                    entry.insert(node);
                    queue.push_back(target);
                }
            }
        }

        debug!(reachable = order.len(), "Computed strong reachability");
        Self { parents, order }
    }

    pub fn is_reachable(&self, id: ObjectId) -> bool {
        self.parents.contains_key(&id)
    }

    /// Node `id` was discovered from; roots return themselves.
    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.parents.get(&id).copied()
    }

    /// Reachable nodes in discovery order.
    pub fn order(&self) -> &[ObjectId] {
        &self.order
    }

    /// Shortest path from a GC root down to `id`, root first.
    pub fn path_from_root(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(current);
            if parent == current || path.len() > self.parents.len() {
                break;
            }
            current = parent;
        }
        path.reverse();
        path
    }

    /// Parent list sized to hold every id up to `max_id`.
    pub fn parent_list(&self, max_id: u64) -> ParentList {
        let len = usize::try_from(max_id)
            .ok()
            .and_then(|max| max.checked_add(1))
            .unwrap_or(0);
        let mut parents = vec![0u64; len];
        for (id, parent) in &self.parents {
            if let Some(slot) = parents.get_mut(id.0 as usize) {
                *slot = parent.0;
            }
        }
        ParentList::new(parents)
    }
}
