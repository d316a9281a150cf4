//! Dominator tree and retained sizes of the strongly reachable heap.

use crate::heap::HeapGraph;
use crate::reachability::Reachability;
use leak_analysis_common::ObjectId;
use petgraph::algo::dominators::simple_fast;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Immediate dominators and retained sizes, in snapshot words.
///
/// The graph gets a virtual super-root with an edge to every GC root, so
/// objects only dominated by that super-root have no immediate dominator.
#[derive(Debug, Clone, Default)]
pub struct DominatorIndex {
    idom: FxHashMap<ObjectId, ObjectId>,
    retained: FxHashMap<ObjectId, u64>,
}

impl DominatorIndex {
    pub(crate) fn compute(graph: &HeapGraph, reachability: &Reachability) -> Self {
        let mut dag: DiGraph<ObjectId, ()> = DiGraph::new();
        let super_root = dag.add_node(ObjectId::NULL);
        let mut node_map: FxHashMap<ObjectId, NodeIndex> = FxHashMap::default();

        for &id in reachability.order() {
            node_map.insert(id, dag.add_node(id));
        }
        for root in graph.gc_roots() {
            if let Some(&node) = node_map.get(&root) {
                dag.add_edge(super_root, node, ());
            }
        }
        for &id in reachability.order() {
            let from = node_map[&id];
            for target in graph.strong_references(id) {
                if let Some(&to) = node_map.get(&target) {
                    dag.add_edge(from, to, ());
                }
            }
        }

        let dominators = simple_fast(&dag, super_root);

        let mut idom = FxHashMap::default();
        let mut children: FxHashMap<ObjectId, Vec<ObjectId>> = FxHashMap::default();
        for &id in reachability.order() {
            let dominator = dominators
                .immediate_dominator(node_map[&id])
                .map(|node| dag[node])
                .unwrap_or(ObjectId::NULL);
            idom.insert(id, dominator);
            children.entry(dominator).or_default().push(id);
        }

        // Pre-order over the dominator tree; reversed, children precede parents.
        let mut preorder = Vec::with_capacity(idom.len());
        let mut stack = vec![ObjectId::NULL];
        while let Some(id) = stack.pop() {
            if !id.is_null() {
                preorder.push(id);
            }
            if let Some(kids) = children.get(&id) {
                stack.extend(kids.iter().copied());
            }
        }

        let mut retained: FxHashMap<ObjectId, u64> = FxHashMap::default();
        for &id in preorder.iter().rev() {
            let own = graph.object(id).map_or(0, |object| object.size_in_words);
            let from_children: u64 = children
                .get(&id)
                .map(|kids| kids.iter().map(|kid| retained[kid]).sum())
                .unwrap_or(0);
            retained.insert(id, own + from_children);
        }

        debug!(nodes = idom.len(), "Computed dominator tree");
        Self { idom, retained }
    }

    /// Immediate dominator of `id`; `None` for GC-root-level nodes and
    /// unreachable objects.
    pub fn immediate_dominator(&self, id: ObjectId) -> Option<ObjectId> {
        self.idom.get(&id).copied().filter(|dominator| !dominator.is_null())
    }

    /// Size of the sub-graph kept alive only through `id`.
    pub fn retained_size(&self, id: ObjectId) -> u64 {
        self.retained.get(&id).copied().unwrap_or(0)
    }

    /// Strict dominators of `id`, nearest first.
    pub fn dominators_of(&self, id: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
        let mut current = id;
        let limit = self.idom.len();
        (0..limit).map_while(move |_| {
            let dominator = self.immediate_dominator(current)?;
            current = dominator;
            Some(dominator)
        })
    }
}
