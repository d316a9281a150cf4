//! Aggregated GC-root paths and dominator grouping for registered objects.

use crate::heap::HeapGraph;
use leak_analysis_common::{
    ClassDefinition, DominatorNode, ObjectId, RootPathsTree, TreeDisplayOptions,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Root-paths tree over a `HeapGraph`.
///
/// Registered objects that are not strongly reachable, or whose class does
/// not match the filter, are ignored.
pub struct GcRootPathsTree<'g> {
    graph: &'g HeapGraph,
    options: TreeDisplayOptions,
    class_filter: Option<ClassDefinition>,
    registered: Vec<ObjectId>,
    seen: FxHashSet<ObjectId>,
}

impl<'g> GcRootPathsTree<'g> {
    pub fn new(
        graph: &'g HeapGraph,
        options: TreeDisplayOptions,
        class_filter: Option<ClassDefinition>,
    ) -> Self {
        Self {
            graph,
            options,
            class_filter,
            registered: Vec::new(),
            seen: FxHashSet::default(),
        }
    }

    pub fn registered(&self) -> &[ObjectId] {
        &self.registered
    }

    fn build_trie(&self) -> PathTrie {
        let reachability = self.graph.reachability();
        let mut trie = PathTrie::new();

        for &id in &self.registered {
            let path = reachability.path_from_root(id);
            let mut node = 0;
            let mut previous: Option<ObjectId> = None;
            for step in path {
                let name = self.graph.node_display_name(step);
                let key = match previous {
                    None => format!("(root) {name}"),
                    Some(parent) => format!("{} {name}", self.edge_label(parent, step)),
                };
                node = trie.child(node, key);
                trie.nodes[node].count += 1;
                previous = Some(step);
            }
        }

        trie
    }

    fn edge_label(&self, parent: ObjectId, child: ObjectId) -> String {
        self.graph
            .labeled_references(parent, false)
            .into_iter()
            .find(|(_, target)| *target == child)
            .map(|(label, _)| label)
            .unwrap_or_else(|| "?".to_string())
    }
}

impl RootPathsTree for GcRootPathsTree<'_> {
    fn register_object(&mut self, id: ObjectId) {
        if !self.graph.reachability().is_reachable(id) {
            return;
        }
        if let Some(filter) = &self.class_filter {
            if self.graph.class_of(id) != Some(filter) {
                return;
            }
        }
        if self.seen.insert(id) {
            self.registered.push(id);
        }
    }

    fn dominator_groups_by_class(&mut self) -> FxHashMap<ClassDefinition, Vec<DominatorNode>> {
        let dominators = self.graph.dominators();

        let mut tops: Vec<ObjectId> = Vec::new();
        let mut members: FxHashMap<ObjectId, Vec<ObjectId>> = FxHashMap::default();
        for &id in &self.registered {
            let top = dominators
                .dominators_of(id)
                .filter(|dominator| self.seen.contains(dominator))
                .last()
                .unwrap_or(id);
            let group = members.entry(top).or_default();
            if group.is_empty() {
                tops.push(top);
            }
            group.push(id);
        }

        let mut result: FxHashMap<ClassDefinition, Vec<DominatorNode>> = FxHashMap::default();
        for top in tops {
            let Some(class) = self.graph.class_of(top) else {
                continue;
            };
            let mut instances = members.remove(&top).unwrap_or_default();
            instances.sort_unstable();
            result.entry(class.clone()).or_default().push(DominatorNode {
                instances,
                total_size_in_words: dominators.retained_size(top),
            });
        }

        for nodes in result.values_mut() {
            nodes.sort_by(|a, b| {
                b.total_size_in_words
                    .cmp(&a.total_size_in_words)
                    .then_with(|| a.instances.first().cmp(&b.instances.first()))
            });
        }
        result
    }

    fn render_paths_tree(&self) -> String {
        let trie = self.build_trie();
        let total = self.registered.len().max(1);
        let mut out = String::new();

        enum Item {
            Node(usize, usize),
            More(usize, usize),
        }

        let mut stack: Vec<Item> = trie
            .sorted_children(0)
            .into_iter()
            .rev()
            .map(|child| Item::Node(child, 0))
            .collect();

        while let Some(item) = stack.pop() {
            match item {
                Item::More(hidden, depth) => {
                    out.push_str(&format!("{}... {hidden} more\n", "  ".repeat(depth)));
                }
                Item::Node(idx, depth) => {
                    let node = &trie.nodes[idx];
                    let percent = node.count * 100 / total;
                    out.push_str(&format!(
                        "{}[{:>6}/{:>3}%] {}\n",
                        "  ".repeat(depth),
                        node.count,
                        percent,
                        node.key
                    ));

                    if depth + 1 >= self.options.max_depth {
                        continue;
                    }
                    let visible: Vec<usize> = trie
                        .sorted_children(idx)
                        .into_iter()
                        .filter(|&child| {
                            trie.nodes[child].count * 100
                                >= node.count * self.options.min_percent as usize
                        })
                        .collect();
                    let shown = visible.len().min(self.options.max_width);
                    let hidden = trie.nodes[idx].children.len() - shown;
                    if hidden > 0 {
                        stack.push(Item::More(hidden, depth + 1));
                    }
                    for &child in visible[..shown].iter().rev() {
                        stack.push(Item::Node(child, depth + 1));
                    }
                }
            }
        }

        out
    }
}

struct PathTrieNode {
    key: String,
    count: usize,
    children: Vec<usize>,
    index: FxHashMap<String, usize>,
}

/// Paths merged by their rendered step keys; node 0 is a sentinel.
struct PathTrie {
    nodes: Vec<PathTrieNode>,
}

impl PathTrie {
    fn new() -> Self {
        Self {
            nodes: vec![PathTrieNode {
                key: String::new(),
                count: 0,
                children: Vec::new(),
                index: FxHashMap::default(),
            }],
        }
    }

    fn child(&mut self, parent: usize, key: String) -> usize {
        if let Some(&idx) = self.nodes[parent].index.get(&key) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(PathTrieNode {
            key: key.clone(),
            count: 0,
            children: Vec::new(),
            index: FxHashMap::default(),
        });
        self.nodes[parent].children.push(idx);
        self.nodes[parent].index.insert(key, idx);
        idx
    }

    fn sorted_children(&self, parent: usize) -> Vec<usize> {
        let mut children = self.nodes[parent].children.clone();
        children.sort_by(|&a, &b| {
            self.nodes[b]
                .count
                .cmp(&self.nodes[a].count)
                .then_with(|| self.nodes[a].key.cmp(&self.nodes[b].key))
        });
        children
    }
}
