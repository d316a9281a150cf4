//! Aggregates produced while analyzing the disposer registry.

use leak_analysis_common::{ClassDefinition, ObjectId};
use rustc_hash::{FxHashMap, FxHashSet};

/// Bucket key for disposer tree statistics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassGrouping {
    pub child_class: ClassDefinition,

    /// `None` for objects registered directly under the tree root.
    pub parent_class: Option<ClassDefinition>,

    pub root_class: ClassDefinition,
}

/// Instance counts for one `ClassGrouping`.
#[derive(Debug, Clone, Default)]
pub struct InstanceStats {
    parent_ids: Vec<ObjectId>,
    root_ids: FxHashSet<ObjectId>,
}

impl InstanceStats {
    pub fn register_object(&mut self, parent_id: ObjectId, root_id: ObjectId) {
        self.parent_ids.push(parent_id);
        self.root_ids.insert(root_id);
    }

    /// Number of registered objects.
    pub fn object_count(&self) -> usize {
        self.parent_ids.len()
    }

    /// Number of distinct parents.
    pub fn parent_count(&self) -> usize {
        self.parent_ids.iter().collect::<FxHashSet<_>>().len()
    }

    /// Number of distinct roots.
    pub fn root_count(&self) -> usize {
        self.root_ids.len()
    }
}

/// Output of the disposer tree walk.
#[derive(Debug, Clone, Default)]
pub struct DisposerTreeStats {
    pub groupings: FxHashMap<ClassGrouping, InstanceStats>,

    /// Classes of nodes at which the walk stopped descending.
    pub too_deep: FxHashSet<ClassDefinition>,
}

/// The shapes a node's children collection takes in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildrenEncoding {
    Empty,
    Single(ObjectId),
    Many(Vec<ObjectId>),
}

impl ChildrenEncoding {
    pub fn into_ids(self) -> Vec<ObjectId> {
        match self {
            ChildrenEncoding::Empty => Vec::new(),
            ChildrenEncoding::Single(id) => vec![id],
            ChildrenEncoding::Many(ids) => ids,
        }
    }
}

/// One resolved node of the disposer tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposalTreeNode {
    pub node_id: ObjectId,

    /// The tracked object.
    pub object_id: ObjectId,
    pub class: ClassDefinition,

    /// Ids of the child tree nodes. Only loaded for nodes above the depth cap.
    pub children: Vec<ObjectId>,
}

/// Per-class line of the dominator summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposedDominatorReportEntry {
    pub class: ClassDefinition,
    pub count: u64,

    /// Retained sub-graph size in bytes.
    pub size: u64,
}

/// Dominator entries plus grand totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DominatorSummary {
    /// Sorted by descending size.
    pub entries: Vec<DisposedDominatorReportEntry>,
    pub total_count: u64,
    pub total_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_instance_stats_counts_distinct_parents_and_roots() {
        let mut stats = InstanceStats::default();
        stats.register_object(ObjectId(10), ObjectId(1));
        stats.register_object(ObjectId(10), ObjectId(1));
        stats.register_object(ObjectId(11), ObjectId(2));

        assert_eq!(stats.object_count(), 3);
        assert_eq!(stats.parent_count(), 2);
        assert_eq!(stats.root_count(), 2);
    }

    #[test]
    fn test_children_encoding_normalizes_to_ids() {
        assert_eq!(ChildrenEncoding::Empty.into_ids(), Vec::<ObjectId>::new());
        assert_eq!(
            ChildrenEncoding::Single(ObjectId(4)).into_ids(),
            vec![ObjectId(4)]
        );
        assert_eq!(
            ChildrenEncoding::Many(vec![ObjectId(4), ObjectId(5)]).into_ids(),
            vec![ObjectId(4), ObjectId(5)]
        );
    }
}
