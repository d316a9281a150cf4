//! Per-class dominator sizes of the leaked objects.

use crate::types::{DisposedDominatorReportEntry, DominatorSummary};
use leak_analysis_common::{ObjectId, RootPathsTree};
use std::collections::BTreeSet;
use tracing::debug;

/// Register every leaked object with `tree` and sum its dominator groups
/// per class. Sizes are converted from words to bytes.
pub fn collect_dominator_summary(
    tree: &mut dyn RootPathsTree,
    leaked: &BTreeSet<ObjectId>,
    word_size_bytes: u64,
) -> DominatorSummary {
    for &id in leaked {
        tree.register_object(id);
    }

    let mut summary = DominatorSummary::default();
    for (class, nodes) in tree.dominator_groups_by_class() {
        let count: u64 = nodes.iter().map(|node| node.instances.len() as u64).sum();
        let size: u64 = nodes
            .iter()
            .map(|node| node.total_size_in_words * word_size_bytes)
            .sum();
        summary.total_count += count;
        summary.total_size += size;
        summary
            .entries
            .push(DisposedDominatorReportEntry { class, count, size });
    }

    summary.entries.sort_by(|a, b| {
        b.size
            .cmp(&a.size)
            .then_with(|| a.class.name().cmp(b.class.name()))
            .then_with(|| a.class.cmp(&b.class))
    });

    debug!(
        classes = summary.entries.len(),
        total_size = summary.total_size,
        "Collected dominator summary"
    );
    summary
}
