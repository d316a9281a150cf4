//! Order in which leaked classes get a detailed report.

use crate::types::DisposedDominatorReportEntry;
use leak_analysis_common::{ClassDefinition, ObjectId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Instance lists of the leaked classes in report order.
///
/// Classes named in `top_classes` come first, in that order. The rest are
/// taken alternately from the ranking by instance count and the ranking by
/// dominator size, starting with the count ranking. A class already taken is
/// skipped and the same ranking is asked again; an exhausted ranking hands
/// over to the other one.
pub fn order_for_detailed_report(
    instances_by_class: &FxHashMap<ClassDefinition, Vec<ObjectId>>,
    dominator_entries: &[DisposedDominatorReportEntry],
    top_classes: &[String],
) -> Vec<Vec<ObjectId>> {
    let mut ordered = Vec::with_capacity(instances_by_class.len());
    let mut emitted: FxHashSet<&ClassDefinition> = FxHashSet::default();

    for name in top_classes {
        for (class, instances) in instances_by_class {
            if class.name() == name.as_str() && emitted.insert(class) {
                ordered.push(instances.clone());
            }
        }
    }

    let mut by_count: Vec<(&ClassDefinition, &Vec<ObjectId>)> = instances_by_class.iter().collect();
    by_count.sort_by(|(a_class, a), (b_class, b)| {
        b.len()
            .cmp(&a.len())
            .then_with(|| a_class.name().cmp(b_class.name()))
            .then_with(|| a_class.cmp(b_class))
    });
    let mut by_count: VecDeque<&ClassDefinition> =
        by_count.into_iter().map(|(class, _)| class).collect();

    let mut by_size: Vec<&DisposedDominatorReportEntry> = dominator_entries
        .iter()
        .filter(|entry| instances_by_class.contains_key(&entry.class))
        .collect();
    by_size.sort_by(|a, b| {
        b.size
            .cmp(&a.size)
            .then_with(|| a.class.name().cmp(b.class.name()))
            .then_with(|| a.class.cmp(&b.class))
    });
    let mut by_size: VecDeque<&ClassDefinition> =
        by_size.into_iter().map(|entry| &entry.class).collect();

    let mut use_count = true;
    while !by_count.is_empty() || !by_size.is_empty() {
        let ranking = if use_count { &mut by_count } else { &mut by_size };
        let Some(class) = ranking.pop_front() else {
            use_count = !use_count;
            continue;
        };
        if !emitted.insert(class) {
            continue;
        }
        if let Some(instances) = instances_by_class.get(class) {
            ordered.push(instances.clone());
        }
        use_count = !use_count;
    }

    ordered
}
