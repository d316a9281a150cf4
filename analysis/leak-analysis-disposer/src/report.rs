//! Report sections.

use crate::buffer::TruncatingBuffer;
use crate::config::{DisposerConfig, ReportLimits};
use crate::dominators::collect_dominator_summary;
use crate::error::Error;
use crate::format::{count_short, padded_size_short, size_short};
use crate::priority::order_for_detailed_report;
use crate::types::{ClassGrouping, DisposerTreeStats, InstanceStats};
use leak_analysis_common::{
    ClassDefinition, ClassStore, ObjectId, ObjectNavigator, RootPathsTreeFactory,
    TreeDisplayOptions,
};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// One line of the disposer tree section, or `None` when the grouping is a
/// one-to-one mapping from its parents.
pub fn format_disposer_tree_line(
    grouping: &ClassGrouping,
    stats: &InstanceStats,
    store: &dyn ClassStore,
) -> Option<String> {
    let object_count = stats.object_count();
    let parent_count = stats.parent_count();

    let parent = match &grouping.parent_class {
        None => "(no parent)".to_string(),
        Some(_) if object_count == parent_count => return None,
        Some(parent_class) => {
            let root_count = stats.root_count();
            if &grouping.root_class != parent_class || root_count != parent_count {
                format!(
                    "<-- {parent_count} {} [...] {root_count}",
                    store.short_pretty_name(parent_class)
                )
            } else {
                format!("<-- {parent_count}")
            }
        }
    };

    Some(format!(
        "  {object_count:>6} {} {parent}",
        store.short_pretty_name(&grouping.child_class)
    ))
}

/// Disposer tree statistics grouped by root class.
pub fn prepare_disposer_tree_section(
    stats: &DisposerTreeStats,
    store: &dyn ClassStore,
    limits: &ReportLimits,
) -> String {
    let mut groups: FxHashMap<&ClassDefinition, Vec<(&ClassGrouping, &InstanceStats)>> =
        FxHashMap::default();
    for (grouping, instance_stats) in &stats.groupings {
        groups
            .entry(&grouping.root_class)
            .or_default()
            .push((grouping, instance_stats));
    }

    let mut groups: Vec<(&ClassDefinition, usize, Vec<(&ClassGrouping, &InstanceStats)>)> = groups
        .into_iter()
        .map(|(root, mut entries)| {
            entries.sort_by(|(a, a_stats), (b, b_stats)| {
                b_stats
                    .object_count()
                    .cmp(&a_stats.object_count())
                    .then_with(|| a.child_class.name().cmp(b.child_class.name()))
                    .then_with(|| parent_name(a).cmp(parent_name(b)))
                    .then_with(|| a.child_class.cmp(&b.child_class))
                    .then_with(|| a.parent_class.cmp(&b.parent_class))
            });
            let total: usize = entries.iter().map(|(_, s)| s.object_count()).sum();
            (root, total, entries)
        })
        .collect();
    groups.sort_by(|(a, a_total, _), (b, b_total, _)| {
        b_total
            .cmp(a_total)
            .then_with(|| a.name().cmp(b.name()))
            .then_with(|| a.cmp(b))
    });

    let mut out = String::new();
    {
        let mut section = TruncatingBuffer::new(limits.disposer_tree_lines, 0, &mut out);
        for (root, _, entries) in groups {
            section.println(&format!("Root: {}", root.name()));
            {
                let mut per_root =
                    TruncatingBuffer::new(limits.disposer_tree_lines_per_root, 0, &mut section);
                for (grouping, instance_stats) in entries {
                    if let Some(line) = format_disposer_tree_line(grouping, instance_stats, store) {
                        per_root.println(&line);
                    }
                }
            }
            section.println("");
        }
    }

    if !stats.too_deep.is_empty() {
        let mut names: Vec<String> = stats
            .too_deep
            .iter()
            .map(|class| store.short_pretty_name(class))
            .collect();
        names.sort();
        out.push_str("Skipped analysis of objects too deep in disposer tree:\n");
        for name in names {
            out.push_str(&format!(" * {name}\n"));
        }
    }

    out
}

fn parent_name(grouping: &ClassGrouping) -> &str {
    grouping
        .parent_class
        .as_ref()
        .map(ClassDefinition::name)
        .unwrap_or("")
}

/// Leaked objects grouped by class, ids ascending.
pub fn leaked_instances_by_class(
    nav: &dyn ObjectNavigator,
    leaked: &BTreeSet<ObjectId>,
) -> Result<FxHashMap<ClassDefinition, Vec<ObjectId>>, Error> {
    let mut by_class: FxHashMap<ClassDefinition, Vec<ObjectId>> = FxHashMap::default();
    for &id in leaked {
        let class = nav.class_for_object_id(id)?;
        by_class.entry(class).or_default().push(id);
    }
    Ok(by_class)
}

/// Summary, dominator summary and per-class details of the leaked objects.
pub fn prepare_disposed_objects_section(
    nav: &dyn ObjectNavigator,
    leaked: &BTreeSet<ObjectId>,
    trees: &dyn RootPathsTreeFactory,
    config: &DisposerConfig,
) -> Result<String, Error> {
    let instances_by_class = leaked_instances_by_class(nav, leaked)?;
    let mut out = String::new();

    if config.include_disposed_objects_summary {
        let mut counts: Vec<(&ClassDefinition, usize)> = instances_by_class
            .iter()
            .map(|(class, instances)| (class, instances.len()))
            .collect();
        counts.sort_by(|(a, a_count), (b, b_count)| {
            let a_rest = !is_top_class(a, config);
            let b_rest = !is_top_class(b, config);
            a_rest
                .cmp(&b_rest)
                .then_with(|| b_count.cmp(a_count))
                .then_with(|| a.name().cmp(b.name()))
                .then_with(|| a.cmp(b))
        });

        {
            let mut buffer = TruncatingBuffer::new(config.limits.summary_lines, 0, &mut out);
            buffer.println(&format!(
                "Count of disposed-but-strong-referenced objects: {}",
                leaked.len()
            ));
            for (class, count) in counts {
                buffer.println(&format!("  {count} {}", class.pretty_name()));
            }
        }
        out.push('\n');
    }

    let summary = {
        let mut tree = trees.create(&TreeDisplayOptions::all(), None);
        collect_dominator_summary(tree.as_mut(), leaked, config.word_size_bytes)
    };

    if config.include_disposed_objects_summary {
        {
            let mut buffer =
                TruncatingBuffer::new(config.limits.dominator_summary_lines, 0, &mut out);
            buffer.println(&format!(
                "Disposed-but-strong-referenced dominator object count: {}",
                summary.total_count
            ));
            buffer.println(&format!(
                "Disposed-but-strong-referenced dominator sub-graph size: {}",
                size_short(summary.total_size)
            ));
            for entry in &summary.entries {
                buffer.println(&format!(
                    "  {} - {} {}",
                    padded_size_short(entry.size),
                    count_short(entry.count),
                    entry.class.name()
                ));
            }
        }
        out.push('\n');
    }

    if config.include_disposed_objects_details {
        let ordered = order_for_detailed_report(
            &instances_by_class,
            &summary.entries,
            &config.top_reported_classes,
        );

        let mut buffer = TruncatingBuffer::new(config.limits.details_lines, 0, &mut out);
        for instances in ordered {
            let Some(&first) = instances.first() else {
                continue;
            };
            let class = nav.class_for_object_id(first)?;
            buffer.println(&format!(
                "Disposed but still strong-referenced objects: {} {}, most common paths from GC-roots:",
                instances.len(),
                class.pretty_name()
            ));

            let mut tree = trees.create(&config.details_tree_display_options, Some(&class));
            for &id in &instances {
                tree.register_object(id);
            }
            for line in tree.render_paths_tree().lines() {
                buffer.println(line);
            }
        }
    }

    Ok(out)
}

fn is_top_class(class: &ClassDefinition, config: &DisposerConfig) -> bool {
    config
        .top_reported_classes
        .iter()
        .any(|name| name == class.name())
}
