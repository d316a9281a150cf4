//! Reconstruction and aggregation of the disposer tree.

use crate::config::{DisposerConfig, DisposerLayout};
use crate::error::Error;
use crate::types::{ChildrenEncoding, ClassGrouping, DisposalTreeNode, DisposerTreeStats};
use leak_analysis_common::{
    AnalysisError, ClassDefinition, ObjectId, ObjectNavigator, ReferenceResolution,
};
use tracing::{debug, info, warn};

/// Position the navigator on the registry's `ObjectTree`.
///
/// The static tree field of a loaded registry class is never null; finding
/// it null means the snapshot does not have the expected layout.
pub(crate) fn goto_object_tree(
    nav: &mut dyn ObjectNavigator,
    layout: &DisposerLayout,
) -> Result<(), Error> {
    nav.goto_static_field(&layout.registry_class, &layout.tree_field)?;
    if nav.is_null() {
        return Err(Error::InvariantViolation(format!(
            "{}.{} is null",
            layout.registry_class, layout.tree_field
        )));
    }
    Ok(())
}

/// Child node ids of the `ObjectNode` the navigator is positioned on.
///
/// Moves the navigator.
pub(crate) fn children_encoding(
    nav: &mut dyn ObjectNavigator,
    layout: &DisposerLayout,
) -> Result<ChildrenEncoding, Error> {
    nav.goto_instance_field(&layout.object_node_class, &layout.children_field)?;
    if nav.is_null() || nav.current_class()?.name() == layout.empty_list_class {
        return Ok(ChildrenEncoding::Empty);
    }

    nav.goto_instance_field(&layout.smart_list_class, &layout.smart_list_element_field)?;
    if nav.is_null() {
        return Ok(ChildrenEncoding::Empty);
    }
    if nav.current_class()?.is_array() {
        let ids = nav
            .referenced_ids()
            .into_iter()
            .filter(|id| !id.is_null())
            .collect();
        return Ok(ChildrenEncoding::Many(ids));
    }
    Ok(ChildrenEncoding::Single(nav.current_id()))
}

/// Resolve one tree node without its children. `None` for null nodes and
/// nodes whose tracked object is gone.
pub(crate) fn resolve_node(
    nav: &mut dyn ObjectNavigator,
    layout: &DisposerLayout,
    node_id: ObjectId,
) -> Result<Option<DisposalTreeNode>, Error> {
    nav.goto_id(node_id, ReferenceResolution::OnlyStrongReferences);
    if nav.is_null() {
        debug!(node = %node_id, "Skipping null disposer tree node");
        return Ok(None);
    }

    let object_id = nav.instance_field_object_id(&layout.object_node_class, &layout.object_field)?;
    let class = match nav.class_for_object_id(object_id) {
        Ok(class) => class,
        Err(AnalysisError::UnknownObject(_)) => {
            debug!(node = %node_id, object = %object_id, "Skipping node with dangling object");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    Ok(Some(DisposalTreeNode {
        node_id,
        object_id,
        class,
        children: Vec::new(),
    }))
}

/// Fill in the child node ids of a resolved node.
pub(crate) fn load_children(
    nav: &mut dyn ObjectNavigator,
    layout: &DisposerLayout,
    node: &mut DisposalTreeNode,
) -> Result<(), Error> {
    nav.goto_id(node.node_id, ReferenceResolution::OnlyStrongReferences);
    node.children = children_encoding(nav, layout)?.into_ids();
    Ok(())
}

struct Frame {
    node_id: ObjectId,
    /// Set when the node was resolved before being pushed.
    resolved: Option<DisposalTreeNode>,
    parent_id: ObjectId,
    parent_class: Option<ClassDefinition>,
    depth: usize,
}

/// Walk the disposer tree depth-first and aggregate instance statistics
/// per `(class, parent class, root class)`.
///
/// Returns empty statistics when the snapshot has no registry class.
pub fn walk_disposer_tree(
    nav: &mut dyn ObjectNavigator,
    config: &DisposerConfig,
) -> Result<DisposerTreeStats, Error> {
    let layout = &config.layout;
    let mut stats = DisposerTreeStats::default();

    if !nav.class_store().contains_class(&layout.registry_class) {
        debug!(class = %layout.registry_class, "Registry class not in snapshot");
        return Ok(stats);
    }

    goto_object_tree(nav, layout)?;
    nav.goto_instance_field(&layout.object_tree_class, &layout.root_node_field)?;
    if nav.is_null() {
        return Ok(stats);
    }
    let root_node_ids = children_encoding(nav, layout)?.into_ids();

    for root_node_id in root_node_ids {
        let Some(root) = resolve_node(nav, layout, root_node_id)? else {
            continue;
        };
        let root_id = root.object_id;
        let root_class = root.class.clone();

        let mut stack = vec![Frame {
            node_id: root_node_id,
            resolved: Some(root),
            parent_id: ObjectId::NULL,
            parent_class: None,
            depth: 0,
        }];

        while let Some(frame) = stack.pop() {
            let mut node = match frame.resolved {
                Some(node) => node,
                None => match resolve_node(nav, layout, frame.node_id)? {
                    Some(node) => node,
                    None => continue,
                },
            };

            stats
                .groupings
                .entry(ClassGrouping {
                    child_class: node.class.clone(),
                    parent_class: frame.parent_class,
                    root_class: root_class.clone(),
                })
                .or_default()
                .register_object(frame.parent_id, root_id);

            if frame.depth >= config.max_tree_depth {
                if stats.too_deep.insert(node.class.clone()) {
                    warn!(class = %node.class, depth = frame.depth, "Disposer tree too deep");
                }
                continue;
            }

            load_children(nav, layout, &mut node)?;
            for &child_id in node.children.iter().rev() {
                stack.push(Frame {
                    node_id: child_id,
                    resolved: None,
                    parent_id: node.object_id,
                    parent_class: Some(node.class.clone()),
                    depth: frame.depth + 1,
                });
            }
        }
    }

    info!(
        groupings = stats.groupings.len(),
        too_deep = stats.too_deep.len(),
        "Walked disposer tree"
    );
    Ok(stats)
}
