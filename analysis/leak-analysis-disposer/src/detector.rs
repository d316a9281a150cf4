//! Detection of disposed objects that are still strongly reachable.

use crate::config::DisposerConfig;
use crate::error::Error;
use crate::walker::goto_object_tree;
use leak_analysis_common::{ObjectId, ObjectNavigator, ParentList, ReferenceResolution};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Ids of disposed objects that still have a strong path from a GC root.
///
/// Walks the keys of the registry's disposed-objects weak map once. Cleared
/// keys and referents without a recorded strong parent are skipped.
pub fn compute_disposed_object_ids(
    nav: &mut dyn ObjectNavigator,
    parent_list: &ParentList,
    config: &DisposerConfig,
) -> Result<BTreeSet<ObjectId>, Error> {
    let layout = &config.layout;
    let mut leaked = BTreeSet::new();

    if !nav.class_store().contains_class(&layout.registry_class) {
        return Ok(leaked);
    }

    goto_object_tree(nav, layout)?;
    let path = [
        (&layout.object_tree_class, &layout.disposed_objects_field),
        (&layout.weak_map_class, &layout.weak_map_field),
        (&layout.ref_map_class, &layout.ref_map_keys_field),
    ];
    for (class, field) in path {
        nav.goto_instance_field(class, field)?;
        if nav.is_null() {
            debug!(class = %class, field = %field, "Disposed objects map is empty");
            return Ok(leaked);
        }
    }

    let Some(weak_key_class) = nav.class_store().lookup(&layout.weak_key_class) else {
        return Ok(leaked);
    };

    let keys = nav.referenced_ids();
    let mut disposed = 0usize;
    for key in keys {
        if key.is_null() {
            continue;
        }
        nav.goto_id(key, ReferenceResolution::AllReferences);
        if nav.current_class().ok().as_ref() != Some(&weak_key_class) {
            continue;
        }

        let referent = nav.instance_field_object_id(&layout.weak_key_class, &layout.referent_field)?;
        if referent.is_null() {
            continue;
        }
        disposed += 1;

        // No parent: no strong path from a GC root, the object will be collected.
        if !parent_list.has_parent(referent) {
            continue;
        }
        leaked.insert(referent);
    }

    info!(disposed, leaked = leaked.len(), "Computed disposed object ids");
    Ok(leaked)
}
