// analysis/leak-analysis-common/src/traits.rs

use crate::error::AnalysisError;
use crate::types::{ClassDefinition, DominatorNode, ObjectId, ReferenceResolution, TreeDisplayOptions};
use rustc_hash::FxHashMap;

/// Class metadata of a snapshot, keyed by fully-qualified name.
pub trait ClassStore {
    fn contains_class(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    fn lookup(&self, name: &str) -> Option<ClassDefinition>;

    /// Display name used in report lines.
    fn short_pretty_name(&self, class: &ClassDefinition) -> String {
        class.short_pretty_name()
    }
}

/// A cursor over the snapshot's object graph (dependency inversion over the
/// snapshot index).
///
/// Navigation moves the cursor onto exactly one object at a time; a cursor
/// positioned on id `0` or on a missing object is null.
pub trait ObjectNavigator {
    fn class_store(&self) -> &dyn ClassStore;

    /// Move to `id`. The resolution mode applies to `referenced_ids` until the next move.
    fn goto_id(&mut self, id: ObjectId, resolution: ReferenceResolution);

    /// Move to the value of a static field.
    fn goto_static_field(&mut self, class_name: &str, field: &str) -> Result<(), AnalysisError>;

    /// Move to the value of an instance field of the current object, which
    /// must be an instance of `class_name`.
    fn goto_instance_field(&mut self, class_name: &str, field: &str)
        -> Result<(), AnalysisError>;

    /// Read an instance field of the current object without moving.
    fn instance_field_object_id(
        &self,
        class_name: &str,
        field: &str,
    ) -> Result<ObjectId, AnalysisError>;

    fn is_null(&self) -> bool;

    fn current_id(&self) -> ObjectId;

    fn current_class(&self) -> Result<ClassDefinition, AnalysisError>;

    fn class_for_object_id(&self, id: ObjectId) -> Result<ClassDefinition, AnalysisError>;

    /// Outgoing references of the current object. For arrays these are the
    /// elements in order, null slots included.
    fn referenced_ids(&self) -> Vec<ObjectId>;
}

/// Dominator engine and GC-root path aggregator for a set of registered objects.
pub trait RootPathsTree {
    fn register_object(&mut self, id: ObjectId);

    /// Registered objects grouped under their dominating registered ancestor,
    /// keyed by the class of that ancestor.
    fn dominator_groups_by_class(&mut self) -> FxHashMap<ClassDefinition, Vec<DominatorNode>>;

    /// Text rendering of the most common paths from GC roots to the
    /// registered objects. Callers iterate it with `lines()`.
    fn render_paths_tree(&self) -> String;
}

/// Creates root-paths trees over one snapshot.
pub trait RootPathsTreeFactory {
    fn create(
        &self,
        options: &TreeDisplayOptions,
        class_filter: Option<&ClassDefinition>,
    ) -> Box<dyn RootPathsTree + '_>;
}
