//! The indexed heap graph.

use crate::dominators::DominatorIndex;
use crate::error::GraphError;
use crate::navigator::HeapNavigator;
use crate::reachability::Reachability;
use crate::root_paths::GcRootPathsTree;
use crate::snapshot::SnapshotFile;
use leak_analysis_common::{
    ClassDefinition, ClassStore, ObjectId, ParentList, RootPathsTree, RootPathsTreeFactory,
    TreeDisplayOptions,
};
use once_cell::unsync::OnceCell;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::info;

/// Field holding the referent of weak reference classes.
pub(crate) const REFERENT_FIELD: &str = "referent";

/// Largest id accepted per indexed node, beyond a fixed allowance.
const MAX_IDS_PER_NODE: u64 = 16;

/// Ids up to this value are always accepted.
const MIN_ID_RANGE: u64 = 1 << 16;

/// A class of the snapshot.
#[derive(Debug, Clone)]
pub struct HeapClass {
    pub definition: ClassDefinition,
    pub super_class: Option<ObjectId>,
    pub weak: bool,
    pub static_fields: BTreeMap<String, ObjectId>,
}

/// An object of the snapshot.
#[derive(Debug, Clone)]
pub struct HeapObject {
    pub id: ObjectId,
    pub class_id: ObjectId,
    pub size_in_words: u64,
    pub fields: BTreeMap<String, ObjectId>,
    pub elements: Vec<ObjectId>,
}

/// An immutable, indexed heap snapshot.
///
/// Reachability and dominators are computed on first use and cached.
pub struct HeapGraph {
    classes: FxHashMap<ObjectId, HeapClass>,
    class_ids_by_name: FxHashMap<String, ObjectId>,
    objects: FxHashMap<ObjectId, HeapObject>,
    roots: Vec<ObjectId>,
    max_id: u64,
    reachability: OnceCell<Reachability>,
    dominators: OnceCell<DominatorIndex>,
}

impl HeapGraph {
    /// Index a snapshot description.
    pub fn from_snapshot(snapshot: SnapshotFile) -> Result<Self, GraphError> {
        let mut classes = FxHashMap::default();
        let mut class_ids_by_name = FxHashMap::default();
        let mut objects = FxHashMap::default();
        let mut max_id = 0;

        for record in snapshot.classes {
            if record.id.is_null() || classes.contains_key(&record.id) {
                return Err(GraphError::InvalidId(record.id));
            }
            if class_ids_by_name
                .insert(record.name.clone(), record.id)
                .is_some()
            {
                return Err(GraphError::DuplicateClassName(record.name));
            }
            max_id = max_id.max(record.id.0);
            classes.insert(
                record.id,
                HeapClass {
                    definition: ClassDefinition::new(record.id, record.name),
                    super_class: record.super_class,
                    weak: record.weak,
                    static_fields: record.static_fields,
                },
            );
        }

        for record in snapshot.objects {
            if record.id.is_null()
                || classes.contains_key(&record.id)
                || objects.contains_key(&record.id)
            {
                return Err(GraphError::InvalidId(record.id));
            }
            if !classes.contains_key(&record.class) {
                return Err(GraphError::UnknownClass {
                    object: record.id,
                    class: record.class,
                });
            }
            max_id = max_id.max(record.id.0);
            objects.insert(
                record.id,
                HeapObject {
                    id: record.id,
                    class_id: record.class,
                    size_in_words: record.size,
                    fields: record.fields,
                    elements: record.elements,
                },
            );
        }

        let count = classes.len() + objects.len();
        let id_limit = (count as u64)
            .saturating_mul(MAX_IDS_PER_NODE)
            .max(MIN_ID_RANGE);
        if max_id > id_limit {
            return Err(GraphError::SparseIds { max_id, count });
        }

        for class in classes.values() {
            if let Some(super_class) = class.super_class {
                if !classes.contains_key(&super_class) {
                    return Err(GraphError::UnknownClass {
                        object: class.definition.id(),
                        class: super_class,
                    });
                }
            }
        }

        info!(
            classes = classes.len(),
            objects = objects.len(),
            roots = snapshot.roots.len(),
            "Indexed heap snapshot"
        );

        Ok(Self {
            classes,
            class_ids_by_name,
            objects,
            roots: snapshot.roots,
            max_id,
            reachability: OnceCell::new(),
            dominators: OnceCell::new(),
        })
    }

    /// A fresh cursor positioned on null.
    pub fn navigator(&self) -> HeapNavigator<'_> {
        HeapNavigator::new(self)
    }

    pub fn object(&self, id: ObjectId) -> Option<&HeapObject> {
        self.objects.get(&id)
    }

    pub fn class(&self, id: ObjectId) -> Option<&HeapClass> {
        self.classes.get(&id)
    }

    pub fn class_by_name(&self, name: &str) -> Option<&HeapClass> {
        self.class_ids_by_name
            .get(name)
            .and_then(|id| self.classes.get(id))
    }

    /// Whether `id` names an object or a class.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id) || self.classes.contains_key(&id)
    }

    /// Class of an object. Class nodes have none.
    pub fn class_of(&self, id: ObjectId) -> Option<&ClassDefinition> {
        self.objects
            .get(&id)
            .and_then(|object| self.classes.get(&object.class_id))
            .map(|class| &class.definition)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn max_id(&self) -> u64 {
        self.max_id
    }

    /// GC roots: explicit roots in snapshot order, then every class by id.
    pub fn gc_roots(&self) -> Vec<ObjectId> {
        let mut class_ids: Vec<ObjectId> = self.classes.keys().copied().collect();
        class_ids.sort_unstable();

        self.roots
            .iter()
            .copied()
            .filter(|id| self.contains(*id))
            .chain(class_ids)
            .collect()
    }

    /// Whether instances of `class_id` are instances of `name` (walking super classes).
    pub fn is_instance_of(&self, class_id: ObjectId, name: &str) -> bool {
        self.class_chain(class_id)
            .any(|class| class.definition.name() == name)
    }

    fn is_weak(&self, class_id: ObjectId) -> bool {
        self.class_chain(class_id).any(|class| class.weak)
    }

    fn class_chain(&self, class_id: ObjectId) -> impl Iterator<Item = &HeapClass> + '_ {
        let mut next = Some(class_id);
        // Bounded by the class count so a malformed super chain cannot loop.
        (0..self.classes.len()).map_while(move |_| {
            let class = self.classes.get(&next?)?;
            next = class.super_class;
            Some(class)
        })
    }

    /// Outgoing references of `id` with their labels: `static <field>` for
    /// class statics, the field name for instance fields, `[i]` for array
    /// elements. Null references are omitted; weak referents only appear
    /// when `include_weak` is set.
    pub fn labeled_references(&self, id: ObjectId, include_weak: bool) -> Vec<(String, ObjectId)> {
        if let Some(class) = self.classes.get(&id) {
            return class
                .static_fields
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(name, value)| (format!("static {name}"), *value))
                .collect();
        }

        let Some(object) = self.objects.get(&id) else {
            return Vec::new();
        };

        let skip_referent = !include_weak && self.is_weak(object.class_id);
        let fields = object
            .fields
            .iter()
            .filter(|(name, value)| !value.is_null() && !(skip_referent && *name == REFERENT_FIELD))
            .map(|(name, value)| (name.clone(), *value));
        let elements = object
            .elements
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.is_null())
            .map(|(idx, value)| (format!("[{idx}]"), *value));

        fields.chain(elements).collect()
    }

    /// Strong outgoing references of `id` that point at known nodes.
    pub fn strong_references(&self, id: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
        self.labeled_references(id, false)
            .into_iter()
            .map(|(_, target)| target)
            .filter(move |target| self.contains(*target))
    }

    /// Shortest strong paths from the GC roots.
    pub fn reachability(&self) -> &Reachability {
        self.reachability.get_or_init(|| Reachability::compute(self))
    }

    /// Dominator tree and retained sizes over the strongly reachable graph.
    pub fn dominators(&self) -> &DominatorIndex {
        self.dominators
            .get_or_init(|| DominatorIndex::compute(self, self.reachability()))
    }

    /// Parent list of the whole heap, indexed by object id.
    pub fn parent_list(&self) -> ParentList {
        self.reachability().parent_list(self.max_id)
    }

    /// Display name of a node on a root path.
    pub(crate) fn node_display_name(&self, id: ObjectId) -> String {
        if let Some(class) = self.classes.get(&id) {
            return format!("class {}", class.definition.pretty_name());
        }
        self.class_of(id)
            .map(ClassDefinition::pretty_name)
            .unwrap_or_else(|| format!("<unknown {id}>"))
    }
}

impl ClassStore for HeapGraph {
    fn contains_class(&self, name: &str) -> bool {
        self.class_ids_by_name.contains_key(name)
    }

    fn lookup(&self, name: &str) -> Option<ClassDefinition> {
        self.class_by_name(name).map(|class| class.definition.clone())
    }
}

impl RootPathsTreeFactory for HeapGraph {
    fn create(
        &self,
        options: &TreeDisplayOptions,
        class_filter: Option<&ClassDefinition>,
    ) -> Box<dyn RootPathsTree + '_> {
        Box::new(GcRootPathsTree::new(
            self,
            options.clone(),
            class_filter.cloned(),
        ))
    }
}

impl std::fmt::Debug for HeapGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapGraph")
            .field("classes", &self.classes.len())
            .field("objects", &self.objects.len())
            .field("roots", &self.roots)
            .finish()
    }
}
