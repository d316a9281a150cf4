//! Serializable snapshot description and a builder for assembling one in code.

use crate::error::GraphError;
use crate::heap::HeapGraph;
use leak_analysis_common::ObjectId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A heap snapshot as an object graph.
///
/// Ids must be dense: the parent list is indexed by id, so snapshots whose
/// largest id exceeds 16 per node (or 65536, whichever is larger) are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub classes: Vec<ClassRecord>,

    #[serde(default)]
    pub objects: Vec<ObjectRecord>,

    /// Explicit GC roots, in addition to every class.
    #[serde(default)]
    pub roots: Vec<ObjectId>,
}

/// One class of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub id: ObjectId,

    /// Fully-qualified name, e.g. `java.util.ArrayList` or `[Ljava.lang.Object;`.
    pub name: String,

    #[serde(default)]
    pub super_class: Option<ObjectId>,

    /// Instances hold their `referent` field weakly.
    #[serde(default)]
    pub weak: bool,

    #[serde(default)]
    pub static_fields: BTreeMap<String, ObjectId>,
}

/// One object of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: ObjectId,
    pub class: ObjectId,

    /// Shallow size in snapshot words.
    #[serde(default)]
    pub size: u64,

    /// Reference-typed instance fields.
    #[serde(default)]
    pub fields: BTreeMap<String, ObjectId>,

    /// Elements of an object array.
    #[serde(default)]
    pub elements: Vec<ObjectId>,
}

impl SnapshotFile {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builds a `HeapGraph` in code, allocating dense ids starting at 1.
///
/// ```ignore
/// let mut builder = HeapGraphBuilder::new();
/// let holder = builder.class("com.example.Holder");
/// let cache = builder.object(holder, 4);
/// builder.set_static(holder, "INSTANCE", cache);
/// let graph = builder.build()?;
/// ```
#[derive(Debug, Default)]
pub struct HeapGraphBuilder {
    snapshot: SnapshotFile,
    class_index: FxHashMap<ObjectId, usize>,
    object_index: FxHashMap<ObjectId, usize>,
    next_id: u64,
    error: Option<GraphError>,
}

/// Array header size, in words, used for arrays created by the builder.
const ARRAY_HEADER_WORDS: u64 = 4;

impl HeapGraphBuilder {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn class(&mut self, name: &str) -> ObjectId {
        self.add_class(name, None, false)
    }

    pub fn subclass(&mut self, name: &str, super_class: ObjectId) -> ObjectId {
        self.add_class(name, Some(super_class), false)
    }

    /// A class whose instances hold `referent` weakly.
    pub fn weak_class(&mut self, name: &str) -> ObjectId {
        self.add_class(name, None, true)
    }

    fn add_class(&mut self, name: &str, super_class: Option<ObjectId>, weak: bool) -> ObjectId {
        let id = self.allocate_id();
        self.class_index.insert(id, self.snapshot.classes.len());
        self.snapshot.classes.push(ClassRecord {
            id,
            name: name.to_string(),
            super_class,
            weak,
            static_fields: BTreeMap::new(),
        });
        id
    }

    pub fn object(&mut self, class: ObjectId, size: u64) -> ObjectId {
        let id = self.allocate_id();
        self.object_index.insert(id, self.snapshot.objects.len());
        self.snapshot.objects.push(ObjectRecord {
            id,
            class,
            size,
            fields: BTreeMap::new(),
            elements: Vec::new(),
        });
        id
    }

    pub fn array(&mut self, class: ObjectId, elements: &[ObjectId]) -> ObjectId {
        let id = self.object(class, ARRAY_HEADER_WORDS + elements.len() as u64);
        self.set_elements(id, elements);
        id
    }

    pub fn set_field(&mut self, object: ObjectId, field: &str, value: ObjectId) -> &mut Self {
        match self.object_index.get(&object) {
            Some(&idx) => {
                self.snapshot.objects[idx]
                    .fields
                    .insert(field.to_string(), value);
            }
            None => self.fail(object),
        }
        self
    }

    pub fn set_elements(&mut self, object: ObjectId, elements: &[ObjectId]) -> &mut Self {
        match self.object_index.get(&object) {
            Some(&idx) => self.snapshot.objects[idx].elements = elements.to_vec(),
            None => self.fail(object),
        }
        self
    }

    pub fn set_static(&mut self, class: ObjectId, field: &str, value: ObjectId) -> &mut Self {
        match self.class_index.get(&class) {
            Some(&idx) => {
                self.snapshot.classes[idx]
                    .static_fields
                    .insert(field.to_string(), value);
            }
            None => self.fail(class),
        }
        self
    }

    pub fn root(&mut self, object: ObjectId) -> &mut Self {
        self.snapshot.roots.push(object);
        self
    }

    fn fail(&mut self, id: ObjectId) {
        if self.error.is_none() {
            self.error = Some(GraphError::UnknownObject(id));
        }
    }

    /// The snapshot description assembled so far.
    pub fn snapshot(&self) -> &SnapshotFile {
        &self.snapshot
    }

    pub fn build(self) -> Result<HeapGraph, GraphError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        HeapGraph::from_snapshot(self.snapshot)
    }
}
