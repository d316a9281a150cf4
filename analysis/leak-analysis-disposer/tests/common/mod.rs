//! Shared test utilities

#![allow(dead_code)]

use leak_analysis_common::ObjectId;
use leak_analysis_graph::{HeapGraph, HeapGraphBuilder};
use rustc_hash::FxHashMap;

pub const PROJECT_CLASS: &str = "com.intellij.openapi.project.impl.ProjectImpl";

/// Builds snapshots with the disposer registry layout: a static
/// `Disposer.ourTree` whose `ObjectNode`s keep registered objects, and a weak
/// map of disposed objects.
pub struct DisposerHeap {
    builder: HeapGraphBuilder,
    object_node_class: ObjectId,
    smart_list_class: ObjectId,
    node_array_class: ObjectId,
    weak_key_class: ObjectId,
    key_array_class: ObjectId,
    holder_class: ObjectId,
    empty_list: ObjectId,
    root_node: ObjectId,
    ref_map: ObjectId,
    node_of: FxHashMap<ObjectId, ObjectId>,
    node_order: Vec<ObjectId>,
    children: FxHashMap<ObjectId, Vec<ObjectId>>,
    disposed_keys: Vec<ObjectId>,
    malformed: Vec<ObjectId>,
    held: usize,
}

impl DisposerHeap {
    pub fn new() -> Self {
        let mut builder = HeapGraphBuilder::new();
        let disposer_class = builder.class("com.intellij.openapi.util.Disposer");
        let object_tree_class = builder.class("com.intellij.openapi.util.ObjectTree");
        let object_node_class = builder.class("com.intellij.openapi.util.ObjectNode");
        let empty_list_class = builder.class("java.util.Collections$EmptyList");
        let smart_list_class = builder.class("com.intellij.util.SmartList");
        let node_array_class = builder.class("[Ljava.lang.Object;");
        let weak_map_class = builder.class("com.intellij.util.containers.WeakHashMap");
        let ref_map_class = builder.class("com.intellij.util.containers.RefHashMap$MyMap");
        let weak_key_class =
            builder.weak_class("com.intellij.util.containers.WeakHashMap$WeakKey");
        let key_array_class = builder.class("[Ljava.lang.ref.Reference;");
        let holder_class = builder.class("com.example.LeakHolder");

        let empty_list = builder.object(empty_list_class, 2);
        let tree = builder.object(object_tree_class, 4);
        let root_node = builder.object(object_node_class, 4);
        let weak_map = builder.object(weak_map_class, 4);
        let ref_map = builder.object(ref_map_class, 4);

        builder
            .set_static(disposer_class, "ourTree", tree)
            .set_field(tree, "myRootNode", root_node)
            .set_field(tree, "myDisposedObjects", weak_map)
            .set_field(root_node, "myObject", ObjectId::NULL)
            .set_field(weak_map, "myMap", ref_map);

        Self {
            builder,
            object_node_class,
            smart_list_class,
            node_array_class,
            weak_key_class,
            key_array_class,
            holder_class,
            empty_list,
            root_node,
            ref_map,
            node_of: FxHashMap::default(),
            node_order: vec![root_node],
            children: FxHashMap::default(),
            disposed_keys: Vec::new(),
            malformed: Vec::new(),
            held: 0,
        }
    }

    pub fn class(&mut self, name: &str) -> ObjectId {
        self.builder.class(name)
    }

    pub fn object(&mut self, class: ObjectId, size: u64) -> ObjectId {
        self.builder.object(class, size)
    }

    pub fn set_field(&mut self, object: ObjectId, field: &str, value: ObjectId) {
        self.builder.set_field(object, field, value);
    }

    /// Register `object` in the disposer tree, under `parent` or at top level.
    pub fn register(&mut self, parent: Option<ObjectId>, object: ObjectId) -> ObjectId {
        let node = self.builder.object(self.object_node_class, 6);
        self.builder.set_field(node, "myObject", object);
        let parent_node = match parent {
            Some(parent) => self.node_of[&parent],
            None => self.root_node,
        };
        self.children.entry(parent_node).or_default().push(node);
        self.node_of.insert(object, node);
        self.node_order.push(node);
        node
    }

    /// Append a raw child node id under the node of `parent`.
    pub fn add_child_node(&mut self, parent: ObjectId, node: ObjectId) {
        let parent_node = self.node_of[&parent];
        self.children.entry(parent_node).or_default().push(node);
    }

    /// Make the children collection of `object`'s node something that is
    /// not a list.
    pub fn break_children(&mut self, object: ObjectId) {
        let node = self.node_of[&object];
        self.malformed.push(node);
    }

    /// Add `object` to the disposed objects map.
    pub fn dispose(&mut self, object: ObjectId) -> ObjectId {
        let key = self.builder.object(self.weak_key_class, 4);
        self.builder.set_field(key, "referent", object);
        self.disposed_keys.push(key);
        key
    }

    /// Add a cleared key to the disposed objects map.
    pub fn cleared_key(&mut self) -> ObjectId {
        let key = self.builder.object(self.weak_key_class, 4);
        self.builder.set_field(key, "referent", ObjectId::NULL);
        self.disposed_keys.push(key);
        key
    }

    /// Keep `object` strongly reachable from a static field.
    pub fn hold(&mut self, object: ObjectId) {
        let field = format!("leak{}", self.held);
        self.held += 1;
        self.builder.set_static(self.holder_class, &field, object);
    }

    /// Finish the `myChildren` collections and the disposed key array.
    pub fn build(mut self) -> HeapGraph {
        let not_a_list = self.builder.class("com.example.NotAList");
        for node in std::mem::take(&mut self.node_order) {
            let children = self.children.remove(&node).unwrap_or_default();
            let collection = match children.as_slice() {
                _ if self.malformed.contains(&node) => self.builder.object(not_a_list, 2),
                [] => self.empty_list,
                [single] => {
                    let list = self.builder.object(self.smart_list_class, 4);
                    self.builder.set_field(list, "myElem", *single);
                    list
                }
                many => {
                    let array = self.builder.array(self.node_array_class, many);
                    let list = self.builder.object(self.smart_list_class, 4);
                    self.builder.set_field(list, "myElem", array);
                    list
                }
            };
            self.builder.set_field(node, "myChildren", collection);
        }

        let keys = self.builder.array(self.key_array_class, &self.disposed_keys);
        self.builder.set_field(self.ref_map, "keys", keys);
        self.builder.build().unwrap()
    }
}
