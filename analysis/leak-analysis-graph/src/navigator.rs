//! Cursor over a `HeapGraph`.

use crate::heap::HeapGraph;
use leak_analysis_common::{
    AnalysisError, ClassDefinition, ClassStore, ObjectId, ObjectNavigator, ReferenceResolution,
};

/// Stateful cursor positioned on one node of a `HeapGraph` at a time.
pub struct HeapNavigator<'g> {
    graph: &'g HeapGraph,
    current: ObjectId,
    resolution: ReferenceResolution,
}

impl<'g> HeapNavigator<'g> {
    pub fn new(graph: &'g HeapGraph) -> Self {
        Self {
            graph,
            current: ObjectId::NULL,
            resolution: ReferenceResolution::OnlyStrongReferences,
        }
    }

    pub fn resolution(&self) -> ReferenceResolution {
        self.resolution
    }
}

impl ObjectNavigator for HeapNavigator<'_> {
    fn class_store(&self) -> &dyn ClassStore {
        self.graph
    }

    fn goto_id(&mut self, id: ObjectId, resolution: ReferenceResolution) {
        self.current = if self.graph.contains(id) {
            id
        } else {
            ObjectId::NULL
        };
        self.resolution = resolution;
    }

    fn goto_static_field(&mut self, class_name: &str, field: &str) -> Result<(), AnalysisError> {
        let class = self
            .graph
            .class_by_name(class_name)
            .ok_or_else(|| AnalysisError::UnknownClass(class_name.to_string()))?;
        let value = class
            .static_fields
            .get(field)
            .copied()
            .ok_or_else(|| AnalysisError::FieldNotFound {
                class: class_name.to_string(),
                field: field.to_string(),
            })?;
        self.goto_id(value, self.resolution);
        Ok(())
    }

    fn goto_instance_field(
        &mut self,
        class_name: &str,
        field: &str,
    ) -> Result<(), AnalysisError> {
        let value = self.instance_field_object_id(class_name, field)?;
        self.goto_id(value, self.resolution);
        Ok(())
    }

    fn instance_field_object_id(
        &self,
        class_name: &str,
        field: &str,
    ) -> Result<ObjectId, AnalysisError> {
        if self.current.is_null() {
            return Err(AnalysisError::NullObject(format!(
                "reading {class_name}.{field}"
            )));
        }

        let Some(object) = self.graph.object(self.current) else {
            return Err(AnalysisError::ClassMismatch {
                expected: class_name.to_string(),
                actual: "java.lang.Class".to_string(),
            });
        };

        if !self.graph.is_instance_of(object.class_id, class_name) {
            let actual = self
                .graph
                .class_of(self.current)
                .map(|class| class.name().to_string())
                .unwrap_or_default();
            return Err(AnalysisError::ClassMismatch {
                expected: class_name.to_string(),
                actual,
            });
        }

        object
            .fields
            .get(field)
            .copied()
            .ok_or_else(|| AnalysisError::FieldNotFound {
                class: class_name.to_string(),
                field: field.to_string(),
            })
    }

    fn is_null(&self) -> bool {
        self.current.is_null()
    }

    fn current_id(&self) -> ObjectId {
        self.current
    }

    fn current_class(&self) -> Result<ClassDefinition, AnalysisError> {
        if self.current.is_null() {
            return Err(AnalysisError::NullObject("resolving its class".to_string()));
        }
        self.class_for_object_id(self.current)
    }

    fn class_for_object_id(&self, id: ObjectId) -> Result<ClassDefinition, AnalysisError> {
        self.graph
            .class_of(id)
            .cloned()
            .ok_or(AnalysisError::UnknownObject(id))
    }

    fn referenced_ids(&self) -> Vec<ObjectId> {
        if let Some(object) = self.graph.object(self.current) {
            let is_array = !object.elements.is_empty()
                || self
                    .graph
                    .class(object.class_id)
                    .is_some_and(|class| class.definition.is_array());
            if is_array {
                return object.elements.clone();
            }
        }

        let include_weak = self.resolution == ReferenceResolution::AllReferences;
        self.graph
            .labeled_references(self.current, include_weak)
            .into_iter()
            .map(|(_, target)| target)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::HeapGraphBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_navigates_static_and_instance_fields() {
        let mut builder = HeapGraphBuilder::new();
        let holder = builder.class("com.example.Holder");
        let node_class = builder.class("com.example.Node");
        let node = builder.object(node_class, 2);
        let next = builder.object(node_class, 2);
        builder.set_field(node, "next", next);
        builder.set_static(holder, "HEAD", node);
        let graph = builder.build().unwrap();
        let mut nav = graph.navigator();

        nav.goto_static_field("com.example.Holder", "HEAD").unwrap();
        assert_eq!(nav.current_id(), node);

        nav.goto_instance_field("com.example.Node", "next").unwrap();
        assert_eq!(nav.current_id(), next);
        assert_eq!(nav.current_class().unwrap().name(), "com.example.Node");
    }

    #[test]
    fn test_instance_field_on_wrong_class_is_an_error() {
        let mut builder = HeapGraphBuilder::new();
        let a = builder.class("com.example.A");
        builder.class("com.example.B");
        let object = builder.object(a, 1);
        let graph = builder.build().unwrap();
        let mut nav = graph.navigator();
        nav.goto_id(object, ReferenceResolution::OnlyStrongReferences);

        let err = nav.goto_instance_field("com.example.B", "field").unwrap_err();

        assert_eq!(
            err,
            AnalysisError::ClassMismatch {
                expected: "com.example.B".to_string(),
                actual: "com.example.A".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_id_positions_on_null() {
        let graph = HeapGraphBuilder::new().build().unwrap();
        let mut nav = graph.navigator();

        nav.goto_id(ObjectId(77), ReferenceResolution::AllReferences);

        assert!(nav.is_null());
        assert!(nav.referenced_ids().is_empty());
        assert!(matches!(
            nav.instance_field_object_id("com.example.A", "f"),
            Err(AnalysisError::NullObject(_))
        ));
    }

    #[test]
    fn test_referenced_ids_depend_on_resolution() {
        let mut builder = HeapGraphBuilder::new();
        let weak = builder.weak_class("java.lang.ref.WeakReference");
        let target_class = builder.class("com.example.Target");
        let target = builder.object(target_class, 1);
        let reference = builder.object(weak, 1);
        builder.set_field(reference, "referent", target);
        let graph = builder.build().unwrap();
        let mut nav = graph.navigator();

        nav.goto_id(reference, ReferenceResolution::OnlyStrongReferences);
        assert_eq!(nav.resolution(), ReferenceResolution::OnlyStrongReferences);
        assert!(nav.referenced_ids().is_empty());

        nav.goto_id(reference, ReferenceResolution::AllReferences);
        assert_eq!(nav.resolution(), ReferenceResolution::AllReferences);
        assert_eq!(nav.referenced_ids(), vec![target]);
    }

    #[test]
    fn test_array_elements_keep_null_slots() {
        let mut builder = HeapGraphBuilder::new();
        let array_class = builder.class("[Ljava.lang.Object;");
        let element_class = builder.class("java.lang.Object");
        let element = builder.object(element_class, 1);
        let array = builder.array(array_class, &[ObjectId::NULL, element]);
        let graph = builder.build().unwrap();
        let mut nav = graph.navigator();

        nav.goto_id(array, ReferenceResolution::OnlyStrongReferences);

        assert_eq!(nav.referenced_ids(), vec![ObjectId::NULL, element]);
    }
}
