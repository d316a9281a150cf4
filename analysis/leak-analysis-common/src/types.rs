// analysis/leak-analysis-common/src/types.rs

//! Core value types shared by the snapshot collaborators and the analyzers.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identifier of one object in a heap snapshot.
///
/// `0` is reserved for the null reference.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// The absent/null reference.
    pub const NULL: ObjectId = ObjectId(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for ObjectId {
    fn from(id: u64) -> Self {
        ObjectId(id)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A runtime type in the snapshot.
///
/// Identity is the id of the class object: two definitions are equal iff
/// they describe the same class object, whatever their names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDefinition {
    id: ObjectId,
    name: Arc<str>,
}

impl ClassDefinition {
    pub fn new(id: ObjectId, name: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Fully-qualified name as recorded in the snapshot.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_array(&self) -> bool {
        self.name.starts_with('[') || self.name.ends_with("[]")
    }

    /// Human readable name. JVM array descriptors such as
    /// `[Ljava.lang.String;` become `java.lang.String[]`.
    pub fn pretty_name(&self) -> String {
        let dimensions = self.name.chars().take_while(|c| *c == '[').count();
        if dimensions == 0 {
            return self.name.to_string();
        }

        let element = &self.name[dimensions..];
        let element = match element {
            "Z" => "boolean",
            "B" => "byte",
            "C" => "char",
            "S" => "short",
            "I" => "int",
            "J" => "long",
            "F" => "float",
            "D" => "double",
            other => other
                .strip_prefix('L')
                .and_then(|rest| rest.strip_suffix(';'))
                .unwrap_or(other),
        };

        let mut pretty = String::with_capacity(element.len() + dimensions * 2);
        pretty.push_str(element);
        for _ in 0..dimensions {
            pretty.push_str("[]");
        }
        pretty
    }

    /// Pretty name with the package stripped: `com.foo.Bar$Baz` → `Bar$Baz`.
    pub fn short_pretty_name(&self) -> String {
        let pretty = self.pretty_name();
        match pretty.rfind('.') {
            Some(idx) => pretty[idx + 1..].to_string(),
            None => pretty,
        }
    }
}

impl PartialEq for ClassDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClassDefinition {}

impl Hash for ClassDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for ClassDefinition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClassDefinition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for ClassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Which outgoing references a navigator reports for the current object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceResolution {
    /// Skip weak/soft referents.
    #[default]
    OnlyStrongReferences,
    /// Report every reference, including weak/soft referents.
    AllReferences,
}

/// Result of a whole-heap reachability pass.
///
/// Indexed by object id; a non-zero entry means the object has at least one
/// strong incoming reference on a path from a GC root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParentList(Vec<u64>);

impl ParentList {
    pub fn new(parents: Vec<u64>) -> Self {
        Self(parents)
    }

    /// Recorded parent of `id`, `0` when there is none or `id` is out of range.
    pub fn get(&self, id: ObjectId) -> u64 {
        usize::try_from(id.0)
            .ok()
            .and_then(|idx| self.0.get(idx))
            .copied()
            .unwrap_or(0)
    }

    pub fn has_parent(&self, id: ObjectId) -> bool {
        self.get(id) != 0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u64>> for ParentList {
    fn from(parents: Vec<u64>) -> Self {
        Self(parents)
    }
}

/// A group of leaked instances retained through one dominating object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DominatorNode {
    pub instances: Vec<ObjectId>,

    /// Retained sub-graph size, in snapshot words.
    pub total_size_in_words: u64,
}

/// Shape limits for rendering a root-paths tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeDisplayOptions {
    /// Maximum number of levels printed below a GC root.
    pub max_depth: usize,

    /// Maximum number of children printed per node; the rest are summarized.
    pub max_width: usize,

    /// Children covering less than this share of their parent's instances are hidden.
    pub min_percent: u32,
}

impl TreeDisplayOptions {
    /// No limits at all.
    pub fn all() -> Self {
        Self {
            max_depth: usize::MAX,
            max_width: usize::MAX,
            min_percent: 0,
        }
    }
}

impl Default for TreeDisplayOptions {
    fn default() -> Self {
        Self {
            max_depth: 40,
            max_width: 3,
            min_percent: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pretty_name_for_array_descriptors() {
        let strings = ClassDefinition::new(ObjectId(1), "[Ljava.lang.String;");
        let ints = ClassDefinition::new(ObjectId(2), "[[I");
        let plain = ClassDefinition::new(ObjectId(3), "com.example.Foo$Bar");

        assert_eq!(strings.pretty_name(), "java.lang.String[]");
        assert_eq!(ints.pretty_name(), "int[][]");
        assert_eq!(plain.pretty_name(), "com.example.Foo$Bar");
        assert!(strings.is_array());
        assert!(!plain.is_array());
    }

    #[test]
    fn test_short_pretty_name_strips_package() {
        let class = ClassDefinition::new(ObjectId(1), "[Lcom.example.Foo;");
        assert_eq!(class.short_pretty_name(), "Foo[]");

        let class = ClassDefinition::new(ObjectId(2), "Unpackaged");
        assert_eq!(class.short_pretty_name(), "Unpackaged");
    }

    #[test]
    fn test_class_identity_is_the_class_object_id() {
        let a = ClassDefinition::new(ObjectId(7), "com.example.A");
        let renamed = ClassDefinition::new(ObjectId(7), "com.example.Renamed");
        let other = ClassDefinition::new(ObjectId(8), "com.example.A");

        assert_eq!(a, renamed);
        assert_ne!(a, other);
    }

    #[test]
    fn test_parent_list_out_of_range_reads_as_no_parent() {
        let parents = ParentList::new(vec![0, 0, 5]);

        assert!(parents.has_parent(ObjectId(2)));
        assert!(!parents.has_parent(ObjectId(1)));
        assert!(!parents.has_parent(ObjectId(100)));
        assert_eq!(parents.get(ObjectId(2)), 5);
    }

    #[test]
    fn test_object_id_serializes_transparently() {
        let json = serde_json::to_string(&vec![ObjectId(3), ObjectId::NULL]).unwrap();
        assert_eq!(json, "[3,0]");
    }
}
