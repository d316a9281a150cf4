//! An indexed, in-memory heap snapshot.
//!
//! `HeapGraph` is the reference implementation of the collaborators the leak
//! analyzers consume: it is a `ClassStore`, hands out `HeapNavigator`
//! cursors, computes the whole-heap `ParentList`, and builds dominator-based
//! `GcRootPathsTree`s.
//!
//! Class objects are nodes of the graph too. Their static fields are strong
//! edges and every class is treated as a GC root, next to the snapshot's
//! explicit roots.

mod dominators;
mod error;
mod heap;
mod navigator;
mod reachability;
mod root_paths;
pub mod snapshot;

pub use dominators::DominatorIndex;
pub use error::GraphError;
pub use heap::{HeapClass, HeapGraph, HeapObject};
pub use navigator::HeapNavigator;
pub use reachability::Reachability;
pub use root_paths::GcRootPathsTree;
pub use snapshot::{ClassRecord, HeapGraphBuilder, ObjectRecord, SnapshotFile};
