// analysis/leak-analysis-common/src/lib.rs

pub mod error;
pub mod traits;
pub mod types;

pub use error::AnalysisError;
pub use traits::{ClassStore, ObjectNavigator, RootPathsTree, RootPathsTreeFactory};
pub use types::{
    ClassDefinition, DominatorNode, ObjectId, ParentList, ReferenceResolution, TreeDisplayOptions,
};
