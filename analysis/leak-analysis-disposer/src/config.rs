// analysis/leak-analysis-disposer/src/config.rs

use leak_analysis_common::TreeDisplayOptions;
use serde::{Deserialize, Serialize};

/// Configuration for disposer analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisposerConfig {
    /// Disposer tree nodes deeper than this are not descended into.
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: usize,

    /// Bytes per snapshot word, used to turn retained sizes into bytes.
    #[serde(default = "default_word_size_bytes")]
    pub word_size_bytes: u64,

    /// Classes reported before all others, whatever their count or size.
    #[serde(default = "default_top_reported_classes")]
    pub top_reported_classes: Vec<String>,

    #[serde(default = "default_true")]
    pub include_disposed_objects_summary: bool,

    #[serde(default = "default_true")]
    pub include_disposed_objects_details: bool,

    /// Shape of the per-class GC-root path trees in the details section.
    #[serde(default)]
    pub details_tree_display_options: TreeDisplayOptions,

    #[serde(default)]
    pub limits: ReportLimits,

    #[serde(default)]
    pub layout: DisposerLayout,
}

fn default_max_tree_depth() -> usize {
    200
}

fn default_word_size_bytes() -> u64 {
    4
}

fn default_top_reported_classes() -> Vec<String> {
    vec!["com.intellij.openapi.project.impl.ProjectImpl".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for DisposerConfig {
    fn default() -> Self {
        Self {
            max_tree_depth: default_max_tree_depth(),
            word_size_bytes: default_word_size_bytes(),
            top_reported_classes: default_top_reported_classes(),
            include_disposed_objects_summary: true,
            include_disposed_objects_details: true,
            details_tree_display_options: TreeDisplayOptions::default(),
            limits: ReportLimits::default(),
            layout: DisposerLayout::default(),
        }
    }
}

/// Maximum number of lines per report section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportLimits {
    pub disposer_tree_lines: usize,
    pub disposer_tree_lines_per_root: usize,
    pub summary_lines: usize,
    pub dominator_summary_lines: usize,
    pub details_lines: usize,
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            disposer_tree_lines: 400,
            disposer_tree_lines_per_root: 100,
            summary_lines: 100,
            dominator_summary_lines: 30,
            details_lines: 700,
        }
    }
}

/// Class and field names of the disposer registry in the analyzed application.
///
/// The registry is a static `ObjectTree` whose `ObjectNode`s form the
/// disposer tree and whose weak map keeps the already disposed objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisposerLayout {
    pub registry_class: String,
    pub tree_field: String,

    pub object_tree_class: String,
    pub root_node_field: String,
    pub disposed_objects_field: String,

    pub object_node_class: String,
    pub object_field: String,
    pub children_field: String,

    /// Children collection class meaning "no children".
    pub empty_list_class: String,
    pub smart_list_class: String,
    /// Holds either one child node or an array of them.
    pub smart_list_element_field: String,

    pub weak_map_class: String,
    pub weak_map_field: String,
    pub ref_map_class: String,
    pub ref_map_keys_field: String,
    pub weak_key_class: String,
    pub referent_field: String,
}

impl Default for DisposerLayout {
    fn default() -> Self {
        Self {
            registry_class: "com.intellij.openapi.util.Disposer".to_string(),
            tree_field: "ourTree".to_string(),
            object_tree_class: "com.intellij.openapi.util.ObjectTree".to_string(),
            root_node_field: "myRootNode".to_string(),
            disposed_objects_field: "myDisposedObjects".to_string(),
            object_node_class: "com.intellij.openapi.util.ObjectNode".to_string(),
            object_field: "myObject".to_string(),
            children_field: "myChildren".to_string(),
            empty_list_class: "java.util.Collections$EmptyList".to_string(),
            smart_list_class: "com.intellij.util.SmartList".to_string(),
            smart_list_element_field: "myElem".to_string(),
            weak_map_class: "com.intellij.util.containers.WeakHashMap".to_string(),
            weak_map_field: "myMap".to_string(),
            ref_map_class: "com.intellij.util.containers.RefHashMap$MyMap".to_string(),
            ref_map_keys_field: "keys".to_string(),
            weak_key_class: "com.intellij.util.containers.WeakHashMap$WeakKey".to_string(),
            referent_field: "referent".to_string(),
        }
    }
}
