//! Disposed-object leak analysis over heap snapshots.
//!
//! Applications built on a disposer registry keep every live disposable in a
//! parent/child tree and move disposed objects into a weak map. An object
//! that was disposed but still has a strong path from a GC root is a leak.
//!
//! The analysis runs in four stages over an [`ObjectNavigator`]:
//! 1. Walk the disposer tree and aggregate instance counts per
//!    `(class, parent class, root class)`
//! 2. Find disposed objects that still have a strong parent
//! 3. Group the leaked objects by their top-most leaked dominator
//! 4. Render a size-bounded report, most important classes first
//!
//! # Example
//!
//! ```ignore
//! use leak_analysis_disposer::{DisposerAnalyzer, DisposerConfig};
//! use leak_analysis_graph::{HeapGraph, SnapshotFile};
//!
//! let graph = HeapGraph::from_snapshot(SnapshotFile::load("heap.json".as_ref())?)?;
//! let parents = graph.parent_list();
//!
//! let analyzer = DisposerAnalyzer::new(DisposerConfig::default());
//! let report = analyzer.analyze(&mut graph.navigator(), &parents, &graph)?;
//! print!("{report}");
//! ```

mod buffer;
mod config;
mod detector;
mod dominators;
mod error;
mod format;
mod priority;
mod report;
mod types;
mod walker;

pub use buffer::{LineSink, TruncatingBuffer};
pub use config::{DisposerConfig, DisposerLayout, ReportLimits};
pub use detector::compute_disposed_object_ids;
pub use dominators::collect_dominator_summary;
pub use error::Error;
pub use format::{count_short, padded_size_short, size_short};
pub use priority::order_for_detailed_report;
pub use report::{
    format_disposer_tree_line, leaked_instances_by_class, prepare_disposed_objects_section,
    prepare_disposer_tree_section,
};
pub use types::*;
pub use walker::walk_disposer_tree;

use leak_analysis_common::{ObjectNavigator, ParentList, RootPathsTreeFactory};
use std::time::Instant;
use tracing::info;

/// Runs the disposer analysis with one configuration.
#[derive(Debug, Clone, Default)]
pub struct DisposerAnalyzer {
    config: DisposerConfig,
}

impl DisposerAnalyzer {
    pub fn new(config: DisposerConfig) -> Self {
        Self { config }
    }

    /// Full report: the disposer tree section followed by the disposed
    /// objects section.
    ///
    /// Returns an empty report when the snapshot has no disposer registry.
    /// Fails without a partial report when the registry's tree is null.
    pub fn analyze(
        &self,
        nav: &mut dyn ObjectNavigator,
        parent_list: &ParentList,
        trees: &dyn RootPathsTreeFactory,
    ) -> Result<String, Error> {
        let start = Instant::now();
        let registry = &self.config.layout.registry_class;

        if !nav.class_store().contains_class(registry) {
            info!(class = %registry, "No disposer registry in snapshot, nothing to report");
            return Ok(String::new());
        }

        info!(class = %registry, "Starting disposer analysis");

        let mut report = self.prepare_disposer_tree_section(nav)?;
        let leaked = compute_disposed_object_ids(nav, parent_list, &self.config)?;
        report.push_str(&prepare_disposed_objects_section(
            nav,
            &leaked,
            trees,
            &self.config,
        )?);

        info!(
            leaked = leaked.len(),
            report_bytes = report.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Disposer analysis complete"
        );
        Ok(report)
    }

    /// Only the disposer tree section.
    pub fn prepare_disposer_tree_section(
        &self,
        nav: &mut dyn ObjectNavigator,
    ) -> Result<String, Error> {
        let stats = walk_disposer_tree(nav, &self.config)?;
        Ok(prepare_disposer_tree_section(
            &stats,
            nav.class_store(),
            &self.config.limits,
        ))
    }

    /// Only the disposed objects section.
    pub fn prepare_disposed_objects_section(
        &self,
        nav: &mut dyn ObjectNavigator,
        parent_list: &ParentList,
        trees: &dyn RootPathsTreeFactory,
    ) -> Result<String, Error> {
        let leaked = compute_disposed_object_ids(nav, parent_list, &self.config)?;
        prepare_disposed_objects_section(nav, &leaked, trees, &self.config)
    }
}
