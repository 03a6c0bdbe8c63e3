//! Visual Studio project and solution generation for native build models.
//!
//! A [`plugin::VisualStudioBuild`] is applied to the [`host::events::BuildGraph`] of every build
//! unit. It turns finalized binaries into project configurations and registers generation,
//! lifecycle and clean tasks in a shared [`host::tasks::TaskGraph`].

pub mod binary;
pub mod component;
pub mod generator;
pub mod host;
mod index_map;
pub mod link_type;
pub mod manifest;
mod misc;
pub mod plugin;
pub mod project;
pub mod registry;
pub mod solution;
pub mod target;
pub mod unit;

use std::sync::Arc;

use host::{events::BuildGraph, tasks::TaskGraph};
use manifest::BuildTree;
use plugin::VisualStudioBuild;

/// Applies generation to every unit of `tree` and replays the units' components and binaries.
///
/// All units are wired before any binary is finalized, the way a build engine configures
/// plugins before it evaluates components.
pub fn configure(tree: &BuildTree, tasks: Arc<TaskGraph>) -> anyhow::Result<Arc<VisualStudioBuild>> {
	let build = VisualStudioBuild::new(&tree.root().unit, tasks);
	let mut graphs = Vec::new();
	for definition in &tree.units {
		let mut graph = BuildGraph::new(definition.unit.clone());
		build.apply(&mut graph, &definition.settings)?;
		graphs.push(graph);
	}
	for (definition, graph) in tree.units.iter().zip(graphs.iter_mut()) {
		definition.populate(graph)?;
	}
	Ok(build)
}
