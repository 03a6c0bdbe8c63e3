use std::sync::Arc;

use anyhow::{anyhow, bail};

use crate::{
	binary::BinaryVariant,
	component::{ComponentKind, LogicalComponent}, //
	unit::BuildUnit,
};

/// Called once for every finalized binary of a matching component.
pub type BinaryFinalizedListener = Arc<dyn Fn(&Arc<LogicalComponent>, &Arc<BinaryVariant>) -> anyhow::Result<()> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BinaryId {
	component: usize,
	slot: usize,
}

enum BinarySlot {
	Pending(BinaryVariant),
	Finalized(Arc<BinaryVariant>),
}

struct ComponentEntry {
	component: Arc<LogicalComponent>,
	binaries: Vec<BinarySlot>,
}

/// Components of one build unit and the lifecycle of their binaries.
///
/// Binaries are added as pending, may be changed while pending, and are announced to listeners
/// only once finalized.
pub struct BuildGraph {
	unit: Arc<BuildUnit>,
	components: Vec<ComponentEntry>,
	listeners: Vec<(ComponentKind, BinaryFinalizedListener)>,
}

impl BuildGraph {
	pub fn new(unit: Arc<BuildUnit>) -> Self {
		BuildGraph { unit, components: Vec::new(), listeners: Vec::new() }
	}

	pub fn unit(&self) -> &Arc<BuildUnit> {
		&self.unit
	}

	pub fn add_component(&mut self, name: &str, kind: ComponentKind) -> anyhow::Result<Arc<LogicalComponent>> {
		if self.components.iter().any(|x| x.component.name == name) {
			bail!("Component '{}' is already defined in unit '{}'", name, self.unit.path);
		}
		let component = Arc::new(LogicalComponent::new(name, self.unit.path.clone(), kind));
		self.components.push(ComponentEntry { component: component.clone(), binaries: Vec::new() });
		Ok(component)
	}

	fn component_index(&self, name: &str) -> anyhow::Result<usize> {
		self.components
			.iter()
			.position(|x| x.component.name == name)
			.ok_or_else(|| anyhow!("No component '{}' in unit '{}'", name, self.unit.path))
	}

	/// Adds a pending binary to `component`.
	pub fn add_binary(&mut self, component: &str, binary: BinaryVariant) -> anyhow::Result<BinaryId> {
		let index = self.component_index(component)?;
		let binaries = &mut self.components[index].binaries;
		binaries.push(BinarySlot::Pending(binary));
		Ok(BinaryId { component: index, slot: binaries.len() - 1 })
	}

	/// The binary while it is still pending. `None` once it has been finalized.
	pub fn binary_mut(&mut self, id: BinaryId) -> Option<&mut BinaryVariant> {
		match self.components.get_mut(id.component)?.binaries.get_mut(id.slot)? {
			BinarySlot::Pending(binary) => Some(binary),
			BinarySlot::Finalized(_) => None,
		}
	}

	/// Freezes a binary and notifies listeners. Finalizing twice is a no-op.
	pub fn finalize(&mut self, id: BinaryId) -> anyhow::Result<()> {
		let entry = self
			.components
			.get_mut(id.component)
			.ok_or_else(|| anyhow!("Unknown binary {:?}", id))?;
		let slot = entry.binaries.get_mut(id.slot).ok_or_else(|| anyhow!("Unknown binary {:?}", id))?;
		let binary = match slot {
			BinarySlot::Finalized(_) => return Ok(()),
			BinarySlot::Pending(binary) => Arc::new(binary.clone()),
		};
		*slot = BinarySlot::Finalized(binary.clone());
		let component = entry.component.clone();

		log::debug!("Finalized {} binary of {}", binary.configuration, component);
		for (kind, listener) in &self.listeners {
			if *kind == component.kind {
				listener(&component, &binary)?;
			}
		}
		Ok(())
	}

	/// Finalizes every pending binary, in component then insertion order.
	pub fn finalize_all(&mut self) -> anyhow::Result<()> {
		for component in 0..self.components.len() {
			for slot in 0..self.components[component].binaries.len() {
				self.finalize(BinaryId { component, slot })?;
			}
		}
		Ok(())
	}

	/// Subscribes to finalized binaries of components of `kind`. Binaries finalized before the
	/// subscription are delivered immediately.
	pub fn when_binary_finalized(&mut self, kind: ComponentKind, listener: BinaryFinalizedListener) -> anyhow::Result<()> {
		for entry in self.components.iter().filter(|x| x.component.kind == kind) {
			for slot in &entry.binaries {
				if let BinarySlot::Finalized(binary) = slot {
					listener(&entry.component, binary)?;
				}
			}
		}
		self.listeners.push((kind, listener));
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::link_type::BinaryOutput;
	use std::sync::Mutex;

	fn recorder() -> (Arc<Mutex<Vec<String>>>, BinaryFinalizedListener) {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = seen.clone();
		let listener: BinaryFinalizedListener = Arc::new(move |component: &Arc<LogicalComponent>, binary: &Arc<BinaryVariant>| {
			sink.lock().unwrap().push(format!("{}:{}", component.name, binary.configuration));
			Ok(())
		});
		(seen, listener)
	}

	#[test]
	fn pending_binaries_are_not_announced() {
		let mut graph = BuildGraph::new(Arc::new(BuildUnit::root("demo", "/src/demo")));
		let (seen, listener) = recorder();
		graph.when_binary_finalized(ComponentKind::Application, listener).unwrap();
		graph.add_component("game", ComponentKind::Application).unwrap();
		let id = graph.add_binary("game", BinaryVariant::new("debug", "x86-64", BinaryOutput::Executable)).unwrap();
		assert!(seen.lock().unwrap().is_empty());

		graph.binary_mut(id).unwrap().defines.push("LATE".to_owned());
		graph.finalize(id).unwrap();
		graph.finalize(id).unwrap();
		assert_eq!(*seen.lock().unwrap(), vec!["game:debug"]);
		assert!(graph.binary_mut(id).is_none());
	}

	#[test]
	fn late_subscribers_see_finalized_binaries() {
		let mut graph = BuildGraph::new(Arc::new(BuildUnit::root("demo", "/src/demo")));
		graph.add_component("core", ComponentKind::Library).unwrap();
		graph.add_component("game", ComponentKind::Application).unwrap();
		graph.add_binary("core", BinaryVariant::new("debug", "x86-64", BinaryOutput::SharedLibrary)).unwrap();
		graph.add_binary("game", BinaryVariant::new("debug", "x86-64", BinaryOutput::Executable)).unwrap();
		graph.finalize_all().unwrap();

		let (seen, listener) = recorder();
		graph.when_binary_finalized(ComponentKind::Library, listener).unwrap();
		assert_eq!(*seen.lock().unwrap(), vec!["core:debug"]);
	}

	#[test]
	fn unknown_and_duplicate_components_are_errors() {
		let mut graph = BuildGraph::new(Arc::new(BuildUnit::root("demo", "/src/demo")));
		graph.add_component("core", ComponentKind::Library).unwrap();
		assert!(graph.add_component("core", ComponentKind::Library).is_err());
		assert!(graph.add_binary("nope", BinaryVariant::new("debug", "x86", BinaryOutput::Objects)).is_err());
	}
}
