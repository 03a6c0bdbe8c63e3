use std::{
	path::{Path, PathBuf},
	sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
	index_map::IndexMap,
	project::ProjectDescriptor,
	target::TargetBinary, //
	unit::BuildUnit,
};

/// Refers to one descriptor of one registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProjectHandle(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registration {
	pub handle: ProjectHandle,
	pub created: bool,
}

/// Component name to project descriptor, for the components of one build unit.
///
/// All access goes through a single lock, so the registry can be fed from any thread. Closures
/// passed to [`read`](Self::read), [`update`](Self::update) and [`for_each`](Self::for_each)
/// run under that lock and must not call back into the same registry.
#[derive(Debug)]
pub struct ProjectRegistry {
	unit: Arc<BuildUnit>,
	project_dir: PathBuf,
	projects: Mutex<IndexMap<ProjectDescriptor>>,
}

impl ProjectRegistry {
	pub fn new(unit: Arc<BuildUnit>, project_dir: impl Into<PathBuf>) -> Self {
		ProjectRegistry { unit, project_dir: project_dir.into(), projects: Mutex::new(IndexMap::new()) }
	}

	fn lock(&self) -> MutexGuard<'_, IndexMap<ProjectDescriptor>> {
		self.projects.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn unit(&self) -> &Arc<BuildUnit> {
		&self.unit
	}

	/// Returns the descriptor of `component_name`, creating an empty one if there is none.
	pub(crate) fn register(&self, component_name: &str) -> Registration {
		let (index, created) = self
			.lock()
			.insert_if_absent(component_name, || ProjectDescriptor::new(component_name, self.unit.clone(), &self.project_dir));
		if created {
			log::debug!("Registered project for component '{}' in unit '{}'", component_name, self.unit.path);
		}
		Registration { handle: ProjectHandle(index), created }
	}

	pub fn lookup(&self, component_name: &str) -> Option<ProjectHandle> {
		self.lock().index_of(component_name).map(ProjectHandle)
	}

	/// # Panics
	///
	/// If `target` belongs to another component than the descriptor, or if a different variant
	/// already occupies the same configuration slot.
	pub(crate) fn add_configuration(&self, project: ProjectHandle, target: Arc<TargetBinary>) {
		self.lock().at_mut(project.0).add_configuration(target);
	}

	/// Registers the component of `target` if needed and adds `target` to it.
	pub(crate) fn add_project_configuration(&self, target: Arc<TargetBinary>) -> Registration {
		let registration = self.register(target.component_name());
		self.add_configuration(registration.handle, target);
		registration
	}

	pub fn add_auxiliary_source(&self, project: ProjectHandle, file: &Path) {
		self.lock().at_mut(project.0).add_auxiliary_source(file);
	}

	pub fn read<R>(&self, project: ProjectHandle, f: impl FnOnce(&ProjectDescriptor) -> R) -> R {
		f(self.lock().at(project.0))
	}

	pub(crate) fn update<R>(&self, project: ProjectHandle, f: impl FnOnce(&mut ProjectDescriptor) -> R) -> R {
		f(self.lock().at_mut(project.0))
	}

	/// Visits every descriptor in registration order.
	pub fn for_each(&self, mut visitor: impl FnMut(ProjectHandle, &ProjectDescriptor)) {
		for (index, project) in self.lock().iter().enumerate() {
			visitor(ProjectHandle(index), project);
		}
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn names(&self) -> Vec<String> {
		self.lock().into_iter().map(|x| x.component_name().to_owned()).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		binary::BinaryVariant,
		component::{ComponentKind, LogicalComponent},
		link_type::BinaryOutput,
		project::ProjectState,
		target::OutputKind,
	};

	fn root() -> Arc<BuildUnit> {
		Arc::new(BuildUnit::root("demo", "/src/demo"))
	}

	fn target(unit: &Arc<BuildUnit>, component: &str, configuration: &str, kind: OutputKind) -> Arc<TargetBinary> {
		let (component_kind, output) = match kind {
			OutputKind::Executable => (ComponentKind::Application, BinaryOutput::Executable),
			OutputKind::SharedLibrary => (ComponentKind::Library, BinaryOutput::SharedLibrary),
			OutputKind::StaticLibrary => (ComponentKind::Library, BinaryOutput::StaticLibrary),
		};
		let component = Arc::new(LogicalComponent::new(component, unit.path.clone(), component_kind));
		let binary = Arc::new(BinaryVariant::new(configuration, "x86-64", output));
		Arc::new(TargetBinary::new(unit.clone(), component, binary, kind))
	}

	#[test]
	fn register_is_lookup_or_create() {
		let registry = ProjectRegistry::new(root(), "/src/demo");
		let first = registry.register("core");
		let second = registry.register("core");
		assert!(first.created);
		assert!(!second.created);
		assert_eq!(first.handle, second.handle);
		assert_eq!(registry.len(), 1);
		assert_eq!(registry.read(first.handle, |p| p.state()), ProjectState::Registered);
	}

	#[test]
	fn registering_twice_merges_configurations() {
		let unit = root();
		let registry = ProjectRegistry::new(unit.clone(), "/src/demo");
		let a = registry.register("core");
		registry.add_configuration(a.handle, target(&unit, "core", "debugShared", OutputKind::SharedLibrary));
		let b = registry.register("core");
		registry.add_configuration(b.handle, target(&unit, "core", "debugStatic", OutputKind::StaticLibrary));

		assert_eq!(registry.names(), vec!["core".to_owned()]);
		let configs = registry.read(a.handle, |p| {
			p.configurations().iter().map(|x| x.configuration_name().to_owned()).collect::<Vec<_>>()
		});
		assert_eq!(configs, vec!["debugShared", "debugStatic"]);
	}

	#[test]
	fn iteration_follows_registration_order() {
		let registry = ProjectRegistry::new(root(), "/src/demo");
		for name in ["zeta", "alpha", "mid", "alpha"] {
			registry.register(name);
		}
		let mut seen = Vec::new();
		registry.for_each(|_, p| seen.push(p.component_name().to_owned()));
		assert_eq!(seen, vec!["zeta", "alpha", "mid"]);
	}

	#[test]
	fn adding_the_same_variant_twice_is_a_no_op() {
		let unit = root();
		let registry = ProjectRegistry::new(unit.clone(), "/src/demo");
		let t = target(&unit, "game", "debug", OutputKind::Executable);
		registry.add_project_configuration(t.clone());
		registry.add_project_configuration(t);
		let handle = registry.lookup("game").unwrap();
		assert_eq!(registry.read(handle, |p| p.configurations().len()), 1);
	}

	#[test]
	fn auxiliary_sources_are_deduplicated() {
		let registry = ProjectRegistry::new(root(), "/src/demo");
		let handle = registry.register("game").handle;
		registry.add_auxiliary_source(handle, Path::new("/src/demo/vsgen.toml"));
		registry.add_auxiliary_source(handle, Path::new("/src/demo/vsgen.toml"));
		assert_eq!(registry.read(handle, |p| p.auxiliary_sources().len()), 1);
	}

	#[test]
	#[should_panic(expected = "added to project of component 'game'")]
	fn rejects_foreign_component() {
		let unit = root();
		let registry = ProjectRegistry::new(unit.clone(), "/src/demo");
		let handle = registry.register("game").handle;
		registry.add_configuration(handle, target(&unit, "core", "debug", OutputKind::SharedLibrary));
	}

	#[test]
	#[should_panic(expected = "already has a configuration 'debug|x64'")]
	fn rejects_two_variants_in_one_slot() {
		let unit = root();
		let registry = ProjectRegistry::new(unit.clone(), "/src/demo");
		registry.add_project_configuration(target(&unit, "core", "debug", OutputKind::SharedLibrary));
		registry.add_project_configuration(target(&unit, "core", "debug", OutputKind::StaticLibrary));
	}

	#[test]
	fn concurrent_registration_keeps_one_descriptor_per_component() {
		let unit = root();
		let registry = Arc::new(ProjectRegistry::new(unit.clone(), "/src/demo"));
		let threads = (0..8)
			.map(|i| {
				let registry = registry.clone();
				let unit = unit.clone();
				std::thread::spawn(move || {
					for component in ["game", "core", "tools"] {
						let configuration = format!("config{}", i);
						registry.add_project_configuration(target(&unit, component, &configuration, OutputKind::StaticLibrary));
					}
				})
			})
			.collect::<Vec<_>>();
		for thread in threads {
			thread.join().unwrap();
		}

		let mut names = registry.names();
		names.sort();
		assert_eq!(names, vec!["core", "game", "tools"]);
		let expected = (0..8).map(|i| format!("config{}", i)).collect::<Vec<_>>();
		registry.for_each(|_, p| {
			let mut configs = p.configurations().iter().map(|x| x.configuration_name().to_owned()).collect::<Vec<_>>();
			configs.sort();
			assert_eq!(configs, expected, "{}", p.component_name());
		});
	}
}
