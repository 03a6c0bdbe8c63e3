//! Wires Visual Studio generation into a build.
//!
//! Every finalized binary becomes a configuration of its component's project. The first
//! configuration of a component creates the project descriptor and binds its generation tasks;
//! later ones only extend the descriptor, which the tasks read when they run.

use std::{
	path::PathBuf,
	sync::{Arc, Mutex, PoisonError},
};

use crate::{
	binary::BinaryVariant,
	component::{ComponentKind, LogicalComponent},
	generator::{FiltersFileTask, ProjectFileTask, SolutionFileTask},
	host::{
		events::{BinaryFinalizedListener, BuildGraph},
		tasks::{Delete, TaskGraph, TaskId, TaskKind},
	},
	link_type::BinaryOutput,
	project::ProjectTasks,
	registry::{ProjectHandle, ProjectRegistry},
	solution::SolutionDescriptor,
	target::{OutputKind, TargetBinary},
	unit::BuildUnit,
};

pub const LIFECYCLE_TASK_NAME: &str = "visualStudio";
pub const CLEAN_TASK_NAME: &str = "cleanVisualStudio";

/// Per-unit settings, read from the `[visual_studio]` table of the manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisualStudioSettings {
	/// Command the generated projects call to build and clean.
	pub build_command: String,
	/// Directory for project files, relative to the unit directory. Defaults to the unit
	/// directory itself.
	pub project_dir: Option<PathBuf>,
}

impl Default for VisualStudioSettings {
	fn default() -> Self {
		VisualStudioSettings { build_command: "vsgen".to_owned(), project_dir: None }
	}
}

/// Classifies a finalized binary of `component`.
///
/// Returns `None` for library binaries that are neither shared nor static, which are left out of
/// the generated projects.
///
/// # Panics
///
/// If an application produced anything but an executable.
pub fn classify(component: &LogicalComponent, binary: &BinaryVariant) -> Option<OutputKind> {
	match (component.kind, binary.output) {
		(ComponentKind::Application, BinaryOutput::Executable) => Some(OutputKind::Executable),
		(ComponentKind::Application, other) => {
			panic!("Binary '{}' of {} is a {}, expected an executable", binary.configuration, component, other)
		}
		(ComponentKind::Library, BinaryOutput::SharedLibrary) => Some(OutputKind::SharedLibrary),
		(ComponentKind::Library, BinaryOutput::StaticLibrary) => Some(OutputKind::StaticLibrary),
		(ComponentKind::Library, _) => None,
	}
}

/// Generation state of one build invocation: a registry per unit and the solution of the tree.
pub struct VisualStudioBuild {
	tasks: Arc<TaskGraph>,
	solution: Arc<SolutionDescriptor>,
	registries: Mutex<Vec<Arc<ProjectRegistry>>>,
}

impl VisualStudioBuild {
	pub fn new(root: &BuildUnit, tasks: Arc<TaskGraph>) -> Arc<Self> {
		Arc::new(VisualStudioBuild {
			tasks,
			solution: Arc::new(SolutionDescriptor::new(root)),
			registries: Mutex::new(Vec::new()),
		})
	}

	pub fn tasks(&self) -> &Arc<TaskGraph> {
		&self.tasks
	}

	pub fn solution(&self) -> &Arc<SolutionDescriptor> {
		&self.solution
	}

	pub fn registry(&self, unit_path: &str) -> Option<Arc<ProjectRegistry>> {
		let registries = self.registries.lock().unwrap_or_else(PoisonError::into_inner);
		registries.iter().find(|x| x.unit().path == unit_path).cloned()
	}

	/// Applies generation to the unit of `graph`: creates the unit's lifecycle and clean tasks,
	/// the solution task for the root unit, and subscribes to the unit's finalized binaries.
	pub fn apply(&self, graph: &mut BuildGraph, settings: &VisualStudioSettings) -> anyhow::Result<Arc<ProjectRegistry>> {
		let unit = graph.unit().clone();
		if self.registry(&unit.path).is_some() {
			anyhow::bail!("Visual Studio generation is already applied to unit '{}'", unit.path);
		}
		let project_dir = match &settings.project_dir {
			Some(dir) => unit.dir.join(dir),
			None => unit.dir.clone(),
		};
		let registry = Arc::new(ProjectRegistry::new(unit.clone(), project_dir));
		self.registries.lock().unwrap_or_else(PoisonError::into_inner).push(registry.clone());
		self.solution.add_registry(registry.clone());

		let lifecycle = self.tasks.maybe_create(&unit, LIFECYCLE_TASK_NAME, TaskKind::Lifecycle)?;
		let clean = Arc::new(Delete::new());
		self.tasks.create(&unit, CLEAN_TASK_NAME, TaskKind::Delete, Some(clean.clone()))?;
		for kind in [TaskKind::GenerateSolution, TaskKind::GenerateFilters, TaskKind::GenerateProject] {
			let clean = clean.clone();
			self.tasks.when_task_added(&unit, kind, move |action| clean.delete_outputs_of(action.clone()));
		}

		if unit.is_root() {
			let solution_task = self.tasks.create(
				&unit,
				&format!("{}VisualStudioSolution", self.solution.name()),
				TaskKind::GenerateSolution,
				Some(Arc::new(SolutionFileTask::new(self.solution.clone()))),
			)?;
			self.tasks.depends_on(lifecycle, solution_task);
		}

		let wiring = Arc::new(UnitWiring {
			unit: unit.clone(),
			registry: registry.clone(),
			tasks: self.tasks.clone(),
			lifecycle,
			build_command: settings.build_command.clone(),
		});
		for kind in [ComponentKind::Application, ComponentKind::Library] {
			let wiring = wiring.clone();
			let listener: BinaryFinalizedListener =
				Arc::new(move |component: &Arc<LogicalComponent>, binary: &Arc<BinaryVariant>| {
					wiring.binary_finalized(component, binary)
				});
			graph.when_binary_finalized(kind, listener)?;
		}
		log::debug!("Applied Visual Studio generation to unit '{}'", unit.path);
		Ok(registry)
	}
}

struct UnitWiring {
	unit: Arc<BuildUnit>,
	registry: Arc<ProjectRegistry>,
	tasks: Arc<TaskGraph>,
	lifecycle: TaskId,
	build_command: String,
}

impl UnitWiring {
	fn binary_finalized(&self, component: &Arc<LogicalComponent>, binary: &Arc<BinaryVariant>) -> anyhow::Result<()> {
		let kind = match classify(component, binary) {
			Some(kind) => kind,
			None => {
				log::debug!("Skipping {} binary '{}' of {}", binary.output, binary.configuration, component);
				return Ok(());
			}
		};
		let target = TargetBinary::new(self.unit.clone(), component.clone(), binary.clone(), kind);
		log::debug!("Adding configuration '{}' ({}) to {}", target.configuration_key(), kind, component);
		let registration = self.registry.add_project_configuration(Arc::new(target));
		if registration.created {
			if let Some(build_file) = &self.unit.build_file {
				self.registry.add_auxiliary_source(registration.handle, build_file);
			}
			self.bind_tasks(registration.handle)?;
		}
		Ok(())
	}

	fn bind_tasks(&self, project: ProjectHandle) -> anyhow::Result<()> {
		let (name, component_name) =
			self.registry.read(project, |p| (p.name().to_owned(), p.component_name().to_owned()));

		let project_file = self.tasks.create(
			&self.unit,
			&format!("{}VisualStudioProject", name),
			TaskKind::GenerateProject,
			Some(Arc::new(ProjectFileTask::new(self.registry.clone(), project, self.build_command.clone()))),
		)?;
		let filters_file = self.tasks.create(
			&self.unit,
			&format!("{}VisualStudioFilters", name),
			TaskKind::GenerateFilters,
			Some(Arc::new(FiltersFileTask::new(self.registry.clone(), project))),
		)?;
		let lifecycle =
			self.tasks.maybe_create(&self.unit, &format!("{}VisualStudio", component_name), TaskKind::Lifecycle)?;
		for task in [project_file, filters_file] {
			self.tasks.depends_on(lifecycle, task);
			self.tasks.depends_on(self.lifecycle, task);
		}

		self.registry.update(project, |p| p.bind_tasks(ProjectTasks { project_file, filters_file, lifecycle }));
		log::debug!("Bound generation tasks of project '{}'", name);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classification() {
		let app = LogicalComponent::new("game", ":", ComponentKind::Application);
		let lib = LogicalComponent::new("core", ":", ComponentKind::Library);
		let binary = |output| BinaryVariant::new("debug", "x86-64", output);

		assert_eq!(classify(&app, &binary(BinaryOutput::Executable)), Some(OutputKind::Executable));
		assert_eq!(classify(&lib, &binary(BinaryOutput::SharedLibrary)), Some(OutputKind::SharedLibrary));
		assert_eq!(classify(&lib, &binary(BinaryOutput::StaticLibrary)), Some(OutputKind::StaticLibrary));
		assert_eq!(classify(&lib, &binary(BinaryOutput::Objects)), None);
		assert_eq!(classify(&lib, &binary(BinaryOutput::Executable)), None);
	}

	#[test]
	#[should_panic(expected = "expected an executable")]
	fn application_must_produce_executables() {
		let app = LogicalComponent::new("game", ":", ComponentKind::Application);
		classify(&app, &BinaryVariant::new("debug", "x86-64", BinaryOutput::StaticLibrary));
	}

	#[test]
	fn applying_twice_is_an_error() {
		let unit = Arc::new(BuildUnit::root("demo", "/src/demo"));
		let build = VisualStudioBuild::new(&unit, Arc::new(TaskGraph::new()));
		let mut graph = BuildGraph::new(unit);
		build.apply(&mut graph, &VisualStudioSettings::default()).unwrap();
		assert!(build.apply(&mut graph, &VisualStudioSettings::default()).is_err());
	}
}
