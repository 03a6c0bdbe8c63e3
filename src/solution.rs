use std::{
	path::{Path, PathBuf},
	sync::{Arc, Mutex, PoisonError},
};

use uuid::Uuid;

use crate::{
	project::{name_uuid, ProjectDescriptor, ProjectState},
	registry::ProjectRegistry, //
	unit::BuildUnit,
};

/// A project as it appears in a solution, captured when the solution is read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolutionProject {
	pub name: String,
	pub component_name: String,
	pub unit_path: String,
	pub guid: Uuid,
	pub project_file: PathBuf,
	/// `(configuration, platform)` pairs in project order.
	pub configurations: Vec<(String, String)>,
	pub links: Vec<String>,
	pub dependencies: Vec<Uuid>,
}

impl SolutionProject {
	fn from_descriptor(project: &ProjectDescriptor) -> Self {
		let mut links = Vec::<String>::new();
		for config in project.configurations() {
			for link in config.links() {
				if !links.contains(link) {
					links.push(link.clone());
				}
			}
		}
		SolutionProject {
			name: project.name().to_owned(),
			component_name: project.component_name().to_owned(),
			unit_path: project.unit().path.clone(),
			guid: project.guid(),
			project_file: project.project_file().to_owned(),
			configurations: project
				.configurations()
				.iter()
				.map(|x| (x.configuration_name().to_owned(), x.platform_name().to_owned()))
				.collect(),
			links,
			dependencies: Vec::new(),
		}
	}
}

/// All projects of a build tree. Only the root unit has one.
///
/// The solution holds the registries, not their contents: every call to
/// [`projects`](Self::projects) sees projects registered up to that point.
#[derive(Debug)]
pub struct SolutionDescriptor {
	name: String,
	solution_file: PathBuf,
	guid: Uuid,
	registries: Mutex<Vec<Arc<ProjectRegistry>>>,
}

impl SolutionDescriptor {
	pub fn new(root: &BuildUnit) -> Self {
		SolutionDescriptor {
			name: root.name.clone(),
			solution_file: root.dir.join(format!("{}.sln", root.name)),
			guid: name_uuid(&format!("vsgen:solution:{}", root.name)),
			registries: Mutex::new(Vec::new()),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}
	pub fn solution_file(&self) -> &Path {
		&self.solution_file
	}
	pub fn guid(&self) -> Uuid {
		self.guid
	}

	pub fn add_registry(&self, registry: Arc<ProjectRegistry>) {
		self.registries.lock().unwrap_or_else(PoisonError::into_inner).push(registry);
	}

	fn registries(&self) -> Vec<Arc<ProjectRegistry>> {
		self.registries.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}

	/// Every project of every registry, in unit then registration order. Projects without bound
	/// generation tasks are left out, since nothing would write their project file.
	///
	/// Links naming a component of the tree become project dependencies. A component of the
	/// same unit wins over one of another unit.
	pub fn projects(&self) -> Vec<SolutionProject> {
		let mut projects = Vec::new();
		for registry in self.registries() {
			registry.for_each(|_, project| {
				if project.state() == ProjectState::TaskBound {
					projects.push(SolutionProject::from_descriptor(project));
				}
			});
		}

		let resolved = projects
			.iter()
			.map(|project| {
				project
					.links
					.iter()
					.filter_map(|link| {
						let candidates = projects.iter().filter(|x| &x.component_name == link && x.guid != project.guid);
						let mut fallback = None;
						for candidate in candidates {
							if candidate.unit_path == project.unit_path {
								return Some(candidate.guid);
							}
							fallback.get_or_insert(candidate.guid);
						}
						fallback
					})
					.collect::<Vec<Uuid>>()
			})
			.collect::<Vec<_>>();
		for (project, dependencies) in projects.iter_mut().zip(resolved) {
			project.dependencies = dependencies;
		}
		projects
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		binary::BinaryVariant,
		component::{ComponentKind, LogicalComponent},
		host::tasks::{TaskGraph, TaskKind},
		link_type::BinaryOutput,
		project::ProjectTasks,
		target::{OutputKind, TargetBinary},
	};

	fn add(tasks: &TaskGraph, registry: &ProjectRegistry, name: &str, kind: ComponentKind, links: &[&str]) {
		let unit = registry.unit().clone();
		let task = |suffix: &str| tasks.maybe_create(&unit, &format!("{}{}", name, suffix), TaskKind::Lifecycle).unwrap();
		let bound = ProjectTasks {
			project_file: task("VisualStudioProject"),
			filters_file: task("VisualStudioFilters"),
			lifecycle: task("VisualStudio"),
		};
		let (output, out_kind) = match kind {
			ComponentKind::Application => (BinaryOutput::Executable, OutputKind::Executable),
			ComponentKind::Library => (BinaryOutput::SharedLibrary, OutputKind::SharedLibrary),
		};
		let mut binary = BinaryVariant::new("debug", "x86-64", output);
		binary.links = links.iter().map(|x| x.to_string()).collect();
		let component = Arc::new(LogicalComponent::new(name, unit.path.clone(), kind));
		let registration =
			registry.add_project_configuration(Arc::new(TargetBinary::new(unit.clone(), component, Arc::new(binary), out_kind)));
		registry.update(registration.handle, |p| p.bind_tasks(bound));
	}

	#[test]
	fn reads_registries_lazily() {
		let root = Arc::new(BuildUnit::root("demo", "/src/demo"));
		let solution = SolutionDescriptor::new(&root);
		let registry = Arc::new(ProjectRegistry::new(root.clone(), "/src/demo"));
		solution.add_registry(registry.clone());
		assert!(solution.projects().is_empty());

		add(&TaskGraph::new(), &registry, "game", ComponentKind::Application, &[]);
		let projects = solution.projects();
		assert_eq!(projects.len(), 1);
		assert_eq!(projects[0].configurations, vec![("debug".to_owned(), "x64".to_owned())]);
		assert_eq!(solution.solution_file(), Path::new("/src/demo/demo.sln"));
	}

	#[test]
	fn links_resolve_to_dependencies() {
		let root = Arc::new(BuildUnit::root("demo", "/src/demo"));
		let sub = Arc::new(BuildUnit::child(&root, "libs", "/src/demo/libs"));
		let solution = SolutionDescriptor::new(&root);
		let root_registry = Arc::new(ProjectRegistry::new(root.clone(), "/src/demo"));
		let sub_registry = Arc::new(ProjectRegistry::new(sub.clone(), "/src/demo/libs"));
		solution.add_registry(root_registry.clone());
		solution.add_registry(sub_registry.clone());

		let tasks = TaskGraph::new();
		add(&tasks, &root_registry, "game", ComponentKind::Application, &["core", "zlib"]);
		add(&tasks, &sub_registry, "core", ComponentKind::Library, &[]);

		let projects = solution.projects();
		assert_eq!(projects.len(), 2);
		assert_eq!(projects[1].name, "libs_core");
		assert_eq!(projects[0].dependencies, vec![projects[1].guid]);
		assert!(projects[1].dependencies.is_empty());
	}

	#[test]
	fn projects_without_tasks_are_left_out() {
		let root = Arc::new(BuildUnit::root("demo", "/src/demo"));
		let solution = SolutionDescriptor::new(&root);
		let registry = Arc::new(ProjectRegistry::new(root.clone(), "/src/demo"));
		solution.add_registry(registry.clone());

		add(&TaskGraph::new(), &registry, "game", ComponentKind::Application, &["tools"]);
		registry.register("tools");

		let projects = solution.projects();
		assert_eq!(projects.iter().map(|x| x.name.as_str()).collect::<Vec<_>>(), vec!["game"]);
		assert!(projects[0].dependencies.is_empty());
	}
}
