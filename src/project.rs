use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

use uuid::Uuid;

use crate::{
	host::tasks::TaskId, //
	target::TargetBinary,
	unit::BuildUnit,
};

/// Tasks bound to a project descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProjectTasks {
	pub project_file: TaskId,
	pub filters_file: TaskId,
	pub lifecycle: TaskId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectState {
	/// Known to the registry, no configuration yet.
	Registered,
	/// At least one configuration, generation tasks not created yet.
	Configured,
	/// Generation tasks exist and read this descriptor when they run.
	TaskBound,
}

pub(crate) fn name_uuid(name: &str) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

fn push_unique(paths: &mut Vec<PathBuf>, path: &Path) {
	if !paths.iter().any(|x| x == path) {
		paths.push(path.to_owned());
	}
}

/// Everything that ends up in one generated project: all configurations of one component plus
/// auxiliary files such as the unit's build file.
#[derive(Debug)]
pub struct ProjectDescriptor {
	name: String,
	component_name: String,
	unit: Arc<BuildUnit>,
	guid: Uuid,
	project_file: PathBuf,
	configurations: Vec<Arc<TargetBinary>>,
	auxiliary_sources: Vec<PathBuf>,
	tasks: Option<ProjectTasks>,
}

impl ProjectDescriptor {
	pub(crate) fn new(component_name: &str, unit: Arc<BuildUnit>, project_dir: &Path) -> Self {
		let name = unit.project_name(component_name);
		let guid = name_uuid(&format!("vsgen:project:{}", unit.task_path(component_name)));
		let project_file = project_dir.join(format!("{}.vcxproj", name));
		ProjectDescriptor {
			name,
			component_name: component_name.to_owned(),
			unit,
			guid,
			project_file,
			configurations: Vec::new(),
			auxiliary_sources: Vec::new(),
			tasks: None,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}
	pub fn component_name(&self) -> &str {
		&self.component_name
	}
	pub fn unit(&self) -> &Arc<BuildUnit> {
		&self.unit
	}
	pub fn guid(&self) -> Uuid {
		self.guid
	}
	pub fn configurations(&self) -> &[Arc<TargetBinary>] {
		&self.configurations
	}
	pub fn auxiliary_sources(&self) -> &[PathBuf] {
		&self.auxiliary_sources
	}
	pub fn tasks(&self) -> Option<ProjectTasks> {
		self.tasks
	}

	pub fn project_file(&self) -> &Path {
		&self.project_file
	}
	pub fn filters_file(&self) -> PathBuf {
		let mut file = self.project_file.clone().into_os_string();
		file.push(".filters");
		PathBuf::from(file)
	}

	pub fn state(&self) -> ProjectState {
		if self.tasks.is_some() {
			ProjectState::TaskBound
		} else if self.configurations.is_empty() {
			ProjectState::Registered
		} else {
			ProjectState::Configured
		}
	}

	/// Union of the sources of every configuration, in first-seen order.
	pub fn source_files(&self) -> Vec<PathBuf> {
		let mut files = Vec::new();
		for config in &self.configurations {
			for src in config.sources() {
				push_unique(&mut files, src);
			}
		}
		files
	}

	/// Union of the headers of every configuration, in first-seen order.
	pub fn header_files(&self) -> Vec<PathBuf> {
		let mut files = Vec::new();
		for config in &self.configurations {
			for header in config.headers() {
				push_unique(&mut files, header);
			}
		}
		files
	}

	/// # Panics
	///
	/// If the adapter belongs to another component, or if a different variant already occupies
	/// the same configuration and platform. Both are defects in the caller.
	pub(crate) fn add_configuration(&mut self, target: Arc<TargetBinary>) {
		if target.component_name() != self.component_name || target.unit().path != self.unit.path {
			panic!(
				"Configuration '{}' of {} added to project of component '{}' in unit '{}'",
				target.configuration_key(),
				target.component(),
				self.component_name,
				self.unit.path
			);
		}
		if let Some(existing) = self.configurations.iter().find(|x| x.same_slot(&target)) {
			if Arc::ptr_eq(existing.binary(), target.binary()) {
				return;
			}
			panic!(
				"Project '{}' already has a configuration '{}' ({}), cannot add another ({})",
				self.name,
				target.configuration_key(),
				existing.kind(),
				target.kind()
			);
		}
		self.configurations.push(target);
	}

	pub(crate) fn add_auxiliary_source(&mut self, file: &Path) {
		push_unique(&mut self.auxiliary_sources, file);
	}

	/// # Panics
	///
	/// If tasks have already been bound.
	pub(crate) fn bind_tasks(&mut self, tasks: ProjectTasks) {
		if self.tasks.is_some() {
			panic!("Tasks for project '{}' are already bound", self.name);
		}
		self.tasks = Some(tasks);
	}
}
