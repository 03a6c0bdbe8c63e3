mod msvc;

use std::{
	fs,
	io::Write,
	path::{Path, PathBuf},
	sync::Arc,
};

use anyhow::Context;

use crate::{
	host::tasks::{TaskAction, TaskOutcome},
	registry::{ProjectHandle, ProjectRegistry},
	solution::SolutionDescriptor,
};

/// Writes `content` to `filepath` unless the file already holds exactly these bytes.
///
/// The content goes to a temporary file next to the target first and is then renamed into
/// place, so readers never see a partially written file.
pub fn write_if_changed(filepath: &Path, content: &str) -> anyhow::Result<TaskOutcome> {
	if let Ok(existing) = fs::read(filepath) {
		if existing == content.as_bytes() {
			log::debug!("{} is up to date", filepath.display());
			return Ok(TaskOutcome::UpToDate);
		}
	}
	let dir = match filepath.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent.to_owned(),
		_ => PathBuf::from("."),
	};
	fs::create_dir_all(&dir).with_context(|| format!("Error creating directory \"{}\"", dir.display()))?;
	let mut tmp = tempfile::NamedTempFile::new_in(&dir)
		.with_context(|| format!("Error creating temporary file in \"{}\"", dir.display()))?;
	tmp.write_all(content.as_bytes())
		.with_context(|| format!("Error writing to {}", tmp.path().display()))?;
	tmp.persist(filepath)
		.with_context(|| format!("Error creating file at \"{}\"", filepath.display()))?;
	log::info!("Wrote {}", filepath.display());
	Ok(TaskOutcome::Executed)
}

/// Generates the `.vcxproj` of one project.
pub struct ProjectFileTask {
	registry: Arc<ProjectRegistry>,
	project: ProjectHandle,
	build_command: String,
	output: PathBuf,
}

impl ProjectFileTask {
	pub fn new(registry: Arc<ProjectRegistry>, project: ProjectHandle, build_command: impl Into<String>) -> Self {
		let output = registry.read(project, |p| p.project_file().to_owned());
		ProjectFileTask { registry, project, build_command: build_command.into(), output }
	}
}

impl TaskAction for ProjectFileTask {
	fn outputs(&self) -> Vec<PathBuf> {
		vec![self.output.clone()]
	}

	fn execute(&self) -> anyhow::Result<TaskOutcome> {
		let content = self.registry.read(self.project, |p| msvc::vcxproj(p, &self.build_command));
		write_if_changed(&self.output, &content)
	}
}

/// Generates the `.vcxproj.filters` of one project.
pub struct FiltersFileTask {
	registry: Arc<ProjectRegistry>,
	project: ProjectHandle,
	output: PathBuf,
}

impl FiltersFileTask {
	pub fn new(registry: Arc<ProjectRegistry>, project: ProjectHandle) -> Self {
		let output = registry.read(project, |p| p.filters_file());
		FiltersFileTask { registry, project, output }
	}
}

impl TaskAction for FiltersFileTask {
	fn outputs(&self) -> Vec<PathBuf> {
		vec![self.output.clone()]
	}

	fn execute(&self) -> anyhow::Result<TaskOutcome> {
		let content = self.registry.read(self.project, msvc::filters);
		write_if_changed(&self.output, &content)
	}
}

/// Generates the `.sln` of the whole build tree.
pub struct SolutionFileTask {
	solution: Arc<SolutionDescriptor>,
}

impl SolutionFileTask {
	pub fn new(solution: Arc<SolutionDescriptor>) -> Self {
		SolutionFileTask { solution }
	}
}

impl TaskAction for SolutionFileTask {
	fn outputs(&self) -> Vec<PathBuf> {
		vec![self.solution.solution_file().to_owned()]
	}

	fn execute(&self) -> anyhow::Result<TaskOutcome> {
		let projects = self.solution.projects();
		log::debug!("Solution '{}' has {} projects", self.solution.name(), projects.len());
		let solution_file = self.solution.solution_file();
		let solution_dir = solution_file.parent().unwrap_or(Path::new(""));
		let content = msvc::sln(solution_dir, self.solution.guid(), &projects);
		write_if_changed(solution_file, &content)
	}
}
