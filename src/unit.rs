use std::path::PathBuf;

/// A build unit (one manifest directory) of a build tree.
///
/// The root unit has the path `:`; children are addressed as `:core`, `:core:net`, ...
#[derive(Debug)]
pub struct BuildUnit {
	pub name: String,
	pub path: String,
	pub dir: PathBuf,
	pub build_file: Option<PathBuf>,
}

impl BuildUnit {
	pub fn root(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
		BuildUnit { name: name.into(), path: ":".to_owned(), dir: dir.into(), build_file: None }
	}

	pub fn child(parent: &BuildUnit, name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
		let name = name.into();
		BuildUnit { path: parent.task_path(&name), name, dir: dir.into(), build_file: None }
	}

	pub fn with_build_file(mut self, build_file: impl Into<PathBuf>) -> Self {
		self.build_file = Some(build_file.into());
		self
	}

	pub fn is_root(&self) -> bool {
		self.path == ":"
	}

	/// Fully qualified path of a task (or child unit) named `name` inside this unit.
	pub fn task_path(&self, name: &str) -> String {
		if self.is_root() {
			format!(":{}", name)
		} else {
			format!("{}:{}", self.path, name)
		}
	}

	/// Visual Studio project name for a component of this unit.
	///
	/// Components of the root unit keep their own name; everything else is prefixed with the
	/// unit name so that projects from different units can share one solution.
	pub fn project_name(&self, component: &str) -> String {
		if self.is_root() {
			component.to_owned()
		} else {
			format!("{}_{}", self.name, component)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn task_paths() {
		let root = BuildUnit::root("demo", "/src/demo");
		let core = BuildUnit::child(&root, "core", "/src/demo/core");
		let net = BuildUnit::child(&core, "net", "/src/demo/core/net");
		assert_eq!(root.task_path("visualStudio"), ":visualStudio");
		assert_eq!(core.path, ":core");
		assert_eq!(net.path, ":core:net");
		assert_eq!(net.task_path("clean"), ":core:net:clean");
	}

	#[test]
	fn project_names() {
		let root = BuildUnit::root("demo", "/src/demo");
		let core = BuildUnit::child(&root, "core", "/src/demo/core");
		assert_eq!(root.project_name("game"), "game");
		assert_eq!(core.project_name("util"), "core_util");
	}
}
