use core::fmt;
use std::{
	path::PathBuf, //
	sync::Arc,
};

use crate::{
	binary::BinaryVariant, //
	component::LogicalComponent,
	unit::BuildUnit,
};

/// The role of a binary inside a generated project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputKind {
	Executable,
	SharedLibrary,
	StaticLibrary,
}

impl OutputKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			OutputKind::Executable => "Executable",
			OutputKind::SharedLibrary => "SharedLibrary",
			OutputKind::StaticLibrary => "StaticLibrary",
		}
	}

	fn extension(&self) -> &'static str {
		match self {
			OutputKind::Executable => "exe",
			OutputKind::SharedLibrary => "dll",
			OutputKind::StaticLibrary => "lib",
		}
	}

	fn task_prefix(&self) -> &'static str {
		match self {
			OutputKind::Executable => "install",
			OutputKind::SharedLibrary => "link",
			OutputKind::StaticLibrary => "create",
		}
	}
}

impl fmt::Display for OutputKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Maps a build architecture onto the name Visual Studio uses for the platform.
pub fn platform_name(architecture: &str) -> &str {
	let known = [
		("x86", "Win32"),
		("i386", "Win32"),
		("x86-64", "x64"),
		("x86_64", "x64"),
		("amd64", "x64"),
		("aarch64", "ARM64"),
		("arm64", "ARM64"),
		("arm", "ARM"),
	];
	match known.iter().find(|x| architecture.eq_ignore_ascii_case(x.0)) {
		Some(x) => x.1,
		None => architecture,
	}
}

fn capitalize(s: &str) -> String {
	let mut chars = s.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// One finalized binary variant viewed as a project configuration.
#[derive(Debug)]
pub struct TargetBinary {
	unit: Arc<BuildUnit>,
	component: Arc<LogicalComponent>,
	binary: Arc<BinaryVariant>,
	kind: OutputKind,
}

impl TargetBinary {
	pub fn new(
		unit: Arc<BuildUnit>,
		component: Arc<LogicalComponent>,
		binary: Arc<BinaryVariant>,
		kind: OutputKind,
	) -> Self {
		TargetBinary { unit, component, binary, kind }
	}

	pub fn unit(&self) -> &Arc<BuildUnit> {
		&self.unit
	}
	pub fn component(&self) -> &Arc<LogicalComponent> {
		&self.component
	}
	pub fn binary(&self) -> &Arc<BinaryVariant> {
		&self.binary
	}
	pub fn kind(&self) -> OutputKind {
		self.kind
	}

	pub fn component_name(&self) -> &str {
		&self.component.name
	}
	pub fn project_name(&self) -> String {
		self.unit.project_name(&self.component.name)
	}
	pub fn configuration_name(&self) -> &str {
		&self.binary.configuration
	}
	pub fn platform_name(&self) -> &str {
		platform_name(&self.binary.architecture)
	}
	/// `Configuration|Platform`, the key Visual Studio uses for a project configuration.
	pub fn configuration_key(&self) -> String {
		format!("{}|{}", self.configuration_name(), self.platform_name())
	}

	pub fn sources(&self) -> &[PathBuf] {
		&self.binary.sources
	}
	pub fn headers(&self) -> &[PathBuf] {
		&self.binary.headers
	}
	pub fn include_dirs(&self) -> &[PathBuf] {
		&self.binary.include_dirs
	}
	pub fn defines(&self) -> &[String] {
		&self.binary.defines
	}
	pub fn links(&self) -> &[String] {
		&self.binary.links
	}

	/// Task that builds this binary, qualified with the unit path.
	pub fn build_task_path(&self) -> String {
		let task = match &self.binary.build_task {
			Some(task) => task.clone(),
			None => format!(
				"{}{}{}",
				self.kind.task_prefix(),
				capitalize(&self.component.name),
				capitalize(&self.binary.configuration)
			),
		};
		self.unit.task_path(&task)
	}

	pub fn output_file(&self) -> PathBuf {
		match &self.binary.output_file {
			Some(file) => self.unit.dir.join(file),
			None => self
				.unit
				.dir
				.join("build")
				.join(&self.binary.configuration)
				.join(format!("{}.{}", self.component.name, self.kind.extension())),
		}
	}

	/// Whether both adapters describe the same configuration slot of a project.
	pub fn same_slot(&self, other: &TargetBinary) -> bool {
		self.configuration_name() == other.configuration_name() && self.platform_name() == other.platform_name()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{component::ComponentKind, link_type::BinaryOutput};

	fn adapter(unit: BuildUnit, binary: BinaryVariant, kind: OutputKind) -> TargetBinary {
		let component = LogicalComponent::new("game", unit.path.clone(), ComponentKind::Application);
		TargetBinary::new(Arc::new(unit), Arc::new(component), Arc::new(binary), kind)
	}

	#[test]
	fn platform_mapping() {
		assert_eq!(platform_name("x86"), "Win32");
		assert_eq!(platform_name("x86-64"), "x64");
		assert_eq!(platform_name("AArch64"), "ARM64");
		assert_eq!(platform_name("riscv64"), "riscv64");
	}

	#[test]
	fn derived_names() {
		let root = BuildUnit::root("demo", "/src/demo");
		let binary = BinaryVariant::new("debug", "x86-64", BinaryOutput::Executable);
		let target = adapter(root, binary, OutputKind::Executable);
		assert_eq!(target.configuration_key(), "debug|x64");
		assert_eq!(target.build_task_path(), ":installGameDebug");
		assert_eq!(target.output_file(), PathBuf::from("/src/demo/build/debug/game.exe"));
		assert_eq!(target.project_name(), "game");
	}

	#[test]
	fn explicit_task_and_output() {
		let root = BuildUnit::root("demo", "/src/demo");
		let sub = BuildUnit::child(&root, "tools", "/src/demo/tools");
		let mut binary = BinaryVariant::new("release", "x86", BinaryOutput::Executable);
		binary.build_task = Some("assembleRelease".to_owned());
		binary.output_file = Some(PathBuf::from("out/game.exe"));
		let target = adapter(sub, binary, OutputKind::Executable);
		assert_eq!(target.build_task_path(), ":tools:assembleRelease");
		assert_eq!(target.output_file(), PathBuf::from("/src/demo/tools/out/game.exe"));
		assert_eq!(target.project_name(), "tools_game");
		assert_eq!(target.platform_name(), "Win32");
	}
}
