use core::fmt;

use serde::Deserialize;

/// What a binary variant produces, as reported by the build graph.
///
/// This is the host's view. Only the first three are represented in generated projects, see
/// [`crate::target::OutputKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOutput {
	Executable,
	SharedLibrary,
	StaticLibrary,
	/// Compiled objects that are never linked into a library or executable.
	Objects,
}

impl fmt::Display for BinaryOutput {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			BinaryOutput::Executable => "executable",
			BinaryOutput::SharedLibrary => "shared library",
			BinaryOutput::StaticLibrary => "static library",
			BinaryOutput::Objects => "object files",
		};
		f.write_str(s)
	}
}
