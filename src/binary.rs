use std::path::PathBuf;

use crate::link_type::BinaryOutput;

/// One concrete compiled artifact of a component for a configuration and architecture.
///
/// The build graph may still change a variant while it is pending. Once it has been finalized it
/// is shared behind an `Arc` and never modified again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryVariant {
	pub configuration: String,
	pub architecture: String,
	pub output: BinaryOutput,

	pub sources: Vec<PathBuf>,
	pub headers: Vec<PathBuf>,
	pub include_dirs: Vec<PathBuf>,
	pub defines: Vec<String>,
	pub links: Vec<String>,

	pub output_file: Option<PathBuf>,
	pub build_task: Option<String>,
}

impl BinaryVariant {
	pub fn new(configuration: impl Into<String>, architecture: impl Into<String>, output: BinaryOutput) -> Self {
		BinaryVariant {
			configuration: configuration.into(),
			architecture: architecture.into(),
			output,
			sources: Vec::new(),
			headers: Vec::new(),
			include_dirs: Vec::new(),
			defines: Vec::new(),
			links: Vec::new(),
			output_file: None,
			build_task: None,
		}
	}
}
