use core::fmt;

use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
	Application,
	Library,
}

impl ComponentKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ComponentKind::Application => "application",
			ComponentKind::Library => "library",
		}
	}
}

/// A buildable target of a unit, as distinct from any compiled variant of it.
///
/// Identity is the component name together with the path of the enclosing unit.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct LogicalComponent {
	pub name: String,
	pub unit_path: String,
	pub kind: ComponentKind,
}

impl LogicalComponent {
	pub fn new(name: impl Into<String>, unit_path: impl Into<String>, kind: ComponentKind) -> Self {
		LogicalComponent { name: name.into(), unit_path: unit_path.into(), kind }
	}

	pub fn same_identity(&self, other: &LogicalComponent) -> bool {
		self.name == other.name && self.unit_path == other.unit_path
	}
}

impl fmt::Display for LogicalComponent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} '{}' in unit '{}'", self.kind.as_str(), self.name, self.unit_path)
	}
}
