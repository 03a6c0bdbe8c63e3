use std::{
	collections::BTreeMap, //
	fs,
	path::{Path, PathBuf},
	sync::Arc,
};

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;

use crate::{
	binary::BinaryVariant,
	component::ComponentKind,
	host::events::BuildGraph,
	link_type::BinaryOutput,
	misc::{join_parent, Sources},
	plugin::VisualStudioSettings,
	target::platform_name, //
	unit::BuildUnit,
};

pub const VSGEN_TOML: &str = "vsgen.toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
	package: PackageManifest,
	visual_studio: Option<VisualStudioManifest>,
	#[serde(default)]
	component: Vec<ComponentManifest>,
	units: Option<BTreeMap<String, UnitManifest>>,
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
	name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VisualStudioManifest {
	build_command: Option<String>,
	project_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ComponentManifest {
	name: String,
	kind: ComponentKind,
	#[serde(default)]
	binary: Vec<BinaryManifest>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BinaryManifest {
	configuration: String,
	architecture: Option<String>,
	output: Option<BinaryOutput>,
	#[serde(default)]
	sources: Vec<String>,
	#[serde(default)]
	headers: Vec<String>,
	#[serde(default)]
	include_dirs: Vec<String>,
	#[serde(default)]
	defines: Vec<String>,
	#[serde(default)]
	links: Vec<String>,
	output_file: Option<String>,
	build_task: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitManifest {
	path: String,
}

const DEFAULT_ARCHITECTURE: &str = "x86-64";

#[derive(Debug)]
pub struct ComponentDefinition {
	pub name: String,
	pub kind: ComponentKind,
	pub binaries: Vec<BinaryVariant>,
}

/// One unit of a loaded build tree, ready to be fed into a [`BuildGraph`].
#[derive(Debug)]
pub struct UnitDefinition {
	pub unit: Arc<BuildUnit>,
	pub settings: VisualStudioSettings,
	pub components: Vec<ComponentDefinition>,
}

impl UnitDefinition {
	/// Adds every component and binary to `graph` and finalizes the binaries.
	pub fn populate(&self, graph: &mut BuildGraph) -> anyhow::Result<()> {
		for component in &self.components {
			graph.add_component(&component.name, component.kind)?;
			for binary in &component.binaries {
				graph.add_binary(&component.name, binary.clone())?;
			}
		}
		graph.finalize_all()
	}
}

/// All units of a build, root first, children depth-first in name order.
#[derive(Debug)]
pub struct BuildTree {
	pub units: Vec<UnitDefinition>,
}

impl BuildTree {
	pub fn root(&self) -> &UnitDefinition {
		&self.units[0]
	}
	pub fn unit(&self, path: &str) -> Option<&UnitDefinition> {
		self.units.iter().find(|x| x.unit.path == path)
	}
}

fn read_manifest(manifest_path: &Path) -> anyhow::Result<Manifest> {
	let manifest_toml = fs::read_to_string(manifest_path)
		.with_context(|| format!("Error opening {}", manifest_path.display()))?;
	toml::from_str::<Manifest>(&manifest_toml).with_context(|| format!("Error reading {}", manifest_path.display()))
}

/// Reads `vsgen.toml` in `src_dir` and in every unit it references.
pub fn load_build_tree(src_dir: &Path) -> anyhow::Result<BuildTree> {
	let src_dir = src_dir
		.canonicalize()
		.with_context(|| format!("Error resolving source directory {}", src_dir.display()))?;
	let mut units = Vec::new();
	let mut visited = Vec::new();
	load_unit(&src_dir, None, &mut units, &mut visited)?;
	Ok(BuildTree { units })
}

fn load_unit(
	dir: &Path,
	parent: Option<(&BuildUnit, &str)>,
	units: &mut Vec<UnitDefinition>,
	visited: &mut Vec<PathBuf>,
) -> anyhow::Result<()> {
	if visited.iter().any(|x| x == dir) {
		bail!("Unit directory {} is included more than once", dir.display());
	}
	visited.push(dir.to_owned());

	let manifest_path = dir.join(VSGEN_TOML);
	let manifest = read_manifest(&manifest_path)?;
	let unit = match parent {
		None => BuildUnit::root(manifest.package.name.clone(), dir),
		Some((parent, name)) => BuildUnit::child(parent, name, dir),
	};
	let unit = Arc::new(unit.with_build_file(&manifest_path));
	log::debug!("Loaded unit '{}' from {}", unit.path, manifest_path.display());

	let settings = match &manifest.visual_studio {
		None => VisualStudioSettings::default(),
		Some(vs) => VisualStudioSettings {
			build_command: vs.build_command.clone().unwrap_or_else(|| VisualStudioSettings::default().build_command),
			project_dir: vs.project_dir.as_ref().map(PathBuf::from),
		},
	};

	let mut components = Vec::new();
	for component in &manifest.component {
		let binaries = component
			.binary
			.iter()
			.map(|x| binary_variant(x, component, dir))
			.collect::<anyhow::Result<Vec<_>>>()
			.and_then(|x| unique_slots(&x).map(|_| x))
			.with_context(|| format!("In component '{}' of {}", component.name, manifest_path.display()))?;
		components.push(ComponentDefinition { name: component.name.clone(), kind: component.kind, binaries });
	}
	units.push(UnitDefinition { unit: unit.clone(), settings, components });

	for (name, info) in manifest.units.unwrap_or_default() {
		let child_dir = dir.join(&info.path);
		let child_dir = child_dir
			.canonicalize()
			.with_context(|| format!("Error resolving unit '{}' at {}", name, child_dir.display()))?;
		load_unit(&child_dir, Some((&unit, &name)), units, visited)?;
	}
	Ok(())
}

/// A project holds one configuration per (configuration, platform) pair.
fn unique_slots(binaries: &[BinaryVariant]) -> anyhow::Result<()> {
	let mut seen = Vec::new();
	for binary in binaries {
		let slot = format!("{}|{}", binary.configuration, platform_name(&binary.architecture));
		if seen.contains(&slot) {
			bail!("Configuration '{}' is declared more than once", slot);
		}
		seen.push(slot);
	}
	Ok(())
}

fn binary_variant(info: &BinaryManifest, component: &ComponentManifest, dir: &Path) -> anyhow::Result<BinaryVariant> {
	let output = match (info.output, component.kind) {
		(Some(BinaryOutput::Executable), ComponentKind::Application) => BinaryOutput::Executable,
		(Some(output), ComponentKind::Application) => {
			bail!("Binary '{}' of an application must be an executable, not {}", info.configuration, output)
		}
		(Some(output), ComponentKind::Library) => output,
		(None, ComponentKind::Application) => BinaryOutput::Executable,
		(None, ComponentKind::Library) => {
			return Err(anyhow!(
				"Binary '{}' of a library must specify \"output\": \"shared_library\", \"static_library\" or \"objects\"",
				info.configuration
			))
		}
	};
	let architecture = info.architecture.as_deref().unwrap_or(DEFAULT_ARCHITECTURE);
	let mut binary = BinaryVariant::new(info.configuration.clone(), architecture, output);

	let sources = Sources::from_slice(&info.sources, dir).map_err(|e| anyhow!(e))?;
	binary.sources = sources.compiled.into_iter().map(|x| x.full).collect();
	binary.headers = sources.headers.into_iter().map(|x| x.full).collect();
	for header in &info.headers {
		let header = join_parent(dir, header).full;
		if !binary.headers.contains(&header) {
			binary.headers.push(header);
		}
	}
	binary.include_dirs = info.include_dirs.iter().map(|x| join_parent(dir, x).full).collect();
	binary.defines = info.defines.clone();
	binary.links = info.links.clone();
	binary.output_file = info.output_file.as_ref().map(PathBuf::from);
	binary.build_task = info.build_task.clone();
	Ok(binary)
}
