use std::path::Path;

use uuid::Uuid;

use crate::{
	project::{name_uuid, ProjectDescriptor},
	solution::SolutionProject,
};

const VS_CPP_GUID: &str = "8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942";
const PLATFORM_TOOLSET: &str = "v143";

const SOURCE_FILTER: &str = "Source Files";
const HEADER_FILTER: &str = "Header Files";
const BUILD_SCRIPT_FILTER: &str = "Build Scripts";

fn guid_str(guid: Uuid) -> String {
	guid.to_string().to_ascii_uppercase()
}

fn escape(s: &str) -> String {
	let mut ret = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'&' => ret += "&amp;",
			'<' => ret += "&lt;",
			'>' => ret += "&gt;",
			'"' => ret += "&quot;",
			'\'' => ret += "&apos;",
			_ => ret.push(c),
		}
	}
	ret
}

// Visual Studio doesn't seem to support extended-length name syntax
fn input_path(path: &Path) -> String {
	escape(path.to_string_lossy().trim_start_matches(r"\\?\"))
}

fn joined_paths<'a>(paths: impl Iterator<Item = &'a Path>) -> String {
	paths.map(input_path).collect::<Vec<String>>().join(";")
}

/// A `.vcxproj` that delegates building to the host build command, one configuration per
/// target binary.
pub(crate) fn vcxproj(project: &ProjectDescriptor, build_command: &str) -> String {
	let project_name = escape(project.name());
	let project_guid = guid_str(project.guid());
	let clean_task = project.unit().task_path("clean");

	let mut out_str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project DefaultTargets="Build" ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <ItemGroup Label="ProjectConfigurations">
"#
	.to_owned();
	for config in project.configurations() {
		let key = escape(&config.configuration_key());
		let configuration = escape(config.configuration_name());
		let platform = escape(config.platform_name());
		out_str += &format!(
			r#"    <ProjectConfiguration Include="{key}">
      <Configuration>{configuration}</Configuration>
      <Platform>{platform}</Platform>
    </ProjectConfiguration>
"#
		);
	}
	out_str += "  </ItemGroup>\n";
	out_str += &format!(
		r#"  <PropertyGroup Label="Globals">
    <ProjectGuid>{{{project_guid}}}</ProjectGuid>
    <ConfigurationType>Makefile</ConfigurationType>
    <Keyword>MakeFileProj</Keyword>
    <RootNamespace>{project_name}</RootNamespace>
  </PropertyGroup>
  <Import Project="$(VCTargetsPath)\Microsoft.Cpp.Default.props" />
"#
	);
	for config in project.configurations() {
		let key = escape(&config.configuration_key());
		out_str += &format!(
			r#"  <PropertyGroup Condition="'$(Configuration)|$(Platform)'=='{key}'" Label="Configuration">
    <ConfigurationType>Makefile</ConfigurationType>
    <PlatformToolset>{PLATFORM_TOOLSET}</PlatformToolset>
  </PropertyGroup>
"#
		);
	}
	out_str += r#"  <Import Project="$(VCTargetsPath)\Microsoft.Cpp.props" />
  <ImportGroup Label="ExtensionSettings">
  </ImportGroup>
  <ImportGroup Label="PropertySheets">
  </ImportGroup>
  <PropertyGroup Label="UserMacros" />
"#;
	for config in project.configurations() {
		let key = escape(&config.configuration_key());
		let build = escape(&format!("{} {}", build_command, config.build_task_path()));
		let clean = escape(&format!("{} {}", build_command, clean_task));
		let rebuild = escape(&format!("{} {} {}", build_command, clean_task, config.build_task_path()));
		let output = input_path(&config.output_file());
		let defines = escape(&config.defines().join(";"));
		let includes = joined_paths(config.include_dirs().iter().map(|x| x.as_path()));
		out_str += &format!(
			r#"  <PropertyGroup Condition="'$(Configuration)|$(Platform)'=='{key}'">
    <NMakeBuildCommandLine>{build}</NMakeBuildCommandLine>
    <NMakeCleanCommandLine>{clean}</NMakeCleanCommandLine>
    <NMakeReBuildCommandLine>{rebuild}</NMakeReBuildCommandLine>
    <NMakeOutput>{output}</NMakeOutput>
    <NMakePreprocessorDefinitions>{defines}</NMakePreprocessorDefinitions>
    <NMakeIncludeSearchPath>{includes}</NMakeIncludeSearchPath>
    <IntDir>$(ProjectName)\$(Configuration)\</IntDir>
  </PropertyGroup>
"#
		);
	}
	out_str += "  <ItemDefinitionGroup>\n  </ItemDefinitionGroup>\n";

	let sources = project.source_files();
	if !sources.is_empty() {
		out_str += "  <ItemGroup>\n";
		for src in &sources {
			out_str += &format!("    <ClCompile Include=\"{}\" />\n", input_path(src));
		}
		out_str += "  </ItemGroup>\n";
	}
	let headers = project.header_files();
	if !headers.is_empty() {
		out_str += "  <ItemGroup>\n";
		for header in &headers {
			out_str += &format!("    <ClInclude Include=\"{}\" />\n", input_path(header));
		}
		out_str += "  </ItemGroup>\n";
	}
	if !project.auxiliary_sources().is_empty() {
		out_str += "  <ItemGroup>\n";
		for file in project.auxiliary_sources() {
			out_str += &format!("    <None Include=\"{}\" />\n", input_path(file));
		}
		out_str += "  </ItemGroup>\n";
	}
	out_str += r#"  <Import Project="$(VCTargetsPath)\Microsoft.Cpp.targets" />
  <ImportGroup Label="ExtensionTargets">
  </ImportGroup>
</Project>
"#;
	out_str
}

fn filter_definition(project: &ProjectDescriptor, name: &str, extensions: &str) -> String {
	let guid = guid_str(name_uuid(&format!("vsgen:filter:{}:{}", project.guid(), name)));
	format!(
		r#"    <Filter Include="{name}">
      <UniqueIdentifier>{{{guid}}}</UniqueIdentifier>
      <Extensions>{extensions}</Extensions>
    </Filter>
"#
	)
}

fn filter_items(element: &str, filter: &str, files: &[impl AsRef<Path>]) -> String {
	if files.is_empty() {
		return String::new();
	}
	let mut ret = "  <ItemGroup>\n".to_owned();
	for file in files {
		ret += &format!(
			r#"    <{element} Include="{}">
      <Filter>{filter}</Filter>
    </{element}>
"#,
			input_path(file.as_ref())
		);
	}
	ret += "  </ItemGroup>\n";
	ret
}

/// The `.vcxproj.filters` companion that groups a project's files in Solution Explorer.
pub(crate) fn filters(project: &ProjectDescriptor) -> String {
	let mut out_str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="4.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <ItemGroup>
"#
	.to_owned();
	out_str += &filter_definition(project, SOURCE_FILTER, "cpp;c;cc;cxx;def;odl;idl;hpj;bat;asm;asmx");
	out_str += &filter_definition(project, HEADER_FILTER, "h;hh;hpp;hxx;hm;inl;inc;xsd");
	if !project.auxiliary_sources().is_empty() {
		out_str += &filter_definition(project, BUILD_SCRIPT_FILTER, "toml;gradle;txt");
	}
	out_str += "  </ItemGroup>\n";
	out_str += &filter_items("ClCompile", SOURCE_FILTER, &project.source_files());
	out_str += &filter_items("ClInclude", HEADER_FILTER, &project.header_files());
	out_str += &filter_items("None", BUILD_SCRIPT_FILTER, project.auxiliary_sources());
	out_str += "</Project>\n";
	out_str
}

fn to_sln_project_section(project: &SolutionProject, solution_dir: &Path) -> String {
	let proj_name = &project.name;
	let vcxproj_path = match project.project_file.strip_prefix(solution_dir) {
		Ok(relative) => relative.to_string_lossy().into_owned(),
		Err(_) => project.project_file.to_string_lossy().into_owned(),
	};
	let guid = guid_str(project.guid);
	let mut ret = format!(
		r#"Project("{{{VS_CPP_GUID}}}") = "{proj_name}", "{vcxproj_path}", "{{{guid}}}"
"#
	);
	if !project.dependencies.is_empty() {
		ret += "	ProjectSection(ProjectDependencies) = postProject\n";
	}
	for dep in &project.dependencies {
		let dep_guid = guid_str(*dep);
		ret += &format!("		{{{dep_guid}}} = {{{dep_guid}}}\n");
	}
	if !project.dependencies.is_empty() {
		ret += "	EndProjectSection\n";
	}
	ret += "EndProject\n";
	ret
}

/// The `.sln` listing every project of the tree.
///
/// Solution configurations are the union of all project configurations. A project without a
/// matching configuration is mapped to its first one and excluded from that solution build.
pub(crate) fn sln(solution_dir: &Path, solution_guid: Uuid, projects: &[SolutionProject]) -> String {
	let mut sln_content = r#"
Microsoft Visual Studio Solution File, Format Version 12.00
# Visual Studio Version 17
"#
	.to_string();

	for proj in projects {
		sln_content += &to_sln_project_section(proj, solution_dir);
	}

	let mut solution_configs = Vec::<&(String, String)>::new();
	for proj in projects {
		for config in &proj.configurations {
			if !solution_configs.contains(&config) {
				solution_configs.push(config);
			}
		}
	}

	sln_content += r#"Global
	GlobalSection(SolutionConfigurationPlatforms) = preSolution
"#;
	for (config, platform) in &solution_configs {
		sln_content += &format!("\t\t{config}|{platform} = {config}|{platform}\n");
	}
	sln_content += "	EndGlobalSection\n";

	sln_content += "	GlobalSection(ProjectConfigurationPlatforms) = postSolution\n";
	for proj in projects {
		let guid = guid_str(proj.guid);
		let Some(fallback) = proj.configurations.first() else {
			continue;
		};
		for solution_config in &solution_configs {
			let (sln_config, sln_platform) = solution_config;
			let has_config = proj.configurations.contains(solution_config);
			let (config, platform) = if has_config { *solution_config } else { fallback };
			sln_content +=
				&format!("\t\t{{{guid}}}.{sln_config}|{sln_platform}.ActiveCfg = {config}|{platform}\n");
			if has_config {
				sln_content +=
					&format!("\t\t{{{guid}}}.{sln_config}|{sln_platform}.Build.0 = {config}|{platform}\n");
			}
		}
	}
	sln_content += "	EndGlobalSection\n";

	let sln_guid = guid_str(solution_guid);
	sln_content += &format!(
		r#"	GlobalSection(SolutionProperties) = preSolution
		HideSolutionNode = FALSE
	EndGlobalSection
	GlobalSection(ExtensibilityGlobals) = postSolution
		SolutionGuid = {{{sln_guid}}}
	EndGlobalSection
"#
	);
	sln_content += "EndGlobal\n";
	sln_content
}

#[cfg(test)]
mod tests {
	use std::{path::PathBuf, sync::Arc};

	use super::*;
	use crate::{
		binary::BinaryVariant,
		component::{ComponentKind, LogicalComponent},
		link_type::BinaryOutput,
		target::{OutputKind, TargetBinary},
		unit::BuildUnit,
	};

	fn game() -> ProjectDescriptor {
		let unit = Arc::new(BuildUnit::root("demo", "/src/demo").with_build_file("/src/demo/vsgen.toml"));
		let component = Arc::new(LogicalComponent::new("game", ":", ComponentKind::Application));
		let mut project = ProjectDescriptor::new("game", unit.clone(), Path::new("/src/demo"));
		for configuration in ["debug", "release"] {
			let mut binary = BinaryVariant::new(configuration, "x86-64", BinaryOutput::Executable);
			binary.sources = vec![PathBuf::from("/src/demo/main.cpp")];
			binary.headers = vec![PathBuf::from("/src/demo/game.h")];
			binary.defines = vec!["A=1".to_owned(), "B".to_owned()];
			binary.include_dirs = vec![PathBuf::from("/src/demo/include")];
			let target = TargetBinary::new(unit.clone(), component.clone(), Arc::new(binary), OutputKind::Executable);
			project.add_configuration(Arc::new(target));
		}
		project.add_auxiliary_source(Path::new("/src/demo/vsgen.toml"));
		project
	}

	#[test]
	fn vcxproj_lists_configurations_and_files_once() {
		let content = vcxproj(&game(), "vsgen");
		assert_eq!(content.matches("<ProjectConfiguration Include=").count(), 2);
		assert!(content.contains(r#"<ProjectConfiguration Include="release|x64">"#));
		assert!(content.contains("<NMakeBuildCommandLine>vsgen :installGameDebug</NMakeBuildCommandLine>"));
		assert!(content.contains("<NMakeReBuildCommandLine>vsgen :clean :installGameRelease</NMakeReBuildCommandLine>"));
		assert!(content.contains("<NMakePreprocessorDefinitions>A=1;B</NMakePreprocessorDefinitions>"));
		assert_eq!(content.matches(r#"<ClCompile Include="/src/demo/main.cpp" />"#).count(), 1);
		assert_eq!(content.matches(r#"<ClInclude Include="/src/demo/game.h" />"#).count(), 1);
		assert!(content.contains(r#"<None Include="/src/demo/vsgen.toml" />"#));
	}

	#[test]
	fn rendering_is_deterministic() {
		assert_eq!(vcxproj(&game(), "vsgen"), vcxproj(&game(), "vsgen"));
		assert_eq!(filters(&game()), filters(&game()));
	}

	#[test]
	fn filters_assign_every_file() {
		let content = filters(&game());
		assert!(content.contains(r#"<Filter Include="Build Scripts">"#));
		assert_eq!(content.matches("<Filter>Source Files</Filter>").count(), 1);
		assert_eq!(content.matches("<Filter>Header Files</Filter>").count(), 1);
		assert_eq!(content.matches("<Filter>Build Scripts</Filter>").count(), 1);
	}

	#[test]
	fn escapes_markup() {
		assert_eq!(escape(r#"a&b<"c">"#), "a&amp;b&lt;&quot;c&quot;&gt;");
	}

	#[test]
	fn sln_maps_missing_configurations() {
		let project = |name: &str, configs: &[&str]| SolutionProject {
			name: name.to_owned(),
			component_name: name.to_owned(),
			unit_path: ":".to_owned(),
			guid: name_uuid(name),
			project_file: PathBuf::from(format!("/src/demo/{}.vcxproj", name)),
			configurations: configs.iter().map(|x| (x.to_string(), "x64".to_owned())).collect(),
			links: Vec::new(),
			dependencies: Vec::new(),
		};
		let game = project("game", &["debug", "release"]);
		let core = project("core", &["debugShared"]);
		let guid = guid_str(core.guid);
		let content = sln(Path::new("/src/demo"), name_uuid("demo"), &[game, core]);

		assert!(content.contains(r#""game", "game.vcxproj""#));
		assert!(content.contains("\t\tdebugShared|x64 = debugShared|x64\n"));
		assert!(content.contains(&format!("{{{guid}}}.release|x64.ActiveCfg = debugShared|x64")));
		assert!(!content.contains(&format!("{{{guid}}}.release|x64.Build.0")));
		assert!(content.contains(&format!("{{{guid}}}.debugShared|x64.Build.0 = debugShared|x64")));
	}
}
