use std::{
	path::PathBuf, //
	process::ExitCode,
	sync::Arc,
};

use clap::{Arg, ArgAction, Command};

use vsgen::{host::tasks::TaskGraph, manifest, plugin};

const SOURCE_DIR: &str = "source-dir";
const TASKS: &str = "tasks";

fn cli() -> Command {
	Command::new("vsgen")
		.about("Generates Visual Studio projects and a solution for a native build")
		.arg(
			Arg::new(SOURCE_DIR)
				.short('S')
				.long(SOURCE_DIR)
				.value_name("path-to-source")
				.value_parser(clap::value_parser!(PathBuf))
				.default_value(".")
				.help("Specify the source directory"),
		)
		.arg(
			Arg::new(TASKS)
				.value_name("TASK")
				.action(ArgAction::Append)
				.help(format!(
					"Tasks to run, e.g. {} or {} (default: {})",
					plugin::LIFECYCLE_TASK_NAME,
					plugin::CLEAN_TASK_NAME,
					plugin::LIFECYCLE_TASK_NAME
				)),
		)
}

fn main() -> ExitCode {
	env_logger::Builder::from_env(env_logger::Env::default().filter_or("VSGEN_LOG", "off"))
		.format_timestamp(None)
		.init();

	let matches = cli().get_matches();
	let src_dir = match matches.get_one::<PathBuf>(SOURCE_DIR) {
		Some(x) => x.clone(),
		None => PathBuf::from("."),
	};
	let requested = match matches.get_many::<String>(TASKS) {
		Some(tasks) => tasks.map(|x| x.as_str()).collect::<Vec<&str>>(),
		None => vec![plugin::LIFECYCLE_TASK_NAME],
	};

	println!("source-dir: {}", src_dir.display());

	let tree = match manifest::load_build_tree(&src_dir) {
		Ok(x) => x,
		Err(e) => {
			println!("Error: {:#}", e);
			return ExitCode::FAILURE;
		}
	};

	let tasks = Arc::new(TaskGraph::new());
	if let Err(e) = vsgen::configure(&tree, tasks.clone()) {
		println!("Error: {:#}", e);
		return ExitCode::FAILURE;
	}

	let report = match tasks.run(&requested) {
		Ok(x) => x,
		Err(e) => {
			println!("Error: {:#}", e);
			return ExitCode::FAILURE;
		}
	};
	for (path, outcome) in &report.outcomes {
		println!("> Task {} {}", path, outcome);
	}

	ExitCode::SUCCESS
}
