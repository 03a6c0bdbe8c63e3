use core::fmt;
use std::{
	collections::HashMap,
	fs,
	path::PathBuf,
	sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::{anyhow, bail, Context};

use crate::unit::BuildUnit;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
	Lifecycle,
	Delete,
	GenerateProject,
	GenerateFilters,
	GenerateSolution,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
	Executed,
	UpToDate,
}

impl fmt::Display for TaskOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TaskOutcome::Executed => f.write_str("EXECUTED"),
			TaskOutcome::UpToDate => f.write_str("UP-TO-DATE"),
		}
	}
}

/// The work a task does when it runs.
pub trait TaskAction: Send + Sync {
	/// Files written by this task. Queried whenever needed, so it may change over time.
	fn outputs(&self) -> Vec<PathBuf> {
		Vec::new()
	}
	fn execute(&self) -> anyhow::Result<TaskOutcome>;
}

/// Deletes a set of files. Outputs of other tasks are resolved when the delete runs.
#[derive(Default)]
pub struct Delete {
	paths: Mutex<Vec<PathBuf>>,
	outputs_of: Mutex<Vec<Arc<dyn TaskAction>>>,
}

impl Delete {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn delete(&self, path: impl Into<PathBuf>) {
		self.paths.lock().unwrap_or_else(PoisonError::into_inner).push(path.into());
	}

	pub fn delete_outputs_of(&self, action: Arc<dyn TaskAction>) {
		self.outputs_of.lock().unwrap_or_else(PoisonError::into_inner).push(action);
	}

	/// Everything this task would delete right now.
	pub fn targets(&self) -> Vec<PathBuf> {
		let mut targets = self.paths.lock().unwrap_or_else(PoisonError::into_inner).clone();
		let actions = self.outputs_of.lock().unwrap_or_else(PoisonError::into_inner).clone();
		for action in actions {
			for output in action.outputs() {
				if !targets.contains(&output) {
					targets.push(output);
				}
			}
		}
		targets
	}
}

impl TaskAction for Delete {
	fn execute(&self) -> anyhow::Result<TaskOutcome> {
		let mut deleted = 0;
		for target in self.targets() {
			if !target.exists() {
				continue;
			}
			fs::remove_file(&target).with_context(|| format!("Error deleting \"{}\"", target.display()))?;
			log::debug!("Deleted {}", target.display());
			deleted += 1;
		}
		Ok(if deleted == 0 { TaskOutcome::UpToDate } else { TaskOutcome::Executed })
	}
}

type TaskAddedListener = Arc<dyn Fn(&Arc<dyn TaskAction>) + Send + Sync>;

struct Subscription {
	unit_path: String,
	kind: TaskKind,
	listener: TaskAddedListener,
}

struct Task {
	path: String,
	name: String,
	unit_path: String,
	kind: TaskKind,
	action: Option<Arc<dyn TaskAction>>,
	depends_on: Vec<TaskId>,
}

#[derive(Default)]
struct Tasks {
	tasks: Vec<Task>,
	by_path: HashMap<String, TaskId>,
	subscriptions: Vec<Subscription>,
}

impl Tasks {
	fn get(&self, id: TaskId) -> &Task {
		&self.tasks[id.0]
	}
}

/// Outcome of every task that ran, in execution order.
#[derive(Debug, Default)]
pub struct RunReport {
	pub outcomes: Vec<(String, TaskOutcome)>,
}

impl RunReport {
	pub fn outcome(&self, task_path: &str) -> Option<TaskOutcome> {
		self.outcomes.iter().find(|x| x.0 == task_path).map(|x| x.1)
	}
	pub fn executed(&self) -> Vec<&str> {
		self.with_outcome(TaskOutcome::Executed)
	}
	pub fn up_to_date(&self) -> Vec<&str> {
		self.with_outcome(TaskOutcome::UpToDate)
	}
	fn with_outcome(&self, outcome: TaskOutcome) -> Vec<&str> {
		self.outcomes
			.iter()
			.filter(|x| x.1 == outcome)
			.map(|x| x.0.as_str())
			.collect()
	}
}

/// Named tasks of a build tree and the dependencies between them.
#[derive(Default)]
pub struct TaskGraph {
	inner: Mutex<Tasks>,
}

impl TaskGraph {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> MutexGuard<'_, Tasks> {
		self.inner.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Creates a task. Fails if the unit already has a task with that name.
	pub fn create(
		&self,
		unit: &BuildUnit,
		name: &str,
		kind: TaskKind,
		action: Option<Arc<dyn TaskAction>>,
	) -> anyhow::Result<TaskId> {
		let path = unit.task_path(name);
		let (id, listeners) = {
			let mut tasks = self.lock();
			if tasks.by_path.contains_key(&path) {
				bail!("Cannot add task '{}' as a task with that name already exists", path);
			}
			let id = TaskId(tasks.tasks.len());
			tasks.tasks.push(Task {
				path: path.clone(),
				name: name.to_owned(),
				unit_path: unit.path.clone(),
				kind,
				action: action.clone(),
				depends_on: Vec::new(),
			});
			tasks.by_path.insert(path.clone(), id);
			let listeners = tasks
				.subscriptions
				.iter()
				.filter(|x| x.kind == kind && x.unit_path == unit.path)
				.map(|x| x.listener.clone())
				.collect::<Vec<_>>();
			(id, listeners)
		};
		log::debug!("Created task {}", path);
		if let Some(action) = action {
			for listener in listeners {
				listener(&action);
			}
		}
		Ok(id)
	}

	/// Returns the task `name` of `unit`, creating it as an action-less task of `kind` if needed.
	pub fn maybe_create(&self, unit: &BuildUnit, name: &str, kind: TaskKind) -> anyhow::Result<TaskId> {
		match self.find(&unit.task_path(name)) {
			Some(id) => Ok(id),
			None => self.create(unit, name, kind, None),
		}
	}

	pub fn depends_on(&self, task: TaskId, dependency: TaskId) {
		let mut tasks = self.lock();
		let depends_on = &mut tasks.tasks[task.0].depends_on;
		if !depends_on.contains(&dependency) {
			depends_on.push(dependency);
		}
	}

	/// Calls `listener` with the action of every task of `kind` in `unit`, for tasks that exist
	/// already and for tasks created later.
	pub fn when_task_added(
		&self,
		unit: &BuildUnit,
		kind: TaskKind,
		listener: impl Fn(&Arc<dyn TaskAction>) + Send + Sync + 'static,
	) {
		let listener: TaskAddedListener = Arc::new(listener);
		let existing = {
			let mut tasks = self.lock();
			tasks.subscriptions.push(Subscription { unit_path: unit.path.clone(), kind, listener: listener.clone() });
			tasks
				.tasks
				.iter()
				.filter(|x| x.kind == kind && x.unit_path == unit.path)
				.filter_map(|x| x.action.clone())
				.collect::<Vec<_>>()
		};
		for action in &existing {
			listener(action);
		}
	}

	pub fn find(&self, path: &str) -> Option<TaskId> {
		self.lock().by_path.get(path).copied()
	}

	pub fn path(&self, id: TaskId) -> String {
		self.lock().get(id).path.clone()
	}

	pub fn kind(&self, id: TaskId) -> TaskKind {
		self.lock().get(id).kind
	}

	pub fn dependencies(&self, id: TaskId) -> Vec<TaskId> {
		self.lock().get(id).depends_on.clone()
	}

	pub fn outputs(&self, id: TaskId) -> Vec<PathBuf> {
		let action = self.lock().get(id).action.clone();
		action.map(|x| x.outputs()).unwrap_or_default()
	}

	pub fn tasks_of_kind(&self, kind: TaskKind) -> Vec<TaskId> {
		let tasks = self.lock();
		tasks
			.tasks
			.iter()
			.enumerate()
			.filter(|x| x.1.kind == kind)
			.map(|x| TaskId(x.0))
			.collect()
	}

	/// Runs the requested tasks and everything they depend on, dependencies first.
	///
	/// A request starting with `:` names one task by path; anything else selects the task with
	/// that name in every unit.
	pub fn run(&self, requests: &[&str]) -> anyhow::Result<RunReport> {
		let plan = {
			let tasks = self.lock();
			let mut selected = Vec::new();
			for request in requests {
				let matches = if request.starts_with(':') {
					tasks.by_path.get(*request).copied().into_iter().collect::<Vec<_>>()
				} else {
					let mut ids = tasks
						.tasks
						.iter()
						.enumerate()
						.filter(|x| x.1.name == *request)
						.map(|x| TaskId(x.0))
						.collect::<Vec<_>>();
					ids.sort_by(|a, b| tasks.get(*a).path.cmp(&tasks.get(*b).path));
					ids
				};
				if matches.is_empty() {
					return Err(anyhow!("Task '{}' not found", request));
				}
				selected.extend(matches);
			}

			let mut order = Vec::new();
			let mut state = HashMap::new();
			for id in selected {
				visit(&tasks, id, &mut state, &mut order)?;
			}
			order
				.into_iter()
				.map(|id| {
					let task = tasks.get(id);
					(task.path.clone(), task.action.clone())
				})
				.collect::<Vec<_>>()
		};

		let mut report = RunReport::default();
		for (path, action) in plan {
			log::debug!("Executing task {}", path);
			let outcome = match action {
				Some(action) => action.execute().with_context(|| format!("Execution failed for task '{}'", path))?,
				None => TaskOutcome::UpToDate,
			};
			report.outcomes.push((path, outcome));
		}
		Ok(report)
	}
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
	InProgress,
	Done,
}

fn visit(tasks: &Tasks, id: TaskId, state: &mut HashMap<TaskId, Visit>, order: &mut Vec<TaskId>) -> anyhow::Result<()> {
	match state.get(&id) {
		Some(Visit::Done) => return Ok(()),
		Some(Visit::InProgress) => bail!("Circular dependency involving task '{}'", tasks.get(id).path),
		None => {}
	}
	state.insert(id, Visit::InProgress);
	for dep in &tasks.get(id).depends_on {
		visit(tasks, *dep, state, order)?;
	}
	state.insert(id, Visit::Done);
	order.push(id);
	Ok(())
}
