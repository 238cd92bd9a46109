//! Task matching and scoring.
//!
//! A produced output is compared against every task in definition order and
//! the first match wins. Whether the match earns anything then depends on
//! the credit policy, the shared used-task set, dependency credits and, for
//! hosts, the world resource pool. Every refusal is a [`TaskOutcome`]
//! variant rather than an error.

pub mod bits;
pub mod io_bank;
pub mod library;

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use std::collections::HashMap;
use symbiolab_data::OrgKind;

use crate::config::TaskDefinition;
use crate::cpu::state::{CpuState, IoRingBuffer, Niche, INPUT_BUFFER_LEN};
use crate::error::{Result, SimError};
use crate::metrics::TickCounters;
use crate::resources::ResourcePool;

pub use bits::{TaskBits, MAX_TASKS};
pub use io_bank::{IoSet, TaskIo, TaskIoBank, DEFAULT_INPUTS, MAX_ENV_BUILD_TRIES};

pub type TaskId = usize;

/// How a task turns inputs into its expected output.
#[derive(Clone, Copy, Debug)]
pub enum TaskFn {
    Unary(fn(u32) -> u32),
    Binary(fn(u32, u32) -> u32),
    /// Judged on the output alone.
    Output(fn(u32) -> bool),
}

impl TaskFn {
    pub fn arity(&self) -> usize {
        match self {
            TaskFn::Unary(_) => 1,
            TaskFn::Binary(_) => 2,
            TaskFn::Output(_) => 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Task {
    pub name: String,
    pub function: TaskFn,
    pub reward: f64,
    /// Credited on every match instead of once per reset interval.
    pub unlimited: bool,
    /// Prerequisite tasks and how many credits of each are consumed.
    pub dependencies: Vec<(TaskId, u32)>,
}

impl Task {
    pub fn new(name: impl Into<String>, function: TaskFn, reward: f64) -> Self {
        Self {
            name: name.into(),
            function,
            reward,
            unlimited: false,
            dependencies: Vec::new(),
        }
    }

    /// Whether `output` is this task's result for some adjacent pair of
    /// recent inputs.
    ///
    /// Empty input slots are skipped, as is any pair the output merely
    /// echoes.
    pub fn check(&self, inputs: &IoRingBuffer<INPUT_BUFFER_LEN>, output: u32) -> bool {
        if let TaskFn::Output(judge) = self.function {
            return judge(output);
        }
        (0..inputs.len()).any(|i| {
            let (a, b) = (inputs.get(i), inputs.get(i + 1));
            if a == 0 || output == a || output == b {
                return false;
            }
            match self.function {
                TaskFn::Unary(f) => f(a) == output,
                TaskFn::Binary(f) => b != 0 && f(a, b) == output,
                TaskFn::Output(_) => false,
            }
        })
    }
}

/// Result of scoring one output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TaskOutcome {
    NoMatch,
    /// Matched a task that was already credited since the last reset.
    AlreadyUsed(TaskId),
    /// The only-first-task policy forbids crediting this task.
    CreditDenied(TaskId),
    MissingDependencies(TaskId),
    /// The world pool could not pay for the host's task.
    ResourcesExhausted(TaskId),
    Credited { task: TaskId, reward: f64 },
}

impl TaskOutcome {
    pub fn reward(&self) -> f64 {
        match self {
            TaskOutcome::Credited { reward, .. } => *reward,
            _ => 0.0,
        }
    }

    pub fn task(&self) -> Option<TaskId> {
        match *self {
            TaskOutcome::NoMatch => None,
            TaskOutcome::AlreadyUsed(t)
            | TaskOutcome::CreditDenied(t)
            | TaskOutcome::MissingDependencies(t)
            | TaskOutcome::ResourcesExhausted(t)
            | TaskOutcome::Credited { task: t, .. } => Some(t),
        }
    }
}

/// Everything beyond the organism's own state that scoring consults.
pub struct CreditContext<'a> {
    pub kind: OrgKind,
    pub only_first_task: bool,
    /// The host's niche when scoring a hosted symbiont.
    pub shared_niche: Option<&'a mut Niche>,
    /// Whether the organism currently has a partner. Paired organisms
    /// credit dependencies to the shared pool.
    pub paired: bool,
    pub pool: Option<&'a ResourcePool>,
    pub counters: Option<&'a TickCounters>,
}

impl<'a> CreditContext<'a> {
    /// A lone host with no pool or counters attached.
    pub fn solo(kind: OrgKind) -> Self {
        Self {
            kind,
            only_first_task: false,
            shared_niche: None,
            paired: false,
            pool: None,
            counters: None,
        }
    }
}

/// The task environment.
#[derive(Clone, Debug)]
pub struct TaskSet {
    tasks: Vec<Task>,
    index: HashMap<String, TaskId>,
}

impl Default for TaskSet {
    fn default() -> Self {
        Self::logic()
    }
}

impl TaskSet {
    pub fn empty() -> Self {
        Self {
            tasks: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// NOT, NAND, AND, ORN, OR, ANDN, NOR, XOR, EQU at the standard reward.
    pub fn logic() -> Self {
        let mut set = Self::empty();
        for name in library::LOGIC_TASKS {
            if let Some(function) = library::lookup(name) {
                set.tasks.push(Task::new(name, function, library::LOGIC_REWARD));
                set.index.insert(name.to_string(), set.tasks.len() - 1);
            }
        }
        set
    }

    pub fn add(&mut self, task: Task) -> Result<TaskId> {
        if self.index.contains_key(&task.name) {
            return Err(SimError::DuplicateTask(task.name));
        }
        if self.tasks.len() >= MAX_TASKS {
            return Err(SimError::TooManyTasks {
                count: self.tasks.len() + 1,
                max: MAX_TASKS,
            });
        }
        let id = self.tasks.len();
        for &(dep, _) in &task.dependencies {
            assert!(dep < id, "dependency {dep} of {} not yet defined", task.name);
        }
        self.index.insert(task.name.clone(), id);
        self.tasks.push(task);
        Ok(id)
    }

    /// Builds a task set from configuration, rejecting unknown functions,
    /// duplicate names and dependency cycles. No definitions means the
    /// logic tasks.
    pub fn from_definitions(definitions: &[TaskDefinition]) -> Result<Self> {
        if definitions.is_empty() {
            return Ok(Self::logic());
        }
        if definitions.len() > MAX_TASKS {
            return Err(SimError::TooManyTasks {
                count: definitions.len(),
                max: MAX_TASKS,
            });
        }

        let mut graph = DiGraph::<TaskId, ()>::new();
        let mut ids = HashMap::new();
        let mut tasks = Vec::with_capacity(definitions.len());
        for (id, def) in definitions.iter().enumerate() {
            let function =
                library::lookup(&def.name).ok_or_else(|| SimError::unknown_task(&def.name))?;
            if ids.insert(def.name.clone(), graph.add_node(id)).is_some() {
                return Err(SimError::DuplicateTask(def.name.clone()));
            }
            tasks.push(Task {
                unlimited: def.unlimited,
                ..Task::new(def.name.clone(), function, def.reward)
            });
        }

        for (id, def) in definitions.iter().enumerate() {
            let mut needed: Vec<(TaskId, u32)> = Vec::new();
            for dep in &def.dependencies {
                let node = *ids.get(dep).ok_or_else(|| SimError::UnknownDependency {
                    task: def.name.clone(),
                    dependency: dep.clone(),
                })?;
                graph.add_edge(node, ids[&def.name], ());
                let dep_id = graph[node];
                match needed.iter_mut().find(|(d, _)| *d == dep_id) {
                    Some((_, count)) => *count += 1,
                    None => needed.push((dep_id, 1)),
                }
            }
            tasks[id].dependencies = needed;
        }

        toposort(&graph, None).map_err(|cycle| {
            SimError::DependencyCycle(definitions[graph[cycle.node_id()]].name.clone())
        })?;

        let index = ids.into_iter().map(|(name, node)| (name, graph[node])).collect();
        Ok(Self { tasks, index })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn id_of(&self, name: &str) -> Option<TaskId> {
        self.index.get(name).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    /// Lowest-indexed task `output` satisfies. Outputs 0 and 1 satisfy
    /// nothing.
    pub fn match_output(
        &self,
        inputs: &IoRingBuffer<INPUT_BUFFER_LEN>,
        output: u32,
    ) -> Option<TaskId> {
        if output <= 1 {
            return None;
        }
        self.tasks.iter().position(|task| task.check(inputs, output))
    }

    pub fn is_solved(&self, state: &CpuState, output: u32) -> bool {
        self.match_output(&state.inputs, output).is_some()
    }

    /// Whether the only-first-task policy would still allow crediting
    /// `task`: nothing credited yet, or only this very task.
    pub fn is_only_task(state: &CpuState, task: TaskId) -> bool {
        let done = state.tasks_performed;
        done.is_empty() || (done.count() == 1 && done.get(task))
    }

    /// Scores one output and applies the credit to `state`.
    ///
    /// The returned reward is not added to any balance; the caller owns the
    /// organism's points.
    pub fn process_output(
        &self,
        state: &mut CpuState,
        output: u32,
        ctx: CreditContext<'_>,
    ) -> TaskOutcome {
        let Some(id) = self.match_output(&state.inputs, output) else {
            return TaskOutcome::NoMatch;
        };
        let task = &self.tasks[id];

        if ctx.only_first_task && !Self::is_only_task(state, id) {
            return TaskOutcome::CreditDenied(id);
        }

        let CpuState {
            tasks_performed,
            available_dependencies: own,
            niche: own_niche,
            ..
        } = state;
        let niche = match ctx.shared_niche {
            Some(shared) => shared,
            None => own_niche,
        };

        if !task.unlimited && niche.used.get(id) {
            return TaskOutcome::AlreadyUsed(id);
        }

        let shared = &mut niche.shared_dependencies;
        let satisfied = task
            .dependencies
            .iter()
            .all(|&(dep, needed)| own[dep] + shared[dep] >= needed);
        if !satisfied {
            return TaskOutcome::MissingDependencies(id);
        }

        let reward = match (ctx.kind, ctx.pool) {
            (OrgKind::Host, Some(pool)) => pool.pull(task.reward),
            _ => task.reward,
        };
        if reward <= 0.0 && task.reward > 0.0 {
            return TaskOutcome::ResourcesExhausted(id);
        }

        for &(dep, needed) in &task.dependencies {
            let from_own = needed.min(own[dep]);
            own[dep] -= from_own;
            let rest = needed - from_own;
            assert!(shared[dep] >= rest, "dependency counter for task {dep} would go negative");
            shared[dep] -= rest;
        }

        tasks_performed.set(id);
        niche.used.set(id);
        if ctx.paired {
            niche.shared_dependencies[id] += 1;
        } else {
            own[id] += 1;
        }
        if let Some(counters) = ctx.counters {
            counters.record_task(ctx.kind, id);
        }
        TaskOutcome::Credited { task: id, reward }
    }
}
