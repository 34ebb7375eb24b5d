pub mod routing;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::models::{
    BpmTask, CoreError, CoreErrorKind, EXTERNAL_KEY_PROPERTY, InstanceId, ProcessInstance, TaskId,
};
use crate::sqlite::{NewTask, TxContext};

pub use routing::{INITIATOR_PLACEHOLDER, TableNavigator};

pub type EngineResult<T> = Result<T, CoreError>;

/// Action name used when a task's deadline timer fires. Routed through the
/// same executor path as user actions.
pub const DEADLINE_TIMER_ACTION: &str = "system.deadline";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Assignment {
    User(String),
    Group(String),
}

/// One step to open, as resolved by the process navigator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepSpec {
    pub step_name: String,
    pub task_name: String,
    pub assignment: Assignment,
    pub deadline: Option<Duration>,
}

/// Resolves process definitions to their step graph. Implementations hold
/// the routing tables; the executor holds the task lifecycle.
pub trait ProcessNavigator: Send + Sync {
    fn initial_steps(
        &self,
        definition_id: &str,
        creator_login: &str,
    ) -> EngineResult<Vec<StepSpec>>;

    fn route(
        &self,
        definition_id: &str,
        current_step: &str,
        action_name: &str,
    ) -> EngineResult<Vec<StepSpec>>;
}

#[derive(Clone, Debug)]
pub struct StartProcessResult {
    pub instance: ProcessInstance,
    pub tasks_assigned_to_creator: Vec<BpmTask>,
}

/// Drives task state transitions. All mutation happens through the supplied
/// transaction context, so a routing failure rolls back the finish of the
/// acted-on task along with any successors already opened.
#[derive(Clone)]
pub struct ActionExecutor {
    navigator: Arc<dyn ProcessNavigator>,
}

impl ActionExecutor {
    pub fn new(navigator: Arc<dyn ProcessNavigator>) -> Self {
        Self { navigator }
    }

    /// Completes the task under `action_name` and opens its successor tasks.
    /// Returns the successors in routing order; an empty vector means the
    /// path reached a terminal node.
    pub fn perform_action(
        &self,
        context: &TxContext<'_>,
        task_id: TaskId,
        action_name: &str,
    ) -> EngineResult<Vec<BpmTask>> {
        if action_name.trim().is_empty() {
            return Err(CoreError::validation("action name must not be empty").for_task(task_id));
        }

        let task = context
            .load_task(task_id)?
            .ok_or_else(|| {
                CoreError::validation(format!("task '{}' does not exist", task_id.0))
                    .for_task(task_id)
            })?;
        if task.is_finished() {
            return Err(conflict_already_finished(task_id).for_action(action_name));
        }

        let now = SystemTime::now();
        if !context.finish_task_if_active(task_id, now)? {
            return Err(conflict_already_finished(task_id).for_action(action_name));
        }

        let successors = self
            .navigator
            .route(task.definition_id(), task.step_name(), action_name)
            .map_err(|error| {
                error
                    .for_task(task_id)
                    .for_action(action_name)
                    .for_process(task.definition_id())
            })?;

        self.open_steps(context, task.instance_id(), task.execution_id(), &successors, now)
    }

    /// Creates an instance, applies initial attributes, and opens the initial
    /// steps. Returns the tasks assigned directly to the creator, in creation
    /// order, so callers can route the user straight to the first one.
    pub fn start_process(
        &self,
        context: &TxContext<'_>,
        definition_id: &str,
        attributes: &BTreeMap<String, String>,
        creator_login: &str,
    ) -> EngineResult<StartProcessResult> {
        let definition = context
            .load_definition(definition_id)?
            .ok_or_else(|| {
                CoreError::execution(format!("process definition '{definition_id}' is not known"))
                    .for_process(definition_id)
            })?;
        if !definition.enabled {
            return Err(CoreError::execution(format!(
                "process definition '{definition_id}' is disabled"
            ))
            .for_process(definition_id));
        }

        let now = SystemTime::now();
        let instance_id = context.insert_instance(definition_id, creator_login, now)?;

        for (name, value) in attributes {
            if name == EXTERNAL_KEY_PROPERTY {
                context
                    .set_external_key(instance_id, value)
                    .map_err(|error| error.for_process(definition_id))?;
            } else {
                context.set_simple_attribute(instance_id, name, value)?;
            }
        }

        let initial_steps = self
            .navigator
            .initial_steps(definition_id, creator_login)
            .map_err(|error| error.for_process(definition_id))?;
        let root_execution_id = instance_id.0.to_string();
        let opened =
            self.open_steps(context, instance_id, &root_execution_id, &initial_steps, now)?;

        let instance = context.load_instance(instance_id)?.ok_or_else(|| {
            CoreError::new(
                CoreErrorKind::Internal,
                "freshly created process instance could not be read back",
            )
            .for_process(definition_id)
        })?;

        let tasks_assigned_to_creator = opened
            .into_iter()
            .filter(|task| task.assignee() == Some(creator_login))
            .collect();

        Ok(StartProcessResult {
            instance,
            tasks_assigned_to_creator,
        })
    }

    /// Single successor continues the parent execution path; a fan-out forks
    /// it into indexed child paths.
    fn open_steps(
        &self,
        context: &TxContext<'_>,
        instance_id: InstanceId,
        parent_execution_id: &str,
        steps: &[StepSpec],
        now: SystemTime,
    ) -> EngineResult<Vec<BpmTask>> {
        let mut opened = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let execution_id = if steps.len() == 1 {
                parent_execution_id.to_string()
            } else {
                format!("{parent_execution_id}:{index}")
            };
            let (assignee, group_id) = match &step.assignment {
                Assignment::User(login) => (Some(login.clone()), None),
                Assignment::Group(group) => (None, Some(group.clone())),
            };
            let task = context.insert_task(&NewTask {
                instance_id,
                execution_id,
                step_name: step.step_name.clone(),
                task_name: step.task_name.clone(),
                assignee,
                group_id,
                create_date: now,
                deadline_date: step.deadline.map(|duration| now + duration),
            })?;
            opened.push(task);
        }
        Ok(opened)
    }
}

fn conflict_already_finished(task_id: TaskId) -> CoreError {
    CoreError::conflict(format!("task '{}' is already finished", task_id.0)).for_task(task_id)
}
