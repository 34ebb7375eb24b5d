use std::time::SystemTime;

use crate::models::InstanceId;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// The actionable unit of work. A task belongs to exactly one process
/// instance for its lifetime; a finished task is immutable and no longer a
/// member of any queue.
///
/// The owning instance's creator login, external key, and definition display
/// text are carried as read-only copies so queue pages and projections need
/// no second lookup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BpmTask {
    task_id: TaskId,
    execution_id: String,
    instance_id: InstanceId,
    definition_id: String,
    definition_key: String,
    definition_description: String,
    creator_login: String,
    external_key: Option<String>,
    step_name: String,
    task_name: String,
    assignee: Option<String>,
    group_id: Option<String>,
    create_date: SystemTime,
    finish_date: Option<SystemTime>,
    deadline_date: Option<SystemTime>,
}

impl BpmTask {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        task_id: TaskId,
        execution_id: String,
        instance_id: InstanceId,
        definition_id: String,
        definition_key: String,
        definition_description: String,
        creator_login: String,
        external_key: Option<String>,
        step_name: String,
        task_name: String,
        assignee: Option<String>,
        group_id: Option<String>,
        create_date: SystemTime,
        finish_date: Option<SystemTime>,
        deadline_date: Option<SystemTime>,
    ) -> Self {
        Self {
            task_id,
            execution_id,
            instance_id,
            definition_id,
            definition_key,
            definition_description,
            creator_login,
            external_key,
            step_name,
            task_name,
            assignee,
            group_id,
            create_date,
            finish_date,
            deadline_date,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn definition_id(&self) -> &str {
        &self.definition_id
    }

    pub fn definition_key(&self) -> &str {
        &self.definition_key
    }

    pub fn definition_description(&self) -> &str {
        &self.definition_description
    }

    pub fn creator_login(&self) -> &str {
        &self.creator_login
    }

    pub fn external_key(&self) -> Option<&str> {
        self.external_key.as_deref()
    }

    pub fn step_name(&self) -> &str {
        &self.step_name
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn assignee(&self) -> Option<&str> {
        self.assignee.as_deref()
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    pub fn create_date(&self) -> SystemTime {
        self.create_date
    }

    pub fn finish_date(&self) -> Option<SystemTime> {
        self.finish_date
    }

    pub fn deadline_date(&self) -> Option<SystemTime> {
        self.deadline_date
    }

    /// A task is finished exactly when its finish date is set.
    pub fn is_finished(&self) -> bool {
        self.finish_date.is_some()
    }
}
