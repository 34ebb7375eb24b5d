use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::models::TaskId;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CoreErrorKind {
    Validation,
    Authorization,
    Conflict,
    Execution,
    StorageFailure,
    Internal,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CoreError {
    pub process: Option<String>,
    pub task: Option<TaskId>,
    pub action: Option<String>,
    pub kind: CoreErrorKind,
    pub message: String,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            process: None,
            task: None,
            action: None,
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Validation, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Conflict, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Execution, message)
    }

    pub fn for_task(mut self, task: TaskId) -> Self {
        self.task = self.task.or(Some(task));
        self
    }

    pub fn for_process(mut self, process: impl Into<String>) -> Self {
        self.process = self.process.or(Some(process.into()));
        self
    }

    pub fn for_action(mut self, action: impl Into<String>) -> Self {
        self.action = self.action.or(Some(action.into()));
        self
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for CoreError {}
