use crate::filter::{PageWindow, TaskQuery};
use crate::models::{BpmTask, CoreError, ProcessDefinitionConfig};

pub type PersistenceResult<T> = Result<T, CoreError>;

/// One page of queue results together with the unpaged total, so callers can
/// render paging controls from a single consistent read.
#[derive(Clone, Debug)]
pub struct TaskPage {
    pub tasks: Vec<BpmTask>,
    pub total_records: u64,
}

/// Schema lifecycle operations for a task store.
pub trait MigrationStore: Send + Sync {
    fn current_version(&self) -> PersistenceResult<i64>;

    fn apply_migration(&self, target_version: i64) -> PersistenceResult<()>;
}

/// Read side of the derived task queues.
pub trait TaskQueueStore: Send + Sync {
    fn find_filtered_tasks(
        &self,
        query: &TaskQuery,
        window: PageWindow,
    ) -> PersistenceResult<TaskPage>;

    fn filtered_tasks_count(&self, query: &TaskQuery) -> PersistenceResult<u64>;
}

/// Registry of published process definitions.
pub trait DefinitionStore: Send + Sync {
    fn register_definition(&self, definition: &ProcessDefinitionConfig) -> PersistenceResult<()>;

    fn load_definition(&self, definition_id: &str)
    -> PersistenceResult<Option<ProcessDefinitionConfig>>;

    fn list_definitions(&self) -> PersistenceResult<Vec<ProcessDefinitionConfig>>;
}
