use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::{ActionExecutor, DEADLINE_TIMER_ACTION};
use crate::filter::{PageWindow, ProcessInstanceFilter, SortDirection};
use crate::i18n::{Locale, MessageCatalog};
use crate::models::{CoreError, CoreErrorKind, EXTERNAL_KEY_PROPERTY, TaskId};
use crate::projection::{TaskView, project, project_for_queue};
use crate::sqlite::{SqliteStore, TransactionMode, TxContext};

/// Error source used when a failure cannot be attributed to a caller-supplied
/// field or task.
pub const SYSTEM_SOURCE: &str = "system";

const QUEUE_TYPE_QUEUE: &str = "queue";
const QUEUE_TYPE_PROCESS: &str = "process";

/// One reportable failure, attributed to the task or input it concerns.
/// Requests never fail wholesale over caller mistakes; they return these.
#[derive(Clone, Debug, Serialize, Eq, PartialEq)]
pub struct FieldError {
    pub source: String,
    pub message: String,
}

impl FieldError {
    fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }

    fn system(message: impl Into<String>) -> Self {
        Self::new(SYSTEM_SOURCE, message)
    }
}

/// Who is calling and in which locale responses should be rendered.
#[derive(Clone, Debug)]
pub struct CallerIdentity {
    login: Option<String>,
    locale: Locale,
}

impl CallerIdentity {
    pub fn anonymous(locale: Locale) -> Self {
        Self {
            login: None,
            locale,
        }
    }

    pub fn authorized(login: impl Into<String>, locale: Locale) -> Self {
        Self {
            login: Some(login.into()),
            locale,
        }
    }

    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct WidgetValue {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct PerformActionRequest {
    pub task_id: Option<String>,
    pub action_name: Option<String>,
    #[serde(default)]
    pub skip_save: bool,
    #[serde(default)]
    pub widget_values: Vec<WidgetValue>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct SaveTaskRequest {
    pub task_id: Option<String>,
    #[serde(default)]
    pub widget_values: Vec<WidgetValue>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct StartProcessRequest {
    pub definition_id: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct TaskSearchRequest {
    pub expression: Option<String>,
    pub process_key: Option<String>,
    pub sort_column: Option<String>,
    #[serde(default)]
    pub sort_descending: bool,
    pub offset: i64,
    pub length: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct QueueListRequest {
    pub queue_name: Option<String>,
    pub queue_type: Option<String>,
    pub expression: Option<String>,
    pub sort_column: Option<String>,
    #[serde(default)]
    pub sort_descending: bool,
    pub offset: i64,
    pub length: i64,
}

/// Result of performing an action. `next_task` is the first successor task,
/// or `None` when the path reached a terminal node.
#[derive(Clone, Debug, Serialize, Default)]
pub struct ActionResult {
    pub next_task: Option<TaskView>,
    pub errors: Vec<FieldError>,
}

#[derive(Clone, Debug, Serialize, Default)]
pub struct SaveResult {
    pub errors: Vec<FieldError>,
}

#[derive(Clone, Debug, Serialize, Default)]
pub struct NewProcessResult {
    pub task_id: Option<String>,
    pub step_name: Option<String>,
    pub errors: Vec<FieldError>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DataPage<T> {
    pub total_records: u64,
    pub data: Vec<T>,
    pub errors: Vec<FieldError>,
}

impl<T> DataPage<T> {
    fn failed(errors: Vec<FieldError>) -> Self {
        Self {
            total_records: 0,
            data: Vec::new(),
            errors,
        }
    }
}

/// The request-level facade over the store and the action executor. Each
/// request runs its store work on the blocking pool inside one transaction
/// scope and reports failures as field errors rather than panics.
#[derive(Clone)]
pub struct ProcessService {
    store: Arc<SqliteStore>,
    executor: ActionExecutor,
    catalog: Arc<MessageCatalog>,
}

impl ProcessService {
    pub fn new(
        store: Arc<SqliteStore>,
        executor: ActionExecutor,
        catalog: Arc<MessageCatalog>,
    ) -> Self {
        Self {
            store,
            executor,
            catalog,
        }
    }

    /// Completes a task under the named action. Unless `skip_save` is set,
    /// pending widget values are saved to the owning instance first, inside
    /// the same transaction, so a routing failure also rolls the save back.
    pub async fn perform_action(
        &self,
        caller: &CallerIdentity,
        request: PerformActionRequest,
    ) -> ActionResult {
        let Some(_login) = caller.login() else {
            return ActionResult {
                next_task: None,
                errors: vec![FieldError::system("user is not authorized")],
            };
        };
        let Some(raw_task_id) = non_empty(request.task_id.as_deref()) else {
            return ActionResult {
                next_task: None,
                errors: vec![FieldError::system("task id is required")],
            };
        };
        let Some(action_name) = non_empty(request.action_name.as_deref()) else {
            return ActionResult {
                next_task: None,
                errors: vec![FieldError::system("action name is required")],
            };
        };

        let task_id = match parse_task_id(raw_task_id) {
            Ok(task_id) => task_id,
            Err(error) => {
                return ActionResult {
                    next_task: None,
                    errors: vec![field_error_from(&error)],
                };
            }
        };
        let widget_errors = validate_widget_values(&request.widget_values);
        if !widget_errors.is_empty() {
            return ActionResult {
                next_task: None,
                errors: widget_errors,
            };
        }

        let action_name = action_name.to_string();
        let widget_values = request.widget_values;
        let skip_save = request.skip_save;
        let locale = caller.locale().clone();
        let store = self.store.clone();
        let executor = self.executor.clone();
        let catalog = self.catalog.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            store.with_transaction(
                "perform_action",
                TransactionMode::Synchronized,
                |context| {
                    if !skip_save {
                        save_widget_values(context, task_id, &widget_values)?;
                    }
                    let successors = executor.perform_action(context, task_id, &action_name)?;
                    Ok(successors
                        .first()
                        .map(|task| project(task, &catalog, &locale)))
                },
            )
        })
        .await;

        match flatten_join(outcome) {
            Ok(next_task) => ActionResult {
                next_task,
                errors: Vec::new(),
            },
            Err(error) => {
                tracing::error!(
                    task_id = task_id.0,
                    kind = ?error.kind,
                    message = %error.message,
                    "perform_action failed"
                );
                ActionResult {
                    next_task: None,
                    errors: vec![field_error_from(&error)],
                }
            }
        }
    }

    /// Persists widget values against the task's owning instance without
    /// advancing the task.
    pub async fn save_task(&self, caller: &CallerIdentity, request: SaveTaskRequest) -> SaveResult {
        if caller.login().is_none() {
            return SaveResult {
                errors: vec![FieldError::system("user is not authorized")],
            };
        }
        let Some(raw_task_id) = non_empty(request.task_id.as_deref()) else {
            return SaveResult {
                errors: vec![FieldError::system("task id is required")],
            };
        };
        let task_id = match parse_task_id(raw_task_id) {
            Ok(task_id) => task_id,
            Err(error) => {
                return SaveResult {
                    errors: vec![field_error_from(&error)],
                };
            }
        };

        let errors = validate_widget_values(&request.widget_values);
        if !errors.is_empty() {
            return SaveResult { errors };
        }

        let widget_values = request.widget_values;
        let store = self.store.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            store.with_transaction("save_task", TransactionMode::Synchronized, |context| {
                save_widget_values(context, task_id, &widget_values)
            })
        })
        .await;

        match flatten_join(outcome) {
            Ok(()) => SaveResult { errors: Vec::new() },
            Err(error) => {
                tracing::error!(
                    task_id = task_id.0,
                    kind = ?error.kind,
                    message = %error.message,
                    "save_task failed"
                );
                SaveResult {
                    errors: vec![field_error_from(&error)],
                }
            }
        }
    }

    /// Starts a new process instance and reports the first task assigned to
    /// its creator, when the initial routing opens one.
    pub async fn start_process(
        &self,
        caller: &CallerIdentity,
        request: StartProcessRequest,
    ) -> NewProcessResult {
        let Some(login) = caller.login() else {
            return NewProcessResult {
                task_id: None,
                step_name: None,
                errors: vec![FieldError::system("user is not authorized")],
            };
        };
        let Some(definition_id) = non_empty(request.definition_id.as_deref()) else {
            return NewProcessResult {
                task_id: None,
                step_name: None,
                errors: vec![FieldError::system("process definition id is required")],
            };
        };

        let definition_id = definition_id.to_string();
        let creator_login = login.to_string();
        let attributes = request.attributes;
        let store = self.store.clone();
        let executor = self.executor.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            store.with_transaction("start_process", TransactionMode::Synchronized, |context| {
                executor.start_process(context, &definition_id, &attributes, &creator_login)
            })
        })
        .await;

        match flatten_join(outcome) {
            Ok(started) => {
                let first = started.tasks_assigned_to_creator.first();
                NewProcessResult {
                    task_id: first.map(|task| task.task_id().0.to_string()),
                    step_name: first.map(|task| task.step_name().to_string()),
                    errors: Vec::new(),
                }
            }
            Err(error) => {
                tracing::error!(
                    kind = ?error.kind,
                    message = %error.message,
                    "start_process failed"
                );
                NewProcessResult {
                    task_id: None,
                    step_name: None,
                    errors: vec![field_error_from(&error)],
                }
            }
        }
    }

    /// Free-text task search across every queue visible to the caller.
    pub async fn search_tasks(
        &self,
        caller: &CallerIdentity,
        request: TaskSearchRequest,
    ) -> DataPage<TaskView> {
        if caller.login().is_none() {
            return DataPage::failed(vec![FieldError::system("user is not authorized")]);
        }

        let window = match PageWindow::new(request.offset, request.length) {
            Ok(window) => window,
            Err(error) => return DataPage::failed(vec![FieldError::system(error.to_string())]),
        };

        let mut filter = ProcessInstanceFilter::new().with_locale(caller.locale().clone());
        if let Some(expression) = &request.expression {
            filter = filter.with_expression(expression);
        }
        if let Some(process_key) = &request.process_key {
            filter = filter.with_process_key(process_key);
        }
        if let Some(column) = &request.sort_column {
            filter = filter.sorted_by(column, direction_of(request.sort_descending));
        }

        self.run_listing(filter, window, caller.locale().clone(), None)
            .await
    }

    /// Lists one derived queue: either a shared group queue or one of the
    /// caller's own process queues.
    pub async fn list_queue(
        &self,
        caller: &CallerIdentity,
        request: QueueListRequest,
    ) -> DataPage<TaskView> {
        let Some(login) = caller.login() else {
            return DataPage::failed(vec![FieldError::system("user is not authorized")]);
        };
        let Some(queue_name) = non_empty(request.queue_name.as_deref()) else {
            return DataPage::failed(vec![FieldError::system("queue name is required")]);
        };
        let Some(queue_type) = non_empty(request.queue_type.as_deref()) else {
            return DataPage::failed(vec![FieldError::system("queue type is required")]);
        };

        let window = match PageWindow::new(request.offset, request.length) {
            Ok(window) => window,
            Err(error) => return DataPage::failed(vec![FieldError::system(error.to_string())]),
        };

        let mut filter = ProcessInstanceFilter::new().with_locale(caller.locale().clone());
        if let Some(expression) = &request.expression {
            filter = filter.with_expression(expression);
        }
        if let Some(column) = &request.sort_column {
            filter = filter.sorted_by(column, direction_of(request.sort_descending));
        }

        let display_queue = match queue_type {
            QUEUE_TYPE_QUEUE => {
                filter = filter.for_queue(queue_name);
                Some(queue_name.to_string())
            }
            QUEUE_TYPE_PROCESS => {
                filter = match filter.for_owner_queue(login, queue_name) {
                    Ok(filter) => filter,
                    Err(error) => {
                        return DataPage::failed(vec![FieldError::system(error.to_string())]);
                    }
                };
                None
            }
            other => {
                return DataPage::failed(vec![FieldError::system(format!(
                    "unknown queue type '{other}'"
                ))]);
            }
        };

        self.run_listing(filter, window, caller.locale().clone(), display_queue)
            .await
    }

    /// Fires the deadline timer for a task. System-initiated; routed through
    /// the same executor path as user actions.
    pub async fn fire_deadline(&self, task_id: TaskId) -> ActionResult {
        let locale = Locale::default();
        let store = self.store.clone();
        let executor = self.executor.clone();
        let catalog = self.catalog.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            store.with_transaction("fire_deadline", TransactionMode::Synchronized, |context| {
                let successors = executor.perform_action(context, task_id, DEADLINE_TIMER_ACTION)?;
                Ok(successors
                    .first()
                    .map(|task| project(task, &catalog, &locale)))
            })
        })
        .await;

        match flatten_join(outcome) {
            Ok(next_task) => ActionResult {
                next_task,
                errors: Vec::new(),
            },
            Err(error) => {
                tracing::error!(
                    task_id = task_id.0,
                    kind = ?error.kind,
                    message = %error.message,
                    "fire_deadline failed"
                );
                ActionResult {
                    next_task: None,
                    errors: vec![field_error_from(&error)],
                }
            }
        }
    }

    /// Runs the page query and its count in one read snapshot, so the total
    /// can never disagree with the page contents.
    async fn run_listing(
        &self,
        filter: ProcessInstanceFilter,
        window: PageWindow,
        locale: Locale,
        display_queue: Option<String>,
    ) -> DataPage<TaskView> {
        let store = self.store.clone();
        let catalog = self.catalog.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            let query = filter.build(&catalog);
            store.with_transaction("list_tasks", TransactionMode::Isolated, |context| {
                let page = context.find_filtered_tasks(&query, window)?;
                let data = page
                    .tasks
                    .iter()
                    .map(|task| {
                        project_for_queue(task, &catalog, &locale, display_queue.as_deref())
                    })
                    .collect();
                Ok((page.total_records, data))
            })
        })
        .await;

        match flatten_join(outcome) {
            Ok((total_records, data)) => DataPage {
                total_records,
                data,
                errors: Vec::new(),
            },
            Err(error) => {
                tracing::error!(
                    kind = ?error.kind,
                    message = %error.message,
                    "task listing failed"
                );
                DataPage::failed(vec![field_error_from(&error)])
            }
        }
    }
}

fn save_widget_values(
    context: &TxContext<'_>,
    task_id: TaskId,
    widget_values: &[WidgetValue],
) -> Result<(), CoreError> {
    let task = context.load_task(task_id)?.ok_or_else(|| {
        CoreError::validation(format!("task '{}' does not exist", task_id.0)).for_task(task_id)
    })?;
    if task.is_finished() {
        return Err(
            CoreError::conflict(format!("task '{}' is already finished", task_id.0))
                .for_task(task_id),
        );
    }
    for widget_value in widget_values {
        context.set_simple_attribute(task.instance_id(), &widget_value.name, &widget_value.value)?;
    }
    Ok(())
}

/// The reserved external-key name is set at process start, never through a
/// task save.
fn validate_widget_values(widget_values: &[WidgetValue]) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for widget_value in widget_values {
        if widget_value.name.trim().is_empty() {
            errors.push(FieldError::system("widget value name must not be empty"));
        } else if widget_value.name == EXTERNAL_KEY_PROPERTY {
            errors.push(FieldError::new(
                widget_value.name.clone(),
                "the external key cannot be changed through a task save",
            ));
        }
    }
    errors
}

fn parse_task_id(raw: &str) -> Result<TaskId, CoreError> {
    raw.parse::<u64>()
        .map(TaskId)
        .map_err(|_| CoreError::validation(format!("'{raw}' is not a valid task id")))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn direction_of(descending: bool) -> SortDirection {
    if descending {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    }
}

fn field_error_from(error: &CoreError) -> FieldError {
    let source = match error.kind {
        CoreErrorKind::StorageFailure | CoreErrorKind::Internal => SYSTEM_SOURCE.to_string(),
        _ => error
            .task
            .map(|task| task.0.to_string())
            .unwrap_or_else(|| SYSTEM_SOURCE.to_string()),
    };
    FieldError::new(source, error.message.clone())
}

fn flatten_join<T>(
    outcome: Result<Result<T, CoreError>, tokio::task::JoinError>,
) -> Result<T, CoreError> {
    outcome.map_err(|join_error| {
        CoreError::new(
            CoreErrorKind::Internal,
            format!("store task join failure: {join_error}"),
        )
    })?
}
