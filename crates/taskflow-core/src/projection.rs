use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::i18n::{Locale, MessageCatalog, definition_label_key, step_label_key};
use crate::models::BpmTask;

/// The flat, serializable view of a task handed to presentation layers.
/// Ids are strings so external consumers never depend on their numeric form.
#[derive(Clone, Debug, Serialize, Eq, PartialEq)]
pub struct TaskView {
    pub task_id: String,
    pub process_instance_id: String,
    pub definition_id: String,
    pub process_name: String,
    pub process_code: String,
    pub step_name: String,
    pub step_label: String,
    pub task_name: String,
    pub creator: String,
    pub assignee: Option<String>,
    pub group_id: Option<String>,
    pub queue_name: Option<String>,
    pub external_key: Option<String>,
    pub created_at_unix: i64,
    pub deadline_unix: Option<i64>,
}

/// Pure conversion from a task record to its display view. Labels come from
/// the catalog under the given locale, falling back to the stored
/// definition description and raw step name.
pub fn project(task: &BpmTask, catalog: &MessageCatalog, locale: &Locale) -> TaskView {
    project_for_queue(task, catalog, locale, None)
}

pub fn project_for_queue(
    task: &BpmTask,
    catalog: &MessageCatalog,
    locale: &Locale,
    queue_name: Option<&str>,
) -> TaskView {
    let process_name = catalog
        .message_or(
            locale,
            &definition_label_key(task.definition_id()),
            task.definition_description(),
        )
        .to_string();
    let step_label = catalog
        .message_or(
            locale,
            &step_label_key(task.definition_id(), task.step_name()),
            task.step_name(),
        )
        .to_string();

    TaskView {
        task_id: task.task_id().0.to_string(),
        process_instance_id: task.instance_id().0.to_string(),
        definition_id: task.definition_id().to_string(),
        process_name,
        process_code: task.definition_key().to_string(),
        step_name: task.step_name().to_string(),
        step_label,
        task_name: task.task_name().to_string(),
        creator: task.creator_login().to_string(),
        assignee: task.assignee().map(str::to_string),
        group_id: task.group_id().map(str::to_string),
        queue_name: queue_name.map(str::to_string),
        external_key: task.external_key().map(str::to_string),
        created_at_unix: unix_or_zero(task.create_date()),
        deadline_unix: task.deadline_date().map(unix_or_zero),
    }
}

fn unix_or_zero(value: SystemTime) -> i64 {
    value
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| i64::try_from(duration.as_secs()).ok())
        .unwrap_or(0)
}
