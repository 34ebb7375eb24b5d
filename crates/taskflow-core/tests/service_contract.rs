use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use taskflow_core::engine::{
    ActionExecutor, Assignment, INITIATOR_PLACEHOLDER, StepSpec, TableNavigator,
};
use taskflow_core::i18n::{Locale, MessageCatalog};
use taskflow_core::models::{ProcessDefinitionConfig, TaskId};
use taskflow_core::persistence::DefinitionStore;
use taskflow_core::service::{
    CallerIdentity, PerformActionRequest, ProcessService, QueueListRequest, SYSTEM_SOURCE,
    SaveTaskRequest, StartProcessRequest, TaskSearchRequest, WidgetValue,
};
use taskflow_core::sqlite::{SqliteStore, TransactionMode};

fn test_db_path(test_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("taskflow-{test_name}-{nanos}.sqlite3"))
}

fn group_step(step_name: &str, group: &str) -> StepSpec {
    StepSpec {
        step_name: step_name.to_string(),
        task_name: format!("Task at {step_name}"),
        assignment: Assignment::Group(group.to_string()),
        deadline: None,
    }
}

fn service_fixture(test_name: &str) -> (ProcessService, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::new(test_db_path(test_name)));
    store.migrate_to_latest().unwrap();
    store
        .register_definition(&ProcessDefinitionConfig {
            id: "invoice".to_string(),
            definition_key: "INV".to_string(),
            description: "Invoice approval".to_string(),
            enabled: true,
        })
        .unwrap();

    let mut navigator = TableNavigator::new();
    navigator.define_initial(
        "invoice",
        vec![StepSpec {
            step_name: "draft".to_string(),
            task_name: "Draft invoice".to_string(),
            assignment: Assignment::User(INITIATOR_PLACEHOLDER.to_string()),
            deadline: None,
        }],
    );
    navigator.define_route(
        "invoice",
        "draft",
        "submit",
        vec![group_step("review", "accounting")],
    );
    navigator.define_route("invoice", "review", "approve", Vec::new());

    let mut catalog = MessageCatalog::new();
    let locale = Locale::default();
    catalog.insert(&locale, "process.invoice.name", "Invoice approval (EN)");
    catalog.insert(&locale, "process.invoice.step.review", "Review invoice");

    let service = ProcessService::new(
        store.clone(),
        ActionExecutor::new(Arc::new(navigator)),
        Arc::new(catalog),
    );
    (service, store)
}

fn alice() -> CallerIdentity {
    CallerIdentity::authorized("alice", Locale::default())
}

async fn started_task_id(service: &ProcessService) -> String {
    let started = service
        .start_process(
            &alice(),
            StartProcessRequest {
                definition_id: Some("invoice".to_string()),
                attributes: BTreeMap::new(),
            },
        )
        .await;
    assert!(started.errors.is_empty());
    started.task_id.expect("creator should receive the draft task")
}

#[tokio::test]
async fn anonymous_callers_are_rejected_up_front() {
    let (service, _store) = service_fixture("anonymous-rejected");
    let anonymous = CallerIdentity::anonymous(Locale::default());

    let acted = service
        .perform_action(&anonymous, PerformActionRequest::default())
        .await;
    assert_eq!(acted.errors.len(), 1);
    assert_eq!(acted.errors[0].source, SYSTEM_SOURCE);
    assert!(acted.errors[0].message.contains("not authorized"));

    let saved = service.save_task(&anonymous, SaveTaskRequest::default()).await;
    assert_eq!(saved.errors.len(), 1);

    let page = service
        .search_tasks(
            &anonymous,
            TaskSearchRequest {
                offset: 0,
                length: 10,
                ..Default::default()
            },
        )
        .await;
    assert_eq!(page.errors.len(), 1);
}

#[tokio::test]
async fn missing_task_id_and_action_name_short_circuit() {
    let (service, _store) = service_fixture("missing-inputs");

    let no_task = service
        .perform_action(
            &alice(),
            PerformActionRequest {
                action_name: Some("submit".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert_eq!(no_task.errors[0].source, SYSTEM_SOURCE);
    assert!(no_task.errors[0].message.contains("task id"));

    let no_action = service
        .perform_action(
            &alice(),
            PerformActionRequest {
                task_id: Some("1".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(no_action.errors[0].message.contains("action name"));

    let bad_id = service
        .perform_action(
            &alice(),
            PerformActionRequest {
                task_id: Some("not-a-number".to_string()),
                action_name: Some("submit".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(bad_id.errors[0].message.contains("not a valid task id"));
}

#[tokio::test]
async fn save_task_accumulates_widget_validation_errors() {
    let (service, _store) = service_fixture("save-validation");

    let saved = service
        .save_task(
            &alice(),
            SaveTaskRequest {
                task_id: Some("1".to_string()),
                widget_values: vec![
                    WidgetValue {
                        name: "".to_string(),
                        value: "x".to_string(),
                    },
                    WidgetValue {
                        name: "externalKey".to_string(),
                        value: "X1".to_string(),
                    },
                ],
            },
        )
        .await;

    assert_eq!(saved.errors.len(), 2);
    assert!(saved.errors[0].message.contains("must not be empty"));
    assert_eq!(saved.errors[1].source, "externalKey");
}

#[tokio::test]
async fn perform_action_projects_the_next_task_until_terminal() {
    let (service, _store) = service_fixture("action-projection");
    let draft_id = started_task_id(&service).await;

    let submitted = service
        .perform_action(
            &alice(),
            PerformActionRequest {
                task_id: Some(draft_id),
                action_name: Some("submit".to_string()),
                skip_save: true,
                widget_values: Vec::new(),
            },
        )
        .await;
    assert!(submitted.errors.is_empty());

    let review = submitted.next_task.expect("submit should open the review step");
    assert_eq!(review.step_name, "review");
    assert_eq!(review.step_label, "Review invoice");
    assert_eq!(review.process_name, "Invoice approval (EN)");
    assert_eq!(review.process_code, "INV");
    assert_eq!(review.group_id.as_deref(), Some("accounting"));

    let approved = service
        .perform_action(
            &alice(),
            PerformActionRequest {
                task_id: Some(review.task_id),
                action_name: Some("approve".to_string()),
                skip_save: true,
                widget_values: Vec::new(),
            },
        )
        .await;
    assert!(approved.errors.is_empty());
    assert!(approved.next_task.is_none());
}

#[tokio::test]
async fn failed_actions_roll_back_the_preceding_save() {
    let (service, store) = service_fixture("save-rollback");
    let draft_id = started_task_id(&service).await;
    let task_id = TaskId(draft_id.parse().unwrap());

    let failed = service
        .perform_action(
            &alice(),
            PerformActionRequest {
                task_id: Some(draft_id),
                action_name: Some("bogus".to_string()),
                skip_save: false,
                widget_values: vec![WidgetValue {
                    name: "note".to_string(),
                    value: "hello".to_string(),
                }],
            },
        )
        .await;
    assert!(!failed.errors.is_empty());

    let instance = store
        .with_transaction("inspect", TransactionMode::Isolated, |context| {
            let task = context.load_task(task_id)?.expect("task must exist");
            context.load_instance(task.instance_id())
        })
        .unwrap()
        .unwrap();
    assert!(instance.simple_attribute("note").is_none());
}

#[tokio::test]
async fn save_task_persists_widget_values_to_the_instance() {
    let (service, store) = service_fixture("save-persists");
    let draft_id = started_task_id(&service).await;
    let task_id = TaskId(draft_id.parse().unwrap());

    let saved = service
        .save_task(
            &alice(),
            SaveTaskRequest {
                task_id: Some(draft_id),
                widget_values: vec![WidgetValue {
                    name: "note".to_string(),
                    value: "hello".to_string(),
                }],
            },
        )
        .await;
    assert!(saved.errors.is_empty());

    let instance = store
        .with_transaction("inspect", TransactionMode::Isolated, |context| {
            let task = context.load_task(task_id)?.expect("task must exist");
            context.load_instance(task.instance_id())
        })
        .unwrap()
        .unwrap();
    assert_eq!(instance.simple_attribute("note"), Some("hello"));
}

#[tokio::test]
async fn list_queue_requires_a_queue_name_and_a_known_type() {
    let (service, _store) = service_fixture("queue-validation");

    let missing_name = service
        .list_queue(
            &alice(),
            QueueListRequest {
                queue_type: Some("queue".to_string()),
                offset: 0,
                length: 10,
                ..Default::default()
            },
        )
        .await;
    assert!(missing_name.errors[0].message.contains("queue name"));

    let missing_type = service
        .list_queue(
            &alice(),
            QueueListRequest {
                queue_name: Some("accounting".to_string()),
                offset: 0,
                length: 10,
                ..Default::default()
            },
        )
        .await;
    assert!(missing_type.errors[0].message.contains("queue type"));

    let unknown_type = service
        .list_queue(
            &alice(),
            QueueListRequest {
                queue_name: Some("accounting".to_string()),
                queue_type: Some("shared".to_string()),
                offset: 0,
                length: 10,
                ..Default::default()
            },
        )
        .await;
    assert!(unknown_type.errors[0].message.contains("unknown queue type"));
}

#[tokio::test]
async fn group_queue_listings_carry_the_queue_name() {
    let (service, _store) = service_fixture("queue-decoration");
    let draft_id = started_task_id(&service).await;
    service
        .perform_action(
            &alice(),
            PerformActionRequest {
                task_id: Some(draft_id),
                action_name: Some("submit".to_string()),
                skip_save: true,
                widget_values: Vec::new(),
            },
        )
        .await;

    let page = service
        .list_queue(
            &alice(),
            QueueListRequest {
                queue_name: Some("accounting".to_string()),
                queue_type: Some("queue".to_string()),
                offset: 0,
                length: 10,
                ..Default::default()
            },
        )
        .await;

    assert!(page.errors.is_empty());
    assert_eq!(page.total_records, 1);
    assert_eq!(page.data[0].queue_name.as_deref(), Some("accounting"));
    assert_eq!(page.data[0].step_name, "review");
}

#[tokio::test]
async fn owner_queues_list_assigned_and_created_tasks() {
    let (service, _store) = service_fixture("owner-queues");
    started_task_id(&service).await;

    let assigned = service
        .list_queue(
            &alice(),
            QueueListRequest {
                queue_name: Some("assigned".to_string()),
                queue_type: Some("process".to_string()),
                offset: 0,
                length: 10,
                ..Default::default()
            },
        )
        .await;
    assert!(assigned.errors.is_empty());
    assert_eq!(assigned.total_records, 1);
    assert_eq!(assigned.data[0].assignee.as_deref(), Some("alice"));
    assert!(assigned.data[0].queue_name.is_none());

    let created = service
        .list_queue(
            &alice(),
            QueueListRequest {
                queue_name: Some("created".to_string()),
                queue_type: Some("process".to_string()),
                offset: 0,
                length: 10,
                ..Default::default()
            },
        )
        .await;
    assert_eq!(created.total_records, 1);
    assert_eq!(created.data[0].creator, "alice");
}

#[tokio::test]
async fn search_tasks_filters_by_expression_and_pages() {
    let (service, _store) = service_fixture("search-tasks");
    started_task_id(&service).await;
    started_task_id(&service).await;

    let all = service
        .search_tasks(
            &alice(),
            TaskSearchRequest {
                offset: 0,
                length: 1,
                ..Default::default()
            },
        )
        .await;
    assert!(all.errors.is_empty());
    assert_eq!(all.total_records, 2);
    assert_eq!(all.data.len(), 1);

    let matched = service
        .search_tasks(
            &alice(),
            TaskSearchRequest {
                expression: Some("draft".to_string()),
                offset: 0,
                length: 10,
                ..Default::default()
            },
        )
        .await;
    assert_eq!(matched.total_records, 2);

    let unmatched = service
        .search_tasks(
            &alice(),
            TaskSearchRequest {
                expression: Some("nothing-here".to_string()),
                offset: 0,
                length: 10,
                ..Default::default()
            },
        )
        .await;
    assert_eq!(unmatched.total_records, 0);
    assert!(unmatched.data.is_empty());
}

#[tokio::test]
async fn fire_deadline_reports_unroutable_timers() {
    let (service, _store) = service_fixture("fire-deadline");
    let draft_id = started_task_id(&service).await;
    let task_id = TaskId(draft_id.parse().unwrap());

    // The draft step defines no deadline route, so the timer must fail
    // without finishing the task.
    let fired = service.fire_deadline(task_id).await;
    assert!(!fired.errors.is_empty());

    let still_open = service
        .search_tasks(
            &alice(),
            TaskSearchRequest {
                offset: 0,
                length: 10,
                ..Default::default()
            },
        )
        .await;
    assert_eq!(still_open.total_records, 1);
}
