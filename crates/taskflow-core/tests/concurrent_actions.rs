use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use taskflow_core::engine::{
    ActionExecutor, Assignment, INITIATOR_PLACEHOLDER, StepSpec, TableNavigator,
};
use taskflow_core::i18n::{Locale, MessageCatalog};
use taskflow_core::models::ProcessDefinitionConfig;
use taskflow_core::persistence::DefinitionStore;
use taskflow_core::service::{
    CallerIdentity, PerformActionRequest, ProcessService, StartProcessRequest,
};
use taskflow_core::sqlite::SqliteStore;

fn test_db_path(test_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("taskflow-{test_name}-{nanos}.sqlite3"))
}

fn service_fixture(test_name: &str) -> ProcessService {
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
        vec![StepSpec {
            step_name: "review".to_string(),
            task_name: "Review invoice".to_string(),
            assignment: Assignment::Group("accounting".to_string()),
            deadline: None,
        }],
    );

    navigator.define_route(
        "invoice",
        "draft",
        taskflow_core::engine::DEADLINE_TIMER_ACTION,
        vec![StepSpec {
            step_name: "escalate".to_string(),
            task_name: "Escalate stale draft".to_string(),
            assignment: Assignment::Group("managers".to_string()),
            deadline: None,
        }],
    );

    ProcessService::new(
        store,
        ActionExecutor::new(Arc::new(navigator)),
        Arc::new(MessageCatalog::new()),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_actions_on_one_task_succeed_exactly_once() {
    let service = service_fixture("concurrent-one-task");
    let alice = CallerIdentity::authorized("alice", Locale::default());

    let started = service
        .start_process(
            &alice,
            StartProcessRequest {
                definition_id: Some("invoice".to_string()),
                attributes: BTreeMap::new(),
            },
        )
        .await;
    let draft_id = started.task_id.expect("creator should receive the draft task");

    let request = |task_id: String| PerformActionRequest {
        task_id: Some(task_id),
        action_name: Some("submit".to_string()),
        skip_save: true,
        widget_values: Vec::new(),
    };

    let (first, second) = tokio::join!(
        service.perform_action(&alice, request(draft_id.clone())),
        service.perform_action(&alice, request(draft_id.clone())),
    );

    let successes = [&first, &second]
        .iter()
        .filter(|result| result.errors.is_empty())
        .count();
    assert_eq!(successes, 1, "exactly one concurrent action may win");

    let loser = if first.errors.is_empty() { &second } else { &first };
    assert!(
        loser
            .errors
            .iter()
            .any(|error| error.message.contains("already finished")),
        "the losing action must report a completion conflict"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn deadline_timer_racing_a_user_action_yields_one_winner() {
    let service = service_fixture("concurrent-deadline");
    let alice = CallerIdentity::authorized("alice", Locale::default());

    let started = service
        .start_process(
            &alice,
            StartProcessRequest {
                definition_id: Some("invoice".to_string()),
                attributes: BTreeMap::new(),
            },
        )
        .await;
    let draft_id = started.task_id.expect("creator should receive the draft task");
    let numeric_id = taskflow_core::models::TaskId(draft_id.parse().unwrap());

    let (acted, fired) = tokio::join!(
        service.perform_action(
            &alice,
            PerformActionRequest {
                task_id: Some(draft_id.clone()),
                action_name: Some("submit".to_string()),
                skip_save: true,
                widget_values: Vec::new(),
            },
        ),
        service.fire_deadline(numeric_id),
    );

    let successes = [&acted, &fired]
        .iter()
        .filter(|result| result.errors.is_empty())
        .count();
    assert_eq!(successes, 1, "the task may only be completed once");
}
