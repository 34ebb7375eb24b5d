use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use taskflow_core::engine::{
    ActionExecutor, Assignment, INITIATOR_PLACEHOLDER, StepSpec, TableNavigator,
};
use taskflow_core::i18n::{Locale, MessageCatalog};
use taskflow_core::models::{EXTERNAL_KEY_PROPERTY, ProcessDefinitionConfig};
use taskflow_core::persistence::DefinitionStore;
use taskflow_core::service::{
    CallerIdentity, PerformActionRequest, ProcessService, QueueListRequest, StartProcessRequest,
};
use taskflow_core::sqlite::SqliteStore;

/// Walks one invoice through a small approval process and prints each
/// response, as a smoke check of the whole stack against a scratch database.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt::try_init();

    let database_path = std::env::temp_dir().join("taskflow-demo.sqlite");
    let _ = std::fs::remove_file(&database_path);

    let store = Arc::new(SqliteStore::new(&database_path));
    store.migrate_to_latest()?;
    store.register_definition(&ProcessDefinitionConfig {
        id: "invoice".to_string(),
        definition_key: "INV".to_string(),
        description: "Invoice approval".to_string(),
        enabled: true,
    })?;

    let mut catalog = MessageCatalog::new();
    let locale = Locale::default();
    catalog.load_json_bundle(
        &locale,
        r#"{
            "process.invoice.name": "Invoice approval",
            "process.invoice.step.review": "Review invoice"
        }"#,
    )?;

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
            deadline: Some(Duration::from_secs(24 * 60 * 60)),
        }],
    );
    navigator.define_route("invoice", "review", "approve", Vec::new());

    let service = ProcessService::new(
        store,
        ActionExecutor::new(Arc::new(navigator)),
        Arc::new(catalog),
    );
    let caller = CallerIdentity::authorized("alice", locale);

    let started = service
        .start_process(
            &caller,
            StartProcessRequest {
                definition_id: Some("invoice".to_string()),
                attributes: BTreeMap::from([(
                    EXTERNAL_KEY_PROPERTY.to_string(),
                    "INV-2026-001".to_string(),
                )]),
            },
        )
        .await;
    println!("started: {}", serde_json::to_string_pretty(&started)?);

    let submitted = service
        .perform_action(
            &caller,
            PerformActionRequest {
                task_id: started.task_id.clone(),
                action_name: Some("submit".to_string()),
                skip_save: true,
                widget_values: Vec::new(),
            },
        )
        .await;
    println!("submitted: {}", serde_json::to_string_pretty(&submitted)?);

    let queue = service
        .list_queue(
            &caller,
            QueueListRequest {
                queue_name: Some("accounting".to_string()),
                queue_type: Some("queue".to_string()),
                offset: 0,
                length: 10,
                ..Default::default()
            },
        )
        .await;
    println!("accounting queue: {}", serde_json::to_string_pretty(&queue)?);

    let review_task_id = queue.data.first().map(|task| task.task_id.clone());
    let approved = service
        .perform_action(
            &caller,
            PerformActionRequest {
                task_id: review_task_id,
                action_name: Some("approve".to_string()),
                skip_save: true,
                widget_values: Vec::new(),
            },
        )
        .await;
    println!("approved: {}", serde_json::to_string_pretty(&approved)?);

    Ok(())
}
