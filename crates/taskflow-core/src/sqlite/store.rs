use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::types::Value;
use rusqlite::{Connection, Transaction, TransactionBehavior, params, params_from_iter};

use crate::filter::{PageWindow, QueueCategory, QueueMode, SortColumn, SortDirection, TaskQuery};
use crate::models::{
    BpmTask, CoreError, CoreErrorKind, InstanceId, ProcessDefinitionConfig, ProcessInstance,
    TaskId,
};
use crate::persistence::{
    DefinitionStore, MigrationStore, PersistenceResult, TaskPage, TaskQueueStore,
};
use crate::sqlite::migrations::{SqliteMigration, current_schema_version, migration, migrations};

const MIGRATIONS_TABLE: &str = "taskflow_schema_migrations";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Transaction scope for a unit of work against the store.
///
/// `Synchronized` takes the write lock up front and is required for anything
/// that mutates tasks or instances. `Isolated` is a deferred read-only scope
/// for queue listings, so a page and its total count come from one snapshot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransactionMode {
    Synchronized,
    Isolated,
}

impl TransactionMode {
    fn behavior(self) -> TransactionBehavior {
        match self {
            TransactionMode::Synchronized => TransactionBehavior::Immediate,
            TransactionMode::Isolated => TransactionBehavior::Deferred,
        }
    }
}

pub struct SqliteStore {
    database_path: PathBuf,
}

impl SqliteStore {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn planned_migrations(&self, from_version: i64) -> Vec<&'static SqliteMigration> {
        migrations()
            .iter()
            .filter(|entry| entry.version > from_version)
            .collect()
    }

    pub fn migrate_to_latest(&self) -> PersistenceResult<()> {
        self.apply_migration(current_schema_version())
    }

    /// Runs a unit of work inside a single transaction. The closure's `Ok`
    /// commits; any `Err` rolls the whole scope back, so no partial effects
    /// of a failed operation are ever visible.
    pub fn with_transaction<T>(
        &self,
        operation_name: &str,
        mode: TransactionMode,
        operation: impl FnOnce(&TxContext) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut connection = open_connection(&self.database_path)
            .map_err(|error| storage_error(operation_name, error))?;
        ensure_schema_ready(&connection).map_err(|error| storage_error(operation_name, error))?;

        let transaction = connection
            .transaction_with_behavior(mode.behavior())
            .map_err(|error| storage_error(operation_name, error))?;

        let context = TxContext { tx: &transaction };
        let value = operation(&context)?;

        transaction
            .commit()
            .map_err(|error| storage_error(operation_name, error))?;
        Ok(value)
    }

    fn with_connection<T>(
        &self,
        operation_name: &str,
        operation: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> PersistenceResult<T> {
        let mut connection = open_connection(&self.database_path)
            .map_err(|error| storage_error(operation_name, error))?;
        operation(&mut connection).map_err(|error| storage_error(operation_name, error))
    }
}

impl MigrationStore for SqliteStore {
    fn current_version(&self) -> PersistenceResult<i64> {
        self.with_connection("current_version", |connection| {
            ensure_migrations_table(connection)?;
            read_current_version(connection)
        })
    }

    fn apply_migration(&self, target_version: i64) -> PersistenceResult<()> {
        if target_version < 0 || target_version > current_schema_version() {
            return Err(storage_error_text(
                "apply_migration",
                format!("invalid migration target version '{target_version}'"),
            ));
        }

        if target_version > 0 && migration(target_version).is_none() {
            return Err(storage_error_text(
                "apply_migration",
                format!("migration version '{target_version}' is not defined"),
            ));
        }

        self.with_connection("apply_migration", |connection| {
            ensure_migrations_table(connection)?;
            let current_version = read_current_version(connection)?;

            if target_version == current_version {
                // Re-apply all DDL to recover from a recorded version whose
                // tables are missing. All DDL uses IF NOT EXISTS, so this is
                // idempotent.
                for version in 1..=target_version {
                    let m = migration(version).expect("validated migration version must exist");
                    connection.execute_batch(m.up_sql)?;
                }
                return Ok(());
            }

            if target_version > current_version {
                for version in (current_version + 1)..=target_version {
                    let migration =
                        migration(version).expect("validated migration version must exist");
                    apply_up_migration(connection, migration)?;
                }
            } else {
                for version in ((target_version + 1)..=current_version).rev() {
                    let migration =
                        migration(version).expect("validated migration version must exist");
                    apply_down_migration(connection, migration)?;
                }
            }

            Ok(())
        })
    }
}

impl TaskQueueStore for SqliteStore {
    fn find_filtered_tasks(
        &self,
        query: &TaskQuery,
        window: PageWindow,
    ) -> PersistenceResult<TaskPage> {
        self.with_transaction("find_filtered_tasks", TransactionMode::Isolated, |context| {
            context.find_filtered_tasks(query, window)
        })
    }

    fn filtered_tasks_count(&self, query: &TaskQuery) -> PersistenceResult<u64> {
        self.with_transaction("filtered_tasks_count", TransactionMode::Isolated, |context| {
            context.filtered_tasks_count(query)
        })
    }
}

impl DefinitionStore for SqliteStore {
    fn register_definition(&self, definition: &ProcessDefinitionConfig) -> PersistenceResult<()> {
        self.with_connection("register_definition", |connection| {
            ensure_schema_ready(connection)?;
            connection.execute(
                "
INSERT INTO process_definitions (definition_id, definition_key, description, enabled)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(definition_id) DO UPDATE SET
    definition_key = excluded.definition_key,
    description = excluded.description,
    enabled = excluded.enabled
",
                params![
                    definition.id,
                    definition.definition_key,
                    definition.description,
                    bool_to_sqlite(definition.enabled),
                ],
            )?;
            Ok(())
        })
    }

    fn load_definition(
        &self,
        definition_id: &str,
    ) -> PersistenceResult<Option<ProcessDefinitionConfig>> {
        self.with_connection("load_definition", |connection| {
            ensure_schema_ready(connection)?;
            read_definition(connection, definition_id)
        })
    }

    fn list_definitions(&self) -> PersistenceResult<Vec<ProcessDefinitionConfig>> {
        self.with_connection("list_definitions", |connection| {
            ensure_schema_ready(connection)?;
            let mut statement = connection.prepare(
                "
SELECT definition_id, definition_key, description, enabled
FROM process_definitions
ORDER BY definition_id
",
            )?;
            let rows = statement.query_map([], definition_from_row)?;
            rows.collect()
        })
    }
}

/// Task and instance fields for insertion; ids and denormalized definition
/// fields are filled in by the store.
#[derive(Clone, Debug)]
pub struct NewTask {
    pub instance_id: InstanceId,
    pub execution_id: String,
    pub step_name: String,
    pub task_name: String,
    pub assignee: Option<String>,
    pub group_id: Option<String>,
    pub create_date: SystemTime,
    pub deadline_date: Option<SystemTime>,
}

/// Typed operations available inside one transaction scope. Every method
/// reads and writes through the same underlying transaction, so a rollback
/// undoes all of them together.
pub struct TxContext<'a> {
    tx: &'a Transaction<'a>,
}

impl TxContext<'_> {
    pub fn load_definition(
        &self,
        definition_id: &str,
    ) -> Result<Option<ProcessDefinitionConfig>, CoreError> {
        read_definition(self.tx, definition_id)
            .map_err(|error| storage_error("load_definition", error))
    }

    pub fn insert_instance(
        &self,
        definition_id: &str,
        creator_login: &str,
        created_at: SystemTime,
    ) -> Result<InstanceId, CoreError> {
        let result: rusqlite::Result<InstanceId> = (|| {
            self.tx.execute(
                "
INSERT INTO process_instances (definition_id, creator_login, created_at_unix)
VALUES (?1, ?2, ?3)
",
                params![definition_id, creator_login, to_unix_seconds(created_at)?],
            )?;
            let raw_id = self.tx.last_insert_rowid();
            Ok(InstanceId(i64_to_u64(raw_id)?))
        })();
        result.map_err(|error| storage_error("insert_instance", error))
    }

    /// Sets the dedicated external key. A duplicate key within the same
    /// definition violates the unique index and surfaces as a conflict.
    pub fn set_external_key(
        &self,
        instance_id: InstanceId,
        external_key: &str,
    ) -> Result<(), CoreError> {
        let result = instance_id_to_i64(instance_id).and_then(|raw_id| {
            self.tx.execute(
                "UPDATE process_instances SET external_key = ?1 WHERE instance_id = ?2",
                params![external_key, raw_id],
            )
        });
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(CoreError::conflict(format!(
                    "external key '{external_key}' is already bound to another process instance"
                )))
            }
            Err(error) => Err(storage_error("set_external_key", error)),
        }
    }

    pub fn set_simple_attribute(
        &self,
        instance_id: InstanceId,
        name: &str,
        value: &str,
    ) -> Result<(), CoreError> {
        let result = instance_id_to_i64(instance_id).and_then(|raw_id| {
            self.tx.execute(
                "
INSERT INTO instance_attributes (instance_id, name, value)
VALUES (?1, ?2, ?3)
ON CONFLICT(instance_id, name) DO UPDATE SET value = excluded.value
",
                params![raw_id, name, value],
            )
        });
        result
            .map(|_| ())
            .map_err(|error| storage_error("set_simple_attribute", error))
    }

    pub fn load_instance(
        &self,
        instance_id: InstanceId,
    ) -> Result<Option<ProcessInstance>, CoreError> {
        let result: rusqlite::Result<Option<ProcessInstance>> = (|| {
            let raw_id = instance_id_to_i64(instance_id)?;
            let mut statement = self.tx.prepare(
                "
SELECT instance_id, definition_id, creator_login, external_key, created_at_unix
FROM process_instances
WHERE instance_id = ?1
",
            )?;
            let header = statement
                .query_map([raw_id], |row| {
                    let raw_id: i64 = row.get(0)?;
                    let definition_id: String = row.get(1)?;
                    let creator_login: String = row.get(2)?;
                    let external_key: Option<String> = row.get(3)?;
                    let created_at_unix: i64 = row.get(4)?;
                    Ok((raw_id, definition_id, creator_login, external_key, created_at_unix))
                })?
                .next()
                .transpose()?;

            let Some((raw_id, definition_id, creator_login, external_key, created_at_unix)) =
                header
            else {
                return Ok(None);
            };

            let mut attribute_statement = self.tx.prepare(
                "SELECT name, value FROM instance_attributes WHERE instance_id = ?1",
            )?;
            let attributes: BTreeMap<String, String> = attribute_statement
                .query_map([raw_id], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<_>>()?;

            Ok(Some(ProcessInstance::from_parts(
                InstanceId(i64_to_u64(raw_id)?),
                definition_id,
                creator_login,
                external_key,
                attributes,
                from_unix_seconds(created_at_unix)?,
            )))
        })();
        result.map_err(|error| storage_error("load_instance", error))
    }

    pub fn insert_task(&self, task: &NewTask) -> Result<BpmTask, CoreError> {
        let result: rusqlite::Result<TaskId> = (|| {
            self.tx.execute(
                "
INSERT INTO bpm_tasks (
    instance_id, execution_id, step_name, task_name,
    assignee, group_id, finished, created_at_unix, deadline_unix
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)
",
                params![
                    instance_id_to_i64(task.instance_id)?,
                    task.execution_id,
                    task.step_name,
                    task.task_name,
                    task.assignee.as_deref(),
                    task.group_id.as_deref(),
                    to_unix_seconds(task.create_date)?,
                    task.deadline_date.map(to_unix_seconds).transpose()?,
                ],
            )?;
            Ok(TaskId(i64_to_u64(self.tx.last_insert_rowid())?))
        })();
        let task_id = result.map_err(|error| storage_error("insert_task", error))?;

        self.load_task(task_id)?.ok_or_else(|| {
            storage_error_text("insert_task", "freshly inserted task could not be read back")
        })
    }

    pub fn load_task(&self, task_id: TaskId) -> Result<Option<BpmTask>, CoreError> {
        let result: rusqlite::Result<Option<BpmTask>> = (|| {
            let raw_id = task_id_to_i64(task_id)?;
            let mut statement = self.tx.prepare(&format!(
                "{TASK_SELECT} WHERE t.task_id = ?1"
            ))?;
            statement.query_map([raw_id], task_from_row)?.next().transpose()
        })();
        result.map_err(|error| storage_error("load_task", error))
    }

    /// Compare-and-set finish. Returns false when the task was already
    /// finished, which callers treat as a concurrent-completion conflict.
    pub fn finish_task_if_active(
        &self,
        task_id: TaskId,
        finished_at: SystemTime,
    ) -> Result<bool, CoreError> {
        let result = task_id_to_i64(task_id).and_then(|raw_id| {
            self.tx.execute(
                "
UPDATE bpm_tasks
SET finished = 1, finish_date_unix = ?1
WHERE task_id = ?2 AND finished = 0
",
                params![to_unix_seconds(finished_at)?, raw_id],
            )
        });
        result
            .map(|updated_rows| updated_rows > 0)
            .map_err(|error| storage_error("finish_task_if_active", error))
    }

    pub fn find_filtered_tasks(
        &self,
        query: &TaskQuery,
        window: PageWindow,
    ) -> Result<TaskPage, CoreError> {
        let result: rusqlite::Result<TaskPage> = (|| {
            let (predicate, mut parameters) = build_task_predicate(query);
            let order_clause = build_order_clause(query);
            let sql = format!(
                "{TASK_SELECT} WHERE {predicate} {order_clause} LIMIT ?{} OFFSET ?{}",
                parameters.len() + 1,
                parameters.len() + 2,
            );
            parameters.push(Value::from(u64_to_i64(window.length)?));
            parameters.push(Value::from(u64_to_i64(window.offset)?));

            let mut statement = self.tx.prepare(&sql)?;
            let tasks: Vec<BpmTask> = statement
                .query_map(params_from_iter(parameters), task_from_row)?
                .collect::<rusqlite::Result<_>>()?;

            let total_records = count_filtered_tasks(self.tx, query)?;
            Ok(TaskPage {
                tasks,
                total_records,
            })
        })();
        result.map_err(|error| storage_error("find_filtered_tasks", error))
    }

    pub fn filtered_tasks_count(&self, query: &TaskQuery) -> Result<u64, CoreError> {
        count_filtered_tasks(self.tx, query)
            .map_err(|error| storage_error("filtered_tasks_count", error))
    }
}

const TASK_SELECT: &str = "
SELECT
    t.task_id,
    t.execution_id,
    t.instance_id,
    pd.definition_id,
    pd.definition_key,
    pd.description,
    pi.creator_login,
    pi.external_key,
    t.step_name,
    t.task_name,
    t.assignee,
    t.group_id,
    t.created_at_unix,
    t.finish_date_unix,
    t.deadline_unix
FROM bpm_tasks t
JOIN process_instances pi ON pi.instance_id = t.instance_id
JOIN process_definitions pd ON pd.definition_id = pi.definition_id
";

/// Builds the shared WHERE clause for queue pages and their counts. Both
/// must use the same predicate or paging totals drift from page contents.
fn build_task_predicate(query: &TaskQuery) -> (String, Vec<Value>) {
    let mut clauses = vec!["t.finished = 0".to_string()];
    let mut parameters: Vec<Value> = Vec::new();

    match &query.mode {
        QueueMode::Any => {}
        QueueMode::Queue { name } => {
            clauses.push("t.assignee IS NULL".to_string());
            clauses.push(format!("t.group_id = ?{}", parameters.len() + 1));
            parameters.push(Value::from(name.clone()));
        }
        QueueMode::Process { owner, category } => match category {
            QueueCategory::Assigned => {
                clauses.push(format!("t.assignee = ?{}", parameters.len() + 1));
                parameters.push(Value::from(owner.clone()));
            }
            QueueCategory::Created => {
                clauses.push(format!("pi.creator_login = ?{}", parameters.len() + 1));
                parameters.push(Value::from(owner.clone()));
            }
        },
    }

    if let Some(process_key) = &query.process_key {
        clauses.push(format!("pd.definition_key = ?{}", parameters.len() + 1));
        parameters.push(Value::from(process_key.clone()));
    }

    if let Some(expression) = &query.expression {
        let pattern = format!("%{expression}%");
        let first = parameters.len() + 1;
        let mut alternatives = vec![
            format!("t.task_name LIKE ?{first}"),
            format!("pd.description LIKE ?{}", first + 1),
            format!("pi.external_key LIKE ?{}", first + 2),
        ];
        parameters.push(Value::from(pattern.clone()));
        parameters.push(Value::from(pattern.clone()));
        parameters.push(Value::from(pattern));

        if !query.label_matched_definitions.is_empty() {
            let placeholders: Vec<String> = query
                .label_matched_definitions
                .iter()
                .enumerate()
                .map(|(index, _)| format!("?{}", parameters.len() + index + 1))
                .collect();
            alternatives.push(format!("pd.definition_id IN ({})", placeholders.join(", ")));
            for definition_id in &query.label_matched_definitions {
                parameters.push(Value::from(definition_id.clone()));
            }
        }

        clauses.push(format!("({})", alternatives.join(" OR ")));
    }

    (clauses.join(" AND "), parameters)
}

fn build_order_clause(query: &TaskQuery) -> String {
    let Some(column) = query.sort_column else {
        return "ORDER BY t.created_at_unix DESC, t.task_id ASC".to_string();
    };

    let column_sql = match column {
        SortColumn::ProcessName => "pd.description",
        SortColumn::ProcessCode => "pd.definition_key",
        SortColumn::ProcessStep => "t.step_name",
        SortColumn::Creator => "pi.creator_login",
        SortColumn::Assignee => "t.assignee",
        SortColumn::CreateDate => "t.created_at_unix",
    };
    let direction_sql = match query.sort_direction {
        SortDirection::Ascending => "ASC",
        SortDirection::Descending => "DESC",
    };
    format!("ORDER BY {column_sql} {direction_sql}, t.task_id ASC")
}

fn count_filtered_tasks(connection: &Connection, query: &TaskQuery) -> rusqlite::Result<u64> {
    let (predicate, parameters) = build_task_predicate(query);
    let sql = format!(
        "
SELECT COUNT(*)
FROM bpm_tasks t
JOIN process_instances pi ON pi.instance_id = t.instance_id
JOIN process_definitions pd ON pd.definition_id = pi.definition_id
WHERE {predicate}
"
    );
    let count: i64 = connection.query_row(&sql, params_from_iter(parameters), |row| row.get(0))?;
    i64_to_u64(count)
}

fn read_definition(
    connection: &Connection,
    definition_id: &str,
) -> rusqlite::Result<Option<ProcessDefinitionConfig>> {
    let mut statement = connection.prepare(
        "
SELECT definition_id, definition_key, description, enabled
FROM process_definitions
WHERE definition_id = ?1
",
    )?;
    statement
        .query_map([definition_id], definition_from_row)?
        .next()
        .transpose()
}

fn definition_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProcessDefinitionConfig> {
    let enabled_int: i64 = row.get(3)?;
    Ok(ProcessDefinitionConfig {
        id: row.get(0)?,
        definition_key: row.get(1)?,
        description: row.get(2)?,
        enabled: sqlite_to_bool(enabled_int),
    })
}

fn task_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BpmTask> {
    let raw_task_id: i64 = row.get(0)?;
    let raw_instance_id: i64 = row.get(2)?;
    let created_at_unix: i64 = row.get(12)?;
    let finish_date_unix: Option<i64> = row.get(13)?;
    let deadline_unix: Option<i64> = row.get(14)?;

    Ok(BpmTask::from_parts(
        TaskId(i64_to_u64(raw_task_id)?),
        row.get(1)?,
        InstanceId(i64_to_u64(raw_instance_id)?),
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        from_unix_seconds(created_at_unix)?,
        finish_date_unix.map(from_unix_seconds).transpose()?,
        deadline_unix.map(from_unix_seconds).transpose()?,
    ))
}

fn open_connection(database_path: &Path) -> rusqlite::Result<Connection> {
    if let Some(parent) = database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))?;
    }
    let connection = Connection::open(database_path)?;
    connection.busy_timeout(BUSY_TIMEOUT)?;
    // WAL keeps open read snapshots from stalling committing writers.
    connection.pragma_update(None, "journal_mode", "WAL")?;
    Ok(connection)
}

fn ensure_migrations_table(connection: &Connection) -> rusqlite::Result<()> {
    connection.execute_batch(
        "
CREATE TABLE IF NOT EXISTS taskflow_schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at_unix INTEGER NOT NULL
);
",
    )?;
    Ok(())
}

fn ensure_schema_ready(connection: &Connection) -> rusqlite::Result<()> {
    ensure_migrations_table(connection)?;
    let version = read_current_version(connection)?;
    if version <= 0 {
        return Err(storage_error_sqlite(
            "database schema is not initialized; apply migrations before workflow operations",
        ));
    }
    Ok(())
}

fn read_current_version(connection: &Connection) -> rusqlite::Result<i64> {
    connection.query_row(
        &format!("SELECT COALESCE(MAX(version), 0) FROM {MIGRATIONS_TABLE}"),
        [],
        |row| row.get(0),
    )
}

fn apply_up_migration(
    connection: &mut Connection,
    migration: &SqliteMigration,
) -> rusqlite::Result<()> {
    let transaction = connection.transaction()?;
    transaction.execute_batch(migration.up_sql)?;
    transaction.execute(
        &format!(
            "INSERT INTO {MIGRATIONS_TABLE} (version, name, applied_at_unix)
             VALUES (?1, ?2, strftime('%s', 'now'))"
        ),
        (migration.version, migration.name),
    )?;
    transaction.commit()?;
    Ok(())
}

fn apply_down_migration(
    connection: &mut Connection,
    migration: &SqliteMigration,
) -> rusqlite::Result<()> {
    let transaction = connection.transaction()?;
    transaction.execute_batch(migration.down_sql)?;
    transaction.execute(
        &format!("DELETE FROM {MIGRATIONS_TABLE} WHERE version = ?1"),
        [migration.version],
    )?;
    transaction.commit()?;
    Ok(())
}

fn storage_error(operation: &str, error: rusqlite::Error) -> CoreError {
    storage_error_text(operation, error.to_string())
}

fn storage_error_sqlite(message: &str) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::other(message.to_string())))
}

fn bool_to_sqlite(value: bool) -> i64 {
    if value { 1 } else { 0 }
}

fn sqlite_to_bool(value: i64) -> bool {
    value != 0
}

fn to_unix_seconds(value: SystemTime) -> rusqlite::Result<i64> {
    let duration = value.duration_since(UNIX_EPOCH).map_err(|error| {
        storage_error_sqlite(&format!("time before unix epoch is not supported: {error}"))
    })?;
    let seconds = i64::try_from(duration.as_secs())
        .map_err(|_| storage_error_sqlite("unix timestamp seconds exceed i64 range"))?;
    Ok(seconds)
}

fn from_unix_seconds(value: i64) -> rusqlite::Result<SystemTime> {
    if value < 0 {
        return Err(storage_error_sqlite(
            "negative unix timestamps are not supported",
        ));
    }
    let seconds = u64::try_from(value)
        .map_err(|_| storage_error_sqlite("failed to convert unix timestamp to u64"))?;
    Ok(UNIX_EPOCH + Duration::from_secs(seconds))
}

fn task_id_to_i64(value: TaskId) -> rusqlite::Result<i64> {
    i64::try_from(value.0).map_err(|_| storage_error_sqlite("task id exceeds i64 range"))
}

fn instance_id_to_i64(value: InstanceId) -> rusqlite::Result<i64> {
    i64::try_from(value.0).map_err(|_| storage_error_sqlite("instance id exceeds i64 range"))
}

fn i64_to_u64(value: i64) -> rusqlite::Result<u64> {
    u64::try_from(value).map_err(|_| storage_error_sqlite("negative id in sqlite record"))
}

fn u64_to_i64(value: u64) -> rusqlite::Result<i64> {
    i64::try_from(value).map_err(|_| storage_error_sqlite("value exceeds i64 range"))
}

fn storage_error_text(operation: &str, message: impl AsRef<str>) -> CoreError {
    CoreError {
        process: None,
        task: None,
        action: None,
        kind: CoreErrorKind::StorageFailure,
        message: format!("sqlite store '{operation}' failed: {}", message.as_ref()),
    }
}
