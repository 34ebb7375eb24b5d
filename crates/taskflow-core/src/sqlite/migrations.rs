#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SqliteMigration {
    pub version: i64,
    pub name: &'static str,
    pub up_sql: &'static str,
    pub down_sql: &'static str,
}

const MIGRATION_0001: SqliteMigration = SqliteMigration {
    version: 1,
    name: "initial_workflow_schema",
    up_sql: r#"
CREATE TABLE IF NOT EXISTS process_definitions (
    definition_id TEXT PRIMARY KEY,
    definition_key TEXT NOT NULL,
    description TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS process_instances (
    instance_id INTEGER PRIMARY KEY,
    definition_id TEXT NOT NULL,
    creator_login TEXT NOT NULL,
    external_key TEXT,
    created_at_unix INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS instance_attributes (
    instance_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (instance_id, name)
);

CREATE TABLE IF NOT EXISTS bpm_tasks (
    task_id INTEGER PRIMARY KEY,
    instance_id INTEGER NOT NULL,
    execution_id TEXT NOT NULL,
    step_name TEXT NOT NULL,
    task_name TEXT NOT NULL,
    assignee TEXT,
    group_id TEXT,
    finished INTEGER NOT NULL DEFAULT 0,
    created_at_unix INTEGER NOT NULL,
    finish_date_unix INTEGER,
    deadline_unix INTEGER
);
"#,
    down_sql: r#"
DROP TABLE IF EXISTS bpm_tasks;
DROP TABLE IF EXISTS instance_attributes;
DROP TABLE IF EXISTS process_instances;
DROP TABLE IF EXISTS process_definitions;
"#,
};

const MIGRATION_0002: SqliteMigration = SqliteMigration {
    version: 2,
    name: "add_queue_and_external_key_indexes",
    up_sql: r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_process_instances_external_key
    ON process_instances (definition_id, external_key)
    WHERE external_key IS NOT NULL;

CREATE INDEX IF NOT EXISTS idx_bpm_tasks_queue
    ON bpm_tasks (finished, group_id);

CREATE INDEX IF NOT EXISTS idx_bpm_tasks_assignee
    ON bpm_tasks (finished, assignee);

CREATE INDEX IF NOT EXISTS idx_bpm_tasks_instance
    ON bpm_tasks (instance_id);
"#,
    down_sql: r#"
DROP INDEX IF EXISTS idx_bpm_tasks_instance;
DROP INDEX IF EXISTS idx_bpm_tasks_assignee;
DROP INDEX IF EXISTS idx_bpm_tasks_queue;
DROP INDEX IF EXISTS idx_process_instances_external_key;
"#,
};

const MIGRATIONS: [SqliteMigration; 2] = [MIGRATION_0001, MIGRATION_0002];

pub fn migrations() -> &'static [SqliteMigration] {
    &MIGRATIONS
}

pub fn migration(version: i64) -> Option<&'static SqliteMigration> {
    MIGRATIONS.iter().find(|entry| entry.version == version)
}

pub fn current_schema_version() -> i64 {
    MIGRATIONS.last().map(|entry| entry.version).unwrap_or(0)
}
