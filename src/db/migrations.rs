use rusqlite::Connection;

use crate::error::Result;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            organization_id TEXT NOT NULL,
            workspace_id TEXT NOT NULL,
            name TEXT NOT NULL,
            schedule_from TEXT NOT NULL,
            deadline TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT NOT NULL,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            name TEXT NOT NULL DEFAULT '',
            planned_start TEXT,
            planned_end TEXT,
            duration_minutes INTEGER,
            actual_start TEXT,
            actual_end TEXT,
            percent_complete INTEGER NOT NULL DEFAULT 0
                CHECK (percent_complete BETWEEN 0 AND 100),
            is_milestone INTEGER NOT NULL DEFAULT 0,
            constraint_type TEXT NOT NULL DEFAULT 'ASAP'
                CHECK (constraint_type IN ('ASAP', 'START_NO_EARLIER_THAN', 'START_NO_LATER_THAN',
                    'FINISH_NO_EARLIER_THAN', 'FINISH_NO_LATER_THAN', 'MUST_START_ON', 'MUST_FINISH_ON')),
            constraint_date TEXT,
            budgeted_cost INTEGER NOT NULL DEFAULT 0,
            actual_cost INTEGER NOT NULL DEFAULT 0,
            deleted_at TEXT,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (project_id, id)
        );

        CREATE TABLE IF NOT EXISTS task_dependencies (
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            predecessor_id TEXT NOT NULL,
            successor_id TEXT NOT NULL,
            lag_minutes INTEGER NOT NULL DEFAULT 0
                CHECK (lag_minutes BETWEEN -43200 AND 43200),
            PRIMARY KEY (project_id, predecessor_id, successor_id),
            FOREIGN KEY (project_id, predecessor_id) REFERENCES tasks(project_id, id) ON DELETE CASCADE,
            FOREIGN KEY (project_id, successor_id) REFERENCES tasks(project_id, id) ON DELETE CASCADE,
            CHECK (predecessor_id != successor_id)
        );

        CREATE TABLE IF NOT EXISTS schedule_results (
            project_id TEXT PRIMARY KEY REFERENCES projects(id) ON DELETE CASCADE,
            schedule_from TEXT NOT NULL,
            project_finish TEXT NOT NULL,
            critical_path TEXT NOT NULL,
            warnings TEXT NOT NULL,
            computed_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS task_schedules (
            project_id TEXT NOT NULL REFERENCES schedule_results(project_id) ON DELETE CASCADE,
            task_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            duration_minutes INTEGER NOT NULL,
            early_start TEXT NOT NULL,
            early_finish TEXT NOT NULL,
            late_start TEXT NOT NULL,
            late_finish TEXT NOT NULL,
            total_float_minutes INTEGER NOT NULL,
            free_float_minutes INTEGER NOT NULL,
            critical INTEGER NOT NULL,
            constraint_violated INTEGER NOT NULL,
            PRIMARY KEY (project_id, task_id)
        );

        CREATE TABLE IF NOT EXISTS schedule_baselines (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            created_by TEXT,
            created_at TEXT NOT NULL,
            locked INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 0,
            UNIQUE (project_id, name)
        );

        CREATE TABLE IF NOT EXISTS baseline_items (
            baseline_id TEXT NOT NULL REFERENCES schedule_baselines(id) ON DELETE CASCADE,
            project_id TEXT NOT NULL,
            task_id TEXT NOT NULL,
            planned_start TEXT NOT NULL,
            planned_end TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL,
            critical_path INTEGER NOT NULL,
            total_float_minutes INTEGER NOT NULL,
            captured_at TEXT NOT NULL,
            PRIMARY KEY (baseline_id, task_id),
            FOREIGN KEY (project_id, task_id) REFERENCES tasks(project_id, id)
        );

        CREATE TABLE IF NOT EXISTS earned_value_snapshots (
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            as_of_date TEXT NOT NULL,
            baseline_id TEXT REFERENCES schedule_baselines(id) ON DELETE SET NULL,
            bac INTEGER NOT NULL,
            pv INTEGER NOT NULL,
            ev INTEGER NOT NULL,
            ac INTEGER NOT NULL,
            cpi REAL,
            spi REAL,
            eac INTEGER NOT NULL,
            etc INTEGER NOT NULL,
            vac INTEGER NOT NULL,
            computed_at TEXT NOT NULL,
            PRIMARY KEY (project_id, as_of_date)
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_baselines_one_active
            ON schedule_baselines(project_id) WHERE is_active = 1;
        CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id, deleted_at);
        CREATE INDEX IF NOT EXISTS idx_deps_successor ON task_dependencies(project_id, successor_id);
        CREATE INDEX IF NOT EXISTS idx_baseline_items_task ON baseline_items(project_id, task_id);

        CREATE TRIGGER IF NOT EXISTS trg_baseline_items_locked
            BEFORE INSERT ON baseline_items
            WHEN (SELECT locked FROM schedule_baselines WHERE id = NEW.baseline_id) = 1
        BEGIN
            SELECT RAISE(ABORT, 'baseline is locked');
        END;

        CREATE TRIGGER IF NOT EXISTS trg_baseline_items_same_project
            BEFORE INSERT ON baseline_items
            WHEN (SELECT project_id FROM schedule_baselines WHERE id = NEW.baseline_id) != NEW.project_id
        BEGIN
            SELECT RAISE(ABORT, 'baseline item belongs to another project');
        END;

        CREATE TRIGGER IF NOT EXISTS trg_baseline_items_immutable
            BEFORE UPDATE ON baseline_items
        BEGIN
            SELECT RAISE(ABORT, 'baseline items are immutable');
        END;

        CREATE TRIGGER IF NOT EXISTS trg_baselines_stay_locked
            BEFORE UPDATE OF locked, name, project_id ON schedule_baselines
            WHEN OLD.locked = 1
        BEGIN
            SELECT RAISE(ABORT, 'baseline is locked');
        END;
        ",
    )?;
    Ok(())
}
