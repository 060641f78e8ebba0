use rusqlite::{params, Connection};

use crate::error::{EngineError, Result};
use crate::models::{ConstraintType, Task};

const TASK_COLUMNS: &str = "id, project_id, name, planned_start, planned_end, duration_minutes,
    actual_start, actual_end, percent_complete, is_milestone, constraint_type, constraint_date,
    budgeted_cost, actual_cost";

/// Insert or replace a task row. Task ids are scoped to their project, so
/// the same id may live in several projects. Re-inserting clears any soft
/// delete.
pub fn upsert_task(conn: &Connection, task: &Task) -> Result<()> {
    task.validate()?;
    let changed = conn.execute(
        "INSERT INTO tasks (id, project_id, name, planned_start, planned_end, duration_minutes,
                            actual_start, actual_end, percent_complete, is_milestone,
                            constraint_type, constraint_date, budgeted_cost, actual_cost)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
         ON CONFLICT(project_id, id) DO UPDATE SET
            name = excluded.name,
            planned_start = excluded.planned_start,
            planned_end = excluded.planned_end,
            duration_minutes = excluded.duration_minutes,
            actual_start = excluded.actual_start,
            actual_end = excluded.actual_end,
            percent_complete = excluded.percent_complete,
            is_milestone = excluded.is_milestone,
            constraint_type = excluded.constraint_type,
            constraint_date = excluded.constraint_date,
            budgeted_cost = excluded.budgeted_cost,
            actual_cost = excluded.actual_cost,
            deleted_at = NULL,
            updated_at = datetime('now')",
        params![
            task.id,
            task.project_id,
            task.name,
            task.planned_start,
            task.planned_end,
            task.duration_minutes,
            task.actual_start,
            task.actual_end,
            task.percent_complete,
            task.is_milestone,
            task.constraint_type.as_str(),
            task.constraint_date,
            task.budgeted_cost,
            task.actual_cost,
        ],
    )?;
    if changed == 0 {
        return Err(EngineError::ScopeMismatch {
            entity: "task",
            id: task.id.clone(),
            project_id: task.project_id.clone(),
        });
    }
    Ok(())
}

pub fn get_task(conn: &Connection, project_id: &str, task_id: &str) -> Result<Task> {
    conn.query_row(
        &format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE id = ?1 AND project_id = ?2 AND deleted_at IS NULL"
        ),
        params![task_id, project_id],
        row_to_task,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => EngineError::TaskNotFound(task_id.to_string()),
        _ => EngineError::from(e),
    })
}

/// Live tasks of a project, ordered by id.
pub fn list_tasks(conn: &Connection, project_id: &str) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE project_id = ?1 AND deleted_at IS NULL
         ORDER BY id ASC"
    ))?;
    let tasks = stmt
        .query_map(params![project_id], row_to_task)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(tasks)
}

/// Soft delete. Dependency rows stay behind so a later recompute reports
/// them as dangling instead of silently dropping them.
pub fn delete_task(conn: &Connection, project_id: &str, task_id: &str) -> Result<()> {
    let changed = conn.execute(
        "UPDATE tasks SET deleted_at = datetime('now'), updated_at = datetime('now')
         WHERE id = ?1 AND project_id = ?2 AND deleted_at IS NULL",
        params![task_id, project_id],
    )?;
    if changed == 0 {
        return Err(EngineError::TaskNotFound(task_id.to_string()));
    }
    Ok(())
}

pub fn update_progress(
    conn: &Connection,
    project_id: &str,
    task_id: &str,
    percent_complete: u8,
    actual_cost: i64,
) -> Result<()> {
    if percent_complete > 100 {
        return Err(EngineError::validation("percent_complete must be within 0..=100"));
    }
    let changed = conn.execute(
        "UPDATE tasks SET percent_complete = ?1, actual_cost = ?2, updated_at = datetime('now')
         WHERE id = ?3 AND project_id = ?4 AND deleted_at IS NULL",
        params![percent_complete, actual_cost, task_id, project_id],
    )?;
    if changed == 0 {
        return Err(EngineError::TaskNotFound(task_id.to_string()));
    }
    Ok(())
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        planned_start: row.get(3)?,
        planned_end: row.get(4)?,
        duration_minutes: row.get(5)?,
        actual_start: row.get(6)?,
        actual_end: row.get(7)?,
        percent_complete: row.get(8)?,
        is_milestone: row.get(9)?,
        constraint_type: ConstraintType::from_str(&row.get::<_, String>(10)?).unwrap_or_default(),
        constraint_date: row.get(11)?,
        budgeted_cost: row.get(12)?,
        actual_cost: row.get(13)?,
    })
}
