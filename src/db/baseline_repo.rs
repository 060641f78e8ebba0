use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{EngineError, Result};
use crate::models::{BaselineItem, ScheduleBaseline};

const BASELINE_COLUMNS: &str = "id, project_id, name, created_by, created_at, locked, is_active";

/// Insert the baseline record, every item, then lock it. Must run inside a
/// transaction: on any failure nothing from this call may remain.
pub fn insert_locked_baseline(
    conn: &Connection,
    baseline: &ScheduleBaseline,
    items: &[BaselineItem],
) -> Result<ScheduleBaseline> {
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM schedule_baselines WHERE project_id = ?1 AND name = ?2)",
        params![baseline.project_id, baseline.name],
        |row| row.get(0),
    )?;
    if taken {
        return Err(EngineError::BaselineNameConflict {
            project_id: baseline.project_id.clone(),
            name: baseline.name.clone(),
        });
    }

    conn.execute(
        "INSERT INTO schedule_baselines (id, project_id, name, created_by, created_at, locked, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, 0)",
        params![
            baseline.id,
            baseline.project_id,
            baseline.name,
            baseline.created_by,
            baseline.created_at,
        ],
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO baseline_items (baseline_id, project_id, task_id, planned_start, planned_end,
            duration_minutes, critical_path, total_float_minutes, captured_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for item in items {
        stmt.execute(params![
            baseline.id,
            baseline.project_id,
            item.task_id,
            item.planned_start,
            item.planned_end,
            item.duration_minutes,
            item.critical_path,
            item.total_float_minutes,
            item.captured_at,
        ])?;
    }

    conn.execute(
        "UPDATE schedule_baselines SET locked = 1 WHERE id = ?1",
        params![baseline.id],
    )?;
    get_baseline(conn, &baseline.id)
}

pub fn get_baseline(conn: &Connection, id: &str) -> Result<ScheduleBaseline> {
    conn.query_row(
        &format!("SELECT {BASELINE_COLUMNS} FROM schedule_baselines WHERE id = ?1"),
        params![id],
        row_to_baseline,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => EngineError::BaselineNotFound(id.to_string()),
        _ => EngineError::from(e),
    })
}

pub fn active_baseline(conn: &Connection, project_id: &str) -> Result<Option<ScheduleBaseline>> {
    let baseline = conn
        .query_row(
            &format!(
                "SELECT {BASELINE_COLUMNS} FROM schedule_baselines
                 WHERE project_id = ?1 AND is_active = 1"
            ),
            params![project_id],
            row_to_baseline,
        )
        .optional()?;
    Ok(baseline)
}

/// All baselines of a project, oldest first.
pub fn list_baselines(conn: &Connection, project_id: &str) -> Result<Vec<ScheduleBaseline>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BASELINE_COLUMNS} FROM schedule_baselines
         WHERE project_id = ?1 ORDER BY created_at ASC, id ASC"
    ))?;
    let baselines = stmt
        .query_map(params![project_id], row_to_baseline)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(baselines)
}

pub fn list_items(conn: &Connection, baseline_id: &str) -> Result<Vec<BaselineItem>> {
    let mut stmt = conn.prepare(
        "SELECT baseline_id, task_id, planned_start, planned_end, duration_minutes,
                critical_path, total_float_minutes, captured_at
         FROM baseline_items WHERE baseline_id = ?1 ORDER BY task_id",
    )?;
    let items = stmt
        .query_map(params![baseline_id], |row| {
            Ok(BaselineItem {
                baseline_id: row.get(0)?,
                task_id: row.get(1)?,
                planned_start: row.get(2)?,
                planned_end: row.get(3)?,
                duration_minutes: row.get(4)?,
                critical_path: row.get(5)?,
                total_float_minutes: row.get(6)?,
                captured_at: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Swap the active baseline. Must run inside a transaction so there is never
/// a committed state with zero or two active baselines.
pub fn activate(conn: &Connection, baseline: &ScheduleBaseline) -> Result<()> {
    if !baseline.locked {
        return Err(EngineError::validation(format!(
            "Baseline {} is not locked and cannot be activated",
            baseline.id
        )));
    }
    conn.execute(
        "UPDATE schedule_baselines SET is_active = 0
         WHERE project_id = ?1 AND is_active = 1 AND id != ?2",
        params![baseline.project_id, baseline.id],
    )?;
    conn.execute(
        "UPDATE schedule_baselines SET is_active = 1 WHERE id = ?1",
        params![baseline.id],
    )?;
    Ok(())
}

/// Administrative delete. Items cascade; snapshots keep their figures but
/// lose the baseline reference.
pub fn purge(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM schedule_baselines WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(EngineError::BaselineNotFound(id.to_string()));
    }
    Ok(())
}

fn row_to_baseline(row: &rusqlite::Row) -> rusqlite::Result<ScheduleBaseline> {
    Ok(ScheduleBaseline {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        created_by: row.get(3)?,
        created_at: row.get(4)?,
        locked: row.get(5)?,
        is_active: row.get(6)?,
    })
}
