use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{EngineError, Result};
use crate::models::{ProjectKey, ScheduleResult, ScheduleWarning, TaskSchedule};

/// Replace the stored schedule for a project with `result`. Call inside a
/// transaction so readers never see a half-written schedule.
pub fn save_schedule(conn: &Connection, result: &ScheduleResult) -> Result<()> {
    let project_id = &result.project.project_id;
    let critical = serde_json::to_string(&result.critical_path)
        .map_err(|e| EngineError::database(e.to_string()))?;
    let warnings =
        serde_json::to_string(&result.warnings).map_err(|e| EngineError::database(e.to_string()))?;

    conn.execute("DELETE FROM schedule_results WHERE project_id = ?1", params![project_id])?;
    conn.execute(
        "INSERT INTO schedule_results (project_id, schedule_from, project_finish, critical_path, warnings, computed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![project_id, result.schedule_from, result.project_finish, critical, warnings, Utc::now()],
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO task_schedules (project_id, task_id, position, duration_minutes,
            early_start, early_finish, late_start, late_finish,
            total_float_minutes, free_float_minutes, critical, constraint_violated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )?;
    for (position, t) in result.tasks.iter().enumerate() {
        stmt.execute(params![
            project_id,
            t.task_id,
            position as i64,
            t.duration_minutes,
            t.early_start,
            t.early_finish,
            t.late_start,
            t.late_finish,
            t.total_float_minutes,
            t.free_float_minutes,
            t.critical,
            t.constraint_violated,
        ])?;
    }
    Ok(())
}

/// The most recently persisted schedule, if any.
pub fn load_schedule(conn: &Connection, key: &ProjectKey) -> Result<Option<ScheduleResult>> {
    let header = conn
        .query_row(
            "SELECT schedule_from, project_finish, critical_path, warnings
             FROM schedule_results WHERE project_id = ?1",
            params![key.project_id],
            |row| {
                Ok((
                    row.get::<_, chrono::DateTime<Utc>>(0)?,
                    row.get::<_, chrono::DateTime<Utc>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;
    let Some((schedule_from, project_finish, critical, warnings)) = header else {
        return Ok(None);
    };

    let critical_path: Vec<String> =
        serde_json::from_str(&critical).map_err(|e| EngineError::database(e.to_string()))?;
    let warnings: Vec<ScheduleWarning> =
        serde_json::from_str(&warnings).map_err(|e| EngineError::database(e.to_string()))?;

    let mut stmt = conn.prepare(
        "SELECT task_id, duration_minutes, early_start, early_finish, late_start, late_finish,
                total_float_minutes, free_float_minutes, critical, constraint_violated
         FROM task_schedules WHERE project_id = ?1 ORDER BY position",
    )?;
    let tasks = stmt
        .query_map(params![key.project_id], |row| {
            Ok(TaskSchedule {
                task_id: row.get(0)?,
                duration_minutes: row.get(1)?,
                early_start: row.get(2)?,
                early_finish: row.get(3)?,
                late_start: row.get(4)?,
                late_finish: row.get(5)?,
                total_float_minutes: row.get(6)?,
                free_float_minutes: row.get(7)?,
                critical: row.get(8)?,
                constraint_violated: row.get(9)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Some(ScheduleResult {
        project: key.clone(),
        schedule_from,
        project_finish,
        tasks,
        critical_path,
        warnings,
    }))
}
