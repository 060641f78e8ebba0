use serde::Serialize;
use serde_json::{json, Value};

use crate::error::EngineError;
use crate::models::{
    EarnedValueSnapshot, Project, ScheduleBaseline, ScheduleResult, Task, TaskSchedule,
};

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn error(err: &EngineError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code().as_str(),
            "message": err.to_string()
        }
    })
}

pub fn print(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}

pub fn to_value<T: Serialize>(v: &T) -> Value {
    serde_json::to_value(v).unwrap_or(Value::Null)
}

pub fn project_json(p: &Project) -> Value {
    json!({
        "id": p.key.project_id,
        "organization_id": p.key.organization_id,
        "workspace_id": p.key.workspace_id,
        "name": p.name,
        "schedule_from": p.schedule_from,
        "deadline": p.deadline
    })
}

pub fn task_json(t: &Task) -> Value {
    to_value(t)
}

pub fn task_schedule_json(t: &TaskSchedule) -> Value {
    json!({
        "task_id": t.task_id,
        "duration_minutes": t.duration_minutes,
        "early_start": t.early_start,
        "early_finish": t.early_finish,
        "late_start": t.late_start,
        "late_finish": t.late_finish,
        "total_float_minutes": t.total_float_minutes,
        "free_float_minutes": t.free_float_minutes,
        "critical": t.critical,
        "constraint_violated": t.constraint_violated
    })
}

pub fn schedule_json(s: &ScheduleResult) -> Value {
    let tasks: Vec<_> = s.tasks.iter().map(task_schedule_json).collect();
    json!({
        "project_id": s.project.project_id,
        "schedule_from": s.schedule_from,
        "project_finish": s.project_finish,
        "critical_path": s.critical_path,
        "tasks": tasks,
        "warnings": to_value(&s.warnings)
    })
}

pub fn baseline_json(b: &ScheduleBaseline) -> Value {
    to_value(b)
}

pub fn earned_value_json(s: &EarnedValueSnapshot) -> Value {
    to_value(s)
}
