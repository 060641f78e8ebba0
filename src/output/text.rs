use crate::models::{
    EarnedValueSnapshot, Project, ScheduleBaseline, ScheduleResult, Task, TaskVariance,
};

fn date(d: chrono::DateTime<chrono::Utc>) -> String {
    d.format("%Y-%m-%d %H:%M").to_string()
}

fn ratio(r: Option<f64>) -> String {
    r.map(|v| format!("{v:.3}")).unwrap_or_else(|| "n/a".to_string())
}

pub fn print_project(p: &Project, tasks: &[Task]) {
    println!("Project: {} ({})", p.name, p.key);
    println!("  Schedule from: {}", date(p.schedule_from));
    if let Some(deadline) = p.deadline {
        println!("  Deadline: {}", date(deadline));
    }
    println!("  Tasks: {}", tasks.len());
    for t in tasks {
        println!(
            "    {} {} {}% budget={} actual={}",
            t.id,
            if t.name.is_empty() { "-" } else { t.name.as_str() },
            t.percent_complete,
            t.budgeted_cost,
            t.actual_cost
        );
    }
}

pub fn print_schedule(s: &ScheduleResult) {
    println!("Schedule for {} finishes {}", s.project, date(s.project_finish));
    for t in &s.tasks {
        println!(
            "  {}{} ES={} EF={} TF={}m FF={}m",
            if t.critical { "*" } else { " " },
            t.task_id,
            date(t.early_start),
            date(t.early_finish),
            t.total_float_minutes,
            t.free_float_minutes
        );
    }
    if s.critical_path.is_empty() {
        println!("Critical path: (none)");
    } else {
        println!("Critical path: {}", s.critical_path.join(" -> "));
    }
    for w in &s.warnings {
        println!("Warning: {w:?}");
    }
}

pub fn print_baseline(b: &ScheduleBaseline) {
    println!(
        "Baseline: {} ({}){}",
        b.name,
        b.id,
        if b.is_active { " [active]" } else { "" }
    );
    if let Some(ref by) = b.created_by {
        println!("  Created by: {by}");
    }
    println!("  Created: {}", date(b.created_at));
}

pub fn print_baseline_list(baselines: &[ScheduleBaseline]) {
    if baselines.is_empty() {
        println!("No baselines found.");
        return;
    }
    for b in baselines {
        let marker = if b.is_active { " *" } else { "" };
        println!("  {} ({}) {}{}", b.name, b.id, date(b.created_at), marker);
    }
}

pub fn print_variance(rows: &[TaskVariance]) {
    if rows.is_empty() {
        println!("No baselined tasks.");
        return;
    }
    for v in rows {
        println!(
            "  {} start {:+}m finish {:+}m",
            v.task_id, v.start_variance_minutes, v.finish_variance_minutes
        );
    }
}

pub fn print_earned_value(s: &EarnedValueSnapshot) {
    println!("Earned value as of {}", s.as_of_date);
    println!("  BAC={} PV={} EV={} AC={}", s.bac, s.pv, s.ev, s.ac);
    println!("  CPI={} SPI={}", ratio(s.cpi), ratio(s.spi));
    println!("  EAC={} ETC={} VAC={}", s.eac, s.etc, s.vac);
}

pub fn print_earned_value_history(history: &[EarnedValueSnapshot]) {
    if history.is_empty() {
        println!("No earned value snapshots.");
        return;
    }
    for s in history {
        println!(
            "  {} PV={} EV={} AC={} CPI={} SPI={}",
            s.as_of_date,
            s.pv,
            s.ev,
            s.ac,
            ratio(s.cpi),
            ratio(s.spi)
        );
    }
}
