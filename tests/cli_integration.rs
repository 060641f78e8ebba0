#[allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// ─── helpers ───────────────────────────────────────────────────────

struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        let dir = TempDir::new().expect("create tempdir");
        Self { dir }
    }

    fn db_path(&self) -> PathBuf {
        self.dir.path().join("critpath.db")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("critpath").expect("binary");
        cmd.current_dir(self.dir.path())
            .env_remove("CRITPATH_ORG")
            .env_remove("CRITPATH_WORKSPACE")
            .env_remove("CRITPATH_LOG")
            .env("CRITPATH_DB", self.db_path());
        cmd
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let mut a: Vec<&str> = args.to_vec();
        a.push("--json");
        let output = self.cmd().args(&a).output().expect("run");
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("parse JSON failed: {e}\nstdout: {stdout}"))
    }

    fn run_ok(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], true, "expected success=true: {v}");
        v
    }

    fn run_err(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], false, "expected success=false: {v}");
        v
    }

    fn write_config(&self, content: &str) {
        fs::write(self.dir.path().join("critpath.json"), content).expect("write config");
    }

    fn load_project_raw(&self, content: &str) -> Value {
        let output = self
            .cmd()
            .args(["project", "load", "--json"])
            .write_stdin(content.to_string())
            .output()
            .expect("project load");
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("parse JSON failed: {e}\nstdout: {stdout}"))
    }

    fn load_project(&self, content: &str) -> Value {
        let v = self.load_project_raw(content);
        assert_eq!(v["success"], true, "project load failed: {v}");
        v
    }
}

fn project_json(tasks: Value, dependencies: Value) -> String {
    json!({
        "organization_id": "acme",
        "workspace_id": "eng",
        "project": {
            "id": "p1",
            "name": "Rollout",
            "schedule_from": "2025-03-01T00:00:00Z"
        },
        "tasks": tasks,
        "dependencies": dependencies
    })
    .to_string()
}

fn diamond_json() -> String {
    project_json(
        json!([
            {"id": "a", "name": "Design", "duration_minutes": 60, "budgeted_cost": 1000},
            {"id": "b", "name": "Build", "duration_minutes": 120, "budgeted_cost": 3000},
            {"id": "c", "name": "Docs", "duration_minutes": 30, "budgeted_cost": 500},
            {"id": "d", "name": "Ship", "duration_minutes": 60, "budgeted_cost": 500}
        ]),
        json!([
            {"predecessor_id": "a", "successor_id": "b"},
            {"predecessor_id": "a", "successor_id": "c"},
            {"predecessor_id": "b", "successor_id": "d"},
            {"predecessor_id": "c", "successor_id": "d"}
        ]),
    )
}

fn setup_diamond(env: &TestEnv) -> Value {
    env.run_ok(&["init"]);
    env.load_project(&diamond_json())
}

fn task<'a>(schedule: &'a Value, id: &str) -> &'a Value {
    schedule["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["task_id"] == id)
        .unwrap_or_else(|| panic!("task {id} missing from {schedule}"))
}

// ─── init ──────────────────────────────────────────────────────────

#[test]
fn test_init_creates_db() {
    let env = TestEnv::new();
    let v = env.run_ok(&["init"]);
    assert!(v["data"]["path"].as_str().unwrap().ends_with("critpath.db"));
    assert!(env.db_path().exists());
    env.run_ok(&["init"]);
}

#[test]
fn test_commands_require_init() {
    let env = TestEnv::new();
    let v = env.run_err(&["recompute", "p1"]);
    assert_eq!(v["error"]["code"], "NOT_INITIALIZED");
}

// ─── project load / recompute ──────────────────────────────────────

#[test]
fn test_load_and_recompute_diamond() {
    let env = TestEnv::new();
    let loaded = setup_diamond(&env);
    assert_eq!(loaded["data"]["created"], true);
    assert_eq!(loaded["data"]["tasks_loaded"], 4);
    assert_eq!(loaded["data"]["dependencies_added"], 4);

    let v = env.run_ok(&["recompute", "p1"]);
    let s = &v["data"];
    assert_eq!(s["critical_path"], json!(["a", "b", "d"]));
    assert_eq!(s["project_finish"], "2025-03-01T04:00:00Z");
    assert_eq!(task(s, "c")["total_float_minutes"], 90);
    assert_eq!(task(s, "c")["free_float_minutes"], 90);
    assert_eq!(task(s, "d")["early_start"], "2025-03-01T03:00:00Z");

    let order: Vec<_> = s["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["task_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(order, vec!["a", "b", "c", "d"]);
}

#[test]
fn test_recompute_is_deterministic() {
    let env = TestEnv::new();
    setup_diamond(&env);
    let first = env.run_ok(&["recompute", "p1"]);
    let second = env.run_ok(&["recompute", "p1"]);
    assert_eq!(first, second);

    let shown = env.run_ok(&["project", "show", "p1"]);
    assert_eq!(shown["data"]["schedule"], first["data"]);
    assert_eq!(shown["data"]["tasks"].as_array().unwrap().len(), 4);
}

#[test]
fn test_reload_updates_without_duplicating_edges() {
    let env = TestEnv::new();
    setup_diamond(&env);
    let again = env.load_project(&diamond_json());
    assert_eq!(again["data"]["created"], false);
    assert_eq!(again["data"]["dependencies_added"], 0);
}

#[test]
fn test_load_rejects_cycle_atomically() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    let v = env.load_project_raw(&project_json(
        json!([
            {"id": "a", "duration_minutes": 60},
            {"id": "b", "duration_minutes": 60},
            {"id": "c", "duration_minutes": 60}
        ]),
        json!([
            {"predecessor_id": "a", "successor_id": "b"},
            {"predecessor_id": "b", "successor_id": "c"},
            {"predecessor_id": "c", "successor_id": "a"}
        ]),
    ));
    assert_eq!(v["success"], false);
    assert_eq!(v["error"]["code"], "CYCLE_DETECTED");
    assert!(v["error"]["message"].as_str().unwrap().contains("a -> b -> c -> a"));

    let v = env.run_err(&["project", "show", "p1"]);
    assert_eq!(v["error"]["code"], "PROJECT_NOT_FOUND");
}

#[test]
fn test_load_rejects_bad_edges() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    let tasks = json!([{"id": "a", "duration_minutes": 60}, {"id": "b", "duration_minutes": 60}]);

    let v = env.load_project_raw(&project_json(
        tasks.clone(),
        json!([{"predecessor_id": "a", "successor_id": "a"}]),
    ));
    assert_eq!(v["error"]["code"], "SELF_LOOP");

    let v = env.load_project_raw(&project_json(
        tasks.clone(),
        json!([{"predecessor_id": "a", "successor_id": "ghost"}]),
    ));
    assert_eq!(v["error"]["code"], "DANGLING_EDGE");

    let v = env.load_project_raw(&project_json(
        tasks.clone(),
        json!([
            {"predecessor_id": "a", "successor_id": "b"},
            {"predecessor_id": "a", "successor_id": "b", "lag_minutes": 5}
        ]),
    ));
    assert_eq!(v["error"]["code"], "DUPLICATE_EDGE");

    let v = env.load_project_raw(&project_json(
        tasks,
        json!([{"predecessor_id": "a", "successor_id": "b", "lag_minutes": 50000}]),
    ));
    assert_eq!(v["error"]["code"], "LAG_OUT_OF_RANGE");
}

#[test]
fn test_load_rejects_invalid_json() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    let v = env.load_project_raw("{not json");
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

// ─── dependencies ──────────────────────────────────────────────────

#[test]
fn test_dep_add_guards_cycle() {
    let env = TestEnv::new();
    setup_diamond(&env);
    let v = env.run_err(&["dep", "add", "p1", "d", "a"]);
    assert_eq!(v["error"]["code"], "CYCLE_DETECTED");
    let v = env.run_err(&["dep", "add", "p1", "a", "b"]);
    assert_eq!(v["error"]["code"], "DUPLICATE_EDGE");
}

#[test]
fn test_dep_lead_time() {
    let env = TestEnv::new();
    setup_diamond(&env);
    env.run_ok(&["dep", "remove", "p1", "c", "d"]);
    env.run_ok(&["dep", "add", "p1", "c", "d", "--lag", "-30"]);
    let v = env.run_ok(&["recompute", "p1"]);
    // c finishes at 01:30, lead of 30 min; b still drives d.
    assert_eq!(task(&v["data"], "d")["early_start"], "2025-03-01T03:00:00Z");
    assert_eq!(task(&v["data"], "c")["free_float_minutes"], 120);
}

#[test]
fn test_removed_task_leaves_dangling_edge_and_old_schedule() {
    let env = TestEnv::new();
    setup_diamond(&env);
    let good = env.run_ok(&["recompute", "p1"]);
    env.run_ok(&["task", "remove", "p1", "c"]);

    let v = env.run_err(&["recompute", "p1"]);
    assert_eq!(v["error"]["code"], "DANGLING_EDGE");

    let shown = env.run_ok(&["project", "show", "p1"]);
    assert_eq!(shown["data"]["schedule"], good["data"]);
}

// ─── baselines ─────────────────────────────────────────────────────

#[test]
fn test_baseline_create_activate_list() {
    let env = TestEnv::new();
    setup_diamond(&env);
    let v1 = env.run_ok(&["baseline", "create", "p1", "v1", "--by", "pm"]);
    assert_eq!(v1["data"]["locked"], true);
    assert_eq!(v1["data"]["is_active"], false);
    assert_eq!(v1["data"]["created_by"], "pm");
    let v1_id = v1["data"]["id"].as_str().unwrap().to_string();

    let v2 = env.run_ok(&["baseline", "create", "p1", "v2"]);
    let v2_id = v2["data"]["id"].as_str().unwrap().to_string();

    env.run_ok(&["baseline", "activate", &v1_id]);
    let active = env.run_ok(&["baseline", "activate", &v2_id]);
    assert_eq!(active["data"]["is_active"], true);

    let list = env.run_ok(&["baseline", "list", "p1"]);
    let actives: Vec<_> = list["data"]["baselines"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|b| b["is_active"] == true)
        .map(|b| b["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(actives, vec![v2_id]);

    let shown = env.run_ok(&["baseline", "show", &v1_id]);
    assert_eq!(shown["data"]["items"].as_array().unwrap().len(), 4);

    let dup = env.run_err(&["baseline", "create", "p1", "v1"]);
    assert_eq!(dup["error"]["code"], "BASELINE_NAME_CONFLICT");

    env.run_ok(&["baseline", "purge", &v1_id]);
    let v = env.run_err(&["baseline", "show", &v1_id]);
    assert_eq!(v["error"]["code"], "BASELINE_NOT_FOUND");
}

fn infeasible_json() -> String {
    project_json(
        json!([
            {"id": "a", "duration_minutes": 240},
            {"id": "b", "duration_minutes": 60,
             "constraint_type": "MUST_FINISH_ON", "constraint_date": "2025-03-01T02:00:00Z"}
        ]),
        json!([{"predecessor_id": "a", "successor_id": "b"}]),
    )
}

#[test]
fn test_negative_float_blocks_baseline() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    env.load_project(&infeasible_json());

    let v = env.run_ok(&["recompute", "p1"]);
    assert_eq!(task(&v["data"], "b")["total_float_minutes"], -180);
    assert_eq!(task(&v["data"], "b")["constraint_violated"], true);
    assert!(!v["data"]["warnings"].as_array().unwrap().is_empty());

    let v = env.run_err(&["baseline", "create", "p1", "v1"]);
    assert_eq!(v["error"]["code"], "NO_FEASIBLE_SCHEDULE");
}

#[test]
fn test_negative_float_warn_policy() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    env.write_config(r#"{"negative_float_policy": "warn"}"#);
    env.load_project(&infeasible_json());
    env.run_ok(&["baseline", "create", "p1", "v1"]);
}

// ─── earned value ──────────────────────────────────────────────────

fn ev_json() -> String {
    project_json(
        json!([{
            "id": "a",
            "planned_start": "2025-03-01T00:00:00Z",
            "planned_end": "2025-03-05T00:00:00Z",
            "budgeted_cost": 1000,
            "actual_cost": 400,
            "percent_complete": 50
        }]),
        json!([]),
    )
}

#[test]
fn test_earned_value_without_active_baseline_is_null() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    env.load_project(&ev_json());
    let v = env.run_ok(&["ev", "compute", "p1", "--as-of", "2025-03-10"]);
    assert_eq!(v["data"], Value::Null);
}

#[test]
fn test_earned_value_metrics() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    env.load_project(&ev_json());
    let b = env.run_ok(&["baseline", "create", "p1", "v1"]);
    env.run_ok(&["baseline", "activate", b["data"]["id"].as_str().unwrap()]);

    let v = env.run_ok(&["ev", "compute", "p1", "--as-of", "2025-03-10"]);
    let d = &v["data"];
    assert_eq!(d["as_of_date"], "2025-03-10");
    assert_eq!(d["bac"], 1000);
    assert_eq!(d["pv"], 1000);
    assert_eq!(d["ev"], 500);
    assert_eq!(d["ac"], 400);
    assert_eq!(d["cpi"], 1.25);
    assert_eq!(d["spi"], 0.5);
    assert_eq!(d["eac"], 800);
    assert_eq!(d["etc"], 400);
    assert_eq!(d["vac"], 200);

    env.run_ok(&["task", "progress", "p1", "a", "--percent", "100", "--actual-cost", "900"]);
    env.run_ok(&["ev", "compute", "p1", "--as-of", "2025-03-10"]);
    env.run_ok(&["ev", "compute", "p1", "--as-of", "2025-03-03"]);

    let h = env.run_ok(&["ev", "history", "p1"]);
    let snaps = h["data"]["snapshots"].as_array().unwrap();
    assert_eq!(snaps.len(), 2);
    assert_eq!(snaps[0]["as_of_date"], "2025-03-03");
    assert_eq!(snaps[0]["pv"], 750);
    assert_eq!(snaps[1]["ev"], 1000);
    assert_eq!(snaps[1]["ac"], 900);
}

#[test]
fn test_variance_against_active_baseline() {
    let env = TestEnv::new();
    setup_diamond(&env);
    let v = env.run_ok(&["variance", "p1"]);
    assert_eq!(v["data"]["variance"], Value::Null);

    let b = env.run_ok(&["baseline", "create", "p1", "v1"]);
    env.run_ok(&["baseline", "activate", b["data"]["id"].as_str().unwrap()]);
    env.run_ok(&["dep", "remove", "p1", "a", "b"]);
    env.run_ok(&["dep", "add", "p1", "a", "b", "--lag", "60"]);

    let v = env.run_ok(&["variance", "p1"]);
    let rows = v["data"]["variance"].as_array().unwrap();
    let d = rows.iter().find(|r| r["task_id"] == "d").unwrap();
    assert_eq!(d["finish_variance_minutes"], 60);
    let c = rows.iter().find(|r| r["task_id"] == "c").unwrap();
    assert_eq!(c["start_variance_minutes"], 0);
}

// ─── scope ─────────────────────────────────────────────────────────

#[test]
fn test_foreign_scope_is_not_found() {
    let env = TestEnv::new();
    setup_diamond(&env);
    let v = env.run_err(&["recompute", "p1", "--org", "other"]);
    assert_eq!(v["error"]["code"], "PROJECT_NOT_FOUND");
    env.run_ok(&["recompute", "p1", "--org", "acme", "--workspace", "eng"]);
}

#[test]
fn test_task_ids_are_scoped_per_project() {
    let env = TestEnv::new();
    setup_diamond(&env);
    let second = json!({
        "organization_id": "acme",
        "workspace_id": "eng",
        "project": {"id": "p2", "name": "Follow-up", "schedule_from": "2025-04-01T00:00:00Z"},
        "tasks": [
            {"id": "a", "duration_minutes": 15},
            {"id": "build", "duration_minutes": 45}
        ],
        "dependencies": [{"predecessor_id": "a", "successor_id": "build"}]
    })
    .to_string();
    env.load_project(&second);

    let p2 = env.run_ok(&["recompute", "p2"]);
    assert_eq!(p2["data"]["critical_path"], json!(["a", "build"]));
    assert_eq!(p2["data"]["project_finish"], "2025-04-01T01:00:00Z");

    let p1 = env.run_ok(&["recompute", "p1"]);
    assert_eq!(task(&p1["data"], "a")["duration_minutes"], 60);
    assert_eq!(p1["data"]["project_finish"], "2025-03-01T04:00:00Z");
}

// ─── text output ───────────────────────────────────────────────────

#[test]
fn test_text_output_shows_critical_path() {
    let env = TestEnv::new();
    setup_diamond(&env);
    env.cmd()
        .args(["recompute", "p1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Critical path: a -> b -> d"));
}

#[test]
fn test_text_error_exits_nonzero() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    env.cmd()
        .args(["recompute", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Project not found"));
}
