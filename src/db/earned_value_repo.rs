use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::EarnedValueSnapshot;

const SNAPSHOT_COLUMNS: &str =
    "project_id, as_of_date, baseline_id, bac, pv, ev, ac, cpi, spi, eac, etc, vac, computed_at";

/// One row per project and day; a later computation for the same day
/// replaces the earlier one.
pub fn upsert_snapshot(conn: &Connection, snap: &EarnedValueSnapshot) -> Result<()> {
    conn.execute(
        "INSERT INTO earned_value_snapshots
            (project_id, as_of_date, baseline_id, bac, pv, ev, ac, cpi, spi, eac, etc, vac, computed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT(project_id, as_of_date) DO UPDATE SET
            baseline_id = excluded.baseline_id,
            bac = excluded.bac,
            pv = excluded.pv,
            ev = excluded.ev,
            ac = excluded.ac,
            cpi = excluded.cpi,
            spi = excluded.spi,
            eac = excluded.eac,
            etc = excluded.etc,
            vac = excluded.vac,
            computed_at = excluded.computed_at",
        params![
            snap.project_id,
            snap.as_of_date,
            snap.baseline_id,
            snap.bac,
            snap.pv,
            snap.ev,
            snap.ac,
            snap.cpi,
            snap.spi,
            snap.eac,
            snap.etc,
            snap.vac,
            snap.computed_at,
        ],
    )?;
    Ok(())
}

pub fn get_snapshot(conn: &Connection, project_id: &str, as_of: NaiveDate) -> Result<Option<EarnedValueSnapshot>> {
    let snap = conn
        .query_row(
            &format!(
                "SELECT {SNAPSHOT_COLUMNS} FROM earned_value_snapshots
                 WHERE project_id = ?1 AND as_of_date = ?2"
            ),
            params![project_id, as_of],
            row_to_snapshot,
        )
        .optional()?;
    Ok(snap)
}

pub fn history(conn: &Connection, project_id: &str) -> Result<Vec<EarnedValueSnapshot>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM earned_value_snapshots
         WHERE project_id = ?1 ORDER BY as_of_date ASC"
    ))?;
    let snaps = stmt
        .query_map(params![project_id], row_to_snapshot)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(snaps)
}

fn row_to_snapshot(row: &rusqlite::Row) -> rusqlite::Result<EarnedValueSnapshot> {
    Ok(EarnedValueSnapshot {
        project_id: row.get(0)?,
        as_of_date: row.get(1)?,
        baseline_id: row.get(2)?,
        bac: row.get(3)?,
        pv: row.get(4)?,
        ev: row.get(5)?,
        ac: row.get(6)?,
        cpi: row.get(7)?,
        spi: row.get(8)?,
        eac: row.get(9)?,
        etc: row.get(10)?,
        vac: row.get(11)?,
        computed_at: row.get(12)?,
    })
}
