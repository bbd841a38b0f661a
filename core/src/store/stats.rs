use super::AdStore;
use crate::{error::EngineResult, stats::LedgerKind, types::Day};
use rusqlite::params;

/// One day of one ledger table, already reduced: row count and profit sum.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerDayRow {
    pub campaign_id: String,
    pub day:         Day,
    pub count:       i64,
    pub spent:       f64,
}

impl AdStore {
    // ── Stats queries ───────────────────────────────────────────

    /// Per-day totals of one ledger table for a single campaign, ascending by day.
    pub fn ledger_days_for_campaign(
        &self,
        kind: LedgerKind,
        campaign_id: &str,
    ) -> EngineResult<Vec<LedgerDayRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT campaign_id, day, COUNT(*), COALESCE(SUM(profit), 0.0)
             FROM {table}
             WHERE campaign_id = ?1
             GROUP BY campaign_id, day
             ORDER BY day ASC",
            table = kind.table(),
        ))?;
        let rows = stmt
            .query_map(params![campaign_id], day_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Per-campaign, per-day totals of one ledger table across every campaign
    /// the advertiser owns.
    pub fn ledger_days_for_advertiser(
        &self,
        kind: LedgerKind,
        advertiser_id: &str,
    ) -> EngineResult<Vec<LedgerDayRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT l.campaign_id, l.day, COUNT(*), COALESCE(SUM(l.profit), 0.0)
             FROM {table} l
             JOIN campaign c ON c.campaign_id = l.campaign_id
             WHERE c.advertiser_id = ?1
             GROUP BY l.campaign_id, l.day
             ORDER BY l.campaign_id ASC, l.day ASC",
            table = kind.table(),
        ))?;
        let rows = stmt
            .query_map(params![advertiser_id], day_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn day_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerDayRow> {
    Ok(LedgerDayRow {
        campaign_id: row.get(0)?,
        day:         row.get(1)?,
        count:       row.get(2)?,
        spent:       row.get(3)?,
    })
}
