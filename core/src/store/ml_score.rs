use super::AdStore;
use crate::{error::EngineResult, types::MlScore};
use rusqlite::params;
use std::collections::HashMap;

impl AdStore {
    // ── ML score ────────────────────────────────────────────────

    pub fn upsert_ml_score(&self, score: &MlScore) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO ml_score (client_id, advertiser_id, score) VALUES (?1, ?2, ?3)
             ON CONFLICT (client_id, advertiser_id) DO UPDATE SET score = excluded.score",
            params![score.client_id, score.advertiser_id, score.score],
        )?;
        Ok(())
    }

    /// All scores for one client, keyed by advertiser.
    pub fn ml_scores_for_client(&self, client_id: &str) -> EngineResult<HashMap<String, i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT advertiser_id, score FROM ml_score WHERE client_id = ?1",
        )?;
        let scores = stmt
            .query_map(params![client_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(scores)
    }

    /// Highest score across every row in the system, `None` when empty.
    pub fn max_ml_score(&self) -> EngineResult<Option<i64>> {
        let max = self
            .conn
            .query_row("SELECT MAX(score) FROM ml_score", [], |row| row.get(0))?;
        Ok(max)
    }
}
