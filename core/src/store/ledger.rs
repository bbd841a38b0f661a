//! Impression/click ledger. Append-only from the engine's point of view.

use super::{constraint_kind, AdStore, ConstraintKind};
use crate::{error::EngineResult, types::LedgerEntry};
use rusqlite::params;
use std::collections::{HashMap, HashSet};

/// Result of a constraint-enforcing ledger write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The (client, campaign) pair already has a row.
    Duplicate,
    /// A referenced row (client, campaign or parent impression) is missing.
    MissingReference,
}

impl AdStore {
    pub fn insert_impression(&self, entry: &LedgerEntry) -> EngineResult<InsertOutcome> {
        self.insert_ledger_row(
            "INSERT INTO impression (client_id, campaign_id, day, profit)
             VALUES (?1, ?2, ?3, ?4)",
            entry,
        )
    }

    pub fn insert_click(&self, entry: &LedgerEntry) -> EngineResult<InsertOutcome> {
        self.insert_ledger_row(
            "INSERT INTO click (client_id, campaign_id, day, profit)
             VALUES (?1, ?2, ?3, ?4)",
            entry,
        )
    }

    fn insert_ledger_row(&self, sql: &str, entry: &LedgerEntry) -> EngineResult<InsertOutcome> {
        let result = self.conn.execute(
            sql,
            params![entry.client_id, entry.campaign_id, entry.day, entry.profit],
        );
        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) => match constraint_kind(&e) {
                Some(ConstraintKind::Unique) => Ok(InsertOutcome::Duplicate),
                Some(ConstraintKind::ForeignKey) => Ok(InsertOutcome::MissingReference),
                None => Err(e.into()),
            },
        }
    }

    pub fn impression_exists(&self, client_id: &str, campaign_id: &str) -> EngineResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM impression WHERE client_id = ?1 AND campaign_id = ?2
             )",
            params![client_id, campaign_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Campaign ids the client has already been shown.
    pub fn impressed_campaigns(&self, client_id: &str) -> EngineResult<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT campaign_id FROM impression WHERE client_id = ?1")?;
        let ids = stmt
            .query_map(params![client_id], |row| row.get(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    pub fn count_impressions(&self, campaign_id: &str) -> EngineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM impression WHERE campaign_id = ?1",
            params![campaign_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Impression count per campaign, for every campaign that has any.
    pub fn impression_counts(&self) -> EngineResult<HashMap<String, i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT campaign_id, COUNT(*) FROM impression GROUP BY campaign_id",
        )?;
        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(counts)
    }

    pub fn count_clicks(&self, campaign_id: &str) -> EngineResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM click WHERE campaign_id = ?1",
            params![campaign_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn impressions_for_campaign(&self, campaign_id: &str) -> EngineResult<Vec<LedgerEntry>> {
        self.ledger_rows(
            "SELECT client_id, campaign_id, day, profit FROM impression
             WHERE campaign_id = ?1 ORDER BY day ASC, client_id ASC",
            campaign_id,
        )
    }

    pub fn clicks_for_campaign(&self, campaign_id: &str) -> EngineResult<Vec<LedgerEntry>> {
        self.ledger_rows(
            "SELECT client_id, campaign_id, day, profit FROM click
             WHERE campaign_id = ?1 ORDER BY day ASC, client_id ASC",
            campaign_id,
        )
    }

    fn ledger_rows(&self, sql: &str, campaign_id: &str) -> EngineResult<Vec<LedgerEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![campaign_id], |row| {
                Ok(LedgerEntry {
                    client_id:   row.get(0)?,
                    campaign_id: row.get(1)?,
                    day:         row.get(2)?,
                    profit:      row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
