use super::AdStore;
use crate::{error::EngineResult, types::Advertiser};
use rusqlite::{params, OptionalExtension};

impl AdStore {
    // ── Advertiser ──────────────────────────────────────────────

    pub fn upsert_advertisers(&self, advertisers: &[Advertiser]) -> EngineResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO advertiser (advertiser_id, name) VALUES (?1, ?2)
                 ON CONFLICT (advertiser_id) DO UPDATE SET name = excluded.name",
            )?;
            for a in advertisers {
                stmt.execute(params![a.advertiser_id, a.name])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_advertiser(&self, advertiser_id: &str) -> EngineResult<Option<Advertiser>> {
        let advertiser = self
            .conn
            .query_row(
                "SELECT advertiser_id, name FROM advertiser WHERE advertiser_id = ?1",
                params![advertiser_id],
                |row| {
                    Ok(Advertiser {
                        advertiser_id: row.get(0)?,
                        name:          row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(advertiser)
    }

    pub fn advertiser_exists(&self, advertiser_id: &str) -> EngineResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM advertiser WHERE advertiser_id = ?1)",
            params![advertiser_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}
