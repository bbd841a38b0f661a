use super::AdStore;
use crate::{error::EngineResult, types::Client};
use rusqlite::{params, OptionalExtension};

impl AdStore {
    // ── Client ──────────────────────────────────────────────────

    /// Insert or overwrite each client. Runs in one transaction.
    pub fn upsert_clients(&self, clients: &[Client]) -> EngineResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO client (client_id, login, age, location, gender)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (client_id) DO UPDATE SET
                    login = excluded.login,
                    age = excluded.age,
                    location = excluded.location,
                    gender = excluded.gender",
            )?;
            for c in clients {
                stmt.execute(params![c.client_id, c.login, c.age, c.location, c.gender])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_client(&self, client_id: &str) -> EngineResult<Option<Client>> {
        let client = self
            .conn
            .query_row(
                "SELECT client_id, login, age, location, gender
                 FROM client WHERE client_id = ?1",
                params![client_id],
                |row| {
                    Ok(Client {
                        client_id: row.get(0)?,
                        login:     row.get(1)?,
                        age:       row.get(2)?,
                        location:  row.get(3)?,
                        gender:    row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(client)
    }

    pub fn client_exists(&self, client_id: &str) -> EngineResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM client WHERE client_id = ?1)",
            params![client_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}
