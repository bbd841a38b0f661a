use super::AdStore;
use crate::{
    error::EngineResult,
    types::{Campaign, CampaignData, Day, Page, Targeting},
};
use rusqlite::{params, OptionalExtension, Row};

const CAMPAIGN_COLUMNS: &str = "campaign_id, advertiser_id, impressions_limit, clicks_limit,
    cost_per_impression, cost_per_click, ad_title, ad_text, ad_image_url,
    start_date, end_date, gender, age_from, age_to, location";

fn campaign_from_row(row: &Row<'_>) -> rusqlite::Result<Campaign> {
    Ok(Campaign {
        campaign_id:         row.get(0)?,
        advertiser_id:       row.get(1)?,
        impressions_limit:   row.get(2)?,
        clicks_limit:        row.get(3)?,
        cost_per_impression: row.get(4)?,
        cost_per_click:      row.get(5)?,
        ad_title:            row.get(6)?,
        ad_text:             row.get(7)?,
        ad_image_url:        row.get(8)?,
        start_date:          row.get(9)?,
        end_date:            row.get(10)?,
        targeting: Targeting {
            gender:   row.get(11)?,
            age_from: row.get(12)?,
            age_to:   row.get(13)?,
            location: row.get(14)?,
        },
    })
}

impl AdStore {
    // ── Campaign ──────────────────────────────────────────────────

    pub fn insert_campaign(&self, c: &Campaign) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO campaign (
                campaign_id, advertiser_id, impressions_limit, clicks_limit,
                cost_per_impression, cost_per_click, ad_title, ad_text, ad_image_url,
                start_date, end_date, gender, age_from, age_to, location
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                c.campaign_id,
                c.advertiser_id,
                c.impressions_limit,
                c.clicks_limit,
                c.cost_per_impression,
                c.cost_per_click,
                c.ad_title,
                c.ad_text,
                c.ad_image_url,
                c.start_date,
                c.end_date,
                c.targeting.gender,
                c.targeting.age_from,
                c.targeting.age_to,
                c.targeting.location,
            ],
        )?;
        Ok(())
    }

    pub fn get_campaign(&self, campaign_id: &str) -> EngineResult<Option<Campaign>> {
        let campaign = self
            .conn
            .query_row(
                &format!("SELECT {CAMPAIGN_COLUMNS} FROM campaign WHERE campaign_id = ?1"),
                params![campaign_id],
                campaign_from_row,
            )
            .optional()?;
        Ok(campaign)
    }

    /// Newest first.
    pub fn campaigns_for_advertiser(
        &self,
        advertiser_id: &str,
        page: Page,
    ) -> EngineResult<Vec<Campaign>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaign
             WHERE advertiser_id = ?1
             ORDER BY seq DESC
             LIMIT ?2 OFFSET ?3"
        ))?;
        let campaigns = stmt
            .query_map(
                params![advertiser_id, page.size as i64, page.offset()],
                campaign_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(campaigns)
    }

    /// Every campaign whose window contains `day`, ordered by id.
    pub fn campaigns_running_on(&self, day: Day) -> EngineResult<Vec<Campaign>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaign
             WHERE start_date <= ?1 AND end_date >= ?1
             ORDER BY campaign_id ASC"
        ))?;
        let campaigns = stmt
            .query_map(params![day], campaign_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(campaigns)
    }

    /// Overwrite every mutable column. Returns false when the row is gone.
    pub fn update_campaign(&self, campaign_id: &str, data: &CampaignData) -> EngineResult<bool> {
        let changed = self.conn.execute(
            "UPDATE campaign SET
                impressions_limit = ?1, clicks_limit = ?2,
                cost_per_impression = ?3, cost_per_click = ?4,
                ad_title = ?5, ad_text = ?6,
                start_date = ?7, end_date = ?8,
                gender = ?9, age_from = ?10, age_to = ?11, location = ?12
             WHERE campaign_id = ?13",
            params![
                data.impressions_limit,
                data.clicks_limit,
                data.cost_per_impression,
                data.cost_per_click,
                data.ad_title,
                data.ad_text,
                data.start_date,
                data.end_date,
                data.targeting.gender,
                data.targeting.age_from,
                data.targeting.age_to,
                data.targeting.location,
                campaign_id,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn set_campaign_ad_image_url(
        &self,
        campaign_id: &str,
        url: Option<&str>,
    ) -> EngineResult<bool> {
        let changed = self.conn.execute(
            "UPDATE campaign SET ad_image_url = ?1 WHERE campaign_id = ?2",
            params![url, campaign_id],
        )?;
        Ok(changed > 0)
    }

    /// Deletes the campaign; its impressions and clicks cascade with it.
    pub fn delete_campaign(&self, campaign_id: &str) -> EngineResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM campaign WHERE campaign_id = ?1",
            params![campaign_id],
        )?;
        Ok(changed > 0)
    }
}
