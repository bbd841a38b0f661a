//! Serializable engine requests and their dispatch.
//!
//! Transports decode an `EngineCommand`, hand it to `AdEngine::execute` and
//! encode the JSON reply. The engine never sees transport types.

use crate::{
    engine::AdEngine,
    error::EngineResult,
    types::{Advertiser, CampaignData, Client, Day, EntityId, MlScore, Page},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Every request a transport can hand to the engine.
/// Variants are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum EngineCommand {
    // ── Clock ─────────────────────────────────────
    AdvanceDay {
        #[serde(default)]
        day: Option<Day>,
    },
    CurrentDay,

    // ── Entities ──────────────────────────────────
    UpsertClients { clients: Vec<Client> },
    GetClient { client_id: EntityId },
    UpsertAdvertisers { advertisers: Vec<Advertiser> },
    GetAdvertiser { advertiser_id: EntityId },
    UpsertMlScore { score: MlScore },

    // ── Ads ───────────────────────────────────────
    GetAd { client_id: EntityId },
    Click {
        client_id:   EntityId,
        campaign_id: EntityId,
    },

    // ── Campaigns ─────────────────────────────────
    CreateCampaign {
        advertiser_id: EntityId,
        campaign:      CampaignData,
    },
    GetCampaign {
        advertiser_id: EntityId,
        campaign_id:   EntityId,
    },
    ListCampaigns {
        advertiser_id: EntityId,
        #[serde(default)]
        page: Option<u32>,
        #[serde(default)]
        size: Option<u32>,
    },
    UpdateCampaign {
        advertiser_id: EntityId,
        campaign_id:   EntityId,
        campaign:      CampaignData,
    },
    DeleteCampaign {
        advertiser_id: EntityId,
        campaign_id:   EntityId,
    },
    SetCampaignImage {
        advertiser_id: EntityId,
        campaign_id:   EntityId,
        #[serde(default)]
        url: Option<String>,
    },

    // ── Stats ─────────────────────────────────────
    CampaignStats { campaign_id: EntityId },
    CampaignStatsDaily { campaign_id: EntityId },
    AdvertiserStats { advertiser_id: EntityId },
    AdvertiserStatsDaily { advertiser_id: EntityId },

    Quit,
}

impl AdEngine {
    /// Run one command and render its result as JSON.
    pub fn execute(&self, command: EngineCommand, default_page_size: u32) -> EngineResult<Value> {
        let reply = match command {
            EngineCommand::AdvanceDay { day } => json!({ "current_day": self.advance_day(day)? }),
            EngineCommand::CurrentDay => json!({ "current_day": self.current_day()? }),

            EngineCommand::UpsertClients { clients } => serde_json::to_value(self.upsert_clients(clients)?)?,
            EngineCommand::GetClient { client_id } => serde_json::to_value(self.get_client(&client_id)?)?,
            EngineCommand::UpsertAdvertisers { advertisers } => {
                serde_json::to_value(self.upsert_advertisers(advertisers)?)?
            }
            EngineCommand::GetAdvertiser { advertiser_id } => {
                serde_json::to_value(self.get_advertiser(&advertiser_id)?)?
            }
            EngineCommand::UpsertMlScore { score } => {
                self.upsert_ml_score(&score)?;
                json!({ "ok": true })
            }

            EngineCommand::GetAd { client_id } => serde_json::to_value(self.select_ad_for_client(&client_id)?)?,
            EngineCommand::Click { client_id, campaign_id } => {
                self.record_click(&client_id, &campaign_id)?;
                json!({ "ok": true })
            }

            EngineCommand::CreateCampaign { advertiser_id, campaign } => {
                serde_json::to_value(self.create_campaign(&advertiser_id, campaign)?)?
            }
            EngineCommand::GetCampaign { advertiser_id, campaign_id } => {
                serde_json::to_value(self.get_campaign(&advertiser_id, &campaign_id)?)?
            }
            EngineCommand::ListCampaigns { advertiser_id, page, size } => {
                let page = Page::new(page.unwrap_or(1), size.unwrap_or(default_page_size));
                serde_json::to_value(self.list_campaigns(&advertiser_id, page)?)?
            }
            EngineCommand::UpdateCampaign { advertiser_id, campaign_id, campaign } => {
                serde_json::to_value(self.update_campaign(&advertiser_id, &campaign_id, campaign)?)?
            }
            EngineCommand::DeleteCampaign { advertiser_id, campaign_id } => {
                self.delete_campaign(&advertiser_id, &campaign_id)?;
                json!({ "ok": true })
            }
            EngineCommand::SetCampaignImage { advertiser_id, campaign_id, url } => {
                serde_json::to_value(self.set_campaign_ad_image_url(&advertiser_id, &campaign_id, url)?)?
            }

            EngineCommand::CampaignStats { campaign_id } => serde_json::to_value(self.campaign_stats(&campaign_id)?)?,
            EngineCommand::CampaignStatsDaily { campaign_id } => {
                serde_json::to_value(self.campaign_stats_daily(&campaign_id)?)?
            }
            EngineCommand::AdvertiserStats { advertiser_id } => {
                serde_json::to_value(self.advertiser_stats(&advertiser_id)?)?
            }
            EngineCommand::AdvertiserStatsDaily { advertiser_id } => {
                serde_json::to_value(self.advertiser_stats_daily(&advertiser_id)?)?
            }

            EngineCommand::Quit => Value::Null,
        };
        Ok(reply)
    }
}
