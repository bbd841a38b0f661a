//! The ad engine: the entry point every transport calls into.
//!
//! REQUEST FLOW:
//!   get-ad:  clock → client → eligibility → ranking → impression write
//!   click:   clock → campaign → impression check → click write
//!   create / update: clock → lifecycle guard → store
//!   stats:   ledger aggregates → stats reducer
//!
//! RULES:
//!   - The day is read once, at the start of each request.
//!   - No locks are held between the eligibility read and the ledger write;
//!     the ledger primary keys decide races.
//!   - Domain errors are returned as-is, never retried here.

use crate::{
    clock::{DayClock, SimClock, StoreClock},
    config::EngineConfig,
    eligibility::{self, LedgerView},
    error::{EngineError, EngineResult},
    lifecycle,
    ranking,
    stats::{self, DailyStats, LedgerKind, Stats},
    store::{AdStore, InsertOutcome},
    types::{
        Ad, Advertiser, Campaign, CampaignData, Client, Day, LedgerEntry, MlScore, Page,
    },
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub struct AdEngine {
    pub store: AdStore,
    clock:     Arc<dyn DayClock>,
}

impl AdEngine {
    pub fn new(store: AdStore, clock: Arc<dyn DayClock>) -> Self {
        Self { store, clock }
    }

    /// Migrated in-memory store with an in-process clock at day 0.
    pub fn build_test() -> EngineResult<Self> {
        let store = AdStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(store, Arc::new(SimClock::new(0))))
    }

    /// Open and migrate the configured database. File databases get a
    /// persisted clock shared with every other engine on the same file.
    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let store = AdStore::open_with_timeout(&config.database, config.busy_timeout_ms)?;
        store.migrate()?;

        let clock: Arc<dyn DayClock> = if config.database == ":memory:" {
            Arc::new(SimClock::new(config.initial_day.unwrap_or(0)))
        } else {
            Arc::new(StoreClock::new(store.reopen()?))
        };
        if let Some(day) = config.initial_day {
            clock.set_day(day)?;
        }

        log::info!(
            "engine ready: db={} day={}",
            config.database,
            clock.current_day()?
        );
        Ok(Self::new(store, clock))
    }

    /// A second engine on its own connection, sharing this engine's clock.
    /// Used to serve requests from several threads at once.
    pub fn reopen(&self) -> EngineResult<Self> {
        Ok(Self::new(self.store.reopen()?, Arc::clone(&self.clock)))
    }

    // ── Clock ──────────────────────────────────────────────────

    pub fn current_day(&self) -> EngineResult<Day> {
        self.clock.current_day()
    }

    /// Jump to `target`, or one day forward when none is given.
    pub fn advance_day(&self, target: Option<Day>) -> EngineResult<Day> {
        let day = self.clock.advance(target)?;
        log::info!("day={day} clock advanced");
        Ok(day)
    }

    // ── Clients, advertisers, ML scores ───────────────────────────

    /// Insert or overwrite clients. Duplicate ids in one batch collapse to
    /// the last occurrence.
    pub fn upsert_clients(&self, clients: Vec<Client>) -> EngineResult<Vec<Client>> {
        let unique = dedupe_last(clients, |c| c.client_id.clone());
        self.store.upsert_clients(&unique)?;
        Ok(unique)
    }

    pub fn get_client(&self, client_id: &str) -> EngineResult<Client> {
        self.store
            .get_client(client_id)?
            .ok_or_else(|| EngineError::ClientNotFound { client_id: client_id.to_string() })
    }

    pub fn upsert_advertisers(&self, advertisers: Vec<Advertiser>) -> EngineResult<Vec<Advertiser>> {
        let unique = dedupe_last(advertisers, |a| a.advertiser_id.clone());
        self.store.upsert_advertisers(&unique)?;
        Ok(unique)
    }

    pub fn get_advertiser(&self, advertiser_id: &str) -> EngineResult<Advertiser> {
        self.store
            .get_advertiser(advertiser_id)?
            .ok_or_else(|| advertiser_not_found(advertiser_id))
    }

    pub fn upsert_ml_score(&self, score: &MlScore) -> EngineResult<()> {
        if !self.store.client_exists(&score.client_id)? {
            return Err(EngineError::ClientNotFound { client_id: score.client_id.clone() });
        }
        self.ensure_advertiser(&score.advertiser_id)?;
        self.store.upsert_ml_score(score)
    }

    // ── Ads ────────────────────────────────────────────────────

    /// Pick the best campaign for the client and record the impression.
    pub fn select_ad_for_client(&self, client_id: &str) -> EngineResult<Ad> {
        let day = self.clock.current_day()?;
        let client = self.get_client(client_id)?;

        let campaigns = self.store.campaigns_running_on(day)?;
        let ledger = LedgerView {
            impressed:         self.store.impressed_campaigns(client_id)?,
            impression_counts: self.store.impression_counts()?,
        };
        let eligible = eligibility::eligible_campaigns(&campaigns, &client, day, &ledger);

        let scores = self.store.ml_scores_for_client(client_id)?;
        let score_base = ranking::global_score_base(self.store.max_ml_score()?);
        let winner = ranking::choose(&eligible, &scores, score_base, &ledger)
            .ok_or_else(|| EngineError::NoAdsForClient { client_id: client_id.to_string() })?;
        let campaign = winner.candidate.campaign;

        self.write_impression(&LedgerEntry {
            client_id:   client_id.to_string(),
            campaign_id: campaign.campaign_id.clone(),
            day,
            profit:      campaign.cost_per_impression,
        })?;

        log::debug!(
            "day={day} ads: client {client_id} shown {} (rank {:.4}, {} eligible)",
            campaign.campaign_id,
            winner.rank,
            eligible.len()
        );
        Ok(Ad::from(campaign))
    }

    /// Record a click. Clicking the same ad twice is a successful no-op.
    pub fn record_click(&self, client_id: &str, campaign_id: &str) -> EngineResult<()> {
        let day = self.clock.current_day()?;
        let campaign = self.find_campaign(campaign_id)?;

        if !self.store.impression_exists(client_id, campaign_id)? {
            return Err(not_impressed(client_id, campaign_id));
        }

        let entry = LedgerEntry {
            client_id:   client_id.to_string(),
            campaign_id: campaign_id.to_string(),
            day,
            profit:      campaign.cost_per_click,
        };
        match self.write_click(&entry) {
            Ok(()) => {
                log::debug!("day={day} ads: client {client_id} clicked {campaign_id}");
                Ok(())
            }
            Err(EngineError::AlreadyClicked { .. }) => {
                log::debug!("day={day} ads: repeated click by {client_id} on {campaign_id} ignored");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn write_impression(&self, entry: &LedgerEntry) -> EngineResult<()> {
        match self.store.insert_impression(entry)? {
            InsertOutcome::Inserted => Ok(()),
            InsertOutcome::Duplicate => {
                log::warn!(
                    "day={} ads: concurrent impression for {}/{} rejected",
                    entry.day,
                    entry.client_id,
                    entry.campaign_id
                );
                Err(EngineError::AlreadyImpressed {
                    client_id:   entry.client_id.clone(),
                    campaign_id: entry.campaign_id.clone(),
                })
            }
            InsertOutcome::MissingReference => {
                if self.store.client_exists(&entry.client_id)? {
                    Err(campaign_not_found(&entry.campaign_id))
                } else {
                    Err(EngineError::ClientNotFound { client_id: entry.client_id.clone() })
                }
            }
        }
    }

    fn write_click(&self, entry: &LedgerEntry) -> EngineResult<()> {
        match self.store.insert_click(entry)? {
            InsertOutcome::Inserted => Ok(()),
            InsertOutcome::Duplicate => Err(EngineError::AlreadyClicked {
                client_id:   entry.client_id.clone(),
                campaign_id: entry.campaign_id.clone(),
            }),
            // The parent impression vanished between the check and the write.
            InsertOutcome::MissingReference => Err(not_impressed(&entry.client_id, &entry.campaign_id)),
        }
    }

    // ── Campaigns ──────────────────────────────────────────────

    pub fn create_campaign(&self, advertiser_id: &str, data: CampaignData) -> EngineResult<Campaign> {
        let day = self.clock.current_day()?;
        lifecycle::check_create(&data, day)?;
        self.ensure_advertiser(advertiser_id)?;

        let campaign = Campaign::from_data(
            Uuid::new_v4().to_string(),
            advertiser_id.to_string(),
            data,
        );
        self.store.insert_campaign(&campaign)?;

        log::info!(
            "day={day} campaigns: {} created for {advertiser_id} (days {}..={})",
            campaign.campaign_id,
            campaign.start_date,
            campaign.end_date
        );
        Ok(campaign)
    }

    pub fn get_campaign(&self, advertiser_id: &str, campaign_id: &str) -> EngineResult<Campaign> {
        self.ensure_advertiser(advertiser_id)?;
        self.owned_campaign(advertiser_id, campaign_id)
    }

    pub fn list_campaigns(&self, advertiser_id: &str, page: Page) -> EngineResult<Vec<Campaign>> {
        self.ensure_advertiser(advertiser_id)?;
        self.store.campaigns_for_advertiser(advertiser_id, page)
    }

    pub fn update_campaign(
        &self,
        advertiser_id: &str,
        campaign_id: &str,
        data: CampaignData,
    ) -> EngineResult<Campaign> {
        let day = self.clock.current_day()?;
        self.ensure_advertiser(advertiser_id)?;
        let stored = self.owned_campaign(advertiser_id, campaign_id)?;

        lifecycle::check_update(&stored, &data, day)?;

        if !self.store.update_campaign(campaign_id, &data)? {
            return Err(campaign_not_found(campaign_id));
        }
        log::info!(
            "day={day} campaigns: {campaign_id} updated ({:?})",
            lifecycle::CampaignPhase::of(&stored, day)
        );
        self.find_campaign(campaign_id)
    }

    /// Delete in any phase. The campaign's impressions and clicks go with it.
    pub fn delete_campaign(&self, advertiser_id: &str, campaign_id: &str) -> EngineResult<()> {
        self.ensure_advertiser(advertiser_id)?;
        self.owned_campaign(advertiser_id, campaign_id)?;

        if !self.store.delete_campaign(campaign_id)? {
            return Err(campaign_not_found(campaign_id));
        }
        log::info!("campaigns: {campaign_id} deleted by {advertiser_id}");
        Ok(())
    }

    /// Hook for the image component: set or clear the campaign's image URL.
    pub fn set_campaign_ad_image_url(
        &self,
        advertiser_id: &str,
        campaign_id: &str,
        url: Option<String>,
    ) -> EngineResult<Campaign> {
        self.ensure_advertiser(advertiser_id)?;
        self.owned_campaign(advertiser_id, campaign_id)?;

        if !self.store.set_campaign_ad_image_url(campaign_id, url.as_deref())? {
            return Err(campaign_not_found(campaign_id));
        }
        self.find_campaign(campaign_id)
    }

    fn find_campaign(&self, campaign_id: &str) -> EngineResult<Campaign> {
        self.store
            .get_campaign(campaign_id)?
            .ok_or_else(|| campaign_not_found(campaign_id))
    }

    fn owned_campaign(&self, advertiser_id: &str, campaign_id: &str) -> EngineResult<Campaign> {
        let campaign = self.find_campaign(campaign_id)?;
        lifecycle::check_owner(&campaign, advertiser_id)?;
        Ok(campaign)
    }

    fn ensure_advertiser(&self, advertiser_id: &str) -> EngineResult<()> {
        if !self.store.advertiser_exists(advertiser_id)? {
            return Err(advertiser_not_found(advertiser_id));
        }
        Ok(())
    }

    // ── Stats ──────────────────────────────────────────────────

    pub fn campaign_stats(&self, campaign_id: &str) -> EngineResult<Stats> {
        Ok(stats::totals(&self.campaign_stats_daily(campaign_id)?))
    }

    pub fn campaign_stats_daily(&self, campaign_id: &str) -> EngineResult<Vec<DailyStats>> {
        self.find_campaign(campaign_id)?;
        let impressions = self.store.ledger_days_for_campaign(LedgerKind::Impression, campaign_id)?;
        let clicks = self.store.ledger_days_for_campaign(LedgerKind::Click, campaign_id)?;
        Ok(stats::daily_series(&impressions, &clicks))
    }

    pub fn advertiser_stats(&self, advertiser_id: &str) -> EngineResult<Stats> {
        Ok(stats::totals(&self.advertiser_stats_daily(advertiser_id)?))
    }

    pub fn advertiser_stats_daily(&self, advertiser_id: &str) -> EngineResult<Vec<DailyStats>> {
        self.ensure_advertiser(advertiser_id)?;
        let impressions = self.store.ledger_days_for_advertiser(LedgerKind::Impression, advertiser_id)?;
        let clicks = self.store.ledger_days_for_advertiser(LedgerKind::Click, advertiser_id)?;
        Ok(stats::advertiser_daily(&impressions, &clicks))
    }
}

fn dedupe_last<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> String,
{
    let mut order: Vec<String> = Vec::new();
    let mut latest: HashMap<String, T> = HashMap::new();
    for item in items {
        let k = key(&item);
        if latest.insert(k.clone(), item).is_none() {
            order.push(k);
        }
    }
    order
        .into_iter()
        .filter_map(|k| latest.remove(&k))
        .collect()
}

fn campaign_not_found(campaign_id: &str) -> EngineError {
    EngineError::CampaignNotFound { campaign_id: campaign_id.to_string() }
}

fn advertiser_not_found(advertiser_id: &str) -> EngineError {
    EngineError::AdvertiserNotFound { advertiser_id: advertiser_id.to_string() }
}

fn not_impressed(client_id: &str, campaign_id: &str) -> EngineError {
    EngineError::NotImpressed {
        client_id:   client_id.to_string(),
        campaign_id: campaign_id.to_string(),
    }
}
