use crate::types::{Day, EntityId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    // ── Domain outcomes ──────────────────────────────────────────
    #[error("Client '{client_id}' not found")]
    ClientNotFound { client_id: EntityId },

    #[error("Advertiser '{advertiser_id}' not found")]
    AdvertiserNotFound { advertiser_id: EntityId },

    #[error("Campaign '{campaign_id}' not found")]
    CampaignNotFound { campaign_id: EntityId },

    #[error("No ads available for client '{client_id}'")]
    NoAdsForClient { client_id: EntityId },

    #[error("Client '{client_id}' already saw campaign '{campaign_id}'")]
    AlreadyImpressed { client_id: EntityId, campaign_id: EntityId },

    #[error("Client '{client_id}' already clicked campaign '{campaign_id}'")]
    AlreadyClicked { client_id: EntityId, campaign_id: EntityId },

    #[error("Client '{client_id}' was never shown campaign '{campaign_id}'")]
    NotImpressed { client_id: EntityId, campaign_id: EntityId },

    #[error("Invalid start date: {start_date} is before current day {current_day}")]
    InvalidStartDate { start_date: Day, current_day: Day },

    #[error("Campaign '{campaign_id}' is already running; limits and dates are frozen")]
    CantUpdateCampaign { campaign_id: EntityId },

    // ── Infrastructure ───────────────────────────────────────────
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    /// True for storage, serialization and other failures outside the
    /// domain taxonomy.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Serialization(_) | Self::Other(_))
    }

    /// Whether a caller may retry the same request. The engine itself never
    /// retries.
    pub fn is_retryable(&self) -> bool {
        self.is_infrastructure() || matches!(self, Self::AlreadyImpressed { .. })
    }

    /// Stable snake_case name of the variant, used by the runner's replies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClientNotFound { .. }     => "client_not_found",
            Self::AdvertiserNotFound { .. } => "advertiser_not_found",
            Self::CampaignNotFound { .. }   => "campaign_not_found",
            Self::NoAdsForClient { .. }     => "no_ads_for_client",
            Self::AlreadyImpressed { .. }   => "already_impressed",
            Self::AlreadyClicked { .. }     => "already_clicked",
            Self::NotImpressed { .. }       => "not_impressed",
            Self::InvalidStartDate { .. }   => "invalid_start_date",
            Self::CantUpdateCampaign { .. } => "cant_update_campaign",
            Self::Database(_)               => "database",
            Self::Serialization(_)          => "serialization",
            Self::Other(_)                  => "internal",
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
