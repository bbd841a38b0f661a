//! Shared primitive types and domain records used across the engine.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// A simulated day. Advanced externally, never derived from wall-clock time.
pub type Day = i64;

/// A stable, unique identifier for any entity in the engine.
pub type EntityId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male   => "MALE",
            Self::Female => "FEMALE",
        }
    }
}

/// Gender targeting on a campaign. `All` matches every client, the same as
/// leaving targeting unset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetGender {
    Male,
    Female,
    All,
}

impl TargetGender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male   => "MALE",
            Self::Female => "FEMALE",
            Self::All    => "ALL",
        }
    }

    pub fn matches(&self, gender: Gender) -> bool {
        match self {
            Self::All    => true,
            Self::Male   => gender == Gender::Male,
            Self::Female => gender == Gender::Female,
        }
    }
}

impl ToSql for Gender {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Gender {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "MALE"   => Ok(Self::Male),
            "FEMALE" => Ok(Self::Female),
            other    => Err(FromSqlError::Other(format!("unknown gender: {other}").into())),
        }
    }
}

impl ToSql for TargetGender {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TargetGender {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "MALE"   => Ok(Self::Male),
            "FEMALE" => Ok(Self::Female),
            "ALL"    => Ok(Self::All),
            other    => Err(FromSqlError::Other(format!("unknown target gender: {other}").into())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Client {
    pub client_id: EntityId,
    pub login:     String,
    pub age:       i64,
    pub location:  String,
    pub gender:    Gender,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Advertiser {
    pub advertiser_id: EntityId,
    pub name:          String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MlScore {
    pub client_id:     EntityId,
    pub advertiser_id: EntityId,
    pub score:         i64,
}

/// Optional audience predicate. Every absent field means "no constraint".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Targeting {
    #[serde(default)]
    pub gender:   Option<TargetGender>,
    #[serde(default)]
    pub age_from: Option<i64>,
    #[serde(default)]
    pub age_to:   Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
}

/// The mutable body of a campaign, as submitted on create and update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignData {
    pub impressions_limit:   i64,
    pub clicks_limit:        i64,
    pub cost_per_impression: f64,
    pub cost_per_click:      f64,
    pub ad_title:            String,
    pub ad_text:             String,
    pub start_date:          Day,
    pub end_date:            Day,
    #[serde(default)]
    pub targeting:           Targeting,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    pub campaign_id:         EntityId,
    pub advertiser_id:       EntityId,
    pub impressions_limit:   i64,
    pub clicks_limit:        i64,
    pub cost_per_impression: f64,
    pub cost_per_click:      f64,
    pub ad_title:            String,
    pub ad_text:             String,
    pub ad_image_url:        Option<String>,
    pub start_date:          Day,
    pub end_date:            Day,
    pub targeting:           Targeting,
}

impl Campaign {
    pub fn from_data(campaign_id: EntityId, advertiser_id: EntityId, data: CampaignData) -> Self {
        Self {
            campaign_id,
            advertiser_id,
            impressions_limit:   data.impressions_limit,
            clicks_limit:        data.clicks_limit,
            cost_per_impression: data.cost_per_impression,
            cost_per_click:      data.cost_per_click,
            ad_title:            data.ad_title,
            ad_text:             data.ad_text,
            ad_image_url:        None,
            start_date:          data.start_date,
            end_date:            data.end_date,
            targeting:           data.targeting,
        }
    }

    pub fn data(&self) -> CampaignData {
        CampaignData {
            impressions_limit:   self.impressions_limit,
            clicks_limit:        self.clicks_limit,
            cost_per_impression: self.cost_per_impression,
            cost_per_click:      self.cost_per_click,
            ad_title:            self.ad_title.clone(),
            ad_text:             self.ad_text.clone(),
            start_date:          self.start_date,
            end_date:            self.end_date,
            targeting:           self.targeting.clone(),
        }
    }
}

/// The ad served to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ad {
    pub campaign_id:   EntityId,
    pub advertiser_id: EntityId,
    pub ad_title:      String,
    pub ad_text:       String,
    pub ad_image_url:  Option<String>,
}

impl From<&Campaign> for Ad {
    fn from(c: &Campaign) -> Self {
        Self {
            campaign_id:   c.campaign_id.clone(),
            advertiser_id: c.advertiser_id.clone(),
            ad_title:      c.ad_title.clone(),
            ad_text:       c.ad_text.clone(),
            ad_image_url:  c.ad_image_url.clone(),
        }
    }
}

/// A ledger row. Impressions and clicks share the shape; `profit` is the
/// campaign cost snapshotted when the event was recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    pub client_id:   EntityId,
    pub campaign_id: EntityId,
    pub day:         Day,
    pub profit:      f64,
}

/// 1-based page request for campaign listings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub size: u32,
}

impl Page {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page: page.max(1), size: size.max(1) }
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.size as i64
    }
}
