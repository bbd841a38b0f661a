//! Eligibility filter: which campaigns may be shown to a client today.
//!
//! The ledger-derived checks here (already impressed, soft cap) are advisory.
//! The primary key on the impression table is what actually guarantees one
//! impression per pair.

use crate::types::{Campaign, Client, Day};
use std::collections::{HashMap, HashSet};

/// Serving stops once a campaign reaches this many impressions:
/// `ceil(impressions_limit * 1.05)`, computed without floating point.
/// Saturates at `i64::MAX` for limits too large to scale.
pub fn soft_impression_cap(impressions_limit: i64) -> i64 {
    let cap = (i128::from(impressions_limit.max(0)) * 105 + 99) / 100;
    i64::try_from(cap).unwrap_or(i64::MAX)
}

/// Ledger state the filter needs for one client.
#[derive(Debug, Clone, Default)]
pub struct LedgerView {
    /// Campaigns the client has already seen.
    pub impressed:         HashSet<String>,
    /// Total impressions per campaign across all clients.
    pub impression_counts: HashMap<String, i64>,
}

impl LedgerView {
    pub fn impressions_of(&self, campaign_id: &str) -> i64 {
        self.impression_counts.get(campaign_id).copied().unwrap_or(0)
    }
}

pub fn in_window(campaign: &Campaign, day: Day) -> bool {
    campaign.start_date <= day && day <= campaign.end_date
}

/// Targeting only: gender, location and age range.
pub fn matches_targeting(campaign: &Campaign, client: &Client) -> bool {
    let t = &campaign.targeting;

    if let Some(gender) = t.gender {
        if !gender.matches(client.gender) {
            return false;
        }
    }
    if let Some(location) = &t.location {
        if location != &client.location {
            return false;
        }
    }
    if let Some(from) = t.age_from {
        if client.age < from {
            return false;
        }
    }
    if let Some(to) = t.age_to {
        if client.age > to {
            return false;
        }
    }
    true
}

pub fn is_eligible(campaign: &Campaign, client: &Client, day: Day, ledger: &LedgerView) -> bool {
    in_window(campaign, day)
        && matches_targeting(campaign, client)
        && !ledger.impressed.contains(&campaign.campaign_id)
        && ledger.impressions_of(&campaign.campaign_id) < soft_impression_cap(campaign.impressions_limit)
}

pub fn eligible_campaigns<'a>(
    campaigns: &'a [Campaign],
    client: &Client,
    day: Day,
    ledger: &LedgerView,
) -> Vec<&'a Campaign> {
    campaigns
        .iter()
        .filter(|c| is_eligible(c, client, day, ledger))
        .collect()
}
