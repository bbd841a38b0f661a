//! Campaign lifecycle guard.
//!
//!   Pending (start_date > day) → Active (start ≤ day ≤ end) → Ended (day > end)
//!
//! Once a campaign leaves Pending its limits and dates are frozen. Costs,
//! copy and targeting stay editable in every phase.

use crate::{
    error::{EngineError, EngineResult},
    types::{Campaign, CampaignData, Day},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignPhase {
    Pending,
    Active,
    Ended,
}

impl CampaignPhase {
    pub fn of(campaign: &Campaign, day: Day) -> Self {
        if campaign.start_date > day {
            Self::Pending
        } else if day <= campaign.end_date {
            Self::Active
        } else {
            Self::Ended
        }
    }

    pub fn is_started(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

pub fn check_create(data: &CampaignData, day: Day) -> EngineResult<()> {
    check_start_date(data.start_date, day)
}

pub fn check_update(stored: &Campaign, data: &CampaignData, day: Day) -> EngineResult<()> {
    if CampaignPhase::of(stored, day).is_started() {
        let frozen_changed = data.impressions_limit != stored.impressions_limit
            || data.clicks_limit != stored.clicks_limit
            || data.start_date != stored.start_date
            || data.end_date != stored.end_date;
        if frozen_changed {
            return Err(EngineError::CantUpdateCampaign {
                campaign_id: stored.campaign_id.clone(),
            });
        }
        Ok(())
    } else {
        check_start_date(data.start_date, day)
    }
}

/// The advertiser on the request must own the campaign. A mismatch reads as
/// "not found" so other advertisers' campaigns stay invisible.
pub fn check_owner(campaign: &Campaign, advertiser_id: &str) -> EngineResult<()> {
    if campaign.advertiser_id != advertiser_id {
        return Err(EngineError::CampaignNotFound {
            campaign_id: campaign.campaign_id.clone(),
        });
    }
    Ok(())
}

fn check_start_date(start_date: Day, day: Day) -> EngineResult<()> {
    if start_date < day {
        return Err(EngineError::InvalidStartDate {
            start_date,
            current_day: day,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Targeting;

    fn data(start: Day, end: Day) -> CampaignData {
        CampaignData {
            impressions_limit:   100,
            clicks_limit:        10,
            cost_per_impression: 1.0,
            cost_per_click:      2.0,
            ad_title:            "t".into(),
            ad_text:             "x".into(),
            start_date:          start,
            end_date:            end,
            targeting:           Targeting::default(),
        }
    }

    fn stored(start: Day, end: Day) -> Campaign {
        Campaign::from_data("camp".into(), "adv".into(), data(start, end))
    }

    #[test]
    fn phases_follow_the_window() {
        let c = stored(5, 10);
        assert_eq!(CampaignPhase::of(&c, 4), CampaignPhase::Pending);
        assert_eq!(CampaignPhase::of(&c, 5), CampaignPhase::Active);
        assert_eq!(CampaignPhase::of(&c, 10), CampaignPhase::Active);
        assert_eq!(CampaignPhase::of(&c, 11), CampaignPhase::Ended);
    }

    #[test]
    fn create_rejects_past_start_only() {
        assert!(matches!(
            check_create(&data(2, 5), 3),
            Err(EngineError::InvalidStartDate { start_date: 2, current_day: 3 })
        ));
        assert!(check_create(&data(3, 5), 3).is_ok());
    }

    #[test]
    fn ended_campaign_is_frozen_too() {
        let c = stored(1, 2);
        let mut d = c.data();
        d.end_date = 20;
        assert!(matches!(check_update(&c, &d, 5), Err(EngineError::CantUpdateCampaign { .. })));

        let mut d = c.data();
        d.ad_title = "new".into();
        d.targeting.age_from = Some(18);
        assert!(check_update(&c, &d, 5).is_ok());
    }

    #[test]
    fn pending_update_may_move_dates_but_not_into_the_past() {
        let c = stored(10, 20);
        let mut d = c.data();
        d.start_date = 6;
        d.impressions_limit = 5;
        assert!(check_update(&c, &d, 5).is_ok());
        d.start_date = 4;
        assert!(matches!(check_update(&c, &d, 5), Err(EngineError::InvalidStartDate { .. })));
    }

    #[test]
    fn foreign_owner_reads_as_not_found() {
        let c = stored(1, 2);
        assert!(check_owner(&c, "adv").is_ok());
        assert!(matches!(check_owner(&c, "other"), Err(EngineError::CampaignNotFound { .. })));
    }
}
