//! Stats aggregator. Reduces the impression/click ledger into totals and
//! daily series.
//!
//! Days are merged with full-outer-join semantics: a day present in only one
//! of the two ledgers still produces a row, with the other counters at zero.
//! Conversion is always recomputed from summed counts, never averaged.

use crate::{store::LedgerDayRow, types::Day};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerKind {
    Impression,
    Click,
}

impl LedgerKind {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Impression => "impression",
            Self::Click      => "click",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Stats {
    pub impressions_count: i64,
    pub clicks_count:      i64,
    pub conversion:        f64,
    pub spent_impressions: f64,
    pub spent_clicks:      f64,
    pub spent_total:       f64,
}

impl Stats {
    pub fn new(
        impressions_count: i64,
        clicks_count: i64,
        spent_impressions: f64,
        spent_clicks: f64,
    ) -> Self {
        Self {
            impressions_count,
            clicks_count,
            conversion: conversion(impressions_count, clicks_count),
            spent_impressions,
            spent_clicks,
            spent_total: spent_impressions + spent_clicks,
        }
    }

    /// Sum of two reductions, conversion recomputed from the summed counts.
    pub fn combine(&self, other: &Stats) -> Stats {
        Stats::new(
            self.impressions_count + other.impressions_count,
            self.clicks_count + other.clicks_count,
            self.spent_impressions + other.spent_impressions,
            self.spent_clicks + other.spent_clicks,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyStats {
    pub day: Day,
    #[serde(flatten)]
    pub stats: Stats,
}

/// Clicks per hundred impressions; zero when nothing was shown.
pub fn conversion(impressions_count: i64, clicks_count: i64) -> f64 {
    if impressions_count == 0 {
        0.0
    } else {
        clicks_count as f64 / impressions_count as f64 * 100.0
    }
}

/// Merge per-day impression and click rows into one series ordered by day.
/// Rows for the same day are summed, whichever campaign they belong to.
pub fn daily_series(impressions: &[LedgerDayRow], clicks: &[LedgerDayRow]) -> Vec<DailyStats> {
    let mut days: BTreeMap<Day, Stats> = BTreeMap::new();
    for row in impressions {
        let s = days.entry(row.day).or_default();
        s.impressions_count += row.count;
        s.spent_impressions += row.spent;
    }
    for row in clicks {
        let s = days.entry(row.day).or_default();
        s.clicks_count += row.count;
        s.spent_clicks += row.spent;
    }
    days.into_iter()
        .map(|(day, s)| DailyStats {
            day,
            stats: Stats::new(s.impressions_count, s.clicks_count, s.spent_impressions, s.spent_clicks),
        })
        .collect()
}

/// Per-day sum of several daily series (one per campaign).
pub fn sum_daily<I>(series: I) -> Vec<DailyStats>
where
    I: IntoIterator<Item = Vec<DailyStats>>,
{
    let mut days: BTreeMap<Day, Stats> = BTreeMap::new();
    for row in series.into_iter().flatten() {
        let acc = days.entry(row.day).or_default();
        *acc = acc.combine(&row.stats);
    }
    days.into_iter()
        .map(|(day, stats)| DailyStats { day, stats })
        .collect()
}

/// Collapse a daily series into a single total.
pub fn totals(daily: &[DailyStats]) -> Stats {
    daily
        .iter()
        .fold(Stats::default(), |acc, d| acc.combine(&d.stats))
}

/// Split advertiser-wide rows into one daily series per campaign, then sum
/// them day by day.
pub fn advertiser_daily(impressions: &[LedgerDayRow], clicks: &[LedgerDayRow]) -> Vec<DailyStats> {
    let mut per_campaign: BTreeMap<&str, (Vec<LedgerDayRow>, Vec<LedgerDayRow>)> = BTreeMap::new();
    for row in impressions {
        per_campaign
            .entry(row.campaign_id.as_str())
            .or_default()
            .0
            .push(row.clone());
    }
    for row in clicks {
        per_campaign
            .entry(row.campaign_id.as_str())
            .or_default()
            .1
            .push(row.clone());
    }
    sum_daily(per_campaign.values().map(|(i, c)| daily_series(i, c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(campaign: &str, day: Day, count: i64, spent: f64) -> LedgerDayRow {
        LedgerDayRow { campaign_id: campaign.into(), day, count, spent }
    }

    #[test]
    fn conversion_is_zero_without_impressions() {
        assert_eq!(conversion(0, 0), 0.0);
        assert_eq!(conversion(0, 3), 0.0);
        assert_eq!(conversion(5, 4), 80.0);
    }

    #[test]
    fn days_with_only_one_kind_still_appear() {
        let series = daily_series(&[row("c", 3, 2, 20.0)], &[row("c", 1, 1, 5.0)]);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].day, 1);
        assert_eq!(series[0].stats.impressions_count, 0);
        assert_eq!(series[0].stats.clicks_count, 1);
        assert_eq!(series[0].stats.conversion, 0.0);
        assert_eq!(series[1].day, 3);
        assert_eq!(series[1].stats.clicks_count, 0);
        assert_eq!(series[1].stats.spent_total, 20.0);
    }

    #[test]
    fn advertiser_conversion_recomputed_not_averaged() {
        // Campaign a: 1 impression, 1 click (100%). Campaign b: 3 impressions, 0 clicks (0%).
        // Averaging would give 50%; the summed counts give 25%.
        let impressions = [row("a", 1, 1, 1.0), row("b", 1, 3, 3.0)];
        let clicks = [row("a", 1, 1, 2.0)];
        let daily = advertiser_daily(&impressions, &clicks);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].stats.impressions_count, 4);
        assert_eq!(daily[0].stats.clicks_count, 1);
        assert_eq!(daily[0].stats.conversion, 25.0);
        assert_eq!(daily[0].stats.spent_total, 6.0);
    }

    #[test]
    fn totals_match_daily_sum() {
        let daily = daily_series(
            &[row("c", 1, 2, 20.0), row("c", 2, 1, 10.0)],
            &[row("c", 1, 1, 20.0), row("c", 2, 2, 40.0)],
        );
        let t = totals(&daily);
        assert_eq!(t.impressions_count, 3);
        assert_eq!(t.clicks_count, 3);
        assert_eq!(t.conversion, 100.0);
        assert_eq!(t.spent_total, 90.0);
    }
}
