//! Scoring & ranking. Picks one campaign out of the eligible set.
//!
//! Pipeline: per-candidate score → candidate-set normalization → rank →
//! top-1. Everything here is pure; the engine supplies ML scores and
//! impression counts read from the store.
//!
//! Ties on rank go to the lowest campaign id.

use crate::{eligibility::LedgerView, types::Campaign};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const CLICK_VALUE_WEIGHT: f64 = 0.5;
pub const SCORE_WEIGHT: f64 = 0.25;
pub const LIMITS_WEIGHT: f64 = 0.1;

const PROFIT_FLOOR: f64 = 0.1;
const LIMITS_DIFF_FLOOR: i64 = 1;
const SCORE_FLOOR: i64 = 1;

/// Per-candidate inputs to the rank.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub campaign:    &'a Campaign,
    pub score:       i64,
    pub profit:      f64,
    pub limits_diff: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<'a> {
    pub candidate: Candidate<'a>,
    pub rank:      f64,
}

/// `max` over all ML scores in the system, with 0 (or no rows) floored to 1.
pub fn global_score_base(max_score: Option<i64>) -> i64 {
    match max_score {
        Some(m) if m != 0 => m,
        _ => SCORE_FLOOR,
    }
}

/// Expected revenue of showing the campaign: the impression price plus the
/// click price weighted by the client's normalized affinity.
pub fn expected_profit(campaign: &Campaign, score: i64, score_base: i64) -> f64 {
    campaign.cost_per_impression
        + (score as f64 / score_base as f64) * CLICK_VALUE_WEIGHT * campaign.cost_per_click
}

pub fn score_candidates<'a>(
    eligible: &[&'a Campaign],
    scores: &HashMap<String, i64>,
    score_base: i64,
    ledger: &LedgerView,
) -> Vec<Candidate<'a>> {
    eligible
        .iter()
        .map(|&campaign| {
            let score = scores.get(&campaign.advertiser_id).copied().unwrap_or(0);
            Candidate {
                campaign,
                score,
                profit: expected_profit(campaign, score, score_base),
                limits_diff: (campaign.impressions_limit
                    - ledger.impressions_of(&campaign.campaign_id))
                .abs(),
            }
        })
        .collect()
}

/// Normalize against the candidate set and compute each candidate's rank.
pub fn rank_candidates<'a>(candidates: Vec<Candidate<'a>>) -> Vec<Ranked<'a>> {
    let max_profit = candidates.iter().map(|c| c.profit).fold(None, |acc: Option<f64>, p| {
        Some(acc.map_or(p, |a| a.max(p)))
    });
    let max_profit = match max_profit {
        Some(m) if m != 0.0 => m,
        _ => PROFIT_FLOOR,
    };
    let max_limits_diff = match candidates.iter().map(|c| c.limits_diff).max() {
        Some(m) if m != 0 => m,
        _ => LIMITS_DIFF_FLOOR,
    };
    let max_score = match candidates.iter().map(|c| c.score).max() {
        Some(m) if m != 0 => m,
        _ => SCORE_FLOOR,
    };

    candidates
        .into_iter()
        .map(|c| {
            let rank = c.profit / max_profit
                + SCORE_WEIGHT * (c.score as f64 / max_score as f64)
                + LIMITS_WEIGHT * (c.limits_diff as f64 / max_limits_diff as f64);
            Ranked { candidate: c, rank }
        })
        .collect()
}

/// Highest rank wins; equal ranks go to the lowest campaign id.
pub fn select_top<'a>(ranked: Vec<Ranked<'a>>) -> Option<Ranked<'a>> {
    ranked.into_iter().min_by(|a, b| {
        b.rank
            .partial_cmp(&a.rank)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                a.candidate
                    .campaign
                    .campaign_id
                    .cmp(&b.candidate.campaign.campaign_id)
            })
    })
}

/// Full pipeline over an already-filtered candidate list.
pub fn choose<'a>(
    eligible: &[&'a Campaign],
    scores: &HashMap<String, i64>,
    score_base: i64,
    ledger: &LedgerView,
) -> Option<Ranked<'a>> {
    select_top(rank_candidates(score_candidates(eligible, scores, score_base, ledger)))
}
