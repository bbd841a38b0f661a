//! Ad matching & accounting engine.
//!
//! Serves the best campaign to each client, records impressions and clicks
//! exactly once per (client, campaign) pair, guards campaign lifecycle
//! changes and reduces the event ledger into spend statistics.

pub mod clock;
pub mod command;
pub mod config;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod ranking;
pub mod stats;
pub mod store;
pub mod types;
