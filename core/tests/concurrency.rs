//! Racing requests on one database file. Every worker owns its own
//! connection; the ledger keys decide who wins.

use adengine_core::{
    config::EngineConfig,
    engine::AdEngine,
    error::EngineError,
    types::{Advertiser, CampaignData, Client, Gender, LedgerEntry, Targeting},
};
use adengine_core::store::InsertOutcome;
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;

const WORKERS: usize = 8;

struct TempDb {
    path: PathBuf,
}

impl TempDb {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("adengine-{}.db", uuid::Uuid::new_v4()));
        Self { path }
    }

    fn path_str(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut p = self.path.clone().into_os_string();
            p.push(suffix);
            let _ = std::fs::remove_file(p);
        }
    }
}

fn seeded_engine(db: &TempDb) -> (AdEngine, String) {
    let config = EngineConfig {
        database: db.path_str(),
        initial_day: Some(0),
        ..EngineConfig::default()
    };
    let engine = AdEngine::from_config(&config).unwrap();
    engine
        .upsert_clients(vec![Client {
            client_id: "c1".into(),
            login:     "racer".into(),
            age:       22,
            location:  "Tver".into(),
            gender:    Gender::Male,
        }])
        .unwrap();
    engine
        .upsert_advertisers(vec![Advertiser { advertiser_id: "a1".into(), name: "Acme".into() }])
        .unwrap();
    let campaign_id = engine
        .create_campaign(
            "a1",
            CampaignData {
                impressions_limit:   1000,
                clicks_limit:        1000,
                cost_per_impression: 1.0,
                cost_per_click:      1.0,
                ad_title:            "t".into(),
                ad_text:             "x".into(),
                start_date:          0,
                end_date:            10,
                targeting:           Targeting::default(),
            },
        )
        .unwrap()
        .campaign_id;
    (engine, campaign_id)
}

#[test]
fn concurrent_get_ad_records_one_impression() {
    let _ = env_logger::builder().is_test(true).try_init();
    let db = TempDb::new();
    let (engine, campaign_id) = seeded_engine(&db);

    let barrier = Arc::new(Barrier::new(WORKERS));
    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let worker = engine.reopen().unwrap();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                worker.select_ad_for_client("c1")
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let served = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(served, 1, "results: {results:?}");
    for result in &results {
        match result {
            Ok(ad) => assert_eq!(ad.campaign_id, campaign_id),
            Err(EngineError::AlreadyImpressed { .. }) | Err(EngineError::NoAdsForClient { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(engine.store.count_impressions(&campaign_id).unwrap(), 1);
}

#[test]
fn concurrent_clicks_record_one_click() {
    let db = TempDb::new();
    let (engine, campaign_id) = seeded_engine(&db);
    engine.select_ad_for_client("c1").unwrap();

    let barrier = Arc::new(Barrier::new(WORKERS));
    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let worker = engine.reopen().unwrap();
            let barrier = Arc::clone(&barrier);
            let campaign_id = campaign_id.clone();
            thread::spawn(move || {
                barrier.wait();
                worker.record_click("c1", &campaign_id)
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(engine.store.count_clicks(&campaign_id).unwrap(), 1);
}

#[test]
fn second_ledger_insert_is_a_duplicate() {
    let db = TempDb::new();
    let (engine, campaign_id) = seeded_engine(&db);
    let entry = LedgerEntry {
        client_id:   "c1".into(),
        campaign_id: campaign_id.clone(),
        day:         0,
        profit:      1.0,
    };

    let other = engine.reopen().unwrap();
    assert_eq!(engine.store.insert_impression(&entry).unwrap(), InsertOutcome::Inserted);
    assert_eq!(other.store.insert_impression(&entry).unwrap(), InsertOutcome::Duplicate);

    let orphan = LedgerEntry { client_id: "ghost".into(), ..entry };
    assert_eq!(other.store.insert_click(&orphan).unwrap(), InsertOutcome::MissingReference);
}
