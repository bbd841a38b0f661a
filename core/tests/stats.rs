use adengine_core::{
    engine::AdEngine,
    error::EngineError,
    types::{Advertiser, CampaignData, Client, Gender, Targeting},
};

fn build() -> AdEngine {
    let engine = AdEngine::build_test().expect("build_test failed");
    let clients: Vec<Client> = (1..=6)
        .map(|i| Client {
            client_id: format!("c{i}"),
            login:     format!("user{i}"),
            age:       20 + i,
            location:  "Tula".into(),
            gender:    if i % 2 == 0 { Gender::Female } else { Gender::Male },
        })
        .collect();
    engine.upsert_clients(clients).unwrap();
    engine
        .upsert_advertisers(vec![
            Advertiser { advertiser_id: "a1".into(), name: "Acme".into() },
            Advertiser { advertiser_id: "a2".into(), name: "Globex".into() },
        ])
        .unwrap();
    engine
}

fn campaign(engine: &AdEngine, advertiser: &str, cpi: f64, cpc: f64) -> String {
    engine
        .create_campaign(
            advertiser,
            CampaignData {
                impressions_limit:   100,
                clicks_limit:        100,
                cost_per_impression: cpi,
                cost_per_click:      cpc,
                ad_title:            "t".into(),
                ad_text:             "x".into(),
                start_date:          0,
                end_date:            30,
                targeting:           Targeting::default(),
            },
        )
        .unwrap()
        .campaign_id
}

fn show(engine: &AdEngine, client: &str, expected: &str) {
    let ad = engine.select_ad_for_client(client).unwrap();
    assert_eq!(ad.campaign_id, expected);
}

#[test]
fn campaign_totals() {
    let engine = build();
    let id = campaign(&engine, "a1", 10.0, 20.0);
    for i in 1..=5 {
        show(&engine, &format!("c{i}"), &id);
    }
    for i in 1..=4 {
        engine.record_click(&format!("c{i}"), &id).unwrap();
    }

    let stats = engine.campaign_stats(&id).unwrap();
    assert_eq!(stats.impressions_count, 5);
    assert_eq!(stats.clicks_count, 4);
    assert_eq!(stats.conversion, 80.0);
    assert_eq!(stats.spent_impressions, 50.0);
    assert_eq!(stats.spent_clicks, 80.0);
    assert_eq!(stats.spent_total, 130.0);
}

#[test]
fn empty_campaign_has_zero_conversion() {
    let engine = build();
    let id = campaign(&engine, "a1", 1.0, 1.0);
    let stats = engine.campaign_stats(&id).unwrap();
    assert_eq!(stats.impressions_count, 0);
    assert_eq!(stats.conversion, 0.0);
    assert!(engine.campaign_stats_daily(&id).unwrap().is_empty());
}

#[test]
fn daily_rows_cover_days_with_either_event() {
    let engine = build();
    let id = campaign(&engine, "a1", 2.0, 3.0);

    engine.advance_day(Some(1)).unwrap();
    show(&engine, "c1", &id);
    show(&engine, "c2", &id);
    engine.record_click("c1", &id).unwrap();

    engine.advance_day(Some(2)).unwrap();
    show(&engine, "c3", &id);
    engine.record_click("c2", &id).unwrap();
    engine.record_click("c3", &id).unwrap();

    let daily = engine.campaign_stats_daily(&id).unwrap();
    let days: Vec<i64> = daily.iter().map(|d| d.day).collect();
    assert_eq!(days, vec![1, 2]);

    assert_eq!(daily[0].stats.impressions_count, 2);
    assert_eq!(daily[0].stats.clicks_count, 1);
    assert_eq!(daily[0].stats.conversion, 50.0);
    assert_eq!(daily[0].stats.spent_total, 2.0 * 2.0 + 3.0);

    assert_eq!(daily[1].stats.impressions_count, 1);
    assert_eq!(daily[1].stats.clicks_count, 2);
    assert_eq!(daily[1].stats.conversion, 200.0);
    assert_eq!(daily[1].stats.spent_total, 2.0 + 2.0 * 3.0);
}

#[test]
fn click_only_day_appears_with_zero_impressions() {
    let engine = build();
    let id = campaign(&engine, "a1", 1.0, 4.0);
    show(&engine, "c1", &id);
    engine.advance_day(Some(3)).unwrap();
    engine.record_click("c1", &id).unwrap();

    let daily = engine.campaign_stats_daily(&id).unwrap();
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[1].day, 3);
    assert_eq!(daily[1].stats.impressions_count, 0);
    assert_eq!(daily[1].stats.clicks_count, 1);
    assert_eq!(daily[1].stats.conversion, 0.0);
    assert_eq!(daily[1].stats.spent_clicks, 4.0);
}

#[test]
fn advertiser_stats_sum_their_campaigns_only() {
    let engine = build();
    let first = campaign(&engine, "a1", 10.0, 1.0);
    let second = campaign(&engine, "a1", 5.0, 1.0);
    let foreign = campaign(&engine, "a2", 1.0, 1.0);

    // Each client sees the three campaigns in price order.
    for client in ["c1", "c2"] {
        show(&engine, client, &first);
        show(&engine, client, &second);
        show(&engine, client, &foreign);
    }
    engine.record_click("c1", &first).unwrap();
    engine.advance_day(Some(1)).unwrap();
    engine.record_click("c2", &second).unwrap();

    let totals = engine.advertiser_stats("a1").unwrap();
    assert_eq!(totals.impressions_count, 4);
    assert_eq!(totals.clicks_count, 2);
    assert_eq!(totals.conversion, 50.0);
    assert_eq!(totals.spent_impressions, 30.0);
    assert_eq!(totals.spent_clicks, 2.0);

    let daily = engine.advertiser_stats_daily("a1").unwrap();
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0].day, 0);
    assert_eq!(daily[0].stats.impressions_count, 4);
    assert_eq!(daily[0].stats.clicks_count, 1);
    assert_eq!(daily[0].stats.conversion, 25.0);
    assert_eq!(daily[1].day, 1);
    assert_eq!(daily[1].stats.impressions_count, 0);
    assert_eq!(daily[1].stats.clicks_count, 1);

    let other = engine.advertiser_stats("a2").unwrap();
    assert_eq!(other.impressions_count, 2);
    assert_eq!(other.clicks_count, 0);
}

#[test]
fn stats_for_unknown_ids_fail() {
    let engine = build();
    assert!(matches!(
        engine.campaign_stats("nope"),
        Err(EngineError::CampaignNotFound { .. })
    ));
    assert!(matches!(
        engine.campaign_stats_daily("nope"),
        Err(EngineError::CampaignNotFound { .. })
    ));
    assert!(matches!(
        engine.advertiser_stats("nope"),
        Err(EngineError::AdvertiserNotFound { .. })
    ));
    assert!(matches!(
        engine.advertiser_stats_daily("nope"),
        Err(EngineError::AdvertiserNotFound { .. })
    ));
}
