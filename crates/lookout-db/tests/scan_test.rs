//! Full scan pass against an in-memory database and a scripted platform
//! client: configuration in, match rows and a daily rollup out.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use lookout_db::{Database, SqliteMatchSink};
use lookout_engine::TenantScanSession;
use lookout_engine::testing::{FakeGroupClient, message_at};
use lookout_types::{Lookback, ScanTarget, Tenant, TenantConfig};

fn seeded(tenant_id: Uuid, targets: Vec<ScanTarget>) -> (Arc<Database>, Tenant, TenantConfig) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let tenant = Tenant {
        id: tenant_id,
        name: "Acme".into(),
        slug: "acme".into(),
        active: true,
        created_at: Utc::now(),
    };
    db.create_tenant(&tenant).unwrap();

    let config = TenantConfig {
        tenant_id,
        api_id: Some("12345".into()),
        api_hash: Some("hash".into()),
        phone_number: Some("+15550100".into()),
        session_path: Some("acme.session".into()),
        targets,
        keywords: vec!["giveaway".into()],
        links: vec![],
        lookback: Lookback::SevenDays,
    };
    db.upsert_tenant_config(&config).unwrap();

    (db, tenant, config)
}

#[tokio::test]
async fn test_two_qualifying_messages_one_daily_row() {
    let tenant_id = Uuid::new_v4();
    let group_id = -1004242;
    let (db, tenant, _) = seeded(tenant_id, vec![ScanTarget::Bare { group_id }]);
    // Config roundtrips through the database like in production.
    let config = db.get_tenant_config(tenant_id).unwrap().unwrap();

    let now = Utc::now();
    let client = Arc::new(FakeGroupClient::new().with_group(
        group_id,
        "prize pool",
        vec![
            message_at(11, now - Duration::hours(1), "GIVEAWAY ends tonight"),
            message_at(10, now - Duration::hours(3), "new giveaway just dropped"),
            message_at(9, now - Duration::hours(5), "unrelated chatter"),
        ],
    ));
    let sink = Arc::new(SqliteMatchSink::new(db.clone()));

    let session = TenantScanSession::new(tenant, config, client, sink).unwrap();
    let summary = session.run().await.unwrap();

    assert_eq!(summary.targets_scanned, 1);
    assert_eq!(summary.messages_scanned, 3);
    assert_eq!(summary.matches_found, 2);

    let matches = db.matches_for_tenant(tenant_id, None, None).unwrap();
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| m.found_keywords == vec!["giveaway"]));
    assert!(matches.iter().all(|m| m.group_name == "prize pool"));

    let stats = db.daily_stats_for_tenant(tenant_id, None, None).unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].total_matches, 2);
    assert_eq!(stats[0].keyword_stats.get("giveaway"), Some(&2));
}

#[tokio::test]
async fn test_abandoned_target_keeps_persisted_matches() {
    let tenant_id = Uuid::new_v4();
    let (db, tenant, _) = seeded(
        tenant_id,
        vec![
            ScanTarget::Bare { group_id: -100111 },
            ScanTarget::Bare { group_id: -100222 },
        ],
    );
    let config = db.get_tenant_config(tenant_id).unwrap().unwrap();

    let now = Utc::now();
    let client = Arc::new(
        FakeGroupClient::new()
            .with_group(
                -100111,
                "first",
                vec![message_at(1, now - Duration::hours(2), "giveaway one")],
            )
            .with_failing_group(-100222),
    );
    let sink = Arc::new(SqliteMatchSink::new(db.clone()));

    let session = TenantScanSession::new(tenant, config, client, sink).unwrap();
    let summary = session.run().await.unwrap();

    assert_eq!(summary.targets_scanned, 1);
    assert_eq!(summary.targets_failed, 1);
    // The first target's match survived the second target's failure.
    let matches = db.matches_for_tenant(tenant_id, None, None).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].group_id, -100111);
}
