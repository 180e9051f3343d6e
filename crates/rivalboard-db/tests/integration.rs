//! Tests for rivalboard-db: offline row-shape checks plus SQLite-backed
//! query tests (each `#[sqlx::test]` gets a fresh migrated database).

use rivalboard_core::analysis::mock_analysis;
use rivalboard_core::competitors::{
    builtin_demo_competitors, CompetitorDraft, CompetitorPatch, CompetitorStatus,
};
use rivalboard_db::{CompetitorRow, NewNewsMention, PoolConfig};
use sqlx::SqlitePool;

fn draft(name: &str) -> CompetitorDraft {
    CompetitorDraft {
        name: name.to_string(),
        website_url: Some(format!("https://{}.example", name.to_lowercase())),
        industry: Some("Analytics".to_string()),
        ..CompetitorDraft::default()
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::path::PathBuf;

    let app_config = rivalboard_core::AppConfig {
        database_url: "sqlite://example.sqlite".to_string(),
        env: rivalboard_core::Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        public_base_url: "http://localhost:3000".to_string(),
        data_dir: PathBuf::from("./.data"),
        seed_path: PathBuf::from("./config/competitors.yaml"),
        content_webhook_url: None,
        webhook_timeout_secs: 30,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: [`CompetitorRow`] converts into the core type
/// with lenient status handling. No database required.
#[test]
fn competitor_row_maps_to_core_type() {
    use chrono::Utc;

    let row = CompetitorRow {
        id: 7,
        name: "Acme Analytics".to_string(),
        website_url: Some("https://acme.example".to_string()),
        twitter_url: None,
        instagram_url: None,
        facebook_url: None,
        reddit_url: None,
        discord_url: None,
        industry: Some("Analytics".to_string()),
        description: None,
        logo_url: None,
        status: "something-unknown".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let competitor = rivalboard_core::competitors::Competitor::from(row);
    assert_eq!(competitor.id, 7);
    assert_eq!(competitor.status, CompetitorStatus::Active);
}

#[sqlx::test(migrations = "../../migrations")]
async fn migrations_create_the_expected_tables(pool: SqlitePool) {
    let info = rivalboard_db::schema_info(&pool).await.expect("schema info");
    assert!(!info.sqlite_version.is_empty());
    for table in [
        "competitors",
        "analysis_runs",
        "analysis_competitors",
        "insights",
        "news_mentions",
    ] {
        assert!(
            info.tables.iter().any(|t| t == table),
            "missing table {table}, got {:?}",
            info.tables
        );
    }
    assert!(info.applied_migrations >= 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn insert_get_list_round_trip(pool: SqlitePool) {
    let acme = rivalboard_db::insert_competitor(&pool, &draft("Acme"))
        .await
        .expect("insert acme");
    let bright = rivalboard_db::insert_competitor(&pool, &draft("Bright"))
        .await
        .expect("insert bright");
    assert!(bright.id > acme.id);
    assert_eq!(acme.status, "active");

    let fetched = rivalboard_db::get_competitor(&pool, acme.id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(fetched.name, "Acme");
    assert_eq!(fetched.website_url.as_deref(), Some("https://acme.example"));

    // newest first
    let all = rivalboard_db::list_competitors(&pool).await.expect("list");
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, bright.id);

    assert_eq!(
        rivalboard_db::count_competitors(&pool).await.expect("count"),
        2
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_unknown_competitor_is_none(pool: SqlitePool) {
    let missing = rivalboard_db::get_competitor(&pool, 12345)
        .await
        .expect("query ok");
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn sparse_update_keeps_and_clears_the_right_fields(pool: SqlitePool) {
    let row = rivalboard_db::insert_competitor(&pool, &draft("Acme"))
        .await
        .expect("insert");

    let patch = CompetitorPatch {
        name: Some("Acme Corp".to_string()),
        industry: Some(None),
        status: Some(CompetitorStatus::Inactive),
        ..CompetitorPatch::default()
    };
    let updated = rivalboard_db::update_competitor(&pool, row.id, &patch)
        .await
        .expect("update")
        .expect("row exists");

    assert_eq!(updated.name, "Acme Corp");
    assert!(updated.industry.is_none(), "explicit clear must stick");
    assert_eq!(
        updated.website_url.as_deref(),
        Some("https://acme.example"),
        "untouched field must survive"
    );
    assert_eq!(updated.status, "inactive");

    let gone = rivalboard_db::update_competitor(&pool, 9999, &patch)
        .await
        .expect("update ok");
    assert!(gone.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn bulk_insert_is_transactional_and_ordered(pool: SqlitePool) {
    let created = rivalboard_db::insert_competitors_bulk(
        &pool,
        &[draft("First"), draft("Second"), draft("Third")],
    )
    .await
    .expect("bulk insert");

    assert_eq!(created.len(), 3);
    assert_eq!(created[0].name, "First");
    assert!(created[0].id < created[1].id && created[1].id < created[2].id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn seed_runs_once_and_only_on_an_empty_table(pool: SqlitePool) {
    let demo = builtin_demo_competitors();
    let first = rivalboard_db::seed_competitors_if_empty(&pool, &demo)
        .await
        .expect("first seed");
    assert_eq!(first, 3);

    let second = rivalboard_db::seed_competitors_if_empty(&pool, &demo)
        .await
        .expect("second seed");
    assert_eq!(second, 0);
    assert_eq!(
        rivalboard_db::count_competitors(&pool).await.expect("count"),
        3
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn completed_run_persists_links_and_insights(pool: SqlitePool) {
    let ids: Vec<i64> = rivalboard_db::insert_competitors_bulk(
        &pool,
        &[draft("Acme"), draft("Bright"), draft("Nimbus")],
    )
    .await
    .expect("competitors")
    .into_iter()
    .map(|r| r.id)
    .collect();

    let run = mock_analysis("Quarterly check", &ids);
    let run_id = rivalboard_db::record_completed_run(&pool, &run)
        .await
        .expect("record run");

    let (row, linked) = rivalboard_db::get_run(&pool, run_id)
        .await
        .expect("get run")
        .expect("run exists");
    assert_eq!(row.name, "Quarterly check");
    assert_eq!(row.status, "completed");
    assert!(row.completed_at.is_some());
    assert_eq!(linked, ids);

    let insights = rivalboard_db::list_insights_for_run(&pool, run_id)
        .await
        .expect("insights");
    assert_eq!(insights.len(), 4);
    assert_eq!(insights[0].insight_type, "Feature gaps");
    assert_eq!(insights[0].priority.as_deref(), Some("High"));

    let runs = rivalboard_db::list_runs(&pool, 10).await.expect("list runs");
    assert_eq!(runs.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn deleting_a_competitor_cascades_its_links(pool: SqlitePool) {
    let ids: Vec<i64> =
        rivalboard_db::insert_competitors_bulk(&pool, &[draft("Acme"), draft("Bright")])
            .await
            .expect("competitors")
            .into_iter()
            .map(|r| r.id)
            .collect();

    let run = mock_analysis("Cascade check", &ids);
    let run_id = rivalboard_db::record_completed_run(&pool, &run)
        .await
        .expect("record run");

    rivalboard_db::insert_news_mention(
        &pool,
        ids[0],
        run_id,
        "Acme raises a round",
        &NewNewsMention {
            source: Some("Demo Wire".to_string()),
            sentiment_score: Some(0.4),
            ..NewNewsMention::default()
        },
    )
    .await
    .expect("mention");

    assert!(rivalboard_db::delete_competitor(&pool, ids[0])
        .await
        .expect("delete"));
    // second delete is a no-op
    assert!(!rivalboard_db::delete_competitor(&pool, ids[0])
        .await
        .expect("delete again"));

    let (_, linked) = rivalboard_db::get_run(&pool, run_id)
        .await
        .expect("get run")
        .expect("run survives");
    assert_eq!(linked, vec![ids[1]], "link rows must cascade away");

    let mentions = rivalboard_db::list_news_mentions_for_competitor(&pool, ids[0], 10)
        .await
        .expect("mentions");
    assert!(mentions.is_empty(), "mentions must cascade away");
}

#[sqlx::test(migrations = "../../migrations")]
async fn health_and_ping_succeed_on_a_live_pool(pool: SqlitePool) {
    rivalboard_db::ping(&pool).await.expect("ping");
    rivalboard_db::health_check(&pool).await.expect("health");
}
