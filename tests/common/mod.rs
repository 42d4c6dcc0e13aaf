use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use cartela::db::event_repo::{self, NewSelection};
use cartela::db::template_repo;
use cartela::identity;
use cartela::models::{CartelaTemplate, Event, MarketSelection, Sport, TemplateType, User};

/// Connect to the test database and run all migrations.
///
/// Returns `None` when `TEST_DATABASE_URL` is unset so DB-backed tests skip
/// on machines without Postgres. Tests never wipe tables; each one seeds its
/// own users, events and templates.
#[allow(dead_code)]
pub async fn setup_test_db() -> Option<PgPool> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// Seed a user (with wallet) and return it with its plain API token.
#[allow(dead_code)]
pub async fn seed_user(pool: &PgPool) -> (User, String) {
    let suffix = Uuid::new_v4().simple().to_string();
    let token = format!("tok_{suffix}");
    let user = identity::create_user(pool, &format!("user_{suffix}"), &token)
        .await
        .expect("Failed to seed user");
    (user, token)
}

#[allow(dead_code)]
pub async fn seed_event(pool: &PgPool) -> Event {
    event_repo::insert_event(
        pool,
        Sport::Soccer,
        "Flamengo",
        "Palmeiras",
        Utc::now() + Duration::hours(2),
    )
    .await
    .expect("Failed to seed event")
}

/// Seed a selection whose fair odd sits a little above the published one.
#[allow(dead_code)]
pub async fn seed_selection(
    pool: &PgPool,
    event_id: Uuid,
    selection_type: &str,
    odd_published: Decimal,
    is_live: bool,
) -> MarketSelection {
    event_repo::insert_selection(
        pool,
        &NewSelection {
            event_id,
            selection_type: selection_type.into(),
            params: json!({ "line": 1.5 }),
            prob_base: Decimal::new(50, 2),
            odd_fair: odd_published + Decimal::new(5, 2),
            odd_published,
            is_live,
        },
    )
    .await
    .expect("Failed to seed selection")
}

#[allow(dead_code)]
pub async fn seed_template(
    pool: &PgPool,
    template_type: TemplateType,
    config: serde_json::Value,
) -> CartelaTemplate {
    template_repo::insert_template(
        pool,
        &format!("Cartela {}", Uuid::new_v4().simple()),
        "test template",
        template_type,
        None,
        &config,
    )
    .await
    .expect("Failed to seed template")
}

/// Fund a user's wallet through the ledger.
#[allow(dead_code)]
pub async fn fund(pool: &PgPool, user_id: Uuid, amount: Decimal) {
    cartela::ledger::deposit(pool, user_id, amount, None)
        .await
        .expect("Failed to fund wallet");
}
