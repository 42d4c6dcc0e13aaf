mod common;

use chrono::Duration;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use cartela::betting::{self, ExposureLimitPolicy, PassThroughPolicy, QuoteOutcome, QuoteRequest};
use cartela::db::{bet_repo, cartela_repo, event_repo, risk_repo, template_repo, user_repo, wallet_repo};
use cartela::errors::AppError;
use cartela::models::{CartelaStatus, MarketSelection, TemplateType};

fn validity() -> Duration {
    Duration::minutes(5)
}

/// Event with two selections priced 1.45 and 1.90 plus a template allowing
/// two to three of them.
struct Fixture {
    event_id: Uuid,
    template_id: Uuid,
    selections: Vec<MarketSelection>,
}

async fn fixture(pool: &PgPool) -> Fixture {
    let event = common::seed_event(pool).await;
    let a = common::seed_selection(pool, event.id, "TOTAL_GOALS_OVER", Decimal::new(145, 2), false).await;
    let b = common::seed_selection(pool, event.id, "NEXT_CORNER", Decimal::new(190, 2), false).await;
    let template = common::seed_template(
        pool,
        TemplateType::PreMatch,
        json!({ "min_items": 2, "max_items": 3 }),
    )
    .await;

    Fixture {
        event_id: event.id,
        template_id: template.id,
        selections: vec![a, b],
    }
}

fn request(fx: &Fixture, selection_ids: Vec<Uuid>, stake: Decimal) -> QuoteRequest {
    QuoteRequest {
        event_id: fx.event_id,
        cartela_template_id: fx.template_id,
        selection_ids,
        stake,
    }
}

fn both(fx: &Fixture) -> Vec<Uuid> {
    fx.selections.iter().map(|s| s.id).collect()
}

async fn quote_example(pool: &PgPool, user_id: Uuid, fx: &Fixture) -> QuoteOutcome {
    betting::quote(
        pool,
        &PassThroughPolicy,
        validity(),
        user_id,
        &request(fx, both(fx), Decimal::new(1000, 2)),
    )
    .await
    .expect("quote should succeed")
}

// ---------------------------------------------------------------------------
// Quoting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_quote_prices_example_and_persists_everything() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    let fx = fixture(&pool).await;

    let outcome = quote_example(&pool, user.id, &fx).await;

    assert_eq!(outcome.odd_final, Decimal::new(2755, 3));
    assert_eq!(outcome.potential_return, Decimal::new(2755, 2));
    assert!(!outcome.risk_flags.limited);
    assert_eq!(outcome.instance.status(), Some(CartelaStatus::ApostaPendente));
    assert_eq!(
        outcome.instance.valid_until - outcome.instance.created_at,
        validity()
    );
    assert_eq!(outcome.instance.snapshot_data["stake"], "10.00");

    let items = cartela_repo::get_items(&pool, outcome.instance.id).await.unwrap();
    assert_eq!(items.len(), 2);
    let mut used: Vec<Decimal> = items.iter().map(|i| i.odd_used).collect();
    used.sort();
    assert_eq!(used, vec![Decimal::new(145, 2), Decimal::new(190, 2)]);

    let bucket = risk_repo::get_bucket(&pool, fx.event_id, fx.template_id, None)
        .await
        .unwrap()
        .expect("exposure bucket");
    assert_eq!(bucket.volume_total, Decimal::new(1000, 2));
    assert_eq!(bucket.payout_maximo, Decimal::new(2755, 2));
    assert_eq!(bucket.margin_avg, 0.0);
}

#[tokio::test]
async fn test_exposure_accumulates_across_quotes() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    let fx = fixture(&pool).await;

    quote_example(&pool, user.id, &fx).await;
    quote_example(&pool, user.id, &fx).await;

    let bucket = risk_repo::get_bucket(&pool, fx.event_id, fx.template_id, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bucket.volume_total, Decimal::from(20));
    assert_eq!(bucket.payout_maximo, Decimal::new(5510, 2));
}

#[tokio::test]
async fn test_quote_below_min_items_creates_nothing() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    let fx = fixture(&pool).await;

    let result = betting::quote(
        &pool,
        &PassThroughPolicy,
        validity(),
        user.id,
        &request(&fx, vec![fx.selections[0].id], Decimal::from(10)),
    )
    .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(cartela_repo::count_instances_for_user(&pool, user.id).await.unwrap(), 0);
    assert!(risk_repo::get_bucket(&pool, fx.event_id, fx.template_id, None)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_float_item_bound_enforced() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    let mut fx = fixture(&pool).await;
    fx.template_id = common::seed_template(&pool, TemplateType::PreMatch, json!({ "min_items": 2.0 }))
        .await
        .id;

    let result = betting::quote(
        &pool,
        &PassThroughPolicy,
        validity(),
        user.id,
        &request(&fx, vec![fx.selections[0].id], Decimal::from(10)),
    )
    .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(cartela_repo::count_instances_for_user(&pool, user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_malformed_item_bound_rejects_quote() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    let mut fx = fixture(&pool).await;
    fx.template_id = common::seed_template(&pool, TemplateType::PreMatch, json!({ "max_items": "3" }))
        .await
        .id;

    let result = betting::quote(
        &pool,
        &PassThroughPolicy,
        validity(),
        user.id,
        &request(&fx, both(&fx), Decimal::from(10)),
    )
    .await;

    match result {
        Err(AppError::Validation(msg)) => assert!(msg.contains("max_items"), "{msg}"),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(cartela_repo::count_instances_for_user(&pool, user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_oversized_stake_rejected_before_writing() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    let fx = fixture(&pool).await;

    for stake in [Decimal::MAX, Decimal::new(500_000_000_000_000_000, 2)] {
        let result = betting::quote(
            &pool,
            &PassThroughPolicy,
            validity(),
            user.id,
            &request(&fx, both(&fx), stake),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))), "stake {stake}");
    }
    assert_eq!(cartela_repo::count_instances_for_user(&pool, user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_quote_above_max_items_rejected() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    let mut fx = fixture(&pool).await;
    for kind in ["TEAM_TO_SCORE", "BOTH_TEAMS_SCORE"] {
        fx.selections
            .push(common::seed_selection(&pool, fx.event_id, kind, Decimal::new(120, 2), false).await);
    }

    let result = betting::quote(
        &pool,
        &PassThroughPolicy,
        validity(),
        user.id,
        &request(&fx, both(&fx), Decimal::from(10)),
    )
    .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(cartela_repo::count_instances_for_user(&pool, user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_selection_ids_rejected() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    let fx = fixture(&pool).await;
    let a = fx.selections[0].id;

    let result = betting::quote(
        &pool,
        &PassThroughPolicy,
        validity(),
        user.id,
        &request(&fx, vec![a, a], Decimal::from(10)),
    )
    .await;

    match result {
        Err(AppError::Validation(msg)) => assert!(msg.contains("more than once"), "{msg}"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_selection_from_other_event_rejected() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    let fx = fixture(&pool).await;
    let other = common::seed_event(&pool).await;
    let foreign =
        common::seed_selection(&pool, other.id, "NEXT_CORNER", Decimal::new(200, 2), false).await;

    let result = betting::quote(
        &pool,
        &PassThroughPolicy,
        validity(),
        user.id,
        &request(&fx, vec![fx.selections[0].id, foreign.id], Decimal::from(10)),
    )
    .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_unknown_event_and_inactive_template_not_found() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    let fx = fixture(&pool).await;

    let mut req = request(&fx, both(&fx), Decimal::from(10));
    req.event_id = Uuid::new_v4();
    let result = betting::quote(&pool, &PassThroughPolicy, validity(), user.id, &req).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    template_repo::deactivate_template(&pool, fx.template_id).await.unwrap();
    let result = betting::quote(
        &pool,
        &PassThroughPolicy,
        validity(),
        user.id,
        &request(&fx, both(&fx), Decimal::from(10)),
    )
    .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_disallowed_selection_type_rejected() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    let fx = fixture(&pool).await;
    template_repo::insert_template_item(&pool, fx.template_id, "NEXT_CORNER", &json!({}))
        .await
        .unwrap();

    let result = betting::quote(
        &pool,
        &PassThroughPolicy,
        validity(),
        user.id,
        &request(&fx, both(&fx), Decimal::from(10)),
    )
    .await;

    match result {
        Err(AppError::Validation(msg)) => assert!(msg.contains("TOTAL_GOALS_OVER"), "{msg}"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_exposure_policy_reprices_quote() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    let fx = fixture(&pool).await;
    let policy = ExposureLimitPolicy {
        max_stake: None,
        max_payout_per_bucket: Some(Decimal::from(20)),
    };

    let outcome = betting::quote(
        &pool,
        &policy,
        validity(),
        user.id,
        &request(&fx, both(&fx), Decimal::from(10)),
    )
    .await
    .unwrap();

    assert_eq!(outcome.odd_final, Decimal::from(2));
    assert_eq!(outcome.potential_return, Decimal::from(20));
    assert!(outcome.risk_flags.limited);
    assert!(outcome.risk_flags.adjusted_margin > 0.0);
    assert_eq!(outcome.instance.snapshot_data["odd_final_raw"], "2.755");

    // The bucket is now full; the next quote has no headroom left.
    let result = betting::quote(
        &pool,
        &policy,
        validity(),
        user.id,
        &request(&fx, both(&fx), Decimal::from(10)),
    )
    .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

// ---------------------------------------------------------------------------
// Confirmation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_confirm_debits_funds_and_creates_bet() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    common::fund(&pool, user.id, Decimal::from(100)).await;
    let fx = fixture(&pool).await;
    let outcome = quote_example(&pool, user.id, &fx).await;

    let bet = betting::confirm(&pool, user.id, outcome.instance.id).await.unwrap();

    assert_eq!(bet.cartela_instance_id, outcome.instance.id);
    assert_eq!(bet.stake, Decimal::new(1000, 2));
    assert_eq!(bet.odd_final, Decimal::new(2755, 3));
    assert_eq!(bet.potential_return, Decimal::new(2755, 2));
    assert_eq!(bet.is_won, None);

    let instance = cartela_repo::get_instance_for_user(&pool, outcome.instance.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(instance.status(), Some(CartelaStatus::ApostaConfirmada));
    assert!(instance.locked_at.is_some());

    let wallet = wallet_repo::get_wallet_by_user(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(wallet.funds, Decimal::from(90));
    let entries = wallet_repo::list_entries(&pool, wallet.id, 10).await.unwrap();
    assert_eq!(entries[0].entry_type, "WAGER");
    assert_eq!(entries[0].amount, Decimal::from(-10));
    assert_eq!(entries[0].funds_before, Decimal::from(100));
}

#[tokio::test]
async fn test_double_confirm_fails_on_status() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    common::fund(&pool, user.id, Decimal::from(100)).await;
    let fx = fixture(&pool).await;
    let outcome = quote_example(&pool, user.id, &fx).await;

    betting::confirm(&pool, user.id, outcome.instance.id).await.unwrap();
    let second = betting::confirm(&pool, user.id, outcome.instance.id).await;

    match second {
        Err(AppError::Validation(msg)) => assert!(msg.contains("APOSTA_CONFIRMADA"), "{msg}"),
        other => panic!("expected status error, got {other:?}"),
    }
    let wallet = wallet_repo::get_wallet_by_user(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(wallet.funds, Decimal::from(90));
}

#[tokio::test]
async fn test_concurrent_confirms_only_one_wins() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    common::fund(&pool, user.id, Decimal::from(100)).await;
    let fx = fixture(&pool).await;
    let outcome = quote_example(&pool, user.id, &fx).await;

    let (a, b) = tokio::join!(
        betting::confirm(&pool, user.id, outcome.instance.id),
        betting::confirm(&pool, user.id, outcome.instance.id),
    );

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert!(bet_repo::get_bet_by_instance(&pool, outcome.instance.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_confirm_after_window_fails() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    common::fund(&pool, user.id, Decimal::from(100)).await;
    let fx = fixture(&pool).await;

    let outcome = betting::quote(
        &pool,
        &PassThroughPolicy,
        Duration::seconds(-1),
        user.id,
        &request(&fx, both(&fx), Decimal::from(10)),
    )
    .await
    .unwrap();

    match betting::confirm(&pool, user.id, outcome.instance.id).await {
        Err(AppError::Validation(msg)) => assert!(msg.contains("expired"), "{msg}"),
        other => panic!("expected expiry error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_confirm_without_funds_leaves_instance_pending() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    common::fund(&pool, user.id, Decimal::from(5)).await;
    let fx = fixture(&pool).await;
    let outcome = quote_example(&pool, user.id, &fx).await;

    let result = betting::confirm(&pool, user.id, outcome.instance.id).await;
    match result {
        Err(AppError::Validation(msg)) => assert!(msg.contains("insufficient funds"), "{msg}"),
        other => panic!("expected insufficient funds, got {other:?}"),
    }

    let instance = cartela_repo::get_instance_for_user(&pool, outcome.instance.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(instance.status(), Some(CartelaStatus::ApostaPendente));
    assert!(instance.locked_at.is_none());
    assert!(bet_repo::get_bet_by_instance(&pool, outcome.instance.id)
        .await
        .unwrap()
        .is_none());
    let wallet = wallet_repo::get_wallet_by_user(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(wallet.funds, Decimal::from(5));
}

#[tokio::test]
async fn test_confirm_foreign_cartela_not_found() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (owner, _) = common::seed_user(&pool).await;
    let (intruder, _) = common::seed_user(&pool).await;
    common::fund(&pool, intruder.id, Decimal::from(100)).await;
    let fx = fixture(&pool).await;
    let outcome = quote_example(&pool, owner.id, &fx).await;

    let result = betting::confirm(&pool, intruder.id, outcome.instance.id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_cancel_releases_exposure() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    let fx = fixture(&pool).await;
    let keep = quote_example(&pool, user.id, &fx).await;
    let withdrawn = quote_example(&pool, user.id, &fx).await;

    let cancelled = betting::cancel(&pool, user.id, withdrawn.instance.id).await.unwrap();
    assert_eq!(cancelled.status(), Some(CartelaStatus::Cancelada));

    let bucket = risk_repo::get_bucket(&pool, fx.event_id, fx.template_id, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bucket.volume_total, keep.instance.stake);
    assert_eq!(bucket.payout_maximo, keep.potential_return);

    let result = betting::confirm(&pool, user.id, withdrawn.instance.id).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_confirmed_cartela_cannot_be_cancelled() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    common::fund(&pool, user.id, Decimal::from(100)).await;
    let fx = fixture(&pool).await;
    let outcome = quote_example(&pool, user.id, &fx).await;
    betting::confirm(&pool, user.id, outcome.instance.id).await.unwrap();

    let result = betting::cancel(&pool, user.id, outcome.instance.id).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_status_writes_follow_state_machine() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    let fx = fixture(&pool).await;
    let outcome = quote_example(&pool, user.id, &fx).await;
    let id = outcome.instance.id;

    let cancelled = cartela_repo::mark_cancelled(&pool, id).await.unwrap().unwrap();
    assert_eq!(cancelled.status(), Some(CartelaStatus::Cancelada));

    // CANCELADA is terminal: neither write applies and the row is untouched.
    assert!(cartela_repo::mark_confirmed(&pool, id, chrono::Utc::now())
        .await
        .unwrap()
        .is_none());
    assert!(cartela_repo::mark_cancelled(&pool, id).await.unwrap().is_none());
    let stored = cartela_repo::get_instance_for_user(&pool, id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status(), Some(CartelaStatus::Cancelada));
    assert!(stored.locked_at.is_none());
}

// ---------------------------------------------------------------------------
// Odds capture and influencer buckets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_odds_captured_at_quote_time() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    common::fund(&pool, user.id, Decimal::from(100)).await;
    let fx = fixture(&pool).await;
    let outcome = quote_example(&pool, user.id, &fx).await;

    let moved = event_repo::update_selection_odds(
        &pool,
        fx.selections[0].id,
        Decimal::new(310, 2),
        Decimal::new(300, 2),
    )
    .await
    .unwrap();
    assert!(moved.updated_at > fx.selections[0].updated_at);

    let bet = betting::confirm(&pool, user.id, outcome.instance.id).await.unwrap();
    assert_eq!(bet.odd_final, Decimal::new(2755, 3));

    let views = cartela_repo::get_item_views(&pool, outcome.instance.id).await.unwrap();
    let changed = views.iter().find(|v| v.selection_id == moved.id).unwrap();
    assert_eq!(changed.odd_used, Decimal::new(145, 2));
    assert_eq!(changed.odd_published, Decimal::new(300, 2));
}

#[tokio::test]
async fn test_influencer_templates_use_their_own_bucket() {
    let Some(pool) = common::setup_test_db().await else { return };
    let (user, _) = common::seed_user(&pool).await;
    let fx = fixture(&pool).await;
    let influencer = user_repo::insert_influencer(&pool, None, "Tipster", "derby specialist")
        .await
        .unwrap();
    let template = template_repo::insert_template(
        &pool,
        &format!("Tipster picks {}", Uuid::new_v4().simple()),
        "curated",
        TemplateType::Influencer,
        Some(influencer.id),
        &json!({}),
    )
    .await
    .unwrap();

    let req = QuoteRequest {
        event_id: fx.event_id,
        cartela_template_id: template.id,
        selection_ids: both(&fx),
        stake: Decimal::from(10),
    };
    let outcome = betting::quote(&pool, &PassThroughPolicy, validity(), user.id, &req)
        .await
        .unwrap();
    assert_eq!(
        outcome.instance.snapshot_data["influencer_id"],
        influencer.id.to_string()
    );

    let bucket = risk_repo::get_bucket(&pool, fx.event_id, template.id, Some(influencer.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bucket.volume_total, Decimal::from(10));
    assert!(risk_repo::get_bucket(&pool, fx.event_id, template.id, None)
        .await
        .unwrap()
        .is_none());

    betting::cancel(&pool, user.id, outcome.instance.id).await.unwrap();
    let bucket = risk_repo::get_bucket(&pool, fx.event_id, template.id, Some(influencer.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bucket.volume_total, Decimal::ZERO);
    assert_eq!(bucket.payout_maximo, Decimal::ZERO);
}
