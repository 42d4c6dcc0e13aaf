use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Bet, BetRow, BetView};

const BET_VIEW_SELECT: &str = r#"
    SELECT b.id, b.cartela_instance_id, b.stake, b.odd_final, b.potential_return,
           b.is_won, b.settled_at, b.created_at,
           e.id AS event_id, e.sport, e.team_home, e.team_away, e.start_time,
           t.template_type
    FROM bets b
    JOIN cartela_instances c ON c.id = b.cartela_instance_id
    JOIN events e ON e.id = c.event_id
    JOIN cartela_templates t ON t.id = c.cartela_template_id
"#;

pub async fn insert_bet<'e, E: PgExecutor<'e>>(
    db: E,
    cartela_instance_id: Uuid,
    stake: Decimal,
    odd_final: Decimal,
    potential_return: Decimal,
) -> anyhow::Result<Bet> {
    let bet = sqlx::query_as::<_, Bet>(
        r#"
        INSERT INTO bets (cartela_instance_id, stake, odd_final, potential_return)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(cartela_instance_id)
    .bind(stake)
    .bind(odd_final)
    .bind(potential_return)
    .fetch_one(db)
    .await?;

    Ok(bet)
}

/// Used by the integration tests to check a failed confirmation left no bet.
pub async fn get_bet_by_instance<'e, E: PgExecutor<'e>>(
    db: E,
    cartela_instance_id: Uuid,
) -> anyhow::Result<Option<Bet>> {
    let bet = sqlx::query_as::<_, Bet>("SELECT * FROM bets WHERE cartela_instance_id = $1")
        .bind(cartela_instance_id)
        .fetch_optional(db)
        .await?;

    Ok(bet)
}

pub async fn get_bet_view<'e, E: PgExecutor<'e>>(
    db: E,
    bet_id: Uuid,
) -> anyhow::Result<Option<BetView>> {
    let sql = format!("{BET_VIEW_SELECT} WHERE b.id = $1");
    let row = sqlx::query_as::<_, BetRow>(&sql)
        .bind(bet_id)
        .fetch_optional(db)
        .await?;

    Ok(row.map(BetView::from))
}

/// A user's bets, newest first.
pub async fn list_bets_for_user<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: Uuid,
) -> anyhow::Result<Vec<BetView>> {
    let sql = format!("{BET_VIEW_SELECT} WHERE c.user_id = $1 ORDER BY b.created_at DESC, b.id DESC");
    let rows = sqlx::query_as::<_, BetRow>(&sql)
        .bind(user_id)
        .fetch_all(db)
        .await?;

    Ok(rows.into_iter().map(BetView::from).collect())
}
