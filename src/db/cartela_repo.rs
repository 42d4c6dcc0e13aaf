use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{
    CartelaInstance, CartelaInstanceItem, CartelaItemView, CartelaStatus, OddsSnapshot,
};

/// Fields of a freshly quoted cartela instance.
#[derive(Debug, Clone)]
pub struct NewInstance {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub cartela_template_id: Uuid,
    pub status: CartelaStatus,
    pub odd_final: Decimal,
    pub premio_maximo: Decimal,
    pub stake: Decimal,
    pub snapshot_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

pub async fn insert_instance<'e, E: PgExecutor<'e>>(
    db: E,
    new: &NewInstance,
) -> anyhow::Result<CartelaInstance> {
    let instance = sqlx::query_as::<_, CartelaInstance>(
        r#"
        INSERT INTO cartela_instances
            (user_id, event_id, cartela_template_id, status, odd_final, premio_maximo,
             stake, snapshot_data, created_at, valid_until)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(new.user_id)
    .bind(new.event_id)
    .bind(new.cartela_template_id)
    .bind(new.status.as_str())
    .bind(new.odd_final)
    .bind(new.premio_maximo)
    .bind(new.stake)
    .bind(&new.snapshot_data)
    .bind(new.created_at)
    .bind(new.valid_until)
    .fetch_one(db)
    .await?;

    Ok(instance)
}

pub async fn insert_item<'e, E: PgExecutor<'e>>(
    db: E,
    instance_id: Uuid,
    selection_id: Uuid,
    odd_used: Decimal,
) -> anyhow::Result<CartelaInstanceItem> {
    let item = sqlx::query_as::<_, CartelaInstanceItem>(
        r#"
        INSERT INTO cartela_instance_items (cartela_instance_id, market_selection_id, odd_used)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(instance_id)
    .bind(selection_id)
    .bind(odd_used)
    .fetch_one(db)
    .await?;

    Ok(item)
}

pub async fn insert_odds_snapshot<'e, E: PgExecutor<'e>>(
    db: E,
    instance_id: Uuid,
    data: &serde_json::Value,
) -> anyhow::Result<OddsSnapshot> {
    let snapshot = sqlx::query_as::<_, OddsSnapshot>(
        r#"
        INSERT INTO odds_snapshots (cartela_instance_id, data)
        VALUES ($1, $2)
        RETURNING *
        "#,
    )
    .bind(instance_id)
    .bind(data)
    .fetch_one(db)
    .await?;

    Ok(snapshot)
}

/// Fetch an instance only if it belongs to `user_id`.
pub async fn get_instance_for_user<'e, E: PgExecutor<'e>>(
    db: E,
    id: Uuid,
    user_id: Uuid,
) -> anyhow::Result<Option<CartelaInstance>> {
    let instance = sqlx::query_as::<_, CartelaInstance>(
        "SELECT * FROM cartela_instances WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(instance)
}

/// Same as [`get_instance_for_user`] but holds a row lock until the
/// surrounding transaction ends, serialising concurrent confirms.
pub async fn lock_instance_for_user<'e, E: PgExecutor<'e>>(
    db: E,
    id: Uuid,
    user_id: Uuid,
) -> anyhow::Result<Option<CartelaInstance>> {
    let instance = sqlx::query_as::<_, CartelaInstance>(
        "SELECT * FROM cartela_instances WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(instance)
}

/// Returns `None` when the instance was already locked or is no longer in a
/// status that may be confirmed.
pub async fn mark_confirmed<'e, E: PgExecutor<'e>>(
    db: E,
    id: Uuid,
    locked_at: DateTime<Utc>,
) -> anyhow::Result<Option<CartelaInstance>> {
    let instance = sqlx::query_as::<_, CartelaInstance>(
        r#"
        UPDATE cartela_instances
        SET status = $2, locked_at = $3
        WHERE id = $1 AND locked_at IS NULL AND status = ANY($4)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(CartelaStatus::ApostaConfirmada.as_str())
    .bind(locked_at)
    .bind(CartelaStatus::sources_of(CartelaStatus::ApostaConfirmada))
    .fetch_optional(db)
    .await?;

    Ok(instance)
}

pub async fn mark_cancelled<'e, E: PgExecutor<'e>>(
    db: E,
    id: Uuid,
) -> anyhow::Result<Option<CartelaInstance>> {
    let instance = sqlx::query_as::<_, CartelaInstance>(
        "UPDATE cartela_instances SET status = $2 WHERE id = $1 AND status = ANY($3) RETURNING *",
    )
    .bind(id)
    .bind(CartelaStatus::Cancelada.as_str())
    .bind(CartelaStatus::sources_of(CartelaStatus::Cancelada))
    .fetch_optional(db)
    .await?;

    Ok(instance)
}

/// Raw item rows. The API serves [`get_item_views`]; the integration tests
/// read these to check the odds captured at quote time.
pub async fn get_items<'e, E: PgExecutor<'e>>(
    db: E,
    instance_id: Uuid,
) -> anyhow::Result<Vec<CartelaInstanceItem>> {
    let items = sqlx::query_as::<_, CartelaInstanceItem>(
        "SELECT * FROM cartela_instance_items WHERE cartela_instance_id = $1",
    )
    .bind(instance_id)
    .fetch_all(db)
    .await?;

    Ok(items)
}

/// Items joined with their selections, for the detail view.
pub async fn get_item_views<'e, E: PgExecutor<'e>>(
    db: E,
    instance_id: Uuid,
) -> anyhow::Result<Vec<CartelaItemView>> {
    let items = sqlx::query_as::<_, CartelaItemView>(
        r#"
        SELECT i.id, i.odd_used, s.id AS selection_id, s.selection_type, s.params, s.odd_published
        FROM cartela_instance_items i
        JOIN market_selections s ON s.id = i.market_selection_id
        WHERE i.cartela_instance_id = $1
        ORDER BY s.selection_type
        "#,
    )
    .bind(instance_id)
    .fetch_all(db)
    .await?;

    Ok(items)
}

/// Used by the integration tests to assert a rejected quote wrote nothing.
pub async fn count_instances_for_user<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: Uuid,
) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM cartela_instances WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;

    Ok(row.0)
}
