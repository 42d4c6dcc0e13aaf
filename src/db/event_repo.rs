use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Event, EventStatus, MarketSelection, Sport};

/// Fields of a market selection to insert.
#[derive(Debug, Clone)]
pub struct NewSelection {
    pub event_id: Uuid,
    pub selection_type: String,
    pub params: serde_json::Value,
    pub prob_base: Decimal,
    pub odd_fair: Decimal,
    pub odd_published: Decimal,
    pub is_live: bool,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

pub async fn insert_event<'e, E: PgExecutor<'e>>(
    db: E,
    sport: Sport,
    team_home: &str,
    team_away: &str,
    start_time: DateTime<Utc>,
) -> anyhow::Result<Event> {
    let event = sqlx::query_as::<_, Event>(
        r#"
        INSERT INTO events (sport, team_home, team_away, start_time)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(sport.as_str())
    .bind(team_home)
    .bind(team_away)
    .bind(start_time)
    .fetch_one(db)
    .await?;

    Ok(event)
}

pub async fn get_event<'e, E: PgExecutor<'e>>(db: E, id: Uuid) -> anyhow::Result<Option<Event>> {
    let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?;

    Ok(event)
}

/// Scheduled and live events, soonest first.
pub async fn list_open_events<'e, E: PgExecutor<'e>>(db: E) -> anyhow::Result<Vec<Event>> {
    let events = sqlx::query_as::<_, Event>(
        "SELECT * FROM events WHERE status = ANY($1) ORDER BY start_time ASC",
    )
    .bind(vec![
        EventStatus::Scheduled.as_str(),
        EventStatus::Live.as_str(),
    ])
    .fetch_all(db)
    .await?;

    Ok(events)
}

/// Moves an event along its lifecycle. Returns `None` when the event does
/// not exist or its current status cannot lead to `status`. Live status
/// updates belong to the external feed; here only the integration tests call it.
pub async fn update_event_status<'e, E: PgExecutor<'e>>(
    db: E,
    id: Uuid,
    status: EventStatus,
) -> anyhow::Result<Option<Event>> {
    let event = sqlx::query_as::<_, Event>(
        r#"
        UPDATE events SET status = $2, updated_at = NOW()
        WHERE id = $1 AND status = ANY($3)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(EventStatus::sources_of(status))
    .fetch_optional(db)
    .await?;

    Ok(event)
}

// ---------------------------------------------------------------------------
// Market selections
// ---------------------------------------------------------------------------

pub async fn insert_selection<'e, E: PgExecutor<'e>>(
    db: E,
    selection: &NewSelection,
) -> anyhow::Result<MarketSelection> {
    let row = sqlx::query_as::<_, MarketSelection>(
        r#"
        INSERT INTO market_selections
            (event_id, selection_type, params, prob_base, odd_fair, odd_published, is_live)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(selection.event_id)
    .bind(&selection.selection_type)
    .bind(&selection.params)
    .bind(selection.prob_base)
    .bind(selection.odd_fair)
    .bind(selection.odd_published)
    .bind(selection.is_live)
    .fetch_one(db)
    .await?;

    Ok(row)
}

/// Selections of an event, optionally restricted to in-play ones.
pub async fn get_selections_for_event<'e, E: PgExecutor<'e>>(
    db: E,
    event_id: Uuid,
    live_only: bool,
) -> anyhow::Result<Vec<MarketSelection>> {
    let rows = sqlx::query_as::<_, MarketSelection>(
        r#"
        SELECT * FROM market_selections
        WHERE event_id = $1 AND ($2 = false OR is_live = true)
        ORDER BY selection_type, updated_at
        "#,
    )
    .bind(event_id)
    .bind(live_only)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// Resolve the given ids against one event. Ids belonging to other events
/// or to nothing are simply absent from the result.
pub async fn get_selections_by_ids<'e, E: PgExecutor<'e>>(
    db: E,
    event_id: Uuid,
    ids: &[Uuid],
) -> anyhow::Result<Vec<MarketSelection>> {
    let rows = sqlx::query_as::<_, MarketSelection>(
        "SELECT * FROM market_selections WHERE event_id = $1 AND id = ANY($2)",
    )
    .bind(event_id)
    .bind(ids)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// Move a selection's odds. `updated_at` is bumped so every change is visible.
pub async fn update_selection_odds<'e, E: PgExecutor<'e>>(
    db: E,
    id: Uuid,
    odd_fair: Decimal,
    odd_published: Decimal,
) -> anyhow::Result<MarketSelection> {
    let row = sqlx::query_as::<_, MarketSelection>(
        r#"
        UPDATE market_selections
        SET odd_fair = $2, odd_published = $3, updated_at = clock_timestamp()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(odd_fair)
    .bind(odd_published)
    .fetch_one(db)
    .await?;

    Ok(row)
}
