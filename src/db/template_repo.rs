use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{CartelaTemplate, CartelaTemplateItem, TemplateType};

pub async fn insert_template<'e, E: PgExecutor<'e>>(
    db: E,
    name: &str,
    description: &str,
    template_type: TemplateType,
    influencer_id: Option<Uuid>,
    config: &serde_json::Value,
) -> anyhow::Result<CartelaTemplate> {
    let template = sqlx::query_as::<_, CartelaTemplate>(
        r#"
        INSERT INTO cartela_templates (name, description, template_type, influencer_id, config)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(description)
    .bind(template_type.as_str())
    .bind(influencer_id)
    .bind(config)
    .fetch_one(db)
    .await?;

    Ok(template)
}

pub async fn get_template<'e, E: PgExecutor<'e>>(
    db: E,
    id: Uuid,
) -> anyhow::Result<Option<CartelaTemplate>> {
    let template = sqlx::query_as::<_, CartelaTemplate>(
        "SELECT * FROM cartela_templates WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(template)
}

pub async fn get_active_template<'e, E: PgExecutor<'e>>(
    db: E,
    id: Uuid,
) -> anyhow::Result<Option<CartelaTemplate>> {
    let template = sqlx::query_as::<_, CartelaTemplate>(
        "SELECT * FROM cartela_templates WHERE id = $1 AND is_active = true",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(template)
}

pub async fn list_active_templates<'e, E: PgExecutor<'e>>(
    db: E,
) -> anyhow::Result<Vec<CartelaTemplate>> {
    let templates = sqlx::query_as::<_, CartelaTemplate>(
        "SELECT * FROM cartela_templates WHERE is_active = true ORDER BY template_type, name",
    )
    .fetch_all(db)
    .await?;

    Ok(templates)
}

/// Soft-disable a template. Templates are never deleted while instances exist.
pub async fn deactivate_template<'e, E: PgExecutor<'e>>(db: E, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("UPDATE cartela_templates SET is_active = false WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    Ok(())
}

pub async fn insert_template_item<'e, E: PgExecutor<'e>>(
    db: E,
    template_id: Uuid,
    allowed_selection_type: &str,
    constraints: &serde_json::Value,
) -> anyhow::Result<CartelaTemplateItem> {
    let item = sqlx::query_as::<_, CartelaTemplateItem>(
        r#"
        INSERT INTO cartela_template_items (cartela_template_id, allowed_selection_type, constraints)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(template_id)
    .bind(allowed_selection_type)
    .bind(constraints)
    .fetch_one(db)
    .await?;

    Ok(item)
}

pub async fn get_template_items<'e, E: PgExecutor<'e>>(
    db: E,
    template_id: Uuid,
) -> anyhow::Result<Vec<CartelaTemplateItem>> {
    let items = sqlx::query_as::<_, CartelaTemplateItem>(
        r#"
        SELECT * FROM cartela_template_items
        WHERE cartela_template_id = $1
        ORDER BY allowed_selection_type
        "#,
    )
    .bind(template_id)
    .fetch_all(db)
    .await?;

    Ok(items)
}
