use actix_web::{web, HttpResponse};
use anyhow::Context;
use sqlx::SqlitePool;

use crate::domain::{NewsletterRecord, UserRecord};

use super::ApiError;

#[tracing::instrument(name = "Fetching a user", skip(db_pool))]
pub async fn get_user(
    id: web::Path<i64>,
    db_pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();

    let user = sqlx::query_as::<_, UserRecord>("SELECT id, username FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(db_pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            e
        })
        .context("Failed to fetch a user")?
        .ok_or(ApiError::UserNotFound)?;

    let newsletters = sqlx::query_as::<_, NewsletterRecord>(
        r#"
            SELECT id, title, body, published_at, edited_at, user_id
            FROM newsletters
            WHERE user_id = ?
            ORDER BY id
        "#,
    )
    .bind(id)
    .fetch_all(db_pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        e
    })
    .context("Failed to fetch the newsletters of a user")?;

    Ok(HttpResponse::Ok().json(user.into_view(newsletters)))
}
