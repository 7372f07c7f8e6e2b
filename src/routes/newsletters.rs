use actix_web::{web, HttpResponse};
use anyhow::Context;
use chrono::NaiveDateTime;
use sqlx::{Sqlite, SqliteExecutor, SqlitePool, Transaction};

use crate::domain::{
    NewNewsletter, NewsletterChanges, NewsletterPayload, NewsletterRecord, NewsletterView,
    UserRecord,
};

use super::ApiError;

/// A newsletter joined with its author, if the author still exists.
#[derive(sqlx::FromRow)]
struct NewsletterRow {
    id: i64,
    title: Option<String>,
    body: Option<String>,
    published_at: Option<NaiveDateTime>,
    edited_at: Option<NaiveDateTime>,
    user_id: Option<i64>,
    author_id: Option<i64>,
    author_username: Option<String>,
}

impl From<NewsletterRow> for NewsletterView {
    fn from(row: NewsletterRow) -> Self {
        let author = match (row.author_id, row.author_username) {
            (Some(id), Some(username)) => Some(UserRecord { id, username }),
            _ => None,
        };

        NewsletterRecord {
            id: row.id,
            title: row.title,
            body: row.body,
            published_at: row.published_at,
            edited_at: row.edited_at,
            user_id: row.user_id,
        }
        .into_view(author)
    }
}

macro_rules! select_newsletters_with_author {
    ($tail:literal) => {
        concat!(
            r#"
            SELECT n.id, n.title, n.body, n.published_at, n.edited_at, n.user_id,
                   u.id AS author_id, u.username AS author_username
            FROM newsletters n
            LEFT JOIN users u ON u.id = n.user_id
            "#,
            $tail
        )
    };
}

#[tracing::instrument(name = "Listing newsletters", skip(db_pool))]
pub async fn list_newsletters(db_pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let newsletters: Vec<NewsletterView> =
        sqlx::query_as::<_, NewsletterRow>(select_newsletters_with_author!("ORDER BY n.id"))
            .fetch_all(db_pool.get_ref())
            .await
            .map_err(|e| {
                tracing::error!("Failed to execute query: {:?}", e);
                e
            })
            .context("Failed to list newsletters")?
            .into_iter()
            .map(NewsletterView::from)
            .collect();

    Ok(HttpResponse::Ok().json(newsletters))
}

#[tracing::instrument(
    name = "Creating a newsletter",
    skip(body, db_pool),
    fields(title = ?body.title, user_id = ?body.user_id)
)]
pub async fn create_newsletter(
    body: web::Json<NewsletterPayload>,
    db_pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let new_newsletter: NewNewsletter = body.into_inner().try_into()?;

    let mut transaction = db_pool
        .begin()
        .await
        .context("Failed to acquire a connection from the pool")?;

    ensure_user_exists(&mut transaction, new_newsletter.user_id).await?;

    let id = insert_newsletter(&mut transaction, &new_newsletter)
        .await
        .context("Failed to insert a new newsletter")?;

    let newsletter = fetch_newsletter(&mut transaction, id)
        .await
        .context("Failed to read back the new newsletter")?
        .ok_or(ApiError::NewsletterNotFound)?;

    transaction
        .commit()
        .await
        .context("Failed to commit the new newsletter")?;

    Ok(HttpResponse::Created().json(newsletter))
}

#[tracing::instrument(name = "Fetching a newsletter", skip(db_pool))]
pub async fn get_newsletter(
    id: web::Path<i64>,
    db_pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let newsletter = fetch_newsletter(db_pool.get_ref(), id.into_inner())
        .await
        .context("Failed to fetch a newsletter")?
        .ok_or(ApiError::NewsletterNotFound)?;

    Ok(HttpResponse::Ok().json(newsletter))
}

#[tracing::instrument(name = "Updating a newsletter", skip(body, db_pool))]
pub async fn update_newsletter(
    id: web::Path<i64>,
    body: web::Json<NewsletterPayload>,
    db_pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();

    let mut transaction = db_pool
        .begin()
        .await
        .context("Failed to acquire a connection from the pool")?;

    let current = fetch_newsletter(&mut transaction, id)
        .await
        .context("Failed to fetch a newsletter")?
        .ok_or(ApiError::NewsletterNotFound)?;

    let changes: NewsletterChanges = body.into_inner().try_into()?;

    if changes.is_empty() {
        return Ok(HttpResponse::Ok().json(current));
    }

    if let Some(user_id) = changes.user_id {
        ensure_user_exists(&mut transaction, user_id).await?;
    }

    apply_changes(&mut transaction, id, &changes)
        .await
        .context("Failed to update a newsletter")?;

    let newsletter = fetch_newsletter(&mut transaction, id)
        .await
        .context("Failed to read back the updated newsletter")?
        .ok_or(ApiError::NewsletterNotFound)?;

    transaction
        .commit()
        .await
        .context("Failed to commit the newsletter update")?;

    Ok(HttpResponse::Ok().json(newsletter))
}

#[tracing::instrument(name = "Deleting a newsletter", skip(db_pool))]
pub async fn delete_newsletter(
    id: web::Path<i64>,
    db_pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let deleted = sqlx::query("DELETE FROM newsletters WHERE id = ?")
        .bind(id.into_inner())
        .execute(db_pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            e
        })
        .context("Failed to delete a newsletter")?
        .rows_affected();

    if deleted == 0 {
        return Err(ApiError::NewsletterNotFound);
    }

    Ok(HttpResponse::NoContent().finish())
}

#[tracing::instrument(name = "Fetching newsletter by id", skip(executor))]
async fn fetch_newsletter<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<Option<NewsletterView>, sqlx::Error> {
    let row = sqlx::query_as::<_, NewsletterRow>(select_newsletters_with_author!("WHERE n.id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            e
        })?;

    Ok(row.map(NewsletterView::from))
}

/// Rejects a `user_id` that does not name an existing user.
async fn ensure_user_exists(
    transaction: &mut Transaction<'_, Sqlite>,
    user_id: i64,
) -> Result<(), ApiError> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(transaction)
        .await
        .context("Failed to look up the referenced user")?;

    match found {
        Some(_) => Ok(()),
        None => Err(ApiError::invalid_field(
            "user_id",
            "user_exists",
            "User not found",
        )),
    }
}

#[tracing::instrument(name = "Saving new newsletter", skip(transaction, new_newsletter))]
async fn insert_newsletter(
    transaction: &mut Transaction<'_, Sqlite>,
    new_newsletter: &NewNewsletter,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT INTO newsletters (title, body, user_id)
            VALUES (?, ?, ?)
        "#,
    )
    .bind(&new_newsletter.title)
    .bind(&new_newsletter.body)
    .bind(new_newsletter.user_id)
    .execute(transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        e
    })?;

    Ok(result.last_insert_rowid())
}

#[tracing::instrument(name = "Saving newsletter changes", skip(transaction, changes))]
async fn apply_changes(
    transaction: &mut Transaction<'_, Sqlite>,
    id: i64,
    changes: &NewsletterChanges,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            UPDATE newsletters
            SET title = COALESCE(?, title),
                body = COALESCE(?, body),
                user_id = COALESCE(?, user_id),
                edited_at = CURRENT_TIMESTAMP
            WHERE id = ?
        "#,
    )
    .bind(changes.title.as_deref())
    .bind(changes.body.as_deref())
    .bind(changes.user_id)
    .bind(id)
    .execute(transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        e
    })?;

    Ok(())
}
