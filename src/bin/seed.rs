//! Wipes the configured database and fills it with fake users and newsletters.

use std::collections::HashSet;

use anyhow::Context;
use fake::{
    faker::{
        internet::en::Username,
        lorem::en::{Sentence, Words},
    },
    Fake,
};
use newsletter_api::{
    db::{self, DB},
    settings::Settings,
    telemetry::{get_subscriber, init_subscriber},
};
use rand::seq::SliceRandom;
use sqlx::{Sqlite, Transaction};

const USERS: usize = 10;
const NEWSLETTERS: usize = 50;
const TITLE_MAX_CHARS: usize = 20;
const BODY_SENTENCES: usize = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("seed".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber).context("Failed to set up telemetry")?;

    let settings = Settings::load().context("Failed to read configuration")?;
    let db: DB = (&settings.database).into();
    let db_pool = db
        .connect()
        .await
        .with_context(|| format!("Failed to open {db}"))?;

    db::migrate(&db_pool)
        .await
        .context("Failed to migrate the database")?;

    let mut transaction = db_pool.begin().await?;
    seed(&mut transaction).await?;
    transaction.commit().await?;
    tracing::info!(users = USERS, newsletters = NEWSLETTERS, "Done!");

    Ok(())
}

/// Replaces every user and newsletter with fake ones.
async fn seed(transaction: &mut Transaction<'_, Sqlite>) -> anyhow::Result<()> {
    tracing::info!("Clearing DB...");
    sqlx::query("DELETE FROM newsletters")
        .execute(&mut *transaction)
        .await
        .context("Failed to clear newsletters")?;
    sqlx::query("DELETE FROM users")
        .execute(&mut *transaction)
        .await
        .context("Failed to clear users")?;

    tracing::info!("Seeding Users...");
    let user_ids = seed_users(transaction).await?;

    tracing::info!("Seeding Newsletters...");
    seed_newsletters(transaction, &user_ids).await?;

    Ok(())
}

async fn seed_users(transaction: &mut Transaction<'_, Sqlite>) -> anyhow::Result<Vec<i64>> {
    let mut usernames = HashSet::with_capacity(USERS);
    while usernames.len() < USERS {
        usernames.insert(Username().fake::<String>());
    }

    let mut user_ids = Vec::with_capacity(USERS);
    for username in usernames {
        let id = sqlx::query("INSERT INTO users (username) VALUES (?)")
            .bind(&username)
            .execute(&mut *transaction)
            .await
            .with_context(|| format!("Failed to insert user {username}"))?
            .last_insert_rowid();
        user_ids.push(id);
    }

    Ok(user_ids)
}

async fn seed_newsletters(
    transaction: &mut Transaction<'_, Sqlite>,
    user_ids: &[i64],
) -> anyhow::Result<()> {
    for _ in 0..NEWSLETTERS {
        let user_id = user_ids
            .choose(&mut rand::thread_rng())
            .copied()
            .context("No users to own the newsletters")?;

        sqlx::query("INSERT INTO newsletters (title, body, user_id) VALUES (?, ?, ?)")
            .bind(fake_title())
            .bind(fake_body())
            .bind(user_id)
            .execute(&mut *transaction)
            .await
            .context("Failed to insert a newsletter")?;
    }

    Ok(())
}

/// A few lorem words, cut at a word boundary to fit the title budget.
fn fake_title() -> String {
    let words: Vec<String> = Words(2..6).fake();
    let mut title = String::new();

    for word in words {
        let extra = if title.is_empty() { 0 } else { 1 };
        if title.chars().count() + extra + word.chars().count() > TITLE_MAX_CHARS - 1 {
            break;
        }
        if !title.is_empty() {
            title.push(' ');
        }
        title.push_str(&word);
    }

    let mut chars = title.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => "Untitled.".into(),
    }
}

fn fake_body() -> String {
    (0..BODY_SENTENCES)
        .map(|_| Sentence(4..10).fake::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}
