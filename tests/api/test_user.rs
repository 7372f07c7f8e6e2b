use fake::{faker::internet::en::Username, Fake};
use sqlx::SqlitePool;

pub struct TestUser {
    pub id: i64,
    pub username: String,
}

impl TestUser {
    pub fn generate() -> Self {
        let username: String = Username().fake();
        Self {
            id: 0,
            username: format!("{username}_{}", rand::random::<u32>()),
        }
    }

    pub async fn insert(&mut self, db_pool: &SqlitePool) {
        self.id = sqlx::query("INSERT INTO users (username) VALUES (?)")
            .bind(&self.username)
            .execute(db_pool)
            .await
            .expect("Failed to create test user.")
            .last_insert_rowid();
    }
}
