use super::NewsletterRecord;

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, serde::Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
}

/// The author embedded in a newsletter. Carries no newsletters of its own.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
}

impl From<UserRecord> for UserSummary {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// A user as served to clients, with the newsletters they wrote.
///
/// Nested newsletters are bare [`NewsletterRecord`]s, so they never point
/// back at their author.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub newsletters: Vec<NewsletterRecord>,
}

impl UserRecord {
    pub fn into_view(self, newsletters: Vec<NewsletterRecord>) -> UserView {
        UserView {
            id: self.id,
            username: self.username,
            newsletters,
        }
    }
}
