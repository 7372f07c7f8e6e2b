pub use newsletter::{
    CreateNewsletter, NewNewsletter, NewsletterChanges, NewsletterPayload, NewsletterRecord,
    NewsletterView, UpdateNewsletter,
};
pub use user::{UserRecord, UserSummary, UserView};

mod newsletter;
mod user;

/// Timestamps go over the wire as naive UTC, `YYYY-MM-DD HH:MM:SS`.
pub(crate) mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Serialize, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value
            .map(|t| t.format(FORMAT).to_string())
            .serialize(serializer)
    }
}
