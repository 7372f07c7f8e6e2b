use chrono::NaiveDateTime;
use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors};

use super::{timestamp, UserRecord, UserSummary};

/// A row of the `newsletters` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, serde::Serialize)]
pub struct NewsletterRecord {
    pub id: i64,
    pub title: Option<String>,
    pub body: Option<String>,
    #[serde(with = "timestamp")]
    pub published_at: Option<NaiveDateTime>,
    #[serde(with = "timestamp")]
    pub edited_at: Option<NaiveDateTime>,
    pub user_id: Option<i64>,
}

/// A newsletter as served to clients: its columns plus its author.
///
/// The author is a [`UserSummary`], which has no way to carry the author's
/// own newsletters.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NewsletterView {
    #[serde(flatten)]
    pub newsletter: NewsletterRecord,
    pub user: Option<UserSummary>,
}

impl NewsletterRecord {
    pub fn into_view(self, author: Option<UserRecord>) -> NewsletterView {
        NewsletterView {
            newsletter: self,
            user: author.map(UserSummary::from),
        }
    }
}

/// Body of a newsletter write as it arrived, before any field is type checked.
///
/// Fields stay untyped so a value of the wrong JSON type is reported against
/// its field instead of failing the whole body.
#[derive(Debug, Default, Clone, serde::Deserialize)]
pub struct NewsletterPayload {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub user_id: Option<Value>,
}

/// Rules for `POST /newsletters`. Every field must be present.
#[derive(Debug, Default, Validate)]
pub struct CreateNewsletter {
    #[validate(
        required(message = "Title is required"),
        length(min = 5, message = "Title must be at least 5 characters long")
    )]
    pub title: Option<String>,
    #[validate(required(message = "Body is required"))]
    pub body: Option<String>,
    #[validate(required(message = "User ID is required"))]
    pub user_id: Option<i64>,
}

/// Rules for `PATCH /newsletters/{id}`. Absent fields are left untouched.
#[derive(Debug, Default, Validate)]
pub struct UpdateNewsletter {
    #[validate(length(min = 5, message = "Title must be at least 5 characters long"))]
    pub title: Option<String>,
    pub body: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNewsletter {
    pub title: String,
    pub body: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsletterChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub user_id: Option<i64>,
}

impl NewsletterChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.user_id.is_none()
    }
}

struct TypedFields {
    title: Option<String>,
    body: Option<String>,
    user_id: Option<i64>,
    errors: ValidationErrors,
}

fn type_error(message: &'static str) -> ValidationError {
    let mut error = ValidationError::new("type");
    error.message = Some(message.into());
    error
}

fn string_field(
    value: Option<Value>,
    field: &'static str,
    message: &'static str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            errors.add(field, type_error(message));
            None
        }
    }
}

/// Accepts an integer or a string holding one.
fn id_field(
    value: Option<Value>,
    field: &'static str,
    message: &'static str,
    errors: &mut ValidationErrors,
) -> Option<i64> {
    let value = match value {
        None | Some(Value::Null) => return None,
        Some(value) => value,
    };

    let id = match &value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };

    if id.is_none() {
        errors.add(field, type_error(message));
    }
    id
}

impl NewsletterPayload {
    fn into_typed(self) -> TypedFields {
        let mut errors = ValidationErrors::new();

        let title = string_field(self.title, "title", "Title must be a string", &mut errors);
        let body = string_field(self.body, "body", "Body must be a string", &mut errors);
        let user_id = id_field(
            self.user_id,
            "user_id",
            "User ID must be an integer",
            &mut errors,
        );

        TypedFields {
            title,
            body,
            user_id,
            errors,
        }
    }
}

/// Adds rule failures to type failures. A field with the wrong type only
/// reports that.
fn merge_errors(
    mut type_errors: ValidationErrors,
    rules: Result<(), ValidationErrors>,
) -> Result<(), ValidationErrors> {
    if let Err(rule_errors) = rules {
        for (field, errors) in rule_errors.field_errors() {
            if type_errors.field_errors().contains_key(field) {
                continue;
            }
            for error in errors {
                type_errors.add(field, error.clone());
            }
        }
    }

    if type_errors.errors().is_empty() {
        Ok(())
    } else {
        Err(type_errors)
    }
}

impl NewNewsletter {
    fn parse(
        schema: CreateNewsletter,
        type_errors: ValidationErrors,
    ) -> Result<Self, ValidationErrors> {
        merge_errors(type_errors, schema.validate())?;

        let CreateNewsletter {
            title: Some(title),
            body: Some(body),
            user_id: Some(user_id),
        } = schema
        else {
            return Err(ValidationErrors::new());
        };

        Ok(Self {
            title,
            body,
            user_id,
        })
    }
}

impl NewsletterChanges {
    fn parse(
        schema: UpdateNewsletter,
        type_errors: ValidationErrors,
    ) -> Result<Self, ValidationErrors> {
        merge_errors(type_errors, schema.validate())?;

        Ok(Self {
            title: schema.title,
            body: schema.body,
            user_id: schema.user_id,
        })
    }
}

impl TryFrom<CreateNewsletter> for NewNewsletter {
    type Error = ValidationErrors;

    fn try_from(value: CreateNewsletter) -> Result<Self, Self::Error> {
        Self::parse(value, ValidationErrors::new())
    }
}

impl TryFrom<NewsletterPayload> for NewNewsletter {
    type Error = ValidationErrors;

    fn try_from(value: NewsletterPayload) -> Result<Self, Self::Error> {
        let fields = value.into_typed();
        let schema = CreateNewsletter {
            title: fields.title,
            body: fields.body,
            user_id: fields.user_id,
        };
        Self::parse(schema, fields.errors)
    }
}

impl TryFrom<UpdateNewsletter> for NewsletterChanges {
    type Error = ValidationErrors;

    fn try_from(value: UpdateNewsletter) -> Result<Self, Self::Error> {
        Self::parse(value, ValidationErrors::new())
    }
}

impl TryFrom<NewsletterPayload> for NewsletterChanges {
    type Error = ValidationErrors;

    fn try_from(value: NewsletterPayload) -> Result<Self, Self::Error> {
        let fields = value.into_typed();
        let schema = UpdateNewsletter {
            title: fields.title,
            body: fields.body,
            user_id: fields.user_id,
        };
        Self::parse(schema, fields.errors)
    }
}
