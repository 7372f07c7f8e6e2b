use std::collections::BTreeMap;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use validator::{ValidationError, ValidationErrors};

fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

#[derive(thiserror::Error)]
pub enum ApiError {
    #[error("The request body failed validation.")]
    Validation(#[from] ValidationErrors),
    #[error("The request body could not be parsed: {0}")]
    MalformedBody(String),
    #[error("Newsletter not found.")]
    NewsletterNotFound,
    #[error("User not found.")]
    UserNotFound,
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ApiError {
    /// A single-field validation failure raised after the body was parsed.
    pub fn invalid_field(field: &'static str, code: &'static str, message: &'static str) -> Self {
        let mut error = ValidationError::new(code);
        error.message = Some(message.into());

        let mut errors = ValidationErrors::new();
        errors.add(field, error);
        Self::Validation(errors)
    }
}

/// Field name to the first message reported for it.
fn field_messages(errors: &ValidationErrors) -> BTreeMap<&'static str, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errors)| {
            errors.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                (field, message)
            })
        })
        .collect()
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::NewsletterNotFound | Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::Validation(errors) => json!({ "message": field_messages(errors) }),
            Self::MalformedBody(reason) => json!({ "message": reason }),
            Self::NewsletterNotFound => json!({ "error": "Not found" }),
            Self::UserNotFound => json!({ "error": "User not found" }),
            Self::Unexpected(e) => {
                tracing::error!(error.cause_chain = ?e, "Unexpected failure while serving request");
                json!({ "error": "Internal server error" })
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
