use actix_web::{HttpResponse, ResponseError, error::JsonPayloadError, http::StatusCode};

use super::super::helpers::error_chain_fmt;
use super::types::{ErrorResponse, FAILURE_MESSAGE, METHOD_NOT_ALLOWED_MESSAGE};
use crate::domain::REQUIRED_FIELDS_MESSAGE;

#[derive(thiserror::Error)]
pub enum ContactError {
    #[error("{0}")]
    ValidationError(String),
    #[error("The contact form body could not be parsed.")]
    InvalidPayload(#[source] JsonPayloadError),
    #[error("Only POST is supported on the contact endpoint.")]
    MethodNotAllowed,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ContactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ContactError {
    /// What the caller gets to see. Never includes downstream details.
    fn public_message(&self) -> &'static str {
        match self {
            ContactError::ValidationError(_) | ContactError::InvalidPayload(_) => {
                REQUIRED_FIELDS_MESSAGE
            }
            ContactError::MethodNotAllowed => METHOD_NOT_ALLOWED_MESSAGE,
            ContactError::UnexpectedError(_) => FAILURE_MESSAGE,
        }
    }
}

impl ResponseError for ContactError {
    fn status_code(&self) -> StatusCode {
        match self {
            ContactError::ValidationError(_) | ContactError::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            ContactError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ContactError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.public_message().to_string(),
        })
    }
}
