use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domains::SubmissionError;
use serde::Serialize;
use thiserror::Error;

/// JSON body of every `/api/support` answer.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("All fields are required.")]
    MissingFields,

    #[error("You are banned from submitting requests. Please contact support on Discord for more info: {contact_url}")]
    Banned { contact_url: String },

    #[error("Failed to submit request.")]
    DeliveryFailed,
}

impl ApiError {
    pub fn from_submission(err: SubmissionError, contact_url: &str) -> Self {
        match err {
            SubmissionError::MissingFields => ApiError::MissingFields,
            SubmissionError::Banned => ApiError::Banned {
                contact_url: contact_url.to_string(),
            },
            SubmissionError::DeliveryFailed(_) => ApiError::DeliveryFailed,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::MissingFields => StatusCode::BAD_REQUEST,
            ApiError::Banned { .. } => StatusCode::FORBIDDEN,
            ApiError::DeliveryFailed => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(MessageBody::new(self.to_string()))).into_response()
    }
}
