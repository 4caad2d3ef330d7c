//! # Errors
//!
//! Rejections shown to submitters are kept apart from infrastructure
//! failures so that adapters can map them independently.

use thiserror::Error;

use crate::models::StatusMessageHandle;

/// Why a support submission was not accepted.
#[derive(Error, Debug)]
pub enum SubmissionError {
    /// One of nickname, email or description was empty.
    #[error("all fields are required")]
    MissingFields,

    /// The derived identity is on the ban list.
    #[error("submitter is banned")]
    Banned,

    /// The support sink did not acknowledge the notification.
    #[error("delivery failed: {0}")]
    DeliveryFailed(#[from] DeliveryError),
}

/// Outbound notification or probe failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Connection, TLS, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote answered, but not with the expected acknowledgement.
    #[error("unexpected response status {status}")]
    UnexpectedStatus { status: u16 },
}

/// Failures from the channel messenger used for status messages and alerts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessengerError {
    /// The cached handle points at a message deleted out-of-band.
    #[error("status message {:?} no longer exists", .0)]
    MessageNotFound(StatusMessageHandle),

    #[error("messenger transport error: {0}")]
    Transport(String),
}

pub type SubmissionResult<T> = std::result::Result<T, SubmissionError>;
