// Error taxonomy for the reservation engine
// Every failure carries a kind the caller can branch on plus a readable message

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid date range: check-in {check_in} must be before check-out {check_out}")]
    InvalidRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Room {room_id} sleeps {capacity} guests, {requested} requested")]
    CapacityExceeded {
        room_id: String,
        capacity: u32,
        requested: u32,
    },

    #[error("Room {room_id} is not available for the night of {date}")]
    RoomUnavailable { room_id: String, date: NaiveDate },

    #[error("Booking number already taken: {0}")]
    DuplicateBookingNumber(String),

    #[error("Booking {0} was modified concurrently")]
    ConcurrentModification(String),

    #[error("Cannot move booking from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Cancellation window closed: {0}")]
    CancellationWindowClosed(String),

    #[error("Calendar date {date} of room {room_id} is held by a booking")]
    CellHeld { room_id: String, date: NaiveDate },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

// Coarse classification exposed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ValidationError,
    NotFound,
    Conflict,
    Forbidden,
    InternalError,
}

impl ErrorKind {
    // Status code a routing layer should answer with
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::ValidationError => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Forbidden => 403,
            ErrorKind::InternalError => 500,
        }
    }
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::Validation(_) | BookingError::InvalidRange { .. } => {
                ErrorKind::ValidationError
            }
            BookingError::NotFound { .. } => ErrorKind::NotFound,
            BookingError::CapacityExceeded { .. }
            | BookingError::RoomUnavailable { .. }
            | BookingError::DuplicateBookingNumber(_)
            | BookingError::ConcurrentModification(_)
            | BookingError::InvalidTransition { .. }
            | BookingError::CellHeld { .. } => ErrorKind::Conflict,
            BookingError::CancellationWindowClosed(_) => ErrorKind::Forbidden,
            BookingError::StorageUnavailable(_) => ErrorKind::InternalError,
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        BookingError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

// Structured error returned across the service boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<BookingError> for ErrorBody {
    fn from(error: BookingError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

// Raised by notification senders; logged and dropped by the engine
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Missing recipient for booking {0}")]
    MissingRecipient(String),
}
