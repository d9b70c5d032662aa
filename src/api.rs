// Service boundary: camelCase JSON requests and responses, errors as {kind, message}
// A routing layer maps each ErrorBody kind to its HTTP status

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::booking::{
    Actor, BookingStatus, GuestContext, GuestCounts, GuestDetails, PaymentMethod,
};
use crate::booking_number::BookingNumberGenerator;
use crate::cancellation::{CancellationEngine, CancellationOutcome};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::dates::parse_date;
use crate::error::{BookingError, ErrorBody, ErrorKind};
use crate::ledger::{AvailabilityReport, NewBooking, ReservationLedger};
use crate::notify::Notifier;
use crate::store::ReservationStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub accommodation_id: Option<String>,
    pub room_id: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub guests: Option<GuestCounts>,
    #[serde(default)]
    pub guest_details: Option<GuestDetails>,
    #[serde(default)]
    pub special_requests: Vec<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

impl CreateBookingRequest {
    fn into_new_booking(self) -> Result<NewBooking, BookingError> {
        let (accommodation_id, room_id, check_in, check_out, guests) = match (
            self.accommodation_id,
            self.room_id,
            self.check_in,
            self.check_out,
            self.guests,
        ) {
            (Some(a), Some(r), Some(ci), Some(co), Some(g)) => (a, r, ci, co, g),
            _ => {
                return Err(BookingError::Validation(
                    "Missing required booking information".to_string(),
                ))
            }
        };

        Ok(NewBooking {
            accommodation_id,
            room_id,
            check_in: parse_date(&check_in)?,
            check_out: parse_date(&check_out)?,
            guests,
            guest_details: self.guest_details,
            special_requests: self.special_requests,
            payment_method: self.payment_method.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub booking_id: Uuid,
    pub booking_number: String,
    pub status: BookingStatus,
    pub total: Decimal,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    #[serde(default)]
    pub guests: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBookingRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[async_trait]
pub trait BookingApi: Send + Sync + 'static {
    async fn create_booking(
        &self,
        guest: &GuestContext,
        request: CreateBookingRequest,
    ) -> Result<CreateBookingResponse, ErrorBody>;

    async fn availability(
        &self,
        accommodation_id: &str,
        request: AvailabilityRequest,
    ) -> Result<AvailabilityReport, ErrorBody>;

    async fn cancel_booking(
        &self,
        actor: &Actor,
        booking_id: &str,
        request: CancelBookingRequest,
    ) -> Result<CancellationOutcome, ErrorBody>;
}

pub struct BookingService {
    ledger: ReservationLedger,
    cancellations: CancellationEngine,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            ledger: ReservationLedger::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                Arc::clone(&notifier),
                config,
            ),
            cancellations: CancellationEngine::new(store, clock, notifier, config),
        }
    }

    pub fn with_booking_numbers(mut self, numbers: BookingNumberGenerator) -> Self {
        self.ledger = self.ledger.with_booking_numbers(numbers);
        self
    }

    // Lookups and status transitions not exposed on the wire
    pub fn ledger(&self) -> &ReservationLedger {
        &self.ledger
    }
}

#[async_trait]
impl BookingApi for BookingService {
    async fn create_booking(
        &self,
        guest: &GuestContext,
        request: CreateBookingRequest,
    ) -> Result<CreateBookingResponse, ErrorBody> {
        let result = async {
            let booking = self.ledger.create(guest, request.into_new_booking()?).await?;

            Ok::<_, BookingError>(CreateBookingResponse {
                booking_id: booking.id,
                booking_number: booking.booking_number,
                status: booking.status,
                total: booking.pricing.total,
                check_in: booking.check_in,
                check_out: booking.check_out,
            })
        }
        .await;

        reply("create-booking", result)
    }

    async fn availability(
        &self,
        accommodation_id: &str,
        request: AvailabilityRequest,
    ) -> Result<AvailabilityReport, ErrorBody> {
        let result = async {
            let (check_in, check_out) = match (request.check_in, request.check_out) {
                (Some(check_in), Some(check_out)) => (parse_date(&check_in)?, parse_date(&check_out)?),
                _ => {
                    return Err(BookingError::Validation(
                        "Check-in and check-out dates are required".to_string(),
                    ))
                }
            };

            self.ledger
                .availability(
                    accommodation_id,
                    check_in,
                    check_out,
                    request.guests.unwrap_or(1),
                )
                .await
        }
        .await;

        reply("availability", result)
    }

    async fn cancel_booking(
        &self,
        actor: &Actor,
        booking_id: &str,
        request: CancelBookingRequest,
    ) -> Result<CancellationOutcome, ErrorBody> {
        let result = async {
            let id = Uuid::parse_str(booking_id.trim()).map_err(|_| {
                BookingError::Validation(format!("Malformed booking id: {}", booking_id))
            })?;
            self.cancellations.cancel(id, actor, request.reason).await
        }
        .await;

        reply("cancel-booking", result)
    }
}

fn reply<T>(operation: &str, result: Result<T, BookingError>) -> Result<T, ErrorBody> {
    result.map_err(|e| {
        let body = ErrorBody::from(e);
        if body.kind == ErrorKind::InternalError {
            error!(operation, message = %body.message, "request failed");
        } else {
            debug!(operation, kind = ?body.kind, message = %body.message, "request rejected");
        }
        body
    })
}

// Malformed JSON is a validation error like any other bad input
pub fn parse_request<T: DeserializeOwned>(body: &str) -> Result<T, ErrorBody> {
    serde_json::from_str(body).map_err(|e| ErrorBody {
        kind: ErrorKind::ValidationError,
        message: format!("Malformed request body: {}", e),
    })
}

// Status code and JSON body for a handler result
pub fn render<T: Serialize>(result: &Result<T, ErrorBody>) -> (u16, String) {
    let rendered = match result {
        Ok(value) => serde_json::to_string(value).map(|json| (200, json)),
        Err(body) => serde_json::to_string(body).map(|json| (body.kind.http_status(), json)),
    };

    rendered.unwrap_or_else(|e| {
        error!(error = %e, "response serialization failed");
        (
            500,
            r#"{"kind":"InternalError","message":"Response serialization failed"}"#.to_string(),
        )
    })
}
