// Booking record, its lifecycle state machine and cancellation metadata

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BookingError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub booking_number: String,
    pub guest_id: String,
    pub accommodation_id: String,
    pub room_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: u32,
    pub guests: GuestCounts,
    #[serde(default)]
    pub guest_details: Option<GuestDetails>,
    #[serde(default)]
    pub special_requests: Vec<String>,
    pub pricing: PricingBreakdown,
    pub payment: Payment,
    pub status: BookingStatus,
    #[serde(default)]
    pub cancellation: Option<CancellationRecord>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn transition_to(&mut self, next: BookingStatus) -> Result<(), BookingError> {
        if !self.status.can_transition_to(next) {
            return Err(BookingError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    // Cancellation metadata is written exactly once
    pub fn cancel(&mut self, record: CancellationRecord) -> Result<(), BookingError> {
        if self.cancellation.is_some() {
            return Err(BookingError::InvalidTransition {
                from: self.status.to_string(),
                to: BookingStatus::Cancelled.to_string(),
            });
        }
        self.transition_to(BookingStatus::Cancelled)?;
        self.cancellation = Some(record);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;

        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, CheckedIn)
                | (CheckedIn, CheckedOut)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::CheckedOut | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::CheckedOut => "checked_out",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCounts {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
    pub total: u32,
}

impl GuestCounts {
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.adults < 1 {
            return Err(BookingError::Validation(
                "At least one adult is required".to_string(),
            ));
        }
        let seated = self.adults.checked_add(self.children).ok_or_else(|| {
            BookingError::Validation(format!(
                "Guest counts out of range: {} adults + {} children",
                self.adults, self.children
            ))
        })?;
        if self.total < seated {
            return Err(BookingError::Validation(format!(
                "Guest total {} does not cover {} adults + {} children",
                self.total, self.adults, self.children
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestDetails {
    pub primary_guest: PrimaryGuest,
    #[serde(default)]
    pub additional_guests: Vec<AdditionalGuest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryGuest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalGuest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub relationship: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    pub base_price: Decimal,
    pub nights: u32,
    pub subtotal: Decimal,
    pub fees: Vec<Fee>,
    pub taxes: Vec<Tax>,
    pub total: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
    pub name: String,
    pub amount: Decimal,
    pub fee_type: FeeType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeType {
    Cleaning,
    Service,
    Deposit,
    ExtraGuest,
    Pet,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tax {
    pub name: String,
    // Percentage, e.g. 8 for 8%
    pub rate: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    DebitCard,
    Paypal,
    BankTransfer,
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Authorized,
    Captured,
    Failed,
    Refunded,
    PartiallyRefunded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationRecord {
    pub cancelled_at: DateTime<Utc>,
    pub cancelled_by: ActorRole,
    pub reason: String,
    pub refund_amount: Decimal,
    pub refund_status: RefundStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Guest,
    Host,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Processed,
    Failed,
}

// Identity of the guest placing a booking
#[derive(Debug, Clone, PartialEq)]
pub struct GuestContext {
    pub guest_id: String,
    pub email: Option<String>,
}

// Identity and role of whoever asks for a cancellation
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub user_id: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn guest(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: ActorRole::Guest,
        }
    }

    pub fn host(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: ActorRole::Host,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: ActorRole::Admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use BookingStatus::*;

    #[test_case(Pending, Confirmed, true; "confirm request")]
    #[test_case(Confirmed, CheckedIn, true; "check in")]
    #[test_case(CheckedIn, CheckedOut, true; "check out")]
    #[test_case(Pending, Cancelled, true; "cancel request")]
    #[test_case(Confirmed, Cancelled, true; "cancel confirmed")]
    #[test_case(Confirmed, NoShow, true; "no show")]
    #[test_case(Pending, CheckedIn, false; "skip confirmation")]
    #[test_case(CheckedIn, Cancelled, false; "cancel after arrival")]
    #[test_case(CheckedOut, Confirmed, false; "reopen finished stay")]
    #[test_case(Cancelled, Confirmed, false; "revive cancelled")]
    #[test_case(NoShow, CheckedIn, false; "late arrival after no show")]
    #[test_case(Confirmed, Pending, false; "backwards")]
    fn test_status_transitions(from: BookingStatus, to: BookingStatus, allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        let all = [Pending, Confirmed, CheckedIn, CheckedOut, Cancelled, NoShow];

        for status in all.iter().filter(|status| status.is_terminal()) {
            assert!(all.iter().all(|next| !status.can_transition_to(*next)));
        }
        assert!(!Pending.is_terminal());
    }

    #[test]
    fn test_guest_counts_validation() {
        let family = GuestCounts {
            adults: 2,
            children: 2,
            infants: 1,
            total: 4,
        };
        assert!(family.validate().is_ok());

        let no_adult = GuestCounts {
            adults: 0,
            children: 1,
            infants: 0,
            total: 1,
        };
        assert!(no_adult.validate().is_err());

        let undercounted = GuestCounts {
            adults: 2,
            children: 1,
            infants: 0,
            total: 2,
        };
        assert!(undercounted.validate().is_err());
    }

    #[test]
    fn test_guest_counts_that_overflow_are_rejected() {
        let request: GuestCounts = serde_json::from_str(
            r#"{"adults": 4294967295, "children": 1, "total": 2}"#,
        )
        .unwrap();

        assert!(matches!(request.validate(), Err(BookingError::Validation(_))));
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&CheckedIn).unwrap(), "\"checked_in\"");
        assert_eq!(NoShow.to_string(), "no_show");
    }
}
