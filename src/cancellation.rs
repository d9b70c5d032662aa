// Cancellation policy engine
// Refunds are tiered on hours left until check-in (00:00 UTC of the check-in date)

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::booking::{Actor, ActorRole, Booking, BookingStatus, CancellationRecord, RefundStatus};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::dates::hours_until;
use crate::error::BookingError;
use crate::ledger::{require_accommodation, require_booking};
use crate::model::{CancellationPolicy, PolicyKind};
use crate::notify::{dispatch, Notification, Notifier};
use crate::pricing::round_money;
use crate::store::ReservationStore;

const DEFAULT_REASON: &str = "No reason provided";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationOutcome {
    pub refund_amount: Decimal,
    pub refund_status: RefundStatus,
}

pub fn refund_amount(kind: PolicyKind, total: Decimal, hours_left: f64) -> Decimal {
    let half = total / Decimal::TWO;

    let refund = match kind {
        PolicyKind::Flexible if hours_left > 24.0 => total,
        PolicyKind::Flexible => half,
        PolicyKind::Moderate if hours_left > 120.0 => total,
        PolicyKind::Strict if hours_left > 168.0 => half,
        PolicyKind::Moderate | PolicyKind::Strict | PolicyKind::SuperStrict => Decimal::ZERO,
    };

    round_money(refund)
}

pub fn can_cancel(booking: &Booking, now: DateTime<Utc>, notice_hours: i64) -> bool {
    booking.status == BookingStatus::Confirmed
        && hours_until(booking.check_in, now) > notice_hours as f64
}

// Refund owed if the booking were cancelled at `now`
pub fn evaluate(
    booking: &Booking,
    policy: &CancellationPolicy,
    now: DateTime<Utc>,
    notice_hours: i64,
) -> Result<Decimal, BookingError> {
    if !can_cancel(booking, now, notice_hours) {
        return Err(BookingError::CancellationWindowClosed(
            booking.booking_number.clone(),
        ));
    }

    Ok(refund_amount(
        policy.kind,
        booking.pricing.total,
        hours_until(booking.check_in, now),
    ))
}

pub struct CancellationEngine {
    store: Arc<dyn ReservationStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    notice_hours: i64,
}

impl CancellationEngine {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            clock,
            notifier,
            notice_hours: config.cancellation_notice_hours,
        }
    }

    pub async fn cancel(
        &self,
        booking_id: Uuid,
        actor: &Actor,
        reason: Option<String>,
    ) -> Result<CancellationOutcome, BookingError> {
        let mut booking = require_booking(self.store.as_ref(), booking_id).await?;

        // guests never learn about bookings that are not theirs
        if actor.role == ActorRole::Guest && booking.guest_id != actor.user_id {
            return Err(BookingError::not_found("Booking", booking_id.to_string()));
        }

        let accommodation =
            require_accommodation(self.store.as_ref(), &booking.accommodation_id).await?;

        // hosts only see bookings at their own listings
        if actor.role == ActorRole::Host && accommodation.owner_id != actor.user_id {
            return Err(BookingError::not_found("Booking", booking_id.to_string()));
        }

        let now = self.clock.now();

        let refund = match evaluate(
            &booking,
            &accommodation.cancellation_policy,
            now,
            self.notice_hours,
        ) {
            Ok(refund) => refund,
            Err(e) => {
                warn!(
                    booking_number = %booking.booking_number,
                    status = %booking.status,
                    error = %e,
                    "cancellation refused"
                );
                return Err(e);
            }
        };

        let expected = booking.status;
        booking.cancel(CancellationRecord {
            cancelled_at: now,
            cancelled_by: actor.role,
            reason: reason
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REASON.to_string()),
            refund_amount: refund,
            refund_status: RefundStatus::Pending,
        })?;

        self.store.commit_release(&booking, expected).await?;

        info!(
            booking_number = %booking.booking_number,
            policy = ?accommodation.cancellation_policy.kind,
            refund = %refund,
            "booking cancelled"
        );

        dispatch(self.notifier.as_ref(), Notification::cancellation(&booking)).await;

        Ok(CancellationOutcome {
            refund_amount: refund,
            refund_status: RefundStatus::Pending,
        })
    }
}
