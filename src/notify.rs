// Outbound notifications sent after a booking is created or cancelled
// Delivery is fire-and-forget: a failed send is logged and never undoes the booking

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::booking::Booking;
use crate::error::NotificationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    BookingCreated,
    BookingCancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub booking_number: String,
    pub recipient: Option<String>,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn confirmation(booking: &Booking, accommodation_name: &str, fallback_email: Option<&str>) -> Self {
        let body = format!(
            "Your booking has been {}!\nBooking Number: {}\nAccommodation: {}\nCheck-in: {}\nCheck-out: {}\nTotal: {} {}",
            booking.status,
            booking.booking_number,
            accommodation_name,
            booking.check_in,
            booking.check_out,
            booking.pricing.currency,
            booking.pricing.total,
        );

        Self {
            kind: NotificationKind::BookingCreated,
            booking_number: booking.booking_number.clone(),
            recipient: recipient(booking, fallback_email),
            subject: "Booking Confirmation".to_string(),
            body,
        }
    }

    pub fn cancellation(booking: &Booking) -> Self {
        let refund = booking
            .cancellation
            .as_ref()
            .map(|record| record.refund_amount)
            .unwrap_or_default();

        Self {
            kind: NotificationKind::BookingCancelled,
            booking_number: booking.booking_number.clone(),
            recipient: recipient(booking, None),
            subject: "Booking Cancelled".to_string(),
            body: format!(
                "Booking {} has been cancelled.\nRefund: {} {}",
                booking.booking_number, booking.pricing.currency, refund
            ),
        }
    }
}

fn recipient(booking: &Booking, fallback_email: Option<&str>) -> Option<String> {
    booking
        .guest_details
        .as_ref()
        .map(|details| details.primary_guest.email.clone())
        .filter(|email| !email.is_empty())
        .or_else(|| fallback_email.map(str::to_string))
}

#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError>;
}

// Dispatches and swallows failures
pub async fn dispatch(notifier: &dyn Notifier, notification: Notification) {
    let booking_number = notification.booking_number.clone();
    if let Err(e) = notifier.send(notification).await {
        warn!(booking_number = %booking_number, error = %e, "notification failed");
    }
}

// Writes notifications to the log instead of delivering them
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        let recipient = notification
            .recipient
            .ok_or_else(|| NotificationError::MissingRecipient(notification.booking_number.clone()))?;

        info!(
            to = %recipient,
            booking_number = %notification.booking_number,
            subject = %notification.subject,
            "notification sent"
        );
        Ok(())
    }
}

// Keeps every notification in memory; can be told to fail
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        self.sent.lock().push(notification);
        if self.fail {
            return Err(NotificationError::DeliveryFailed(
                "mail relay unreachable".to_string(),
            ));
        }
        Ok(())
    }
}
