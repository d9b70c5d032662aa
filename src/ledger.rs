// Reservation ledger: availability queries, booking creation and booking lifecycle
// Creation resolves availability, prices the stay and commits booking row + calendar hold as one unit

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::availability::AvailabilityResolver;
use crate::booking::{
    Booking, BookingStatus, GuestContext, GuestCounts, GuestDetails, Payment, PaymentMethod,
    PaymentStatus,
};
use crate::booking_number::BookingNumberGenerator;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::dates::{add_days, check_in_instant, days_between, night_count};
use crate::error::BookingError;
use crate::model::{Accommodation, BookingSettings, Room};
use crate::notify::{dispatch, Notification, Notifier};
use crate::pricing::{PricingCalculator, RoomQuote};
use crate::store::ReservationStore;

// Everything a guest supplies when booking a room
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub accommodation_id: String,
    pub room_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: GuestCounts,
    pub guest_details: Option<GuestDetails>,
    pub special_requests: Vec<String>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    pub available: bool,
    pub rooms: Vec<Room>,
    pub pricing: Vec<RoomQuote>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: u32,
    pub guests: u32,
}

// Position of a stay relative to now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Upcoming,
    Current,
    Past,
}

pub(crate) async fn require_accommodation(
    store: &dyn ReservationStore,
    id: &str,
) -> Result<Accommodation, BookingError> {
    store
        .accommodation(id)
        .await?
        .ok_or_else(|| BookingError::not_found("Accommodation", id))
}

pub(crate) async fn require_booking(
    store: &dyn ReservationStore,
    id: Uuid,
) -> Result<Booking, BookingError> {
    store
        .booking(id)
        .await?
        .ok_or_else(|| BookingError::not_found("Booking", id.to_string()))
}

pub struct ReservationLedger {
    store: Arc<dyn ReservationStore>,
    resolver: AvailabilityResolver,
    pricing: PricingCalculator,
    numbers: BookingNumberGenerator,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    enforce_stay_rules: bool,
}

impl ReservationLedger {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            resolver: AvailabilityResolver::new(Arc::clone(&store)),
            store,
            pricing: PricingCalculator::new(config),
            numbers: BookingNumberGenerator::from_entropy(
                config.booking_number_prefix.clone(),
                Arc::clone(&clock),
            ),
            clock,
            notifier,
            enforce_stay_rules: config.enforce_stay_rules,
        }
    }

    // Swap in a deterministic generator
    pub fn with_booking_numbers(mut self, numbers: BookingNumberGenerator) -> Self {
        self.numbers = numbers;
        self
    }

    pub async fn availability(
        &self,
        accommodation_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: u32,
    ) -> Result<AvailabilityReport, BookingError> {
        let nights = night_count(check_in, check_out)?;
        let accommodation = require_accommodation(self.store.as_ref(), accommodation_id).await?;

        let rooms = self
            .resolver
            .resolve(accommodation_id, &accommodation.rooms, check_in, check_out, guests)
            .await?;
        let pricing = rooms
            .iter()
            .map(|room| self.pricing.quote(&accommodation, room, nights))
            .collect();

        Ok(AvailabilityReport {
            available: !rooms.is_empty(),
            rooms,
            pricing,
            check_in,
            check_out,
            nights,
            guests,
        })
    }

    pub async fn create(
        &self,
        guest: &GuestContext,
        request: NewBooking,
    ) -> Result<Booking, BookingError> {
        request.guests.validate()?;
        let nights = night_count(request.check_in, request.check_out)?;

        let accommodation =
            require_accommodation(self.store.as_ref(), &request.accommodation_id).await?;
        let room = accommodation
            .room(&request.room_id)
            .ok_or_else(|| BookingError::not_found("Room", request.room_id.clone()))?;

        if self.enforce_stay_rules {
            self.check_stay_rules(&accommodation, room, &request, nights)
                .await?;
        }

        if request.guests.total > room.capacity.total {
            return Err(BookingError::CapacityExceeded {
                room_id: room.id.clone(),
                capacity: room.capacity.total,
                requested: request.guests.total,
            });
        }

        let conflict = self
            .resolver
            .first_conflict(
                &accommodation.id,
                &room.id,
                request.check_in,
                request.check_out,
            )
            .await?;
        if let Some(night) = conflict {
            warn!(
                accommodation_id = %accommodation.id,
                room_id = %room.id,
                check_in = %request.check_in,
                check_out = %request.check_out,
                night = %night,
                "room unavailable"
            );
            return Err(BookingError::RoomUnavailable {
                room_id: room.id.clone(),
                date: night,
            });
        }

        let pricing =
            self.pricing
                .price_for_guests(&accommodation, room, nights, request.guests.total);
        let status = if accommodation.booking_settings.instant_book {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        };

        let booking = Booking {
            id: Uuid::new_v4(),
            booking_number: self.numbers.generate(),
            guest_id: guest.guest_id.clone(),
            accommodation_id: accommodation.id.clone(),
            room_id: room.id.clone(),
            check_in: request.check_in,
            check_out: request.check_out,
            nights,
            guests: request.guests,
            guest_details: request.guest_details,
            special_requests: request.special_requests,
            pricing,
            payment: Payment {
                method: request.payment_method,
                status: PaymentStatus::Pending,
            },
            status,
            cancellation: None,
            created_at: self.clock.now(),
        };

        self.store.commit_hold(&booking).await?;

        info!(
            booking_number = %booking.booking_number,
            accommodation_id = %booking.accommodation_id,
            room_id = %booking.room_id,
            status = %booking.status,
            total = %booking.pricing.total,
            "booking created"
        );

        dispatch(
            self.notifier.as_ref(),
            Notification::confirmation(&booking, &accommodation.name, guest.email.as_deref()),
        )
        .await;

        Ok(booking)
    }

    pub async fn booking(&self, id: Uuid) -> Result<Booking, BookingError> {
        require_booking(self.store.as_ref(), id).await
    }

    pub async fn booking_by_number(&self, number: &str) -> Result<Booking, BookingError> {
        self.store
            .booking_by_number(number)
            .await?
            .ok_or_else(|| BookingError::not_found("Booking", number))
    }

    // Newest first
    pub async fn bookings_for_guest(
        &self,
        guest_id: &str,
        status: Option<BookingStatus>,
        timeframe: Option<Timeframe>,
    ) -> Result<Vec<Booking>, BookingError> {
        let now = self.clock.now();

        let mut bookings: Vec<Booking> = self
            .store
            .bookings_for_guest(guest_id)
            .await?
            .into_iter()
            .filter(|booking| status.map_or(true, |wanted| booking.status == wanted))
            .filter(|booking| {
                let starts = check_in_instant(booking.check_in);
                let ends = check_in_instant(booking.check_out);
                match timeframe {
                    None => true,
                    Some(Timeframe::Upcoming) => starts > now,
                    Some(Timeframe::Current) => starts <= now && ends > now,
                    Some(Timeframe::Past) => ends < now,
                }
            })
            .collect();

        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    // Confirmation, check-in, check-out and no-show; cancellation goes through the cancellation engine
    pub async fn transition(
        &self,
        booking_id: Uuid,
        next: BookingStatus,
    ) -> Result<Booking, BookingError> {
        let mut booking = self.booking(booking_id).await?;
        let current = booking.status;

        if next == BookingStatus::Cancelled {
            return Err(BookingError::InvalidTransition {
                from: current.to_string(),
                to: next.to_string(),
            });
        }

        booking.transition_to(next)?;
        self.store.update_booking(&booking, current).await?;

        info!(
            booking_number = %booking.booking_number,
            from = %current,
            to = %next,
            "booking status changed"
        );
        Ok(booking)
    }

    async fn check_stay_rules(
        &self,
        accommodation: &Accommodation,
        room: &Room,
        request: &NewBooking,
        nights: u32,
    ) -> Result<(), BookingError> {
        let today = self.clock.now().date_naive();
        check_settings(&accommodation.booking_settings, request.check_in, nights, today)?;

        let first_night = self
            .store
            .calendar(
                &accommodation.id,
                &room.id,
                request.check_in,
                add_days(request.check_in, 1),
            )
            .await?;
        if let Some(record) = first_night.get(&request.check_in) {
            if nights < record.min_stay {
                return Err(BookingError::Validation(format!(
                    "Stays starting {} must be at least {} nights",
                    request.check_in, record.min_stay
                )));
            }
        }

        Ok(())
    }
}

fn check_settings(
    settings: &BookingSettings,
    check_in: NaiveDate,
    nights: u32,
    today: NaiveDate,
) -> Result<(), BookingError> {
    if check_in < today {
        return Err(BookingError::Validation(format!(
            "Check-in date {} is in the past",
            check_in
        )));
    }
    if nights < settings.min_stay {
        return Err(BookingError::Validation(format!(
            "Minimum stay is {} nights",
            settings.min_stay
        )));
    }
    if nights > settings.max_stay {
        return Err(BookingError::Validation(format!(
            "Maximum stay is {} nights",
            settings.max_stay
        )));
    }
    if days_between(today, check_in) > i64::from(settings.advance_booking_days) {
        return Err(BookingError::Validation(format!(
            "Bookings open {} days in advance",
            settings.advance_booking_days
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::fixtures::{accommodation, room};
    use crate::notify::RecordingNotifier;
    use crate::store::InMemoryStore;
    use chrono::{DateTime, TimeZone, Utc};

    pub(crate) fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    pub(crate) fn may_first_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
    }

    pub(crate) fn guest() -> GuestContext {
        GuestContext {
            guest_id: "guest-1".to_string(),
            email: Some("guest@example.com".to_string()),
        }
    }

    pub(crate) fn stay(room_id: &str, check_in: NaiveDate, check_out: NaiveDate, total: u32) -> NewBooking {
        NewBooking {
            accommodation_id: "acc-1".to_string(),
            room_id: room_id.to_string(),
            check_in,
            check_out,
            guests: GuestCounts {
                adults: total,
                children: 0,
                infants: 0,
                total,
            },
            guest_details: None,
            special_requests: Vec::new(),
            payment_method: PaymentMethod::CreditCard,
        }
    }

    pub(crate) struct Harness {
        pub store: Arc<InMemoryStore>,
        pub clock: Arc<FixedClock>,
        pub notifier: Arc<RecordingNotifier>,
        pub ledger: ReservationLedger,
    }

    // acc-1: instant book, base price 1000, rooms r1 (sleeps 2) and r2 (sleeps 4)
    pub(crate) fn harness() -> Harness {
        harness_with_notifier(RecordingNotifier::new())
    }

    pub(crate) fn harness_with_notifier(notifier: RecordingNotifier) -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let mut listing = accommodation("acc-1", vec![room("r1", 2), room("r2", 4)]);
        listing.booking_settings.instant_book = true;
        store.insert_accommodation(listing).unwrap();

        let clock = Arc::new(FixedClock::new(may_first_noon()));
        let notifier = Arc::new(notifier);
        let ledger = ReservationLedger::new(
            store.clone(),
            clock.clone(),
            notifier.clone(),
            &EngineConfig::default(),
        );

        Harness {
            store,
            clock,
            notifier,
            ledger,
        }
    }
}
