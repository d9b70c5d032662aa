// Persistence boundary of the reservation engine
// Calendars are addressed per (accommodation, room, date) cell; holds and releases are
// conditional multi-cell transactions that also write the booking row

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus};
use crate::dates::stay_nights;
use crate::error::BookingError;
use crate::model::{Accommodation, AvailabilityRecord};

pub type RoomCalendar = BTreeMap<NaiveDate, AvailabilityRecord>;

#[async_trait]
pub trait ReservationStore: Send + Sync + 'static {
    async fn accommodation(&self, id: &str) -> Result<Option<Accommodation>, BookingError>;

    // Records of the room for dates in [from, to); absent dates have no record
    async fn calendar(
        &self,
        accommodation_id: &str,
        room_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<RoomCalendar, BookingError>;

    // Host edit of a single cell (block a date, set a price override or min stay)
    // Fails with CellHeld when the cell belongs to an active booking
    async fn set_availability(
        &self,
        accommodation_id: &str,
        room_id: &str,
        date: NaiveDate,
        record: AvailabilityRecord,
    ) -> Result<(), BookingError>;

    async fn booking(&self, id: Uuid) -> Result<Option<Booking>, BookingError>;

    async fn booking_by_number(&self, number: &str) -> Result<Option<Booking>, BookingError>;

    async fn bookings_for_guest(&self, guest_id: &str) -> Result<Vec<Booking>, BookingError>;

    // Atomically: every night of the booking must be free, the booking row is inserted and
    // every night is marked held by it. Either all of it happens or none of it
    async fn commit_hold(&self, booking: &Booking) -> Result<(), BookingError>;

    // Atomically: the stored booking must still be in `expected` status, the updated row is
    // written and every night held by the booking is reopened. Repeating it is a no-op on the calendar
    async fn commit_release(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<(), BookingError>;

    // Conditional rewrite of a booking row that does not touch the calendar
    async fn update_booking(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<(), BookingError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CalendarKey {
    accommodation_id: String,
    room_id: String,
}

impl CalendarKey {
    fn new(accommodation_id: &str, room_id: &str) -> Self {
        Self {
            accommodation_id: accommodation_id.to_string(),
            room_id: room_id.to_string(),
        }
    }
}

// In-process store; every room calendar sits behind its own mutex so that the
// check-then-write of a hold or release is exclusive per room
#[derive(Default)]
pub struct InMemoryStore {
    accommodations: DashMap<String, Accommodation>,
    calendars: DashMap<CalendarKey, Arc<Mutex<RoomCalendar>>>,
    bookings: DashMap<Uuid, Booking>,
    booking_numbers: DashMap<String, Uuid>,
    fail_next_commits: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Host onboarding and admin edits happen outside the engine; this is their entry point
    pub fn insert_accommodation(&self, accommodation: Accommodation) -> Result<(), BookingError> {
        accommodation.validate()?;
        self.accommodations
            .insert(accommodation.id.clone(), accommodation);
        Ok(())
    }

    // Makes the next `count` hold/release/update commits fail as if storage were down
    pub fn fail_next_commits(&self, count: usize) {
        self.fail_next_commits.store(count, Ordering::SeqCst);
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    fn room_calendar(&self, accommodation_id: &str, room_id: &str) -> Arc<Mutex<RoomCalendar>> {
        let calendar = self
            .calendars
            .entry(CalendarKey::new(accommodation_id, room_id))
            .or_default();
        Arc::clone(calendar.value())
    }

    fn injected_failure(&self) -> Result<(), BookingError> {
        let remaining = self
            .fail_next_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));

        if remaining.is_ok() {
            return Err(BookingError::StorageUnavailable(
                "injected storage failure".to_string(),
            ));
        }
        Ok(())
    }

    fn check_expected_status(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<(), BookingError> {
        let stored = self
            .bookings
            .get(&booking.id)
            .ok_or_else(|| BookingError::not_found("Booking", booking.id.to_string()))?;

        if stored.status != expected {
            return Err(BookingError::ConcurrentModification(
                booking.booking_number.clone(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for InMemoryStore {
    async fn accommodation(&self, id: &str) -> Result<Option<Accommodation>, BookingError> {
        Ok(self.accommodations.get(id).map(|entry| entry.value().clone()))
    }

    async fn calendar(
        &self,
        accommodation_id: &str,
        room_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<RoomCalendar, BookingError> {
        let key = CalendarKey::new(accommodation_id, room_id);
        let calendar = match self.calendars.get(&key) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Ok(RoomCalendar::new()),
        };

        let cells = calendar.lock();
        Ok(cells
            .range(from..to)
            .map(|(date, record)| (*date, record.clone()))
            .collect())
    }

    async fn set_availability(
        &self,
        accommodation_id: &str,
        room_id: &str,
        date: NaiveDate,
        record: AvailabilityRecord,
    ) -> Result<(), BookingError> {
        let calendar = self.room_calendar(accommodation_id, room_id);
        let mut cells = calendar.lock();

        if cells
            .get(&date)
            .map_or(false, |current| current.held_by.is_some())
        {
            return Err(BookingError::CellHeld {
                room_id: room_id.to_string(),
                date,
            });
        }

        cells.insert(
            date,
            AvailabilityRecord {
                held_by: None,
                ..record
            },
        );
        Ok(())
    }

    async fn booking(&self, id: Uuid) -> Result<Option<Booking>, BookingError> {
        Ok(self.bookings.get(&id).map(|entry| entry.value().clone()))
    }

    async fn booking_by_number(&self, number: &str) -> Result<Option<Booking>, BookingError> {
        let id = match self.booking_numbers.get(number) {
            Some(entry) => *entry.value(),
            None => return Ok(None),
        };
        self.booking(id).await
    }

    async fn bookings_for_guest(&self, guest_id: &str) -> Result<Vec<Booking>, BookingError> {
        Ok(self
            .bookings
            .iter()
            .filter(|entry| entry.guest_id == guest_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn commit_hold(&self, booking: &Booking) -> Result<(), BookingError> {
        let nights = stay_nights(booking.check_in, booking.check_out)?;
        self.injected_failure()?;

        let calendar = self.room_calendar(&booking.accommodation_id, &booking.room_id);
        let mut cells = calendar.lock();

        let taken = nights
            .iter()
            .copied()
            .find(|night| cells.get(night).map_or(false, |record| !record.available));
        if let Some(night) = taken {
            warn!(
                booking_number = %booking.booking_number,
                room_id = %booking.room_id,
                night = %night,
                "hold rejected, night already closed"
            );
            return Err(BookingError::RoomUnavailable {
                room_id: booking.room_id.clone(),
                date: night,
            });
        }

        match self.booking_numbers.entry(booking.booking_number.clone()) {
            Entry::Occupied(_) => {
                return Err(BookingError::DuplicateBookingNumber(
                    booking.booking_number.clone(),
                ))
            }
            Entry::Vacant(slot) => {
                slot.insert(booking.id);
            }
        }
        self.bookings.insert(booking.id, booking.clone());

        for night in nights {
            let record = cells.entry(night).or_default();
            record.available = false;
            record.held_by = Some(booking.id);
        }

        debug!(booking_number = %booking.booking_number, "hold committed");
        Ok(())
    }

    async fn commit_release(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<(), BookingError> {
        let nights = stay_nights(booking.check_in, booking.check_out)?;
        self.injected_failure()?;

        let calendar = self.room_calendar(&booking.accommodation_id, &booking.room_id);
        let mut cells = calendar.lock();

        self.check_expected_status(booking, expected)?;
        self.bookings.insert(booking.id, booking.clone());

        let mut reopened = 0;
        for night in nights {
            if let Some(record) = cells.get_mut(&night) {
                if record.held_by == Some(booking.id) {
                    record.available = true;
                    record.held_by = None;
                    reopened += 1;
                }
            }
        }

        debug!(booking_number = %booking.booking_number, reopened, "release committed");
        Ok(())
    }

    async fn update_booking(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<(), BookingError> {
        self.injected_failure()?;

        let calendar = self.room_calendar(&booking.accommodation_id, &booking.room_id);
        let _cells = calendar.lock();

        self.check_expected_status(booking, expected)?;
        self.bookings.insert(booking.id, booking.clone());
        Ok(())
    }
}
