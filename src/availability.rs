// Availability resolution: which rooms are free for every night of a stay

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::try_join_all;
use tracing::debug;

use crate::dates::stay_nights;
use crate::error::BookingError;
use crate::model::Room;
use crate::store::{ReservationStore, RoomCalendar};

// Earliest night of the stay with a closed record; missing records count as open
pub fn first_closed_night(calendar: &RoomCalendar, nights: &[NaiveDate]) -> Option<NaiveDate> {
    nights
        .iter()
        .copied()
        .find(|night| calendar.get(night).map_or(false, |record| !record.available))
}

pub fn nights_are_open(calendar: &RoomCalendar, nights: &[NaiveDate]) -> bool {
    first_closed_night(calendar, nights).is_none()
}

pub struct AvailabilityResolver {
    store: Arc<dyn ReservationStore>,
}

impl AvailabilityResolver {
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        Self { store }
    }

    // Read-only; returns the subset of `rooms` that sleeps `guests` and is open on every night
    pub async fn resolve(
        &self,
        accommodation_id: &str,
        rooms: &[Room],
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: u32,
    ) -> Result<Vec<Room>, BookingError> {
        let nights = stay_nights(check_in, check_out)?;
        if guests == 0 {
            return Err(BookingError::Validation(
                "Guest count must be positive".to_string(),
            ));
        }

        let candidates: Vec<&Room> = rooms
            .iter()
            .filter(|room| room.capacity.total >= guests)
            .collect();

        let calendars = try_join_all(candidates.iter().map(|room| {
            self.store
                .calendar(accommodation_id, &room.id, check_in, check_out)
        }))
        .await?;

        let eligible: Vec<Room> = candidates
            .into_iter()
            .zip(calendars.iter())
            .filter(|(_, calendar)| nights_are_open(calendar, &nights))
            .map(|(room, _)| room.clone())
            .collect();

        debug!(
            accommodation_id,
            %check_in,
            %check_out,
            guests,
            eligible = eligible.len(),
            considered = rooms.len(),
            "availability resolved"
        );

        Ok(eligible)
    }

    // Single-room check used when booking; names the night that blocks the stay
    pub async fn first_conflict(
        &self,
        accommodation_id: &str,
        room_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Option<NaiveDate>, BookingError> {
        let nights = stay_nights(check_in, check_out)?;
        let calendar = self
            .store
            .calendar(accommodation_id, room_id, check_in, check_out)
            .await?;

        Ok(first_closed_night(&calendar, &nights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::room;
    use crate::model::AvailabilityRecord;
    use crate::store::InMemoryStore;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn ids(rooms: &[Room]) -> Vec<&str> {
        rooms.iter().map(|room| room.id.as_str()).collect()
    }

    async fn block(store: &InMemoryStore, room_id: &str, day: u32) {
        store
            .set_availability("acc-1", room_id, date(day), AvailabilityRecord::blocked())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_open_world_default() {
        let store = Arc::new(InMemoryStore::new());
        let resolver = AvailabilityResolver::new(store);
        let rooms = vec![room("r1", 2), room("r2", 4)];

        let eligible = resolver
            .resolve("acc-1", &rooms, date(1), date(5), 2)
            .await
            .unwrap();

        assert_eq!(ids(&eligible), vec!["r1", "r2"]);
    }

    #[tokio::test]
    async fn test_capacity_filters_rooms() {
        let resolver = AvailabilityResolver::new(Arc::new(InMemoryStore::new()));
        let rooms = vec![room("r1", 2), room("r2", 4)];

        let eligible = resolver
            .resolve("acc-1", &rooms, date(1), date(5), 3)
            .await
            .unwrap();
        assert_eq!(ids(&eligible), vec!["r2"]);

        let none = resolver
            .resolve("acc-1", &rooms, date(1), date(5), 5)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_any_closed_night_excludes_room() {
        let store = Arc::new(InMemoryStore::new());
        block(&store, "r1", 3).await;
        let resolver = AvailabilityResolver::new(store);
        let rooms = vec![room("r1", 2), room("r2", 2)];

        let eligible = resolver
            .resolve("acc-1", &rooms, date(1), date(5), 1)
            .await
            .unwrap();

        assert_eq!(ids(&eligible), vec!["r2"]);
    }

    #[tokio::test]
    async fn test_checkout_day_need_not_be_free() {
        let store = Arc::new(InMemoryStore::new());
        block(&store, "r1", 5).await;
        let resolver = AvailabilityResolver::new(store);
        let rooms = vec![room("r1", 2)];

        let eligible = resolver
            .resolve("acc-1", &rooms, date(1), date(5), 2)
            .await
            .unwrap();
        assert_eq!(ids(&eligible), vec!["r1"]);

        let arriving_on_blocked_day = resolver
            .resolve("acc-1", &rooms, date(5), date(7), 2)
            .await
            .unwrap();
        assert!(arriving_on_blocked_day.is_empty());
    }

    #[tokio::test]
    async fn test_reopened_record_counts_as_available() {
        let store = Arc::new(InMemoryStore::new());
        block(&store, "r1", 2).await;
        store
            .set_availability("acc-1", "r1", date(2), AvailabilityRecord::default())
            .await
            .unwrap();
        let resolver = AvailabilityResolver::new(store);

        let eligible = resolver
            .resolve("acc-1", &[room("r1", 2)], date(1), date(3), 2)
            .await
            .unwrap();

        assert_eq!(eligible.len(), 1);
    }

    #[tokio::test]
    async fn test_first_conflict_names_earliest_closed_night() {
        let store = Arc::new(InMemoryStore::new());
        block(&store, "r1", 4).await;
        block(&store, "r1", 6).await;
        let resolver = AvailabilityResolver::new(store);

        let conflict = resolver
            .first_conflict("acc-1", "r1", date(2), date(8))
            .await
            .unwrap();
        assert_eq!(conflict, Some(date(4)));

        let clear = resolver
            .first_conflict("acc-1", "r1", date(1), date(4))
            .await
            .unwrap();
        assert_eq!(clear, None);
    }

    #[tokio::test]
    async fn test_invalid_inputs_rejected() {
        let resolver = AvailabilityResolver::new(Arc::new(InMemoryStore::new()));
        let rooms = vec![room("r1", 2)];

        let inverted = resolver.resolve("acc-1", &rooms, date(5), date(1), 2).await;
        assert!(matches!(inverted, Err(BookingError::InvalidRange { .. })));

        let same_day = resolver.resolve("acc-1", &rooms, date(5), date(5), 2).await;
        assert!(matches!(same_day, Err(BookingError::InvalidRange { .. })));

        let nobody = resolver.resolve("acc-1", &rooms, date(1), date(5), 0).await;
        assert!(matches!(nobody, Err(BookingError::Validation(_))));
    }
}
