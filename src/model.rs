// Accommodation, room and calendar data structures

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BookingError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accommodation {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub rooms: Vec<Room>,
    pub pricing: AccommodationPricing,
    #[serde(default)]
    pub booking_settings: BookingSettings,
    #[serde(default)]
    pub cancellation_policy: CancellationPolicy,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl Accommodation {
    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == room_id)
    }

    // Checked when a listing is onboarded into the store
    pub fn validate(&self) -> Result<(), BookingError> {
        check_price(self.pricing.base_price, || {
            format!("Base price of accommodation {}", self.id)
        })?;
        for charge in &self.pricing.extra_charges {
            check_price(charge.amount, || format!("Extra charge {}", charge.name))?;
        }

        for (index, room) in self.rooms.iter().enumerate() {
            if self.rooms[..index].iter().any(|other| other.id == room.id) {
                return Err(BookingError::Validation(format!(
                    "Duplicate room id {} in accommodation {}",
                    room.id, self.id
                )));
            }
            room.capacity.validate()?;
            if let Some(price) = room.price {
                check_price(price, || format!("Price of room {}", room.id))?;
            }
        }

        Ok(())
    }
}

// Upper bound for any listed amount; keeps stay totals far inside Decimal range
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

fn check_price(amount: Decimal, label: impl FnOnce() -> String) -> Result<(), BookingError> {
    if amount < Decimal::ZERO || amount > MAX_PRICE {
        return Err(BookingError::Validation(format!(
            "{} must be between 0 and {}",
            label(),
            MAX_PRICE
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccommodationPricing {
    pub base_price: Decimal,
    pub currency: String,
    #[serde(default)]
    pub extra_charges: Vec<ExtraCharge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraCharge {
    pub name: String,
    pub amount: Decimal,
    pub charge_type: ChargeType,
    #[serde(default)]
    pub mandatory: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeType {
    Fixed,
    Percentage,
    PerPerson,
    PerNight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSettings {
    pub instant_book: bool,
    pub min_stay: u32,
    pub max_stay: u32,
    // How many days ahead a check-in may be booked
    pub advance_booking_days: u32,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            instant_book: false,
            min_stay: 1,
            max_stay: 365,
            advance_booking_days: 365,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Flexible,
    #[default]
    Moderate,
    Strict,
    SuperStrict,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationPolicy {
    pub kind: PolicyKind,
    #[serde(default)]
    pub description: Option<String>,
    // Informational deadlines shown to guests; refunds follow the tiers of `kind`
    #[serde(default)]
    pub deadlines: Vec<RefundDeadline>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundDeadline {
    pub days: u32,
    pub refund_percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
    pub capacity: RoomCapacity,
    // Overrides the accommodation base price when set
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl Room {
    pub fn effective_price(&self, accommodation: &Accommodation) -> Decimal {
        self.price.unwrap_or(accommodation.pricing.base_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCapacity {
    pub adults: u32,
    pub children: u32,
    pub total: u32,
}

impl RoomCapacity {
    pub fn new(adults: u32, children: u32, total: u32) -> Result<Self, BookingError> {
        let capacity = Self {
            adults,
            children,
            total,
        };
        capacity.validate()?;
        Ok(capacity)
    }

    pub fn validate(&self) -> Result<(), BookingError> {
        let seated = self.adults.checked_add(self.children);
        if self.total == 0 || seated.map_or(true, |seated| self.total < seated) {
            return Err(BookingError::Validation(format!(
                "Room capacity total {} must be at least 1 and cover {} adults + {} children",
                self.total, self.adults, self.children
            )));
        }
        Ok(())
    }
}

// One calendar cell of a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRecord {
    pub available: bool,
    #[serde(default)]
    pub price_override: Option<Decimal>,
    pub min_stay: u32,
    // Booking whose hold closed this cell
    #[serde(default)]
    pub held_by: Option<Uuid>,
}

impl Default for AvailabilityRecord {
    fn default() -> Self {
        Self {
            available: true,
            price_override: None,
            min_stay: 1,
            held_by: None,
        }
    }
}

impl AvailabilityRecord {
    // Host-side closure not tied to any booking
    pub fn blocked() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }
}

pub fn primary_image(accommodation: &Accommodation) -> Option<&str> {
    accommodation
        .images
        .iter()
        .find(|image| image.is_primary)
        .or_else(|| accommodation.images.first())
        .map(|image| image.url.as_str())
}

pub fn average_price(accommodation: &Accommodation) -> Decimal {
    if accommodation.rooms.is_empty() {
        return accommodation.pricing.base_price;
    }

    let total: Decimal = accommodation
        .rooms
        .iter()
        .map(|room| room.effective_price(accommodation))
        .sum();

    total / Decimal::from(accommodation.rooms.len())
}


#[cfg(test)]
mod tests {
    use super::fixtures::{accommodation, room};
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_capacity_invariant_enforced() {
        assert!(RoomCapacity::new(2, 1, 3).is_ok());
        assert!(RoomCapacity::new(2, 2, 5).is_ok());
        assert!(matches!(
            RoomCapacity::new(2, 2, 3),
            Err(BookingError::Validation(_))
        ));
        assert!(RoomCapacity::new(0, 0, 0).is_err());
    }

    #[test]
    fn test_capacity_overflow_is_rejected() {
        assert!(matches!(
            RoomCapacity::new(u32::MAX, 1, 3),
            Err(BookingError::Validation(_))
        ));

        let mut listing = accommodation("acc-1", vec![room("r1", 2)]);
        listing.rooms[0].capacity.adults = u32::MAX;
        listing.rooms[0].capacity.children = 1;
        assert!(listing.validate().is_err());
    }

    #[test]
    fn test_prices_above_ceiling_are_rejected() {
        let mut base = accommodation("acc-1", vec![room("r1", 2)]);
        base.pricing.base_price = Decimal::MAX;
        assert!(matches!(base.validate(), Err(BookingError::Validation(_))));

        let mut room_price = accommodation("acc-1", vec![room("r1", 2)]);
        room_price.rooms[0].price = Some(MAX_PRICE + Decimal::ONE);
        assert!(room_price.validate().is_err());

        let mut charge = accommodation("acc-1", vec![room("r1", 2)]);
        charge.pricing.extra_charges = vec![ExtraCharge {
            name: "cleaning".to_string(),
            amount: Decimal::MAX,
            charge_type: ChargeType::PerNight,
            mandatory: true,
        }];
        assert!(charge.validate().is_err());

        let mut at_ceiling = accommodation("acc-1", vec![room("r1", 2)]);
        at_ceiling.pricing.base_price = MAX_PRICE;
        assert!(at_ceiling.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_rooms_and_bad_prices() {
        let valid = accommodation("acc-1", vec![room("r1", 2), room("r2", 4)]);
        assert!(valid.validate().is_ok());

        let duplicated = accommodation("acc-1", vec![room("r1", 2), room("r1", 4)]);
        assert!(duplicated.validate().is_err());

        let mut negative = accommodation("acc-1", vec![room("r1", 2)]);
        negative.rooms[0].price = Some(dec!(-5));
        assert!(negative.validate().is_err());

        let mut bad_capacity = accommodation("acc-1", vec![room("r1", 2)]);
        bad_capacity.rooms[0].capacity.children = 3;
        assert!(bad_capacity.validate().is_err());
    }

    #[test]
    fn test_primary_image_falls_back_to_first() {
        let mut listing = accommodation("acc-1", vec![]);
        assert_eq!(primary_image(&listing), None);

        listing.images = vec![
            Image {
                url: "front.jpg".to_string(),
                caption: None,
                is_primary: false,
                order: 0,
            },
            Image {
                url: "pool.jpg".to_string(),
                caption: Some("Pool".to_string()),
                is_primary: true,
                order: 1,
            },
        ];
        assert_eq!(primary_image(&listing), Some("pool.jpg"));

        listing.images[1].is_primary = false;
        assert_eq!(primary_image(&listing), Some("front.jpg"));
    }

    #[test]
    fn test_average_price_uses_room_overrides() {
        let mut listing = accommodation("acc-1", vec![]);
        assert_eq!(average_price(&listing), dec!(1000));

        let mut suite = room("suite", 4);
        suite.price = Some(dec!(2000));
        listing.rooms = vec![room("r1", 2), suite];
        assert_eq!(average_price(&listing), dec!(1500));
    }

    #[test]
    fn test_accommodation_json_shape() {
        let json = r#"{
            "id": "acc-9",
            "name": "Hill Cabin",
            "ownerId": "host-3",
            "rooms": [{"id": "r1", "name": "Loft", "capacity": {"adults": 2, "children": 1, "total": 3}, "price": "150.00"}],
            "pricing": {"basePrice": "120", "currency": "EUR", "extraCharges": [
                {"name": "cleaning", "amount": "40", "chargeType": "fixed", "mandatory": true}
            ]},
            "bookingSettings": {"instantBook": true, "minStay": 2, "maxStay": 30, "advanceBookingDays": 180},
            "cancellationPolicy": {"kind": "super_strict"}
        }"#;

        let listing: Accommodation = serde_json::from_str(json).unwrap();

        assert_eq!(listing.rooms[0].price, Some(dec!(150.00)));
        assert_eq!(listing.pricing.extra_charges[0].charge_type, ChargeType::Fixed);
        assert!(listing.booking_settings.instant_book);
        assert_eq!(listing.cancellation_policy.kind, PolicyKind::SuperStrict);
        assert!(listing.images.is_empty());
        assert!(listing.validate().is_ok());
    }
}
