// Reservation and availability engine for accommodation bookings

pub mod api;
pub mod availability;
pub mod booking;
pub mod booking_number;
pub mod cancellation;
pub mod clock;
pub mod config;
pub mod dates;
pub mod error;
pub mod ledger;
pub mod model;
pub mod notify;
pub mod pricing;
pub mod store;

// Re-export key types for convenience
pub use api::{
    AvailabilityRequest, BookingApi, BookingService, CancelBookingRequest, CreateBookingRequest,
    CreateBookingResponse,
};
pub use availability::AvailabilityResolver;
pub use booking::{
    Actor, ActorRole, Booking, BookingStatus, GuestContext, GuestCounts, GuestDetails,
    PricingBreakdown,
};
pub use booking_number::BookingNumberGenerator;
pub use cancellation::{CancellationEngine, CancellationOutcome};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use error::{BookingError, ErrorBody, ErrorKind};
pub use ledger::{AvailabilityReport, NewBooking, ReservationLedger, Timeframe};
pub use model::{Accommodation, AvailabilityRecord, PolicyKind, Room, RoomCapacity};
pub use notify::{LogNotifier, Notification, Notifier, RecordingNotifier};
pub use pricing::{PricingCalculator, RoomQuote};
pub use store::{InMemoryStore, ReservationStore};
