// Engine configuration options

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    // Fraction of the subtotal charged as service fee
    pub service_fee_rate: Decimal,
    // Fraction of the subtotal charged as tax
    pub tax_rate: Decimal,
    pub tax_name: String,
    // Bookings can only be cancelled while check-in is more than this many hours away
    pub cancellation_notice_hours: i64,
    pub booking_number_prefix: String,
    // Apply min/max stay and advance-booking limits from the accommodation settings
    pub enforce_stay_rules: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            service_fee_rate: dec!(0.10),
            tax_rate: dec!(0.08),
            tax_name: "Tax".to_string(),
            cancellation_notice_hours: 24,
            booking_number_prefix: "BK".to_string(),
            enforce_stay_rules: true,
        }
    }
}
