// Stay pricing: subtotal, fees, taxes and total
// Every line is rounded to cents (half-up) before it is summed into the total

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::booking::{Fee, FeeType, PricingBreakdown, Tax};
use crate::config::EngineConfig;
use crate::model::{Accommodation, ChargeType, ExtraCharge, Room, RoomCapacity};

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// Per-room price summary returned by availability queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomQuote {
    pub room_id: String,
    pub room_name: String,
    pub base_price: Decimal,
    pub total_price: Decimal,
    pub nights: u32,
    pub capacity: RoomCapacity,
}

#[derive(Debug, Clone)]
pub struct PricingCalculator {
    service_fee_rate: Decimal,
    tax_rate: Decimal,
    tax_name: String,
}

impl PricingCalculator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            service_fee_rate: config.service_fee_rate,
            tax_rate: config.tax_rate,
            tax_name: config.tax_name.clone(),
        }
    }

    pub fn price(&self, accommodation: &Accommodation, room: &Room, nights: u32) -> PricingBreakdown {
        self.price_for_guests(accommodation, room, nights, 1)
    }

    pub fn price_for_guests(
        &self,
        accommodation: &Accommodation,
        room: &Room,
        nights: u32,
        guests: u32,
    ) -> PricingBreakdown {
        let base_price = room.effective_price(accommodation);
        let subtotal = round_money(base_price * Decimal::from(nights));

        let mut fees: Vec<Fee> = accommodation
            .pricing
            .extra_charges
            .iter()
            .filter(|charge| charge.mandatory)
            .map(|charge| extra_charge_fee(charge, subtotal, nights, guests))
            .collect();

        fees.push(Fee {
            name: "Service Fee".to_string(),
            amount: round_money(subtotal * self.service_fee_rate),
            fee_type: FeeType::Service,
        });

        let taxes = vec![Tax {
            name: self.tax_name.clone(),
            rate: (self.tax_rate * ONE_HUNDRED).normalize(),
            amount: round_money(subtotal * self.tax_rate),
        }];

        let total_fees: Decimal = fees.iter().map(|fee| fee.amount).sum();
        let total_taxes: Decimal = taxes.iter().map(|tax| tax.amount).sum();

        PricingBreakdown {
            base_price,
            nights,
            subtotal,
            fees,
            taxes,
            total: subtotal + total_fees + total_taxes,
            currency: accommodation.pricing.currency.clone(),
        }
    }

    // Nightly rate times nights, before fees and taxes
    pub fn quote(&self, accommodation: &Accommodation, room: &Room, nights: u32) -> RoomQuote {
        let base_price = room.effective_price(accommodation);

        RoomQuote {
            room_id: room.id.clone(),
            room_name: room.name.clone(),
            base_price,
            total_price: round_money(base_price * Decimal::from(nights)),
            nights,
            capacity: room.capacity,
        }
    }
}

fn extra_charge_fee(charge: &ExtraCharge, subtotal: Decimal, nights: u32, guests: u32) -> Fee {
    let amount = match charge.charge_type {
        ChargeType::Fixed => charge.amount,
        ChargeType::PerNight => charge.amount * Decimal::from(nights),
        ChargeType::PerPerson => charge.amount * Decimal::from(guests),
        ChargeType::Percentage => subtotal * charge.amount / ONE_HUNDRED,
    };

    let (name, fee_type) = match charge.name.to_lowercase().as_str() {
        "cleaning" => ("Cleaning Fee".to_string(), FeeType::Cleaning),
        "deposit" => (charge.name.clone(), FeeType::Deposit),
        "extra_guest" => (charge.name.clone(), FeeType::ExtraGuest),
        "pet" => (charge.name.clone(), FeeType::Pet),
        _ => (charge.name.clone(), FeeType::Other),
    };

    Fee {
        name,
        amount: round_money(amount),
        fee_type,
    }
}
