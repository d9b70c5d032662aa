// Booking number generation
// Format: prefix + base-36 epoch millis + 5 random base-36 digits, upper-cased (e.g. BKM5D4RUO0K3Z9Q)

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::clock::Clock;

const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const RANDOM_SUFFIX_LEN: usize = 5;

pub struct BookingNumberGenerator {
    prefix: String,
    clock: Arc<dyn Clock>,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl BookingNumberGenerator {
    pub fn new(
        prefix: impl Into<String>,
        clock: Arc<dyn Clock>,
        rng: impl RngCore + Send + 'static,
    ) -> Self {
        Self {
            prefix: prefix.into().to_uppercase(),
            clock,
            rng: Mutex::new(Box::new(rng)),
        }
    }

    pub fn from_entropy(prefix: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self::new(prefix, clock, StdRng::from_entropy())
    }

    pub fn generate(&self) -> String {
        let millis = self.clock.now().timestamp_millis().max(0) as u64;

        let mut number = self.prefix.clone();
        number.push_str(&to_base36(millis));

        let mut rng = self.rng.lock();
        for _ in 0..RANDOM_SUFFIX_LEN {
            let digit = (rng.next_u32() % 36) as usize;
            number.push(DIGITS[digit] as char);
        }

        number
    }
}

pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();

    String::from_utf8_lossy(&digits).into_owned()
}

// Prefix followed by at least one upper-case base-36 digit
pub fn is_well_formed(number: &str, prefix: &str) -> bool {
    number
        .strip_prefix(prefix)
        .map_or(false, |rest| {
            !rest.is_empty()
                && rest
                    .bytes()
                    .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::mock::StepRng;

    fn new_year_clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn test_base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_735_689_600_000), "M5D4RUO0");
    }

    #[test]
    fn test_exact_number_with_injected_clock_and_rng() {
        let generator = BookingNumberGenerator::new("BK", new_year_clock(), StepRng::new(0, 1));

        assert_eq!(generator.generate(), "BKM5D4RUO001234");
        assert_eq!(generator.generate(), "BKM5D4RUO056789");

        let lettered = BookingNumberGenerator::new("bk", new_year_clock(), StepRng::new(10, 1));
        assert_eq!(lettered.generate(), "BKM5D4RUO0ABCDE");
    }

    #[test]
    fn test_same_inputs_collide_deterministically() {
        let first = BookingNumberGenerator::new("BK", new_year_clock(), StepRng::new(7, 0));
        let second = BookingNumberGenerator::new("BK", new_year_clock(), StepRng::new(7, 0));

        assert_eq!(first.generate(), second.generate());
    }

    #[test]
    fn test_clock_feeds_timestamp_part() {
        let clock = new_year_clock();
        let generator = BookingNumberGenerator::new("BK", clock.clone(), StepRng::new(0, 0));

        let before = generator.generate();
        clock.advance(Duration::milliseconds(1));
        let after = generator.generate();

        assert_eq!(before, "BKM5D4RUO000000");
        assert_eq!(after, "BKM5D4RUO100000");
    }

    #[test]
    fn test_entropy_numbers_are_well_formed() {
        let generator = BookingNumberGenerator::from_entropy("BK", new_year_clock());

        for _ in 0..100 {
            let number = generator.generate();
            assert!(is_well_formed(&number, "BK"), "malformed: {}", number);
        }

        assert!(!is_well_formed("BK", "BK"));
        assert!(!is_well_formed("BKabc", "BK"));
        assert!(!is_well_formed("XX123", "BK"));
    }
}
