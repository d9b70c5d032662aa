// Calendar-day helpers shared by availability, reservation and cancellation
// Stays are half-open: [check_in, check_out), so the departure day is never a booked night

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::BookingError;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

fn ensure_ordered(check_in: NaiveDate, check_out: NaiveDate) -> Result<(), BookingError> {
    if check_in >= check_out {
        return Err(BookingError::InvalidRange {
            check_in,
            check_out,
        });
    }
    Ok(())
}

// Every night of the stay, in order
pub fn stay_nights(check_in: NaiveDate, check_out: NaiveDate) -> Result<Vec<NaiveDate>, BookingError> {
    ensure_ordered(check_in, check_out)?;

    Ok(check_in
        .iter_days()
        .take_while(|day| *day < check_out)
        .collect())
}

pub fn night_count(check_in: NaiveDate, check_out: NaiveDate) -> Result<u32, BookingError> {
    ensure_ordered(check_in, check_out)?;

    Ok((check_out - check_in).num_days() as u32)
}

// Check-in is taken to start at midnight UTC of its calendar day
pub fn check_in_instant(check_in: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&check_in.and_time(NaiveTime::MIN))
}

// Fractional hours from `now` until check-in; negative once check-in has passed
pub fn hours_until(check_in: NaiveDate, now: DateTime<Utc>) -> f64 {
    (check_in_instant(check_in) - now).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

// Accepts `2025-06-01` or a full RFC 3339 timestamp, which is truncated to its UTC day
pub fn parse_date(text: &str) -> Result<NaiveDate, BookingError> {
    let text = text.trim();

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(text)
        .map(|timestamp| timestamp.with_timezone(&Utc).date_naive())
        .map_err(|_| BookingError::Validation(format!("Invalid date: {}", text)))
}
