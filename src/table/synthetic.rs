//! Synthetic demo input
//!
//! One row per minute ending at `now`, with a crude anomaly injected on
//! every 25th row.

use super::timestamp::canonical_timestamp;
use super::{Row, TimeSeriesTable};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Number of generated rows
pub const SYNTHETIC_ROWS: usize = 3000;

/// Every n-th row gets an injected spike
pub const ANOMALY_EVERY: usize = 25;

/// Generate the demo table using the thread-local RNG
pub fn generate(now: DateTime<Utc>) -> TimeSeriesTable {
    generate_with(now, &mut rand::thread_rng())
}

/// Generate the demo table with an explicit RNG
pub fn generate_with<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> TimeSeriesTable {
    let now = now.naive_utc();
    (0..SYNTHETIC_ROWS)
        .map(|i| {
            let minutes_back = (SYNTHETIC_ROWS - i) as i64;
            let timestamp = now - Duration::minutes(minutes_back);
            // (0, 1] so the spike never divides by zero
            let r = 1.0 - rng.gen::<f64>();
            let value = if i % ANOMALY_EVERY == 0 {
                i as f64 / r
            } else {
                i as f64 * r
            };
            Row::new(canonical_timestamp(&timestamp), value.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::timestamp::parse_timestamp;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_row_count_and_spacing() {
        let table = generate_with(fixed_now(), &mut StdRng::seed_from_u64(7));
        assert_eq!(table.len(), SYNTHETIC_ROWS);

        let first = &table.rows()[0];
        let last = &table.rows()[SYNTHETIC_ROWS - 1];
        assert_eq!(first.timestamp, "2024-04-29T10:00:00");
        assert_eq!(last.timestamp, "2024-05-01T11:59:00");

        for pair in table.rows().windows(2) {
            let a = parse_timestamp(&pair[0].timestamp).unwrap();
            let b = parse_timestamp(&pair[1].timestamp).unwrap();
            assert_eq!(b - a, Duration::minutes(1));
        }
    }

    #[test]
    fn test_values_follow_injection_rule() {
        let table = generate_with(fixed_now(), &mut StdRng::seed_from_u64(42));
        for (i, row) in table.rows().iter().enumerate() {
            let value: f64 = row.value.parse().unwrap();
            assert!(value.is_finite());
            if i % ANOMALY_EVERY == 0 {
                assert!(value >= i as f64, "row {i}: {value}");
            } else {
                assert!(value <= i as f64, "row {i}: {value}");
            }
        }
    }

    #[test]
    fn test_same_seed_same_table() {
        let a = generate_with(fixed_now(), &mut StdRng::seed_from_u64(1));
        let b = generate_with(fixed_now(), &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }
}
