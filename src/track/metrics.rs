use std::time::{Duration, Instant};

use thiserror::Error;
use time::OffsetDateTime;

/// The end of an interval precedes its start: clock skew or out-of-order
/// delivery. Callers treat the metric as unavailable; never fatal.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("interval end precedes start by {skew:?}")]
pub struct InvalidInterval {
    pub skew: Duration,
}

/// Interval between two monotonic samples taken in this process.
pub fn duration(from: Instant, to: Instant) -> Result<Duration, InvalidInterval> {
    to.checked_duration_since(from).ok_or_else(|| InvalidInterval {
        skew: from.saturating_duration_since(to),
    })
}

/// Interval between two wall-clock timestamps. Only for endpoints that exist
/// solely on the orchestrator's clock; prefer `duration` whenever both ends
/// were observed in this process.
pub fn wall_duration(
    from: OffsetDateTime,
    to: OffsetDateTime,
) -> Result<Duration, InvalidInterval> {
    Duration::try_from(to - from).map_err(|_| InvalidInterval {
        skew: Duration::try_from(from - to).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_exact_for_ordered_samples() {
        let a = Instant::now();
        let b = a + Duration::from_millis(250);
        assert_eq!(duration(a, b), Ok(Duration::from_millis(250)));
        assert_eq!(duration(a, a), Ok(Duration::ZERO));
    }

    #[test]
    fn duration_rejects_reversed_samples() {
        let a = Instant::now();
        let b = a + Duration::from_millis(40);
        let err = duration(b, a).unwrap_err();
        assert_eq!(err.skew, Duration::from_millis(40));
    }

    #[test]
    fn wall_duration_rejects_reversed_timestamps() {
        let a = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let b = a + time::Duration::seconds(3);
        assert_eq!(wall_duration(a, b), Ok(Duration::from_secs(3)));
        assert!(wall_duration(b, a).is_err());
    }
}
