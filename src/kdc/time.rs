use chrono::{DateTime, TimeZone, Utc};
use kerberos_asn1::KerberosTime;
use std::fmt;

/// An instant as the KDC reckons it: UTC milliseconds since the epoch,
/// totally ordered, with a distinguished `INFINITY` used by the lifetime
/// minimizers. Arithmetic saturates instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KdcTime {
    millis: i64,
}

impl KdcTime {
    pub const INFINITY: KdcTime = KdcTime { millis: i64::MAX };

    pub fn now() -> Self {
        return Utc::now().into();
    }

    pub fn from_millis(millis: i64) -> Self {
        return Self { millis };
    }

    pub fn millis(&self) -> i64 {
        return self.millis;
    }

    /// A zero timestamp on the wire means "no expiration requested".
    pub fn is_zero(&self) -> bool {
        return self.millis == 0;
    }

    pub fn is_infinity(&self) -> bool {
        return self.millis == i64::MAX;
    }

    pub fn plus(&self, millis: i64) -> Self {
        return Self {
            millis: self.millis.saturating_add(millis),
        };
    }

    /// Milliseconds elapsed from `earlier` to `self`, saturating.
    pub fn since(&self, earlier: KdcTime) -> i64 {
        return self.millis.saturating_sub(earlier.millis);
    }

    /// Whether this instant lies within `skew` milliseconds of `now`,
    /// in either direction.
    pub fn is_in_clock_skew(&self, now: KdcTime, skew: i64) -> bool {
        let delta = if self.millis > now.millis {
            self.millis.saturating_sub(now.millis)
        } else {
            now.millis.saturating_sub(self.millis)
        };
        return delta <= skew;
    }

    pub fn to_kerberos_time(&self) -> KerberosTime {
        return Utc
            .timestamp_millis_opt(self.millis)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .into();
    }
}

impl From<DateTime<Utc>> for KdcTime {
    fn from(time: DateTime<Utc>) -> Self {
        return Self {
            millis: time.timestamp_millis(),
        };
    }
}

impl From<&KerberosTime> for KdcTime {
    fn from(time: &KerberosTime) -> Self {
        return Self {
            millis: time.timestamp_millis(),
        };
    }
}

impl fmt::Display for KdcTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinity() {
            return write!(f, "infinity");
        }
        match Utc.timestamp_millis_opt(self.millis).single() {
            Some(time) => {
                write!(f, "{}", time.format("%Y/%m/%d %H:%M:%S"))
            }
            None => write!(f, "{}ms", self.millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 60 * 1000;

    #[test]
    fn test_infinity_sorts_after_any_instant() {
        let now = KdcTime::now();
        assert!(now < KdcTime::INFINITY);
        assert_eq!(
            KdcTime::INFINITY,
            now.min(KdcTime::INFINITY).max(KdcTime::INFINITY)
        );
    }

    #[test]
    fn test_clock_skew_window_is_symmetric() {
        let now = KdcTime::from_millis(100 * MINUTE);
        assert!(now.plus(5 * MINUTE).is_in_clock_skew(now, 5 * MINUTE));
        assert!(now.plus(-5 * MINUTE).is_in_clock_skew(now, 5 * MINUTE));
        assert!(!now.plus(5 * MINUTE + 1).is_in_clock_skew(now, 5 * MINUTE));
        assert!(!now.plus(-5 * MINUTE - 1).is_in_clock_skew(now, 5 * MINUTE));
    }

    #[test]
    fn test_arithmetic_saturates_at_infinity() {
        assert!(KdcTime::INFINITY.plus(MINUTE).is_infinity());
        assert_eq!(
            i64::MAX,
            KdcTime::INFINITY.since(KdcTime::from_millis(i64::MIN))
        );
    }

    #[test]
    fn test_kerberos_time_round_trip_keeps_seconds() {
        let time = KdcTime::from_millis(1_600_000_000_000);
        let wire = time.to_kerberos_time();
        assert_eq!(time, KdcTime::from(&wire));
    }
}
