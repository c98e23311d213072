use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{Timestamp, Zoned};

/// Wall clock in the scheme's configured time zone.
#[derive(Debug, Clone)]
pub struct Clock {
    tz: TimeZone,
}

impl Clock {
    /// Builds a clock for an IANA zone name, falling back to UTC for unknown names.
    pub fn new(zone: &str) -> Self {
        let tz = TimeZone::get(zone).unwrap_or_else(|error| {
            tracing::warn!(zone, %error, "Unknown time zone, using UTC");
            TimeZone::UTC
        });
        Self { tz }
    }

    pub fn utc() -> Self {
        Self { tz: TimeZone::UTC }
    }

    pub fn now(&self) -> Zoned {
        Timestamp::now().to_zoned(self.tz.clone())
    }

    pub fn today(&self) -> Date {
        self.now().date()
    }

    /// The calendar date of `timestamp` in this zone.
    pub fn date_of(&self, timestamp: Timestamp) -> Date {
        timestamp.to_zoned(self.tz.clone()).date()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::utc()
    }
}
