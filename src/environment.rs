//! Immutable week parameters shared by every worker and shift in one
//! calculation.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::time::{self, Day};

/// Role, location, and organization parameters for a single week's
/// calculation. Constructed once per calculation and never mutated.
#[derive(Debug, Clone)]
pub struct Environment {
    pub organization_id: u64,
    pub location_id: u64,
    pub role_id: u64,
    pub schedule_id: u64,
    pub tz: Tz,
    /// Week start, re-expressed in `tz` so local-day arithmetic aligns on
    /// local midnight.
    pub start: DateTime<Tz>,
    /// Week stop (exclusive), re-expressed in `tz`.
    pub stop: DateTime<Tz>,
    pub day_week_starts: Day,
    pub min_minutes_per_workday: u32,
    pub max_minutes_per_workday: u32,
    pub min_minutes_between_shifts: u32,
    pub max_consecutive_workdays: u32,
}

impl Environment {
    /// Builds an `Environment` from wire-shaped inputs. `start`/`stop` are
    /// UTC instants (a naive wire timestamp is assumed-UTC upstream, per
    /// §6); they are immediately projected into `tz` here so every other
    /// module can work purely in local time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        organization_id: u64,
        location_id: u64,
        role_id: u64,
        schedule_id: u64,
        tz: Tz,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        day_week_starts: Day,
        min_minutes_per_workday: u32,
        max_minutes_per_workday: u32,
        min_minutes_between_shifts: u32,
        max_consecutive_workdays: u32,
    ) -> Self {
        Environment {
            organization_id,
            location_id,
            role_id,
            schedule_id,
            tz,
            start: time::local(start, tz),
            stop: time::local(stop, tz),
            day_week_starts,
            min_minutes_per_workday,
            max_minutes_per_workday,
            min_minutes_between_shifts,
            max_consecutive_workdays,
        }
    }

    /// Projects an already-UTC instant into this environment's timezone.
    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        time::local(instant, self.tz)
    }

    /// The seven local days of this week, starting at `day_week_starts`.
    pub fn week_days(&self) -> [Day; 7] {
        time::week_day_range(self.day_week_starts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::Los_Angeles;

    fn env() -> Environment {
        Environment::new(
            7,
            8,
            4,
            9,
            Los_Angeles,
            Utc.with_ymd_and_hms(2015, 12, 21, 16, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2015, 12, 28, 16, 0, 0).unwrap(),
            Day::Monday,
            5 * 60,
            8 * 60,
            12 * 60,
            6,
        )
    }

    #[test]
    fn start_and_stop_are_expressed_in_local_tz() {
        let e = env();
        assert_eq!(e.start.timezone(), Los_Angeles);
        assert_eq!(e.stop.timezone(), Los_Angeles);
        assert!(e.stop > e.start);
    }

    #[test]
    fn week_days_starts_at_configured_day() {
        let e = env();
        assert_eq!(e.week_days()[0], Day::Monday);
    }
}
