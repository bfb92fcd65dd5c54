//! Timezone-aware instants, day-of-week derivation, and the overlap
//! predicate that every other module builds on.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;

use crate::error::AssignError;

/// A day of the week, ordered Monday-first regardless of `day_week_starts`
/// (only [`week_day_range`] reorders for a custom week start).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

pub const ALL_DAYS: [Day; 7] = [
    Day::Monday,
    Day::Tuesday,
    Day::Wednesday,
    Day::Thursday,
    Day::Friday,
    Day::Saturday,
    Day::Sunday,
];

impl Day {
    /// Zero-based index, Monday = 0, matching `chrono::Weekday::num_days_from_monday`.
    pub fn index(self) -> usize {
        match self {
            Day::Monday => 0,
            Day::Tuesday => 1,
            Day::Wednesday => 2,
            Day::Thursday => 3,
            Day::Friday => 4,
            Day::Saturday => 5,
            Day::Sunday => 6,
        }
    }

    pub fn from_index(idx: usize) -> Day {
        ALL_DAYS[idx % 7]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = AssignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monday" => Ok(Day::Monday),
            "tuesday" => Ok(Day::Tuesday),
            "wednesday" => Ok(Day::Wednesday),
            "thursday" => Ok(Day::Thursday),
            "friday" => Ok(Day::Friday),
            "saturday" => Ok(Day::Saturday),
            "sunday" => Ok(Day::Sunday),
            other => Err(AssignError::InvalidDay(other.to_string())),
        }
    }
}

/// Projects a UTC instant into `tz`. A naive timestamp is treated as UTC
/// before reaching this function, per the task-loader contract (§6).
pub fn local(instant: DateTime<chrono::Utc>, tz: Tz) -> DateTime<Tz> {
    instant.with_timezone(&tz)
}

/// Day of week for a localized instant.
pub fn day_of<T: TimeZone>(instant: DateTime<T>) -> Day {
    use chrono::Datelike;
    match instant.weekday() {
        chrono::Weekday::Mon => Day::Monday,
        chrono::Weekday::Tue => Day::Tuesday,
        chrono::Weekday::Wed => Day::Wednesday,
        chrono::Weekday::Thu => Day::Thursday,
        chrono::Weekday::Fri => Day::Friday,
        chrono::Weekday::Sat => Day::Saturday,
        chrono::Weekday::Sun => Day::Sunday,
    }
}

/// Half-open interval overlap, preserving the legacy inclusive-endpoint
/// behavior of `mobius.helpers.dt_overlaps`: `a_stop == b_start` does not
/// count as overlap unless one interval is wholly contained in the other.
pub fn overlap<T: TimeZone>(
    a_start: DateTime<T>,
    a_stop: DateTime<T>,
    b_start: DateTime<T>,
    b_stop: DateTime<T>,
) -> bool {
    // case 1: a completely within b
    if a_start >= b_start && a_stop <= b_stop {
        return true;
    }
    // case 2: a overlaps the beginning of b
    if a_start <= b_start && a_stop > b_start {
        return true;
    }
    // case 3: a overlaps the end of b
    if a_start < b_stop && a_stop >= b_stop {
        return true;
    }
    false
}

/// The seven day names, starting at `start_day`.
pub fn week_day_range(start_day: Day) -> [Day; 7] {
    let mut out = [Day::Monday; 7];
    let start = start_day.index();
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = Day::from_index((start + i) % 7);
    }
    out
}

/// Parses a day name, failing with [`AssignError::InvalidDay`] if it is not
/// one of the seven recognized names.
pub fn parse_week_day_range(start_day: &str) -> Result<[Day; 7], AssignError> {
    let day: Day = start_day.parse()?;
    Ok(week_day_range(day))
}

/// Zeroes hour/minute/second/nanosecond, preserving date and timezone.
pub fn normalize_to_midnight<T: TimeZone>(instant: DateTime<T>) -> DateTime<T> {
    instant
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight always exists")
        .and_local_timezone(instant.timezone())
        .single()
        .unwrap_or_else(|| instant.with_timezone(&instant.timezone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Los_Angeles;

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        Los_Angeles
            .with_ymd_and_hms(y, m, d, h, mi, 0)
            .single()
            .unwrap()
    }

    #[test]
    fn week_day_range_is_a_rotation() {
        let range = week_day_range(Day::Wednesday);
        assert_eq!(
            range,
            [
                Day::Wednesday,
                Day::Thursday,
                Day::Friday,
                Day::Saturday,
                Day::Sunday,
                Day::Monday,
                Day::Tuesday,
            ]
        );
    }

    #[test]
    fn invalid_day_name_fails() {
        assert!(matches!(
            parse_week_day_range("miercoles"),
            Err(AssignError::InvalidDay(_))
        ));
    }

    #[test]
    fn normalize_to_midnight_preserves_date_and_tz() {
        let t = dt(2015, 12, 23, 14, 37);
        let n = normalize_to_midnight(t);
        assert_eq!(n.date_naive(), t.date_naive());
        assert_eq!(n.timezone(), t.timezone());
        assert_eq!((n.hour(), n.minute(), n.second()), (0, 0, 0));
    }

    use chrono::Timelike;

    #[test]
    fn overlap_shares_endpoint_is_not_overlap_unless_degenerate() {
        let a_start = dt(2015, 12, 23, 1, 0);
        let a_stop = dt(2015, 12, 23, 2, 0);
        let b_start = dt(2015, 12, 23, 2, 0);
        let b_stop = dt(2015, 12, 23, 3, 0);
        // a.stop == b.start, neither interval contained in the other: no overlap
        assert!(!overlap(a_start, a_stop, b_start, b_stop));
    }

    #[test]
    fn overlap_contained_interval_overlaps() {
        let outer_start = dt(2015, 12, 23, 1, 0);
        let outer_stop = dt(2015, 12, 23, 5, 0);
        let inner_start = dt(2015, 12, 23, 2, 0);
        let inner_stop = dt(2015, 12, 23, 3, 0);
        assert!(overlap(inner_start, inner_stop, outer_start, outer_stop));
    }

    #[test]
    fn day_of_matches_weekday() {
        let t = dt(2015, 12, 23, 1, 0); // a Wednesday
        assert_eq!(day_of(t), Day::Wednesday);
    }
}
