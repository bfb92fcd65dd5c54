//! An identified half-open time interval to be covered by at most one
//! worker.

use chrono_tz::Tz;
use chrono::DateTime;

/// Sentinel `user_id` meaning "unassigned".
pub const UNASSIGNED_USER_ID: u64 = 0;

/// A shift to be staffed. `user_id` is `0` while unassigned; the engine's
/// result applier is the only thing permitted to change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    pub shift_id: u64,
    pub user_id: u64,
    pub start: DateTime<Tz>,
    pub stop: DateTime<Tz>,
}

impl Shift {
    pub fn new(shift_id: u64, start: DateTime<Tz>, stop: DateTime<Tz>) -> Self {
        assert!(stop > start, "shift {shift_id} has stop <= start");
        Shift {
            shift_id,
            user_id: UNASSIGNED_USER_ID,
            start,
            stop,
        }
    }

    pub fn with_user(mut self, user_id: u64) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn is_assigned(&self) -> bool {
        self.user_id != UNASSIGNED_USER_ID
    }

    /// Length of the shift in minutes, rounded up.
    pub fn total_minutes(&self) -> i64 {
        let seconds = (self.stop - self.start).num_seconds();
        seconds.div_ceil(60)
    }

    /// Minutes of overlap between this shift and `[start, stop)`, 0 if
    /// they don't overlap.
    pub fn minutes_overlap(&self, start: DateTime<Tz>, stop: DateTime<Tz>) -> i64 {
        let overlap_start = self.start.max(start);
        let overlap_stop = self.stop.min(stop);
        let seconds = (overlap_stop - overlap_start).num_seconds();
        if seconds < 0 {
            0
        } else {
            seconds.div_ceil(60)
        }
    }
}
