//! Per-worker preprocessing: availability/preference grids, time-off and
//! existing-shift absorption, α/β happiness weighting, and the predicates
//! the assignment engine needs per candidate shift.

use chrono::{DateTime, Duration, Timelike};
use chrono_tz::Tz;

use crate::config::Config;
use crate::environment::Environment;
use crate::shift::Shift;
use crate::time::{self, Day, ALL_DAYS};

/// A 7x24 0/1 grid, one row per [`Day`], one column per local clock-hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid(pub [[u8; 24]; 7]);

impl Grid {
    pub fn all_true() -> Self {
        Grid([[1; 24]; 7])
    }

    pub fn all_false() -> Self {
        Grid([[0; 24]; 7])
    }

    pub fn hour(&self, day: Day, hour: usize) -> u8 {
        self.0[day.index()][hour]
    }

    pub fn set_hour(&mut self, day: Day, hour: usize, value: u8) {
        self.0[day.index()][hour] = value;
    }

    pub fn zero_day(&mut self, day: Day) {
        self.0[day.index()] = [0; 24];
    }

    /// Sum of all 7x24 cells (used for hour-availability totals and for
    /// the α/β computation).
    pub fn sum(&self) -> u32 {
        self.0.iter().flatten().map(|&v| v as u32).sum()
    }

    /// Elementwise product with `other`, used to filter preferences by
    /// availability.
    pub fn mul(&self, other: &Grid) -> Grid {
        let mut out = Grid::all_false();
        for day in ALL_DAYS {
            for h in 0..24 {
                out.set_hour(day, h, self.hour(day, h) * other.hour(day, h));
            }
        }
        out
    }
}

/// The disposition of a time-off request. Only `ApprovedPaid`,
/// `ApprovedUnpaid`, and `Sick` are absorbed into the worker's hours and
/// availability; anything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOffState {
    ApprovedPaid,
    ApprovedUnpaid,
    Sick,
    Denied,
    Pending,
}

impl TimeOffState {
    pub fn is_approved(self) -> bool {
        matches!(
            self,
            TimeOffState::ApprovedPaid | TimeOffState::ApprovedUnpaid | TimeOffState::Sick
        )
    }
}

#[derive(Debug, Clone)]
pub struct TimeOffRequest {
    pub state: TimeOffState,
    pub minutes_paid: u32,
    /// Local start instant of the request; only its day is used.
    pub start: DateTime<Tz>,
}

/// Construction parameters for a [`Worker`]. Everything the original
/// implementation fetched from the Staffjoy API is supplied here instead
/// — this crate has no I/O of its own (see `tasking` for where that data
/// actually comes from).
#[derive(Debug, Clone, Default)]
pub struct WorkerInput {
    pub user_id: u64,
    pub min_hours_per_workweek: f64,
    pub max_hours_per_workweek: f64,
    pub preferences: Option<Grid>,
    pub availability: Option<Grid>,
    pub time_off_requests: Vec<TimeOffRequest>,
    pub preceding_day_worked: Option<bool>,
    pub preceding_days_worked_streak: Option<u32>,
    pub existing_shifts: Vec<Shift>,
    /// Shifts starting in the days immediately before `environment.start`,
    /// reaching back at least `max_consecutive_workdays` days. Used to
    /// derive `preceding_day_worked`/`preceding_days_worked_streak` when
    /// they aren't supplied directly.
    pub preceding_shifts: Vec<Shift>,
}

impl Default for Grid {
    fn default() -> Self {
        Grid::all_true()
    }
}

/// A preprocessed worker, ready to be handed to the assignment engine.
#[derive(Debug, Clone)]
pub struct Worker {
    pub user_id: u64,
    pub min_hours_per_workweek: f64,
    pub max_hours_per_workweek: f64,
    pub availability: Grid,
    pub preferences: Grid,
    pub preceding_day_worked: bool,
    pub preceding_days_worked_streak: u32,
    pub existing_shifts: Vec<Shift>,
    pub active_days: [bool; 7],
    pub alpha: f64,
    pub beta: f64,
}

impl Worker {
    /// Runs the nine-step preprocessing pipeline described in §4.3.
    pub fn new(environment: &Environment, config: &Config, input: WorkerInput) -> Worker {
        // 1. active_days all false.
        let mut active_days = [false; 7];

        // 2 & 3. load preferences/availability (default all-ones).
        let mut preferences = input.preferences.unwrap_or_default();
        let mut availability = input.availability.unwrap_or_default();

        let mut min_hours = input.min_hours_per_workweek;
        let mut max_hours = input.max_hours_per_workweek;

        // 4. approved time off.
        for request in &input.time_off_requests {
            if !request.state.is_approved() {
                continue;
            }
            let paid_hours = request.minutes_paid as f64 / 60.0;
            min_hours = (min_hours - paid_hours).max(0.0);
            max_hours = (max_hours - paid_hours).max(0.0);
            availability.zero_day(time::day_of(request.start));
        }

        // 5. preceding_day_worked.
        let preceding_day_worked = input.preceding_day_worked.unwrap_or_else(|| {
            let window_start = environment.start - Duration::days(1);
            let immediate: Vec<&Shift> = input
                .preceding_shifts
                .iter()
                .filter(|s| s.start >= window_start && s.start < environment.start)
                .collect();
            for s in &immediate {
                if s.stop > environment.start {
                    active_days[time::day_of(s.stop).index()] = true;
                }
            }
            !immediate.is_empty()
        });

        // 6. preceding_days_worked_streak.
        let preceding_days_worked_streak = input.preceding_days_worked_streak.unwrap_or_else(|| {
            let mut streak = 0u32;
            for t in 0..environment.max_consecutive_workdays {
                let search_end = environment.start - Duration::days(t as i64);
                let search_start = search_end - Duration::days(1);
                let worked = input
                    .preceding_shifts
                    .iter()
                    .any(|s| s.start >= search_start && s.start < search_end);
                if worked {
                    streak += 1;
                } else {
                    break;
                }
            }
            streak
        });

        // 7. existing shifts inside the week.
        let mut existing_shifts = Vec::new();
        for shift in input.existing_shifts.iter().filter(|s| {
            s.start >= environment.start && s.start < environment.stop
        }) {
            let hours = shift.total_minutes() as f64 / 60.0;
            min_hours = (min_hours - hours).max(0.0);
            max_hours = (max_hours - hours).max(0.0);
            if config.double_decrement_existing_shift_hours {
                // Legacy quirk preserved behind a flag: mobius's reference
                // implementation subtracts existing-shift hours from
                // max_hours_per_workweek twice (see DESIGN.md).
                max_hours = (max_hours - hours).max(0.0);
            }
            active_days[time::day_of(shift.start).index()] = true;
            if shift.stop < environment.stop {
                active_days[time::day_of(shift.stop).index()] = true;
            }
            existing_shifts.push(shift.clone());
        }

        // 8. filter preferences by availability.
        preferences = preferences.mul(&availability);

        // 9. alpha/beta.
        let (alpha, beta) = alpha_beta(&availability, &preferences);

        Worker {
            user_id: input.user_id,
            min_hours_per_workweek: min_hours,
            max_hours_per_workweek: max_hours,
            availability,
            preferences,
            preceding_day_worked,
            preceding_days_worked_streak,
            existing_shifts,
            active_days,
            alpha,
            beta,
        }
    }

    pub fn is_active(&self, day: Day) -> bool {
        self.active_days[day.index()]
    }

    /// Whether a worker's stated minimum is even reachable given their
    /// availability; the task loader is expected to prune workers for
    /// which this is false before constructing an `Engine` (§6).
    pub fn has_feasible_minimum(&self) -> bool {
        self.min_hours_per_workweek < self.availability.sum() as f64
    }

    /// Whether the worker may work `shift`, accounting for minimum
    /// separation from existing shifts and the availability grid.
    pub fn available_to_work(&self, environment: &Environment, shift: &Shift) -> bool {
        let pad = Duration::minutes(environment.min_minutes_between_shifts as i64);
        let expanded_start = shift.start - pad;
        let expanded_stop = shift.stop + pad;

        for existing in &self.existing_shifts {
            if time::overlap(existing.start, existing.stop, expanded_start, expanded_stop) {
                return false;
            }
        }

        for (day, hour) in covered_hours(shift.start, shift.stop) {
            if self.availability.hour(day, hour) != 1 {
                return false;
            }
        }
        true
    }

    /// The happiness contribution of assigning this worker to `shift`.
    pub fn shift_happiness_score(&self, shift: &Shift) -> f64 {
        let mut score = 0.0;
        for (day, hour) in covered_hours(shift.start, shift.stop) {
            if self.preferences.hour(day, hour) == 1 {
                score += 1.0 + self.alpha;
            } else {
                score += 1.0 - self.beta;
            }
        }
        score
    }
}

fn alpha_beta(availability: &Grid, preferences: &Grid) -> (f64, f64) {
    let a = availability.sum() as f64;
    let p = preferences.sum() as f64;
    if a == 0.0 || p == 0.0 || p == a {
        (0.0, 0.0)
    } else {
        ((a - p) / a, p / a)
    }
}

/// Every local (day, hour) cell a `[start, stop)` interval touches, using
/// the exclusive-stop / midnight-rollover rule shared by the availability
/// predicate and the happiness score (§4.3, §4.4).
fn covered_hours(start: DateTime<Tz>, stop: DateTime<Tz>) -> Vec<(Day, usize)> {
    let start_day = time::day_of(start);
    let mut stop_day = time::day_of(stop);

    let search_stop_hour = if stop.minute() + stop.second() > 0 || stop.nanosecond() > 0 {
        stop.hour() + 1
    } else {
        let hour = stop.hour();
        if hour == 0 {
            stop_day = start_day;
        }
        hour
    };

    let mut hours = Vec::new();
    if start_day == stop_day {
        for h in start.hour()..search_stop_hour {
            hours.push((start_day, h as usize));
        }
    } else {
        for h in start.hour()..24 {
            hours.push((start_day, h as usize));
        }
        for h in 0..search_stop_hour {
            hours.push((stop_day, h as usize));
        }
    }
    hours
}
