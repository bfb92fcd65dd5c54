//! Demo data generators for the weekly assignment engine, grounded in the
//! scenario fixtures used to validate it: a one-shift sanity check, an
//! availability-boundary probe, a time-off probe, a mid-size courier week,
//! a deliberately over-constrained week that forces fallback escalation,
//! and a broader applier-correctness week.

use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::{America::Los_Angeles, Tz};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::environment::Environment;
use crate::shift::Shift;
use crate::time::Day;
use crate::worker::{Grid, TimeOffRequest, TimeOffState, WorkerInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoData {
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
}

impl std::str::FromStr for DemoData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "S1" => Ok(DemoData::S1),
            "S2" => Ok(DemoData::S2),
            "S3" => Ok(DemoData::S3),
            "S4" => Ok(DemoData::S4),
            "S5" => Ok(DemoData::S5),
            "S6" => Ok(DemoData::S6),
            _ => Err(()),
        }
    }
}

impl DemoData {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoData::S1 => "S1",
            DemoData::S2 => "S2",
            DemoData::S3 => "S3",
            DemoData::S4 => "S4",
            DemoData::S5 => "S5",
            DemoData::S6 => "S6",
        }
    }
}

pub fn list_demo_data() -> Vec<&'static str> {
    vec!["S1", "S2", "S3", "S4", "S5", "S6"]
}

/// Raw fixture inputs for one week: a caller still has to run each
/// [`WorkerInput`] through [`crate::worker::Worker::new`] with its own
/// `Config` before constructing an [`crate::engine::Engine`].
#[derive(Debug, Clone)]
pub struct DemoFixture {
    pub environment: Environment,
    pub worker_inputs: Vec<WorkerInput>,
    pub shifts: Vec<Shift>,
}

pub fn generate(demo: DemoData) -> DemoFixture {
    match demo {
        DemoData::S1 => single_shift(),
        DemoData::S2 => availability_boundaries(),
        DemoData::S3 => time_off_handling(),
        DemoData::S4 => courier_week(82, 12),
        DemoData::S5 => over_constrained_week(),
        DemoData::S6 => courier_week(40, 8),
    }
}

fn week_environment(organization_id: u64) -> Environment {
    Environment::new(
        organization_id,
        1,
        1,
        1,
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

fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> chrono::DateTime<Tz> {
    Los_Angeles.with_ymd_and_hms(y, mo, d, h, mi, 0).single().unwrap()
}

fn single_shift() -> DemoFixture {
    let environment = week_environment(1);
    let worker = WorkerInput {
        user_id: 1,
        min_hours_per_workweek: 0.0,
        max_hours_per_workweek: 40.0,
        ..Default::default()
    };
    let shift = Shift::new(1, local(2015, 12, 21, 9, 0), local(2015, 12, 21, 17, 0));
    DemoFixture {
        environment,
        worker_inputs: vec![worker],
        shifts: vec![shift],
    }
}

fn availability_boundaries() -> DemoFixture {
    let environment = week_environment(2);
    let mut availability = Grid::all_false();
    for h in 2..24 {
        availability.set_hour(Day::Wednesday, h, 1);
    }
    for h in 7..24 {
        availability.set_hour(Day::Tuesday, h, 1);
    }
    availability.set_hour(Day::Wednesday, 0, 1);
    availability.set_hour(Day::Wednesday, 1, 1);

    let worker = WorkerInput {
        user_id: 1,
        min_hours_per_workweek: 0.0,
        max_hours_per_workweek: 40.0,
        availability: Some(availability),
        ..Default::default()
    };

    let shifts = vec![
        // available: fully inside [2,24)
        Shift::new(1, local(2015, 12, 23, 1, 0), local(2015, 12, 23, 2, 0)),
        // unavailable: hour 1 is unset
        Shift::new(2, local(2015, 12, 23, 2, 0), local(2015, 12, 23, 3, 0)),
        // unavailable: one minute of bleed into hour 2's far side
        Shift::new(3, local(2015, 12, 23, 1, 0), local(2015, 12, 23, 2, 1)),
        // crosses midnight from Tuesday into Wednesday
        Shift::new(4, local(2015, 12, 22, 7, 0), local(2015, 12, 23, 2, 0)),
        // ends exactly at midnight, attributed to the start day only
        Shift::new(5, local(2015, 12, 23, 22, 0), local(2015, 12, 24, 0, 0)),
    ];

    DemoFixture {
        environment,
        worker_inputs: vec![worker],
        shifts,
    }
}

fn time_off_handling() -> DemoFixture {
    let environment = week_environment(3);
    let tuesday_8am = local(2015, 12, 22, 8, 0);

    let paid = WorkerInput {
        user_id: 1,
        min_hours_per_workweek: 20.0,
        max_hours_per_workweek: 40.0,
        time_off_requests: vec![TimeOffRequest {
            state: TimeOffState::ApprovedPaid,
            minutes_paid: 510,
            start: tuesday_8am,
        }],
        ..Default::default()
    };
    let denied = WorkerInput {
        user_id: 2,
        min_hours_per_workweek: 20.0,
        max_hours_per_workweek: 40.0,
        time_off_requests: vec![TimeOffRequest {
            state: TimeOffState::Denied,
            minutes_paid: 510,
            start: tuesday_8am,
        }],
        ..Default::default()
    };
    let sick = WorkerInput {
        user_id: 3,
        min_hours_per_workweek: 20.0,
        max_hours_per_workweek: 40.0,
        time_off_requests: vec![TimeOffRequest {
            state: TimeOffState::Sick,
            minutes_paid: 510,
            start: tuesday_8am,
        }],
        ..Default::default()
    };
    let unpaid = WorkerInput {
        user_id: 4,
        min_hours_per_workweek: 20.0,
        max_hours_per_workweek: 40.0,
        time_off_requests: vec![TimeOffRequest {
            state: TimeOffState::ApprovedUnpaid,
            minutes_paid: 0,
            start: tuesday_8am,
        }],
        ..Default::default()
    };

    let shifts = vec![
        Shift::new(1, local(2015, 12, 21, 9, 0), local(2015, 12, 21, 17, 0)),
        Shift::new(2, local(2015, 12, 22, 9, 0), local(2015, 12, 22, 17, 0)),
    ];

    DemoFixture {
        environment,
        worker_inputs: vec![paid, denied, sick, unpaid],
        shifts,
    }
}

/// A mid-size week in a courier domain: `shift_count` shifts spread over
/// `worker_count` couriers across the full week, one of whom has zero
/// availability (so they can never be assigned) and at least one of whom
/// carries a preceding work streak (so a consecutive-days-off pair has
/// something to bind against).
fn courier_week(shift_count: usize, worker_count: usize) -> DemoFixture {
    let environment = week_environment(4);
    let mut rng = StdRng::seed_from_u64(0);

    let shift_templates = [(6, 14), (9, 17), (14, 22), (17, 23)];

    let week_start = NaiveDate::from_ymd_opt(2015, 12, 21).unwrap();

    let mut worker_inputs = Vec::with_capacity(worker_count);
    for i in 0..worker_count {
        let user_id = (i + 1) as u64;

        let availability = if i == 0 {
            // the zero-availability courier from S4: never assignable.
            Some(Grid::all_false())
        } else {
            None
        };

        let preceding_shifts = if i == 1 {
            // a five-day preceding streak, so one week's solve has an
            // existing streak to extend or break against.
            (1..=5)
                .map(|d| {
                    let day = week_start - chrono::Duration::days(d);
                    Shift::new(
                        900 + d as u64,
                        Los_Angeles
                            .from_local_datetime(
                                &day.and_hms_opt(9, 0, 0).unwrap(),
                            )
                            .single()
                            .unwrap(),
                        Los_Angeles
                            .from_local_datetime(
                                &day.and_hms_opt(17, 0, 0).unwrap(),
                            )
                            .single()
                            .unwrap(),
                    )
                    .with_user(user_id)
                })
                .collect()
        } else {
            Vec::new()
        };

        worker_inputs.push(WorkerInput {
            user_id,
            min_hours_per_workweek: rng.gen_range(10.0..25.0),
            max_hours_per_workweek: rng.gen_range(30.0..45.0),
            availability,
            preceding_shifts,
            ..Default::default()
        });
    }

    let mut shifts = Vec::with_capacity(shift_count);
    for shift_id in 0..shift_count {
        let day_offset = (shift_id % 7) as i64;
        let (start_hour, stop_hour) = shift_templates[shift_id % shift_templates.len()];
        let day = week_start + chrono::Duration::days(day_offset);
        let start = Los_Angeles
            .from_local_datetime(&day.and_hms_opt(start_hour, 0, 0).unwrap())
            .single()
            .unwrap();
        let stop = Los_Angeles
            .from_local_datetime(&day.and_hms_opt(stop_hour, 0, 0).unwrap())
            .single()
            .unwrap();
        shifts.push(Shift::new((shift_id + 1) as u64, start, stop));
    }

    DemoFixture {
        environment,
        worker_inputs,
        shifts,
    }
}

/// A deliberately tight week: few couriers, shifts packed back to back
/// with no slack, so min-separation and consecutive-days-off jointly make
/// the first two feasibility tiers infeasible and only the third
/// (no consecutive-days-off, no happiness) reaches an optimum.
fn over_constrained_week() -> DemoFixture {
    let environment = week_environment(5);
    let week_start = NaiveDate::from_ymd_opt(2015, 12, 21).unwrap();

    let worker_inputs = vec![
        WorkerInput {
            user_id: 1,
            min_hours_per_workweek: 40.0,
            max_hours_per_workweek: 56.0,
            ..Default::default()
        },
        WorkerInput {
            user_id: 2,
            min_hours_per_workweek: 40.0,
            max_hours_per_workweek: 56.0,
            ..Default::default()
        },
    ];

    // every day of the week, back-to-back 8-hour shifts with no breathing
    // room: two workers cannot both take a day off and still cover seven
    // consecutive days of double shifts.
    let mut shifts = Vec::new();
    for day_offset in 0..7i64 {
        let day = week_start + chrono::Duration::days(day_offset);
        let morning_start = Los_Angeles
            .from_local_datetime(&day.and_hms_opt(6, 0, 0).unwrap())
            .single()
            .unwrap();
        let morning_stop = Los_Angeles
            .from_local_datetime(&day.and_hms_opt(14, 0, 0).unwrap())
            .single()
            .unwrap();
        let evening_start = Los_Angeles
            .from_local_datetime(&day.and_hms_opt(14, 0, 0).unwrap())
            .single()
            .unwrap();
        let evening_stop = Los_Angeles
            .from_local_datetime(&day.and_hms_opt(22, 0, 0).unwrap())
            .single()
            .unwrap();
        shifts.push(Shift::new((day_offset * 2 + 1) as u64, morning_start, morning_stop));
        shifts.push(Shift::new((day_offset * 2 + 2) as u64, evening_start, evening_stop));
    }

    DemoFixture {
        environment,
        worker_inputs,
        shifts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_shift_fixture_has_one_worker_and_one_shift() {
        let f = generate(DemoData::S1);
        assert_eq!(f.worker_inputs.len(), 1);
        assert_eq!(f.shifts.len(), 1);
    }

    #[test]
    fn courier_fixture_matches_scenario_s4_shape() {
        let f = generate(DemoData::S4);
        assert_eq!(f.worker_inputs.len(), 12);
        assert_eq!(f.shifts.len(), 82);
        assert!(f.worker_inputs[0].availability == Some(Grid::all_false()));
        assert!(!f.worker_inputs[1].preceding_shifts.is_empty());
    }

    #[test]
    fn over_constrained_fixture_packs_every_day() {
        let f = generate(DemoData::S5);
        assert_eq!(f.shifts.len(), 14);
        assert_eq!(f.worker_inputs.len(), 2);
    }

    #[test]
    fn demo_data_round_trips_through_str() {
        for name in list_demo_data() {
            let parsed: DemoData = name.parse().unwrap();
            assert_eq!(parsed.as_str(), name);
        }
        assert!("bogus".parse::<DemoData>().is_err());
    }
}
