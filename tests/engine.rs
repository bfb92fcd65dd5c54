//! End-to-end scenarios S1-S6 (spec §8), run against the public crate
//! surface rather than module-private internals.

use mobius_assign::config::Config;
use mobius_assign::demo_data::{self, DemoData};
use mobius_assign::engine::Engine;
use mobius_assign::solver::good_lp_backend::GoodLpSession;
use mobius_assign::solver::reference::ReferenceSession;
use mobius_assign::worker::Worker;

fn build_workers(fixture: &demo_data::DemoFixture, config: &Config) -> Vec<Worker> {
    fixture
        .worker_inputs
        .iter()
        .cloned()
        .map(|input| Worker::new(&fixture.environment, config, input))
        .filter(Worker::has_feasible_minimum)
        .collect()
}

/// S1 - single worker, single shift, full availability, no preferences:
/// the shift is assigned and the objective carries no unassigned penalty.
#[test]
fn s1_single_worker_single_shift_is_assigned() {
    let config = Config::default();
    let fixture = demo_data::generate(DemoData::S1);
    let workers = build_workers(&fixture, &config);
    let mut engine = Engine::new(fixture.environment, workers, fixture.shifts, config);

    let report = engine.calculate(ReferenceSession::new).expect("tier 1 should be optimal");

    assert!(report.unassigned_shift_ids.is_empty());
    assert_eq!(engine.shifts[0].user_id, 1);
}

/// S2 - availability predicate boundaries: the in-bounds shift is
/// assignable, the out-of-bounds and one-minute-bleed shifts are not, and
/// the cross-midnight and ends-at-midnight shifts behave per the
/// single-day attribution rule.
#[test]
fn s2_availability_boundaries() {
    let config = Config::default();
    let fixture = demo_data::generate(DemoData::S2);
    let workers = build_workers(&fixture, &config);
    assert_eq!(workers.len(), 1);
    let worker = &workers[0];

    let by_id = |id: u64| fixture.shifts.iter().find(|s| s.shift_id == id).unwrap();

    assert!(worker.available_to_work(&fixture.environment, by_id(1)), "fully inside availability");
    assert!(!worker.available_to_work(&fixture.environment, by_id(2)), "hour 2 is unavailable");
    assert!(!worker.available_to_work(&fixture.environment, by_id(3)), "one minute of bleed");
    assert!(
        worker.available_to_work(&fixture.environment, by_id(4)),
        "cross-midnight shift covered on both sides"
    );
    assert!(
        worker.available_to_work(&fixture.environment, by_id(5)),
        "shift ending exactly at midnight is attributed to the start day only"
    );
}

/// S3 - time-off handling: only the worker whose request was denied keeps
/// Tuesday availability, so the Tuesday shift must land on them.
#[test]
fn s3_time_off_handling() {
    let config = Config::default();
    let fixture = demo_data::generate(DemoData::S3);
    let workers = build_workers(&fixture, &config);
    let mut engine = Engine::new(fixture.environment, workers, fixture.shifts, config);

    let report = engine.calculate(ReferenceSession::new).expect("tier 1 should be optimal");

    assert!(report.unassigned_shift_ids.is_empty());
    let tuesday_shift = engine.shifts.iter().find(|s| s.shift_id == 2).unwrap();
    assert_eq!(tuesday_shift.user_id, 2, "only the denied worker keeps Tuesday availability");
}

/// S4 - courier fixture: 12 workers, 82 shifts, one worker with zero
/// availability. The engine still returns a feasible assignment, and the
/// zero-availability worker's weekly minimum is reported as unmet.
#[test]
fn s4_courier_fixture_is_feasible() {
    let config = Config::default();
    let fixture = demo_data::generate(DemoData::S4);
    // This scenario is about the engine's own handling of a present-but-
    // unsatisfiable worker (spec §8 S4), not the task-loader pruning rule
    // in §6 - so every worker is passed through unfiltered, including the
    // zero-availability one that `Worker::has_feasible_minimum` would
    // otherwise screen out upstream.
    let workers: Vec<Worker> = fixture
        .worker_inputs
        .iter()
        .cloned()
        .map(|input| Worker::new(&fixture.environment, &config, input))
        .collect();
    assert_eq!(workers.len(), 12);
    let zero_availability_user = workers[0].user_id;

    let mut engine = Engine::new(fixture.environment, workers, fixture.shifts, config);
    let report = engine
        .calculate(GoodLpSession::new)
        .expect("courier week should reach an optimum on some tier");

    let zero_availability_report = report
        .workers
        .iter()
        .find(|w| w.user_id == zero_availability_user)
        .expect("every worker gets a report entry");
    assert!(
        zero_availability_report.min_hours_violated,
        "a worker with no available hours can never meet a positive weekly minimum"
    );

    for shift in &engine.shifts {
        if shift.is_assigned() {
            assert!(report.unassigned_shift_ids.iter().all(|&id| id != shift.shift_id));
        }
    }
}

/// S5 - fallback promotion: min-separation and consecutive-days-off
/// jointly make the week infeasible for a tiny crew, so the engine must
/// escalate through the tiers and still return a result at tier 3.
#[test]
fn s5_fallback_promotion_still_produces_a_result() {
    let config = Config::default();
    let fixture = demo_data::generate(DemoData::S5);
    let workers = build_workers(&fixture, &config);

    let mut engine = Engine::new(fixture.environment, workers, fixture.shifts, config);
    let report = engine
        .calculate(GoodLpSession::new)
        .expect("some tier must reach an optimum");

    assert!(
        !report.consecutive_days_off || !report.happiness_scoring,
        "an over-constrained week should not be satisfiable at the first tier"
    );
}

/// S6 - applier correctness: after a solve, every shift is either assigned
/// to exactly one worker or remains unassigned; there is no third state.
#[test]
fn s6_applier_correctness() {
    let config = Config::default();
    let fixture = demo_data::generate(DemoData::S6);
    let workers = build_workers(&fixture, &config);
    let shift_ids: Vec<u64> = fixture.shifts.iter().map(|s| s.shift_id).collect();

    let mut engine = Engine::new(fixture.environment, workers, fixture.shifts, config);
    let report = engine
        .calculate(GoodLpSession::new)
        .expect("courier-lite week should reach an optimum");

    for shift in &engine.shifts {
        let unassigned = report.unassigned_shift_ids.contains(&shift.shift_id);
        assert_eq!(
            !shift.is_assigned(),
            unassigned,
            "shift {} should be assigned iff it is absent from unassigned_shift_ids",
            shift.shift_id
        );
    }
    // every originally-posted shift is still accounted for exactly once
    let mut reported: Vec<u64> = engine.shifts.iter().map(|s| s.shift_id).collect();
    reported.sort_unstable();
    let mut expected = shift_ids;
    expected.sort_unstable();
    assert_eq!(reported, expected);
}
