//! Per-tier timing harness over the demo fixtures.
//!
//! Run with: cargo run --release --bin bench

use std::time::Instant;

use mobius_assign::config::Config;
use mobius_assign::demo_data::{self, DemoData};
use mobius_assign::engine::Engine;
use mobius_assign::solver::good_lp_backend::GoodLpSession;
use mobius_assign::worker::Worker;

fn main() {
    let config = Config::default();

    for demo in [DemoData::S1, DemoData::S4, DemoData::S5, DemoData::S6] {
        let fixture = demo_data::generate(demo);
        let n_shifts = fixture.shifts.len();
        let n_workers = fixture.worker_inputs.len();

        let workers: Vec<Worker> = fixture
            .worker_inputs
            .into_iter()
            .map(|input| Worker::new(&fixture.environment, &config, input))
            .filter(Worker::has_feasible_minimum)
            .collect();

        println!("{}: {} workers, {} shifts", demo.as_str(), n_workers, n_shifts);

        let mut engine = Engine::new(fixture.environment, workers, fixture.shifts, config.clone());

        let start = Instant::now();
        match engine.calculate(GoodLpSession::new) {
            Ok(report) => {
                println!(
                    "  solved in {:?} (consecutive_days_off={}, happiness={}, unassigned={}, objective={:.1})",
                    start.elapsed(),
                    report.consecutive_days_off,
                    report.happiness_scoring,
                    report.unassigned_shift_ids.len(),
                    report.objective_value
                );
            }
            Err(e) => println!("  failed after {:?}: {e}", start.elapsed()),
        }
        println!();
    }
}
