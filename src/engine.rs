//! The assignment engine: builds the MIP model for one week and runs the
//! three-tier feasibility fallback described in `mobius.assign.Assign`.

use chrono::Duration;

use crate::config::Config;
use crate::environment::Environment;
use crate::error::AssignError;
use crate::shift::Shift;
use crate::solver::{Cmp, Expr, Sense, SolverSession, Status};
use crate::time::{self, Day, ALL_DAYS};
use crate::worker::Worker;

const MINUTES_PER_HOUR: f64 = 60.0;

/// Per-worker outcome of a successful calculation.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub user_id: u64,
    pub assigned_minutes: i64,
    pub min_hours_violated: bool,
}

#[derive(Debug, Clone)]
pub struct CalculationReport {
    pub consecutive_days_off: bool,
    pub happiness_scoring: bool,
    pub objective_value: f64,
    pub unassigned_shift_ids: Vec<u64>,
    pub workers: Vec<WorkerReport>,
}

pub struct Engine {
    pub environment: Environment,
    pub workers: Vec<Worker>,
    pub shifts: Vec<Shift>,
    pub config: Config,
}

impl Engine {
    pub fn new(environment: Environment, workers: Vec<Worker>, mut shifts: Vec<Shift>, config: Config) -> Self {
        shifts.sort_by_key(|s| s.start);
        tracing::info!(
            workers = workers.len(),
            shifts = shifts.len(),
            "initialized assignment problem"
        );
        Engine {
            environment,
            workers,
            shifts,
            config,
        }
    }

    /// Runs the three escalating feasibility tiers, returning the first
    /// tier that reaches an optimum. Only the final tier's failure
    /// propagates.
    pub fn calculate<F, S>(&mut self, mut make_solver: F) -> Result<CalculationReport, AssignError>
    where
        F: FnMut() -> S,
        S: SolverSession,
    {
        tracing::info!("trying consecutive days off with happiness");
        match self.try_calculate(&mut make_solver(), true, true) {
            Ok(report) => return Ok(report),
            Err(e) => tracing::info!(error = %e, "consecutive days off with happiness failed"),
        }

        tracing::info!("trying consecutive days off without happiness");
        match self.try_calculate(&mut make_solver(), true, false) {
            Ok(report) => return Ok(report),
            Err(e) => tracing::info!(error = %e, "consecutive days off without happiness failed"),
        }

        tracing::info!("trying without consecutive days off or happiness");
        self.try_calculate(&mut make_solver(), false, false)
    }

    fn try_calculate<S: SolverSession>(
        &mut self,
        solver: &mut S,
        consecutive_days_off: bool,
        happiness_scoring: bool,
    ) -> Result<CalculationReport, AssignError> {
        if happiness_scoring {
            solver.set_time_limit(self.config.happy_calculation_timeout_seconds);
        }

        let tune_path = std::path::Path::new(&self.config.tune_file);
        match solver.read_params(tune_path) {
            Ok(()) => tracing::info!("loaded tuned model"),
            Err(_) => tracing::info!("no tune file found"),
        }

        let model = self.build_model(solver, consecutive_days_off, happiness_scoring);

        match solver.optimize() {
            Status::Optimal => {}
            Status::Timeout => return Err(AssignError::SolverTimeout),
            Status::Infeasible => {
                return Err(AssignError::SolverInfeasible("non-optimal status".to_string()))
            }
        }

        Ok(self.apply_result(solver, &model, consecutive_days_off, happiness_scoring))
    }

    fn build_model<S: SolverSession>(
        &self,
        solver: &mut S,
        consecutive_days_off: bool,
        happiness_scoring: bool,
    ) -> Model {
        use std::collections::HashMap;

        let mut assignments = HashMap::new();
        let mut unassigned = HashMap::new();
        let mut objective = Expr::constant(0.0);

        for worker in &self.workers {
            for shift in &self.shifts {
                let var = solver.add_binary_var();
                assignments.insert((worker.user_id, shift.shift_id), var);

                if happiness_scoring {
                    let score = worker.shift_happiness_score(shift);
                    objective = objective + Expr::from(var) * score;
                }
            }
        }
        for shift in &self.shifts {
            let var = solver.add_binary_var();
            unassigned.insert(shift.shift_id, var);
            objective = objective + Expr::from(var) * self.config.unassigned_penalty;
        }

        let mut min_week_hours_violation = HashMap::new();
        let mut week_minutes_sum = HashMap::new();
        let mut day_shifts_sum = HashMap::new();
        let mut day_active = HashMap::new();

        let max_shift_minutes_week: f64 = self.shifts.iter().map(|s| s.total_minutes() as f64).sum();

        for worker in &self.workers {
            let violation = solver.add_binary_var();
            min_week_hours_violation.insert(worker.user_id, violation);
            objective = objective + Expr::from(violation) * self.config.min_hours_violation_penalty;

            let week_sum = solver.add_continuous_var(0.0, max_shift_minutes_week.max(1.0));
            week_minutes_sum.insert(worker.user_id, week_sum);

            for day in ALL_DAYS {
                let shifts_on_day = self
                    .shifts
                    .iter()
                    .filter(|s| day_attributed_to(s, day, self.environment.stop))
                    .count() as f64;

                let sum_var = solver.add_integer_var(0.0, shifts_on_day.max(1.0));
                day_shifts_sum.insert((worker.user_id, day), sum_var);

                let active_var = solver.add_binary_var();
                day_active.insert((worker.user_id, day), active_var);
            }
        }

        // one worker (or nobody) per shift
        for shift in &self.shifts {
            let sum = Expr::weighted_sum(
                self.workers
                    .iter()
                    .map(|w| (assignments[&(w.user_id, shift.shift_id)], 1.0)),
            ) + Expr::from(unassigned[&shift.shift_id]);
            solver.add_linear_constraint(sum, Cmp::Eq, Expr::constant(1.0));
        }

        // disallow back-to-back shifts closer than min_minutes_between_shifts
        let pad = Duration::minutes(self.environment.min_minutes_between_shifts as i64);
        for test in &self.shifts {
            for other in &self.shifts {
                if other.shift_id == test.shift_id {
                    continue;
                }
                if time::overlap(other.start, other.stop, test.start, test.stop + pad) {
                    for worker in &self.workers {
                        let a = assignments[&(worker.user_id, test.shift_id)];
                        let b = assignments[&(worker.user_id, other.shift_id)];
                        solver.add_linear_constraint(
                            Expr::from(a) + Expr::from(b),
                            Cmp::Le,
                            Expr::constant(1.0),
                        );
                    }
                }
            }
        }

        // at least one weekend-style pair of consecutive days off. A[w,d]=1
        // means "active on day d" (constraint 8), so the off indicator for
        // a day is its complement, 1 - A[w,d].
        if consecutive_days_off {
            for worker in &self.workers {
                let week_days = self.environment.week_days();
                let mut day_off_sum = Expr::constant(0.0);
                for (i, &day) in week_days.iter().enumerate() {
                    let active = day_active[&(worker.user_id, day)];
                    let off = Expr::constant(1.0) - Expr::from(active);
                    if i == 0 {
                        if !worker.preceding_day_worked {
                            day_off_sum = day_off_sum + off;
                        }
                    } else {
                        let previous = week_days[i - 1];
                        let prev_active = day_active[&(worker.user_id, previous)];
                        let prev_off = Expr::constant(1.0) - Expr::from(prev_active);
                        // off*prev_off linearized: both off.
                        // z <= off, z <= prev_off, z >= off+prev_off-1.
                        let z = solver.add_continuous_var(0.0, 1.0);
                        solver.add_linear_constraint(Expr::from(z), Cmp::Le, off.clone());
                        solver.add_linear_constraint(Expr::from(z), Cmp::Le, prev_off.clone());
                        solver.add_linear_constraint(Expr::from(z), Cmp::Ge, off + prev_off - Expr::constant(1.0));
                        day_off_sum = day_off_sum + Expr::from(z);
                    }
                }
                solver.add_linear_constraint(day_off_sum, Cmp::Ge, Expr::constant(1.0));
            }
        }

        // availability
        for worker in &self.workers {
            for shift in &self.shifts {
                if !worker.available_to_work(&self.environment, shift) {
                    let a = assignments[&(worker.user_id, shift.shift_id)];
                    solver.add_linear_constraint(Expr::from(a), Cmp::Eq, Expr::constant(0.0));
                }
            }
        }

        // weekly minutes accumulation, min/max bounds, daily shift-count SOS1
        for worker in &self.workers {
            let sum_expr = Expr::weighted_sum(self.shifts.iter().map(|s| {
                (
                    assignments[&(worker.user_id, s.shift_id)],
                    s.total_minutes() as f64,
                )
            }));
            solver.add_linear_constraint(
                sum_expr,
                Cmp::Eq,
                Expr::from(week_minutes_sum[&worker.user_id]),
            );

            solver.add_linear_constraint(
                Expr::from(week_minutes_sum[&worker.user_id]),
                Cmp::Le,
                Expr::constant(worker.max_hours_per_workweek * MINUTES_PER_HOUR),
            );

            let violation = min_week_hours_violation[&worker.user_id];
            solver.add_linear_constraint(
                Expr::from(week_minutes_sum[&worker.user_id]),
                Cmp::Ge,
                (Expr::constant(1.0) - Expr::from(violation))
                    * (worker.min_hours_per_workweek * MINUTES_PER_HOUR),
            );

            for day in ALL_DAYS {
                let sum_var = day_shifts_sum[&(worker.user_id, day)];
                let active_var = day_active[&(worker.user_id, day)];

                solver.add_zero_iff_indicator(
                    active_var,
                    sum_var,
                    (self.shifts.len() as f64).max(1.0),
                );

                let shifts_that_day: Vec<_> = self
                    .shifts
                    .iter()
                    .filter(|s| day_attributed_to(s, day, self.environment.stop))
                    .collect();
                let count_expr = Expr::weighted_sum(
                    shifts_that_day
                        .iter()
                        .map(|s| (assignments[&(worker.user_id, s.shift_id)], 1.0)),
                );
                solver.add_linear_constraint(count_expr, Cmp::Eq, Expr::from(sum_var));

                solver.add_linear_constraint(
                    Expr::from(sum_var) + Expr::from(active_var),
                    Cmp::Ge,
                    Expr::constant(1.0),
                );
            }
        }

        // max minutes per workday, one calendar day at a time
        let mut workday_start = self.environment.start;
        while workday_start < self.environment.stop {
            let workday_stop = workday_start + Duration::days(1);
            for worker in &self.workers {
                let overlapping: Vec<_> = self
                    .shifts
                    .iter()
                    .filter(|s| time::overlap(s.start, s.stop, workday_start, workday_stop))
                    .collect();
                if overlapping.is_empty() {
                    continue;
                }
                let expr = Expr::weighted_sum(overlapping.iter().map(|s| {
                    (
                        assignments[&(worker.user_id, s.shift_id)],
                        s.minutes_overlap(workday_start, workday_stop) as f64,
                    )
                }));
                solver.add_linear_constraint(
                    expr,
                    Cmp::Le,
                    Expr::constant(self.environment.max_minutes_per_workday as f64),
                );
            }
            workday_start = workday_stop;
        }

        solver.set_objective(Sense::Maximize, objective);

        Model {
            assignments,
            unassigned,
            min_week_hours_violation,
            week_minutes_sum,
        }
    }

    fn apply_result<S: SolverSession>(
        &mut self,
        solver: &S,
        model: &Model,
        consecutive_days_off: bool,
        happiness_scoring: bool,
    ) -> CalculationReport {
        let mut worker_reports = Vec::with_capacity(self.workers.len());

        for worker in &self.workers {
            let violated = solver.value(model.min_week_hours_violation[&worker.user_id]) > 0.5;
            if violated {
                tracing::info!(user_id = worker.user_id, "unable to meet min hours for week");
            }
            let assigned_minutes = solver.value(model.week_minutes_sum[&worker.user_id]).round() as i64;
            worker_reports.push(WorkerReport {
                user_id: worker.user_id,
                assigned_minutes,
                min_hours_violated: violated,
            });
        }

        for shift in &mut self.shifts {
            for worker in &self.workers {
                let var = model.assignments[&(worker.user_id, shift.shift_id)];
                if solver.value(var) > 0.5 {
                    tracing::info!(user_id = worker.user_id, shift_id = shift.shift_id, "assigned shift");
                    shift.user_id = worker.user_id;
                }
            }
        }

        let unassigned_shift_ids: Vec<u64> = self
            .shifts
            .iter()
            .filter(|s| !s.is_assigned())
            .map(|s| s.shift_id)
            .collect();

        tracing::info!(
            unassigned = unassigned_shift_ids.len(),
            total = self.shifts.len(),
            "calculation complete"
        );

        CalculationReport {
            consecutive_days_off,
            happiness_scoring,
            objective_value: solver.objective_value(),
            unassigned_shift_ids,
            workers: worker_reports,
        }
    }
}

struct Model {
    assignments: std::collections::HashMap<(u64, u64), crate::solver::Var>,
    unassigned: std::collections::HashMap<u64, crate::solver::Var>,
    min_week_hours_violation: std::collections::HashMap<u64, crate::solver::Var>,
    week_minutes_sum: std::collections::HashMap<u64, crate::solver::Var>,
}

/// A shift counts against `day` if it starts on `day`, or if it stops on
/// `day` and that stop is still within the week (a shift crossing the
/// week boundary is attributed only to its start day).
fn day_attributed_to(shift: &Shift, day: Day, environment_stop: chrono::DateTime<chrono_tz::Tz>) -> bool {
    time::day_of(shift.start) == day || (time::day_of(shift.stop) == day && shift.stop <= environment_stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::solver::reference::ReferenceSession;
    use crate::worker::WorkerInput;
    use chrono::TimeZone;
    use chrono_tz::America::Los_Angeles;

    fn env() -> Environment {
        Environment::new(
            1,
            1,
            1,
            1,
            Los_Angeles,
            chrono::Utc.with_ymd_and_hms(2015, 12, 21, 8, 0, 0).unwrap(),
            chrono::Utc.with_ymd_and_hms(2015, 12, 22, 8, 0, 0).unwrap(),
            Day::Monday,
            0,
            8 * 60,
            0,
            6,
        )
    }

    fn dt(h: u32) -> chrono::DateTime<chrono_tz::Tz> {
        Los_Angeles.with_ymd_and_hms(2015, 12, 21, h, 0, 0).single().unwrap()
    }

    #[test]
    fn single_worker_single_shift_gets_assigned() {
        let e = env();
        let cfg = Config::default();
        let worker = Worker::new(
            &e,
            &cfg,
            WorkerInput {
                user_id: 1,
                min_hours_per_workweek: 0.0,
                max_hours_per_workweek: 40.0,
                ..Default::default()
            },
        );
        let shift = Shift::new(1, dt(9), dt(17));
        let mut engine = Engine::new(e, vec![worker], vec![shift], cfg);

        let report = engine
            .calculate(ReferenceSession::new)
            .expect("calculation should succeed");

        assert!(report.unassigned_shift_ids.is_empty());
        assert_eq!(engine.shifts[0].user_id, 1);
    }

    #[test]
    fn unavailable_worker_leaves_shift_unassigned() {
        let e = env();
        let cfg = Config::default();
        let worker = Worker::new(
            &e,
            &cfg,
            WorkerInput {
                user_id: 1,
                min_hours_per_workweek: 0.0,
                max_hours_per_workweek: 40.0,
                availability: Some(crate::worker::Grid::all_false()),
                ..Default::default()
            },
        );
        let shift = Shift::new(1, dt(9), dt(17));
        let mut engine = Engine::new(e, vec![worker], vec![shift], cfg);

        let report = engine
            .calculate(ReferenceSession::new)
            .expect("calculation should succeed even with an unassigned shift");

        assert_eq!(report.unassigned_shift_ids, vec![1]);
    }
}
