//! Replays `mobius.tasking.Tasking`'s claim/process/requeue/kill control
//! flow against the [`TaskSource`]/[`ResultSink`] traits, which stand in
//! for the Staffjoy API client this crate has no business depending on.
//! None of this module performs real I/O; a production binary supplies
//! concrete implementations of both traits.

use crate::config::Config;
use crate::engine::{CalculationReport, Engine};
use crate::environment::Environment;
use crate::error::AssignError;
use crate::shift::Shift;
use crate::solver::SolverSession;
use crate::worker::{Worker, WorkerInput};

/// State a requeued schedule is patched to, matching
/// `mobius.tasking.Tasking.REQUEUE_STATE`.
pub const REQUEUE_STATE: &str = "mobius-queue";

/// Supplies one unit of work: a claimed task, and the `Environment`,
/// `WorkerInput`s, and unassigned `Shift`s it resolves to.
pub trait TaskSource {
    type Task;

    /// Claims the next pending task, or `Ok(None)` if the queue is empty.
    fn claim_task(&mut self) -> Result<Option<Self::Task>, AssignError>;
    fn environment(&mut self, task: &Self::Task) -> Result<Environment, AssignError>;
    fn worker_inputs(&mut self, task: &Self::Task, environment: &Environment) -> Result<Vec<WorkerInput>, AssignError>;
    fn shifts(&mut self, task: &Self::Task, environment: &Environment) -> Result<Vec<Shift>, AssignError>;
}

/// Persists the outcome of a processed task, or patches it back onto the
/// upstream queue on failure.
pub trait ResultSink {
    type Task;

    fn apply(&mut self, task: &Self::Task, shifts: &[Shift], report: &CalculationReport) -> Result<(), AssignError>;
    fn delete(&mut self, task: &Self::Task) -> Result<(), AssignError>;
    /// Patches the schedule back to [`REQUEUE_STATE`].
    fn requeue(&mut self, task: &Self::Task) -> Result<(), AssignError>;
}

/// Operational hooks a production binary wires to real `sleep`/host
/// control; fakes in tests just record calls.
pub trait HostControl {
    fn sleep(&mut self, seconds: u64);
    /// Invoked after `kill_delay_seconds` when `Config::kill_on_error` is
    /// set and a task failed; matches the reference worker's
    /// `os.system("shutdown -r now")` recovery trick for wedged solver
    /// connections.
    fn reboot(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NoTaskAvailable,
    NoEligibleWorkers,
    NoUnassignedShifts,
    Completed,
    Requeued,
}

pub struct Tasking<S, R> {
    config: Config,
    source: S,
    sink: R,
}

impl<S, R> Tasking<S, R>
where
    S: TaskSource,
    R: ResultSink<Task = S::Task>,
{
    pub fn new(config: Config, source: S, sink: R) -> Self {
        Tasking { config, source, sink }
    }

    /// Claims and processes a single task. On failure anywhere past the
    /// claim, the task is requeued and, if `kill_on_error` is set, the
    /// host is rebooted after `kill_delay_seconds`.
    pub fn process_next<F, Sess, H>(&mut self, make_solver: &mut F, host: &mut H) -> Result<Outcome, AssignError>
    where
        F: FnMut() -> Sess,
        Sess: SolverSession,
        H: HostControl,
    {
        let task = match self.source.claim_task()? {
            Some(t) => t,
            None => return Ok(Outcome::NoTaskAvailable),
        };

        match self.process_task(&task, make_solver) {
            Ok(outcome) => {
                self.sink.delete(&task)?;
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(error = %e, "task failed, requeuing");
                self.sink.requeue(&task)?;
                if self.config.kill_on_error {
                    host.sleep(self.config.kill_delay_seconds);
                    tracing::info!("rebooting to clear wedged solver state");
                    host.reboot();
                }
                Ok(Outcome::Requeued)
            }
        }
    }

    fn process_task<F, Sess>(&mut self, task: &S::Task, make_solver: &mut F) -> Result<Outcome, AssignError>
    where
        F: FnMut() -> Sess,
        Sess: SolverSession,
    {
        let environment = self.source.environment(task)?;
        let worker_inputs = self.source.worker_inputs(task, &environment)?;

        let workers: Vec<Worker> = worker_inputs
            .into_iter()
            .map(|input| Worker::new(&environment, &self.config, input))
            .filter(Worker::has_feasible_minimum)
            .collect();

        if workers.is_empty() {
            tracing::info!("no eligible workers");
            return Ok(Outcome::NoEligibleWorkers);
        }

        let shifts = self.source.shifts(task, &environment)?;
        if shifts.is_empty() {
            tracing::info!("no unassigned shifts");
            return Ok(Outcome::NoUnassignedShifts);
        }

        let mut engine = Engine::new(environment, workers, shifts, self.config.clone());
        let report = engine.calculate(make_solver)?;
        self.sink.apply(task, &engine.shifts, &report)?;
        Ok(Outcome::Completed)
    }

    /// Runs [`process_next`](Self::process_next) forever, sleeping for
    /// `tasking_fetch_interval_seconds` whenever the queue is empty or a
    /// claim itself fails (mirroring the reference worker's thundering-herd
    /// avoidance).
    pub fn serve<F, Sess, H>(&mut self, mut make_solver: F, mut host: H) -> !
    where
        F: FnMut() -> Sess,
        Sess: SolverSession,
        H: HostControl,
    {
        loop {
            match self.process_next(&mut make_solver, &mut host) {
                Ok(Outcome::NoTaskAvailable) => {
                    tracing::debug!("no task found, sleeping");
                    host.sleep(self.config.tasking_fetch_interval_seconds);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::info!(error = %e, "unable to fetch task, retrying");
                    host.sleep(self.config.tasking_fetch_interval_seconds);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::reference::ReferenceSession;
    use crate::time::Day;
    use chrono::TimeZone;
    use chrono_tz::America::Los_Angeles;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn env() -> Environment {
        Environment::new(
            1,
            1,
            1,
            1,
            Los_Angeles,
            chrono::Utc.with_ymd_and_hms(2015, 12, 21, 16, 0, 0).unwrap(),
            chrono::Utc.with_ymd_and_hms(2015, 12, 28, 16, 0, 0).unwrap(),
            Day::Monday,
            5 * 60,
            8 * 60,
            12 * 60,
            6,
        )
    }

    struct FixedSource {
        tasks: Vec<u64>,
        worker_inputs: Vec<WorkerInput>,
        shifts: Vec<Shift>,
        fail_environment: bool,
    }

    impl TaskSource for FixedSource {
        type Task = u64;

        fn claim_task(&mut self) -> Result<Option<u64>, AssignError> {
            Ok(self.tasks.pop())
        }

        fn environment(&mut self, _task: &u64) -> Result<Environment, AssignError> {
            if self.fail_environment {
                return Err(AssignError::MissingInterval);
            }
            Ok(env())
        }

        fn worker_inputs(&mut self, _task: &u64, _environment: &Environment) -> Result<Vec<WorkerInput>, AssignError> {
            Ok(self.worker_inputs.clone())
        }

        fn shifts(&mut self, _task: &u64, _environment: &Environment) -> Result<Vec<Shift>, AssignError> {
            Ok(self.shifts.clone())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        applied: Rc<RefCell<Vec<u64>>>,
        deleted: Rc<RefCell<Vec<u64>>>,
        requeued: Rc<RefCell<Vec<u64>>>,
    }

    impl ResultSink for RecordingSink {
        type Task = u64;

        fn apply(&mut self, task: &u64, _shifts: &[Shift], _report: &CalculationReport) -> Result<(), AssignError> {
            self.applied.borrow_mut().push(*task);
            Ok(())
        }

        fn delete(&mut self, task: &u64) -> Result<(), AssignError> {
            self.deleted.borrow_mut().push(*task);
            Ok(())
        }

        fn requeue(&mut self, task: &u64) -> Result<(), AssignError> {
            self.requeued.borrow_mut().push(*task);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingHost {
        slept: Vec<u64>,
        rebooted: bool,
    }

    impl HostControl for RecordingHost {
        fn sleep(&mut self, seconds: u64) {
            self.slept.push(seconds);
        }

        fn reboot(&mut self) {
            self.rebooted = true;
        }
    }

    fn worker_input() -> WorkerInput {
        WorkerInput {
            user_id: 1,
            min_hours_per_workweek: 0.0,
            max_hours_per_workweek: 40.0,
            ..Default::default()
        }
    }

    fn shift() -> Shift {
        Shift::new(
            1,
            Los_Angeles.with_ymd_and_hms(2015, 12, 21, 9, 0, 0).single().unwrap(),
            Los_Angeles.with_ymd_and_hms(2015, 12, 21, 17, 0, 0).single().unwrap(),
        )
    }

    #[test]
    fn no_task_available_is_reported_without_touching_the_sink() {
        let source = FixedSource {
            tasks: vec![],
            worker_inputs: vec![],
            shifts: vec![],
            fail_environment: false,
        };
        let sink = RecordingSink::default();
        let applied = sink.applied.clone();
        let mut tasking = Tasking::new(Config::default(), source, sink);
        let mut host = RecordingHost::default();

        let outcome = tasking.process_next(&mut ReferenceSession::new, &mut host).unwrap();
        assert_eq!(outcome, Outcome::NoTaskAvailable);
        assert!(applied.borrow().is_empty());
    }

    #[test]
    fn completed_task_is_applied_and_deleted() {
        let source = FixedSource {
            tasks: vec![42],
            worker_inputs: vec![worker_input()],
            shifts: vec![shift()],
            fail_environment: false,
        };
        let sink = RecordingSink::default();
        let applied = sink.applied.clone();
        let deleted = sink.deleted.clone();
        let mut tasking = Tasking::new(Config::default(), source, sink);
        let mut host = RecordingHost::default();

        let outcome = tasking.process_next(&mut ReferenceSession::new, &mut host).unwrap();
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(*applied.borrow(), vec![42]);
        assert_eq!(*deleted.borrow(), vec![42]);
    }

    #[test]
    fn empty_shift_list_is_a_no_op_completion() {
        let source = FixedSource {
            tasks: vec![7],
            worker_inputs: vec![worker_input()],
            shifts: vec![],
            fail_environment: false,
        };
        let sink = RecordingSink::default();
        let deleted = sink.deleted.clone();
        let mut tasking = Tasking::new(Config::default(), source, sink);
        let mut host = RecordingHost::default();

        let outcome = tasking.process_next(&mut ReferenceSession::new, &mut host).unwrap();
        assert_eq!(outcome, Outcome::NoUnassignedShifts);
        assert_eq!(*deleted.borrow(), vec![7]);
    }

    #[test]
    fn failed_task_is_requeued_and_kills_host_when_configured() {
        let source = FixedSource {
            tasks: vec![9],
            worker_inputs: vec![worker_input()],
            shifts: vec![shift()],
            fail_environment: true,
        };
        let sink = RecordingSink::default();
        let requeued = sink.requeued.clone();
        let mut config = Config::default();
        config.kill_on_error = true;
        config.kill_delay_seconds = 3;
        let mut tasking = Tasking::new(config, source, sink);
        let mut host = RecordingHost::default();

        let outcome = tasking.process_next(&mut ReferenceSession::new, &mut host).unwrap();
        assert_eq!(outcome, Outcome::Requeued);
        assert_eq!(*requeued.borrow(), vec![9]);
        assert_eq!(host.slept, vec![3]);
        assert!(host.rebooted);
    }

    #[test]
    fn failed_task_skips_kill_when_not_configured() {
        let source = FixedSource {
            tasks: vec![9],
            worker_inputs: vec![worker_input()],
            shifts: vec![shift()],
            fail_environment: true,
        };
        let sink = RecordingSink::default();
        let mut config = Config::default();
        config.kill_on_error = false;
        let mut tasking = Tasking::new(config, source, sink);
        let mut host = RecordingHost::default();

        let outcome = tasking.process_next(&mut ReferenceSession::new, &mut host).unwrap();
        assert_eq!(outcome, Outcome::Requeued);
        assert!(host.slept.is_empty());
        assert!(!host.rebooted);
    }
}
