//! [`SolverSession`] over `good_lp`'s `microlp` backend: a pure-Rust MIP
//! solver needing no system solver library. Variable/constraint
//! construction is buffered and only handed to `good_lp` when
//! [`optimize`](SolverSession::optimize) runs, since `good_lp`'s builder
//! API consumes itself on every `.with(...)` call.

use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use good_lp::{variable, Expression, ProblemVariables, Solution, SolverModel};

use super::{Cmp, Constraint, Expr, Sense, SolverSession, Status, Var};

#[derive(Debug, Clone, Copy)]
enum Kind {
    Binary,
    Integer(f64, f64),
    Continuous(f64, f64),
}

pub struct GoodLpSession {
    kinds: Vec<Kind>,
    constraints: Vec<Constraint>,
    objective: Option<(Sense, Expr)>,
    time_limit: Option<Duration>,
    values: Vec<f64>,
    objective_value: f64,
    status: Status,
}

impl Default for GoodLpSession {
    fn default() -> Self {
        GoodLpSession {
            kinds: Vec::new(),
            constraints: Vec::new(),
            objective: None,
            time_limit: None,
            values: Vec::new(),
            objective_value: 0.0,
            status: Status::Infeasible,
        }
    }
}

impl GoodLpSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_expression(expr: &Expr, good_lp_vars: &[good_lp::Variable]) -> Expression {
        let mut out = Expression::from(expr.constant);
        for (var, coef) in &expr.terms {
            out += good_lp_vars[var.0] * *coef;
        }
        out
    }

    fn eval_expression(expr: &Expr, values: &[f64]) -> f64 {
        expr.constant
            + expr
                .terms
                .iter()
                .map(|(v, c)| c * values.get(v.0).copied().unwrap_or(0.0))
                .sum::<f64>()
    }
}

impl SolverSession for GoodLpSession {
    fn add_binary_var(&mut self) -> Var {
        self.kinds.push(Kind::Binary);
        Var(self.kinds.len() - 1)
    }

    fn add_integer_var(&mut self, lo: f64, hi: f64) -> Var {
        self.kinds.push(Kind::Integer(lo, hi));
        Var(self.kinds.len() - 1)
    }

    fn add_continuous_var(&mut self, lo: f64, hi: f64) -> Var {
        self.kinds.push(Kind::Continuous(lo, hi));
        Var(self.kinds.len() - 1)
    }

    fn add_linear_constraint(&mut self, lhs: Expr, cmp: Cmp, rhs: Expr) {
        self.constraints.push(Constraint { lhs, cmp, rhs });
    }

    fn set_objective(&mut self, sense: Sense, expr: Expr) {
        self.objective = Some((sense, expr));
    }

    fn set_time_limit(&mut self, seconds: u64) {
        self.time_limit = Some(Duration::from_secs(seconds));
    }

    fn read_params(&mut self, path: &Path) -> std::io::Result<()> {
        // microlp has no tuning-file surface; this only confirms the file
        // the task expects to ship is actually present.
        if path.exists() {
            tracing::debug!(path = %path.display(), "solver tuning file present, ignored by microlp");
            Ok(())
        } else {
            tracing::warn!(path = %path.display(), "solver tuning file missing");
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "tuning file not found"))
        }
    }

    fn optimize(&mut self) -> Status {
        let kinds = self.kinds.clone();
        let constraints = self.constraints.clone();
        let objective = self.objective.clone();
        let time_limit = self.time_limit;

        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let mut vars = ProblemVariables::new();
            let mut good_lp_vars = Vec::with_capacity(kinds.len());
            for kind in &kinds {
                let def = match *kind {
                    Kind::Binary => variable().binary(),
                    Kind::Integer(lo, hi) => variable().integer().min(lo).max(hi),
                    Kind::Continuous(lo, hi) => variable().min(lo).max(hi),
                };
                good_lp_vars.push(vars.add(def));
            }

            let (sense, objective_expr) = objective.unwrap_or((Sense::Minimize, Expr::constant(0.0)));
            let objective = Self::build_expression(&objective_expr, &good_lp_vars);
            let mut problem = match sense {
                Sense::Maximize => vars.maximise(objective).using(good_lp::microlp),
                Sense::Minimize => vars.minimise(objective).using(good_lp::microlp),
            };

            for c in &constraints {
                let lhs = Self::build_expression(&c.lhs, &good_lp_vars);
                let rhs = Self::build_expression(&c.rhs, &good_lp_vars);
                problem = match c.cmp {
                    Cmp::Le => problem.with(lhs.leq(rhs)),
                    Cmp::Ge => problem.with(lhs.geq(rhs)),
                    Cmp::Eq => problem.with(lhs.eq(rhs)),
                };
            }

            let result = problem.solve();
            let _ = tx.send(result.map(|solution| {
                good_lp_vars.iter().map(|v| solution.value(*v)).collect::<Vec<f64>>()
            }));
        });

        let recv_result = match time_limit {
            Some(limit) => rx.recv_timeout(limit),
            None => rx.recv().map_err(|_| mpsc::RecvTimeoutError::Disconnected),
        };

        match recv_result {
            Ok(Ok(values)) => {
                self.objective_value = self
                    .objective
                    .as_ref()
                    .map(|(_, expr)| Self::eval_expression(expr, &values))
                    .unwrap_or(0.0);
                self.values = values;
                self.status = Status::Optimal;
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "solver did not reach an optimum");
                self.status = Status::Infeasible;
            }
            Err(_) => {
                // timed out; let the solver thread finish in the background,
                // we just stop waiting for it.
                self.status = Status::Timeout;
            }
        }
        let _ = handle; // thread is detached on timeout, joined implicitly otherwise
        self.status
    }

    fn status(&self) -> Status {
        self.status
    }

    fn value(&self, var: Var) -> f64 {
        self.values.get(var.0).copied().unwrap_or(0.0)
    }

    fn objective_value(&self) -> f64 {
        self.objective_value
    }
}
