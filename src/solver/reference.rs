//! A small backtracking [`SolverSession`] used only by unit tests, so the
//! engine's constraint construction can be exercised without pulling in a
//! real MIP backend.
//!
//! Variables are assigned one at a time in index order. A constraint is
//! checked as soon as every variable it references has a value, so most
//! branches die immediately instead of enumerating the full cross product.
//! Where a variable is pinned exactly by a ready equality (true for every
//! accounting variable this engine builds - `week_minutes_sum`,
//! `day_shifts_sum`, ...) its value is solved for directly rather than
//! guessed.

use std::path::Path;

use super::{Cmp, Constraint, Expr, Sense, SolverSession, Status, Var};

#[derive(Debug, Clone, Copy)]
enum Kind {
    Binary,
    Integer(f64, f64),
    Continuous(f64, f64),
}

impl Kind {
    fn bounds(self) -> (f64, f64) {
        match self {
            Kind::Binary => (0.0, 1.0),
            Kind::Integer(lo, hi) => (lo, hi),
            Kind::Continuous(lo, hi) => (lo, hi),
        }
    }
}

pub struct ReferenceSession {
    kinds: Vec<Kind>,
    constraints: Vec<Constraint>,
    objective: Option<(Sense, Expr)>,
    best: Option<(f64, Vec<f64>)>,
    status: Status,
}

impl Default for ReferenceSession {
    fn default() -> Self {
        ReferenceSession {
            kinds: Vec::new(),
            constraints: Vec::new(),
            objective: None,
            best: None,
            status: Status::Infeasible,
        }
    }
}

const EPS: f64 = 1e-6;

fn flip(cmp: Cmp) -> Cmp {
    match cmp {
        Cmp::Le => Cmp::Ge,
        Cmp::Ge => Cmp::Le,
        Cmp::Eq => Cmp::Eq,
    }
}

impl ReferenceSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn eval(expr: &Expr, assignment: &[f64]) -> f64 {
        expr.constant
            + expr
                .terms
                .iter()
                .map(|(v, c)| c * assignment.get(v.0).copied().unwrap_or(0.0))
                .sum::<f64>()
    }

    fn satisfies(constraint: &Constraint, assignment: &[f64]) -> bool {
        let lhs = Self::eval(&constraint.lhs, assignment);
        let rhs = Self::eval(&constraint.rhs, assignment);
        match constraint.cmp {
            Cmp::Le => lhs <= rhs + EPS,
            Cmp::Ge => lhs >= rhs - EPS,
            Cmp::Eq => (lhs - rhs).abs() <= EPS,
        }
    }

    /// The highest variable index a constraint references, or `None` if it
    /// references no variable at all (a degenerate constant constraint).
    fn max_var(constraint: &Constraint) -> Option<usize> {
        constraint
            .lhs
            .terms
            .iter()
            .chain(constraint.rhs.terms.iter())
            .map(|(v, _)| v.0)
            .max()
    }

    /// Rewrites `constraint` as `coefficient * target <cmp> value`, given
    /// that every other variable it references already has a value. Returns
    /// `None` if `target`'s net coefficient is zero (no information).
    fn isolate(constraint: &Constraint, target: usize, assignment: &[f64]) -> Option<(f64, Cmp, f64)> {
        let mut coeff = 0.0;
        let mut known = constraint.lhs.constant - constraint.rhs.constant;
        for (v, c) in &constraint.lhs.terms {
            if v.0 == target {
                coeff += c;
            } else {
                known += c * assignment.get(v.0).copied().unwrap_or(0.0);
            }
        }
        for (v, c) in &constraint.rhs.terms {
            if v.0 == target {
                coeff -= c;
            } else {
                known -= c * assignment.get(v.0).copied().unwrap_or(0.0);
            }
        }
        if coeff.abs() < EPS {
            return None;
        }
        let rhs_val = -known / coeff;
        let cmp = if coeff > 0.0 { constraint.cmp } else { flip(constraint.cmp) };
        Some((coeff, cmp, rhs_val))
    }

    /// Bounds implied for `index` by every ready constraint that references
    /// it, given everything below `index` is already assigned. Returns
    /// `Some(exact)` if an equality pins the value outright.
    fn ready_bounds(
        &self,
        index: usize,
        assignment: &[f64],
        ready: &[Vec<usize>],
    ) -> (f64, f64, Option<f64>) {
        let mut lo = f64::NEG_INFINITY;
        let mut hi = f64::INFINITY;
        let mut exact = None;
        for &ci in &ready[index] {
            if let Some((_, cmp, val)) = Self::isolate(&self.constraints[ci], index, assignment) {
                match cmp {
                    Cmp::Eq => exact = Some(val),
                    Cmp::Le => hi = hi.min(val),
                    Cmp::Ge => lo = lo.max(val),
                }
            }
        }
        (lo, hi, exact)
    }

    fn candidates(&self, index: usize, assignment: &[f64], ready: &[Vec<usize>]) -> Vec<f64> {
        let kind = self.kinds[index];
        let (declared_lo, declared_hi) = kind.bounds();
        let (lo, hi, exact) = self.ready_bounds(index, assignment, ready);

        if let Some(v) = exact {
            if v >= declared_lo - EPS && v <= declared_hi + EPS {
                return vec![v.clamp(declared_lo, declared_hi)];
            }
            return vec![];
        }

        let lo = lo.max(declared_lo);
        let hi = hi.min(declared_hi);
        if lo > hi + EPS {
            return vec![];
        }

        match kind {
            Kind::Binary => {
                let mut opts = Vec::new();
                if lo <= EPS && hi >= -EPS {
                    opts.push(0.0);
                }
                if lo <= 1.0 + EPS && hi >= 1.0 - EPS {
                    opts.push(1.0);
                }
                opts
            }
            Kind::Integer(..) => {
                let lo_i = lo.ceil() as i64;
                let hi_i = hi.floor() as i64;
                (lo_i..=hi_i).map(|v| v as f64).collect()
            }
            // No equality pins this one (e.g. the "both off" auxiliary in
            // the consecutive-days-off linearization): take the tightest
            // feasible value, which is what an optimal MIP solve forces it
            // to anyway since it only ever appears with a positive
            // coefficient in a >= constraint.
            Kind::Continuous(..) => vec![hi],
        }
    }

    fn search(
        &self,
        index: usize,
        assignment: &mut Vec<f64>,
        ready: &[Vec<usize>],
        sense: Sense,
        objective: &Expr,
        best: &mut Option<(f64, Vec<f64>)>,
    ) {
        if index == self.kinds.len() {
            let score = Self::eval(objective, assignment);
            let better = match best {
                None => true,
                Some((b, _)) => match sense {
                    Sense::Maximize => score > *b,
                    Sense::Minimize => score < *b,
                },
            };
            if better {
                *best = Some((score, assignment.clone()));
            }
            return;
        }

        for candidate in self.candidates(index, assignment, ready) {
            assignment.push(candidate);
            let ok = ready[index]
                .iter()
                .all(|&ci| Self::satisfies(&self.constraints[ci], assignment));
            if ok {
                self.search(index + 1, assignment, ready, sense, objective, best);
            }
            assignment.pop();
        }
    }
}

impl SolverSession for ReferenceSession {
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

    fn set_time_limit(&mut self, _seconds: u64) {}

    fn read_params(&mut self, _path: &Path) -> std::io::Result<()> {
        Ok(())
    }

    fn optimize(&mut self) -> Status {
        // Constraints that reference no variable at all are checked once,
        // up front, against an empty assignment.
        for constraint in &self.constraints {
            if Self::max_var(constraint).is_none() && !Self::satisfies(constraint, &[]) {
                self.status = Status::Infeasible;
                return self.status;
            }
        }

        let mut ready: Vec<Vec<usize>> = vec![Vec::new(); self.kinds.len()];
        for (ci, constraint) in self.constraints.iter().enumerate() {
            if let Some(max) = Self::max_var(constraint) {
                ready[max].push(ci);
            }
        }

        let (sense, objective) = self.objective.clone().unwrap_or((Sense::Minimize, Expr::constant(0.0)));

        let mut best = None;
        self.search(0, &mut Vec::new(), &ready, sense, &objective, &mut best);

        match best {
            Some((score, assignment)) => {
                self.best = Some((score, assignment));
                self.status = Status::Optimal;
            }
            None => {
                self.status = Status::Infeasible;
            }
        }
        self.status
    }

    fn status(&self) -> Status {
        self.status
    }

    fn value(&self, var: Var) -> f64 {
        self.best.as_ref().and_then(|(_, a)| a.get(var.0).copied()).unwrap_or(0.0)
    }

    fn objective_value(&self) -> f64 {
        self.best.as_ref().map(|(score, _)| *score).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximizes_subject_to_a_linear_constraint() {
        let mut s = ReferenceSession::new();
        let a = s.add_binary_var();
        let b = s.add_binary_var();
        s.add_linear_constraint(Expr::from(a) + Expr::from(b), Cmp::Le, Expr::constant(1.0));
        s.set_objective(Sense::Maximize, Expr::from(a) + Expr::from(b) * 2.0);
        assert_eq!(s.optimize(), Status::Optimal);
        assert_eq!(s.value(a), 0.0);
        assert_eq!(s.value(b), 1.0);
    }

    #[test]
    fn reports_infeasible_when_no_assignment_satisfies_constraints() {
        let mut s = ReferenceSession::new();
        let a = s.add_binary_var();
        s.add_linear_constraint(Expr::from(a), Cmp::Ge, Expr::constant(2.0));
        assert_eq!(s.optimize(), Status::Infeasible);
    }

    #[test]
    fn zero_iff_indicator_forces_mutual_exclusivity() {
        let mut s = ReferenceSession::new();
        let indicator = s.add_binary_var();
        let continuous = s.add_continuous_var(0.0, 5.0);
        s.add_zero_iff_indicator(indicator, continuous, 5.0);
        s.add_linear_constraint(Expr::from(continuous), Cmp::Ge, Expr::constant(3.0));
        s.set_objective(Sense::Maximize, Expr::from(indicator));
        assert_eq!(s.optimize(), Status::Optimal);
        assert_eq!(s.value(indicator), 0.0);
    }

    #[test]
    fn solves_an_equality_defined_accounting_variable_exactly() {
        let mut s = ReferenceSession::new();
        let a = s.add_binary_var();
        let b = s.add_binary_var();
        let total = s.add_continuous_var(0.0, 1000.0);
        s.add_linear_constraint(
            Expr::from(a) * 480.0 + Expr::from(b) * 240.0,
            Cmp::Eq,
            Expr::from(total),
        );
        s.add_linear_constraint(Expr::from(a) + Expr::from(b), Cmp::Le, Expr::constant(1.0));
        s.set_objective(Sense::Maximize, Expr::from(total));
        assert_eq!(s.optimize(), Status::Optimal);
        assert_eq!(s.value(total), 480.0);
    }
}
