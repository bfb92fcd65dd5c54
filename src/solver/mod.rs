//! Backend-agnostic MIP session. [`Engine`](crate::engine::Engine) builds
//! its constraint model purely in terms of [`SolverSession`], so it can run
//! against the real [`good_lp_backend::GoodLpSession`] in production and
//! against [`reference::ReferenceSession`] in unit tests without a solver
//! dependency.

pub mod good_lp_backend;
pub mod reference;

use std::ops::{Add, Mul, Neg, Sub};

/// An opaque handle to a decision variable. Only the session that created
/// it can resolve it to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Var(pub usize);

/// A linear combination of variables plus a constant.
#[derive(Debug, Clone, Default)]
pub struct Expr {
    pub terms: Vec<(Var, f64)>,
    pub constant: f64,
}

impl Expr {
    pub fn constant(c: f64) -> Expr {
        Expr {
            terms: Vec::new(),
            constant: c,
        }
    }

    pub fn sum(vars: impl IntoIterator<Item = Var>) -> Expr {
        Expr {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    pub fn weighted_sum(terms: impl IntoIterator<Item = (Var, f64)>) -> Expr {
        Expr {
            terms: terms.into_iter().collect(),
            constant: 0.0,
        }
    }
}

impl From<Var> for Expr {
    fn from(v: Var) -> Expr {
        Expr {
            terms: vec![(v, 1.0)],
            constant: 0.0,
        }
    }
}

impl From<f64> for Expr {
    fn from(c: f64) -> Expr {
        Expr::constant(c)
    }
}

impl Add for Expr {
    type Output = Expr;
    fn add(mut self, rhs: Expr) -> Expr {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl Add<Var> for Expr {
    type Output = Expr;
    fn add(self, rhs: Var) -> Expr {
        self + Expr::from(rhs)
    }
}

impl Add<f64> for Expr {
    type Output = Expr;
    fn add(mut self, rhs: f64) -> Expr {
        self.constant += rhs;
        self
    }
}

impl Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        self + (-rhs)
    }
}

impl Sub<Var> for Expr {
    type Output = Expr;
    fn sub(self, rhs: Var) -> Expr {
        self - Expr::from(rhs)
    }
}

impl Sub<f64> for Expr {
    type Output = Expr;
    fn sub(self, rhs: f64) -> Expr {
        self + (-rhs)
    }
}

impl Neg for Expr {
    type Output = Expr;
    fn neg(mut self) -> Expr {
        for (_, coef) in self.terms.iter_mut() {
            *coef = -*coef;
        }
        self.constant = -self.constant;
        self
    }
}

impl Mul<f64> for Expr {
    type Output = Expr;
    fn mul(mut self, rhs: f64) -> Expr {
        for (_, coef) in self.terms.iter_mut() {
            *coef *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

impl Add for Var {
    type Output = Expr;
    fn add(self, rhs: Var) -> Expr {
        Expr::from(self) + Expr::from(rhs)
    }
}

impl Mul<f64> for Var {
    type Output = Expr;
    fn mul(self, rhs: f64) -> Expr {
        Expr::from(self) * rhs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Le,
    Ge,
    Eq,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    pub lhs: Expr,
    pub cmp: Cmp,
    pub rhs: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Optimal,
    Infeasible,
    Timeout,
}

/// A single MIP solve. Every call builds state on the session; [`optimize`]
/// consumes that state against the concrete backend and [`value`] reads
/// results back out.
///
/// [`optimize`]: SolverSession::optimize
/// [`value`]: SolverSession::value
pub trait SolverSession {
    fn add_binary_var(&mut self) -> Var;
    fn add_integer_var(&mut self, lo: f64, hi: f64) -> Var;
    fn add_continuous_var(&mut self, lo: f64, hi: f64) -> Var;
    fn add_linear_constraint(&mut self, lhs: Expr, cmp: Cmp, rhs: Expr);
    fn set_objective(&mut self, sense: Sense, expr: Expr);
    fn set_time_limit(&mut self, seconds: u64);

    /// Best-effort application of a solver tuning file. Backends that have
    /// no such concept (the reference session, or a solver with no tuning
    /// surface) may treat this as a no-op.
    fn read_params(&mut self, path: &std::path::Path) -> std::io::Result<()>;

    fn optimize(&mut self) -> Status;
    fn status(&self) -> Status;
    fn value(&self, var: Var) -> f64;

    /// The objective value of the last successful [`optimize`](Self::optimize)
    /// call, evaluated against the variable assignment [`value`](Self::value)
    /// reads. `0.0` if no solve has completed yet.
    fn objective_value(&self) -> f64;

    /// Encodes `indicator = 1 <=> continuous = 0` via a single big-M
    /// constraint `continuous <= big_m * (1 - indicator)`. Valid only when
    /// `continuous >= 0` and `indicator` is binary, which holds for every
    /// caller in this engine. `big_m` must dominate the largest value
    /// `continuous` can legally take.
    fn add_zero_iff_indicator(&mut self, indicator: Var, continuous: Var, big_m: f64) {
        let rhs = Expr::constant(big_m) - Expr::from(indicator) * big_m;
        self.add_linear_constraint(Expr::from(continuous), Cmp::Le, rhs);
    }
}
