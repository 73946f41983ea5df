//! Pareto enumeration by guided improvement (GIA).
//!
//! One call produces one Pareto-optimal model: starting from any
//! feasible model, assert that every objective is at least as good and
//! some objective strictly better, and iterate until unsat; the last
//! model is on the frontier. Yielding a point permanently asserts a
//! strict improvement on at least one coordinate, which excludes the
//! point and everything it dominates, so repeated calls walk the whole
//! frontier and finish with `Unsat`.
//!
//! The enumeration keeps its solver scope alive between calls; it is
//! dropped when the frontier is exhausted, on `Unknown`, or when the
//! discipline changes.

use crate::context::{Context, Objective};
use crate::maxsat;
use crate::solver::{BaseSolver, SolverResult};
use num_rational::BigRational;
use oxima_core::ast::{TermId, TermManager};
use oxima_core::error::{OximaError, Result};
use oxima_core::model::Model;
use smallvec::SmallVec;
use std::sync::atomic::Ordering;
use tracing::debug;

/// Reported objective values of one yielded frontier point.
pub type FrontierPoint = SmallVec<[BigRational; 4]>;

/// State of an active Pareto enumeration.
#[derive(Debug, Default)]
pub struct GiaPareto {
    /// Frontier points yielded so far.
    pub points_yielded: usize,
    points: Vec<FrontierPoint>,
}

impl GiaPareto {
    /// The values of every frontier point yielded by this enumeration.
    pub fn points(&self) -> &[FrontierPoint] {
        &self.points
    }
}

enum Improve {
    /// The current model is Pareto-optimal.
    Frontier,
    /// The solver gave up mid-climb.
    Unknown,
}

fn mk_ge_term(tm: &mut TermManager, a: TermId, b: TermId) -> TermId {
    if tm.sorts.is_bv(tm.sort_of(a)) {
        tm.mk_bv_ule(b, a)
    } else {
        tm.mk_ge(a, b)
    }
}

impl<S: BaseSolver> Context<S> {
    /// The active Pareto enumeration, if one is in progress.
    pub fn pareto_state(&self) -> Option<&GiaPareto> {
        self.pareto.as_ref()
    }

    /// The term whose model value is objective `i`'s raw value: the
    /// declared term, or the satisfied-weight sum of a soft group.
    fn objective_value_term(&self, i: usize, tm: &mut TermManager) -> Result<TermId> {
        let obj = self
            .objectives
            .get(i)
            .ok_or(OximaError::IndexOutOfBounds {
                index: i,
                count: self.objectives.len(),
            })?;
        match obj {
            Objective::Maximize { term, .. } | Objective::Minimize { term, .. } => Ok(*term),
            Objective::MaxSat { softs, weights, .. } => {
                Ok(maxsat::objective_term(tm, softs, weights))
            }
        }
    }

    fn objective_term_and_value(
        &self,
        i: usize,
        model: &Model,
        tm: &mut TermManager,
    ) -> Result<(TermId, TermId)> {
        let term = self.objective_value_term(i, tm)?;
        let value = model.eval(term, tm).ok_or_else(|| {
            OximaError::Internal("objective not evaluated by model".to_string())
        })?;
        Ok((term, value))
    }

    /// Formula: objective `i` is at least as good as under `model`
    /// (sign-flipped for minimization, satisfied-weight sum for soft
    /// groups).
    pub fn mk_ge(&self, i: usize, model: &Model, tm: &mut TermManager) -> Result<TermId> {
        let (term, value) = self.objective_term_and_value(i, model, tm)?;
        Ok(match &self.objectives[i] {
            Objective::Maximize { .. } | Objective::MaxSat { .. } => mk_ge_term(tm, term, value),
            Objective::Minimize { .. } => mk_ge_term(tm, value, term),
        })
    }

    /// Formula: objective `i` is at most as good as under `model`.
    pub fn mk_le(&self, i: usize, model: &Model, tm: &mut TermManager) -> Result<TermId> {
        let (term, value) = self.objective_term_and_value(i, model, tm)?;
        Ok(match &self.objectives[i] {
            Objective::Maximize { .. } | Objective::MaxSat { .. } => mk_ge_term(tm, value, term),
            Objective::Minimize { .. } => mk_ge_term(tm, term, value),
        })
    }

    /// Formula: objective `i` is strictly better than under `model`.
    pub fn mk_gt(&self, i: usize, model: &Model, tm: &mut TermManager) -> Result<TermId> {
        let le = self.mk_le(i, model, tm)?;
        Ok(tm.mk_not(le))
    }

    /// Yield the next Pareto-optimal model, or `Unsat` when the frontier
    /// is exhausted. Called with the optimization scope already pushed;
    /// the scope stays alive across yields and is popped on exit.
    pub(crate) fn execute_pareto(&mut self, tm: &mut TermManager) -> Result<SolverResult> {
        if self.pareto.is_none() {
            self.pareto = Some(GiaPareto::default());
        }
        match self.solver.check_sat(tm) {
            SolverResult::Unknown => {
                self.mark_unknown();
                self.pareto = None;
                self.solver.pop(1);
                return Ok(SolverResult::Unknown);
            }
            SolverResult::Unsat => {
                self.pareto = None;
                self.solver.pop(1);
                return Ok(SolverResult::Unsat);
            }
            SolverResult::Sat => {}
        }
        let mut current = self
            .solver
            .model()
            .cloned()
            .ok_or_else(|| OximaError::Internal("sat answer without model".to_string()))?;

        self.solver.push();
        let verdict = self.improve_to_frontier(&mut current, tm);
        self.solver.pop(1);

        match verdict? {
            Improve::Unknown => {
                self.mark_unknown();
                self.pareto = None;
                self.solver.pop(1);
                Ok(SolverResult::Unknown)
            }
            Improve::Frontier => {
                self.model = Some(current.clone());
                self.update_bound(tm, true, true);
                self.update_bound(tm, false, true);
                let n = self.objectives.len();
                let mut point = FrontierPoint::new();
                for i in 0..n {
                    point.push(self.get_lower_as_num(i)?.rational_part().clone());
                }
                // Exclude the yielded point and its dominated region.
                let mut strict = Vec::with_capacity(n);
                for i in 0..n {
                    strict.push(self.mk_gt(i, &current, tm)?);
                }
                let block = tm.mk_or(strict);
                self.solver.assert(block);
                if let Some(p) = &mut self.pareto {
                    p.points_yielded += 1;
                    p.points.push(point);
                    debug!(points = p.points_yielded, "pareto: yielded frontier point");
                }
                Ok(SolverResult::Sat)
            }
        }
    }

    /// Climb from `current` to a Pareto-optimal model by repeatedly
    /// asserting domination.
    fn improve_to_frontier(
        &mut self,
        current: &mut Model,
        tm: &mut TermManager,
    ) -> Result<Improve> {
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return Ok(Improve::Unknown);
            }
            let n = self.objectives.len();
            let mut strict = Vec::with_capacity(n);
            for i in 0..n {
                let ge = self.mk_ge(i, current, tm)?;
                self.solver.assert(ge);
                strict.push(self.mk_gt(i, current, tm)?);
            }
            let some_better = tm.mk_or(strict);
            self.solver.assert(some_better);
            match self.solver.check_sat(tm) {
                SolverResult::Sat => {
                    *current = self.solver.model().cloned().ok_or_else(|| {
                        OximaError::Internal("sat answer without model".to_string())
                    })?;
                }
                SolverResult::Unsat => return Ok(Improve::Frontier),
                SolverResult::Unknown => return Ok(Improve::Unknown),
            }
        }
    }
}
