//! Fu & Malik MaxSAT: per-core blocking variables and at-most-one.
//!
//! Each soft constraint carries an answer literal `aux` through the
//! clause `soft | aux`; a query assumes every `!aux`. When the solver
//! reports unsat, every soft named by the core is weakened with a fresh
//! blocking variable (`soft := soft | b`), gets a fresh answer literal,
//! and the round closes with an at-most-one constraint over the round's
//! blocking variables: exactly one soft per core pays the cost. Each
//! round lowers the number of satisfiable softs by one, so the upper
//! bound walks down until a satisfying assignment is found, at which
//! point `lower == upper`.
//!
//! For more information on the procedure:
//!
//! Z. Fu and S. Malik, On solving the partial MAX-SAT problem,
//! International Conference on Theory and Applications of
//! Satisfiability Testing, 2006.

use crate::cardinality;
use crate::solver::{BaseSolver, SolverResult};
use oxima_core::ast::{TermId, TermManager};
use oxima_core::error::{OximaError, Result};
use oxima_core::model::Model;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Counters for one engine run.
#[derive(Debug, Clone, Default)]
pub struct FuMalikStats {
    /// Refinement rounds performed.
    pub steps: u64,
    /// Satisfiability queries issued.
    pub sat_calls: u64,
    /// Blocking variables introduced.
    pub blockers_added: u64,
}

/// Outcome of one refinement step.
enum Step {
    /// The assumptions are satisfiable; the answer has been found.
    Sat,
    /// A core was relaxed; the search continues.
    Refined,
    /// The solver gave up.
    Unknown,
    /// The core named no answer literal: the hard part is unsatisfiable.
    HardConflict,
}

/// Fu & Malik MaxSAT over unit-weight soft constraints.
///
/// Bounds are counts of satisfied softs with the same monotonicity
/// contract as the core-guided engine.
pub struct FuMalik {
    soft: Vec<TermId>,
    orig_soft: Vec<TermId>,
    aux: Vec<TermId>,
    lower: u64,
    upper: u64,
    assignment: Vec<bool>,
    model: Option<Model>,
    cancel: Arc<AtomicBool>,
    stats: FuMalikStats,
}

impl FuMalik {
    /// Create an engine for the given soft constraints.
    pub fn new(soft: Vec<TermId>, cancel: Arc<AtomicBool>) -> Self {
        let n = soft.len();
        Self {
            orig_soft: soft.clone(),
            soft,
            aux: Vec::with_capacity(n),
            lower: 0,
            upper: n as u64,
            assignment: vec![false; n],
            model: None,
            cancel,
            stats: FuMalikStats::default(),
        }
    }

    /// Best-known lower bound on the number of satisfied softs.
    pub fn lower(&self) -> u64 {
        self.lower
    }

    /// Best-known upper bound on the number of satisfied softs.
    pub fn upper(&self) -> u64 {
        self.upper
    }

    /// Truth value of each original soft under the final model.
    pub fn assignment(&self) -> &[bool] {
        &self.assignment
    }

    /// The model witnessing `lower`, if the search finished.
    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Counters for this run.
    pub fn stats(&self) -> &FuMalikStats {
        &self.stats
    }

    /// Run the algorithm to completion, inside a fresh solver scope that
    /// is popped on exit.
    pub fn solve<S: BaseSolver>(
        &mut self,
        s: &mut S,
        tm: &mut TermManager,
    ) -> Result<SolverResult> {
        if self.soft.is_empty() {
            return Ok(SolverResult::Sat);
        }
        s.push();
        let result = self.run(s, tm);
        s.pop(1);
        result
    }

    fn run<S: BaseSolver>(&mut self, s: &mut S, tm: &mut TermManager) -> Result<SolverResult> {
        for i in 0..self.soft.len() {
            let aux = tm.mk_fresh_bool("aux");
            self.aux.push(aux);
            let clause = tm.mk_or(vec![self.soft[i], aux]);
            s.assert(clause);
        }
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return Ok(SolverResult::Unknown);
            }
            debug!(step = self.stats.steps, upper = self.upper, "maxsat.fu_malik step");
            match self.step(s, tm)? {
                Step::Refined => {
                    self.stats.steps += 1;
                    self.upper -= 1;
                }
                Step::Sat => {
                    self.finalize(s, tm)?;
                    return Ok(SolverResult::Sat);
                }
                Step::Unknown => return Ok(SolverResult::Unknown),
                Step::HardConflict => return Ok(SolverResult::Unsat),
            }
        }
    }

    /// One step: check under the current answer literals and, on unsat,
    /// relax every soft the core names.
    fn step<S: BaseSolver>(&mut self, s: &mut S, tm: &mut TermManager) -> Result<Step> {
        let assumptions: Vec<TermId> = self.aux.iter().map(|&a| tm.mk_not(a)).collect();
        self.stats.sat_calls += 1;
        match s.check_sat_assuming(&assumptions, tm) {
            SolverResult::Sat => Ok(Step::Sat),
            SolverResult::Unknown => Ok(Step::Unknown),
            SolverResult::Unsat => {
                let core: FxHashSet<TermId> = s.unsat_core().iter().copied().collect();
                let mut blockers = Vec::new();
                for i in 0..self.soft.len() {
                    if !core.contains(&assumptions[i]) {
                        continue;
                    }
                    let block_var = tm.mk_fresh_bool("block");
                    let aux = tm.mk_fresh_bool("aux");
                    self.soft[i] = tm.mk_or(vec![self.soft[i], block_var]);
                    self.aux[i] = aux;
                    blockers.push(block_var);
                    let clause = tm.mk_or(vec![self.soft[i], aux]);
                    s.assert(clause);
                }
                if blockers.is_empty() {
                    return Ok(Step::HardConflict);
                }
                self.stats.blockers_added += blockers.len() as u64;
                debug!(
                    core_size = blockers.len(),
                    non_blocked = self.soft.len() - blockers.len(),
                    "maxsat.fu_malik core"
                );
                let amo = cardinality::at_most_one(tm, &blockers);
                s.assert(amo);
                Ok(Step::Refined)
            }
        }
    }

    fn finalize<S: BaseSolver>(&mut self, s: &mut S, tm: &mut TermManager) -> Result<()> {
        let model = s
            .model()
            .cloned()
            .ok_or_else(|| OximaError::Internal("sat answer without model".into()))?;
        self.lower = self.upper;
        for (i, &orig) in self.orig_soft.iter().enumerate() {
            self.assignment[i] = model.eval_bool(orig, tm).ok_or_else(|| {
                OximaError::Internal("soft constraint not evaluated by model".into())
            })?;
        }
        self.model = Some(model);
        Ok(())
    }
}
