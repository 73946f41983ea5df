//! Core- and SAT-guided MaxSAT with cardinality strengthening.
//!
//! The engine tracks each soft constraint `s` through a fresh relaxation
//! atom `p` with the clause `p | s`, and assumes `!p` for every soft not
//! yet seen in an unsat core. Both answers of the solver refine the
//! search:
//!
//! - **SAT**: the model gives a new count of satisfied softs. Improving
//!   on it requires satisfying at most `n - count - 1` of the relaxation
//!   atoms seen in cores so far, which is asserted as an at-most-k lemma.
//! - **UNSAT**: every relaxation atom named by the core leaves the
//!   assumption set for good, at least one of the core atoms must be
//!   true from now on, and the number of satisfiable softs shrinks by
//!   one.
//!
//! Every asserted lemma is a consequence of the original problem, so the
//! bounds converge monotonically until `lower == upper`.

use crate::cardinality;
use crate::solver::{BaseSolver, SolverResult};
use oxima_core::ast::{TermId, TermKind, TermManager};
use oxima_core::error::{OximaError, Result};
use oxima_core::model::Model;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Counters for one engine run.
#[derive(Debug, Clone, Default)]
pub struct CoreMaxSatStats {
    /// Satisfiability queries issued.
    pub sat_calls: u64,
    /// Unsat cores processed.
    pub cores_found: u64,
    /// Cardinality lemmas asserted.
    pub lemmas_added: u64,
}

/// Core-guided MaxSAT over unit-weight soft constraints.
///
/// Bounds are counts of satisfied softs: `0 <= lower <= upper <= n`,
/// `lower` never decreases and `upper` never increases. On a `Sat`
/// answer the recorded assignment satisfies exactly `lower` softs under
/// the recorded model.
pub struct CoreMaxSat {
    soft: Vec<TermId>,
    lower: u64,
    upper: u64,
    assignment: Vec<bool>,
    model: Option<Model>,
    cancel: Arc<AtomicBool>,
    stats: CoreMaxSatStats,
}

impl CoreMaxSat {
    /// Create an engine for the given soft constraints.
    pub fn new(soft: Vec<TermId>, cancel: Arc<AtomicBool>) -> Self {
        let n = soft.len();
        Self {
            soft,
            lower: 0,
            upper: n as u64,
            assignment: vec![false; n],
            model: None,
            cancel,
            stats: CoreMaxSatStats::default(),
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

    /// Truth value of each soft under the best model found.
    pub fn assignment(&self) -> &[bool] {
        &self.assignment
    }

    /// The model witnessing `lower`, if one has been found.
    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Counters for this run.
    pub fn stats(&self) -> &CoreMaxSatStats {
        &self.stats
    }

    /// Run the refinement loop to completion, inside a fresh solver
    /// scope that is popped on exit.
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
        let n = self.soft.len() as u64;

        // Relax each soft with a fresh atom and assume its negation.
        let mut block: Vec<TermId> = Vec::with_capacity(self.soft.len());
        for &soft in &self.soft {
            let p = tm.mk_fresh_bool("p");
            let clause = tm.mk_or(vec![p, soft]);
            s.assert(clause);
            block.push(tm.mk_not(p));
        }

        let mut core_vars: Vec<TermId> = Vec::new();
        let mut core_set: FxHashSet<TermId> = FxHashSet::default();

        while self.lower < self.upper {
            if self.cancel.load(Ordering::Relaxed) {
                return Ok(SolverResult::Unknown);
            }
            self.stats.sat_calls += 1;
            match s.check_sat_assuming(&block, tm) {
                SolverResult::Unknown => return Ok(SolverResult::Unknown),
                SolverResult::Sat => {
                    let model = s
                        .model()
                        .cloned()
                        .ok_or_else(|| OximaError::Internal("sat answer without model".into()))?;
                    let mut answer = Vec::with_capacity(self.soft.len());
                    let mut new_lower = 0u64;
                    for &soft in &self.soft {
                        let value = model.eval_bool(soft, tm).ok_or_else(|| {
                            OximaError::Internal("soft constraint not evaluated by model".into())
                        })?;
                        if value {
                            new_lower += 1;
                        }
                        answer.push(value);
                    }
                    debug!(new_lower, upper = self.upper, "maxsat.core sat");
                    if new_lower > self.lower || self.model.is_none() {
                        self.assignment = answer;
                        self.model = Some(model);
                        self.lower = self.lower.max(new_lower);
                    }
                    if self.lower == self.upper {
                        return Ok(SolverResult::Sat);
                    }
                    // Improving on new_lower forces at least new_lower + 1
                    // softs, hence at most n - new_lower - 1 true core atoms.
                    debug_assert!(new_lower < n);
                    let k = n.saturating_sub(new_lower + 1);
                    let lemma = cardinality::at_most_k(tm, &core_vars, k);
                    s.assert(lemma);
                    self.stats.lemmas_added += 1;
                }
                SolverResult::Unsat => {
                    let core = s.unsat_core().to_vec();
                    self.stats.cores_found += 1;
                    debug!(core_size = core.len(), "maxsat.core unsat");
                    for &c in &core {
                        let p = match tm.kind(c) {
                            TermKind::Not(p) => *p,
                            _ => {
                                return Err(OximaError::Internal(
                                    "unsat core element is not a negated relaxation atom".into(),
                                ));
                            }
                        };
                        if core_set.insert(p) {
                            core_vars.push(p);
                        }
                    }
                    if core.is_empty() {
                        self.upper = self.lower;
                        return Ok(SolverResult::Sat);
                    }
                    let core_lookup: FxHashSet<TermId> = core.iter().copied().collect();
                    block.retain(|b| !core_lookup.contains(b));
                    // At least one atom seen in a core must be true.
                    let at_most_zero = cardinality::at_most_k(tm, &core_vars, 0);
                    let lemma = tm.mk_not(at_most_zero);
                    s.assert(lemma);
                    self.stats.lemmas_added += 1;
                    self.upper -= 1;
                }
            }
        }
        Ok(SolverResult::Sat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    enum Step {
        Sat(Model),
        UnsatIdx(Vec<usize>),
    }

    /// Replays a fixed script of solver answers; `UnsatIdx` picks the
    /// core out of the assumptions of the query it answers.
    struct ScriptedSolver {
        steps: VecDeque<Step>,
        model: Option<Model>,
        core: Vec<TermId>,
    }

    impl ScriptedSolver {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: steps.into(),
                model: None,
                core: Vec::new(),
            }
        }
    }

    impl BaseSolver for ScriptedSolver {
        fn push(&mut self) {}
        fn pop(&mut self, _n: u32) {}
        fn assert(&mut self, _f: TermId) {}

        fn check_sat_assuming(
            &mut self,
            assumptions: &[TermId],
            _tm: &mut TermManager,
        ) -> SolverResult {
            match self.steps.pop_front() {
                Some(Step::Sat(model)) => {
                    self.model = Some(model);
                    SolverResult::Sat
                }
                Some(Step::UnsatIdx(indices)) => {
                    self.core = indices.iter().map(|&i| assumptions[i]).collect();
                    SolverResult::Unsat
                }
                None => SolverResult::Unknown,
            }
        }

        fn model(&self) -> Option<&Model> {
            self.model.as_ref()
        }

        fn unsat_core(&self) -> &[TermId] {
            &self.core
        }

        fn set_cancel(&mut self, _f: bool) {}
    }

    fn soft_vars(tm: &mut TermManager, n: usize) -> Vec<TermId> {
        (0..n)
            .map(|i| tm.mk_var(&format!("s{i}"), tm.sorts.bool_sort))
            .collect()
    }

    #[test]
    fn test_one_core_round_then_sat() {
        let mut tm = TermManager::new();
        let softs = soft_vars(&mut tm, 4);

        // The first query sees the core {!p0, !p2}; the follow-up model
        // satisfies the remaining three softs.
        let mut model = Model::new();
        let tt = tm.mk_true();
        let ff = tm.mk_false();
        model.insert(softs[0], ff);
        model.insert(softs[1], tt);
        model.insert(softs[2], tt);
        model.insert(softs[3], tt);

        let mut solver =
            ScriptedSolver::new(vec![Step::UnsatIdx(vec![0, 2]), Step::Sat(model)]);
        let mut engine = CoreMaxSat::new(softs, Arc::new(AtomicBool::new(false)));
        let result = engine.solve(&mut solver, &mut tm).unwrap();

        assert_eq!(result, SolverResult::Sat);
        assert_eq!(engine.upper(), 3);
        assert_eq!(engine.lower(), 3);
        assert_eq!(engine.assignment(), &[false, true, true, true]);
        assert_eq!(engine.stats().cores_found, 1);
    }

    #[test]
    fn test_all_softs_true_single_call() {
        let mut tm = TermManager::new();
        let softs = soft_vars(&mut tm, 3);

        let mut model = Model::new();
        let tt = tm.mk_true();
        for &s in &softs {
            model.insert(s, tt);
        }

        let mut solver = ScriptedSolver::new(vec![Step::Sat(model)]);
        let mut engine = CoreMaxSat::new(softs, Arc::new(AtomicBool::new(false)));
        let result = engine.solve(&mut solver, &mut tm).unwrap();

        assert_eq!(result, SolverResult::Sat);
        assert_eq!(engine.lower(), 3);
        assert_eq!(engine.upper(), 3);
        assert_eq!(engine.stats().sat_calls, 1);
    }

    #[test]
    fn test_empty_soft_list() {
        let mut tm = TermManager::new();
        let mut solver = ScriptedSolver::new(vec![]);
        let mut engine = CoreMaxSat::new(vec![], Arc::new(AtomicBool::new(false)));
        let result = engine.solve(&mut solver, &mut tm).unwrap();
        assert_eq!(result, SolverResult::Sat);
        assert_eq!(engine.lower(), 0);
        assert_eq!(engine.upper(), 0);
    }

    #[test]
    fn test_cancellation_preserves_bounds() {
        let mut tm = TermManager::new();
        let softs = soft_vars(&mut tm, 2);
        let cancel = Arc::new(AtomicBool::new(true));
        let mut solver = ScriptedSolver::new(vec![]);
        let mut engine = CoreMaxSat::new(softs, cancel);
        let result = engine.solve(&mut solver, &mut tm).unwrap();
        assert_eq!(result, SolverResult::Unknown);
        assert_eq!(engine.lower(), 0);
        assert_eq!(engine.upper(), 2);
    }

    #[test]
    fn test_empty_core_closes_the_gap() {
        let mut tm = TermManager::new();
        let softs = soft_vars(&mut tm, 2);
        let mut solver = ScriptedSolver::new(vec![Step::UnsatIdx(vec![])]);
        let mut engine = CoreMaxSat::new(softs, Arc::new(AtomicBool::new(false)));
        let result = engine.solve(&mut solver, &mut tm).unwrap();
        assert_eq!(result, SolverResult::Sat);
        assert_eq!(engine.lower(), 0);
        assert_eq!(engine.upper(), 0);
    }
}
