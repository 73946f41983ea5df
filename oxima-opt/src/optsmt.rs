//! Single-term objective optimization.
//!
//! Every objective is kept in maximize form (the context negates
//! minimized terms before registering them). The basic engine chases the
//! optimum: check, read the objective's value off the model, assert a
//! strict improvement, repeat until unsat; the last model witnesses the
//! optimum. The Farkas engine additionally asks the solver for a
//! theory-derived bound after each model and jumps straight to it when
//! one is available, which also detects unbounded objectives.

use crate::inf_eps::InfEps;
use crate::solver::{BaseSolver, SolverResult};
use oxima_core::ast::{TermId, TermManager};
use oxima_core::error::{OximaError, Result};
use oxima_core::model::Model;
use num_traits::Zero;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Engine selection for single-term objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptEngineKind {
    /// Model-guided bound chase.
    #[default]
    Basic,
    /// Bound chase strengthened by theory bounds from the solver.
    Farkas,
}

/// Counters for one optimization run.
#[derive(Debug, Clone, Default)]
pub struct OptSmtStats {
    /// Satisfiability queries issued.
    pub sat_calls: u64,
    /// Theory bounds obtained from the solver.
    pub theory_bounds: u64,
}

/// Optimizer for registered maximize-form objectives.
///
/// `lower[i] <= upper[i]` holds throughout; `lower` only increases,
/// `upper` only decreases. On successful termination of objective `i`,
/// `lower[i] == upper[i]` is the optimum in the extended-rational sense.
pub struct OptSmt {
    objs: Vec<TermId>,
    lower: Vec<InfEps>,
    upper: Vec<InfEps>,
    models: Vec<Option<Model>>,
    model: Option<Model>,
    engine: OptEngineKind,
    cancel: Arc<AtomicBool>,
    stats: OptSmtStats,
}

impl OptSmt {
    /// Create an optimizer with no objectives.
    pub fn new(engine: OptEngineKind, cancel: Arc<AtomicBool>) -> Self {
        Self {
            objs: Vec::new(),
            lower: Vec::new(),
            upper: Vec::new(),
            models: Vec::new(),
            model: None,
            engine,
            cancel,
            stats: OptSmtStats::default(),
        }
    }

    /// Register a maximize-form objective term; returns its index.
    pub fn add(&mut self, term: TermId) -> usize {
        self.objs.push(term);
        self.lower.push(InfEps::neg_infinite());
        self.upper.push(InfEps::infinite());
        self.models.push(None);
        self.objs.len() - 1
    }

    /// Number of registered objectives.
    pub fn num_objectives(&self) -> usize {
        self.objs.len()
    }

    /// Current lower bound of objective `index`.
    pub fn get_lower(&self, index: usize) -> InfEps {
        self.lower[index].clone()
    }

    /// Current upper bound of objective `index`.
    pub fn get_upper(&self, index: usize) -> InfEps {
        self.upper[index].clone()
    }

    /// Raise the lower bound of `index`; `force` overwrites.
    pub fn update_lower(&mut self, index: usize, r: InfEps, force: bool) {
        if force || r > self.lower[index] {
            self.lower[index] = r;
        }
    }

    /// Lower the upper bound of `index`; `force` overwrites.
    pub fn update_upper(&mut self, index: usize, r: InfEps, force: bool) {
        if force || r < self.upper[index] {
            self.upper[index] = r;
        }
    }

    /// The model of the most recently optimized objective.
    pub fn get_model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// The best model recorded for objective `index`.
    pub fn model_of(&self, index: usize) -> Option<&Model> {
        self.models[index].as_ref()
    }

    /// Counters for this run.
    pub fn stats(&self) -> &OptSmtStats {
        &self.stats
    }

    /// Fold a feasible model into the lower bounds of every objective.
    pub fn update_from_model(&mut self, model: &Model, tm: &TermManager) {
        for i in 0..self.objs.len() {
            if let Some(v) = model.eval_rational(self.objs[i], tm) {
                let v = InfEps::finite(v);
                if v > self.lower[i] {
                    self.lower[i] = v;
                    self.models[i] = Some(model.clone());
                }
            }
        }
    }

    /// Optimize objective `index` under the current assertions,
    /// asserting improvement constraints as it goes (lexicographic
    /// building block).
    pub fn lex<S: BaseSolver>(
        &mut self,
        index: usize,
        s: &mut S,
        tm: &mut TermManager,
    ) -> Result<SolverResult> {
        let obj = self.objs[index];
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return Ok(SolverResult::Unknown);
            }
            self.stats.sat_calls += 1;
            match s.check_sat(tm) {
                SolverResult::Unknown => return Ok(SolverResult::Unknown),
                SolverResult::Unsat => {
                    if self.models[index].is_none() {
                        return Ok(SolverResult::Unsat);
                    }
                    self.upper[index] = self.lower[index].clone();
                    self.model = self.models[index].clone();
                    return Ok(SolverResult::Sat);
                }
                SolverResult::Sat => {
                    let model = s
                        .model()
                        .cloned()
                        .ok_or_else(|| OximaError::Internal("sat answer without model".into()))?;
                    self.update_from_model(&model, tm);
                    let value = model.eval_rational(obj, tm).ok_or_else(|| {
                        OximaError::Internal("objective not evaluated by model".into())
                    })?;
                    debug!(index, value = %value, "optsmt model");

                    if self.engine == OptEngineKind::Farkas
                        && let Some(bound) = s.maximize_hint(obj, tm)
                    {
                        self.stats.theory_bounds += 1;
                        if !bound.is_finite() {
                            // Unbounded from above.
                            self.lower[index] = bound.clone();
                            self.upper[index] = bound;
                            self.model = Some(model);
                            return Ok(SolverResult::Sat);
                        }
                        self.update_upper(index, bound.clone(), false);
                        if self.lower[index] >= self.upper[index] {
                            self.upper[index] = self.lower[index].clone();
                            self.model = self.models[index].clone();
                            return Ok(SolverResult::Sat);
                        }
                        if bound.eps_coeff().is_zero() {
                            // Jump to the theory bound instead of chasing.
                            let bound_term = tm.mk_numeral(bound.rational_part());
                            let fml = tm.mk_ge(obj, bound_term);
                            s.assert(fml);
                            continue;
                        }
                    }

                    let value_term = tm.mk_numeral(&value);
                    let fml = tm.mk_gt(obj, value_term);
                    s.assert(fml);
                }
            }
        }
    }

    /// Optimize each objective independently from the same scope,
    /// without committing between them.
    pub fn box_objectives<S: BaseSolver>(
        &mut self,
        s: &mut S,
        tm: &mut TermManager,
    ) -> Result<SolverResult> {
        for index in 0..self.objs.len() {
            s.push();
            let result = self.lex(index, s, tm);
            s.pop(1);
            match result? {
                SolverResult::Sat => {}
                other => return Ok(other),
            }
        }
        Ok(SolverResult::Sat)
    }

    /// Permanently assert that objective `index` keeps at least its
    /// current lower bound.
    pub fn commit_assignment<S: BaseSolver>(
        &mut self,
        index: usize,
        s: &mut S,
        tm: &mut TermManager,
    ) -> Result<()> {
        let bound = self.lower[index].clone();
        if !bound.is_finite() {
            return Ok(());
        }
        let obj = self.objs[index];
        let bound_term = tm.mk_numeral(bound.rational_part());
        let fml = if bound.eps_coeff().is_zero() {
            tm.mk_ge(obj, bound_term)
        } else {
            tm.mk_gt(obj, bound_term)
        };
        s.assert(fml);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_rational::BigRational;
    use std::collections::VecDeque;

    fn rat(n: i64) -> BigRational {
        BigRational::from_integer(n.into())
    }

    struct ChaseSolver {
        answers: VecDeque<Option<Model>>,
        model: Option<Model>,
        hint: Option<InfEps>,
        asserted: Vec<TermId>,
    }

    impl ChaseSolver {
        fn new(answers: Vec<Option<Model>>) -> Self {
            Self {
                answers: answers.into(),
                model: None,
                hint: None,
                asserted: Vec::new(),
            }
        }
    }

    impl BaseSolver for ChaseSolver {
        fn push(&mut self) {}
        fn pop(&mut self, _n: u32) {}
        fn assert(&mut self, f: TermId) {
            self.asserted.push(f);
        }

        fn check_sat_assuming(
            &mut self,
            _assumptions: &[TermId],
            _tm: &mut TermManager,
        ) -> SolverResult {
            match self.answers.pop_front() {
                Some(Some(model)) => {
                    self.model = Some(model);
                    SolverResult::Sat
                }
                Some(None) => SolverResult::Unsat,
                None => SolverResult::Unknown,
            }
        }

        fn model(&self) -> Option<&Model> {
            self.model.as_ref()
        }

        fn unsat_core(&self) -> &[TermId] {
            &[]
        }

        fn set_cancel(&mut self, _f: bool) {}

        fn maximize_hint(&mut self, _objective: TermId, _tm: &mut TermManager) -> Option<InfEps> {
            self.hint.clone()
        }
    }

    fn int_model(tm: &mut TermManager, x: TermId, v: i64) -> Model {
        let mut model = Model::new();
        let value = tm.mk_int(v);
        model.insert(x, value);
        model
    }

    #[test]
    fn test_basic_chase_converges() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);

        let m3 = int_model(&mut tm, x, 3);
        let m7 = int_model(&mut tm, x, 7);
        let mut solver = ChaseSolver::new(vec![Some(m3), Some(m7), None]);

        let mut opt = OptSmt::new(OptEngineKind::Basic, Arc::new(AtomicBool::new(false)));
        let index = opt.add(x);
        let result = opt.lex(index, &mut solver, &mut tm).unwrap();

        assert_eq!(result, SolverResult::Sat);
        assert_eq!(opt.get_lower(index), InfEps::from(7));
        assert_eq!(opt.get_upper(index), InfEps::from(7));
        // Two strict-improvement constraints were asserted.
        assert_eq!(solver.asserted.len(), 2);
        let seven = tm.mk_int(7);
        assert_eq!(solver.asserted[1], tm.mk_gt(x, seven));
    }

    #[test]
    fn test_infeasible_is_unsat() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let mut solver = ChaseSolver::new(vec![None]);
        let mut opt = OptSmt::new(OptEngineKind::Basic, Arc::new(AtomicBool::new(false)));
        let index = opt.add(x);
        assert_eq!(
            opt.lex(index, &mut solver, &mut tm).unwrap(),
            SolverResult::Unsat
        );
    }

    #[test]
    fn test_farkas_hint_short_circuits() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);

        let m5 = int_model(&mut tm, x, 5);
        let mut solver = ChaseSolver::new(vec![Some(m5)]);
        solver.hint = Some(InfEps::from(5));

        let mut opt = OptSmt::new(OptEngineKind::Farkas, Arc::new(AtomicBool::new(false)));
        let index = opt.add(x);
        let result = opt.lex(index, &mut solver, &mut tm).unwrap();

        assert_eq!(result, SolverResult::Sat);
        assert_eq!(opt.get_lower(index), InfEps::from(5));
        assert_eq!(opt.get_upper(index), InfEps::from(5));
        assert_eq!(opt.stats().theory_bounds, 1);
        // The hint closed the interval without an unsat round.
        assert!(solver.asserted.is_empty());
    }

    #[test]
    fn test_farkas_unbounded() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let m1 = int_model(&mut tm, x, 1);
        let mut solver = ChaseSolver::new(vec![Some(m1)]);
        solver.hint = Some(InfEps::infinite());

        let mut opt = OptSmt::new(OptEngineKind::Farkas, Arc::new(AtomicBool::new(false)));
        let index = opt.add(x);
        let result = opt.lex(index, &mut solver, &mut tm).unwrap();
        assert_eq!(result, SolverResult::Sat);
        assert!(!opt.get_lower(index).is_finite());
        assert!(!opt.get_upper(index).is_finite());
    }

    #[test]
    fn test_cancellation_preserves_bounds() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let mut solver = ChaseSolver::new(vec![]);
        let cancel = Arc::new(AtomicBool::new(true));
        let mut opt = OptSmt::new(OptEngineKind::Basic, cancel);
        let index = opt.add(x);
        assert_eq!(
            opt.lex(index, &mut solver, &mut tm).unwrap(),
            SolverResult::Unknown
        );
        assert!(!opt.get_lower(index).is_finite());
        assert!(!opt.get_upper(index).is_finite());
    }

    #[test]
    fn test_update_from_model_is_monotone() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let mut opt = OptSmt::new(OptEngineKind::Basic, Arc::new(AtomicBool::new(false)));
        let index = opt.add(x);

        let m5 = int_model(&mut tm, x, 5);
        opt.update_from_model(&m5, &tm);
        assert_eq!(opt.get_lower(index), InfEps::from(5));

        let m2 = int_model(&mut tm, x, 2);
        opt.update_from_model(&m2, &tm);
        assert_eq!(opt.get_lower(index), InfEps::from(5));
        assert_eq!(opt.get_lower(index).rational_part(), &rat(5));
        assert!(!opt.get_upper(index).is_finite());
    }
}
