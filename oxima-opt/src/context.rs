//! Optimization context: scoped declarations and the objective driver.
//!
//! The context owns the base solver, a stack of hard constraints and
//! objective declarations, and the per-objective engine state. Engine
//! state is rebuilt from the scoped declarations on every call to
//! [`Context::optimize`], because a search may permanently assert
//! lemmas that are only valid for the soft set it was started with.
//!
//! Declared `Maximize`/`Minimize` objectives are normalized on import:
//! a minimized arithmetic term becomes maximization of its negation, a
//! bit-vector term becomes a weighted soft group over its bits with
//! weights `2^i`, and a literal-weighted sum becomes a weighted soft
//! group with offset and negation bookkeeping.

use crate::inf_eps::InfEps;
use crate::maxsat::{MaxSatEngineKind, MaxSmt};
use crate::optsmt::{OptEngineKind, OptSmt};
use crate::pareto::GiaPareto;
use crate::solver::{BaseSolver, SolverResult};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use oxima_core::ast::{TermId, TermKind, TermManager};
use oxima_core::error::{OximaError, Result};
use oxima_core::model::Model;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Multi-objective discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    /// Optimize objectives in declaration order, committing each optimum.
    #[default]
    Lex,
    /// Optimize each objective independently from the same scope.
    Box,
    /// Enumerate Pareto-optimal models by guided improvement.
    Pareto,
}

/// Engine and discipline configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptConfig {
    /// Multi-objective discipline.
    pub priority: Priority,
    /// Engine for weighted soft groups.
    pub maxsat_engine: MaxSatEngineKind,
    /// Engine for single-term objectives.
    pub opt_engine: OptEngineKind,
}

/// A declared objective.
#[derive(Debug, Clone)]
pub enum Objective {
    /// Maximize an arithmetic or bit-vector term.
    Maximize {
        /// The term to maximize.
        term: TermId,
        /// Index into the single-term optimizer, set on import.
        index: usize,
    },
    /// Minimize an arithmetic or bit-vector term.
    Minimize {
        /// The term to minimize.
        term: TermId,
        /// Index into the single-term optimizer, set on import.
        index: usize,
    },
    /// A weighted soft group. The reported value is
    /// `offset - cost` when `neg` is set and `offset + cost` otherwise,
    /// where cost is the weight of unsatisfied softs.
    MaxSat {
        /// The group id.
        id: String,
        /// Soft constraints, in declaration order.
        softs: Vec<TermId>,
        /// Positive weights, parallel to `softs`.
        weights: Vec<BigRational>,
        /// Constant added to the reported value.
        offset: BigRational,
        /// Whether the cost enters the reported value negated.
        neg: bool,
    },
}

/// Stacked hard constraints and objective declarations.
#[derive(Default)]
struct ScopedState {
    hard: Vec<TermId>,
    objectives: Vec<Objective>,
    indices: FxHashMap<String, usize>,
    hard_lim: Vec<usize>,
    objectives_lim: Vec<usize>,
    term_trail: Vec<usize>,
    term_trail_lim: Vec<usize>,
}

impl ScopedState {
    fn push(&mut self) {
        self.hard_lim.push(self.hard.len());
        self.objectives_lim.push(self.objectives.len());
        self.term_trail_lim.push(self.term_trail.len());
    }

    fn pop(&mut self) {
        let Some(hard_lim) = self.hard_lim.pop() else {
            return;
        };
        self.hard.truncate(hard_lim);
        let trail_lim = self.term_trail_lim.pop().unwrap_or(0);
        while self.term_trail.len() > trail_lim {
            let idx = self.term_trail.pop().unwrap_or_default();
            if let Objective::MaxSat { softs, weights, .. } = &mut self.objectives[idx] {
                softs.pop();
                weights.pop();
            }
        }
        let obj_lim = self.objectives_lim.pop().unwrap_or(0);
        while self.objectives.len() > obj_lim {
            if let Some(Objective::MaxSat { id, .. }) = self.objectives.pop() {
                self.indices.remove(&id);
            }
        }
    }

    fn depth(&self) -> usize {
        self.hard_lim.len()
    }

    fn add_hard(&mut self, f: TermId) {
        self.hard.push(f);
    }

    fn add_soft(
        &mut self,
        tm: &TermManager,
        f: TermId,
        weight: BigRational,
        id: &str,
    ) -> Result<usize> {
        if !weight.is_positive() {
            return Err(OximaError::BadWeight(weight.to_string()));
        }
        let sort = tm.sort_of(f);
        if !tm.sorts.is_bool(sort) {
            return Err(OximaError::SortMismatch {
                expected: "Bool".to_string(),
                found: tm.sorts.get(sort).to_string(),
            });
        }
        let idx = match self.indices.get(id) {
            Some(&idx) => idx,
            None => {
                let idx = self.objectives.len();
                self.objectives.push(Objective::MaxSat {
                    id: id.to_string(),
                    softs: Vec::new(),
                    weights: Vec::new(),
                    offset: BigRational::zero(),
                    neg: false,
                });
                self.indices.insert(id.to_string(), idx);
                idx
            }
        };
        if let Objective::MaxSat { softs, weights, .. } = &mut self.objectives[idx] {
            softs.push(f);
            weights.push(weight);
        }
        self.term_trail.push(idx);
        Ok(idx)
    }

    fn add_objective(&mut self, tm: &TermManager, term: TermId, is_max: bool) -> Result<usize> {
        let sort = tm.sort_of(term);
        if !tm.sorts.is_arith(sort) && !tm.sorts.is_bv(sort) {
            return Err(OximaError::SortMismatch {
                expected: "Int, Real, or BitVec".to_string(),
                found: tm.sorts.get(sort).to_string(),
            });
        }
        let index = self.objectives.len();
        self.objectives.push(if is_max {
            Objective::Maximize { term, index }
        } else {
            Objective::Minimize { term, index }
        });
        Ok(index)
    }
}

/// Decompose `t` as a literal-weighted sum: a list of
/// `(boolean, coefficient)` pairs plus a constant, covering numerals,
/// `ite(b, v1, v2)` with numeral branches, and binary products of a
/// numeral with such an `ite`.
fn pb_sum(tm: &TermManager, t: TermId) -> Option<(Vec<(TermId, BigRational)>, BigRational)> {
    fn ite_part(
        tm: &TermManager,
        id: TermId,
        scale: &BigRational,
    ) -> Option<(TermId, BigRational, BigRational)> {
        match tm.kind(id) {
            TermKind::Ite(c, th, el) => {
                let v1 = tm.numeral_value(*th)?;
                let v2 = tm.numeral_value(*el)?;
                Some((*c, scale * (&v1 - &v2), scale * &v2))
            }
            _ => None,
        }
    }

    let mut parts = Vec::new();
    let mut constant = BigRational::zero();
    let args: Vec<TermId> = match tm.kind(t) {
        TermKind::Add(args) => args.clone(),
        _ => vec![t],
    };
    let one = BigRational::one();
    for a in args {
        if let Some(c) = tm.numeral_value(a) {
            constant += c;
            continue;
        }
        let part = match tm.kind(a) {
            TermKind::Ite(..) => ite_part(tm, a, &one),
            TermKind::Mul(margs) if margs.len() == 2 => {
                let (x, y) = (margs[0], margs[1]);
                if let Some(w) = tm.numeral_value(x) {
                    ite_part(tm, y, &w)
                } else if let Some(w) = tm.numeral_value(y) {
                    ite_part(tm, x, &w)
                } else {
                    None
                }
            }
            _ => None,
        };
        let (cond, coeff, base) = part?;
        constant += base;
        if !coeff.is_zero() {
            parts.push((cond, coeff));
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some((parts, constant))
    }
}

/// The user-facing optimization session over a base solver.
pub struct Context<S> {
    pub(crate) solver: S,
    pub(crate) config: OptConfig,
    scoped: ScopedState,
    pub(crate) objectives: Vec<Objective>,
    pub(crate) optsmt: OptSmt,
    pub(crate) maxsmts: FxHashMap<String, MaxSmt>,
    pub(crate) model: Option<Model>,
    pub(crate) pareto: Option<GiaPareto>,
    pub(crate) cancel: Arc<AtomicBool>,
    pub(crate) reason_unknown: String,
}

impl<S: BaseSolver> Context<S> {
    /// Create a context with the default configuration.
    pub fn new(solver: S) -> Self {
        Self::with_config(solver, OptConfig::default())
    }

    /// Create a context with an explicit configuration.
    pub fn with_config(solver: S, config: OptConfig) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        Self {
            solver,
            config,
            scoped: ScopedState::default(),
            objectives: Vec::new(),
            optsmt: OptSmt::new(config.opt_engine, cancel.clone()),
            maxsmts: FxHashMap::default(),
            model: None,
            pareto: None,
            cancel,
            reason_unknown: "unknown".to_string(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &OptConfig {
        &self.config
    }

    /// Select the multi-objective discipline for subsequent calls.
    pub fn set_priority(&mut self, priority: Priority) {
        self.config.priority = priority;
    }

    /// Shared access to the base solver.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Exclusive access to the base solver.
    pub fn solver_mut(&mut self) -> &mut S {
        &mut self.solver
    }

    /// Add a hard constraint to the current scope.
    pub fn add_hard(&mut self, f: TermId) {
        self.scoped.add_hard(f);
    }

    /// Add a weighted soft constraint to the group `id`; returns the
    /// objective index of the group.
    pub fn add_soft(
        &mut self,
        tm: &TermManager,
        f: TermId,
        weight: BigRational,
        id: &str,
    ) -> Result<usize> {
        self.scoped.add_soft(tm, f, weight, id)
    }

    /// Declare a term objective; returns its objective index.
    pub fn add_objective(&mut self, tm: &TermManager, term: TermId, is_max: bool) -> Result<usize> {
        self.scoped.add_objective(tm, term, is_max)
    }

    /// Declare maximization of `term`.
    pub fn maximize(&mut self, tm: &TermManager, term: TermId) -> Result<usize> {
        self.add_objective(tm, term, true)
    }

    /// Declare minimization of `term`.
    pub fn minimize(&mut self, tm: &TermManager, term: TermId) -> Result<usize> {
        self.add_objective(tm, term, false)
    }

    /// Number of declared objectives in scope.
    pub fn num_objectives(&self) -> usize {
        self.scoped.objectives.len()
    }

    /// Number of hard constraints in scope.
    pub fn num_hard_constraints(&self) -> usize {
        self.scoped.hard.len()
    }

    /// Open a declaration scope.
    pub fn push(&mut self) {
        self.scoped.push();
        self.solver.push();
    }

    /// Close the `n` most recent declaration scopes.
    pub fn pop(&mut self, n: u32) {
        for _ in 0..n {
            if self.scoped.depth() == 0 {
                break;
            }
            self.scoped.pop();
            self.solver.pop(1);
        }
    }

    /// Set or clear cancellation; propagated into the base solver.
    pub fn set_cancel(&mut self, f: bool) {
        self.cancel.store(f, Ordering::Relaxed);
        self.solver.set_cancel(f);
    }

    /// Request cancellation of the running search.
    pub fn cancel(&mut self) {
        self.set_cancel(true);
    }

    /// Clear a previous cancellation request.
    pub fn reset_cancel(&mut self) {
        self.set_cancel(false);
    }

    /// Why the last answer was [`SolverResult::Unknown`].
    pub fn reason_unknown(&self) -> &str {
        &self.reason_unknown
    }

    /// The model of the last successful answer.
    pub fn get_model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Truth value of soft `index` in the group `id` under the best model.
    pub fn get_assignment(&self, id: &str, index: usize) -> Result<bool> {
        let ms = self
            .maxsmts
            .get(id)
            .ok_or(OximaError::IndexOutOfBounds { index, count: 0 })?;
        ms.get_assignment(index)
    }

    /// Lower bound of objective `idx` as an extended rational.
    pub fn get_lower_as_num(&self, idx: usize) -> Result<InfEps> {
        match self.imported(idx)? {
            Objective::Maximize { index, .. } => Ok(self.optsmt.get_lower(*index)),
            Objective::Minimize { index, .. } => Ok(-self.optsmt.get_upper(*index)),
            Objective::MaxSat { id, offset, neg, .. } => {
                let ms = self.maxsmt(id)?;
                let r = if *neg {
                    offset - ms.get_upper()
                } else {
                    offset + ms.get_lower()
                };
                Ok(InfEps::finite(r))
            }
        }
    }

    /// Upper bound of objective `idx` as an extended rational.
    pub fn get_upper_as_num(&self, idx: usize) -> Result<InfEps> {
        match self.imported(idx)? {
            Objective::Maximize { index, .. } => Ok(self.optsmt.get_upper(*index)),
            Objective::Minimize { index, .. } => Ok(-self.optsmt.get_lower(*index)),
            Objective::MaxSat { id, offset, neg, .. } => {
                let ms = self.maxsmt(id)?;
                let r = if *neg {
                    offset - ms.get_lower()
                } else {
                    offset + ms.get_upper()
                };
                Ok(InfEps::finite(r))
            }
        }
    }

    /// Lower bound of objective `idx` as a symbolic expression.
    pub fn get_lower(&self, idx: usize, tm: &mut TermManager) -> Result<TermId> {
        Ok(self.get_lower_as_num(idx)?.to_term(tm))
    }

    /// Upper bound of objective `idx` as a symbolic expression.
    pub fn get_upper(&self, idx: usize, tm: &mut TermManager) -> Result<TermId> {
        Ok(self.get_upper_as_num(idx)?.to_term(tm))
    }

    fn imported(&self, idx: usize) -> Result<&Objective> {
        self.objectives.get(idx).ok_or(OximaError::IndexOutOfBounds {
            index: idx,
            count: self.objectives.len(),
        })
    }

    fn maxsmt(&self, id: &str) -> Result<&MaxSmt> {
        self.maxsmts
            .get(id)
            .ok_or_else(|| OximaError::Internal(format!("no maxsat state for objective {id}")))
    }

    /// Run optimization under the configured discipline.
    pub fn optimize(&mut self, tm: &mut TermManager) -> Result<SolverResult> {
        self.reason_unknown = "unknown".to_string();
        if self.pareto.is_some() {
            if self.config.priority == Priority::Pareto {
                // Re-entry yields the next Pareto-optimal model.
                return self.execute_pareto(tm);
            }
            // The enumeration was abandoned; drop its scope.
            self.pareto = None;
            self.solver.pop(1);
        }

        self.import_scoped_state(tm)?;
        self.solver.push();
        let hard = self.scoped.hard.clone();
        for f in hard {
            self.solver.assert(f);
        }
        debug!(objectives = self.objectives.len(), "optimize: initial check");
        let is_sat = self.solver.check_sat(tm);
        if is_sat != SolverResult::Sat {
            self.model = None;
            if is_sat == SolverResult::Unknown {
                self.mark_unknown();
            }
            self.solver.pop(1);
            return Ok(is_sat);
        }
        self.model = self.solver.model().cloned();
        self.update_bound(tm, true, true);

        let result = match (self.objectives.len(), self.config.priority) {
            (0, _) => Ok(SolverResult::Sat),
            (1, _) => self.execute(0, true, tm),
            (_, Priority::Pareto) => return self.execute_pareto(tm),
            (_, Priority::Box) => self.execute_box(tm),
            (_, Priority::Lex) => self.execute_lex(tm),
        };
        self.solver.pop(1);
        let result = result?;
        if result == SolverResult::Unknown {
            self.mark_unknown();
        }
        Ok(result)
    }

    /// Run optimization under an explicit discipline.
    pub fn optimize_with(
        &mut self,
        tm: &mut TermManager,
        priority: Priority,
    ) -> Result<SolverResult> {
        self.config.priority = priority;
        self.optimize(tm)
    }

    /// Check that the recorded model agrees with the reported bounds
    /// and soft assignments. Meaningful after a lexicographic (or
    /// single-objective) run, where every committed objective is
    /// witnessed by the final model; a debugging aid used by tests.
    pub fn validate_lex(&self, tm: &TermManager) -> Result<()> {
        let Some(model) = &self.model else {
            return Ok(());
        };
        for (i, obj) in self.objectives.iter().enumerate() {
            match obj {
                Objective::Maximize { term, .. } | Objective::Minimize { term, .. } => {
                    let lower = self.get_lower_as_num(i)?;
                    if !lower.is_finite()
                        || !lower.eps_coeff().is_zero()
                        || self.get_upper_as_num(i)? != lower
                    {
                        continue;
                    }
                    if let Some(v) = model.eval_rational(*term, tm)
                        && v != *lower.rational_part()
                    {
                        return Err(OximaError::Internal(format!(
                            "objective {i} evaluates to {v} but reports {lower}"
                        )));
                    }
                }
                Objective::MaxSat { id, softs, .. } => {
                    let ms = self.maxsmt(id)?;
                    for (j, &soft) in softs.iter().enumerate() {
                        if let Some(value) = model.eval_bool(soft, tm)
                            && value != ms.get_assignment(j)?
                        {
                            return Err(OximaError::Internal(format!(
                                "soft {j} of {id} disagrees with its recorded assignment"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn mark_unknown(&mut self) {
        self.reason_unknown = if self.cancel.load(Ordering::Relaxed) {
            "canceled".to_string()
        } else {
            self.solver.reason_unknown()
        };
    }

    /// Rebuild engine state from the scoped declarations.
    fn import_scoped_state(&mut self, tm: &mut TermManager) -> Result<()> {
        self.optsmt = OptSmt::new(self.config.opt_engine, self.cancel.clone());
        self.maxsmts.clear();
        self.objectives.clear();
        let declared = self.scoped.objectives.clone();
        for (i, obj) in declared.into_iter().enumerate() {
            let converted = self.convert_objective(obj, i, tm);
            self.objectives.push(converted);
        }
        for i in 0..self.objectives.len() {
            match &mut self.objectives[i] {
                Objective::Maximize { term, index } => {
                    *index = self.optsmt.add(*term);
                }
                Objective::Minimize { term, index } => {
                    let negated = tm.mk_neg(*term);
                    *index = self.optsmt.add(negated);
                }
                Objective::MaxSat {
                    id, softs, weights, ..
                } => {
                    let mut ms = MaxSmt::new(self.config.maxsat_engine, self.cancel.clone());
                    for (&soft, weight) in softs.iter().zip(weights.iter()) {
                        ms.add(soft, weight.clone());
                    }
                    self.maxsmts.insert(id.clone(), ms);
                }
            }
        }
        Ok(())
    }

    /// Rewrite a min/max objective into a weighted soft group when its
    /// term is a bit-vector or a literal-weighted sum.
    fn convert_objective(&self, obj: Objective, position: usize, tm: &mut TermManager) -> Objective {
        let (term, is_max) = match &obj {
            Objective::Maximize { term, .. } => (*term, true),
            Objective::Minimize { term, .. } => (*term, false),
            Objective::MaxSat { .. } => return obj,
        };
        let sort = tm.sort_of(term);
        if let Some(width) = tm.sorts.bv_width(sort) {
            // maximize t[bv]: reward each bit that is 1 with weight 2^i;
            // minimize rewards zero bits instead.
            let bit = tm.mk_bv(if is_max { 1 } else { 0 }, 1);
            let mut softs = Vec::with_capacity(width as usize);
            let mut weights = Vec::with_capacity(width as usize);
            let mut offset = BigRational::zero();
            for i in 0..width {
                let w = BigRational::from(BigInt::one() << i);
                let extract = tm.mk_bv_extract(i, i, term);
                softs.push(tm.mk_eq(bit, extract));
                if is_max {
                    offset += &w;
                }
                weights.push(w);
            }
            return Objective::MaxSat {
                id: self.converted_id(is_max, position),
                softs,
                weights,
                offset,
                neg: is_max,
            };
        }
        if let Some((literals, constant)) = pb_sum(tm, term) {
            let mut softs = Vec::with_capacity(literals.len());
            let mut weights = Vec::with_capacity(literals.len());
            let mut offset = constant;
            for (b, w) in literals {
                if is_max {
                    // maximize: value = offset - cost, offset collects the
                    // positive coefficients.
                    if w.is_negative() {
                        softs.push(tm.mk_not(b));
                        weights.push(-w);
                    } else {
                        softs.push(b);
                        offset += &w;
                        weights.push(w);
                    }
                } else {
                    // minimize: value = offset + cost.
                    if w.is_negative() {
                        offset += &w;
                        softs.push(b);
                        weights.push(-w);
                    } else {
                        softs.push(tm.mk_not(b));
                        weights.push(w);
                    }
                }
            }
            return Objective::MaxSat {
                id: self.converted_id(is_max, position),
                softs,
                weights,
                offset,
                neg: is_max,
            };
        }
        obj
    }

    fn converted_id(&self, is_max: bool, position: usize) -> String {
        let mut id = if is_max {
            format!("maximize!{position}")
        } else {
            format!("minimize!{position}")
        };
        while self.scoped.indices.contains_key(&id) {
            id.push('!');
        }
        id
    }

    /// Run one objective; `committed` chains its optimum into the scope.
    fn execute(&mut self, i: usize, committed: bool, tm: &mut TermManager) -> Result<SolverResult> {
        let obj = self.objectives[i].clone();
        match obj {
            Objective::Maximize { index, .. } | Objective::Minimize { index, .. } => {
                let result = self.optsmt.lex(index, &mut self.solver, tm)?;
                if result == SolverResult::Sat {
                    if committed {
                        self.optsmt
                            .commit_assignment(index, &mut self.solver, tm)?;
                    }
                    if let Some(m) = self.optsmt.get_model() {
                        self.model = Some(m.clone());
                    }
                }
                Ok(result)
            }
            Objective::MaxSat { id, .. } => {
                let ms = self
                    .maxsmts
                    .get_mut(&id)
                    .ok_or_else(|| OximaError::Internal(format!("no maxsat state for {id}")))?;
                let result = ms.solve(&mut self.solver, tm)?;
                if result == SolverResult::Sat && committed {
                    ms.commit_assignment(&mut self.solver, tm)?;
                }
                if result != SolverResult::Unsat
                    && let Some(m) = ms.get_model()
                {
                    self.model = Some(m.clone());
                }
                Ok(result)
            }
        }
    }

    /// Lexicographic discipline: optimize in order, committing each
    /// optimum before the next objective. Stops early on `Unknown`,
    /// `Unsat`, or an infinite bound.
    fn execute_lex(&mut self, tm: &mut TermManager) -> Result<SolverResult> {
        let n = self.objectives.len();
        for i in 0..n {
            let result = self.execute(i, i + 1 < n, tm)?;
            if result != SolverResult::Sat {
                return Ok(result);
            }
            if !self.get_lower_as_num(i)?.is_finite() {
                return Ok(SolverResult::Sat);
            }
        }
        Ok(SolverResult::Sat)
    }

    /// Box discipline: stand-alone optima, no commitments.
    fn execute_box(&mut self, tm: &mut TermManager) -> Result<SolverResult> {
        let result = self.optsmt.box_objectives(&mut self.solver, tm)?;
        if result != SolverResult::Sat {
            return Ok(result);
        }
        if let Some(m) = self.optsmt.get_model() {
            self.model = Some(m.clone());
        }
        for i in 0..self.objectives.len() {
            if matches!(self.objectives[i], Objective::MaxSat { .. }) {
                self.solver.push();
                let result = self.execute(i, false, tm);
                self.solver.pop(1);
                let result = result?;
                if result != SolverResult::Sat {
                    return Ok(result);
                }
            }
        }
        Ok(SolverResult::Sat)
    }

    /// Fold the current model into per-objective bounds. `is_lower`
    /// seeds the achieved side (lower bounds of term objectives, cost
    /// upper bounds of soft groups); the opposite side is seeded by the
    /// Pareto driver when a frontier point is exact.
    pub(crate) fn update_bound(&mut self, tm: &TermManager, is_lower: bool, force: bool) {
        let Some(model) = self.model.clone() else {
            return;
        };
        let objectives = self.objectives.clone();
        for obj in &objectives {
            match obj {
                Objective::Maximize { term, index } => {
                    if let Some(r) = model.eval_rational(*term, tm) {
                        let v = InfEps::finite(r);
                        if is_lower {
                            self.optsmt.update_lower(*index, v, force);
                        } else {
                            self.optsmt.update_upper(*index, v, force);
                        }
                    }
                }
                Objective::Minimize { term, index } => {
                    if let Some(r) = model.eval_rational(*term, tm) {
                        // The registered optsmt objective is the negation.
                        let v = InfEps::finite(-r);
                        if is_lower {
                            self.optsmt.update_lower(*index, v, force);
                        } else {
                            self.optsmt.update_upper(*index, v, force);
                        }
                    }
                }
                Objective::MaxSat {
                    id, softs, weights, ..
                } => {
                    let mut cost = BigRational::zero();
                    let mut ok = true;
                    for (&soft, w) in softs.iter().zip(weights.iter()) {
                        match model.eval_bool(soft, tm) {
                            Some(true) => {}
                            Some(false) => cost += w,
                            None => {
                                ok = false;
                                break;
                            }
                        }
                    }
                    if ok && let Some(ms) = self.maxsmts.get_mut(id) {
                        if is_lower {
                            ms.update_upper(&cost, force);
                        } else {
                            ms.update_lower(&cost, force);
                        }
                    }
                }
            }
        }
    }
}
