//! Weighted MaxSAT dispatch.
//!
//! A [`MaxSmt`] owns one weighted soft group: the engine choice, the
//! weight-to-unit reduction, and the cost bounds reported to the caller.
//! Engines work in the satisfied-count domain over unit softs; this
//! layer scales rational weights to integers, expands each soft into
//! that many unit copies, and maps the counts back to weighted *cost*
//! bounds (the weight of unsatisfied softs), which is the value domain
//! the context applies offsets and negation to.

use crate::core_maxsat::CoreMaxSat;
use crate::fu_malik::FuMalik;
use crate::solver::{BaseSolver, SolverResult};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use oxima_core::ast::{TermId, TermManager};
use oxima_core::error::{OximaError, Result};
use oxima_core::model::Model;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::debug;

/// Engine selection for weighted soft groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxSatEngineKind {
    /// Core-guided search with global at-most-k strengthening.
    #[default]
    CoreGuided,
    /// Fu & Malik with per-core blocking variables.
    FuMalik,
}

/// Cap on the number of unit copies the weight reduction may produce.
const MAX_UNIT_EXPANSION: u64 = 1 << 16;

/// The sum `ite(soft_0, w_0, 0) + ... + ite(soft_n-1, w_n-1, 0)` of the
/// satisfied weight of a soft group.
pub(crate) fn objective_term(
    tm: &mut TermManager,
    softs: &[TermId],
    weights: &[BigRational],
) -> TermId {
    let zero = tm.mk_int(0);
    let mut sum = Vec::with_capacity(softs.len());
    for (&soft, weight) in softs.iter().zip(weights) {
        let w = tm.mk_numeral(weight);
        sum.push(tm.mk_ite(soft, w, zero));
    }
    if sum.is_empty() { zero } else { tm.mk_add(sum) }
}

fn gcd(mut a: BigInt, mut b: BigInt) -> BigInt {
    a = a.abs();
    b = b.abs();
    while !b.is_zero() {
        let r = &a % &b;
        a = b;
        b = r;
    }
    a
}

/// One weighted soft group and its optimization state.
///
/// Bounds live in the cost domain: `lower` and `upper` bracket the
/// minimum achievable weight of unsatisfied softs. `lower` never
/// decreases and `upper` never increases across a run, including
/// cancellation.
pub struct MaxSmt {
    softs: Vec<TermId>,
    weights: Vec<BigRational>,
    engine: MaxSatEngineKind,
    lower: BigRational,
    upper: Option<BigRational>,
    assignment: Vec<bool>,
    model: Option<Model>,
    cancel: Arc<AtomicBool>,
}

impl MaxSmt {
    /// Create an empty group solved by `engine`.
    pub fn new(engine: MaxSatEngineKind, cancel: Arc<AtomicBool>) -> Self {
        Self {
            softs: Vec::new(),
            weights: Vec::new(),
            engine,
            lower: BigRational::zero(),
            upper: None,
            assignment: Vec::new(),
            model: None,
            cancel,
        }
    }

    /// Append a soft constraint. Weights have been validated positive by
    /// the scoped state.
    pub fn add(&mut self, soft: TermId, weight: BigRational) {
        debug_assert!(weight.is_positive());
        self.softs.push(soft);
        self.weights.push(weight);
        self.assignment.push(false);
    }

    /// Number of soft constraints in the group.
    pub fn len(&self) -> usize {
        self.softs.len()
    }

    /// Whether the group has no soft constraints.
    pub fn is_empty(&self) -> bool {
        self.softs.is_empty()
    }

    /// The sum of all weights.
    pub fn total(&self) -> BigRational {
        self.weights.iter().sum()
    }

    /// Current cost lower bound.
    pub fn get_lower(&self) -> BigRational {
        self.lower.clone()
    }

    /// Current cost upper bound.
    pub fn get_upper(&self) -> BigRational {
        match &self.upper {
            Some(u) => u.clone().min(self.total()),
            None => self.total(),
        }
    }

    /// Raise the cost lower bound; `force` overwrites unconditionally.
    pub fn update_lower(&mut self, r: &BigRational, force: bool) {
        if force || *r > self.lower {
            self.lower = r.clone();
        }
    }

    /// Lower the cost upper bound; `force` overwrites unconditionally.
    pub fn update_upper(&mut self, r: &BigRational, force: bool) {
        if force {
            self.upper = Some(r.clone());
        } else {
            let current = self.get_upper();
            self.upper = Some(current.min(r.clone()));
        }
    }

    /// Truth value of soft `index` under the best model.
    pub fn get_assignment(&self, index: usize) -> Result<bool> {
        self.assignment
            .get(index)
            .copied()
            .ok_or(OximaError::IndexOutOfBounds {
                index,
                count: self.assignment.len(),
            })
    }

    /// The model witnessing the cost upper bound.
    pub fn get_model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Scale weights to integers and expand each soft into that many
    /// unit copies. Returns the units, the originating soft index of
    /// each unit, and the scale factor.
    fn expand_units(&self) -> Result<(Vec<TermId>, Vec<usize>, BigInt)> {
        let mut scale = BigInt::one();
        for w in &self.weights {
            let denom = w.denom();
            let g = gcd(scale.clone(), denom.clone());
            scale = scale / g * denom;
        }
        let scale_rat = BigRational::from(scale.clone());
        let mut units = Vec::new();
        let mut origin = Vec::new();
        for (i, (&soft, w)) in self.softs.iter().zip(&self.weights).enumerate() {
            let copies = (w * &scale_rat).to_integer();
            let copies = copies.to_u64().filter(|&c| c <= MAX_UNIT_EXPANSION).ok_or_else(|| {
                OximaError::Unsupported(format!(
                    "soft constraint weight {w} exceeds the unit expansion limit"
                ))
            })?;
            for _ in 0..copies {
                units.push(soft);
                origin.push(i);
            }
            if units.len() as u64 > MAX_UNIT_EXPANSION {
                return Err(OximaError::Unsupported(
                    "total soft weight exceeds the unit expansion limit".to_string(),
                ));
            }
        }
        Ok((units, origin, scale))
    }

    /// Run the configured engine once and fold its bounds into the
    /// group's cost bounds.
    pub fn solve<S: BaseSolver>(
        &mut self,
        s: &mut S,
        tm: &mut TermManager,
    ) -> Result<SolverResult> {
        if self.softs.is_empty() {
            let result = s.check_sat(tm);
            if result == SolverResult::Sat {
                self.model = s.model().cloned();
                self.lower = BigRational::zero();
                self.upper = Some(BigRational::zero());
            }
            return Ok(result);
        }

        let (units, origin, scale) = self.expand_units()?;
        debug!(
            softs = self.softs.len(),
            units = units.len(),
            engine = ?self.engine,
            "maxsmt solve"
        );
        let (result, sat_lower, sat_upper, unit_assignment, model) = match self.engine {
            MaxSatEngineKind::CoreGuided => {
                let mut engine = CoreMaxSat::new(units, self.cancel.clone());
                let result = engine.solve(s, tm)?;
                (
                    result,
                    engine.lower(),
                    engine.upper(),
                    engine.assignment().to_vec(),
                    engine.model().cloned(),
                )
            }
            MaxSatEngineKind::FuMalik => {
                let mut engine = FuMalik::new(units, self.cancel.clone());
                let result = engine.solve(s, tm)?;
                (
                    result,
                    engine.lower(),
                    engine.upper(),
                    engine.assignment().to_vec(),
                    engine.model().cloned(),
                )
            }
        };
        if result == SolverResult::Unsat {
            return Ok(result);
        }

        let scale_rat = BigRational::from(scale);
        let total = self.total();
        let sat_lower = BigRational::from(BigInt::from(sat_lower)) / &scale_rat;
        let sat_upper = BigRational::from(BigInt::from(sat_upper)) / &scale_rat;
        let cost_lower = &total - &sat_upper;
        let cost_upper = &total - &sat_lower;
        self.update_lower(&cost_lower, false);
        self.update_upper(&cost_upper, false);

        if let Some(model) = model {
            for (unit, &orig) in unit_assignment.iter().zip(&origin) {
                if *unit {
                    self.assignment[orig] = true;
                }
            }
            self.model = Some(model);
        } else if result == SolverResult::Sat && self.model.is_none() {
            // No soft was satisfiable; the hard part still has a witness.
            if s.check_sat(tm) == SolverResult::Sat {
                self.model = s.model().cloned();
            }
        }
        Ok(result)
    }

    /// Permanently assert that future models match or improve the
    /// current cost upper bound.
    pub fn commit_assignment<S: BaseSolver>(
        &self,
        s: &mut S,
        tm: &mut TermManager,
    ) -> Result<()> {
        let term = objective_term(tm, &self.softs, &self.weights);
        let satisfied = &self.total() - &self.get_upper();
        let bound = tm.mk_numeral(&satisfied);
        let fml = tm.mk_ge(term, bound);
        s.assert(fml);
        Ok(())
    }
}
