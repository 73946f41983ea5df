//! A bounded-enumeration reference implementation of [`BaseSolver`].
//!
//! The solver enumerates assignments over the free variables of its
//! assertions: Booleans over both truth values, integers over a domain
//! declared per variable, bit-vectors over their full range. Unsat
//! cores are shrunk greedily, so the engines see small cores like they
//! would from a production solver. Only suitable for the small
//! instances used in tests.

use oxima_core::ast::{TermId, TermManager};
use oxima_core::model::Model;
use oxima_opt::{BaseSolver, SolverResult};
use rustc_hash::FxHashMap;

const MAX_CANDIDATES: u64 = 1 << 20;

pub struct EnumSolver {
    frames: Vec<Vec<TermId>>,
    int_domains: FxHashMap<TermId, (i64, i64)>,
    model: Option<Model>,
    core: Vec<TermId>,
    cancel: bool,
}

impl EnumSolver {
    pub fn new() -> Self {
        Self {
            frames: vec![Vec::new()],
            int_domains: FxHashMap::default(),
            model: None,
            core: Vec::new(),
            cancel: false,
        }
    }

    /// Declare the enumeration range of an integer variable.
    pub fn declare_int(&mut self, var: TermId, lo: i64, hi: i64) {
        self.int_domains.insert(var, (lo, hi));
    }

    fn assertions(&self) -> Vec<TermId> {
        self.frames.iter().flatten().copied().collect()
    }

    fn find_model(&self, formulas: &[TermId], tm: &mut TermManager) -> Option<Model> {
        let vars = tm.collect_vars(formulas);
        let mut domains: Vec<(TermId, Vec<TermId>)> = Vec::with_capacity(vars.len());
        let mut combinations: u64 = 1;
        for v in vars {
            let sort = tm.sort_of(v);
            let candidates: Vec<TermId> = if tm.sorts.is_bool(sort) {
                let f = tm.mk_false();
                let t = tm.mk_true();
                vec![f, t]
            } else if let Some(&(lo, hi)) = self.int_domains.get(&v) {
                (lo..=hi).map(|n| tm.mk_int(n)).collect()
            } else if let Some(w) = tm.sorts.bv_width(sort) {
                (0..(1i64 << w)).map(|n| tm.mk_bv(n, w)).collect()
            } else {
                panic!("enum solver: no domain declared for variable {v:?}");
            };
            if candidates.is_empty() {
                return None;
            }
            combinations = combinations.saturating_mul(candidates.len() as u64);
            assert!(
                combinations <= MAX_CANDIDATES,
                "enum solver: search space too large for a test"
            );
            domains.push((v, candidates));
        }

        let mut odometer = vec![0usize; domains.len()];
        loop {
            let mut model = Model::new();
            for (slot, (v, candidates)) in odometer.iter().zip(&domains) {
                model.insert(*v, candidates[*slot]);
            }
            if formulas
                .iter()
                .all(|&f| model.eval_bool(f, tm) == Some(true))
            {
                return Some(model);
            }
            let mut i = 0;
            loop {
                if i == domains.len() {
                    return None;
                }
                odometer[i] += 1;
                if odometer[i] < domains[i].1.len() {
                    break;
                }
                odometer[i] = 0;
                i += 1;
            }
        }
    }

    fn solve(&self, assumptions: &[TermId], tm: &mut TermManager) -> Option<Model> {
        let mut formulas = self.assertions();
        formulas.extend_from_slice(assumptions);
        self.find_model(&formulas, tm)
    }
}

impl Default for EnumSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseSolver for EnumSolver {
    fn push(&mut self) {
        self.frames.push(Vec::new());
    }

    fn pop(&mut self, n: u32) {
        for _ in 0..n {
            if self.frames.len() > 1 {
                self.frames.pop();
            }
        }
    }

    fn assert(&mut self, f: TermId) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(f);
        }
    }

    fn check_sat_assuming(
        &mut self,
        assumptions: &[TermId],
        tm: &mut TermManager,
    ) -> SolverResult {
        if self.cancel {
            return SolverResult::Unknown;
        }
        match self.solve(assumptions, tm) {
            Some(model) => {
                self.model = Some(model);
                SolverResult::Sat
            }
            None => {
                // Shrink the assumption set greedily to a small core.
                let mut core: Vec<TermId> = assumptions.to_vec();
                let mut i = 0;
                while i < core.len() {
                    let mut candidate = core.clone();
                    candidate.remove(i);
                    if self.solve(&candidate, tm).is_none() {
                        core = candidate;
                    } else {
                        i += 1;
                    }
                }
                self.core = core;
                SolverResult::Unsat
            }
        }
    }

    fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    fn unsat_core(&self) -> &[TermId] {
        &self.core
    }

    fn set_cancel(&mut self, f: bool) {
        self.cancel = f;
    }
}
