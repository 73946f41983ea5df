//! The base-solver contract the optimization engine depends on.
//!
//! The engine is generic over any incremental solver that can assert
//! formulas, answer `check-sat` under assumptions, produce models, and
//! return unsat cores over the assumption set. Everything else (theory
//! reasoning, simplification, bit-blasting) is the solver's business.

use crate::inf_eps::InfEps;
use oxima_core::ast::{TermId, TermManager};
use oxima_core::model::Model;

/// Outcome of a satisfiability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverResult {
    /// A model exists.
    Sat,
    /// No model exists.
    Unsat,
    /// The solver gave up (incompleteness, resource limit, cancellation).
    Unknown,
}

/// An incremental solver with assumptions, models, and unsat cores.
///
/// The engine calls the solver strictly serially and only observes
/// cancellation at `check_sat_assuming` boundaries. An unsat core must
/// be a subset of the assumption list of the preceding query; it need
/// not be minimal.
pub trait BaseSolver {
    /// Open a new assertion scope.
    fn push(&mut self);

    /// Close the `n` most recent assertion scopes.
    fn pop(&mut self, n: u32);

    /// Permanently add `f` within the current scope.
    fn assert(&mut self, f: TermId);

    /// Check satisfiability of the asserted formulas together with
    /// `assumptions`.
    fn check_sat_assuming(
        &mut self,
        assumptions: &[TermId],
        tm: &mut TermManager,
    ) -> SolverResult;

    /// Check satisfiability of the asserted formulas.
    fn check_sat(&mut self, tm: &mut TermManager) -> SolverResult {
        self.check_sat_assuming(&[], tm)
    }

    /// The model of the last [`SolverResult::Sat`] answer.
    fn model(&self) -> Option<&Model>;

    /// The unsat core of the last [`SolverResult::Unsat`] answer: a
    /// subset of the assumptions passed to that query.
    fn unsat_core(&self) -> &[TermId];

    /// Set or clear the cancellation flag. An ongoing or subsequent
    /// check returns [`SolverResult::Unknown`] while the flag is set.
    fn set_cancel(&mut self, f: bool);

    /// Why the last answer was [`SolverResult::Unknown`].
    fn reason_unknown(&self) -> String {
        "unknown".to_string()
    }

    /// Theory-derived optimum of `objective` under the current
    /// assertions, when the solver can produce one (e.g. from a Farkas
    /// combination of the simplex explanation). `None` means the solver
    /// offers no such bound and the engine falls back to model-guided
    /// search.
    fn maximize_hint(&mut self, _objective: TermId, _tm: &mut TermManager) -> Option<InfEps> {
        None
    }
}
