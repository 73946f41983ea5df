//! Cardinality constraints over Boolean formulas.
//!
//! Two encodings are provided: a pseudo-Boolean `at-most-k` atom that
//! defers counting to the solver, and the recursive divide-and-conquer
//! `at-most-one` used by the Fu-Malik engine. The at-most-one encoding
//! produces `O(n)` subformulas and introduces no fresh names.

use oxima_core::ast::{TermId, TermManager};

/// A formula satisfied iff at most `k` of `xs` are true.
pub fn at_most_k(tm: &mut TermManager, xs: &[TermId], k: u64) -> TermId {
    at_most_k_weighted(tm, xs, &vec![1; xs.len()], k)
}

/// A formula satisfied iff the coefficient sum of the true members of
/// `xs` is at most `k`. Unit coefficients reduce to the plain
/// `at-most-k` atom.
pub fn at_most_k_weighted(
    tm: &mut TermManager,
    xs: &[TermId],
    coeffs: &[u64],
    k: u64,
) -> TermId {
    debug_assert_eq!(xs.len(), coeffs.len());
    if coeffs.iter().all(|&c| c == 1) {
        tm.mk_pb_at_most_k(xs.to_vec(), k)
    } else {
        let coeffs = coeffs
            .iter()
            .map(|&c| num_rational::BigRational::from_integer(c.into()))
            .collect();
        let bound = num_rational::BigRational::from_integer(k.into());
        tm.mk_pb_le(xs.to_vec(), coeffs, bound)
    }
}

/// The `(hasOne, hasZero)` pair of the recursive at-most-one encoding:
/// `hasOne` holds iff exactly one of `xs` is true, `hasZero` iff none is.
///
/// At a leaf `hasOne = x` and `hasZero = !x`; at an internal node the
/// halves combine as `hasOne = (hasOne1 & hasZero2) | (hasOne2 & hasZero1)`
/// and `hasZero = hasZero1 & hasZero2`.
pub fn at_most_one_parts(tm: &mut TermManager, xs: &[TermId]) -> (TermId, TermId) {
    debug_assert!(!xs.is_empty());
    if xs.len() == 1 {
        let has_zero = tm.mk_not(xs[0]);
        return (xs[0], has_zero);
    }
    let mid = xs.len() / 2;
    let (has_one1, has_zero1) = at_most_one_parts(tm, &xs[..mid]);
    let (has_one2, has_zero2) = at_most_one_parts(tm, &xs[mid..]);
    let left = tm.mk_and(vec![has_one1, has_zero2]);
    let right = tm.mk_and(vec![has_one2, has_zero1]);
    let has_one = tm.mk_or(vec![left, right]);
    let has_zero = tm.mk_and(vec![has_zero1, has_zero2]);
    (has_one, has_zero)
}

/// A formula satisfied iff at most one of `xs` is true.
pub fn at_most_one(tm: &mut TermManager, xs: &[TermId]) -> TermId {
    if xs.is_empty() {
        return tm.mk_true();
    }
    let (has_one, has_zero) = at_most_one_parts(tm, xs);
    tm.mk_or(vec![has_one, has_zero])
}
