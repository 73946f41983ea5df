//! Hash-consed terms and their constructors.
//!
//! All terms live in a [`TermManager`] arena and are referenced by
//! [`TermId`]. Structurally identical terms intern to the same id, so
//! handle equality is semantic equality of the construction. The
//! constructors perform only the cheap local simplifications that keep
//! interning effective (Boolean unit laws, double negation, numeral
//! folding for negation); anything deeper belongs to an external
//! simplifier.

use crate::sort::{SortId, SortTable};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

/// Identifier of an interned term.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl fmt::Debug for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// The kind of a term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermKind {
    /// The constant `true`.
    True,
    /// The constant `false`.
    False,
    /// A free constant; the sort lives on the enclosing [`Term`].
    Var(String),
    /// Boolean negation.
    Not(TermId),
    /// N-ary conjunction.
    And(Vec<TermId>),
    /// N-ary disjunction.
    Or(Vec<TermId>),
    /// Implication.
    Implies(TermId, TermId),
    /// If-then-else.
    Ite(TermId, TermId, TermId),
    /// Equality.
    Eq(TermId, TermId),
    /// Integer numeral.
    IntConst(BigInt),
    /// Rational numeral.
    RealConst(BigRational),
    /// N-ary sum.
    Add(Vec<TermId>),
    /// N-ary product.
    Mul(Vec<TermId>),
    /// Arithmetic negation.
    Neg(TermId),
    /// Non-strict order on arithmetic terms.
    Le(TermId, TermId),
    /// Strict order on arithmetic terms.
    Lt(TermId, TermId),
    /// Bit-vector numeral; `value` is reduced modulo `2^width`.
    BvConst {
        /// Bit width.
        width: u32,
        /// Unsigned value.
        value: BigInt,
    },
    /// Unsigned bit-vector `<=`.
    BvUle(TermId, TermId),
    /// Bit extraction, inclusive on both ends.
    BvExtract {
        /// High bit index.
        hi: u32,
        /// Low bit index.
        lo: u32,
        /// The bit-vector argument.
        arg: TermId,
    },
    /// At most `k` of `args` are true.
    PbAtMostK {
        /// Boolean arguments.
        args: Vec<TermId>,
        /// The cardinality bound.
        k: u64,
    },
    /// `sum coeffs[i]*[args[i]] <= bound` with rational coefficients.
    PbLe {
        /// Boolean arguments.
        args: Vec<TermId>,
        /// Per-argument coefficients.
        coeffs: Vec<BigRational>,
        /// The right-hand side.
        bound: BigRational,
    },
}

impl TermKind {
    /// Direct sub-terms, in argument order.
    pub fn children(&self) -> Vec<TermId> {
        match self {
            TermKind::True
            | TermKind::False
            | TermKind::Var(_)
            | TermKind::IntConst(_)
            | TermKind::RealConst(_)
            | TermKind::BvConst { .. } => Vec::new(),
            TermKind::Not(a) | TermKind::Neg(a) | TermKind::BvExtract { arg: a, .. } => vec![*a],
            TermKind::Implies(a, b)
            | TermKind::Eq(a, b)
            | TermKind::Le(a, b)
            | TermKind::Lt(a, b)
            | TermKind::BvUle(a, b) => vec![*a, *b],
            TermKind::Ite(c, t, e) => vec![*c, *t, *e],
            TermKind::And(args)
            | TermKind::Or(args)
            | TermKind::Add(args)
            | TermKind::Mul(args)
            | TermKind::PbAtMostK { args, .. }
            | TermKind::PbLe { args, .. } => args.clone(),
        }
    }
}

/// An interned term: its kind and its sort.
#[derive(Debug, Clone)]
pub struct Term {
    /// Structure of the term.
    pub kind: TermKind,
    /// Sort of the term.
    pub sort: SortId,
}

/// Arena of hash-consed terms.
pub struct TermManager {
    terms: Vec<Term>,
    ids: FxHashMap<(TermKind, SortId), TermId>,
    fresh_counter: u32,
    /// The sort table; built-in sorts are reachable as fields.
    pub sorts: SortTable,
}

impl TermManager {
    /// Create an empty manager with the built-in sorts.
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
            ids: FxHashMap::default(),
            fresh_counter: 0,
            sorts: SortTable::new(),
        }
    }

    fn intern(&mut self, kind: TermKind, sort: SortId) -> TermId {
        use std::collections::hash_map::Entry;
        match self.ids.entry((kind, sort)) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let id = TermId(self.terms.len() as u32);
                self.terms.push(Term {
                    kind: e.key().0.clone(),
                    sort,
                });
                e.insert(id);
                id
            }
        }
    }

    /// Look up a term by id.
    pub fn get(&self, id: TermId) -> Option<&Term> {
        self.terms.get(id.0 as usize)
    }

    /// The kind of `id`. Ids are only minted by this manager, so the
    /// lookup cannot fail for handles the caller obtained from it.
    pub fn kind(&self, id: TermId) -> &TermKind {
        &self.terms[id.0 as usize].kind
    }

    /// The sort of `id`.
    pub fn sort_of(&self, id: TermId) -> SortId {
        self.terms[id.0 as usize].sort
    }

    /// Number of interned terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether no terms have been interned yet.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    // ------------------------------------------------------------------
    // Boolean constructors
    // ------------------------------------------------------------------

    /// The constant `true`.
    pub fn mk_true(&mut self) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::True, sort)
    }

    /// The constant `false`.
    pub fn mk_false(&mut self) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::False, sort)
    }

    /// A Boolean constant.
    pub fn mk_bool(&mut self, value: bool) -> TermId {
        if value { self.mk_true() } else { self.mk_false() }
    }

    /// A free constant of the given sort. Equal names with equal sorts
    /// intern to the same id.
    pub fn mk_var(&mut self, name: &str, sort: SortId) -> TermId {
        self.intern(TermKind::Var(name.to_string()), sort)
    }

    /// A fresh Boolean constant whose name starts with `prefix`.
    pub fn mk_fresh_bool(&mut self, prefix: &str) -> TermId {
        let sort = self.sorts.bool_sort;
        loop {
            let name = format!("{prefix}!{}", self.fresh_counter);
            self.fresh_counter += 1;
            if !self.ids.contains_key(&(TermKind::Var(name.clone()), sort)) {
                return self.mk_var(&name, sort);
            }
        }
    }

    /// Negation, with double negation collapsed.
    pub fn mk_not(&mut self, t: TermId) -> TermId {
        match self.kind(t) {
            TermKind::True => self.mk_false(),
            TermKind::False => self.mk_true(),
            TermKind::Not(inner) => *inner,
            _ => {
                let sort = self.sorts.bool_sort;
                self.intern(TermKind::Not(t), sort)
            }
        }
    }

    /// Conjunction. Units are dropped; an empty conjunction is `true`.
    pub fn mk_and(&mut self, args: Vec<TermId>) -> TermId {
        let mut kept = Vec::with_capacity(args.len());
        for a in args {
            match self.kind(a) {
                TermKind::True => {}
                TermKind::False => return self.mk_false(),
                _ => kept.push(a),
            }
        }
        match kept.len() {
            0 => self.mk_true(),
            1 => kept[0],
            _ => {
                let sort = self.sorts.bool_sort;
                self.intern(TermKind::And(kept), sort)
            }
        }
    }

    /// Disjunction. Units are dropped; an empty disjunction is `false`.
    pub fn mk_or(&mut self, args: Vec<TermId>) -> TermId {
        let mut kept = Vec::with_capacity(args.len());
        for a in args {
            match self.kind(a) {
                TermKind::False => {}
                TermKind::True => return self.mk_true(),
                _ => kept.push(a),
            }
        }
        match kept.len() {
            0 => self.mk_false(),
            1 => kept[0],
            _ => {
                let sort = self.sorts.bool_sort;
                self.intern(TermKind::Or(kept), sort)
            }
        }
    }

    /// Implication.
    pub fn mk_implies(&mut self, a: TermId, b: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::Implies(a, b), sort)
    }

    /// If-then-else over any sort.
    pub fn mk_ite(&mut self, cond: TermId, then: TermId, els: TermId) -> TermId {
        match self.kind(cond) {
            TermKind::True => return then,
            TermKind::False => return els,
            _ => {}
        }
        if then == els {
            return then;
        }
        let sort = self.sort_of(then);
        self.intern(TermKind::Ite(cond, then, els), sort)
    }

    /// Equality; `t = t` folds to `true`.
    pub fn mk_eq(&mut self, a: TermId, b: TermId) -> TermId {
        if a == b {
            return self.mk_true();
        }
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::Eq(a, b), sort)
    }

    // ------------------------------------------------------------------
    // Arithmetic constructors
    // ------------------------------------------------------------------

    /// An integer numeral.
    pub fn mk_int<T: Into<BigInt>>(&mut self, value: T) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern(TermKind::IntConst(value.into()), sort)
    }

    /// A rational numeral.
    pub fn mk_real(&mut self, value: BigRational) -> TermId {
        let sort = self.sorts.real_sort;
        self.intern(TermKind::RealConst(value), sort)
    }

    /// A numeral for `value`: an integer numeral when the denominator is
    /// one, a rational numeral otherwise.
    pub fn mk_numeral(&mut self, value: &BigRational) -> TermId {
        if value.is_integer() {
            self.mk_int(value.to_integer())
        } else {
            self.mk_real(value.clone())
        }
    }

    fn arith_sort(&self, args: &[TermId]) -> SortId {
        let real = self.sorts.real_sort;
        if args.iter().any(|&a| self.sort_of(a) == real) {
            real
        } else {
            self.sorts.int_sort
        }
    }

    /// N-ary sum; the empty sum is the integer `0`.
    pub fn mk_add(&mut self, args: Vec<TermId>) -> TermId {
        match args.len() {
            0 => self.mk_int(0),
            1 => args[0],
            _ => {
                let sort = self.arith_sort(&args);
                self.intern(TermKind::Add(args), sort)
            }
        }
    }

    /// N-ary product; the empty product is the integer `1`.
    pub fn mk_mul(&mut self, args: Vec<TermId>) -> TermId {
        match args.len() {
            0 => self.mk_int(1),
            1 => args[0],
            _ => {
                let sort = self.arith_sort(&args);
                self.intern(TermKind::Mul(args), sort)
            }
        }
    }

    /// Arithmetic negation, folded on numerals.
    pub fn mk_neg(&mut self, t: TermId) -> TermId {
        match self.kind(t) {
            TermKind::IntConst(n) => {
                let n = -n.clone();
                self.mk_int(n)
            }
            TermKind::RealConst(r) => {
                let r = -r.clone();
                self.mk_real(r)
            }
            TermKind::Neg(inner) => *inner,
            _ => {
                let sort = self.sort_of(t);
                self.intern(TermKind::Neg(t), sort)
            }
        }
    }

    /// Difference `a - b`.
    pub fn mk_sub(&mut self, a: TermId, b: TermId) -> TermId {
        let nb = self.mk_neg(b);
        self.mk_add(vec![a, nb])
    }

    /// `a <= b` on arithmetic terms.
    pub fn mk_le(&mut self, a: TermId, b: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::Le(a, b), sort)
    }

    /// `a < b` on arithmetic terms.
    pub fn mk_lt(&mut self, a: TermId, b: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::Lt(a, b), sort)
    }

    /// `a >= b` on arithmetic terms.
    pub fn mk_ge(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_le(b, a)
    }

    /// `a > b` on arithmetic terms.
    pub fn mk_gt(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_lt(b, a)
    }

    // ------------------------------------------------------------------
    // Bit-vector constructors
    // ------------------------------------------------------------------

    /// A bit-vector numeral, reduced modulo `2^width`.
    pub fn mk_bv<T: Into<BigInt>>(&mut self, value: T, width: u32) -> TermId {
        let modulus = BigInt::one() << width;
        let mut value = value.into() % &modulus;
        if value.is_negative() {
            value += &modulus;
        }
        let sort = self.sorts.mk_bv(width);
        self.intern(TermKind::BvConst { width, value }, sort)
    }

    /// Unsigned `a <= b` on bit-vector terms.
    pub fn mk_bv_ule(&mut self, a: TermId, b: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::BvUle(a, b), sort)
    }

    /// Bits `hi..=lo` of `arg` as a bit-vector of width `hi - lo + 1`.
    pub fn mk_bv_extract(&mut self, hi: u32, lo: u32, arg: TermId) -> TermId {
        debug_assert!(hi >= lo);
        let sort = self.sorts.mk_bv(hi - lo + 1);
        self.intern(TermKind::BvExtract { hi, lo, arg }, sort)
    }

    // ------------------------------------------------------------------
    // Pseudo-Boolean constructors
    // ------------------------------------------------------------------

    /// At most `k` of `args` are true.
    pub fn mk_pb_at_most_k(&mut self, args: Vec<TermId>, k: u64) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::PbAtMostK { args, k }, sort)
    }

    /// `sum coeffs[i]*[args[i]] <= bound`.
    pub fn mk_pb_le(
        &mut self,
        args: Vec<TermId>,
        coeffs: Vec<BigRational>,
        bound: BigRational,
    ) -> TermId {
        debug_assert_eq!(args.len(), coeffs.len());
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::PbLe { args, coeffs, bound }, sort)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether `id` is the constant `true`.
    pub fn is_true(&self, id: TermId) -> bool {
        matches!(self.kind(id), TermKind::True)
    }

    /// Whether `id` is the constant `false`.
    pub fn is_false(&self, id: TermId) -> bool {
        matches!(self.kind(id), TermKind::False)
    }

    /// The Boolean value of a constant, if `id` is one.
    pub fn bool_value(&self, id: TermId) -> Option<bool> {
        match self.kind(id) {
            TermKind::True => Some(true),
            TermKind::False => Some(false),
            _ => None,
        }
    }

    /// The numeric value of an integer, rational, or bit-vector numeral.
    pub fn numeral_value(&self, id: TermId) -> Option<BigRational> {
        match self.kind(id) {
            TermKind::IntConst(n) => Some(BigRational::from(n.clone())),
            TermKind::RealConst(r) => Some(r.clone()),
            TermKind::BvConst { value, .. } => Some(BigRational::from(value.clone())),
            _ => None,
        }
    }

    /// Free constants reachable from `roots`, in first-visit order.
    pub fn collect_vars(&self, roots: &[TermId]) -> Vec<TermId> {
        let mut seen = FxHashSet::default();
        let mut vars = Vec::new();
        let mut stack: Vec<TermId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let kind = self.kind(id);
            if matches!(kind, TermKind::Var(_)) {
                vars.push(id);
            }
            let mut children = kind.children();
            children.reverse();
            stack.extend(children);
        }
        vars
    }
}

impl Default for TermManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_stable() {
        let mut tm = TermManager::new();
        let a = tm.mk_var("a", tm.sorts.bool_sort);
        let b = tm.mk_var("b", tm.sorts.bool_sort);
        let or1 = tm.mk_or(vec![a, b]);
        let or2 = tm.mk_or(vec![a, b]);
        assert_eq!(or1, or2);
        let or3 = tm.mk_or(vec![b, a]);
        assert_ne!(or1, or3);
    }

    #[test]
    fn test_var_sorts_distinguish() {
        let mut tm = TermManager::new();
        let x_int = tm.mk_var("x", tm.sorts.int_sort);
        let x_real = tm.mk_var("x", tm.sorts.real_sort);
        assert_ne!(x_int, x_real);
    }

    #[test]
    fn test_double_negation() {
        let mut tm = TermManager::new();
        let a = tm.mk_var("a", tm.sorts.bool_sort);
        let not_a = tm.mk_not(a);
        assert_eq!(tm.mk_not(not_a), a);
    }

    #[test]
    fn test_boolean_units() {
        let mut tm = TermManager::new();
        let t = tm.mk_true();
        let f = tm.mk_false();
        let a = tm.mk_var("a", tm.sorts.bool_sort);
        assert_eq!(tm.mk_and(vec![t, a]), a);
        assert_eq!(tm.mk_and(vec![f, a]), f);
        assert_eq!(tm.mk_or(vec![f, a]), a);
        assert_eq!(tm.mk_or(vec![t, a]), t);
        assert_eq!(tm.mk_or(vec![]), f);
        assert_eq!(tm.mk_and(vec![]), t);
    }

    #[test]
    fn test_fresh_bools_are_fresh() {
        let mut tm = TermManager::new();
        let p0 = tm.mk_fresh_bool("p");
        let p1 = tm.mk_fresh_bool("p");
        assert_ne!(p0, p1);
    }

    #[test]
    fn test_bv_numeral_wraps() {
        let mut tm = TermManager::new();
        let a = tm.mk_bv(5, 2);
        let b = tm.mk_bv(1, 2);
        assert_eq!(a, b);
        let c = tm.mk_bv(-1, 2);
        let d = tm.mk_bv(3, 2);
        assert_eq!(c, d);
    }

    #[test]
    fn test_neg_folds_numerals() {
        let mut tm = TermManager::new();
        let five = tm.mk_int(5);
        let minus_five = tm.mk_int(-5);
        assert_eq!(tm.mk_neg(five), minus_five);
        assert_eq!(tm.mk_neg(minus_five), five);
    }

    #[test]
    fn test_collect_vars_order() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let sum = tm.mk_add(vec![x, y]);
        let ten = tm.mk_int(10);
        let le = tm.mk_le(sum, ten);
        let vars = tm.collect_vars(&[le, x]);
        assert_eq!(vars, vec![x, y]);
    }

    #[test]
    fn test_add_sort_promotion() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let r = tm.mk_var("r", tm.sorts.real_sort);
        let sum = tm.mk_add(vec![x, r]);
        assert_eq!(tm.sort_of(sum), tm.sorts.real_sort);
        let sum2 = tm.mk_add(vec![x, x]);
        assert_eq!(tm.sort_of(sum2), tm.sorts.int_sort);
    }
}
