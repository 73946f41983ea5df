//! Models: assignments of constants to free variables, with evaluation.
//!
//! A [`Model`] maps variable terms to constant terms. Evaluation walks a
//! term bottom-up over that assignment and is total on the fragment the
//! engine produces (Boolean structure, linear arithmetic, bit-vectors,
//! and the pseudo-Boolean atoms); it returns `None` when a variable is
//! unassigned or a sort is mixed incoherently.

use crate::ast::{TermId, TermKind, TermManager};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};
use rustc_hash::FxHashMap;

/// Evaluated value of a term.
enum Value {
    Bool(bool),
    Num(BigRational),
    Bv { width: u32, value: BigInt },
}

/// A finite assignment of constants to free variables.
#[derive(Debug, Clone, Default)]
pub struct Model {
    values: FxHashMap<TermId, TermId>,
}

impl Model {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` (a constant term) to the variable `var`.
    pub fn insert(&mut self, var: TermId, value: TermId) {
        self.values.insert(var, value);
    }

    /// The assigned constant for `var`, if any.
    pub fn get(&self, var: TermId) -> Option<TermId> {
        self.values.get(&var).copied()
    }

    /// Number of assigned variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the model assigns no variables.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn value(&self, id: TermId, tm: &TermManager) -> Option<Value> {
        match tm.kind(id) {
            TermKind::True => Some(Value::Bool(true)),
            TermKind::False => Some(Value::Bool(false)),
            TermKind::IntConst(n) => Some(Value::Num(BigRational::from(n.clone()))),
            TermKind::RealConst(r) => Some(Value::Num(r.clone())),
            TermKind::BvConst { width, value } => Some(Value::Bv {
                width: *width,
                value: value.clone(),
            }),
            TermKind::Var(_) => {
                let assigned = self.get(id)?;
                if assigned == id {
                    return None;
                }
                self.value(assigned, tm)
            }
            TermKind::Not(a) => match self.value(*a, tm)? {
                Value::Bool(b) => Some(Value::Bool(!b)),
                _ => None,
            },
            TermKind::And(args) => {
                let mut unknown = false;
                for &a in args {
                    match self.value(a, tm) {
                        Some(Value::Bool(false)) => return Some(Value::Bool(false)),
                        Some(Value::Bool(true)) => {}
                        _ => unknown = true,
                    }
                }
                if unknown { None } else { Some(Value::Bool(true)) }
            }
            TermKind::Or(args) => {
                let mut unknown = false;
                for &a in args {
                    match self.value(a, tm) {
                        Some(Value::Bool(true)) => return Some(Value::Bool(true)),
                        Some(Value::Bool(false)) => {}
                        _ => unknown = true,
                    }
                }
                if unknown { None } else { Some(Value::Bool(false)) }
            }
            TermKind::Implies(a, b) => {
                match (self.value(*a, tm)?, self.value(*b, tm)?) {
                    (Value::Bool(a), Value::Bool(b)) => Some(Value::Bool(!a || b)),
                    _ => None,
                }
            }
            TermKind::Ite(c, t, e) => match self.value(*c, tm)? {
                Value::Bool(true) => self.value(*t, tm),
                Value::Bool(false) => self.value(*e, tm),
                _ => None,
            },
            TermKind::Eq(a, b) => {
                let eq = match (self.value(*a, tm)?, self.value(*b, tm)?) {
                    (Value::Bool(x), Value::Bool(y)) => x == y,
                    (Value::Num(x), Value::Num(y)) => x == y,
                    (Value::Bv { value: x, .. }, Value::Bv { value: y, .. }) => x == y,
                    _ => return None,
                };
                Some(Value::Bool(eq))
            }
            TermKind::Add(args) => {
                let mut sum = BigRational::zero();
                for &a in args {
                    match self.value(a, tm)? {
                        Value::Num(n) => sum += n,
                        _ => return None,
                    }
                }
                Some(Value::Num(sum))
            }
            TermKind::Mul(args) => {
                let mut product = BigRational::one();
                for &a in args {
                    match self.value(a, tm)? {
                        Value::Num(n) => product *= n,
                        _ => return None,
                    }
                }
                Some(Value::Num(product))
            }
            TermKind::Neg(a) => match self.value(*a, tm)? {
                Value::Num(n) => Some(Value::Num(-n)),
                _ => None,
            },
            TermKind::Le(a, b) => match (self.value(*a, tm)?, self.value(*b, tm)?) {
                (Value::Num(x), Value::Num(y)) => Some(Value::Bool(x <= y)),
                _ => None,
            },
            TermKind::Lt(a, b) => match (self.value(*a, tm)?, self.value(*b, tm)?) {
                (Value::Num(x), Value::Num(y)) => Some(Value::Bool(x < y)),
                _ => None,
            },
            TermKind::BvUle(a, b) => match (self.value(*a, tm)?, self.value(*b, tm)?) {
                (Value::Bv { value: x, .. }, Value::Bv { value: y, .. }) => {
                    Some(Value::Bool(x <= y))
                }
                _ => None,
            },
            TermKind::BvExtract { hi, lo, arg } => match self.value(*arg, tm)? {
                Value::Bv { value, .. } => {
                    let width = *hi - *lo + 1;
                    let mask = (BigInt::one() << width) - BigInt::one();
                    Some(Value::Bv {
                        width,
                        value: (value >> *lo) & mask,
                    })
                }
                _ => None,
            },
            TermKind::PbAtMostK { args, k } => {
                let mut count = 0u64;
                for &a in args {
                    match self.value(a, tm)? {
                        Value::Bool(true) => count += 1,
                        Value::Bool(false) => {}
                        _ => return None,
                    }
                }
                Some(Value::Bool(count <= *k))
            }
            TermKind::PbLe { args, coeffs, bound } => {
                let mut sum = BigRational::zero();
                for (&a, c) in args.iter().zip(coeffs) {
                    match self.value(a, tm)? {
                        Value::Bool(true) => sum += c,
                        Value::Bool(false) => {}
                        _ => return None,
                    }
                }
                Some(Value::Bool(sum <= *bound))
            }
        }
    }

    /// Evaluate `id` to a constant term.
    pub fn eval(&self, id: TermId, tm: &mut TermManager) -> Option<TermId> {
        match self.value(id, tm)? {
            Value::Bool(b) => Some(tm.mk_bool(b)),
            Value::Num(n) => Some(tm.mk_numeral(&n)),
            Value::Bv { width, value } => Some(tm.mk_bv(value, width)),
        }
    }

    /// Evaluate a Boolean term.
    pub fn eval_bool(&self, id: TermId, tm: &TermManager) -> Option<bool> {
        match self.value(id, tm)? {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Evaluate a numeric term; bit-vectors evaluate to their unsigned value.
    pub fn eval_rational(&self, id: TermId, tm: &TermManager) -> Option<BigRational> {
        match self.value(id, tm)? {
            Value::Num(n) => Some(n),
            Value::Bv { value, .. } => Some(BigRational::from(value)),
            _ => None,
        }
    }
}
