//! Extended rationals with infinity and infinitesimal parts.
//!
//! An [`InfEps`] is `a*oo + r + b*eps` with rational `a`, `r`, `b`,
//! ordered lexicographically on `(a, r, b)`. The engine uses it to
//! report unbounded optima (`a != 0`) and strict suprema (`b != 0`,
//! e.g. "strictly greater than `r`" is `r + eps`).

use num_rational::BigRational;
use num_traits::{One, Zero};
use oxima_core::ast::{TermId, TermManager};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// An extended rational `a*oo + r + b*eps`.
///
/// The derived ordering is lexicographic on the field order below,
/// which is exactly the intended total order of the extended field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfEps {
    infinity: BigRational,
    rational: BigRational,
    infinitesimal: BigRational,
}

impl InfEps {
    /// The zero bound.
    pub fn zero() -> Self {
        Self::new(BigRational::zero(), BigRational::zero(), BigRational::zero())
    }

    /// Construct from explicit components.
    pub fn new(infinity: BigRational, rational: BigRational, infinitesimal: BigRational) -> Self {
        Self {
            infinity,
            rational,
            infinitesimal,
        }
    }

    /// The finite bound `r`.
    pub fn finite(r: BigRational) -> Self {
        Self::new(BigRational::zero(), r, BigRational::zero())
    }

    /// Positive infinity.
    pub fn infinite() -> Self {
        Self::new(BigRational::one(), BigRational::zero(), BigRational::zero())
    }

    /// Negative infinity.
    pub fn neg_infinite() -> Self {
        -Self::infinite()
    }

    /// The bound `r + eps`, i.e. strictly above `r`.
    pub fn strictly_above(r: BigRational) -> Self {
        Self::new(BigRational::zero(), r, BigRational::one())
    }

    /// The infinity coefficient `a`.
    pub fn inf_coeff(&self) -> &BigRational {
        &self.infinity
    }

    /// The rational part `r`.
    pub fn rational_part(&self) -> &BigRational {
        &self.rational
    }

    /// The infinitesimal coefficient `b`.
    pub fn eps_coeff(&self) -> &BigRational {
        &self.infinitesimal
    }

    /// Whether the infinity coefficient is zero.
    pub fn is_finite(&self) -> bool {
        self.infinity.is_zero()
    }

    /// Convert to a symbolic expression `a*oo + r + b*eps` using the
    /// reserved integer constants `oo` and `epsilon`.
    pub fn to_term(&self, tm: &mut TermManager) -> TermId {
        let mut args = Vec::new();
        if !self.infinity.is_zero() {
            let oo = tm.mk_var("oo", tm.sorts.int_sort);
            if self.infinity.is_one() {
                args.push(oo);
            } else {
                let coeff = tm.mk_numeral(&self.infinity);
                args.push(tm.mk_mul(vec![coeff, oo]));
            }
        }
        if !self.rational.is_zero() {
            args.push(tm.mk_numeral(&self.rational));
        }
        if !self.infinitesimal.is_zero() {
            let eps = tm.mk_var("epsilon", tm.sorts.int_sort);
            if self.infinitesimal.is_one() {
                args.push(eps);
            } else {
                let coeff = tm.mk_numeral(&self.infinitesimal);
                args.push(tm.mk_mul(vec![coeff, eps]));
            }
        }
        match args.len() {
            0 => tm.mk_int(0),
            1 => args[0],
            _ => tm.mk_add(args),
        }
    }
}

impl From<BigRational> for InfEps {
    fn from(r: BigRational) -> Self {
        Self::finite(r)
    }
}

impl From<i64> for InfEps {
    fn from(n: i64) -> Self {
        Self::finite(BigRational::from_integer(n.into()))
    }
}

impl Add for InfEps {
    type Output = InfEps;

    fn add(self, rhs: InfEps) -> InfEps {
        InfEps {
            infinity: self.infinity + rhs.infinity,
            rational: self.rational + rhs.rational,
            infinitesimal: self.infinitesimal + rhs.infinitesimal,
        }
    }
}

impl Neg for InfEps {
    type Output = InfEps;

    fn neg(self) -> InfEps {
        InfEps {
            infinity: -self.infinity,
            rational: -self.rational,
            infinitesimal: -self.infinitesimal,
        }
    }
}

impl Sub for InfEps {
    type Output = InfEps;

    fn sub(self, rhs: InfEps) -> InfEps {
        self + (-rhs)
    }
}

impl fmt::Display for InfEps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.infinity.is_zero() {
            if self.infinity.is_one() {
                parts.push("oo".to_string());
            } else if self.infinity == -BigRational::one() {
                parts.push("-oo".to_string());
            } else {
                parts.push(format!("{}*oo", self.infinity));
            }
        }
        if !self.rational.is_zero() || parts.is_empty() && self.infinitesimal.is_zero() {
            parts.push(format!("{}", self.rational));
        }
        if !self.infinitesimal.is_zero() {
            if self.infinitesimal.is_one() {
                parts.push("eps".to_string());
            } else if self.infinitesimal == -BigRational::one() {
                parts.push("-eps".to_string());
            } else {
                parts.push(format!("{}*eps", self.infinitesimal));
            }
        }
        write!(f, "{}", parts.join(" + "))
    }
}
