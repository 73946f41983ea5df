//! Algebraic laws of the extended-rational bound type.

use num_rational::BigRational;
use oxima_opt::InfEps;
use proptest::prelude::*;

fn rational_strategy() -> impl Strategy<Value = BigRational> {
    (-50i64..50i64, 1i64..10i64).prop_map(|(n, d)| BigRational::new(n.into(), d.into()))
}

fn inf_eps_strategy() -> impl Strategy<Value = InfEps> {
    (rational_strategy(), rational_strategy(), rational_strategy())
        .prop_map(|(a, r, b)| InfEps::new(a, r, b))
}

proptest! {
    /// Addition is commutative.
    #[test]
    fn addition_commutes(a in inf_eps_strategy(), b in inf_eps_strategy()) {
        prop_assert_eq!(a.clone() + b.clone(), b + a);
    }

    /// Addition is associative.
    #[test]
    fn addition_associates(
        a in inf_eps_strategy(),
        b in inf_eps_strategy(),
        c in inf_eps_strategy(),
    ) {
        prop_assert_eq!((a.clone() + b.clone()) + c.clone(), a + (b + c));
    }

    /// Negation is an additive inverse.
    #[test]
    fn negation_is_inverse(a in inf_eps_strategy()) {
        prop_assert_eq!(a.clone() + (-a), InfEps::zero());
    }

    /// The order is translation invariant.
    #[test]
    fn order_is_translation_invariant(
        a in inf_eps_strategy(),
        b in inf_eps_strategy(),
        c in inf_eps_strategy(),
    ) {
        prop_assert_eq!(a < b, a + c.clone() < b + c);
    }

    /// Negation reverses the order.
    #[test]
    fn negation_reverses_order(a in inf_eps_strategy(), b in inf_eps_strategy()) {
        prop_assert_eq!(a < b, -b.clone() < -a.clone());
    }

    /// Every finite bound sits strictly between the infinities, and an
    /// epsilon nudge is strictly above the plain rational.
    #[test]
    fn finite_bounds_are_ordered(r in rational_strategy()) {
        let finite = InfEps::finite(r.clone());
        let nudged = InfEps::strictly_above(r);
        prop_assert!(InfEps::neg_infinite() < finite);
        prop_assert!(finite < nudged);
        prop_assert!(nudged < InfEps::infinite());
    }
}
