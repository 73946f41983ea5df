//! Interning and evaluation properties of the term arena.

use num_rational::BigRational;
use oxima_core::ast::TermManager;
use oxima_core::model::Model;
use proptest::prelude::*;

fn small_int_strategy() -> impl Strategy<Value = i64> {
    -100i64..100i64
}

proptest! {
    /// Creating the same integer numeral twice yields the same id.
    #[test]
    fn integer_numeral_uniqueness(n in small_int_strategy()) {
        let mut tm = TermManager::new();
        let t1 = tm.mk_int(n);
        let t2 = tm.mk_int(n);
        prop_assert_eq!(t1, t2);
    }

    /// Variables with equal names and sorts share an id.
    #[test]
    fn variable_uniqueness(name in "[a-z][a-z0-9]{0,4}") {
        let mut tm = TermManager::new();
        let sort = tm.sorts.int_sort;
        let v1 = tm.mk_var(&name, sort);
        let v2 = tm.mk_var(&name, sort);
        prop_assert_eq!(v1, v2);
    }

    /// Double negation of a Boolean variable is the variable itself.
    #[test]
    fn double_negation(name in "[a-z]{1,4}") {
        let mut tm = TermManager::new();
        let v = tm.mk_var(&name, tm.sorts.bool_sort);
        let nn = {
            let n = tm.mk_not(v);
            tm.mk_not(n)
        };
        prop_assert_eq!(nn, v);
    }

    /// Evaluating a sum of numerals agrees with plain addition.
    #[test]
    fn sum_evaluation(values in proptest::collection::vec(small_int_strategy(), 2..6)) {
        let mut tm = TermManager::new();
        let args: Vec<_> = values.iter().map(|&n| tm.mk_int(n)).collect();
        let sum = tm.mk_add(args);
        let model = Model::new();
        let expected = BigRational::from_integer(values.iter().sum::<i64>().into());
        prop_assert_eq!(model.eval_rational(sum, &tm), Some(expected));
    }

    /// Negation evaluation flips the truth value of an assigned variable.
    #[test]
    fn negation_evaluation(value in proptest::bool::ANY) {
        let mut tm = TermManager::new();
        let v = tm.mk_var("p", tm.sorts.bool_sort);
        let nv = tm.mk_not(v);
        let mut model = Model::new();
        let constant = tm.mk_bool(value);
        model.insert(v, constant);
        prop_assert_eq!(model.eval_bool(nv, &tm), Some(!value));
    }

    /// Bit-vector numerals wrap modulo `2^width`.
    #[test]
    fn bv_numeral_wraps(n in 0i64..256, w in 1u32..=8) {
        let mut tm = TermManager::new();
        let a = tm.mk_bv(n, w);
        let b = tm.mk_bv(n + (1i64 << w), w);
        prop_assert_eq!(a, b);
    }
}
