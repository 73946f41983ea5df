//! The cardinality encodings agree with plain counting.

use oxima_core::ast::{TermId, TermManager};
use oxima_core::model::Model;
use oxima_opt::cardinality;
use proptest::prelude::*;

fn assignment_strategy() -> impl Strategy<Value = Vec<bool>> {
    proptest::collection::vec(proptest::bool::ANY, 1..=6)
}

fn setup(assignment: &[bool]) -> (TermManager, Vec<TermId>, Model) {
    let mut tm = TermManager::new();
    let mut vars = Vec::with_capacity(assignment.len());
    let mut model = Model::new();
    for (i, &value) in assignment.iter().enumerate() {
        let v = tm.mk_var(&format!("x{i}"), tm.sorts.bool_sort);
        let constant = tm.mk_bool(value);
        model.insert(v, constant);
        vars.push(v);
    }
    (tm, vars, model)
}

proptest! {
    /// `at_most_one` is satisfied exactly when at most one input is true.
    #[test]
    fn at_most_one_counts(assignment in assignment_strategy()) {
        let (mut tm, vars, model) = setup(&assignment);
        let amo = cardinality::at_most_one(&mut tm, &vars);
        let expected = assignment.iter().filter(|&&b| b).count() <= 1;
        prop_assert_eq!(model.eval_bool(amo, &tm), Some(expected));
    }

    /// The `(hasOne, hasZero)` split is exact, not just an upper bound.
    #[test]
    fn at_most_one_parts_count(assignment in assignment_strategy()) {
        let (mut tm, vars, model) = setup(&assignment);
        let (has_one, has_zero) = cardinality::at_most_one_parts(&mut tm, &vars);
        let trues = assignment.iter().filter(|&&b| b).count();
        prop_assert_eq!(model.eval_bool(has_one, &tm), Some(trues == 1));
        prop_assert_eq!(model.eval_bool(has_zero, &tm), Some(trues == 0));
    }

    /// `at_most_k` is satisfied exactly when at most `k` inputs are true.
    #[test]
    fn at_most_k_counts(assignment in assignment_strategy(), k in 0u64..=6) {
        let (mut tm, vars, model) = setup(&assignment);
        let amk = cardinality::at_most_k(&mut tm, &vars, k);
        let expected = (assignment.iter().filter(|&&b| b).count() as u64) <= k;
        prop_assert_eq!(model.eval_bool(amk, &tm), Some(expected));
    }
}
