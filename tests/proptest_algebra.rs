
use condstyle::{BinaryOp, Node, Term};
use proptest::prelude::*;
use strategies::{arb_term, assignments, holds};

fn has_negated_junction(term: &Term) -> bool {
    match term.node() {
        Node::Binary { op, left, right } => {
            (op.is_junction() && term.is_negated())
                || has_negated_junction(left)
                || has_negated_junction(right)
        }
        _ => false,
    }
}

fn assert_agrees(original: &Term, rewritten: &Term) -> Result<(), TestCaseError> {
    for props in assignments() {
        prop_assert_eq!(
            holds(original, &props),
            holds(rewritten, &props),
            "`{}` and `{}` disagree on {:?}",
            original,
            rewritten,
            props
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Constant folding
//
// A junction over two literals is always a single literal.
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn junction_of_literals_folds(l in any::<bool>(), r in any::<bool>()) {
        let or = Term::or(Term::boolean(l), Term::boolean(r));
        let and = Term::and(Term::boolean(l), Term::boolean(r));
        prop_assert!(or.is_literal());
        prop_assert!(and.is_literal());
        prop_assert_eq!(or.to_boolean(), Some(l || r));
        prop_assert_eq!(and.to_boolean(), Some(l && r));
    }
}

// ---------------------------------------------------------------------------
// Negation normal form
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn nnf_is_idempotent(term in arb_term()) {
        let mut once = term.clone();
        once.to_nnf();
        let mut twice = once.clone();
        twice.to_nnf();
        prop_assert_eq!(once.to_string(), twice.to_string());
    }

    #[test]
    fn nnf_leaves_no_negated_junction(term in arb_term()) {
        let mut nnf = term.clone();
        nnf.to_nnf();
        prop_assert!(!has_negated_junction(&nnf), "negated junction left in `{}`", nnf);
        assert_agrees(&term, &nnf)?;
    }

    #[test]
    fn de_morgan_is_involutive(term in arb_term()) {
        let mut twice = term.clone();
        twice.de_morgan().de_morgan();
        prop_assert_eq!(twice, term);
    }

    #[test]
    fn negation_is_involutive(term in arb_term()) {
        let mut twice = term.clone();
        twice.negate().negate();
        prop_assert_eq!(twice.to_string(), term.to_string());
    }
}

// ---------------------------------------------------------------------------
// Normal forms agree with direct evaluation on every assignment
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn dnf_agrees(term in arb_term(), perfect in any::<bool>()) {
        let mut dnf = term.clone();
        dnf.to_dnf(perfect);
        assert_agrees(&term, &dnf)?;
    }

    #[test]
    fn cnf_agrees(term in arb_term(), perfect in any::<bool>()) {
        let mut cnf = term.clone();
        cnf.to_cnf(perfect);
        assert_agrees(&term, &cnf)?;
    }

    #[test]
    fn negation_complements(term in arb_term()) {
        let negated = !term.clone();
        for props in assignments() {
            prop_assert_ne!(holds(&term, &props), holds(&negated, &props));
        }
    }

    #[test]
    fn perfect_dnf_has_no_or_under_and(term in arb_term()) {
        fn or_under_and(term: &Term, under_and: bool) -> bool {
            match term.node() {
                Node::Binary { op, left, right } => {
                    (under_and && *op == BinaryOp::Or)
                        || or_under_and(left, *op == BinaryOp::And)
                        || or_under_and(right, *op == BinaryOp::And)
                }
                _ => false,
            }
        }
        let mut dnf = term;
        dnf.to_dnf(true);
        prop_assert!(!or_under_and(&dnf, false), "not flat: `{}`", dnf);
    }
}
