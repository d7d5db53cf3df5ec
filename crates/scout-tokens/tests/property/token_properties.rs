use proptest::prelude::*;
use scout_tokens::{TokenBudget, TokenCounter};

proptest! {
    #[test]
    fn cached_equals_uncached(s in ".{0,200}") {
        let counter = TokenCounter::default();
        prop_assert_eq!(counter.count(&s), counter.count_cached(&s));
    }

    #[test]
    fn subadditivity(a in ".{0,100}", b in ".{0,100}") {
        let counter = TokenCounter::default();
        let combined = format!("{}{}", a, b);
        prop_assert!(counter.count(&combined) <= counter.count(&a) + counter.count(&b) + 1);
    }

    #[test]
    fn truncate_never_exceeds_limit(s in "[a-z ]{0,400}", max in 0usize..60) {
        let counter = TokenCounter::default();
        let cut = counter.truncate(&s, max);
        prop_assert!(counter.count(&cut) <= max);
        prop_assert!(s.starts_with(&cut));
    }

    #[test]
    fn fitted_text_always_fits(s in "[a-z ]{0,400}", used in 0usize..5000) {
        let counter = TokenCounter::default();
        let budget = TokenBudget::new(&counter, 50, 4000);
        let fitted = budget.fit(&s, used);
        prop_assert!(counter.count(&fitted) <= budget.allowance(used));
    }
}
