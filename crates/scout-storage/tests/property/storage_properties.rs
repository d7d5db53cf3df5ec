use proptest::prelude::*;
use scout_core::traits::IResearchStorage;
use scout_storage::{normalize_url, StorageEngine};

proptest! {
    #[test]
    fn reliability_stays_in_unit_interval(
        helpful in proptest::collection::vec(any::<bool>(), 1..20),
    ) {
        let store = StorageEngine::open_in_memory().unwrap();
        let mut last = None;
        for h in &helpful {
            let entry = store
                .record_citation("example.com", "topic", if *h { 1.0 } else { 0.0 })
                .unwrap();
            prop_assert!((0.0..=1.0).contains(&entry.reliability));
            last = Some(entry);
        }
        let entry = last.unwrap();
        prop_assert_eq!(entry.citation_count as usize, helpful.len());
        let expected = helpful.iter().filter(|h| **h).count() as f64 / (helpful.len() as f64 + 1.0);
        prop_assert!((entry.reliability - expected).abs() < 1e-9);
    }

    #[test]
    fn normalize_is_idempotent(
        path in "[a-z]{1,8}(/[a-z]{1,8}){0,3}",
        q in "[a-z]{1,5}",
        v in "[a-z0-9]{1,5}",
    ) {
        let raw = format!("https://Example.com/{path}/?{q}={v}&utm_campaign=x#frag");
        let once = normalize_url(&raw);
        prop_assert_eq!(normalize_url(&once), once.clone());
        prop_assert!(!once.contains("utm_"));
        prop_assert!(!once.contains('#'));
    }
}
