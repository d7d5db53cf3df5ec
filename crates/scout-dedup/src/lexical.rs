//! Word-set similarity between research queries.

use std::collections::BTreeSet;

/// Words must be longer than this to count.
pub const MIN_WORD_LEN: usize = 3;

/// Lowercased words longer than three characters, punctuation stripped.
pub fn significant_words(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > MIN_WORD_LEN)
        .map(|w| w.to_lowercase())
        .collect()
}

/// Canonical form used for exact comparisons: significant words, sorted, space-joined.
pub fn normalize_query(text: &str) -> String {
    significant_words(text)
        .into_iter()
        .collect::<Vec<_>>()
        .join(" ")
}

/// |A ∩ B| / |A ∪ B|. Zero when both sets are empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Jaccard over the significant words of two texts.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    jaccard(&significant_words(a), &significant_words(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_words_and_punctuation_are_ignored() {
        let words = significant_words("How do I fix the React: useEffect loop?");
        assert_eq!(
            words.into_iter().collect::<Vec<_>>(),
            vec!["loop", "react", "useeffect"]
        );
    }

    #[test]
    fn identical_queries_score_one() {
        assert!((text_similarity("react hooks rules", "Rules: React hooks!") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_queries_score_zero() {
        assert_eq!(text_similarity("postgres indexing", "tailwind theming"), 0.0);
        assert_eq!(text_similarity("a b c", "x y z"), 0.0);
    }

    #[test]
    fn partial_overlap() {
        // {react, hooks, rules} vs {react, hooks, testing}: 2 / 4
        let sim = text_similarity("react hooks rules", "react hooks testing");
        assert!((sim - 0.5).abs() < 1e-9);
    }

    #[test]
    fn normalized_query_is_order_independent() {
        assert_eq!(
            normalize_query("Fix React hooks"),
            normalize_query("hooks react fix")
        );
    }
}
