//! Sentence splitting and TextRank over page text.

use std::collections::HashMap;

/// Damping factor for PageRank iteration.
const DAMPING: f64 = 0.85;
const CONVERGENCE: f64 = 1e-6;
const MAX_ITERATIONS: usize = 100;
/// Sentences shorter than this are navigation debris, not content.
const MIN_SENTENCE_CHARS: usize = 20;
/// Sentences ranked per call; page text can be long.
const MAX_SENTENCES: usize = 200;

/// Split on terminal punctuation followed by whitespace or end of text.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(if c == '\n' { ' ' } else { c });
        let boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().map_or(true, |next| next.is_whitespace());
        if boundary || (c == '\n' && chars.peek() == Some(&'\n')) {
            push_sentence(&mut sentences, &current);
            current.clear();
        }
    }
    push_sentence(&mut sentences, &current);
    sentences
}

fn push_sentence(out: &mut Vec<String>, raw: &str) {
    let trimmed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if trimmed.chars().count() >= MIN_SENTENCE_CHARS {
        out.push(trimmed);
    }
}

/// Sentences of `text` in rank order, best first, at most `limit`.
pub fn top_sentences(text: &str, limit: usize) -> Vec<String> {
    let mut sentences = split_sentences(text);
    sentences.truncate(MAX_SENTENCES);
    if sentences.len() <= 1 {
        return sentences.into_iter().take(limit).collect();
    }
    let scores = rank_sentences(&sentences);
    let mut order: Vec<usize> = (0..sentences.len()).collect();
    order.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]).then(a.cmp(b)));
    order
        .into_iter()
        .take(limit)
        .map(|i| sentences[i].clone())
        .collect()
}

/// Top `n` sentences, re-joined in document order.
pub fn summarize(text: &str, n: usize) -> String {
    let sentences = split_sentences(text);
    if sentences.len() <= n {
        return sentences.join(" ");
    }
    let top = top_sentences(text, n);
    sentences
        .iter()
        .filter(|s| top.contains(s))
        .take(n)
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

/// PageRank over a word-overlap cosine graph.
fn rank_sentences(sentences: &[String]) -> Vec<f64> {
    let n = sentences.len();
    let vectors = word_vectors(sentences);

    let mut sim = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let s = cosine(&vectors[i], &vectors[j]);
            sim[i][j] = s;
            sim[j][i] = s;
        }
    }
    let out_sums: Vec<f64> = sim.iter().map(|row| row.iter().sum()).collect();

    let mut scores = vec![1.0 / n as f64; n];
    for _ in 0..MAX_ITERATIONS {
        let mut next = vec![0.0f64; n];
        let mut max_diff = 0.0f64;
        for i in 0..n {
            let sum: f64 = (0..n)
                .filter(|&j| j != i && out_sums[j] > f64::EPSILON)
                .map(|j| sim[j][i] * scores[j] / out_sums[j])
                .sum();
            next[i] = (1.0 - DAMPING) / n as f64 + DAMPING * sum;
            max_diff = max_diff.max((next[i] - scores[i]).abs());
        }
        scores = next;
        if max_diff < CONVERGENCE {
            break;
        }
    }
    scores
}

fn word_vectors(sentences: &[String]) -> Vec<HashMap<String, f64>> {
    sentences
        .iter()
        .map(|s| {
            let mut v = HashMap::new();
            for word in s.split_whitespace() {
                let w: String = word
                    .chars()
                    .filter(|c| c.is_alphanumeric())
                    .collect::<String>()
                    .to_lowercase();
                if w.len() > 2 {
                    *v.entry(w).or_insert(0.0) += 1.0;
                }
            }
            v
        })
        .collect()
}

fn cosine(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(k, x)| b.get(k).map(|y| x * y))
        .sum();
    let norm = |v: &HashMap<String, f64>| v.values().map(|x| x * x).sum::<f64>().sqrt();
    let denom = norm(a) * norm(b);
    if denom > f64::EPSILON {
        dot / denom
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation() {
        let text = "Tokio is an async runtime for Rust. It provides a multi-threaded scheduler! \
                    Does it support timers? Yes, through tokio::time.";
        let sentences = split_sentences(text);
        assert_eq!(sentences.len(), 4);
        assert_eq!(sentences[0], "Tokio is an async runtime for Rust.");
    }

    #[test]
    fn version_numbers_do_not_split() {
        let text = "Upgrade to version 1.2.3 before enabling the feature flag.";
        let sentences = split_sentences(text);
        assert_eq!(sentences.len(), 1);
    }

    #[test]
    fn summary_keeps_document_order() {
        let text = "React hooks let components hold state. \
                    Hooks must be called in the same order on every render. \
                    The weather today is sunny and warm outside. \
                    Calling hooks conditionally breaks the order of state in components.";
        let summary = summarize(text, 2);
        assert!(!summary.contains("weather"));
        assert_eq!(split_sentences(&summary).len(), 2);
    }

    #[test]
    fn empty_text_has_no_sentences() {
        assert!(top_sentences("", 3).is_empty());
        assert!(summarize("   ", 2).is_empty());
    }
}
