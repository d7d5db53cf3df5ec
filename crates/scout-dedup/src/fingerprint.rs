//! Exact-hash check on the recent conversation window. Analysis is skipped
//! when nothing changed since the last analyzed window.

use dashmap::DashMap;

use scout_session::ConversationEntry;

/// blake3 over the rendered entries, in order.
pub fn window_fingerprint(entries: &[&ConversationEntry]) -> String {
    let mut hasher = blake3::Hasher::new();
    for entry in entries {
        hasher.update(entry.render().as_bytes());
        hasher.update(&[0x1e]);
    }
    hasher.finalize().to_hex().to_string()
}

/// Last analyzed fingerprint per session.
#[derive(Default)]
pub struct WindowFingerprints {
    last: DashMap<String, String>,
}

impl WindowFingerprints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_already_analyzed(&self, session_id: &str, fingerprint: &str) -> bool {
        self.last
            .get(session_id)
            .is_some_and(|fp| fp.value() == fingerprint)
    }

    pub fn record(&self, session_id: &str, fingerprint: String) {
        self.last.insert(session_id.to_string(), fingerprint);
    }

    pub fn forget(&self, session_id: &str) {
        self.last.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_window_same_fingerprint() {
        let a = ConversationEntry::user_prompt("fix the build");
        let b = ConversationEntry::user_prompt("and the tests");
        assert_eq!(window_fingerprint(&[&a, &b]), window_fingerprint(&[&a, &b]));
        assert_ne!(window_fingerprint(&[&a, &b]), window_fingerprint(&[&b, &a]));
    }

    #[test]
    fn records_per_session() {
        let fps = WindowFingerprints::new();
        fps.record("s1", "abc".into());
        assert!(fps.is_already_analyzed("s1", "abc"));
        assert!(!fps.is_already_analyzed("s2", "abc"));
        fps.forget("s1");
        assert!(!fps.is_already_analyzed("s1", "abc"));
    }
}
