use chrono::Duration;
use url::Url;

/// Query parameters that never change page content.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_cid", "mc_eid", "ref", "ref_src"];

const DOCS_HOSTS: &[&str] = &[
    "docs.rs",
    "doc.rust-lang.org",
    "developer.mozilla.org",
    "docs.python.org",
    "pkg.go.dev",
    "learn.microsoft.com",
    "readthedocs.io",
    "readthedocs.org",
];

const QA_HOSTS: &[&str] = &[
    "stackoverflow.com",
    "stackexchange.com",
    "superuser.com",
    "serverfault.com",
    "reddit.com",
    "users.rust-lang.org",
    "discourse.org",
];

const CODE_HOSTS: &[&str] = &["github.com", "gitlab.com", "githubusercontent.com"];

const NEWS_HOSTS: &[&str] = &[
    "news.ycombinator.com",
    "medium.com",
    "dev.to",
    "substack.com",
    "hashnode.dev",
];

/// Canonical cache key: lowercase host, no fragment, no `utm_*` or tracking
/// params, sorted query, no trailing slash. Unparseable input is returned trimmed.
pub fn normalize_url(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw.trim()) else {
        return raw.trim().to_string();
    };
    parsed.set_fragment(None);

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| {
            let k = k.to_ascii_lowercase();
            !k.starts_with("utm_") && !TRACKING_PARAMS.contains(&k.as_str())
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();
    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(pairs);
    }

    // `Url` already lowercases the host and drops default ports.
    let mut out = parsed.to_string();
    if parsed.query().is_none() && out.ends_with('/') {
        out.pop();
    } else if let Some(idx) = out.find("/?") {
        out.remove(idx);
    }
    out
}

/// Lowercased host of a URL without a leading `www.`.
pub fn domain_of(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

fn host_matches(host: &str, list: &[&str]) -> bool {
    list.iter()
        .any(|h| host == *h || host.ends_with(&format!(".{h}")))
}

/// How long a page from `host` stays fresh.
pub fn ttl_for_domain(host: &str) -> Duration {
    let host = host.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if host_matches(host, DOCS_HOSTS) || host.starts_with("docs.") {
        Duration::days(7)
    } else if host_matches(host, QA_HOSTS) || host.starts_with("forum.") {
        Duration::days(3)
    } else if host_matches(host, CODE_HOSTS) {
        Duration::days(1)
    } else if host_matches(host, NEWS_HOSTS) || host.starts_with("blog.") || host.contains("news")
    {
        Duration::hours(12)
    } else {
        Duration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_fragment_tracking_and_trailing_slash() {
        assert_eq!(
            normalize_url("https://Docs.RS/tokio/?utm_source=x&b=2&a=1#section"),
            "https://docs.rs/tokio?a=1&b=2"
        );
        assert_eq!(normalize_url("https://docs.rs/tokio/"), "https://docs.rs/tokio");
        assert_eq!(normalize_url("https://docs.rs/"), "https://docs.rs");
    }

    #[test]
    fn normalize_equates_variants() {
        let a = normalize_url("https://github.com/tokio-rs/axum?utm_medium=social");
        let b = normalize_url("https://GITHUB.com/tokio-rs/axum/#readme");
        assert_eq!(a, b);
    }

    #[test]
    fn unparseable_url_passes_through() {
        assert_eq!(normalize_url("  not a url "), "not a url");
    }

    #[test]
    fn ttl_by_host_class() {
        assert_eq!(ttl_for_domain("docs.rs"), Duration::days(7));
        assert_eq!(ttl_for_domain("docs.djangoproject.com"), Duration::days(7));
        assert_eq!(ttl_for_domain("stackoverflow.com"), Duration::days(3));
        assert_eq!(ttl_for_domain("unix.stackexchange.com"), Duration::days(3));
        assert_eq!(ttl_for_domain("github.com"), Duration::days(1));
        assert_eq!(ttl_for_domain("blog.rust-lang.org"), Duration::hours(12));
        assert_eq!(ttl_for_domain("example.com"), Duration::days(1));
    }

    #[test]
    fn domain_strips_www() {
        assert_eq!(domain_of("https://www.Example.com/a").as_deref(), Some("example.com"));
        assert_eq!(domain_of("nope"), None);
    }
}
