//! Input normalization and fingerprinting.
//!
//! Two pastes of "the same" recipe text must hash identically, so the
//! cache key is always derived from the normalized form produced here.

use sha2::{Digest, Sha256};

/// Normalize pasted recipe text: trim surrounding whitespace, fold
/// `\r\n`/`\r` to `\n`, and collapse runs of 3+ newlines to exactly 2.
/// Idempotent.
pub fn normalize_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(unified.len());
    let mut newline_run = 0usize;
    for ch in unified.chars() {
        if ch == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                out.push('\n');
            }
        } else {
            newline_run = 0;
            out.push(ch);
        }
    }

    out.trim().to_string()
}

/// Normalize a URL for identity purposes: trim whitespace, lowercase the
/// scheme and host, drop the fragment and any trailing slash on the path.
/// Query strings are kept because they often select the recipe variant.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let without_fragment = match trimmed.split_once('#') {
        Some((before, _)) => before,
        None => trimmed,
    };

    let (scheme_host, rest) = match without_fragment.find("://") {
        Some(idx) => {
            let after_scheme = &without_fragment[idx + 3..];
            let host_end = after_scheme
                .find(['/', '?'])
                .unwrap_or(after_scheme.len());
            (
                format!(
                    "{}://{}",
                    without_fragment[..idx].to_ascii_lowercase(),
                    after_scheme[..host_end].to_ascii_lowercase()
                ),
                &after_scheme[host_end..],
            )
        }
        None => (without_fragment.to_ascii_lowercase(), ""),
    };

    let rest = match rest.split_once('?') {
        Some((path, query)) => format!("{}?{}", path.trim_end_matches('/'), query),
        None => rest.trim_end_matches('/').to_string(),
    };

    format!("{}{}", scheme_host, rest)
}

/// Stable cache identity for a URL input.
pub fn fingerprint_url(url: &str) -> String {
    digest("url", &normalize_url(url))
}

/// Stable cache identity for a raw-text input.
pub fn fingerprint_text(text: &str) -> String {
    digest("text", &normalize_text(text))
}

fn digest(domain: &str, normalized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(domain.as_bytes());
    hasher.update(b":");
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_strips_carriage_returns() {
        let out = normalize_text("line one\r\nline two\rline three");
        assert_eq!(out, "line one\nline two\nline three");
        assert!(!out.contains('\r'));
    }

    #[test]
    fn test_normalize_text_collapses_newline_runs() {
        let out = normalize_text("a\n\n\n\n\nb");
        assert_eq!(out, "a\n\nb");
    }

    #[test]
    fn test_normalize_text_trims() {
        assert_eq!(normalize_text("  \n  recipe  \n\n "), "recipe");
    }

    #[test]
    fn test_normalize_text_idempotent() {
        let messy = "  Title\r\n\r\n\r\n\r\nStep 1\r\nStep 2  \n\n\n";
        let once = normalize_text(messy);
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn test_normalize_url_case_and_fragment() {
        assert_eq!(
            normalize_url("HTTPS://Example.COM/Recipes/Pie/#reviews"),
            "https://example.com/Recipes/Pie"
        );
    }

    #[test]
    fn test_normalize_url_keeps_query() {
        assert_eq!(
            normalize_url("https://example.com/r/?id=42"),
            "https://example.com/r?id=42"
        );
    }

    #[test]
    fn test_fingerprint_text_whitespace_invariant() {
        let a = fingerprint_text("Pancakes\r\n\r\n\r\nMix and fry.");
        let b = fingerprint_text("  Pancakes\n\nMix and fry.  ");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_url_stable_and_distinct_from_text() {
        let u = "https://example.com/pie";
        assert_eq!(fingerprint_url(u), fingerprint_url("https://EXAMPLE.com/pie/"));
        assert_ne!(fingerprint_url(u), fingerprint_text(u));
    }
}
