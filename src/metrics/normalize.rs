//! URL canonicalization used to match export rows against a target page

use percent_encoding::percent_decode_str;
use url::Url;

/// Canonical matching key for a URL.
///
/// Scheme, a leading `www.`, host case, the query string, the fragment and a
/// single trailing slash are ignored. Path case is preserved, and a path
/// ending in `//` is kept as is. Inputs that do not parse as absolute URLs
/// only lose their query/fragment and trailing slash.
///
/// The result is a fixed point: `normalize_url(&normalize_url(x))` equals
/// `normalize_url(x)`.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    match Url::parse(raw) {
        Ok(parsed) if parsed.host_str().is_some() => {
            let host = parsed.host_str().unwrap_or_default().to_lowercase();
            let host = match host.trim_start_matches("www.") {
                "" => host.as_str(),
                stripped => stripped,
            };
            let path = decode_path(host, parsed.path());
            format!("https://{}{}", host, strip_trailing_slash(&path))
        }
        _ => {
            let cut = raw.find(['?', '#']).unwrap_or(raw.len());
            strip_trailing_slash(&raw[..cut]).to_string()
        }
    }
}

/// Best-effort decode. The decoded path is only used when parsing it again
/// under the same host gives back the same decoded path. Anything else (a
/// decoded `?` or `#`, a leftover `%XX` escape from `%25`, a backslash) keeps
/// the path encoded.
fn decode_path(host: &str, path: &str) -> String {
    let Ok(decoded) = percent_decode_str(path).decode_utf8() else {
        return path.to_string();
    };
    if decodes_to_itself(host, &decoded) {
        decoded.into_owned()
    } else {
        path.to_string()
    }
}

fn decodes_to_itself(host: &str, decoded: &str) -> bool {
    let Ok(reparsed) = Url::parse(&format!("https://{}{}", host, decoded)) else {
        return false;
    };
    if reparsed.query().is_some() || reparsed.fragment().is_some() {
        return false;
    }
    percent_decode_str(reparsed.path())
        .decode_utf8()
        .is_ok_and(|again| again == decoded)
}

/// Drops one trailing `/`. The root path and paths ending in `//` are left
/// alone.
fn strip_trailing_slash(path: &str) -> &str {
    if path == "/" || path.ends_with("//") {
        return path;
    }
    path.strip_suffix('/').unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalent_urls_share_key() {
        let expected = normalize_url("https://example.com/a");
        assert_eq!(expected, "https://example.com/a");

        assert_eq!(normalize_url("https://example.com/a?gclid=123"), expected);
        assert_eq!(normalize_url("https://www.example.com/a/"), expected);
        assert_eq!(normalize_url("http://EXAMPLE.com/a"), expected);
        assert_eq!(normalize_url("https://example.com/a#pricing"), expected);
    }

    #[test]
    fn test_percent_encoded_path_is_decoded() {
        assert_eq!(
            normalize_url("https://example.com/caf%C3%A9/menu"),
            normalize_url("https://example.com/café/menu")
        );
        assert_eq!(
            normalize_url("https://example.com/a%20b"),
            "https://example.com/a b"
        );
    }

    #[test]
    fn test_invalid_percent_encoding_keeps_raw_path() {
        assert_eq!(
            normalize_url("https://example.com/bad%FF"),
            "https://example.com/bad%FF"
        );
    }

    #[test]
    fn test_double_escaped_percent_stays_encoded() {
        assert_eq!(
            normalize_url("https://x.com/a%2541"),
            "https://x.com/a%2541"
        );
        assert_eq!(
            normalize_url("https://x.com/100%25"),
            "https://x.com/100%"
        );
    }

    #[test]
    fn test_decoded_backslash_stays_encoded() {
        assert_eq!(
            normalize_url("https://x.com/a%5Cb"),
            "https://x.com/a%5Cb"
        );
    }

    #[test]
    fn test_double_trailing_slash_is_kept() {
        assert_eq!(normalize_url("https://x.com/a//"), "https://x.com/a//");
        assert_eq!(normalize_url("https://x.com/a/"), "https://x.com/a");
        assert_eq!(normalize_url("/relative//"), "/relative//");
    }

    #[test]
    fn test_path_case_is_preserved() {
        assert_ne!(
            normalize_url("https://example.com/About"),
            normalize_url("https://example.com/about")
        );
    }

    #[test]
    fn test_root_path_keeps_slash() {
        assert_eq!(normalize_url("https://www.example.com"), "https://example.com/");
        assert_eq!(normalize_url("https://example.com/?utm_source=x"), "https://example.com/");
    }

    #[test]
    fn test_relative_input_falls_back() {
        assert_eq!(normalize_url("/pricing/?ref=nav"), "/pricing");
        assert_eq!(normalize_url("landing#top"), "landing");
        assert_eq!(normalize_url("example.com/a/"), "example.com/a");
    }

    #[test]
    fn test_empty_input_yields_empty_key() {
        assert_eq!(normalize_url(""), "");
        assert_eq!(normalize_url("   "), "");
    }

    #[test]
    fn test_normalization_is_a_fixed_point() {
        let inputs = [
            "https://www.Example.com/a/b/?x=1",
            "http://example.com",
            "https://example.com/caf%C3%A9/",
            "https://example.com/a%20b",
            "/relative/path/",
            "https://example.com:8443/port",
            "https://example.com/a%3Fb",
            "https://x.com/a%2541",
            "https://x.com/a//",
            "https://x.com/a%2F/",
            "https://x.com/a%5Cb",
            "https://x.com/a/%2E%2E/b",
            "https://x.com/100%25",
            "/relative//",
            "https://www.www.x.com/a",
        ];

        for input in inputs {
            let key = normalize_url(input);
            assert_eq!(normalize_url(&key), key, "not a fixed point for {input}");
        }
    }
}
