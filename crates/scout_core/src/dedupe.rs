use url::Url;

/// Key used to spot the same post reported twice by the search provider.
///
/// Drops the fragment and a trailing slash and lowercases scheme and host.
/// Strings that do not parse as URLs are compared trimmed.
pub fn normalize_url_for_dedupe(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            let mut text = url.to_string();
            if text.ends_with('/') && url.query().is_none() {
                text.pop();
            }
            text
        }
        Err(_) => trimmed.to_string(),
    }
}

/// True when `raw` parses as an http(s) URL whose host contains `needle`.
pub fn host_contains(raw: &str, needle: &str) -> bool {
    Url::parse(raw.trim())
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .and_then(|url| url.host_str().map(|host| host.contains(needle)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_key_ignores_fragment_and_trailing_slash() {
        assert_eq!(
            normalize_url_for_dedupe("HTTPS://Blog.Naver.com/user/1/#top"),
            "https://blog.naver.com/user/1"
        );
        assert_eq!(
            normalize_url_for_dedupe("https://blog.naver.com/user/1"),
            normalize_url_for_dedupe("https://blog.naver.com/user/1/")
        );
    }

    #[test]
    fn host_filter_requires_http_scheme() {
        assert!(host_contains("https://blog.naver.com/a/1", "blog.naver"));
        assert!(!host_contains("https://cafe.naver.com/a/1", "blog.naver"));
        assert!(!host_contains("ftp://blog.naver.com/a", "blog.naver"));
        assert!(!host_contains("not a url", "blog.naver"));
    }
}
