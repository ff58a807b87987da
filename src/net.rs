use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Proxy};
use tracing::warn;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/135.0.0.0";

/// Proxy chosen for a wallet by its position, round-robin over the list.
/// Deterministic and stateless, so a wallet keeps its proxy across cycles.
pub fn select_proxy<'a>(index: usize, proxies: &'a [String]) -> Option<&'a str> {
    if proxies.is_empty() {
        return None;
    }
    Some(proxies[index % proxies.len()].as_str())
}

fn parse_proxy(entry: &str) -> Option<Proxy> {
    let supported = entry.starts_with("http://")
        || entry.starts_with("https://")
        || entry.starts_with("socks4://")
        || entry.starts_with("socks5://");
    if !supported {
        return None;
    }
    Proxy::all(entry).ok()
}

/// Build the HTTP client for one wallet. A proxy entry that cannot be parsed
/// degrades to a direct client rather than failing the wallet.
pub fn client_for(index: usize, proxies: &[String]) -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers);

    if let Some(entry) = select_proxy(index, proxies) {
        match parse_proxy(entry) {
            Some(proxy) => builder = builder.proxy(proxy),
            None => warn!(proxy = entry, "unusable proxy entry, using direct connection"),
        }
    }

    builder.build().unwrap_or_else(|e| {
        warn!("failed to build configured client, falling back to default: {e}");
        Client::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_means_direct() {
        assert_eq!(select_proxy(0, &[]), None);
        assert_eq!(select_proxy(7, &[]), None);
    }

    #[test]
    fn selection_wraps_by_position() {
        let proxies = vec![
            "http://a:8080".to_string(),
            "http://b:8080".to_string(),
            "socks5://c:1080".to_string(),
        ];
        assert_eq!(select_proxy(0, &proxies), Some("http://a:8080"));
        assert_eq!(select_proxy(2, &proxies), Some("socks5://c:1080"));
        assert_eq!(select_proxy(3, &proxies), Some("http://a:8080"));
        assert_eq!(select_proxy(7, &proxies), Some("http://b:8080"));
    }

    #[test]
    fn unknown_schemes_are_rejected() {
        assert!(parse_proxy("ftp://host:21").is_none());
        assert!(parse_proxy("host:8080").is_none());
        assert!(parse_proxy("http://127.0.0.1:8080").is_some());
        assert!(parse_proxy("socks5://127.0.0.1:1080").is_some());
    }

    #[test]
    fn building_never_fails() {
        // Garbage entries must still yield a working direct client.
        let proxies = vec!["garbage".to_string()];
        let _client = client_for(0, &proxies);
    }
}
