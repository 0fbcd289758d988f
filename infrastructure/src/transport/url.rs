//! Server URL normalization for the client bindings

const TUNNEL_DOMAIN: &str = "trycloudflare.com";

/// Base URL for the HTTP binding.
///
/// Bare hosts get `https://` when they look like a public tunnel (a
/// `trycloudflare.com` domain, no port, or port 443) and `http://`
/// otherwise. A trailing `:443` and trailing slashes are dropped.
pub fn normalize_http_url(raw: &str) -> String {
    let raw = raw.trim();
    let mut url = if has_scheme(raw) {
        raw.to_string()
    } else if looks_public(raw) {
        format!("https://{}", raw)
    } else {
        format!("http://{}", raw)
    };
    while url.ends_with('/') {
        url.pop();
    }
    if let Some(stripped) = url.strip_suffix(":443") {
        url = stripped.to_string();
    }
    url
}

/// `(endpoint, secure)` for the gRPC binding.
///
/// The endpoint keeps `host:port` form; TLS is used for the same
/// public-tunnel shapes the HTTP binding upgrades to `https://`.
pub fn grpc_endpoint(raw: &str) -> (String, bool) {
    let raw = raw.trim().trim_end_matches('/');
    if let Some(rest) = raw.strip_prefix("https://") {
        return (rest.to_string(), true);
    }
    if let Some(rest) = raw.strip_prefix("http://") {
        return (rest.to_string(), false);
    }
    (raw.to_string(), looks_public(raw))
}

fn has_scheme(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}

fn looks_public(raw: &str) -> bool {
    raw.contains(TUNNEL_DOMAIN) || !raw.contains(':') || raw.ends_with(":443")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tunnel_domain_gets_https() {
        assert_eq!(
            normalize_http_url("abc.trycloudflare.com"),
            "https://abc.trycloudflare.com"
        );
        assert_eq!(
            normalize_http_url("abc.trycloudflare.com:443/"),
            "https://abc.trycloudflare.com"
        );
    }

    #[test]
    fn test_host_port_gets_http() {
        assert_eq!(normalize_http_url("10.0.0.5:50051"), "http://10.0.0.5:50051");
        assert_eq!(normalize_http_url("worker:443"), "https://worker");
    }

    #[test]
    fn test_explicit_scheme_kept() {
        assert_eq!(
            normalize_http_url("http://localhost:8000/"),
            "http://localhost:8000"
        );
        assert_eq!(normalize_http_url("https://example.com:443"), "https://example.com");
    }

    #[test]
    fn test_grpc_endpoint_security() {
        assert_eq!(grpc_endpoint("127.0.0.1:50051"), ("127.0.0.1:50051".to_string(), false));
        assert_eq!(
            grpc_endpoint("abc.trycloudflare.com"),
            ("abc.trycloudflare.com".to_string(), true)
        );
        assert_eq!(grpc_endpoint("https://host:8443"), ("host:8443".to_string(), true));
    }
}
