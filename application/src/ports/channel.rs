//! Channel factory port used by the connection pool
//!
//! A channel is a cheap, cloneable handle to one remote endpoint (a lazily
//! connecting gRPC channel, or a reusable HTTP client). Clones
//! are shared by concurrent calls; the pool owns their lifetime.

use super::transport::TransportError;

/// Parsed `(host, port, secure)` identity of a remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelTarget {
    pub host: String,
    pub port: u16,
    pub secure: bool,
}

impl ChannelTarget {
    /// Parse `[scheme://]host[:port][/path]`.
    ///
    /// An `https://` scheme forces `secure`. Without an explicit port the
    /// default is 443 when secure, 80 otherwise.
    pub fn parse(endpoint: &str, secure: bool) -> Result<Self, TransportError> {
        let trimmed = endpoint.trim();
        let (scheme, rest) = match trimmed.split_once("://") {
            Some((scheme, rest)) => (Some(scheme.to_ascii_lowercase()), rest),
            None => (None, trimmed),
        };
        let secure = secure || scheme.as_deref() == Some("https");
        let authority = rest.split('/').next().unwrap_or_default();
        if authority.is_empty() {
            return Err(TransportError::invalid_endpoint(endpoint, "missing host"));
        }

        let (host, port) = if let Some(v6) = authority.strip_prefix('[') {
            match v6.split_once(']') {
                Some((host, tail)) => (host, tail.strip_prefix(':')),
                None => return Err(TransportError::invalid_endpoint(endpoint, "unclosed '['")),
            }
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            }
        };
        if host.is_empty() {
            return Err(TransportError::invalid_endpoint(endpoint, "missing host"));
        }

        let port = match port {
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| TransportError::invalid_endpoint(endpoint, "invalid port"))?,
            None if secure => 443,
            None => 80,
        };

        Ok(Self {
            host: host.to_string(),
            port,
            secure,
        })
    }

    /// `http(s)://host:port`
    pub fn uri(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        if self.host.contains(':') {
            format!("{}://[{}]:{}", scheme, self.host, self.port)
        } else {
            format!("{}://{}:{}", scheme, self.host, self.port)
        }
    }
}

impl std::fmt::Display for ChannelTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri())
    }
}

/// Creates and closes transport channels for the pool.
pub trait ChannelFactory: Send + Sync {
    type Channel: Clone + Send + Sync + 'static;

    /// Create a channel. Must not block on network I/O.
    fn connect(&self, target: &ChannelTarget) -> Result<Self::Channel, TransportError>;

    /// Release resources held by a pooled channel.
    fn close(&self, _channel: &Self::Channel) {}
}
