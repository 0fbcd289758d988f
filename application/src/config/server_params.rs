//! Server-side parameters shared by both wire bindings.

#[derive(Debug, Clone, PartialEq)]
pub struct ServerParams {
    /// Bearer token callers must present; `None` accepts everyone
    pub auth_token: Option<String>,
    /// Refuse to start without a token
    pub require_auth: bool,
    /// Version reported by health checks
    pub version: String,
}

impl Default for ServerParams {
    fn default() -> Self {
        Self {
            auth_token: None,
            require_auth: false,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerParams {
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = if token.is_empty() { None } else { Some(token) };
        self
    }

    pub fn with_require_auth(mut self, require: bool) -> Self {
        self.require_auth = require;
        self
    }
}
