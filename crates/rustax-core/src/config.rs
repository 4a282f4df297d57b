//! Configuration management for RustAx.
//!
//! All configuration is driven by environment variables.

/// Global configuration for RustAx.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RustAxConfig {
    /// Bind address for the server.
    pub listen: String,
    /// API root under which every endpoint base path is resolved.
    pub base_path: String,
    /// Log level.
    pub log_level: String,
    /// Emit logs as JSON lines instead of text.
    pub json_logs: bool,
    /// Largest request body the HTTP service will buffer.
    pub max_body_bytes: usize,
}

impl Default for RustAxConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_owned(),
            base_path: "/".to_owned(),
            log_level: "info".to_owned(),
            json_logs: false,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl RustAxConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("RUSTAX_LISTEN") {
            config.listen = v;
        }
        if let Some(v) = lookup("RUSTAX_BASE_PATH") {
            config.base_path = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("RUSTAX_LOG_FORMAT") {
            match v.trim().to_ascii_lowercase().as_str() {
                "json" => config.json_logs = true,
                "text" => config.json_logs = false,
                _ => tracing::warn!(value = %v, "ignoring unknown RUSTAX_LOG_FORMAT"),
            }
        }
        if let Some(v) = lookup("RUSTAX_MAX_BODY_BYTES") {
            match v.trim().parse() {
                Ok(n) => config.max_body_bytes = n,
                Err(_) => tracing::warn!(value = %v, "ignoring invalid RUSTAX_MAX_BODY_BYTES"),
            }
        }

        config
    }
}
