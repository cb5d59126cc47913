//! Configuration validation.
//!
//! Semantic checks run after serde has handled syntax; all violations are
//! returned at once rather than just the first.

use crate::config::schema::ClientConfig;

/// A single semantic violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate value ranges and cross-field constraints.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field: &'static str, message: String| {
        errors.push(ValidationError { field, message });
    };

    match url::Url::parse(&config.rpc.http_url) {
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
        Ok(u) => fail("rpc.http_url", format!("unsupported scheme '{}'", u.scheme())),
        Err(e) => fail("rpc.http_url", format!("not a valid URL: {e}")),
    }
    match url::Url::parse(&config.rpc.ws_url) {
        Ok(u) if u.scheme() == "ws" || u.scheme() == "wss" => {}
        Ok(u) => fail("rpc.ws_url", format!("unsupported scheme '{}'", u.scheme())),
        Err(e) => fail("rpc.ws_url", format!("not a valid URL: {e}")),
    }
    if config.rpc.request_timeout_secs == 0 {
        fail("rpc.request_timeout_secs", "must be greater than zero".to_string());
    }
    if config.action.poll_interval_ms == 0 {
        fail("action.poll_interval_ms", "must be greater than zero".to_string());
    }
    if config.action.confirm_timeout_secs == 0 {
        fail("action.confirm_timeout_secs", "must be greater than zero".to_string());
    }
    if config.action.provider.is_empty() {
        fail("action.provider", "must not be empty".to_string());
    }
    if config.reconcile.janitor_interval_secs == 0 {
        fail("reconcile.janitor_interval_secs", "must be greater than zero".to_string());
    }
    if config.reconcile.stale_after_secs <= config.reconcile.janitor_interval_secs {
        fail(
            "reconcile.stale_after_secs",
            format!(
                "must exceed janitor_interval_secs ({})",
                config.reconcile.janitor_interval_secs
            ),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_violations() {
        let mut config = ClientConfig::default();
        config.rpc.http_url.clear();
        config.action.poll_interval_ms = 0;
        config.reconcile.stale_after_secs = 5;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "rpc.http_url"));
        assert!(errors.iter().any(|e| e.field == "reconcile.stale_after_secs"));
    }

    #[test]
    fn rejects_http_scheme_on_ws_endpoint() {
        let mut config = ClientConfig::default();
        config.rpc.ws_url = "http://127.0.0.1:8900".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "rpc.ws_url"));
    }
}
