use crate::core::domain::error::ConfigError;
use std::fmt;
use url::Url;

const MAX_URL_LENGTH: usize = 2083; // RFC 7230 practical limit

/// A validated absolute `http`/`https` URL.
///
/// Used for both the hypervisor API host and the shutdown webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointUrl(Url);

impl EndpointUrl {
    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the parsed URL.
    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Base of the Proxmox JSON API, without trailing slash.
    ///
    /// Accepts hosts configured either as `https://pve:8006` or with the
    /// `/api2/json` suffix already present.
    #[must_use]
    pub fn api_base(&self) -> String {
        let base = self.0.as_str().trim_end_matches('/');
        if base.ends_with("/api2/json") {
            base.to_string()
        } else {
            format!("{}/api2/json", base)
        }
    }
}

impl fmt::Display for EndpointUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Parses and validates an endpoint URL for the named configuration field.
pub(crate) fn validate_endpoint_url(field: &str, value: &str) -> Result<EndpointUrl, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::field(field, "URL cannot be empty"));
    }
    if value.len() > MAX_URL_LENGTH {
        return Err(ConfigError::field(
            field,
            format!("URL exceeds maximum length of {} characters", MAX_URL_LENGTH),
        ));
    }

    let url = Url::parse(value)
        .map_err(|e| ConfigError::field(field, format!("Invalid URL format: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::field(
            field,
            format!("Unsupported scheme '{}', expected http or https", url.scheme()),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::field(field, "URL must include a host"));
    }

    Ok(EndpointUrl(url))
}
