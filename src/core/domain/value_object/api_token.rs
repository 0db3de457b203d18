use crate::core::domain::error::ConfigError;
use std::fmt;

/// A Proxmox API token (token id plus secret).
///
/// The API is stateless per request, so the token is sent on every call
/// as `Authorization: PVEAPIToken=<token_id>=<secret>`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken {
    token_id: String,
    secret: String,
}

impl ApiToken {
    /// Creates a new token without validation.
    pub(crate) fn new_unchecked(token_id: String, secret: String) -> Self {
        Self { token_id, secret }
    }

    /// Returns the token id (`user@realm!name`).
    #[must_use]
    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    /// Formats the token as an `Authorization` header value.
    #[must_use]
    pub fn as_authorization_header(&self) -> String {
        format!("PVEAPIToken={}={}", self.token_id, self.secret)
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiToken")
            .field("token_id", &self.token_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Validates a token id and secret pair.
pub(crate) fn validate_api_token(token_id: &str, secret: &str) -> Result<(), ConfigError> {
    if token_id.trim().is_empty() {
        return Err(ConfigError::field("token_id", "Token id cannot be empty"));
    }
    if secret.trim().is_empty() {
        return Err(ConfigError::field("secret", "Secret cannot be empty"));
    }
    let Some((user, name)) = token_id.split_once('!') else {
        return Err(ConfigError::Format(
            "Token id must have the form 'user@realm!tokenname'".to_string(),
        ));
    };
    if !user.contains('@') || name.is_empty() {
        return Err(ConfigError::Format(
            "Token id must have the form 'user@realm!tokenname'".to_string(),
        ));
    }
    if token_id.contains(char::is_whitespace) || secret.contains(char::is_whitespace) {
        return Err(ConfigError::Format(
            "Token id and secret cannot contain whitespace".to_string(),
        ));
    }
    Ok(())
}
