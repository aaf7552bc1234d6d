//! Credentials for the build server.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::ClientError;

/// How the client authenticates. Chosen once when the client is built.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Access token sent as `Authorization: Bearer <token>`.
    Token(String),

    /// Username and password sent as HTTP basic auth.
    Basic { username: String, password: String },
}

impl Credentials {
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Pick credentials from optional command-line style inputs.
    ///
    /// A non-empty token wins; otherwise both username and password are
    /// required.
    pub fn from_options(
        token: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, ClientError> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        if let Some(token) = non_empty(token) {
            return Ok(Self::Token(token));
        }

        match (non_empty(username), non_empty(password)) {
            (Some(username), Some(password)) => Ok(Self::Basic { username, password }),
            (Some(_), None) => Err(ClientError::AuthConfiguration(
                "a password is required with --username".to_string(),
            )),
            _ => Err(ClientError::AuthConfiguration(
                "either an access token or a username and password is required".to_string(),
            )),
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        match self {
            Self::Token(token) => format!("Bearer {token}"),
            Self::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
            }
        }
    }

    /// Short name of the scheme, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Token(_) => "token",
            Self::Basic { .. } => "basic",
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Token(_) => None,
            Self::Basic { username, .. } => Some(username),
        }
    }
}

// Secrets never reach logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_header() {
        let creds = Credentials::token("abc123");
        assert_eq!(creds.authorization_header(), "Bearer abc123");
        assert_eq!(creds.kind(), "token");
    }

    #[test]
    fn test_basic_header() {
        let creds = Credentials::basic("admin", "secret");
        // base64("admin:secret")
        assert_eq!(creds.authorization_header(), "Basic YWRtaW46c2VjcmV0");
        assert_eq!(creds.username(), Some("admin"));
    }

    #[test]
    fn test_token_takes_precedence() {
        let creds = Credentials::from_options(
            Some("tok".to_string()),
            Some("admin".to_string()),
            Some("secret".to_string()),
        )
        .unwrap();
        assert_eq!(creds, Credentials::token("tok"));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = Credentials::from_options(None, None, None).unwrap_err();
        assert!(matches!(err, ClientError::AuthConfiguration(_)));

        let err = Credentials::from_options(Some(" ".to_string()), Some("admin".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, ClientError::AuthConfiguration(_)));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", Credentials::basic("admin", "hunter2"));
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));

        let debug = format!("{:?}", Credentials::token("tok-secret"));
        assert!(!debug.contains("tok-secret"));
    }
}
