use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;
use crate::utils::error::{AuthError, ExplorerResult};

/// Username and password for the password grant
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Both parts must be present
    pub fn from_parts(username: Option<String>, password: Option<String>) -> ExplorerResult<Self> {
        match (username, password) {
            (Some(username), Some(password)) if !username.is_empty() => Ok(Self { username, password }),
            _ => Err(AuthError::MissingCredentials.into()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Bearer token issued by the token endpoint
#[derive(Clone, PartialEq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(***)")
    }
}

/// Token endpoint plus GraphQL endpoint
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    /// Exchange credentials for an access token (password grant)
    async fn fetch_token(&self, credentials: &Credentials) -> ExplorerResult<AccessToken>;

    /// POST `{"query": ...}` and return the decoded response body
    async fn execute_query(&self, token: Option<&AccessToken>, query: &str) -> ExplorerResult<JsonValue>;
}

#[async_trait]
impl<T: GraphqlTransport + ?Sized> GraphqlTransport for Arc<T> {
    async fn fetch_token(&self, credentials: &Credentials) -> ExplorerResult<AccessToken> {
        (**self).fetch_token(credentials).await
    }

    async fn execute_query(&self, token: Option<&AccessToken>, query: &str) -> ExplorerResult<JsonValue> {
        (**self).execute_query(token, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ExplorerError;

    #[test]
    fn test_secrets_are_not_printed() {
        let credentials = Credentials::new("alice", "hunter2");
        let token = AccessToken::new("eyJ.secret");

        assert!(!format!("{:?}", credentials).contains("hunter2"));
        assert!(!format!("{:?}", token).contains("secret"));
        assert_eq!(token.secret(), "eyJ.secret");
    }

    #[test]
    fn test_credentials_from_parts() {
        assert!(Credentials::from_parts(Some("alice".into()), Some("pw".into())).is_ok());
        assert!(matches!(
            Credentials::from_parts(Some("alice".into()), None),
            Err(ExplorerError::Auth(AuthError::MissingCredentials))
        ));
        assert!(Credentials::from_parts(Some(String::new()), Some("pw".into())).is_err());
    }
}
