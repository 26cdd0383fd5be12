use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::transport::{AccessToken, Credentials, GraphqlTransport};
use crate::utils::{
    config::ExplorerConfig,
    error::{AuthError, ExplorerError, ExplorerResult, QueryError},
};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// reqwest-backed transport for the token and GraphQL endpoints
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    token_url: Url,
    graphql_url: Url,
    client_id: String,
}

impl HttpTransport {
    /// Build a transport for the endpoints derived from `config`
    pub fn new(config: &ExplorerConfig) -> ExplorerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ExplorerError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token_url: config.token_url()?,
            graphql_url: config.graphql_url()?,
            client_id: config.client_id.clone(),
        })
    }

    /// Send queries to a different GraphQL endpoint
    pub fn with_graphql_url(mut self, url: Url) -> Self {
        self.graphql_url = url;
        self
    }

    pub fn graphql_url(&self) -> &Url {
        &self.graphql_url
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }
}

#[async_trait]
impl GraphqlTransport for HttpTransport {
    async fn fetch_token(&self, credentials: &Credentials) -> ExplorerResult<AccessToken> {
        let form = [
            ("grant_type", "password"),
            ("client_id", self.client_id.as_str()),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ];

        debug!(url = %self.token_url, username = %credentials.username, "requesting token");
        let response = self
            .client
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AuthError::Rejected { status: status.as_u16() }.into());
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Transport(format!("invalid token response: {}", e)))?;

        body.access_token
            .filter(|token| !token.is_empty())
            .map(AccessToken::new)
            .ok_or_else(|| AuthError::MissingToken.into())
    }

    async fn execute_query(&self, token: Option<&AccessToken>, query: &str) -> ExplorerResult<JsonValue> {
        let mut request = self
            .client
            .post(self.graphql_url.clone())
            .json(&json!({ "query": query }));
        if let Some(token) = token {
            request = request.bearer_auth(token.secret());
        }

        debug!(url = %self.graphql_url, bytes = query.len(), "sending query");
        let response = request
            .send()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        if status != StatusCode::OK {
            return Err(QueryError::Rejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        serde_json::from_str(&body).map_err(|e| QueryError::InvalidJson(e.to_string()).into())
    }
}
