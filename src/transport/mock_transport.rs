use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::engine::query_composer::{INFORMATION_OBJECTS, RELATIONSHIPS};
use crate::transport::{AccessToken, Credentials, GraphqlTransport};
use crate::utils::error::{AuthError, ExplorerResult, QueryError};

/// Token handed out by [`MockTransport`]
pub const MOCK_TOKEN: &str = "mock-access-token";

/// In-memory transport with canned responses that records every call
#[derive(Debug, Default)]
pub struct MockTransport {
    auth_status: Option<u16>,
    query_failure: Option<(u16, String)>,
    responses: Mutex<VecDeque<JsonValue>>,
    token_requests: Mutex<Vec<String>>,
    executed: Mutex<Vec<(Option<String>, String)>>,
}

impl MockTransport {
    /// Accepts any credentials and answers queries with an empty collection,
    /// `relationships` for relationship queries, `informationObjects` otherwise
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response body; queued bodies are returned in order
    pub fn with_response(self, body: JsonValue) -> Self {
        self.push_response(body);
        self
    }

    /// Token endpoint answers with `status`
    pub fn rejecting_auth(mut self, status: u16) -> Self {
        self.auth_status = Some(status);
        self
    }

    /// Query endpoint answers with `status` and `body`
    pub fn rejecting_queries(mut self, status: u16, body: &str) -> Self {
        self.query_failure = Some((status, body.to_string()));
        self
    }

    pub fn push_response(&self, body: JsonValue) {
        lock(&self.responses).push_back(body);
    }

    /// Usernames seen by the token endpoint
    pub fn token_requests(&self) -> Vec<String> {
        lock(&self.token_requests).clone()
    }

    /// Query texts seen by the query endpoint
    pub fn executed_queries(&self) -> Vec<String> {
        lock(&self.executed).iter().map(|(_, q)| q.clone()).collect()
    }

    /// Bearer tokens sent along with each query
    pub fn sent_tokens(&self) -> Vec<Option<String>> {
        lock(&self.executed).iter().map(|(t, _)| t.clone()).collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl GraphqlTransport for MockTransport {
    async fn fetch_token(&self, credentials: &Credentials) -> ExplorerResult<AccessToken> {
        lock(&self.token_requests).push(credentials.username.clone());

        match self.auth_status {
            Some(status) if status != 200 => Err(AuthError::Rejected { status }.into()),
            _ => Ok(AccessToken::new(MOCK_TOKEN)),
        }
    }

    async fn execute_query(&self, token: Option<&AccessToken>, query: &str) -> ExplorerResult<JsonValue> {
        lock(&self.executed).push((token.map(|t| t.secret().to_string()), query.to_string()));

        if let Some((status, body)) = &self.query_failure {
            return Err(QueryError::Rejected {
                status: *status,
                body: body.clone(),
            }
            .into());
        }

        Ok(lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| empty_collection(query)))
    }
}

fn empty_collection(query: &str) -> JsonValue {
    let relationship_query = format!("query {} ", RELATIONSHIPS);
    let collection = if query.trim_start().starts_with(&relationship_query) {
        RELATIONSHIPS
    } else {
        INFORMATION_OBJECTS
    };
    json!({ "data": { collection: { "data": [] } } })
}
