use serde_json::Value as JsonValue;
use std::time::Instant;
use tracing::{debug, info};

use crate::engine::{
    query_composer::{EntityQuery, QueryComposer, RelationshipQuery, INFORMATION_OBJECTS, RELATIONSHIPS},
    response_flattener::ResponseFlattener,
    validation::{validate_entity_query, validate_relationship_query},
};
use crate::transport::{AccessToken, Credentials, GraphqlTransport};
use crate::utils::{
    error::{ExplorerResult, FlattenError},
    types::FlatTable,
};

/// What to fetch
#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerRequest {
    Entities(EntityQuery),
    Relationships(RelationshipQuery),
}

impl ExplorerRequest {
    /// Response collection holding the items
    pub fn collection(&self) -> &'static str {
        match self {
            ExplorerRequest::Entities(_) => INFORMATION_OBJECTS,
            ExplorerRequest::Relationships(_) => RELATIONSHIPS,
        }
    }
}

/// Everything one submission produced
#[derive(Debug, Clone)]
pub struct ExplorerOutcome {
    pub query: String,
    pub raw: JsonValue,
    pub table: FlatTable,
    /// Set when the response did not have the expected shape
    pub diagnostic: Option<FlattenError>,
}

/// Authenticate, compose, execute and flatten, one step after the other
pub struct Explorer {
    transport: Box<dyn GraphqlTransport>,
    composer: QueryComposer,
    flattener: ResponseFlattener,
}

impl Explorer {
    pub fn new(transport: Box<dyn GraphqlTransport>, composer: QueryComposer) -> Self {
        Self {
            transport,
            composer,
            flattener: ResponseFlattener::new(),
        }
    }

    pub fn with_flattener(mut self, flattener: ResponseFlattener) -> Self {
        self.flattener = flattener;
        self
    }

    /// Validate the request and build its query text
    pub fn compose(&self, request: &ExplorerRequest) -> ExplorerResult<String> {
        let query = match request {
            ExplorerRequest::Entities(query) => {
                validate_entity_query(query)?;
                self.composer.compose_entity_query(query)
            }
            ExplorerRequest::Relationships(query) => {
                validate_relationship_query(query)?;
                self.composer.compose_relationship_query(query)
            }
        };
        Ok(query)
    }

    /// Log in, then run the composed query. A failed login stops before the query.
    pub async fn run(&self, credentials: &Credentials, request: &ExplorerRequest) -> ExplorerResult<ExplorerOutcome> {
        let query = self.compose(request)?;

        info!(username = %credentials.username, "authenticating");
        let token = self.transport.fetch_token(credentials).await?;
        info!("token received");

        self.execute(Some(&token), query, Some(request.collection())).await
    }

    /// Run a prepared query text, e.g. one read from a file
    pub async fn run_query(
        &self,
        token: Option<&AccessToken>,
        query: &str,
        collection: Option<&str>,
    ) -> ExplorerResult<ExplorerOutcome> {
        self.execute(token, query.to_string(), collection).await
    }

    async fn execute(
        &self,
        token: Option<&AccessToken>,
        query: String,
        collection: Option<&str>,
    ) -> ExplorerResult<ExplorerOutcome> {
        let start_time = Instant::now();
        info!("sending GraphQL query");
        debug!(query = %query, "query text");
        let raw = self.transport.execute_query(token, &query).await?;
        info!("response received");

        let flattened = self.flattener.flatten_response(&raw, collection);
        let table = FlatTable::from_rows(flattened.rows).with_execution_time(start_time.elapsed());
        debug!(rows = table.row_count(), columns = table.columns.len(), "table built");

        Ok(ExplorerOutcome {
            query,
            raw,
            table,
            diagnostic: flattened.diagnostic,
        })
    }
}
