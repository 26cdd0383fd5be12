use thiserror::Error;

/// Main error type for the explorer
#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("GraphQL query failed: {0}")]
    Query(#[from] QueryError),

    #[error("Could not parse response: {0}")]
    Flatten(#[from] FlattenError),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Token endpoint errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token endpoint answered with status {status}")]
    Rejected { status: u16 },

    #[error("token endpoint response contains no access_token")]
    MissingToken,

    #[error("no credentials supplied")]
    MissingCredentials,

    #[error("token request failed: {0}")]
    Transport(String),
}

/// Query endpoint errors
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("status {status}:\n{body}")]
    Rejected { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),
}

/// Response shape mismatches found while flattening
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FlattenError {
    #[error("response has no `data` object")]
    MissingData,

    #[error("server reported errors: {0}")]
    GraphqlErrors(String),

    #[error("collection `{0}` not found in response")]
    MissingCollection(String),

    #[error("cannot pick a collection, `data` holds {0} entries")]
    AmbiguousCollection(usize),

    #[error("`{0}` is not a list")]
    NotAList(String),

    #[error("item {index} is not an object")]
    NotAnObject { index: usize },

    #[error("malformed attribute: {0}")]
    MalformedAttribute(String),
}

/// Rejected user input
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: String },

    #[error("{field} contains a quote, backslash or control character: {value:?}")]
    UnsafeValue { field: String, value: String },
}

/// Result type alias for explorer operations
pub type ExplorerResult<T> = Result<T, ExplorerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explorer_error_from_auth_error() {
        let auth_error = AuthError::Rejected { status: 401 };
        let error: ExplorerError = auth_error.into();

        match error {
            ExplorerError::Auth(AuthError::Rejected { status }) => assert_eq!(status, 401),
            _ => panic!("Expected Auth error"),
        }
    }

    #[test]
    fn test_explorer_error_from_query_error() {
        let query_error = QueryError::Rejected {
            status: 400,
            body: "{\"errors\":[]}".to_string(),
        };
        let error: ExplorerError = query_error.into();

        match error {
            ExplorerError::Query(QueryError::Rejected { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("errors"));
            }
            _ => panic!("Expected Query error"),
        }
    }

    #[test]
    fn test_explorer_error_from_validation_error() {
        let validation_error = ValidationError::Empty {
            field: "class".to_string(),
        };
        let error: ExplorerError = validation_error.into();
        assert!(matches!(error, ExplorerError::Validation(_)));
    }

    #[test]
    fn test_error_display() {
        let error: ExplorerError = AuthError::Rejected { status: 401 }.into();
        assert_eq!(
            error.to_string(),
            "Authentication failed: token endpoint answered with status 401"
        );

        let error: ExplorerError = QueryError::Rejected {
            status: 500,
            body: "boom".to_string(),
        }
        .into();
        assert!(error.to_string().contains("boom"));

        let error = ExplorerError::Configuration("Invalid config".to_string());
        assert!(error.to_string().contains("Configuration error: Invalid config"));
    }

    #[test]
    fn test_explorer_result_type() {
        let success: ExplorerResult<String> = Ok("success".to_string());
        let failure: ExplorerResult<String> = Err(ExplorerError::Output("closed".to_string()));

        assert!(success.is_ok());
        match failure {
            Err(ExplorerError::Output(msg)) => assert_eq!(msg, "closed"),
            _ => panic!("Expected Output error"),
        }
    }
}
