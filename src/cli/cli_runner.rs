use clap::Parser;
use std::path::Path;
use tracing_subscriber::prelude::*;
use url::Url;

use crate::cli::{CliArgs, Commands, LoginArgs, OutputArgs, OutputFormat, OutputFormatter};
use crate::engine::{
    split_system_names, EntityQuery, Explorer, ExplorerOutcome, ExplorerRequest, QueryComposer,
    RelationshipQuery,
};
use crate::transport::{AccessToken, Credentials, HttpTransport};
use crate::utils::{
    config::ExplorerConfig,
    error::{ExplorerError, ExplorerResult},
};

/// Install the stderr log subscriber; `RUST_LOG` wins over `verbose`
pub fn setup_logging(verbose: bool) {
    let default_filter = if verbose { "dyndb_explorer=debug" } else { "dyndb_explorer=warn" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

/// Resolve configuration: file or defaults, then environment, then flags
pub fn load_config(config_file: Option<&Path>, base_url: Option<&str>) -> ExplorerResult<ExplorerConfig> {
    let config = match config_file {
        Some(path) => ExplorerConfig::from_file(path)?,
        None => ExplorerConfig::default(),
    }
    .apply_env(|key| std::env::var(key).ok());

    Ok(match base_url {
        Some(base_url) if !base_url.trim().is_empty() => config.with_base_url(base_url),
        _ => config,
    })
}

/// Executes parsed CLI commands against one configuration
pub struct CliRunner {
    config: ExplorerConfig,
    verbose: bool,
}

impl CliRunner {
    pub fn new(config: ExplorerConfig, verbose: bool) -> Self {
        Self { config, verbose }
    }

    fn explorer(&self, graphql_url: Option<Url>) -> ExplorerResult<Explorer> {
        let mut transport = HttpTransport::new(&self.config)?;
        if let Some(url) = graphql_url {
            transport = transport.with_graphql_url(url);
        }
        Ok(Explorer::new(Box::new(transport), QueryComposer::from_config(&self.config)))
    }

    /// Compose, authenticate, query and render a request
    pub async fn execute_request(
        &self,
        request: ExplorerRequest,
        login: LoginArgs,
        output: &OutputArgs,
    ) -> ExplorerResult<String> {
        let explorer = self.explorer(None)?;

        if output.dry_run {
            return explorer.compose(&request);
        }

        let credentials = Credentials::from_parts(login.username, login.password)?;
        if self.verbose {
            eprintln!("{}", OutputFormatter::format_info(&format!("Authenticating at {}", self.config.base_url)));
        }

        let outcome = explorer.run(&credentials, &request).await?;
        self.render(&outcome, &output.format, output.output.as_deref(), output.show_query, output.show_raw)
    }

    /// Run a query file with an optional bearer token
    pub async fn execute_file(
        &self,
        query_file: &Path,
        endpoint: Option<&str>,
        token: Option<String>,
        collection: Option<&str>,
        format: &OutputFormat,
        output: Option<&Path>,
    ) -> ExplorerResult<String> {
        let query = std::fs::read_to_string(query_file)?;
        let endpoint = match endpoint {
            Some(endpoint) => Url::parse(endpoint).map_err(|e| {
                ExplorerError::Configuration(format!("invalid endpoint '{}': {}", endpoint, e))
            })?,
            None => self.config.graphql_url()?,
        };

        if self.verbose {
            eprintln!("{}", OutputFormatter::format_info(&format!("Sending {} to {}", query_file.display(), endpoint)));
        }

        let explorer = self.explorer(Some(endpoint))?;
        let token = token.filter(|t| !t.is_empty()).map(AccessToken::new);
        let outcome = explorer.run_query(token.as_ref(), &query, collection).await?;
        self.render(&outcome, format, output, false, false)
    }

    /// Render an outcome; rows go to `output` when given, the rest to stdout
    fn render(
        &self,
        outcome: &ExplorerOutcome,
        format: &OutputFormat,
        output: Option<&Path>,
        show_query: bool,
        show_raw: bool,
    ) -> ExplorerResult<String> {
        let mut text = String::new();

        if show_query {
            text.push_str(&outcome.query);
            text.push('\n');
        }
        if show_raw {
            let raw = serde_json::to_string_pretty(&outcome.raw)
                .map_err(|e| ExplorerError::Output(e.to_string()))?;
            text.push_str(&raw);
            text.push('\n');
        }
        if let Some(diagnostic) = &outcome.diagnostic {
            eprintln!("{}", OutputFormatter::format_warning(&format!("Could not parse response: {}", diagnostic)));
        }

        let rows = OutputFormatter::format_result(&outcome.table, format)?;
        match output {
            Some(path) => {
                std::fs::write(path, rows)?;
                text.push_str(&OutputFormatter::format_success(&format!(
                    "{} rows written to {}",
                    outcome.table.row_count(),
                    path.display()
                )));
            }
            None => text.push_str(&rows),
        }

        Ok(text)
    }
}

fn entity_request(class_name: &str, attributes: &str, reference_attributes: &str) -> ExplorerRequest {
    ExplorerRequest::Entities(
        EntityQuery::new(class_name)
            .with_attributes(split_system_names(attributes))
            .with_reference_attributes(split_system_names(reference_attributes)),
    )
}

/// Main entry point for CLI execution
pub async fn run_cli() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = CliArgs::parse();
    setup_logging(args.verbose);

    let config = match load_config(args.config.as_deref(), args.base_url.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", OutputFormatter::format_error(&e));
            std::process::exit(1);
        }
    };
    let runner = CliRunner::new(config, args.verbose);

    // Execute the command
    let result = match args.command {
        Commands::Entities { class_name, attributes, reference_attributes, login, output } => {
            let request = entity_request(&class_name, &attributes, &reference_attributes);
            runner.execute_request(request, login, &output).await
        }

        Commands::Relationships {
            from_type,
            from_id,
            to_type,
            to_id,
            attributes,
            from_attributes,
            to_attributes,
            include_from,
            include_to,
            login,
            output,
        } => {
            let request = ExplorerRequest::Relationships(RelationshipQuery {
                from_type,
                from_id,
                to_type,
                to_id,
                attribute_names: split_system_names(&attributes),
                from_attribute_names: split_system_names(&from_attributes),
                to_attribute_names: split_system_names(&to_attributes),
                include_from,
                include_to,
            });
            runner.execute_request(request, login, &output).await
        }

        Commands::Run { query_file, endpoint, token, collection, format, output } => {
            runner
                .execute_file(
                    &query_file,
                    endpoint.as_deref(),
                    token,
                    collection.as_deref(),
                    &format,
                    output.as_deref(),
                )
                .await
        }
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", OutputFormatter::format_error(&e));
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_request_splits_lists() {
        let request = entity_request("Process", "Name, ,Owner", "");

        match request {
            ExplorerRequest::Entities(query) => {
                assert_eq!(query.class_system_name, "Process");
                assert_eq!(query.attribute_names, vec!["Name", "Owner"]);
                assert!(query.reference_attribute_names.is_empty());
            }
            other => panic!("Expected entity request, got {:?}", other),
        }
    }

    #[test]
    fn test_flag_base_url_wins() {
        let config = load_config(None, Some("http://flag.local/")).unwrap();
        assert_eq!(config.base_url, "http://flag.local");
    }

    #[tokio::test]
    async fn test_dry_run_needs_no_credentials() {
        let runner = CliRunner::new(ExplorerConfig::default(), false);
        let output = OutputArgs {
            format: OutputFormat::Table,
            output: None,
            show_query: false,
            show_raw: false,
            dry_run: true,
        };
        let login = LoginArgs { username: None, password: None };

        let text = runner
            .execute_request(entity_request("Process", "Name", ""), login, &output)
            .await
            .unwrap();

        assert!(text.contains("classDefinitionSystemName: { value: \"Process\" }"));
        assert!(text.contains("attributes(systemNames: [\"Name\"])"));
    }

    #[tokio::test]
    async fn test_missing_credentials_is_auth_error() {
        let runner = CliRunner::new(ExplorerConfig::default(), false);
        let output = OutputArgs {
            format: OutputFormat::Table,
            output: None,
            show_query: false,
            show_raw: false,
            dry_run: false,
        };
        let login = LoginArgs { username: None, password: None };

        let result = runner
            .execute_request(entity_request("Process", "Name", ""), login, &output)
            .await;

        assert!(matches!(result, Err(ExplorerError::Auth(_))));
    }
}
