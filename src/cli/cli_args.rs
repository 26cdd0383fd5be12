use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_CLASS: &str = "Geschäftsprozess";
pub const DEFAULT_ATTRIBUTES: &str = "BCM_RTO_min, Bezeichnung, Beschreibung";

/// dyndb - explore a dynamicdb GraphQL backend as flat tables
#[derive(Parser, Debug)]
#[command(name = "dyndb")]
#[command(about = "Query a dynamicdb GraphQL backend and flatten information objects into tables")]
#[command(version = "0.1.0")]
pub struct CliArgs {
    /// Backend root URL; endpoint paths are appended to it
    #[arg(long, global = true, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch information objects of one class
    Entities {
        /// classDefinitionSystemName to filter on
        #[arg(long = "class", default_value = DEFAULT_CLASS)]
        class_name: String,

        /// Attribute system-names, comma separated; empty fetches all
        #[arg(short, long, default_value = DEFAULT_ATTRIBUTES)]
        attributes: String,

        /// Extra attributes to fetch on referenced objects, comma separated
        #[arg(long, default_value = "")]
        reference_attributes: String,

        #[command(flatten)]
        login: LoginArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Fetch relationships between information objects
    Relationships {
        /// Class of the relationship source
        #[arg(long)]
        from_type: Option<String>,

        /// Id of the relationship source
        #[arg(long)]
        from_id: Option<String>,

        /// Class of the relationship target
        #[arg(long)]
        to_type: Option<String>,

        /// Id of the relationship target
        #[arg(long)]
        to_id: Option<String>,

        /// Relationship attribute system-names, comma separated
        #[arg(short, long, default_value = "")]
        attributes: String,

        /// Attributes of the expanded source, comma separated
        #[arg(long, default_value = "")]
        from_attributes: String,

        /// Attributes of the expanded target, comma separated
        #[arg(long, default_value = "")]
        to_attributes: String,

        /// Expand the source object inline
        #[arg(long)]
        include_from: bool,

        /// Expand the target object inline
        #[arg(long)]
        include_to: bool,

        #[command(flatten)]
        login: LoginArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Execute a GraphQL query file and write the flattened rows
    Run {
        /// File containing the GraphQL query
        #[arg(value_name = "QUERY_FILE")]
        query_file: PathBuf,

        /// GraphQL endpoint URL; defaults to the configured backend
        #[arg(long)]
        endpoint: Option<String>,

        /// Bearer token sent with the query
        #[arg(long, env = "GRAPHQL_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Response collection to flatten; detected when omitted
        #[arg(long)]
        collection: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "csv")]
        format: OutputFormat,

        /// Write the rows to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Credentials for the token endpoint
#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    /// Login name
    #[arg(short, long, env = "DYNDB_USERNAME")]
    pub username: Option<String>,

    /// Password
    #[arg(short, long, env = "DYNDB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// How results are shown
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,

    /// Write the rows to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the composed GraphQL query
    #[arg(long)]
    pub show_query: bool,

    /// Print the raw JSON response
    #[arg(long)]
    pub show_raw: bool,

    /// Print the composed query and stop
    #[arg(long)]
    pub dry_run: bool,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output
    Table,
    /// JSON output
    Json,
    /// CSV output
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entities_defaults() {
        let args = CliArgs::try_parse_from(["dyndb", "entities"]).unwrap();

        match args.command {
            Commands::Entities { class_name, attributes, output, .. } => {
                assert_eq!(class_name, DEFAULT_CLASS);
                assert_eq!(attributes, DEFAULT_ATTRIBUTES);
                assert_eq!(output.format, OutputFormat::Table);
                assert!(!output.dry_run);
            }
            other => panic!("Expected entities command, got {:?}", other),
        }
    }

    #[test]
    fn test_relationship_flags() {
        let args = CliArgs::try_parse_from([
            "dyndb", "relationships", "--from-id", "1", "--include-to", "--format", "csv",
        ])
        .unwrap();

        match args.command {
            Commands::Relationships { from_id, include_from, include_to, output, .. } => {
                assert_eq!(from_id.as_deref(), Some("1"));
                assert!(!include_from);
                assert!(include_to);
                assert_eq!(output.format, OutputFormat::Csv);
            }
            other => panic!("Expected relationships command, got {:?}", other),
        }
    }

    #[test]
    fn test_run_defaults_to_csv() {
        let args = CliArgs::try_parse_from(["dyndb", "run", "query.graphql", "-o", "out.csv"]).unwrap();

        match args.command {
            Commands::Run { query_file, format, output, .. } => {
                assert_eq!(query_file, PathBuf::from("query.graphql"));
                assert_eq!(format, OutputFormat::Csv);
                assert_eq!(output, Some(PathBuf::from("out.csv")));
            }
            other => panic!("Expected run command, got {:?}", other),
        }
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }
}
