use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use sqlite_mcp_core::{CreateTableParams, DEFAULT_DATABASE, ToResponse};
use sqlite_mcp_db::ServerConfig;
use sqlite_mcp_server::McpServer;
use sqlite_mcp_sqlite::Gateway;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Log target prefix shared by every crate in the workspace.
const LOG_TARGET: &str = "sqlite_mcp";

#[derive(Debug, Parser)]
#[command(name = "sqlite-mcp", version)]
#[command(about = "SQLite database server for the Model Context Protocol")]
struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the managed databases (overrides the config file).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Maximum rows returned by a SELECT (overrides the config file).
    #[arg(long, global = true)]
    max_results: Option<usize>,
    /// Log level for stderr output (e.g. debug, info, warn). Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve MCP requests on stdin/stdout (default).
    Serve,
    /// Execute a single SQL statement and print the JSON response.
    Exec(ExecArgs),
    /// Print the schema of a database.
    Schema(SchemaArgs),
    /// List the databases in the data directory.
    List,
    /// Back up a database.
    Backup(BackupArgs),
    /// Run VACUUM and ANALYZE on a database.
    Optimize(OptimizeArgs),
    /// Create a table from column definitions.
    CreateTable(CreateTableArgs),
    /// Write the effective configuration to a YAML file.
    InitConfig(InitConfigArgs),
}

#[derive(Debug, Args)]
struct ExecArgs {
    /// SQL statement to execute.
    query: String,
    /// Positional bind value as JSON; plain text is bound as a string. Repeatable.
    #[arg(long = "param")]
    params: Vec<String>,
    /// Database file name.
    #[arg(long, default_value = DEFAULT_DATABASE)]
    database: String,
}

#[derive(Debug, Args)]
struct SchemaArgs {
    /// Database file name.
    #[arg(long, default_value = DEFAULT_DATABASE)]
    database: String,
    /// Restrict output to one table.
    #[arg(long)]
    table: Option<String>,
}

#[derive(Debug, Args)]
struct BackupArgs {
    /// Source database file name.
    source: String,
    /// Destination file name inside the data directory.
    #[arg(long)]
    dest: Option<String>,
}

#[derive(Debug, Args)]
struct OptimizeArgs {
    /// Database file name.
    database: String,
}

#[derive(Debug, Args)]
struct CreateTableArgs {
    /// Name of the table to create.
    table: String,
    /// Column definition as NAME=TYPE, in declaration order. Repeatable.
    #[arg(long = "column", required = true)]
    columns: Vec<String>,
    /// Column to mark as PRIMARY KEY.
    #[arg(long)]
    primary_key: Option<String>,
    /// Database file name.
    #[arg(long, default_value = DEFAULT_DATABASE)]
    database: String,
}

#[derive(Debug, Args)]
struct InitConfigArgs {
    /// Output YAML path.
    output: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let result = load_config(&cli).and_then(|config| run(cli.command, config));

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Installs the stderr subscriber. stdout carries protocol traffic only.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(format!("{LOG_TARGET}={level}")),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{LOG_TARGET}=info"))),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<ServerConfig, String> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(max_results) = cli.max_results {
        config.max_results = max_results;
    }
    Ok(config)
}

fn run(command: Option<Command>, config: ServerConfig) -> Result<(), String> {
    match command.unwrap_or(Command::Serve) {
        Command::InitConfig(args) => run_init_config(&args, &config),
        Command::Serve => run_serve(open_gateway(config)?),
        Command::Exec(args) => {
            let gateway = open_gateway(config)?;
            let binds: Vec<Value> = args.params.iter().map(|raw| parse_bind(raw)).collect();
            print_response(
                gateway
                    .execute(&args.database, &args.query, &binds)
                    .to_response(),
            )
        }
        Command::Schema(args) => {
            let gateway = open_gateway(config)?;
            print_response(
                gateway
                    .get_schema(&args.database, args.table.as_deref())
                    .to_response(),
            )
        }
        Command::List => print_response(open_gateway(config)?.list_databases().to_response()),
        Command::Backup(args) => {
            let gateway = open_gateway(config)?;
            print_response(
                gateway
                    .backup(&args.source, args.dest.as_deref())
                    .to_response(),
            )
        }
        Command::Optimize(args) => {
            print_response(open_gateway(config)?.optimize(&args.database).to_response())
        }
        Command::CreateTable(args) => {
            let params = CreateTableParams {
                database: args.database,
                table_name: args.table,
                columns: parse_columns(&args.columns)?,
                primary_key: args.primary_key,
            };
            print_response(open_gateway(config)?.create_table(&params).to_response())
        }
    }
}

/// Creates the data directory if needed and builds the gateway.
fn open_gateway(config: ServerConfig) -> Result<Gateway, String> {
    let data_dir = config.data_dir.clone();
    Gateway::new(config).map_err(|err| {
        format!(
            "Failed to open data directory '{}': {err}",
            data_dir.display()
        )
    })
}

fn run_serve(gateway: Gateway) -> Result<(), String> {
    info!(version = env!("CARGO_PKG_VERSION"), "Starting SQLite MCP server on stdio");
    let server = McpServer::with_gateway(gateway);
    server
        .run(io::stdin().lock(), io::stdout().lock())
        .map_err(|err| format!("Server stopped: {err}"))
}

fn run_init_config(args: &InitConfigArgs, config: &ServerConfig) -> Result<(), String> {
    config
        .save(&args.output)
        .map_err(|err| format!("Failed to write '{}': {err}", args.output.display()))?;
    println!("Wrote configuration to '{}'.", args.output.display());
    Ok(())
}

/// Prints a tool response; a failed response becomes the exit status.
fn print_response(response: Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(&response)
        .map_err(|err| format!("Failed to serialize response: {err}"))?;
    println!("{raw}");
    if response.get("success").and_then(Value::as_bool) == Some(true) {
        Ok(())
    } else {
        Err("operation failed".to_string())
    }
}

/// Parses `--param` as JSON, falling back to a plain string.
fn parse_bind(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_columns(raw: &[String]) -> Result<Map<String, Value>, String> {
    let mut columns = Map::new();
    for definition in raw {
        let (name, declared_type) = definition
            .split_once('=')
            .map(|(name, ty)| (name.trim(), ty.trim()))
            .filter(|(name, ty)| !name.is_empty() && !ty.is_empty())
            .ok_or_else(|| format!("Invalid column '{definition}': expected NAME=TYPE"))?;
        columns.insert(name.to_string(), Value::String(declared_type.to_string()));
    }
    Ok(columns)
}
