use clap::{Args, Parser, Subcommand};
use objquery::cli::{self as prog_cli, Command, QuerySpec};
use objquery::config::{ClientConfig, PartialConfig};
use objquery::{App, logger};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "objquery", version, about = "Query and scan collections of a remote object store", long_about = None)]
struct Cli {
    /// Path to a config file (TOML)
    #[arg(long, help = "Path to a config file (TOML). Defaults to ./objquery.toml or ~/.config/objquery.toml.")]
    config: Option<PathBuf>,
    #[arg(long, help = "Server base URL (e.g., https://api.example.com). Overrides config/env.")]
    server: Option<String>,
    #[arg(long)]
    app_id: Option<String>,
    #[arg(long)]
    app_key: Option<String>,
    #[arg(long)]
    master_key: Option<String>,
    #[arg(long, help = "error|warn|info|debug|trace; logs go to stderr")]
    log_level: Option<String>,
    #[arg(long, help = "Also log raw requests/responses")]
    wire_trace: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct QueryArgs {
    #[arg(long, help = "Collection (class) name")]
    class: String,
    #[arg(long = "where", help = "Where condition as JSON: an object, or an array of objects for OR")]
    where_json: Option<String>,
    #[arg(long, help = "Sort key: field, -field, field:asc or field:desc (repeatable)")]
    order: Vec<String>,
    #[arg(long, value_delimiter = ',', help = "Comma-separated fields to return")]
    select: Vec<String>,
    #[arg(long, value_delimiter = ',', help = "Comma-separated pointer fields to include")]
    include: Vec<String>,
    #[arg(long, allow_negative_numbers = true)]
    skip: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    limit: Option<i64>,
    #[arg(long)]
    return_acl: bool,
}

impl From<QueryArgs> for QuerySpec {
    fn from(a: QueryArgs) -> Self {
        QuerySpec {
            class: a.class,
            where_json: a.where_json,
            order: a.order,
            select: a.select,
            include: a.include,
            skip: a.skip,
            limit: a.limit,
            return_acl: a.return_acl,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Fetch one page of matching records as NDJSON")]
    Find {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, help = "Use master credentials")]
        master: bool,
    },
    #[command(about = "Fetch the first matching record")]
    First {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long)]
        master: bool,
    },
    #[command(about = "Count matching records")]
    Count {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long)]
        master: bool,
    },
    #[command(about = "Walk every matching record with the scan cursor (master key required)")]
    Scan {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, help = "Stop after this many pages")]
        max_pages: Option<usize>,
    },
}

impl From<Commands> for Command {
    fn from(c: Commands) -> Self {
        match c {
            Commands::Find { query, master } => Command::Find { spec: query.into(), master },
            Commands::First { query, master } => Command::First { spec: query.into(), master },
            Commands::Count { query, master } => Command::Count { spec: query.into(), master },
            Commands::Scan { query, max_pages } => Command::Scan { spec: query.into(), max_pages },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let logging = if cli.log_level.is_some() || cli.wire_trace {
        logger::configure_logging(None, cli.log_level.as_deref(), None, cli.wire_trace)
    } else {
        logger::configure_from_env()
    };
    if let Err(e) = logging {
        eprintln!("warning: logging not configured: {e}");
    }

    let explicit = PartialConfig {
        server_url: cli.server,
        app_id: cli.app_id,
        app_key: cli.app_key,
        master_key: cli.master_key,
        ..PartialConfig::default()
    };
    let app = match ClientConfig::load(explicit, cli.config.as_deref()).and_then(App::new) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let mut stdout = std::io::stdout().lock();
    match prog_cli::run(&app, cli.command.into(), &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
