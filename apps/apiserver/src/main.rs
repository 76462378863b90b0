use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use api_ingress::{selfcheck, shutdown::shutdown_signal, ApiIngress, ApiIngressConfig};
use users_info::config::UsersInfoConfig;
use users_info::infra::storage::SqlxUsersRepository;
use users_info::UsersInfo;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MEMORY_DSN: &str = "sqlite::memory:";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if create_dirs {
        if let Some(dir) = p.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create database directory {}", dir.display()))?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// API Server - user accounts service
#[derive(Parser)]
#[command(name = "apiserver")]
#[command(about = "API Server - user accounts service")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("API Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, args),
    }
}

/// Only SQLite is wired in; reject anything else up front.
fn ensure_sqlite_dsn(cfg: &DatabaseConfig) -> Result<()> {
    let raw = cfg.url.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }

    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;
    match url.scheme() {
        "sqlite" => Ok(()),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

async fn connect_db(config: &AppConfig, mock: bool) -> Result<SqlitePool> {
    let db_config = config.database.clone().unwrap_or_else(|| {
        tracing::warn!("No database configuration found, using in-memory SQLite");
        DatabaseConfig {
            url: MEMORY_DSN.to_string(),
            max_conns: None,
            busy_timeout_ms: None,
        }
    });

    let dsn = if mock {
        MEMORY_DSN.to_string()
    } else {
        ensure_sqlite_dsn(&db_config)?;
        absolutize_sqlite_dsn(db_config.url.trim(), Path::new(&config.server.home_dir), true)?
    };
    let in_memory = dsn == MEMORY_DSN;

    let busy_timeout = Duration::from_millis(u64::from(db_config.busy_timeout_ms.unwrap_or(5000)));
    let connect_opts = SqliteConnectOptions::from_str(&dsn)
        .with_context(|| format!("invalid SQLite DSN '{dsn}'"))?
        .create_if_missing(true)
        .busy_timeout(busy_timeout);

    // every in-memory connection is its own database, so keep exactly one
    let max_conns = if in_memory {
        1
    } else {
        db_config.max_conns.unwrap_or(10)
    };

    tracing::info!("Connecting to database: {}", dsn);
    SqlitePoolOptions::new()
        .max_connections(max_conns)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(connect_opts)
        .await
        .with_context(|| format!("cannot connect to database '{dsn}'"))
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    let pool = connect_db(&config, args.mock).await?;
    let repo = SqlxUsersRepository::new(pool);
    repo.migrate().await?;

    let users_cfg: UsersInfoConfig = config.module_config("users_info")?;
    let ingress_cfg: ApiIngressConfig = config.module_config("api_ingress")?;

    let users = UsersInfo::new(&users_cfg, Arc::new(repo));
    let ingress = ApiIngress::new(ingress_cfg);
    let router = ingress.build_router(users.router());

    let addr = ingress.bind_addr(&config.server.host, config.server.port);
    let listener = ingress.bind(&addr).await?;
    let local = listener.local_addr()?;

    let max_ping_count = config.server.max_ping_count;
    tokio::spawn(async move {
        let base_url = format!("http://{local}");
        match selfcheck::ping_until_healthy(&base_url, max_ping_count, Duration::from_secs(1))
            .await
        {
            Ok(()) => tracing::info!("Router deployed, health endpoint is answering"),
            Err(e) => tracing::error!(error = %e, "Router did not answer its health check in time"),
        }
    });

    ApiIngress::serve(listener, router, shutdown_signal()).await
}

fn check_config(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    if !args.mock {
        if let Some(db) = &config.database {
            ensure_sqlite_dsn(db)?;
        }
    }
    config.module_config::<UsersInfoConfig>("users_info")?;
    config.module_config::<ApiIngressConfig>("api_ingress")?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);

    Ok(())
}
