use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the coinpost binary.
#[derive(Debug, Parser)]
#[command(name = "coinpost", version, about = "Coinpost API server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "COINPOST_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP API.
    Serve(Box<ServeArgs>),
    /// Migration utilities.
    #[command(name = "migrations")]
    Migrations(MigrationsArgs),
    /// Seed the first tier or superuser.
    #[command(name = "bootstrap")]
    Bootstrap(BootstrapArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Select the cache and rate limit backend (redis|memory).
    #[arg(long = "redis-backend", value_name = "BACKEND")]
    pub redis_backend: Option<String>,

    /// Override the Redis URL used by the response cache.
    #[arg(long = "redis-cache-url", value_name = "URL")]
    pub redis_cache_url: Option<String>,

    /// Override the Redis URL used by the rate limiter.
    #[arg(long = "redis-rate-limit-url", value_name = "URL")]
    pub redis_rate_limit_url: Option<String>,

    /// Toggle the response cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the client `Cache-Control` max-age.
    #[arg(long = "cache-client-max-age-seconds", value_name = "SECONDS")]
    pub cache_client_max_age_seconds: Option<u64>,

    /// Override the request ceiling used when no tier rule matches.
    #[arg(long = "rate-limit-default-limit", value_name = "COUNT")]
    pub rate_limit_default_limit: Option<u64>,

    /// Override the window used when no tier rule matches.
    #[arg(long = "rate-limit-default-period-seconds", value_name = "SECONDS")]
    pub rate_limit_default_period_seconds: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct MigrationsArgs {
    #[command(subcommand)]
    pub command: MigrationsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum MigrationsCommand {
    /// Apply pending migrations and exit.
    #[command(name = "run")]
    Run(DatabaseOverride),
}

#[derive(Debug, Args, Clone)]
pub struct BootstrapArgs {
    #[command(subcommand)]
    pub command: BootstrapCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum BootstrapCommand {
    /// Create a tier unless it already exists.
    #[command(name = "tier")]
    Tier(BootstrapTierArgs),
    /// Create a superuser unless the username is taken.
    #[command(name = "superuser")]
    Superuser(BootstrapSuperuserArgs),
}

#[derive(Debug, Args, Clone)]
pub struct BootstrapTierArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Tier name.
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[derive(Debug, Args, Clone)]
pub struct BootstrapSuperuserArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    #[arg(long, value_name = "NAME")]
    pub name: String,

    #[arg(long, value_name = "USERNAME")]
    pub username: String,

    #[arg(long, value_name = "EMAIL")]
    pub email: String,

    #[arg(long, env = "COINPOST_SUPERUSER_PASSWORD", value_name = "PASSWORD")]
    pub password: String,

    /// Tier assigned to the superuser, created when missing.
    #[arg(long, value_name = "TIER")]
    pub tier: Option<String>,
}
