//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheConfig;

pub use cli::{
    BootstrapArgs, BootstrapCommand, BootstrapSuperuserArgs, BootstrapTierArgs, CliArgs, Command,
    DatabaseOverride, MigrationsArgs, MigrationsCommand, ServeArgs, ServeOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "coinpost";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";
const DEFAULT_RATE_LIMIT_LIMIT: u64 = 10;
const DEFAULT_RATE_LIMIT_PERIOD_SECS: u64 = 3600;
const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: u64 = 30;
const DEFAULT_REFRESH_TOKEN_EXPIRE_DAYS: u64 = 7;
const DEFAULT_JOBS_CONCURRENCY: u64 = 2;
const DEFAULT_SAMPLE_TASK_DELAY_SECS: u64 = 5;
const DEFAULT_BCRYPT_COST: u32 = 12;
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;
const SUPPORTED_ALGORITHM: &str = "HS256";
const DEFAULT_APP_NAME: &str = "coinpost";
const DEFAULT_APP_DESCRIPTION: &str = "Posts, crypto prices and bookkeeping API";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitSettings,
    pub jobs: JobsSettings,
    pub auth: AuthSettings,
    pub app: AppSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub backend: StoreBackend,
    pub cache_url: String,
    pub rate_limit_url: String,
}

/// Quota applied when the caller's tier has no rule for the requested path.
#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub default_limit: NonZeroU32,
    pub default_period: Duration,
}

/// Background queue workers.
#[derive(Debug, Clone)]
pub struct JobsSettings {
    pub concurrency: NonZeroU32,
    /// How long the sample task works before completing.
    pub sample_task_delay: Duration,
}

#[derive(Clone)]
pub struct AuthSettings {
    pub secret_key: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret_key", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("COINPOST").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrations(args)) => match &args.command {
            MigrationsCommand::Run(database) => raw.apply_database_override(database),
        },
        Some(Command::Bootstrap(args)) => match &args.command {
            BootstrapCommand::Tier(tier) => raw.apply_database_override(&tier.database),
            BootstrapCommand::Superuser(user) => raw.apply_database_override(&user.database),
        },
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    redis: RawRedisSettings,
    cache: RawCacheSettings,
    rate_limit: RawRateLimitSettings,
    jobs: RawJobsSettings,
    auth: RawAuthSettings,
    app: RawAppSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(backend) = overrides.redis_backend.as_ref() {
            self.redis.backend = Some(backend.clone());
        }
        if let Some(url) = overrides.redis_cache_url.as_ref() {
            self.redis.cache_url = Some(url.clone());
        }
        if let Some(url) = overrides.redis_rate_limit_url.as_ref() {
            self.redis.rate_limit_url = Some(url.clone());
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(seconds) = overrides.cache_client_max_age_seconds {
            self.cache.client_max_age_seconds = Some(seconds);
        }
        if let Some(limit) = overrides.rate_limit_default_limit {
            self.rate_limit.default_limit = Some(limit);
        }
        if let Some(period) = overrides.rate_limit_default_period_seconds {
            self.rate_limit.default_period_seconds = Some(period);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            redis,
            cache,
            rate_limit,
            jobs,
            auth,
            app,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            redis: build_redis_settings(redis)?,
            cache: build_cache_settings(cache)?,
            rate_limit: build_rate_limit_settings(rate_limit)?,
            jobs: build_jobs_settings(jobs)?,
            auth: build_auth_settings(auth)?,
            app: build_app_settings(app),
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }
    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);
    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_redis_settings(redis: RawRedisSettings) -> Result<RedisSettings, LoadError> {
    let backend = match redis.backend.as_deref().map(str::trim) {
        None | Some("redis") => StoreBackend::Redis,
        Some("memory") => StoreBackend::Memory,
        Some(other) => {
            return Err(LoadError::invalid(
                "redis.backend",
                format!("expected `redis` or `memory`, got `{other}`"),
            ));
        }
    };

    let cache_url = non_blank(redis.cache_url).unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());
    let rate_limit_url =
        non_blank(redis.rate_limit_url).unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());

    Ok(RedisSettings {
        backend,
        cache_url,
        rate_limit_url,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheConfig, LoadError> {
    let defaults = CacheConfig::default();
    let default_expiration_seconds = cache
        .default_expiration_seconds
        .unwrap_or(defaults.default_expiration_seconds);
    if default_expiration_seconds == 0 {
        return Err(LoadError::invalid(
            "cache.default_expiration_seconds",
            "must be greater than zero",
        ));
    }

    Ok(CacheConfig {
        enabled: cache.enabled.unwrap_or(defaults.enabled),
        client_max_age_seconds: cache
            .client_max_age_seconds
            .unwrap_or(defaults.client_max_age_seconds),
        default_expiration_seconds,
    })
}

fn build_rate_limit_settings(
    rate_limit: RawRateLimitSettings,
) -> Result<RateLimitSettings, LoadError> {
    let default_limit = non_zero_u32(
        rate_limit.default_limit.unwrap_or(DEFAULT_RATE_LIMIT_LIMIT),
        "rate_limit.default_limit",
    )?;
    let period = non_zero_u32(
        rate_limit
            .default_period_seconds
            .unwrap_or(DEFAULT_RATE_LIMIT_PERIOD_SECS),
        "rate_limit.default_period_seconds",
    )?;

    Ok(RateLimitSettings {
        default_limit,
        default_period: Duration::from_secs(period.get().into()),
    })
}

fn build_jobs_settings(jobs: RawJobsSettings) -> Result<JobsSettings, LoadError> {
    let concurrency = non_zero_u32(
        jobs.concurrency.unwrap_or(DEFAULT_JOBS_CONCURRENCY),
        "jobs.concurrency",
    )?;

    Ok(JobsSettings {
        concurrency,
        sample_task_delay: Duration::from_secs(
            jobs.sample_task_delay_seconds
                .unwrap_or(DEFAULT_SAMPLE_TASK_DELAY_SECS),
        ),
    })
}

fn build_auth_settings(auth: RawAuthSettings) -> Result<AuthSettings, LoadError> {
    let secret_key = non_blank(auth.secret_key)
        .ok_or_else(|| LoadError::invalid("auth.secret_key", "must be set and non-empty"))?;

    if let Some(algorithm) = auth.algorithm.as_deref()
        && !algorithm.eq_ignore_ascii_case(SUPPORTED_ALGORITHM)
    {
        return Err(LoadError::invalid(
            "auth.algorithm",
            format!("only {SUPPORTED_ALGORITHM} is supported, got `{algorithm}`"),
        ));
    }

    let access_minutes = non_zero_u32(
        auth.access_token_expire_minutes
            .unwrap_or(DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES),
        "auth.access_token_expire_minutes",
    )?;
    let refresh_days = non_zero_u32(
        auth.refresh_token_expire_days
            .unwrap_or(DEFAULT_REFRESH_TOKEN_EXPIRE_DAYS),
        "auth.refresh_token_expire_days",
    )?;

    let bcrypt_cost = auth.bcrypt_cost.unwrap_or(DEFAULT_BCRYPT_COST);
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
        return Err(LoadError::invalid(
            "auth.bcrypt_cost",
            format!("must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}"),
        ));
    }

    Ok(AuthSettings {
        secret_key,
        access_token_ttl: Duration::from_secs(u64::from(access_minutes.get()) * 60),
        refresh_token_ttl: Duration::from_secs(u64::from(refresh_days.get()) * 24 * 60 * 60),
        bcrypt_cost,
    })
}

fn build_app_settings(app: RawAppSettings) -> AppSettings {
    AppSettings {
        name: non_blank(app.name).unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
        description: non_blank(app.description)
            .unwrap_or_else(|| DEFAULT_APP_DESCRIPTION.to_string()),
        version: non_blank(app.version).unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRedisSettings {
    backend: Option<String>,
    cache_url: Option<String>,
    rate_limit_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    client_max_age_seconds: Option<u64>,
    default_expiration_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRateLimitSettings {
    default_limit: Option<u64>,
    default_period_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawJobsSettings {
    concurrency: Option<u64>,
    sample_task_delay_seconds: Option<u64>,
}

#[derive(Clone, Deserialize, Default)]
#[serde(default)]
struct RawAuthSettings {
    secret_key: Option<String>,
    algorithm: Option<String>,
    access_token_expire_minutes: Option<u64>,
    refresh_token_expire_days: Option<u64>,
    bcrypt_cost: Option<u32>,
}

impl std::fmt::Debug for RawAuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawAuthSettings")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("algorithm", &self.algorithm)
            .field(
                "access_token_expire_minutes",
                &self.access_token_expire_minutes,
            )
            .field("refresh_token_expire_days", &self.refresh_token_expire_days)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAppSettings {
    name: Option<String>,
    description: Option<String>,
    version: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
