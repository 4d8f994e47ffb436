use super::*;

fn raw_with_secret() -> RawSettings {
    let mut raw = RawSettings::default();
    raw.auth.secret_key = Some("test-secret".to_string());
    raw
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = raw_with_secret();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::from_raw(raw_with_secret()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:8000");
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.database.url, None);
    assert_eq!(settings.database.max_connections.get(), 10);
    assert_eq!(settings.redis.backend, StoreBackend::Redis);
    assert_eq!(settings.redis.cache_url, DEFAULT_REDIS_URL);
    assert_eq!(settings.cache.client_max_age_seconds, 60);
    assert!(settings.cache.enabled);
    assert_eq!(settings.rate_limit.default_limit.get(), 10);
    assert_eq!(settings.rate_limit.default_period, Duration::from_secs(3600));
    assert_eq!(settings.jobs.concurrency.get(), 2);
    assert_eq!(settings.jobs.sample_task_delay, Duration::from_secs(5));
    assert_eq!(settings.auth.access_token_ttl, Duration::from_secs(30 * 60));
    assert_eq!(
        settings.auth.refresh_token_ttl,
        Duration::from_secs(7 * 24 * 60 * 60)
    );
    assert_eq!(settings.auth.bcrypt_cost, 12);
    assert_eq!(settings.app.name, "coinpost");
    assert_eq!(settings.app.version, env!("CARGO_PKG_VERSION"));
}

#[test]
fn missing_secret_key_is_rejected() {
    let err = Settings::from_raw(RawSettings::default()).expect_err("secret required");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "auth.secret_key",
            ..
        }
    ));
}

#[test]
fn unsupported_algorithm_is_rejected() {
    let mut raw = raw_with_secret();
    raw.auth.algorithm = Some("RS256".to_string());
    let err = Settings::from_raw(raw).expect_err("algorithm rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "auth.algorithm",
            ..
        }
    ));
}

#[test]
fn memory_backend_is_selectable() {
    let mut raw = raw_with_secret();
    let overrides = ServeOverrides {
        redis_backend: Some("memory".to_string()),
        ..Default::default()
    };
    raw.apply_serve_overrides(&overrides);

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.redis.backend, StoreBackend::Memory);
}

#[test]
fn unknown_backend_is_rejected() {
    let mut raw = raw_with_secret();
    raw.redis.backend = Some("memcached".to_string());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn zero_rate_limit_is_rejected() {
    let mut raw = raw_with_secret();
    raw.rate_limit.default_limit = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero limit");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "rate_limit.default_limit",
            ..
        }
    ));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = raw_with_secret();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn secret_key_is_redacted_in_debug_output() {
    let settings = Settings::from_raw(raw_with_secret()).expect("valid settings");
    let rendered = format!("{:?}", settings.auth);
    assert!(!rendered.contains("test-secret"));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["coinpost"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "coinpost",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--redis-backend",
        "memory",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.redis_backend.as_deref(), Some("memory"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_migrations_run_arguments() {
    let args = CliArgs::parse_from([
        "coinpost",
        "migrations",
        "run",
        "--database-url",
        "postgres://example",
    ]);

    match args.command.expect("migrations command") {
        Command::Migrations(mig) => match mig.command {
            MigrationsCommand::Run(database) => {
                assert_eq!(database.database_url.as_deref(), Some("postgres://example"));
            }
        },
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_bootstrap_superuser_arguments() {
    let args = CliArgs::parse_from([
        "coinpost",
        "bootstrap",
        "superuser",
        "--name",
        "Admin",
        "--username",
        "admin",
        "--email",
        "admin@example.com",
        "--password",
        "supersecret",
        "--tier",
        "free",
    ]);

    match args.command.expect("bootstrap command") {
        Command::Bootstrap(bootstrap) => match bootstrap.command {
            BootstrapCommand::Superuser(user) => {
                assert_eq!(user.username, "admin");
                assert_eq!(user.email, "admin@example.com");
                assert_eq!(user.tier.as_deref(), Some("free"));
            }
            BootstrapCommand::Tier(_) => panic!("wrong bootstrap command"),
        },
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_bootstrap_tier_arguments() {
    let args = CliArgs::parse_from(["coinpost", "bootstrap", "tier", "free"]);

    match args.command.expect("bootstrap command") {
        Command::Bootstrap(bootstrap) => match bootstrap.command {
            BootstrapCommand::Tier(tier) => assert_eq!(tier.name, "free"),
            BootstrapCommand::Superuser(_) => panic!("wrong bootstrap command"),
        },
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn zero_job_concurrency_is_rejected() {
    let mut raw = raw_with_secret();
    raw.jobs.concurrency = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero workers");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "jobs.concurrency",
            ..
        }
    ));
}
