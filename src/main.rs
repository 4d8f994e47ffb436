use std::{net::SocketAddr, process, sync::Arc, time::Duration};

use apalis::{
    layers::WorkerBuilderExt,
    prelude::{Monitor, WorkerBuilder, WorkerFactoryFn},
};
use apalis_sql::{Config as ApalisSqlConfig, postgres::PostgresStorage};
use coinpost::{
    application::{
        auth::{AuthService, TokenPolicy},
        error::AppError,
        jobs::{JobWorkerContext, process_sample_job},
        repos::{RateLimitsRepo, TiersRepo, TokenBlacklistRepo, UsersRepo},
        tiers::{TierService, TierServiceError},
        users::{CreateUserCommand, UserService, UserServiceError},
    },
    config,
    domain::types::JobType,
    infra::{
        backends::init_backends,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use tokio::signal;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrations(args) => run_migrations(settings, args).await,
        config::Command::Bootstrap(args) => run_bootstrap(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let backends = init_backends(&settings.redis).await?;
    let job_monitor = spawn_job_monitor(&repositories, &settings.jobs);
    let state = ApiState::build(repositories, backends, &settings);

    let result = serve_http(&settings, state).await;
    job_monitor.abort();
    result
}

fn spawn_job_monitor(
    repositories: &PostgresRepositories,
    jobs: &config::JobsSettings,
) -> tokio::task::JoinHandle<()> {
    let sample_storage = PostgresStorage::new_with_config(
        repositories.pool().clone(),
        ApalisSqlConfig::new(JobType::SampleTask.as_str()),
    );
    let context = JobWorkerContext {
        sample_task_delay: jobs.sample_task_delay,
    };

    let sample_worker = WorkerBuilder::new("sample-task-worker")
        .concurrency(jobs.concurrency.get() as usize)
        .data(context)
        .backend(sample_storage)
        .build_fn(process_sample_job);

    let monitor = Monitor::new().register(sample_worker);
    info!(
        target = "coinpost::jobs",
        concurrency = jobs.concurrency.get(),
        "job monitor started"
    );

    tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(target = "coinpost::jobs", error = %err, "job monitor stopped");
        }
    })
}

async fn run_migrations(
    settings: config::Settings,
    args: config::MigrationsArgs,
) -> Result<(), AppError> {
    match args.command {
        config::MigrationsCommand::Run(_) => {
            init_repositories(&settings).await?;
            info!(target = "coinpost::migrations", "migrations applied");
        }
    }
    Ok(())
}

async fn run_bootstrap(
    settings: config::Settings,
    args: config::BootstrapArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let tiers_repo: Arc<dyn TiersRepo> = repositories.clone();
    let rate_limits_repo: Arc<dyn RateLimitsRepo> = repositories.clone();
    let blacklist_repo: Arc<dyn TokenBlacklistRepo> = repositories;

    let tiers = TierService::new(tiers_repo.clone());

    match args.command {
        config::BootstrapCommand::Tier(tier) => {
            ensure_tier(&tiers, &tier.name).await?;
        }
        config::BootstrapCommand::Superuser(user) => {
            let tier_id = match user.tier.as_deref() {
                Some(name) => Some(ensure_tier(&tiers, name).await?),
                None => None,
            };

            let auth = Arc::new(AuthService::new(
                users_repo.clone(),
                blacklist_repo,
                TokenPolicy::from(&settings.auth),
            ));
            let users = UserService::new(users_repo, tiers_repo, rate_limits_repo, auth);
            let command = CreateUserCommand {
                name: user.name,
                username: user.username,
                email: user.email,
                password: user.password,
            };

            match users.register_superuser(command, tier_id).await {
                Ok(created) => info!(
                    target = "coinpost::bootstrap",
                    user_id = created.id,
                    username = %created.username,
                    "superuser created"
                ),
                Err(UserServiceError::Duplicate(reason)) => warn!(
                    target = "coinpost::bootstrap",
                    reason,
                    "superuser already exists, skipping"
                ),
                Err(err) => {
                    return Err(AppError::unexpected(format!(
                        "failed to create superuser: {err}"
                    )));
                }
            }
        }
    }
    Ok(())
}

async fn ensure_tier(tiers: &TierService, name: &str) -> Result<i64, AppError> {
    match tiers.create(name).await {
        Ok(tier) => {
            info!(target = "coinpost::bootstrap", tier = %tier.name, "tier created");
            Ok(tier.id)
        }
        Err(TierServiceError::Duplicate) => {
            let tier = tiers
                .find(name)
                .await
                .map_err(|err| AppError::unexpected(format!("failed to load tier: {err}")))?;
            info!(target = "coinpost::bootstrap", tier = %tier.name, "tier already exists");
            Ok(tier.id)
        }
        Err(err) => Err(AppError::unexpected(format!(
            "failed to create tier: {err}"
        ))),
    }
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "coinpost::http",
        addr = %settings.server.addr,
        "listening"
    );

    let grace = settings.server.graceful_shutdown;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(grace))
    .await
    .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "coinpost::http", "server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM and arms a watchdog that exits the process
/// if connections have not drained within `grace`.
async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(target = "coinpost::http", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(target = "coinpost::http", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(
        target = "coinpost::http",
        grace_seconds = grace.as_secs(),
        "shutdown requested, draining connections"
    );
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!(target = "coinpost::http", "graceful shutdown timed out");
        process::exit(1);
    });
}
