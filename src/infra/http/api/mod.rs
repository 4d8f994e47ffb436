pub mod auth;
pub mod error;
pub mod handlers;
pub mod models;
pub mod rate_limit;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/login", post(handlers::login))
        .route("/api/v1/refresh", post(handlers::refresh))
        .route("/api/v1/logout", post(handlers::logout))
        .route("/api/v1/user", post(handlers::create_user))
        .route("/api/v1/users", get(handlers::list_users))
        .route("/api/v1/user/me", get(handlers::read_current_user))
        .route(
            "/api/v1/user/{username}",
            get(handlers::read_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route(
            "/api/v1/db_user/{username}",
            delete(handlers::hard_delete_user),
        )
        .route(
            "/api/v1/user/{username}/rate_limits",
            get(handlers::read_user_rate_limits),
        )
        .route(
            "/api/v1/user/{username}/tier",
            get(handlers::read_user_tier).patch(handlers::update_user_tier),
        )
        .route("/api/v1/tier", post(handlers::create_tier))
        .route("/api/v1/tiers", get(handlers::list_tiers))
        .route(
            "/api/v1/tier/{name}",
            get(handlers::read_tier)
                .patch(handlers::update_tier)
                .delete(handlers::delete_tier),
        )
        .route(
            "/api/v1/tier/{name}/rate_limit",
            post(handlers::create_rate_limit),
        )
        .route(
            "/api/v1/tier/{name}/rate_limits",
            get(handlers::list_rate_limits),
        )
        .route(
            "/api/v1/tier/{name}/rate_limit/{id}",
            get(handlers::read_rate_limit)
                .patch(handlers::update_rate_limit)
                .delete(handlers::delete_rate_limit),
        )
        .route("/api/v1/{username}/post", post(handlers::create_post))
        .route("/api/v1/{username}/posts", get(handlers::list_posts))
        .route(
            "/api/v1/{username}/post/{id}",
            get(handlers::read_post)
                .patch(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route(
            "/api/v1/{username}/db_post/{id}",
            delete(handlers::hard_delete_post),
        )
        .route(
            "/api/v1/crypto",
            get(handlers::list_cryptos).post(handlers::create_crypto),
        )
        .route(
            "/api/v1/crypto/user",
            get(handlers::list_holdings).post(handlers::create_holding),
        )
        .route("/api/v1/crypto/{symbol}", get(handlers::read_crypto))
        .route(
            "/api/v1/crypto/{symbol}/price",
            patch(handlers::update_crypto_price),
        )
        .route("/api/v1/finance/add", post(handlers::create_transfer))
        .route("/api/v1/finance/list", get(handlers::list_transfers))
        .route(
            "/api/v1/finance/detail/{tx_id}",
            get(handlers::read_transfer),
        )
        .route(
            "/api/v1/accounting/transactions",
            get(handlers::list_ledger_entries).post(handlers::create_ledger_entry),
        )
        .route(
            "/api/v1/accounting/transactions/{id}",
            get(handlers::read_ledger_entry)
                .patch(handlers::update_ledger_entry)
                .delete(handlers::delete_ledger_entry),
        )
        .route("/api/v1/accounting/summary", get(handlers::ledger_summary))
        .route(
            "/api/v1/partitions",
            get(handlers::list_partitions).post(handlers::create_partition),
        )
        .route(
            "/api/v1/partitions/{id}",
            get(handlers::read_partition)
                .patch(handlers::update_partition)
                .delete(handlers::delete_partition),
        )
        .route("/api/v1/jobs/enqueue", post(handlers::enqueue_job))
        .route("/api/v1/jobs/status/{job_id}", get(handlers::read_job_status))
        .with_state(state)
}
