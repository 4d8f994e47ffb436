pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};
pub use middleware::RequestContext;

use axum::{Router, middleware as axum_middleware};

use crate::cache::client_cache_control;

use self::middleware::{log_responses, set_request_context};

/// Full application router: the `/api/v1` routes wrapped in the shared
/// request-id, response logging and client cache layers.
pub fn build_router(state: ApiState) -> Router {
    let client_cache = state.client_cache;

    build_api_router(state)
        .layer(axum_middleware::from_fn_with_state(
            client_cache,
            client_cache_control,
        ))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
