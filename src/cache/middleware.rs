//! Client-side cache hints.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, header},
    middleware::Next,
    response::Response,
};

#[derive(Debug, Clone, Copy)]
pub struct ClientCacheState {
    pub max_age_seconds: u64,
}

/// Advertise `Cache-Control: max-age=N` unless the handler already chose a policy.
pub async fn client_cache_control(
    State(state): State<ClientCacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    if !response.headers().contains_key(header::CACHE_CONTROL)
        && let Ok(value) = HeaderValue::from_str(&format!("max-age={}", state.max_age_seconds))
    {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    response
}
