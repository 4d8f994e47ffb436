use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use metrics::counter;
use tracing::{debug, warn};

use crate::domain::entities::UserRecord;
use crate::rate_limit::{Quota, sanitize_path};

use super::auth::MaybeUser;
use super::error::ApiError;
use super::state::ApiState;

const METRIC_RATE_LIMIT_REJECTED: &str = "coinpost_rate_limit_rejected_total";

/// Counts the request against the caller's quota and rejects it with 429 once
/// the current window is exhausted.
///
/// Authenticated callers are keyed by user id and use the rule of their tier
/// whose path matches the request, falling back to the configured default.
/// Anonymous callers are keyed by client address with the default quota.
#[derive(Debug, Clone, Copy)]
pub struct Throttle;

impl FromRequestParts<ApiState> for Throttle {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path().to_string();
        let MaybeUser(current) = MaybeUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let (subject, quota) = match current {
            Some(current) => (
                current.user.id.to_string(),
                quota_for_user(state, &current.user, &path).await,
            ),
            None => (client_address(parts), state.default_quota),
        };

        match state
            .rate_limiter
            .is_rate_limited(&subject, &path, quota)
            .await
        {
            Ok(decision) if decision.limited => {
                counter!(METRIC_RATE_LIMIT_REJECTED).increment(1);
                debug!(
                    target = "coinpost::api::ratelimit",
                    subject = %subject,
                    path = %path,
                    count = decision.count,
                    limit = quota.limit,
                    "request rejected"
                );
                Err(ApiError::rate_limited(decision.retry_after))
            }
            Ok(_) => Ok(Self),
            Err(err) => {
                warn!(
                    target = "coinpost::api::ratelimit",
                    subject = %subject,
                    path = %path,
                    error = %err,
                    "rate limit check failed, allowing request"
                );
                Ok(Self)
            }
        }
    }
}

async fn quota_for_user(state: &ApiState, user: &UserRecord, path: &str) -> Quota {
    let Some(tier_id) = user.tier_id else {
        return state.default_quota;
    };

    match state
        .rate_limit_rules
        .find_rate_limit_for_path(tier_id, &sanitize_path(path))
        .await
    {
        Ok(Some(rule)) => ApiState::rule_quota(rule.limit, rule.period).unwrap_or(state.default_quota),
        Ok(None) => state.default_quota,
        Err(err) => {
            warn!(
                target = "coinpost::api::ratelimit",
                tier_id,
                path,
                error = %err,
                "rate limit rule lookup failed, using default quota"
            );
            state.default_quota
        }
    }
}

fn client_address(parts: &Parts) -> String {
    if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    parts
        .headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
