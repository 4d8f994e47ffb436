//! Bearer token extractors.
//!
//! The first extractor that authenticates a request stores the result in the
//! request extensions, so handlers that combine [`CurrentUser`] with the rate
//! limiter only hit the user store once.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use tracing::debug;

use crate::application::auth::AuthError;
use crate::domain::entities::UserRecord;

use super::error::ApiError;
use super::handlers::auth_to_api;
use super::state::ApiState;

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: UserRecord,
    /// Raw access token, kept so logout and account deletion can revoke it.
    pub token: String,
}

/// A [`CurrentUser`] with the superuser flag set.
#[derive(Debug, Clone)]
pub struct Superuser(pub CurrentUser);

/// Authentication that never rejects; invalid tokens resolve to `None`.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

pub fn bearer_token(parts: &Parts) -> Option<&str> {
    let raw = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = raw.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return None;
    }
    Some(token.trim())
}

async fn authenticate(parts: &mut Parts, state: &ApiState) -> Result<CurrentUser, AuthError> {
    if let Some(current) = parts.extensions.get::<CurrentUser>() {
        return Ok(current.clone());
    }
    let token = bearer_token(parts)
        .ok_or(AuthError::MalformedToken)?
        .to_string();
    let user = state.auth.authenticate(&token).await?;
    let current = CurrentUser { user, token };
    parts.extensions.insert(current.clone());
    Ok(current)
}

impl FromRequestParts<ApiState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        if bearer_token(parts).is_none() && parts.extensions.get::<CurrentUser>().is_none() {
            return Err(ApiError::unauthorized("Not authenticated", None));
        }
        authenticate(parts, state).await.map_err(auth_to_api)
    }
}

impl FromRequestParts<ApiState> for Superuser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        if !current.user.is_superuser {
            return Err(ApiError::forbidden());
        }
        Ok(Self(current))
    }
}

impl FromRequestParts<ApiState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        if bearer_token(parts).is_none() && parts.extensions.get::<CurrentUser>().is_none() {
            return Ok(Self(None));
        }
        match authenticate(parts, state).await {
            Ok(current) => Ok(Self(Some(current))),
            Err(AuthError::Repo(err)) => Err(super::handlers::repo_to_api(err)),
            Err(err) => {
                debug!(
                    target = "coinpost::http::auth",
                    error = %err,
                    "ignoring unusable bearer token"
                );
                Ok(Self(None))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/user/me");
        if let Some(value) = header {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (parts, _) = builder.body(()).expect("request").into_parts();
        parts
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("bearer abc"))), Some("abc"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        assert_eq!(bearer_token(&parts(Some("Basic dXNlcjpwdw=="))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
