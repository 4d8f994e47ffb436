//! Post handlers. Reads go through the response cache and every mutation
//! drops the affected single-post key and the author's list pages.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;

use crate::application::posts::{CreatePostCommand, UpdatePostCommand};
use crate::cache::{CacheArgs, CachePolicy};

use super::{PageQuery, post_to_api};
use crate::infra::http::api::auth::{CurrentUser, Superuser};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::rate_limit::Throttle;
use crate::infra::http::api::state::ApiState;

pub const POST_LIST_CACHE: CachePolicy = CachePolicy::new("{username}_posts_cache:page_{page}")
    .resource_id_name("username")
    .expiration_secs(90);

pub const POST_CACHE: CachePolicy =
    CachePolicy::new("{username}_single_post_cache").resource_id_name("id");

pub const POST_UPDATE_CACHE: CachePolicy = CachePolicy::new("{username}_single_post_cache")
    .resource_id_name("id")
    .invalidate_patterns(&["{username}_posts_cache:"]);

pub const POST_DELETE_CACHE: CachePolicy = CachePolicy::new("{username}_single_post_cache")
    .resource_id_name("id")
    .invalidate_extra(&[("{username}_posts_cache", "{username}")])
    .invalidate_patterns(&["{username}_posts_cache:"]);

pub async fn create_post(
    State(state): State<ApiState>,
    current: CurrentUser,
    _throttle: Throttle,
    Path(username): Path<String>,
    Json(payload): Json<PostCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreatePostCommand {
        title: payload.title,
        text: payload.text,
        media_url: payload.media_url,
    };

    let post = state
        .posts
        .create(&current.user, &username, command)
        .await
        .map_err(post_to_api)?;

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn list_posts(
    State(state): State<ApiState>,
    method: Method,
    _throttle: Throttle,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let request = query.request()?;
    let args = CacheArgs::new()
        .str("username", username.clone())
        .int("page", request.page)
        .int("items_per_page", request.items_per_page);

    let posts = state.posts.clone();
    let body = state
        .cache
        .run(&POST_LIST_CACHE, &method, &args, move || async move {
            posts.list(&username, request).await.map_err(post_to_api)
        })
        .await?;

    Ok(Json(body))
}

pub async fn read_post(
    State(state): State<ApiState>,
    method: Method,
    _throttle: Throttle,
    Path((username, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let args = CacheArgs::new()
        .str("username", username.clone())
        .int("id", id);

    let posts = state.posts.clone();
    let body = state
        .cache
        .run(&POST_CACHE, &method, &args, move || async move {
            posts.get(&username, id).await.map_err(post_to_api)
        })
        .await?;

    Ok(Json(body))
}

pub async fn update_post(
    State(state): State<ApiState>,
    method: Method,
    current: CurrentUser,
    _throttle: Throttle,
    Path((username, id)): Path<(String, i64)>,
    Json(payload): Json<PostUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = UpdatePostCommand {
        title: payload.title,
        text: payload.text,
        media_url: payload.media_url,
    };
    let args = CacheArgs::new()
        .str("username", username.clone())
        .int("id", id);

    let posts = state.posts.clone();
    let body = state
        .cache
        .run(&POST_UPDATE_CACHE, &method, &args, move || async move {
            posts
                .update(&current.user, &username, id, command)
                .await
                .map_err(post_to_api)?;
            Ok::<_, ApiError>(MessageResponse::new("Post updated"))
        })
        .await?;

    Ok(Json(body))
}

pub async fn delete_post(
    State(state): State<ApiState>,
    method: Method,
    current: CurrentUser,
    _throttle: Throttle,
    Path((username, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let args = CacheArgs::new()
        .str("username", username.clone())
        .int("id", id);

    let posts = state.posts.clone();
    let body = state
        .cache
        .run(&POST_DELETE_CACHE, &method, &args, move || async move {
            posts
                .delete(&current.user, &username, id)
                .await
                .map_err(post_to_api)?;
            Ok::<_, ApiError>(MessageResponse::new("Post deleted"))
        })
        .await?;

    Ok(Json(body))
}

pub async fn hard_delete_post(
    State(state): State<ApiState>,
    method: Method,
    _admin: Superuser,
    _throttle: Throttle,
    Path((username, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let args = CacheArgs::new()
        .str("username", username.clone())
        .int("id", id);

    let posts = state.posts.clone();
    let body = state
        .cache
        .run(&POST_DELETE_CACHE, &method, &args, move || async move {
            posts
                .hard_delete(&username, id)
                .await
                .map_err(post_to_api)?;
            Ok::<_, ApiError>(MessageResponse::new("Post deleted from the database"))
        })
        .await?;

    Ok(Json(body))
}
