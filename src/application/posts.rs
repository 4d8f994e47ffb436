use std::sync::Arc;

use thiserror::Error;

use crate::application::pagination::{PageRequest, PaginatedList};
use crate::application::repos::{
    CreatePostParams, PostsRepo, RepoError, UpdatePostParams, UsersRepo,
};
use crate::domain::entities::{PostRecord, UserRecord};
use crate::domain::error::DomainError;
use crate::domain::validation;

#[derive(Debug, Error)]
pub enum PostServiceError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("caller may not modify posts of another user")]
    Forbidden,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub text: String,
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePostCommand {
    pub title: Option<String>,
    pub text: Option<String>,
    pub media_url: Option<String>,
}

#[derive(Clone)]
pub struct PostService {
    users: Arc<dyn UsersRepo>,
    posts: Arc<dyn PostsRepo>,
}

impl PostService {
    pub fn new(users: Arc<dyn UsersRepo>, posts: Arc<dyn PostsRepo>) -> Self {
        Self { users, posts }
    }

    pub async fn create(
        &self,
        actor: &UserRecord,
        username: &str,
        command: CreatePostCommand,
    ) -> Result<PostRecord, PostServiceError> {
        let author = self.owned_author(actor, username).await?;

        validation::post_title(&command.title)?;
        validation::post_text(&command.text)?;
        if let Some(url) = command.media_url.as_deref() {
            validation::media_url(url)?;
        }

        self.posts
            .create_post(CreatePostParams {
                created_by_user_id: author.id,
                title: command.title,
                text: command.text,
                media_url: command.media_url,
            })
            .await
            .map_err(PostServiceError::from)
    }

    pub async fn list(
        &self,
        username: &str,
        request: PageRequest,
    ) -> Result<PaginatedList<PostRecord>, PostServiceError> {
        let author = self.author(username).await?;
        let (posts, total) = self
            .posts
            .list_posts_by_author(author.id, request.window())
            .await?;
        Ok(PaginatedList::new(posts, total, request))
    }

    pub async fn get(&self, username: &str, id: i64) -> Result<PostRecord, PostServiceError> {
        let author = self.author(username).await?;
        self.posts
            .find_post(id, Some(author.id))
            .await?
            .ok_or(PostServiceError::NotFound("Post not found"))
    }

    pub async fn update(
        &self,
        actor: &UserRecord,
        username: &str,
        id: i64,
        command: UpdatePostCommand,
    ) -> Result<PostRecord, PostServiceError> {
        let author = self.owned_author(actor, username).await?;
        let post = self.owned_post(author.id, id).await?;

        if let Some(title) = command.title.as_deref() {
            validation::post_title(title)?;
        }
        if let Some(text) = command.text.as_deref() {
            validation::post_text(text)?;
        }
        if let Some(url) = command.media_url.as_deref() {
            validation::media_url(url)?;
        }

        self.posts
            .update_post(
                post.id,
                UpdatePostParams {
                    title: command.title,
                    text: command.text,
                    media_url: command.media_url,
                },
            )
            .await
            .map_err(PostServiceError::from)
    }

    pub async fn delete(
        &self,
        actor: &UserRecord,
        username: &str,
        id: i64,
    ) -> Result<(), PostServiceError> {
        let author = self.owned_author(actor, username).await?;
        let post = self.owned_post(author.id, id).await?;
        self.posts
            .soft_delete_post(post.id)
            .await
            .map_err(PostServiceError::from)
    }

    pub async fn hard_delete(&self, username: &str, id: i64) -> Result<(), PostServiceError> {
        let author = self.author(username).await?;
        let post = self.owned_post(author.id, id).await?;
        self.posts
            .hard_delete_post(post.id)
            .await
            .map_err(PostServiceError::from)
    }

    async fn author(&self, username: &str) -> Result<UserRecord, PostServiceError> {
        self.users
            .find_user_by_username(username, false)
            .await?
            .ok_or(PostServiceError::NotFound("User not found"))
    }

    async fn owned_author(
        &self,
        actor: &UserRecord,
        username: &str,
    ) -> Result<UserRecord, PostServiceError> {
        let author = self.author(username).await?;
        if author.id != actor.id {
            return Err(PostServiceError::Forbidden);
        }
        Ok(author)
    }

    async fn owned_post(&self, author_id: i64, id: i64) -> Result<PostRecord, PostServiceError> {
        self.posts
            .find_post(id, Some(author_id))
            .await?
            .ok_or(PostServiceError::NotFound("Post not found"))
    }
}
