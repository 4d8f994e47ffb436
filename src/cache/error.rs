use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache client is not initialized")]
    MissingClient,
    #[error("could not infer the id of the cached resource")]
    IdInference,
    #[error("argument `{0}` named by the cache key template was not supplied")]
    MissingArgument(String),
    #[error("unbalanced braces in cache key template `{0}`")]
    MalformedTemplate(String),
    #[error("GET requests cannot invalidate extra keys or patterns")]
    UnsupportedRequest,
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cached payload could not be encoded: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::backend(err)
    }
}
