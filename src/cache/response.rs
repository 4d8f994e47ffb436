//! Read-through caching and mutation-driven invalidation for JSON handlers.

use std::future::Future;
use std::sync::Arc;

use axum::http::Method;
use metrics::counter;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::error::CacheError;
use super::keys::{CacheArgs, format_template, infer_resource_id};
use super::policy::CachePolicy;
use super::store::CacheStore;

const METRIC_CACHE_HIT: &str = "coinpost_cache_hit_total";
const METRIC_CACHE_MISS: &str = "coinpost_cache_miss_total";
const METRIC_CACHE_INVALIDATED: &str = "coinpost_cache_invalidated_keys_total";

#[derive(Clone)]
pub struct ResponseCache {
    store: Option<Arc<dyn CacheStore>>,
    enabled: bool,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, enabled: bool) -> Self {
        Self {
            store: Some(store),
            enabled,
        }
    }

    /// A cache with no backend; every cached route fails with `MissingClient`.
    pub fn disconnected() -> Self {
        Self {
            store: None,
            enabled: false,
        }
    }

    /// Run `handler` under `policy`.
    ///
    /// `GET` is served from the store when possible. Other methods run the
    /// handler and, when it succeeds, drop the resource key plus the policy's
    /// extra keys and patterns.
    pub async fn run<T, E, F, Fut>(
        &self,
        policy: &CachePolicy,
        method: &Method,
        args: &CacheArgs,
        handler: F,
    ) -> Result<Value, E>
    where
        T: Serialize,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let store = self.store.as_ref().ok_or(CacheError::MissingClient)?;
        let key = resource_key(policy, args)?;

        if method == Method::GET {
            if policy.has_extra_invalidation() {
                return Err(CacheError::UnsupportedRequest.into());
            }
            return self.read_through(store.as_ref(), policy, &key, handler).await;
        }

        let output = handler().await?;
        let value = serde_json::to_value(output).map_err(CacheError::from)?;
        let targets = invalidation_targets(policy, args)?;
        invalidate(store.as_ref(), &key, targets).await;
        Ok(value)
    }

    async fn read_through<T, E, F, Fut>(
        &self,
        store: &dyn CacheStore,
        policy: &CachePolicy,
        key: &str,
        handler: F,
    ) -> Result<Value, E>
    where
        T: Serialize,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.enabled {
            let output = handler().await?;
            return Ok(serde_json::to_value(output).map_err(CacheError::from)?);
        }

        match store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                Ok(cached) => {
                    counter!(METRIC_CACHE_HIT).increment(1);
                    debug!(target = "coinpost::cache", key, outcome = "hit", "serving cached response");
                    return Ok(cached);
                }
                Err(err) => {
                    warn!(target = "coinpost::cache", key, error = %err, "discarding unreadable cache entry");
                }
            },
            Ok(None) => {}
            Err(err) => {
                warn!(target = "coinpost::cache", key, error = %err, "cache read failed");
            }
        }

        counter!(METRIC_CACHE_MISS).increment(1);
        debug!(target = "coinpost::cache", key, outcome = "miss", "executing handler");

        let output = handler().await?;
        let value = serde_json::to_value(output).map_err(CacheError::from)?;
        let encoded = serde_json::to_string(&value).map_err(CacheError::from)?;
        if let Err(err) = store.set_ex(key, &encoded, policy.expiration).await {
            warn!(target = "coinpost::cache", key, error = %err, "cache write failed");
        }
        Ok(value)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct InvalidationTargets {
    keys: Vec<String>,
    patterns: Vec<String>,
}

fn resource_key(policy: &CachePolicy, args: &CacheArgs) -> Result<String, CacheError> {
    let resource_id = match policy.resource_id_name {
        Some(name) => args
            .get(name)
            .map(ToString::to_string)
            .ok_or_else(|| CacheError::MissingArgument(name.to_string()))?,
        None => infer_resource_id(args, policy.resource_id_type)?,
    };
    let prefix = format_template(policy.key_prefix, args)?;
    Ok(format!("{prefix}:{resource_id}"))
}

fn invalidation_targets(
    policy: &CachePolicy,
    args: &CacheArgs,
) -> Result<InvalidationTargets, CacheError> {
    let mut targets = InvalidationTargets::default();
    for (prefix, id) in policy.to_invalidate_extra {
        let prefix = format_template(prefix, args)?;
        let id = format_template(id, args)?;
        targets.keys.push(format!("{prefix}:{id}"));
    }
    targets.patterns = policy.invalidation_patterns(args)?;
    Ok(targets)
}

async fn invalidate(store: &dyn CacheStore, key: &str, targets: InvalidationTargets) {
    let mut keys = Vec::with_capacity(targets.keys.len() + 1);
    keys.push(key.to_string());
    keys.extend(targets.keys);

    let mut removed = 0;
    match store.delete(&keys).await {
        Ok(count) => removed += count,
        Err(err) => {
            error!(target = "coinpost::cache", key, error = %err, "cache invalidation failed");
        }
    }

    for pattern in &targets.patterns {
        match store.delete_matching(pattern).await {
            Ok(count) => removed += count,
            Err(err) => {
                error!(
                    target = "coinpost::cache",
                    pattern = %pattern,
                    error = %err,
                    "cache pattern invalidation failed"
                );
            }
        }
    }

    counter!(METRIC_CACHE_INVALIDATED).increment(removed);
    debug!(target = "coinpost::cache", key, removed, "cache invalidated");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::cache::MemoryCacheStore;

    const LIST: CachePolicy = CachePolicy::new("{username}_posts_cache:page_{page}")
        .resource_id_name("username")
        .expiration_secs(90);
    const SINGLE: CachePolicy = CachePolicy::new("{username}_single_post_cache")
        .resource_id_name("id");
    const DELETE: CachePolicy = CachePolicy::new("{username}_single_post_cache")
        .resource_id_name("id")
        .invalidate_extra(&[("{username}_posts_cache", "{username}")])
        .invalidate_patterns(&["{username}_posts_cache:"]);

    /// A backend whose every call fails, like Redis while it is unreachable.
    struct UnreachableStore;

    #[async_trait::async_trait]
    impl CacheStore for UnreachableStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::backend("connection refused"))
        }

        async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::backend("connection refused"))
        }

        async fn delete(&self, _keys: &[String]) -> Result<u64, CacheError> {
            Err(CacheError::backend("connection refused"))
        }

        async fn delete_matching(&self, _pattern: &str) -> Result<u64, CacheError> {
            Err(CacheError::backend("connection refused"))
        }
    }

    fn cache_with_store() -> (ResponseCache, Arc<MemoryCacheStore>) {
        let store = Arc::new(MemoryCacheStore::new());
        (ResponseCache::new(store.clone(), true), store)
    }

    #[test]
    fn key_combines_prefix_and_named_id() {
        let args = CacheArgs::new().str("username", "alice").int("page", 2);
        assert_eq!(
            resource_key(&LIST, &args).expect("key"),
            "alice_posts_cache:page_2:alice"
        );
    }

    #[test]
    fn key_reports_missing_named_id() {
        let args = CacheArgs::new().str("username", "alice");
        assert!(matches!(
            resource_key(&SINGLE, &args),
            Err(CacheError::MissingArgument(name)) if name == "id"
        ));
    }

    #[test]
    fn extra_targets_are_formatted() {
        let args = CacheArgs::new().str("username", "alice").int("id", 5);
        let targets = invalidation_targets(&DELETE, &args).expect("targets");
        assert_eq!(targets.keys, vec!["alice_posts_cache:alice".to_string()]);
        assert_eq!(targets.patterns, vec!["alice_posts_cache:*".to_string()]);
    }

    #[tokio::test]
    async fn get_serves_second_call_from_store() {
        let (cache, store) = cache_with_store();
        let calls = AtomicUsize::new(0);
        let args = CacheArgs::new().str("username", "alice").int("id", 1);

        for _ in 0..2 {
            let value = cache
                .run(&SINGLE, &Method::GET, &args, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, CacheError>(json!({"id": 1, "title": "hello"}))
                })
                .await
                .expect("cached run");
            assert_eq!(value["title"], "hello");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.contains_key("alice_single_post_cache:1"));
    }

    #[tokio::test]
    async fn get_rejects_invalidation_policies() {
        let (cache, _) = cache_with_store();
        let args = CacheArgs::new().str("username", "alice").int("id", 1);
        let result = cache
            .run(&DELETE, &Method::GET, &args, || async {
                Ok::<_, CacheError>(json!(null))
            })
            .await;
        assert!(matches!(result, Err(CacheError::UnsupportedRequest)));
    }

    #[tokio::test]
    async fn unreadable_entry_counts_as_miss() {
        let (cache, store) = cache_with_store();
        store
            .set_ex("alice_single_post_cache:1", "not json", Duration::from_secs(60))
            .await
            .expect("seed");
        let args = CacheArgs::new().str("username", "alice").int("id", 1);

        let value = cache
            .run(&SINGLE, &Method::GET, &args, || async {
                Ok::<_, CacheError>(json!({"id": 1}))
            })
            .await
            .expect("run");
        assert_eq!(value, json!({"id": 1}));
    }

    #[tokio::test]
    async fn unreachable_store_falls_back_to_handler() {
        let cache = ResponseCache::new(Arc::new(UnreachableStore), true);
        let calls = AtomicUsize::new(0);
        let args = CacheArgs::new().str("username", "alice").int("id", 1);

        for _ in 0..2 {
            let value = cache
                .run(&SINGLE, &Method::GET, &args, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, CacheError>(json!({"id": 1, "title": "hello"}))
                })
                .await
                .expect("read served without cache");
            assert_eq!(value["title"], "hello");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unreachable_store_does_not_fail_mutations() {
        let cache = ResponseCache::new(Arc::new(UnreachableStore), true);
        let args = CacheArgs::new().str("username", "alice").int("id", 5);

        let value = cache
            .run(&DELETE, &Method::DELETE, &args, || async {
                Ok::<_, CacheError>(json!({"message": "Post deleted"}))
            })
            .await
            .expect("mutation succeeds");
        assert_eq!(value["message"], "Post deleted");
    }

    #[tokio::test]
    async fn mutation_clears_key_extras_and_patterns() {
        let (cache, store) = cache_with_store();
        for key in [
            "alice_single_post_cache:5",
            "alice_posts_cache:alice",
            "alice_posts_cache:page_1:alice",
            "alice_posts_cache:page_2:alice",
            "bob_posts_cache:page_1:bob",
        ] {
            store
                .set_ex(key, "[]", Duration::from_secs(60))
                .await
                .expect("seed");
        }
        let args = CacheArgs::new().str("username", "alice").int("id", 5);

        cache
            .run(&DELETE, &Method::DELETE, &args, || async {
                Ok::<_, CacheError>(json!({"message": "Post deleted"}))
            })
            .await
            .expect("delete");

        assert_eq!(store.len(), 1);
        assert!(store.contains_key("bob_posts_cache:page_1:bob"));
    }

    #[tokio::test]
    async fn failed_mutation_keeps_cache() {
        let (cache, store) = cache_with_store();
        store
            .set_ex("alice_single_post_cache:5", "{}", Duration::from_secs(60))
            .await
            .expect("seed");
        let args = CacheArgs::new().str("username", "alice").int("id", 5);

        let result = cache
            .run(&DELETE, &Method::DELETE, &args, || async {
                Err::<Value, _>(CacheError::backend("handler failed"))
            })
            .await;

        assert!(result.is_err());
        assert!(store.contains_key("alice_single_post_cache:5"));
    }

    #[tokio::test]
    async fn disconnected_cache_reports_missing_client() {
        let cache = ResponseCache::disconnected();
        let args = CacheArgs::new().str("username", "alice").int("id", 1);
        let result = cache
            .run(&SINGLE, &Method::GET, &args, || async {
                Ok::<_, CacheError>(json!({}))
            })
            .await;
        assert!(matches!(result, Err(CacheError::MissingClient)));
    }
}
