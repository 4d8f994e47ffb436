use std::time::Duration;

use super::error::CacheError;
use super::keys::{CacheArgs, format_template};

const DEFAULT_EXPIRATION: Duration = Duration::from_secs(3600);

/// How the resource id is inferred when the policy does not name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceIdType {
    #[default]
    Int,
    Str,
}

/// Declarative cache behaviour for one route.
///
/// Built in `const` context so handlers can keep their policy next to the
/// route definition:
///
/// ```
/// use coinpost::cache::CachePolicy;
///
/// const POSTS: CachePolicy = CachePolicy::new("{username}_posts_cache:page_{page}")
///     .resource_id_name("username")
///     .expiration_secs(90);
/// assert_eq!(POSTS.expiration.as_secs(), 90);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub key_prefix: &'static str,
    pub resource_id_name: Option<&'static str>,
    pub resource_id_type: ResourceIdType,
    pub expiration: Duration,
    /// `(prefix template, id template)` pairs deleted after a mutation.
    pub to_invalidate_extra: &'static [(&'static str, &'static str)],
    /// Key prefix templates; every key starting with the formatted prefix is
    /// deleted after a mutation. The trailing `*` is added when matching.
    pub pattern_to_invalidate_extra: &'static [&'static str],
}

impl CachePolicy {
    pub const fn new(key_prefix: &'static str) -> Self {
        Self {
            key_prefix,
            resource_id_name: None,
            resource_id_type: ResourceIdType::Int,
            expiration: DEFAULT_EXPIRATION,
            to_invalidate_extra: &[],
            pattern_to_invalidate_extra: &[],
        }
    }

    pub const fn resource_id_name(mut self, name: &'static str) -> Self {
        self.resource_id_name = Some(name);
        self
    }

    pub const fn resource_id_type(mut self, id_type: ResourceIdType) -> Self {
        self.resource_id_type = id_type;
        self
    }

    pub const fn expiration_secs(mut self, secs: u64) -> Self {
        self.expiration = Duration::from_secs(secs);
        self
    }

    pub const fn invalidate_extra(
        mut self,
        extra: &'static [(&'static str, &'static str)],
    ) -> Self {
        self.to_invalidate_extra = extra;
        self
    }

    pub const fn invalidate_patterns(mut self, patterns: &'static [&'static str]) -> Self {
        self.pattern_to_invalidate_extra = patterns;
        self
    }

    /// Formatted glob patterns for `pattern_to_invalidate_extra`.
    pub fn invalidation_patterns(&self, args: &CacheArgs) -> Result<Vec<String>, CacheError> {
        self.pattern_to_invalidate_extra
            .iter()
            .map(|template| {
                let prefix = format_template(template, args)?;
                Ok::<_, CacheError>(format!("{}*", prefix.trim_end_matches('*')))
            })
            .collect()
    }

    pub(crate) fn has_extra_invalidation(&self) -> bool {
        !self.to_invalidate_extra.is_empty() || !self.pattern_to_invalidate_extra.is_empty()
    }
}
