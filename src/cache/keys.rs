//! Cache key templating.
//!
//! Templates use `{name}` placeholders that are substituted from the request
//! arguments captured in [`CacheArgs`]. Escaped braces are not supported.

use std::fmt;

use super::error::CacheError;
use super::policy::ResourceIdType;

/// A request argument that may feed a key template or act as the resource id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheArg {
    Int(i64),
    Str(String),
}

impl fmt::Display for CacheArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheArg::Int(value) => write!(f, "{value}"),
            CacheArg::Str(value) => f.write_str(value),
        }
    }
}

/// Named request arguments in declaration order.
///
/// Order matters for resource id inference: the last matching argument wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheArgs {
    entries: Vec<(&'static str, CacheArg)>,
}

impl CacheArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn int(self, name: &'static str, value: impl Into<i64>) -> Self {
        self.with(name, CacheArg::Int(value.into()))
    }

    pub fn str(self, name: &'static str, value: impl Into<String>) -> Self {
        self.with(name, CacheArg::Str(value.into()))
    }

    fn with(mut self, name: &'static str, value: CacheArg) -> Self {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&CacheArg> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &CacheArg)> {
        self.entries.iter().map(|(name, value)| (*name, value))
    }
}

/// Names between `{` and `}` in template order, duplicates included.
pub fn extract_placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        names.push(&after[..close]);
        rest = &after[close + 1..];
    }
    names
}

/// Substitute every `{name}` in `template` with the matching argument.
pub fn format_template(template: &str, args: &CacheArgs) -> Result<String, CacheError> {
    let mut formatted = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let open = rest.find('{');
        let close = rest.find('}');
        match (open, close) {
            (None, None) => {
                formatted.push_str(rest);
                return Ok(formatted);
            }
            (Some(open), Some(close)) if open < close => {
                formatted.push_str(&rest[..open]);
                let name = &rest[open + 1..close];
                if name.contains('{') {
                    return Err(CacheError::MalformedTemplate(template.to_string()));
                }
                let value = args
                    .get(name)
                    .ok_or_else(|| CacheError::MissingArgument(name.to_string()))?;
                formatted.push_str(&value.to_string());
                rest = &rest[close + 1..];
            }
            _ => return Err(CacheError::MalformedTemplate(template.to_string())),
        }
    }
}

/// Pick the resource id when the policy does not name one.
///
/// Integer ids come from the last integer argument whose name contains `id`;
/// string ids from the last string argument.
pub fn infer_resource_id(args: &CacheArgs, id_type: ResourceIdType) -> Result<String, CacheError> {
    args.iter()
        .filter(|(name, value)| match (id_type, value) {
            (ResourceIdType::Int, CacheArg::Int(_)) => name.contains("id"),
            (ResourceIdType::Str, CacheArg::Str(_)) => true,
            _ => false,
        })
        .last()
        .map(|(_, value)| value.to_string())
        .ok_or(CacheError::IdInference)
}
