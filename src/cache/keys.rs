//! Cache key definitions.
//!
//! Object keys render as `{entity_type}:{entity_id}:{computation}` so that every
//! entry of one entity shares the prefix `{entity_type}:{entity_id}:`.

use crate::domain::types::EntityRef;

const SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A value computed from one entity's persisted state.
    Object {
        entity: EntityRef,
        computation: String,
    },
    /// A lookup keyed by something other than an entity. Expires by TTL only.
    Named { namespace: String, name: String },
}

impl CacheKey {
    pub fn object(entity: EntityRef, computation: impl Into<String>) -> Self {
        Self::Object {
            entity,
            computation: computation.into(),
        }
    }

    pub fn named(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Named {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Renders the key as stored, under the configured namespace prefix.
    pub fn render(&self, prefix: &str) -> String {
        match self {
            Self::Object {
                entity,
                computation,
            } => format!("{}{computation}", entity_prefix(prefix, *entity)),
            Self::Named { namespace, name } => {
                format!("{prefix}{namespace}{SEPARATOR}{name}")
            }
        }
    }
}

/// Prefix shared by every object key of `entity`.
pub fn entity_prefix(prefix: &str, entity: EntityRef) -> String {
    format!(
        "{prefix}{kind}{SEPARATOR}{id}{SEPARATOR}",
        kind = entity.kind.as_str(),
        id = entity.id
    )
}
