use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{ContentRecord, UserRecord};
use crate::domain::types::{ContentKind, EntityId, GroupId};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("datastore timeout")]
    Timeout,
}

/// Content datastore consumed by the access filter and the roster service.
#[async_trait]
pub trait ContentRepo: Send + Sync {
    async fn find_by_id(&self, id: EntityId) -> Result<Option<ContentRecord>, RepoError>;

    /// First live artist whose title matches case-insensitively, by ascending id.
    async fn find_live_artist_by_title(
        &self,
        title: &str,
    ) -> Result<Option<ContentRecord>, RepoError>;

    /// Ids of artists owned by any of `groups`.
    async fn list_owned_by(&self, groups: &BTreeSet<GroupId>) -> Result<Vec<EntityId>, RepoError>;

    /// Ids of events linked to any of `parents`.
    async fn list_linked_to(&self, parents: &[EntityId]) -> Result<Vec<EntityId>, RepoError>;

    /// Number of live, non-archived events linked to `parent`.
    async fn count_upcoming_linked(&self, parent: EntityId) -> Result<u64, RepoError>;

    /// Inserts or replaces the record in one transaction.
    async fn save(&self, record: ContentRecord) -> Result<ContentRecord, RepoError>;
}

/// Group membership source.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Groups owning at least one object of `kind`.
    async fn groups_owning(&self, kind: ContentKind) -> Result<BTreeSet<GroupId>, RepoError>;

    /// Members of `group` in registration order.
    async fn members(&self, group: GroupId) -> Result<Vec<UserRecord>, RepoError>;
}
