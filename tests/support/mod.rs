#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rostergate::application::access::{AccessFilter, AccessPolicy};
use rostergate::application::repos::{ContentRepo, GroupDirectory, RepoError};
use rostergate::cache::{CacheConfig, MemoryCacheStore, ObjectCache};
use rostergate::domain::entities::{ContentRecord, UserRecord};
use rostergate::domain::types::{ContentKind, EntityId, GroupId};
use rostergate::infra::memory::{RosterFile, RosterStore};

pub const ROSTER: &str = include_str!("../fixtures/roster.toml");

pub fn roster_path() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/roster.toml")
}

pub fn store() -> Arc<RosterStore> {
    let file = RosterFile::parse(ROSTER).expect("fixture roster parses");
    Arc::new(RosterStore::from_file(file).expect("fixture roster is consistent"))
}

pub fn user(store: &RosterStore, username: &str) -> UserRecord {
    store.user(username).expect("fixture user").clone()
}

pub async fn record(store: &RosterStore, id: i64) -> ContentRecord {
    store
        .find_by_id(EntityId(id))
        .await
        .expect("lookup succeeds")
        .expect("fixture record")
}

pub fn filter(store: &Arc<RosterStore>, policy: AccessPolicy) -> AccessFilter {
    AccessFilter::new(store.clone(), store.clone(), policy)
}

pub fn memory_cache(config: CacheConfig) -> ObjectCache {
    ObjectCache::new(Arc::new(MemoryCacheStore::new(&config)), config)
}

/// Wraps a repository, counting calls and optionally failing every one of them.
pub struct FlakyRepo {
    inner: Arc<RosterStore>,
    failing: bool,
    calls: AtomicUsize,
}

impl FlakyRepo {
    pub fn healthy(inner: Arc<RosterStore>) -> Self {
        Self {
            inner,
            failing: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(inner: Arc<RosterStore>) -> Self {
        Self {
            inner,
            failing: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), RepoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            Err(RepoError::Timeout)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContentRepo for FlakyRepo {
    async fn find_by_id(&self, id: EntityId) -> Result<Option<ContentRecord>, RepoError> {
        self.enter()?;
        self.inner.find_by_id(id).await
    }

    async fn find_live_artist_by_title(
        &self,
        title: &str,
    ) -> Result<Option<ContentRecord>, RepoError> {
        self.enter()?;
        self.inner.find_live_artist_by_title(title).await
    }

    async fn list_owned_by(&self, groups: &BTreeSet<GroupId>) -> Result<Vec<EntityId>, RepoError> {
        self.enter()?;
        self.inner.list_owned_by(groups).await
    }

    async fn list_linked_to(&self, parents: &[EntityId]) -> Result<Vec<EntityId>, RepoError> {
        self.enter()?;
        self.inner.list_linked_to(parents).await
    }

    async fn count_upcoming_linked(&self, parent: EntityId) -> Result<u64, RepoError> {
        self.enter()?;
        self.inner.count_upcoming_linked(parent).await
    }

    async fn save(&self, record: ContentRecord) -> Result<ContentRecord, RepoError> {
        self.enter()?;
        self.inner.save(record).await
    }
}

#[async_trait]
impl GroupDirectory for FlakyRepo {
    async fn groups_owning(&self, kind: ContentKind) -> Result<BTreeSet<GroupId>, RepoError> {
        self.enter()?;
        self.inner.groups_owning(kind).await
    }

    async fn members(&self, group: GroupId) -> Result<Vec<UserRecord>, RepoError> {
        self.enter()?;
        self.inner.members(group).await
    }
}

pub const SHORT_TTL: Duration = Duration::from_secs(60);
