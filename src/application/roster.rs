//! Guarded writes to roster content.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::application::access::{AccessError, AccessFilter};
use crate::application::repos::{ContentRepo, RepoError};
use crate::cache::ObjectCache;
use crate::domain::entities::{ContentRecord, UserRecord};
use crate::domain::types::{ContentKind, EntityId, EntityRef};

const UPCOMING_EVENT_COUNT: &str = "upcoming_event_count";
const UPCOMING_EVENT_COUNT_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum RosterError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct RosterService {
    content: Arc<dyn ContentRepo>,
    access: AccessFilter,
    cache: ObjectCache,
}

impl RosterService {
    pub fn new(content: Arc<dyn ContentRepo>, access: AccessFilter, cache: ObjectCache) -> Self {
        Self {
            content,
            access,
            cache,
        }
    }

    pub fn access(&self) -> &AccessFilter {
        &self.access
    }

    /// Writes `record` on behalf of `actor` and drops its cached computations.
    ///
    /// Permission is checked against both the stored version and the incoming one,
    /// so a member can neither take over another group's object nor hand one of
    /// theirs to a group or artist outside their reach. Saving an object that does
    /// not exist yet is a creation and goes through the creation guard as well.
    #[instrument(skip_all, fields(actor = %actor.username, object = %record.entity()))]
    pub async fn save(
        &self,
        actor: &UserRecord,
        record: ContentRecord,
    ) -> Result<ContentRecord, RosterError> {
        let previous_parent = match self.content.find_by_id(record.id).await? {
            Some(existing) => {
                self.access.guard_mutation(actor, &existing).await?;
                self.access
                    .guard_owner_assignment(actor, existing.owning_group, &record)?;
                existing.linked_parent
            }
            None => {
                self.access.guard_creation(actor, record.kind)?;
                self.access.guard_owner_assignment(actor, None, &record)?;
                None
            }
        };
        self.access.guard_mutation(actor, &record).await?;

        let saved = self.content.save(record).await?;
        self.cache.invalidate(saved.entity()).await;
        // Counts cached on a parent include its linked objects.
        for parent in saved.linked_parent.into_iter().chain(
            previous_parent.filter(|previous| Some(*previous) != saved.linked_parent),
        ) {
            self.cache
                .invalidate(EntityRef::new(ContentKind::Artist, parent))
                .await;
        }
        debug!("content saved");
        Ok(saved)
    }

    /// Creates `record` when its kind is open to `actor`.
    pub async fn create(
        &self,
        actor: &UserRecord,
        record: ContentRecord,
    ) -> Result<ContentRecord, RosterError> {
        self.access.guard_creation(actor, record.kind)?;
        self.save(actor, record).await
    }

    /// Live, non-archived events linked to the artist.
    pub async fn upcoming_event_count(&self, artist: EntityId) -> Result<u64, RosterError> {
        let entity = EntityRef::new(ContentKind::Artist, artist);
        let count = self
            .cache
            .try_get_or_compute(entity, UPCOMING_EVENT_COUNT, UPCOMING_EVENT_COUNT_TTL, || {
                self.content.count_upcoming_linked(artist)
            })
            .await?;
        Ok(count)
    }
}
