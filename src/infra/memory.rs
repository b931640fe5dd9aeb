//! Roster-file backed content datastore and group directory.
//!
//! A roster file is TOML:
//!
//! ```toml
//! [[groups]]
//! id = 1
//! name = "The Night Owls"
//!
//! [[users]]
//! username = "owl-manager"
//! email = "manager@nightowls.example"
//! groups = [1]
//!
//! [[content]]
//! id = 10
//! kind = "artist"
//! title = "The Night Owls"
//! owning_group = 1
//!
//! [[content]]
//! id = 20
//! kind = "event"
//! title = "Night Owls live"
//! linked_parent = 10
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::repos::{ContentRepo, GroupDirectory, RepoError};
use crate::domain::entities::{ContentRecord, GroupRecord, UserRecord};
use crate::domain::error::DomainError;
use crate::domain::types::{ContentKind, EntityId, GroupId};
use crate::util::lock::{rw_read, rw_write};

use super::error::InfraError;

const SOURCE: &str = "infra::memory";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterFile {
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub content: Vec<ContentRecord>,
}

impl RosterFile {
    pub fn parse(text: &str) -> Result<Self, InfraError> {
        toml::from_str(text).map_err(|err| InfraError::roster_parse(err.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, InfraError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

/// In-memory roster implementing the datastore and membership ports.
pub struct RosterStore {
    content: RwLock<BTreeMap<EntityId, ContentRecord>>,
    users: Vec<UserRecord>,
    groups: BTreeMap<GroupId, GroupRecord>,
}

impl RosterStore {
    /// Builds a store after checking the roster's references.
    pub fn from_file(file: RosterFile) -> Result<Self, DomainError> {
        let mut groups = BTreeMap::new();
        for group in file.groups {
            if groups.insert(group.id, group.clone()).is_some() {
                return Err(DomainError::invariant(format!(
                    "group {} declared twice",
                    group.id
                )));
            }
        }

        let mut usernames = HashSet::new();
        for user in &file.users {
            if !usernames.insert(user.username.as_str()) {
                return Err(DomainError::invariant(format!(
                    "user `{}` declared twice",
                    user.username
                )));
            }
            if let Some(missing) = user.groups.iter().find(|id| !groups.contains_key(*id)) {
                return Err(DomainError::invariant(format!(
                    "user `{}` belongs to unknown group {missing}",
                    user.username
                )));
            }
        }

        let mut content = BTreeMap::new();
        for record in file.content {
            record.validate()?;
            if let Some(group) = record.owning_group
                && !groups.contains_key(&group)
            {
                return Err(DomainError::invariant(format!(
                    "content {} is owned by unknown group {group}",
                    record.id
                )));
            }
            let id = record.id;
            if content.insert(id, record).is_some() {
                return Err(DomainError::invariant(format!(
                    "content {id} declared twice"
                )));
            }
        }

        if let Some(dangling) = content.values().find(|record| {
            record
                .linked_parent
                .is_some_and(|parent| !content.contains_key(&parent))
        }) {
            return Err(DomainError::not_found(dangling.linked_parent.unwrap_or(dangling.id)));
        }

        debug!(
            groups = groups.len(),
            users = file.users.len(),
            content = content.len(),
            "roster loaded"
        );

        Ok(Self {
            content: RwLock::new(content),
            users: file.users,
            groups,
        })
    }

    pub fn load(path: &Path) -> Result<Self, InfraError> {
        Ok(Self::from_file(RosterFile::load(path)?)?)
    }

    pub fn user(&self, username: &str) -> Result<&UserRecord, DomainError> {
        self.users
            .iter()
            .find(|user| user.username == username)
            .ok_or_else(|| DomainError::unknown_name("user", username))
    }

    pub fn group(&self, id: GroupId) -> Option<&GroupRecord> {
        self.groups.get(&id)
    }

    /// All content records ordered by id.
    pub fn content(&self) -> Vec<ContentRecord> {
        rw_read(&self.content, SOURCE, "content")
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ContentRepo for RosterStore {
    async fn find_by_id(&self, id: EntityId) -> Result<Option<ContentRecord>, RepoError> {
        Ok(rw_read(&self.content, SOURCE, "find_by_id").get(&id).cloned())
    }

    async fn find_live_artist_by_title(
        &self,
        title: &str,
    ) -> Result<Option<ContentRecord>, RepoError> {
        let wanted = title.to_lowercase();
        Ok(rw_read(&self.content, SOURCE, "find_live_artist_by_title")
            .values()
            .find(|record| {
                record.kind == ContentKind::Artist
                    && record.live
                    && record.title.to_lowercase() == wanted
            })
            .cloned())
    }

    async fn list_owned_by(&self, groups: &BTreeSet<GroupId>) -> Result<Vec<EntityId>, RepoError> {
        Ok(rw_read(&self.content, SOURCE, "list_owned_by")
            .values()
            .filter(|record| record.kind == ContentKind::Artist)
            .filter(|record| record.owning_group.is_some_and(|group| groups.contains(&group)))
            .map(|record| record.id)
            .collect())
    }

    async fn list_linked_to(&self, parents: &[EntityId]) -> Result<Vec<EntityId>, RepoError> {
        Ok(rw_read(&self.content, SOURCE, "list_linked_to")
            .values()
            .filter(|record| record.linked_parent.is_some_and(|parent| parents.contains(&parent)))
            .map(|record| record.id)
            .collect())
    }

    async fn count_upcoming_linked(&self, parent: EntityId) -> Result<u64, RepoError> {
        let count = rw_read(&self.content, SOURCE, "count_upcoming_linked")
            .values()
            .filter(|record| {
                record.linked_parent == Some(parent) && record.live && !record.archived
            })
            .count();
        Ok(count as u64)
    }

    async fn save(&self, record: ContentRecord) -> Result<ContentRecord, RepoError> {
        record.validate().map_err(|err| RepoError::InvalidInput {
            message: err.to_string(),
        })?;
        if let Some(group) = record.owning_group
            && !self.groups.contains_key(&group)
        {
            return Err(RepoError::InvalidInput {
                message: format!("unknown owning group {group}"),
            });
        }

        let mut content = rw_write(&self.content, SOURCE, "save");
        if let Some(parent) = record.linked_parent
            && !content.contains_key(&parent)
        {
            return Err(RepoError::NotFound);
        }
        content.insert(record.id, record.clone());
        Ok(record)
    }
}

#[async_trait]
impl GroupDirectory for RosterStore {
    async fn groups_owning(&self, kind: ContentKind) -> Result<BTreeSet<GroupId>, RepoError> {
        Ok(rw_read(&self.content, SOURCE, "groups_owning")
            .values()
            .filter(|record| record.kind == kind)
            .filter_map(|record| record.owning_group)
            .collect())
    }

    async fn members(&self, group: GroupId) -> Result<Vec<UserRecord>, RepoError> {
        Ok(self
            .users
            .iter()
            .filter(|user| user.is_member_of(group))
            .cloned()
            .collect())
    }
}
