//! Domain entities mirrored from the content datastore.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::ownership::{Ownable, Ownership};
use super::types::{ContentKind, EntityId, EntityRef, GroupId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: EntityId,
    pub kind: ContentKind,
    pub title: String,
    #[serde(default = "default_live")]
    pub live: bool,
    #[serde(default)]
    pub archived: bool,
    /// Set on artists only; `None` means staff-only.
    #[serde(default)]
    pub owning_group: Option<GroupId>,
    /// Set on events only; the artist the event belongs to.
    #[serde(default)]
    pub linked_parent: Option<EntityId>,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub child_count: u32,
}

fn default_live() -> bool {
    true
}

impl ContentRecord {
    pub fn entity(&self) -> EntityRef {
        EntityRef::new(self.kind, self.id)
    }

    /// Checks the shape constraints each kind imposes on ownership fields.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.0 <= 0 {
            return Err(DomainError::validation(format!(
                "content id must be positive, got {}",
                self.id
            )));
        }
        if self.title.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "content {} has an empty title",
                self.id
            )));
        }
        if self.kind != ContentKind::Artist && self.owning_group.is_some() {
            return Err(DomainError::invariant(format!(
                "{} {} cannot carry an owning group",
                self.kind.display_name(),
                self.id
            )));
        }
        if self.kind != ContentKind::Event && self.linked_parent.is_some() {
            return Err(DomainError::invariant(format!(
                "{} {} cannot link to a parent artist",
                self.kind.display_name(),
                self.id
            )));
        }
        if self.linked_parent == Some(self.id) {
            return Err(DomainError::invariant(format!(
                "content {} links to itself",
                self.id
            )));
        }
        Ok(())
    }
}

impl Ownable for ContentRecord {
    fn ownership(&self) -> Ownership {
        match self.kind {
            ContentKind::Artist => Ownership::Direct(self.owning_group),
            ContentKind::Event => Ownership::Linked(self.linked_parent),
            ContentKind::Listing | ContentKind::Page => Ownership::Unscoped,
        }
    }
}

/// A person acting on the admin side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// Staff or superuser.
    #[serde(default)]
    pub elevated: bool,
    #[serde(default)]
    pub groups: BTreeSet<GroupId>,
}

impl UserRecord {
    pub fn is_member_of(&self, group: GroupId) -> bool {
        self.groups.contains(&group)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: GroupId,
    pub name: String,
}
