//! Band-scoped edit permissions.
//!
//! Staff and superusers may edit anything. Everyone else may edit an object only
//! when they belong to its owning group, which is read from the object itself or
//! from the one object it links to. Every admin entry point (edit and create
//! guards, action menus, listing buttons, tree explorer) goes through this filter.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::repos::{ContentRepo, GroupDirectory, RepoError};
use crate::domain::entities::{ContentRecord, UserRecord};
use crate::domain::error::DomainError;
use crate::domain::ownership::{
    MAX_OWNERSHIP_HOPS, Ownable, Ownership, ResolvedOwner, resolve_owner,
};
use crate::domain::types::{ContentKind, EntityId, GroupId};

const EDIT_DENIED: &str =
    "You do not have permission to edit this content. Contact the staff for access.";
const CREATE_DENIED: &str = "Only staff can create new content of this kind.";
const REASSIGN_DENIED: &str = "Only staff can change which group owns this content.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("permission denied: {reason}")]
    PermissionDenied { reason: String },
}

impl AccessError {
    pub fn denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
        }
    }
}

/// Decision for objects that take part in no ownership scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnscopedPolicy {
    #[default]
    Deny,
    Allow,
}

impl FromStr for UnscopedPolicy {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "deny" => Ok(Self::Deny),
            "allow" => Ok(Self::Allow),
            other => Err(DomainError::unknown_name("unscoped policy", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    pub unscoped: UnscopedPolicy,
    /// Kinds only elevated actors may create.
    pub restricted_creation: BTreeSet<ContentKind>,
    /// Actions hidden from non-elevated actors.
    pub hidden_actions: BTreeSet<String>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            unscoped: UnscopedPolicy::Deny,
            restricted_creation: BTreeSet::from([ContentKind::Artist]),
            hidden_actions: ["publish", "unpublish"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl From<&crate::config::AccessSettings> for AccessPolicy {
    fn from(settings: &crate::config::AccessSettings) -> Self {
        Self {
            unscoped: settings.unscoped_policy,
            restricted_creation: settings.restricted_creation.clone(),
            hidden_actions: settings.hidden_actions.clone(),
        }
    }
}

/// Anything presented in an action menu or a listing row.
pub trait NamedAction {
    fn action_name(&self) -> &str;
}

impl NamedAction for String {
    fn action_name(&self) -> &str {
        self
    }
}

impl NamedAction for &str {
    fn action_name(&self) -> &str {
        self
    }
}

#[derive(Clone)]
pub struct AccessFilter {
    content: Arc<dyn ContentRepo>,
    groups: Arc<dyn GroupDirectory>,
    policy: AccessPolicy,
}

impl AccessFilter {
    pub fn new(
        content: Arc<dyn ContentRepo>,
        groups: Arc<dyn GroupDirectory>,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            content,
            groups,
            policy,
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Whether `actor` may edit `object`.
    pub async fn can_edit<O>(&self, actor: &UserRecord, object: &O) -> bool
    where
        O: Ownable + ?Sized,
    {
        if actor.elevated {
            return true;
        }

        let allowed = match self.resolve(object.ownership()).await {
            ResolvedOwner::Group(group) => actor.is_member_of(group),
            ResolvedOwner::Unresolvable => false,
            ResolvedOwner::Unscoped => self.policy.unscoped == UnscopedPolicy::Allow,
        };
        debug!(actor = %actor.username, allowed, "edit permission evaluated");
        allowed
    }

    /// Keeps the objects `actor` may edit, in their original order.
    pub async fn filter_editable_set<O: Ownable>(
        &self,
        actor: &UserRecord,
        objects: Vec<O>,
    ) -> Vec<O> {
        if actor.elevated {
            return objects;
        }
        if actor.groups.is_empty() {
            return Vec::new();
        }

        let mut editable = Vec::with_capacity(objects.len());
        for object in objects {
            if self.can_edit(actor, &object).await {
                editable.push(object);
            }
        }
        editable
    }

    /// Refuses a write to `object` unless `actor` may edit it.
    pub async fn guard_mutation(
        &self,
        actor: &UserRecord,
        object: &ContentRecord,
    ) -> Result<(), AccessError> {
        if self.can_edit(actor, object).await {
            return Ok(());
        }
        info!(
            actor = %actor.username,
            object = %object.entity(),
            "edit denied"
        );
        Err(AccessError::denied(EDIT_DENIED))
    }

    /// Refuses creation of restricted kinds to non-elevated actors, whatever groups
    /// they belong to.
    pub fn guard_creation(&self, actor: &UserRecord, kind: ContentKind) -> Result<(), AccessError> {
        if actor.elevated || !self.policy.restricted_creation.contains(&kind) {
            return Ok(());
        }
        info!(actor = %actor.username, kind = %kind, "creation denied");
        Err(AccessError::denied(CREATE_DENIED))
    }

    /// Refuses a change of owning group to non-elevated actors. `current` is the
    /// stored owner, `None` for objects not yet saved.
    pub fn guard_owner_assignment(
        &self,
        actor: &UserRecord,
        current: Option<GroupId>,
        incoming: &ContentRecord,
    ) -> Result<(), AccessError> {
        if actor.elevated || incoming.owning_group == current {
            return Ok(());
        }
        info!(
            actor = %actor.username,
            object = %incoming.entity(),
            "owner change denied"
        );
        Err(AccessError::denied(REASSIGN_DENIED))
    }

    /// Drops publishing actions from menus shown to non-elevated actors.
    pub fn trim_actions_for_non_elevated<A: NamedAction>(
        &self,
        actions: Vec<A>,
        actor: &UserRecord,
    ) -> Vec<A> {
        if actor.elevated {
            return actions;
        }
        actions
            .into_iter()
            .filter(|action| !self.policy.hidden_actions.contains(action.action_name()))
            .collect()
    }

    /// Removes every listing button of a row the actor cannot edit.
    pub async fn trim_listing_buttons<B>(
        &self,
        buttons: Vec<B>,
        object: &ContentRecord,
        actor: &UserRecord,
    ) -> Vec<B> {
        if actor.elevated || self.can_edit(actor, object).await {
            buttons
        } else {
            Vec::new()
        }
    }

    /// Actor groups that own at least one artist.
    pub async fn managing_groups(&self, actor: &UserRecord) -> BTreeSet<GroupId> {
        if actor.groups.is_empty() {
            return BTreeSet::new();
        }
        match self.groups.groups_owning(ContentKind::Artist).await {
            Ok(owning) => actor.groups.intersection(&owning).copied().collect(),
            Err(error) => {
                warn!(actor = %actor.username, error = %error, "group lookup failed");
                BTreeSet::new()
            }
        }
    }

    /// Narrows the children of `parent` shown in the tree explorer.
    ///
    /// Non-elevated actors see the artists their groups manage, the events linked to
    /// those artists, and any node at most one level below `parent` that has children
    /// of its own.
    pub async fn filter_explorer(
        &self,
        actor: &UserRecord,
        parent: &ContentRecord,
        mut nodes: Vec<ContentRecord>,
    ) -> Vec<ContentRecord> {
        if actor.elevated {
            return nodes;
        }

        let managing = self.managing_groups(actor).await;
        if managing.is_empty() {
            return Vec::new();
        }

        let visible = match self.visible_ids(&managing).await {
            Ok(ids) => ids,
            Err(error) => {
                warn!(actor = %actor.username, error = %error, "explorer lookup failed");
                return Vec::new();
            }
        };

        let max_depth = parent.depth + 1;
        nodes.retain(|node| {
            visible.contains(&node.id) || (node.depth <= max_depth && node.child_count > 0)
        });
        nodes
    }

    async fn visible_ids(
        &self,
        managing: &BTreeSet<GroupId>,
    ) -> Result<BTreeSet<EntityId>, RepoError> {
        let artists = self.content.list_owned_by(managing).await?;
        let events = self.content.list_linked_to(&artists).await?;
        Ok(artists.into_iter().chain(events).collect())
    }

    async fn resolve(&self, start: Ownership) -> ResolvedOwner {
        let content = &self.content;
        resolve_owner(start, MAX_OWNERSHIP_HOPS, move |id| async move {
            match content.find_by_id(id).await {
                Ok(record) => record.map(|record| record.ownership()),
                Err(error) => {
                    warn!(parent = %id, error = %error, "ownership lookup failed");
                    None
                }
            }
        })
        .await
    }
}
