//! Ownership capability of content objects.
//!
//! A content object is either owned by a group directly, owned through a single
//! link to another object, or outside the ownership scheme altogether.

use std::future::Future;

use super::types::{EntityId, GroupId};

/// Maximum number of links followed when resolving an owning group.
pub const MAX_OWNERSHIP_HOPS: usize = 1;

/// How a content object declares its owning group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Owned by the given group. `None` means staff-only.
    Direct(Option<GroupId>),
    /// Owned by whatever owns the linked parent object, if any.
    Linked(Option<EntityId>),
    /// Not part of any ownership scheme.
    Unscoped,
}

/// Implemented by every content type that participates in band-scoped editing.
pub trait Ownable {
    fn ownership(&self) -> Ownership;
}

/// Outcome of walking an ownership chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedOwner {
    /// An owning group was found.
    Group(GroupId),
    /// The chain ended without an owning group (null reference, missing parent,
    /// or a chain longer than the hop bound).
    Unresolvable,
    /// The object does not participate in ownership.
    Unscoped,
}

/// Walks at most `max_hops` links from `start`, asking `parent` for each linked object.
///
/// `parent` yields the ownership of the object with the given id, or `None` when it
/// does not exist or cannot be read.
pub async fn resolve_owner<F, Fut>(
    start: Ownership,
    max_hops: usize,
    mut parent: F,
) -> ResolvedOwner
where
    F: FnMut(EntityId) -> Fut,
    Fut: Future<Output = Option<Ownership>>,
{
    let mut current = start;
    let mut hops = 0;
    loop {
        match current {
            Ownership::Direct(Some(group)) => return ResolvedOwner::Group(group),
            Ownership::Direct(None) | Ownership::Linked(None) => {
                return ResolvedOwner::Unresolvable;
            }
            Ownership::Unscoped if hops == 0 => return ResolvedOwner::Unscoped,
            Ownership::Unscoped => return ResolvedOwner::Unresolvable,
            Ownership::Linked(Some(parent_id)) => {
                if hops == max_hops {
                    return ResolvedOwner::Unresolvable;
                }
                hops += 1;
                match parent(parent_id).await {
                    Some(next) => current = next,
                    None => return ResolvedOwner::Unresolvable,
                }
            }
        }
    }
}
