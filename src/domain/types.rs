//! Shared domain identifiers and enumerations.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Primary key of a content object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Primary key of an editor group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub i64);

impl Display for GroupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of content object stored in the page tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// A band or artist profile; carries its own owning group.
    Artist,
    /// A calendar event; owned through the artist it links to.
    Event,
    /// An index page grouping artists or events.
    Listing,
    /// Any other page (home, about, legal).
    Page,
}

impl ContentKind {
    /// Returns the slug used in cache keys and roster files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Event => "event",
            Self::Listing => "listing",
            Self::Page => "page",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Artist => "Artist",
            Self::Event => "Event",
            Self::Listing => "Listing",
            Self::Page => "Page",
        }
    }

    pub fn all() -> &'static [ContentKind] {
        &[Self::Artist, Self::Event, Self::Listing, Self::Page]
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "artist" => Ok(Self::Artist),
            "event" => Ok(Self::Event),
            "listing" => Ok(Self::Listing),
            "page" => Ok(Self::Page),
            other => Err(DomainError::unknown_name("content kind", other)),
        }
    }
}

/// Identity of a content object across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: ContentKind,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(kind: ContentKind, id: EntityId) -> Self {
        Self { kind, id }
    }
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
