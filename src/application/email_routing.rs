//! Booking notification routing.
//!
//! A booking request names an artist by free text. The notification goes to the
//! first member with an email address in the group that manages that artist, or
//! to the shared booking desk when no such member exists.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::application::repos::{ContentRepo, GroupDirectory, RepoError};
use crate::cache::ObjectCache;

const LOOKUP_NAMESPACE: &str = "booking_manager_email";

#[derive(Debug, Clone)]
pub struct BookingRouting {
    pub default_email: String,
    pub lookup_ttl: Duration,
}

impl From<&crate::config::BookingSettings> for BookingRouting {
    fn from(settings: &crate::config::BookingSettings) -> Self {
        Self {
            default_email: settings.default_email.clone(),
            lookup_ttl: settings.lookup_ttl,
        }
    }
}

#[derive(Clone)]
pub struct ManagerEmailResolver {
    content: Arc<dyn ContentRepo>,
    groups: Arc<dyn GroupDirectory>,
    cache: ObjectCache,
    routing: BookingRouting,
}

impl ManagerEmailResolver {
    pub fn new(
        content: Arc<dyn ContentRepo>,
        groups: Arc<dyn GroupDirectory>,
        cache: ObjectCache,
        routing: BookingRouting,
    ) -> Self {
        Self {
            content,
            groups,
            cache,
            routing,
        }
    }

    pub fn default_email(&self) -> &str {
        &self.routing.default_email
    }

    /// Address that should receive booking requests for `artist_name`.
    ///
    /// The name is matched trimmed and case-insensitively, as typed into a form
    /// field. Never fails: every dead end falls back to the default booking
    /// address. Datastore failures are not cached.
    pub async fn manager_email(&self, artist_name: &str) -> String {
        let name = artist_name.trim();
        if name.is_empty() {
            debug!("empty artist name, using default booking address");
            return self.routing.default_email.clone();
        }

        let key = name.to_lowercase();
        let lookup = self
            .cache
            .try_get_or_compute_named(LOOKUP_NAMESPACE, &key, self.routing.lookup_ttl, || {
                self.lookup(name)
            })
            .await;

        match lookup {
            Ok(email) => email,
            Err(error) => {
                warn!(artist = name, error = %error, "manager email lookup failed");
                self.routing.default_email.clone()
            }
        }
    }

    async fn lookup(&self, name: &str) -> Result<String, RepoError> {
        let Some(artist) = self.content.find_live_artist_by_title(name).await? else {
            info!(artist = name, "no live artist found, using default booking address");
            return Ok(self.routing.default_email.clone());
        };

        let Some(group) = artist.owning_group else {
            info!(
                artist = name,
                id = %artist.id,
                "artist has no managing group, using default booking address"
            );
            return Ok(self.routing.default_email.clone());
        };

        let members = self.groups.members(group).await?;
        match members
            .into_iter()
            .map(|member| member.email)
            .find(|email| !email.trim().is_empty())
        {
            Some(email) => {
                debug!(artist = name, group = %group, email = %email, "manager email resolved");
                Ok(email)
            }
            None => {
                warn!(
                    artist = name,
                    group = %group,
                    "managing group has no member with an email"
                );
                Ok(self.routing.default_email.clone())
            }
        }
    }
}
