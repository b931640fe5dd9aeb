mod support;

use std::sync::Arc;
use std::time::Duration;

use rostergate::application::email_routing::{BookingRouting, ManagerEmailResolver};
use rostergate::cache::CacheConfig;
use support::{FlakyRepo, memory_cache, store};

const DESK: &str = "desk@example.com";

fn resolver(repo: Arc<FlakyRepo>, config: CacheConfig) -> ManagerEmailResolver {
    ManagerEmailResolver::new(
        repo.clone(),
        repo,
        memory_cache(config),
        BookingRouting {
            default_email: DESK.to_string(),
            lookup_ttl: Duration::from_secs(300),
        },
    )
}

#[tokio::test]
async fn routes_to_the_first_member_with_an_email() {
    let repo = Arc::new(FlakyRepo::healthy(store()));
    let resolver = resolver(repo, CacheConfig::default());

    assert_eq!(
        resolver.manager_email("The Night Owls").await,
        "gina@nightowls.example"
    );
    // Group 2 lists a member without an address first.
    assert_eq!(
        resolver.manager_email("brass lanterns").await,
        "hank@lanterns.example"
    );
}

#[tokio::test]
async fn dead_ends_fall_back_to_the_booking_desk() {
    let repo = Arc::new(FlakyRepo::healthy(store()));
    let resolver = resolver(repo.clone(), CacheConfig::default());

    assert_eq!(resolver.manager_email("Unknown Band").await, DESK);
    assert_eq!(resolver.manager_email("Solo Act").await, DESK);
    assert_eq!(resolver.manager_email("Retired Band").await, DESK);

    let calls = repo.calls();
    assert_eq!(resolver.manager_email("   ").await, DESK);
    assert_eq!(repo.calls(), calls, "blank names never reach the datastore");
}

#[tokio::test]
async fn lookups_are_cached_case_insensitively() {
    let repo = Arc::new(FlakyRepo::healthy(store()));
    let resolver = resolver(repo.clone(), CacheConfig::default());

    resolver.manager_email("The Night Owls").await;
    let calls = repo.calls();
    assert_eq!(
        resolver.manager_email("THE NIGHT OWLS").await,
        "gina@nightowls.example"
    );
    assert_eq!(repo.calls(), calls);
}

#[tokio::test]
async fn surrounding_whitespace_is_ignored() {
    let repo = Arc::new(FlakyRepo::healthy(store()));
    let resolver = resolver(repo.clone(), CacheConfig::default());

    assert_eq!(
        resolver.manager_email("  The Night Owls \n").await,
        "gina@nightowls.example"
    );
    let calls = repo.calls();
    assert_eq!(
        resolver.manager_email("the night owls").await,
        "gina@nightowls.example"
    );
    assert_eq!(repo.calls(), calls, "padded and plain names share one entry");
}

#[tokio::test]
async fn datastore_errors_are_not_cached() {
    let repo = Arc::new(FlakyRepo::failing(store()));
    let resolver = resolver(repo.clone(), CacheConfig::default());

    assert_eq!(resolver.manager_email("The Night Owls").await, DESK);
    let calls = repo.calls();
    assert_eq!(resolver.manager_email("The Night Owls").await, DESK);
    assert_eq!(repo.calls(), calls + 1, "failed lookup is retried");
}

#[tokio::test]
async fn disabled_cache_looks_up_every_time() {
    let repo = Arc::new(FlakyRepo::healthy(store()));
    let config = CacheConfig {
        enabled: false,
        ..CacheConfig::default()
    };
    let resolver = resolver(repo.clone(), config);

    resolver.manager_email("The Night Owls").await;
    let calls = repo.calls();
    resolver.manager_email("The Night Owls").await;
    assert!(repo.calls() > calls);
}
