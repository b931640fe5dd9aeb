use std::{process, sync::Arc};

use rostergate::{
    application::{
        access::{AccessFilter, AccessPolicy},
        email_routing::{BookingRouting, ManagerEmailResolver},
        error::AppError,
        repos::ContentRepo,
    },
    cache::{CacheConfig, MemoryCacheStore, ObjectCache},
    config::{self, ActionsArgs, CanEditArgs, EditableArgs, ManagerEmailArgs},
    domain::{error::DomainError, types::EntityId},
    infra::{memory::RosterStore, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let chain = error.chain();
    if dispatcher::has_been_set() {
        error!(error = %error, chain = ?chain, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, chain = ?chain, "application error");
    });
}

/// Services wired over one roster file.
struct Context {
    store: Arc<RosterStore>,
    access: AccessFilter,
    resolver: ManagerEmailResolver,
}

impl Context {
    fn build(settings: &config::Settings, roster: &std::path::Path) -> Result<Self, AppError> {
        let store = Arc::new(RosterStore::load(roster)?);
        info!(roster = %roster.display(), "roster loaded");

        let cache_config = CacheConfig::from(&settings.cache);
        let cache = ObjectCache::new(
            Arc::new(MemoryCacheStore::new(&cache_config)),
            cache_config,
        );
        let access = AccessFilter::new(
            store.clone(),
            store.clone(),
            AccessPolicy::from(&settings.access),
        );
        let resolver = ManagerEmailResolver::new(
            store.clone(),
            store.clone(),
            cache,
            BookingRouting::from(&settings.booking),
        );

        Ok(Self {
            store,
            access,
            resolver,
        })
    }
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    let context = Context::build(&settings, cli_args.command.roster().path())?;

    match cli_args.command {
        config::Command::CanEdit(args) => run_can_edit(&context, args).await,
        config::Command::Editable(args) => run_editable(&context, args).await,
        config::Command::ManagerEmail(args) => run_manager_email(&context, args).await,
        config::Command::Actions(args) => run_actions(&context, args),
    }
}

async fn run_can_edit(context: &Context, args: CanEditArgs) -> Result<(), AppError> {
    let actor = context.store.user(&args.actor)?;
    let id = EntityId(args.object);
    let object = context
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found(id))?;

    let allowed = context.access.can_edit(actor, &object).await;
    println!("{}", if allowed { "allowed" } else { "denied" });
    Ok(())
}

async fn run_editable(context: &Context, args: EditableArgs) -> Result<(), AppError> {
    let actor = context.store.user(&args.actor)?;
    let editable = context
        .access
        .filter_editable_set(actor, context.store.content())
        .await;

    for record in editable {
        println!("{}\t{}\t{}", record.id, record.kind, record.title);
    }
    Ok(())
}

async fn run_manager_email(context: &Context, args: ManagerEmailArgs) -> Result<(), AppError> {
    println!("{}", context.resolver.manager_email(&args.artist).await);
    Ok(())
}

fn run_actions(context: &Context, args: ActionsArgs) -> Result<(), AppError> {
    let actor = context.store.user(&args.actor)?;
    for action in context
        .access
        .trim_actions_for_non_elevated(args.actions, actor)
    {
        println!("{action}");
    }
    Ok(())
}
