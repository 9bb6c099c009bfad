#![recursion_limit = "256"]
//! # Main Entry Point
//!
//! Wires the layers together:
//! - Domain: Configuration, Types and Traits
//! - Infrastructure: Matrix, Reddit, Error Reporting
//! - Application: Feed Poller, Command Registry and Router, Logging
//! - Interface: Built-in Command Handlers
//!

mod application;
mod domain;
mod infrastructure;
mod interface;
mod strings;

use anyhow::{Context, Result};
use clap::Parser;
use matrix_sdk::{
    Client,
    config::SyncSettings,
    room::Room,
    ruma::events::room::{
        member::{MembershipState, StrippedRoomMemberEvent},
        message::{MessageType, SyncRoomMessageEvent},
    },
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::application::logging;
use crate::application::poller::{FeedPoller, PollerContext};
use crate::application::registry::CommandRegistry;
use crate::application::router::CommandRouter;
use crate::domain::config::AppConfig;
use crate::domain::paths;
use crate::domain::traits::ErrorReporter;
use crate::infrastructure::external_id::SharedExternalId;
use crate::infrastructure::matrix::{MatrixBroadcast, MatrixService};
use crate::infrastructure::reddit::RedditFeedSource;
use crate::infrastructure::reporting::{NullReporter, WebhookReporter};
use crate::strings::logs;

#[derive(Parser, Debug)]
#[command(name = "herald", version, about = "Matrix relay bot for subreddit sticky posts")]
struct Args {
    /// Path to the main configuration file
    #[arg(long, default_value = paths::DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load Configuration
    let config = AppConfig::load(&args.config).with_context(|| format!("Failed to load {}", args.config.display()))?;
    let data_dir = config.system.data_dir.clone();

    // 2. Logging Setup
    let _guard = logging::init(&data_dir)?;
    tracing::info!("{}", logs::STARTING);
    tracing::info!("{}", logs::config_loaded(&config.services.matrix.username));

    let reporter: Arc<dyn ErrorReporter> = match &config.reporting.webhook_url {
        Some(url) => Arc::new(WebhookReporter::new(url.as_str())?),
        None => Arc::new(NullReporter),
    };

    // 3. Matrix Setup
    let client = Client::builder()
        .homeserver_url(&config.services.matrix.homeserver)
        .build()
        .await?;

    client
        .matrix_auth()
        .login_username(&config.services.matrix.username, &config.services.matrix.password)
        .send()
        .await?;
    tracing::info!("{}", logs::LOGIN_SUCCESS);

    if let Some(name) = &config.services.matrix.display_name {
        tracing::info!("{}", logs::setting_display_name(name));
        if let Err(e) = client.account().set_display_name(Some(name.as_str())).await {
            tracing::warn!("{}", logs::set_display_name_fail(&e.to_string()));
        }
    }

    // 4. Sticky Poller
    let external = Arc::new(SharedExternalId::new());
    let sticky_path = paths::sticky_config_path(&data_dir);
    let poller = if sticky_path.exists() {
        let context = PollerContext::new(
            Arc::new(RedditFeedSource::new(&config.services.reddit)?),
            Arc::new(MatrixBroadcast::new(client.clone())),
            external.clone(),
            reporter.clone(),
        )?;
        let poller = Arc::new(FeedPoller::new(&sticky_path, paths::seen_items_path(&data_dir), context)?);
        if poller.config().await.enabled {
            poller.start().await?;
        } else {
            tracing::info!("{}", logs::POLLER_DISABLED);
        }
        Some(poller)
    } else {
        tracing::warn!("{}", logs::poller_config_missing(&sticky_path.display().to_string()));
        None
    };

    // 5. Commands
    let mut registry = CommandRegistry::new(reporter.clone());
    interface::commands::register_builtin(&mut registry, poller.clone())?;

    let own_user_id = client
        .user_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| config.services.matrix.username.clone());
    let start_time = SystemTime::now();
    let router = Arc::new(
        CommandRouter::new(config.clone(), Arc::new(registry), reporter.clone(), own_user_id)
            .with_start_time(start_time),
    );

    // 6. Event Handlers
    client.add_event_handler(move |ev: SyncRoomMessageEvent, room: Room| {
        let router = router.clone();
        async move {
            let Some(original_msg) = ev.as_original() else {
                return;
            };
            let MessageType::Text(text_content) = &original_msg.content.msgtype else {
                return;
            };
            let event_time = UNIX_EPOCH + Duration::from_millis(ev.origin_server_ts().get().into());
            let body = &text_content.body;
            tracing::debug!("Received message from {}: \n{}", original_msg.sender, body);

            let chat = MatrixService::new(room);
            router
                .route(&chat, body, original_msg.sender.as_str(), event_time)
                .await;
        }
    });

    client.add_event_handler(|ev: StrippedRoomMemberEvent, room: Room| async move {
        if ev.content.membership == MembershipState::Invite {
            tracing::info!("{}", logs::invite_received(room.room_id().as_str()));
            if let Err(e) = room.join().await {
                tracing::warn!("{}", logs::join_invite_fail(&e.to_string()));
            } else {
                tracing::info!("{}", logs::JOIN_INVITE_SUCCESS);
            }
        }
    });

    // 7. Sync until shutdown
    tracing::info!("{}", logs::SYNC_LOOP_START);
    let sync_client = client.clone();
    let mut sync_handle = tokio::spawn(async move { sync_client.sync(SyncSettings::default()).await });

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::error!("{}", logs::shutdown_fail(&e.to_string()));
            }
            tracing::info!("{}", logs::SHUTDOWN);
            sync_handle.abort();
        }
        result = &mut sync_handle => {
            match result {
                Ok(Err(e)) => tracing::error!("{}", logs::sync_loop_fail(&e.to_string())),
                Err(e) => tracing::error!("{}", logs::sync_loop_fail(&e.to_string())),
                Ok(Ok(())) => {}
            }
        }
    }

    if let Some(poller) = poller
        && poller.stop().await
    {
        tracing::info!("{}", logs::POLLER_STOPPED);
    }

    Ok(())
}
