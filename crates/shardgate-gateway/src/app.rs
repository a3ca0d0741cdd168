//! Application wiring for the `shardgate` binary
//!
//! Resolves the gateway over HTTP, registers the demo handler, and runs every shard
//! until Ctrl-C or a fatal termination.

use std::sync::Arc;

use shardgate_common::{AppConfig, AppError, AppResult};
use shardgate_core::Intents;
use tokio_util::sync::CancellationToken;

use crate::api::OpenApiClient;
use crate::events::MessageToCreate;
use crate::handlers::EventDispatcher;
use crate::session::{ResumeTrigger, SessionManager};

/// Run the client until `cancel` fires or a shard terminates fatally
pub async fn run(config: AppConfig, cancel: CancellationToken) -> AppResult<()> {
    let token = config.bot.token();
    token.validate()?;

    let api = OpenApiClient::new(&config.api.base_url, &token, config.api.timeout())
        .map_err(AppError::internal)?;

    let mut info = api
        .gateway_info()
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;
    if let Some(shard_count) = config.gateway.shard_count {
        tracing::info!(
            recommended = info.shard_count,
            configured = shard_count,
            "Overriding shard count"
        );
        info = info.with_shard_count(shard_count);
    }

    let dispatcher = Arc::new(EventDispatcher::new());
    let handler_intents = register_echo(&dispatcher, api);
    let intents = (config.bot.intents | handler_intents).or_default();

    let manager = SessionManager::from_config(Arc::clone(&dispatcher), &config.gateway)
        .with_cancellation(cancel.clone());
    listen_for_signals(cancel, manager.resume_trigger());

    manager.start(&info, token, intents).await?;
    Ok(())
}

/// Reply to every @-mention with the mention's text
///
/// Returns the intents the handler needs.
pub fn register_echo(dispatcher: &EventDispatcher, api: OpenApiClient) -> Intents {
    let api = Arc::new(api);
    dispatcher.on_at_message(move |_frame, message| {
        let api = Arc::clone(&api);
        async move {
            let reply = MessageToCreate::reply(message.plain_content(), &message);
            api.post_message(&message.channel_id, &reply).await?;
            Ok(())
        }
    })
}

/// Ctrl-C cancels; SIGUSR1 asks every connection to resume
fn listen_for_signals(cancel: CancellationToken, resume: ResumeTrigger) {
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = shutdown.cancelled() => {}
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    tracing::info!("Shutdown requested");
                    shutdown.cancel();
                }
                Err(e) => tracing::warn!(error = %e, "Cannot listen for Ctrl-C"),
            },
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};

        let mut requests = match signal(SignalKind::user_defined1()) {
            Ok(requests) => requests,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for SIGUSR1");
                return;
            }
        };
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                received = requests.recv() => match received {
                    Some(()) => resume.trigger(),
                    None => break,
                },
            }
        }
    });

    #[cfg(not(unix))]
    drop((cancel, resume));
}
