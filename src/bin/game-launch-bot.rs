use std::sync::Arc;

use anyhow::Context;
use game_launch_bot::{
    bot::{build_tg_bot, BotContext, Command},
    configuration::{get_config, BotMode, Settings},
    logic::signer::WalletSigner,
    set_env,
    telemetry::init_tracing,
    web::Application,
};
use secrecy::ExposeSecret;
use teloxide::{
    payloads::SetWebhookSetters,
    prelude::*,
    update_listeners::{webhooks, Polling},
    utils::command::BotCommands,
};
use tokio::select;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    set_env()?;
    init_tracing();
    let settings = get_config().context("Config parsing error")?;

    info!("Starting game-launch-bot");
    let bot = Bot::new(settings.bot.token.expose_secret());
    let signer = WalletSigner::try_from(&settings.signer)?;
    info!(address = %signer.address(), "Signer loaded");

    let context = Arc::new(BotContext::from_settings(
        &settings,
        bot.clone(),
        Arc::new(signer),
    ));
    bot.set_my_commands(Command::bot_commands()).await?;

    match settings.bot.mode {
        BotMode::Polling => run_polling(&settings, bot, context.clone()).await?,
        BotMode::Webhook => run_webhook(&settings, bot, context.clone()).await?,
    }

    if let Some(reminders) = &context.reminders {
        reminders.stop_all().await;
    }
    info!("game-launch-bot shut down");
    Ok(())
}

async fn run_polling(
    settings: &Settings,
    bot: Bot,
    context: Arc<BotContext>,
) -> Result<(), anyhow::Error> {
    let server = Application::build(settings, None).await?;
    let listener = Polling::builder(bot.clone())
        .allowed_updates(settings.bot.allowed_updates())
        .delete_webhook()
        .await
        .build();
    let mut dispatcher = build_tg_bot(bot, context);

    info!("Bot running in polling mode");
    select! {
        _ = dispatcher.dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        ) => {
            info!("Bot exited")
        }
        result = server.serve_forever() => {
            info!("Server exited");
            result?;
        }
        _ = terminate() => {
            info!("Received terminate signal, shutting down")
        }
    };
    Ok(())
}

async fn run_webhook(
    settings: &Settings,
    bot: Bot,
    context: Arc<BotContext>,
) -> Result<(), anyhow::Error> {
    let url = settings
        .bot
        .webhook_url
        .clone()
        .context("Webhook mode requires BOT_WEBHOOK")?;
    let mut options = webhooks::Options::new(settings.app.socket_addr(), url.clone());
    if let Some(secret) = &settings.bot.webhook_secret {
        options = options.secret_token(secret.expose_secret().to_string());
    }
    let secret = options.get_or_gen_secret_token().to_string();
    let (listener, stop_flag, router) = webhooks::axum_no_setup(options);
    let server = Application::build(settings, Some(router)).await?;

    bot.set_webhook(url.clone())
        .allowed_updates(settings.bot.allowed_updates())
        .secret_token(secret)
        .await?;
    info!(%url, "Webhook was set");

    let mut dispatcher = build_tg_bot(bot, context);
    select! {
        _ = dispatcher.dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        ) => {
            info!("Bot exited")
        }
        result = server.serve_until(stop_flag) => {
            info!("Server exited");
            result?;
        }
        _ = terminate() => {
            info!("Received terminate signal, shutting down")
        }
    };
    Ok(())
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(err) => {
            tracing::warn!("Failed to install SIGTERM handler: {err}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
