pub mod handlers;

use self::handlers::build_handler;
use crate::{
    configuration::Settings,
    logic::{
        login_link::LinkIssuer,
        message_senders::{DeliveryError, SendLink, TgMessages},
        reminders::ReminderScheduler,
        signer::MessageSigner,
        welcome::WelcomeGate,
    },
};
use std::{error::Error, sync::Arc};
use teloxide::{
    dispatching::{DefaultKey, Dispatcher},
    macros::BotCommands,
    prelude::*,
    types::ChatId,
    Bot,
};
use tracing::{error, warn};

pub const LAUNCH_TEXT: &str = "🎮 Discover Your Next Favorite Game & start playing 👇";
pub const LINK_FAILED_TEXT: &str =
    "😔 Something went wrong while preparing your game link. Please try /start again later.";
pub const REMINDERS_STOPPED_TEXT: &str = "🔕 Reminders are off. Send /start to turn them back on.";
pub const NO_REMINDERS_TEXT: &str = "There are no active reminders for this chat.";

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "Get a link to launch the game")]
    Start,
    #[command(description = "Stop game reminders")]
    Stop,
}

pub struct Welcome {
    pub gate: WelcomeGate,
    pub text: String,
}

pub struct BotContext {
    pub issuer: Arc<LinkIssuer>,
    pub sender: Arc<dyn SendLink>,
    pub reminders: Option<Arc<ReminderScheduler>>,
    pub welcome: Option<Welcome>,
}

impl BotContext {
    pub fn new(
        issuer: Arc<LinkIssuer>,
        sender: Arc<dyn SendLink>,
        reminders: Option<Arc<ReminderScheduler>>,
        welcome_text: Option<String>,
    ) -> Self {
        BotContext {
            issuer,
            sender,
            reminders,
            welcome: welcome_text.map(|text| Welcome {
                gate: WelcomeGate::new(),
                text,
            }),
        }
    }

    pub fn from_settings(settings: &Settings, bot: Bot, signer: Arc<dyn MessageSigner>) -> Self {
        let issuer = Arc::new(LinkIssuer::new(
            signer,
            settings.link.frontend_origin.as_str(),
            settings.link.ttl(),
        ));
        let sender: Arc<dyn SendLink> = Arc::new(TgMessages::new(bot));
        let reminders = settings.reminders.interval().map(|interval| {
            Arc::new(ReminderScheduler::new(
                issuer.clone(),
                sender.clone(),
                interval,
            ))
        });
        Self::new(issuer, sender, reminders, settings.bot.welcome_message.clone())
    }

    /// Sends the welcome text if this is the chat's first interaction.
    pub async fn greet(&self, chat_id: ChatId) {
        let Some(welcome) = &self.welcome else {
            return;
        };
        if welcome.gate.first_visit(chat_id).await {
            log_delivery(chat_id, self.sender.send_text(chat_id, &welcome.text).await);
        }
    }

    /// Replies with a fresh login link and subscribes the chat to reminders.
    pub async fn start(&self, chat_id: ChatId, username: Option<String>) {
        let link = match self.issuer.issue(username.as_deref()).await {
            Ok(link) => link,
            Err(err) => {
                error!(%chat_id, "Failed to issue login link: {err}");
                log_delivery(chat_id, self.sender.send_text(chat_id, LINK_FAILED_TEXT).await);
                return;
            }
        };
        match self.sender.send_link(chat_id, LAUNCH_TEXT, &link).await {
            Err(DeliveryError::InvalidUrl(err)) => {
                error!(%chat_id, url = %link.url, "Login link is unusable: {err}");
                log_delivery(chat_id, self.sender.send_text(chat_id, LINK_FAILED_TEXT).await);
                return;
            }
            result => log_delivery(chat_id, result),
        }

        if let Some(reminders) = &self.reminders {
            reminders.start(chat_id, username).await;
        }
    }

    pub async fn stop(&self, chat_id: ChatId) {
        let stopped = match &self.reminders {
            Some(reminders) => reminders.stop(chat_id).await,
            None => false,
        };
        let text = if stopped {
            REMINDERS_STOPPED_TEXT
        } else {
            NO_REMINDERS_TEXT
        };
        log_delivery(chat_id, self.sender.send_text(chat_id, text).await);
    }

    /// The bot can no longer write to the chat.
    pub async fn leave(&self, chat_id: ChatId) {
        if let Some(reminders) = &self.reminders {
            reminders.stop(chat_id).await;
        }
    }
}

fn log_delivery(chat_id: ChatId, result: Result<(), DeliveryError>) {
    if let Err(err) = result {
        warn!(%chat_id, "Failed to deliver message: {err}");
    }
}

pub fn build_tg_bot(
    bot: Bot,
    context: Arc<BotContext>,
) -> Dispatcher<Bot, Box<dyn Error + Send + Sync>, DefaultKey> {
    Dispatcher::builder(bot, build_handler())
        .dependencies(dptree::deps![context])
        .default_handler(|upd| async move {
            tracing::debug!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build()
}
