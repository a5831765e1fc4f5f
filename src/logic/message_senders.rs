use async_trait::async_trait;
use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo},
    Bot,
};
use thiserror::Error;

use super::login_link::SignedLink;

pub const PLAY_BUTTON: &str = "Play 🎮";

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    #[error("Login link is not a valid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Delivers a text with a button that opens the login link.
#[async_trait]
pub trait SendLink: Send + Sync {
    async fn send_link(
        &self,
        chat_id: ChatId,
        text: &str,
        link: &SignedLink,
    ) -> Result<(), DeliveryError>;

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), DeliveryError>;
}

pub struct TgMessages {
    bot: Bot,
}

impl TgMessages {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

pub fn play_keyboard(link: &SignedLink) -> Result<InlineKeyboardMarkup, url::ParseError> {
    let url = link.url.parse()?;
    Ok(InlineKeyboardMarkup::new([[InlineKeyboardButton::web_app(
        PLAY_BUTTON,
        WebAppInfo { url },
    )]]))
}

#[async_trait]
impl SendLink for TgMessages {
    async fn send_link(
        &self,
        chat_id: ChatId,
        text: &str,
        link: &SignedLink,
    ) -> Result<(), DeliveryError> {
        self.bot
            .send_message(chat_id, text)
            .reply_markup(play_keyboard(link)?)
            .await?;
        Ok(())
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), DeliveryError> {
        self.bot.send_message(chat_id, text).await?;
        Ok(())
    }
}
