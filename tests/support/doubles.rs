use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_cell::sync::AsyncCell;
use async_trait::async_trait;
use game_launch_bot::logic::{
    login_link::SignedLink,
    message_senders::{play_keyboard, DeliveryError, SendLink},
    signer::{MessageSigner, SigningError},
};
use teloxide::{types::ChatId, ApiError, RequestError};

#[derive(Debug, Clone)]
pub struct Delivery {
    pub chat_id: ChatId,
    pub text: String,
    pub link: Option<SignedLink>,
}

pub struct RecordingSender {
    pub sent: Arc<AsyncCell<Vec<Delivery>>>,
}

impl RecordingSender {
    pub fn new() -> Arc<Self> {
        let sent = AsyncCell::<Vec<Delivery>>::new().into_shared();
        sent.set(Vec::new());
        Arc::new(Self { sent })
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        let sent = self.sent.try_take().unwrap_or_default();
        self.sent.set(sent.clone());
        sent
    }

    async fn record(&self, delivery: Delivery) {
        let mut sent = self.sent.take().await;
        sent.push(delivery);
        self.sent.set(sent);
    }
}

#[async_trait]
impl SendLink for RecordingSender {
    async fn send_link(
        &self,
        chat_id: ChatId,
        text: &str,
        link: &SignedLink,
    ) -> Result<(), DeliveryError> {
        // Telegram rejects keyboards whose Web App url does not parse.
        play_keyboard(link)?;
        self.record(Delivery {
            chat_id,
            text: text.to_string(),
            link: Some(link.clone()),
        })
        .await;
        Ok(())
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), DeliveryError> {
        self.record(Delivery {
            chat_id,
            text: text.to_string(),
            link: None,
        })
        .await;
        Ok(())
    }
}

/// Behaves like a chat that blocked the bot.
#[derive(Default)]
pub struct BlockedSender {
    pub attempts: AtomicUsize,
}

impl BlockedSender {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn blocked(&self) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(DeliveryError::Request(RequestError::Api(
            ApiError::BotBlocked,
        )))
    }
}

#[async_trait]
impl SendLink for BlockedSender {
    async fn send_link(&self, _: ChatId, _: &str, _: &SignedLink) -> Result<(), DeliveryError> {
        self.blocked()
    }

    async fn send_text(&self, _: ChatId, _: &str) -> Result<(), DeliveryError> {
        self.blocked()
    }
}

#[derive(Default)]
pub struct FailingSigner {
    pub calls: AtomicUsize,
}

impl FailingSigner {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageSigner for FailingSigner {
    async fn sign(&self, _message: &[u8]) -> Result<String, SigningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SigningError::Unavailable("key unavailable".into()))
    }
}
