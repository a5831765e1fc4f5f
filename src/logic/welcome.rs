use std::collections::HashSet;

use teloxide::types::ChatId;
use tokio::sync::RwLock;

/// Remembers which chats already received the welcome message.
#[derive(Default)]
pub struct WelcomeGate {
    welcomed: RwLock<HashSet<ChatId>>,
}

impl WelcomeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the chat as welcomed, returning `true` only the first time.
    pub async fn first_visit(&self, chat_id: ChatId) -> bool {
        if self.welcomed.read().await.contains(&chat_id) {
            return false;
        }
        self.welcomed.write().await.insert(chat_id)
    }
}
