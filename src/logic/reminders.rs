use std::{collections::HashMap, sync::Arc, time::Duration};

use rand::seq::SliceRandom;
use teloxide::types::ChatId;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use super::{login_link::LinkIssuer, message_senders::SendLink};

pub const REMINDER_MESSAGES: &[&str] = &[
    "🎮 Ready for your next gaming adventure?",
    "🌟 Discover amazing games waiting for you!",
    "🎯 Level up your gaming experience now!",
    "🎲 Time for some gaming fun!",
    "🏆 New challenges await you!",
    "🚀 Ready to jump back into action?",
    "🎪 Your gaming journey continues here!",
    "⭐ Find your next favorite game!",
    "🎭 Endless gaming possibilities await!",
    "🎨 Dive into new gaming worlds!",
];

pub fn random_reminder() -> &'static str {
    REMINDER_MESSAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(REMINDER_MESSAGES[0])
}

/// Periodically sends a freshly signed login link to subscribed chats.
pub struct ReminderScheduler {
    issuer: Arc<LinkIssuer>,
    sender: Arc<dyn SendLink>,
    interval: Duration,
    active: Mutex<HashMap<ChatId, JoinHandle<()>>>,
}

impl ReminderScheduler {
    pub fn new(issuer: Arc<LinkIssuer>, sender: Arc<dyn SendLink>, interval: Duration) -> Self {
        ReminderScheduler {
            issuer,
            sender,
            interval,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Starts reminders for `chat_id`, replacing any timer the chat already has.
    pub async fn start(&self, chat_id: ChatId, username: Option<String>) {
        let task = tokio::spawn(reminder_loop(
            self.issuer.clone(),
            self.sender.clone(),
            self.interval,
            chat_id,
            username,
        ));
        if let Some(previous) = self.active.lock().await.insert(chat_id, task) {
            previous.abort();
            debug!(%chat_id, "Replaced reminder timer");
        } else {
            info!(%chat_id, interval = ?self.interval, "Reminders started");
        }
    }

    /// Returns whether the chat had an active timer.
    pub async fn stop(&self, chat_id: ChatId) -> bool {
        match self.active.lock().await.remove(&chat_id) {
            Some(task) => {
                task.abort();
                info!(%chat_id, "Reminders stopped");
                true
            }
            None => false,
        }
    }

    pub async fn stop_all(&self) {
        let mut active = self.active.lock().await;
        let count = active.len();
        for (_, task) in active.drain() {
            task.abort();
        }
        info!(count, "All reminders stopped");
    }

    pub async fn is_active(&self, chat_id: ChatId) -> bool {
        self.active
            .lock()
            .await
            .get(&chat_id)
            .is_some_and(|task| !task.is_finished())
    }

    pub async fn active_chats(&self) -> Vec<ChatId> {
        self.active.lock().await.keys().copied().collect()
    }
}

async fn reminder_loop(
    issuer: Arc<LinkIssuer>,
    sender: Arc<dyn SendLink>,
    period: Duration,
    chat_id: ChatId,
    username: Option<String>,
) {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticks.tick().await;
        remind(&issuer, sender.as_ref(), chat_id, username.as_deref()).await;
    }
}

async fn remind(
    issuer: &LinkIssuer,
    sender: &dyn SendLink,
    chat_id: ChatId,
    username: Option<&str>,
) {
    let link = match issuer.issue(username).await {
        Ok(link) => link,
        Err(err) => {
            warn!(%chat_id, "Skipping reminder, failed to issue login link: {err}");
            return;
        }
    };
    if let Err(err) = sender.send_link(chat_id, random_reminder(), &link).await {
        warn!(%chat_id, "Failed to deliver reminder: {err}");
    }
}
