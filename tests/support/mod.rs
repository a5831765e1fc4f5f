pub mod app;
pub mod doubles;
pub mod updates;

use std::{sync::Arc, time::Duration};

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use doubles::RecordingSender;
use game_launch_bot::{
    bot::BotContext,
    configuration::{build_settings, Settings},
    logic::{login_link::LinkIssuer, reminders::ReminderScheduler, signer::WalletSigner},
};

pub const ORIGIN: &str = "https://game.example";
pub const WEBHOOK_URL: &str = "https://bot.example/hook";
pub const WEBHOOK_SECRET: &str = "test_webhook-secret";

pub fn setup_settings() -> Settings {
    setup_settings_with(&[])
}

pub fn setup_webhook_settings() -> Settings {
    setup_settings_with(&[
        ("BOT_MODE", "webhook"),
        ("BOT_WEBHOOK", WEBHOOK_URL),
        ("BOT_WEBHOOK_SECRET", WEBHOOK_SECRET),
    ])
}

pub fn setup_settings_with(extra: &[(&str, &str)]) -> Settings {
    let base = [
        ("BOT_TOKEN", "123456:test-token"),
        (
            "ADMIN_SECRET_KEY",
            "0x1111111111111111111111111111111111111111111111111111111111111111",
        ),
        ("THIRDWEB_CLIENT_ID", "test-client"),
        ("FRONTEND_APP_ORIGIN", ORIGIN),
        ("APP_HOST", "127.0.0.1"),
        // Use a random OS port
        ("PORT", "0"),
    ];
    let vars = base
        .iter()
        .chain(extra)
        .map(|(k, v)| (k.to_string(), v.to_string()));
    build_settings(config::Config::builder(), vars).expect("Failed to build settings")
}

pub fn wallet_signer() -> (Arc<WalletSigner>, Address) {
    let signer = WalletSigner::new(PrivateKeySigner::random(), "test-client");
    let address = signer.address();
    (Arc::new(signer), address)
}

pub fn create_issuer(ttl: Option<Duration>) -> (LinkIssuer, Address) {
    let (signer, address) = wallet_signer();
    (LinkIssuer::new(signer, ORIGIN, ttl), address)
}

pub fn create_context(
    issuer: LinkIssuer,
    with_reminders: bool,
    welcome: Option<&str>,
) -> (BotContext, Arc<RecordingSender>) {
    let issuer = Arc::new(issuer);
    let sender = RecordingSender::new();
    let reminders = with_reminders.then(|| {
        Arc::new(ReminderScheduler::new(
            issuer.clone(),
            sender.clone(),
            Duration::from_secs(100),
        ))
    });
    let context = BotContext::new(issuer, sender.clone(), reminders, welcome.map(String::from));
    (context, sender)
}
