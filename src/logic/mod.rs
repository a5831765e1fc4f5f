pub mod login_link;
pub mod message_senders;
pub mod reminders;
pub mod signer;
pub mod welcome;
