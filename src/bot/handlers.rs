use std::{error::Error, sync::Arc};

use teloxide::{
    dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler},
    dptree,
    types::{ChatMemberKind, ChatMemberUpdated, Message, Update},
};

use super::{BotContext, Command};

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

pub fn build_handler() -> UpdateHandler<Box<dyn Error + Send + Sync>> {
    let commands_handler = dptree::entry()
        .filter_command::<Command>()
        .branch(dptree::case![Command::Start].endpoint(handle_start_command))
        .branch(dptree::case![Command::Stop].endpoint(handle_stop_command));

    let messages_handler = Update::filter_message()
        .filter(|msg: Message| msg.chat.is_private())
        .inspect_async(greet_first_visit)
        .branch(commands_handler);

    let membership_handler = Update::filter_my_chat_member().endpoint(handle_membership);

    dptree::entry()
        .branch(messages_handler)
        .branch(membership_handler)
}

async fn greet_first_visit(msg: Message, context: Arc<BotContext>) {
    context.greet(msg.chat.id).await;
}

async fn handle_start_command(msg: Message, context: Arc<BotContext>) -> HandlerResult {
    let username = msg.from.as_ref().and_then(|user| user.username.clone());
    tracing::debug!(
        "Handling start command. chat_id={} from={:?}",
        msg.chat.id,
        msg.from.as_ref().map(|f| f.id)
    );
    context.start(msg.chat.id, username).await;
    Ok(())
}

async fn handle_stop_command(msg: Message, context: Arc<BotContext>) -> HandlerResult {
    tracing::debug!("Handling stop command. chat_id={}", msg.chat.id);
    context.stop(msg.chat.id).await;
    Ok(())
}

async fn handle_membership(update: ChatMemberUpdated, context: Arc<BotContext>) -> HandlerResult {
    if matches!(
        update.new_chat_member.kind,
        ChatMemberKind::Left | ChatMemberKind::Banned(_)
    ) {
        tracing::info!(chat_id = %update.chat.id, "Bot removed from chat");
        context.leave(update.chat.id).await;
    }
    Ok(())
}
