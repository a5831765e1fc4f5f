use serde_json::{json, Value};
use teloxide::types::{Me, Update};

pub const BOT_ID: i64 = 1_000_001;

fn bot_user() -> Value {
    json!({
        "id": BOT_ID,
        "is_bot": true,
        "first_name": "Game Launcher",
        "username": "game_launch_bot"
    })
}

fn alice(chat_id: i64) -> Value {
    json!({
        "id": chat_id,
        "is_bot": false,
        "first_name": "Alice",
        "username": "alice"
    })
}

pub fn bot_me() -> Me {
    let mut me = bot_user();
    me["can_join_groups"] = json!(true);
    me["can_read_all_group_messages"] = json!(false);
    me["supports_inline_queries"] = json!(false);
    me["can_connect_to_business"] = json!(false);
    me["has_main_web_app"] = json!(false);
    serde_json::from_value(me).unwrap()
}

fn message_json(update_id: i32, chat: Value, from: Value, text: &str) -> Value {
    let mut message = json!({
        "message_id": update_id,
        "date": 1_700_000_000,
        "chat": chat,
        "from": from,
        "text": text
    });
    if text.starts_with('/') {
        let len = text.split_whitespace().next().map_or(0, str::len);
        message["entities"] = json!([{ "type": "bot_command", "offset": 0, "length": len }]);
    }
    json!({ "update_id": update_id, "message": message })
}

pub fn private_message_json(chat_id: i64, text: &str) -> Value {
    let chat = json!({
        "id": chat_id,
        "type": "private",
        "first_name": "Alice",
        "username": "alice"
    });
    message_json(1, chat, alice(chat_id), text)
}

pub fn private_message(chat_id: i64, text: &str) -> Update {
    serde_json::from_str(&private_message_json(chat_id, text).to_string()).unwrap()
}

pub fn group_message(chat_id: i64, text: &str) -> Update {
    let chat = json!({ "id": chat_id, "type": "group", "title": "Gamers" });
    serde_json::from_str(&message_json(2, chat, alice(42), text).to_string()).unwrap()
}

/// The bot's own membership in a private chat changed to `status`.
pub fn bot_membership(chat_id: i64, status: &str) -> Update {
    let mut new_member = json!({ "user": bot_user(), "status": status });
    if status == "kicked" {
        new_member["until_date"] = json!(0);
    }
    serde_json::from_str(&json!({
        "update_id": 3,
        "my_chat_member": {
            "chat": { "id": chat_id, "type": "private", "first_name": "Alice" },
            "from": alice(chat_id),
            "date": 1_700_000_000,
            "old_chat_member": { "user": bot_user(), "status": "member" },
            "new_chat_member": new_member
        }
    })
    .to_string())
    .unwrap()
}
