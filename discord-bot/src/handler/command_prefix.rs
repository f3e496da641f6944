use super::{react, reply};
use serenity::{client::Context, model::channel::Message};

/// Discord caps nicknames at 32 characters.
const NICKNAME_LIMIT: usize = 32;

fn nickname(prefix: &str) -> String {
    ["Zardoz Bot", "Zardoz"]
        .iter()
        .map(|name| format!("[{}] {}", prefix, name))
        .chain(std::iter::once(format!("[{}]", prefix)))
        .find(|nickname| nickname.chars().count() <= NICKNAME_LIMIT)
        .unwrap_or_else(|| "Zardoz".to_string())
}

pub(crate) async fn set_command_prefix(context: &Context, message: &Message, prefix: String) {
    react(context, message, '✅').await;
    if let Some(guild) = message.guild_id {
        let nickname = nickname(&prefix);
        if let Err(err) = guild.edit_nickname(context, Some(nickname.as_str())).await {
            log::warn!("Unable to change nickname in {}: {}", guild, err);
        }
    }
}

pub(crate) async fn get_command_prefix(context: &Context, message: &Message, prefix: String) {
    reply(context, message, format!("`{}`", prefix)).await
}
