use serenity::{client::Context, model::channel::Message};

const SOURCE: &str = "https://github.com/camillescott/zardoz";

pub(crate) fn about_message(installs: usize) -> String {
    format!(
        "version: {}\nsource: {}\nactive installs: {}",
        env!("CARGO_PKG_VERSION"),
        SOURCE,
        installs
    )
}

/// `None` while no invite url is configured.
pub(crate) fn invite_message(invite_url: &str) -> Option<String> {
    Some(invite_url.trim())
        .filter(|url| !url.is_empty())
        .map(|url| format!("open {} to add this bot to your servers", url))
}

pub(crate) async fn about(context: &Context, message: &Message, invite_url: &str) {
    let installs = context.cache.guild_count().await;
    if let Err(err) = message
        .channel_id
        .send_message(context, |m| {
            m.reference_message((message.channel_id, message.id))
                .allowed_mentions(|m| m.empty_users())
                .embed(|e| {
                    e.title("**ABOUT**").description(about_message(installs));
                    if let Some(invite) = invite_message(invite_url) {
                        e.field("Invite", invite, false);
                    }
                    e
                })
        })
        .await
    {
        log::warn!("Unable to reply to message {}: {}", message.id, err)
    }
}
