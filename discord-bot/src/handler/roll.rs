use super::{direct, react, reply};
use bot_utils::{Requester, RollKind, RollReply};
use serenity::{
    client::Context,
    model::{channel::Message, id::UserId},
};
use zardoz_dice::{GameMode, RollOutcome};

fn tag_suffix(tag: &str) -> String {
    if tag.is_empty() {
        String::new()
    } else {
        format!(": *{}*", tag)
    }
}

fn mention(requester: &Requester) -> String {
    format!("<@{}>", requester.id)
}

fn details(outcome: &RollOutcome, mode: GameMode) -> String {
    format!(
        "***Request:***  `{}`\n***Rolls:***  `{}`\n***Result:***\n```{}```",
        outcome.raw_request(),
        outcome.describe_rolls(),
        outcome.describe(mode)
    )
}

/// Reply for a roll shown in the channel it was requested in.
pub(crate) fn roll_message(reply: &RollReply) -> String {
    let outcome = &reply.outcome;
    match &reply.kind {
        RollKind::Quiet => {
            let header = if outcome.tag.is_empty() {
                String::new()
            } else {
                format!("*:game_die: {}*", outcome.tag)
            };
            format!("{}\n```{}```", header, outcome.describe(reply.mode))
        }
        RollKind::Reroll { target } => format!(
            "Reroll :game_die: {} rerolls {}{}\n{}",
            mention(&reply.requester),
            target,
            tag_suffix(&outcome.tag),
            details(outcome, reply.mode)
        ),
        RollKind::Normal | RollKind::Secret { .. } => format!(
            ":game_die: {}{}\n{}",
            mention(&reply.requester),
            tag_suffix(&outcome.tag),
            details(outcome, reply.mode)
        ),
    }
}

/// Direct message for a secret roll.
pub(crate) fn secret_message(reply: &RollReply, author: &str, origin: &str) -> String {
    format!(
        ":game_die: from **{}** in **{}**: *{}*\n{}",
        author,
        origin,
        reply.outcome.tag,
        details(&reply.outcome, reply.mode)
    )
}

pub(crate) fn failure_message(author: &str, cause: &str) -> String {
    format!("You fucked up your roll, {}. {}", author, cause)
}

async fn origin(context: &Context, message: &Message) -> String {
    match message.guild_id {
        Some(guild) => match guild.to_partial_guild(context).await {
            Ok(g) => g.name,
            Err(err) => {
                log::warn!("unable to retrieve guild {}: {}", guild, err);
                guild.to_string()
            }
        },
        None => "a DM".to_string(),
    }
}

pub(crate) async fn roll(context: &Context, message: &Message, result: RollReply) {
    match &result.kind {
        RollKind::Secret { target } => {
            let recipient = match target.as_deref().map(str::parse::<u64>) {
                Some(Ok(id)) => UserId(id),
                _ => message.author.id,
            };
            let text = secret_message(&result, &message.author.tag(), &origin(context, message).await);
            if direct(context, recipient, text).await {
                react(context, message, '✅').await
            } else {
                react(context, message, '❌').await
            }
        }
        _ => reply(context, message, roll_message(&result)).await,
    }
}

pub(crate) async fn roll_failed(
    context: &Context,
    message: &Message,
    requester: Requester,
    cause: String,
    private: bool,
) {
    log::info!("roll of {} failed: {}", requester.name, &cause);
    let text = failure_message(&message.author.tag(), &cause);
    if private {
        direct(context, message.author.id, text).await;
    } else {
        reply(context, message, text).await
    }
}
