use async_trait::async_trait;
use bot_utils::{client_utils::ClientUtils, CommandResult, Requester};
use serenity::{
    client::Context,
    model::{
        channel::Message,
        event::Event,
        id::{ChannelId, GuildId, UserId},
    },
    prelude::RawEventHandler,
};

/// Discord refuses longer messages.
pub(crate) const MESSAGE_LIMIT: usize = 2000;
pub(crate) const TOO_BIG: &str =
    "Hey broh, that's a big response. Try dialing back your request, I'm only human.";

pub(crate) struct DiscordBotHandler {
    pub guild_utils: ClientUtils<GuildId>,
    pub dm_utils: ClientUtils<UserId>,
    pub invite_url: String,
}

#[async_trait]
impl RawEventHandler for DiscordBotHandler {
    async fn raw_event(&self, ctx: Context, ev: Event) {
        if let Event::MessageCreate(event) = ev {
            let message = event.message;
            if message.author.bot {
                return;
            }
            let requester = requester(&message);
            let response = if let Some(guild) = message.guild_id {
                self.guild_utils
                    .eval(guild, requester, &message.content, || {
                        check_priviledged_access(&ctx, &message)
                    })
                    .await
            } else {
                self.dm_utils
                    .eval(message.author.id, requester, &message.content, || {
                        std::future::ready(true)
                    })
                    .await
            };
            if let Some(response) = response {
                respond(ctx, message, response, &self.invite_url).await;
            }
        }
    }
}

fn requester(message: &Message) -> Requester {
    Requester {
        id: message.author.id.to_string(),
        nick: message.member.as_ref().and_then(|m| m.nick.clone()),
        name: message.author.name.clone(),
    }
}

async fn check_priviledged_access(context: &Context, message: &Message) -> bool {
    match message.guild_id {
        Some(guild) => match guild.to_partial_guild(context).await {
            Ok(g) => {
                if g.owner_id == message.author.id {
                    true
                } else {
                    match g.member(context, message.author.id).await {
                        Ok(member) => member
                            .roles
                            .iter()
                            .filter_map(|id| g.roles.get(id))
                            .any(|role| role.permissions.administrator()),
                        Err(err) => {
                            log::warn!("unable to get member {}: {}", &message.author.id, err);
                            false
                        }
                    }
                }
            }
            Err(err) => {
                log::warn!("unable to retrieve guild {}: {}", &guild, err);
                false
            }
        },
        None => true, //user is always allowed to run every command in dm channels
    }
}

/// Replaces messages Discord would reject.
pub(crate) fn fit(text: String) -> String {
    if text.chars().count() > MESSAGE_LIMIT {
        TOO_BIG.to_string()
    } else {
        text
    }
}

pub(crate) async fn reply(context: &Context, message: &Message, text: String) {
    if let Err(err) = message.reply(context, fit(text)).await {
        log::warn!("Unable to reply to message {}: {}", message.id, err)
    }
}

pub(crate) async fn say(context: &Context, channel: ChannelId, text: String) {
    if let Err(err) = channel.say(context, fit(text)).await {
        log::warn!("Unable to send to channel {}: {}", channel, err)
    }
}

/// `false` if the direct message could not be delivered.
pub(crate) async fn direct(context: &Context, user: UserId, text: String) -> bool {
    match user.create_dm_channel(context).await {
        Ok(channel) => match channel.say(context, fit(text)).await {
            Ok(_) => true,
            Err(err) => {
                log::warn!("Unable to message {}: {}", user, err);
                false
            }
        },
        Err(err) => {
            log::warn!("Unable to open dm channel with {}: {}", user, err);
            false
        }
    }
}

pub(crate) async fn react(context: &Context, message: &Message, reaction: char) {
    if let Err(err) = message.react(context, reaction).await {
        log::warn!("unable to add reaction to message {}: {}", message.id, err);
    }
}

mod help;
use help::help;
mod info;
use info::about;
mod command_prefix;
use command_prefix::{get_command_prefix, set_command_prefix};
mod roll;
use roll::{roll, roll_failed};
mod history;
mod mode;
mod sample;
mod table;
mod vars;

async fn respond(context: Context, message: Message, response: CommandResult, invite_url: &str) {
    match response {
        CommandResult::Help(prefix) => help(&context, &message, prefix).await,
        CommandResult::About => about(&context, &message, invite_url).await,
        CommandResult::Roll(reply) => roll(&context, &message, reply).await,
        CommandResult::RollFailed {
            requester,
            cause,
            private,
        } => roll_failed(&context, &message, requester, cause, private).await,
        CommandResult::NoHistory(member) => {
            reply(&context, &message, history::no_history_message(&member)).await
        }
        CommandResult::History(records) => {
            say(&context, message.channel_id, history::history_message(&records)).await
        }
        CommandResult::Mode(mode) => say(&context, message.channel_id, mode::mode_message(mode)).await,
        CommandResult::ModeList => reply(&context, &message, mode::mode_list_message()).await,
        CommandResult::SetMode(mode) => reply(&context, &message, mode::set_mode_message(mode)).await,
        CommandResult::UnknownMode(name) => {
            reply(&context, &message, mode::unknown_mode_message(&name)).await
        }
        CommandResult::Variables(variables) => {
            say(&context, message.channel_id, vars::list_message(&variables)).await
        }
        CommandResult::Variable(name, value) => {
            say(&context, message.channel_id, vars::get_message(&name, value)).await
        }
        CommandResult::SetVariable(name, value) => {
            say(&context, message.channel_id, vars::set_message(&name, value)).await
        }
        CommandResult::DeleteVariable(name, deleted) => {
            say(&context, message.channel_id, vars::delete_message(&name, deleted)).await
        }
        CommandResult::TableList(tables) => {
            reply(&context, &message, table::list_message(&tables)).await
        }
        CommandResult::TableRoll(rolled, result) => {
            reply(&context, &message, table::roll_message(&rolled, &result)).await
        }
        CommandResult::TableShow(shown) => table::show(&context, &message, &shown).await,
        CommandResult::TableError(err) => {
            reply(&context, &message, table::error_message(&err)).await
        }
        CommandResult::Sample(result) => {
            reply(&context, &message, sample::sample_message(&result)).await
        }
        CommandResult::SampleRejected(err) => {
            reply(&context, &message, sample::rejected_message(&err)).await
        }
        CommandResult::SetCommandPrefix(prefix) => {
            set_command_prefix(&context, &message, prefix).await
        }
        CommandResult::GetCommandPrefix(prefix) => {
            get_command_prefix(&context, &message, prefix).await
        }
        CommandResult::InsufficentPermission => react(&context, &message, '❌').await,
        CommandResult::Failure(_) => {
            react(&context, &message, '❌').await;
            reply(
                &context,
                &message,
                "Something broke on my end. Give it another go in a bit.".to_string(),
            )
            .await
        }
    }
}
