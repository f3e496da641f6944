use bot_utils::{
    bot_manager::{StartupError, StopListener},
    bots::{async_trait, section, Bot, BotBuilder, BotConfig, Map, Value},
    client_utils::{ClientUtilsBuilder, ClientUtilsConfig},
};

use serenity::client::{Client, ClientBuilder};

/// Environment variable holding the bot token.
pub const TOKEN_VAR: &str = "ZARDOZ_TOKEN";
/// No invite is advertised until one is configured.
const DEFAULT_INVITE_URL: &str = "";

pub struct DiscordBot {
    client: Client,
}

#[async_trait]
impl Bot for DiscordBot {
    async fn run(mut self) {
        if let Err(err) = self.client.start_autosharded().await {
            log::error!("discord client failed: {}", err);
        }
        log::info!("discord bot stopped")
    }
}

pub struct DiscordBotBuilder {
    invite_url: String,
    token: String,
    dm_utils: ClientUtilsConfig,
    guild_utils: ClientUtilsConfig,
}

#[async_trait]
impl BotBuilder for DiscordBotBuilder {
    type B = DiscordBot;

    async fn build<S: StopListener>(
        self,
        utils: &mut ClientUtilsBuilder,
        mut stop: S,
    ) -> Result<Self::B, StartupError> {
        let dm_utils = utils.get_from_config(self.dm_utils);
        let guild_utils = utils.get_from_config(self.guild_utils);
        let client = ClientBuilder::new(&self.token)
            .raw_event_handler(DiscordBotHandler {
                dm_utils,
                guild_utils,
                invite_url: self.invite_url,
            })
            .await
            .map_err(|e| StartupError::Client(e.to_string().into()))?;
        let shard = client.shard_manager.clone();
        tokio::task::spawn(async move {
            stop.wait_stop().await;
            shard.lock().await.shutdown_all().await;
        });
        Ok(DiscordBot { client })
    }
}

pub struct DiscordBotConfig {}

fn invite_url(config: &mut Map<String, Value>) -> String {
    match config.get("invite_url").and_then(|u| u.as_str()) {
        Some(u) => u.to_owned(),
        None => {
            log::warn!("Unable to read discord invite url!");
            config.insert("invite_url".to_string(), Value::from(DEFAULT_INVITE_URL));
            DEFAULT_INVITE_URL.to_string()
        }
    }
}

impl BotConfig for DiscordBotConfig {
    type Builder = DiscordBotBuilder;

    fn config(self, config: &mut Map<String, Value>) -> Result<Self::Builder, StartupError> {
        let token = std::env::var(TOKEN_VAR).map_err(|_| {
            StartupError::Config(format!("no discord token provided in {}", TOKEN_VAR))
        })?;
        let discord_config = section(config, "discord");
        let invite_url = invite_url(discord_config);
        let dm_utils =
            ClientUtilsConfig::from_config("discord-dm", section(discord_config, "dm"));
        let guild_utils =
            ClientUtilsConfig::from_config("discord-guild", section(discord_config, "guild"));
        Ok(DiscordBotBuilder {
            invite_url,
            token,
            dm_utils,
            guild_utils,
        })
    }
}

mod handler;
use handler::DiscordBotHandler;
