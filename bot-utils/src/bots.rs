pub use crate::bot_manager::{StartupError, StopListener};
pub use crate::client_utils::{ClientId, ClientUtils, ClientUtilsBuilder, ClientUtilsConfig};
pub use async_trait::async_trait;
pub use toml::{map::Map, Value};

#[async_trait]
pub trait Bot: Send + 'static {
    async fn run(self);
}

#[async_trait]
pub trait BotBuilder: Send + 'static {
    type B: Bot + 'static;
    async fn build<S: StopListener>(
        self,
        utils: &mut ClientUtilsBuilder,
        stop: S,
    ) -> Result<Self::B, StartupError>;
}

pub trait BotConfig {
    type Builder: BotBuilder;
    fn config(self, config: &mut Map<String, Value>) -> Result<Self::Builder, StartupError>;
}

/// The table under `key`, created empty if missing.
pub fn section<'c>(config: &'c mut Map<String, Value>, key: &str) -> &'c mut Map<String, Value> {
    let valid = matches!(config.get(key), Some(Value::Table(_)));
    if !valid {
        log::warn!("Missing {} section in config", key);
        config.insert(key.to_string(), Value::Table(Map::new()));
    }
    match config.get_mut(key) {
        Some(Value::Table(table)) => table,
        _ => unreachable!("{} was just inserted as a table", key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section() {
        let mut config: Map<String, Value> = toml::from_str(
            r#"
            db_path = "zardoz.db"
            [discord.guild]
            queue_size = 12
            "#,
        )
        .unwrap();
        let discord = section(&mut config, "discord");
        assert!(discord.contains_key("guild"));
        let dm = section(discord, "dm");
        assert!(dm.is_empty());
        dm.insert("queue_size".to_string(), Value::from(3));
        assert_eq!(
            config["discord"]["dm"]["queue_size"].as_integer(),
            Some(3)
        );
        section(&mut config, "db_path");
        assert!(config["db_path"].is_table());
    }
}
