use bot_utils::bot_manager::BotManagerBuilder;
use discord_bot::DiscordBotConfig;

const DEFAULT_CONFIG_PATH: &str = "zardoz.toml";

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    pretty_env_logger::init();
    log::info!("logger created");
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let manager = match BotManagerBuilder::new(config_path, DiscordBotConfig {}) {
        Ok(builder) => builder.build_async().await,
        Err(e) => Err(e),
    };
    match manager {
        Ok(manager) => manager.run().await,
        Err(e) => {
            log::error!("unable to start: {}", e);
            std::process::exit(1)
        }
    }
}
