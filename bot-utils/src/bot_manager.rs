use crate::bots::{Bot, BotBuilder, BotConfig};
use crate::client_utils::{
    rolls::RollExecutor,
    storage::{GlobalStorage, StorageError},
    ClientUtilsBuilder,
};
use crate::tables::RollTables;
pub use async_trait::async_trait;
use std::{
    convert::TryFrom,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use thiserror::Error;
use tokio::join;
use toml::{map::Map, Value};

pub const DEFAULT_DB_PATH: &str = "zardoz.db";
pub const DEFAULT_TABLES_DIR: &str = "tables";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("unable to open storage: {0}")]
    Storage(#[from] StorageError),
    #[error("bad configuration: {0}")]
    Config(String),
    #[error("unable to start client: {0}")]
    Client(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub struct BotManager<B: Bot> {
    global_handle: ClientUtilsBuilder,
    bot: B,
}

impl<B: Bot> BotManager<B> {
    pub async fn run(self) {
        join!(self.global_handle.wait(), self.bot.run());
    }
}

#[async_trait]
pub trait StopListener: Sized + Sync + Clone + Send + 'static {
    async fn wait_stop(&mut self) -> ();
}

#[async_trait]
impl StopListener for tokio::sync::watch::Receiver<bool> {
    async fn wait_stop(&mut self) -> () {
        loop {
            match self.changed().await {
                Err(_) => {
                    break;
                }
                Ok(_) => {
                    if *self.borrow() {
                        break;
                    }
                }
            }
        }
    }
}

pub struct BotManagerBuilder<BB: BotBuilder> {
    bot: BB,
    storage: GlobalStorage,
    tables: RollTables,
    roll_timeout: Duration,
    rng_reseed: Duration,
    rng_workers: u32,
    db_handle: std::thread::JoinHandle<()>,
}

#[cfg(target_family = "unix")]
async fn wait_hup() {
    use tokio::signal::unix::*;
    match signal(SignalKind::hangup()) {
        Ok(mut signal) => {
            signal.recv().await;
        }
        Err(e) => {
            log::warn!("unable to listen for SIGHUP: {}", e);
            std::future::pending::<()>().await
        }
    }
}

/// Reads `key`, falling back to (and storing) `default` when it is missing or out of range.
fn integer<T: TryFrom<i64> + Into<i64> + Copy>(
    config: &mut Map<String, Value>,
    key: &str,
    default: T,
) -> T {
    match config
        .get(key)
        .and_then(|v| v.as_integer())
        .and_then(|v| T::try_from(v).ok())
    {
        Some(v) => v,
        None => {
            let fallback: i64 = default.into();
            log::warn!("unable to read {}, overwriting with {}", key, fallback);
            config.insert(key.to_string(), Value::from(fallback));
            default
        }
    }
}

fn string(config: &mut Map<String, Value>, key: &str, default: &str) -> String {
    match config.get(key).and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => {
            log::warn!("unable to read {}, overwriting with {:?}", key, default);
            config.insert(key.to_string(), Value::from(default));
            default.to_string()
        }
    }
}

fn read_config(config_path: &Path) -> Map<String, Value> {
    let text = match std::fs::read_to_string(config_path) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Unable to read config file: {}", e);
            String::new()
        }
    };
    match toml::from_str(&text) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Unable to parse config: {}", e);
            Map::new()
        }
    }
}

impl<BB: BotBuilder> BotManagerBuilder<BB> {
    pub fn new<S, BC>(config_path: S, bot: BC) -> Result<BotManagerBuilder<BB>, StartupError>
    where
        S: ToString,
        BC: BotConfig<Builder = BB>,
    {
        let config_path = PathBuf::from(config_path.to_string());
        let mut config = read_config(&config_path);
        let db_path = match std::env::var("DB_PATH") {
            Ok(path) => path,
            Err(_) => string(&mut config, "db_path", DEFAULT_DB_PATH),
        };
        let db_queue_size = integer::<u32>(&mut config, "db_queue_size", 64) as usize;
        let roll_timeout =
            Duration::from_millis(integer::<u32>(&mut config, "roll_timeout_ms", 2000).into());
        let rng_reseed =
            Duration::from_secs(integer::<u32>(&mut config, "rng_reseed_s", 300).into());
        let rng_workers = integer::<u32>(&mut config, "rng_workers", 4);
        let tables_dir = string(&mut config, "tables_dir", DEFAULT_TABLES_DIR);

        let builder = bot.config(&mut config)?;

        let (storage, db_handle) = GlobalStorage::new(db_path, db_queue_size)?;
        let tables = RollTables::load(&tables_dir);

        // `Value` emits plain keys before tables
        match toml::to_string(&Value::Table(config)) {
            Ok(text) => {
                if let Err(e) = std::fs::write(&config_path, text) {
                    log::error!("Error writing config: {}", e)
                }
            }
            Err(e) => log::error!("Error serializing config: {}", e),
        }

        Ok(BotManagerBuilder {
            bot: builder,
            storage,
            tables,
            roll_timeout,
            rng_reseed,
            rng_workers,
            db_handle,
        })
    }

    pub async fn build_async(self) -> Result<BotManager<BB::B>, StartupError> {
        let (finished_sender, finished_receiver) = tokio::sync::watch::channel(false);
        tokio::task::spawn(async move {
            #[cfg(target_family = "unix")]
            {
                tokio::select! {
                    _ = tokio::signal::ctrl_c()=>{
                        log::info!("Received Ctrl-C: Shutting down")
                    }
                    _ = wait_hup()=>{
                        log::info!("Received SIGHUP: Shutting down")
                    }
                };
            }
            #[cfg(not(target_family = "unix"))]
            {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("unable to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await
                }
                log::info!("Received Ctrl-C: Shutting down")
            }
            if finished_sender.send(true).is_err() {
                log::debug!("nothing left to stop");
            }
        });
        let (handle, roll) = RollExecutor::new(
            self.rng_workers,
            self.roll_timeout,
            self.rng_reseed,
            finished_receiver.clone(),
        );
        let db_handle_task = self.db_handle;
        let db_handle = tokio::task::spawn_blocking(move || {
            if db_handle_task.join().is_err() {
                log::error!("db worker panicked");
            }
        });
        let mut utils = ClientUtilsBuilder {
            rolls: Arc::new(roll),
            storage: Arc::new(self.storage),
            tables: Arc::new(self.tables),
            join_handles: vec![handle, db_handle],
        };
        let bot = self.bot.build(&mut utils, finished_receiver).await?;
        Ok(BotManager {
            global_handle: utils,
            bot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_written_back() {
        let mut config: Map<String, Value> = toml::from_str(
            r#"
            rng_workers = 8
            roll_timeout_ms = -5
            "#,
        )
        .unwrap();
        assert_eq!(integer::<u32>(&mut config, "rng_workers", 4), 8);
        assert_eq!(integer::<u32>(&mut config, "roll_timeout_ms", 2000), 2000);
        assert_eq!(integer::<u32>(&mut config, "rng_reseed_s", 300), 300);
        assert_eq!(string(&mut config, "tables_dir", "tables"), "tables");
        assert_eq!(config["roll_timeout_ms"].as_integer(), Some(2000));
        assert_eq!(config["rng_reseed_s"].as_integer(), Some(300));
        assert_eq!(config["tables_dir"].as_str(), Some("tables"));
    }

    #[test]
    fn test_read_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("zardoz.toml");
        assert!(read_config(&path).is_empty());
        std::fs::write(&path, "db_path = \"x.db\"\n[discord]\n").unwrap();
        let config = read_config(&path);
        assert_eq!(config["db_path"].as_str(), Some("x.db"));
        std::fs::write(&path, "not = [toml").unwrap();
        assert!(read_config(&path).is_empty());
    }

    #[tokio::test]
    async fn test_stop_listener() {
        let (sender, mut receiver) = tokio::sync::watch::channel(false);
        let waiter = tokio::spawn(async move { receiver.wait_stop().await });
        sender.send(false).unwrap();
        sender.send(true).unwrap();
        waiter.await.unwrap();
    }
}
