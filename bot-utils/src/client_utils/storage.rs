/*
 *     Licensed under the Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at
 *
 *         http://www.apache.org/licenses/LICENSE-2.0
 *
 *     Unless required by applicable law or agreed to in writing, software
 *     distributed under the License is distributed on an "AS IS" BASIS,
 *     WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *     See the License for the specific language governing permissions and
 *     limitations under the License.
 */

use diesel::{connection::SimpleConnection, prelude::*};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::HashMap,
    fmt,
    hash::Hash,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Semaphore};
mod schema;
use super::Requester;
use cached::{Cached, SizedCache};
use parking_lot::Mutex;
use zardoz_dice::{GameMode, RollOutcome};

pub const DEFAULT_COMMAND_PREFIX: &str = "/z";

/// `member_id` of variables shared by the whole server.
const SERVER_SCOPE: &str = "";

mod cc {
    use super::schema::{client_config, rolls, variables};

    #[derive(Debug, Queryable, Clone, Insertable, PartialEq, Eq)]
    #[table_name = "client_config"]
    pub(crate) struct ClientConfig {
        pub(crate) id: String,
        pub(crate) command_prefix: String,
        pub(crate) game_mode: String,
    }

    impl ClientConfig {
        pub(crate) fn new(id: String) -> ClientConfig {
            ClientConfig {
                id,
                command_prefix: super::DEFAULT_COMMAND_PREFIX.to_string(),
                game_mode: zardoz_dice::GameMode::default().to_string(),
            }
        }
    }

    #[derive(Debug, Insertable)]
    #[table_name = "variables"]
    pub(crate) struct NewVariable {
        pub(crate) client_id: String,
        pub(crate) member_id: String,
        pub(crate) name: String,
        pub(crate) value: i64,
        pub(crate) set_by: String,
    }

    #[derive(Debug, Insertable)]
    #[table_name = "rolls"]
    pub(crate) struct NewRoll {
        pub(crate) client_id: String,
        pub(crate) member_id: String,
        pub(crate) member_nick: Option<String>,
        pub(crate) member_name: String,
        pub(crate) roll: String,
        pub(crate) tag: String,
        pub(crate) result: String,
        pub(crate) time: i64,
    }
}

use cc::{ClientConfig, NewRoll, NewVariable};

/// One line of roll history, as recorded after a successful roll.
#[derive(Debug, Queryable, Clone, PartialEq, Eq)]
pub struct RollRecord {
    pub id: i32,
    pub client_id: String,
    pub member_id: String,
    pub member_nick: Option<String>,
    pub member_name: String,
    /// Lexed request without its tag. Rerolls replay this.
    pub roll: String,
    pub tag: String,
    /// Expression as rolled, dice shown by notation.
    pub result: String,
    /// Unix seconds.
    pub time: i64,
}

impl RollRecord {
    pub fn display_name(&self) -> &str {
        self.member_nick.as_deref().unwrap_or(&self.member_name)
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("unable to open database: {0}")]
    Connection(#[from] diesel::ConnectionError),
    #[error("unable to encode client id: {0}")]
    ClientKey(#[from] serde_json::Error),
    #[error("unable to start database worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("database worker is gone")]
    WorkerGone,
}

pub type Result<T> = std::result::Result<T, StorageError>;

pub trait ClientId:
    Serialize + DeserializeOwned + Eq + fmt::Debug + Hash + Clone + Send + Sync + Sized + 'static
{
}

impl<
        Id: Serialize
            + DeserializeOwned
            + Eq
            + fmt::Debug
            + Hash
            + Clone
            + Send
            + Sized
            + Sync
            + 'static,
    > ClientId for Id
{
}

#[derive(Debug, Serialize, PartialEq, Eq, Hash, Clone)]
struct Client<'s, Id: ClientId> {
    client_type: &'s str,
    client_id: &'s Id,
}

/// Who a variable belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarScope {
    Server,
    Member(String),
}

impl VarScope {
    fn member_id(&self) -> String {
        match self {
            VarScope::Server => SERVER_SCOPE.to_string(),
            VarScope::Member(id) => id.clone(),
        }
    }
}

type DbJob = Box<dyn FnOnce(&SqliteConnection) + Send>;

pub(crate) struct GlobalStorage {
    db_submit: mpsc::Sender<DbJob>,
}

impl GlobalStorage {
    pub(crate) fn new(
        db_url: String,
        channel_size: usize,
    ) -> Result<(GlobalStorage, std::thread::JoinHandle<()>)> {
        let db = SqliteConnection::establish(&db_url)?;
        db.batch_execute(schema::CREATE_TABLES)?;
        log::info!("opened database {}", &db_url);
        let (sender, mut receiver) = mpsc::channel::<DbJob>(channel_size);
        let handle = std::thread::Builder::new()
            .name("db_worker".to_string())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    job(&db)
                }
                log::info!("db worker queue closed");
            })?;
        Ok((GlobalStorage { db_submit: sender }, handle))
    }

    /// Runs `job` on the database worker and hands back its result.
    pub(crate) async fn execute<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&SqliteConnection) -> QueryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        self.db_submit
            .send(Box::new(move |db: &SqliteConnection| {
                if sender.send(job(db)).is_err() {
                    log::warn!("db result was no longer awaited");
                }
            }))
            .await
            .map_err(|_| StorageError::WorkerGone)?;
        Ok(receiver.await.map_err(|_| StorageError::WorkerGone)??)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Per client type view of the database. Client configs are cached.
#[derive(Clone)]
pub struct StorageHandle<Id: ClientId> {
    client_type: Arc<str>,
    global: Arc<GlobalStorage>,
    cache: Arc<Mutex<SizedCache<Id, ClientConfig>>>,
    pending: Arc<Semaphore>,
}

impl<Id: ClientId> StorageHandle<Id> {
    pub(crate) fn new<S: ToString>(
        client_type: S,
        global: Arc<GlobalStorage>,
        channel_size: usize,
        cache_size: usize,
    ) -> StorageHandle<Id> {
        StorageHandle {
            client_type: Arc::from(client_type.to_string()),
            global,
            cache: Arc::new(Mutex::new(SizedCache::with_size(cache_size.max(1)))),
            pending: Arc::new(Semaphore::new(channel_size.max(1))),
        }
    }

    fn key(&self, id: &Id) -> Result<String> {
        Ok(serde_json::to_string(&Client {
            client_type: &self.client_type,
            client_id: id,
        })?)
    }

    async fn execute<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&SqliteConnection) -> QueryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .pending
            .acquire()
            .await
            .map_err(|_| StorageError::WorkerGone)?;
        self.global.execute(job).await
    }

    async fn client_config(&self, id: &Id) -> Result<ClientConfig> {
        let cached = self.cache.lock().cache_get(id).cloned();
        if let Some(config) = cached {
            return Ok(config);
        }
        let key = self.key(id)?;
        let config = self
            .execute(move |db| {
                use schema::client_config::dsl;
                match dsl::client_config
                    .find(&key)
                    .first::<ClientConfig>(db)
                    .optional()?
                {
                    Some(config) => Ok(config),
                    None => {
                        log::info!("creating config for {}", &key);
                        let config = ClientConfig::new(key);
                        diesel::insert_into(dsl::client_config)
                            .values(&config)
                            .execute(db)?;
                        Ok(config)
                    }
                }
            })
            .await?;
        self.cache.lock().cache_set(id.clone(), config.clone());
        Ok(config)
    }

    async fn store_config(&self, id: &Id, config: ClientConfig) -> Result<()> {
        let row = config.clone();
        self.execute(move |db| {
            diesel::replace_into(schema::client_config::dsl::client_config)
                .values(&row)
                .execute(db)
        })
        .await?;
        self.cache.lock().cache_set(id.clone(), config);
        Ok(())
    }

    pub async fn get_command_prefix(&self, id: &Id) -> Result<String> {
        self.client_config(id).await.map(|c| c.command_prefix)
    }

    pub async fn set_command_prefix(&self, id: &Id, prefix: String) -> Result<()> {
        let mut config = self.client_config(id).await?;
        config.command_prefix = prefix;
        self.store_config(id, config).await
    }

    pub async fn get_game_mode(&self, id: &Id) -> Result<GameMode> {
        let config = self.client_config(id).await?;
        Ok(config.game_mode.parse().unwrap_or_else(|err| {
            log::warn!("{} for {}, using default", err, &config.id);
            GameMode::default()
        }))
    }

    pub async fn set_game_mode(&self, id: &Id, mode: GameMode) -> Result<()> {
        let mut config = self.client_config(id).await?;
        config.game_mode = mode.to_string();
        self.store_config(id, config).await
    }

    pub async fn list_variables(&self, id: &Id, scope: &VarScope) -> Result<Vec<(String, i64)>> {
        let key = self.key(id)?;
        let member = scope.member_id();
        self.execute(move |db| {
            use schema::variables::dsl;
            dsl::variables
                .filter(dsl::client_id.eq(key))
                .filter(dsl::member_id.eq(member))
                .order(dsl::name.asc())
                .select((dsl::name, dsl::value))
                .load(db)
        })
        .await
    }

    pub async fn get_variable(&self, id: &Id, scope: &VarScope, name: String) -> Result<Option<i64>> {
        let key = self.key(id)?;
        let member = scope.member_id();
        self.execute(move |db| {
            use schema::variables::dsl;
            dsl::variables
                .find((key, member, name))
                .select(dsl::value)
                .first(db)
                .optional()
        })
        .await
    }

    pub async fn set_variable(
        &self,
        id: &Id,
        scope: &VarScope,
        name: String,
        value: i64,
        set_by: String,
    ) -> Result<()> {
        let row = NewVariable {
            client_id: self.key(id)?,
            member_id: scope.member_id(),
            name,
            value,
            set_by,
        };
        self.execute(move |db| {
            diesel::replace_into(schema::variables::dsl::variables)
                .values(&row)
                .execute(db)
        })
        .await
        .map(|_| ())
    }

    /// `false` if there was nothing to delete.
    pub async fn delete_variable(&self, id: &Id, scope: &VarScope, name: String) -> Result<bool> {
        let key = self.key(id)?;
        let member = scope.member_id();
        self.execute(move |db| {
            use schema::variables::dsl;
            diesel::delete(dsl::variables.find((key, member, name))).execute(db)
        })
        .await
        .map(|deleted| deleted > 0)
    }

    /// Server variables overridden by the member's own.
    pub async fn get_merged_variables(&self, id: &Id, member: &str) -> Result<HashMap<String, i64>> {
        let key = self.key(id)?;
        let member = member.to_string();
        let rows: Vec<(String, String, i64)> = self
            .execute(move |db| {
                use schema::variables::dsl;
                dsl::variables
                    .filter(dsl::client_id.eq(key))
                    .filter(dsl::member_id.eq_any(vec![SERVER_SCOPE.to_string(), member]))
                    .select((dsl::member_id, dsl::name, dsl::value))
                    .load(db)
            })
            .await?;
        let (server, own): (Vec<_>, Vec<_>) = rows
            .into_iter()
            .partition(|(member_id, _, _)| member_id == SERVER_SCOPE);
        Ok(server
            .into_iter()
            .chain(own.into_iter())
            .map(|(_, name, value)| (name, value))
            .collect())
    }

    pub async fn record_roll(&self, id: &Id, requester: &Requester, outcome: &RollOutcome) -> Result<()> {
        let row = NewRoll {
            client_id: self.key(id)?,
            member_id: requester.id.clone(),
            member_nick: requester.nick.clone(),
            member_name: requester.name.clone(),
            roll: outcome.raw_request(),
            tag: outcome.tag.clone(),
            result: outcome.expression.clone(),
            time: unix_now(),
        };
        self.execute(move |db| {
            diesel::insert_into(schema::rolls::dsl::rolls)
                .values(&row)
                .execute(db)
        })
        .await
        .map(|_| ())
    }

    /// Newest first. Without a member, the whole server's history.
    pub async fn get_rolls(&self, id: &Id, member: Option<String>, max: u32) -> Result<Vec<RollRecord>> {
        let key = self.key(id)?;
        self.execute(move |db| {
            use schema::rolls::dsl;
            match member {
                Some(member) => dsl::rolls
                    .filter(dsl::client_id.eq(key))
                    .filter(dsl::member_id.eq(member))
                    .order(dsl::id.desc())
                    .limit(i64::from(max))
                    .load(db),
                None => dsl::rolls
                    .filter(dsl::client_id.eq(key))
                    .order(dsl::id.desc())
                    .limit(i64::from(max))
                    .load(db),
            }
        })
        .await
    }

    pub async fn get_last_user_roll(&self, id: &Id, member: String) -> Result<Option<RollRecord>> {
        self.get_rolls(id, Some(member), 1)
            .await
            .map(|mut rolls| rolls.pop())
    }
}
