pub mod commands;
pub mod rolls;
pub mod storage;

use commands::{Command, VarCommand};
use rolls::{ExecutorError, RollExecutor, SampleError};
use std::{future::Future, sync::Arc};
pub use storage::{ClientId, RollRecord, StorageError, VarScope};
use storage::{GlobalStorage, StorageHandle};
use thiserror::Error;
use tokio::task::JoinHandle;
use zardoz_dice::{GameMode, RollOutcome};

use crate::tables::{RollTable, RollTables, TableError, TableRoll};

/// Cause reported when a reroll carries more than a new tag.
pub const REROLL_TAG_ONLY: &str =
    "A reroll only takes a new `# tag`, roll again to change the dice.";

/// The member a command came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub id: String,
    pub nick: Option<String>,
    pub name: String,
}

impl Requester {
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollKind {
    Normal,
    Quiet,
    /// Result goes to `target` only, the requester if unset.
    Secret { target: Option<String> },
    /// `target` is `"self"` or the display name of the member whose roll was repeated.
    Reroll { target: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollReply {
    pub kind: RollKind,
    pub requester: Requester,
    pub mode: GameMode,
    pub outcome: RollOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleReply {
    pub requester: Requester,
    pub k: usize,
    pub n: usize,
    pub tag: String,
    pub values: Vec<i64>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    Help(String),
    About,
    Roll(RollReply),
    RollFailed {
        requester: Requester,
        cause: String,
        /// Secret rolls report failures to the requester only.
        private: bool,
    },
    /// Member id without any recorded roll.
    NoHistory(String),
    History(Vec<RollRecord>),
    Mode(GameMode),
    ModeList,
    SetMode(GameMode),
    UnknownMode(String),
    Variables(Vec<(String, i64)>),
    Variable(String, Option<i64>),
    SetVariable(String, i64),
    DeleteVariable(String, bool),
    TableList(Vec<Arc<RollTable>>),
    TableRoll(Arc<RollTable>, TableRoll),
    TableShow(Arc<RollTable>),
    TableError(TableError),
    Sample(SampleReply),
    SampleRejected(SampleError),
    SetCommandPrefix(String),
    GetCommandPrefix(String),
    InsufficentPermission,
    /// Something on our side broke. Not the requester's fault.
    Failure(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

#[derive(Clone)]
pub struct ClientUtils<Id: ClientId> {
    roll: Arc<RollExecutor>,
    tables: Arc<RollTables>,
    store: StorageHandle<Id>,
}

impl<Id: ClientId> ClientUtils<Id> {
    /// Runs `message` if it is a command. `check_permission` is only awaited for commands
    /// that change server settings.
    pub async fn eval<F: Future<Output = bool>, Fn: FnOnce() -> F>(
        &self,
        id: Id,
        requester: Requester,
        message: &str,
        check_permission: Fn,
    ) -> Option<CommandResult> {
        let prefix = match self.store.get_command_prefix(&id).await {
            Ok(prefix) => prefix,
            Err(e) => {
                log::error!("unable to read command prefix for {:?}: {}", &id, e);
                return None;
            }
        };
        let command = commands::parse_logging(message, &prefix)?;
        Some(
            match self
                .run(id, requester, command, prefix, check_permission)
                .await
            {
                Ok(result) => result,
                Err(e) => {
                    log::error!("command failed: {}", e);
                    CommandResult::Failure(e.to_string())
                }
            },
        )
    }

    async fn run<F: Future<Output = bool>, Fn: FnOnce() -> F>(
        &self,
        id: Id,
        requester: Requester,
        command: Command,
        prefix: String,
        check_permission: Fn,
    ) -> Result<CommandResult, ClientError> {
        Ok(match command {
            Command::Help => CommandResult::Help(prefix),
            Command::About => CommandResult::About,
            Command::Roll(request) => {
                self.roll(&id, requester, request, RollKind::Normal, false)
                    .await?
            }
            Command::Quiet(request) => {
                self.roll(&id, requester, request, RollKind::Quiet, false)
                    .await?
            }
            Command::Secret { target, request } => {
                self.roll(&id, requester, request, RollKind::Secret { target }, true)
                    .await?
            }
            Command::Reroll { target, args } => self.reroll(&id, requester, target, args).await?,
            Command::History { target, max } => {
                CommandResult::History(self.store.get_rolls(&id, target, max).await?)
            }
            Command::Mode => CommandResult::Mode(self.store.get_game_mode(&id).await?),
            Command::ModeList => CommandResult::ModeList,
            Command::SetMode(name) => {
                if check_permission().await {
                    match name.parse::<GameMode>() {
                        Ok(mode) => {
                            self.store.set_game_mode(&id, mode).await?;
                            CommandResult::SetMode(mode)
                        }
                        Err(_) => CommandResult::UnknownMode(name),
                    }
                } else {
                    CommandResult::InsufficentPermission
                }
            }
            Command::Var(var) => self.var(&id, &requester, VarScope::Server, var).await?,
            Command::UserVar(var) => {
                let scope = VarScope::Member(requester.id.clone());
                self.var(&id, &requester, scope, var).await?
            }
            Command::TableList => CommandResult::TableList(self.tables.iter().cloned().collect()),
            Command::TableGet { slug, value } => match self.tables.get(&slug) {
                Ok(table) => match self.roll.roll_table(table.clone(), value).await? {
                    Ok(roll) => CommandResult::TableRoll(table, roll),
                    Err(e) => CommandResult::TableError(e),
                },
                Err(e) => CommandResult::TableError(e),
            },
            Command::TableShow(slug) => match self.tables.get(&slug) {
                Ok(table) => CommandResult::TableShow(table),
                Err(e) => CommandResult::TableError(e),
            },
            Command::Sample { k, n, args } => match rolls::check_sample(k, n) {
                Ok((k, n)) => {
                    let values = self.roll.sample(k, n).await?;
                    let (_, tag) = zardoz_dice::tokenize(args.as_str());
                    CommandResult::Sample(SampleReply {
                        requester,
                        k,
                        n,
                        tag,
                        values,
                    })
                }
                Err(e) => CommandResult::SampleRejected(e),
            },
            Command::SetCommandPrefix(prefix) => {
                if check_permission().await {
                    self.store.set_command_prefix(&id, prefix.clone()).await?;
                    CommandResult::SetCommandPrefix(prefix)
                } else {
                    CommandResult::InsufficentPermission
                }
            }
            Command::GetCommandPrefix => CommandResult::GetCommandPrefix(prefix),
        })
    }

    async fn roll(
        &self,
        id: &Id,
        requester: Requester,
        request: String,
        kind: RollKind,
        require_tag: bool,
    ) -> Result<CommandResult, ClientError> {
        let mode = self.store.get_game_mode(id).await?;
        let variables = self.store.get_merged_variables(id, &requester.id).await?;
        Ok(
            match self.roll.roll(request, mode, variables, require_tag).await? {
                Ok(outcome) => {
                    if let Err(e) = self.store.record_roll(id, &requester, &outcome).await {
                        log::warn!("unable to record roll of {}: {}", &requester.name, e);
                    }
                    CommandResult::Roll(RollReply {
                        kind,
                        requester,
                        mode,
                        outcome,
                    })
                }
                Err(cause) => {
                    log::warn!("roll of {} failed: {}", &requester.name, &cause);
                    CommandResult::RollFailed {
                        private: matches!(kind, RollKind::Secret { .. }),
                        requester,
                        cause: cause.to_string(),
                    }
                }
            },
        )
    }

    async fn reroll(
        &self,
        id: &Id,
        requester: Requester,
        target: Option<String>,
        args: String,
    ) -> Result<CommandResult, ClientError> {
        let member = target.unwrap_or_else(|| requester.id.clone());
        let saved = match self.store.get_last_user_roll(id, member.clone()).await? {
            Some(saved) => saved,
            None => return Ok(CommandResult::NoHistory(member)),
        };
        let (extra, tag) = zardoz_dice::tokenize(args.as_str());
        if !extra.is_empty() {
            return Ok(CommandResult::RollFailed {
                requester,
                cause: REROLL_TAG_ONLY.to_string(),
                private: false,
            });
        }
        let tag = if tag.is_empty() { saved.tag.clone() } else { tag };
        let request = if tag.is_empty() {
            saved.roll.clone()
        } else {
            format!("{} # {}", &saved.roll, tag)
        };
        let target = if member == requester.id {
            "self".to_string()
        } else {
            saved.display_name().to_string()
        };
        self.roll(id, requester, request, RollKind::Reroll { target }, false)
            .await
    }

    async fn var(
        &self,
        id: &Id,
        requester: &Requester,
        scope: VarScope,
        command: VarCommand,
    ) -> Result<CommandResult, ClientError> {
        Ok(match command {
            VarCommand::List => {
                CommandResult::Variables(self.store.list_variables(id, &scope).await?)
            }
            VarCommand::Get(name) => {
                let value = self.store.get_variable(id, &scope, name.clone()).await?;
                CommandResult::Variable(name, value)
            }
            VarCommand::Set(name, value) => {
                self.store
                    .set_variable(id, &scope, name.clone(), value, requester.id.clone())
                    .await?;
                CommandResult::SetVariable(name, value)
            }
            VarCommand::Delete(name) => {
                let deleted = self.store.delete_variable(id, &scope, name.clone()).await?;
                CommandResult::DeleteVariable(name, deleted)
            }
        })
    }
}

pub struct ClientUtilsBuilder {
    pub(crate) rolls: Arc<RollExecutor>,
    pub(crate) storage: Arc<GlobalStorage>,
    pub(crate) tables: Arc<RollTables>,
    pub(crate) join_handles: Vec<JoinHandle<()>>,
}

use std::convert::TryInto;
use toml::{map::Map, Value};

impl ClientUtilsBuilder {
    pub fn get<Id: ClientId, S: ToString>(
        &mut self,
        client_type: S,
        channel_size: usize,
        cache_size: usize,
    ) -> ClientUtils<Id> {
        ClientUtils {
            roll: self.rolls.clone(),
            tables: self.tables.clone(),
            store: StorageHandle::new(client_type, self.storage.clone(), channel_size, cache_size),
        }
    }

    pub fn get_from_config<Id: ClientId>(&mut self, config: ClientUtilsConfig) -> ClientUtils<Id> {
        self.get(config.client_type, config.channel_size, config.cache_size)
    }

    pub async fn wait(self) {
        let handles = self.join_handles;
        drop(self.storage);
        drop(self.rolls);
        for handle in handles.into_iter() {
            if let Err(e) = handle.await {
                log::error!("background task failed: {}", e);
            }
        }
        log::info!("all client utils finished")
    }
}

#[derive(Debug, Clone)]
pub struct ClientUtilsConfig {
    pub channel_size: usize,
    pub cache_size: usize,
    pub client_type: String,
}

impl ClientUtilsConfig {
    pub fn from_config<S: ToString>(
        client_type: S,
        config: &mut Map<String, Value>,
    ) -> ClientUtilsConfig {
        let client = client_type.to_string();
        let channel_size: usize = match config
            .get("queue_size")
            .and_then(|v| v.as_integer())
            .and_then(|i| i.try_into().ok())
        {
            Some(i) => i,
            None => {
                log::warn!(
                    "Unable to read queue_size for {}, using default of 64",
                    &client
                );
                config.insert("queue_size".to_string(), Value::from(64));
                64
            }
        };
        let cache_size: usize = match config
            .get("cache_size")
            .and_then(|v| v.as_integer())
            .and_then(|i| i.try_into().ok())
        {
            Some(i) => i,
            None => {
                log::warn!(
                    "Unable to read cache_size for {}, using default of 1024",
                    &client
                );
                config.insert("cache_size".to_string(), Value::from(1024));
                1024
            }
        };
        ClientUtilsConfig {
            channel_size,
            cache_size,
            client_type: client,
        }
    }
}
