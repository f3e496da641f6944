use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::{collections::HashMap, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    task::spawn,
    time::{interval_at, Instant},
};
use zardoz_dice::{GameMode, RollOutcome};

use crate::bot_manager::StopListener;
use crate::tables::{RollTable, TableError, TableRoll};
use rusty_pool::{Builder, ThreadPool};

pub const MAX_SAMPLE_POPULATION: i64 = 100;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("roll took longer than {0:?}")]
    Timeout(Duration),
    #[error("roll worker died")]
    WorkerLost,
    #[error("no rng available")]
    RngUnavailable,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SampleError {
    #[error("`k` and `N` must be greater than 1!")]
    NotPositive,
    #[error("`k` (sample size) cannot be greater than `N`!")]
    SampleTooLarge,
    #[error("`N`={0} too large! Try 100 or less dawg.")]
    PopulationTooLarge(i64),
}

/// Checks a `sample k N` request, returning it as sizes.
pub fn check_sample(k: i64, n: i64) -> Result<(usize, usize), SampleError> {
    if k < 1 || n < 1 {
        Err(SampleError::NotPositive)
    } else if k > n {
        Err(SampleError::SampleTooLarge)
    } else if n > MAX_SAMPLE_POPULATION {
        Err(SampleError::PopulationTooLarge(n))
    } else {
        Ok((k as usize, n as usize))
    }
}

/// `k` distinct values out of `1..=n`, ascending.
pub fn sample<R: Rng + ?Sized>(rng: &mut R, k: usize, n: usize) -> Vec<i64> {
    let mut values: Vec<i64> = rand::seq::index::sample(rng, n, k)
        .into_iter()
        .map(|i| i as i64 + 1)
        .collect();
    values.sort_unstable();
    values
}

#[derive(Debug)]
enum RngProviderOps {
    GetRng(oneshot::Sender<Xoshiro256PlusPlus>),
    SetCryptoRng(ChaCha20Rng),
}

struct RngProvider {
    rng: ChaCha20Rng,
    receiver: mpsc::Receiver<RngProviderOps>,
}

impl RngProvider {
    pub async fn run(&mut self) {
        while let Some(op) = self.receiver.recv().await {
            match op {
                RngProviderOps::GetRng(channel) => {
                    let mut seed: <Xoshiro256PlusPlus as SeedableRng>::Seed = Default::default();
                    self.rng.fill(&mut seed);
                    if channel.send(Xoshiro256PlusPlus::from_seed(seed)).is_err() {
                        log::debug!("rng requester went away");
                    }
                }
                RngProviderOps::SetCryptoRng(rng) => self.rng = rng,
            }
        }
    }
}

fn start_rng_provider<Stop: StopListener>(
    rng_reseed: Duration,
    mut stop: Stop,
) -> (tokio::task::JoinHandle<()>, mpsc::Sender<RngProviderOps>) {
    let (sender, receiver) = mpsc::channel(32);
    let rng_handle = spawn(async move {
        RngProvider {
            rng: ChaCha20Rng::from_entropy(),
            receiver,
        }
        .run()
        .await
    });
    let reseed = sender.clone();
    (
        spawn(async move {
            let mut interval = interval_at(Instant::now() + rng_reseed, rng_reseed);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if reseed
                            .send(RngProviderOps::SetCryptoRng(ChaCha20Rng::from_entropy()))
                            .await
                            .is_err()
                        {
                            break;
                        }
                        log::debug!("reseeded roll rng");
                    }
                    _ = stop.wait_stop() => {
                        break;
                    }
                }
            }
            drop(reseed);
            log::info!("stopped reseeding task");
            if let Err(e) = rng_handle.await {
                log::error!("rng provider failed: {}", e);
            }
        }),
        sender,
    )
}

/// Runs rolls on a worker pool, each with a freshly seeded generator.
pub struct RollExecutor {
    pool: ThreadPool,
    timeout: Duration,
    rng_gen: mpsc::Sender<RngProviderOps>,
}

impl RollExecutor {
    pub fn new<Stop: StopListener>(
        size: u32,
        timeout: Duration,
        rng_reseed: Duration,
        stop: Stop,
    ) -> (tokio::task::JoinHandle<()>, RollExecutor) {
        let (handle, rng) = start_rng_provider(rng_reseed, stop);
        (
            handle,
            RollExecutor {
                pool: Builder::new()
                    .core_size(1)
                    .max_size(size.max(1))
                    .name("Roll Worker".to_string())
                    .build(),
                timeout,
                rng_gen: rng,
            },
        )
    }

    pub async fn run<F, T>(&self, job: F) -> Result<T, ExecutorError>
    where
        F: FnOnce(&mut Xoshiro256PlusPlus) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (rng_send, rng_receive) = oneshot::channel();
        self.rng_gen
            .send(RngProviderOps::GetRng(rng_send))
            .await
            .map_err(|_| ExecutorError::RngUnavailable)?;
        let mut rng = rng_receive
            .await
            .map_err(|_| ExecutorError::RngUnavailable)?;
        let (result_sender, result_receiver) = oneshot::channel();
        self.pool.execute(move || {
            if result_sender.send(job(&mut rng)).is_err() {
                log::warn!("roll finished after its requester gave up");
            }
        });
        match tokio::time::timeout(self.timeout, result_receiver).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(ExecutorError::WorkerLost),
            Err(_) => Err(ExecutorError::Timeout(self.timeout)),
        }
    }

    pub async fn roll(
        &self,
        request: String,
        mode: GameMode,
        variables: HashMap<String, i64>,
        require_tag: bool,
    ) -> Result<zardoz_dice::Result<RollOutcome>, ExecutorError> {
        log::info!("rolling {:?} in mode {}", &request, mode);
        self.run(move |rng| {
            zardoz_dice::roll_expression(request.as_str(), mode, &variables, require_tag, rng)
        })
        .await
    }

    pub async fn sample(&self, k: usize, n: usize) -> Result<Vec<i64>, ExecutorError> {
        self.run(move |rng| sample(rng, k, n)).await
    }

    /// Rolls on `table` with its own die or with `die`, which may also be a plain number.
    pub async fn roll_table(
        &self,
        table: Arc<RollTable>,
        die: Option<String>,
    ) -> Result<Result<TableRoll, TableError>, ExecutorError> {
        self.run(move |rng| table.roll(die.as_deref(), rng)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use zardoz_dice::RollValue;

    fn executor() -> (tokio::sync::watch::Sender<bool>, RollExecutor) {
        let (stop, stop_listener) = tokio::sync::watch::channel(false);
        let (_handle, executor) = RollExecutor::new(
            2,
            Duration::from_secs(5),
            Duration::from_secs(300),
            stop_listener,
        );
        (stop, executor)
    }

    #[test]
    fn test_check_sample() {
        assert_eq!(check_sample(3, 10), Ok((3, 10)));
        assert_eq!(check_sample(0, 10), Err(SampleError::NotPositive));
        assert_eq!(check_sample(3, -1), Err(SampleError::NotPositive));
        assert_eq!(check_sample(11, 10), Err(SampleError::SampleTooLarge));
        assert_eq!(
            check_sample(3, 101),
            Err(SampleError::PopulationTooLarge(101))
        );
        assert_eq!(
            SampleError::PopulationTooLarge(101).to_string(),
            "`N`=101 too large! Try 100 or less dawg."
        );
        assert_eq!(check_sample(100, 100), Ok((100, 100)));
    }

    #[test]
    fn test_sample() {
        let mut rng = StdRng::seed_from_u64(5);
        let values = sample(&mut rng, 10, 12);
        assert_eq!(values.len(), 10);
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert!(values.iter().all(|v| (1..=12).contains(v)));
        assert_eq!(sample(&mut rng, 4, 4), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_executor_roll() {
        let (stop, executor) = executor();
        let mut vars = HashMap::new();
        vars.insert("BS".to_string(), 40);
        let outcome = executor
            .roll("r <= $BS # shoot".to_string(), GameMode::Realistic, vars, false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.tag, "shoot");
        assert_eq!(outcome.expression, "1d100 <= 40");
        assert!(matches!(outcome.result, RollValue::ComparisonSet(_)));

        let failed = executor
            .roll("d20".to_string(), GameMode::D20, HashMap::new(), true)
            .await
            .unwrap();
        assert_eq!(failed, Err(zardoz_dice::RollError::RequireTagMissing));

        let values = executor.sample(5, 6).await.unwrap();
        assert_eq!(values.len(), 5);
        stop.send(true).unwrap();
    }

    #[tokio::test]
    async fn test_executor_timeout() {
        let (stop, stop_listener) = tokio::sync::watch::channel(false);
        let (_handle, executor) = RollExecutor::new(
            1,
            Duration::from_millis(10),
            Duration::from_secs(300),
            stop_listener,
        );
        let result = executor
            .run(|_| std::thread::sleep(Duration::from_millis(200)))
            .await;
        assert_eq!(result, Err(ExecutorError::Timeout(Duration::from_millis(10))));
        stop.send(true).unwrap();
    }
}
