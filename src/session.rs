//! Actor that serialises a feed stream through one reassembly engine.
//!
//! [`FeedSession::spawn`] starts a task owning a [`ReassemblyEngine`]. Records
//! sent through the session handle are applied strictly in arrival order and
//! each outcome is forwarded to the caller's output channel. When a staleness
//! timeout is configured the task also sweeps stale assemblies on a fixed
//! interval, so stalled stories are evicted even while the feed is quiet.

use std::{num::NonZeroUsize, time::Duration};

use thiserror::Error;
use tokio::{
    sync::mpsc,
    task::{JoinError, JoinHandle},
    time::{self, Instant, Interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::ReassemblyConfig,
    engine::ReassemblyEngine,
    error::ReassemblyError,
    record::UpdateRecord,
    story::EmittedItem,
};

/// Outcome forwarded for every update that finished a story.
pub type SessionOutput = Result<EmittedItem, ReassemblyError>;

/// Settings for a [`FeedSession`].
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    /// Engine configuration.
    pub reassembly: ReassemblyConfig,
    /// Capacity of the inbound record channel.
    pub channel_capacity: NonZeroUsize,
    /// How often stale assemblies are swept when a staleness timeout is set.
    pub purge_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reassembly: ReassemblyConfig::default(),
            channel_capacity: NonZeroUsize::new(1024).unwrap_or(NonZeroUsize::MIN),
            purge_interval: Duration::from_secs(5),
        }
    }
}

/// Counters reported when a session task ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Records applied to the engine.
    pub records: u64,
    /// Items emitted.
    pub emitted: u64,
    /// Records that ended in an error.
    pub failed: u64,
    /// Assemblies evicted by periodic sweeps.
    pub evicted: u64,
}

/// Errors returned by [`FeedSession`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session task has stopped and no longer accepts records.
    #[error("feed session closed")]
    Closed,
    /// The session task panicked or was aborted.
    #[error("feed session task failed: {0}")]
    Join(#[from] JoinError),
}

/// Handle to a running session task.
///
/// # Examples
///
/// ```no_run
/// use storyframe::{
///     UpdateRecord,
///     session::{FeedSession, SessionConfig},
/// };
/// use tokio::sync::mpsc;
///
/// # async fn demo(records: Vec<UpdateRecord>) -> Result<(), Box<dyn std::error::Error>> {
/// let (tx, mut rx) = mpsc::channel(64);
/// let session = FeedSession::spawn(SessionConfig::default(), tx);
/// for record in records {
///     session.send(record).await?;
/// }
/// let stats = session.join().await?;
/// while let Some(outcome) = rx.recv().await {
///     println!("{outcome:?}");
/// }
/// println!("{stats:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FeedSession {
    records: mpsc::Sender<UpdateRecord>,
    shutdown: CancellationToken,
    task: JoinHandle<SessionStats>,
}

impl FeedSession {
    /// Spawn a session task on the current tokio runtime.
    ///
    /// Outcomes are sent to `output`. The task stops when every record
    /// sender is dropped, when [`shutdown`](Self::shutdown) is called, or
    /// when `output` is closed.
    #[must_use]
    pub fn spawn(config: SessionConfig, output: mpsc::Sender<SessionOutput>) -> Self {
        let (records, inbound) = mpsc::channel(config.channel_capacity.get());
        let shutdown = CancellationToken::new();
        let engine = ReassemblyEngine::new(config.reassembly);
        let sweep = config
            .reassembly
            .stale_after
            .map(|_| config.purge_interval);
        let task = tokio::spawn(run(engine, inbound, output, shutdown.clone(), sweep));

        Self {
            records,
            shutdown,
            task,
        }
    }

    /// Queue a record for processing, waiting for channel capacity.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] when the session task has stopped.
    pub async fn send(&self, record: UpdateRecord) -> Result<(), SessionError> {
        self.records
            .send(record)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Clone the inbound sender so other tasks can feed this session.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<UpdateRecord> { self.records.clone() }

    /// Token that stops the session when cancelled.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken { self.shutdown.clone() }

    /// Stop the session without draining queued records.
    pub fn shutdown(&self) { self.shutdown.cancel(); }

    /// Close this handle's sender and wait for the task to finish.
    ///
    /// Queued records are drained first unless the session was shut down.
    /// Cloned senders keep the task alive until they are dropped as well.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Join`] if the task panicked or was aborted.
    pub async fn join(self) -> Result<SessionStats, SessionError> {
        let Self { records, task, .. } = self;
        drop(records);
        Ok(task.await?)
    }
}

async fn run(
    mut engine: ReassemblyEngine,
    mut inbound: mpsc::Receiver<UpdateRecord>,
    output: mpsc::Sender<SessionOutput>,
    shutdown: CancellationToken,
    sweep: Option<Duration>,
) -> SessionStats {
    let mut stats = SessionStats::default();
    let mut ticker = sweep.map(|period| {
        let period = period.max(Duration::from_millis(1));
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    loop {
        tokio::select! {
            biased;

            () = shutdown.cancelled() => {
                debug!("feed session cancelled");
                break;
            }

            maybe = inbound.recv() => {
                let Some(record) = maybe else {
                    debug!("feed session inputs closed");
                    break;
                };
                stats.records += 1;
                let outcome = match engine.on_update(&record) {
                    Ok(None) => continue,
                    Ok(Some(item)) => {
                        stats.emitted += 1;
                        Ok(item)
                    }
                    Err(err) => {
                        stats.failed += 1;
                        Err(err)
                    }
                };
                if output.send(outcome).await.is_err() {
                    warn!("feed session output closed; stopping");
                    break;
                }
            }

            () = next_sweep(&mut ticker), if ticker.is_some() => {
                stats.evicted += engine.purge_expired().len() as u64;
            }
        }
    }

    info!(
        records = stats.records,
        emitted = stats.emitted,
        failed = stats.failed,
        evicted = stats.evicted,
        in_flight = engine.in_flight(),
        "feed session finished"
    );
    stats
}

async fn next_sweep(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
