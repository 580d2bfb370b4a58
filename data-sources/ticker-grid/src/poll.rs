use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, trace, warn};

use crate::{
    grid::{shape_for_grid, DisplayRow, DEFAULT_COLUMNS},
    source::TickerSource,
};

pub const DEFAULT_UPDATE_TIME: Duration = Duration::from_millis(5000);
pub const DEFAULT_ERROR_TEXT: &str = "Ошибка";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PollState {
    #[default]
    Idle,
    Loading,
    /// `refreshing` is set while a tick fetch is outstanding. `stale` holds
    /// the banner when the latest tick failed and `rows` are the last good ones.
    Ready {
        rows: Vec<DisplayRow>,
        refreshing: bool,
        stale: Option<String>,
    },
    /// Terminal for the mount: the initial fetch failed.
    Failed { banner: String },
}

impl PollState {
    pub fn rows(&self) -> Option<&[DisplayRow]> {
        match self {
            PollState::Ready { rows, .. } => Some(rows),
            _ => None,
        }
    }

    pub fn banner(&self) -> Option<&str> {
        match self {
            PollState::Failed { banner } => Some(banner),
            PollState::Ready {
                stale: Some(banner),
                ..
            } => Some(banner),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub update_time: Duration,
    pub columns: usize,
    pub error_text: String,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            update_time: DEFAULT_UPDATE_TIME,
            columns: DEFAULT_COLUMNS,
            error_text: DEFAULT_ERROR_TEXT.to_string(),
        }
    }
}

pub struct PollController<S> {
    source: Arc<S>,
    config: PollConfig,
}

/// Owns the running poller. Dropping it cancels the timer; a fetch already in
/// flight is abandoned and its result goes nowhere.
pub struct PollHandle {
    timer: JoinHandle<()>,
    state: watch::Receiver<PollState>,
}

impl PollHandle {
    pub fn state(&mut self) -> &mut watch::Receiver<PollState> {
        &mut self.state
    }

    pub fn unmount(self) {
        info!("Unmount ticker poller");
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

fn publish(state_tx: &watch::Sender<PollState>, state: PollState) {
    if state_tx.send(state).is_err() {
        trace!("Poller is unmounted, drop fetch result");
    }
}

impl<S> PollController<S>
where
    S: TickerSource + 'static,
{
    pub fn new(source: S, config: PollConfig) -> Self {
        Self {
            source: Arc::new(source),
            config,
        }
    }

    /// Spawns the poller on the current runtime and starts the initial fetch.
    pub fn mount(self) -> PollHandle {
        let (state_tx, state_rx) = watch::channel(PollState::Loading);
        let timer = tokio::spawn(self.run(Arc::new(state_tx)));

        PollHandle {
            timer,
            state: state_rx,
        }
    }

    async fn run(self, state_tx: Arc<watch::Sender<PollState>>) {
        info!(update_time = ?self.config.update_time, "Mount ticker poller");

        let rows = match self.source.fetch_ticker().await {
            Ok(snapshot) => shape_for_grid(snapshot, self.config.columns),
            Err(e) => {
                error!(%e, "Initial ticker fetch failed");
                publish(
                    &state_tx,
                    PollState::Failed {
                        banner: self.config.error_text.clone(),
                    },
                );
                return;
            }
        };
        info!(rows = rows.len(), "Ticker loaded");
        publish(
            &state_tx,
            PollState::Ready {
                rows,
                refreshing: false,
                stale: None,
            },
        );

        let in_flight = Arc::new(AtomicBool::new(false));
        // interval panics on a zero period
        let period = self.config.update_time.max(Duration::from_millis(1));
        let mut timer = time::interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            timer.tick().await;
            if in_flight.swap(true, Ordering::AcqRel) {
                debug!("Previous fetch still in flight, skip tick");
                continue;
            }

            state_tx.send_if_modified(|state| match state {
                PollState::Ready { refreshing, .. } => {
                    *refreshing = true;
                    true
                }
                _ => false,
            });

            tokio::spawn(Self::refresh(
                self.source.clone(),
                self.config.clone(),
                state_tx.clone(),
                in_flight.clone(),
            ));
        }
    }

    async fn refresh(
        source: Arc<S>,
        config: PollConfig,
        state_tx: Arc<watch::Sender<PollState>>,
        in_flight: Arc<AtomicBool>,
    ) {
        let next = match source.fetch_ticker().await {
            Ok(snapshot) => PollState::Ready {
                rows: shape_for_grid(snapshot, config.columns),
                refreshing: false,
                stale: None,
            },
            Err(e) => {
                warn!(%e, "Ticker refresh failed, keep previous rows");
                let rows = state_tx.borrow().rows().map(<[_]>::to_vec).unwrap_or_default();
                PollState::Ready {
                    rows,
                    refreshing: false,
                    stale: Some(config.error_text.clone()),
                }
            }
        };

        publish(&state_tx, next);
        in_flight.store(false, Ordering::Release);
    }
}
