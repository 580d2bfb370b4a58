use app::{mpsc, worker::Worker, BoxFuture, FutureExt, SinkExt};
use ticker_grid::{PollConfig, PollController, PollHandle, PollState, TickerSource};
use tokio::sync::watch;
use tracing::info;

use crate::navigation::Route;

/// Mounts a ticker poller while the Table screen is on top of the stack and
/// unmounts it as soon as the user leaves.
pub struct TablePoller<S> {
    source: S,
    config: PollConfig,
}

impl<S> TablePoller<S> {
    pub fn new(source: S, config: PollConfig) -> Self {
        Self { source, config }
    }
}

async fn next_poll_state(mounted: &mut Option<PollHandle>) -> Option<PollState> {
    match mounted {
        Some(handle) => {
            let state = handle.state();
            state.changed().await.ok()?;
            let next = state.borrow_and_update().clone();
            Some(next)
        }
        None => std::future::pending().await,
    }
}

impl<'f, S> Worker<'f, Route, PollState> for TablePoller<S>
where
    S: TickerSource + Clone + 'static,
{
    fn work(
        self: Box<Self>,
        mut route_rx: watch::Receiver<Option<Route>>,
        mut state_tx: mpsc::Sender<PollState>,
    ) -> BoxFuture<'f, ()> {
        async move {
            let mut mounted: Option<PollHandle> = None;
            loop {
                let next = tokio::select! {
                    changed = route_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let route = *route_rx.borrow_and_update();
                        match (route, mounted.take()) {
                            (Some(Route::Table), None) => {
                                let controller =
                                    PollController::new(self.source.clone(), self.config.clone());
                                mounted = Some(controller.mount());
                                PollState::Loading
                            }
                            (Some(Route::Table), Some(handle)) => {
                                mounted = Some(handle);
                                continue;
                            }
                            (_, Some(handle)) => {
                                handle.unmount();
                                PollState::Idle
                            }
                            (_, None) => continue,
                        }
                    }
                    Some(state) = next_poll_state(&mut mounted) => state,
                };

                info!(state = state_name(&next), "Table state changed");
                if state_tx.send(next).await.is_err() {
                    break;
                }
            }
        }
        .boxed()
    }
}

fn state_name(state: &PollState) -> &'static str {
    match state {
        PollState::Idle => "idle",
        PollState::Loading => "loading",
        PollState::Ready { stale: None, .. } => "ready",
        PollState::Ready { .. } => "stale",
        PollState::Failed { .. } => "failed",
    }
}
