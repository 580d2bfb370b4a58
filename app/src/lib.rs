use core::fmt;

pub use futures::{
    channel::mpsc, future::BoxFuture, stream::FuturesUnordered, FutureExt, SinkExt, StreamExt,
};
pub use futures::{Sink, Stream};
use tokio::sync::watch;
use tracing::{debug, info};

pub mod worker;

/// Projection of the app state a consumer is interested in.
pub trait Reduced<T> {
    fn reduce(&self) -> T;
}

/// How a worker's output is folded into the app state.
pub trait InjectedTo<S> {
    fn inject_to(self, state: S) -> S;
}

type Update<'f, S> = Box<dyn FnOnce(S) -> S + Send + 'f>;

pub struct App<'f, S> {
    state: watch::Receiver<S>,
    state_updater: BoxFuture<'f, ()>,
    runners: Vec<BoxFuture<'f, ()>>,
}

pub struct AppBuilder<'f, S> {
    runners: Vec<BoxFuture<'f, ()>>,
    state_updater: BoxFuture<'f, ()>,
    state_tx: mpsc::Sender<Update<'f, S>>,
    state_rx: watch::Receiver<S>,
}

impl<'f, S> App<'f, S>
where
    S: fmt::Debug + Clone + PartialEq + Send + Sync + 'f,
{
    /// Every state change goes through the single updater future, so two
    /// producers never overwrite each other's injection.
    pub fn build(initial_state: S) -> AppBuilder<'f, S> {
        let (state_tx, mut state_rx) = mpsc::channel::<Update<'f, S>>(1);
        let (wstate_tx, wstate_rx) = watch::channel(initial_state);
        let state_updater = async move {
            while let Some(update) = state_rx.next().await {
                wstate_tx.send_if_modified(|state| {
                    let new_state = update(state.clone());
                    if new_state != *state {
                        *state = new_state;
                        true
                    } else {
                        false
                    }
                });
            }
            debug!("state updater finished");
        }
        .boxed();

        AppBuilder {
            runners: Vec::new(),
            state_updater,
            state_tx,
            state_rx: wstate_rx,
        }
    }

    pub fn state(&self) -> watch::Receiver<S> {
        self.state.clone()
    }

    fn into_futures(self) -> (FuturesUnordered<BoxFuture<'f, ()>>, watch::Receiver<S>) {
        let futures = FuturesUnordered::new();
        futures.push(self.state_updater);
        for runner in self.runners {
            futures.push(runner);
        }

        let total_len = futures.len();
        info!(?total_len, "run futures");
        (futures, self.state)
    }

    pub async fn run(self) {
        let (mut futures, _state) = self.into_futures();
        while futures.next().await.is_some() {}
        info!("all futures returned");
    }

    /// Drives every worker until `done` holds for the app state. Workers that
    /// are still running at that point are dropped.
    pub async fn run_until(self, done: impl Fn(&S) -> bool) {
        let (mut futures, mut state) = self.into_futures();

        let all_returned = async move { while futures.next().await.is_some() {} };
        let finished = async move {
            loop {
                let is_done = done(&*state.borrow_and_update());
                if is_done {
                    info!("app reached final state");
                    break;
                }
                if state.changed().await.is_err() {
                    break;
                }
            }
        };
        futures::pin_mut!(all_returned, finished);

        futures::future::select(all_returned, finished).await;
        info!("app finished");
    }
}

impl<'f, AppState> AppBuilder<'f, AppState>
where
    AppState: fmt::Debug + Clone + PartialEq + Send + Sync + 'f,
{
    async fn state_reducer<WorkerState>(
        mut app_state: watch::Receiver<AppState>,
        consumer: watch::Sender<Option<WorkerState>>,
    ) where
        WorkerState: PartialEq + fmt::Debug,
        AppState: Reduced<WorkerState>,
    {
        loop {
            let reduced = app_state.borrow_and_update().reduce();
            consumer.send_if_modified(|current| {
                if current.as_ref() != Some(&reduced) {
                    *current = Some(reduced);
                    true
                } else {
                    false
                }
            });

            if app_state.changed().await.is_err() || consumer.is_closed() {
                break;
            }
        }
    }

    async fn state_injector<WorkerState>(
        mut provider_stream: impl Stream<Item = WorkerState> + Unpin,
        mut app_state_sink: mpsc::Sender<Update<'f, AppState>>,
    ) where
        WorkerState: InjectedTo<AppState> + fmt::Debug + Send + 'f,
    {
        while let Some(data) = provider_stream.next().await {
            debug!(?data, "Got some data");

            let update: Update<'f, AppState> = Box::new(move |state| data.inject_to(state));
            if app_state_sink.send(update).await.is_err() {
                break;
            }
        }
    }

    pub fn add_producer<WorkerState>(
        mut self,
        worker: impl worker::ProducerWorker<'f, WorkerState> + Send + 'f,
    ) -> Self
    where
        WorkerState: InjectedTo<AppState> + fmt::Debug + Send + 'f,
    {
        info!(worker = worker.name(), "add producer");
        let (inducer_tx, inducer_rx) = mpsc::channel::<WorkerState>(100);
        let injector = Self::state_injector(inducer_rx, self.state_tx.clone());
        let work = Box::new(worker).work(inducer_tx);

        self.runners.push(
            async move {
                futures::future::join(injector, work).await;
            }
            .boxed(),
        );
        self
    }

    pub fn add_consumer<WorkerState>(
        mut self,
        worker: impl worker::ConsumerWorker<'f, WorkerState> + Send + 'f,
    ) -> Self
    where
        WorkerState: PartialEq + fmt::Debug + Send + Sync + 'f,
        AppState: Reduced<WorkerState>,
    {
        info!(worker = worker.name(), "add consumer");
        let (reduced_state_tx, reduced_state_rx) = watch::channel(None);
        let reducer = Self::state_reducer(self.state_rx.clone(), reduced_state_tx);
        let work = Box::new(worker).work(reduced_state_rx);

        self.runners.push(
            async move {
                futures::future::join(reducer, work).await;
            }
            .boxed(),
        );
        self
    }

    pub fn add_worker<Consumed, Produced>(
        mut self,
        worker: impl worker::Worker<'f, Consumed, Produced> + Send + 'f,
    ) -> Self
    where
        Consumed: PartialEq + fmt::Debug + Send + Sync + 'f,
        Produced: InjectedTo<AppState> + fmt::Debug + Send + 'f,
        AppState: Reduced<Consumed>,
    {
        info!(worker = worker.name(), "add worker");
        let (inducer_tx, inducer_rx) = mpsc::channel::<Produced>(100);
        let (reduced_state_tx, reduced_state_rx) = watch::channel(None);

        let reducer = Self::state_reducer(self.state_rx.clone(), reduced_state_tx);
        let injector = Self::state_injector(inducer_rx, self.state_tx.clone());
        let work = Box::new(worker).work(reduced_state_rx, inducer_tx);

        self.runners.push(
            async move {
                futures::future::join3(reducer, injector, work).await;
            }
            .boxed(),
        );
        self
    }

    pub fn build(self) -> App<'f, AppState> {
        App {
            state: self.state_rx,
            runners: self.runners,
            state_updater: self.state_updater,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::watch;

    use super::*;
    use crate::worker::{ConsumerWorker, ProducerWorker, Worker};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        total: u32,
        doubled: u32,
        seen: Vec<u32>,
    }

    #[derive(Debug)]
    struct Add(u32);

    #[derive(Debug)]
    struct Doubled(u32);

    impl InjectedTo<Counter> for Add {
        fn inject_to(self, mut state: Counter) -> Counter {
            state.total += self.0;
            state
        }
    }

    impl InjectedTo<Counter> for Doubled {
        fn inject_to(self, mut state: Counter) -> Counter {
            state.doubled = self.0;
            state
        }
    }

    impl Reduced<u32> for Counter {
        fn reduce(&self) -> u32 {
            self.total
        }
    }

    struct Numbers(Vec<u32>);

    impl<'f> ProducerWorker<'f, Add> for Numbers {
        fn work(self: Box<Self>, mut state_tx: mpsc::Sender<Add>) -> BoxFuture<'f, ()> {
            async move {
                for n in self.0 {
                    state_tx.send(Add(n)).await.unwrap();
                }
            }
            .boxed()
        }
    }

    struct Doubler;

    impl<'f> Worker<'f, u32, Doubled> for Doubler {
        fn work(
            self: Box<Self>,
            mut state_rx: watch::Receiver<Option<u32>>,
            mut state_tx: mpsc::Sender<Doubled>,
        ) -> BoxFuture<'f, ()> {
            async move {
                while state_rx.changed().await.is_ok() {
                    let total = *state_rx.borrow_and_update();
                    if let Some(total) = total {
                        if state_tx.send(Doubled(total * 2)).await.is_err() {
                            break;
                        }
                    }
                }
            }
            .boxed()
        }
    }

    struct Recorder(watch::Sender<Vec<u32>>);

    impl<'f> ConsumerWorker<'f, u32> for Recorder {
        fn work(self: Box<Self>, mut state_rx: watch::Receiver<Option<u32>>) -> BoxFuture<'f, ()> {
            async move {
                while state_rx.changed().await.is_ok() {
                    if let Some(total) = *state_rx.borrow_and_update() {
                        self.0.send_modify(|seen| seen.push(total));
                    }
                }
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn producers_do_not_lose_updates() {
        let app = App::build(Counter::default())
            .add_producer(Numbers(vec![1, 2, 3]))
            .add_producer(Numbers(vec![10, 20]))
            .build();
        let state = app.state();

        app.run_until(|s| s.total == 36).await;
        assert_eq!(state.borrow().total, 36);
    }

    #[tokio::test]
    async fn worker_sees_reduced_state() {
        let app = App::build(Counter::default())
            .add_producer(Numbers(vec![4]))
            .add_worker(Doubler)
            .build();

        let state = app.state();
        tokio::time::timeout(
            Duration::from_secs(5),
            app.run_until(|s| s.doubled == 8),
        )
        .await
        .unwrap();
        assert_eq!(state.borrow().total, 4);
    }

    #[tokio::test]
    async fn consumer_gets_final_value() {
        let (seen_tx, seen_rx) = watch::channel(Vec::new());
        let app = App::build(Counter::default())
            .add_producer(Numbers(vec![5, 5]))
            .add_consumer(Recorder(seen_tx))
            .build();

        tokio::time::timeout(Duration::from_secs(5), app.run())
            .await
            .unwrap();
        assert_eq!(seen_rx.borrow().last(), Some(&10));
    }
}
