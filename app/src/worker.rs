use futures::{channel::mpsc, future::BoxFuture};
use tokio::sync::watch;

/// Reads its slice of the app state and feeds results back into it.
/// `None` on the input means the state has not been reduced yet.
pub trait Worker<'f, Consumed, Produced> {
    fn work(
        self: Box<Self>,
        state_rx: watch::Receiver<Option<Consumed>>,
        state_tx: mpsc::Sender<Produced>,
    ) -> BoxFuture<'f, ()>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Only feeds the app state, e.g. from user input.
pub trait ProducerWorker<'f, T> {
    fn work(self: Box<Self>, state_tx: mpsc::Sender<T>) -> BoxFuture<'f, ()>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Only observes the app state, e.g. to draw it.
pub trait ConsumerWorker<'f, T> {
    fn work(self: Box<Self>, state_rx: watch::Receiver<Option<T>>) -> BoxFuture<'f, ()>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
