use std::time::Duration;

use tokio::sync::watch;
use tracing::trace;

/// Holds back a rapidly changing value until it has stayed put for the quiet
/// period, then publishes it once.
///
/// Every change to the input restarts the timer. The settled side starts out
/// equal to the initial value, and a settle that lands on the value already
/// published is not published again.
pub struct Debouncer<T> {
    input: watch::Sender<T>,
    settled: watch::Receiver<T>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Must be called from within a tokio runtime. The timer task exits once
    /// the `Debouncer` is dropped.
    pub fn new(initial: T, quiet: Duration) -> Self {
        let (input_tx, input_rx) = watch::channel(initial.clone());
        let (settled_tx, settled_rx) = watch::channel(initial);

        tokio::spawn(run_gate(input_rx, settled_tx, quiet));

        Self {
            input: input_tx,
            settled: settled_rx,
        }
    }

    pub fn set(&self, value: T) {
        self.input.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    pub fn input(&self) -> T {
        self.input.borrow().clone()
    }

    pub fn settled(&self) -> T {
        self.settled.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.settled.clone()
    }
}

async fn run_gate<T>(mut input: watch::Receiver<T>, settled: watch::Sender<T>, quiet: Duration)
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    loop {
        if input.changed().await.is_err() {
            return;
        }

        // Restart the quiet period on every change until the input holds still.
        loop {
            tokio::select! {
                changed = input.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = tokio::time::sleep(quiet) => break,
            }
        }

        let latest = input.borrow_and_update().clone();
        let emitted = settled.send_if_modified(|current| {
            if *current == latest {
                return false;
            }
            *current = latest;
            true
        });
        trace!(emitted, "Debounce period elapsed");
    }
}
