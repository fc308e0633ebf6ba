//! Last-write-wins debouncing of search input.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

enum Command<T> {
    Push(T, Instant),
    Cancel,
}

/// Emits a value once input has been quiet for the debounce delay.
///
/// Every [`push`](Self::push) replaces the pending value and restarts the
/// quiet period, so a burst of keystrokes produces a single emission carrying
/// the last value. Emissions are read with [`settled`](Self::settled).
///
/// The timer runs on a background tokio task that is aborted when the
/// debouncer is dropped.
pub struct SearchDebouncer<T> {
    delay: Duration,
    commands: mpsc::UnboundedSender<Command<T>>,
    settled: mpsc::UnboundedReceiver<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> SearchDebouncer<T> {
    /// Start a debouncer. Must be called from within a tokio runtime.
    pub fn new(delay: Duration) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let (tx, settled) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(rx, tx));
        Self {
            delay,
            commands,
            settled,
            task,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value and restart the quiet period
    pub fn push(&self, value: T) {
        let deadline = Instant::now() + self.delay;
        let _ = self.commands.send(Command::Push(value, deadline));
    }

    /// Drop the pending value and anything emitted but not yet read
    pub fn cancel(&mut self) {
        let _ = self.commands.send(Command::Cancel);
        while self.settled.try_recv().is_ok() {}
    }

    /// Wait for the next emission. Returns `None` if the timer task is gone.
    pub async fn settled(&mut self) -> Option<T> {
        self.settled.recv().await
    }

    /// An emission that is already available, without waiting
    pub fn try_settled(&mut self) -> Option<T> {
        self.settled.try_recv().ok()
    }
}

impl<T> Drop for SearchDebouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T>(
    mut commands: mpsc::UnboundedReceiver<Command<T>>,
    settled: mpsc::UnboundedSender<T>,
) {
    let mut pending: Option<(T, Instant)> = None;
    loop {
        let deadline = pending.as_ref().map(|(_, deadline)| *deadline);
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Push(value, deadline)) => pending = Some((value, deadline)),
                Some(Command::Cancel) => pending = None,
                None => break,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some((value, _)) = pending.take()
                    && settled.send(value).is_err()
                {
                    break;
                }
            }
        }
    }
}
