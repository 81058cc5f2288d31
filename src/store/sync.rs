use std::fmt;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::problem_words::ProblemWord;
use crate::error::{StoreError, StoreResult};
use crate::session::result::TestSession;
use crate::store::SessionStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    Syncing,
    Success,
    Error(String),
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Idle => f.write_str("idle"),
            SyncStatus::Syncing => f.write_str("saving"),
            SyncStatus::Success => f.write_str("saved"),
            SyncStatus::Error(msg) => write!(f, "error {msg}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX))
    }
}

enum SyncCommand {
    SaveSession(Box<TestSession>),
    SaveProblemWords(Vec<ProblemWord>),
    Clear,
    Flush(mpsc::Sender<()>),
    Shutdown,
}

impl SyncCommand {
    fn label(&self) -> &'static str {
        match self {
            SyncCommand::SaveSession(_) => "save session",
            SyncCommand::SaveProblemWords(_) => "save problem words",
            SyncCommand::Clear => "clear",
            SyncCommand::Flush(_) => "flush",
            SyncCommand::Shutdown => "shutdown",
        }
    }
}

/// Writes to a `SessionStore` on a background thread. Callers never wait
/// on a write and never see its failure beyond `status()`.
pub struct SyncWorker {
    tx: mpsc::Sender<SyncCommand>,
    status: Arc<Mutex<SyncStatus>>,
    handle: Option<JoinHandle<()>>,
}

fn set_status(status: &Mutex<SyncStatus>, value: SyncStatus) {
    let mut guard = status.lock().unwrap_or_else(|e| e.into_inner());
    *guard = value;
}

fn run_with_retry(
    store: &dyn SessionStore,
    command: &SyncCommand,
    policy: RetryPolicy,
) -> StoreResult<()> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        let outcome = match command {
            SyncCommand::SaveSession(session) => store.save_session(session),
            SyncCommand::SaveProblemWords(words) => store.save_problem_words(words),
            SyncCommand::Clear => store.clear_all(),
            SyncCommand::Flush(_) | SyncCommand::Shutdown => Ok(()),
        };
        match outcome {
            Ok(()) => return Ok(()),
            Err(e) if attempt < attempts => {
                let delay = policy.backoff(attempt);
                warn!(
                    op = command.label(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "sync failed, retrying"
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

impl SyncWorker {
    pub fn spawn(store: Box<dyn SessionStore>, policy: RetryPolicy) -> Self {
        let (tx, rx) = mpsc::channel::<SyncCommand>();
        let status = Arc::new(Mutex::new(SyncStatus::Idle));
        let thread_status = Arc::clone(&status);

        let handle = thread::spawn(move || {
            for command in rx {
                match command {
                    SyncCommand::Shutdown => break,
                    SyncCommand::Flush(ack) => {
                        let _ = ack.send(());
                    }
                    command => {
                        set_status(&thread_status, SyncStatus::Syncing);
                        match run_with_retry(store.as_ref(), &command, policy) {
                            Ok(()) => {
                                debug!(op = command.label(), "sync complete");
                                set_status(&thread_status, SyncStatus::Success);
                            }
                            Err(e) => {
                                warn!(op = command.label(), error = %e, "sync gave up");
                                set_status(&thread_status, SyncStatus::Error(e.to_string()));
                            }
                        }
                    }
                }
            }
        });

        Self {
            tx,
            status,
            handle: Some(handle),
        }
    }

    fn send(&self, command: SyncCommand) {
        let label = command.label();
        if self.tx.send(command).is_err() {
            warn!(op = label, "sync worker stopped, dropping write");
            set_status(&self.status, SyncStatus::Error(StoreError::WorkerGone.to_string()));
        }
    }

    pub fn save_session(&self, session: TestSession) {
        info!(id = %session.id, practice = session.is_practice, "queueing session save");
        self.send(SyncCommand::SaveSession(Box::new(session)));
    }

    pub fn save_problem_words(&self, words: Vec<ProblemWord>) {
        self.send(SyncCommand::SaveProblemWords(words));
    }

    pub fn clear(&self) {
        self.send(SyncCommand::Clear);
    }

    pub fn status(&self) -> SyncStatus {
        self.status
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Blocks until every write queued before this call has been handled.
    pub fn flush(&self) -> StoreResult<()> {
        let (ack_tx, ack_rx) = mpsc::channel();
        self.tx
            .send(SyncCommand::Flush(ack_tx))
            .map_err(|_| StoreError::WorkerGone)?;
        ack_rx.recv().map_err(|_| StoreError::WorkerGone)
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        let _ = self.tx.send(SyncCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
