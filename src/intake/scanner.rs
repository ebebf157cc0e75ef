use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::api::ItemLookup;
use crate::intake::timer::TimerHandle;
use crate::models::ItemRecord;

/// Result of one debounced lookup
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Found(ItemRecord),
    NotFound(String),
    Failed { code: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    /// Empty buffer
    Idle,
    /// Buffer below the minimum length
    Scanning,
    /// Debounce armed or lookup in flight for this code
    ItemPending(String),
    Closed,
}

#[derive(Debug)]
struct ScanMessage {
    generation: u64,
    outcome: ScanOutcome,
}

/// Keyboard-wedge scanner input with a restartable debounce.
///
/// Every change to the buffer bumps the generation and aborts the previous
/// timer together with any lookup it started, so at most one lookup runs and
/// only the latest buffer value can produce an outcome. A lookup that already
/// finished is kept in `queued` and its code is cleared from the buffer before
/// new input lands.
pub struct ScanIntake {
    lookup: Arc<dyn ItemLookup>,
    min_length: usize,
    debounce: Duration,
    buffer: String,
    pending_code: Option<String>,
    generation: u64,
    timer: Option<TimerHandle>,
    queued: VecDeque<ScanOutcome>,
    closed: bool,
    tx: mpsc::UnboundedSender<ScanMessage>,
    rx: mpsc::UnboundedReceiver<ScanMessage>,
}

impl ScanIntake {
    pub fn new(lookup: Arc<dyn ItemLookup>, min_length: usize, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            lookup,
            min_length: min_length.max(1),
            debounce,
            buffer: String::new(),
            pending_code: None,
            generation: 0,
            timer: None,
            queued: VecDeque::new(),
            closed: false,
            tx,
            rx,
        }
    }

    /// Append keystrokes to the buffer
    pub fn input(&mut self, text: &str) {
        if self.closed {
            return;
        }
        self.collect_finished();
        self.buffer.push_str(text);
        self.rearm();
    }

    /// Replace the whole buffer, as when the hidden field value changes
    pub fn set_buffer(&mut self, text: &str) {
        if self.closed {
            return;
        }
        self.collect_finished();
        self.buffer.clear();
        self.buffer.push_str(text);
        self.rearm();
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn state(&self) -> ScanState {
        if self.closed {
            ScanState::Closed
        } else if let Some(code) = &self.pending_code {
            ScanState::ItemPending(code.clone())
        } else if self.buffer.trim().is_empty() {
            ScanState::Idle
        } else {
            ScanState::Scanning
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.closed && (self.pending_code.is_some() || !self.queued.is_empty())
    }

    /// Move results of finished lookups into the queue
    fn collect_finished(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            if self.closed || message.generation != self.generation {
                continue;
            }
            let outcome = self.accept(message.outcome);
            self.queued.push_back(outcome);
        }
    }

    fn rearm(&mut self) {
        self.cancel_pending();

        let code = self.buffer.trim().to_string();
        if code.chars().count() < self.min_length {
            return;
        }

        let generation = self.generation;
        let lookup = self.lookup.clone();
        let tx = self.tx.clone();
        let task_code = code.clone();
        self.timer = Some(TimerHandle::schedule(self.debounce, async move {
            tracing::debug!("Scan lookup: code={}", task_code);
            let outcome = match lookup.find_by_code(&task_code).await {
                Ok(Some(item)) => ScanOutcome::Found(item),
                Ok(None) => ScanOutcome::NotFound(task_code),
                Err(e) => ScanOutcome::Failed {
                    code: task_code,
                    reason: e.to_string(),
                },
            };
            // Receiver gone means the intake was dropped
            let _ = tx.send(ScanMessage {
                generation,
                outcome,
            });
        }));
        self.pending_code = Some(code);
    }

    fn cancel_pending(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }
        self.pending_code = None;
        self.generation += 1;
    }

    /// Wait for the outcome of the pending lookup. Returns `None` when nothing
    /// is pending or the intake is closed. The buffer is reset after an outcome.
    pub async fn next_outcome(&mut self) -> Option<ScanOutcome> {
        loop {
            if self.closed {
                return None;
            }
            if let Some(outcome) = self.queued.pop_front() {
                return Some(outcome);
            }
            let Some(timer) = &self.timer else {
                return None;
            };
            let message = match self.rx.try_recv() {
                Ok(message) => message,
                Err(_) if timer.is_finished() => {
                    // Task ended without reporting
                    self.timer = None;
                    self.pending_code = None;
                    return None;
                }
                Err(_) => self.rx.recv().await?,
            };
            if message.generation != self.generation {
                tracing::debug!("Discarding stale scan result");
                continue;
            }
            return Some(self.accept(message.outcome));
        }
    }

    /// Non-blocking variant of [`ScanIntake::next_outcome`]
    pub fn try_next_outcome(&mut self) -> Option<ScanOutcome> {
        if self.closed {
            return None;
        }
        self.collect_finished();
        self.queued.pop_front()
    }

    fn accept(&mut self, outcome: ScanOutcome) -> ScanOutcome {
        self.timer = None;
        self.pending_code = None;
        self.buffer.clear();
        outcome
    }

    /// Clear the buffer and drop anything pending, keeping the intake open
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.buffer.clear();
        self.queued.clear();
    }

    /// Tear down: cancel timers and ignore every result still in transit
    pub fn close(&mut self) {
        if !self.closed {
            tracing::debug!("Scan intake closed");
        }
        self.reset();
        self.closed = true;
    }

    pub fn reopen(&mut self) {
        self.closed = false;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
