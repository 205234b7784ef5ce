//! Simulated recognition worker
//!
//! A background thread that polls the work queue for pending crops,
//! simulates a slow OCR model, and writes one `.tex` result per crop.
//! The only signal crossing the thread boundary is a single cancel
//! flag; everything else goes through the queue directory.
//!
//! Exactly one worker per queue: pending detection does not lock or
//! rename items, so a second instance would double-process them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::WorkerConfig;
use crate::queue::WorkQueue;

/// Placeholder recognition outputs, consumed round-robin
const LATEX_SNIPPETS: [&str; 10] = [
    r"\hat{y}=\sigma(Wx+b)",
    r"L=\frac{1}{N}\sum_{i=1}^{N}(y_i-\hat{y}_i)^2",
    r"p(z\mid x)=\frac{p(x\mid z)p(z)}{p(x)}",
    r"\theta \leftarrow \theta-\eta\nabla_\theta L",
    r"q(z) \approx p(z \mid x)",
    r"\mathrm{ELBO}=\mathbb{E}_{q}[\log p(x,z)]-\mathbb{E}_{q}[\log q(z)]",
    r"K(x_i,x_j)=\exp\left(-\frac{\|x_i-x_j\|^2}{2\sigma^2}\right)",
    r"a^{(l)}=\mathrm{ReLU}(W^{(l)}a^{(l-1)}+b^{(l)})",
    r"\text{softmax}(z)_k = \frac{e^{z_k}}{\sum_j e^{z_j}}",
    r"f(x)=\mathrm{sign}(w^Tx+b)",
];

/// Whether a snippet is one of the fixed placeholder outputs
pub fn is_snippet(text: &str) -> bool {
    LATEX_SNIPPETS.contains(&text)
}

/// Deterministic round-robin over the snippet set
///
/// One cursor per worker instance, advancing by one per processed item
/// regardless of item identity.
#[derive(Debug, Default)]
pub struct SnippetCycle {
    next: usize,
}

impl SnippetCycle {
    pub fn next(&mut self) -> &'static str {
        let snippet = LATEX_SNIPPETS[self.next];
        self.next = (self.next + 1) % LATEX_SNIPPETS.len();
        snippet
    }
}

/// Shared stop signal between the orchestrator and the worker
///
/// A single boolean flip: raised once, never lowered.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Worker lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Running,
    Stopping,
    Terminated,
}

/// The recognition loop over a work queue
pub struct RecognitionWorker<Q: WorkQueue> {
    queue: Q,
    config: WorkerConfig,
    token: CancelToken,
    snippets: SnippetCycle,
}

impl<Q: WorkQueue> RecognitionWorker<Q> {
    pub fn new(queue: Q, config: WorkerConfig, token: CancelToken) -> Self {
        Self {
            queue,
            config,
            token,
            snippets: SnippetCycle::default(),
        }
    }

    /// Run until the cancel token is raised
    ///
    /// The token is checked before each item and at every tick of the
    /// simulated recognition, so stop latency is bounded by one tick,
    /// never by a full item.
    pub fn run(mut self) {
        info!("recognition worker started");
        let mut state = WorkerState::Running;
        loop {
            state = match state {
                WorkerState::Running => self.poll_once(),
                WorkerState::Stopping => {
                    info!("recognition worker shutting down");
                    WorkerState::Terminated
                }
                WorkerState::Terminated => break,
            };
        }
    }

    /// One scan pass over the queue
    fn poll_once(&mut self) -> WorkerState {
        if self.token.is_cancelled() {
            return WorkerState::Stopping;
        }
        if !self.queue.ready() {
            // Queue directory not created yet; recoverable, keep waiting
            return self.wait(self.config.missing_dir_wait);
        }

        let pending = match self.queue.list_pending() {
            Ok(pending) => pending,
            Err(err) => {
                warn!("queue scan failed: {err:#}");
                return self.wait(self.config.idle_wait);
            }
        };

        let mut work_found = false;
        for stem in pending {
            if self.token.is_cancelled() {
                return WorkerState::Stopping;
            }
            work_found = true;
            if let WorkerState::Stopping = self.recognize(&stem) {
                return WorkerState::Stopping;
            }
        }

        if !work_found {
            return self.wait(self.config.idle_wait);
        }
        WorkerState::Running
    }

    /// Simulate recognition of one item and persist its result
    fn recognize(&mut self, stem: &str) -> WorkerState {
        let snippet = self.snippets.next();
        info!("processing {stem} -> '{snippet}'");
        if let WorkerState::Stopping = self.wait(self.config.recognition_time()) {
            // Cancelled mid-item: no result written, item stays pending
            return WorkerState::Stopping;
        }
        match self.queue.mark_done(stem, snippet) {
            Ok(()) => info!("wrote {stem} result"),
            // The item stays pending and is retried on a later pass
            Err(err) => error!("failed to write result for {stem}: {err:#}"),
        }
        WorkerState::Running
    }

    /// Sleep for `total`, waking at tick granularity to poll the token
    fn wait(&self, total: Duration) -> WorkerState {
        let tick = self.config.tick.min(total).max(Duration::from_millis(1));
        let mut remaining = total;
        while !remaining.is_zero() {
            if self.token.is_cancelled() {
                return WorkerState::Stopping;
            }
            let step = tick.min(remaining);
            std::thread::sleep(step);
            remaining -= step;
        }
        if self.token.is_cancelled() {
            WorkerState::Stopping
        } else {
            WorkerState::Running
        }
    }
}

/// Handle to a spawned worker thread
///
/// Dropping the handle cancels the worker and joins the thread, so the
/// worker is stopped and awaited on every exit path.
pub struct WorkerHandle {
    token: CancelToken,
    handle: Option<JoinHandle<()>>,
}

/// Start a recognition worker on its own thread
pub fn spawn<Q>(queue: Q, config: WorkerConfig) -> WorkerHandle
where
    Q: WorkQueue + Send + 'static,
{
    let token = CancelToken::new();
    let worker = RecognitionWorker::new(queue, config, token.clone());
    let handle = std::thread::spawn(move || worker.run());
    WorkerHandle {
        token,
        handle: Some(handle),
    }
}

impl WorkerHandle {
    /// Raise the stop signal and block until the worker has exited
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
