use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use super::{SUMMARY_UNAVAILABLE, Summarizer, SummaryFacts};

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "lowercase")]
pub enum SummaryState {
    Idle,
    Pending,
    Ready(String),
}

/// Deferred, cancelable summary requests keyed by the latest facts.
///
/// Each [`schedule`](SummaryDebouncer::schedule) cancels whatever is pending,
/// waits for the settle delay and only then calls the summarizer, so a burst
/// of input edits costs a single request.
pub struct SummaryDebouncer {
    summarizer: Arc<dyn Summarizer>,
    settle_delay: Duration,
    state: Arc<watch::Sender<SummaryState>>,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<AbortHandle>>,
}

impl SummaryDebouncer {
    pub fn new(summarizer: Arc<dyn Summarizer>, settle_delay: Duration) -> Self {
        let (state, _) = watch::channel(SummaryState::Idle);
        Self {
            summarizer,
            settle_delay,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SummaryState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SummaryState {
        self.state.borrow().clone()
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, facts: SummaryFacts) {
        // Taken under the lock so the newest generation is always the task
        // left in `pending`.
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = pending.take() {
            debug!("cancelling pending summary request");
            previous.abort();
        }
        self.state.send_replace(SummaryState::Pending);

        let summarizer = Arc::clone(&self.summarizer);
        let state = Arc::clone(&self.state);
        let latest = Arc::clone(&self.generation);
        let delay = self.settle_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let text = match summarizer.summarize(&facts).await {
                Ok(text) => text,
                Err(err) => {
                    warn!(error = %err, "summary request failed");
                    SUMMARY_UNAVAILABLE.to_string()
                }
            };
            if latest.load(Ordering::SeqCst) == generation {
                state.send_replace(SummaryState::Ready(text));
            }
        });
        *pending = Some(handle.abort_handle());
    }

    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        self.state.send_if_modified(|state| {
            if *state == SummaryState::Pending {
                *state = SummaryState::Idle;
                true
            } else {
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SalaryInputs, compute};
    use crate::rates::default_rates;
    use crate::summary::SummaryError;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct RecordingSummarizer {
        calls: AtomicUsize,
        last_gross: Mutex<Option<f64>>,
    }

    #[async_trait]
    impl Summarizer for RecordingSummarizer {
        async fn summarize(&self, facts: &SummaryFacts) -> Result<String, SummaryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_gross.lock().expect("lock") = Some(facts.gross_salary);
            Ok(format!("gross {}", facts.gross_salary))
        }
    }

    struct FailingSummarizer;

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        async fn summarize(&self, _facts: &SummaryFacts) -> Result<String, SummaryError> {
            Err(SummaryError::Transport("connection refused".to_string()))
        }
    }

    fn facts_for(gross: f64) -> SummaryFacts {
        let inputs = SalaryInputs {
            gross_salary: gross,
            ..SalaryInputs::default()
        };
        let breakdown = compute(&inputs, &default_rates(inputs.tax_year));
        SummaryFacts::new(&inputs, &breakdown)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_edits_issues_one_request_for_latest_facts() {
        let summarizer = Arc::new(RecordingSummarizer::default());
        let debouncer = SummaryDebouncer::new(summarizer.clone(), DEFAULT_SETTLE_DELAY);
        let mut rx = debouncer.subscribe();

        for gross in [30_000.0, 40_000.0, 50_000.0] {
            debouncer.schedule(facts_for(gross));
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert_eq!(debouncer.state(), SummaryState::Pending);
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);

        let ready = rx
            .wait_for(|state| matches!(state, SummaryState::Ready(_)))
            .await
            .expect("sender alive")
            .clone();
        assert_eq!(ready, SummaryState::Ready("gross 50000".to_string()));
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*summarizer.last_gross.lock().expect("lock"), Some(50_000.0));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_publish_static_message() {
        let debouncer = SummaryDebouncer::new(Arc::new(FailingSummarizer), DEFAULT_SETTLE_DELAY);
        let mut rx = debouncer.subscribe();
        debouncer.schedule(facts_for(55_000.0));

        let ready = rx
            .wait_for(|state| matches!(state, SummaryState::Ready(_)))
            .await
            .expect("sender alive")
            .clone();
        assert_eq!(ready, SummaryState::Ready(SUMMARY_UNAVAILABLE.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_request() {
        let summarizer = Arc::new(RecordingSummarizer::default());
        let debouncer = SummaryDebouncer::new(summarizer.clone(), DEFAULT_SETTLE_DELAY);

        debouncer.schedule(facts_for(55_000.0));
        debouncer.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(debouncer.state(), SummaryState::Idle);
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_schedules_always_settle() {
        let summarizer = Arc::new(RecordingSummarizer::default());
        let debouncer = Arc::new(SummaryDebouncer::new(
            summarizer.clone(),
            Duration::from_millis(5),
        ));
        let mut rx = debouncer.subscribe();

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let debouncer = Arc::clone(&debouncer);
                tokio::spawn(async move {
                    debouncer.schedule(facts_for(20_000.0 + f64::from(i) * 1_000.0));
                })
            })
            .collect();
        for task in tasks {
            task.await.expect("schedule task");
        }

        let settled = tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|state| matches!(state, SummaryState::Ready(_))),
        )
        .await
        .expect("summary settles")
        .expect("sender alive")
        .clone();
        assert!(matches!(settled, SummaryState::Ready(_)));
        assert!(summarizer.calls.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn state_serializes_with_status_tag() {
        let idle = serde_json::to_value(SummaryState::Idle).expect("serialize");
        assert_eq!(idle, serde_json::json!({ "status": "idle" }));
        let ready = serde_json::to_value(SummaryState::Ready("• hi".to_string())).expect("serialize");
        assert_eq!(ready, serde_json::json!({ "status": "ready", "text": "• hi" }));
    }
}
