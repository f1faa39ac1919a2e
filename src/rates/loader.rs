use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::debug;

use super::{RatesProvider, RatesSnapshot};
use crate::core::TaxYear;

/// Keeps the rates for the most recently requested tax year.
///
/// Each [`request`](RatesLoader::request) supersedes the previous one: the
/// older fetch is aborted and, should it still finish, its result is
/// dropped. Subscribers only ever observe the latest year's snapshot.
pub struct RatesLoader {
    provider: RatesProvider,
    current: Arc<watch::Sender<RatesSnapshot>>,
    generation: Arc<AtomicU64>,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl RatesLoader {
    pub fn new(provider: RatesProvider, initial_year: TaxYear) -> Self {
        let (current, _) = watch::channel(RatesSnapshot::defaults(initial_year));
        Self {
            provider,
            current: Arc::new(current),
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RatesSnapshot> {
        self.current.subscribe()
    }

    pub fn current(&self) -> RatesSnapshot {
        self.current.borrow().clone()
    }

    /// Starts fetching `tax_year`. Must be called from within a tokio runtime.
    pub fn request(&self, tax_year: TaxYear) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = in_flight.take() {
            debug!(%tax_year, "superseding in-flight rates fetch");
            previous.abort();
        }

        let provider = self.provider.clone();
        let current = Arc::clone(&self.current);
        let latest = Arc::clone(&self.generation);
        let handle = tokio::spawn(async move {
            let snapshot = provider.fetch_rates(tax_year).await;
            if latest.load(Ordering::SeqCst) == generation {
                current.send_replace(snapshot);
            }
        });
        *in_flight = Some(handle.abort_handle());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{RatesError, RatesOrigin, RatesSource};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Answers 2023/24 slowly and every other year immediately, each with a
    /// distinct allowance so the winner is identifiable.
    struct SlowForOldYear;

    #[async_trait]
    impl RatesSource for SlowForOldYear {
        async fn fetch_raw(&self, tax_year: TaxYear) -> Result<String, RatesError> {
            let allowance = match tax_year {
                TaxYear::Y2023To24 => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    11_000
                }
                TaxYear::Y2024To25 => 12_000,
                TaxYear::Y2025To26 => 13_000,
            };
            Ok(format!(r#"{{"personalAllowance": {allowance}}}"#))
        }
    }

    fn loader() -> RatesLoader {
        RatesLoader::new(
            RatesProvider::new(Arc::new(SlowForOldYear)),
            TaxYear::Y2024To25,
        )
    }

    #[tokio::test]
    async fn starts_with_default_snapshot() {
        let loader = loader();
        let snapshot = loader.current();
        assert_eq!(snapshot.origin, RatesOrigin::Default);
        assert_eq!(snapshot.tax_year, TaxYear::Y2024To25);
    }

    #[tokio::test]
    async fn publishes_fetched_snapshot() {
        let loader = loader();
        let mut rx = loader.subscribe();
        loader.request(TaxYear::Y2025To26);
        rx.changed().await.expect("sender alive");

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.tax_year, TaxYear::Y2025To26);
        assert_eq!(snapshot.rates.personal_allowance, 13_000.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_publish_a_snapshot() {
        let loader = Arc::new(loader());
        let mut rx = loader.subscribe();

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let loader = Arc::clone(&loader);
                let year = if i % 2 == 0 {
                    TaxYear::Y2024To25
                } else {
                    TaxYear::Y2025To26
                };
                tokio::spawn(async move { loader.request(year) })
            })
            .collect();
        for task in tasks {
            task.await.expect("request task");
        }

        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("snapshot published")
            .expect("sender alive");
        assert_eq!(loader.current().origin, RatesOrigin::Live);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_request_supersedes_slow_fetch() {
        let loader = loader();
        let mut rx = loader.subscribe();

        loader.request(TaxYear::Y2023To24);
        tokio::task::yield_now().await;
        loader.request(TaxYear::Y2024To25);

        rx.changed().await.expect("sender alive");
        assert_eq!(rx.borrow().rates.personal_allowance, 12_000.0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let snapshot = loader.current();
        assert_eq!(snapshot.tax_year, TaxYear::Y2024To25);
        assert_eq!(snapshot.rates.personal_allowance, 12_000.0);
        assert!(!rx.has_changed().expect("sender alive"));
    }
}
