use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::{sync::Semaphore, task::JoinHandle};
use tracing::instrument;

use crate::{
    catalog::Catalog,
    models::{CandidateReport, LivenessReport, NotLiveReason, ProbeOutcome, StreamLink},
    services::probe::StreamProber,
};

/// Aborts the wrapped probe task when dropped, so a cancelled `verify`
/// leaves no probes running behind it
struct AbortOnDrop(JoinHandle<ProbeOutcome>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Decides which stream sources of a movie are serving right now.
///
/// Every candidate gets exactly one probe. Probes run concurrently (at most
/// `max_concurrent_probes` at a time) and each is abandoned once
/// `probe_timeout` elapses; results are reported in catalog order no matter
/// which probe finishes first.
#[derive(Clone)]
pub struct LivenessVerifier {
    catalog: Arc<Catalog>,
    prober: Arc<dyn StreamProber>,
    probe_timeout: Duration,
    max_concurrent_probes: usize,
}

impl LivenessVerifier {
    pub fn new(
        catalog: Arc<Catalog>,
        prober: Arc<dyn StreamProber>,
        probe_timeout: Duration,
        max_concurrent_probes: usize,
    ) -> Self {
        Self {
            catalog,
            prober,
            probe_timeout,
            max_concurrent_probes: max_concurrent_probes.max(1),
        }
    }

    /// Live `{title, url}` pairs for `external_id`, in candidate order.
    /// Unknown ids and all-dead sources both yield an empty list.
    pub async fn get_live_streams(&self, external_id: &str) -> Vec<StreamLink> {
        self.verify(external_id).await.live_streams()
    }

    /// Probes every candidate of `external_id` and reports each outcome
    #[instrument(skip(self), fields(prober = self.prober.name()))]
    pub async fn verify(&self, external_id: &str) -> LivenessReport {
        let candidates: Vec<_> = self
            .catalog
            .records_for(external_id)
            .into_iter()
            .cloned()
            .collect();

        if candidates.is_empty() {
            tracing::debug!("No stream candidates for id");
            return LivenessReport {
                external_id: external_id.to_string(),
                candidates: Vec::new(),
            };
        }

        let started = Instant::now();
        let permits = Arc::new(Semaphore::new(self.max_concurrent_probes));

        // Spawn one task per candidate; handles stay in candidate order
        let mut tasks = Vec::with_capacity(candidates.len());
        for record in &candidates {
            let prober = Arc::clone(&self.prober);
            let permits = Arc::clone(&permits);
            let url = record.stream_url.clone();
            let timeout = self.probe_timeout;

            let task = tokio::spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return ProbeOutcome::not_live(NotLiveReason::Aborted(e.to_string())),
                };

                match tokio::time::timeout(timeout, prober.probe(&url)).await {
                    Ok(outcome) => outcome,
                    Err(_) => ProbeOutcome::not_live(NotLiveReason::Timeout),
                }
            });
            tasks.push(AbortOnDrop(task));
        }

        let mut reports = Vec::with_capacity(candidates.len());
        for (record, mut task) in candidates.into_iter().zip(tasks) {
            let outcome = match (&mut task.0).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(error = %e, url = %record.stream_url, "Probe task join error");
                    ProbeOutcome::not_live(NotLiveReason::Aborted(e.to_string()))
                }
            };

            if let ProbeOutcome::NotLive { reason } = &outcome {
                tracing::debug!(url = %record.stream_url, reason = %reason, "Stream source not live");
            }

            reports.push(CandidateReport { record, outcome });
        }

        let report = LivenessReport {
            external_id: external_id.to_string(),
            candidates: reports,
        };

        tracing::info!(
            candidates = report.candidates.len(),
            live = report.live_count(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Stream liveness verified"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovieRecord;
    use crate::services::probe::MockStreamProber;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::new(vec![
                MovieRecord::new("tt1", "Foo", "A bar movie", "http://u1"),
                MovieRecord::new("tt1", "Foo", "A bar movie", "http://u2"),
                MovieRecord::new("tt2", "Baz", "", "http://u3"),
                MovieRecord::new("tt3", "Triple", "", "http://a"),
                MovieRecord::new("tt3", "Triple", "", "http://b"),
                MovieRecord::new("tt3", "Triple", "", "http://c"),
            ])
            .unwrap(),
        )
    }

    fn verifier(prober: impl StreamProber + 'static, timeout: Duration) -> LivenessVerifier {
        LivenessVerifier::new(catalog(), Arc::new(prober), timeout, 8)
    }

    /// Answers after a per-URL delay, tracking peak concurrency
    struct DelayedProber {
        delays: HashMap<&'static str, (Duration, ProbeOutcome)>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl DelayedProber {
        fn new(delays: Vec<(&'static str, u64, ProbeOutcome)>) -> Self {
            Self {
                delays: delays
                    .into_iter()
                    .map(|(url, ms, outcome)| (url, (Duration::from_millis(ms), outcome)))
                    .collect(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl StreamProber for DelayedProber {
        async fn probe(&self, url: &str) -> ProbeOutcome {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let (delay, outcome) = self.delays[url].clone();
            tokio::time::sleep(delay).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            outcome
        }

        fn name(&self) -> &'static str {
            "delayed"
        }
    }

    #[tokio::test]
    async fn test_live_and_timed_out_sources() {
        let prober = DelayedProber::new(vec![
            ("http://u1", 5, ProbeOutcome::Live),
            ("http://u2", 1_000, ProbeOutcome::Live),
        ]);
        let verifier = verifier(prober, Duration::from_millis(100));

        let streams = verifier.get_live_streams("tt1").await;
        assert_eq!(
            streams,
            vec![StreamLink {
                title: "Foo".to_string(),
                url: "http://u1".to_string(),
            }]
        );

        let report = verifier.verify("tt1").await;
        assert_eq!(
            report.candidates[1].outcome,
            ProbeOutcome::not_live(NotLiveReason::Timeout)
        );
    }

    #[tokio::test]
    async fn test_order_follows_candidates_not_completion() {
        let prober = DelayedProber::new(vec![
            ("http://a", 60, ProbeOutcome::Live),
            ("http://b", 1, ProbeOutcome::Live),
            ("http://c", 30, ProbeOutcome::Live),
        ]);
        let verifier = verifier(prober, Duration::from_millis(500));

        let urls: Vec<String> = verifier
            .get_live_streams("tt3")
            .await
            .into_iter()
            .map(|stream| stream.url)
            .collect();
        assert_eq!(urls, vec!["http://a", "http://b", "http://c"]);
    }

    #[tokio::test]
    async fn test_probes_run_concurrently() {
        let prober = Arc::new(DelayedProber::new(vec![
            ("http://a", 100, ProbeOutcome::Live),
            ("http://b", 100, ProbeOutcome::Live),
            ("http://c", 100, ProbeOutcome::Live),
        ]));
        let verifier = LivenessVerifier::new(
            catalog(),
            prober.clone() as Arc<dyn StreamProber>,
            Duration::from_millis(1_000),
            8,
        );

        verifier.get_live_streams("tt3").await;

        assert_eq!(prober.peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let prober = Arc::new(DelayedProber::new(vec![
            ("http://a", 20, ProbeOutcome::Live),
            ("http://b", 20, ProbeOutcome::Live),
            ("http://c", 20, ProbeOutcome::Live),
        ]));
        let verifier = LivenessVerifier::new(
            catalog(),
            prober.clone() as Arc<dyn StreamProber>,
            Duration::from_millis(1_000),
            1,
        );

        let streams = verifier.get_live_streams("tt3").await;
        assert_eq!(streams.len(), 3);
        assert_eq!(prober.peak.load(Ordering::SeqCst), 1);
    }

    /// Sleeps, then counts how many checks ran to completion
    struct CountingProber {
        delay: Duration,
        completed: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl StreamProber for CountingProber {
        async fn probe(&self, _url: &str) -> ProbeOutcome {
            tokio::time::sleep(self.delay).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            ProbeOutcome::Live
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_dropping_verify_cancels_pending_checks() {
        let prober = Arc::new(CountingProber {
            delay: Duration::from_millis(100),
            completed: AtomicUsize::new(0),
        });
        let verifier = LivenessVerifier::new(
            catalog(),
            prober.clone() as Arc<dyn StreamProber>,
            Duration::from_millis(1_000),
            1,
        );

        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), verifier.verify("tt3")).await;
        assert!(cancelled.is_err());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(prober.completed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_probes_are_dropped() {
        let mut prober = MockStreamProber::new();
        prober.expect_name().return_const("mock");
        prober
            .expect_probe()
            .withf(|url| url == "http://a")
            .times(1)
            .returning(|_| ProbeOutcome::not_live(NotLiveReason::Status(404)));
        prober
            .expect_probe()
            .withf(|url| url == "http://b")
            .times(1)
            .returning(|_| ProbeOutcome::Live);
        prober
            .expect_probe()
            .withf(|url| url == "http://c")
            .times(1)
            .returning(|_| ProbeOutcome::not_live(NotLiveReason::Connect));

        let verifier = verifier(prober, Duration::from_millis(500));
        let report = verifier.verify("tt3").await;

        assert_eq!(report.candidates.len(), 3);
        assert_eq!(report.live_count(), 1);
        assert_eq!(report.live_streams()[0].url, "http://b");
    }

    #[tokio::test]
    async fn test_unknown_id_never_probes() {
        let mut prober = MockStreamProber::new();
        prober.expect_name().return_const("mock");
        prober.expect_probe().never();

        let verifier = verifier(prober, Duration::from_millis(500));
        assert!(verifier.get_live_streams("tt404").await.is_empty());
    }

    #[tokio::test]
    async fn test_all_dead_is_empty_not_error() {
        let mut prober = MockStreamProber::new();
        prober.expect_name().return_const("mock");
        prober
            .expect_probe()
            .times(2)
            .returning(|_| ProbeOutcome::not_live(NotLiveReason::Status(503)));

        let verifier = verifier(prober, Duration::from_millis(500));
        assert!(verifier.get_live_streams("tt1").await.is_empty());
    }
}
