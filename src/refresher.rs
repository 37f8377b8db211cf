//! Periodic fetch-and-render of the latest earthquake.
//!
//! One refresh cycle fetches the latest report and then renders it into both
//! the map (accumulating) and the card container (replacing). Fetch failures
//! never escalate: they are handed to a [`Diagnostics`] collaborator and the
//! cycle renders nothing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::card::{CardContainer, render_report_card};
use crate::client::{BMKG_BASE_URL, ReportSource};
use crate::errors::GempaError;
use crate::map::{MapView, render_map_annotation};
use crate::models::EarthquakeReport;

/// Fixed refresh period.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Receives fetch failures.
pub trait Diagnostics: Send + Sync + 'static {
    fn fetch_failed(&self, error: &GempaError);
}

/// Logs fetch failures as `tracing` warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn fetch_failed(&self, error: &GempaError) {
        warn!("error fetching earthquake data: {}", error);
    }
}

/// Fetch the latest report, or `None` on any failure.
///
/// Failures are reported to `diagnostics` and never returned.
pub fn fetch_latest_report(
    source: &dyn ReportSource,
    diagnostics: &dyn Diagnostics,
) -> Option<EarthquakeReport> {
    match source.fetch_latest() {
        Ok(report) => Some(report),
        Err(e) => {
            diagnostics.fetch_failed(&e);
            None
        }
    }
}

/// Everything a refresh cycle renders into.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub map: MapView,
    pub card: CardContainer,
    loaded: bool,
    cycles: u64,
}

/// Dashboard shared between the refresher and HTTP handlers.
pub type SharedDashboard = Arc<RwLock<Dashboard>>;

impl Dashboard {
    /// Render one report (or its absence) into both targets.
    pub fn render(&mut self, report: Option<&EarthquakeReport>, base_url: &str) {
        render_map_annotation(&mut self.map, report);
        render_report_card(&mut self.card, report, base_url);
        self.cycles += 1;
    }

    /// Whether the initial cycle has finished (the loading overlay can go).
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Number of completed refresh cycles, failed ones included.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

/// Refresher settings.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub interval: Duration,
    /// Base URL used to resolve shakemap links on the card
    pub base_url: String,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: REFRESH_INTERVAL,
            base_url: BMKG_BASE_URL.to_string(),
        }
    }
}

/// Drives refresh cycles against a shared dashboard.
pub struct Refresher<S, D> {
    source: Arc<S>,
    diagnostics: Arc<D>,
    config: RefreshConfig,
    notifier: Option<broadcast::Sender<String>>,
}

impl<S: ReportSource, D: Diagnostics> Refresher<S, D> {
    #[must_use]
    pub fn new(source: S, diagnostics: D, config: RefreshConfig) -> Self {
        Self {
            source: Arc::new(source),
            diagnostics: Arc::new(diagnostics),
            config,
            notifier: None,
        }
    }

    /// Broadcast the new card HTML after every cycle that rendered a report.
    #[must_use]
    pub fn with_notifier(mut self, tx: broadcast::Sender<String>) -> Self {
        self.notifier = Some(tx);
        self
    }

    /// Run one cycle: fetch, then render both targets.
    ///
    /// Returns whether a report was rendered.
    pub async fn refresh_once(&self, dashboard: &SharedDashboard) -> bool {
        let source = Arc::clone(&self.source);
        let diagnostics = Arc::clone(&self.diagnostics);

        // The client is blocking
        let report = match tokio::task::spawn_blocking(move || {
            fetch_latest_report(source.as_ref(), diagnostics.as_ref())
        })
        .await
        {
            Ok(report) => report,
            Err(e) => {
                warn!("refresh task failed: {}", e);
                None
            }
        };

        let mut dash = dashboard.write().await;
        dash.render(report.as_ref(), &self.config.base_url);

        let Some(report) = report else {
            return false;
        };

        debug!(
            "cycle #{}: M{} {} ({} markers)",
            dash.cycles(),
            report.magnitude_text,
            report.region,
            dash.map.markers.len()
        );

        if let Some(tx) = &self.notifier {
            // No subscribers is fine
            let _ = tx.send(dash.card.to_html());
        }
        true
    }

    /// Run the initial cycle, mark the dashboard loaded, then refresh every
    /// interval until stopped.
    ///
    /// Dropping the returned handle also stops the loop.
    pub fn spawn(self, dashboard: SharedDashboard) -> RefreshHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let interval = self.config.interval;

        let task = tokio::spawn(async move {
            self.refresh_once(&dashboard).await;
            dashboard.write().await.mark_loaded();
            info!("initial earthquake data loaded, refreshing every {}s", interval.as_secs());

            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.refresh_once(&dashboard).await;
                    }
                    _ = stop_rx.changed() => break,
                }
            }

            info!("refresher stopped");
        });

        RefreshHandle { stop_tx, task }
    }
}

/// Stop handle for a spawned refresher.
pub struct RefreshHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Signal the loop to stop and wait for it to exit.
    ///
    /// A cycle already in progress is allowed to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            warn!("refresher task ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use httpmock::prelude::*;

    use super::*;
    use crate::client::BmkgClient;
    use crate::map::tests::sample_report;

    /// Serves the sample report, failing on the listed call numbers.
    struct StubSource {
        calls: AtomicUsize,
        fail_on: Vec<usize>,
    }

    impl StubSource {
        fn ok() -> Self {
            Self::failing_on(vec![])
        }

        fn failing_on(fail_on: Vec<usize>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    impl ReportSource for StubSource {
        fn fetch_latest(&self) -> Result<EarthquakeReport, GempaError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.contains(&call) {
                return Err(GempaError::InvalidResponse("missing Infogempa.gempa".into()));
            }
            Ok(sample_report(5.5))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingDiagnostics {
        failures: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingDiagnostics {
        fn count(&self) -> usize {
            self.failures.lock().unwrap().len()
        }
    }

    impl Diagnostics for RecordingDiagnostics {
        fn fetch_failed(&self, error: &GempaError) {
            self.failures.lock().unwrap().push(error.to_string());
        }
    }

    fn fast_config() -> RefreshConfig {
        RefreshConfig {
            interval: Duration::from_millis(20),
            ..RefreshConfig::default()
        }
    }

    #[test]
    fn test_fetch_success_reports_nothing() {
        let diagnostics = RecordingDiagnostics::default();
        let report = fetch_latest_report(&StubSource::ok(), &diagnostics);
        assert!(report.is_some());
        assert_eq!(diagnostics.count(), 0);
    }

    #[test]
    fn test_fetch_network_error_is_absent() {
        let diagnostics = RecordingDiagnostics::default();
        // Nothing listens on the discard port
        let client = BmkgClient::with_base_url("http://127.0.0.1:9").unwrap();

        assert!(fetch_latest_report(&client, &diagnostics).is_none());
        assert_eq!(diagnostics.count(), 1);
    }

    #[test]
    fn test_fetch_malformed_json_is_absent() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/autogempa.json");
            then.status(200).body("{\"Infogempa\":");
        });
        let diagnostics = RecordingDiagnostics::default();
        let client = BmkgClient::with_base_url(&server.base_url()).unwrap();

        assert!(fetch_latest_report(&client, &diagnostics).is_none());
        let failures = diagnostics.failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("parse JSON"));
    }

    #[test]
    fn test_fetch_well_formed_is_verbatim() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/autogempa.json");
            then.status(200).json_body(serde_json::json!({
                "Infogempa": {"gempa": {
                    "Coordinates": "-2.5,118.0",
                    "Magnitude": 5.5,
                    "Kedalaman": "10 km",
                    "Wilayah": "Test Region",
                    "Tanggal": "2024-01-01",
                    "Jam": "10:00",
                    "Potensi": "Tidak berpotensi tsunami"
                }}
            }));
        });
        let client = BmkgClient::with_base_url(&server.base_url()).unwrap();
        let report = fetch_latest_report(&client, &TracingDiagnostics).unwrap();

        assert_eq!(report.magnitude_text, "5.5");
        assert_eq!(report.depth, "10 km");
        assert_eq!(report.region, "Test Region");
        assert_eq!(report.date, "2024-01-01");
        assert_eq!(report.time, "10:00");
        assert_eq!(report.potential.as_deref(), Some("Tidak berpotensi tsunami"));
        assert!(report.latitude().is_finite() && report.longitude().is_finite());
    }

    #[tokio::test]
    async fn test_markers_accumulate_cards_replace() {
        let dashboard = SharedDashboard::default();
        let refresher = Refresher::new(StubSource::ok(), TracingDiagnostics, fast_config());

        // Initial load plus N timer firings
        let n = 4;
        for _ in 0..=n {
            assert!(refresher.refresh_once(&dashboard).await);
        }

        let dash = dashboard.read().await;
        assert_eq!(dash.map.markers.len(), n + 1);
        assert_eq!(dash.map.circles.len(), n + 1);
        assert_eq!(dash.card.len(), 1);
        assert_eq!(dash.cycles(), 5);
    }

    #[tokio::test]
    async fn test_failed_cycle_renders_nothing() {
        let dashboard = SharedDashboard::default();
        let diagnostics = RecordingDiagnostics::default();
        let refresher = Refresher::new(
            StubSource::failing_on(vec![1]),
            diagnostics.clone(),
            fast_config(),
        );

        assert!(refresher.refresh_once(&dashboard).await);
        let before = dashboard.read().await.card.clone();
        assert!(!refresher.refresh_once(&dashboard).await);

        let dash = dashboard.read().await;
        assert_eq!(dash.map.markers.len(), 1);
        assert_eq!(dash.card, before);
        assert_eq!(diagnostics.count(), 1);
    }

    #[tokio::test]
    async fn test_notifier_receives_card() {
        let dashboard = SharedDashboard::default();
        let (tx, mut rx) = broadcast::channel(4);
        let refresher = Refresher::new(StubSource::failing_on(vec![0]), TracingDiagnostics, fast_config())
            .with_notifier(tx);

        refresher.refresh_once(&dashboard).await;
        assert!(rx.try_recv().is_err());

        refresher.refresh_once(&dashboard).await;
        let html = rx.try_recv().unwrap();
        assert!(html.contains("gempa-card"));
    }

    /// Yield to the spawned refresher until `done` holds.
    async fn wait_until(dashboard: &SharedDashboard, done: impl Fn(&Dashboard) -> bool) {
        while !done(&*dashboard.read().await) {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_firings_add_one_marker_each() {
        let dashboard = SharedDashboard::default();
        let config = RefreshConfig::default();
        let interval = config.interval;
        let handle = Refresher::new(StubSource::ok(), TracingDiagnostics, config).spawn(Arc::clone(&dashboard));

        wait_until(&dashboard, Dashboard::is_loaded).await;
        assert_eq!(dashboard.read().await.map.markers.len(), 1);

        let n = 3;
        for fired in 1..=n {
            tokio::time::advance(interval).await;
            wait_until(&dashboard, |dash| dash.cycles() > fired).await;
        }

        {
            let dash = dashboard.read().await;
            assert_eq!(dash.map.markers.len(), usize::try_from(n + 1).unwrap());
            assert_eq!(dash.map.circles.len(), dash.map.markers.len());
            assert_eq!(dash.card.len(), 1);
        }

        handle.stop().await;
        for _ in 0..3 {
            tokio::time::advance(interval).await;
        }
        let dash = dashboard.read().await;
        assert_eq!(dash.map.markers.len(), usize::try_from(n + 1).unwrap());
        assert_eq!(dash.cycles(), n + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loaded_even_when_initial_fetch_fails() {
        let dashboard = SharedDashboard::default();
        let handle = Refresher::new(
            StubSource::failing_on(vec![0]),
            TracingDiagnostics,
            RefreshConfig::default(),
        )
        .spawn(Arc::clone(&dashboard));

        wait_until(&dashboard, Dashboard::is_loaded).await;
        assert_eq!(dashboard.read().await.map.element_count(), 0);

        handle.stop().await;
    }
}
