//! Web server for the gempawatch UI.
//!
//! Serves the awareness page and the data behind it:
//! - Axum for HTTP
//! - SSE (Server-Sent Events) to push each refreshed card
//! - Leaflet, particles.js and AOS loaded client-side from a CDN
//! - HTMX for fragment loading

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::State,
    response::{
        Html,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::client::BmkgClient;
use crate::emergency::{EmergencyRequest, acknowledge};
use crate::map::MapView;
use crate::mitigation::{MitigationContainer, render_mitigation_sections};
use crate::refresher::{RefreshConfig, Refresher, SharedDashboard, TracingDiagnostics};

const CARD_PLACEHOLDER: &str =
    r#"<div class="gempa-card gempa-card-empty"><p>Memuat data gempa terkini...</p></div>"#;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub refresh: RefreshConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            refresh: RefreshConfig::default(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Map and card, written only by the refresher
    dashboard: SharedDashboard,
    /// Channel for broadcasting refreshed cards to SSE clients
    tx: broadcast::Sender<String>,
    /// Pre-rendered mitigation sections
    mitigation: Arc<str>,
}

impl AppState {
    pub fn new(dashboard: SharedDashboard, tx: broadcast::Sender<String>) -> Self {
        let mut container = MitigationContainer::default();
        render_mitigation_sections(&mut container);

        Self {
            dashboard,
            tx,
            mitigation: container.to_html().into(),
        }
    }
}

/// Dashboard status for the loading overlay.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub loaded: bool,
    pub markers: usize,
    pub cards: usize,
    /// Completed refresh cycles, failed ones included
    pub refreshes: u64,
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/map", get(map_handler))
        .route("/api/card", get(card_handler))
        .route("/api/status", get(status_handler))
        .route("/api/emergency", post(emergency_handler))
        .route("/mitigasi", get(mitigation_handler))
        .route("/stream", get(sse_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Start the web server and the background refresher.
pub async fn run_server(config: ServerConfig, client: BmkgClient) -> anyhow::Result<()> {
    let (tx, _rx) = broadcast::channel::<String>(16);
    let dashboard = SharedDashboard::default();

    let refresher = Refresher::new(client, TracingDiagnostics, config.refresh.clone())
        .with_notifier(tx.clone());
    let handle = refresher.spawn(Arc::clone(&dashboard));

    let app = create_router(AppState::new(dashboard, tx));

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("🌏 gempawatch UI starting at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    handle.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Main page handler - serves the HTML UI.
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Current map view, markers included.
async fn map_handler(State(state): State<AppState>) -> Json<MapView> {
    Json(state.dashboard.read().await.map.clone())
}

/// Current card fragment.
async fn card_handler(State(state): State<AppState>) -> Html<String> {
    let dash = state.dashboard.read().await;
    if dash.card.is_empty() {
        Html(CARD_PLACEHOLDER.to_string())
    } else {
        Html(dash.card.to_html())
    }
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let dash = state.dashboard.read().await;
    Json(StatusResponse {
        loaded: dash.is_loaded(),
        markers: dash.map.markers.len(),
        cards: dash.card.len(),
        refreshes: dash.cycles(),
    })
}

/// Mitigation sections fragment.
async fn mitigation_handler(State(state): State<AppState>) -> Html<String> {
    Html(state.mitigation.to_string())
}

/// Emergency form submission - acknowledged, never forwarded.
async fn emergency_handler(Form(request): Form<EmergencyRequest>) -> Html<String> {
    Html(acknowledge(request).to_html())
}

/// SSE stream handler: one `refresh` event per rendered report.
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(html) => Some(Ok(Event::default().event("refresh").data(html))),
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}

// ============================================================================
// HTML Template (embedded for single-binary deployment)
// ============================================================================

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="id">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Info Gempa Indonesia</title>

    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <link rel="stylesheet" href="https://unpkg.com/aos@2.3.4/dist/aos.css" />
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
    <script src="https://unpkg.com/aos@2.3.4/dist/aos.js"></script>
    <script src="https://cdn.jsdelivr.net/npm/particles.js@2.0.0/particles.min.js"></script>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>

    <style>
        :root {
            --bg: #0b1120;
            --surface: #111827;
            --text: #f8fafc;
            --muted: #94a3b8;
            --accent: #ef4444;
            --radius: 12px;
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; background: var(--bg); color: var(--text); }
        #particles-js { position: fixed; inset: 0; z-index: -1; }

        .loading-screen { position: fixed; inset: 0; background: var(--bg); display: flex; align-items: center; justify-content: center; z-index: 2000; transition: opacity 0.5s ease; }
        .loading-screen .spinner { width: 48px; height: 48px; border: 4px solid var(--muted); border-top-color: var(--accent); border-radius: 50%; animation: spin 1s linear infinite; }
        @keyframes spin { to { transform: rotate(360deg); } }

        nav { display: flex; justify-content: space-between; align-items: center; padding: 1rem 2rem; background: rgba(17, 24, 39, 0.85); position: sticky; top: 0; z-index: 1000; }
        .nav-links { display: flex; gap: 1.5rem; list-style: none; }
        .nav-links a { color: var(--text); text-decoration: none; }
        .menu-toggle { display: none; background: none; border: 0; color: var(--text); font-size: 1.5rem; cursor: pointer; }
        @media (max-width: 768px) {
            .menu-toggle { display: block; }
            .nav-links { display: none; flex-direction: column; position: absolute; top: 100%; left: 0; right: 0; background: var(--surface); padding: 1rem 2rem; }
            .nav-links.active { display: flex; }
        }

        section { max-width: 1100px; margin: 0 auto; padding: 3rem 1.5rem; }
        h2 { margin-bottom: 1.5rem; }
        #map { height: 480px; border-radius: var(--radius); }

        .gempa-card, .card { background: var(--surface); border-radius: var(--radius); padding: 1.5rem; }
        .gempa-info p { margin: 0.4rem 0; }
        .gempa-info a { color: var(--accent); }

        .timeline-item { margin-bottom: 2.5rem; }
        .card-container { display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: 1rem; margin-top: 1rem; }
        .card-header { display: flex; align-items: center; gap: 0.6rem; margin-bottom: 0.6rem; }
        .card-icon { font-size: 1.6rem; }
        .card-body { color: var(--muted); line-height: 1.5; }

        #emergency-form { display: grid; gap: 0.8rem; max-width: 560px; }
        #emergency-form input, #emergency-form select, #emergency-form textarea { padding: 0.7rem; border-radius: 8px; border: 1px solid #334155; background: var(--surface); color: var(--text); }
        #emergency-form button { padding: 0.8rem; border: 0; border-radius: 8px; background: var(--accent); color: white; font-weight: 600; cursor: pointer; }
        .alert { position: fixed; bottom: 1.5rem; right: 1.5rem; background: #16a34a; color: white; padding: 1rem 1.5rem; border-radius: 8px; z-index: 3000; }

        footer { text-align: center; color: var(--muted); padding: 2rem; }
        footer a { color: var(--muted); }
    </style>
</head>
<body>
    <div class="loading-screen"><div class="spinner"></div></div>
    <div id="particles-js"></div>

    <nav>
        <strong>Info Gempa</strong>
        <button class="menu-toggle" aria-label="Menu">☰</button>
        <ul class="nav-links">
            <li><a href="#peta">Peta</a></li>
            <li><a href="#terkini">Gempa Terkini</a></li>
            <li><a href="#mitigasi">Mitigasi</a></li>
            <li><a href="#darurat">Bantuan Darurat</a></li>
        </ul>
    </nav>

    <section id="peta" data-aos="fade-up">
        <h2>Peta Gempa</h2>
        <div id="map"></div>
    </section>

    <section id="terkini" data-aos="fade-up">
        <h2>Gempa Terkini</h2>
        <div id="gempa-terkini" hx-get="/api/card" hx-trigger="load" hx-swap="innerHTML"></div>
    </section>

    <section id="mitigasi">
        <h2>Mitigasi Bencana Gempa</h2>
        <div class="mitigasi-container" hx-get="/mitigasi" hx-trigger="load" hx-swap="innerHTML"></div>
    </section>

    <section id="darurat" data-aos="fade-up">
        <h2>Permintaan Bantuan Darurat</h2>
        <form id="emergency-form">
            <input id="nama" name="nama" placeholder="Nama" />
            <input id="lokasi" name="lokasi" placeholder="Lokasi" />
            <select id="jenis-bantuan" name="jenis-bantuan">
                <option value="medis">Medis</option>
                <option value="evakuasi">Evakuasi</option>
                <option value="logistik">Logistik</option>
            </select>
            <textarea id="deskripsi" name="deskripsi" rows="4" placeholder="Deskripsi"></textarea>
            <button type="submit">Kirim Permintaan</button>
        </form>
    </section>

    <footer>
        <p>Data dari <a href="https://data.bmkg.go.id/" target="_blank">BMKG</a> · gempawatch v0.1.0</p>
    </footer>

    <script>
        particlesJS("particles-js", {
            particles: {
                number: { value: 80, density: { enable: true, value_area: 800 } },
                color: { value: "#ffffff" },
                shape: { type: "circle" },
                opacity: { value: 0.5, random: false, anim: { enable: false } },
                size: { value: 3, random: true, anim: { enable: false } },
                line_linked: { enable: true, distance: 150, color: "#ffffff", opacity: 0.4, width: 1 },
                move: { enable: true, speed: 6, direction: "none", random: false, straight: false, out_mode: "out", bounce: false }
            },
            interactivity: {
                detect_on: "canvas",
                events: {
                    onhover: { enable: true, mode: "repulse" },
                    onclick: { enable: true, mode: "push" },
                    resize: true
                }
            },
            retina_detect: true
        });

        AOS.init({ duration: 1000, once: true });

        // Map: overlays are append-only server-side, so only draw new ones
        const map = L.map("map");
        let mapReady = false;
        let drawn = 0;

        async function syncMap() {
            const res = await fetch("/api/map");
            if (!res.ok) return;
            const view = await res.json();
            if (!mapReady) {
                map.setView(view.center, view.zoom);
                L.tileLayer(view.tile_layer.url_template, {
                    attribution: view.tile_layer.attribution
                }).addTo(map);
                mapReady = true;
            }
            for (; drawn < view.markers.length; drawn++) {
                const m = view.markers[drawn];
                L.marker([m.latitude, m.longitude]).addTo(map).bindPopup(m.popup);
                const c = view.circles[drawn];
                if (c) {
                    L.circle([c.latitude, c.longitude], {
                        color: c.color,
                        fillColor: c.fill_color,
                        fillOpacity: c.fill_opacity,
                        radius: c.radius
                    }).addTo(map);
                }
            }
        }

        async function waitForData() {
            const res = await fetch("/api/status").catch(() => null);
            const status = res && res.ok ? await res.json() : null;
            if (!status || !status.loaded) {
                setTimeout(waitForData, 500);
                return;
            }
            await syncMap();
            htmx.ajax("GET", "/api/card", { target: "#gempa-terkini", swap: "innerHTML" });

            const loadingScreen = document.querySelector(".loading-screen");
            loadingScreen.style.opacity = "0";
            setTimeout(() => { loadingScreen.style.display = "none"; }, 500);
        }
        window.addEventListener("load", waitForData);

        const events = new EventSource("/stream");
        events.addEventListener("refresh", (e) => {
            document.getElementById("gempa-terkini").innerHTML = e.data;
            syncMap();
        });

        const form = document.getElementById("emergency-form");
        form.addEventListener("submit", async (e) => {
            e.preventDefault();
            const res = await fetch("/api/emergency", {
                method: "POST",
                body: new URLSearchParams(new FormData(form))
            });
            if (res.ok) {
                document.body.insertAdjacentHTML("beforeend", await res.text());
                const alert = document.body.lastElementChild;
                setTimeout(() => alert.remove(), Number(alert.dataset.dismissMs) || 5000);
            }
            form.reset();
        });

        const menuToggle = document.querySelector(".menu-toggle");
        menuToggle.addEventListener("click", () => {
            menuToggle.classList.toggle("active");
            document.querySelector(".nav-links").classList.toggle("active");
        });
    </script>
</body>
</html>
"##;
