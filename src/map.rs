//! Map view state rendered client-side by Leaflet.
//!
//! The view only ever grows: every successful refresh adds one marker and one
//! circle, and nothing is removed, so the map keeps a trail of past reports.

use serde::Serialize;

use crate::html::html_escape;
use crate::models::EarthquakeReport;

/// Circle radius in metres per unit of magnitude.
pub const RADIUS_PER_MAGNITUDE: f64 = 50_000.0;

/// Initial view centre: roughly the middle of the archipelago.
pub const DEFAULT_CENTER: (f64, f64) = (-2.5489, 118.0149);

/// Initial zoom level.
pub const DEFAULT_ZOOM: u8 = 5;

const TILE_URL_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const TILE_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";

/// Raster tile source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
}

/// Point marker with bound popup HTML.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub latitude: f64,
    pub longitude: f64,
    pub popup: String,
}

/// Circle overlay, radius in metres.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleOverlay {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
}

impl CircleOverlay {
    /// Circle for a report, sized linearly by magnitude.
    #[must_use]
    pub fn for_report(report: &EarthquakeReport) -> Self {
        Self {
            latitude: report.latitude(),
            longitude: report.longitude(),
            radius: circle_radius(report.magnitude),
            color: "red".into(),
            fill_color: "#f03".into(),
            fill_opacity: 0.3,
        }
    }
}

/// Overlay radius for a magnitude.
#[must_use]
pub fn circle_radius(magnitude: f64) -> f64 {
    magnitude * RADIUS_PER_MAGNITUDE
}

/// The shared map: fixed view settings plus accumulated overlays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: (f64, f64),
    pub zoom: u8,
    pub tile_layer: TileLayer,
    pub markers: Vec<Marker>,
    pub circles: Vec<CircleOverlay>,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            tile_layer: TileLayer {
                url_template: TILE_URL_TEMPLATE.into(),
                attribution: TILE_ATTRIBUTION.into(),
            },
            markers: Vec::new(),
            circles: Vec::new(),
        }
    }
}

impl MapView {
    /// Total number of overlays on the map.
    #[cfg(test)]
    pub(crate) fn element_count(&self) -> usize {
        self.markers.len() + self.circles.len()
    }
}

/// Popup HTML summarizing a report.
#[must_use]
pub fn popup_html(report: &EarthquakeReport) -> String {
    format!(
        r#"<div class="gempa-popup">
  <h3>Gempa Terkini</h3>
  <p>Magnitude: {mag}</p>
  <p>Kedalaman: {depth}</p>
  <p>Wilayah: {region}</p>
  <p>Waktu: {when}</p>
</div>"#,
        mag = html_escape(&report.magnitude_text),
        depth = html_escape(&report.depth),
        region = html_escape(&report.region),
        when = html_escape(&report.when()),
    )
}

/// Add a marker and a magnitude-sized circle for `report`.
///
/// Does nothing when the report is absent. Earlier overlays are kept.
pub fn render_map_annotation(map: &mut MapView, report: Option<&EarthquakeReport>) {
    let Some(report) = report else {
        return;
    };

    map.markers.push(Marker {
        latitude: report.latitude(),
        longitude: report.longitude(),
        popup: popup_html(report),
    });
    map.circles.push(CircleOverlay::for_report(report));

    tracing::debug!(
        "map annotated at {} (M{}), {} markers",
        report.coordinates,
        report.magnitude_text,
        map.markers.len()
    );
}
