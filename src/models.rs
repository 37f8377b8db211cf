//! Data models for BMKG earthquake (gempa) feeds.
//!
//! The raw structures mirror the `Infogempa.gempa` JSON documents published
//! under `https://data.bmkg.go.id/DataMKG/TEWS/`. [`EarthquakeReport`] is the
//! validated form every other module works with.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::GempaError;

/// Top-level BMKG response: `{ "Infogempa": { "gempa": ... } }`.
///
/// `gempa` is a single object for `autogempa.json` and an array for the
/// listing feeds, hence the type parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "Infogempa")]
    pub infogempa: Option<InfoGempa<T>>,
}

/// Wrapper object holding the `gempa` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct InfoGempa<T> {
    pub gempa: Option<T>,
}

impl<T> Envelope<T> {
    /// Extract the payload at `Infogempa.gempa`.
    ///
    /// # Errors
    ///
    /// Returns [`GempaError::InvalidResponse`] when either level is missing.
    pub fn into_gempa(self) -> Result<T, GempaError> {
        self.infogempa
            .and_then(|info| info.gempa)
            .ok_or_else(|| GempaError::InvalidResponse("missing Infogempa.gempa".into()))
    }
}

/// Magnitude as published: BMKG sends a string, some mirrors send a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawMagnitude {
    Number(f64),
    Text(String),
}

impl RawMagnitude {
    /// Display text, verbatim for strings.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Numeric value, if the text parses to a finite number.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// One `gempa` object exactly as BMKG publishes it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawGempa {
    /// Local date, e.g. "16 Okt 2026"
    pub tanggal: String,

    /// Local time, e.g. "08:12:47 WIB"
    pub jam: String,

    /// ISO-8601 origin time (UTC offset included)
    pub date_time: Option<String>,

    /// "lat,lon" in decimal degrees
    pub coordinates: String,

    pub magnitude: RawMagnitude,

    /// Depth with unit, e.g. "10 km"
    pub kedalaman: String,

    /// Region description
    pub wilayah: String,

    /// Hazard potential (absent in the felt-events feed)
    pub potensi: Option<String>,

    /// Felt intensity description (MMI scale)
    pub dirasakan: Option<String>,

    /// Shakemap image file name
    pub shakemap: Option<String>,
}

/// Geographic point parsed from the `Coordinates` field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl std::str::FromStr for Coordinates {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 2 {
            return Err(format!(
                "coordinates require 2 values (lat,lon), got {}",
                parts.len()
            ));
        }

        let latitude = parse_degrees(parts[0])?;
        let longitude = parse_degrees(parts[1])?;

        Ok(Self {
            latitude,
            longitude,
        })
    }
}

fn parse_degrees(s: &str) -> Result<f64, String> {
    let value = s
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid number in coordinates '{s}': {e}"))?;
    if !value.is_finite() {
        return Err(format!("non-finite coordinate '{s}'"));
    }
    Ok(value)
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// A validated earthquake report.
#[derive(Debug, Clone, PartialEq)]
pub struct EarthquakeReport {
    pub coordinates: Coordinates,
    pub magnitude: f64,
    /// Magnitude exactly as published
    pub magnitude_text: String,
    pub depth: String,
    pub region: String,
    pub date: String,
    pub time: String,
    pub potential: Option<String>,
    pub felt: Option<String>,
    pub shakemap: Option<String>,
    /// Origin time, when `DateTime` is present and valid
    pub origin_time: Option<DateTime<Utc>>,
}

impl TryFrom<RawGempa> for EarthquakeReport {
    type Error = GempaError;

    fn try_from(raw: RawGempa) -> Result<Self, Self::Error> {
        let coordinates: Coordinates = raw
            .coordinates
            .parse()
            .map_err(GempaError::Validation)?;

        let magnitude = raw.magnitude.value().ok_or_else(|| {
            GempaError::Validation(format!("non-numeric magnitude '{}'", raw.magnitude.text()))
        })?;

        let origin_time = raw
            .date_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc));

        Ok(Self {
            coordinates,
            magnitude,
            magnitude_text: raw.magnitude.text(),
            depth: raw.kedalaman,
            region: raw.wilayah,
            date: raw.tanggal,
            time: raw.jam,
            potential: raw.potensi,
            felt: raw.dirasakan,
            shakemap: raw.shakemap,
            origin_time,
        })
    }
}

impl EarthquakeReport {
    /// Latitude (degrees).
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.coordinates.latitude
    }

    /// Longitude (degrees).
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.coordinates.longitude
    }

    /// Date and time joined for display.
    #[must_use]
    pub fn when(&self) -> String {
        format!("{} {}", self.date, self.time)
    }

    /// Absolute shakemap URL resolved against the TEWS base URL.
    #[must_use]
    pub fn shakemap_url(&self, base_url: &str) -> Option<String> {
        self.shakemap
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(|name| format!("{}/{}", base_url.trim_end_matches('/'), name))
    }
}

/// Simplified report for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct OutputReport {
    pub time: String,
    pub date: String,
    pub local_time: String,
    pub magnitude: f64,
    pub depth: String,
    pub latitude: f64,
    pub longitude: f64,
    pub region: String,
    pub potential: Option<String>,
    pub felt: Option<String>,
}

impl From<&EarthquakeReport> for OutputReport {
    fn from(r: &EarthquakeReport) -> Self {
        Self {
            time: r
                .origin_time
                .map_or_else(|| "unknown".into(), |t| t.to_rfc3339()),
            date: r.date.clone(),
            local_time: r.time.clone(),
            magnitude: r.magnitude,
            depth: r.depth.clone(),
            latitude: r.latitude(),
            longitude: r.longitude(),
            region: r.region.clone(),
            potential: r.potential.clone(),
            felt: r.felt.clone(),
        }
    }
}
