//! BMKG earthquake feed client.
//!
//! Provides blocking HTTP access to the BMKG TEWS JSON feeds.
//! Uses reqwest with rustls for TLS.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, instrument};

use crate::errors::GempaError;
use crate::models::{EarthquakeReport, Envelope, RawGempa};

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("gempawatch/", env!("CARGO_PKG_VERSION"));

/// BMKG base URL for the TEWS feeds (also hosts shakemap images).
pub const BMKG_BASE_URL: &str = "https://data.bmkg.go.id/DataMKG/TEWS";

/// Published BMKG feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedType {
    /// Latest single event (`autogempa.json`)
    #[default]
    Latest,
    /// 15 most recent M5.0+ events (`gempaterkini.json`)
    Recent,
    /// 15 most recent felt events (`gempadirasakan.json`)
    Felt,
}

impl FeedType {
    /// Get the CLI name for this feed type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "autogempa",
            Self::Recent => "terkini",
            Self::Felt => "dirasakan",
        }
    }

    /// Get the JSON file name for this feed type.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Latest => "autogempa.json",
            Self::Recent => "gempaterkini.json",
            Self::Felt => "gempadirasakan.json",
        }
    }
}

impl std::str::FromStr for FeedType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "autogempa" | "latest" => Ok(Self::Latest),
            "terkini" | "gempaterkini" | "recent" => Ok(Self::Recent),
            "dirasakan" | "gempadirasakan" | "felt" => Ok(Self::Felt),
            _ => Err(format!(
                "unknown feed type: {s} (expected: autogempa, terkini, dirasakan)"
            )),
        }
    }
}

/// Anything that can produce the latest earthquake report.
///
/// The refresher depends on this rather than on [`BmkgClient`] so it can be
/// driven by canned data.
pub trait ReportSource: Send + Sync + 'static {
    /// Fetch the most recent report.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be fetched or validated.
    fn fetch_latest(&self) -> Result<EarthquakeReport, GempaError>;
}

/// Client for the BMKG TEWS feeds.
pub struct BmkgClient {
    client: Client,
    base_url: String,
}

impl BmkgClient {
    /// Create a client against a TEWS base URL, normally [`BMKG_BASE_URL`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_base_url(base_url: &str) -> Result<Self, GempaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL this client fetches from.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a feed document and parse its envelope.
    fn fetch_envelope<T>(&self, feed_type: FeedType) -> Result<T, GempaError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, feed_type.file_name());

        debug!("fetching feed from {}", url);

        let response = self.client.get(&url).send()?;

        // Check status before parsing
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GempaError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text()?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        envelope.into_gempa()
    }

    /// Fetch the latest event from `autogempa.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the body is not the expected
    /// document, or the report fails validation.
    #[instrument(skip(self))]
    pub fn fetch_latest_report(&self) -> Result<EarthquakeReport, GempaError> {
        let raw: RawGempa = self.fetch_envelope(FeedType::Latest)?;
        EarthquakeReport::try_from(raw)
    }

    /// Fetch a feed as a list of reports.
    ///
    /// Entries that fail validation are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be parsed.
    #[instrument(skip(self), fields(feed = feed_type.as_str()))]
    pub fn fetch_feed(&self, feed_type: FeedType) -> Result<Vec<EarthquakeReport>, GempaError> {
        let raws: Vec<RawGempa> = match feed_type {
            FeedType::Latest => vec![self.fetch_envelope(feed_type)?],
            FeedType::Recent | FeedType::Felt => self.fetch_envelope(feed_type)?,
        };

        let total = raws.len();
        let reports: Vec<EarthquakeReport> = raws
            .into_iter()
            .filter_map(|raw| match EarthquakeReport::try_from(raw) {
                Ok(report) => Some(report),
                Err(e) => {
                    debug!("skipping entry: {}", e);
                    None
                }
            })
            .collect();

        debug!("fetched {} of {} reports", reports.len(), total);
        Ok(reports)
    }
}

impl ReportSource for BmkgClient {
    fn fetch_latest(&self) -> Result<EarthquakeReport, GempaError> {
        self.fetch_latest_report()
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    #[test]
    fn test_feed_type_round_trip() {
        for feed_type in [FeedType::Latest, FeedType::Recent, FeedType::Felt] {
            let s = feed_type.as_str();
            let parsed: FeedType = s.parse().expect("failed to parse");
            assert_eq!(parsed, feed_type);
        }
        assert!("weekly".parse::<FeedType>().is_err());
    }

    #[test]
    fn test_fetch_latest_report() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/autogempa.json");
            then.status(200)
                .header("Content-Type", "application/json")
                .body(include_str!("../tools/sample_autogempa.json"));
        });

        let client = BmkgClient::with_base_url(&server.base_url()).unwrap();
        let report = client.fetch_latest_report().expect("fetch failed");

        mock.assert();
        assert_eq!(report.magnitude_text, "5.1");
        assert_eq!(
            report.region,
            "Pusat gempa berada di darat 14 km TimurLaut Gianyar"
        );
    }

    #[test]
    fn test_fetch_latest_report_http_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/autogempa.json");
            then.status(503).body("maintenance");
        });

        let client = BmkgClient::with_base_url(&server.base_url()).unwrap();
        let err = client.fetch_latest_report().unwrap_err();
        assert!(matches!(err, GempaError::Api { status: 503, .. }));
    }

    #[test]
    fn test_fetch_latest_report_malformed_json() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/autogempa.json");
            then.status(200).body("<html>not json</html>");
        });

        let client = BmkgClient::with_base_url(&server.base_url()).unwrap();
        let err = client.fetch_latest_report().unwrap_err();
        assert!(matches!(err, GempaError::Parse(_)));
    }

    #[test]
    fn test_fetch_feed_skips_invalid_entries() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/gempaterkini.json");
            then.status(200)
                .header("Content-Type", "application/json")
                .body(include_str!("../tools/sample_gempaterkini.json"));
        });

        let client = BmkgClient::with_base_url(&server.base_url()).unwrap();
        let reports = client.fetch_feed(FeedType::Recent).expect("fetch failed");

        // Third entry has unparseable coordinates
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].magnitude_text, "6.0");
    }
}
