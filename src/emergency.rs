//! Emergency help request form.
//!
//! Submissions are acknowledged locally and then dropped. Nothing is
//! forwarded or stored.

use std::time::Duration;

use serde::Deserialize;

use crate::html::html_escape;

/// How long the acknowledgment banner stays visible.
pub const ACK_DISMISS_AFTER: Duration = Duration::from_secs(5);

const ACK_MESSAGE: &str = "Permintaan bantuan telah dikirim! Tim akan segera menghubungi Anda.";

/// The four form fields, as posted by `#emergency-form`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmergencyRequest {
    #[serde(default)]
    pub nama: String,
    #[serde(default)]
    pub lokasi: String,
    #[serde(default, rename = "jenis-bantuan")]
    pub jenis_bantuan: String,
    #[serde(default)]
    pub deskripsi: String,
}

/// Banner shown after submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    pub message: &'static str,
    pub dismiss_after: Duration,
}

impl Acknowledgment {
    /// Banner HTML; the page removes it after `data-dismiss-ms`.
    #[must_use]
    pub fn to_html(&self) -> String {
        format!(
            r#"<div class="alert" role="status" data-dismiss-ms="{ms}">{message}</div>"#,
            ms = self.dismiss_after.as_millis(),
            message = html_escape(self.message),
        )
    }
}

/// Acknowledge a request. No validation is applied.
#[must_use]
pub fn acknowledge(request: EmergencyRequest) -> Acknowledgment {
    tracing::info!(
        has_location = !request.lokasi.is_empty(),
        "emergency request acknowledged locally"
    );
    drop(request);

    Acknowledgment {
        message: ACK_MESSAGE,
        dismiss_after: ACK_DISMISS_AFTER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acknowledge_any_request() {
        let ack = acknowledge(EmergencyRequest::default());
        assert_eq!(ack.message, ACK_MESSAGE);
        assert_eq!(ack.dismiss_after, Duration::from_secs(5));
    }

    #[test]
    fn test_form_field_names() {
        let request: EmergencyRequest = serde_json::from_value(serde_json::json!({
            "nama": "Budi",
            "lokasi": "Palu",
            "jenis-bantuan": "medis",
            "deskripsi": "butuh obat",
        }))
        .unwrap();
        assert_eq!(request.jenis_bantuan, "medis");
        assert_eq!(request.lokasi, "Palu");
    }

    #[test]
    fn test_banner_html() {
        let html = acknowledge(EmergencyRequest::default()).to_html();
        assert!(html.contains(r#"class="alert""#));
        assert!(html.contains(r#"data-dismiss-ms="5000""#));
        assert!(html.contains("Permintaan bantuan telah dikirim!"));
    }
}
