//! "Gempa Terkini" information card.
//!
//! Unlike the map, the card container only ever shows the current report.

use crate::html::html_escape;
use crate::models::EarthquakeReport;

/// Card content for one report, pre-rendered to display strings.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportCard {
    pub magnitude: String,
    pub depth: String,
    pub region: String,
    pub when: String,
    pub potential: String,
    pub felt: Option<String>,
    pub shakemap_url: Option<String>,
}

impl ReportCard {
    /// Build the card for a report. `base_url` resolves the shakemap link.
    #[must_use]
    pub fn new(report: &EarthquakeReport, base_url: &str) -> Self {
        Self {
            magnitude: report.magnitude_text.clone(),
            depth: report.depth.clone(),
            region: report.region.clone(),
            when: report.when(),
            potential: report.potential.clone().unwrap_or_else(|| "-".into()),
            felt: report.felt.clone(),
            shakemap_url: report.shakemap_url(base_url),
        }
    }

    /// Render as an HTML fragment.
    #[must_use]
    pub fn to_html(&self) -> String {
        let felt = self
            .felt
            .as_deref()
            .map(|f| {
                format!(
                    "\n    <p><strong>Dirasakan:</strong> {}</p>",
                    html_escape(f)
                )
            })
            .unwrap_or_default();
        let shakemap = self
            .shakemap_url
            .as_deref()
            .map(|url| {
                format!(
                    "\n    <p><a href=\"{}\" target=\"_blank\" rel=\"noopener\">Lihat shakemap</a></p>",
                    html_escape(url)
                )
            })
            .unwrap_or_default();

        format!(
            r#"<div class="gempa-card">
  <h3>Gempa Terkini</h3>
  <div class="gempa-info">
    <p><strong>Magnitude:</strong> {mag}</p>
    <p><strong>Kedalaman:</strong> {depth}</p>
    <p><strong>Lokasi:</strong> {region}</p>
    <p><strong>Waktu:</strong> {when}</p>
    <p><strong>Potensi:</strong> {potential}</p>{felt}{shakemap}
  </div>
</div>"#,
            mag = html_escape(&self.magnitude),
            depth = html_escape(&self.depth),
            region = html_escape(&self.region),
            when = html_escape(&self.when),
            potential = html_escape(&self.potential),
        )
    }
}

/// Container that holds at most one card after the first render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardContainer {
    cards: Vec<ReportCard>,
}

impl CardContainer {
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn push(&mut self, card: ReportCard) {
        self.cards.push(card);
    }

    /// Render every card as one HTML fragment.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.cards
            .iter()
            .map(ReportCard::to_html)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Replace the container's content with a single card for `report`.
///
/// Does nothing when the report is absent.
pub fn render_report_card(
    container: &mut CardContainer,
    report: Option<&EarthquakeReport>,
    base_url: &str,
) {
    let Some(report) = report else {
        return;
    };

    container.cards.clear();
    container.cards.push(ReportCard::new(report, base_url));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::BMKG_BASE_URL;
    use crate::map::tests::sample_report;

    #[test]
    fn test_absent_report_leaves_container_unchanged() {
        let mut container = CardContainer::default();
        render_report_card(&mut container, Some(&sample_report(4.0)), BMKG_BASE_URL);
        let before = container.clone();

        render_report_card(&mut container, None, BMKG_BASE_URL);
        assert_eq!(container, before);
    }

    #[test]
    fn test_report_replaces_all_children() {
        let mut container = CardContainer::default();
        let stale = ReportCard::new(&sample_report(3.0), BMKG_BASE_URL);
        container.push(stale.clone());
        container.push(stale);
        assert_eq!(container.len(), 2);

        render_report_card(&mut container, Some(&sample_report(5.5)), BMKG_BASE_URL);

        assert_eq!(container.len(), 1);
        assert_eq!(container.cards[0].magnitude, "5.5");
    }

    #[test]
    fn test_card_html() {
        let card = ReportCard::new(&sample_report(5.5), BMKG_BASE_URL);
        let html = card.to_html();

        assert!(html.contains("<strong>Magnitude:</strong> 5.5"));
        assert!(html.contains("<strong>Kedalaman:</strong> 10 km"));
        assert!(html.contains("<strong>Lokasi:</strong> Test Region"));
        assert!(html.contains("<strong>Waktu:</strong> 2024-01-01 10:00"));
        assert!(html.contains("Tidak berpotensi tsunami"));
        assert!(!html.contains("shakemap"));
    }

    #[test]
    fn test_card_shakemap_link() {
        let mut report = sample_report(6.1);
        report.shakemap = Some("x.mmi.jpg".into());
        let card = ReportCard::new(&report, "https://example.test/TEWS");
        assert!(card.to_html().contains("https://example.test/TEWS/x.mmi.jpg"));
    }
}
