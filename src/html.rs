//! HTML escaping for report text interpolated into markup.

/// Escape text for use in element content and quoted attribute values.
///
/// Single quotes are escaped too, so the result is safe inside `'...'`
/// attributes.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("10 km"), "10 km");
        assert_eq!(html_escape("<b>"), "&lt;b&gt;");
        assert_eq!(html_escape("Maluku & Papua"), "Maluku &amp; Papua");
        assert_eq!(html_escape("\"BMKG\""), "&quot;BMKG&quot;");
    }

    #[test]
    fn test_html_escape_single_quote() {
        assert_eq!(html_escape("Jum'at"), "Jum&#39;at");
        // Already-escaped input is escaped again, not passed through
        assert_eq!(html_escape("&#39;"), "&amp;#39;");
        assert_eq!(
            format!("<img alt='{}'>", html_escape("x' onerror='y")),
            "<img alt='x&#39; onerror=&#39;y'>"
        );
    }
}
