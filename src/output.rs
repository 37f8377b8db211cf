//! Terminal output for earthquake reports.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use chrono::Utc;

use crate::models::{EarthquakeReport, OutputReport};

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

// Magnitude-based colors
const RED: &str = "\x1b[91m"; // mag >= 7.0
const YELLOW: &str = "\x1b[93m"; // mag >= 6.0
const CYAN: &str = "\x1b[96m"; // mag >= 5.0
const GREEN: &str = "\x1b[92m"; // mag >= 4.0
const WHITE: &str = "\x1b[97m";

const ICON_QUAKE: &str = "🌏";
const ICON_TSUNAMI: &str = "🌊";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

fn magnitude_color(mag: f64) -> &'static str {
    match mag {
        m if m >= 7.0 => RED,
        m if m >= 6.0 => YELLOW,
        m if m >= 5.0 => CYAN,
        m if m >= 4.0 => GREEN,
        _ => WHITE,
    }
}

/// Whether BMKG flags a tsunami potential.
///
/// BMKG phrases the negative case as "Tidak berpotensi tsunami".
fn tsunami_flagged(potential: Option<&str>) -> bool {
    potential.is_some_and(|p| {
        let p = p.to_lowercase();
        p.contains("tsunami") && !p.contains("tidak")
    })
}

/// "12 min ago" style age, when the origin time is known.
fn relative_age(report: &EarthquakeReport) -> Option<String> {
    let diff = Utc::now().signed_duration_since(report.origin_time?);
    Some(if diff.num_hours() < 1 {
        format!("{} min ago", diff.num_minutes().max(1))
    } else if diff.num_hours() < 24 {
        format!("{} hr ago", diff.num_hours())
    } else {
        format!("{} days ago", diff.num_days())
    })
}

/// Write reports in human-readable format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, reports: &[EarthquakeReport]) -> io::Result<()> {
    for report in reports {
        let color = magnitude_color(report.magnitude);
        let tsunami = if tsunami_flagged(report.potential.as_deref()) {
            format!(" {ICON_TSUNAMI}")
        } else {
            String::new()
        };
        let age = relative_age(report)
            .map(|a| format!(" {DIM}({a}){RESET}"))
            .unwrap_or_default();

        writeln!(
            writer,
            "{ICON_QUAKE} {color}{BOLD}M{mag}{RESET} │ \
             {DIM}{depth:>7}{RESET} │ \
             {when}{age} │ \
             {region}{tsunami}",
            mag = report.magnitude_text,
            depth = report.depth,
            when = report.when(),
            region = report.region,
        )?;

        if let Some(potential) = &report.potential {
            writeln!(writer, "   {DIM}{potential}{RESET}")?;
        }
        if let Some(felt) = &report.felt {
            writeln!(writer, "   {DIM}Dirasakan: {felt}{RESET}")?;
        }
    }
    Ok(())
}

/// Write reports as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, reports: &[EarthquakeReport]) -> io::Result<()> {
    let output: Vec<OutputReport> = reports.iter().map(OutputReport::from).collect();
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write reports as newline-delimited JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(writer: &mut W, reports: &[EarthquakeReport]) -> io::Result<()> {
    for report in reports {
        let json = serde_json::to_string(&OutputReport::from(report))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write reports in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_reports<W: Write>(
    writer: &mut W,
    reports: &[EarthquakeReport],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, reports),
        Format::Json => write_json(writer, reports),
        Format::Ndjson => write_ndjson(writer, reports),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::tests::sample_report;

    #[test]
    fn test_format_parse() {
        assert_eq!("human".parse::<Format>().unwrap(), Format::Human);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("ndjson".parse::<Format>().unwrap(), Format::Ndjson);
        assert!("invalid".parse::<Format>().is_err());
    }

    #[test]
    fn test_tsunami_flag() {
        assert!(!tsunami_flagged(Some("Tidak berpotensi tsunami")));
        assert!(tsunami_flagged(Some("Berpotensi TSUNAMI")));
        assert!(!tsunami_flagged(None));
    }

    #[test]
    fn test_ndjson_one_line_per_report() {
        let reports = vec![sample_report(5.5), sample_report(6.2)];
        let mut buf = Vec::new();
        write_reports(&mut buf, &reports, Format::Ndjson).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["region"], "Test Region");
        assert_eq!(first["latitude"], -2.5);
    }

    #[test]
    fn test_human_contains_fields() {
        let mut buf = Vec::new();
        write_human(&mut buf, &[sample_report(5.5)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("M5.5"));
        assert!(text.contains("Test Region"));
        assert!(text.contains("2024-01-01 10:00"));
    }
}
