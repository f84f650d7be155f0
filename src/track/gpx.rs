use super::document::{TrackDocument, Waypoint};
use chrono::{DateTime, SecondsFormat};
use std::fmt::{self, Write};

const CREATOR: &str = "nrc-claim";

/// Render a track document as GPX 1.1 with the Garmin TrackPointExtension v1
/// namespace for heart rate. Output depends only on the document, so encoding
/// the same document twice yields identical bytes.
pub fn encode(doc: &TrackDocument) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_document(&mut out, doc)?;
    Ok(out)
}

fn write_document<W: Write>(out: &mut W, doc: &TrackDocument) -> fmt::Result {
    writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    out.write_str(concat!(
        "<gpx xmlns=\"http://www.topografix.com/GPX/1/1\"",
        " xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"",
        " xmlns:gpxtpx=\"http://www.garmin.com/xmlschemas/TrackPointExtension/v1\"",
        " xsi:schemaLocation=\"http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd",
        " http://www.garmin.com/xmlschemas/TrackPointExtension/v1 http://www.garmin.com/xmlschemas/TrackPointExtensionv1.xsd\"",
    ))?;
    writeln!(out, " version=\"1.1\" creator=\"{CREATOR}\">")?;

    writeln!(out, "  <trk>")?;
    if !doc.track.name.is_empty() {
        writeln!(out, "    <name>{}</name>", escape(&doc.track.name))?;
    }
    for segment in &doc.track.segments {
        writeln!(out, "    <trkseg>")?;
        for point in &segment.points {
            write_point(out, point)?;
        }
        writeln!(out, "    </trkseg>")?;
    }
    writeln!(out, "  </trk>")?;
    writeln!(out, "</gpx>")
}

fn write_point<W: Write>(out: &mut W, point: &Waypoint) -> fmt::Result {
    writeln!(
        out,
        "      <trkpt lat=\"{}\" lon=\"{}\">",
        point.latitude, point.longitude
    )?;
    if let Some(elevation) = point.elevation {
        writeln!(out, "        <ele>{elevation}</ele>")?;
    }
    if let Some(time) = format_time(point.time_ms) {
        writeln!(out, "        <time>{time}</time>")?;
    }
    if let Some(extension) = &point.extensions {
        writeln!(out, "        <extensions>")?;
        writeln!(out, "          <gpxtpx:TrackPointExtension>")?;
        writeln!(
            out,
            "            <gpxtpx:hr>{}</gpxtpx:hr>",
            extension.heart_rate.round() as i64
        )?;
        writeln!(out, "          </gpxtpx:TrackPointExtension>")?;
        writeln!(out, "        </extensions>")?;
    }
    writeln!(out, "      </trkpt>")
}

fn format_time(epoch_ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|time| time.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
