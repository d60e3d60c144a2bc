//! Popup content for a clicked vehicle.

use chrono::{Locale, NaiveDateTime};
use geojson::JsonObject;
use inspector_transit::TripStart;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// Identifiers, shown monospaced.
    Code,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupLine {
    pub label: &'static str,
    pub value: String,
    pub style: LineStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupSection {
    pub title: &'static str,
    pub lines: Vec<PopupLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopupContent {
    pub sections: Vec<PopupSection>,
}

/// Locale-aware short date and time for trip starts.
#[derive(Debug, Clone, Copy)]
pub struct StartFormat {
    pub locale: Locale,
}

impl Default for StartFormat {
    fn default() -> Self {
        Self {
            locale: Locale::en_US,
        }
    }
}

impl StartFormat {
    pub fn format(&self, timestamp: NaiveDateTime) -> String {
        // Wall-clock time as given; no zone conversion.
        timestamp
            .and_utc()
            .format_localized("%x %R", self.locale)
            .to_string()
    }
}

/// Display text of a feature property, or `None` for values that mean
/// "nothing here" (null, empty, or the strings `null`/`undefined` that
/// stringifying surfaces leave behind).
pub fn display_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() || s == "null" || s == "undefined" => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl PopupContent {
    pub fn for_vehicle(properties: &JsonObject, start_format: &StartFormat) -> Self {
        let field = |key: &str| display_value(properties.get(key));

        let mut vehicle = PopupSection::new("Vehicle");
        vehicle.push("ID", field("vehicleId"), LineStyle::Code);
        vehicle.push("Label", field("vehicleLabel"), LineStyle::Code);
        vehicle.push("License Plate", field("vehicleLicensePlate"), LineStyle::Code);

        let mut trip = PopupSection::new("Trip");
        trip.push("ID", field("trip_id"), LineStyle::Code);
        trip.push("Route", field("route_id"), LineStyle::Code);
        if let (Some(date), Some(time)) = (field("start_date"), field("start_time")) {
            match TripStart::parse(&date, &time) {
                Ok(start) => trip.push("Start", Some(start_format.format(start.timestamp())), LineStyle::Plain),
                Err(e) => tracing::debug!(error = %e, "omitting unparseable trip start"),
            }
        }

        Self {
            sections: [vehicle, trip]
                .into_iter()
                .filter(|section| !section.lines.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn line(&self, section: &str, label: &str) -> Option<&PopupLine> {
        self.sections
            .iter()
            .filter(|s| s.title == section)
            .flat_map(|s| &s.lines)
            .find(|line| line.label == label)
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from("<div>");
        for section in &self.sections {
            html.push_str(&format!("<b>{}</b><br/>", section.title));
            for line in &section.lines {
                let value = escape_html(&line.value);
                match line.style {
                    LineStyle::Code => html.push_str(&format!("{}: <code>{value}</code><br/>", line.label)),
                    LineStyle::Plain => html.push_str(&format!("{}: {value}<br/>", line.label)),
                }
            }
        }
        html.push_str("</div>");
        html
    }
}

impl PopupSection {
    fn new(title: &'static str) -> Self {
        Self {
            title,
            lines: Vec::new(),
        }
    }

    fn push(&mut self, label: &'static str, value: Option<String>, style: LineStyle) {
        if let Some(value) = value {
            self.lines.push(PopupLine { label, value, style });
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
