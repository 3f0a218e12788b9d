use crate::types::{Activity, ActivityKind, Workout};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    pub icon: &'static str,
    pub value: String,
    pub unit: &'static str,
}

impl DetailRow {
    fn new(icon: &'static str, value: String, unit: &'static str) -> Self {
        Self { icon, value, unit }
    }
}

/// One entry of the workout list, keyed by the workout id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub id: String,
    pub kind: ActivityKind,
    pub title: String,
    pub rows: Vec<DetailRow>,
}

/// Popup text shown on the workout's marker.
pub fn marker_content(w: &Workout) -> String {
    format!("{} {}", w.kind().icon(), w.description())
}

pub fn list_entry(w: &Workout) -> ListEntry {
    let mut rows = vec![
        DetailRow::new(w.kind().icon(), w.distance().to_string(), "mi"),
        DetailRow::new("⏱", w.duration().to_string(), "min"),
    ];

    match *w.activity() {
        Activity::Running { cadence, pace } => {
            rows.push(DetailRow::new("⚡️", fixed1(pace), "min/mi"));
            rows.push(DetailRow::new("🦶🏼", cadence.to_string(), "spm"));
        }
        Activity::Cycling {
            elevation_gain,
            speed,
        } => {
            rows.push(DetailRow::new("⚡️", fixed1(speed), "mi/h"));
            rows.push(DetailRow::new("⛰", elevation_gain.to_string(), "ft"));
        }
    }

    ListEntry {
        id: w.id().to_string(),
        kind: w.kind(),
        title: w.description().to_string(),
        rows,
    }
}

impl ListEntry {
    /// The `<li>` fragment a browser host inserts into the workout list.
    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<li class=\"workout workout--{}\" data-id=\"{}\">\n  <h2 class=\"workout__title\">{}</h2>\n",
            self.kind.tag(),
            escape(&self.id),
            escape(&self.title)
        );
        for row in &self.rows {
            html.push_str(&format!(
                "  <div class=\"workout__details\">\n    <span class=\"workout__icon\">{}</span>\n    <span class=\"workout__value\">{}</span>\n    <span class=\"workout__unit\">{}</span>\n  </div>\n",
                row.icon,
                escape(&row.value),
                row.unit
            ));
        }
        html.push_str("</li>");
        html
    }
}

impl fmt::Display for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.title)?;
        for row in &self.rows {
            write!(f, "  {} {} {}", row.icon, row.value, row.unit)?;
        }
        Ok(())
    }
}

/// One decimal place, with exact halves rounded up rather than to even.
fn fixed1(v: f64) -> String {
    // Only x.25 and x.75 sit exactly halfway between two tenths.
    let quarters = v * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        return format!("{:.1}", (v * 10.0).ceil() / 10.0);
    }
    format!("{v:.1}")
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
