use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `[lat, lng]` pair in degrees. Serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Running,
    Cycling,
}

impl ActivityKind {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Running => "🏃‍♂️",
            Self::Cycling => "🚴‍♀️",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "running" => Ok(Self::Running),
            "cycling" => Ok(Self::Cycling),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The variant-specific metric a user enters on the form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariantMetric {
    /// Steps per minute.
    Cadence(f64),
    /// Feet climbed.
    ElevationGain(f64),
}

impl VariantMetric {
    fn into_activity(self, distance: f64, duration: f64) -> Activity {
        match self {
            Self::Cadence(cadence) => Activity::Running {
                cadence,
                pace: pace(distance, duration),
            },
            Self::ElevationGain(elevation_gain) => Activity::Cycling {
                elevation_gain,
                speed: speed(distance, duration),
            },
        }
    }
}

/// Variant payload, flattened into the record when persisted with its `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Activity {
    Running {
        cadence: f64,
        /// min/mi
        pace: f64,
    },
    Cycling {
        #[serde(rename = "elevationGain")]
        elevation_gain: f64,
        /// mi/h
        speed: f64,
    },
}

impl Activity {
    pub const fn kind(&self) -> ActivityKind {
        match self {
            Self::Running { .. } => ActivityKind::Running,
            Self::Cycling { .. } => ActivityKind::Cycling,
        }
    }
}

/// Minutes per mile.
pub fn pace(distance: f64, duration: f64) -> f64 {
    duration / distance
}

/// Miles per hour, with `duration` in minutes.
pub fn speed(distance: f64, duration: f64) -> f64 {
    distance / (duration / 60.0)
}

/// Record id: the last 10 digits of a millisecond timestamp.
pub fn id_from_millis(ms: i64) -> String {
    let s = ms.to_string();
    s[s.len().saturating_sub(10)..].to_string()
}

/// `"<Label> on <Month> <day>"`, e.g. `Running on April 14`.
pub fn describe(kind: ActivityKind, date: &DateTime<FixedOffset>) -> String {
    format!("{} on {}", kind.label(), date.format("%B %-d"))
}

/// One logged workout. Derived values and the description are fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    date: DateTime<FixedOffset>,
    id: String,
    clicks: u32,
    coords: Coords,
    /// mi
    distance: f64,
    /// min
    duration: f64,
    description: String,
    #[serde(flatten)]
    activity: Activity,
}

impl Workout {
    /// Builds a record; callers validate `distance` and `duration` beforehand.
    pub fn new(
        id: String,
        date: DateTime<FixedOffset>,
        coords: Coords,
        distance: f64,
        duration: f64,
        metric: VariantMetric,
    ) -> Self {
        let activity = metric.into_activity(distance, duration);
        let description = describe(activity.kind(), &date);
        Self {
            date,
            id,
            clicks: 0,
            coords,
            distance,
            duration,
            description,
            activity,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn date(&self) -> DateTime<FixedOffset> {
        self.date
    }

    pub const fn coords(&self) -> Coords {
        self.coords
    }

    pub const fn distance(&self) -> f64 {
        self.distance
    }

    pub const fn duration(&self) -> f64 {
        self.duration
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn activity(&self) -> &Activity {
        &self.activity
    }

    pub const fn kind(&self) -> ActivityKind {
        self.activity.kind()
    }

    pub const fn clicks(&self) -> u32 {
        self.clicks
    }

    pub const fn click(&mut self) {
        self.clicks = self.clicks.saturating_add(1);
    }
}
