use crate::types::Coords;
use anyhow::{Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing_subscriber::{EnvFilter, fmt};

#[macro_export]
macro_rules! dlog {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*);
    };
}

/// Initialize colorful logging.
///
/// Default level is INFO.
/// - `-v` => DEBUG
/// - `-vv` => TRACE
/// - `-q` => WARN
/// - `-qq` => ERROR
///
/// `RUST_LOG` overrides everything (e.g. `RUST_LOG=trace`).
pub fn init_logging(verbose: u8, quiet: u8) {
    let net = i16::from(verbose) - i16::from(quiet);
    let level = match net {
        i16::MIN..=-2 => "error",
        -1 => "warn",
        0 => "info",
        1 => "debug",
        2..=i16::MAX => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,waymark={level}")));

    let show_src = matches!(level, "debug" | "trace");

    fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_file(show_src)
        .with_line_number(show_src)
        .compact()
        .init();
}

const NUM: &str = r"[-+]?\d+(?:\.\d+)?";

static PLAIN_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^\s*({NUM})\s*,\s*({NUM})\s*$")).expect("valid regex"));

// e.g. https://www.google.com/maps/@40.7,-74.0,13z
static MAPS_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"/maps/@({NUM}),({NUM})")).expect("valid regex"));

/// Accepts `lat,lng` or a maps URL with an `@lat,lng` segment.
pub fn parse_coords(s: &str) -> Result<Coords> {
    let Some(caps) = PLAIN_PAIR.captures(s).or_else(|| MAPS_URL.captures(s)) else {
        bail!("expected LAT,LNG or a maps URL, got {s:?}");
    };

    let lat: f64 = caps[1].parse()?;
    let lng: f64 = caps[2].parse()?;
    if !(-90.0..=90.0).contains(&lat) {
        bail!("latitude out of range: {lat}");
    }
    if !(-180.0..=180.0).contains(&lng) {
        bail!("longitude out of range: {lng}");
    }
    Ok(Coords::new(lat, lng))
}

pub fn maps_url(at: Coords) -> String {
    format!("https://www.google.com/maps/@{},{}", at.lat, at.lng)
}
