use crate::types::{ActivityKind, Coords};
use thiserror::Error;

pub const DEFAULT_ZOOM: u8 = 13;

/// Handle returned by [`MapSurface::add_marker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewOptions {
    pub animate: bool,
    /// Pan duration in seconds, when animated.
    pub pan_duration: Option<f64>,
}

impl ViewOptions {
    pub const fn instant() -> Self {
        Self {
            animate: false,
            pan_duration: None,
        }
    }

    /// Used when re-centering on a selected workout.
    pub const fn smooth() -> Self {
        Self {
            animate: true,
            pan_duration: Some(1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupOptions {
    pub max_width: u32,
    pub min_width: u32,
    pub auto_close: bool,
    pub close_on_click: bool,
    pub class_name: String,
}

impl PopupOptions {
    /// Popups that stay open alongside each other, styled per workout type.
    pub fn for_kind(kind: ActivityKind) -> Self {
        Self {
            max_width: 250,
            min_width: 100,
            auto_close: false,
            close_on_click: false,
            class_name: format!("{}-popup", kind.tag()),
        }
    }
}

/// The interactive map the controller draws on.
pub trait MapSurface {
    fn set_view(&mut self, at: Coords, zoom: u8, options: ViewOptions);
    fn add_marker(&mut self, at: Coords) -> MarkerId;
    fn bind_annotation(&mut self, marker: MarkerId, content: &str, options: &PopupOptions);
    /// Drops every marker, as a freshly loaded page would.
    fn reset(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error("geolocation is not supported here")]
    Unsupported,
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

/// Single-shot device position lookup.
pub trait Geolocation {
    fn current_position(&mut self) -> Result<Coords, LocateError>;
}
