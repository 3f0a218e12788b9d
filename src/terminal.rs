//! Collaborators for running the controller from a terminal.

use crate::app::Ui;
use crate::dlog;
use crate::map::{Geolocation, LocateError, MapSurface, MarkerId, PopupOptions, ViewOptions};
use crate::render::ListEntry;
use crate::types::Coords;

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub at: Coords,
    pub popup: Option<String>,
}

/// Keeps the map state in memory and reports changes through tracing.
#[derive(Debug, Default)]
pub struct TerminalMap {
    view: Option<(Coords, u8)>,
    markers: Vec<Marker>,
}

impl TerminalMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn view(&self) -> Option<(Coords, u8)> {
        self.view
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }
}

impl MapSurface for TerminalMap {
    fn set_view(&mut self, at: Coords, zoom: u8, options: ViewOptions) {
        dlog!("map view at={at} zoom={zoom} animate={}", options.animate);
        self.view = Some((at, zoom));
    }

    fn add_marker(&mut self, at: Coords) -> MarkerId {
        self.markers.push(Marker { at, popup: None });
        MarkerId(self.markers.len() - 1)
    }

    fn bind_annotation(&mut self, marker: MarkerId, content: &str, options: &PopupOptions) {
        let Some(m) = self.markers.get_mut(marker.0) else {
            tracing::warn!(marker = marker.0, "popup for unknown marker");
            return;
        };
        dlog!("popup marker={} class={} {content}", marker.0, options.class_name);
        m.popup = Some(content.to_string());
    }

    fn reset(&mut self) {
        self.view = None;
        self.markers.clear();
    }
}

/// Position given up front, e.g. from the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Option<Coords>);

impl Geolocation for FixedLocation {
    fn current_position(&mut self) -> Result<Coords, LocateError> {
        self.0
            .ok_or_else(|| LocateError::Unavailable("no position given".to_string()))
    }
}

/// Alerts go to stderr; list entries are collected in insertion order.
#[derive(Debug, Default)]
pub struct TerminalUi {
    entries: Vec<ListEntry>,
    alerts: Vec<String>,
    form_open: bool,
    elevation_shown: bool,
}

impl TerminalUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub const fn elevation_shown(&self) -> bool {
        self.elevation_shown
    }
}

impl Ui for TerminalUi {
    fn alert(&mut self, message: &str) {
        eprintln!("{message}");
        self.alerts.push(message.to_string());
    }

    fn show_form(&mut self) {
        self.form_open = true;
    }

    fn hide_form(&mut self) {
        self.form_open = false;
    }

    fn toggle_variant_fields(&mut self) {
        self.elevation_shown = !self.elevation_shown;
    }

    fn insert_entry(&mut self, entry: &ListEntry) {
        self.entries.push(entry.clone());
    }

    fn clear_entries(&mut self) {
        self.entries.clear();
    }
}
