//! The controller: owns the workout collection and is the only thing that
//! talks to the store, the map and the user-facing surface.

use crate::dlog;
use crate::form::{self, FormFields, INVALID_INPUT_ALERT, InputError, WorkoutInput};
use crate::map::{DEFAULT_ZOOM, Geolocation, LocateError, MapSurface, PopupOptions, ViewOptions};
use crate::render::{self, ListEntry};
use crate::store::{self, KeyValueStore};
use crate::types::{Coords, Workout, id_from_millis};
use crate::utils::maps_url;
use anyhow::Result;
use chrono::{DateTime, FixedOffset, Local};
use thiserror::Error;

pub const LOCATE_FAILED_ALERT: &str = "could not get your position";

/// Form, list and alert surface the user interacts with.
pub trait Ui {
    fn alert(&mut self, message: &str);
    fn show_form(&mut self);
    /// Hides the form and empties its inputs.
    fn hide_form(&mut self);
    fn toggle_variant_fields(&mut self);
    fn insert_entry(&mut self, entry: &ListEntry);
    fn clear_entries(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormState {
    Idle,
    AwaitingInput { at: Coords },
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no map position selected")]
    NoSelection,
    #[error(transparent)]
    Invalid(#[from] InputError),
    /// The workout was kept in memory but could not be saved.
    #[error("saving workouts failed: {0:#}")]
    Persist(anyhow::Error),
}

type Clock = Box<dyn FnMut() -> DateTime<FixedOffset>>;

pub struct App<S, M, G, U> {
    store: S,
    map: M,
    geo: G,
    ui: U,
    workouts: Vec<Workout>,
    state: FormState,
    map_ready: bool,
    zoom: u8,
    clock: Clock,
}

impl<S, M, G, U> App<S, M, G, U>
where
    S: KeyValueStore,
    M: MapSurface,
    G: Geolocation,
    U: Ui,
{
    /// Wires the collaborators together. Nothing happens until [`App::start`].
    pub fn new(store: S, map: M, geo: G, ui: U) -> Self {
        Self {
            store,
            map,
            geo,
            ui,
            workouts: Vec::new(),
            state: FormState::Idle,
            map_ready: false,
            zoom: DEFAULT_ZOOM,
            clock: Box::new(|| Local::now().fixed_offset()),
        }
    }

    #[must_use]
    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl FnMut() -> DateTime<FixedOffset> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Startup: ask for the position, then restore whatever the store holds.
    pub fn start(&mut self) {
        self.request_location();
        self.restore();
    }

    /// On success the map loads and every known workout gets its marker.
    /// On failure the map stays unloaded; there is no retry.
    pub fn request_location(&mut self) {
        match self.geo.current_position() {
            Ok(at) => self.load_map(at),
            Err(LocateError::Unsupported) => {
                tracing::warn!("geolocation unsupported; map not loaded");
            }
            Err(e) => {
                tracing::warn!(err = %e, "could not get position");
                self.ui.alert(LOCATE_FAILED_ALERT);
            }
        }
    }

    /// Position lookup resolves before `restore` runs, so at startup this
    /// loop sees nothing; restored markers are drawn by `restore` instead.
    /// It matters when a map loads after workouts are already in memory.
    fn load_map(&mut self, at: Coords) {
        tracing::info!(url = %maps_url(at), "loading map");
        self.map.set_view(at, self.zoom, ViewOptions::instant());
        self.map_ready = true;
        for i in 0..self.workouts.len() {
            self.render_marker(i);
        }
    }

    fn restore(&mut self) {
        let workouts = match store::load_workouts(&self.store) {
            Ok(Some(w)) => w,
            Ok(None) => return,
            Err(e) => {
                tracing::error!(err = %format!("{e:#}"), "ignoring unreadable saved workouts");
                return;
            }
        };
        dlog!("restored workouts count={}", workouts.len());

        self.workouts = workouts;
        for i in 0..self.workouts.len() {
            self.ui.insert_entry(&render::list_entry(&self.workouts[i]));
            // Markers wait for the map unless it already loaded.
            if self.map_ready {
                self.render_marker(i);
            }
        }
    }

    pub fn on_map_clicked(&mut self, at: Coords) {
        if !self.map_ready {
            dlog!("map click ignored, map not loaded at={at}");
            return;
        }
        self.state = FormState::AwaitingInput { at };
        self.ui.show_form();
    }

    pub fn on_variant_field_toggled(&mut self) {
        self.ui.toggle_variant_fields();
    }

    /// Validates the form and logs a new workout at the selected position.
    ///
    /// Rejected input raises an alert and leaves the form open. A failed save
    /// still keeps the workout in memory and on screen.
    pub fn on_form_submitted(&mut self, fields: &FormFields) -> Result<&Workout, SubmitError> {
        let FormState::AwaitingInput { at } = self.state else {
            return Err(SubmitError::NoSelection);
        };

        let input = match form::validate(fields) {
            Ok(input) => input,
            Err(e) => {
                tracing::warn!(err = %e, "rejected workout input");
                self.ui.alert(INVALID_INPUT_ALERT);
                return Err(e.into());
            }
        };

        let workout = self.create(at, input);
        tracing::info!(id = workout.id(), description = workout.description(), "new workout");

        let idx = self.workouts.len();
        self.workouts.push(workout);
        self.render_marker(idx);
        self.ui.insert_entry(&render::list_entry(&self.workouts[idx]));

        self.ui.hide_form();
        self.state = FormState::Idle;

        if let Err(e) = self.persist() {
            tracing::error!(err = %format!("{e:#}"), "could not save workouts");
            return Err(SubmitError::Persist(e));
        }
        Ok(&self.workouts[idx])
    }

    fn create(&mut self, at: Coords, input: WorkoutInput) -> Workout {
        let date = (self.clock)();
        let mut ms = date.timestamp_millis();
        let mut id = id_from_millis(ms);
        while self.find(&id).is_some() {
            ms += 1;
            id = id_from_millis(ms);
        }
        Workout::new(id, date, at, input.distance, input.duration, input.metric)
    }

    /// Re-centers the map on the workout with `id`. Unknown ids are ignored.
    pub fn on_list_entry_clicked(&mut self, id: &str) -> Option<&Workout> {
        let Some(idx) = self.workouts.iter().position(|w| w.id() == id) else {
            dlog!("list click on unknown id={id}");
            return None;
        };

        if self.map_ready {
            self.map
                .set_view(self.workouts[idx].coords(), self.zoom, ViewOptions::smooth());
        }
        Some(&self.workouts[idx])
    }

    /// Forgets everything, saved state included, and reloads.
    pub fn reset(&mut self) -> Result<()> {
        store::clear_workouts(&mut self.store)?;
        tracing::info!("workouts cleared");
        self.reload();
        Ok(())
    }

    /// Drops the most recent workout, saves, and reloads.
    ///
    /// Nothing changes in memory or on screen if the save fails.
    pub fn delete_last(&mut self) -> Result<Option<Workout>> {
        let keep = self.workouts.len().saturating_sub(1);
        store::save_workouts(&mut self.store, &self.workouts[..keep])?;
        let removed = self.workouts.pop();
        if let Some(w) = &removed {
            tracing::info!(id = w.id(), "deleted last workout");
        }
        self.reload();
        Ok(removed)
    }

    /// Throws away in-memory and on-screen state and runs startup again.
    pub fn reload(&mut self) {
        dlog!("reloading");
        self.workouts.clear();
        self.state = FormState::Idle;
        self.map_ready = false;
        self.map.reset();
        self.ui.clear_entries();
        self.start();
    }

    fn render_marker(&mut self, idx: usize) {
        if !self.map_ready {
            return;
        }
        let w = &self.workouts[idx];
        let marker = self.map.add_marker(w.coords());
        self.map.bind_annotation(
            marker,
            &render::marker_content(w),
            &PopupOptions::for_kind(w.kind()),
        );
    }

    fn persist(&mut self) -> Result<()> {
        store::save_workouts(&mut self.store, &self.workouts)
    }

    pub fn find(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id() == id)
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub const fn state(&self) -> FormState {
        self.state
    }

    pub const fn map_ready(&self) -> bool {
        self.map_ready
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn map(&self) -> &M {
        &self.map
    }

    pub const fn ui(&self) -> &U {
        &self.ui
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MarkerId;
    use crate::store::{MemoryStore, WORKOUTS_KEY};
    use crate::types::{Activity, ActivityKind};
    use chrono::TimeZone;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeMap {
        views: Vec<(Coords, u8, ViewOptions)>,
        markers: Vec<Coords>,
        popups: Vec<(MarkerId, String, PopupOptions)>,
        resets: usize,
    }

    impl MapSurface for FakeMap {
        fn set_view(&mut self, at: Coords, zoom: u8, options: ViewOptions) {
            self.views.push((at, zoom, options));
        }

        fn add_marker(&mut self, at: Coords) -> MarkerId {
            self.markers.push(at);
            MarkerId(self.markers.len() - 1)
        }

        fn bind_annotation(&mut self, marker: MarkerId, content: &str, options: &PopupOptions) {
            self.popups.push((marker, content.to_string(), options.clone()));
        }

        fn reset(&mut self) {
            self.markers.clear();
            self.popups.clear();
            self.resets += 1;
        }
    }

    struct FakeGeo(Option<Coords>);

    impl Geolocation for FakeGeo {
        fn current_position(&mut self) -> Result<Coords, LocateError> {
            self.0
                .ok_or_else(|| LocateError::Unavailable("denied".into()))
        }
    }

    #[derive(Default)]
    struct FakeUi {
        alerts: Vec<String>,
        form_open: bool,
        toggles: usize,
        entries: Vec<ListEntry>,
        reloads: usize,
    }

    impl Ui for FakeUi {
        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }
        fn show_form(&mut self) {
            self.form_open = true;
        }
        fn hide_form(&mut self) {
            self.form_open = false;
        }
        fn toggle_variant_fields(&mut self) {
            self.toggles += 1;
        }
        fn insert_entry(&mut self, entry: &ListEntry) {
            self.entries.push(entry.clone());
        }
        fn clear_entries(&mut self) {
            self.entries.clear();
            self.reloads += 1;
        }
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn read(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn write(&mut self, _key: &str, _value: &str) -> Result<()> {
            anyhow::bail!("disk full")
        }
        fn remove(&mut self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    /// Reads like its inner store but refuses every write.
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn read(&self, key: &str) -> Result<Option<String>> {
            self.0.read(key)
        }
        fn write(&mut self, _key: &str, _value: &str) -> Result<()> {
            anyhow::bail!("read-only")
        }
        fn remove(&mut self, _key: &str) -> Result<()> {
            anyhow::bail!("read-only")
        }
    }

    type TestApp<S = MemoryStore> = App<S, FakeMap, FakeGeo, FakeUi>;

    const HOME: Coords = Coords::new(40.7, -74.0);

    /// Clock frozen at one instant, so every id would collide without bumping.
    fn frozen() -> impl FnMut() -> DateTime<FixedOffset> {
        let t = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 4, 14, 9, 0, 0)
            .unwrap();
        move || t
    }

    fn app_with(store: MemoryStore, here: Option<Coords>) -> TestApp {
        let mut app = App::new(store, FakeMap::default(), FakeGeo(here), FakeUi::default())
            .with_clock(frozen());
        app.start();
        app
    }

    fn add_run(app: &mut TestApp, at: Coords, distance: &str) -> String {
        app.on_map_clicked(at);
        app.on_form_submitted(&FormFields::running(distance, "30", "165"))
            .unwrap()
            .id()
            .to_string()
    }

    #[test]
    fn submit_scenario_logs_one_workout() {
        let mut app = app_with(MemoryStore::new(), Some(HOME));
        let at = Coords::new(40.0, -73.0);

        app.on_map_clicked(at);
        assert_eq!(app.state(), FormState::AwaitingInput { at });
        assert!(app.ui().form_open);

        let w = app
            .on_form_submitted(&FormFields::running("4.2", "42", "170"))
            .unwrap();
        match w.activity() {
            Activity::Running { pace, cadence } => {
                assert!((pace - 10.0).abs() < 1e-9);
                assert_eq!(*cadence, 170.0);
            }
            Activity::Cycling { .. } => panic!("expected running"),
        }
        assert_eq!(w.coords(), at);
        assert_eq!(w.description(), "Running on April 14");

        assert_eq!(app.workouts().len(), 1);
        assert_eq!(app.map().markers, vec![at]);
        assert_eq!(app.map().popups[0].1, "🏃‍♂️ Running on April 14");
        assert_eq!(app.map().popups[0].2.class_name, "running-popup");
        assert_eq!(app.ui().entries.len(), 1);
        assert!(!app.ui().form_open);
        assert_eq!(app.state(), FormState::Idle);

        let saved = store::load_workouts(app.store()).unwrap().unwrap();
        assert_eq!(saved, app.workouts());
    }

    #[test]
    fn invalid_input_alerts_and_keeps_form_open() {
        let mut app = app_with(MemoryStore::new(), Some(HOME));
        app.on_map_clicked(HOME);

        for fields in [
            FormFields::running("0", "30", "160"),
            FormFields::running("-1", "30", "160"),
            FormFields::cycling("10", "soon", "50"),
        ] {
            let err = app.on_form_submitted(&fields).unwrap_err();
            assert!(matches!(err, SubmitError::Invalid(_)));
        }

        assert_eq!(app.ui().alerts, vec![INVALID_INPUT_ALERT; 3]);
        assert!(app.ui().form_open);
        assert_eq!(app.state(), FormState::AwaitingInput { at: HOME });
        assert!(app.workouts().is_empty());
        assert!(app.store().read(WORKOUTS_KEY).unwrap().is_none());
    }

    #[test]
    fn submit_without_selection_is_refused() {
        let mut app = app_with(MemoryStore::new(), Some(HOME));
        let err = app
            .on_form_submitted(&FormFields::running("1", "10", "150"))
            .unwrap_err();
        assert!(matches!(err, SubmitError::NoSelection));
        assert!(app.ui().alerts.is_empty());
    }

    #[test]
    fn same_form_twice_gives_distinct_ids() {
        let mut app = app_with(MemoryStore::new(), Some(HOME));
        let a = add_run(&mut app, HOME, "5");
        let b = add_run(&mut app, HOME, "5");
        assert_ne!(a, b);
        assert_eq!(app.workouts().len(), 2);
    }

    #[test]
    fn cycling_submission_derives_speed() {
        let mut app = app_with(MemoryStore::new(), Some(HOME));
        app.on_variant_field_toggled();
        assert_eq!(app.ui().toggles, 1);

        app.on_map_clicked(HOME);
        let w = app
            .on_form_submitted(&FormFields::cycling("30", "90", "-40"))
            .unwrap();
        assert_eq!(w.kind(), ActivityKind::Cycling);
        assert!(matches!(
            *w.activity(),
            Activity::Cycling { speed, elevation_gain } if speed == 20.0 && elevation_gain == -40.0
        ));
    }

    #[test]
    fn list_click_recenters_smoothly() {
        let mut app = app_with(MemoryStore::new(), Some(HOME)).with_zoom(15);
        let spot = Coords::new(41.0, -72.5);
        let id = add_run(&mut app, spot, "3");

        assert!(app.on_list_entry_clicked(&id).is_some());
        let (at, zoom, opts) = *app.map().views.last().unwrap();
        assert_eq!(at, spot);
        assert_eq!(zoom, 15);
        assert_eq!(opts, ViewOptions::smooth());
        assert_eq!(app.find(&id).unwrap().clicks(), 0);

        let views = app.map().views.len();
        assert!(app.on_list_entry_clicked("nope").is_none());
        assert_eq!(app.map().views.len(), views);
    }

    #[test]
    fn restore_renders_list_then_markers() {
        let mut seeded = app_with(MemoryStore::new(), Some(HOME));
        add_run(&mut seeded, Coords::new(1.0, 1.0), "2");
        add_run(&mut seeded, Coords::new(2.0, 2.0), "4");
        let store = seeded.store().clone();

        let app = app_with(store, Some(HOME));
        assert_eq!(app.workouts(), seeded.workouts());
        let ids: Vec<&str> = app.ui().entries.iter().map(|e| e.id.as_str()).collect();
        let expected: Vec<&str> = seeded.workouts().iter().map(Workout::id).collect();
        assert_eq!(ids, expected);
        assert_eq!(
            app.map().markers,
            vec![Coords::new(1.0, 1.0), Coords::new(2.0, 2.0)]
        );
    }

    #[test]
    fn geolocation_failure_alerts_and_defers_markers() {
        let mut seeded = app_with(MemoryStore::new(), Some(HOME));
        add_run(&mut seeded, HOME, "2");

        let mut app = app_with(seeded.store().clone(), None);
        assert_eq!(app.ui().alerts, vec![LOCATE_FAILED_ALERT]);
        assert!(!app.map_ready());
        assert_eq!(app.ui().entries.len(), 1);
        assert!(app.map().markers.is_empty());

        app.on_map_clicked(HOME);
        assert_eq!(app.state(), FormState::Idle);
    }

    #[test]
    fn unreadable_store_starts_empty() {
        let mut store = MemoryStore::new();
        store.write(WORKOUTS_KEY, "{broken").unwrap();
        let app = app_with(store, Some(HOME));
        assert!(app.workouts().is_empty());
        assert!(app.ui().entries.is_empty());
    }

    #[test]
    fn delete_last_drops_newest_and_reloads() {
        let mut app = app_with(MemoryStore::new(), Some(HOME));
        add_run(&mut app, HOME, "1");
        let second = add_run(&mut app, HOME, "2");
        let third = add_run(&mut app, HOME, "3");

        let removed = app.delete_last().unwrap().unwrap();
        assert_eq!(removed.id(), third);

        assert_eq!(app.workouts().len(), 2);
        assert_eq!(app.workouts()[1].id(), second);
        assert_eq!(store::load_workouts(app.store()).unwrap().unwrap().len(), 2);
        assert_eq!(app.ui().reloads, 1);
        assert_eq!(app.map().resets, 1);
        assert_eq!(app.ui().entries.len(), 2);
        assert_eq!(app.map().markers.len(), 2);
    }

    #[test]
    fn delete_last_on_empty_collection_still_saves() {
        let mut app = app_with(MemoryStore::new(), Some(HOME));
        assert!(app.delete_last().unwrap().is_none());
        assert_eq!(app.store().read(WORKOUTS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn delete_last_keeps_everything_when_save_fails() {
        let mut seeded = app_with(MemoryStore::new(), Some(HOME));
        add_run(&mut seeded, HOME, "1");
        add_run(&mut seeded, HOME, "2");

        let mut app: TestApp<ReadOnlyStore> = App::new(
            ReadOnlyStore(seeded.store().clone()),
            FakeMap::default(),
            FakeGeo(Some(HOME)),
            FakeUi::default(),
        );
        app.start();

        assert!(app.delete_last().is_err());
        assert_eq!(app.workouts(), seeded.workouts());
        assert_eq!(app.ui().entries.len(), 2);
        assert_eq!(app.map().markers.len(), 2);
        assert_eq!(app.ui().reloads, 0);
    }

    #[test]
    fn reset_removes_the_slot_and_reloads_empty() {
        let mut app = app_with(MemoryStore::new(), Some(HOME));
        add_run(&mut app, HOME, "1");
        add_run(&mut app, HOME, "2");

        app.reset().unwrap();
        assert!(app.store().read(WORKOUTS_KEY).unwrap().is_none());
        assert!(app.workouts().is_empty());
        assert!(app.ui().entries.is_empty());
        assert!(app.map().markers.is_empty());
        assert_eq!(app.ui().reloads, 1);
        assert!(app.map_ready());
    }

    #[test]
    fn failed_save_is_reported_but_workout_stays() {
        let mut app: TestApp<BrokenStore> =
            App::new(BrokenStore, FakeMap::default(), FakeGeo(Some(HOME)), FakeUi::default());
        app.start();
        app.on_map_clicked(HOME);

        let err = app
            .on_form_submitted(&FormFields::running("1", "10", "150"))
            .unwrap_err();
        assert!(matches!(err, SubmitError::Persist(_)));
        assert_eq!(app.workouts().len(), 1);
        assert_eq!(app.ui().entries.len(), 1);
    }

    #[test]
    fn clock_drives_ids() {
        let ticks = Rc::new(Cell::new(0_i64));
        let t = Rc::clone(&ticks);
        let mut app = App::new(
            MemoryStore::new(),
            FakeMap::default(),
            FakeGeo(Some(HOME)),
            FakeUi::default(),
        )
        .with_clock(move || {
            t.set(t.get() + 1);
            FixedOffset::east_opt(0)
                .unwrap()
                .timestamp_millis_opt(1_713_088_800_000 + t.get())
                .unwrap()
        });
        app.start();

        let id = add_run(&mut app, HOME, "1");
        assert_eq!(id, id_from_millis(1_713_088_800_001));
        assert_eq!(ticks.get(), 1);
        assert_eq!(app.workouts()[0].id(), "3088800001");
        assert_eq!(app.workouts()[0].kind(), ActivityKind::Running);
    }
}
