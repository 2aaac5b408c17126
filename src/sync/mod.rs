//! Persistence-synchronized catchment engine
//!
//! `Engine` ties the registry, color assigner and pin manager to a remote
//! favorites store and a map surface. Every mutation follows the same
//! pipeline:
//!
//! 1. build a candidate from the current state (validation and capacity
//!    errors stop here, before any remote call)
//! 2. send the candidate to the store, bounded by a timeout
//! 3. on success replace local state, emit render commands, notify
//! 4. on failure leave local state untouched and notify the error
//!
//! Mutations of one school are serialized by a per-school lock; different
//! schools proceed concurrently. State locks are never held across a store
//! call, so queries and map clicks stay responsive during a save.


use crate::catchment::query::{self, SchoolCoverage};
use crate::catchment::zones::{self, ZoneChange};
use crate::catchment::{
    average, CatchmentZone, Color, ColorAssigner, PaletteName, PaletteSelection, RadiusCircle,
    School, SchoolId, ZoneId,
};
use crate::constants::limits::{AVERAGE_YEAR, MAX_FAVORITES};
use crate::error::{Error, Result};
use crate::geo::{Coordinates, Measurement, Unit};
use crate::pins::{DragOutcome, PinEvent, PinId, PinInfo, PinKind, PinManager};
use crate::registry::SchoolRegistry;
use crate::render::{diff_circles, MapSurface, NullSurface, RenderCommand};
use crate::store::{FavoritesStore, StoreOp};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard as StdMutexGuard};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

/// Default bound on a single store call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// User-facing outcome of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Receives success and error notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Success(message) => info!("{}", message),
            Notice::Error(message) => warn!("{}", message),
        }
    }
}

/// Notifier that keeps notices for later inspection
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: StdMutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, notice: Notice) {
        match self.notices.lock() {
            Ok(mut guard) => guard.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }
}

/// One async mutex per school
#[derive(Debug, Default)]
pub struct EntityLocks {
    locks: StdMutex<HashMap<SchoolId, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    /// Wait for exclusive access to one school
    pub async fn lock(&self, id: SchoolId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = match self.locks.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            locks.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }

    fn forget(&self, id: SchoolId) {
        if let Ok(mut locks) = self.locks.lock() {
            locks.remove(&id);
        }
    }

    fn len(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or_default()
    }
}

fn lock_count(count: &StdMutex<usize>) -> StdMutexGuard<'_, usize> {
    match count.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// A favorites slot held while a new school is being created remotely
///
/// Dropping it frees the slot.
struct Reservation<'a> {
    count: &'a StdMutex<usize>,
}

impl<'a> Reservation<'a> {
    fn new(count: &'a StdMutex<usize>) -> Self {
        *lock_count(count) += 1;
        Self { count }
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        let mut count = lock_count(self.count);
        *count = count.saturating_sub(1);
    }
}

/// Proof that the user confirmed removing a school
///
/// Only `Engine::prepare_removal` creates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalConfirmation {
    school_id: SchoolId,
    name: String,
    zone_count: usize,
}

impl RemovalConfirmation {
    pub fn school_id(&self) -> SchoolId {
        self.school_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zone_count(&self) -> usize {
        self.zone_count
    }

    /// Prompt text for a confirmation dialog
    pub fn prompt(&self) -> String {
        format!(
            "Remove {} and its {} catchment zone(s)?",
            self.name, self.zone_count
        )
    }
}

/// What a map click resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Consumed by placement or measurement mode
    Pin(PinEvent),
    /// Plain click: schools whose catchment covers the point
    Coverage(BTreeSet<SchoolId>),
}

/// Result of recoloring every school
///
/// `selection` is the palette in force afterward. Schools listed in
/// `failed` keep their previous colors until the next recolor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecolorReport {
    pub selection: PaletteSelection,
    pub recolored: Vec<SchoolId>,
    pub failed: Vec<SchoolId>,
}

/// Catchment engine synchronized with a favorites store
pub struct Engine<S> {
    store: S,
    surface: Arc<dyn MapSurface>,
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
    registry: RwLock<SchoolRegistry>,
    colors: RwLock<ColorAssigner>,
    pins: RwLock<PinManager>,
    locks: EntityLocks,
    /// Adds in flight, counted against the favorites limit
    reserved: StdMutex<usize>,
}

impl<S: FavoritesStore> Engine<S> {
    /// Create an engine with an empty registry
    ///
    /// Call `load` to seed it from the store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            surface: Arc::new(NullSurface),
            notifier: Arc::new(LogNotifier),
            timeout: DEFAULT_TIMEOUT,
            registry: RwLock::new(SchoolRegistry::new()),
            colors: RwLock::new(ColorAssigner::default()),
            pins: RwLock::new(PinManager::new()),
            locks: EntityLocks::default(),
            reserved: StdMutex::new(0),
        }
    }

    pub fn with_surface(mut self, surface: Arc<dyn MapSurface>) -> Self {
        self.surface = surface;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_palette(self, selection: PaletteSelection) -> Self {
        Self {
            colors: RwLock::new(ColorAssigner::new(selection)),
            ..self
        }
    }

    /// Restore cached pins
    pub fn with_pins(self, pins: Vec<PinInfo>) -> Self {
        Self {
            pins: RwLock::new(PinManager::with_pins(pins)),
            ..self
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Seed local state from the store and redraw every overlay
    ///
    /// Returns the number of schools loaded.
    pub async fn load(&self) -> Result<usize> {
        let result = async {
            let schools = self.persist(StoreOp::List, self.store.list()).await?;

            let circles = {
                let mut registry = self.registry.write().await;
                let mut colors = self.colors.write().await;

                let mut seeded = Vec::with_capacity(schools.len());
                for (index, mut school) in schools
                    .into_iter()
                    .filter(|s| s.is_favorite)
                    .enumerate()
                {
                    let dropped = school.dedupe_years();
                    if dropped > 0 {
                        warn!(
                            school = %school.id,
                            dropped,
                            "stored school had several zones for one year, kept the last"
                        );
                    }
                    colors.restore(&school);
                    let color = colors.color_for(school.id, index, AVERAGE_YEAR);
                    average::recompute(&mut school, color);
                    seeded.push(school);
                }
                registry.seed(seeded);
                registry.circles()
            };

            let markers = {
                let registry = self.registry.read().await;
                let mut pins = self.pins.write().await;
                let stale: Vec<PinId> = pins
                    .pins()
                    .iter()
                    .filter(|p| p.school_id.is_some_and(|id| !registry.contains(id)))
                    .map(|p| p.id)
                    .collect();
                for id in &stale {
                    pins.remove(*id)?;
                }
                pins.pins().to_vec()
            };

            let mut commands: Vec<RenderCommand> =
                circles.into_iter().map(RenderCommand::DrawCircle).collect();
            commands.extend(markers.into_iter().map(RenderCommand::DrawMarker));
            self.surface.apply(&commands);

            Ok::<_, Error>(self.registry.read().await.len())
        }
        .await;

        self.report(result, |count| format!("Loaded {} favorite school(s)", count))
    }

    // ---- schools ----

    /// Add a favorite school at the given coordinates
    pub async fn add_school(
        &self,
        name: &str,
        address: &str,
        coordinates: Coordinates,
    ) -> Result<School> {
        let result = self.add_school_inner(name, address, coordinates).await;
        self.report(result, |school| format!("Added {} to favorites", school.name))
    }

    /// Add a favorite school at the pending school pin and link the pin
    pub async fn add_school_at_pin(&self, name: &str, address: &str) -> Result<School> {
        let result = async {
            let pin = self.pins.read().await.school_pin().cloned().ok_or_else(|| {
                Error::Validation("Place a school pin before adding a school".to_string())
            })?;

            let school = self.add_school_inner(name, address, pin.coordinates).await?;

            let linked = {
                let mut pins = self.pins.write().await;
                pins.link(pin.id, school.id, &school.name)?;
                pins.get(pin.id).cloned()
            };
            if let Some(linked) = linked {
                self.surface.apply(&[RenderCommand::DrawMarker(linked)]);
            }
            Ok::<_, Error>(school)
        }
        .await;

        self.report(result, |school| format!("Added {} to favorites", school.name))
    }

    async fn add_school_inner(
        &self,
        name: &str,
        address: &str,
        coordinates: Coordinates,
    ) -> Result<School> {
        let (candidate, reservation) = {
            let registry = self.registry.read().await;
            let candidate = registry.add_favorite(name, address, coordinates)?;
            if registry.len() + *lock_count(&self.reserved) >= MAX_FAVORITES {
                return Err(Error::Capacity(format!(
                    "At most {} favorite schools can be tracked",
                    MAX_FAVORITES
                )));
            }
            (candidate, Reservation::new(&self.reserved))
        };

        self.persist(StoreOp::Create, self.store.create(&candidate))
            .await?;

        {
            let mut registry = self.registry.write().await;
            registry.insert(candidate.clone())?;
            // Release the slot while the insert is still exclusive
            drop(reservation);
        }
        info!(school = %candidate.id, name = %candidate.name, "school added");
        Ok(candidate)
    }

    /// First step of a user-initiated removal
    pub async fn prepare_removal(&self, id: SchoolId) -> Result<RemovalConfirmation> {
        let registry = self.registry.read().await;
        let school = registry.require(id)?;
        Ok(RemovalConfirmation {
            school_id: school.id,
            name: school.name.clone(),
            zone_count: school.zones.len(),
        })
    }

    /// Remove a school the user confirmed
    pub async fn remove_school(&self, confirmation: RemovalConfirmation) -> Result<School> {
        let result = self.remove_school_inner(confirmation.school_id).await;
        self.report(result, |school| format!("Removed {}", school.name))
    }

    /// Remove a school without a confirmation step (programmatic flows)
    pub async fn purge_school(&self, id: SchoolId) -> Result<School> {
        let result = self.remove_school_inner(id).await;
        self.report(result, |school| format!("Removed {}", school.name))
    }

    async fn remove_school_inner(&self, id: SchoolId) -> Result<School> {
        let _guard = self.lock_school(id).await?;

        self.persist(StoreOp::Delete, self.store.delete(id)).await?;

        let removed = self.registry.write().await.remove_favorite(id)?;
        self.colors.write().await.forget_school(id);
        let pins = self.pins.write().await.remove_for_school(id);

        let mut commands: Vec<RenderCommand> = removed
            .circles()
            .iter()
            .map(|c| RenderCommand::RemoveCircle(c.key()))
            .collect();
        commands.extend(pins.iter().map(|p| RenderCommand::RemoveMarker { id: p.id }));
        self.surface.apply(&commands);

        self.locks.forget(id);
        info!(school = %id, "school removed");
        Ok(removed)
    }

    /// Move a school and every circle centered on it
    ///
    /// Persist, relocate in the registry, recompute circles, emit commands,
    /// and keep the linked pin in step.
    pub async fn relocate_school(
        &self,
        id: SchoolId,
        coordinates: Coordinates,
    ) -> Result<Vec<RadiusCircle>> {
        let result = self.relocate_inner(id, coordinates).await;
        self.report(result, |_| "Updated school location".to_string())
    }

    async fn relocate_inner(
        &self,
        id: SchoolId,
        coordinates: Coordinates,
    ) -> Result<Vec<RadiusCircle>> {
        coordinates.validate()?;
        let _guard = self.lock_school(id).await?;

        let (before, candidate) = {
            let registry = self.registry.read().await;
            let school = registry.require(id)?;
            let mut candidate = school.clone();
            candidate.coordinates = coordinates;
            candidate.touch();
            (school.circles(), candidate)
        };

        self.persist(StoreOp::Update, self.store.update(&candidate))
            .await?;

        let circles = self.registry.write().await.relocate(id, coordinates)?;
        let mut commands = diff_circles(&before, &circles);

        let mut pins = self.pins.write().await;
        let linked = pins
            .pin_for_school(id)
            .filter(|p| p.coordinates != coordinates)
            .map(|p| p.id);
        if let Some(pin_id) = linked {
            pins.revert(pin_id, coordinates)?;
            commands.push(RenderCommand::MoveMarker {
                id: pin_id,
                coordinates,
            });
        }
        drop(pins);

        self.surface.apply(&commands);
        debug!(school = %id, %coordinates, "school relocated");
        Ok(circles)
    }

    // ---- zones ----

    /// Add or replace the zone of `school_id` for `year`
    ///
    /// Without an explicit color the assigner picks one; an explicit color
    /// becomes an override for that (school, year).
    pub async fn upsert_zone(
        &self,
        school_id: SchoolId,
        year: i32,
        radius: f64,
        unit: Unit,
        color: Option<Color>,
    ) -> Result<ZoneChange> {
        let result = async {
            zones::validate_zone(year, radius)?;

            self.mutate_school(school_id, |school, index, colors| {
                let zone_color =
                    color.unwrap_or_else(|| colors.color_for(school.id, index, year));
                let average_color = colors.color_for(school.id, index, AVERAGE_YEAR);
                let change =
                    zones::upsert_zone(school, year, radius, unit, zone_color, average_color)?;
                if color.is_some() {
                    if let Some(zone) = school.zone_for_year_mut(year) {
                        zone.custom_color = true;
                    }
                }
                Ok(change)
            })
            .await
        }
        .await;

        self.report(result, |_| format!("Saved {} catchment", year))
    }

    /// Remove one zone by id
    pub async fn remove_zone(&self, zone_id: ZoneId) -> Result<CatchmentZone> {
        let result = async {
            let school_id = self.zone_owner(zone_id).await?;
            self.mutate_school(school_id, |school, _, _| zones::remove_zone(school, zone_id))
                .await
        }
        .await;

        self.report(result, |zone| format!("Removed {} catchment", zone.year))
    }

    pub async fn set_zone_visibility(&self, zone_id: ZoneId, visible: bool) -> Result<()> {
        let result = async {
            let school_id = self.zone_owner(zone_id).await?;
            self.mutate_school(school_id, |school, _, _| {
                zones::set_zone_visibility(school, zone_id, visible)
            })
            .await
        }
        .await;

        self.report(result, |_| "Updated zone visibility".to_string())
    }

    pub async fn set_average_visibility(&self, school_id: SchoolId, visible: bool) -> Result<()> {
        let result = self
            .mutate_school(school_id, |school, _, _| {
                zones::set_average_visibility(school, visible)
            })
            .await;

        self.report(result, |_| "Updated average visibility".to_string())
    }

    async fn zone_owner(&self, zone_id: ZoneId) -> Result<SchoolId> {
        self.registry
            .read()
            .await
            .find_zone_owner(zone_id)
            .map(|s| s.id)
            .ok_or_else(|| Error::NotFound(format!("Zone not found: {}", zone_id)))
    }

    /// Wait for exclusive access to a known school
    ///
    /// Unknown ids fail before a lock entry is created. A school removed
    /// while we waited has its entry dropped again.
    async fn lock_school(&self, id: SchoolId) -> Result<OwnedMutexGuard<()>> {
        self.registry.read().await.require(id)?;
        let guard = self.locks.lock(id).await;
        if !self.registry.read().await.contains(id) {
            drop(guard);
            self.locks.forget(id);
            return Err(Error::NotFound(format!("School not found: {}", id)));
        }
        Ok(guard)
    }

    /// Apply `f` to a candidate copy of a school, persist it, then commit
    ///
    /// The color assigner is refreshed from the committed school before the
    /// school lock is released.
    async fn mutate_school<T, F>(&self, id: SchoolId, f: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&mut School, usize, &ColorAssigner) -> Result<T> + Send,
    {
        let _guard = self.lock_school(id).await?;

        let (before, candidate, value) = {
            let registry = self.registry.read().await;
            let colors = self.colors.read().await;
            let school = registry.require(id)?;
            let index = registry.index_of(id).unwrap_or_default();

            let mut candidate = school.clone();
            let value = f(&mut candidate, index, &colors)?;
            (school.circles(), candidate, value)
        };

        self.persist(StoreOp::Update, self.store.update(&candidate))
            .await?;

        let after = candidate.circles();
        self.registry.write().await.replace(candidate.clone())?;
        self.colors.write().await.restore(&candidate);
        self.surface.apply(&diff_circles(&before, &after));
        Ok(value)
    }

    // ---- colors ----

    /// Switch the global palette and recolor every school
    ///
    /// The selection takes effect even if some schools fail to save; the
    /// report lists them.
    pub async fn select_palette(&self, selection: PaletteSelection) -> RecolorReport {
        self.colors.write().await.select(selection);
        self.recolor_all(|_| {}).await
    }

    /// Give one school its own year-indexed palette
    ///
    /// Nothing changes locally unless the store accepts the recolored school.
    pub async fn set_school_palette(
        &self,
        school_id: SchoolId,
        palette: PaletteName,
    ) -> Result<()> {
        let result = self
            .recolor(school_id, move |school| school.palette = Some(palette))
            .await
            .map(|_| ());
        self.report(result, |_| format!("Applied {} palette", palette))
    }

    /// Drop custom colors and school palettes, return to the default palette
    pub async fn reset_colors(&self) -> RecolorReport {
        self.colors.write().await.select(PaletteSelection::default());
        self.recolor_all(|school| {
            school.palette = None;
            for zone in &mut school.zones {
                zone.custom_color = false;
            }
        })
        .await
    }

    pub async fn palette(&self) -> PaletteSelection {
        self.colors.read().await.selection()
    }

    async fn recolor_all<F>(&self, prepare: F) -> RecolorReport
    where
        F: Fn(&mut School) + Send + Sync,
    {
        let ids: Vec<SchoolId> = self.registry.read().await.list().iter().map(|s| s.id).collect();

        let mut report = RecolorReport {
            selection: self.colors.read().await.selection(),
            ..RecolorReport::default()
        };
        for id in ids {
            match self.recolor(id, &prepare).await {
                Ok(true) => report.recolored.push(id),
                Ok(false) => {}
                Err(e) => {
                    self.notifier.notify(Notice::Error(e.to_string()));
                    report.failed.push(id);
                }
            }
        }
        if !report.recolored.is_empty() {
            self.notifier.notify(Notice::Success(format!(
                "Recolored {} school(s) with the {} palette",
                report.recolored.len(),
                report.selection.name
            )));
        }
        report
    }

    /// Apply `prepare` to a school's color state and recolor it
    ///
    /// Colors are computed with a scratch assigner mirroring the prepared
    /// school. Unchanged schools are not persisted.
    async fn recolor<F>(&self, id: SchoolId, prepare: F) -> Result<bool>
    where
        F: Fn(&mut School) + Send + Sync,
    {
        let recolored = |school: &mut School, index: usize, colors: &ColorAssigner| {
            prepare(school);
            let mut next = colors.clone();
            next.restore(school);
            next.apply(school, index);
        };

        let changed = {
            let registry = self.registry.read().await;
            let colors = self.colors.read().await;
            let school = registry.require(id)?;
            let mut preview = school.clone();
            recolored(&mut preview, registry.index_of(id).unwrap_or_default(), &colors);
            preview != *school
        };
        if !changed {
            return Ok(false);
        }

        self.mutate_school(id, |school, index, colors| {
            recolored(school, index, colors);
            Ok(())
        })
        .await?;
        Ok(true)
    }

    // ---- pins and map events ----

    pub async fn begin_placement(&self, kind: PinKind) -> Result<()> {
        self.pins.write().await.begin_placement(kind)
    }

    pub async fn cancel_placement(&self) {
        self.pins.write().await.cancel_placement();
    }

    pub async fn begin_measurement(&self) {
        let cleared = self.pins.write().await.begin_measurement();
        self.remove_markers(&cleared);
    }

    pub async fn cancel_measurement(&self) {
        let cleared = self.pins.write().await.cancel_measurement();
        self.remove_markers(&cleared);
    }

    /// Place a pin from typed coordinates
    pub async fn place_pin(&self, kind: PinKind, lat: f64, lng: f64) -> Result<PinInfo> {
        let pin = self.pins.write().await.place_precise(kind, lat, lng)?;
        self.surface.apply(&[RenderCommand::DrawMarker(pin.clone())]);
        Ok(pin)
    }

    pub async fn remove_pin(&self, pin_id: PinId) -> Result<PinInfo> {
        let pin = self.pins.write().await.remove(pin_id)?;
        self.remove_markers(&[pin.id]);
        Ok(pin)
    }

    /// Handle a marker drag
    ///
    /// Dragging a linked school pin relocates the school; if that fails the
    /// pin snaps back to where it was.
    pub async fn drag_pin(&self, pin_id: PinId, coordinates: Coordinates) -> Result<DragOutcome> {
        let outcome = self.pins.write().await.drag(pin_id, coordinates)?;

        match outcome {
            DragOutcome::Relocate {
                school_id,
                previous,
            } => {
                if let Err(e) = self.relocate_school(school_id, coordinates).await {
                    self.pins.write().await.revert(pin_id, previous)?;
                    self.surface.apply(&[RenderCommand::MoveMarker {
                        id: pin_id,
                        coordinates: previous,
                    }]);
                    return Err(e);
                }
            }
            DragOutcome::Moved { .. } => {
                self.surface.apply(&[RenderCommand::MoveMarker {
                    id: pin_id,
                    coordinates,
                }]);
            }
        }

        Ok(outcome)
    }

    /// Handle a click on the map
    ///
    /// Active placement or measurement modes consume the click; otherwise it
    /// is a coverage query.
    pub async fn handle_map_click(&self, point: Coordinates) -> ClickOutcome {
        let event = self.pins.write().await.handle_click(point);

        match event {
            Some(event) => {
                let commands = match &event {
                    PinEvent::Placed(pin) | PinEvent::MeasurementStarted(pin) => {
                        vec![RenderCommand::DrawMarker(pin.clone())]
                    }
                    PinEvent::Measured { measurement, end } => vec![
                        RenderCommand::DrawMarker(end.clone()),
                        RenderCommand::ShowPopup {
                            at: measurement.to,
                            text: format!("{:.0} m", measurement.meters),
                        },
                    ],
                };
                self.surface.apply(&commands);
                ClickOutcome::Pin(event)
            }
            None => {
                let (covered, text) = {
                    let registry = self.registry.read().await;
                    let covered = query::schools_covering(registry.list(), point);
                    let names: Vec<&str> = covered
                        .iter()
                        .filter_map(|id| registry.get(*id))
                        .map(|s| s.name.as_str())
                        .collect();
                    let text = if names.is_empty() {
                        "Not inside any saved catchment".to_string()
                    } else {
                        format!("Inside catchment of: {}", names.join(", "))
                    };
                    (covered, text)
                };
                self.surface
                    .apply(&[RenderCommand::ShowPopup { at: point, text }]);
                ClickOutcome::Coverage(covered)
            }
        }
    }

    fn remove_markers(&self, ids: &[PinId]) {
        if ids.is_empty() {
            return;
        }
        let commands: Vec<RenderCommand> = ids
            .iter()
            .map(|id| RenderCommand::RemoveMarker { id: *id })
            .collect();
        self.surface.apply(&commands);
    }

    // ---- queries ----

    pub async fn schools(&self) -> Vec<School> {
        self.registry.read().await.list().to_vec()
    }

    pub async fn school(&self, id: SchoolId) -> Option<School> {
        self.registry.read().await.get(id).cloned()
    }

    pub async fn circles(&self) -> Vec<RadiusCircle> {
        self.registry.read().await.circles()
    }

    pub async fn pins(&self) -> Vec<PinInfo> {
        self.pins.read().await.pins().to_vec()
    }

    pub async fn schools_covering(&self, point: Coordinates) -> BTreeSet<SchoolId> {
        query::schools_covering(self.registry.read().await.list(), point)
    }

    pub async fn coverage_by_year(&self, point: Coordinates) -> Vec<SchoolCoverage> {
        query::coverage_by_year(self.registry.read().await.list(), point)
    }

    pub fn measure(&self, from: Coordinates, to: Coordinates) -> Measurement {
        Measurement::between(from, to)
    }

    // ---- plumbing ----

    /// Run a store call under the timeout, normalizing failures
    async fn persist<T>(
        &self,
        op: StoreOp,
        call: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        debug!(%op, "store call");
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e @ Error::Persistence { .. })) => {
                warn!(%op, error = %e, "store call failed");
                Err(e)
            }
            Ok(Err(e)) => {
                warn!(%op, error = %e, "store rejected call");
                Err(Error::rejected(format!("Favorites store {} failed: {}", op, e)))
            }
            Err(_) => {
                warn!(%op, timeout = ?self.timeout, "store call timed out");
                Err(Error::retryable(format!(
                    "Favorites store {} timed out after {:?}",
                    op, self.timeout
                )))
            }
        }
    }

    fn report<T>(&self, result: Result<T>, success: impl FnOnce(&T) -> String) -> Result<T> {
        match &result {
            Ok(value) => self.notifier.notify(Notice::Success(success(value))),
            Err(e) => self.notifier.notify(Notice::Error(e.to_string())),
        }
        result
    }
}
