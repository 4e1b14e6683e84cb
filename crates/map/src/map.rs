//! The choropleth map facade.
//!
//! A [`ChoroplethMap`] owns the selection state, the viewport controller and
//! the loaded regions, and drives a host [`RenderSurface`]. Geometry arrives
//! asynchronously; region-dependent effects requested before that are queued
//! and replayed in order once it does.

use std::collections::VecDeque;

use foundation::bounds::Aabb2;
use foundation::ids::RegionId;
use foundation::math::{Mercator, Vec2};
use foundation::viewport::{Viewport, ZoomTransform};
use formats::feature_collection::FeatureCollection;
use formats::ingest::{IngestReport, ingest_regions};
use formats::source::{GeometrySource, LoadError};
use runtime::gate::{GateState, LoadGate};
use runtime::surface::{RenderSurface, Transition};
use scene::picking::pick_screen;
use scene::regions::RegionStore;
use scene::selection::{Group, SelectionState};
use tracing::{debug, info, warn};

use crate::config::MapConfig;
use crate::controller::ViewportController;
use crate::error::MapError;
use crate::events::{EventSink, EventTarget, MarkerEvent, PointerEventKind, RegionEvent};
use crate::fit;
use crate::markers::{PlacedMarker, pick_marker, place_markers};
use crate::styles::StylePalette;

/// Region-dependent work requested before the geometry arrived.
#[derive(Debug, Clone, PartialEq)]
enum Deferred {
    Restyle(Vec<RegionId>),
    Frame {
        ids: Vec<RegionId>,
        transition: Transition,
    },
    Reset(Transition),
}

/// A resolved pointer event waiting for the sink.
#[derive(Debug)]
enum PendingEvent {
    Region(RegionEvent),
    Marker(MarkerEvent),
}

impl PendingEvent {
    fn notify<S>(&self, sink: &mut dyn EventSink<S>, map: &mut ChoroplethMap<S>) {
        match self {
            PendingEvent::Region(event) => match event.kind {
                PointerEventKind::Click => sink.region_click(event, map),
                PointerEventKind::MouseEnter => sink.region_mouse_enter(event, map),
                PointerEventKind::MouseLeave => sink.region_mouse_leave(event, map),
            },
            PendingEvent::Marker(event) => match event.kind {
                PointerEventKind::Click => sink.marker_click(event, map),
                PointerEventKind::MouseEnter => sink.marker_mouse_enter(event, map),
                PointerEventKind::MouseLeave => sink.marker_mouse_leave(event, map),
            },
        }
    }
}

/// Outcome of the geometry load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub ingest: IngestReport,
    /// Queued moves that failed when replayed, in request order.
    pub deferred_errors: Vec<MapError>,
}

pub struct ChoroplethMap<S> {
    config: MapConfig,
    projection: Mercator,
    palette: StylePalette,
    surface: S,
    regions: Option<RegionStore>,
    markers: Vec<PlacedMarker>,
    selection: SelectionState,
    controller: ViewportController,
    gate: LoadGate<Deferred>,
    events: Option<Box<dyn EventSink<S>>>,
    /// Set while a handler runs; events it raises wait in `pending_events`.
    dispatching: bool,
    pending_events: VecDeque<PendingEvent>,
}

impl<S: std::fmt::Debug> std::fmt::Debug for ChoroplethMap<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChoroplethMap")
            .field("state", self.gate.state())
            .field("selection", &self.selection)
            .field("transform", &self.controller.transform())
            .field("markers", &self.markers.len())
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

impl<S: RenderSurface> ChoroplethMap<S> {
    /// Validates `config` and applies its initial selection, group and zoom.
    ///
    /// Nothing is drawn until the geometry is loaded with [`ChoroplethMap::load`]
    /// or handed over with [`ChoroplethMap::complete_load`].
    pub fn new(config: MapConfig, surface: S) -> Result<Self, MapError> {
        config.map_path()?;
        let viewport = config.viewport()?;
        let projection = Mercator::for_viewport(&viewport, config.damping()?);
        let selection = SelectionState::with_groups(config.groups()?);
        let palette = StylePalette::from_config(&config);

        let mut map = Self {
            config,
            projection,
            palette,
            surface,
            regions: None,
            markers: Vec::new(),
            selection,
            controller: ViewportController::new(viewport),
            gate: LoadGate::new(),
            events: None,
            dispatching: false,
            pending_events: VecDeque::new(),
        };
        map.apply_initial_state()?;
        Ok(map)
    }

    pub fn with_event_sink(mut self, sink: impl EventSink<S> + 'static) -> Self {
        self.set_event_sink(sink);
        self
    }

    pub fn set_event_sink(&mut self, sink: impl EventSink<S> + 'static) {
        self.events = Some(Box::new(sink));
    }

    fn apply_initial_state(&mut self) -> Result<(), MapError> {
        let selected = self.config.selected_regions.clone();
        self.select_regions(&selected)?;
        if let Some(group) = self.config.selected_group.clone() {
            self.select_group(&group)?;
        }
        let zoomed = self.config.zoomed_regions.clone();
        if !zoomed.is_empty() {
            self.zoom_to(&zoomed)?;
        }
        Ok(())
    }

    /// Fetches the configured geometry from `source` and completes the load.
    ///
    /// Loading an already loaded map is a no-op; a map whose load failed
    /// stays failed.
    pub async fn load<G: GeometrySource>(&mut self, source: &G) -> Result<LoadReport, MapError> {
        match self.gate.state() {
            GateState::Open => {
                debug!("geometry already loaded");
                return Ok(LoadReport::default());
            }
            GateState::Failed(reason) => return Err(MapError::GeometryUnavailable(reason.clone())),
            GateState::Pending => {}
        }
        let path = self.config.map_path()?.to_string();
        debug!(path = %path, "loading geometry");
        let result = source.load(&path).await;
        self.complete_load(result)
    }

    /// Finishes the one-shot geometry load with the fetch outcome.
    ///
    /// On success the regions and markers are appended to the surface and
    /// every queued effect runs in request order; queued moves that fail are
    /// returned in [`LoadReport::deferred_errors`]. On failure the queue is
    /// dropped and region-dependent operations keep failing.
    pub fn complete_load(
        &mut self,
        result: Result<FeatureCollection, LoadError>,
    ) -> Result<LoadReport, MapError> {
        match self.gate.state() {
            GateState::Open => {
                warn!("geometry already loaded; ignoring second result");
                return Ok(LoadReport::default());
            }
            GateState::Failed(reason) => return Err(MapError::GeometryUnavailable(reason.clone())),
            GateState::Pending => {}
        }

        let collection = match result {
            Ok(collection) => collection,
            Err(err) => {
                let dropped = self.gate.fail(err.to_string());
                warn!(error = %err, dropped, "geometry load failed");
                return Err(MapError::Load(err));
            }
        };

        let (store, report) = ingest_regions(&collection, &self.projection);
        for region in store.iter() {
            self.surface.append_region(region);
            let style = self
                .palette
                .resolve(self.selection.highlight(region.id().as_str()));
            self.surface
                .set_region_style(region.id(), style, Transition::immediate());
        }

        let glyph = self.config.marker_style.glyph();
        self.markers = place_markers(
            &self.config.markers,
            &self.projection,
            &self.config.marker_style,
        );
        for marker in &self.markers {
            self.surface.append_marker(marker.index, marker.position, &glyph);
        }
        self.regions = Some(store);

        let queued = self.gate.open();
        info!(
            regions = report.inserted,
            skipped = report.skipped.len(),
            markers = self.markers.len(),
            queued = queued.len(),
            "geometry loaded"
        );
        let mut deferred_errors = Vec::new();
        for work in queued {
            if let Err(err) = self.run(work) {
                warn!(error = %err, "queued work failed");
                deferred_errors.push(err);
            }
        }
        Ok(LoadReport {
            ingest: report,
            deferred_errors,
        })
    }

    pub fn select_region(&mut self, id: &str) -> Result<(), MapError> {
        let id = region_id(id)?;
        if self.selection.select(id.clone()) {
            debug!(%id, "region selected");
        }
        self.restyle_or_queue(vec![id]);
        Ok(())
    }

    /// Selects every id in order. All ids are validated before any is selected.
    pub fn select_regions<I: AsRef<str>>(&mut self, ids: &[I]) -> Result<(), MapError> {
        let ids = region_ids(ids)?;
        if ids.is_empty() {
            return Ok(());
        }
        for id in &ids {
            self.selection.select(id.clone());
        }
        debug!(count = ids.len(), "regions selected");
        self.restyle_or_queue(ids);
        Ok(())
    }

    /// Unknown or unselected ids are ignored.
    pub fn unselect_region(&mut self, id: &str) -> Result<(), MapError> {
        let id = region_id(id)?;
        if self.selection.unselect(id.as_str()) {
            debug!(%id, "region unselected");
            self.restyle_or_queue(vec![id]);
        }
        Ok(())
    }

    pub fn unselect_all_regions(&mut self) {
        let cleared = self.selection.clear();
        if !cleared.is_empty() {
            debug!(count = cleared.len(), "regions unselected");
            self.restyle_or_queue(cleared);
        }
    }

    /// Activates a configured group, replacing the previous one.
    pub fn select_group(&mut self, id: &str) -> Result<(), MapError> {
        if id.is_empty() {
            return Err(MapError::MissingArgument("group_id"));
        }
        let switch = self
            .selection
            .select_group(id)
            .ok_or_else(|| MapError::GroupNotFound(id.to_string()))?;
        debug!(group = id, "group selected");
        self.restyle_or_queue(switch.affected());
        Ok(())
    }

    pub fn unselect_all_groups(&mut self) {
        if let Some(group) = self.selection.clear_group() {
            debug!(group = %group.id(), "group unselected");
            self.restyle_or_queue(group.region_ids().to_vec());
        }
    }

    /// Frames the union of `ids` with an animated transition.
    ///
    /// Returns the applied transform, or `None` when the move was queued
    /// behind a pending load.
    pub fn move_to<I: AsRef<str>>(
        &mut self,
        ids: &[I],
        transition: Transition,
    ) -> Result<Option<ZoomTransform>, MapError> {
        if ids.is_empty() {
            return Err(MapError::MissingArgument("ids"));
        }
        let ids = region_ids(ids)?;
        if let Some(reason) = self.gate.failure() {
            return Err(MapError::GeometryUnavailable(reason.to_string()));
        }
        match self.gate.submit(Deferred::Frame { ids, transition }) {
            Some(Deferred::Frame { ids, transition }) => self.frame(&ids, transition).map(Some),
            _ => {
                debug!("move queued until geometry loads");
                Ok(None)
            }
        }
    }

    pub fn move_to_region(&mut self, id: &str) -> Result<Option<ZoomTransform>, MapError> {
        self.move_to(&[id], Transition::MOVE)
    }

    pub fn zoom_to<I: AsRef<str>>(&mut self, ids: &[I]) -> Result<Option<ZoomTransform>, MapError> {
        self.move_to(ids, Transition::DEFAULT)
    }

    /// Queued while the load is pending; dropped after it failed.
    pub fn reset_zoom(&mut self) {
        if let Some(Deferred::Reset(transition)) =
            self.gate.submit(Deferred::Reset(Transition::DEFAULT))
        {
            self.controller.reset(&mut self.surface, transition);
        }
    }

    /// Loaded regions; fails while the load is pending or after it failed.
    pub fn regions(&self) -> Result<&RegionStore, MapError> {
        match (&self.regions, self.gate.failure()) {
            (Some(regions), _) => Ok(regions),
            (None, Some(reason)) => Err(MapError::GeometryUnavailable(reason.to_string())),
            (None, None) => Err(MapError::GeometryNotLoaded),
        }
    }

    pub fn bounds_of<I: AsRef<str>>(&self, ids: &[I]) -> Result<Aabb2, MapError> {
        if ids.is_empty() {
            return Err(MapError::MissingArgument("ids"));
        }
        let ids = region_ids(ids)?;
        Ok(self.regions()?.bounds_of(&ids)?)
    }

    /// The transform `move_to(ids, ..)` would apply, without applying it.
    pub fn fit<I: AsRef<str>>(&self, ids: &[I]) -> Result<ZoomTransform, MapError> {
        let bounds = self.bounds_of(ids)?;
        Ok(fit::fit(&bounds, self.controller.viewport()))
    }

    /// Topmost marker or region under a screen point.
    pub fn pick(&self, screen: Vec2) -> Result<Option<EventTarget>, MapError> {
        let regions = self.regions()?;
        let transform = self.controller.transform();
        if let Some(marker) = pick_marker(&self.markers, transform.invert(screen)) {
            return Ok(Some(EventTarget::Marker(marker.index)));
        }
        Ok(pick_screen(regions, screen, &transform)
            .map(|region| EventTarget::Region(region.id().clone())))
    }

    /// Routes a pointer event on `target` to the event sink.
    ///
    /// Events dispatched from inside a handler are delivered, in order, once
    /// that handler returns.
    pub fn dispatch(
        &mut self,
        kind: PointerEventKind,
        target: &EventTarget,
    ) -> Result<(), MapError> {
        let regions = self.regions()?;
        match target {
            EventTarget::Region(id) => {
                let region = regions
                    .get(id.as_str())
                    .ok_or_else(|| MapError::RegionNotFound(id.to_string()))?;
                let event = RegionEvent {
                    kind,
                    id: region.id().clone(),
                    properties: region.properties().clone(),
                };
                debug!(id = %event.id, ?kind, "region event");
                self.deliver(PendingEvent::Region(event));
            }
            EventTarget::Marker(index) => {
                let index = *index;
                let placed = self.markers.iter().any(|m| m.index == index);
                let marker = self
                    .config
                    .markers
                    .get(index)
                    .filter(|_| placed)
                    .cloned()
                    .ok_or(MapError::MarkerNotFound(index))?;
                let event = MarkerEvent { kind, index, marker };
                debug!(index, ?kind, "marker event");
                self.deliver(PendingEvent::Marker(event));
            }
        }
        Ok(())
    }

    /// Picks the target under `screen` and dispatches to it.
    pub fn dispatch_at(
        &mut self,
        kind: PointerEventKind,
        screen: Vec2,
    ) -> Result<Option<EventTarget>, MapError> {
        let target = self.pick(screen)?;
        if let Some(target) = &target {
            self.dispatch(kind, target)?;
        }
        Ok(target)
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        self.controller.viewport()
    }

    pub fn projection(&self) -> &Mercator {
        &self.projection
    }

    /// Projects a geographic location into map pixel space.
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Vec2 {
        self.projection.project(lon_deg, lat_deg)
    }

    /// Last requested zoom transform.
    pub fn transform(&self) -> ZoomTransform {
        self.controller.transform()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.is_selected(id)
    }

    pub fn active_group(&self) -> Option<&Group> {
        self.selection.active_group()
    }

    pub fn is_group_selected(&self, id: &str) -> bool {
        self.selection.is_group_selected(id)
    }

    pub fn load_state(&self) -> &GateState {
        self.gate.state()
    }

    pub fn is_loaded(&self) -> bool {
        self.gate.is_open()
    }

    pub fn markers(&self) -> &[PlacedMarker] {
        &self.markers
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    fn restyle_or_queue(&mut self, ids: Vec<RegionId>) {
        if let Some(Deferred::Restyle(ids)) = self.gate.submit(Deferred::Restyle(ids)) {
            self.restyle(&ids, Transition::DEFAULT);
        }
    }

    fn run(&mut self, work: Deferred) -> Result<(), MapError> {
        match work {
            Deferred::Restyle(ids) => self.restyle(&ids, Transition::DEFAULT),
            Deferred::Frame { ids, transition } => {
                self.frame(&ids, transition)?;
            }
            Deferred::Reset(transition) => self.controller.reset(&mut self.surface, transition),
        }
        Ok(())
    }

    fn frame(
        &mut self,
        ids: &[RegionId],
        transition: Transition,
    ) -> Result<ZoomTransform, MapError> {
        let regions = self.regions.as_ref().ok_or(MapError::GeometryNotLoaded)?;
        Ok(self
            .controller
            .frame_regions(&mut self.surface, regions, ids, transition)?)
    }

    fn restyle(&mut self, ids: &[RegionId], transition: Transition) {
        let Some(regions) = self.regions.as_ref() else {
            return;
        };
        for id in ids {
            if !regions.contains(id.as_str()) {
                debug!(%id, "no region to restyle");
                continue;
            }
            let style = self.palette.resolve(self.selection.highlight(id.as_str()));
            self.surface.set_region_style(id, style, transition);
        }
    }

    fn deliver(&mut self, event: PendingEvent) {
        if self.dispatching {
            self.pending_events.push_back(event);
            return;
        }
        let Some(mut sink) = self.events.take() else {
            return;
        };
        self.dispatching = true;
        let mut next = Some(event);
        while let Some(event) = next {
            event.notify(sink.as_mut(), self);
            next = self.pending_events.pop_front();
        }
        self.dispatching = false;
        if self.events.is_none() {
            self.events = Some(sink);
        }
    }
}

fn region_id(id: &str) -> Result<RegionId, MapError> {
    RegionId::new(id).ok_or(MapError::MissingArgument("id"))
}

fn region_ids<I: AsRef<str>>(ids: &[I]) -> Result<Vec<RegionId>, MapError> {
    ids.iter().map(|id| region_id(id.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::ChoroplethMap;
    use crate::config::{GroupConfig, MapConfig};
    use crate::error::{ErrorKind, MapError};
    use crate::events::{Callbacks, EventTarget, PointerEventKind};
    use crate::markers::Marker;
    use foundation::ids::RegionId;
    use foundation::math::Vec2;
    use foundation::viewport::ZoomTransform;
    use formats::feature_collection::FeatureCollection;
    use formats::source::{InlineSource, LoadError};
    use pretty_assertions::assert_eq;
    use runtime::gate::GateState;
    use runtime::surface::{RecordingSurface, SurfaceCommand, Transition};
    use scene::selection::Highlight;

    const FIXTURE: &str = include_str!("../../formats/assets/regions.geo.json");

    fn config() -> MapConfig {
        MapConfig {
            width: 900.0,
            height: 600.0,
            group_fill_color: Some("#ffaa00".to_string()),
            groups: vec![GroupConfig {
                id: "EU".to_string(),
                regions: vec!["DE".to_string(), "FR".to_string(), "IT".to_string()],
            }],
            ..MapConfig::default()
        }
    }

    fn fixture() -> Result<FeatureCollection, LoadError> {
        Ok(FeatureCollection::from_geojson_str(FIXTURE).expect("fixture"))
    }

    fn map_with(config: MapConfig) -> ChoroplethMap<RecordingSurface> {
        ChoroplethMap::new(config, RecordingSurface::new()).expect("map")
    }

    fn loaded() -> ChoroplethMap<RecordingSurface> {
        let mut map = map_with(config());
        map.complete_load(fixture()).expect("load");
        map
    }

    fn rid(id: &str) -> RegionId {
        RegionId::new(id).expect("id")
    }

    fn fill<'a>(map: &'a ChoroplethMap<RecordingSurface>, id: &str) -> Option<&'a str> {
        map.surface().region_style(id).map(|s| s.fill.as_str())
    }

    fn zoom_count(map: &ChoroplethMap<RecordingSurface>) -> usize {
        map.surface()
            .commands()
            .iter()
            .filter(|c| matches!(c, SurfaceCommand::ApplyZoom { .. }))
            .count()
    }

    #[tokio::test]
    async fn load_appends_regions_and_markers() {
        let mut config = config();
        config.markers = vec![Marker::new(2.35, 48.85)];
        let mut map = map_with(config);

        let report = map.load(&InlineSource::new(FIXTURE)).await.expect("load");
        assert_eq!(report.ingest.inserted, 7);
        assert!(report.deferred_errors.is_empty());
        assert!(map.is_loaded());
        assert_eq!(map.surface().region_ids().len(), 7);
        assert_eq!(map.markers().len(), 1);
        assert_eq!(fill(&map, "ES"), Some("#cccccc"));

        let before = map.surface().commands().len();
        let again = map.load(&InlineSource::new(FIXTURE)).await.expect("reload");
        assert_eq!(again.ingest.inserted, 0);
        assert_eq!(map.surface().commands().len(), before);
    }

    #[test]
    fn select_region_is_idempotent() {
        let mut map = loaded();
        map.select_region("FR").expect("select");
        map.select_region("FR").expect("select again");

        let selected: Vec<&str> = map.selection().selected().map(|id| id.as_str()).collect();
        assert_eq!(selected, vec!["FR"]);
        assert_eq!(fill(&map, "FR"), Some("red"));
    }

    #[test]
    fn select_regions_validates_before_mutating() {
        let mut map = loaded();
        let err = map.select_regions(&["DE", ""]).expect_err("empty id");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!map.is_selected("DE"));

        map.select_regions(&["DE", "IT"]).expect("select");
        assert!(map.is_selected("DE") && map.is_selected("IT"));
    }

    #[test]
    fn unselect_all_twice_is_unselect_all_once() {
        let mut map = loaded();
        map.select_regions(&["DE", "ES"]).expect("select");

        map.unselect_all_regions();
        let after_once = map.surface().commands().len();
        map.unselect_all_regions();

        assert!(map.selection().is_empty());
        assert_eq!(map.surface().commands().len(), after_once);
        assert_eq!(fill(&map, "ES"), Some("#cccccc"));
    }

    #[test]
    fn unselect_region_ignores_absent_ids() {
        let mut map = loaded();
        map.unselect_region("ZZ").expect("absent is fine");
        assert_eq!(
            map.unselect_region("").map_err(|e| e.kind()),
            Err(ErrorKind::Validation)
        );
    }

    #[test]
    fn group_selection_keeps_individual_selection() {
        let mut map = loaded();
        map.select_region("FR").expect("select");
        map.select_group("EU").expect("group");

        for id in ["DE", "FR", "IT"] {
            assert!(map.is_group_selected(id), "{id} should be in the group");
        }
        assert!(!map.is_group_selected("ES"));
        assert!(map.is_selected("FR"));
        assert_eq!(map.selection().highlight("FR"), Highlight::Selected);
        assert_eq!(fill(&map, "FR"), Some("red"));
        assert_eq!(fill(&map, "DE"), Some("#ffaa00"));

        map.unselect_all_groups();
        assert!(map.active_group().is_none());
        assert_eq!(fill(&map, "DE"), Some("#cccccc"));
        assert_eq!(fill(&map, "FR"), Some("red"));
    }

    #[test]
    fn select_group_errors() {
        let mut map = loaded();
        assert_eq!(
            map.select_group("").map_err(|e| e.kind()),
            Err(ErrorKind::Validation)
        );
        assert_eq!(
            map.select_group("ASIA").map_err(|e| e.kind()),
            Err(ErrorKind::NotFound)
        );
    }

    #[test]
    fn move_to_frames_union_bounds() {
        let mut map = loaded();
        let expected = map.fit(&["DE", "FR"]).expect("fit");

        let applied = map.move_to(&["FR", "DE"], Transition::DEFAULT).expect("move");
        assert_eq!(applied, Some(expected));
        assert_eq!(map.transform(), expected);
        assert_eq!(map.surface().last_zoom(), Some((expected, Transition::DEFAULT)));

        map.move_to_region("ES").expect("move to region");
        assert_eq!(map.surface().last_zoom().map(|(_, t)| t), Some(Transition::MOVE));
    }

    #[test]
    fn move_to_requires_known_ids() {
        let mut map = loaded();
        let empty: [&str; 0] = [];
        assert_eq!(
            map.move_to(&empty, Transition::DEFAULT).map_err(|e| e.kind()),
            Err(ErrorKind::Validation)
        );
        assert_eq!(
            map.zoom_to(&["DE", "XX"]).map_err(|e| e.kind()),
            Err(ErrorKind::NotFound)
        );
        assert_eq!(map.transform(), ZoomTransform::IDENTITY);
    }

    #[test]
    fn bounds_are_order_independent_and_cover_parts() {
        let map = loaded();
        let a = map.bounds_of(&["DE", "FR", "IT"]).expect("bounds");
        let b = map.bounds_of(&["IT", "DE", "FR"]).expect("bounds");
        assert_eq!(a, b);
        for id in ["DE", "FR", "IT"] {
            assert!(a.contains(&map.bounds_of(&[id]).expect("part")));
        }
    }

    #[test]
    fn point_region_zooms_to_max() {
        let map = loaded();
        let t = map.fit(&["VA"]).expect("fit");
        assert_eq!(t.scale, 20.0);
    }

    #[test]
    fn fit_stays_within_zoom_range() {
        let map = loaded();
        for ids in [&["DE"][..], &["ES", "DK"][..], &["DE", "FR", "IT", "ES", "DK", "250"][..]] {
            let t = map.fit(ids).expect("fit");
            assert!((1.0..=20.0).contains(&t.scale), "scale {} for {ids:?}", t.scale);
        }
    }

    #[test]
    fn queries_fail_before_load_and_effects_replay_after() {
        let mut map = map_with(config());
        assert!(matches!(map.bounds_of(&["DE"]), Err(MapError::GeometryNotLoaded)));
        assert_eq!(map.fit(&["DE"]).map_err(|e| e.kind()), Err(ErrorKind::NotFound));
        assert!(map.pick(Vec2::ZERO).is_err());

        map.select_region("DE").expect("select");
        assert!(map.is_selected("DE"));
        assert_eq!(map.zoom_to(&["ES"]).expect("queued"), None);
        map.reset_zoom();
        assert_eq!(map.move_to_region("IT").expect("queued"), None);
        assert!(map.surface().commands().is_empty());

        map.complete_load(fixture()).expect("load");
        assert_eq!(fill(&map, "DE"), Some("red"));
        assert_eq!(zoom_count(&map), 3);
        let it = map.fit(&["IT"]).expect("fit");
        assert_eq!(map.surface().last_zoom(), Some((it, Transition::MOVE)));
        assert_eq!(map.transform(), it);
    }

    #[test]
    fn queued_move_to_unknown_region_is_reported() {
        let mut map = map_with(config());
        map.zoom_to(&["XX"]).expect("queued");
        map.move_to_region("DE").expect("queued");

        let report = map.complete_load(fixture()).expect("load");
        assert_eq!(report.deferred_errors.len(), 1);
        assert!(matches!(
            &report.deferred_errors[0],
            MapError::RegionNotFound(id) if id == "XX"
        ));
        assert_eq!(zoom_count(&map), 1);
        let de = map.fit(&["DE"]).expect("fit");
        assert_eq!(map.transform(), de);
    }

    #[test]
    fn failed_load_leaves_map_uninitialized() {
        let mut map = map_with(config());
        map.zoom_to(&["DE"]).expect("queued");

        let err = map
            .complete_load(Err(LoadError::Http {
                url: "https://example.invalid/map.geo.json".to_string(),
                reason: "503".to_string(),
            }))
            .expect_err("load fails");
        assert_eq!(err.kind(), ErrorKind::Load);
        assert!(matches!(map.load_state(), GateState::Failed(_)));

        assert!(matches!(map.bounds_of(&["DE"]), Err(MapError::GeometryUnavailable(_))));
        assert_eq!(
            map.move_to_region("DE").map_err(|e| e.kind()),
            Err(ErrorKind::NotFound)
        );
        map.select_region("FR").expect("selection still tracked");
        assert!(map.surface().commands().is_empty());

        assert_eq!(
            map.complete_load(fixture()).map_err(|e| e.kind()),
            Err(ErrorKind::NotFound)
        );
    }

    #[test]
    fn reset_zoom_returns_to_identity() {
        let mut map = loaded();
        map.zoom_to(&["DE"]).expect("zoom");
        map.reset_zoom();
        assert_eq!(map.transform(), ZoomTransform::IDENTITY);
        assert_eq!(
            map.surface().last_zoom(),
            Some((ZoomTransform::IDENTITY, Transition::DEFAULT))
        );
    }

    #[test]
    fn initial_state_applies_after_load() {
        let config = MapConfig {
            selected_regions: vec!["ES".to_string()],
            selected_group: Some("EU".to_string()),
            zoomed_regions: vec!["DE".to_string()],
            ..config()
        };
        let mut map = map_with(config);
        assert!(map.is_selected("ES"));
        assert!(map.is_group_selected("IT"));
        assert!(map.surface().commands().is_empty());

        map.complete_load(fixture()).expect("load");
        assert_eq!(fill(&map, "ES"), Some("red"));
        assert_eq!(fill(&map, "IT"), Some("#ffaa00"));
        let de = map.fit(&["DE"]).expect("fit");
        assert_eq!(map.transform(), de);
    }

    #[test]
    fn rejects_invalid_configuration() {
        let no_path = MapConfig {
            map_path: None,
            ..config()
        };
        let err = ChoroplethMap::new(no_path, RecordingSurface::new()).expect_err("no path");
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let unknown_group = MapConfig {
            selected_group: Some("ASIA".to_string()),
            ..config()
        };
        let err = ChoroplethMap::new(unknown_group, RecordingSurface::new()).expect_err("group");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn click_handler_can_drive_the_map() {
        let sink = Callbacks::<RecordingSurface>::new().on_region_click(|event, map| {
            map.select_region(event.id.as_str()).expect("select");
        });
        let mut map = loaded().with_event_sink(sink);

        map.dispatch(PointerEventKind::Click, &EventTarget::Region(rid("FR")))
            .expect("dispatch");
        assert!(map.is_selected("FR"));

        map.dispatch(PointerEventKind::MouseEnter, &EventTarget::Region(rid("DE")))
            .expect("no enter handler");
        assert!(!map.is_selected("DE"));

        assert_eq!(
            map.dispatch(PointerEventKind::Click, &EventTarget::Region(rid("XX")))
                .map_err(|e| e.kind()),
            Err(ErrorKind::NotFound)
        );
    }

    #[test]
    fn events_raised_by_a_handler_follow_it() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let on_click = Rc::clone(&seen);
        let on_enter = Rc::clone(&seen);
        let sink = Callbacks::<RecordingSurface>::new()
            .on_region_click(move |event, map| {
                on_click.borrow_mut().push(format!("click {}", event.id));
                let nested =
                    map.dispatch(PointerEventKind::MouseEnter, &EventTarget::Region(rid("DE")));
                let unknown =
                    map.dispatch(PointerEventKind::MouseEnter, &EventTarget::Region(rid("XX")));
                on_click.borrow_mut().push(format!(
                    "nested ok={} unknown err={}",
                    nested.is_ok(),
                    unknown.is_err()
                ));
            })
            .on_region_mouse_enter(move |event, _map| {
                on_enter.borrow_mut().push(format!("enter {}", event.id));
            });
        let mut map = loaded().with_event_sink(sink);

        map.dispatch(PointerEventKind::Click, &EventTarget::Region(rid("FR")))
            .expect("dispatch");
        assert_eq!(
            *seen.borrow(),
            vec!["click FR", "nested ok=true unknown err=true", "enter DE"]
        );

        map.dispatch(PointerEventKind::MouseEnter, &EventTarget::Region(rid("IT")))
            .expect("sink restored");
        assert_eq!(seen.borrow().last().map(String::as_str), Some("enter IT"));
    }

    #[test]
    fn pick_and_dispatch_markers_before_regions() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut config = config();
        let mut paris = Marker::new(2.35, 48.85);
        paris.data.insert("name".to_string(), "Paris".into());
        config.markers = vec![paris];

        let sink_seen = Rc::clone(&seen);
        let sink = Callbacks::<RecordingSurface>::new().on_marker_click(move |event, _map| {
            let name = event.marker.data.get("name").and_then(|v| v.as_str());
            sink_seen.borrow_mut().push(name.unwrap_or_default().to_string());
        });
        let mut map = map_with(config).with_event_sink(sink);
        map.complete_load(fixture()).expect("load");

        let paris = map.project(2.35, 48.85);
        let spain = map.project(-3.0, 40.0);
        assert_eq!(map.pick(paris).expect("pick"), Some(EventTarget::Marker(0)));
        assert_eq!(
            map.pick(spain).expect("pick"),
            Some(EventTarget::Region(rid("ES")))
        );

        let hit = map.dispatch_at(PointerEventKind::Click, paris).expect("dispatch");
        assert_eq!(hit, Some(EventTarget::Marker(0)));
        assert_eq!(*seen.borrow(), vec!["Paris".to_string()]);

        assert_eq!(
            map.dispatch(PointerEventKind::Click, &EventTarget::Marker(3))
                .map_err(|e| e.kind()),
            Err(ErrorKind::NotFound)
        );
    }

    #[test]
    fn pick_follows_the_zoom_transform() {
        let mut map = loaded();
        let t = map.zoom_to(&["ES"]).expect("zoom").expect("applied");
        let screen = t.apply(map.project(-3.0, 40.0));
        assert_eq!(
            map.pick(screen).expect("pick"),
            Some(EventTarget::Region(rid("ES")))
        );
        assert_eq!(map.pick(screen * 100.0).expect("pick"), None);
    }
}
