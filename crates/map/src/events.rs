//! Pointer events routed from the host to user callbacks.

use foundation::ids::RegionId;
use scene::regions::RegionProperties;

use crate::map::ChoroplethMap;
use crate::markers::Marker;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerEventKind {
    Click,
    MouseEnter,
    MouseLeave,
}

/// What a pointer event hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTarget {
    Region(RegionId),
    /// Index into the configured marker list.
    Marker(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionEvent {
    pub kind: PointerEventKind,
    pub id: RegionId,
    pub properties: RegionProperties,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEvent {
    pub kind: PointerEventKind,
    pub index: usize,
    pub marker: Marker,
}

/// Receives pointer events together with the map, so handlers can drive it
/// (select on click, frame on hover, ...). Every method defaults to a no-op.
pub trait EventSink<S> {
    fn region_click(&mut self, _event: &RegionEvent, _map: &mut ChoroplethMap<S>) {}
    fn region_mouse_enter(&mut self, _event: &RegionEvent, _map: &mut ChoroplethMap<S>) {}
    fn region_mouse_leave(&mut self, _event: &RegionEvent, _map: &mut ChoroplethMap<S>) {}
    fn marker_click(&mut self, _event: &MarkerEvent, _map: &mut ChoroplethMap<S>) {}
    fn marker_mouse_enter(&mut self, _event: &MarkerEvent, _map: &mut ChoroplethMap<S>) {}
    fn marker_mouse_leave(&mut self, _event: &MarkerEvent, _map: &mut ChoroplethMap<S>) {}
}

type RegionHandler<S> = Box<dyn FnMut(&RegionEvent, &mut ChoroplethMap<S>)>;
type MarkerHandler<S> = Box<dyn FnMut(&MarkerEvent, &mut ChoroplethMap<S>)>;

/// Closure-backed [`EventSink`].
pub struct Callbacks<S> {
    region_click: Option<RegionHandler<S>>,
    region_mouse_enter: Option<RegionHandler<S>>,
    region_mouse_leave: Option<RegionHandler<S>>,
    marker_click: Option<MarkerHandler<S>>,
    marker_mouse_enter: Option<MarkerHandler<S>>,
    marker_mouse_leave: Option<MarkerHandler<S>>,
}

impl<S> Default for Callbacks<S> {
    fn default() -> Self {
        Self {
            region_click: None,
            region_mouse_enter: None,
            region_mouse_leave: None,
            marker_click: None,
            marker_mouse_enter: None,
            marker_mouse_leave: None,
        }
    }
}

impl<S> std::fmt::Debug for Callbacks<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("region_click", &self.region_click.is_some())
            .field("region_mouse_enter", &self.region_mouse_enter.is_some())
            .field("region_mouse_leave", &self.region_mouse_leave.is_some())
            .field("marker_click", &self.marker_click.is_some())
            .field("marker_mouse_enter", &self.marker_mouse_enter.is_some())
            .field("marker_mouse_leave", &self.marker_mouse_leave.is_some())
            .finish()
    }
}

impl<S> Callbacks<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_region_click(
        mut self,
        f: impl FnMut(&RegionEvent, &mut ChoroplethMap<S>) + 'static,
    ) -> Self {
        self.region_click = Some(Box::new(f));
        self
    }

    pub fn on_region_mouse_enter(
        mut self,
        f: impl FnMut(&RegionEvent, &mut ChoroplethMap<S>) + 'static,
    ) -> Self {
        self.region_mouse_enter = Some(Box::new(f));
        self
    }

    pub fn on_region_mouse_leave(
        mut self,
        f: impl FnMut(&RegionEvent, &mut ChoroplethMap<S>) + 'static,
    ) -> Self {
        self.region_mouse_leave = Some(Box::new(f));
        self
    }

    pub fn on_marker_click(
        mut self,
        f: impl FnMut(&MarkerEvent, &mut ChoroplethMap<S>) + 'static,
    ) -> Self {
        self.marker_click = Some(Box::new(f));
        self
    }

    pub fn on_marker_mouse_enter(
        mut self,
        f: impl FnMut(&MarkerEvent, &mut ChoroplethMap<S>) + 'static,
    ) -> Self {
        self.marker_mouse_enter = Some(Box::new(f));
        self
    }

    pub fn on_marker_mouse_leave(
        mut self,
        f: impl FnMut(&MarkerEvent, &mut ChoroplethMap<S>) + 'static,
    ) -> Self {
        self.marker_mouse_leave = Some(Box::new(f));
        self
    }
}

impl<S> EventSink<S> for Callbacks<S> {
    fn region_click(&mut self, event: &RegionEvent, map: &mut ChoroplethMap<S>) {
        if let Some(f) = self.region_click.as_mut() {
            f(event, map);
        }
    }

    fn region_mouse_enter(&mut self, event: &RegionEvent, map: &mut ChoroplethMap<S>) {
        if let Some(f) = self.region_mouse_enter.as_mut() {
            f(event, map);
        }
    }

    fn region_mouse_leave(&mut self, event: &RegionEvent, map: &mut ChoroplethMap<S>) {
        if let Some(f) = self.region_mouse_leave.as_mut() {
            f(event, map);
        }
    }

    fn marker_click(&mut self, event: &MarkerEvent, map: &mut ChoroplethMap<S>) {
        if let Some(f) = self.marker_click.as_mut() {
            f(event, map);
        }
    }

    fn marker_mouse_enter(&mut self, event: &MarkerEvent, map: &mut ChoroplethMap<S>) {
        if let Some(f) = self.marker_mouse_enter.as_mut() {
            f(event, map);
        }
    }

    fn marker_mouse_leave(&mut self, event: &MarkerEvent, map: &mut ChoroplethMap<S>) {
        if let Some(f) = self.marker_mouse_leave.as_mut() {
            f(event, map);
        }
    }
}
