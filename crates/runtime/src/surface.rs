//! Rendering surface capability.
//!
//! The map core never draws. It issues commands against a [`RenderSurface`]
//! supplied by the host (SVG, canvas, a test recorder, ...).

use foundation::ids::RegionId;
use foundation::math::Vec2;
use foundation::viewport::ZoomTransform;
use scene::regions::Region;

/// Animation applied to a style or transform change.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Transition {
    pub duration_ms: u32,
}

impl Default for Transition {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Transition {
    /// Duration used when the caller does not pick one.
    pub const DEFAULT: Self = Self::millis(250);
    /// Duration of a framed move between regions.
    pub const MOVE: Self = Self::millis(750);

    pub const fn millis(duration_ms: u32) -> Self {
        Self { duration_ms }
    }

    pub const fn immediate() -> Self {
        Self::millis(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionStyle {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
}

/// How a marker is drawn. Rendering details belong to the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerGlyph {
    Circle {
        radius: f64,
        color: String,
    },
    /// Anchored at its bottom-left corner.
    Image {
        href: String,
        width: f64,
        height: f64,
    },
}

pub trait RenderSurface {
    /// Creates the element for `region`, addressable by its id afterwards.
    fn append_region(&mut self, region: &Region);

    fn append_marker(&mut self, index: usize, position: Vec2, glyph: &MarkerGlyph);

    /// Fire-and-forget restyle of one region.
    fn set_region_style(&mut self, id: &RegionId, style: &RegionStyle, transition: Transition);

    /// Applies a zoom transform to the map content. A newer call supersedes
    /// any transition still running.
    fn apply_zoom(&mut self, transform: ZoomTransform, transition: Transition);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    AppendRegion {
        id: RegionId,
    },
    AppendMarker {
        index: usize,
        position: Vec2,
        glyph: MarkerGlyph,
    },
    SetRegionStyle {
        id: RegionId,
        style: RegionStyle,
        transition: Transition,
    },
    ApplyZoom {
        transform: ZoomTransform,
        transition: Transition,
    },
}

/// Surface that records every command, for tests and headless tools.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<SurfaceCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[SurfaceCommand] {
        &self.commands
    }

    pub fn drain(&mut self) -> Vec<SurfaceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Latest style set on `id`, if any.
    pub fn region_style(&self, id: &str) -> Option<&RegionStyle> {
        self.commands.iter().rev().find_map(|c| match c {
            SurfaceCommand::SetRegionStyle { id: rid, style, .. } if rid.as_str() == id => {
                Some(style)
            }
            _ => None,
        })
    }

    /// Latest zoom request; the one a real surface would settle on.
    pub fn last_zoom(&self) -> Option<(ZoomTransform, Transition)> {
        self.commands.iter().rev().find_map(|c| match c {
            SurfaceCommand::ApplyZoom {
                transform,
                transition,
            } => Some((*transform, *transition)),
            _ => None,
        })
    }

    pub fn region_ids(&self) -> Vec<&RegionId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                SurfaceCommand::AppendRegion { id } => Some(id),
                _ => None,
            })
            .collect()
    }
}

impl RenderSurface for RecordingSurface {
    fn append_region(&mut self, region: &Region) {
        self.commands.push(SurfaceCommand::AppendRegion {
            id: region.id().clone(),
        });
    }

    fn append_marker(&mut self, index: usize, position: Vec2, glyph: &MarkerGlyph) {
        self.commands.push(SurfaceCommand::AppendMarker {
            index,
            position,
            glyph: glyph.clone(),
        });
    }

    fn set_region_style(&mut self, id: &RegionId, style: &RegionStyle, transition: Transition) {
        self.commands.push(SurfaceCommand::SetRegionStyle {
            id: id.clone(),
            style: style.clone(),
            transition,
        });
    }

    fn apply_zoom(&mut self, transform: ZoomTransform, transition: Transition) {
        self.commands.push(SurfaceCommand::ApplyZoom {
            transform,
            transition,
        });
    }
}
