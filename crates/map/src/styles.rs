use runtime::surface::RegionStyle;
use scene::selection::Highlight;

use crate::config::MapConfig;

/// Region styles per highlight level.
#[derive(Debug, Clone, PartialEq)]
pub struct StylePalette {
    pub base: RegionStyle,
    pub group: RegionStyle,
    pub selected: RegionStyle,
}

impl StylePalette {
    pub fn from_config(config: &MapConfig) -> Self {
        let style = |fill: &str, stroke: &str| RegionStyle {
            fill: fill.to_string(),
            stroke: stroke.to_string(),
            stroke_width: config.region_stroke_width,
        };
        Self {
            base: style(&config.region_fill_color, &config.region_stroke_color),
            group: style(
                config
                    .group_fill_color
                    .as_deref()
                    .unwrap_or(&config.accent_fill_color),
                config
                    .group_stroke_color
                    .as_deref()
                    .unwrap_or(&config.accent_stroke_color),
            ),
            selected: style(&config.accent_fill_color, &config.accent_stroke_color),
        }
    }

    pub fn resolve(&self, highlight: Highlight) -> &RegionStyle {
        match highlight {
            Highlight::None => &self.base,
            Highlight::Group => &self.group,
            Highlight::Selected => &self.selected,
        }
    }
}
